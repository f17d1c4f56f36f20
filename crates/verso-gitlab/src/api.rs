//! Low-level GitLab REST calls over the request pipeline.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use verso_backend::PersistOptions;
use verso_client::{ApiRequest, Context, Method};
use verso_core::{Cursor, Error, Result};

use crate::{pagination, wire};

fn project_path(ctx: &Context, rest: &str) -> String {
    format!("/projects/{}{}", urlencoding::encode(ctx.repo()), rest)
}

fn file_path(ctx: &Context, path: &str, rest: &str) -> String {
    project_path(
        ctx,
        &format!("/repository/files/{}{}", urlencoding::encode(path), rest),
    )
}

/// Fetches the acting user's identity.
pub(crate) async fn user(ctx: &Context) -> Result<wire::User> {
    let value = ctx.request_json(ApiRequest::get("/user")).await?;
    Ok(serde_json::from_value(value)?)
}

/// Fetches the context project, including the caller's access levels.
pub(crate) async fn project(ctx: &Context) -> Result<wire::Project> {
    let value = ctx
        .request_json(ApiRequest::get(project_path(ctx, "")))
        .await?;
    Ok(serde_json::from_value(value)?)
}

/// One page of a repository-tree listing: the folder's blobs plus the
/// cursor derived from the paging headers.
pub(crate) struct TreePage {
    pub items: Vec<wire::TreeItem>,
    pub cursor: Option<Cursor>,
}

async fn fetch_tree(ctx: &Context, request: ApiRequest) -> Result<TreePage> {
    let response = ctx.request(request).await?.error_for_status()?;
    let cursor = pagination::cursor_from_response(&response);
    let items: Vec<wire::TreeItem> = serde_json::from_value(response.parse_json()?)?;
    Ok(TreePage {
        items: items
            .into_iter()
            .filter(|item| item.item_type == "blob")
            .collect(),
        cursor,
    })
}

fn tree_request(ctx: &Context, folder: &str, page_size: u64) -> ApiRequest {
    ApiRequest::get(project_path(ctx, "/repository/tree")).with_params([
        ("path", folder),
        ("ref", ctx.branch()),
        ("per_page", &page_size.to_string()[..]),
    ])
}

/// Probes a folder listing's paging headers without fetching a body.
pub(crate) async fn tree_cursor(
    ctx: &Context,
    folder: &str,
    page_size: u64,
) -> Result<Option<Cursor>> {
    let request = tree_request(ctx, folder, page_size).with_method(Method::Head);
    let response = ctx.request(request).await?.error_for_status()?;
    Ok(pagination::cursor_from_response(&response))
}

/// Lists one page of a folder's files on the context branch.
pub(crate) async fn tree_page(ctx: &Context, folder: &str, page_size: u64) -> Result<TreePage> {
    fetch_tree(ctx, tree_request(ctx, folder, page_size)).await
}

/// Lists the page a previously issued navigation link points at.
pub(crate) async fn tree_page_at(ctx: &Context, url: &str) -> Result<TreePage> {
    fetch_tree(ctx, ApiRequest::from_url(url)).await
}

/// Reads a file's raw text at the context branch tip, caching by blob id
/// when one is known.
pub(crate) async fn read_file_text(ctx: &Context, path: &str, id: Option<&str>) -> Result<String> {
    if let Some(id) = id
        && let Some(cached) = ctx.cached(id).await
    {
        return String::from_utf8(cached.to_vec()).map_err(|err| {
            Error::parse()
                .with_message("cached content is not valid utf-8")
                .with_source(err)
        });
    }

    let request =
        ApiRequest::get(file_path(ctx, path, "/raw")).with_params([("ref", ctx.branch())]);
    let text = ctx.request_text(request).await?;

    if let Some(id) = id {
        ctx.store(id, Bytes::from(text.clone().into_bytes())).await;
    }
    Ok(text)
}

/// Reads a file's raw bytes at the context branch tip.
pub(crate) async fn read_file_blob(ctx: &Context, path: &str, id: Option<&str>) -> Result<Bytes> {
    if let Some(id) = id
        && let Some(cached) = ctx.cached(id).await
    {
        return Ok(cached);
    }

    let request =
        ApiRequest::get(file_path(ctx, path, "/raw")).with_params([("ref", ctx.branch())]);
    let data = ctx.request_blob(request).await?;

    if let Some(id) = id {
        ctx.store(id, data.clone()).await;
    }
    Ok(data)
}

/// Writes one file as a single commit through the commits API.
pub(crate) async fn persist_file(
    ctx: &Context,
    path: &str,
    content: &[u8],
    options: &PersistOptions,
) -> Result<()> {
    let branch = options.branch.as_deref().unwrap_or(ctx.branch());
    let action = if options.update_file { "update" } else { "create" };

    let mut body = serde_json::json!({
        "branch": branch,
        "commit_message": options.commit_message,
        "actions": [{
            "action": action,
            "file_path": path,
            "encoding": "base64",
            "content": BASE64.encode(content),
        }],
    });
    if let Some(author) = &options.author {
        body["author_name"] = serde_json::Value::String(author.name.clone());
        body["author_email"] = serde_json::Value::String(author.email.clone());
    }

    let request = ApiRequest::get(project_path(ctx, "/repository/commits"))
        .with_method(Method::Post)
        .with_json_body(&body)?;
    ctx.request_json(request).await?;
    Ok(())
}

/// Deletes one file as a single commit through the files API.
pub(crate) async fn delete_file(
    ctx: &Context,
    path: &str,
    commit_message: &str,
    branch: Option<&str>,
) -> Result<()> {
    let branch = branch.unwrap_or(ctx.branch());
    let request = ApiRequest::get(file_path(ctx, path, ""))
        .with_method(Method::Delete)
        .with_params([("branch", branch), ("commit_message", commit_message)]);
    let response = ctx.request(request).await?;
    response.error_for_status()?;
    Ok(())
}
