//! Low-level GitHub REST calls over the request pipeline.
//!
//! Every function takes the per-call [`Context`] explicitly; the repository
//! targeted is always the context's, so fork-workflow callers redirect
//! writes simply by deriving a context for the fork.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use verso_backend::{CommitAuthor, PersistOptions};
use verso_client::{ApiRequest, CacheMode, Context, Method};
use verso_core::{Error, Result};

use crate::wire;

fn repo_path(ctx: &Context, rest: &str) -> String {
    format!("/repos/{}{}", ctx.repo(), rest)
}

/// Fetches the acting user's identity.
pub async fn user(ctx: &Context) -> Result<wire::User> {
    let value = ctx.request_json(ApiRequest::get("/user")).await?;
    Ok(serde_json::from_value(value)?)
}

/// Fetches the context repository, including the caller's permission flags.
pub async fn repo(ctx: &Context) -> Result<wire::Repo> {
    let value = ctx.request_json(ApiRequest::get(repo_path(ctx, ""))).await?;
    Ok(serde_json::from_value(value)?)
}

/// Lists the files of a folder on the context branch.
pub async fn list_files(ctx: &Context, folder: &str) -> Result<Vec<wire::ContentItem>> {
    let request = ApiRequest::get(repo_path(ctx, &format!("/contents/{folder}")))
        .with_params([("ref", ctx.branch())]);
    let value = ctx.request_json(request).await?;
    let items: Vec<wire::ContentItem> = serde_json::from_value(value)?;
    Ok(items
        .into_iter()
        .filter(|item| item.item_type == "file")
        .collect())
}

fn decode_content(file: &wire::ContentFile) -> Result<Bytes> {
    if file.encoding != "base64" {
        return Err(Error::parse().with_message(format!(
            "unexpected content encoding: {}",
            file.encoding
        )));
    }
    let compact: String = file
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    BASE64
        .decode(compact)
        .map(Bytes::from)
        .map_err(|err| {
            Error::parse()
                .with_message("content is not valid base64")
                .with_source(err)
        })
}

/// Reads a file's raw bytes at the context branch tip.
///
/// When a stable content id is given the cache is checked first and written
/// through after the fetch.
pub async fn read_file(ctx: &Context, path: &str, id: Option<&str>) -> Result<Bytes> {
    if let Some(id) = id
        && let Some(cached) = ctx.cached(id).await
    {
        return Ok(cached);
    }

    let request = ApiRequest::get(repo_path(ctx, &format!("/contents/{path}")))
        .with_params([("ref", ctx.branch())])
        .with_cache(CacheMode::NoStore);
    let value = ctx.request_json(request).await?;
    let file: wire::ContentFile = serde_json::from_value(value)?;
    let data = decode_content(&file)?;

    if let Some(id) = id {
        ctx.store(id, data.clone()).await;
    }
    Ok(data)
}

/// Reads a file as UTF-8 text.
pub async fn read_file_text(ctx: &Context, path: &str, id: Option<&str>) -> Result<String> {
    let data = read_file(ctx, path, id).await?;
    String::from_utf8(data.to_vec()).map_err(|err| {
        Error::parse()
            .with_message("file content is not valid utf-8")
            .with_source(err)
    })
}

/// Looks up the blob sha of a file, or `None` when it does not exist.
pub async fn file_sha(ctx: &Context, path: &str, branch: &str) -> Result<Option<String>> {
    let request = ApiRequest::get(repo_path(ctx, &format!("/contents/{path}")))
        .with_params([("ref", branch)]);
    match ctx.request_json(request).await {
        Ok(value) => {
            let file: wire::ContentFile = serde_json::from_value(value)?;
            Ok(Some(file.sha))
        }
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

fn author_value(author: &CommitAuthor) -> serde_json::Value {
    serde_json::json!({ "name": author.name, "email": author.email })
}

/// Writes one file as a single commit through the contents API.
///
/// GitHub requires the current blob sha for updates, so `update_file`
/// triggers a sha lookup first. Returns the new blob sha when the provider
/// reports it.
pub async fn persist_file(
    ctx: &Context,
    path: &str,
    content: &[u8],
    options: &PersistOptions,
) -> Result<Option<String>> {
    let branch = options.branch.as_deref().unwrap_or(ctx.branch());

    let sha = if options.update_file {
        file_sha(ctx, path, branch).await?
    } else {
        None
    };

    let mut body = serde_json::json!({
        "message": options.commit_message,
        "content": BASE64.encode(content),
        "branch": branch,
    });
    if let Some(sha) = sha {
        body["sha"] = serde_json::Value::String(sha);
    }
    if let Some(author) = &options.author {
        body["committer"] = author_value(author);
    }

    let request = ApiRequest::get(repo_path(ctx, &format!("/contents/{path}")))
        .with_method(Method::Put)
        .with_json_body(&body)?;
    let value = ctx.request_json(request).await?;
    let written: wire::ContentWritten = serde_json::from_value(value)?;
    Ok(written.content.map(|file| file.sha))
}

/// Deletes one file as a single commit.
pub async fn delete_file(
    ctx: &Context,
    path: &str,
    commit_message: &str,
    branch: Option<&str>,
) -> Result<()> {
    let branch = branch.unwrap_or(ctx.branch());
    let sha = file_sha(ctx, path, branch).await?.ok_or_else(|| {
        Error::not_found().with_message(format!("cannot delete missing file: {path}"))
    })?;

    let body = serde_json::json!({
        "message": commit_message,
        "sha": sha,
        "branch": branch,
    });
    let request = ApiRequest::get(repo_path(ctx, &format!("/contents/{path}")))
        .with_method(Method::Delete)
        .with_json_body(&body)?;
    ctx.request_json(request).await?;
    Ok(())
}

/// Lists branch refs under a name prefix.
pub async fn list_refs(ctx: &Context, prefix: &str) -> Result<Vec<wire::GitRef>> {
    let request = ApiRequest::get(repo_path(ctx, &format!("/git/refs/heads/{prefix}")));
    let value = ctx.request_json(request).await?;
    // A prefix matching exactly one ref comes back as a bare object.
    if value.is_object() {
        let single: wire::GitRef = serde_json::from_value(value)?;
        return Ok(vec![single]);
    }
    Ok(serde_json::from_value(value)?)
}

/// Deletes a branch.
pub async fn delete_branch(ctx: &Context, branch: &str) -> Result<()> {
    let request = ApiRequest::get(repo_path(ctx, &format!("/git/refs/heads/{branch}")))
        .with_method(Method::Delete);
    let response = ctx.request(request).await?;
    response.error_for_status()?;
    Ok(())
}

/// Merges a pull request.
pub async fn merge_pull(ctx: &Context, number: u64, squash: bool) -> Result<()> {
    let body = serde_json::json!({
        "merge_method": if squash { "squash" } else { "merge" },
    });
    let request = ApiRequest::get(repo_path(ctx, &format!("/pulls/{number}/merge")))
        .with_method(Method::Put)
        .with_json_body(&body)?;
    ctx.request_json(request).await?;
    Ok(())
}

/// Lists the commit statuses for a sha.
pub async fn statuses(ctx: &Context, sha: &str) -> Result<Vec<wire::CommitStatus>> {
    let request = ApiRequest::get(repo_path(ctx, &format!("/commits/{sha}/statuses")));
    let value = ctx.request_json(request).await?;
    Ok(serde_json::from_value(value)?)
}
