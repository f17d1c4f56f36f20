//! GitHub REST wire types.

use serde::Deserialize;

/// `GET /user`.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Permission flags on `GET /repos/{repo}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepoPermissions {
    #[serde(default)]
    pub push: bool,
    #[serde(default)]
    pub admin: bool,
}

/// `GET /repos/{repo}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Repo {
    #[serde(default)]
    pub permissions: Option<RepoPermissions>,
}

/// `GET /repos/{origin}/collaborators/{user}/permission`.
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionLevel {
    pub permission: String,
}

/// One item of a `GET /repos/{repo}/contents/{dir}` listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentItem {
    pub name: String,
    pub path: String,
    pub sha: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(rename = "type")]
    pub item_type: String,
}

/// `GET /repos/{repo}/contents/{path}` for a single file.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentFile {
    pub sha: String,
    pub content: String,
    pub encoding: String,
}

/// Response body of a contents-API write.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentWritten {
    #[serde(default)]
    pub content: Option<WrittenFile>,
}

/// The written file inside [`ContentWritten`].
#[derive(Debug, Clone, Deserialize)]
pub struct WrittenFile {
    pub sha: String,
}

/// One entry of `GET /repos/{repo}/git/refs/heads/{prefix}`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitRef {
    #[serde(rename = "ref")]
    pub git_ref: String,
}

/// `POST /repos/{origin}/forks`.
#[derive(Debug, Clone, Deserialize)]
pub struct Fork {
    pub full_name: String,
}

/// One entry of `GET /repos/{repo}/commits/{sha}/statuses`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitStatus {
    pub state: String,
    pub context: String,
    #[serde(default)]
    pub target_url: Option<String>,
}
