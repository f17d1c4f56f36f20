//! GitLab v4 REST wire types.

use serde::Deserialize;

/// `GET /user`.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// One access grant inside project permissions.
#[derive(Debug, Clone, Deserialize)]
pub struct Access {
    pub access_level: u64,
}

/// Permissions block of `GET /projects/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPermissions {
    #[serde(default)]
    pub project_access: Option<Access>,
    #[serde(default)]
    pub group_access: Option<Access>,
}

/// `GET /projects/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub permissions: Option<ProjectPermissions>,
}

/// One entry of `GET /projects/{id}/repository/tree`.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeItem {
    pub id: String,
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub item_type: String,
}
