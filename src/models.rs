use serde::{Deserialize, Serialize};
use strum::Display;

/// Whether an account is an individual user or an organization/group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum AccountKind {
    User,
    Organization,
}

/// A scan target: a user or organization on the hosting provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub login: String,
    pub kind: AccountKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub blog: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl Account {
    /// An account carrying only its identity; descriptive fields are unset.
    pub fn new(id: i64, login: impl Into<String>, kind: AccountKind) -> Self {
        Self {
            id,
            login: login.into(),
            kind,
            name: None,
            avatar_url: None,
            url: None,
            company: None,
            blog: None,
            location: None,
            email: None,
            bio: None,
        }
    }

    pub fn is_organization(&self) -> bool {
        self.kind == AccountKind::Organization
    }
}

/// A non-fork repository owned by a scan target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: i64,
    pub owner: String,
    pub name: String,
    pub full_name: String,
    pub clone_url: String,
    pub url: String,
    pub default_branch: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
}
