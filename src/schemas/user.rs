use serde::{Deserialize, Serialize};

use crate::schemas::deserialize_id;
use crate::services::collections::Keyed;
use crate::services::listing::Listable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::Student => "student",
        }
    }
}

/// A user as reported by the auth service. Optional profile fields are
/// absent for accounts that never completed onboarding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct User {
    #[serde(deserialize_with = "deserialize_id")]
    pub(crate) id: String,
    pub(crate) email: String,
    #[serde(default, alias = "firstName")]
    pub(crate) first_name: String,
    #[serde(default, alias = "lastName")]
    pub(crate) last_name: String,
    pub(crate) role: Role,
    #[serde(default)]
    pub(crate) school: Option<String>,
    #[serde(default)]
    pub(crate) location: Option<String>,
    #[serde(default)]
    pub(crate) position: Option<String>,
    #[serde(default)]
    pub(crate) phone: Option<String>,
    #[serde(default)]
    pub(crate) gender: Option<String>,
    #[serde(default, alias = "createdAt")]
    pub(crate) created_at: Option<String>,
    #[serde(default, alias = "lastLogin")]
    pub(crate) last_login: Option<String>,
    #[serde(default, alias = "isOnline")]
    pub(crate) is_online: bool,
}

impl Listable for User {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.first_name.as_str(), self.last_name.as_str(), self.email.as_str()];
        if let Some(school) = self.school.as_deref() {
            fields.push(school);
        }
        fields
    }

    fn category(&self) -> Option<&str> {
        Some(self.role.as_str())
    }

    fn status(&self) -> Option<&str> {
        Some(if self.is_online { "online" } else { "offline" })
    }
}

impl Keyed for User {
    fn key(&self) -> &str {
        &self.id
    }
}

/// The auth service answers single-user requests either bare or wrapped in
/// `{"user": ...}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum UserBody {
    Wrapped { user: User },
    Bare(User),
}

impl UserBody {
    pub(crate) fn into_user(self) -> User {
        match self {
            Self::Wrapped { user } => user,
            Self::Bare(user) => user,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct RoleUpdate {
    pub(crate) role: Role,
}
