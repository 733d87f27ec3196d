use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::core::time::parse_timestamp;
use crate::schemas::{deserialize_id, deserialize_optional_id};
use crate::services::collections::Keyed;
use crate::services::listing::Listable;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct ForumCategory {
    #[serde(deserialize_with = "deserialize_id")]
    pub(crate) id: String,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default, alias = "threadCount")]
    pub(crate) thread_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct ForumThread {
    #[serde(deserialize_with = "deserialize_id")]
    pub(crate) id: String,
    #[serde(default, alias = "categoryId", deserialize_with = "deserialize_optional_id")]
    pub(crate) category_id: Option<String>,
    #[serde(default)]
    pub(crate) title: String,
    #[serde(default, alias = "authorName", alias = "author")]
    pub(crate) author_name: String,
    #[serde(default, alias = "excerpt", alias = "body")]
    pub(crate) preview: String,
    #[serde(default, alias = "is_pinned", alias = "isPinned")]
    pub(crate) pinned: bool,
    #[serde(default, alias = "is_locked", alias = "isLocked")]
    pub(crate) locked: bool,
    #[serde(default, alias = "replyCount")]
    pub(crate) reply_count: u64,
    #[serde(default, alias = "lastActivityAt", alias = "updated_at")]
    pub(crate) last_activity_at: Option<String>,
    #[serde(default, alias = "createdAt")]
    pub(crate) created_at: Option<String>,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl ForumThread {
    fn activity_timestamp(&self) -> i64 {
        self.last_activity_at
            .as_deref()
            .or(self.created_at.as_deref())
            .and_then(parse_timestamp)
            .map(|value| value.unix_timestamp())
            .unwrap_or(i64::MIN)
    }
}

impl Listable for ForumThread {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.author_name.as_str(), self.preview.as_str()]
    }

    fn category(&self) -> Option<&str> {
        self.category_id.as_deref()
    }

    /// Pinned and locked are independent flags; open means still taking replies.
    fn has_status(&self, status: &str) -> bool {
        match status {
            "pinned" => self.pinned,
            "locked" => self.locked,
            "open" => !self.locked,
            _ => false,
        }
    }
}

impl Keyed for ForumThread {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Pinned threads first, then most recent activity; ties keep service order.
pub(crate) fn sort_threads(threads: &mut [ForumThread]) {
    threads.sort_by(|left, right| {
        right
            .pinned
            .cmp(&left.pinned)
            .then_with(|| right.activity_timestamp().cmp(&left.activity_timestamp()))
    });
}

/// A thread with its posts; posts are forwarded untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ThreadDetail {
    pub(crate) thread: ForumThread,
    #[serde(default)]
    pub(crate) posts: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub(crate) struct ThreadCreate {
    #[serde(alias = "categoryId", deserialize_with = "deserialize_id")]
    pub(crate) category_id: String,
    #[validate(length(min = 3, max = 200, message = "title must be 3-200 characters"))]
    pub(crate) title: String,
    #[validate(length(min = 1, max = 10000, message = "body must be 1-10000 characters"))]
    pub(crate) body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub(crate) struct PostCreate {
    #[validate(length(min = 1, max = 10000, message = "body must be 1-10000 characters"))]
    pub(crate) body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub(crate) struct ReportCreate {
    #[validate(length(min = 3, max = 500, message = "reason must be 3-500 characters"))]
    pub(crate) reason: String,
}
