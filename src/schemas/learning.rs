use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schemas::deserialize_id;
use crate::services::collections::Keyed;
use crate::services::listing::Listable;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct LearningPath {
    #[serde(deserialize_with = "deserialize_id")]
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) subject: Option<String>,
    /// `enrolled`, `available` or `completed`, from the caller's perspective.
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default, alias = "progressPercentage", alias = "progress")]
    pub(crate) progress_percentage: Option<f64>,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl Listable for LearningPath {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.description.as_str()]
    }

    fn category(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}

impl Keyed for LearningPath {
    fn key(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct Skill {
    #[serde(deserialize_with = "deserialize_id")]
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) category: Option<String>,
    #[serde(default, alias = "progressPercentage", alias = "progress")]
    pub(crate) progress_percentage: Option<f64>,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl Listable for Skill {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct Achievement {
    #[serde(deserialize_with = "deserialize_id")]
    pub(crate) id: String,
    #[serde(default, alias = "name")]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default, alias = "isUnlocked", alias = "is_unlocked")]
    pub(crate) unlocked: bool,
    #[serde(default, alias = "progressPercentage", alias = "progress")]
    pub(crate) progress_percentage: Option<f64>,
    #[serde(default, alias = "unlockedAt")]
    pub(crate) unlocked_at: Option<String>,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl Listable for Achievement {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.description.as_str()]
    }

    fn status(&self) -> Option<&str> {
        Some(if self.unlocked { "unlocked" } else { "locked" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn achievement_status_follows_unlock_flag() {
        let locked: Achievement =
            serde_json::from_value(json!({"id": 1, "name": "First Steps", "progress": 40.0}))
                .expect("achievement");
        assert_eq!(locked.status(), Some("locked"));
        assert_eq!(locked.progress_percentage, Some(40.0));

        let unlocked: Achievement =
            serde_json::from_value(json!({"id": 2, "title": "Streak", "isUnlocked": true}))
                .expect("achievement");
        assert_eq!(unlocked.status(), Some("unlocked"));
    }
}
