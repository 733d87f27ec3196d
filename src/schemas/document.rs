use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::schemas::{deserialize_id, deserialize_optional_id};
use crate::services::collections::Keyed;
use crate::services::listing::Listable;

/// The four teacher-tools artifact families; the variant doubles as the
/// path segment on both the gateway and the teacher-tools service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DocumentKind {
    Lessons,
    Assessments,
    Rubrics,
    Tos,
}

impl DocumentKind {
    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value {
            "lessons" => Some(Self::Lessons),
            "assessments" => Some(Self::Assessments),
            "rubrics" => Some(Self::Rubrics),
            "tos" => Some(Self::Tos),
            _ => None,
        }
    }

    pub(crate) fn segment(self) -> &'static str {
        match self {
            Self::Lessons => "lessons",
            Self::Assessments => "assessments",
            Self::Rubrics => "rubrics",
            Self::Tos => "tos",
        }
    }

    /// Singular, human-readable name used in messages.
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Lessons => "lesson plan",
            Self::Assessments => "assessment",
            Self::Rubrics => "rubric",
            Self::Tos => "table of specifications",
        }
    }

    pub(crate) fn plural_label(self) -> &'static str {
        match self {
            Self::Lessons => "lesson plans",
            Self::Assessments => "assessments",
            Self::Rubrics => "rubrics",
            Self::Tos => "tables of specifications",
        }
    }

    pub(crate) fn not_found(self) -> String {
        let label = self.label();
        let mut chars = label.chars();
        match chars.next() {
            Some(first) => format!("{}{} not found", first.to_uppercase(), chars.as_str()),
            None => "Not found".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct Document {
    #[serde(deserialize_with = "deserialize_id")]
    pub(crate) id: String,
    #[serde(default, alias = "userId", alias = "owner_id", deserialize_with = "deserialize_optional_id")]
    pub(crate) user_id: Option<String>,
    #[serde(default)]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) subject: Option<String>,
    #[serde(default, alias = "class_name", alias = "grade_level")]
    pub(crate) grade: Option<String>,
    #[serde(default)]
    pub(crate) topic: Option<String>,
    #[serde(default)]
    pub(crate) content: String,
    #[serde(default, alias = "createdAt")]
    pub(crate) created_at: Option<String>,
    #[serde(default, alias = "updatedAt")]
    pub(crate) updated_at: Option<String>,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl Listable for Document {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str()];
        fields.extend(self.topic.as_deref());
        fields.extend(self.subject.as_deref());
        fields
    }

    fn category(&self) -> Option<&str> {
        self.subject.as_deref()
    }
}

impl Keyed for Document {
    fn key(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub(crate) struct DocumentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) topic: Option<String>,
}

impl DocumentUpdate {
    pub(crate) fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.subject.is_none()
            && self.grade.is_none()
            && self.topic.is_none()
    }
}
