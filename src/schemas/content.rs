use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::schemas::{deserialize_id, deserialize_optional_id};
use crate::services::highlight::Highlight;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum AudienceType {
    Student,
    Teacher,
    General,
}

impl AudienceType {
    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "student" | "students" => Some(Self::Student),
            "teacher" | "teachers" => Some(Self::Teacher),
            "general" | "all" => Some(Self::General),
            _ => None,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::General => "general",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Textbook {
    #[serde(deserialize_with = "deserialize_id")]
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) pages: Vec<TextbookPage>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TextbookPage {
    #[serde(alias = "page_number", alias = "pageNumber")]
    pub(crate) number: u32,
    #[serde(default, alias = "content")]
    pub(crate) text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TextbookSearchQuery {
    #[serde(default)]
    pub(crate) q: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct PageMatches {
    pub(crate) page: u32,
    pub(crate) highlights: Vec<Highlight>,
    pub(crate) snippets: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TextbookSearchResponse {
    pub(crate) textbook_id: String,
    pub(crate) title: String,
    pub(crate) query: String,
    pub(crate) total_matches: usize,
    pub(crate) pages: Vec<PageMatches>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub(crate) struct AskRequest {
    #[validate(length(min = 1, max = 2000, message = "question must be 1-2000 characters"))]
    pub(crate) question: String,
    #[serde(
        default,
        alias = "textbookId",
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub(crate) textbook_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 8000, message = "context must be at most 8000 characters"))]
    pub(crate) context: Option<String>,
}
