use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

pub(crate) mod content;
pub(crate) mod document;
pub(crate) mod forum;
pub(crate) mod learning;
pub(crate) mod quiz;
pub(crate) mod user;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
    pub(crate) api_prefix: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeletedResponse {
    pub(crate) id: String,
    pub(crate) deleted: bool,
}

/// A list response from a service: either a bare array or an object wrapping
/// the array under one of the conventional keys.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CollectionBody<T> {
    Bare(Vec<T>),
    Wrapped(WrappedCollection<T>),
}

#[derive(Debug, Deserialize)]
pub(crate) struct WrappedCollection<T> {
    #[serde(
        alias = "data",
        alias = "results",
        alias = "users",
        alias = "lessons",
        alias = "assessments",
        alias = "rubrics",
        alias = "tos",
        alias = "quizzes",
        alias = "questions",
        alias = "attempts",
        alias = "history",
        alias = "paths",
        alias = "skills",
        alias = "achievements",
        alias = "categories",
        alias = "threads"
    )]
    items: Vec<T>,
}

impl<T> CollectionBody<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(items) => items,
            Self::Wrapped(wrapped) => wrapped.items,
        }
    }
}

/// Services disagree on whether ids are numbers or strings; the gateway
/// always speaks strings.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(value) => value,
        RawId::Number(value) => value.to_string(),
    })
}

pub(crate) fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_id")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(value)| value))
}
