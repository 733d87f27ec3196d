pub(crate) mod content;
pub(crate) mod errors;
pub(crate) mod forum;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod learning_paths;
pub(crate) mod pagination;
pub(crate) mod quizzes;
pub(crate) mod remote;
pub(crate) mod router;
pub(crate) mod teacher_tools;
pub(crate) mod users;
pub(crate) mod validation;
