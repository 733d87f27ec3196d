pub(crate) mod collections;
pub(crate) mod highlight;
pub(crate) mod listing;
pub(crate) mod mutations;
pub(crate) mod presence;
pub(crate) mod session;
pub(crate) mod upstream;
