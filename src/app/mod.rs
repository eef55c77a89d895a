//! Application runtime composition modules.

pub(crate) mod config;
pub(crate) mod report;
pub(crate) mod runtime;
pub(crate) mod terminal;
