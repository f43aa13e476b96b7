//! Terminal front end: pure renderers plus the interactive shell.

pub mod shell;
pub mod view;
