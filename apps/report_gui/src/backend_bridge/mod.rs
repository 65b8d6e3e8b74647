//! Bridge between the UI thread and the worker thread that performs requests.

pub mod commands;
pub mod runtime;
