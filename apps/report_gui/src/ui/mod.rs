//! UI layer: the report form window.

pub mod app;

pub use app::ReportApp;
