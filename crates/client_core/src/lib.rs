//! Report upload client: form controller, analysis transport and the local
//! store that turns returned PDFs into viewable resources.

pub mod cancel;
pub mod config;
pub mod controller;
pub mod resource;
pub mod transport;

pub use cancel::{cancel_pair, CancelHandle, CancelToken};
pub use config::{env_lookup, load_settings, load_settings_from, ClientSettings};
pub use controller::{
    FormController, ResubmitPolicy, SubmissionState, SubmitOutcome, SubmitTicket,
};
pub use resource::{ResourceRef, ResourceStore};
pub use transport::{AnalyzeTransport, HttpAnalyzeClient, PdfDocument};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
