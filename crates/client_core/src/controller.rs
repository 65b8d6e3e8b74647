//! Form state and the submission lifecycle.
//!
//! The controller is the only writer of the result slot. Front-ends either
//! await [`FormController::submit`] directly, or split it into
//! [`FormController::begin_submit`] and [`FormController::resolve`] when the
//! request runs on another thread.

use serde::{Deserialize, Serialize};
use shared::{
    domain::{AttemptId, CsvFile, SubmissionInput},
    error::{AnalyzeError, ErrorKind, SubmitError, ValidationError},
};
use tracing::{debug, info, warn};

use crate::{
    cancel::{cancel_pair, CancelHandle, CancelToken},
    resource::{ResourceRef, ResourceStore},
    transport::{AnalyzeTransport, PdfDocument},
};

/// What a submit does while another attempt is still pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResubmitPolicy {
    #[default]
    Ignore,
    Supersede,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Pending,
    Success(ResourceRef),
    Failed { kind: ErrorKind, message: String },
}

impl SubmissionState {
    pub fn failed(err: &SubmitError) -> Self {
        Self::Failed {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn resource(&self) -> Option<&ResourceRef> {
        match self {
            Self::Success(resource) => Some(resource),
            _ => None,
        }
    }
}

/// Validated work handed to whoever performs the request.
#[derive(Debug, Clone)]
pub struct SubmitTicket {
    pub attempt: AttemptId,
    pub input: SubmissionInput,
    pub cancel: CancelToken,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Dispatched(SubmitTicket),
    Rejected(ValidationError),
    IgnoredWhilePending,
}

#[derive(Debug)]
struct InFlight {
    attempt: AttemptId,
    cancel: CancelHandle,
}

#[derive(Debug)]
pub struct FormController {
    title: String,
    file: Option<CsvFile>,
    state: SubmissionState,
    policy: ResubmitPolicy,
    resources: ResourceStore,
    in_flight: Option<InFlight>,
    last_attempt: AttemptId,
}

impl FormController {
    pub fn new(policy: ResubmitPolicy) -> Self {
        Self::with_resources(policy, ResourceStore::new())
    }

    pub fn with_resources(policy: ResubmitPolicy, resources: ResourceStore) -> Self {
        Self {
            title: String::new(),
            file: None,
            state: SubmissionState::Idle,
            policy,
            resources,
            in_flight: None,
            last_attempt: AttemptId::default(),
        }
    }

    pub fn update_title(&mut self, text: impl Into<String>) {
        self.title = text.into();
    }

    pub fn update_file(&mut self, file: CsvFile) {
        self.file = Some(file);
    }

    pub fn clear_file(&mut self) {
        self.file = None;
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn file(&self) -> Option<&CsvFile> {
        self.file.as_ref()
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn policy(&self) -> ResubmitPolicy {
        self.policy
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn resources(&self) -> &ResourceStore {
        &self.resources
    }

    /// Validates the form and, when valid, moves to `Pending` and returns the
    /// ticket to execute. No request may be issued for any other outcome.
    pub fn begin_submit(&mut self) -> SubmitOutcome {
        if self.in_flight.is_some() && self.policy == ResubmitPolicy::Ignore {
            debug!("submit ignored while a report request is pending");
            return SubmitOutcome::IgnoredWhilePending;
        }

        let input = match SubmissionInput::validate(&self.title, self.file.as_ref()) {
            Ok(input) => input,
            Err(err) => {
                self.cancel_in_flight();
                debug!("submit rejected: {err}");
                self.transition(SubmissionState::failed(&SubmitError::from(err)));
                return SubmitOutcome::Rejected(err);
            }
        };

        self.cancel_in_flight();
        self.last_attempt = self.last_attempt.next();
        let attempt = self.last_attempt;
        let (handle, token) = cancel_pair();
        self.in_flight = Some(InFlight {
            attempt,
            cancel: handle,
        });
        self.transition(SubmissionState::Pending);

        info!(
            attempt = %attempt,
            title = %input.title,
            file = %input.file.filename,
            bytes = input.file.size_bytes(),
            "submitting report"
        );
        SubmitOutcome::Dispatched(SubmitTicket {
            attempt,
            input,
            cancel: token,
        })
    }

    /// Applies the result of `attempt`. Returns `false` and changes nothing when
    /// the attempt is no longer the one in flight.
    pub fn resolve(
        &mut self,
        attempt: AttemptId,
        outcome: Result<PdfDocument, AnalyzeError>,
    ) -> bool {
        match &self.in_flight {
            Some(current) if current.attempt == attempt => {}
            _ => {
                debug!(attempt = %attempt, "discarding result of superseded report request");
                return false;
            }
        }
        self.in_flight = None;

        let next = match outcome {
            Ok(document) => match self.resources.publish(&document.bytes) {
                Ok(resource) => {
                    info!(attempt = %attempt, bytes = resource.size_bytes(), "report ready");
                    SubmissionState::Success(resource)
                }
                Err(err) => {
                    warn!(attempt = %attempt, "failed to store report for viewing: {err}");
                    SubmissionState::failed(&SubmitError::Resource(err))
                }
            },
            Err(err) => {
                warn!(attempt = %attempt, "report request failed: {err}");
                SubmissionState::failed(&SubmitError::from(err))
            }
        };
        self.transition(next);
        true
    }

    pub async fn submit<T>(&mut self, transport: &T) -> &SubmissionState
    where
        T: AnalyzeTransport + ?Sized,
    {
        if let SubmitOutcome::Dispatched(ticket) = self.begin_submit() {
            let outcome = transport.analyze(&ticket.input, &ticket.cancel).await;
            self.resolve(ticket.attempt, outcome);
        }
        &self.state
    }

    /// Back to `Idle`: cancels any pending attempt and releases the current report.
    pub fn reset(&mut self) {
        self.cancel_in_flight();
        self.transition(SubmissionState::Idle);
    }

    fn cancel_in_flight(&mut self) {
        if let Some(previous) = self.in_flight.take() {
            info!(attempt = %previous.attempt, "cancelling pending report request");
            previous.cancel.cancel();
        }
    }

    fn transition(&mut self, next: SubmissionState) {
        let previous = std::mem::replace(&mut self.state, next);
        if let SubmissionState::Success(resource) = previous {
            self.resources.release(&resource);
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
