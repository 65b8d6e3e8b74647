//! Backend commands queued from UI to backend worker.

use client_core::SubmitTicket;

pub enum BackendCommand {
    Analyze(SubmitTicket),
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Analyze(_) => "analyze",
        }
    }
}
