//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::{AnalyzeTransport, HttpAnalyzeClient, SubmitTicket};
use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;

pub fn launch(
    client: HttpAnalyzeClient,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::error!("failed to build backend runtime: {err}");
                let _ = ui_tx.try_send(UiEvent::WorkerFailed(format!(
                    "backend worker startup failure: failed to build runtime: {err}"
                )));
                return;
            }
        };

        runtime.block_on(async move {
            let client = Arc::new(client);
            let _ = ui_tx.try_send(UiEvent::Info(format!(
                "Ready to send reports to {}",
                client.endpoint()
            )));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::Analyze(ticket) => {
                        tokio::spawn(run_analyze(Arc::clone(&client), ticket, ui_tx.clone()));
                    }
                }
            }
            tracing::debug!("ui command queue closed; backend worker exiting");
        });
    });
}

async fn run_analyze(client: Arc<HttpAnalyzeClient>, ticket: SubmitTicket, ui_tx: Sender<UiEvent>) {
    let SubmitTicket {
        attempt,
        input,
        cancel,
    } = ticket;
    let outcome = client.analyze(&input, &cancel).await;
    deliver(&ui_tx, UiEvent::AnalyzeFinished { attempt, outcome });
}

/// Hands `event` to the UI without blocking a runtime worker. A full queue
/// defers the send to the blocking pool so the result is never dropped.
fn deliver(ui_tx: &Sender<UiEvent>, event: UiEvent) {
    match ui_tx.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => {
            tracing::warn!("ui event queue is full; deferring delivery");
            let ui_tx = ui_tx.clone();
            tokio::task::spawn_blocking(move || {
                if ui_tx.send(event).is_err() {
                    tracing::debug!("ui closed before deferred event was delivered");
                }
            });
        }
        Err(TrySendError::Disconnected(_)) => {
            tracing::debug!("ui closed before backend event was delivered");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crossbeam_channel::bounded;

    use super::*;

    fn info_text(event: UiEvent) -> String {
        match event {
            UiEvent::Info(text) => text,
            _ => panic!("expected info event"),
        }
    }

    #[tokio::test]
    async fn full_queue_defers_instead_of_dropping() {
        let (tx, rx) = bounded::<UiEvent>(1);
        tx.try_send(UiEvent::Info("first".into())).expect("first fits");

        deliver(&tx, UiEvent::Info("second".into()));

        let first = rx.recv_timeout(Duration::from_secs(1)).expect("first");
        let second = rx.recv_timeout(Duration::from_secs(1)).expect("second");
        assert_eq!(info_text(first), "first");
        assert_eq!(info_text(second), "second");
    }

    #[tokio::test]
    async fn closed_ui_is_not_an_error() {
        let (tx, rx) = bounded::<UiEvent>(1);
        drop(rx);
        deliver(&tx, UiEvent::Info("late".into()));
    }
}
