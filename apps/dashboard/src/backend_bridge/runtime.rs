//! Runtime bridge between UI command queue and backend event intake.

use std::{path::Path, sync::Arc, thread};

use client_core::{AnalysisGateway, DocumentUpload};
use crossbeam_channel::{Receiver, Sender};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

/// Starts the backend worker thread. Each queued command runs as its own task
/// so a slow analysis never holds up a copilot question.
pub fn launch(
    gateway: Arc<dyn AnalysisGateway>,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::error!("failed to build backend runtime: {err}");
                let _ = ui_tx.send(UiEvent::Error(UiError::backend_unavailable(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                return;
            }
        };
        tracing::debug!("backend worker ready");

        while let Ok(cmd) = cmd_rx.recv() {
            let gateway = Arc::clone(&gateway);
            let ui_tx = ui_tx.clone();
            runtime.spawn(async move {
                let name = cmd.name();
                let event = execute(gateway.as_ref(), cmd).await;
                if ui_tx.send(event).is_err() {
                    tracing::debug!(command = name, "ui event receiver dropped");
                }
            });
        }

        tracing::debug!("command queue closed; backend worker stopping");
    })
}

async fn read_document(path: &Path, context: UiErrorContext) -> Result<DocumentUpload, UiError> {
    DocumentUpload::from_path(path).await.map_err(|err| {
        tracing::warn!(path = %path.display(), "failed to read document: {err}");
        UiError::unreadable_document(context, path, &err)
    })
}

pub async fn execute(gateway: &dyn AnalysisGateway, cmd: BackendCommand) -> UiEvent {
    match cmd {
        BackendCommand::Analyze { ticket, path } => {
            let context = UiErrorContext::Analyze;
            let result = match read_document(&path, context).await {
                Ok(upload) => gateway
                    .analyze_document(upload)
                    .await
                    .map_err(|err| UiError::from_gateway(context, &err)),
                Err(err) => Err(err),
            };
            UiEvent::AnalysisFinished { ticket, result }
        }
        BackendCommand::Compare { ticket, base, new } => {
            let context = UiErrorContext::Compare;
            let result = match (
                read_document(&base, context).await,
                read_document(&new, context).await,
            ) {
                (Ok(base), Ok(new)) => gateway
                    .compare_documents(Some(base), Some(new))
                    .await
                    .map_err(|err| UiError::from_gateway(context, &err)),
                (Err(err), _) | (_, Err(err)) => Err(err),
            };
            UiEvent::ComparisonFinished { ticket, result }
        }
        BackendCommand::Ask {
            ticket,
            question,
            extraction,
            doc_id,
        } => {
            let answer = gateway
                .answer_question(&question, &extraction, doc_id.as_deref())
                .await;
            UiEvent::CopilotAnswered { ticket, answer }
        }
        #[cfg(feature = "auth")]
        BackendCommand::Register {
            ticket,
            name,
            email,
            password,
        } => UiEvent::AuthFinished {
            ticket,
            action: shared::domain::AuthAction::Register,
            result: gateway
                .register_user(&name, &email, &password)
                .await
                .map_err(|err| UiError::from_gateway(UiErrorContext::Register, &err)),
        },
        #[cfg(feature = "auth")]
        BackendCommand::Login {
            ticket,
            email,
            password,
        } => UiEvent::AuthFinished {
            ticket,
            action: shared::domain::AuthAction::Login,
            result: gateway
                .login_user(&email, &password)
                .await
                .map_err(|err| UiError::from_gateway(UiErrorContext::Login, &err)),
        },
        BackendCommand::Health { ticket } => UiEvent::HealthChecked {
            ticket,
            result: gateway
                .health()
                .await
                .map_err(|err| UiError::from_gateway(UiErrorContext::Health, &err)),
        },
    }
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
