//! Command orchestration helpers from UI actions to backend command queue.

use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use shared::domain::{CompareSlot, ViewMode};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{UiError, UiErrorContext, UiEvent},
    reducer::DashboardState,
};

/// Queues `cmd` for the backend worker. On failure the reason is written to
/// `status` and `false` is returned.
pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) -> bool {
    let cmd_name = cmd.name();
    let ticket = cmd.ticket();

    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, %ticket, "queued ui->backend command");
            true
        }
        Err(TrySendError::Full(_)) => {
            tracing::warn!(command = cmd_name, "ui->backend command queue is full");
            *status = "UI command queue is full; please retry".to_string();
            false
        }
        Err(TrySendError::Disconnected(_)) => {
            tracing::error!(command = cmd_name, "ui->backend command queue disconnected");
            *status = "Backend worker disconnected; restart the dashboard".to_string();
            false
        }
    }
}

fn context_for(cmd: &BackendCommand) -> UiErrorContext {
    match cmd {
        BackendCommand::Analyze { .. } => UiErrorContext::Analyze,
        BackendCommand::Compare { .. } => UiErrorContext::Compare,
        BackendCommand::Ask { .. } => UiErrorContext::Ask,
        #[cfg(feature = "auth")]
        BackendCommand::Register { .. } => UiErrorContext::Register,
        #[cfg(feature = "auth")]
        BackendCommand::Login { .. } => UiErrorContext::Login,
        BackendCommand::Health { .. } => UiErrorContext::Health,
    }
}

/// Owns the interaction state and both ends of the backend bridge.
pub struct DashboardController {
    state: DashboardState,
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
}

impl DashboardController {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        Self {
            state: DashboardState::new(),
            cmd_tx,
            ui_rx,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    fn dispatch(&mut self, cmd: Option<BackendCommand>) -> bool {
        let Some(cmd) = cmd else {
            return false;
        };
        let ticket = cmd.ticket();
        let context = context_for(&cmd);
        let mut status = String::new();
        if dispatch_backend_command(&self.cmd_tx, cmd, &mut status) {
            return true;
        }
        self.state.abandon(ticket, UiError::backend_unavailable(context, status));
        false
    }

    pub fn select_mode(&mut self, mode: ViewMode) {
        self.state.select_mode(mode);
    }

    pub fn open_document(&mut self, path: Option<PathBuf>) -> bool {
        let cmd = self.state.submit_single(path);
        self.dispatch(cmd)
    }

    pub fn set_compare_file(&mut self, slot: CompareSlot, path: Option<PathBuf>) {
        self.state.set_compare_file(slot, path);
    }

    pub fn run_comparison(&mut self) -> Result<bool, UiError> {
        let cmd = self.state.submit_compare()?;
        Ok(self.dispatch(cmd))
    }

    pub fn ask_copilot(&mut self, question: &str) -> bool {
        let cmd = self.state.ask_copilot(question);
        self.dispatch(cmd)
    }

    #[cfg(feature = "auth")]
    pub fn register(&mut self, name: &str, email: &str, password: &str) -> Result<bool, UiError> {
        let cmd = self.state.submit_register(name, email, password)?;
        Ok(self.dispatch(cmd))
    }

    #[cfg(feature = "auth")]
    pub fn login(&mut self, email: &str, password: &str) -> Result<bool, UiError> {
        let cmd = self.state.submit_login(email, password)?;
        Ok(self.dispatch(cmd))
    }

    pub fn check_health(&mut self) -> bool {
        let cmd = self.state.request_health();
        self.dispatch(cmd)
    }

    /// Applies every event already waiting, without blocking.
    pub fn process_ui_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.ui_rx.try_recv() {
            if self.state.apply(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Blocks until no request is in flight or `timeout` elapses. Returns
    /// `true` once everything has settled.
    pub fn wait_until_settled(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.state.has_pending() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.ui_rx.recv_timeout(remaining) {
                Ok(event) => {
                    self.state.apply(event);
                }
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(?timeout, "gave up waiting for backend responses");
                    self.state.set_status(format!(
                        "No response from the intelligence service within {timeout:?}"
                    ));
                    return false;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.state.set_status("Backend worker stopped before responding");
                    return false;
                }
            }
        }
        self.process_ui_events();
        true
    }
}
