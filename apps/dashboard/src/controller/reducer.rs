//! Interaction state machine for the dashboard.
//!
//! Every transition is synchronous: user intents return the [`BackendCommand`]
//! to queue (if any) and backend results come back through [`DashboardState::apply`].
//! Each branch holds at most one in-flight request, identified by a
//! [`RequestTicket`]; a response whose ticket no longer matches the pending
//! branch is dropped.

use std::path::{Path, PathBuf};

use client_core::{metrics, DerivedMetrics, COPILOT_FALLBACK_ANSWER};
#[cfg(feature = "auth")]
use shared::domain::AuthAction;
use shared::{
    domain::{CompareSlot, RequestTicket, ViewMode},
    protocol::{AnalysisResult, ComparisonResult, ServiceStatus},
};
use tracing::{debug, info, warn};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

#[derive(Debug, Clone, PartialEq)]
pub enum RequestState<T> {
    Idle,
    Pending(RequestTicket),
    Loaded(T),
    Failed(UiError),
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> RequestState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    fn is_pending_for(&self, ticket: RequestTicket) -> bool {
        matches!(self, Self::Pending(pending) if *pending == ticket)
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&UiError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    fn settle(&mut self, result: Result<T, UiError>) {
        *self = match result {
            Ok(value) => Self::Loaded(value),
            Err(err) => Self::Failed(err),
        };
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CopilotState {
    #[default]
    Idle,
    Thinking {
        ticket: RequestTicket,
        question: String,
    },
    Answered {
        question: String,
        answer: String,
    },
}

impl CopilotState {
    pub fn is_thinking(&self) -> bool {
        matches!(self, Self::Thinking { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompareFiles {
    pub base: Option<PathBuf>,
    pub new: Option<PathBuf>,
}

impl CompareFiles {
    pub fn get(&self, slot: CompareSlot) -> Option<&Path> {
        match slot {
            CompareSlot::Base => self.base.as_deref(),
            CompareSlot::New => self.new.as_deref(),
        }
    }

    fn slot_mut(&mut self, slot: CompareSlot) -> &mut Option<PathBuf> {
        match slot {
            CompareSlot::Base => &mut self.base,
            CompareSlot::New => &mut self.new,
        }
    }
}

#[derive(Debug, Default)]
pub struct DashboardState {
    mode: ViewMode,
    single_file: Option<PathBuf>,
    single: RequestState<AnalysisResult>,
    copilot: CopilotState,
    compare_files: CompareFiles,
    compare: RequestState<ComparisonResult>,
    #[cfg(feature = "auth")]
    auth: RequestState<AuthAction>,
    health: RequestState<ServiceStatus>,
    status: String,
    last_ticket: RequestTicket,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    fn issue_ticket(&mut self) -> RequestTicket {
        self.last_ticket = self.last_ticket.next();
        self.last_ticket
    }

    pub fn select_mode(&mut self, mode: ViewMode) {
        match mode {
            ViewMode::Single => {
                self.compare = RequestState::Idle;
            }
            ViewMode::Compare => {
                self.single = RequestState::Idle;
                self.single_file = None;
                self.copilot = CopilotState::Idle;
            }
        }
        if self.mode != mode {
            info!(from = %self.mode, to = %mode, "switching dashboard mode");
        }
        self.mode = mode;
    }

    /// Starts an analysis of `file`. A missing file or an analysis already in
    /// flight leaves the state untouched.
    pub fn submit_single(&mut self, file: Option<PathBuf>) -> Option<BackendCommand> {
        let path = file?;
        if self.single.is_pending() {
            debug!(path = %path.display(), "analysis already in flight; ignoring submit");
            return None;
        }
        if self.mode != ViewMode::Single {
            self.select_mode(ViewMode::Single);
        }

        let ticket = self.issue_ticket();
        self.single = RequestState::Pending(ticket);
        self.single_file = Some(path.clone());
        self.copilot = CopilotState::Idle;
        self.status = "Reading...".to_string();
        Some(BackendCommand::Analyze { ticket, path })
    }

    pub fn set_compare_file(&mut self, slot: CompareSlot, file: Option<PathBuf>) {
        let target = self.compare_files.slot_mut(slot);
        if *target == file {
            return;
        }
        *target = file;

        if let RequestState::Pending(ticket) = self.compare {
            info!(
                %ticket,
                slot = slot.label(),
                "compare input changed; dropping in-flight comparison"
            );
            self.compare = RequestState::Idle;
        }
    }

    /// Starts a comparison of both selected versions.
    ///
    /// Returns `Err` without touching any state but the status line when a
    /// slot is empty, and `Ok(None)` when a comparison is already in flight.
    pub fn submit_compare(&mut self) -> Result<Option<BackendCommand>, UiError> {
        let (Some(base), Some(new)) = (
            self.compare_files.base.clone(),
            self.compare_files.new.clone(),
        ) else {
            let err = UiError::validation(UiErrorContext::Compare, "Upload both files");
            self.status = err.message().to_string();
            return Err(err);
        };
        if self.compare.is_pending() {
            debug!("comparison already in flight; ignoring submit");
            return Ok(None);
        }
        if self.mode != ViewMode::Compare {
            self.select_mode(ViewMode::Compare);
        }

        let ticket = self.issue_ticket();
        self.compare = RequestState::Pending(ticket);
        self.status = "Analyzing...".to_string();
        Ok(Some(BackendCommand::Compare { ticket, base, new }))
    }

    /// Asks the copilot about the loaded analysis. Only available in single
    /// mode once an analysis has loaded, and one question at a time.
    pub fn ask_copilot(&mut self, question: &str) -> Option<BackendCommand> {
        let question = question.trim();
        if question.is_empty() || self.mode != ViewMode::Single || self.copilot.is_thinking() {
            return None;
        }
        let RequestState::Loaded(analysis) = &self.single else {
            return None;
        };
        let extraction = analysis.extraction.clone();
        let doc_id = analysis.doc_id.clone();

        let ticket = self.issue_ticket();
        self.copilot = CopilotState::Thinking {
            ticket,
            question: question.to_string(),
        };
        Some(BackendCommand::Ask {
            ticket,
            question: question.to_string(),
            extraction,
            doc_id,
        })
    }

    #[cfg(feature = "auth")]
    pub fn submit_register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<BackendCommand>, UiError> {
        self.begin_auth(
            AuthAction::Register,
            UiErrorContext::Register,
            &[name, email, password],
        )
        .map(|ticket| {
            ticket.map(|ticket| BackendCommand::Register {
                ticket,
                name: name.trim().to_string(),
                email: email.trim().to_string(),
                password: password.to_string(),
            })
        })
    }

    #[cfg(feature = "auth")]
    pub fn submit_login(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<Option<BackendCommand>, UiError> {
        self.begin_auth(AuthAction::Login, UiErrorContext::Login, &[email, password])
            .map(|ticket| {
                ticket.map(|ticket| BackendCommand::Login {
                    ticket,
                    email: email.trim().to_string(),
                    password: password.to_string(),
                })
            })
    }

    #[cfg(feature = "auth")]
    fn begin_auth(
        &mut self,
        action: AuthAction,
        context: UiErrorContext,
        fields: &[&str],
    ) -> Result<Option<RequestTicket>, UiError> {
        if fields.iter().any(|field| field.trim().is_empty()) {
            let err = UiError::validation(context, "Fill all fields");
            self.status = err.message().to_string();
            return Err(err);
        }
        if self.auth.is_pending() {
            debug!(?action, "auth request already in flight; ignoring submit");
            return Ok(None);
        }
        let ticket = self.issue_ticket();
        self.auth = RequestState::Pending(ticket);
        Ok(Some(ticket))
    }

    pub fn request_health(&mut self) -> Option<BackendCommand> {
        if self.health.is_pending() {
            return None;
        }
        let ticket = self.issue_ticket();
        self.health = RequestState::Pending(ticket);
        Some(BackendCommand::Health { ticket })
    }

    /// Applies a backend event. Returns `false` when the event was stale and
    /// has been dropped.
    pub fn apply(&mut self, event: UiEvent) -> bool {
        match event {
            UiEvent::Error(err) => {
                warn!(context = ?err.context(), detail = ?err.detail(), "{}", err.message());
                self.status = err.message().to_string();
                true
            }
            UiEvent::AnalysisFinished { ticket, result } => {
                if !self.single.is_pending_for(ticket) {
                    return discard("analysis", ticket);
                }
                self.status = match &result {
                    Ok(_) => "Analysis complete".to_string(),
                    Err(err) => err.message().to_string(),
                };
                self.single.settle(result);
                true
            }
            UiEvent::ComparisonFinished { ticket, result } => {
                if !self.compare.is_pending_for(ticket) {
                    return discard("comparison", ticket);
                }
                self.status = match &result {
                    Ok(_) => "Comparison complete".to_string(),
                    Err(err) => err.message().to_string(),
                };
                self.compare.settle(result);
                true
            }
            UiEvent::CopilotAnswered { ticket, answer } => {
                let Some(question) = self.take_copilot_question(ticket) else {
                    return discard("copilot answer", ticket);
                };
                self.copilot = CopilotState::Answered { question, answer };
                true
            }
            #[cfg(feature = "auth")]
            UiEvent::AuthFinished {
                ticket,
                action,
                result,
            } => {
                if !self.auth.is_pending_for(ticket) {
                    return discard("auth", ticket);
                }
                self.status = match (&result, action) {
                    (Ok(()), AuthAction::Register) => "Account created!".to_string(),
                    (Ok(()), AuthAction::Login) => "Signed in".to_string(),
                    (Err(err), _) => err.message().to_string(),
                };
                self.auth.settle(result.map(|()| action));
                true
            }
            UiEvent::HealthChecked { ticket, result } => {
                if !self.health.is_pending_for(ticket) {
                    return discard("health", ticket);
                }
                self.status = match &result {
                    Ok(status) => format!("Service {}", status.status),
                    Err(err) => err.message().to_string(),
                };
                self.health.settle(result);
                true
            }
        }
    }

    /// Releases whichever branch is waiting on `ticket`, for commands that
    /// never reached the backend worker.
    pub fn abandon(&mut self, ticket: RequestTicket, reason: UiError) {
        self.status = reason.message().to_string();
        if let Some(question) = self.take_copilot_question(ticket) {
            self.copilot = CopilotState::Answered {
                question,
                answer: COPILOT_FALLBACK_ANSWER.to_string(),
            };
        } else if self.single.is_pending_for(ticket) {
            self.single = RequestState::Failed(reason);
        } else if self.compare.is_pending_for(ticket) {
            self.compare = RequestState::Failed(reason);
        } else if self.health.is_pending_for(ticket) {
            self.health = RequestState::Failed(reason);
        } else {
            self.fail_auth(ticket, reason);
        }
    }

    fn take_copilot_question(&mut self, ticket: RequestTicket) -> Option<String> {
        match &mut self.copilot {
            CopilotState::Thinking {
                ticket: pending,
                question,
            } if *pending == ticket => Some(std::mem::take(question)),
            _ => None,
        }
    }

    #[cfg(feature = "auth")]
    fn fail_auth(&mut self, ticket: RequestTicket, reason: UiError) {
        if self.auth.is_pending_for(ticket) {
            self.auth = RequestState::Failed(reason);
        }
    }

    #[cfg(not(feature = "auth"))]
    fn fail_auth(&mut self, _ticket: RequestTicket, _reason: UiError) {}

    #[cfg(feature = "auth")]
    fn auth_pending(&self) -> bool {
        self.auth.is_pending()
    }

    #[cfg(not(feature = "auth"))]
    fn auth_pending(&self) -> bool {
        false
    }

    pub fn has_pending(&self) -> bool {
        self.single.is_pending()
            || self.compare.is_pending()
            || self.health.is_pending()
            || self.copilot.is_thinking()
            || self.auth_pending()
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn single(&self) -> &RequestState<AnalysisResult> {
        &self.single
    }

    pub fn single_file(&self) -> Option<&Path> {
        self.single_file.as_deref()
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.single.loaded()
    }

    /// Metrics for the loaded analysis, recomputed on every call.
    pub fn metrics(&self) -> DerivedMetrics {
        metrics::derive(self.analysis())
    }

    pub fn copilot(&self) -> &CopilotState {
        &self.copilot
    }

    pub fn compare_files(&self) -> &CompareFiles {
        &self.compare_files
    }

    pub fn compare(&self) -> &RequestState<ComparisonResult> {
        &self.compare
    }

    pub fn comparison(&self) -> Option<&ComparisonResult> {
        self.compare.loaded()
    }

    #[cfg(feature = "auth")]
    pub fn auth(&self) -> &RequestState<AuthAction> {
        &self.auth
    }

    pub fn health(&self) -> &RequestState<ServiceStatus> {
        &self.health
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }
}

fn discard(what: &'static str, ticket: RequestTicket) -> bool {
    debug!(%ticket, "discarding stale {what} response");
    false
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
