//! Backend commands queued from UI to backend worker.

use std::path::PathBuf;

use shared::{domain::RequestTicket, protocol::Extraction};

#[derive(Debug, Clone)]
pub enum BackendCommand {
    Analyze {
        ticket: RequestTicket,
        path: PathBuf,
    },
    Compare {
        ticket: RequestTicket,
        base: PathBuf,
        new: PathBuf,
    },
    Ask {
        ticket: RequestTicket,
        question: String,
        extraction: Extraction,
        doc_id: Option<String>,
    },
    #[cfg(feature = "auth")]
    Register {
        ticket: RequestTicket,
        name: String,
        email: String,
        password: String,
    },
    #[cfg(feature = "auth")]
    Login {
        ticket: RequestTicket,
        email: String,
        password: String,
    },
    Health {
        ticket: RequestTicket,
    },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Analyze { .. } => "analyze",
            Self::Compare { .. } => "compare",
            Self::Ask { .. } => "ask",
            #[cfg(feature = "auth")]
            Self::Register { .. } => "register",
            #[cfg(feature = "auth")]
            Self::Login { .. } => "login",
            Self::Health { .. } => "health",
        }
    }

    pub fn ticket(&self) -> RequestTicket {
        match self {
            Self::Analyze { ticket, .. }
            | Self::Compare { ticket, .. }
            | Self::Ask { ticket, .. }
            | Self::Health { ticket } => *ticket,
            #[cfg(feature = "auth")]
            Self::Register { ticket, .. } | Self::Login { ticket, .. } => *ticket,
        }
    }
}
