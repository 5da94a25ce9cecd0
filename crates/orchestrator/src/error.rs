//! Error types for orchestrator operations.

use std::time::Duration;

use thiserror::Error;
use vet_core::BackendError;

use crate::flow::FlowError;

/// Errors that can occur while handling a turn.
///
/// None of these escape [`crate::Orchestrator::handle_turn`]: backend
/// failures become an apology message and flow errors reset the flow.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Backend or analysis processing failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// A delegated call exceeded its deadline.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// The skin flow rejected an event.
    #[error("flow error: {0}")]
    Flow(#[from] FlowError),

    /// The backend replied with a function call the orchestrator cannot run.
    #[error("unsupported function call: {0}")]
    UnsupportedFunction(String),
}

impl OrchestratorError {
    /// Short machine-readable label, used in analytics events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Backend(BackendError::Timeout) | Self::Timeout(_) => "timeout",
            Self::Backend(BackendError::QuotaExceeded(_)) => "quota_exceeded",
            Self::Backend(BackendError::Unavailable(_)) => "unavailable",
            Self::Backend(_) => "backend",
            Self::Flow(_) => "flow",
            Self::UnsupportedFunction(_) => "unsupported_function",
        }
    }
}
