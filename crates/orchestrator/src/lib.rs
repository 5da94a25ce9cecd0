//! Turn orchestration engine for the pet-health consultation assistant.
//!
//! This crate provides the [`Orchestrator`] type which decides, for every
//! inbound user turn, what language to answer in, whether the turn continues
//! the open consultation, which specialized analysis applies, and how the
//! guided skin-lesion flow advances.
//!
//! # Features
//!
//! - Lexical language detection with explicit-preference and locale fallbacks
//! - Follow-up aware continuity classification (never re-asks what was answered)
//! - Keyword routing to skin, ocular, body-condition and posture analyses
//! - A pure, tagged-union state machine for the skin scale-reference flow
//! - Deadlines on every collaborator call, with a localized apology on failure
//! - Per-conversation turn serialization with a bounded LRU registry
//!
//! # Architecture
//!
//! ```text
//! User turn (text / one media item / quick action)
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ORCHESTRATOR                           │
//! │                                                             │
//! │  1. Guard: empty turn after an analysis → no-op             │
//! │         ↓                                                   │
//! │  2. Resolve language (explicit → detected → locale)         │
//! │         ↓                                                   │
//! │  3. Follow-up context from last assistant message           │
//! │         ↓                                                   │
//! │  4. New consultation? → reset topic and flow                │
//! │         ↓                                                   │
//! │  5. Skin flow active? → advance flow                        │
//! │         ↓                                                   │
//! │  6. Router: image + category → specialized analysis         │
//! │         ↓                                                   │
//! │  7. Otherwise delegate to backend (history, follow-up tag)  │
//! │     • function-call sentinel → run the named analysis       │
//! │         ↓                                                   │
//! │  8. Append replies, persist, emit analytics                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use orchestrator::{Orchestrator, OrchestratorConfig, TurnInput};
//!
//! let orchestrator = Orchestrator::new(backend, analysis, OrchestratorConfig::from_env());
//!
//! let outcome = orchestrator
//!     .process("session-42", "es-AR", TurnInput::text("Mi perro tiene un bulto en la pata"))
//!     .await;
//!
//! for message in &outcome.outbound {
//!     println!("{}", message.content());
//! }
//! ```

mod config;
mod context;
mod continuity;
mod conversation;
mod error;
mod flow;
mod formatting;
mod language;
mod orchestrator;
mod persistence;
mod registry;
mod replies;
mod router;
mod signals;

// Public exports
pub use config::{OrchestratorConfig, Thresholds, DEFAULT_BACKEND_TIMEOUT_SECS};
pub use context::{follow_up_directive, Context, FOLLOW_UP_TAG, USER_MESSAGE_TAG};
pub use continuity::{
    classify, is_new_consultation, ContinuityDecision, ContinuityReason, FollowUpContext,
    TurnSignals,
};
pub use conversation::Conversation;
pub use error::OrchestratorError;
pub use flow::{
    transition, FlowEffect, FlowError, FlowEvent, FlowTransition, SkinFlow, SkinFlowState,
};
pub use formatting::{default_report, format_report, parse_findings, AnalysisFindings};
pub use language::{resolve as resolve_language, score_language, LanguageDecision, LanguageScore, LanguageSource};
pub use orchestrator::{Orchestrator, TurnInput, TurnOutcome, TurnStatus};
pub use persistence::{LoggingStore, PersistenceQueue};
pub use registry::{ConversationRegistry, ConversationSlot, DEFAULT_MAX_CONVERSATIONS};
pub use replies::{apology, prompt_message, prompt_text};
pub use router::{RouteDecision, RouteReason, Router};
pub use signals::{
    has_list, has_medical_vocabulary, is_follow_up_request, is_greeting, is_no_reference_reply,
    is_photo_request, opens_with_greeting, PhraseMatcher,
};

// Re-export commonly used types from dependencies
pub use vet_core::{
    AnalysisKind, AssistantBackend, AnalysisService, FlowPrompt, Language, LanguagePreference,
    MediaRef, Message, QuickAction, SizeCategory, Topic,
};
