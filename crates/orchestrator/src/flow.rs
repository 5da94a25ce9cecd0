//! Skin-lesion scale-reference flow.
//!
//! ```text
//!   none ──skin selected──▶ initial ──photo──▶ awaiting_scale ──photo──▶ scale_provided ──done──▶ none
//!                                                   │                          ▲
//!                                              no reference                  photo
//!                                                   ▼                          │
//!                                              fallback_size ──────────────────┘
//!                                                   │
//!                                                 size ──▶ none
//! ```
//!
//! [`transition`] is pure: it never performs I/O, it only tells the caller
//! which [`FlowEffect`] to carry out. Any state can be reset to `none`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vet_core::MediaRef;

/// The flow state. Each variant owns the images it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SkinFlow {
    #[default]
    None,
    Initial,
    AwaitingScale {
        first_image: MediaRef,
    },
    ScaleProvided {
        first_image: MediaRef,
        scale_image: MediaRef,
    },
    FallbackSize {
        first_image: MediaRef,
    },
}

/// Payload-free label of a [`SkinFlow`] state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkinFlowState {
    None,
    Initial,
    AwaitingScale,
    ScaleProvided,
    FallbackSize,
}

impl SkinFlowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Initial => "initial",
            Self::AwaitingScale => "awaiting_scale",
            Self::ScaleProvided => "scale_provided",
            Self::FallbackSize => "fallback_size",
        }
    }
}

impl fmt::Display for SkinFlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SkinFlow {
    pub fn state(&self) -> SkinFlowState {
        match self {
            Self::None => SkinFlowState::None,
            Self::Initial => SkinFlowState::Initial,
            Self::AwaitingScale { .. } => SkinFlowState::AwaitingScale,
            Self::ScaleProvided { .. } => SkinFlowState::ScaleProvided,
            Self::FallbackSize { .. } => SkinFlowState::FallbackSize,
        }
    }

    /// Whether the flow intercepts turns.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// The stored first lesion photo, if any.
    pub fn first_image(&self) -> Option<&MediaRef> {
        match self {
            Self::AwaitingScale { first_image }
            | Self::ScaleProvided { first_image, .. }
            | Self::FallbackSize { first_image } => Some(first_image),
            Self::None | Self::Initial => None,
        }
    }
}

/// Inputs to the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    /// The user picked the skin category.
    SkinTopicSelected,
    /// The user sent a photo.
    Photo(MediaRef),
    /// The user has nothing to use as a size reference.
    NoReferenceAvailable,
    /// Free text or a quick-pick describing the lesion size.
    SizeDescription(String),
    /// The paired analysis finished.
    AnalysisCompleted,
    /// New consultation or topic change.
    Reset,
}

impl FlowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SkinTopicSelected => "skin_topic_selected",
            Self::Photo(_) => "photo",
            Self::NoReferenceAvailable => "no_reference_available",
            Self::SizeDescription(_) => "size_description",
            Self::AnalysisCompleted => "analysis_completed",
            Self::Reset => "reset",
        }
    }
}

/// What the caller must do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEffect {
    None,
    PromptLesionPhoto,
    PromptScalePhoto,
    PromptSizeDescription,
    AnalyzePair {
        first_image: MediaRef,
        scale_image: MediaRef,
    },
    AnalyzeWithSize {
        first_image: MediaRef,
        size_hint: String,
    },
}

/// Result of a state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowTransition {
    pub next: SkinFlow,
    pub effect: FlowEffect,
}

impl FlowTransition {
    fn new(next: SkinFlow, effect: FlowEffect) -> Self {
        Self { next, effect }
    }
}

/// Errors that can occur during a flow transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("invalid flow transition: {event} while {state}")]
    InvalidTransition {
        state: SkinFlowState,
        event: &'static str,
    },
    #[error("size description is empty")]
    EmptySizeDescription,
}

/// Pure transition function.
pub fn transition(flow: &SkinFlow, event: FlowEvent) -> Result<FlowTransition, FlowError> {
    match (flow, event) {
        (_, FlowEvent::Reset) => Ok(FlowTransition::new(SkinFlow::None, FlowEffect::None)),

        (SkinFlow::None | SkinFlow::Initial, FlowEvent::SkinTopicSelected) => Ok(
            FlowTransition::new(SkinFlow::Initial, FlowEffect::PromptLesionPhoto),
        ),

        (SkinFlow::Initial, FlowEvent::Photo(image)) => Ok(FlowTransition::new(
            SkinFlow::AwaitingScale { first_image: image },
            FlowEffect::PromptScalePhoto,
        )),

        (
            SkinFlow::AwaitingScale { first_image } | SkinFlow::FallbackSize { first_image },
            FlowEvent::Photo(scale_image),
        ) => Ok(FlowTransition::new(
            SkinFlow::ScaleProvided {
                first_image: first_image.clone(),
                scale_image: scale_image.clone(),
            },
            FlowEffect::AnalyzePair {
                first_image: first_image.clone(),
                scale_image,
            },
        )),

        (
            SkinFlow::AwaitingScale { first_image } | SkinFlow::FallbackSize { first_image },
            FlowEvent::NoReferenceAvailable,
        ) => Ok(FlowTransition::new(
            SkinFlow::FallbackSize {
                first_image: first_image.clone(),
            },
            FlowEffect::PromptSizeDescription,
        )),

        (SkinFlow::FallbackSize { first_image }, FlowEvent::SizeDescription(size)) => {
            let size = size.trim();
            if size.is_empty() {
                return Err(FlowError::EmptySizeDescription);
            }
            Ok(FlowTransition::new(
                SkinFlow::None,
                FlowEffect::AnalyzeWithSize {
                    first_image: first_image.clone(),
                    size_hint: size.to_string(),
                },
            ))
        }

        (SkinFlow::ScaleProvided { .. }, FlowEvent::AnalysisCompleted) => {
            Ok(FlowTransition::new(SkinFlow::None, FlowEffect::None))
        }

        (state, event) => Err(FlowError::InvalidTransition {
            state: state.state(),
            event: event.name(),
        }),
    }
}
