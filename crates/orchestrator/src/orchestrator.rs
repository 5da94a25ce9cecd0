//! Turn orchestrator that coordinates classification, flows and delegation.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tracing::{debug, error, info, trace, warn};
use vet_core::{
    AnalysisKind, AnalysisRequest, AnalysisService, AnalyticsEvent, AssistantBackend,
    BackendError, EventName, EventSink, FlowPrompt, FunctionCall, Language,
    LanguagePreference, MediaKind, MediaRef, Message, MessageStore, NoOpEventSink, NoOpStore,
    QuickAction, Topic,
};

use crate::config::OrchestratorConfig;
use crate::context::Context;
use crate::continuity::{self, ContinuityDecision, FollowUpContext, TurnSignals};
use crate::conversation::Conversation;
use crate::error::OrchestratorError;
use crate::flow::{self, FlowEffect, FlowEvent, SkinFlow};
use crate::formatting;
use crate::language::{self, LanguageDecision};
use crate::persistence::PersistenceQueue;
use crate::registry::ConversationRegistry;
use crate::replies;
use crate::router::Router;
use crate::signals;

/// One inbound user turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnInput {
    /// Raw user text, possibly empty.
    pub text: String,
    /// At most one attachment.
    pub media: Option<MediaRef>,
    /// A UI quick action (topic chip, "no reference", size pick).
    pub action: Option<QuickAction>,
}

impl TurnInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn media(media: MediaRef) -> Self {
        Self {
            media: Some(media),
            ..Self::default()
        }
    }

    pub fn action(action: QuickAction) -> Self {
        Self {
            action: Some(action),
            ..Self::default()
        }
    }

    pub fn with_media(mut self, media: MediaRef) -> Self {
        self.media = Some(media);
        self
    }

    /// No text, no media and no action.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.media.is_none() && self.action.is_none()
    }

    fn image(&self) -> Option<&MediaRef> {
        self.media.as_ref().filter(|m| m.is_image())
    }
}

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    /// Nothing was appended.
    Ignored,
    /// The turn was handled and its replies appended.
    Completed,
    /// A collaborator failed; an apology was appended and topic/flow kept.
    Failed,
}

/// Result of handling one turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Messages appended after the user's own message.
    pub outbound: Vec<Message>,
    pub status: TurnStatus,
    pub language: Option<LanguageDecision>,
    pub new_consultation: bool,
    /// The delegated request was tagged as a follow-up answer.
    pub follow_up: bool,
}

impl TurnOutcome {
    fn ignored() -> Self {
        Self {
            outbound: Vec::new(),
            status: TurnStatus::Ignored,
            language: None,
            new_consultation: false,
            follow_up: false,
        }
    }

    /// Text of the first outbound message, if any.
    pub fn reply_text(&self) -> Option<&str> {
        self.outbound.first().map(Message::content)
    }
}

/// Per-turn facts shared by the dispatch steps.
struct TurnState<'a> {
    text: &'a str,
    language: Language,
    follow_up: FollowUpContext,
    continuity: ContinuityDecision,
    /// Number of messages before this turn's user message.
    prior_len: usize,
}

impl TurnState<'_> {
    fn tag_follow_up(&self) -> bool {
        self.follow_up.is_follow_up && !self.continuity.new_consultation
    }
}

/// Main orchestrator that handles every user turn.
///
/// The orchestrator:
/// - Resolves the response language
/// - Decides whether the turn continues the open consultation
/// - Drives the skin-lesion scale flow
/// - Routes photos to the specialized analyses
/// - Delegates everything else to the conversational backend
/// - Turns backend failures into a localized apology without losing state
pub struct Orchestrator<B: AssistantBackend, A: AnalysisService> {
    backend: B,
    analysis: A,
    router: Router,
    registry: ConversationRegistry,
    persistence: PersistenceQueue,
    events: Arc<dyn EventSink>,
    config: OrchestratorConfig,
}

impl<B: AssistantBackend, A: AnalysisService> Orchestrator<B, A> {
    /// Create an orchestrator that persists nothing and emits no analytics.
    pub fn new(backend: B, analysis: A, config: OrchestratorConfig) -> Self {
        Self::with_collaborators(
            backend,
            analysis,
            Arc::new(NoOpStore),
            Arc::new(NoOpEventSink),
            config,
        )
    }

    /// Create an orchestrator with configuration from environment variables.
    pub fn from_env(backend: B, analysis: A) -> Self {
        Self::new(backend, analysis, OrchestratorConfig::from_env())
    }

    /// Create an orchestrator with all collaborators.
    pub fn with_collaborators(
        backend: B,
        analysis: A,
        store: Arc<dyn MessageStore>,
        events: Arc<dyn EventSink>,
        config: OrchestratorConfig,
    ) -> Self {
        info!(
            backend = backend.name(),
            analysis = analysis.name(),
            timeout = ?config.backend_timeout,
            "Creating orchestrator"
        );
        Self {
            backend,
            analysis,
            router: Router::new(),
            registry: ConversationRegistry::new(config.max_conversations),
            persistence: PersistenceQueue::new(store),
            events,
            config,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn analysis(&self) -> &A {
        &self.analysis
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn registry(&self) -> &ConversationRegistry {
        &self.registry
    }

    /// Process a turn for a registered conversation.
    ///
    /// Turns for the same conversation are serialized in arrival order;
    /// different conversations run concurrently.
    pub async fn process(&self, conversation_id: &str, browser_locale: &str, input: TurnInput) -> TurnOutcome {
        let slot = self.registry.get_or_create(conversation_id, browser_locale).await;
        let mut conversation = slot.lock().await;
        self.handle_turn(&mut conversation, input).await
    }

    /// Explicitly select a topic for a registered conversation.
    pub async fn select_topic_for(&self, conversation_id: &str, browser_locale: &str, topic: Topic) -> TurnOutcome {
        let slot = self.registry.get_or_create(conversation_id, browser_locale).await;
        let mut conversation = slot.lock().await;
        self.select_topic(&mut conversation, topic).await
    }

    /// Set the explicit language preference for a registered conversation.
    pub async fn set_language_preference(&self, conversation_id: &str, browser_locale: &str, preference: LanguagePreference) {
        let slot = self.registry.get_or_create(conversation_id, browser_locale).await;
        slot.lock().await.set_language_preference(preference);
    }

    /// Whether a turn is in flight for the conversation.
    pub async fn is_processing(&self, conversation_id: &str) -> bool {
        self.registry.is_busy(conversation_id).await
    }

    /// A copy of the conversation once any in-flight turn has finished.
    pub async fn conversation(&self, conversation_id: &str) -> Option<Conversation> {
        self.registry.snapshot(conversation_id).await
    }

    /// Wait until every queued message has been handed to the store.
    pub async fn flush(&self) {
        self.persistence.flush().await;
    }

    /// Explicit topic selection. Always resets the skin flow; selecting skin
    /// starts it and asks for the lesion photo.
    ///
    /// Like every turn, this must run inside a Tokio runtime: the first
    /// persisted message starts the background writer.
    pub async fn select_topic(&self, conversation: &mut Conversation, topic: Topic) -> TurnOutcome {
        let decision = self.resolve_language(conversation, "");
        let language = decision.language;

        conversation.set_topic(topic);
        conversation.set_flow(SkinFlow::None);

        let mut outbound = Vec::new();
        if topic == Topic::Skin {
            match flow::transition(conversation.flow(), FlowEvent::SkinTopicSelected) {
                Ok(t) => {
                    info!(from = "none", to = %t.next.state(), "FLOW_TRANSITION");
                    conversation.set_flow(t.next);
                    outbound.push(replies::prompt_message(FlowPrompt::RequestLesionPhoto, language, None));
                }
                Err(e) => warn!(error = %e, "FLOW_TRANSITION_REJECTED"),
            }
        } else if let Some(kind) = topic.analysis_kind() {
            outbound.push(replies::prompt_message(FlowPrompt::RequestAnalysisPhoto, language, Some(kind)));
        }

        info!(conversation = %conversation.id(), topic = topic.as_str(), "Topic selected");
        self.commit(conversation, &outbound, language);

        TurnOutcome {
            status: if outbound.is_empty() { TurnStatus::Ignored } else { TurnStatus::Completed },
            outbound,
            language: Some(decision),
            new_consultation: false,
            follow_up: false,
        }
    }

    /// Handle one user turn end-to-end.
    ///
    /// Never fails: collaborator errors become a localized apology, with the
    /// user's message and the apology appended and topic/flow left as they
    /// were before the turn.
    pub async fn handle_turn(&self, conversation: &mut Conversation, mut input: TurnInput) -> TurnOutcome {
        // 1. Guard
        if input.is_empty() {
            let after_analysis = conversation
                .last()
                .map(Message::is_image_analysis_result)
                .unwrap_or(false);
            trace!(conversation = %conversation.id(), after_analysis, "TURN_GUARD");
            return TurnOutcome::ignored();
        }

        if let Some(QuickAction::SelectTopic { topic }) = input.action {
            return self.select_topic(conversation, topic).await;
        }

        // A quick action from an earlier prompt the flow has moved past.
        if let Some(action) = input.action {
            if !Self::flow_accepts(conversation.flow(), action) {
                debug!(
                    conversation = %conversation.id(),
                    action = ?action,
                    flow = %conversation.flow().state(),
                    "STALE_ACTION"
                );
                input.action = None;
                if input.is_empty() {
                    return TurnOutcome::ignored();
                }
            }
        }

        info!(
            conversation = %conversation.id(),
            text_len = input.text.len(),
            media = ?input.media.as_ref().map(|m| m.kind),
            action = ?input.action,
            "Processing turn"
        );

        // 2. Language
        let decision = self.resolve_language(conversation, &input.text);
        let language = decision.language;

        // The user's message is appended before classification so the
        // classifiers see the updated history.
        let user_message = Self::user_message(&input, language);
        let prior_len = conversation.len();
        let mut working = conversation.clone();
        working.push(user_message.clone());
        self.persist(conversation.id(), &user_message, language);

        // 3. Follow-up context from the last assistant message
        let follow_up = FollowUpContext::from_history(working.messages(), &self.config.thresholds);

        // 4. Continuity
        let signals = TurnSignals {
            text: &input.text,
            has_media: input.media.is_some(),
            current_topic: working.topic(),
            flow_active: working.flow().is_active(),
            history_len: working.len(),
        };
        let continuity = continuity::classify(&signals, &follow_up, &self.config.thresholds);
        info!(
            new_consultation = continuity.new_consultation,
            reason = ?continuity.reason,
            follow_up = follow_up.is_follow_up,
            "CONTINUITY_DECISION"
        );

        // 5. Reset on a new consultation
        if continuity.new_consultation {
            working.reset_consultation();
        }

        let turn = TurnState {
            text: &input.text,
            language,
            follow_up,
            continuity,
            prior_len,
        };

        match self.dispatch(&mut working, &input, &turn).await {
            Ok(outbound) => {
                self.commit(&mut working, &outbound, language);
                *conversation = working;
                TurnOutcome {
                    outbound,
                    status: TurnStatus::Completed,
                    language: Some(decision),
                    new_consultation: turn.continuity.new_consultation,
                    follow_up: turn.tag_follow_up(),
                }
            }
            Err(e) => {
                error!(
                    conversation = %conversation.id(),
                    error = %e,
                    kind = e.kind(),
                    "BACKEND_FAILED"
                );
                conversation.push(user_message);
                let apology = vec![Message::assistant(replies::apology(language))];
                self.commit(conversation, &apology, language);
                TurnOutcome {
                    outbound: apology,
                    status: TurnStatus::Failed,
                    language: Some(decision),
                    new_consultation: turn.continuity.new_consultation,
                    follow_up: turn.tag_follow_up(),
                }
            }
        }
    }

    /// Steps 6-8: guided flow, specialized routing, generic delegation.
    async fn dispatch(
        &self,
        working: &mut Conversation,
        input: &TurnInput,
        turn: &TurnState<'_>,
    ) -> Result<Vec<Message>, OrchestratorError> {
        // 6. Guided flow has priority over generic routing
        if let Some(event) = Self::flow_event(working.flow(), input, turn.language) {
            if let Some(outbound) = self.advance_flow(working, event, turn).await? {
                return Ok(outbound);
            }
        }

        // 7. Specialized analysis
        let recent = Self::recent_history(working, turn, self.config.history_window);
        let route = self.router.route(turn.text, input.media.is_some(), recent);
        let image = input.image().cloned();

        let kind = route.kind.or_else(|| {
            image
                .as_ref()
                .and_then(|_| working.topic())
                .and_then(|topic| topic.analysis_kind())
        });

        match (kind, image) {
            (Some(kind), Some(image)) => {
                working.set_topic(kind.topic());
                let report = self
                    .run_analysis(AnalysisRequest::new(kind, vec![image.clone()], turn.text, turn.language))
                    .await?;
                return Ok(vec![Message::analysis_result(report, Some(image))]);
            }
            (Some(kind), None) if working.topic().is_none() => {
                debug!(topic = kind.topic().as_str(), "Topic set from text route");
                working.set_topic(kind.topic());
            }
            _ => {}
        }

        // 8. Generic delegation
        self.delegate(working, input, turn).await
    }

    /// Whether the current flow state offers this quick action.
    fn flow_accepts(flow: &SkinFlow, action: QuickAction) -> bool {
        match action {
            QuickAction::NoScaleReference => {
                matches!(flow, SkinFlow::AwaitingScale { .. } | SkinFlow::FallbackSize { .. })
            }
            QuickAction::SizeCategory { .. } => matches!(flow, SkinFlow::FallbackSize { .. }),
            QuickAction::SelectTopic { .. } => true,
        }
    }

    /// Map a turn onto a flow event, if the active flow expects it.
    ///
    /// Quick actions have already been checked against the flow state.
    /// Unexpected input returns `None` and falls through to routing.
    fn flow_event(flow: &SkinFlow, input: &TurnInput, language: Language) -> Option<FlowEvent> {
        match input.action {
            Some(QuickAction::NoScaleReference) => return Some(FlowEvent::NoReferenceAvailable),
            Some(QuickAction::SizeCategory { size }) => {
                return Some(FlowEvent::SizeDescription(size.description(language).to_string()))
            }
            _ => {}
        }

        let text = input.text.trim();
        match flow {
            SkinFlow::Initial | SkinFlow::AwaitingScale { .. } | SkinFlow::FallbackSize { .. }
                if input.image().is_some() =>
            {
                input.image().cloned().map(FlowEvent::Photo)
            }
            SkinFlow::AwaitingScale { .. } if signals::is_no_reference_reply(text) => {
                Some(FlowEvent::NoReferenceAvailable)
            }
            SkinFlow::FallbackSize { .. } if !text.is_empty() && input.media.is_none() => {
                Some(FlowEvent::SizeDescription(text.to_string()))
            }
            _ => None,
        }
    }

    /// Apply a flow event. `Ok(None)` means the transition function rejected
    /// the event, which only an invariant violation can cause: the flow is
    /// reset and the turn falls through to routing.
    async fn advance_flow(
        &self,
        working: &mut Conversation,
        event: FlowEvent,
        turn: &TurnState<'_>,
    ) -> Result<Option<Vec<Message>>, OrchestratorError> {
        let from = working.flow().state();
        let transition = match flow::transition(working.flow(), event) {
            Ok(transition) => transition,
            Err(e) => {
                warn!(from = %from, error = %e, "FLOW_TRANSITION_REJECTED");
                working.set_flow(SkinFlow::None);
                return Ok(None);
            }
        };
        info!(from = %from, to = %transition.next.state(), "FLOW_TRANSITION");

        let language = turn.language;
        let outbound = match transition.effect {
            FlowEffect::None => {
                working.set_flow(transition.next);
                Vec::new()
            }
            FlowEffect::PromptLesionPhoto => {
                working.set_flow(transition.next);
                vec![replies::prompt_message(FlowPrompt::RequestLesionPhoto, language, None)]
            }
            FlowEffect::PromptScalePhoto => {
                working.set_flow(transition.next);
                vec![replies::prompt_message(FlowPrompt::RequestScalePhoto, language, None)]
            }
            FlowEffect::PromptSizeDescription => {
                working.set_flow(transition.next);
                vec![replies::prompt_message(FlowPrompt::RequestSizeDescription, language, None)]
            }
            FlowEffect::AnalyzePair {
                first_image,
                scale_image,
            } => {
                let request = AnalysisRequest::new(
                    AnalysisKind::Skin,
                    vec![first_image.clone(), scale_image],
                    turn.text,
                    language,
                );
                let report = self.run_analysis(request).await?;
                let done = flow::transition(&transition.next, FlowEvent::AnalysisCompleted)?;
                info!(from = %transition.next.state(), to = %done.next.state(), "FLOW_TRANSITION");
                working.set_flow(done.next);
                vec![Message::analysis_result(report, Some(first_image))]
            }
            FlowEffect::AnalyzeWithSize {
                first_image,
                size_hint,
            } => {
                let request = AnalysisRequest::new(
                    AnalysisKind::Skin,
                    vec![first_image.clone()],
                    turn.text,
                    language,
                )
                .with_size_hint(size_hint);
                let report = self.run_analysis(request).await?;
                working.set_flow(transition.next);
                vec![Message::analysis_result(report, Some(first_image))]
            }
        };

        Ok(Some(outbound))
    }

    /// Send the turn to the conversational backend.
    async fn delegate(
        &self,
        working: &mut Conversation,
        input: &TurnInput,
        turn: &TurnState<'_>,
    ) -> Result<Vec<Message>, OrchestratorError> {
        let mut context = Context::new()
            .with_follow_up(turn.tag_follow_up())
            .with_topic(working.topic());
        if !turn.continuity.new_consultation {
            context = context.with_history(
                &working.messages()[..turn.prior_len],
                self.config.history_window,
                self.config.history_entry_max_chars,
            );
        }
        debug!("Delegation context: {}", context.format_summary());

        let request = context.build_request(turn.text, turn.language);
        let reply = match &input.media {
            None => self.with_deadline(self.backend.send_text(&request)).await?,
            Some(media) => match media.kind {
                MediaKind::Image => self.with_deadline(self.backend.send_image(&request, media)).await?,
                MediaKind::Video => self.with_deadline(self.backend.send_video(&request, media)).await?,
                MediaKind::Audio => self.with_deadline(self.backend.send_audio(&request, media)).await?,
            },
        };

        if let Some(call) = FunctionCall::parse(&reply) {
            return self.dispatch_function_call(working, call, input, turn).await;
        }

        Ok(vec![Message::assistant(reply.trim())])
    }

    /// Run the analysis a function-call sentinel asks for.
    async fn dispatch_function_call(
        &self,
        working: &mut Conversation,
        call: FunctionCall,
        input: &TurnInput,
        turn: &TurnState<'_>,
    ) -> Result<Vec<Message>, OrchestratorError> {
        let Some(kind) = call.analysis_kind() else {
            return Err(OrchestratorError::UnsupportedFunction(call.name));
        };
        info!(function = %call.name, kind = kind.as_str(), "FUNCTION_CALL");

        working.set_topic(kind.topic());

        if let Some(image) = input.image() {
            let report = self
                .run_analysis(AnalysisRequest::new(kind, vec![image.clone()], turn.text, turn.language))
                .await?;
            return Ok(vec![Message::analysis_result(report, Some(image.clone()))]);
        }

        if kind == AnalysisKind::Skin {
            if let Ok(t) = flow::transition(working.flow(), FlowEvent::SkinTopicSelected) {
                info!(from = %working.flow().state(), to = %t.next.state(), "FLOW_TRANSITION");
                working.set_flow(t.next);
                return Ok(vec![replies::prompt_message(
                    FlowPrompt::RequestLesionPhoto,
                    turn.language,
                    None,
                )]);
            }
        }

        Ok(vec![replies::prompt_message(
            FlowPrompt::RequestAnalysisPhoto,
            turn.language,
            Some(kind),
        )])
    }

    /// Run a specialized analysis under the deadline and format its report.
    async fn run_analysis(&self, request: AnalysisRequest) -> Result<String, OrchestratorError> {
        let kind = request.kind;
        self.emit(
            AnalyticsEvent::new(EventName::AnalysisStarted)
                .with("kind", kind.as_str())
                .with("images", request.images.len())
                .with("language", request.language.code())
                .with("size_hint", request.size_hint.is_some()),
        );

        let started = Instant::now();
        match self.with_deadline(self.analysis.analyze(&request)).await {
            Ok(raw) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                self.emit(
                    AnalyticsEvent::new(EventName::AnalysisCompleted)
                        .with("kind", kind.as_str())
                        .with("duration_ms", duration_ms),
                );
                debug!(kind = kind.as_str(), raw_len = raw.len(), "Analysis completed");
                Ok(formatting::format_report(kind, &raw, request.language))
            }
            Err(e) => {
                self.emit(
                    AnalyticsEvent::new(EventName::AnalysisError)
                        .with("kind", kind.as_str())
                        .with("error", e.kind()),
                );
                Err(e)
            }
        }
    }

    /// Await a collaborator call under the configured deadline.
    async fn with_deadline<F>(&self, call: F) -> Result<String, OrchestratorError>
    where
        F: Future<Output = Result<String, BackendError>>,
    {
        match tokio::time::timeout(self.config.backend_timeout, call).await {
            Ok(result) => result.map_err(OrchestratorError::from),
            Err(_) => Err(OrchestratorError::Timeout(self.config.backend_timeout)),
        }
    }

    fn resolve_language(&self, conversation: &mut Conversation, text: &str) -> LanguageDecision {
        let decision = language::resolve(
            conversation.language_preference(),
            text,
            conversation.browser_locale(),
            self.config.thresholds.language_margin,
        );
        trace!(language = decision.language.code(), source = ?decision.source, "LANGUAGE_DECISION");

        if let Some(previous) = conversation.record_language(decision.language) {
            self.emit(
                AnalyticsEvent::new(EventName::LanguageChanged)
                    .with("from", previous.code())
                    .with("to", decision.language.code())
                    .with("source", json!(decision.source)),
            );
        }
        decision
    }

    /// Recent history for the router, excluding the current turn.
    ///
    /// A new consultation starts with no history.
    fn recent_history<'c>(working: &'c Conversation, turn: &TurnState<'_>, window: usize) -> &'c [Message] {
        if turn.continuity.new_consultation {
            return &[];
        }
        let prior = &working.messages()[..turn.prior_len];
        let start = prior.len().saturating_sub(window);
        &prior[start..]
    }

    /// The transcript entry for the user's side of a turn.
    ///
    /// Quick actions without text are recorded with their label so the
    /// transcript stays readable.
    fn user_message(input: &TurnInput, language: Language) -> Message {
        let text = match (input.text.trim().is_empty(), input.action) {
            (true, Some(QuickAction::NoScaleReference)) => {
                language.pick("No tengo referencia", "No reference available").to_string()
            }
            (true, Some(QuickAction::SizeCategory { size })) => size.description(language).to_string(),
            _ => input.text.clone(),
        };
        Message::user(text, input.media.clone())
    }

    /// Append outbound messages, persist them and emit `message_sent`.
    fn commit(&self, conversation: &mut Conversation, outbound: &[Message], language: Language) {
        for message in outbound {
            conversation.push(message.clone());
            self.persist(conversation.id(), message, language);
        }
    }

    fn persist(&self, conversation_id: &str, message: &Message, language: Language) {
        self.persistence.enqueue(conversation_id, message);
        self.emit(
            AnalyticsEvent::new(EventName::MessageSent)
                .with("conversation", conversation_id)
                .with("role", json!(message.role))
                .with("has_media", message.media.is_some())
                .with("analysis_result", message.is_analysis_result)
                .with("language", language.code()),
        );
    }

    fn emit(&self, event: AnalyticsEvent) {
        trace!(event = event.name.as_str(), "ANALYTICS_EVENT");
        self.events.emit(event);
    }
}
