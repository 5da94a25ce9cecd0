//! Interactive console consultation example.
//!
//! Wires the orchestrator to mock collaborators so every decision (language,
//! continuity, routing, skin flow) can be tried from a terminal.
//!
//! Run with: cargo run -p orchestrator --example console_chat
//!
//! Configuration via .env file or environment variables:
//!   VET_BROWSER_LOCALE        - Locale used when language cannot be detected (default: es-AR)
//!   VET_BACKEND_TIMEOUT_SECS  - Deadline per delegated call (default: 15)
//!   RUST_LOG                  - Log filter (e.g. orchestrator=debug)
//!
//! Input lines:
//!   <text>                    - Plain text turn
//!   /image <id> [text]        - Photo (optionally with text)
//!   /video <id> [text]        - Video
//!   /audio <id> [text]        - Audio recording
//!   /topic <skin|eye|obesity|dysplasia|cardio|other>
//!   /noref                    - "No reference available" quick action
//!   /size <small|medium|large>
//!   /lang <es|en|auto>

use std::env;
use std::sync::Arc;

use mock_backend::{EchoBackend, FixedAnalysis};
use orchestrator::{
    LanguagePreference, LoggingStore, MediaRef, Orchestrator, OrchestratorConfig, QuickAction,
    SizeCategory, Topic, TurnInput,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use vet_core::NoOpEventSink;

const CONVERSATION_ID: &str = "console";

enum Command {
    Turn(TurnInput),
    Language(LanguagePreference),
    Invalid(String),
}

fn parse_topic(name: &str) -> Option<Topic> {
    match name {
        "skin" => Some(Topic::Skin),
        "eye" => Some(Topic::Eye),
        "obesity" => Some(Topic::Obesity),
        "dysplasia" => Some(Topic::Dysplasia),
        "cardio" => Some(Topic::Cardio),
        "other" => Some(Topic::Other),
        _ => None,
    }
}

fn parse_size(name: &str) -> Option<SizeCategory> {
    match name {
        "small" => Some(SizeCategory::Small),
        "medium" => Some(SizeCategory::Medium),
        "large" => Some(SizeCategory::Large),
        _ => None,
    }
}

fn parse_line(line: &str) -> Command {
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Turn(TurnInput::text(line));
    };

    let mut parts = rest.splitn(3, ' ');
    let command = parts.next().unwrap_or_default();
    let arg = parts.next().unwrap_or_default();
    let text = parts.next().unwrap_or_default();

    match command {
        "image" if !arg.is_empty() => Command::Turn(TurnInput::text(text).with_media(MediaRef::image(arg))),
        "video" if !arg.is_empty() => Command::Turn(TurnInput::text(text).with_media(MediaRef::video(arg))),
        "audio" if !arg.is_empty() => Command::Turn(TurnInput::text(text).with_media(MediaRef::audio(arg))),
        "topic" => match parse_topic(arg) {
            Some(topic) => Command::Turn(TurnInput::action(QuickAction::SelectTopic { topic })),
            None => Command::Invalid(format!("unknown topic: {}", arg)),
        },
        "noref" => Command::Turn(TurnInput::action(QuickAction::NoScaleReference)),
        "size" => match parse_size(arg) {
            Some(size) => Command::Turn(TurnInput::action(QuickAction::SizeCategory { size })),
            None => Command::Invalid(format!("unknown size: {}", arg)),
        },
        "lang" => Command::Language(LanguagePreference::from_str(arg)),
        _ => Command::Invalid(format!("unknown command: /{}", command)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("orchestrator=info".parse()?),
        )
        .init();

    let locale = env::var("VET_BROWSER_LOCALE").unwrap_or_else(|_| "es-AR".to_string());

    let orchestrator = Orchestrator::with_collaborators(
        EchoBackend::with_prefix("[assistant]"),
        FixedAnalysis::default(),
        Arc::new(LoggingStore),
        Arc::new(NoOpEventSink),
        OrchestratorConfig::from_env(),
    );

    println!("Pet-health consultation console (locale {}).", locale);
    println!("Type a message, or /image <id> [text], /topic skin, /noref, /size medium, /lang en.");
    println!("Press Ctrl+D to stop.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let input = match parse_line(line) {
            Command::Turn(input) => input,
            Command::Language(preference) => {
                orchestrator
                    .set_language_preference(CONVERSATION_ID, &locale, preference)
                    .await;
                println!("(language preference: {:?})", preference);
                continue;
            }
            Command::Invalid(reason) => {
                println!("({})", reason);
                continue;
            }
        };

        let outcome = orchestrator.process(CONVERSATION_ID, &locale, input).await;
        for message in &outcome.outbound {
            println!("> {}", message.content());
            if let Some(prompt) = message.flow_prompt {
                for action in prompt.actions() {
                    println!("  [{:?}]", action);
                }
            }
        }
        println!(
            "  (status: {:?}, new consultation: {}, follow-up: {})\n",
            outcome.status, outcome.new_consultation, outcome.follow_up
        );
    }

    orchestrator.flush().await;
    Ok(())
}
