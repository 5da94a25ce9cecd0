//! Localized scripted replies produced without the backend.

use vet_core::{AnalysisKind, FlowPrompt, Language, Message, SizeCategory};

/// Apology shown when a backend or analysis call fails.
pub fn apology(language: Language) -> &'static str {
    language.pick(
        "Lo siento, hubo un problema al procesar tu consulta. Por favor, inténtalo de nuevo.",
        "Sorry, something went wrong while processing your message. Please try again.",
    )
}

/// Text for a guided-flow prompt.
pub fn prompt_text(prompt: FlowPrompt, language: Language, kind: Option<AnalysisKind>) -> String {
    match prompt {
        FlowPrompt::RequestLesionPhoto => language
            .pick(
                "Envíame una foto clara de la lesión, bien iluminada y enfocada.",
                "Please send a clear, well-lit photo of the lesion.",
            )
            .to_string(),
        FlowPrompt::RequestScalePhoto => language
            .pick(
                "Gracias. Ahora envía una segunda foto de la lesión con una moneda al lado, \
                 para poder estimar su tamaño. Si no tienes una referencia, elige \
                 \"No tengo referencia\".",
                "Thanks. Now send a second photo of the lesion with a coin next to it so we \
                 can estimate its size. If you have nothing to use as a reference, choose \
                 \"No reference available\".",
            )
            .to_string(),
        FlowPrompt::RequestSizeDescription => {
            let options: Vec<&str> = SizeCategory::ALL
                .iter()
                .map(|size| size.description(language))
                .collect();
            format!(
                "{} {}.",
                language.pick(
                    "No hay problema. ¿Qué tamaño aproximado tiene la lesión? Elige una opción o \
                     descríbelo con tus palabras:",
                    "No problem. About how big is the lesion? Pick an option or describe it in \
                     your own words:",
                ),
                options.join(", ")
            )
        }
        FlowPrompt::RequestAnalysisPhoto => {
            let subject = match kind {
                Some(AnalysisKind::Skin) | None => language.pick("la lesión", "the lesion"),
                Some(AnalysisKind::Ocular) => language.pick("el ojo afectado", "the affected eye"),
                Some(AnalysisKind::Body) => language.pick(
                    "tu mascota de perfil y desde arriba",
                    "your pet from the side and from above",
                ),
                Some(AnalysisKind::Dysplasia) => language.pick(
                    "tu mascota de pie, de perfil",
                    "your pet standing, seen from the side",
                ),
            };
            format!(
                "{} {}.",
                language.pick(
                    "Para analizarlo necesito una foto. Envíame una foto clara de",
                    "To analyze this I need a photo. Please send a clear photo of",
                ),
                subject
            )
        }
    }
}

/// Build an assistant message carrying a flow prompt.
pub fn prompt_message(prompt: FlowPrompt, language: Language, kind: Option<AnalysisKind>) -> Message {
    Message::flow_prompt(prompt_text(prompt, language, kind), prompt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals;

    #[test]
    fn test_apology_is_localized() {
        assert!(apology(Language::Es).starts_with("Lo siento"));
        assert!(apology(Language::En).starts_with("Sorry"));
    }

    #[test]
    fn test_size_prompt_lists_categories() {
        let text = prompt_text(FlowPrompt::RequestSizeDescription, Language::En, None);
        assert!(text.contains("small (under 1 cm)"));
        assert!(text.contains("large (over 3 cm)"));
    }

    #[test]
    fn test_prompt_message_carries_actions() {
        let message = prompt_message(FlowPrompt::RequestScalePhoto, Language::Es, None);
        assert_eq!(message.flow_prompt, Some(FlowPrompt::RequestScalePhoto));
        assert!(message.is_assistant());
        assert!(!message.is_analysis_result);
    }

    #[test]
    fn test_photo_prompts_read_as_photo_requests() {
        for language in [Language::Es, Language::En] {
            let text = prompt_text(
                FlowPrompt::RequestAnalysisPhoto,
                language,
                Some(AnalysisKind::Ocular),
            );
            assert!(signals::is_photo_request(&text), "{}", text);
        }
    }
}
