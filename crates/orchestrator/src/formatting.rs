//! Analysis report formatting.
//!
//! The analysis service returns structured JSON. This module turns it into a
//! localized, user-facing report. Malformed results never surface as errors:
//! they render as a fixed conservative report.

use serde::Deserialize;
use tracing::warn;
use vet_core::{extract_json, AnalysisKind, Language};

/// Structured findings returned by the analysis service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnalysisFindings {
    #[serde(default, alias = "diagnosis", alias = "finding")]
    pub condition: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default, alias = "questions")]
    pub follow_up_questions: Vec<String>,
}

impl AnalysisFindings {
    /// Confidence as a whole percentage. Accepts both 0..1 and 0..100 scales.
    pub fn confidence_percent(&self) -> Option<u32> {
        let value = self.confidence?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        let percent = if value <= 1.0 { value * 100.0 } else { value };
        Some(percent.min(100.0).round() as u32)
    }

    fn is_meaningful(&self) -> bool {
        self.condition
            .as_deref()
            .map(|c| !c.trim().is_empty())
            .unwrap_or(false)
            || !self.recommendations.is_empty()
    }
}

/// Parse a raw analysis result. Returns `None` when it is not usable.
pub fn parse_findings(raw: &str) -> Option<AnalysisFindings> {
    let json = extract_json(raw);
    match serde_json::from_str::<AnalysisFindings>(json) {
        Ok(findings) if findings.is_meaningful() => Some(findings),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "ANALYSIS_PARSE_FAILED");
            None
        }
    }
}

fn disclaimer(language: Language) -> &'static str {
    language.pick(
        "Este análisis es orientativo y no reemplaza la consulta con tu veterinario.",
        "This analysis is for guidance only and does not replace a visit to your veterinarian.",
    )
}

fn localize_severity(severity: &str, language: Language) -> String {
    let normalized = severity.trim().to_lowercase();
    let localized = match normalized.as_str() {
        "low" | "baja" | "leve" => language.pick("baja", "low"),
        "medium" | "moderate" | "media" | "moderada" => language.pick("media", "medium"),
        "high" | "severe" | "alta" | "grave" => language.pick("alta", "high"),
        _ => return severity.trim().to_string(),
    };
    localized.to_string()
}

/// Render a report from a raw analysis result.
///
/// Follow-up questions are rendered as a numbered list so the next turn can
/// recognize the user's reply as an answer to them.
pub fn format_report(kind: AnalysisKind, raw: &str, language: Language) -> String {
    let Some(findings) = parse_findings(raw) else {
        return default_report(kind, language);
    };

    let mut out = format!("**{}**\n\n", kind.title(language));

    if let Some(condition) = findings.condition.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        out.push_str(&format!("{}: {}", language.pick("Hallazgo", "Finding"), condition));
        if let Some(percent) = findings.confidence_percent() {
            out.push_str(&format!(
                " ({}% {})",
                percent,
                language.pick("de confianza", "confidence")
            ));
        }
        out.push('\n');
    }

    if let Some(severity) = findings.severity.as_deref().filter(|s| !s.trim().is_empty()) {
        out.push_str(&format!(
            "{}: {}\n",
            language.pick("Gravedad", "Severity"),
            localize_severity(severity, language)
        ));
    }

    if !findings.recommendations.is_empty() {
        out.push_str(&format!("\n{}:\n", language.pick("Recomendaciones", "Recommendations")));
        for recommendation in &findings.recommendations {
            out.push_str(&format!("- {}\n", recommendation.trim()));
        }
    }

    if !findings.follow_up_questions.is_empty() {
        out.push_str(&format!(
            "\n{}\n",
            language.pick(
                "Para afinar la evaluación, ¿podrías responder estas preguntas?",
                "To refine the assessment, could you answer these questions?"
            )
        ));
        for (i, question) in findings.follow_up_questions.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, question.trim()));
        }
    }

    out.push('\n');
    out.push_str(&format!("_{}_", disclaimer(language)));
    out
}

/// Conservative report used when the analysis result cannot be interpreted.
pub fn default_report(kind: AnalysisKind, language: Language) -> String {
    format!(
        "**{}**\n\n{}\n\n_{}_",
        kind.title(language),
        language.pick(
            "No pudimos interpretar el resultado con seguridad. Te recomendamos consultar con \
             tu veterinario para una evaluación presencial, sobre todo si notas cambios o molestias.",
            "We could not interpret the result reliably. We recommend seeing your veterinarian \
             for an in-person check, especially if you notice changes or discomfort."
        ),
        disclaimer(language)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const OCULAR: &str = r#"{
        "condition": "early cataract",
        "confidence": 0.87,
        "severity": "medium",
        "recommendations": ["Schedule an ophthalmology visit"],
        "follow_up_questions": ["How old is your dog?", "What breed is he?"]
    }"#;

    #[test]
    fn test_full_report() {
        let report = format_report(AnalysisKind::Ocular, OCULAR, Language::En);
        assert!(report.starts_with("**Eye analysis**"));
        assert!(report.contains("Finding: early cataract (87% confidence)"));
        assert!(report.contains("Severity: medium"));
        assert!(report.contains("- Schedule an ophthalmology visit"));
        assert!(report.contains("1. How old is your dog?\n2. What breed is he?"));
        assert!(report.contains("does not replace"));
    }

    #[test]
    fn test_spanish_report() {
        let report = format_report(AnalysisKind::Ocular, OCULAR, Language::Es);
        assert!(report.starts_with("**Análisis ocular**"));
        assert!(report.contains("Hallazgo: early cataract (87% de confianza)"));
        assert!(report.contains("Gravedad: media"));
    }

    #[test]
    fn test_fenced_json_is_accepted() {
        let raw = "```json\n{\"diagnosis\": \"benign wart\"}\n```";
        let report = format_report(AnalysisKind::Skin, raw, Language::En);
        assert!(report.contains("Finding: benign wart"));
    }

    #[test]
    fn test_malformed_result_uses_default() {
        for raw in ["not json", "{}", r#"{"condition": "   "}"#, ""] {
            let report = format_report(AnalysisKind::Body, raw, Language::En);
            assert_eq!(report, default_report(AnalysisKind::Body, Language::En));
        }
    }

    #[test]
    fn test_confidence_scales() {
        let findings = AnalysisFindings {
            confidence: Some(64.4),
            ..Default::default()
        };
        assert_eq!(findings.confidence_percent(), Some(64));

        let findings = AnalysisFindings {
            confidence: Some(-1.0),
            ..Default::default()
        };
        assert_eq!(findings.confidence_percent(), None);
    }

    #[test]
    fn test_unknown_severity_is_kept() {
        assert_eq!(localize_severity("Critical", Language::Es), "Critical");
        assert_eq!(localize_severity("HIGH", Language::Es), "alta");
    }
}
