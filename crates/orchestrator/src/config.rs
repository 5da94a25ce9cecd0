//! Configuration for the turn orchestrator.

use std::env;
use std::time::Duration;

/// Default deadline for every delegated backend or analysis call.
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 15;

/// Tunable classifier thresholds.
///
/// These were tuned against observed conversations and are parameters, not
/// contracts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thresholds {
    /// Minimum lead one language score needs over the other.
    pub language_margin: u32,
    /// A question-bearing assistant message longer than this (in chars)
    /// counts as a follow-up request.
    pub follow_up_min_chars: usize,
    /// Media with no active topic starts a new consultation while the
    /// history holds at most this many messages.
    pub fresh_media_history_limit: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            language_margin: 2,
            follow_up_min_chars: 200,
            fresh_media_history_limit: 2,
        }
    }
}

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Deadline for each backend or analysis call.
    pub backend_timeout: Duration,

    /// Classifier thresholds.
    pub thresholds: Thresholds,

    /// Number of recent messages forwarded to the backend and the router.
    pub history_window: usize,

    /// Maximum characters kept per forwarded history message (0 disables).
    pub history_entry_max_chars: usize,

    /// Maximum number of conversations kept in the registry.
    pub max_conversations: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            backend_timeout: Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS),
            thresholds: Thresholds::default(),
            history_window: 6,
            history_entry_max_chars: 500,
            max_conversations: 10_000,
        }
    }
}

impl OrchestratorConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables (unset or unparsable values keep the default):
    /// - `VET_BACKEND_TIMEOUT_SECS` - Deadline per delegated call (default: 15)
    /// - `VET_LANGUAGE_MARGIN` - Language score margin (default: 2)
    /// - `VET_FOLLOW_UP_MIN_CHARS` - Follow-up length heuristic (default: 200)
    /// - `VET_FRESH_MEDIA_HISTORY_LIMIT` - Fresh-media history limit (default: 2)
    /// - `VET_HISTORY_WINDOW` - Forwarded history messages (default: 6)
    /// - `VET_HISTORY_ENTRY_MAX_CHARS` - Chars per history message (default: 500)
    /// - `VET_MAX_CONVERSATIONS` - Registry capacity (default: 10000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let backend_timeout = env_parse::<u64>("VET_BACKEND_TIMEOUT_SECS")
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.backend_timeout);

        let thresholds = Thresholds {
            language_margin: env_parse("VET_LANGUAGE_MARGIN")
                .unwrap_or(defaults.thresholds.language_margin),
            follow_up_min_chars: env_parse("VET_FOLLOW_UP_MIN_CHARS")
                .unwrap_or(defaults.thresholds.follow_up_min_chars),
            fresh_media_history_limit: env_parse("VET_FRESH_MEDIA_HISTORY_LIMIT")
                .unwrap_or(defaults.thresholds.fresh_media_history_limit),
        };

        Self {
            backend_timeout,
            thresholds,
            history_window: env_parse("VET_HISTORY_WINDOW").unwrap_or(defaults.history_window),
            history_entry_max_chars: env_parse("VET_HISTORY_ENTRY_MAX_CHARS")
                .unwrap_or(defaults.history_entry_max_chars),
            max_conversations: env_parse::<usize>("VET_MAX_CONVERSATIONS")
                .filter(|max| *max > 0)
                .unwrap_or(defaults.max_conversations),
        }
    }

    /// Override the backend deadline (builder style).
    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout = timeout;
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.backend_timeout, Duration::from_secs(15));
        assert_eq!(config.thresholds.language_margin, 2);
        assert_eq!(config.thresholds.follow_up_min_chars, 200);
        assert_eq!(config.thresholds.fresh_media_history_limit, 2);
        assert_eq!(config.max_conversations, 10_000);
    }

    #[test]
    fn test_from_env_overrides_and_ignores_garbage() {
        env::set_var("VET_LANGUAGE_MARGIN", "3");
        env::set_var("VET_HISTORY_WINDOW", "not-a-number");
        env::set_var("VET_BACKEND_TIMEOUT_SECS", "0");

        let config = OrchestratorConfig::from_env();
        assert_eq!(config.thresholds.language_margin, 3);
        assert_eq!(config.history_window, 6);
        assert_eq!(config.backend_timeout, Duration::from_secs(15));

        env::remove_var("VET_LANGUAGE_MARGIN");
        env::remove_var("VET_HISTORY_WINDOW");
        env::remove_var("VET_BACKEND_TIMEOUT_SECS");
    }

    #[test]
    fn test_with_backend_timeout() {
        let config = OrchestratorConfig::default().with_backend_timeout(Duration::from_millis(50));
        assert_eq!(config.backend_timeout, Duration::from_millis(50));
    }
}
