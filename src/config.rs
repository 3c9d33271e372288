//! Configuration loading and validation.
//!
//! All tunable parameters live in `config.toml`; every section has
//! complete defaults so the engine runs with no config file at all.
//! Detection weights and thresholds are configuration, not business
//! logic — only their relative ordering is load-bearing.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TarpitConfig {
    /// Scam-detection weights and per-turn thresholds.
    pub detection: DetectionConfig,

    /// Engagement policy: turn floors/caps, context window, reply ceiling.
    pub engagement: EngagementConfig,

    /// Dialogue generator endpoint settings.
    pub generator: GeneratorConfig,

    /// Intelligence report delivery settings.
    pub report: ReportConfig,
}

/// Confidence weights and turn-dependent decision thresholds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Confidence added when two or more distinct scam keywords match.
    pub keyword_multi_weight: f64,

    /// Confidence added when exactly one scam keyword matches.
    pub keyword_single_weight: f64,

    /// Confidence added per identifier pattern type found in the text.
    pub identifier_weight: f64,

    /// Flat confidence added when any red-flag category matches.
    pub red_flag_weight: f64,

    /// Decision threshold on turn 1 (strictest — a greeting must not fire).
    pub threshold_turn_one: f64,

    /// Decision threshold on turn 2.
    pub threshold_turn_two: f64,

    /// Decision threshold from turn 3 onward.
    pub threshold_later: f64,
}

impl DetectionConfig {
    /// The decision threshold for a 1-based turn index.
    ///
    /// Monotonically non-increasing in `turn`: a conversation already
    /// several turns deep is overwhelmingly likely adversarial.
    pub fn threshold(&self, turn: u32) -> f64 {
        if turn <= 1 {
            self.threshold_turn_one
        } else if turn <= 2 {
            self.threshold_turn_two
        } else {
            self.threshold_later
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            keyword_multi_weight: default_keyword_multi_weight(),
            keyword_single_weight: default_keyword_single_weight(),
            identifier_weight: default_identifier_weight(),
            red_flag_weight: default_red_flag_weight(),
            threshold_turn_one: default_threshold_turn_one(),
            threshold_turn_two: default_threshold_turn_two(),
            threshold_later: default_threshold_later(),
        }
    }
}

/// Engagement policy constants.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    /// Minimum turns before a detected session may report.
    pub min_turns: u32,

    /// Hard cap on turns; reaching it forces report evaluation.
    pub max_turns: u32,

    /// How many recent exchanges the generator sees as context.
    pub context_window: usize,

    /// Generated replies longer than this are discarded.
    pub reply_max_chars: usize,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            min_turns: default_min_turns(),
            max_turns: default_max_turns(),
            context_window: default_context_window(),
            reply_max_chars: default_reply_max_chars(),
        }
    }
}

/// Dialogue generator endpoint settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Base URL of the OpenAI-style chat-completions service.
    pub base_url: String,

    /// Model identifier.
    pub model: String,

    /// Environment variable name holding the API key.
    ///
    /// A missing key degrades to the fallback rotation rather than
    /// failing startup.
    pub api_key_env: String,

    /// Completion token cap per reply.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f64,

    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: default_generator_base_url(),
            model: default_generator_model(),
            api_key_env: default_generator_api_key_env(),
            max_tokens: default_generator_max_tokens(),
            temperature: default_generator_temperature(),
            timeout_seconds: default_generator_timeout(),
        }
    }
}

/// Intelligence report delivery settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Observer endpoint URL. When absent, reports are logged locally.
    pub endpoint: Option<String>,

    /// Delivery timeout in seconds (attempt once, never retry).
    pub timeout_seconds: u64,
}

impl ReportConfig {
    /// Parse and validate the configured endpoint, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is present but not a valid URL.
    pub fn endpoint_url(&self) -> anyhow::Result<Option<url::Url>> {
        match &self.endpoint {
            None => Ok(None),
            Some(raw) => {
                let parsed = url::Url::parse(raw)
                    .map_err(|e| anyhow::anyhow!("invalid report endpoint {raw}: {e}"))?;
                Ok(Some(parsed))
            }
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_seconds: default_report_timeout(),
        }
    }
}

// Default value functions for serde

fn default_keyword_multi_weight() -> f64 {
    0.6
}
fn default_keyword_single_weight() -> f64 {
    0.3
}
fn default_identifier_weight() -> f64 {
    0.3
}
fn default_red_flag_weight() -> f64 {
    0.2
}
fn default_threshold_turn_one() -> f64 {
    0.3
}
fn default_threshold_turn_two() -> f64 {
    0.2
}
fn default_threshold_later() -> f64 {
    0.1
}
fn default_min_turns() -> u32 {
    5
}
fn default_max_turns() -> u32 {
    10
}
fn default_context_window() -> usize {
    6
}
fn default_reply_max_chars() -> usize {
    400
}
fn default_generator_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}
fn default_generator_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}
fn default_generator_api_key_env() -> String {
    "TARPIT_GENERATOR_API_KEY".to_string()
}
fn default_generator_max_tokens() -> u32 {
    200
}
fn default_generator_temperature() -> f64 {
    0.85
}
fn default_generator_timeout() -> u64 {
    15
}
fn default_report_timeout() -> u64 {
    5
}

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> anyhow::Result<TarpitConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config at {}: {e}", path.display()))?;
    let config: TarpitConfig = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config at {}: {e}", path.display()))?;
    Ok(config)
}

/// Resolve the default config directory (`~/.tarpit/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".tarpit"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_detection_values() {
        let detection = DetectionConfig::default();
        assert!((detection.keyword_multi_weight - 0.6).abs() < f64::EPSILON);
        assert!((detection.keyword_single_weight - 0.3).abs() < f64::EPSILON);
        assert!((detection.identifier_weight - 0.3).abs() < f64::EPSILON);
        assert!((detection.red_flag_weight - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_threshold_ordering_is_monotone() {
        let detection = DetectionConfig::default();
        assert!(detection.threshold(1) > detection.threshold(2));
        assert!(detection.threshold(2) > detection.threshold(3));
        assert!((detection.threshold(3) - detection.threshold(50)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_engagement_values() {
        let engagement = EngagementConfig::default();
        assert_eq!(engagement.min_turns, 5);
        assert_eq!(engagement.max_turns, 10);
        assert_eq!(engagement.context_window, 6);
        assert_eq!(engagement.reply_max_chars, 400);
    }

    #[test]
    fn test_config_dir_resolves() {
        let dir = config_dir();
        assert!(dir.is_ok());
        let path = dir.expect("already checked");
        assert!(path.ends_with(".tarpit"));
    }

    #[test]
    fn test_parse_empty_toml_uses_defaults() {
        let config: TarpitConfig = toml::from_str("").expect("should parse empty");
        assert_eq!(config.engagement.max_turns, 10);
        assert_eq!(config.generator.model, "llama-3.3-70b-versatile");
        assert!(config.report.endpoint.is_none());
    }

    #[test]
    fn test_parse_partial_toml_keeps_other_defaults() {
        let toml_str = r#"
[engagement]
min_turns = 3
max_turns = 8

[report]
endpoint = "https://observer.example/api/report"
"#;
        let config: TarpitConfig = toml::from_str(toml_str).expect("should parse");
        assert_eq!(config.engagement.min_turns, 3);
        assert_eq!(config.engagement.max_turns, 8);
        assert_eq!(config.engagement.context_window, 6);
        assert_eq!(
            config.report.endpoint.as_deref(),
            Some("https://observer.example/api/report")
        );
        assert!((config.detection.threshold_turn_one - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_endpoint_url_validation() {
        let mut report = ReportConfig::default();
        assert!(report.endpoint_url().expect("no endpoint is fine").is_none());

        report.endpoint = Some("https://observer.example/api/report".to_string());
        let parsed = report.endpoint_url().expect("valid url parses");
        assert_eq!(
            parsed.map(|u| u.host_str().map(str::to_owned)),
            Some(Some("observer.example".to_string()))
        );

        report.endpoint = Some("not a url".to_string());
        assert!(report.endpoint_url().is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engagement]\nmax_turns = 12\n").expect("write config");

        let config = load_config(&path).expect("loads");
        assert_eq!(config.engagement.max_turns, 12);

        assert!(load_config(&dir.path().join("missing.toml")).is_err());
    }
}
