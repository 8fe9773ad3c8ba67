use std::env;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

pub const DEFAULT_NAMESPACE: &str = "budget_alert";
pub const DEFAULT_THRESHOLDS: [u32; 2] = [80, 100];

// ── Language ──────────────────────────────────────────────────

/// Message language. Vietnamese is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Vi,
    En,
}

impl Language {
    /// Resolve a language code, falling back to the default for anything
    /// unsupported. Matching is case-insensitive on the primary subtag, so
    /// `en-US` resolves to [`Language::En`].
    pub fn from_code(code: &str) -> Self {
        let primary = code
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Language::En,
            "vi" => Language::Vi,
            _ => Language::default(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::Vi => "vi",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ── Alert config ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Active profile name (empty = default).
    pub profile: String,
    /// Key prefix for persisted alert records.
    pub namespace: String,
    /// Threshold percentages, ascending and unique.
    pub thresholds: Vec<u32>,
    pub language: Language,
    /// Location of the file-backed store, used by the CLI.
    pub store_path: Option<PathBuf>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            profile: String::new(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            thresholds: DEFAULT_THRESHOLDS.to_vec(),
            language: Language::default(),
            store_path: None,
        }
    }
}

impl AlertConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `SPENDWATCH_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("SPENDWATCH_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        let thresholds = profiled_env_opt(p, "ALERT_THRESHOLDS")
            .map(|raw| parse_thresholds(&raw))
            .unwrap_or_else(|| DEFAULT_THRESHOLDS.to_vec());
        Self {
            profile: p.to_string(),
            namespace: profiled_env_or(p, "ALERT_NAMESPACE", DEFAULT_NAMESPACE),
            thresholds,
            language: Language::from_code(&profiled_env_or(p, "ALERT_LANGUAGE", "vi")),
            store_path: profiled_env_opt(p, "ALERT_STORE_PATH").map(PathBuf::from),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_thresholds(mut self, thresholds: impl IntoIterator<Item = u32>) -> Self {
        self.thresholds = normalize_thresholds(thresholds.into_iter().collect());
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Alert config loaded (profile: {}):", self.profile_label());
        tracing::info!("  namespace:   {}", self.namespace);
        tracing::info!("  thresholds:  {:?}", self.thresholds);
        tracing::info!("  language:    {}", self.language);
        tracing::info!(
            "  store_path:  {}",
            self.store_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(default)".to_string())
        );
    }
}

/// Parse a comma-separated threshold list. Bad entries are skipped; an empty
/// result falls back to the defaults.
fn parse_thresholds(raw: &str) -> Vec<u32> {
    let parsed = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<u32>() {
            Ok(0) | Err(_) => {
                tracing::warn!(value = %s, "Ignoring invalid alert threshold");
                None
            }
            Ok(v) => Some(v),
        })
        .collect();
    normalize_thresholds(parsed)
}

fn normalize_thresholds(mut thresholds: Vec<u32>) -> Vec<u32> {
    thresholds.retain(|t| *t > 0);
    thresholds.sort_unstable();
    thresholds.dedup();
    if thresholds.is_empty() {
        DEFAULT_THRESHOLDS.to_vec()
    } else {
        thresholds
    }
}
