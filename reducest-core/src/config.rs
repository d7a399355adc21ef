//! Dispatch tracing configuration with glob pattern filtering
//!
//! Controls which actions the base updater reports through `tracing`.
//! Patterns are matched against [`Action::name`](crate::Action::name).
//!
//! # Example
//!
//! ```
//! use reducest_core::config::TraceConfig;
//!
//! let config = TraceConfig::new(Some("Cart*,Checkout"), Some("Tick"));
//! assert!(config.should_trace("CartAddItem"));
//! assert!(config.should_trace("Checkout"));
//! assert!(!config.should_trace("Tick"));
//! ```

use serde::{Deserialize, Serialize};

/// Environment variable holding comma-separated include patterns.
pub const INCLUDE_ENV: &str = "REDUCEST_TRACE_INCLUDE";
/// Environment variable holding comma-separated exclude patterns.
pub const EXCLUDE_ENV: &str = "REDUCEST_TRACE_EXCLUDE";

/// Which actions are traced when they reach the base updater.
///
/// Patterns support:
/// - `*` matches any sequence of characters
/// - `?` matches any single character
/// - Literal text matches exactly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// If non-empty, only trace actions matching these patterns
    pub include_patterns: Vec<String>,
    /// Skip actions matching these patterns (applied after include)
    pub exclude_patterns: Vec<String>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            include_patterns: Vec::new(),
            // High-frequency actions drown everything else
            exclude_patterns: default_excludes(),
        }
    }
}

fn default_excludes() -> Vec<String> {
    vec!["Tick".to_string(), "Render".to_string()]
}

fn split_patterns(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

impl TraceConfig {
    /// Create a config from comma-separated pattern strings
    ///
    /// `None` for `include` traces everything; `None` for `exclude` keeps the
    /// default excludes (`Tick`, `Render`).
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        Self {
            include_patterns: include.map(split_patterns).unwrap_or_default(),
            exclude_patterns: exclude.map(split_patterns).unwrap_or_else(default_excludes),
        }
    }

    /// Create a config with specific pattern vectors
    pub fn with_patterns(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self {
            include_patterns: include,
            exclude_patterns: exclude,
        }
    }

    /// Trace every action, no filtering at all
    pub fn trace_all() -> Self {
        Self::with_patterns(Vec::new(), Vec::new())
    }

    /// Parse a config from JSON, e.g. `{"include_patterns": ["Cart*"]}`.
    ///
    /// Missing fields fall back to [`TraceConfig::default`].
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read [`INCLUDE_ENV`] and [`EXCLUDE_ENV`] from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let include = lookup(INCLUDE_ENV);
        let exclude = lookup(EXCLUDE_ENV);
        Self::new(include.as_deref(), exclude.as_deref())
    }

    /// Check if an action name should be traced
    pub fn should_trace(&self, action_name: &str) -> bool {
        if !self.include_patterns.is_empty()
            && !self
                .include_patterns
                .iter()
                .any(|p| glob_match(p, action_name))
        {
            return false;
        }

        !self
            .exclude_patterns
            .iter()
            .any(|p| glob_match(p, action_name))
    }
}

/// Glob matching supporting `*` (zero or more chars) and `?` (exactly one).
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0, 0);
    // Position of the last `*` seen and the text index it is currently absorbing up to
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < text.len() {
        match pattern.get(pi) {
            Some('*') => {
                backtrack = Some((pi, ti));
                pi += 1;
            }
            Some(&c) if c == '?' || c == text[ti] => {
                pi += 1;
                ti += 1;
            }
            _ => match backtrack {
                Some((star, absorbed)) => {
                    pi = star + 1;
                    ti = absorbed + 1;
                    backtrack = Some((star, absorbed + 1));
                }
                None => return false,
            },
        }
    }

    pattern[pi..].iter().all(|&c| c == '*')
}
