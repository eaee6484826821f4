//! Reporter configuration from environment variables

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AnalysisError;

/// Which optional classifications the classifier may produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub include_brilliant: bool,
    pub include_critical: bool,
    pub include_theory: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            include_brilliant: true,
            include_critical: true,
            include_theory: true,
        }
    }
}

impl AnalysisOptions {
    /// Brilliant and Critical both read the second-best line.
    pub fn needs_second_line(&self) -> bool {
        self.include_brilliant || self.include_critical
    }
}

/// Engine pool and search settings.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Source label stamped on every line this engine produces
    pub version: String,

    /// Upper bound on concurrently running engine sessions
    pub max_engine_count: usize,

    /// Target search depth
    pub depth: u32,

    /// Optional per-position time cap
    pub time_limit: Option<Duration>,

    /// Requested MultiPV before the classification floor is applied
    pub lines: u32,

    pub threads: u32,
    pub hash_mb: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: "stockfish-17".to_string(),
            max_engine_count: num_cpus::get(),
            depth: 16,
            time_limit: None,
            lines: 2,
            threads: 1,
            hash_mb: 256,
        }
    }
}

impl EngineConfig {
    /// MultiPV actually sent to the engine. Never below 2 while Brilliant or
    /// Critical classification is enabled.
    pub fn effective_line_count(&self, options: &AnalysisOptions) -> u32 {
        if options.needs_second_line() {
            self.lines.max(2)
        } else {
            self.lines.max(1)
        }
    }
}

#[derive(Clone, Debug)]
pub struct ReporterConfig {
    /// Path to the UCI engine binary
    pub stockfish_path: String,

    pub engine: EngineConfig,

    pub options: AnalysisOptions,

    /// JSON opening book replacing the built-in table
    pub opening_book_path: Option<PathBuf>,

    /// Lines from this source are trusted and not re-evaluated
    pub cached_line_source: Option<String>,
}

impl ReporterConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, AnalysisError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AnalysisError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = EngineConfig::default();

        let stockfish_path = lookup("STOCKFISH_PATH")
            .unwrap_or_else(|| "/usr/local/bin/stockfish".to_string());

        let max_engine_count: usize =
            parse_var(&lookup, "MAX_ENGINE_COUNT")?.unwrap_or(defaults.max_engine_count);
        if max_engine_count == 0 {
            return Err(AnalysisError::Config(
                "MAX_ENGINE_COUNT must be at least 1".into(),
            ));
        }

        let depth: u32 = parse_var(&lookup, "ENGINE_DEPTH")?.unwrap_or(defaults.depth);
        if depth == 0 {
            return Err(AnalysisError::Config("ENGINE_DEPTH must be at least 1".into()));
        }

        let time_limit = parse_var::<f64, _>(&lookup, "ENGINE_TIME_LIMIT_SECS")?
            .map(|secs| {
                Duration::try_from_secs_f64(secs).map_err(|e| {
                    AnalysisError::Config(format!("Invalid ENGINE_TIME_LIMIT_SECS '{secs}': {e}"))
                })
            })
            .transpose()?;

        let engine = EngineConfig {
            version: lookup("ENGINE_VERSION").unwrap_or(defaults.version),
            max_engine_count,
            depth,
            time_limit,
            lines: parse_var(&lookup, "ENGINE_LINES")?.unwrap_or(defaults.lines),
            threads: parse_var(&lookup, "ENGINE_THREADS")?.unwrap_or(defaults.threads),
            hash_mb: parse_var(&lookup, "ENGINE_HASH_MB")?.unwrap_or(defaults.hash_mb),
        };

        let options = AnalysisOptions {
            include_brilliant: parse_flag(&lookup, "INCLUDE_BRILLIANT")?.unwrap_or(true),
            include_critical: parse_flag(&lookup, "INCLUDE_CRITICAL")?.unwrap_or(true),
            include_theory: parse_flag(&lookup, "INCLUDE_THEORY")?.unwrap_or(true),
        };

        Ok(Self {
            stockfish_path,
            engine,
            options,
            opening_book_path: lookup("OPENING_BOOK_PATH").map(PathBuf::from),
            cached_line_source: lookup("CACHED_LINE_SOURCE").filter(|s| !s.is_empty()),
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, AnalysisError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| AnalysisError::Config(format!("{key}={raw}: {e}")))
        })
        .transpose()
}

fn parse_flag<F>(lookup: &F, key: &str) -> Result<Option<bool>, AnalysisError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(AnalysisError::Config(format!("{key}={raw}: expected a boolean"))),
        })
        .transpose()
}
