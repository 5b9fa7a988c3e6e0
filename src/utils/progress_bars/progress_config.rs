// src/utils/progress_bars/progress_config.rs

use indicatif::{ProgressBar, ProgressStyle};
use std::env;

/// Configuration for progress tracking during a ranking run
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Whether to show progress bars at all
    pub enabled: bool,
    /// Whether to show per-entity messages on the bar
    pub detailed: bool,
    /// Whether to show cache statistics in progress messages
    pub show_cache_stats: bool,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            detailed: false,
            show_cache_stats: true,
        }
    }
}

impl ProgressConfig {
    /// Create progress configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            enabled: env::var("PROGRESS_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            detailed: env::var("PROGRESS_DETAILED")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            show_cache_stats: env::var("PROGRESS_SHOW_CACHE_STATS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        }
    }

    /// A quiet configuration for tests and library callers.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            detailed: false,
            show_cache_stats: false,
        }
    }

    /// Create an entity progress bar if progress is enabled, None otherwise
    pub fn create_entity_bar(&self, len: usize, domain: &str) -> Option<ProgressBar> {
        if !self.enabled {
            return None;
        }
        let pb = ProgressBar::new(len as u64);
        let template = format!(
            "  🏆 [{{elapsed_precise}}] {{bar:30.cyan/blue}} {{pos}}/{{len}} {} {{msg}}",
            domain
        );
        // A malformed template only loses styling, never the bar.
        if let Ok(style) = ProgressStyle::default_bar().template(&template) {
            pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
        }
        Some(pb)
    }

    pub fn should_show_detailed(&self) -> bool {
        self.enabled && self.detailed
    }

    pub fn should_show_cache_stats(&self) -> bool {
        self.enabled && self.show_cache_stats
    }
}
