/// Application configuration and constants.
use std::env;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Settings for the remote solver.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Read once at startup; never validated locally
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Kept low for math precision
    pub temperature: f32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.2,
        }
    }
}

impl SolverConfig {
    /// Defaults overlaid with `API_KEY` (or `GEMINI_API_KEY`), `BENNY_MODEL`
    /// and `BENNY_API_BASE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            api_key: non_empty("API_KEY")
                .or_else(|| non_empty("GEMINI_API_KEY"))
                .unwrap_or_default(),
            model: non_empty("BENNY_MODEL").unwrap_or(defaults.model),
            base_url: non_empty("BENNY_API_BASE").unwrap_or(defaults.base_url),
            temperature: defaults.temperature,
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

pub struct Config {
    /// Main loop tick rate in milliseconds (target 60 FPS = ~16ms)
    pub tick_rate_ms: u64,

    /// How many ticks to show status messages (180 = ~3s at 60fps)
    pub status_timeout_ticks: u64,

    /// Modulo for animation frame counter
    pub animation_frame_mod: usize,

    /// Duration of send animation in ticks
    pub send_animation_ticks: u8,

    /// Lines to scroll per key press
    pub scroll_step: usize,

    /// Width of the sidebar in characters
    pub sidebar_width: u16,

    /// History rows shown in the sidebar
    pub history_display_limit: usize,

    /// Past Q/A pairs sent along with each query
    pub context_window: usize,

    pub solver: SolverConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_rate_ms: 16,
            status_timeout_ticks: 180,
            animation_frame_mod: 360,
            send_animation_ticks: 20,
            scroll_step: 3,
            sidebar_width: 30,
            history_display_limit: 10,
            context_window: 2,
            solver: SolverConfig::default(),
        }
    }
}
