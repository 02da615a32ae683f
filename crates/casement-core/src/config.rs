use std::str::FromStr;
use std::time::Duration;

use crate::RenderBackend;

pub const DEFAULT_MAX_BACK_BUFFER_BYTES: usize = 24 * 1024 * 1024;
pub const DEFAULT_IDLE_MAINTENANCE_DELAY: Duration = Duration::from_millis(1500);

/// Per-window rendering options.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderConfig {
    pub backend: RenderBackend,
    /// Largest software backbuffer kept between frames; 0 disables the cap.
    pub max_software_back_buffer_bytes: usize,
    pub idle_maintenance_delay: Duration,
    pub enable_idle_maintenance: bool,
    pub show_perf_overlay: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            backend: RenderBackend::Software,
            max_software_back_buffer_bytes: DEFAULT_MAX_BACK_BUFFER_BYTES,
            idle_maintenance_delay: DEFAULT_IDLE_MAINTENANCE_DELAY,
            enable_idle_maintenance: true,
            show_perf_overlay: false,
        }
    }
}

impl RenderConfig {
    /// Defaults overridden by `CASEMENT_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(v) = parse::<RenderBackend>(&lookup, "CASEMENT_BACKEND") {
            cfg.backend = v;
        }
        if let Some(v) = parse::<usize>(&lookup, "CASEMENT_MAX_BACKBUFFER_BYTES") {
            cfg.max_software_back_buffer_bytes = v;
        }
        if let Some(v) = parse::<u64>(&lookup, "CASEMENT_IDLE_MS") {
            cfg.idle_maintenance_delay = Duration::from_millis(v);
        }
        if let Some(v) = parse_flag(&lookup, "CASEMENT_IDLE_MAINTENANCE") {
            cfg.enable_idle_maintenance = v;
        }
        if let Some(v) = parse_flag(&lookup, "CASEMENT_PERF_OVERLAY") {
            cfg.show_perf_overlay = v;
        }
        cfg
    }

    pub fn with_backend(mut self, backend: RenderBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Whether a buffer of `bytes` may be retained between frames.
    pub fn allows_retained(&self, bytes: usize) -> bool {
        self.max_software_back_buffer_bytes == 0 || bytes <= self.max_software_back_buffer_bytes
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("ignoring {key}={raw:?}: not a valid value");
            None
        }
    }
}

fn parse_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    let raw = lookup(key)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => {
            log::warn!("ignoring {key}={raw:?}: expected 0 or 1");
            None
        }
    }
}
