use serde::Deserialize;

pub const LOG_PREFIX: &str = "[Map Switcher]";

pub const DEFAULT_LOADER_SRC_PREFIX: &str = "https://maps.googleapis.com/";
pub const DEFAULT_STORAGE_KEY: &str = "cg_MapTypeId";
pub const DEFAULT_ENFORCE_INTERVAL_MS: u32 = 1_000;
pub const DEFAULT_MAX_ENFORCEMENT_LOOPS: usize = 16;

/// Startup configuration. Built once and shared read-only by every component.
///
/// Unknown or missing fields fall back to the defaults, so a partial object
/// such as `{ "debugOutput": true }` is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SwitcherConfig {
    /// Emit debug-level logs to the console.
    pub debug_output: bool,
    /// Also customize maps in the competitive modes (duels, battle royale, ...).
    pub extended_modes: bool,
    pub loader_src_prefix: String,
    pub storage_key: String,
    pub enforce_interval_ms: u32,
    pub max_enforcement_loops: usize,
    /// Cancel an instance's enforcement loop once its mount element leaves
    /// the document.
    pub release_detached_maps: bool,
}

impl Default for SwitcherConfig {
    fn default() -> Self {
        Self {
            debug_output: false,
            extended_modes: false,
            loader_src_prefix: DEFAULT_LOADER_SRC_PREFIX.to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            enforce_interval_ms: DEFAULT_ENFORCE_INTERVAL_MS,
            max_enforcement_loops: DEFAULT_MAX_ENFORCEMENT_LOOPS,
            release_detached_maps: false,
        }
    }
}

impl SwitcherConfig {
    /// Replace zero or empty values that would disable a component outright.
    pub fn normalized(mut self) -> Self {
        if self.enforce_interval_ms == 0 {
            self.enforce_interval_ms = DEFAULT_ENFORCE_INTERVAL_MS;
        }
        if self.max_enforcement_loops == 0 {
            self.max_enforcement_loops = DEFAULT_MAX_ENFORCEMENT_LOOPS;
        }
        if self.loader_src_prefix.trim().is_empty() {
            self.loader_src_prefix = DEFAULT_LOADER_SRC_PREFIX.to_string();
        }
        if self.storage_key.trim().is_empty() {
            self.storage_key = DEFAULT_STORAGE_KEY.to_string();
        }
        self
    }
}
