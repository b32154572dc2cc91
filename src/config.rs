//! Guard configuration
//!
//! Injected by the page as JSON at startup. Every field is optional; anything
//! missing falls back to the defaults below.

use serde::{Deserialize, Serialize};

use crate::codec::{Codec, FALLBACK_KEY};
use crate::display::DEFAULT_VALUE_ATTRIBUTE;
use crate::persistence::DEFAULT_STORAGE_KEY;

/// Reconciliation timing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    /// Time between ticks
    pub interval_ms: u32,
    /// Minimum age of the previous tick before the persisted score may
    /// overwrite the in-memory one
    pub grace_window_ms: f64,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            grace_window_ms: 5000.0,
        }
    }
}

/// Everything the guard needs at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Shared secret for the token codec
    pub key: String,
    /// Storage key holding the score token
    pub storage_key: String,
    /// Hidden attribute on the display element
    pub value_attribute: String,
    pub watchdog: WatchdogConfig,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            key: FALLBACK_KEY.to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            value_attribute: DEFAULT_VALUE_ATTRIBUTE.to_string(),
            watchdog: WatchdogConfig::default(),
        }
    }
}

impl GuardConfig {
    /// Element holding the injected JSON (`<script type="application/json">`)
    #[allow(dead_code)]
    const CONFIG_ELEMENT_ID: &'static str = "score-guard-config";

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Codec for the configured key, or the fallback key if it is unusable
    pub fn codec(&self) -> Codec {
        Codec::new(self.key.as_str()).unwrap_or_else(|e| {
            log::warn!("{}; using fallback key", e);
            Codec::default()
        })
    }

    /// Load config from the page (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let json = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(Self::CONFIG_ELEMENT_ID))
            .and_then(|el| el.text_content());

        if let Some(json) = json {
            match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded guard config from page");
                    return config;
                }
                Err(e) => log::warn!("Bad guard config: {}", e),
            }
        }

        log::info!("Using default guard config");
        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}
