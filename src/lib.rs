//! Score Guard - tamper detection for a browser-held score
//!
//! Core modules:
//! - `codec`: Tamper-evident token encoding (XOR + base64 + checksum)
//! - `persistence`: The persisted score record, stored as a token
//! - `watchdog`: Periodic reconciliation of memory, display and storage
//! - `platform`: Browser/native platform abstraction
//! - `config`: Startup configuration injected by the page
//! - `logging`: Console/env logger setup

pub mod codec;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod persistence;
pub mod platform;
pub mod score;
pub mod watchdog;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use codec::{Codec, Token};
pub use config::{GuardConfig, WatchdogConfig};
pub use display::{MemoryDisplay, ScoreDisplay};
pub use error::{CodecError, LoadError, StorageError};
pub use persistence::{ScoreRecord, ScoreStore};
pub use score::ProtectedScore;
pub use watchdog::{IntegrityWatchdog, TickReport, WatchdogState};

#[cfg(target_arch = "wasm32")]
pub use display::DomScoreDisplay;
#[cfg(target_arch = "wasm32")]
pub use watchdog::WatchdogHandle;
#[cfg(target_arch = "wasm32")]
pub use web::ScoreGuard;
