//! # audiocloud-settings
//!
//! Configuration for the audiocloud domain client.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`DomainSettings::default()`]
//! 2. **User file**: `~/.audiocloud/domain-client.json` (deep-merged over defaults)
//! 3. **Environment variables**: `AUDIOCLOUD_*` overrides (highest priority)
//!
//! There is no global instance; callers load once and hand the value to the
//! client.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
