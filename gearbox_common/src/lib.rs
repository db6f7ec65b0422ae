//! Gearbox Common Library
//!
//! This crate provides shared constants, configuration loading and the
//! hardware driver contract for all gearbox rig workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - Gear limits and default values
//! - [`config`] - Rig configuration types and the TOML loader
//! - [`hal`] - Driver trait, error type and I/O identifiers
//! - [`clock`] - Injected monotonic time source
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust,no_run
//! use gearbox_common::prelude::*;
//! use std::path::Path;
//!
//! let config = RigConfig::load_validated(Path::new("config/rig.toml"))?;
//! # Ok::<(), ConfigError>(())
//! ```

pub mod clock;
pub mod config;
pub mod consts;
pub mod hal;
pub mod prelude;
