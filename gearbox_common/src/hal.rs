//! Hardware abstraction layer contract.
//!
//! This module contains the driver trait, its error type and the I/O
//! identifiers shared by the rig controller and every driver.

pub mod driver;
pub mod types;
