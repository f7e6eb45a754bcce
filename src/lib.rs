//! # ejp-knx - EJP tariff signals on a KNX bus
//!
//! A one-shot bridge meant to be started by an external scheduler. Each run
//! asks the EJP status API about the configured zone, turns the answer into
//! two booleans and writes them to two KNX group addresses:
//!
//! - **preavis**: an EJP window is announced
//! - **asserv**: the EJP window is in effect
//!
//! ## Architecture
//!
//! - `config`: YAML configuration loading and validation
//! - `logging`: tracing setup driven by `LOG_FORMAT` / `LOG_LEVEL`
//! - `ejp`: status API client and the 06:00 UTC time-window rule
//! - `knx`: group addresses, DPT 1.001, KNXnet/IP routing
//! - `runner`: the fetch-then-write sequence with guaranteed bus release
//! - `error`: crate-wide error type

pub mod config;
pub mod ejp;
pub mod error;
pub mod knx;
pub mod logging;
pub mod runner;

// Re-export commonly used types
pub use config::Config;
pub use ejp::{EjpClient, EjpSignals};
pub use error::{EjpError, Result};
