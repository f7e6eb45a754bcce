//! One run of the bridge: status in, two group writes out
//!
//! The run walks a single path
//! `Idle → ConfigLoaded → ConnectionOpen → StatusFetched → FirstCommandSent →
//! SecondCommandSent → Closed` and stops at the first error. The bus handed
//! to [`run`] is always closed before it returns.
//!
//! [`run_with`] adds the startup steps: the configuration is loaded and the
//! status source built before any bus connection is opened.

use crate::config::{Config, EjpConfig};
use crate::ejp::{EjpClient, EjpSignals};
use crate::error::Result;
use crate::knx::{self, BusConnector, GroupBus, RouterConnector};
use crate::logging::get_logger;
use async_trait::async_trait;
use std::fmt;

/// Progress of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    ConfigLoaded,
    ConnectionOpen,
    StatusFetched,
    FirstCommandSent,
    SecondCommandSent,
    Closed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::ConfigLoaded => "config_loaded",
            Self::ConnectionOpen => "connection_open",
            Self::StatusFetched => "status_fetched",
            Self::FirstCommandSent => "first_command_sent",
            Self::SecondCommandSent => "second_command_sent",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Source of the tariff signals
#[async_trait]
pub trait StatusSource: Sync {
    async fn get_status(&self) -> Result<EjpSignals>;
}

#[async_trait]
impl StatusSource for EjpClient {
    async fn get_status(&self) -> Result<EjpSignals> {
        EjpClient::get_status(self).await
    }
}

/// Full run against the real API and KNX router
pub async fn run_from_env() -> Result<()> {
    run_with(Config::load, &RouterConnector, EjpClient::new).await
}

/// Load the configuration, build the status source, open the bus and run
///
/// Nothing touches the network or the bus when loading or building fails.
pub async fn run_with<L, C, F, S>(load: L, connector: &C, make_source: F) -> Result<()>
where
    L: FnOnce() -> Result<Config>,
    C: BusConnector + ?Sized,
    F: FnOnce(&EjpConfig) -> Result<S>,
    S: StatusSource,
{
    let logger = get_logger("runner");
    logger.debug(&format!("stage={}", Stage::Idle));

    let config = load()?;
    logger.debug(&format!("stage={} zone={}", Stage::ConfigLoaded, config.ejp.zone));

    let source = make_source(&config.ejp)?;
    let mut bus = connector.connect(&config.knx).await?;

    run(&config, &mut bus, &source).await
}

/// Fetch the signals and write them to the bus, then close the bus
///
/// A step error is returned in preference to a close error.
pub async fn run<B, S>(config: &Config, bus: &mut B, source: &S) -> Result<()>
where
    B: GroupBus + ?Sized,
    S: StatusSource + ?Sized,
{
    let logger = get_logger("runner");
    logger.debug(&format!("stage={}", Stage::ConnectionOpen));

    let outcome = dispatch(config, bus, source).await;
    let closed = bus.close().await;
    logger.debug(&format!("stage={}", Stage::Closed));

    outcome.and(closed)
}

async fn dispatch<B, S>(config: &Config, bus: &mut B, source: &S) -> Result<()>
where
    B: GroupBus + ?Sized,
    S: StatusSource + ?Sized,
{
    let logger = get_logger("runner");

    let signals = source.get_status().await?;
    logger.debug(&format!("stage={} {}", Stage::StatusFetched, signals));

    knx::send_command(bus, &config.knx.preavis_group, signals.preavis).await?;
    logger.info(&format!(
        "preavis={} sent to {}",
        signals.preavis, config.knx.preavis_group
    ));
    logger.debug(&format!("stage={}", Stage::FirstCommandSent));

    knx::send_command(bus, &config.knx.asserv_group, signals.asserv).await?;
    logger.info(&format!(
        "asserv={} sent to {}",
        signals.asserv, config.knx.asserv_group
    ));
    logger.debug(&format!("stage={}", Stage::SecondCommandSent));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Idle.to_string(), "idle");
        assert_eq!(Stage::FirstCommandSent.to_string(), "first_command_sent");
        assert_eq!(Stage::Closed.to_string(), "closed");
    }
}
