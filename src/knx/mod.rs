//! KNX bus access
//!
//! Group addresses and datapoint encodings, the KNXnet/IP routing codec and
//! the bus seam used by the runner.

pub mod address;
pub mod cemi;
pub mod dpt;
pub mod router;

pub use address::{GroupAddress, IndividualAddress};
pub use cemi::GroupEvent;
pub use dpt::Switch;
pub use router::{KnxRouter, RouterConnector};

use crate::config::KnxConfig;
use crate::error::Result;
use async_trait::async_trait;
use tracing::debug;

/// Connection able to carry group events
#[async_trait]
pub trait GroupBus: Send {
    /// Send one event; no retry
    async fn send(&mut self, event: GroupEvent) -> Result<()>;

    /// Release the connection; closing twice is a no-op
    async fn close(&mut self) -> Result<()>;
}

/// Opens a [`GroupBus`] for the configured endpoint
#[async_trait]
pub trait BusConnector: Sync {
    type Bus: GroupBus;

    async fn connect(&self, config: &KnxConfig) -> Result<Self::Bus>;
}

/// Write `value` as DPT 1.001 to the group named by `group`
pub async fn send_command<B>(bus: &mut B, group: &str, value: bool) -> Result<()>
where
    B: GroupBus + ?Sized,
{
    let destination: GroupAddress = group.parse()?;
    debug!(%destination, value, "group write");
    bus.send(GroupEvent::write(destination, Switch(value).pack()))
        .await
}
