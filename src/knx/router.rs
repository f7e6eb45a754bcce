//! KNXnet/IP routing client
//!
//! Routing is connectionless: "connecting" binds a local UDP socket and pins
//! it to the router (or multicast group) endpoint, each group event is one
//! datagram.

use crate::config::KnxConfig;
use crate::error::{EjpError, Result};
use crate::knx::{BusConnector, GroupBus};
use crate::knx::cemi::{self, GroupEvent};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

/// Routing client bound to one endpoint
pub struct KnxRouter {
    /// Open socket, `None` once closed
    socket: Option<UdpSocket>,

    /// Resolved router endpoint
    endpoint: SocketAddr,

    /// Operation timeout
    operation_timeout: Duration,

    /// Logger
    logger: StructuredLogger,
}

impl KnxRouter {
    /// Open a routing socket towards `config.ip:config.port`
    pub async fn connect(config: &KnxConfig) -> Result<Self> {
        let address = config.endpoint();
        let logger =
            get_logger_with_context(LogContext::new("knx").with_field("endpoint", address.clone()));

        logger.info(&format!("Connecting to KNX router at {}", address));

        let endpoint = tokio::net::lookup_host(address.as_str())
            .await
            .map_err(|e| EjpError::transport(format!("Cannot resolve {}: {}", address, e)))?
            .next()
            .ok_or_else(|| EjpError::transport(format!("No address found for {}", address)))?;

        let local: SocketAddr = if endpoint.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };

        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| EjpError::transport(format!("Failed to bind UDP socket: {}", e)))?;
        socket.connect(endpoint).await.map_err(|e| {
            let error_msg = format!("Failed to connect to KNX router: {}", e);
            logger.error(&error_msg);
            EjpError::transport(error_msg)
        })?;

        logger.info("KNX routing socket ready");
        Ok(Self {
            socket: Some(socket),
            endpoint,
            operation_timeout: Duration::from_secs(2),
            logger,
        })
    }

    pub fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }

    /// Check if the socket is still open
    pub fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    fn get_socket(&self) -> Result<&UdpSocket> {
        self.socket
            .as_ref()
            .ok_or_else(|| EjpError::transport("Not connected to KNX router"))
    }
}

#[async_trait]
impl GroupBus for KnxRouter {
    async fn send(&mut self, event: GroupEvent) -> Result<()> {
        let frame = cemi::encode(&event)?;
        self.logger.debug(&format!(
            "Sending group write to {} with data {:02X?}",
            event.destination, event.data
        ));

        let socket = self.get_socket()?;
        match timeout(self.operation_timeout, socket.send(&frame)).await {
            Ok(Ok(n)) if n == frame.len() => {
                self.logger.trace(&format!("Wrote routing frame {:02X?}", frame));
                Ok(())
            }
            Ok(Ok(n)) => {
                let error_msg = format!("Short write: {} of {} bytes", n, frame.len());
                self.logger.error(&error_msg);
                Err(EjpError::transport(error_msg))
            }
            Ok(Err(e)) => {
                let error_msg = format!("Failed to send group event: {}", e);
                self.logger.error(&error_msg);
                Err(EjpError::transport(error_msg))
            }
            Err(_) => {
                let error_msg = "Send operation timeout".to_string();
                self.logger.error(&error_msg);
                Err(EjpError::transport(error_msg))
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.socket.take().is_some() {
            self.logger.info("Closing KNX routing socket");
        }
        Ok(())
    }
}

/// Connector opening a [`KnxRouter`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RouterConnector;

#[async_trait]
impl BusConnector for RouterConnector {
    type Bus = KnxRouter;

    async fn connect(&self, config: &KnxConfig) -> Result<KnxRouter> {
        KnxRouter::connect(config).await
    }
}
