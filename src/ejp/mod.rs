//! EJP tariff status integration
//!
//! `client` talks to the status API, `window` turns the two day buckets of
//! its answer into the preavis/asserv signals.

pub mod client;
pub mod types;
pub mod window;

pub use client::{EjpClient, HTTP_TIMEOUT};
pub use types::{EjpResponse, EjpSignals, EjpStatus, ZoneStatuses};
pub use window::{ASSERV_BEGIN_HOUR, decide, status_is_ejp};
