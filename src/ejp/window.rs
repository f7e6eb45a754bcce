//! Time-window interpretation of the status buckets
//!
//! The tariff day runs from 06:00 to 06:00 UTC. Before the cutover the
//! "today" bucket announces the window about to start, so it only feeds the
//! advance warning. From the cutover on, "today" is the window in effect and
//! "tomorrow" feeds the advance warning.

use crate::config::Zone;
use crate::ejp::types::{EjpResponse, EjpSignals, ZoneStatuses};
use chrono::{DateTime, Timelike, Utc};

/// UTC hour at which the tariff day switches over
pub const ASSERV_BEGIN_HOUR: u32 = 6;

/// True iff `zone` is marked as an EJP day in `bucket`; a missing zone is false
pub fn status_is_ejp(bucket: &ZoneStatuses, zone: Zone) -> bool {
    bucket.get(&zone).is_some_and(|s| s.is_ejp())
}

/// Whether `now` falls before the daily cutover of its own UTC date
pub fn before_cutover(now: DateTime<Utc>) -> bool {
    now.hour() < ASSERV_BEGIN_HOUR
}

/// Derive the bus signals for `zone` at instant `now`
pub fn decide(response: &EjpResponse, zone: Zone, now: DateTime<Utc>) -> EjpSignals {
    if before_cutover(now) {
        // asserv stays off until the cutover, whatever yesterday announced
        EjpSignals {
            preavis: status_is_ejp(&response.today, zone),
            asserv: false,
        }
    } else {
        EjpSignals {
            preavis: status_is_ejp(&response.tomorrow, zone),
            asserv: status_is_ejp(&response.today, zone),
        }
    }
}
