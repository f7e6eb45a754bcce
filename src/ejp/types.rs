use crate::config::Zone;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Status of one zone for one day, as labelled by the API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum EjpStatus {
    /// `EST_EJP`: the day is an EJP day
    Ejp,
    /// `NON_EJP`
    NonEjp,
    /// `ND`: not determined yet
    NotDetermined,
    Other(String),
}

impl EjpStatus {
    pub const EJP_LABEL: &'static str = "EST_EJP";

    pub fn from_label(s: &str) -> Self {
        match s {
            "EST_EJP" => Self::Ejp,
            "NON_EJP" => Self::NonEjp,
            "ND" => Self::NotDetermined,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Ejp => Self::EJP_LABEL,
            Self::NonEjp => "NON_EJP",
            Self::NotDetermined => "ND",
            Self::Other(s) => s.as_str(),
        }
    }

    pub fn is_ejp(&self) -> bool {
        matches!(self, Self::Ejp)
    }
}

impl From<String> for EjpStatus {
    fn from(s: String) -> Self {
        Self::from_label(&s)
    }
}

impl fmt::Display for EjpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-zone statuses for one day
pub type ZoneStatuses = BTreeMap<Zone, EjpStatus>;

/// Body returned by the status API
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EjpResponse {
    /// Today
    #[serde(rename = "JourJ", default, deserialize_with = "known_zones")]
    pub today: ZoneStatuses,

    /// Tomorrow
    #[serde(rename = "JourJ1", default, deserialize_with = "known_zones")]
    pub tomorrow: ZoneStatuses,
}

// Keys outside the four known zones are dropped; a null bucket is empty.
fn known_zones<'de, D>(deserializer: D) -> Result<ZoneStatuses, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, EjpStatus>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(k, v)| Zone::from_str(&k).ok().map(|z| (z, v)))
        .collect())
}

/// Signals written to the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EjpSignals {
    /// Advance warning: an EJP window is coming
    pub preavis: bool,
    /// Active restriction: the EJP window is in effect
    pub asserv: bool,
}

impl fmt::Display for EjpSignals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "preavis={} asserv={}", self.preavis, self.asserv)
    }
}
