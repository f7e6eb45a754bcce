use crate::error::{EjpError, Result};
use std::fmt;
use std::str::FromStr;

/// KNX group address
///
/// Accepted text forms are three-level `main/middle/sub` (0-31/0-7/0-255),
/// two-level `main/sub` (0-31/0-2047) and free `n` (0-65535).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupAddress(u16);

impl GroupAddress {
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u16 {
        self.0
    }

    pub const fn to_be_bytes(&self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    pub const fn main(&self) -> u8 {
        (self.0 >> 11) as u8
    }

    pub const fn middle(&self) -> u8 {
        ((self.0 >> 8) & 0x07) as u8
    }

    pub const fn sub(&self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

fn check_range(text: &str, part: &str, value: u32, max: u32) -> Result<()> {
    if value > max {
        return Err(EjpError::address_format(
            text,
            format!("{} {} out of range 0-{}", part, value, max),
        ));
    }
    Ok(())
}

fn parse_part(text: &str, part: &str, raw: &str, max: u32) -> Result<u32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EjpError::address_format(
            text,
            format!("{} {:?} is not a number", part, raw),
        ));
    }
    let value = raw
        .parse::<u32>()
        .map_err(|e| EjpError::address_format(text, format!("{}: {}", part, e)))?;
    check_range(text, part, value, max)?;
    Ok(value)
}

impl FromStr for GroupAddress {
    type Err = EjpError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        let raw = match parts.as_slice() {
            [main, middle, sub] => {
                let main = parse_part(s, "main group", main, 31)?;
                let middle = parse_part(s, "middle group", middle, 7)?;
                let sub = parse_part(s, "sub group", sub, 255)?;
                (main << 11) | (middle << 8) | sub
            }
            [main, sub] => {
                let main = parse_part(s, "main group", main, 31)?;
                let sub = parse_part(s, "sub group", sub, 2047)?;
                (main << 11) | sub
            }
            [free] => parse_part(s, "address", free, u32::from(u16::MAX))?,
            _ => {
                return Err(EjpError::address_format(
                    s,
                    "expected main/middle/sub, main/sub or a free address",
                ));
            }
        };
        u16::try_from(raw)
            .map(Self)
            .map_err(|e| EjpError::address_format(s, e.to_string()))
    }
}

impl fmt::Display for GroupAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.main(), self.middle(), self.sub())
    }
}

/// KNX individual (physical) address `area.line.device`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IndividualAddress(u16);

impl IndividualAddress {
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn to_be_bytes(&self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for IndividualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.0 >> 12, (self.0 >> 8) & 0x0F, self.0 & 0xFF)
    }
}
