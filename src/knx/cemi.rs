//! KNXnet/IP routing frames carrying cEMI group telegrams
//!
//! Frame layout (all big-endian):
//!
//! | bytes | field |
//! |---|---|
//! | 0-5 | KNXnet/IP header: 0x06, 0x10, service 0x0530, total length |
//! | 6 | cEMI message code (0x29 `L_Data.ind`) |
//! | 7 | additional info length (0) |
//! | 8-9 | control fields 1 and 2 |
//! | 10-11 | source individual address |
//! | 12-13 | destination group address |
//! | 14 | NPDU length |
//! | 15-16.. | TPCI/APCI and data |

use crate::error::{EjpError, Result};
use crate::knx::address::{GroupAddress, IndividualAddress};

pub const HEADER_LEN: u8 = 0x06;
pub const PROTOCOL_VERSION: u8 = 0x10;
pub const ROUTING_INDICATION: u16 = 0x0530;
pub const L_DATA_IND: u8 = 0x29;

/// Standard frame, no repeat, system broadcast off, low priority
pub const CONTROL_1: u8 = 0xBC;
/// Group destination, hop count 6
pub const CONTROL_2: u8 = 0xE0;

/// APCI of `A_GroupValue_Write`
pub const GROUP_VALUE_WRITE: u8 = 0x80;

// Payloads up to this value ride in the low APCI bits.
const SHORT_DATA_MAX: u8 = 0x3F;

/// A group value write before framing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEvent {
    pub source: IndividualAddress,
    pub destination: GroupAddress,
    pub data: Vec<u8>,
}

impl GroupEvent {
    /// Group value write from the default source address
    pub fn write(destination: GroupAddress, data: Vec<u8>) -> Self {
        Self {
            source: IndividualAddress::default(),
            destination,
            data,
        }
    }
}

/// Encode a group event as a KNXnet/IP routing indication
pub fn encode(event: &GroupEvent) -> Result<Vec<u8>> {
    let mut tpdu = vec![0x00];
    match event.data.as_slice() {
        [b] if *b <= SHORT_DATA_MAX => tpdu.push(GROUP_VALUE_WRITE | b),
        data => {
            tpdu.push(GROUP_VALUE_WRITE);
            tpdu.extend_from_slice(data);
        }
    }

    let npdu_len = u8::try_from(tpdu.len() - 1)
        .map_err(|_| EjpError::transport(format!("payload too long: {} bytes", event.data.len())))?;

    let mut cemi = Vec::with_capacity(9 + tpdu.len());
    cemi.push(L_DATA_IND);
    cemi.push(0x00);
    cemi.push(CONTROL_1);
    cemi.push(CONTROL_2);
    cemi.extend_from_slice(&event.source.to_be_bytes());
    cemi.extend_from_slice(&event.destination.to_be_bytes());
    cemi.push(npdu_len);
    cemi.extend_from_slice(&tpdu);

    let total = u16::try_from(usize::from(HEADER_LEN) + cemi.len())
        .map_err(|_| EjpError::transport("frame too long"))?;

    let mut frame = Vec::with_capacity(usize::from(total));
    frame.push(HEADER_LEN);
    frame.push(PROTOCOL_VERSION);
    frame.extend_from_slice(&ROUTING_INDICATION.to_be_bytes());
    frame.extend_from_slice(&total.to_be_bytes());
    frame.extend_from_slice(&cemi);
    Ok(frame)
}

/// Decode a KNXnet/IP routing indication carrying a group value write
pub fn decode(frame: &[u8]) -> Result<GroupEvent> {
    let malformed = |msg: &str| EjpError::transport(format!("malformed routing frame: {}", msg));

    if frame.len() < usize::from(HEADER_LEN) {
        return Err(malformed("short header"));
    }
    if frame[0] != HEADER_LEN || frame[1] != PROTOCOL_VERSION {
        return Err(malformed("bad header"));
    }
    if u16::from_be_bytes([frame[2], frame[3]]) != ROUTING_INDICATION {
        return Err(malformed("not a routing indication"));
    }
    if usize::from(u16::from_be_bytes([frame[4], frame[5]])) != frame.len() {
        return Err(malformed("length mismatch"));
    }

    let cemi = &frame[usize::from(HEADER_LEN)..];
    if cemi.len() < 2 || cemi[0] != L_DATA_IND {
        return Err(malformed("not L_Data.ind"));
    }
    let info_end = 2 + usize::from(cemi[1]);
    if cemi.len() < info_end {
        return Err(malformed("additional info overruns frame"));
    }
    let body = &cemi[info_end..];
    // ctrl1 ctrl2 src(2) dst(2) len tpci apci
    if body.len() < 9 {
        return Err(malformed("short cEMI body"));
    }
    if body[1] & 0x80 == 0 {
        return Err(malformed("destination is not a group address"));
    }

    let source = IndividualAddress::from_raw(u16::from_be_bytes([body[2], body[3]]));
    let destination = GroupAddress::from_raw(u16::from_be_bytes([body[4], body[5]]));
    let npdu_len = usize::from(body[6]);
    let tpdu = &body[7..];
    if tpdu.len() != npdu_len + 1 {
        return Err(malformed("NPDU length mismatch"));
    }
    if tpdu[0] & 0x03 != 0 || tpdu[1] & 0xC0 != GROUP_VALUE_WRITE {
        return Err(malformed("not a group value write"));
    }

    let data = if npdu_len == 1 {
        vec![tpdu[1] & SHORT_DATA_MAX]
    } else {
        tpdu[2..].to_vec()
    };

    Ok(GroupEvent {
        source,
        destination,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ga(s: &str) -> GroupAddress {
        s.parse().unwrap()
    }

    #[test]
    fn test_encode_short_write() {
        let frame = encode(&GroupEvent::write(ga("1/2/3"), vec![0x01])).unwrap();
        assert_eq!(
            frame,
            vec![
                0x06, 0x10, 0x05, 0x30, 0x00, 0x11, // header, 17 bytes
                0x29, 0x00, 0xBC, 0xE0, // L_Data.ind, no add. info, ctrl
                0x00, 0x00, 0x0A, 0x03, // 0.0.0 -> 1/2/3
                0x01, 0x00, 0x81, // 1 byte NPDU, GroupValueWrite(1)
            ]
        );
    }

    #[test]
    fn test_encode_long_write() {
        let frame = encode(&GroupEvent::write(ga("0/0/1"), vec![0x0C, 0x1A])).unwrap();
        assert_eq!(frame.len(), 19);
        assert_eq!(frame[14], 0x03);
        assert_eq!(&frame[15..], &[0x00, 0x80, 0x0C, 0x1A]);
    }

    #[test]
    fn test_decode_encoded_write() {
        let event = GroupEvent::write(ga("4/1/20"), vec![0x00]);
        let decoded = decode(&encode(&event).unwrap()).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode(&[]).is_err());
        assert!(decode(&[0x06, 0x10, 0x02, 0x01, 0x00, 0x06]).is_err());

        let mut frame = encode(&GroupEvent::write(ga("1/2/3"), vec![0x01])).unwrap();
        frame[5] = 0x20;
        assert!(decode(&frame).is_err());
    }

    #[test]
    fn test_decode_rejects_group_read() {
        let mut frame = encode(&GroupEvent::write(ga("1/2/3"), vec![0x01])).unwrap();
        // GroupValueRead carries no data in the APCI byte
        frame[16] = 0x00;
        let err = decode(&frame).unwrap_err();
        assert!(err.to_string().contains("not a group value write"));
    }

    #[test]
    fn test_decode_skips_additional_info() {
        let mut frame = encode(&GroupEvent::write(ga("1/2/3"), vec![0x01])).unwrap();
        // insert two bytes of additional info after the message code
        frame[7] = 0x02;
        let _ = frame.splice(8..8, [0x03, 0x00]);
        let total = u8::try_from(frame.len()).unwrap();
        frame[5] = total;
        let decoded = decode(&frame).unwrap();
        assert_eq!(decoded.destination, ga("1/2/3"));
        assert_eq!(decoded.data, vec![0x01]);
    }
}
