//! Datapoint type encodings

/// DPT 1.001 (switch): one bit, off/on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Switch(pub bool);

impl Switch {
    pub fn pack(&self) -> Vec<u8> {
        vec![u8::from(self.0)]
    }
}
