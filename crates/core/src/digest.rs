//! Snapshot fingerprints.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// BLAKE3 over the CBOR encoding of a value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Digest([u8; 32]);

impl Digest {
    pub fn of_value<T: Serialize>(value: &T) -> Result<Self> {
        let mut encoded = Vec::new();
        ciborium::into_writer(value, &mut encoded)?;
        Ok(Self(*blake3::hash(&encoded).as_bytes()))
    }

    /// Lowercase hex, 64 characters.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|byte| format!("{byte:02x}")).collect()
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
