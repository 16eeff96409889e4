//! Key-pair supplier for application signatures.
//!
//! The registry treats key material as opaque: it stores exactly the
//! modulus and exponent it receives and never checks cryptographic
//! soundness. This factory is the in-tree stand-in for the external
//! supplier, producing RSA-shaped public material plus a rotation-epoch
//! label that is strictly increasing within a process.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use rand::RngCore;

use crate::types::{KeyTimestamp, Signature};

/// Size of the generated modulus in bytes (2048-bit shape).
const MODULUS_LEN: usize = 256;

/// The F4 public exponent, 65537.
const EXPONENT_F4: [u8; 3] = [0x01, 0x00, 0x01];

/// A freshly generated key pair's public half plus its rotation label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPairHolder {
    pub modulus: Bytes,
    pub exponent: Bytes,
    pub timestamp: KeyTimestamp,
}

impl KeyPairHolder {
    /// The public signature material for this key pair.
    pub fn signature(&self) -> Signature {
        Signature::new(self.modulus.clone(), self.exponent.clone())
    }
}

/// Generates key pairs with strictly increasing timestamp labels.
pub struct KeyPairFactory {
    last_label: AtomicI64,
}

impl KeyPairFactory {
    pub fn new() -> Self {
        Self {
            last_label: AtomicI64::new(0),
        }
    }

    /// Generate a fresh key pair.
    ///
    /// The timestamp label is the current Unix millisecond clock, bumped
    /// past the previous label when the clock has not advanced, so two
    /// generations from the same factory never collide.
    pub fn generate(&self) -> KeyPairHolder {
        let mut modulus = vec![0u8; MODULUS_LEN];
        rand::thread_rng().fill_bytes(&mut modulus);

        let label = self.next_label();

        KeyPairHolder {
            modulus: Bytes::from(modulus),
            exponent: Bytes::from_static(&EXPONENT_F4),
            timestamp: KeyTimestamp::new(label.to_string()),
        }
    }

    fn next_label(&self) -> i64 {
        let now = now_millis();
        self.last_label
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .map(|last| now.max(last + 1))
            .unwrap_or(now)
    }
}

impl Default for KeyPairFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_material_shape() {
        let factory = KeyPairFactory::new();
        let holder = factory.generate();
        assert_eq!(holder.modulus.len(), MODULUS_LEN);
        assert_eq!(holder.exponent.as_ref(), &EXPONENT_F4);
    }

    #[test]
    fn test_labels_strictly_increase() {
        let factory = KeyPairFactory::new();
        let labels: Vec<i64> = (0..100)
            .map(|_| {
                factory
                    .generate()
                    .timestamp
                    .as_str()
                    .parse::<i64>()
                    .unwrap()
            })
            .collect();
        for pair in labels.windows(2) {
            assert!(pair[0] < pair[1], "labels must strictly increase");
        }
    }

    #[test]
    fn test_moduli_are_distinct() {
        let factory = KeyPairFactory::new();
        let a = factory.generate();
        let b = factory.generate();
        assert_ne!(a.modulus, b.modulus);
    }

    #[test]
    fn test_signature_carries_material() {
        let factory = KeyPairFactory::new();
        let holder = factory.generate();
        let sig = holder.signature();
        assert_eq!(sig.modulus, holder.modulus);
        assert_eq!(sig.exponent, holder.exponent);
    }
}
