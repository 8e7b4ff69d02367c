//! Key material: plaintext buffers or references into a key store.

use crate::{Error, Result};
use alloc::vec::Vec;
use core::fmt;
use zeroize::Zeroizing;

/// Identifier of a key held by a [`KeyStore`].
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyId(pub u32);

/// Algorithm a stored key may be used with.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Algorithm {
    /// Password authenticated key exchange.
    Pake,
}

/// Permitted uses of a stored key.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Usage(u32);

impl Usage {
    /// Key may be exported in plaintext.
    pub const EXPORT: Self = Self(1 << 0);

    /// Key may be used to derive other keys.
    pub const DERIVE: Self = Self(1 << 14);

    /// Does `self` grant everything in `other`?
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl core::ops::BitOr for Usage {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Storage lifetime of a key.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Lifetime {
    /// Lost when the key store is dropped or reset.
    #[default]
    Volatile,
    /// Survives resets under a caller-chosen identifier.
    Persistent,
}

/// Policy attached to a key store entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyAttributes {
    /// Permitted algorithm.
    pub algorithm: Algorithm,
    /// Permitted usage.
    pub usage: Usage,
    /// Storage lifetime.
    pub lifetime: Lifetime,
    /// Identifier requested for a persistent key.
    pub id: Option<KeyId>,
}

impl KeyAttributes {
    /// Volatile EC-JPAKE key with the given usage.
    pub const fn pake(usage: Usage) -> Self {
        Self {
            algorithm: Algorithm::Pake,
            usage,
            lifetime: Lifetime::Volatile,
            id: None,
        }
    }

    /// Make the key persistent under `id`.
    pub const fn persistent(mut self, id: KeyId) -> Self {
        self.lifetime = Lifetime::Persistent;
        self.id = Some(id);
        self
    }

    /// Is this a persistent key?
    pub const fn is_persistent(&self) -> bool {
        matches!(self.lifetime, Lifetime::Persistent)
    }
}

/// Secure key storage service.
pub trait KeyStore {
    /// Export the key `id` into `out`, returning its length.
    ///
    /// Fails if the key does not exist, its policy does not permit
    /// `algorithm` and `usage`, or `out` is too small.
    fn get_key(&mut self, id: KeyId, out: &mut [u8], algorithm: Algorithm, usage: Usage)
    -> Result<usize>;

    /// Import `material` under `attributes`, returning the new identifier.
    fn import_key(&mut self, attributes: &KeyAttributes, material: &[u8]) -> Result<KeyId>;
}

impl<K: KeyStore + ?Sized> KeyStore for &mut K {
    fn get_key(
        &mut self,
        id: KeyId,
        out: &mut [u8],
        algorithm: Algorithm,
        usage: Usage,
    ) -> Result<usize> {
        (**self).get_key(id, out, algorithm, usage)
    }

    fn import_key(&mut self, attributes: &KeyAttributes, material: &[u8]) -> Result<KeyId> {
        (**self).import_key(attributes, material)
    }
}

/// Placeholder for engines that only use plaintext keys.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoKeyStore;

impl KeyStore for NoKeyStore {
    fn get_key(&mut self, _: KeyId, _: &mut [u8], _: Algorithm, _: Usage) -> Result<usize> {
        Err(Error::KeyStore)
    }

    fn import_key(&mut self, _: &KeyAttributes, _: &[u8]) -> Result<KeyId> {
        Err(Error::KeyStore)
    }
}

/// A key handed to or produced by an operation.
///
/// Inputs are [`KeyMaterial::Plaintext`] or [`KeyMaterial::KeyStore`].
/// Outputs start out as one of the blank variants and are replaced by the
/// matching populated variant when the operation succeeds.
///
/// Keys are big-endian octet strings; public keys use the uncompressed
/// `0x04 || X || Y` encoding.
#[derive(Clone, Eq, PartialEq)]
pub enum KeyMaterial {
    /// Key bytes held in memory, wiped on drop.
    Plaintext(Zeroizing<Vec<u8>>),

    /// Key held by the key store.
    KeyStore {
        /// Store identifier.
        id: KeyId,
        /// Declared key length.
        length: usize,
        /// Store policy.
        attributes: KeyAttributes,
    },

    /// Output slot for a plaintext key of `length` bytes.
    BlankPlaintext {
        /// Expected key length.
        length: usize,
    },

    /// Output slot imported into the key store on success.
    BlankKeyStore {
        /// Expected key length.
        length: usize,
        /// Policy of the imported key.
        attributes: KeyAttributes,
    },
}

impl KeyMaterial {
    /// Plaintext key from big-endian bytes.
    pub fn plaintext(bytes: impl Into<Vec<u8>>) -> Self {
        KeyMaterial::Plaintext(Zeroizing::new(bytes.into()))
    }

    /// Reference to a key already in the key store.
    pub const fn key_store(id: KeyId, length: usize, attributes: KeyAttributes) -> Self {
        KeyMaterial::KeyStore {
            id,
            length,
            attributes,
        }
    }

    /// Blank plaintext output slot.
    pub const fn blank_plaintext(length: usize) -> Self {
        KeyMaterial::BlankPlaintext { length }
    }

    /// Blank key store output slot.
    pub const fn blank_key_store(length: usize, attributes: KeyAttributes) -> Self {
        KeyMaterial::BlankKeyStore { length, attributes }
    }

    /// Is this an output slot that has not been written yet?
    pub fn is_blank(&self) -> bool {
        matches!(
            self,
            KeyMaterial::BlankPlaintext { .. } | KeyMaterial::BlankKeyStore { .. }
        )
    }

    /// Declared key length in bytes.
    pub fn len(&self) -> usize {
        match self {
            KeyMaterial::Plaintext(bytes) => bytes.len(),
            KeyMaterial::KeyStore { length, .. }
            | KeyMaterial::BlankPlaintext { length }
            | KeyMaterial::BlankKeyStore { length, .. } => *length,
        }
    }

    /// Is the declared key length zero?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Is this key stored with a persistent lifetime?
    pub fn is_persistent(&self) -> bool {
        match self {
            KeyMaterial::KeyStore { attributes, .. }
            | KeyMaterial::BlankKeyStore { attributes, .. } => attributes.is_persistent(),
            _ => false,
        }
    }

    /// Plaintext bytes, if this key is held in memory.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            KeyMaterial::Plaintext(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Key store identifier, if this key is held by a key store.
    pub fn id(&self) -> Option<KeyId> {
        match self {
            KeyMaterial::KeyStore { id, .. } => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMaterial::Plaintext(bytes) => f
                .debug_struct("Plaintext")
                .field("length", &bytes.len())
                .finish_non_exhaustive(),
            KeyMaterial::KeyStore {
                id,
                length,
                attributes,
            } => f
                .debug_struct("KeyStore")
                .field("id", id)
                .field("length", length)
                .field("attributes", attributes)
                .finish(),
            KeyMaterial::BlankPlaintext { length } => f
                .debug_struct("BlankPlaintext")
                .field("length", length)
                .finish(),
            KeyMaterial::BlankKeyStore { length, attributes } => f
                .debug_struct("BlankKeyStore")
                .field("length", length)
                .field("attributes", attributes)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyAttributes, KeyId, KeyMaterial, Usage};
    use alloc::format;

    #[test]
    fn blank_slots() {
        let attributes = KeyAttributes::pake(Usage::DERIVE);
        assert!(KeyMaterial::blank_plaintext(65).is_blank());
        assert!(KeyMaterial::blank_key_store(32, attributes).is_blank());
        assert!(!KeyMaterial::plaintext([1u8; 32]).is_blank());
        assert!(!KeyMaterial::key_store(KeyId(7), 32, attributes).is_blank());
    }

    #[test]
    fn persistent_lifetime() {
        let volatile = KeyAttributes::pake(Usage::DERIVE);
        let persistent = volatile.persistent(KeyId(0x10));
        assert!(!KeyMaterial::blank_key_store(32, volatile).is_persistent());
        assert!(KeyMaterial::blank_key_store(32, persistent).is_persistent());
        assert!(!KeyMaterial::plaintext([1u8; 32]).is_persistent());
    }

    #[test]
    fn usage_contains() {
        let usage = Usage::DERIVE | Usage::EXPORT;
        assert!(usage.contains(Usage::DERIVE));
        assert!(usage.contains(Usage::EXPORT));
        assert!(!Usage::EXPORT.contains(Usage::DERIVE));
    }

    #[test]
    fn debug_does_not_leak_plaintext() {
        let key = KeyMaterial::plaintext([0xab; 4]);
        let debug = format!("{key:?}");
        assert!(!debug.contains("171"));
        assert!(debug.contains("length: 4"));
    }
}
