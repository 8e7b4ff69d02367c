//! Key material resolution and result write-back.

use crate::{
    Error, Result,
    curve::MAX_CURVE_LENGTH,
    key::{Algorithm, KeyMaterial, KeyStore, Usage},
    scratch::reverse_copy_pad,
};
use alloc::vec::Vec;
use zeroize::{Zeroize, Zeroizing};

/// Largest private key or pre-shared secret fetched from a key store.
pub(crate) const MAX_PRIVATE_KEY_SIZE: usize = MAX_CURVE_LENGTH;

/// Largest public key or shared secret fetched from or imported into a key
/// store.
pub(crate) const MAX_PUBLIC_KEY_SIZE: usize = 1 + 2 * MAX_CURVE_LENGTH;

/// Offset of the x-coordinate in an uncompressed point.
const OCTET_STRING_OFFSET: usize = 1;

/// Uncompressed point marker.
const UNCOMPRESSED: u8 = 0x04;

/// Turns [`KeyMaterial`] into byte views and writes results back.
///
/// Key store material is exported into private buffers, one per key role, so
/// that a private key, a pre-shared secret and a public key can be held at
/// the same time.
pub(crate) struct Resolver {
    private_key: [u8; MAX_PRIVATE_KEY_SIZE],
    pre_shared_secret: [u8; MAX_PRIVATE_KEY_SIZE],
    public_key: [u8; MAX_PUBLIC_KEY_SIZE],
    output: [u8; MAX_PUBLIC_KEY_SIZE],
}

impl Resolver {
    pub(crate) const fn new() -> Self {
        Self {
            private_key: [0; MAX_PRIVATE_KEY_SIZE],
            pre_shared_secret: [0; MAX_PRIVATE_KEY_SIZE],
            public_key: [0; MAX_PUBLIC_KEY_SIZE],
            output: [0; MAX_PUBLIC_KEY_SIZE],
        }
    }

    pub(crate) fn private_key<'a, K: KeyStore + ?Sized>(
        &'a mut self,
        key: &'a KeyMaterial,
        key_store: &mut K,
    ) -> Result<&'a [u8]> {
        fetch(&mut self.private_key, key, key_store)
    }

    pub(crate) fn pre_shared_secret<'a, K: KeyStore + ?Sized>(
        &'a mut self,
        key: &'a KeyMaterial,
        key_store: &mut K,
    ) -> Result<&'a [u8]> {
        fetch(&mut self.pre_shared_secret, key, key_store)
    }

    pub(crate) fn public_key<'a, K: KeyStore + ?Sized>(
        &'a mut self,
        key: &'a KeyMaterial,
        key_store: &mut K,
    ) -> Result<&'a [u8]> {
        fetch(&mut self.public_key, key, key_store)
    }

    /// Encode the little-endian point `(x, y)` as `0x04 || X || Y` into the
    /// blank slot `out`.
    pub(crate) fn write_point<K: KeyStore + ?Sized>(
        &mut self,
        out: &mut KeyMaterial,
        x: &[u8],
        y: &[u8],
        key_store: &mut K,
    ) -> Result<()> {
        let length = x.len();
        let encoded = self
            .output
            .get_mut(..OCTET_STRING_OFFSET + 2 * length)
            .ok_or(Error::Failed)?;
        encoded[0] = UNCOMPRESSED;
        let (big_x, big_y) = encoded[OCTET_STRING_OFFSET..].split_at_mut(length);
        if !reverse_copy_pad(x, big_x) || !reverse_copy_pad(y, big_y) {
            return Err(Error::Failed);
        }
        store(out, encoded, key_store)
    }

    /// Encode the little-endian scalar `k` big-endian into the blank slot
    /// `out`.
    pub(crate) fn write_scalar<K: KeyStore + ?Sized>(
        &mut self,
        out: &mut KeyMaterial,
        k: &[u8],
        key_store: &mut K,
    ) -> Result<()> {
        let encoded = self.output.get_mut(..k.len()).ok_or(Error::Failed)?;
        if !reverse_copy_pad(k, encoded) {
            return Err(Error::Failed);
        }
        store(out, encoded, key_store)
    }
}

impl Zeroize for Resolver {
    fn zeroize(&mut self) {
        self.private_key.zeroize();
        self.pre_shared_secret.zeroize();
        self.public_key.zeroize();
        self.output.zeroize();
    }
}

impl Drop for Resolver {
    fn drop(&mut self) {
        self.zeroize();
    }
}

fn fetch<'a, K: KeyStore + ?Sized>(
    buffer: &'a mut [u8],
    key: &'a KeyMaterial,
    key_store: &mut K,
) -> Result<&'a [u8]> {
    match key {
        KeyMaterial::Plaintext(bytes) => Ok(bytes.as_slice()),
        KeyMaterial::KeyStore { id, length, .. } => {
            buffer.zeroize();
            let exported = key_store
                .get_key(*id, buffer, Algorithm::Pake, Usage::DERIVE)
                .map_err(|_| Error::KeyStore)?;
            if exported != *length {
                return Err(Error::KeyStore);
            }
            buffer.get(..exported).ok_or(Error::KeyStore)
        }
        KeyMaterial::BlankPlaintext { .. } | KeyMaterial::BlankKeyStore { .. } => {
            Err(Error::Failed)
        }
    }
}

fn store<K: KeyStore + ?Sized>(
    out: &mut KeyMaterial,
    bytes: &[u8],
    key_store: &mut K,
) -> Result<()> {
    match *out {
        KeyMaterial::BlankPlaintext { length } if length == bytes.len() => {
            *out = KeyMaterial::Plaintext(Zeroizing::new(Vec::from(bytes)));
            Ok(())
        }
        KeyMaterial::BlankKeyStore { length, attributes } if length == bytes.len() => {
            let id = key_store
                .import_key(&attributes, bytes)
                .map_err(|_| Error::KeyStore)?;
            *out = KeyMaterial::KeyStore {
                id,
                length,
                attributes,
            };
            Ok(())
        }
        _ => Err(Error::Failed),
    }
}

#[cfg(test)]
mod tests {
    use super::Resolver;
    use crate::{
        Error, NIST_P256,
        key::{KeyAttributes, KeyId, KeyMaterial, NoKeyStore, Usage},
        scratch::reverse_copy_pad,
    };
    use hex_literal::hex;

    const PUBLIC_KEY: [u8; 65] = hex!(
        "04"
        "6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296"
        "4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5"
    );

    #[test]
    fn public_key_round_trip() {
        let mut resolver = Resolver::new();
        let key = KeyMaterial::plaintext(PUBLIC_KEY);
        let len = NIST_P256.length;

        let mut x = [0u8; 32];
        let mut y = [0u8; 32];
        let bytes = resolver.public_key(&key, &mut NoKeyStore).unwrap();
        assert!(reverse_copy_pad(&bytes[1..1 + len], &mut x));
        assert!(reverse_copy_pad(&bytes[1 + len..], &mut y));
        assert_eq!(x, NIST_P256.generator_x);
        assert_eq!(y, NIST_P256.generator_y);

        let mut out = KeyMaterial::blank_plaintext(65);
        resolver
            .write_point(&mut out, &x, &y, &mut NoKeyStore)
            .unwrap();
        assert_eq!(out.as_bytes(), Some(&PUBLIC_KEY[..]));
    }

    #[test]
    fn scalar_is_written_big_endian() {
        let mut resolver = Resolver::new();
        let mut out = KeyMaterial::blank_plaintext(4);
        resolver
            .write_scalar(&mut out, &[1, 2, 3, 4], &mut NoKeyStore)
            .unwrap();
        assert_eq!(out.as_bytes(), Some(&[4u8, 3, 2, 1][..]));
    }

    #[test]
    fn blank_slots_cannot_be_read() {
        let mut resolver = Resolver::new();
        let key = KeyMaterial::blank_plaintext(32);
        assert_eq!(
            resolver.private_key(&key, &mut NoKeyStore),
            Err(Error::Failed)
        );
    }

    #[test]
    fn key_store_failure_is_reported() {
        let mut resolver = Resolver::new();
        let key = KeyMaterial::key_store(KeyId(1), 32, KeyAttributes::pake(Usage::DERIVE));
        assert_eq!(
            resolver.private_key(&key, &mut NoKeyStore),
            Err(Error::KeyStore)
        );

        let mut out = KeyMaterial::blank_key_store(4, KeyAttributes::pake(Usage::DERIVE));
        assert_eq!(
            resolver.write_scalar(&mut out, &[1, 2, 3, 4], &mut NoKeyStore),
            Err(Error::KeyStore)
        );
        assert!(out.is_blank());
    }

    #[test]
    fn output_length_must_match() {
        let mut resolver = Resolver::new();
        let mut out = KeyMaterial::blank_plaintext(64);
        assert_eq!(
            resolver.write_point(&mut out, &[1; 32], &[2; 32], &mut NoKeyStore),
            Err(Error::Failed)
        );

        let mut populated = KeyMaterial::plaintext([0u8; 4]);
        assert_eq!(
            resolver.write_scalar(&mut populated, &[1, 2, 3, 4], &mut NoKeyStore),
            Err(Error::Failed)
        );
    }
}
