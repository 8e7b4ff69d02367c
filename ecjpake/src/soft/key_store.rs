//! Key store kept in memory.

use crate::{Algorithm, Error, KeyAttributes, KeyId, KeyStore, Lifetime, Result, Usage};
use alloc::{collections::BTreeMap, vec::Vec};
use tracing::debug;
use zeroize::Zeroizing;

/// First identifier handed out to volatile keys. Persistent identifiers
/// must be chosen below it.
const VOLATILE_MIN: u32 = 0x7fff_0000;

struct Entry {
    attributes: KeyAttributes,
    material: Zeroizing<Vec<u8>>,
}

/// Key store with policy checks, holding its keys in memory.
///
/// Volatile keys get identifiers from a reserved upper range; persistent
/// keys are stored under the identifier requested in their attributes and
/// survive [`MemoryKeyStore::reset`].
#[derive(Default)]
pub struct MemoryKeyStore {
    keys: BTreeMap<KeyId, Entry>,
    next_volatile: u32,
}

impl MemoryKeyStore {
    /// Empty key store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys held.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Is the store empty?
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Is there a key under `id`?
    pub fn contains(&self, id: KeyId) -> bool {
        self.keys.contains_key(&id)
    }

    /// Attributes of the key under `id`.
    pub fn attributes(&self, id: KeyId) -> Option<&KeyAttributes> {
        self.keys.get(&id).map(|entry| &entry.attributes)
    }

    /// Destroy the key under `id`.
    pub fn destroy(&mut self, id: KeyId) -> Result<()> {
        self.keys.remove(&id).map(drop).ok_or(Error::KeyStore)
    }

    /// Drop all volatile keys, as a power cycle would.
    pub fn reset(&mut self) {
        self.keys
            .retain(|_, entry| entry.attributes.lifetime == Lifetime::Persistent);
        self.next_volatile = 0;
    }

    fn allocate_volatile(&mut self) -> Result<KeyId> {
        let offset = self.next_volatile;
        let id = VOLATILE_MIN.checked_add(offset).ok_or(Error::KeyStore)?;
        self.next_volatile = offset.checked_add(1).ok_or(Error::KeyStore)?;
        Ok(KeyId(id))
    }
}

impl KeyStore for MemoryKeyStore {
    fn get_key(
        &mut self,
        id: KeyId,
        out: &mut [u8],
        algorithm: Algorithm,
        usage: Usage,
    ) -> Result<usize> {
        let entry = self.keys.get(&id).ok_or(Error::KeyStore)?;
        if entry.attributes.algorithm != algorithm || !entry.attributes.usage.contains(usage) {
            debug!(?id, "key policy violation");
            return Err(Error::KeyStore);
        }

        let material = entry.material.as_slice();
        let dst = out.get_mut(..material.len()).ok_or(Error::KeyStore)?;
        dst.copy_from_slice(material);
        Ok(material.len())
    }

    fn import_key(&mut self, attributes: &KeyAttributes, material: &[u8]) -> Result<KeyId> {
        let id = match attributes.lifetime {
            Lifetime::Volatile => self.allocate_volatile()?,
            Lifetime::Persistent => match attributes.id {
                Some(id) if id.0 != 0 && id.0 < VOLATILE_MIN && !self.keys.contains_key(&id) => {
                    id
                }
                _ => return Err(Error::KeyStore),
            },
        };

        self.keys.insert(
            id,
            Entry {
                attributes: *attributes,
                material: Zeroizing::new(material.to_vec()),
            },
        );
        debug!(?id, lifetime = ?attributes.lifetime, "key imported");
        Ok(id)
    }
}

impl core::fmt::Debug for MemoryKeyStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemoryKeyStore")
            .field("keys", &self.keys.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
