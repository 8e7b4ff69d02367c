//! Software accelerator and in-memory key store for hosted use.

mod key_store;
mod pka;

pub use self::{key_store::MemoryKeyStore, pka::SoftPka};
