#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc = include_str!("../README.md")]
#![doc(
    html_logo_url = "https://raw.githubusercontent.com/RustCrypto/meta/master/logo.svg",
    html_favicon_url = "https://raw.githubusercontent.com/RustCrypto/meta/master/logo.svg"
)]
#![forbid(unsafe_code)]
#![warn(
    clippy::mod_module_files,
    clippy::unwrap_used,
    missing_docs,
    rust_2018_idioms,
    unused_lifetimes,
    unused_qualifications
)]

//! ## Usage
//!
//! Build an [`Ecjpake`] instance over an accelerator implementing [`Pka`],
//! then submit the operations of the handshake in order:
//!
//! 1. [`Ecjpake::round_one_generate_keys`]
//! 2. [`Ecjpake::generate_zkp`] for each round one key, and
//!    [`Ecjpake::verify_zkp`] for each of the peer's
//! 3. [`Ecjpake::round_two_generate_keys`], followed by proofs over the new
//!    generators
//! 4. [`Ecjpake::compute_shared_secret`]
//!
//! The caller is responsible for nonce generation, hashing and transport.
//!
//! ## Feature flags
//!
//! - `soft-pka` (default): [`SoftPka`] and [`MemoryKeyStore`]
//! - `std` (default): `std` support in dependencies
//! - `defmt`: `defmt::Format` impls for public enums

extern crate alloc;

mod curve;
mod engine;
mod error;
mod fsm;
mod key;
mod operation;
mod pka;
mod resolver;
mod scratch;
mod status;
mod sync;

#[cfg(feature = "soft-pka")]
mod soft;

pub use crate::{
    curve::{BRAINPOOL_P256R1, CurveParams, MAX_CURVE_LENGTH, NIST_P224, NIST_P256},
    engine::{Completion, Engine},
    error::{Error, Result},
    key::{Algorithm, KeyAttributes, KeyId, KeyMaterial, KeyStore, Lifetime, NoKeyStore, Usage},
    operation::{
        ComputeSharedSecret, GenerateZkp, Operation, OperationKind, RoundOneGenerateKeys,
        RoundTwoGenerateKeys, VerifyZkp,
    },
    pka::Pka,
    status::PkaStatus,
    sync::{Callback, Ecjpake, Params, ReturnBehavior},
};

#[cfg(feature = "soft-pka")]
pub use crate::soft::{MemoryKeyStore, SoftPka};
