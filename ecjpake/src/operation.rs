//! Operation records handed to the engine.

use crate::{CurveParams, Error, KeyMaterial};
use alloc::vec::Vec;

/// Kind of an [`Operation`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperationKind {
    /// [`RoundOneGenerateKeys`]
    RoundOneGenerateKeys,
    /// [`GenerateZkp`]
    GenerateZkp,
    /// [`VerifyZkp`]
    VerifyZkp,
    /// [`RoundTwoGenerateKeys`]
    RoundTwoGenerateKeys,
    /// [`ComputeSharedSecret`]
    ComputeSharedSecret,
}

/// Round one: derive `X = x·G` for both private keys and both Schnorr
/// commitments.
#[derive(Debug)]
pub struct RoundOneGenerateKeys {
    /// Curve to operate on.
    pub curve: &'static CurveParams,
    /// First private key `x1`.
    pub my_private_key1: KeyMaterial,
    /// Second private key `x2`.
    pub my_private_key2: KeyMaterial,
    /// Commitment scalar for the proof over `x1`.
    pub my_private_v1: KeyMaterial,
    /// Commitment scalar for the proof over `x2`.
    pub my_private_v2: KeyMaterial,
    /// Output: `x1·G`.
    pub my_public_key1: KeyMaterial,
    /// Output: `x2·G`.
    pub my_public_key2: KeyMaterial,
    /// Output: `v1·G`.
    pub my_public_v1: KeyMaterial,
    /// Output: `v2·G`.
    pub my_public_v2: KeyMaterial,
}

impl RoundOneGenerateKeys {
    /// Round one over plaintext outputs.
    pub fn new(
        curve: &'static CurveParams,
        my_private_key1: KeyMaterial,
        my_private_key2: KeyMaterial,
        my_private_v1: KeyMaterial,
        my_private_v2: KeyMaterial,
    ) -> Self {
        let public = || KeyMaterial::blank_plaintext(curve.public_key_length());
        Self {
            curve,
            my_private_key1,
            my_private_key2,
            my_private_v1,
            my_private_v2,
            my_public_key1: public(),
            my_public_key2: public(),
            my_public_v1: public(),
            my_public_v2: public(),
        }
    }
}

/// Schnorr proof of knowledge of `x`: `r = v - x·h mod n`.
#[derive(Debug)]
pub struct GenerateZkp {
    /// Curve to operate on.
    pub curve: &'static CurveParams,
    /// Private key `x` being proven.
    pub my_private_key: KeyMaterial,
    /// Commitment scalar `v`.
    pub my_private_v: KeyMaterial,
    /// Big-endian challenge hash `h`.
    pub hash: Vec<u8>,
    /// Output: big-endian response `r`, `curve.length` bytes.
    pub r: Vec<u8>,
}

impl GenerateZkp {
    /// Proof generation request.
    pub fn new(
        curve: &'static CurveParams,
        my_private_key: KeyMaterial,
        my_private_v: KeyMaterial,
        hash: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            curve,
            my_private_key,
            my_private_v,
            hash: hash.into(),
            r: Vec::new(),
        }
    }
}

/// Check a peer's Schnorr proof: `V == r·G + h·X`.
#[derive(Debug)]
pub struct VerifyZkp {
    /// Curve to operate on.
    pub curve: &'static CurveParams,
    /// Peer public key `X`.
    pub their_public_key: KeyMaterial,
    /// Peer commitment `V`.
    pub their_public_v: KeyMaterial,
    /// Generator the proof was made over, if not the curve base point.
    pub their_generator: Option<KeyMaterial>,
    /// Big-endian challenge hash `h`.
    pub hash: Vec<u8>,
    /// Big-endian response `r`.
    pub r: Vec<u8>,
}

impl VerifyZkp {
    /// Proof verification request over the curve base point.
    pub fn new(
        curve: &'static CurveParams,
        their_public_key: KeyMaterial,
        their_public_v: KeyMaterial,
        hash: impl Into<Vec<u8>>,
        r: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            curve,
            their_public_key,
            their_public_v,
            their_generator: None,
            hash: hash.into(),
            r: r.into(),
        }
    }

    /// Verify over an explicit generator, as for round two proofs.
    pub fn with_generator(mut self, generator: KeyMaterial) -> Self {
        self.their_generator = Some(generator);
        self
    }
}

/// Round two: combine `x2` with the pre-shared secret and derive the new
/// generators.
#[derive(Debug)]
pub struct RoundTwoGenerateKeys {
    /// Curve to operate on.
    pub curve: &'static CurveParams,
    /// Second private key `x2`.
    pub my_private_key2: KeyMaterial,
    /// Commitment scalar for the round two proof.
    pub my_private_v: KeyMaterial,
    /// Big-endian pre-shared secret `s`.
    pub pre_shared_secret: KeyMaterial,
    /// Local `x1·G`.
    pub my_public_key1: KeyMaterial,
    /// Local `x2·G`.
    pub my_public_key2: KeyMaterial,
    /// Peer `x3·G`.
    pub their_public_key1: KeyMaterial,
    /// Peer `x4·G`.
    pub their_public_key2: KeyMaterial,
    /// Output: `x2·s mod n`.
    pub my_combined_private_key: KeyMaterial,
    /// Output: `(x2·s)·G_A`.
    pub my_combined_public_key: KeyMaterial,
    /// Output: `G_A = myPublicKey1 + theirPublicKey1 + theirPublicKey2`.
    pub my_new_generator: KeyMaterial,
    /// Output: `G_B = myPublicKey1 + theirPublicKey1 + myPublicKey2`.
    pub their_new_generator: KeyMaterial,
    /// Output: `v·G_A`.
    pub my_public_v: KeyMaterial,
}

impl RoundTwoGenerateKeys {
    /// Round two over plaintext outputs.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        curve: &'static CurveParams,
        my_private_key2: KeyMaterial,
        my_private_v: KeyMaterial,
        pre_shared_secret: KeyMaterial,
        my_public_key1: KeyMaterial,
        my_public_key2: KeyMaterial,
        their_public_key1: KeyMaterial,
        their_public_key2: KeyMaterial,
    ) -> Self {
        let public = || KeyMaterial::blank_plaintext(curve.public_key_length());
        Self {
            curve,
            my_private_key2,
            my_private_v,
            pre_shared_secret,
            my_public_key1,
            my_public_key2,
            their_public_key1,
            their_public_key2,
            my_combined_private_key: KeyMaterial::blank_plaintext(curve.private_key_length()),
            my_combined_public_key: public(),
            my_new_generator: public(),
            their_new_generator: public(),
            my_public_v: public(),
        }
    }
}

/// Final key: `(theirCombinedPublicKey - theirPublicKey2·(x2·s))·x2`.
#[derive(Debug)]
pub struct ComputeSharedSecret {
    /// Curve to operate on.
    pub curve: &'static CurveParams,
    /// Local `x2·s mod n`.
    pub my_combined_private_key: KeyMaterial,
    /// Local `x2`.
    pub my_private_key2: KeyMaterial,
    /// Peer `x4·G`.
    pub their_public_key2: KeyMaterial,
    /// Peer combined public key.
    pub their_combined_public_key: KeyMaterial,
    /// Output: shared point `0x04 || X || Y`.
    pub shared_secret: KeyMaterial,
}

impl ComputeSharedSecret {
    /// Shared secret computation over a plaintext output.
    pub fn new(
        curve: &'static CurveParams,
        my_combined_private_key: KeyMaterial,
        my_private_key2: KeyMaterial,
        their_public_key2: KeyMaterial,
        their_combined_public_key: KeyMaterial,
    ) -> Self {
        Self {
            curve,
            my_combined_private_key,
            my_private_key2,
            their_public_key2,
            their_combined_public_key,
            shared_secret: KeyMaterial::blank_plaintext(curve.public_key_length()),
        }
    }
}

/// Any operation the engine can run.
#[derive(Debug)]
pub enum Operation {
    /// Round one key generation.
    RoundOneGenerateKeys(RoundOneGenerateKeys),
    /// Proof generation.
    GenerateZkp(GenerateZkp),
    /// Proof verification.
    VerifyZkp(VerifyZkp),
    /// Round two key generation.
    RoundTwoGenerateKeys(RoundTwoGenerateKeys),
    /// Shared secret computation.
    ComputeSharedSecret(ComputeSharedSecret),
}

impl Operation {
    /// Kind of this operation.
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::RoundOneGenerateKeys(_) => OperationKind::RoundOneGenerateKeys,
            Operation::GenerateZkp(_) => OperationKind::GenerateZkp,
            Operation::VerifyZkp(_) => OperationKind::VerifyZkp,
            Operation::RoundTwoGenerateKeys(_) => OperationKind::RoundTwoGenerateKeys,
            Operation::ComputeSharedSecret(_) => OperationKind::ComputeSharedSecret,
        }
    }

    /// Curve this operation runs on.
    pub fn curve(&self) -> &'static CurveParams {
        match self {
            Operation::RoundOneGenerateKeys(op) => op.curve,
            Operation::GenerateZkp(op) => op.curve,
            Operation::VerifyZkp(op) => op.curve,
            Operation::RoundTwoGenerateKeys(op) => op.curve,
            Operation::ComputeSharedSecret(op) => op.curve,
        }
    }

    /// Are all output key slots still blank?
    pub(crate) fn outputs_blank(&self) -> bool {
        match self {
            Operation::RoundOneGenerateKeys(op) => [
                &op.my_public_key1,
                &op.my_public_key2,
                &op.my_public_v1,
                &op.my_public_v2,
            ]
            .iter()
            .all(|key| key.is_blank()),
            Operation::GenerateZkp(_) | Operation::VerifyZkp(_) => true,
            Operation::RoundTwoGenerateKeys(op) => [
                &op.their_new_generator,
                &op.my_new_generator,
                &op.my_combined_private_key,
                &op.my_combined_public_key,
                &op.my_public_v,
            ]
            .iter()
            .all(|key| key.is_blank()),
            Operation::ComputeSharedSecret(op) => op.shared_secret.is_blank(),
        }
    }
}

macro_rules! impl_operation_conversions {
    ($($variant:ident),+) => {
        $(
            impl From<$variant> for Operation {
                fn from(op: $variant) -> Operation {
                    Operation::$variant(op)
                }
            }

            impl TryFrom<Operation> for $variant {
                type Error = Error;

                fn try_from(op: Operation) -> Result<$variant, Error> {
                    match op {
                        Operation::$variant(op) => Ok(op),
                        _ => Err(Error::Failed),
                    }
                }
            }
        )+
    };
}

impl_operation_conversions!(
    RoundOneGenerateKeys,
    GenerateZkp,
    VerifyZkp,
    RoundTwoGenerateKeys,
    ComputeSharedSecret
);
