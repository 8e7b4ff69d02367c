//! Schnorr zero-knowledge proofs.
//!
//! Generation computes `r = v - x·h mod n` as `((v + n) - (x·h mod n)) mod n`
//! so the subtraction never goes negative. Verification recomputes
//! `r·G + (h mod n)·X` and compares it with the claimed `V`.

use super::{Context, Transition};
use crate::{
    Error, KeyStore, Pka, Result,
    operation::{GenerateZkp, VerifyZkp},
    scratch::{KEY_LANE, Lane, reverse_copy_pad},
};
use alloc::vec;
use subtle::ConstantTimeEq;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum GenerateStep {
    MultiplyKeyByHash,
    CollectProduct,
    ReduceProduct,
    CollectReducedProduct,
    AddOrderToV,
    CollectSum,
    Subtract,
    CollectDifference,
    ReduceDifference,
    CollectResponse,
    Return,
}

impl GenerateStep {
    pub(crate) const FIRST: Self = GenerateStep::MultiplyKeyByHash;

    pub(crate) fn next(self) -> Self {
        use GenerateStep::*;
        match self {
            MultiplyKeyByHash => CollectProduct,
            CollectProduct => ReduceProduct,
            ReduceProduct => CollectReducedProduct,
            CollectReducedProduct => AddOrderToV,
            AddOrderToV => CollectSum,
            CollectSum => Subtract,
            Subtract => CollectDifference,
            CollectDifference => ReduceDifference,
            ReduceDifference => CollectResponse,
            CollectResponse | Return => Return,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum VerifyStep {
    ValidatePublicKey,
    MultiplyGeneratorByR,
    CollectRG,
    ReduceHash,
    CollectReducedHash,
    MultiplyKeyByHash,
    CollectHX,
    AddPoints,
    CollectSum,
    CompareAgainstV,
}

impl VerifyStep {
    pub(crate) const FIRST: Self = VerifyStep::ValidatePublicKey;

    pub(crate) fn next(self) -> Self {
        use VerifyStep::*;
        match self {
            ValidatePublicKey => MultiplyGeneratorByR,
            MultiplyGeneratorByR => CollectRG,
            CollectRG => ReduceHash,
            ReduceHash => CollectReducedHash,
            CollectReducedHash => MultiplyKeyByHash,
            MultiplyKeyByHash => CollectHX,
            CollectHX => AddPoints,
            AddPoints => CollectSum,
            CollectSum | CompareAgainstV => CompareAgainstV,
        }
    }
}

/// Copy a big-endian hash into `lane`, returning its length.
fn load_hash(hash: &[u8], lane: &mut [u8]) -> Result<usize> {
    if reverse_copy_pad(hash, lane) {
        Ok(hash.len())
    } else {
        Err(Error::Failed)
    }
}

pub(crate) fn generate<P, K>(
    step: GenerateStep,
    op: &mut GenerateZkp,
    ctx: &mut Context<'_, P, K>,
) -> Result<Transition>
where
    P: Pka + ?Sized,
    K: KeyStore + ?Sized,
{
    let curve = op.curve;
    let len = curve.length;

    match step {
        GenerateStep::MultiplyKeyByHash => {
            ctx.load_private_key(&op.my_private_key, curve)?;
            // hash bounded by a key lane so the product fits Buffer0
            let hash_len =
                load_hash(&op.hash, &mut ctx.scratch.lane_mut(Lane::Buffer0)[..KEY_LANE])?;
            ctx.pka.multiply_start(
                &ctx.scratch.lane(Lane::PrivateKey)[..len],
                &ctx.scratch.lane(Lane::Buffer0)[..hash_len.max(1)],
            );
            Ok(Transition::Suspend)
        }
        GenerateStep::CollectProduct => ctx.collect_buffer0().map(|()| Transition::Continue),
        GenerateStep::ReduceProduct | GenerateStep::ReduceDifference => {
            ctx.reduce_buffer0(curve);
            Ok(Transition::Suspend)
        }
        GenerateStep::CollectReducedProduct => {
            let status = ctx
                .pka
                .modulus_result(&mut ctx.scratch.lane_mut(Lane::Buffer2)[..len]);
            status.classify().map(|()| Transition::Continue)
        }
        GenerateStep::AddOrderToV => {
            ctx.load_private_key(&op.my_private_v, curve)?;
            ctx.pka
                .add_start(&ctx.scratch.lane(Lane::PrivateKey)[..len], curve.order);
            Ok(Transition::Suspend)
        }
        GenerateStep::CollectSum | GenerateStep::CollectDifference => {
            ctx.collect_buffer0().map(|()| Transition::Continue)
        }
        GenerateStep::Subtract => {
            let minuend_len = ctx.scratch.buffer0_len;
            ctx.pka.subtract_start(
                &ctx.scratch.lane(Lane::Buffer0)[..minuend_len],
                &ctx.scratch.lane(Lane::Buffer2)[..len],
            );
            Ok(Transition::Suspend)
        }
        GenerateStep::CollectResponse => {
            let mut r = vec![0u8; len];
            ctx.pka.modulus_result(&mut r).classify()?;
            r.reverse();
            op.r = r;
            Ok(Transition::Continue)
        }
        GenerateStep::Return => Ok(Transition::Done),
    }
}

pub(crate) fn verify<P, K>(
    step: VerifyStep,
    op: &mut VerifyZkp,
    ctx: &mut Context<'_, P, K>,
) -> Result<Transition>
where
    P: Pka + ?Sized,
    K: KeyStore + ?Sized,
{
    let curve = op.curve;
    let len = curve.length;

    match step {
        VerifyStep::ValidatePublicKey => {
            ctx.load_public_key(&op.their_public_key, curve)?;
            let (x, y) = ctx.scratch.public(len);
            ctx.pka
                .validate_public_key(x, y, curve)
                .classify()
                .map(|()| Transition::Continue)
        }
        VerifyStep::MultiplyGeneratorByR => {
            if !reverse_copy_pad(&op.r, &mut ctx.scratch.lane_mut(Lane::PrivateKey)[..len]) {
                return Err(Error::Failed);
            }
            match &op.their_generator {
                Some(generator) => {
                    ctx.load_public_key(generator, curve)?;
                    ctx.multiply_public(curve);
                }
                None => ctx.multiply_generator(curve),
            }
            Ok(Transition::Suspend)
        }
        VerifyStep::CollectRG => ctx
            .collect_point(Lane::Buffer0, curve)
            .map(|()| Transition::Continue),
        VerifyStep::ReduceHash => {
            let hash_len = load_hash(&op.hash, ctx.scratch.lane_mut(Lane::PrivateKey))?;
            ctx.pka.modulus_start(
                &ctx.scratch.lane(Lane::PrivateKey)[..hash_len.max(len)],
                curve.order,
            );
            Ok(Transition::Suspend)
        }
        VerifyStep::CollectReducedHash => ctx
            .pka
            .modulus_result(&mut ctx.scratch.lane_mut(Lane::Buffer2)[..len])
            .classify()
            .map(|()| Transition::Continue),
        VerifyStep::MultiplyKeyByHash => {
            ctx.load_public_key(&op.their_public_key, curve)?;
            let (x, y) = ctx.scratch.public(len);
            ctx.pka
                .scalar_multiply_start(&ctx.scratch.lane(Lane::Buffer2)[..len], x, y, curve);
            Ok(Transition::Suspend)
        }
        VerifyStep::CollectHX => ctx
            .collect_point(Lane::Buffer2, curve)
            .map(|()| Transition::Continue),
        VerifyStep::AddPoints => {
            let (ax, ay) = ctx.scratch.point(Lane::Buffer0, len);
            let (bx, by) = ctx.scratch.point(Lane::Buffer2, len);
            ctx.pka.point_add_start(ax, ay, bx, by, curve);
            Ok(Transition::Suspend)
        }
        VerifyStep::CollectSum => ctx
            .collect_point(Lane::Buffer0, curve)
            .map(|()| Transition::Continue),
        VerifyStep::CompareAgainstV => {
            ctx.load_point(&op.their_public_v, curve, Lane::Buffer2)?;
            let expected = &ctx.scratch.lane(Lane::Buffer2)[..2 * len];
            let computed = &ctx.scratch.lane(Lane::Buffer0)[..2 * len];
            if bool::from(expected.ct_eq(computed)) {
                Ok(Transition::Done)
            } else {
                Err(Error::Failed)
            }
        }
    }
}
