//! Round two: combined keys and the new generators.
//!
//! `myPublicKey1 + theirPublicKey1` is kept in [`Lane::Buffer0`] while both
//! generators are derived from it. Peers must agree on the addition order
//! byte for byte.

use super::{Context, Transition};
use crate::{
    Error, KeyStore, Pka, Result,
    operation::RoundTwoGenerateKeys,
    scratch::{BUFFER_LANE, KEY_LANE, Lane, reverse_copy_pad},
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Step {
    MultiplyKeyBySecret,
    CollectProduct,
    ReduceCombinedKey,
    CollectCombinedKey,
    AddFirstPublicKeys,
    CollectFirstSum,
    AddTheirPublicKey2,
    CollectMyGenerator,
    AddMyPublicKey2,
    CollectTheirGenerator,
    MultiplyCombinedKey,
    CollectCombinedPublicKey,
    GeneratePublicV,
    CollectPublicV,
    Return,
}

impl Step {
    pub(crate) const FIRST: Self = Step::MultiplyKeyBySecret;

    pub(crate) fn next(self) -> Self {
        use Step::*;
        match self {
            MultiplyKeyBySecret => CollectProduct,
            CollectProduct => ReduceCombinedKey,
            ReduceCombinedKey => CollectCombinedKey,
            CollectCombinedKey => AddFirstPublicKeys,
            AddFirstPublicKeys => CollectFirstSum,
            CollectFirstSum => AddTheirPublicKey2,
            AddTheirPublicKey2 => CollectMyGenerator,
            CollectMyGenerator => AddMyPublicKey2,
            AddMyPublicKey2 => CollectTheirGenerator,
            CollectTheirGenerator => MultiplyCombinedKey,
            MultiplyCombinedKey => CollectCombinedPublicKey,
            CollectCombinedPublicKey => GeneratePublicV,
            GeneratePublicV => CollectPublicV,
            CollectPublicV | Return => Return,
        }
    }
}

pub(crate) fn run<P, K>(
    step: Step,
    op: &mut RoundTwoGenerateKeys,
    ctx: &mut Context<'_, P, K>,
) -> Result<Transition>
where
    P: Pka + ?Sized,
    K: KeyStore + ?Sized,
{
    let curve = op.curve;
    let len = curve.length;

    match step {
        Step::MultiplyKeyBySecret => {
            ctx.load_private_key(&op.my_private_key2, curve)?;
            let secret = ctx
                .resolver
                .pre_shared_secret(&op.pre_shared_secret, ctx.key_store)?;
            // secret bounded so that x2·s fits Buffer0
            let lane = &mut ctx.scratch.lane_mut(Lane::Buffer0)[..BUFFER_LANE - KEY_LANE];
            if secret.is_empty() || !reverse_copy_pad(secret, lane) {
                return Err(Error::Failed);
            }
            let secret_len = secret.len();
            ctx.pka.multiply_start(
                &ctx.scratch.lane(Lane::PrivateKey)[..len],
                &ctx.scratch.lane(Lane::Buffer0)[..secret_len],
            );
            Ok(Transition::Suspend)
        }
        Step::CollectProduct => ctx.collect_buffer0().map(|()| Transition::Continue),
        Step::ReduceCombinedKey => {
            ctx.reduce_buffer0(curve);
            Ok(Transition::Suspend)
        }
        Step::CollectCombinedKey => {
            let combined = &mut ctx.scratch.lane_mut(Lane::Buffer2)[..len];
            ctx.pka.modulus_result(combined).classify()?;
            ctx.resolver.write_scalar(
                &mut op.my_combined_private_key,
                &ctx.scratch.lane(Lane::Buffer2)[..len],
                ctx.key_store,
            )?;
            Ok(Transition::Continue)
        }
        Step::AddFirstPublicKeys => {
            ctx.load_public_key(&op.my_public_key1, curve)?;
            ctx.load_point(&op.their_public_key1, curve, Lane::Buffer0)?;
            let (ax, ay) = ctx.scratch.public(len);
            let (bx, by) = ctx.scratch.point(Lane::Buffer0, len);
            ctx.pka.point_add_start(ax, ay, bx, by, curve);
            Ok(Transition::Suspend)
        }
        Step::CollectFirstSum => ctx
            .collect_point(Lane::Buffer0, curve)
            .map(|()| Transition::Continue),
        Step::AddTheirPublicKey2 | Step::AddMyPublicKey2 => {
            let addend = match step {
                Step::AddTheirPublicKey2 => &op.their_public_key2,
                _ => &op.my_public_key2,
            };
            ctx.load_public_key(addend, curve)?;
            let (ax, ay) = ctx.scratch.point(Lane::Buffer0, len);
            let (bx, by) = ctx.scratch.public(len);
            ctx.pka.point_add_start(ax, ay, bx, by, curve);
            Ok(Transition::Suspend)
        }
        Step::CollectMyGenerator => {
            ctx.write_point(&mut op.my_new_generator, curve)?;
            Ok(Transition::Continue)
        }
        Step::CollectTheirGenerator => {
            ctx.write_point(&mut op.their_new_generator, curve)?;
            Ok(Transition::Continue)
        }
        Step::MultiplyCombinedKey => {
            ctx.load_private_key(&op.my_combined_private_key, curve)?;
            ctx.load_public_key(&op.my_new_generator, curve)?;
            ctx.multiply_public(curve);
            Ok(Transition::Suspend)
        }
        Step::CollectCombinedPublicKey => {
            ctx.write_point(&mut op.my_combined_public_key, curve)?;
            Ok(Transition::Continue)
        }
        Step::GeneratePublicV => {
            ctx.load_checked_private_key(&op.my_private_v, curve)?;
            ctx.load_public_key(&op.my_new_generator, curve)?;
            ctx.multiply_public(curve);
            Ok(Transition::Suspend)
        }
        Step::CollectPublicV => {
            ctx.write_point(&mut op.my_public_v, curve)?;
            Ok(Transition::Continue)
        }
        Step::Return => Ok(Transition::Done),
    }
}
