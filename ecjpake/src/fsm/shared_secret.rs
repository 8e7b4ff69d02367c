//! Shared secret: `K = (B - X4·(x2·s))·x2`.
//!
//! The running point lives in [`Lane::Buffer2`]; the negation is done by
//! replacing its y-coordinate with `p - y`.

use super::{Context, Transition};
use crate::{KeyStore, Pka, Result, operation::ComputeSharedSecret, scratch::Lane};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Step {
    MultiplyTheirPublicKey2,
    CollectProduct,
    NegateY,
    CollectNegatedY,
    AddTheirCombinedPublicKey,
    CollectSum,
    MultiplyByPrivateKey2,
    CollectSharedSecret,
    Return,
}

impl Step {
    pub(crate) const FIRST: Self = Step::MultiplyTheirPublicKey2;

    pub(crate) fn next(self) -> Self {
        use Step::*;
        match self {
            MultiplyTheirPublicKey2 => CollectProduct,
            CollectProduct => NegateY,
            NegateY => CollectNegatedY,
            CollectNegatedY => AddTheirCombinedPublicKey,
            AddTheirCombinedPublicKey => CollectSum,
            CollectSum => MultiplyByPrivateKey2,
            MultiplyByPrivateKey2 => CollectSharedSecret,
            CollectSharedSecret | Return => Return,
        }
    }
}

pub(crate) fn run<P, K>(
    step: Step,
    op: &mut ComputeSharedSecret,
    ctx: &mut Context<'_, P, K>,
) -> Result<Transition>
where
    P: Pka + ?Sized,
    K: KeyStore + ?Sized,
{
    let curve = op.curve;
    let len = curve.length;

    match step {
        Step::MultiplyTheirPublicKey2 => {
            ctx.load_private_key(&op.my_combined_private_key, curve)?;
            ctx.load_public_key(&op.their_public_key2, curve)?;
            ctx.multiply_public(curve);
            Ok(Transition::Suspend)
        }
        Step::CollectProduct | Step::CollectSum => ctx
            .collect_point(Lane::Buffer2, curve)
            .map(|()| Transition::Continue),
        Step::NegateY => {
            let (_, y) = ctx.scratch.point(Lane::Buffer2, len);
            ctx.pka.subtract_start(curve.prime, y);
            Ok(Transition::Suspend)
        }
        Step::CollectNegatedY => {
            let (_, y) = ctx.scratch.point_mut(Lane::Buffer2, len);
            let (status, written) = ctx.pka.bignum_result(y);
            if let Some(padding) = y.get_mut(written..) {
                padding.fill(0);
            }
            status.classify().map(|()| Transition::Continue)
        }
        Step::AddTheirCombinedPublicKey => {
            ctx.load_public_key(&op.their_combined_public_key, curve)?;
            let (ax, ay) = ctx.scratch.point(Lane::Buffer2, len);
            let (bx, by) = ctx.scratch.public(len);
            ctx.pka.point_add_start(ax, ay, bx, by, curve);
            Ok(Transition::Suspend)
        }
        Step::MultiplyByPrivateKey2 => {
            ctx.load_private_key(&op.my_private_key2, curve)?;
            let (x, y) = ctx.scratch.point(Lane::Buffer2, len);
            ctx.pka.scalar_multiply_start(
                &ctx.scratch.lane(Lane::PrivateKey)[..len],
                x,
                y,
                curve,
            );
            Ok(Transition::Suspend)
        }
        Step::CollectSharedSecret => {
            ctx.write_point(&mut op.shared_secret, curve)?;
            Ok(Transition::Continue)
        }
        Step::Return => Ok(Transition::Done),
    }
}
