//! Resumable state machines, one per operation kind.
//!
//! Each step either consumes the previous accelerator result and prepares
//! the next input synchronously ([`Transition::Continue`]), starts an
//! accelerator operation ([`Transition::Suspend`]), or finishes. The step is
//! advanced after every call regardless of the outcome, so a suspended step
//! is always followed by the one collecting its result.

mod round_one;
mod round_two;
mod shared_secret;
mod zkp;

use crate::{
    CurveParams, Error, KeyMaterial, KeyStore, Operation, OperationKind, Pka, PkaStatus, Result,
    resolver::Resolver,
    scratch::{Lane, Scratch, reverse_copy_pad},
};

/// What the driver should do after a step.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Transition {
    /// Run the next step right away.
    Continue,
    /// An accelerator operation is running; wait for its interrupt.
    Suspend,
    /// The operation completed successfully.
    Done,
}

/// Position within an operation's state machine.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Step {
    RoundOne(round_one::Step),
    GenerateZkp(zkp::GenerateStep),
    VerifyZkp(zkp::VerifyStep),
    RoundTwo(round_two::Step),
    SharedSecret(shared_secret::Step),
}

impl Step {
    pub(crate) fn first(kind: OperationKind) -> Self {
        match kind {
            OperationKind::RoundOneGenerateKeys => Step::RoundOne(round_one::Step::FIRST),
            OperationKind::GenerateZkp => Step::GenerateZkp(zkp::GenerateStep::FIRST),
            OperationKind::VerifyZkp => Step::VerifyZkp(zkp::VerifyStep::FIRST),
            OperationKind::RoundTwoGenerateKeys => Step::RoundTwo(round_two::Step::FIRST),
            OperationKind::ComputeSharedSecret => Step::SharedSecret(shared_secret::Step::FIRST),
        }
    }

    #[must_use]
    pub(crate) fn next(self) -> Self {
        match self {
            Step::RoundOne(step) => Step::RoundOne(step.next()),
            Step::GenerateZkp(step) => Step::GenerateZkp(step.next()),
            Step::VerifyZkp(step) => Step::VerifyZkp(step.next()),
            Step::RoundTwo(step) => Step::RoundTwo(step.next()),
            Step::SharedSecret(step) => Step::SharedSecret(step.next()),
        }
    }
}

/// Run one step of `operation`.
pub(crate) fn run<P, K>(
    step: Step,
    operation: &mut Operation,
    ctx: &mut Context<'_, P, K>,
) -> Result<Transition>
where
    P: Pka + ?Sized,
    K: KeyStore + ?Sized,
{
    match (step, operation) {
        (Step::RoundOne(step), Operation::RoundOneGenerateKeys(op)) => round_one::run(step, op, ctx),
        (Step::GenerateZkp(step), Operation::GenerateZkp(op)) => zkp::generate(step, op, ctx),
        (Step::VerifyZkp(step), Operation::VerifyZkp(op)) => zkp::verify(step, op, ctx),
        (Step::RoundTwo(step), Operation::RoundTwoGenerateKeys(op)) => round_two::run(step, op, ctx),
        (Step::SharedSecret(step), Operation::ComputeSharedSecret(op)) => {
            shared_secret::run(step, op, ctx)
        }
        _ => Err(Error::Failed),
    }
}

/// Everything a step may touch besides its own operation record.
pub(crate) struct Context<'a, P: ?Sized, K: ?Sized> {
    pub(crate) pka: &'a mut P,
    pub(crate) key_store: &'a mut K,
    pub(crate) scratch: &'a mut Scratch,
    pub(crate) resolver: &'a mut Resolver,
}

impl<P, K> Context<'_, P, K>
where
    P: Pka + ?Sized,
    K: KeyStore + ?Sized,
{
    /// Copy a private scalar into [`Lane::PrivateKey`].
    fn load_private_key(&mut self, key: &KeyMaterial, curve: &CurveParams) -> Result<()> {
        let bytes = self.resolver.private_key(key, self.key_store)?;
        let lane = &mut self.scratch.lane_mut(Lane::PrivateKey)[..curve.length];
        if reverse_copy_pad(bytes, lane) {
            Ok(())
        } else {
            Err(Error::InvalidPrivateKey)
        }
    }

    /// Copy a private scalar into [`Lane::PrivateKey`], rejecting zero and
    /// anything not below the curve order.
    fn load_checked_private_key(&mut self, key: &KeyMaterial, curve: &CurveParams) -> Result<()> {
        let bytes = self.resolver.private_key(key, self.key_store)?;
        if self.pka.all_zeros(bytes) {
            return Err(Error::InvalidPrivateKey);
        }
        let lane = &mut self.scratch.lane_mut(Lane::PrivateKey)[..curve.length];
        if !reverse_copy_pad(bytes, lane) {
            return Err(Error::InvalidPrivateKey);
        }

        self.pka.compare_start(
            &self.scratch.lane(Lane::PrivateKey)[..curve.length],
            curve.order,
        );
        while self.pka.is_busy() {
            core::hint::spin_loop();
        }

        match self.pka.compare_result() {
            PkaStatus::ALessThanB => Ok(()),
            _ => Err(Error::InvalidPrivateKey),
        }
    }

    /// Copy a public key into [`Lane::PublicX`] and [`Lane::PublicY`].
    fn load_public_key(&mut self, key: &KeyMaterial, curve: &CurveParams) -> Result<()> {
        let bytes = self.resolver.public_key(key, self.key_store)?;
        let (x, y) = coordinates(bytes, curve.length)?;
        let (lane_x, lane_y) = self.scratch.public_mut(curve.length);
        reverse_copy_pad(x, lane_x);
        reverse_copy_pad(y, lane_y);
        Ok(())
    }

    /// Copy a public key as `X || Y` into a buffer lane.
    fn load_point(&mut self, key: &KeyMaterial, curve: &CurveParams, lane: Lane) -> Result<()> {
        let bytes = self.resolver.public_key(key, self.key_store)?;
        let (x, y) = coordinates(bytes, curve.length)?;
        let (lane_x, lane_y) = self.scratch.point_mut(lane, curve.length);
        reverse_copy_pad(x, lane_x);
        reverse_copy_pad(y, lane_y);
        Ok(())
    }

    /// Start `k·G` with `k` in [`Lane::PrivateKey`].
    fn multiply_generator(&mut self, curve: &CurveParams) {
        self.pka.scalar_multiply_start(
            &self.scratch.lane(Lane::PrivateKey)[..curve.length],
            curve.generator_x,
            curve.generator_y,
            curve,
        );
    }

    /// Start `k·P` with `k` in [`Lane::PrivateKey`] and `P` in the public
    /// coordinate lanes.
    fn multiply_public(&mut self, curve: &CurveParams) {
        let (x, y) = self.scratch.public(curve.length);
        self.pka.scalar_multiply_start(
            &self.scratch.lane(Lane::PrivateKey)[..curve.length],
            x,
            y,
            curve,
        );
    }

    /// Collect a point into a buffer lane.
    fn collect_point(&mut self, lane: Lane, curve: &CurveParams) -> Result<()> {
        let (x, y) = self.scratch.point_mut(lane, curve.length);
        self.pka.point_result(x, y).classify()
    }

    /// Collect a point and write it to the output slot `out`.
    fn write_point(&mut self, out: &mut KeyMaterial, curve: &CurveParams) -> Result<()> {
        let (x, y) = self.scratch.public_mut(curve.length);
        self.pka.point_result(x, y).classify()?;
        let (x, y) = self.scratch.public(curve.length);
        self.resolver.write_point(out, x, y, self.key_store)
    }

    /// Collect an addition, subtraction or multiplication into
    /// [`Lane::Buffer0`], recording its length.
    fn collect_buffer0(&mut self) -> Result<()> {
        let (status, length) = self.pka.bignum_result(self.scratch.lane_mut(Lane::Buffer0));
        self.scratch.buffer0_len = length;
        status.classify()
    }

    /// Start `Buffer0 mod n`, zero-extending the dividend to the curve
    /// length first.
    fn reduce_buffer0(&mut self, curve: &CurveParams) {
        let length = self.scratch.extend_buffer0(curve.length);
        self.pka
            .modulus_start(&self.scratch.lane(Lane::Buffer0)[..length], curve.order);
    }
}

/// Split an uncompressed point into its big-endian coordinates.
fn coordinates(bytes: &[u8], length: usize) -> Result<(&[u8], &[u8])> {
    match bytes {
        [_, point @ ..] if point.len() == 2 * length => Ok(point.split_at(length)),
        _ => Err(Error::Failed),
    }
}

#[cfg(test)]
mod tests {
    use super::{Step, coordinates};
    use crate::{Error, OperationKind};

    #[test]
    fn coordinates_require_full_point() {
        let point = [4u8, 1, 2, 3, 4];
        assert_eq!(coordinates(&point, 2), Ok((&[1u8, 2][..], &[3u8, 4][..])));
        assert_eq!(coordinates(&point, 3), Err(Error::Failed));
        assert_eq!(coordinates(&[], 2), Err(Error::Failed));
    }

    #[test]
    fn every_kind_has_a_first_step() {
        for kind in [
            OperationKind::RoundOneGenerateKeys,
            OperationKind::GenerateZkp,
            OperationKind::VerifyZkp,
            OperationKind::RoundTwoGenerateKeys,
            OperationKind::ComputeSharedSecret,
        ] {
            let first = Step::first(kind);
            assert_ne!(first, first.next(), "{kind:?}");
        }
    }
}
