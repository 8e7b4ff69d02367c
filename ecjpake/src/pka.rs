//! Public key accelerator interface.

use crate::{CurveParams, PkaStatus};
use core::time::Duration;
use subtle::ConstantTimeEq;

/// Asynchronous big number and elliptic curve co-processor.
///
/// All operands are little-endian integers. Every `*_start` method kicks off
/// one hardware operation and returns immediately; the matching `*_result`
/// method collects the output once [`Pka::is_busy`] reports `false`.
///
/// Completion is signalled through a level-triggered interrupt which is
/// asserted whenever it is enabled and the accelerator is idle. Enabling the
/// interrupt while idle therefore fires it right away, which is how an
/// operation is kicked off.
///
/// Implementations exist once per hardware target and once per test double.
pub trait Pka {
    /// Start comparing `a` with `b`. Both operands have the same length.
    fn compare_start(&mut self, a: &[u8], b: &[u8]);

    /// Collect a comparison: [`PkaStatus::ALessThanB`],
    /// [`PkaStatus::Equal`] or [`PkaStatus::AGreaterThanB`].
    fn compare_result(&mut self) -> PkaStatus;

    /// Start computing `a + b`.
    fn add_start(&mut self, a: &[u8], b: &[u8]);

    /// Start computing `a - b`, with `a >= b`.
    fn subtract_start(&mut self, a: &[u8], b: &[u8]);

    /// Start computing `a * b`.
    fn multiply_start(&mut self, a: &[u8], b: &[u8]);

    /// Collect the result of an addition, subtraction or multiplication.
    ///
    /// Writes the result into the front of `out` and returns its length,
    /// a whole number of 32-bit words.
    fn bignum_result(&mut self, out: &mut [u8]) -> (PkaStatus, usize);

    /// Start computing `a mod n`.
    ///
    /// The hardware requires `a.len() >= n.len()`; callers zero-extend the
    /// dividend when needed.
    fn modulus_start(&mut self, a: &[u8], n: &[u8]);

    /// Collect a reduction into `out`, zero-padded to its full length.
    fn modulus_result(&mut self, out: &mut [u8]) -> PkaStatus;

    /// Start computing `k·(x, y)` on `curve`.
    fn scalar_multiply_start(&mut self, k: &[u8], x: &[u8], y: &[u8], curve: &CurveParams);

    /// Start computing `(ax, ay) + (bx, by)` on `curve`.
    fn point_add_start(&mut self, ax: &[u8], ay: &[u8], bx: &[u8], by: &[u8], curve: &CurveParams);

    /// Collect a point multiplication or addition.
    fn point_result(&mut self, x: &mut [u8], y: &mut [u8]) -> PkaStatus;

    /// Check that `(x, y)` is a valid public key on `curve`: both
    /// coordinates reduced, the curve equation holds and the point has order
    /// `n`. Runs synchronously.
    fn validate_public_key(&mut self, x: &[u8], y: &[u8], curve: &CurveParams) -> PkaStatus;

    /// Constant-time check that `bytes` is all zeros.
    fn all_zeros(&self, bytes: &[u8]) -> bool {
        let acc = bytes.iter().fold(0u8, |acc, byte| acc | byte);
        acc.ct_eq(&0).into()
    }

    /// Is an operation still running?
    fn is_busy(&self) -> bool;

    /// Unmask the completion interrupt.
    fn enable_interrupt(&mut self);

    /// Mask the completion interrupt.
    fn disable_interrupt(&mut self);

    /// Acknowledge a pending completion interrupt.
    fn clear_interrupt(&mut self);

    /// Is the completion interrupt asserted?
    fn interrupt_pending(&self) -> bool;

    /// Sleep until the completion interrupt is asserted.
    ///
    /// Returns `false` if `timeout` expired first. `None` waits without
    /// bound.
    fn wait_for_interrupt(&mut self, timeout: Option<Duration>) -> bool;

    /// Force-stop the running operation.
    fn abort(&mut self);

    /// Wipe the accelerator's working memory.
    fn clear_ram(&mut self);

    /// Keep the accelerator's power domain from idling.
    fn hold_power(&mut self) {}

    /// Release the constraint taken by [`Pka::hold_power`].
    fn release_power(&mut self) {}
}
