//! Accelerator model over arbitrary precision integers.

use crate::{CurveParams, Pka, PkaStatus};
use alloc::vec::Vec;
use core::{cell::Cell, cmp::Ordering, time::Duration};
use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Result held until it is collected.
#[derive(Clone, Debug)]
enum Output {
    Empty,
    Status(PkaStatus),
    Integer(BigUint),
    Point(BigUint, BigUint),
}

/// Software model of the public key accelerator.
///
/// Results are computed eagerly when an operation starts. Each started
/// operation then stays busy for a configurable number of
/// [`Pka::is_busy`] polls, which exercises the suspend and resume paths of
/// the engine. The completion interrupt is level-triggered like the
/// hardware's: it is pending whenever it is enabled and nothing is running.
///
/// Public key validation checks reduction and the curve equation. The order
/// check is implied for the built-in curves, which all have cofactor 1.
#[derive(Debug)]
pub struct SoftPka {
    output: Output,
    latency: u32,
    remaining: Cell<u32>,
    interrupt_enabled: bool,
    stalled: bool,
    power_holds: usize,
    scalar_multiplications: usize,
    aborts: usize,
    ram_clears: usize,
}

impl Default for SoftPka {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftPka {
    /// Accelerator that finishes every operation on the first poll.
    pub fn new() -> Self {
        Self {
            output: Output::Empty,
            latency: 0,
            remaining: Cell::new(0),
            interrupt_enabled: false,
            stalled: false,
            power_holds: 0,
            scalar_multiplications: 0,
            aborts: 0,
            ram_clears: 0,
        }
    }

    /// Keep every operation busy for `polls` calls to [`Pka::is_busy`].
    pub fn with_latency(mut self, polls: u32) -> Self {
        self.latency = polls;
        self
    }

    /// Model a stuck interrupt line: the completion interrupt is never
    /// asserted until the accelerator is aborted.
    pub fn stall(&mut self) {
        self.stalled = true;
    }

    /// Is the interrupt unmasked?
    pub fn interrupt_enabled(&self) -> bool {
        self.interrupt_enabled
    }

    /// Number of outstanding [`Pka::hold_power`] constraints.
    pub fn power_holds(&self) -> usize {
        self.power_holds
    }

    /// Number of point multiplications started so far.
    pub fn scalar_multiplications(&self) -> usize {
        self.scalar_multiplications
    }

    /// Number of times the accelerator was aborted.
    pub fn aborts(&self) -> usize {
        self.aborts
    }

    /// Number of times the working memory was wiped.
    pub fn ram_clears(&self) -> usize {
        self.ram_clears
    }

    fn begin(&mut self, output: Output) {
        self.output = output;
        self.remaining.set(self.latency);
    }

    fn take(&mut self) -> Output {
        core::mem::replace(&mut self.output, Output::Empty)
    }
}

impl Pka for SoftPka {
    fn compare_start(&mut self, a: &[u8], b: &[u8]) {
        let status = match int(a).cmp(&int(b)) {
            Ordering::Less => PkaStatus::ALessThanB,
            Ordering::Equal => PkaStatus::Equal,
            Ordering::Greater => PkaStatus::AGreaterThanB,
        };
        self.begin(Output::Status(status));
    }

    fn compare_result(&mut self) -> PkaStatus {
        match self.take() {
            Output::Status(status) => status,
            _ => PkaStatus::Failure,
        }
    }

    fn add_start(&mut self, a: &[u8], b: &[u8]) {
        self.begin(Output::Integer(int(a) + int(b)));
    }

    fn subtract_start(&mut self, a: &[u8], b: &[u8]) {
        let (a, b) = (int(a), int(b));
        let output = if a < b {
            Output::Status(PkaStatus::Failure)
        } else {
            Output::Integer(a - b)
        };
        self.begin(output);
    }

    fn multiply_start(&mut self, a: &[u8], b: &[u8]) {
        self.begin(Output::Integer(int(a) * int(b)));
    }

    fn bignum_result(&mut self, out: &mut [u8]) -> (PkaStatus, usize) {
        let Output::Integer(value) = self.take() else {
            return (PkaStatus::Failure, 0);
        };

        let bytes = value.to_bytes_le();
        let words = bytes.len().div_ceil(4).max(1) * 4;
        if bytes.len() > out.len() {
            return (PkaStatus::Failure, 0);
        }
        let written = words.min(out.len());
        out[..written].fill(0);
        out[..bytes.len()].copy_from_slice(&bytes);
        (PkaStatus::Success, written)
    }

    fn modulus_start(&mut self, a: &[u8], n: &[u8]) {
        let modulus = int(n);
        let output = if a.len() < n.len() || modulus.is_zero() {
            Output::Status(PkaStatus::Failure)
        } else {
            Output::Integer(int(a) % modulus)
        };
        self.begin(output);
    }

    fn modulus_result(&mut self, out: &mut [u8]) -> PkaStatus {
        match self.take() {
            Output::Integer(value) if write_le(&value, out) => PkaStatus::Success,
            Output::Status(status) => status,
            _ => PkaStatus::Failure,
        }
    }

    fn scalar_multiply_start(&mut self, k: &[u8], x: &[u8], y: &[u8], curve: &CurveParams) {
        self.scalar_multiplications += 1;
        let field = Field::new(curve);
        let point = Jacobian::affine(field.reduce(int(x)), field.reduce(int(y)));
        let product = field.multiply(k, &point);
        self.begin(field.output(&product));
    }

    fn point_add_start(&mut self, ax: &[u8], ay: &[u8], bx: &[u8], by: &[u8], curve: &CurveParams) {
        let field = Field::new(curve);
        let a = Jacobian::affine(field.reduce(int(ax)), field.reduce(int(ay)));
        let b = Jacobian::affine(field.reduce(int(bx)), field.reduce(int(by)));
        let sum = field.add(&a, &b);
        self.begin(field.output(&sum));
    }

    fn point_result(&mut self, x: &mut [u8], y: &mut [u8]) -> PkaStatus {
        match self.take() {
            Output::Point(px, py) if write_le(&px, x) && write_le(&py, y) => PkaStatus::Success,
            Output::Status(status) => status,
            _ => PkaStatus::Failure,
        }
    }

    fn validate_public_key(&mut self, x: &[u8], y: &[u8], curve: &CurveParams) -> PkaStatus {
        let field = Field::new(curve);
        let (x, y) = (int(x), int(y));
        if x >= field.p {
            PkaStatus::XLargerThanPrime
        } else if y >= field.p {
            PkaStatus::YLargerThanPrime
        } else if !field.is_on_curve(&x, &y) {
            PkaStatus::PointNotOnCurve
        } else {
            PkaStatus::Success
        }
    }

    fn is_busy(&self) -> bool {
        match self.remaining.get() {
            0 => false,
            polls => {
                self.remaining.set(polls - 1);
                true
            }
        }
    }

    fn enable_interrupt(&mut self) {
        self.interrupt_enabled = true;
    }

    fn disable_interrupt(&mut self) {
        self.interrupt_enabled = false;
    }

    fn clear_interrupt(&mut self) {}

    fn interrupt_pending(&self) -> bool {
        self.interrupt_enabled && !self.stalled && !self.is_busy()
    }

    /// Spins until the interrupt is pending. Fails right away when it never
    /// can be: masked, or stalled.
    fn wait_for_interrupt(&mut self, _timeout: Option<Duration>) -> bool {
        loop {
            if !self.interrupt_enabled || self.stalled {
                return false;
            }
            if self.interrupt_pending() {
                return true;
            }
        }
    }

    fn abort(&mut self) {
        self.aborts += 1;
        self.output = Output::Empty;
        self.remaining.set(0);
        self.stalled = false;
    }

    fn clear_ram(&mut self) {
        self.ram_clears += 1;
        self.output = Output::Empty;
    }

    fn hold_power(&mut self) {
        self.power_holds += 1;
    }

    fn release_power(&mut self) {
        self.power_holds = self.power_holds.saturating_sub(1);
    }
}

fn int(le: &[u8]) -> BigUint {
    BigUint::from_bytes_le(le)
}

/// Write `value` little-endian into `out`, zero-padded. Fails if it does
/// not fit.
fn write_le(value: &BigUint, out: &mut [u8]) -> bool {
    let bytes: Vec<u8> = if value.is_zero() {
        Vec::new()
    } else {
        value.to_bytes_le()
    };
    if bytes.len() > out.len() {
        return false;
    }
    out.fill(0);
    out[..bytes.len()].copy_from_slice(&bytes);
    true
}

/// Point in Jacobian coordinates; `z == 0` is the point at infinity.
#[derive(Clone, Debug)]
struct Jacobian {
    x: BigUint,
    y: BigUint,
    z: BigUint,
}

impl Jacobian {
    fn identity() -> Self {
        Self {
            x: BigUint::one(),
            y: BigUint::one(),
            z: BigUint::zero(),
        }
    }

    fn affine(x: BigUint, y: BigUint) -> Self {
        Self {
            x,
            y,
            z: BigUint::one(),
        }
    }

    fn is_identity(&self) -> bool {
        self.z.is_zero()
    }
}

/// Arithmetic over the base field of a curve with general `a`.
struct Field {
    p: BigUint,
    a: BigUint,
    b: BigUint,
}

impl Field {
    fn new(curve: &CurveParams) -> Self {
        Self {
            p: int(curve.prime),
            a: int(curve.a),
            b: int(curve.b),
        }
    }

    fn reduce(&self, value: BigUint) -> BigUint {
        value % &self.p
    }

    fn add_mod(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a + b) % &self.p
    }

    fn sub_mod(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a + &self.p - b) % &self.p
    }

    fn mul_mod(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a * b) % &self.p
    }

    fn invert(&self, a: &BigUint) -> BigUint {
        a.modpow(&(&self.p - 2u32), &self.p)
    }

    fn is_on_curve(&self, x: &BigUint, y: &BigUint) -> bool {
        let lhs = self.mul_mod(y, y);
        let x3 = self.mul_mod(&self.mul_mod(x, x), x);
        let rhs = self.add_mod(&self.add_mod(&x3, &self.mul_mod(&self.a, x)), &self.b);
        lhs == rhs
    }

    fn double(&self, point: &Jacobian) -> Jacobian {
        if point.is_identity() || point.y.is_zero() {
            return Jacobian::identity();
        }

        let xx = self.mul_mod(&point.x, &point.x);
        let yy = self.mul_mod(&point.y, &point.y);
        let yyyy = self.mul_mod(&yy, &yy);
        let zz = self.mul_mod(&point.z, &point.z);

        let s = self.mul_mod(&BigUint::from(4u32), &self.mul_mod(&point.x, &yy));
        let m = self.add_mod(
            &self.mul_mod(&BigUint::from(3u32), &xx),
            &self.mul_mod(&self.a, &self.mul_mod(&zz, &zz)),
        );
        let x = self.sub_mod(&self.mul_mod(&m, &m), &self.add_mod(&s, &s));
        let y = self.sub_mod(
            &self.mul_mod(&m, &self.sub_mod(&s, &x)),
            &self.mul_mod(&BigUint::from(8u32), &yyyy),
        );
        let z = self.mul_mod(&BigUint::from(2u32), &self.mul_mod(&point.y, &point.z));
        Jacobian { x, y, z }
    }

    fn add(&self, lhs: &Jacobian, rhs: &Jacobian) -> Jacobian {
        if lhs.is_identity() {
            return rhs.clone();
        }
        if rhs.is_identity() {
            return lhs.clone();
        }

        let z1z1 = self.mul_mod(&lhs.z, &lhs.z);
        let z2z2 = self.mul_mod(&rhs.z, &rhs.z);
        let u1 = self.mul_mod(&lhs.x, &z2z2);
        let u2 = self.mul_mod(&rhs.x, &z1z1);
        let s1 = self.mul_mod(&lhs.y, &self.mul_mod(&rhs.z, &z2z2));
        let s2 = self.mul_mod(&rhs.y, &self.mul_mod(&lhs.z, &z1z1));

        if u1 == u2 {
            return if s1 == s2 {
                self.double(lhs)
            } else {
                Jacobian::identity()
            };
        }

        let h = self.sub_mod(&u2, &u1);
        let r = self.sub_mod(&s2, &s1);
        let hh = self.mul_mod(&h, &h);
        let hhh = self.mul_mod(&h, &hh);
        let v = self.mul_mod(&u1, &hh);

        let x = self.sub_mod(
            &self.sub_mod(&self.mul_mod(&r, &r), &hhh),
            &self.add_mod(&v, &v),
        );
        let y = self.sub_mod(
            &self.mul_mod(&r, &self.sub_mod(&v, &x)),
            &self.mul_mod(&s1, &hhh),
        );
        let z = self.mul_mod(&self.mul_mod(&lhs.z, &rhs.z), &h);
        Jacobian { x, y, z }
    }

    /// Left-to-right double-and-add over the little-endian scalar `k`.
    fn multiply(&self, k: &[u8], point: &Jacobian) -> Jacobian {
        let mut acc = Jacobian::identity();
        for byte in k.iter().rev() {
            for bit in (0..8).rev() {
                acc = self.double(&acc);
                if (byte >> bit) & 1 == 1 {
                    acc = self.add(&acc, point);
                }
            }
        }
        acc
    }

    fn output(&self, point: &Jacobian) -> Output {
        if point.is_identity() {
            return Output::Status(PkaStatus::ResultZero);
        }
        let z_inv = self.invert(&point.z);
        let z_inv2 = self.mul_mod(&z_inv, &z_inv);
        let x = self.mul_mod(&point.x, &z_inv2);
        let y = self.mul_mod(&point.y, &self.mul_mod(&z_inv2, &z_inv));
        Output::Point(x, y)
    }
}
