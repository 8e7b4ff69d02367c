//! Scratch lanes holding little-endian operands between accelerator calls.

use zeroize::Zeroize;

/// Capacity of the private key and public coordinate lanes.
pub(crate) const KEY_LANE: usize = 96;

/// Capacity of the general purpose lanes.
pub(crate) const BUFFER_LANE: usize = 256;

/// Scratch lane selector.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Lane {
    PrivateKey,
    PublicX,
    PublicY,
    Buffer0,
    Buffer2,
}

/// Arena of fixed-size lanes shared by all state machines.
///
/// Every lane fits a coordinate of the largest supported curve, and the
/// general purpose lanes fit a full point or a double-width product, so
/// slicing `..curve.length` (or `..2 * curve.length` on a buffer lane)
/// never goes out of bounds once the curve has been admitted.
pub(crate) struct Scratch {
    private_key: [u8; KEY_LANE],
    public_x: [u8; KEY_LANE],
    public_y: [u8; KEY_LANE],
    buffer0: [u8; BUFFER_LANE],
    buffer2: [u8; BUFFER_LANE],

    /// Length of the integer last written to [`Lane::Buffer0`].
    pub(crate) buffer0_len: usize,
}

impl Scratch {
    pub(crate) const fn new() -> Self {
        Self {
            private_key: [0; KEY_LANE],
            public_x: [0; KEY_LANE],
            public_y: [0; KEY_LANE],
            buffer0: [0; BUFFER_LANE],
            buffer2: [0; BUFFER_LANE],
            buffer0_len: BUFFER_LANE,
        }
    }

    pub(crate) fn lane(&self, lane: Lane) -> &[u8] {
        match lane {
            Lane::PrivateKey => &self.private_key,
            Lane::PublicX => &self.public_x,
            Lane::PublicY => &self.public_y,
            Lane::Buffer0 => &self.buffer0,
            Lane::Buffer2 => &self.buffer2,
        }
    }

    pub(crate) fn lane_mut(&mut self, lane: Lane) -> &mut [u8] {
        match lane {
            Lane::PrivateKey => &mut self.private_key,
            Lane::PublicX => &mut self.public_x,
            Lane::PublicY => &mut self.public_y,
            Lane::Buffer0 => &mut self.buffer0,
            Lane::Buffer2 => &mut self.buffer2,
        }
    }

    /// A point stored as `X || Y` at the front of a buffer lane.
    pub(crate) fn point(&self, lane: Lane, length: usize) -> (&[u8], &[u8]) {
        let (x, rest) = self.lane(lane).split_at(length);
        (x, &rest[..length])
    }

    pub(crate) fn point_mut(&mut self, lane: Lane, length: usize) -> (&mut [u8], &mut [u8]) {
        let (x, rest) = self.lane_mut(lane).split_at_mut(length);
        (x, &mut rest[..length])
    }

    /// The public coordinate lanes as a point.
    pub(crate) fn public(&self, length: usize) -> (&[u8], &[u8]) {
        (&self.public_x[..length], &self.public_y[..length])
    }

    pub(crate) fn public_mut(&mut self, length: usize) -> (&mut [u8], &mut [u8]) {
        (&mut self.public_x[..length], &mut self.public_y[..length])
    }

    /// Zero [`Lane::Buffer0`] from the last written length up to `length`,
    /// returning the dividend length for a reduction modulo a `length`-byte
    /// divisor.
    pub(crate) fn extend_buffer0(&mut self, length: usize) -> usize {
        if length > self.buffer0_len {
            self.buffer0[self.buffer0_len..length].fill(0);
        }
        self.buffer0_len.max(length)
    }

    /// Forget bookkeeping from the previous operation.
    pub(crate) fn reset(&mut self) {
        self.buffer0_len = BUFFER_LANE;
    }
}

impl Zeroize for Scratch {
    fn zeroize(&mut self) {
        self.private_key.zeroize();
        self.public_x.zeroize();
        self.public_y.zeroize();
        self.buffer0.zeroize();
        self.buffer2.zeroize();
        self.reset();
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// Copy the big-endian integer `src` into `dst` as little-endian, zero
/// filling the remainder of `dst`.
///
/// Returns `false` if `src` does not fit.
pub(crate) fn reverse_copy_pad(src: &[u8], dst: &mut [u8]) -> bool {
    if src.len() > dst.len() {
        return false;
    }
    let (low, high) = dst.split_at_mut(src.len());
    for (out, byte) in low.iter_mut().zip(src.iter().rev()) {
        *out = *byte;
    }
    high.fill(0);
    true
}

#[cfg(test)]
mod tests {
    use super::{BUFFER_LANE, Lane, Scratch, reverse_copy_pad};
    use zeroize::Zeroize;

    #[test]
    fn reverse_copy_pads_with_zeros() {
        let mut dst = [0xffu8; 6];
        assert!(reverse_copy_pad(&[1, 2, 3, 4], &mut dst));
        assert_eq!(dst, [4, 3, 2, 1, 0, 0]);
        assert!(!reverse_copy_pad(&[0; 7], &mut dst));
    }

    #[test]
    fn extend_buffer0_zero_fills_short_dividend() {
        let mut scratch = Scratch::new();
        scratch.lane_mut(Lane::Buffer0).fill(0xaa);
        scratch.buffer0_len = 8;

        assert_eq!(scratch.extend_buffer0(32), 32);
        assert!(scratch.lane(Lane::Buffer0)[8..32].iter().all(|b| *b == 0));
        assert_eq!(scratch.lane(Lane::Buffer0)[..8], [0xaa; 8]);

        scratch.buffer0_len = 64;
        assert_eq!(scratch.extend_buffer0(32), 64);
    }

    #[test]
    fn point_halves() {
        let mut scratch = Scratch::new();
        {
            let (x, y) = scratch.point_mut(Lane::Buffer2, 4);
            x.copy_from_slice(&[1; 4]);
            y.copy_from_slice(&[2; 4]);
        }
        assert_eq!(scratch.point(Lane::Buffer2, 4), (&[1u8; 4][..], &[2u8; 4][..]));
    }

    #[test]
    fn zeroize_wipes_every_lane() {
        let mut scratch = Scratch::new();
        for lane in [
            Lane::PrivateKey,
            Lane::PublicX,
            Lane::PublicY,
            Lane::Buffer0,
            Lane::Buffer2,
        ] {
            scratch.lane_mut(lane).fill(0x5a);
        }
        scratch.buffer0_len = 3;
        scratch.zeroize();

        for lane in [
            Lane::PrivateKey,
            Lane::PublicX,
            Lane::PublicY,
            Lane::Buffer0,
            Lane::Buffer2,
        ] {
            assert!(scratch.lane(lane).iter().all(|b| *b == 0));
        }
        assert_eq!(scratch.buffer0_len, BUFFER_LANE);
    }
}
