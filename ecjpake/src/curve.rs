//! Short Weierstrass curve parameters in accelerator byte order.

use hex_literal::hex;

/// Largest coordinate length supported by the scratch lanes and the key
/// store buffers (NIST P-521).
pub const MAX_CURVE_LENGTH: usize = 66;

/// Parameters of a short Weierstrass curve `y² = x³ + ax + b` over a prime
/// field.
///
/// All integers are little-endian and exactly `length` bytes long, which is
/// the layout the accelerator consumes.
#[derive(Debug, Eq, PartialEq)]
pub struct CurveParams {
    /// Human readable curve name.
    pub name: &'static str,

    /// Byte length of a coordinate and of a scalar.
    pub length: usize,

    /// Field prime `p`.
    pub prime: &'static [u8],

    /// Equation coefficient `a`.
    pub a: &'static [u8],

    /// Equation coefficient `b`.
    pub b: &'static [u8],

    /// Order `n` of the generator.
    pub order: &'static [u8],

    /// Generator x-coordinate.
    pub generator_x: &'static [u8],

    /// Generator y-coordinate.
    pub generator_y: &'static [u8],
}

impl CurveParams {
    /// Length of an uncompressed SEC1 point: `0x04 || X || Y`.
    pub const fn public_key_length(&self) -> usize {
        1 + 2 * self.length
    }

    /// Length of a scalar (private key, combined key, proof response).
    pub const fn private_key_length(&self) -> usize {
        self.length
    }

    /// Uncompressed big-endian encoding of the generator.
    #[cfg(feature = "soft-pka")]
    pub fn generator(&self) -> alloc::vec::Vec<u8> {
        let mut out = alloc::vec![0x04];
        out.extend(self.generator_x.iter().rev());
        out.extend(self.generator_y.iter().rev());
        out
    }

    pub(crate) fn is_supported(&self) -> bool {
        self.length != 0
            && self.length <= MAX_CURVE_LENGTH
            && [
                self.prime,
                self.a,
                self.b,
                self.order,
                self.generator_x,
                self.generator_y,
            ]
            .iter()
            .all(|field| field.len() == self.length)
    }
}

/// Convert a big-endian constant to little-endian at compile time.
const fn le<const N: usize>(be: [u8; N]) -> [u8; N] {
    let mut out = [0u8; N];
    let mut i = 0;
    while i < N {
        out[i] = be[N - 1 - i];
        i += 1;
    }
    out
}

static P224_PRIME: [u8; 28] = le(hex!("ffffffffffffffffffffffffffffffff000000000000000000000001"));
static P224_A: [u8; 28] = le(hex!("fffffffffffffffffffffffffffffffefffffffffffffffffffffffe"));
static P224_B: [u8; 28] = le(hex!("b4050a850c04b3abf54132565044b0b7d7bfd8ba270b39432355ffb4"));
static P224_ORDER: [u8; 28] = le(hex!("ffffffffffffffffffffffffffff16a2e0b8f03e13dd29455c5c2a3d"));
static P224_GX: [u8; 28] = le(hex!("b70e0cbd6bb4bf7f321390b94a03c1d356c21122343280d6115c1d21"));
static P224_GY: [u8; 28] = le(hex!("bd376388b5f723fb4c22dfe6cd4375a05a07476444d5819985007e34"));

/// NIST P-224 (secp224r1).
pub static NIST_P224: CurveParams = CurveParams {
    name: "NIST P-224",
    length: 28,
    prime: &P224_PRIME,
    a: &P224_A,
    b: &P224_B,
    order: &P224_ORDER,
    generator_x: &P224_GX,
    generator_y: &P224_GY,
};

static P256_PRIME: [u8; 32] =
    le(hex!("ffffffff00000001000000000000000000000000ffffffffffffffffffffffff"));
static P256_A: [u8; 32] =
    le(hex!("ffffffff00000001000000000000000000000000fffffffffffffffffffffffc"));
static P256_B: [u8; 32] =
    le(hex!("5ac635d8aa3a93e7b3ebbd55769886bc651d06b0cc53b0f63bce3c3e27d2604b"));
static P256_ORDER: [u8; 32] =
    le(hex!("ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551"));
static P256_GX: [u8; 32] =
    le(hex!("6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296"));
static P256_GY: [u8; 32] =
    le(hex!("4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5"));

/// NIST P-256 (secp256r1, prime256v1).
pub static NIST_P256: CurveParams = CurveParams {
    name: "NIST P-256",
    length: 32,
    prime: &P256_PRIME,
    a: &P256_A,
    b: &P256_B,
    order: &P256_ORDER,
    generator_x: &P256_GX,
    generator_y: &P256_GY,
};

static BP256_PRIME: [u8; 32] =
    le(hex!("a9fb57dba1eea9bc3e660a909d838d726e3bf623d52620282013481d1f6e5377"));
static BP256_A: [u8; 32] =
    le(hex!("7d5a0975fc2c3057eef67530417affe7fb8055c126dc5c6ce94a4b44f330b5d9"));
static BP256_B: [u8; 32] =
    le(hex!("26dc5c6ce94a4b44f330b5d9bbd77cbf958416295cf7e1ce6bccdc18ff8c07b6"));
static BP256_ORDER: [u8; 32] =
    le(hex!("a9fb57dba1eea9bc3e660a909d838d718c397aa3b561a6f7901e0e82974856a7"));
static BP256_GX: [u8; 32] =
    le(hex!("8bd2aeb9cb7e57cb2c4b482ffc81b7afb9de27e1e3bd23c23a4453bd9ace3262"));
static BP256_GY: [u8; 32] =
    le(hex!("547ef835c3dac4fd97f8461a14611dc9c27745132ded8e545c1d54c72f046997"));

/// brainpoolP256r1 (RFC 5639).
pub static BRAINPOOL_P256R1: CurveParams = CurveParams {
    name: "brainpoolP256r1",
    length: 32,
    prime: &BP256_PRIME,
    a: &BP256_A,
    b: &BP256_B,
    order: &BP256_ORDER,
    generator_x: &BP256_GX,
    generator_y: &BP256_GY,
};
