//! Error type

use core::fmt::{self, Display};

/// Result type with the `ecjpake` crate's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

/// EC-JPAKE errors.
///
/// Every outcome is reported through the same channel as success: the
/// returned [`Completion`](crate::Completion) in polling and blocking mode,
/// or the callback's argument in callback mode.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The accelerator is already running another operation. The caller may
    /// retry once it has completed.
    ResourceUnavailable,

    /// An output key slot was not blank when the operation was submitted.
    OutputKeyNotBlank,

    /// A private scalar was zero or not smaller than the curve order.
    InvalidPrivateKey,

    /// A point multiplication or addition produced the point at infinity.
    PointAtInfinity,

    /// A public key coordinate is not reduced modulo the field prime.
    PublicKeyLargerThanPrime,

    /// A public key does not satisfy the curve equation.
    PublicKeyNotOnCurve,

    /// The key store rejected a request or returned material of an
    /// unexpected length.
    KeyStore,

    /// The operation was canceled.
    Canceled,

    /// Generic failure, including a zero-knowledge proof that did not
    /// verify.
    Failed,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Error::ResourceUnavailable => "accelerator busy",
            Error::OutputKeyNotBlank => "output key is not blank",
            Error::InvalidPrivateKey => "invalid private key",
            Error::PointAtInfinity => "point at infinity",
            Error::PublicKeyLargerThanPrime => "public key coordinate larger than prime",
            Error::PublicKeyNotOnCurve => "public key not on curve",
            Error::KeyStore => "key store error",
            Error::Canceled => "operation canceled",
            Error::Failed => "ecjpake error",
        })
    }
}

impl core::error::Error for Error {}
