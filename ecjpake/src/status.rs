//! Accelerator status codes and their protocol meaning.

use crate::{Error, Result};

/// Raw status reported by the accelerator when a result is collected.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PkaStatus {
    /// Operation completed.
    Success,
    /// Comparison: `a < b`.
    ALessThanB,
    /// Comparison: `a == b`.
    Equal,
    /// Comparison: `a > b`.
    AGreaterThanB,
    /// Resulting x-coordinate is zero.
    XZero,
    /// Resulting y-coordinate is zero.
    YZero,
    /// Resulting integer is zero.
    ResultZero,
    /// Input x-coordinate is not reduced modulo the prime.
    XLargerThanPrime,
    /// Input y-coordinate is not reduced modulo the prime.
    YLargerThanPrime,
    /// Input point does not satisfy the curve equation.
    PointNotOnCurve,
    /// Input point does not have the expected order.
    InvalidOrder,
    /// The accelerator has not finished yet.
    Busy,
    /// Unclassified hardware failure, including a result that does not fit
    /// the destination buffer.
    Failure,
}

impl PkaStatus {
    /// Map an accelerator status to the protocol outcome.
    ///
    /// `Ok(())` means the state machine may proceed. Comparisons report
    /// `ALessThanB` and `Equal` as success; callers checking a scalar range
    /// inspect the raw status themselves.
    pub fn classify(self) -> Result<()> {
        match self {
            PkaStatus::Success | PkaStatus::ALessThanB | PkaStatus::Equal => Ok(()),
            PkaStatus::XZero | PkaStatus::YZero | PkaStatus::ResultZero => {
                Err(Error::PointAtInfinity)
            }
            PkaStatus::XLargerThanPrime | PkaStatus::YLargerThanPrime => {
                Err(Error::PublicKeyLargerThanPrime)
            }
            PkaStatus::PointNotOnCurve => Err(Error::PublicKeyNotOnCurve),
            PkaStatus::AGreaterThanB
            | PkaStatus::InvalidOrder
            | PkaStatus::Busy
            | PkaStatus::Failure => Err(Error::Failed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PkaStatus;
    use crate::Error;

    #[test]
    fn classify_is_total() {
        let table = [
            (PkaStatus::Success, Ok(())),
            (PkaStatus::ALessThanB, Ok(())),
            (PkaStatus::Equal, Ok(())),
            (PkaStatus::AGreaterThanB, Err(Error::Failed)),
            (PkaStatus::XZero, Err(Error::PointAtInfinity)),
            (PkaStatus::YZero, Err(Error::PointAtInfinity)),
            (PkaStatus::ResultZero, Err(Error::PointAtInfinity)),
            (PkaStatus::XLargerThanPrime, Err(Error::PublicKeyLargerThanPrime)),
            (PkaStatus::YLargerThanPrime, Err(Error::PublicKeyLargerThanPrime)),
            (PkaStatus::PointNotOnCurve, Err(Error::PublicKeyNotOnCurve)),
            (PkaStatus::InvalidOrder, Err(Error::Failed)),
            (PkaStatus::Busy, Err(Error::Failed)),
            (PkaStatus::Failure, Err(Error::Failed)),
        ];

        for (status, expected) in table {
            assert_eq!(status.classify(), expected, "{status:?}");
        }
    }
}
