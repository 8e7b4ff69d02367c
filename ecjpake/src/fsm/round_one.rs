//! Round one: `X = x·G` for each of the four private scalars.

use super::{Context, Transition};
use crate::{KeyMaterial, KeyStore, Pka, Result, operation::RoundOneGenerateKeys};

/// Which of the four key pairs a step works on.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Slot {
    PublicKey1,
    PublicKey2,
    PublicV1,
    PublicV2,
}

impl Slot {
    fn next(self) -> Option<Self> {
        match self {
            Slot::PublicKey1 => Some(Slot::PublicKey2),
            Slot::PublicKey2 => Some(Slot::PublicV1),
            Slot::PublicV1 => Some(Slot::PublicV2),
            Slot::PublicV2 => None,
        }
    }

    fn keys(self, op: &mut RoundOneGenerateKeys) -> (&KeyMaterial, &mut KeyMaterial) {
        match self {
            Slot::PublicKey1 => (&op.my_private_key1, &mut op.my_public_key1),
            Slot::PublicKey2 => (&op.my_private_key2, &mut op.my_public_key2),
            Slot::PublicV1 => (&op.my_private_v1, &mut op.my_public_v1),
            Slot::PublicV2 => (&op.my_private_v2, &mut op.my_public_v2),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Step {
    Generate(Slot),
    Collect(Slot),
    Return,
}

impl Step {
    pub(crate) const FIRST: Self = Step::Generate(Slot::PublicKey1);

    pub(crate) fn next(self) -> Self {
        match self {
            Step::Generate(slot) => Step::Collect(slot),
            Step::Collect(slot) => slot.next().map_or(Step::Return, Step::Generate),
            Step::Return => Step::Return,
        }
    }
}

pub(crate) fn run<P, K>(
    step: Step,
    op: &mut RoundOneGenerateKeys,
    ctx: &mut Context<'_, P, K>,
) -> Result<Transition>
where
    P: Pka + ?Sized,
    K: KeyStore + ?Sized,
{
    let curve = op.curve;
    match step {
        Step::Generate(slot) => {
            let (private_key, _) = slot.keys(op);
            ctx.load_checked_private_key(private_key, curve)?;
            ctx.multiply_generator(curve);
            Ok(Transition::Suspend)
        }
        Step::Collect(slot) => {
            let (_, public_key) = slot.keys(op);
            ctx.write_point(public_key, curve)?;
            Ok(Transition::Continue)
        }
        Step::Return => Ok(Transition::Done),
    }
}

#[cfg(test)]
mod tests {
    use super::{Slot, Step};

    #[test]
    fn visits_all_four_slots_in_order() {
        let mut step = Step::FIRST;
        let mut generated = [None; 4];
        for slot in &mut generated {
            assert!(matches!(step, Step::Generate(_)));
            if let Step::Generate(current) = step {
                *slot = Some(current);
            }
            step = step.next();
            assert!(matches!(step, Step::Collect(_)));
            step = step.next();
        }
        assert_eq!(
            generated,
            [
                Some(Slot::PublicKey1),
                Some(Slot::PublicKey2),
                Some(Slot::PublicV1),
                Some(Slot::PublicV2)
            ]
        );
        assert_eq!(step, Step::Return);
        assert_eq!(step.next(), Step::Return);
    }
}
