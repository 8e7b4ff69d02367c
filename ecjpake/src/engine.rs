//! Accelerator completion handler.

use crate::{
    Error, KeyStore, NoKeyStore, Operation, OperationKind, Pka, Result,
    fsm::{self, Context, Step, Transition},
    resolver::Resolver,
    scratch::Scratch,
};
use tracing::{debug, trace, warn};
use zeroize::Zeroize;

/// Outcome of a submitted operation.
#[derive(Debug)]
pub struct Completion {
    /// Kind of the operation.
    pub kind: OperationKind,

    /// Final status. `Ok(())` with no operation means the operation was
    /// accepted in callback mode and is still running.
    pub status: Result<()>,

    /// The operation handed back to the caller, with its output slots
    /// populated on success.
    pub operation: Option<Operation>,
}

impl Completion {
    pub(crate) fn pending(kind: OperationKind) -> Self {
        Self {
            kind,
            status: Ok(()),
            operation: None,
        }
    }

    fn finished(operation: Operation, status: Result<()>) -> Self {
        Self {
            kind: operation.kind(),
            status,
            operation: Some(operation),
        }
    }

    /// Was the operation accepted but not finished yet?
    pub fn is_pending(&self) -> bool {
        self.status.is_ok() && self.operation.is_none()
    }

    /// The finished operation, if it succeeded.
    pub fn into_output<T>(self) -> Result<T>
    where
        T: TryFrom<Operation, Error = Error>,
    {
        self.status?;
        T::try_from(self.operation.ok_or(Error::Failed)?)
    }
}

struct InFlight {
    operation: Operation,
    step: Step,
}

/// Drives one operation at a time through its state machine on a single
/// accelerator.
///
/// The engine owns the scratch arena and the accelerator handle, so holding
/// `&mut Engine` is what grants access to the hardware. It does not decide
/// how completion is awaited: a platform interrupt vector, a polling loop or
/// a blocking wait calls [`Engine::on_interrupt`] whenever the accelerator
/// interrupt is asserted. See [`Ecjpake`](crate::Ecjpake) for the three
/// standard disciplines.
pub struct Engine<P, K = NoKeyStore> {
    pka: P,
    key_store: K,
    scratch: Scratch,
    resolver: Resolver,
    in_flight: Option<InFlight>,
    canceled: bool,
}

impl<P: Pka, K: KeyStore> Engine<P, K> {
    /// Take ownership of an accelerator and a key store.
    pub fn new(pka: P, key_store: K) -> Self {
        Self {
            pka,
            key_store,
            scratch: Scratch::new(),
            resolver: Resolver::new(),
            in_flight: None,
            canceled: false,
        }
    }

    /// Is an operation in flight?
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The accelerator.
    pub fn pka(&self) -> &P {
        &self.pka
    }

    pub(crate) fn pka_mut(&mut self) -> &mut P {
        &mut self.pka
    }

    /// The key store.
    pub fn key_store(&self) -> &K {
        &self.key_store
    }

    /// The key store, mutably.
    pub fn key_store_mut(&mut self) -> &mut K {
        &mut self.key_store
    }

    /// Release the accelerator and the key store.
    pub fn into_parts(self) -> (P, K) {
        (self.pka, self.key_store)
    }

    /// Admit `operation` and arm the accelerator interrupt.
    ///
    /// The first step runs from the next [`Engine::on_interrupt`], which the
    /// level-triggered interrupt requests immediately. On rejection the
    /// operation is handed back in the returned [`Completion`].
    pub fn start(&mut self, operation: Operation) -> core::result::Result<(), Completion> {
        let kind = operation.kind();

        if !operation.outputs_blank() {
            warn!(?kind, "output key not blank");
            return Err(Completion::finished(operation, Err(Error::OutputKeyNotBlank)));
        }

        if self.in_flight.is_some() {
            debug!(?kind, "accelerator busy");
            return Err(Completion::finished(
                operation,
                Err(Error::ResourceUnavailable),
            ));
        }

        if !operation.curve().is_supported() {
            warn!(?kind, curve = operation.curve().name, "unsupported curve");
            return Err(Completion::finished(operation, Err(Error::Failed)));
        }

        self.in_flight = Some(InFlight {
            operation,
            step: Step::first(kind),
        });
        self.canceled = false;
        self.scratch.reset();

        debug!(?kind, "operation started");
        self.pka.hold_power();
        self.pka.enable_interrupt();
        Ok(())
    }

    /// Service the accelerator interrupt.
    ///
    /// Runs state machine steps until one suspends on the accelerator or the
    /// operation ends. Returns the [`Completion`] once the operation has
    /// ended and the engine is free again.
    pub fn on_interrupt(&mut self) -> Option<Completion> {
        let Engine {
            pka,
            key_store,
            scratch,
            resolver,
            in_flight,
            canceled,
        } = self;

        let current = in_flight.as_mut()?;
        pka.disable_interrupt();

        let mut outcome = if *canceled {
            Err(Error::Canceled)
        } else {
            let mut ctx = Context {
                pka: &mut *pka,
                key_store: &mut *key_store,
                scratch: &mut *scratch,
                resolver: &mut *resolver,
            };
            loop {
                let step = current.step;
                let result = fsm::run(step, &mut current.operation, &mut ctx);
                trace!(?step, ?result, "step");
                current.step = step.next();
                if result != Ok(Transition::Continue) {
                    break result;
                }
            }
        };

        if *canceled {
            pka.abort();
            outcome = Err(Error::Canceled);
        }

        let status = match outcome {
            Ok(Transition::Suspend) => {
                pka.enable_interrupt();
                return None;
            }
            Ok(Transition::Continue | Transition::Done) => Ok(()),
            Err(error) => Err(error),
        };

        self.finish(status)
    }

    /// Cancel the operation in flight.
    ///
    /// The cancellation is observed at the next step boundary, which is
    /// forced right away by running the interrupt path. Fails if no
    /// operation is in flight.
    pub fn cancel(&mut self) -> Result<Completion> {
        if self.in_flight.is_none() {
            return Err(Error::Failed);
        }

        warn!("canceling operation");
        self.canceled = true;
        self.pka.enable_interrupt();
        self.on_interrupt().ok_or(Error::Failed)
    }

    fn finish(&mut self, status: Result<()>) -> Option<Completion> {
        let InFlight { operation, .. } = self.in_flight.take()?;
        self.canceled = false;

        self.pka.disable_interrupt();
        self.pka.clear_interrupt();
        self.pka.clear_ram();
        self.scratch.zeroize();
        self.resolver.zeroize();
        self.pka.release_power();

        match &status {
            Ok(()) => debug!(kind = ?operation.kind(), "operation complete"),
            Err(error) => debug!(kind = ?operation.kind(), %error, "operation failed"),
        }
        Some(Completion::finished(operation, status))
    }
}

#[cfg(all(test, feature = "soft-pka"))]
mod tests {
    use super::Engine;
    use crate::pka::Pka;
    use crate::{
        Error, GenerateZkp, KeyMaterial, MemoryKeyStore, NIST_P256, OperationKind, SoftPka,
    };

    fn proof() -> GenerateZkp {
        GenerateZkp::new(
            &NIST_P256,
            KeyMaterial::plaintext([0x11; 32]),
            KeyMaterial::plaintext([0x22; 32]),
            [0x33; 32],
        )
    }

    #[test]
    fn interrupt_while_idle_is_ignored() {
        let mut engine = Engine::new(SoftPka::new(), MemoryKeyStore::new());
        assert!(engine.on_interrupt().is_none());
        assert_eq!(engine.cancel().unwrap_err(), Error::Failed);
    }

    #[test]
    fn start_arms_the_interrupt() {
        let mut engine = Engine::new(SoftPka::new().with_latency(1), MemoryKeyStore::new());
        engine.start(proof().into()).unwrap();
        assert!(engine.is_busy());
        assert!(engine.pka().interrupt_enabled());
        assert_eq!(engine.pka().power_holds(), 1);

        let completion = loop {
            if engine.pka().interrupt_pending() {
                if let Some(completion) = engine.on_interrupt() {
                    break completion;
                }
            }
        };
        assert_eq!(completion.kind, OperationKind::GenerateZkp);
        assert!(!completion.is_pending());

        let proof: GenerateZkp = completion.into_output().unwrap();
        assert_eq!(proof.r.len(), 32);
        assert!(!engine.is_busy());
        assert_eq!(engine.pka().power_holds(), 0);
    }

    #[test]
    fn cancel_before_first_step() {
        let mut engine = Engine::new(SoftPka::new(), MemoryKeyStore::new());
        engine.start(proof().into()).unwrap();

        let completion = engine.cancel().unwrap();
        assert_eq!(completion.status, Err(Error::Canceled));
        assert!(completion.operation.is_some());
        assert_eq!(engine.pka().aborts(), 1);
        assert!(engine.on_interrupt().is_none());
    }
}
