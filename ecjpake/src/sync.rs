//! Driver front end with the three completion disciplines.

use crate::{
    Completion, ComputeSharedSecret, Engine, Error, GenerateZkp, KeyStore, NoKeyStore, Operation,
    Pka, Result, RoundOneGenerateKeys, RoundTwoGenerateKeys, VerifyZkp,
};
use alloc::{boxed::Box, collections::VecDeque};
use core::{fmt, time::Duration};
use tracing::{debug, warn};

/// How an entry point reports completion.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReturnBehavior {
    /// Return right away; the outcome is delivered to the registered
    /// callback from [`Ecjpake::on_interrupt`].
    Callback,

    /// Sleep on the accelerator interrupt until the operation completes.
    #[default]
    Blocking,

    /// Spin on the accelerator interrupt until the operation completes.
    Polling,
}

/// Completion callback.
///
/// Receives the front end itself so that the next operation of the
/// handshake can be submitted from within the callback.
pub type Callback<P, K = NoKeyStore> = Box<dyn FnMut(&mut Ecjpake<P, K>, Completion) + Send>;

/// Construction parameters.
pub struct Params<P, K = NoKeyStore> {
    /// Completion discipline.
    pub return_behavior: ReturnBehavior,

    /// Callback invoked on completion in [`ReturnBehavior::Callback`] mode.
    pub callback: Option<Callback<P, K>>,

    /// Upper bound on each wait in [`ReturnBehavior::Blocking`] mode. The
    /// operation is canceled when a wait expires.
    pub timeout: Option<Duration>,
}

impl<P, K> Params<P, K> {
    /// Blocking parameters with an optional timeout.
    pub fn blocking(timeout: Option<Duration>) -> Self {
        Self {
            return_behavior: ReturnBehavior::Blocking,
            callback: None,
            timeout,
        }
    }

    /// Polling parameters.
    pub fn polling() -> Self {
        Self {
            return_behavior: ReturnBehavior::Polling,
            ..Self::default()
        }
    }

    /// Callback parameters.
    pub fn callback<F>(callback: F) -> Self
    where
        F: FnMut(&mut Ecjpake<P, K>, Completion) + Send + 'static,
    {
        Self {
            return_behavior: ReturnBehavior::Callback,
            callback: Some(Box::new(callback)),
            timeout: None,
        }
    }
}

impl<P, K> Default for Params<P, K> {
    fn default() -> Self {
        Self::blocking(None)
    }
}

impl<P, K> fmt::Debug for Params<P, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Params")
            .field("return_behavior", &self.return_behavior)
            .field("callback", &self.callback.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// EC-JPAKE driver instance bound to one accelerator.
///
/// Only one operation runs at a time. Submitting while another operation is
/// in flight fails with [`Error::ResourceUnavailable`] and leaves the running
/// operation untouched.
///
/// In callback mode the platform must call [`Ecjpake::on_interrupt`] from its
/// accelerator interrupt vector. The callback must not call
/// [`Ecjpake::on_interrupt`] itself. Completions produced while the callback
/// runs, such as a cancel issued from within it, are delivered once it
/// returns.
pub struct Ecjpake<P, K = NoKeyStore> {
    engine: Engine<P, K>,
    return_behavior: ReturnBehavior,
    callback: Option<Callback<P, K>>,
    deferred: VecDeque<Completion>,
    timeout: Option<Duration>,
}

impl<P: Pka, K: KeyStore> Ecjpake<P, K> {
    /// Open a driver instance.
    ///
    /// Fails if callback mode is requested without a callback.
    pub fn new(pka: P, key_store: K, params: Params<P, K>) -> Result<Self> {
        let Params {
            return_behavior,
            callback,
            timeout,
        } = params;

        if return_behavior == ReturnBehavior::Callback && callback.is_none() {
            warn!("callback mode requested without a callback");
            return Err(Error::Failed);
        }

        debug!(?return_behavior, "opened");
        Ok(Self {
            engine: Engine::new(pka, key_store),
            return_behavior,
            callback,
            deferred: VecDeque::new(),
            timeout,
        })
    }

    /// Generate the four round one public keys.
    pub fn round_one_generate_keys(&mut self, op: RoundOneGenerateKeys) -> Completion {
        self.dispatch(op.into())
    }

    /// Generate a Schnorr proof.
    pub fn generate_zkp(&mut self, op: GenerateZkp) -> Completion {
        self.dispatch(op.into())
    }

    /// Verify a peer's Schnorr proof.
    pub fn verify_zkp(&mut self, op: VerifyZkp) -> Completion {
        self.dispatch(op.into())
    }

    /// Generate the round two combined keys and generators.
    pub fn round_two_generate_keys(&mut self, op: RoundTwoGenerateKeys) -> Completion {
        self.dispatch(op.into())
    }

    /// Compute the shared secret point.
    pub fn compute_shared_secret(&mut self, op: ComputeSharedSecret) -> Completion {
        self.dispatch(op.into())
    }

    /// Cancel the operation in flight.
    ///
    /// The operation completes with [`Error::Canceled`], delivered to the
    /// callback in callback mode. Fails if no operation is in flight.
    pub fn cancel_operation(&mut self) -> Result<()> {
        let completion = self.engine.cancel()?;
        match self.return_behavior {
            ReturnBehavior::Callback => self.notify(completion),
            _ => debug!(kind = ?completion.kind, "canceled"),
        }
        Ok(())
    }

    /// Accelerator interrupt entry point for callback mode.
    pub fn on_interrupt(&mut self) {
        if let Some(completion) = self.engine.on_interrupt() {
            self.notify(completion);
        }
    }

    /// Is an operation in flight?
    pub fn is_busy(&self) -> bool {
        self.engine.is_busy()
    }

    /// Completion discipline of this instance.
    pub fn return_behavior(&self) -> ReturnBehavior {
        self.return_behavior
    }

    /// The accelerator.
    pub fn pka(&self) -> &P {
        self.engine.pka()
    }

    /// The key store.
    pub fn key_store(&self) -> &K {
        self.engine.key_store()
    }

    /// The key store, mutably.
    pub fn key_store_mut(&mut self) -> &mut K {
        self.engine.key_store_mut()
    }

    /// Close the instance, canceling any operation in flight, and release
    /// the accelerator and the key store.
    pub fn close(mut self) -> (P, K) {
        if self.is_busy() {
            let _ = self.cancel_operation();
        }
        debug!("closed");
        self.engine.into_parts()
    }

    fn dispatch(&mut self, operation: Operation) -> Completion {
        let kind = operation.kind();
        if let Err(rejected) = self.engine.start(operation) {
            return rejected;
        }

        match self.return_behavior {
            ReturnBehavior::Callback => Completion::pending(kind),
            ReturnBehavior::Polling => loop {
                if self.engine.pka().interrupt_pending() {
                    if let Some(completion) = self.engine.on_interrupt() {
                        break completion;
                    }
                } else {
                    core::hint::spin_loop();
                }
            },
            ReturnBehavior::Blocking => loop {
                if !self.engine.pka_mut().wait_for_interrupt(self.timeout) {
                    warn!(?kind, "timed out waiting for accelerator");
                    break self.engine.cancel().unwrap_or_else(|error| Completion {
                        kind,
                        status: Err(error),
                        operation: None,
                    });
                }
                if let Some(completion) = self.engine.on_interrupt() {
                    break completion;
                }
            },
        }
    }

    fn notify(&mut self, completion: Completion) {
        if self.return_behavior != ReturnBehavior::Callback {
            warn!(kind = ?completion.kind, "completion without callback");
            return;
        }

        // In callback mode the slot is only empty while the callback runs.
        let Some(mut callback) = self.callback.take() else {
            debug!(kind = ?completion.kind, "completion deferred");
            self.deferred.push_back(completion);
            return;
        };

        let mut next = Some(completion);
        while let Some(completion) = next {
            callback(self, completion);
            next = self.deferred.pop_front();
        }
        self.callback = Some(callback);
    }
}

impl<P, K> fmt::Debug for Ecjpake<P, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ecjpake")
            .field("return_behavior", &self.return_behavior)
            .field("timeout", &self.timeout)
            .field("deferred", &self.deferred.len())
            .finish_non_exhaustive()
    }
}
