//! Authentication gate.
//!
//! One gate exists per backend wrapper. It starts pending, and is resolved
//! with credentials or rejected exactly once; later attempts to settle it
//! are ignored. Every operation suspends on the gate before touching the
//! provider, so concurrent callers arriving before resolution all wait on
//! the same state and are released together.

use tokio::sync::watch;
use verso_core::{Credentials, Error, ErrorKind, Result};

use crate::TRACING_TARGET;

#[derive(Debug, Clone)]
enum AuthOutcome {
    Granted(Credentials),
    Denied { kind: ErrorKind, message: String },
}

/// Single-shot authentication state shared by all operations of one wrapper.
#[derive(Debug)]
pub struct AuthGate {
    tx: watch::Sender<Option<AuthOutcome>>,
}

impl AuthGate {
    /// Creates a pending gate.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Returns true once the gate has been resolved or rejected.
    pub fn is_settled(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Resolves the gate with credentials.
    ///
    /// Returns false if the gate was already settled; the existing outcome
    /// is kept.
    pub fn resolve(&self, credentials: Credentials) -> bool {
        self.settle(AuthOutcome::Granted(credentials))
    }

    /// Rejects the gate with an authentication failure.
    ///
    /// Returns false if the gate was already settled.
    pub fn reject(&self, error: &Error) -> bool {
        self.settle(AuthOutcome::Denied {
            kind: error.kind(),
            message: error.to_string(),
        })
    }

    fn settle(&self, outcome: AuthOutcome) -> bool {
        let mut settled = false;
        self.tx.send_modify(|state| {
            if state.is_none() {
                *state = Some(outcome);
                settled = true;
            }
        });
        if !settled {
            tracing::debug!(
                target: TRACING_TARGET,
                "Authentication gate already settled, ignoring"
            );
        }
        settled
    }

    /// Waits for the gate to settle and returns the session credentials.
    pub async fn credentials(&self) -> Result<Credentials> {
        let mut rx = self.tx.subscribe();
        loop {
            let outcome = rx.borrow_and_update().clone();
            match outcome {
                Some(AuthOutcome::Granted(credentials)) => return Ok(credentials),
                Some(AuthOutcome::Denied { kind, message }) => {
                    return Err(Error::new(kind).with_message(message));
                }
                None => {
                    if rx.changed().await.is_err() {
                        return Err(Error::authentication()
                            .with_message("authentication gate dropped before settling"));
                    }
                }
            }
        }
    }
}

impl Default for AuthGate {
    fn default() -> Self {
        Self::new()
    }
}
