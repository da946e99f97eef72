//! Call-history loop guard.
//!
//! A [`CallGuard`] tracks, per [`CallContext`], the signatures of calls that
//! are currently in flight for one wrapped async function. Entering with a
//! signature that is already in flight on the same context means the
//! function re-entered itself without any change in its inputs, so the guard
//! empties that context's history and fails with
//! [`AppError::LoopDetected`].
//!
//! Two entry points:
//! - [`CallGuard::invoke`] guards an arbitrary future under an argument value.
//! - [`GuardedFn`] owns the wrapped function next to its guard and exposes a
//!   single [`GuardedFn::call`].
//!
//! Bookkeeping runs under a short lock on either side of the wrapped future's
//! `.await`; the lock is never held while the wrapped function runs.
//!
//! # Failure path
//!
//! On success the signature is removed. On `Err` the outcome depends on the
//! guard's [`FailurePolicy`]. A call whose future is dropped mid-flight
//! (cancellation, timeout) always leaves its signature recorded until a trip
//! or [`CallGuard::reset`] clears the context.

pub mod context;
pub mod signature;

pub use context::{CallContext, ContextId};
pub use signature::CallSignature;

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::AppError;
use crate::settings::Settings;

/// What happens to a call's signature when the wrapped function returns `Err`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Keep the signature recorded: an identical retry on the same context is
    /// reported as a loop until the context is tripped or reset.
    #[default]
    Retain,
    /// Remove the signature before propagating the error, same as success.
    Release,
}

type History = HashMap<ContextId, HashSet<CallSignature>>;

/// Per-function loop detector.
pub struct CallGuard {
    name: String,
    policy: FailurePolicy,
    history: Mutex<History>,
}

impl CallGuard {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_policy(name, FailurePolicy::default())
    }

    pub fn with_policy(name: impl Into<String>, policy: FailurePolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            history: Mutex::new(HashMap::new()),
        }
    }

    /// A guard using the `[guard] failure_policy` from loaded settings.
    pub fn from_settings(name: impl Into<String>, settings: &Settings) -> Self {
        Self::with_policy(name, settings.failure_policy)
    }

    /// Name of the guarded function, as reported in loop errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Run `call` as an invocation with arguments `args` on context `cx`.
    ///
    /// `call` must not have been polled yet; it is awaited only after the
    /// signature has been recorded.
    ///
    /// `args` is compared by its serde encoding. Map keys are sorted, but
    /// sequences keep their order, so a `HashSet` rebuilt with the same
    /// members can encode differently and slip past detection. Pass sets as
    /// a `BTreeSet` or sorted `Vec`.
    pub async fn invoke<A, Fut, T, E>(&self, cx: &CallContext, args: &A, call: Fut) -> Result<T, E>
    where
        A: Serialize + ?Sized,
        Fut: Future<Output = Result<T, E>>,
        E: From<AppError>,
    {
        let signature = CallSignature::of(args)?;
        self.run(cx, signature, || call).await
    }

    /// Forget every in-flight signature recorded for `cx`.
    pub fn reset(&self, cx: &CallContext) -> Result<(), AppError> {
        if let Some(in_flight) = self.lock()?.get_mut(&cx.id()) {
            in_flight.clear();
        }
        Ok(())
    }

    /// Number of signatures currently recorded for `cx`.
    pub fn in_flight(&self, cx: &CallContext) -> Result<usize, AppError> {
        Ok(self.lock()?.get(&cx.id()).map_or(0, HashSet::len))
    }

    /// Number of contexts that have ever called through this guard.
    pub fn contexts(&self) -> Result<usize, AppError> {
        Ok(self.lock()?.len())
    }

    async fn run<F, Fut, T, E>(&self, cx: &CallContext, signature: CallSignature, start: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<AppError>,
    {
        let id = cx.id();
        self.enter(id, &signature)?;
        trace!(function = %self.name, context = %id, inputs = %signature, "guarded call entered");

        let result = start().await;

        match (&result, self.policy) {
            (Ok(_), _) | (Err(_), FailurePolicy::Release) => {
                self.leave(id, &signature)?;
                trace!(function = %self.name, context = %id, "guarded call left");
            }
            (Err(_), FailurePolicy::Retain) => {
                debug!(
                    function = %self.name,
                    context = %id,
                    inputs = %signature,
                    "guarded call failed; signature retained"
                );
            }
        }
        result
    }

    fn enter(&self, id: ContextId, signature: &CallSignature) -> Result<(), AppError> {
        let mut history = self.lock()?;
        let in_flight = history.entry(id).or_default();
        if in_flight.contains(signature) {
            in_flight.clear();
            warn!(function = %self.name, context = %id, inputs = %signature, "infinite loop detected");
            return Err(AppError::LoopDetected {
                function: self.name.clone(),
                inputs: signature.to_string(),
            });
        }
        in_flight.insert(signature.clone());
        Ok(())
    }

    fn leave(&self, id: ContextId, signature: &CallSignature) -> Result<(), AppError> {
        // The entry may already be gone if a nested call tripped and cleared it.
        if let Some(in_flight) = self.lock()?.get_mut(&id) {
            in_flight.remove(signature);
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, History>, AppError> {
        self.history
            .lock()
            .map_err(|_| AppError::State(format!("call guard '{}' lock poisoned", self.name)))
    }
}

impl std::fmt::Debug for CallGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallGuard")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// A wrapped async function together with its guard.
///
/// `f` receives the caller's context so it can pass it on to nested guarded
/// calls; that is what ties a recursive chain to one history.
pub struct GuardedFn<F> {
    guard: CallGuard,
    f: F,
}

impl<F> GuardedFn<F> {
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self { guard: CallGuard::new(name), f }
    }

    pub fn with_policy(name: impl Into<String>, policy: FailurePolicy, f: F) -> Self {
        Self { guard: CallGuard::with_policy(name, policy), f }
    }

    pub fn from_settings(name: impl Into<String>, settings: &Settings, f: F) -> Self {
        Self { guard: CallGuard::from_settings(name, settings), f }
    }

    pub fn guard(&self) -> &CallGuard {
        &self.guard
    }

    /// Call the wrapped function through the guard. `args` is signed the same
    /// way as in [`CallGuard::invoke`]; set-valued arguments must be ordered.
    pub async fn call<A, Fut, T, E>(&self, cx: &CallContext, args: A) -> Result<T, E>
    where
        F: Fn(CallContext, A) -> Fut,
        A: Serialize,
        Fut: Future<Output = Result<T, E>>,
        E: From<AppError>,
    {
        let signature = CallSignature::of(&args)?;
        self.guard.run(cx, signature, || (self.f)(cx.clone(), args)).await
    }
}
