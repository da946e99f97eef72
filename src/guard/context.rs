//! Execution-context identity for [`CallGuard`](super::CallGuard).
//!
//! A [`CallContext`] names one logical call chain. Clones share the identity,
//! so passing `cx.clone()` down a recursive chain keeps every frame on the
//! same history. Independent work (a spawned task, a second request) takes a
//! [`CallContext::fork`] or a fresh [`CallContext::new`].

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identity of one execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(Uuid);

impl ContextId {
    fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Handle threaded explicitly through guarded calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    id: ContextId,
    parent: Option<ContextId>,
}

impl CallContext {
    pub fn new() -> Self {
        Self { id: ContextId::fresh(), parent: None }
    }

    /// A new, independent context remembering where it was forked from.
    /// The child never shares history with `self`.
    pub fn fork(&self) -> Self {
        Self { id: ContextId::fresh(), parent: Some(self.id) }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn parent(&self) -> Option<ContextId> {
        self.parent
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new()
    }
}
