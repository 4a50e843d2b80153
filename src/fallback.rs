//! The `Primary → Fallback → Exhausted` state machine of a preview.
//!
//! The chain decides which reference to load next. It never loads anything
//! itself and never returns to `Primary` on its own: only a new reference from
//! the caller does that.

use std::collections::HashMap;

use crate::resources::reference::AssetReference;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChainState {
    Primary,
    Fallback,
    /// Terminal: nothing is retried until the caller asks for another reference.
    Exhausted,
}

/// The one asset to substitute when the requested one fails.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FallbackPolicy {
    fallback: Option<AssetReference>,
}

impl FallbackPolicy {
    pub fn new(fallback: impl Into<AssetReference>) -> Self {
        Self {
            fallback: Some(fallback.into()),
        }
    }

    pub fn none() -> Self {
        Self { fallback: None }
    }

    pub fn fallback(&self) -> Option<&AssetReference> {
        self.fallback.as_ref()
    }
}

#[derive(Clone, Debug)]
pub struct FallbackChain {
    policy: FallbackPolicy,
    requested: Option<AssetReference>,
    state: ChainState,
    // Degraded references keep their state for the lifetime of the chain
    degraded: HashMap<AssetReference, ChainState>,
}

impl FallbackChain {
    pub fn new(policy: FallbackPolicy) -> Self {
        Self {
            policy,
            requested: None,
            state: ChainState::Primary,
            degraded: HashMap::new(),
        }
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    pub fn policy(&self) -> &FallbackPolicy {
        &self.policy
    }

    pub fn requested(&self) -> Option<&AssetReference> {
        self.requested.as_ref()
    }

    /// The reference that should be loaded in the current state, if any.
    pub fn current(&self) -> Option<&AssetReference> {
        match self.state {
            ChainState::Primary => self.requested.as_ref(),
            ChainState::Fallback => self.policy.fallback(),
            ChainState::Exhausted => None,
        }
    }

    /// Switches to a reference requested by the caller.
    ///
    /// Returns `false` when `reference` is already the requested one. A reference
    /// that failed before resumes its recorded state instead of retrying its primary.
    pub fn request(&mut self, reference: AssetReference) -> bool {
        if self.requested.as_ref() == Some(&reference) {
            return false;
        }
        self.state = self
            .degraded
            .get(&reference)
            .copied()
            .unwrap_or(ChainState::Primary);
        self.requested = Some(reference);
        true
    }

    /// Advances the chain after the current reference failed.
    ///
    /// Returns the fallback to try next, or `None` once the chain is exhausted.
    pub fn on_failure(&mut self) -> Option<AssetReference> {
        let requested = self.requested.clone()?;
        let next = match (self.state, self.policy.fallback()) {
            // Retrying the same broken asset would only fail again
            (ChainState::Primary, Some(fallback)) if *fallback != requested => {
                Some(fallback.clone())
            }
            _ => None,
        };
        self.state = match next {
            Some(_) => ChainState::Fallback,
            None => ChainState::Exhausted,
        };
        self.degraded.insert(requested, self.state);
        next
    }
}
