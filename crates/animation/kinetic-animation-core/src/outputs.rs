//! Output contracts from the core engine.
//!
//! Outputs carry the computed value of every animated (target, property) for
//! this tick plus a separate list of semantic events. The composition layer
//! turns changes into style attributes; the engine never touches rendering.

use serde::{Deserialize, Serialize};

use crate::ids::{ScopeId, TimelineId};
use crate::targets::TargetHandle;
use crate::value::AnimValue;

/// One computed property value this tick.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Change {
    /// Timeline of the tween that produced the value.
    pub timeline: TimelineId,
    pub target: TargetHandle,
    pub property: String,
    pub value: AnimValue,
}

/// Discrete semantic signals emitted during stepping and lifecycle calls.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[non_exhaustive]
pub enum CoreEvent {
    TimelineBegan {
        timeline: TimelineId,
    },
    TimelineLooped {
        timeline: TimelineId,
        iteration: u32,
    },
    TimelineCompleted {
        timeline: TimelineId,
    },
    TimelineReverted {
        timeline: TimelineId,
    },
    ScopeRefreshed {
        scope: ScopeId,
    },
    ScopeReverted {
        scope: ScopeId,
    },
    /// No tween animates this pair anymore; the host may restore its base style.
    PropertyReleased {
        target: TargetHandle,
        property: String,
    },
}

/// Outputs returned by `Engine::update()` and `Engine::tick_timeline()`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default)]
    pub events: Vec<CoreEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.changes.clear();
        self.events.clear();
    }

    #[inline]
    pub fn push_change(&mut self, change: Change) {
        self.changes.push(change);
    }

    #[inline]
    pub fn push_event(&mut self, event: CoreEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.events.is_empty()
    }

    /// Computed value for one pair, if it was emitted this tick.
    pub fn value_of(&self, target: &str, property: &str) -> Option<&AnimValue> {
        self.changes
            .iter()
            .find(|c| c.target == target && c.property == property)
            .map(|c| &c.value)
    }
}
