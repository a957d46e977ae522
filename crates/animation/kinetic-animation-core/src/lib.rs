//! Kinetic Animation Core (host-agnostic)
//!
//! Declarative timeline animation engine: scopes own timelines, timelines
//! place tweens with position expressions, and an additive registry blends
//! tweens that overlap on the same target property. The host drives time via
//! `Engine::update` and applies the returned `Outputs` to its own rendering.

pub mod additive;
pub mod config;
pub mod easing;
pub mod engine;
pub mod error;
pub mod ids;
pub mod inputs;
pub mod interp;
pub mod media;
pub mod outputs;
pub mod position;
pub mod properties;
pub mod render;
pub mod scope;
pub mod targets;
pub mod timeline;
pub mod tween;
pub mod value;

// Re-exports for consumers (composition layer, adapters)
pub use additive::{AdditiveAnimation, AdditiveRegistry, PropertyKey};
pub use config::{Config, Defaults, DefaultsParams};
pub use easing::{Curve, Ease, EaseMode};
pub use engine::Engine;
pub use error::AnimError;
pub use ids::{IdAllocator, ScopeId, TimelineId, TweenId};
pub use inputs::{Inputs, LoopMode, TimelineCommand};
pub use media::{MediaEnvironment, MediaQuery};
pub use outputs::{Change, CoreEvent, Outputs};
pub use position::{EntrySpan, Position};
pub use properties::{stagger, EaseSpec, Param, PropValue, Properties};
pub use render::TickMode;
pub use scope::{
    teardown, Constructor, Ctx, Method, Revertible, Scope, ScopeParams, Teardown,
};
pub use targets::{resolve_targets, SelectorTable, TargetHandle, TargetResolver, Targets};
pub use timeline::{Timeline, TimelineMut, TimelineParams};
pub use tween::{Tween, TweenSpec, TweenState};
pub use value::{AnimValue, RawValue, ValueKind};
