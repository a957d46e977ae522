//! Tween: one property of one target interpolated over a time span.
//!
//! Rendering is a pure function of the timeline-local time, so rendering the
//! same time twice yields identical numbers. The additive pass may afterwards
//! rebase a tween's endpoints for the current tick only.

use serde::{Deserialize, Serialize};

use crate::easing::Ease;
use crate::error::AnimError;
use crate::ids::{TimelineId, TweenId};
use crate::interp::functions::lerp_numbers;
use crate::targets::TargetHandle;
use crate::value::AnimValue;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TweenState {
    /// Local time is before the tween's start.
    Pending,
    Running,
    Completed,
}

#[derive(Clone, Debug)]
pub struct Tween {
    pub id: TweenId,
    pub timeline: TimelineId,
    pub target: TargetHandle,
    pub property: String,
    /// Authored start value.
    pub from: AnimValue,
    /// Authored end value.
    pub to: AnimValue,
    /// Timeline-local start (entry offset + delay), ms.
    pub start: f64,
    /// ms; 0 snaps to `to` once `start` is reached.
    pub duration: f64,
    pub ease: Ease,

    from_numbers: Vec<f32>,
    to_numbers: Vec<f32>,
    delta: Vec<f32>,
    effective: Option<(Vec<f32>, Vec<f32>)>,
    numbers: Vec<f32>,
    state: TweenState,
    eased: f32,
    rendered_at: Option<f64>,
}

/// Construction parameters for [`Tween::new`].
#[derive(Clone, Debug)]
pub struct TweenSpec {
    pub target: TargetHandle,
    pub property: String,
    pub from: AnimValue,
    pub to: AnimValue,
    pub start: f64,
    pub duration: f64,
    pub ease: Ease,
}

impl Tween {
    /// Validate endpoints and build a pending tween showing its `from` value.
    pub fn new(id: TweenId, timeline: TimelineId, spec: TweenSpec) -> Result<Self, AnimError> {
        let (from, to) = AnimValue::unify(&spec.property, spec.from, spec.to)?;
        let from_numbers = from.numbers();
        let to_numbers = to.numbers();
        let delta = to_numbers
            .iter()
            .zip(&from_numbers)
            .map(|(b, a)| b - a)
            .collect();
        Ok(Self {
            id,
            timeline,
            target: spec.target,
            property: spec.property,
            numbers: from_numbers.clone(),
            from,
            to,
            start: spec.start,
            duration: spec.duration.max(0.0),
            ease: spec.ease,
            from_numbers,
            to_numbers,
            delta,
            effective: None,
            state: TweenState::Pending,
            eased: 0.0,
            rendered_at: None,
        })
    }

    #[inline]
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    #[inline]
    pub fn state(&self) -> TweenState {
        self.state
    }

    /// Eased progress in [0, 1] as of the last render.
    #[inline]
    pub fn progress(&self) -> f32 {
        self.eased
    }

    /// Current numeric components.
    #[inline]
    pub fn numbers(&self) -> &[f32] {
        &self.numbers
    }

    /// Authored `to - from`, per component.
    #[inline]
    pub fn delta(&self) -> &[f32] {
        &self.delta
    }

    /// Rebased endpoints set by the additive pass this tick, if any.
    pub fn effective(&self) -> Option<(&[f32], &[f32])> {
        self.effective
            .as_ref()
            .map(|(f, t)| (f.as_slice(), t.as_slice()))
    }

    /// Current value in the authored shape.
    pub fn value(&self) -> AnimValue {
        self.to.with_numbers(&self.numbers)
    }

    pub(crate) fn rendered_at(&self) -> Option<f64> {
        self.rendered_at
    }

    /// State and raw progress at `time` without mutating anything.
    pub fn state_at(&self, time: f64) -> (TweenState, f32) {
        if time < self.start {
            return (TweenState::Pending, 0.0);
        }
        if self.duration <= 0.0 {
            return (TweenState::Completed, 1.0);
        }
        let p = (time - self.start) / self.duration;
        if p >= 1.0 {
            (TweenState::Completed, 1.0)
        } else {
            (TweenState::Running, p as f32)
        }
    }

    /// Plain render from authored endpoints at timeline-local `time`.
    pub(crate) fn render(&mut self, time: f64) {
        let (state, raw) = self.state_at(time);
        self.state = state;
        self.eased = self.ease.apply(raw);
        self.rendered_at = Some(time);
        self.restore_plain();
    }

    /// Drop any rebased endpoints and recompute numbers from the cached progress.
    pub(crate) fn restore_plain(&mut self) {
        self.effective = None;
        lerp_numbers(&self.from_numbers, &self.to_numbers, self.eased, &mut self.numbers);
    }

    /// Rebase onto `base` (from = base, to = base + delta) and re-render.
    pub(crate) fn render_effective(&mut self, base: Vec<f32>) {
        let to: Vec<f32> = base.iter().zip(&self.delta).map(|(b, d)| b + d).collect();
        lerp_numbers(&base, &to, self.eased, &mut self.numbers);
        self.effective = Some((base, to));
    }
}
