//! Timeline: an ordered composition of tweens placed by position expressions.
//!
//! Authoring goes through [`TimelineMut`], a short-lived handle borrowing the
//! engine, so `add` calls chain and every call resolves its position against
//! entries that already exist.

use std::fmt;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::additive::PropertyKey;
use crate::config::{Defaults, DefaultsParams};
use crate::engine::Engine;
use crate::error::AnimError;
use crate::ids::{ScopeId, TimelineId, TweenId};
use crate::inputs::LoopMode;
use crate::position::{Anchor, EntrySpan, Position, PositionContext};
use crate::properties::Properties;
use crate::targets::{resolve_targets, TargetHandle, Targets};
use crate::tween::{Tween, TweenSpec};
use crate::value::AnimValue;

/// Creation options for a timeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimelineParams {
    #[serde(default)]
    pub defaults: DefaultsParams,
    /// Start playing on the next `update`.
    pub autoplay: bool,
    #[serde(default)]
    pub loop_mode: LoopMode,
    pub speed: f32,
}

impl Default for TimelineParams {
    fn default() -> Self {
        Self {
            defaults: DefaultsParams::default(),
            autoplay: true,
            loop_mode: LoopMode::Once,
            speed: 1.0,
        }
    }
}

impl TimelineParams {
    pub fn paused() -> Self {
        Self {
            autoplay: false,
            ..Self::default()
        }
    }

    pub fn defaults(mut self, defaults: DefaultsParams) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn loop_mode(mut self, mode: LoopMode) -> Self {
        self.loop_mode = mode;
        self
    }

    pub fn speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }
}

#[derive(Debug)]
pub struct Timeline {
    pub id: TimelineId,
    /// Owning scope, if created inside one.
    pub scope: Option<ScopeId>,
    pub(crate) root: Option<TargetHandle>,
    pub(crate) defaults: Defaults,
    entries: Vec<EntrySpan>,
    labels: HashMap<String, f64>,
    tweens: Vec<TweenId>,
    duration: f64,

    // Playback
    /// Last rendered local time.
    pub(crate) time: f64,
    /// Unmapped playback clock.
    pub(crate) clock: f64,
    pub(crate) speed: f32,
    pub(crate) loop_mode: LoopMode,
    pub(crate) playing: bool,
    pub(crate) began: bool,
    pub(crate) completed: bool,
    pub(crate) iteration: u32,
    /// Render on the next update even if paused.
    pub(crate) dirty: bool,
}

impl Timeline {
    pub(crate) fn new(
        id: TimelineId,
        scope: Option<ScopeId>,
        root: Option<TargetHandle>,
        defaults: Defaults,
        params: &TimelineParams,
    ) -> Self {
        Self {
            id,
            scope,
            root,
            defaults,
            entries: Vec::new(),
            labels: HashMap::new(),
            tweens: Vec::new(),
            duration: 0.0,
            time: 0.0,
            clock: 0.0,
            speed: params.speed,
            loop_mode: params.loop_mode,
            playing: params.autoplay,
            began: false,
            completed: false,
            iteration: 0,
            dirty: false,
        }
    }

    /// Furthest tween end, ms.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    #[inline]
    pub fn tweens(&self) -> &[TweenId] {
        &self.tweens
    }

    /// Resolved spans of every `add` call so far, in call order.
    pub fn entries(&self) -> &[EntrySpan] {
        &self.entries
    }

    pub fn label_time(&self, name: &str) -> Option<f64> {
        self.labels.get(name).copied()
    }

    /// Last rendered local time.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    fn context(&self) -> PositionContext<'_> {
        PositionContext {
            previous: self.entries.last().copied(),
            timeline_end: self.duration,
            labels: &self.labels,
        }
    }

    fn resolve_position(&self, position: &Position) -> Result<f64, AnimError> {
        let at = position.parse()?.resolve(&self.context())?;
        if at < 0.0 {
            log::warn!("{}: position {:?} resolved to {at}ms, clamped to 0", self.id, position);
            return Ok(0.0);
        }
        Ok(at)
    }
}

/// Authoring handle returned by `Engine::timeline` and `Ctx::timeline`.
pub struct TimelineMut<'e> {
    pub(crate) engine: &'e mut Engine,
    pub(crate) id: TimelineId,
}

impl fmt::Debug for TimelineMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineMut").field("id", &self.id).finish()
    }
}

impl<'e> TimelineMut<'e> {
    pub fn id(&self) -> TimelineId {
        self.id
    }

    /// Add one tween per (resolved target, property) at `position`.
    pub fn add(
        &mut self,
        targets: impl Into<Targets>,
        props: Properties,
        position: impl Into<Position>,
    ) -> Result<&mut Self, AnimError> {
        self.engine
            .add_entry(self.id, &targets.into(), &props, &position.into())?;
        Ok(self)
    }

    /// `add` at the current timeline end.
    pub fn append(
        &mut self,
        targets: impl Into<Targets>,
        props: Properties,
    ) -> Result<&mut Self, AnimError> {
        self.add(targets, props, Position::End)
    }

    /// Name a point in time for later positions to refer to.
    pub fn label(
        &mut self,
        name: &str,
        position: impl Into<Position>,
    ) -> Result<&mut Self, AnimError> {
        self.engine.add_label(self.id, name, &position.into())?;
        Ok(self)
    }

    pub fn duration(&self) -> f64 {
        self.engine
            .timelines
            .get(&self.id)
            .map_or(0.0, Timeline::duration)
    }
}

/// A validated tween waiting for the whole `add` call to succeed.
struct Staged {
    key: PropertyKey,
    spec: TweenSpec,
}

impl Engine {
    pub(crate) fn create_timeline(
        &mut self,
        params: &TimelineParams,
        scope: Option<ScopeId>,
        root: Option<TargetHandle>,
        inherited: &Defaults,
    ) -> TimelineId {
        let id = self.ids.alloc_timeline();
        let defaults = params.defaults.merge_over(inherited);
        self.timelines
            .insert(id, Timeline::new(id, scope, root, defaults, params));
        log::debug!("{id} created");
        id
    }

    /// Validate and commit one `add` call. Nothing is created on error.
    pub(crate) fn add_entry(
        &mut self,
        id: TimelineId,
        targets: &Targets,
        props: &Properties,
        position: &Position,
    ) -> Result<(), AnimError> {
        let timeline = self
            .timelines
            .get(&id)
            .ok_or(AnimError::UnknownTimeline(id))?;
        let offset = timeline.resolve_position(position)?;
        let defaults = timeline.defaults;
        let ease = match &props.ease {
            Some(spec) => spec.resolve()?,
            None => defaults.ease,
        };
        let root = timeline.root.clone();

        let handles = resolve_targets(self.resolver.as_mut(), root.as_ref(), targets);
        if handles.is_empty() {
            log::warn!("{id}: targets {targets:?} matched nothing");
        }

        let mut staged: Vec<Staged> = Vec::new();
        let mut last_to: HashMap<PropertyKey, AnimValue> = HashMap::new();
        for (index, target) in handles.iter().enumerate() {
            let duration = props
                .duration
                .as_ref()
                .map_or(defaults.duration, |p| p.eval(target, index));
            let delay = props
                .delay
                .as_ref()
                .map_or(defaults.delay, |p| p.eval(target, index));
            for (name, param) in &props.props {
                let key = PropertyKey::new(target.clone(), name.clone());
                let value = param.eval(target, index);
                let to = value.to.parse()?;
                let previous = last_to.get(&key).cloned().or_else(|| {
                    self.registry
                        .last_on(&key)
                        .and_then(|t| self.tweens.get(&t))
                        .map(|t| t.to.clone())
                });
                let from = match (&value.from, &previous) {
                    (Some(raw), _) => raw.parse()?,
                    (None, Some(prev)) => prev.clone(),
                    (None, None) => {
                        return Err(AnimError::MissingFrom {
                            target: target.clone(),
                            property: name.clone(),
                        })
                    }
                };
                let (from, to) = AnimValue::unify(name, from, to)?;
                if let Some(prev) = &previous {
                    if !prev.is_compatible(&to) {
                        return Err(AnimError::ValueMismatch {
                            property: name.clone(),
                            from: prev.to_string(),
                            to: to.to_string(),
                            reason: "cannot chain onto the pair's running value".into(),
                        });
                    }
                }
                last_to.insert(key.clone(), to.clone());
                staged.push(Staged {
                    key,
                    spec: TweenSpec {
                        target: target.clone(),
                        property: name.clone(),
                        from,
                        to,
                        start: offset + delay,
                        duration: duration.max(0.0),
                        ease,
                    },
                });
            }
        }

        let mut span = EntrySpan {
            start: offset,
            end: offset,
        };
        let mut created = Vec::with_capacity(staged.len());
        for (n, Staged { key, spec }) in staged.into_iter().enumerate() {
            let tween_id = self.ids.alloc_tween();
            let tween = Tween::new(tween_id, id, spec)?;
            if n == 0 {
                span = EntrySpan {
                    start: tween.start,
                    end: tween.end(),
                };
            } else {
                span.start = span.start.min(tween.start);
                span.end = span.end.max(tween.end());
            }
            if self.registry.register(key.clone(), tween_id) {
                log::trace!(
                    "{tween_id} chained on {}.{} ({} links)",
                    key.target,
                    key.property,
                    self.registry.chain(&key).map_or(0, <[TweenId]>::len)
                );
            }
            self.tweens.insert(tween_id, tween);
            created.push(tween_id);
        }

        if let Some(timeline) = self.timelines.get_mut(&id) {
            timeline.entries.push(span);
            timeline.duration = timeline.duration.max(span.end);
            timeline.tweens.extend(created);
        }
        Ok(())
    }

    pub(crate) fn add_label(
        &mut self,
        id: TimelineId,
        name: &str,
        position: &Position,
    ) -> Result<(), AnimError> {
        let valid = matches!(
            Position::from(name).parse(),
            Ok(p) if p.offset == 0.0 && p.anchor == Anchor::Label(name.to_string())
        );
        if !valid {
            return Err(AnimError::InvalidPosition {
                expr: name.to_string(),
                reason: "not a valid label name".into(),
            });
        }
        let timeline = self
            .timelines
            .get_mut(&id)
            .ok_or(AnimError::UnknownTimeline(id))?;
        let at = timeline.resolve_position(position)?;
        timeline.labels.insert(name.to_string(), at);
        Ok(())
    }

    /// Remove a timeline and unlink its tweens from every chain.
    pub(crate) fn destroy_timeline(&mut self, id: TimelineId) -> bool {
        let Some(timeline) = self.timelines.shift_remove(&id) else {
            return false;
        };
        for tween_id in &timeline.tweens {
            let Some(tween) = self.tweens.remove(tween_id) else {
                continue;
            };
            let key = PropertyKey::new(tween.target, tween.property);
            if self.registry.unlink(&key, *tween_id) {
                self.queue_event(crate::outputs::CoreEvent::PropertyReleased {
                    target: key.target,
                    property: key.property,
                });
            }
        }
        self.queue_event(crate::outputs::CoreEvent::TimelineReverted { timeline: id });
        log::debug!("{id} reverted ({} tweens)", timeline.tweens.len());
        true
    }
}
