//! Engine: data ownership and the public API.
//!
//! Methods:
//! - new, create_scope / execute / refresh / revert (scope.rs), timeline
//! - update(dt, inputs): apply commands, advance clocks, render timelines,
//!   additive recomputation, collect changes
//! - tick_timeline(id, time, mode): explicit render of one timeline
//! - queries used by the composition layer (value, computed, chain, ...)

use hashbrown::HashMap;
use indexmap::IndexMap;

use crate::additive::{AdditiveRegistry, PropertyKey};
use crate::config::Config;
use crate::error::AnimError;
use crate::ids::{IdAllocator, ScopeId, TimelineId, TweenId};
use crate::inputs::{Inputs, LoopMode, TimelineCommand};
use crate::media::MediaEnvironment;
use crate::outputs::{Change, CoreEvent, Outputs};
use crate::render::{self, TickMode};
use crate::scope::{Revertible, Scope};
use crate::targets::TargetResolver;
use crate::timeline::{Timeline, TimelineMut, TimelineParams};
use crate::tween::Tween;
use crate::value::AnimValue;

/// Top-level scheduler owning every scope, timeline and tween.
pub struct Engine {
    // Owned data
    pub(crate) cfg: Config,
    pub(crate) ids: IdAllocator,
    pub(crate) scopes: HashMap<ScopeId, Scope>,
    pub(crate) timelines: IndexMap<TimelineId, Timeline>,
    pub(crate) tweens: HashMap<TweenId, Tween>,

    // Systems
    pub(crate) resolver: Box<dyn TargetResolver>,
    pub(crate) registry: AdditiveRegistry,
    pub(crate) media: MediaEnvironment,
    /// Scopes of the running `execute` calls, innermost last.
    pub(crate) active: Vec<ScopeId>,

    // Per-tick outputs
    outputs: Outputs,
    /// Lifecycle events raised between ticks; emitted with the next outputs.
    pending: Vec<CoreEvent>,
}

fn fmod(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        return 0.0;
    }
    let m = a % b;
    if (m < 0.0 && b > 0.0) || (m > 0.0 && b < 0.0) {
        m + b
    } else {
        m
    }
}

/// Reflect t into [0, span] with ping-pong behavior, where period = 2 * span.
fn ping_pong(t: f64, span: f64) -> f64 {
    if span <= 0.0 {
        return 0.0;
    }
    let period = 2.0 * span;
    let m = fmod(t, period);
    if m <= span {
        m
    } else {
        period - m
    }
}

/// Map a playback clock onto timeline-local time.
fn local_time(clock: f64, duration: f64, mode: LoopMode) -> f64 {
    if duration <= 0.0 {
        return 0.0;
    }
    match mode {
        LoopMode::Once => clock.clamp(0.0, duration),
        LoopMode::Loop => fmod(clock, duration),
        LoopMode::PingPong => ping_pong(clock, duration),
    }
}

impl Engine {
    /// Create a new engine with the given config and target resolver.
    pub fn new(cfg: Config, resolver: impl TargetResolver + 'static) -> Self {
        Self {
            media: cfg.media,
            cfg,
            ids: IdAllocator::new(),
            scopes: HashMap::new(),
            timelines: IndexMap::new(),
            tweens: HashMap::new(),
            resolver: Box::new(resolver),
            registry: AdditiveRegistry::new(),
            active: Vec::new(),
            outputs: Outputs::default(),
            pending: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// New timeline. Inside a running `execute` it is owned by the active
    /// scope; otherwise it is free-standing with the global defaults.
    pub fn timeline(&mut self, params: TimelineParams) -> TimelineMut<'_> {
        let (owner, root, defaults) = self.creation_context();
        let id = self.create_timeline(&params, owner, root, &defaults);
        self.track(owner, Revertible::Timeline(id));
        TimelineMut { engine: self, id }
    }

    /// Authoring handle for an existing timeline.
    pub fn timeline_mut(&mut self, id: TimelineId) -> Result<TimelineMut<'_>, AnimError> {
        if !self.timelines.contains_key(&id) {
            return Err(AnimError::UnknownTimeline(id));
        }
        Ok(TimelineMut { engine: self, id })
    }

    pub fn get_timeline(&self, id: TimelineId) -> Option<&Timeline> {
        self.timelines.get(&id)
    }

    /// Remove a timeline and its tweens from every additive chain.
    /// Returns false if it did not exist.
    pub fn revert_timeline(&mut self, id: TimelineId) -> bool {
        let owner = self.timelines.get(&id).and_then(|t| t.scope);
        if !self.destroy_timeline(id) {
            return false;
        }
        if let Some(scope) = owner.and_then(|s| self.scopes.get_mut(&s)) {
            scope.forget(Revertible::Timeline(id));
        }
        self.registry.release_if_idle(self.scopes.len());
        true
    }

    pub(crate) fn queue_event(&mut self, event: CoreEvent) {
        self.pending.push(event);
    }

    /// Apply timeline commands (unknown timelines are ignored).
    fn apply_inputs(&mut self, inputs: Inputs) {
        for cmd in inputs.commands {
            let id = cmd.timeline();
            let Some(tl) = self.timelines.get_mut(&id) else {
                log::warn!("command for unknown {id} ignored");
                continue;
            };
            match cmd {
                TimelineCommand::Play { .. } => {
                    if tl.completed && tl.loop_mode == LoopMode::Once {
                        tl.clock = 0.0;
                        tl.completed = false;
                        tl.began = false;
                    }
                    tl.playing = true;
                }
                TimelineCommand::Pause { .. } => {
                    tl.playing = false;
                }
                TimelineCommand::Stop { .. } => {
                    tl.playing = false;
                    tl.clock = 0.0;
                    tl.began = false;
                    tl.completed = false;
                    tl.iteration = 0;
                    tl.dirty = true;
                }
                TimelineCommand::Restart { .. } => {
                    tl.playing = true;
                    tl.clock = 0.0;
                    tl.began = false;
                    tl.completed = false;
                    tl.iteration = 0;
                    tl.dirty = true;
                }
                TimelineCommand::Seek { time, .. } => {
                    tl.clock = time.max(0.0);
                    if tl.clock < tl.duration() {
                        tl.completed = false;
                    }
                    tl.dirty = true;
                }
                TimelineCommand::SetSpeed { speed, .. } => {
                    tl.speed = speed;
                }
                TimelineCommand::SetLoopMode { mode, .. } => {
                    tl.loop_mode = mode;
                }
                TimelineCommand::Complete { .. } => {
                    tl.clock = tl.duration();
                    tl.playing = false;
                    tl.dirty = true;
                    if !tl.completed {
                        tl.completed = true;
                        self.pending.push(CoreEvent::TimelineCompleted { timeline: id });
                    }
                }
            }
        }
    }

    /// Advance playing timelines by `dt` ms and render them.
    fn advance_timelines(&mut self, dt: f64) {
        for tl in self.timelines.values_mut() {
            if tl.playing {
                tl.clock += dt * f64::from(tl.speed);
                if !tl.began {
                    tl.began = true;
                    self.pending.push(CoreEvent::TimelineBegan { timeline: tl.id });
                }
            } else if !tl.dirty {
                continue;
            }
            let duration = tl.duration();
            match tl.loop_mode {
                LoopMode::Once => {
                    if tl.playing && tl.clock >= duration && !tl.completed {
                        tl.completed = true;
                        tl.playing = false;
                        self.pending
                            .push(CoreEvent::TimelineCompleted { timeline: tl.id });
                    }
                }
                LoopMode::Loop | LoopMode::PingPong => {
                    if duration > 0.0 && tl.clock >= 0.0 {
                        let iteration = (tl.clock / duration).floor() as u32;
                        if iteration > tl.iteration {
                            tl.iteration = iteration;
                            self.pending.push(CoreEvent::TimelineLooped {
                                timeline: tl.id,
                                iteration,
                            });
                        }
                    }
                }
            }
            let time = local_time(tl.clock, duration, tl.loop_mode);
            let mode = if tl.dirty {
                TickMode::Force
            } else {
                TickMode::Auto
            };
            tl.dirty = false;
            render::tick(tl, &mut self.tweens, time, mode);
        }
    }

    /// Flush queued events, run the additive recomputation, then emit one
    /// change per animated pair.
    fn render_pass(&mut self) {
        let cap = self.cfg.max_events_per_tick;
        if self.pending.len() > cap {
            log::warn!(
                "dropping {} events over the per-tick limit of {cap}",
                self.pending.len() - cap
            );
            self.pending.truncate(cap);
        }
        for event in self.pending.drain(..) {
            self.outputs.push_event(event);
        }

        self.registry.update(&mut self.tweens);
        for key in self.registry.keys() {
            let Some(tween) = self
                .registry
                .output_tween(key, &self.tweens)
                .and_then(|id| self.tweens.get(&id))
            else {
                continue;
            };
            self.outputs.push_change(Change {
                timeline: tween.timeline,
                target: key.target.clone(),
                property: key.property.clone(),
                value: tween.value(),
            });
        }
    }

    /// Step every timeline by `dt` ms with the given inputs, producing outputs.
    pub fn update(&mut self, dt: f64, inputs: Inputs) -> &Outputs {
        self.outputs.clear();

        // 1) Apply timeline commands
        self.apply_inputs(inputs);

        // 2) Advance clocks and render timelines
        self.advance_timelines(dt);

        // 3) Additive recomputation and change collection
        self.render_pass();

        &self.outputs
    }

    /// Render one timeline at local `time` under `mode` and collect outputs.
    ///
    /// Does not move the playback clock; the next `update` continues from
    /// wherever the timeline was playing.
    pub fn tick_timeline(
        &mut self,
        id: TimelineId,
        time: f64,
        mode: TickMode,
    ) -> Result<&Outputs, AnimError> {
        let tl = self
            .timelines
            .get_mut(&id)
            .ok_or(AnimError::UnknownTimeline(id))?;
        render::tick(tl, &mut self.tweens, time, mode);
        self.outputs.clear();
        self.render_pass();
        Ok(&self.outputs)
    }

    /// Outputs of the last tick.
    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    /// Current value of one pair.
    pub fn value(&self, target: &str, property: &str) -> Option<AnimValue> {
        let key = PropertyKey::new(target, property);
        self.registry
            .output_tween(&key, &self.tweens)
            .and_then(|id| self.tweens.get(&id))
            .map(Tween::value)
    }

    /// Every animated property of `target`, in first-animated order.
    pub fn computed(&self, target: &str) -> Vec<(String, AnimValue)> {
        self.registry
            .keys()
            .filter(|k| k.target == target)
            .filter_map(|k| {
                let id = self.registry.output_tween(k, &self.tweens)?;
                Some((k.property.clone(), self.tweens.get(&id)?.value()))
            })
            .collect()
    }

    pub fn timeline_duration(&self, id: TimelineId) -> Option<f64> {
        self.timelines.get(&id).map(Timeline::duration)
    }

    pub fn tween(&self, id: TweenId) -> Option<&Tween> {
        self.tweens.get(&id)
    }

    pub fn live_tween_count(&self) -> usize {
        self.tweens.len()
    }

    /// Additive chain of one pair, oldest first; empty if not animated.
    pub fn chain(&self, target: &str, property: &str) -> Vec<TweenId> {
        self.registry
            .chain(&PropertyKey::new(target, property))
            .map(<[TweenId]>::to_vec)
            .unwrap_or_default()
    }

    pub fn registry(&self) -> &AdditiveRegistry {
        &self.registry
    }

    pub fn has_additive_animation(&self) -> bool {
        self.registry.animation().is_some()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_and_ping_pong_mapping() {
        assert_eq!(local_time(250.0, 1000.0, LoopMode::Once), 250.0);
        assert_eq!(local_time(1500.0, 1000.0, LoopMode::Once), 1000.0);
        assert_eq!(local_time(1250.0, 1000.0, LoopMode::Loop), 250.0);
        assert_eq!(local_time(1250.0, 1000.0, LoopMode::PingPong), 750.0);
        assert_eq!(local_time(2250.0, 1000.0, LoopMode::PingPong), 250.0);
        assert_eq!(local_time(500.0, 0.0, LoopMode::Loop), 0.0);
    }
}
