//! Additive composition registry.
//!
//! Every (target, property) pair animated by any tween owns a chain of tween
//! ids in insertion order. Chains with two or more members are "lookups": the
//! newest started tween (the head) absorbs the current values of the older
//! still-running tweens into its starting point, so retargeting mid-flight
//! never jumps.
//!
//! All lookups are driven by one shared additive animation created on demand
//! and dropped when no lookup and no scope remains.

use hashbrown::HashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ids::TweenId;
use crate::interp::functions::accumulate_numbers;
use crate::targets::TargetHandle;
use crate::tween::{Tween, TweenState};

/// Identity of one animated pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyKey {
    pub target: TargetHandle,
    pub property: String,
}

impl PropertyKey {
    pub fn new(target: impl Into<TargetHandle>, property: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            property: property.into(),
        }
    }
}

/// The shared animation that re-renders lookup heads each tick.
#[derive(Clone, Debug, Default)]
pub struct AdditiveAnimation {
    /// Forced head renders performed so far.
    pub renders: u64,
}

#[derive(Debug, Default)]
pub struct AdditiveRegistry {
    tracks: IndexMap<PropertyKey, Vec<TweenId>>,
    animation: Option<AdditiveAnimation>,
    heads: Vec<(TweenId, Vec<f32>)>,
}

impl AdditiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id` to the chain for `key`. Returns true when this links the
    /// tween behind an existing one.
    pub fn register(&mut self, key: PropertyKey, id: TweenId) -> bool {
        let chain = self.tracks.entry(key).or_default();
        chain.push(id);
        let linked = chain.len() > 1;
        if linked && self.animation.is_none() {
            log::debug!("additive animation created");
            self.animation = Some(AdditiveAnimation::default());
        }
        linked
    }

    /// Remove `id` from the chain for `key`. Returns true when the pair is no
    /// longer animated by anything.
    pub fn unlink(&mut self, key: &PropertyKey, id: TweenId) -> bool {
        let Some(chain) = self.tracks.get_mut(key) else {
            return false;
        };
        chain.retain(|t| *t != id);
        if chain.is_empty() {
            self.tracks.shift_remove(key);
            true
        } else {
            false
        }
    }

    /// Newest tween registered on `key`.
    pub fn last_on(&self, key: &PropertyKey) -> Option<TweenId> {
        self.tracks.get(key).and_then(|c| c.last().copied())
    }

    /// Full chain for `key`, oldest first.
    pub fn chain(&self, key: &PropertyKey) -> Option<&[TweenId]> {
        self.tracks.get(key).map(Vec::as_slice)
    }

    /// Animated pairs in first-animated order.
    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.tracks.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Number of chains with at least two members.
    pub fn lookup_count(&self) -> usize {
        self.tracks.values().filter(|c| c.len() > 1).count()
    }

    pub fn animation(&self) -> Option<&AdditiveAnimation> {
        self.animation.as_ref()
    }

    /// Drop the shared animation once nothing can use it anymore.
    pub fn release_if_idle(&mut self, live_scopes: usize) {
        if self.animation.is_some() && self.lookup_count() == 0 && live_scopes == 0 {
            log::debug!("additive animation released");
            self.animation = None;
        }
    }

    /// The tween whose value is shown for `key`: the head of a lookup, the
    /// oldest member while nothing has started, or the only member.
    pub fn output_tween(
        &self,
        key: &PropertyKey,
        tweens: &HashMap<TweenId, Tween>,
    ) -> Option<TweenId> {
        let chain = self.tracks.get(key)?;
        head_index(chain, tweens)
            .map(|i| chain[i])
            .or_else(|| chain.first().copied())
    }

    /// Rebase every lookup head on the sum of its running predecessors, then
    /// force-render the heads.
    pub fn update(&mut self, tweens: &mut HashMap<TweenId, Tween>) {
        let Some(animation) = self.animation.as_mut() else {
            return;
        };
        self.heads.clear();
        for chain in self.tracks.values().filter(|c| c.len() > 1) {
            for id in chain {
                if let Some(t) = tweens.get_mut(id) {
                    t.restore_plain();
                }
            }
            let Some(h) = head_index(chain, tweens) else {
                continue;
            };
            let mut sum: Option<Vec<f32>> = None;
            for id in &chain[..h] {
                let Some(t) = tweens.get(id) else { continue };
                if t.state() != TweenState::Running {
                    continue;
                }
                match sum.as_mut() {
                    Some(acc) => accumulate_numbers(acc, t.numbers()),
                    None => sum = Some(t.numbers().to_vec()),
                }
            }
            if let Some(base) = sum {
                self.heads.push((chain[h], base));
            }
        }
        for (id, base) in self.heads.drain(..) {
            if let Some(t) = tweens.get_mut(&id) {
                t.render_effective(base);
                animation.renders += 1;
            }
        }
    }
}

/// Index of the newest chain member that has started.
fn head_index(chain: &[TweenId], tweens: &HashMap<TweenId, Tween>) -> Option<usize> {
    chain.iter().rposition(|id| {
        tweens
            .get(id)
            .is_some_and(|t| t.state() != TweenState::Pending)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Ease;
    use crate::ids::TimelineId;
    use crate::tween::TweenSpec;
    use crate::value::AnimValue;

    fn tween(id: u32, from: f32, to: f32, start: f64) -> Tween {
        Tween::new(
            TweenId(id),
            TimelineId(id),
            TweenSpec {
                target: "box".into(),
                property: "x".into(),
                from: AnimValue::Number(from),
                to: AnimValue::Number(to),
                start,
                duration: 1000.0,
                ease: Ease::Linear,
            },
        )
        .unwrap()
    }

    #[test]
    fn it_should_create_and_release_the_shared_animation() {
        let mut reg = AdditiveRegistry::new();
        let key = PropertyKey::new("box", "x");
        assert!(!reg.register(key.clone(), TweenId(1)));
        assert!(reg.animation().is_none());
        assert!(reg.register(key.clone(), TweenId(2)));
        assert!(reg.animation().is_some());
        assert_eq!(reg.lookup_count(), 1);

        assert!(!reg.unlink(&key, TweenId(1)));
        reg.release_if_idle(1);
        assert!(reg.animation().is_some());
        reg.release_if_idle(0);
        assert!(reg.animation().is_none());
        assert!(reg.unlink(&key, TweenId(2)));
        assert!(reg.is_empty());
    }

    #[test]
    fn it_should_rebase_head_on_running_predecessors() {
        let mut reg = AdditiveRegistry::new();
        let key = PropertyKey::new("box", "x");
        let mut tweens = HashMap::new();
        tweens.insert(TweenId(1), tween(1, 0.0, 100.0, 0.0));
        tweens.insert(TweenId(2), tween(2, 0.0, 10.0, 500.0));
        reg.register(key.clone(), TweenId(1));
        reg.register(key.clone(), TweenId(2));

        for t in tweens.values_mut() {
            t.render(750.0);
        }
        reg.update(&mut tweens);

        // predecessor at 75, head authored 0..10 at 25% -> 75..85 at 25%
        let head = &tweens[&TweenId(2)];
        assert_eq!(head.effective(), Some((&[75.0][..], &[85.0][..])));
        assert_eq!(head.numbers(), &[77.5]);
        assert_eq!(reg.output_tween(&key, &tweens), Some(TweenId(2)));
        assert_eq!(reg.animation().map(|a| a.renders), Some(1));
    }

    #[test]
    fn it_should_show_oldest_while_nothing_started() {
        let mut reg = AdditiveRegistry::new();
        let key = PropertyKey::new("box", "x");
        let mut tweens = HashMap::new();
        tweens.insert(TweenId(1), tween(1, 5.0, 100.0, 100.0));
        tweens.insert(TweenId(2), tween(2, 0.0, 10.0, 200.0));
        reg.register(key.clone(), TweenId(1));
        reg.register(key.clone(), TweenId(2));
        for t in tweens.values_mut() {
            t.render(0.0);
        }
        reg.update(&mut tweens);
        assert_eq!(reg.output_tween(&key, &tweens), Some(TweenId(1)));
        assert!(tweens[&TweenId(2)].effective().is_none());
    }

    #[test]
    fn it_should_use_authored_values_when_predecessors_completed() {
        let mut reg = AdditiveRegistry::new();
        let key = PropertyKey::new("box", "x");
        let mut tweens = HashMap::new();
        tweens.insert(TweenId(1), tween(1, 0.0, 100.0, 0.0));
        tweens.insert(TweenId(2), tween(2, 0.0, 10.0, 1000.0));
        reg.register(key.clone(), TweenId(1));
        reg.register(key.clone(), TweenId(2));
        for t in tweens.values_mut() {
            t.render(1500.0);
        }
        reg.update(&mut tweens);
        let head = &tweens[&TweenId(2)];
        assert!(head.effective().is_none());
        assert_eq!(head.numbers(), &[5.0]);
    }
}
