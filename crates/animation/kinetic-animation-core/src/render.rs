//! Tick modes and the per-timeline render step.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::ids::TweenId;
use crate::timeline::Timeline;
use crate::tween::{Tween, TweenState};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickMode {
    /// Move the playhead without rendering.
    None,
    /// Normal playback: render tweens whose output can have changed.
    #[default]
    Auto,
    /// Render every tween regardless of cached state.
    Force,
    /// Jump to the timeline end and force-render.
    Complete,
}

/// Render `timeline`'s tweens at local `time`. Returns the time actually used.
///
/// Rendering is a pure function of `time`: ticking twice at the same time
/// leaves tween numbers unchanged.
pub(crate) fn tick(
    timeline: &mut Timeline,
    tweens: &mut HashMap<TweenId, Tween>,
    time: f64,
    mode: TickMode,
) -> f64 {
    let time = match mode {
        TickMode::Complete => timeline.duration(),
        _ => time.clamp(0.0, timeline.duration()),
    };
    timeline.time = time;
    if mode == TickMode::None {
        return time;
    }
    let force = matches!(mode, TickMode::Force | TickMode::Complete);
    for id in timeline.tweens() {
        let Some(tween) = tweens.get_mut(id) else {
            continue;
        };
        if force || needs_render(tween, time) {
            tween.render(time);
        }
    }
    time
}

/// A tween at rest before and after the new time does not change output.
fn needs_render(tween: &Tween, time: f64) -> bool {
    let Some(last) = tween.rendered_at() else {
        return true;
    };
    if last == time {
        return false;
    }
    let (next, _) = tween.state_at(time);
    next == TweenState::Running || next != tween.state()
}
