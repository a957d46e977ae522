use kinetic_animation_core::{
    Config, CoreEvent, Engine, Inputs, Properties, SelectorTable, TickMode, TimelineParams,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn engine() -> Engine {
    let mut t = SelectorTable::new();
    t.insert("#box", ["box"]);
    Engine::new(Config::default(), t)
}

fn opacity(from: f32, to: f32) -> Properties {
    Properties::new()
        .from_to("opacity", from, to)
        .duration(1000.0)
        .ease("linear")
}

fn opacity_of(engine: &Engine) -> f32 {
    engine.value("box", "opacity").expect("animated").numbers()[0]
}

#[test]
fn fade_in_blends_with_running_fade_out() {
    let mut engine = engine();
    let id = {
        let mut tl = engine.timeline(TimelineParams::paused());
        tl.add("#box", opacity(1.0, 0.0), 0)
            .unwrap()
            .add("#box", opacity(0.0, 1.0), 500)
            .unwrap();
        tl.id()
    };
    assert_eq!(engine.chain("box", "opacity").len(), 2);
    assert!(engine.has_additive_animation());

    // B pending: A alone drives the value
    engine.tick_timeline(id, 250.0, TickMode::Force).unwrap();
    approx(opacity_of(&engine), 0.75, 1e-6);

    // A at 0.25 feeds B's start: from 0.25, to 1.25, progress 0.25
    engine.tick_timeline(id, 750.0, TickMode::Force).unwrap();
    approx(opacity_of(&engine), 0.5, 1e-6);

    let chain = engine.chain("box", "opacity");
    let head = engine.tween(chain[1]).unwrap();
    let (from, to) = head.effective().unwrap();
    approx(from[0], 0.25, 1e-6);
    approx(to[0], 1.25, 1e-6);

    // A completed: B plays its authored values again
    engine.tick_timeline(id, 1200.0, TickMode::Force).unwrap();
    approx(opacity_of(&engine), 0.7, 1e-6);
    assert!(engine.tween(chain[1]).unwrap().effective().is_none());

    engine.tick_timeline(id, 1500.0, TickMode::Force).unwrap();
    assert_eq!(opacity_of(&engine), 1.0);
}

#[test]
fn additive_result_is_not_an_override() {
    let mut engine = engine();
    let id = {
        let mut tl = engine.timeline(TimelineParams::paused());
        tl.add("#box", opacity(1.0, 0.0), 0)
            .unwrap()
            .add("#box", opacity(0.0, 1.0), 500)
            .unwrap();
        tl.id()
    };
    engine.tick_timeline(id, 600.0, TickMode::Force).unwrap();
    // override would read 0.1; A contributes 0.4
    approx(opacity_of(&engine), 0.4 * 0.9 + 1.4 * 0.1, 1e-5);
}

#[test]
fn retargeting_from_a_second_timeline_starts_at_the_current_value() {
    let mut engine = engine();
    {
        let mut a = engine.timeline(TimelineParams::default());
        a.add("#box", opacity(1.0, 0.0), 0).unwrap();
    }
    engine.update(500.0, Inputs::none());
    approx(opacity_of(&engine), 0.5, 1e-6);

    {
        let mut b = engine.timeline(TimelineParams::default());
        b.add("#box", opacity(0.0, 1.0), 0).unwrap();
    }
    let out = engine.update(250.0, Inputs::none());
    let v = out.value_of("box", "opacity").unwrap().numbers()[0];
    approx(v, 0.5, 1e-6);
    assert_eq!(out.changes.len(), 1);
}

#[test]
fn re_rendering_the_same_time_does_not_drift() {
    let mut engine = engine();
    let id = {
        let mut tl = engine.timeline(TimelineParams::paused());
        tl.add("#box", opacity(1.0, 0.0), 0)
            .unwrap()
            .add("#box", opacity(0.0, 1.0), 200)
            .unwrap()
            .add("#box", opacity(0.0, 0.5), 400)
            .unwrap();
        tl.id()
    };
    engine.tick_timeline(id, 650.0, TickMode::Force).unwrap();
    let first = opacity_of(&engine);
    for mode in [TickMode::Force, TickMode::Auto, TickMode::Force] {
        engine.tick_timeline(id, 650.0, mode).unwrap();
        assert_eq!(opacity_of(&engine), first);
    }
}

#[test]
fn all_predecessors_still_running_are_summed() {
    let mut engine = engine();
    let id = {
        let mut tl = engine.timeline(TimelineParams::paused());
        tl.add("#box", opacity(1.0, 0.0), 0)
            .unwrap()
            .add("#box", opacity(0.0, 1.0), 200)
            .unwrap()
            .add("#box", opacity(0.0, 0.5), 400)
            .unwrap();
        tl.id()
    };
    engine.tick_timeline(id, 600.0, TickMode::Force).unwrap();
    // A = 0.4, B (plain) = 0.4, C progress 0.2 over base 0.8 -> 0.8 + 0.5 * 0.2
    approx(opacity_of(&engine), 0.9, 1e-5);
}

#[test]
fn reverting_a_timeline_unlinks_its_tweens() {
    let mut engine = engine();
    let a = {
        let mut tl = engine.timeline(TimelineParams::paused());
        tl.add("#box", opacity(1.0, 0.0), 0).unwrap();
        tl.id()
    };
    let b = {
        let mut tl = engine.timeline(TimelineParams::paused());
        tl.add("#box", opacity(0.0, 1.0), 0).unwrap();
        tl.id()
    };
    assert!(engine.has_additive_animation());

    assert!(engine.revert_timeline(a));
    let chain = engine.chain("box", "opacity");
    assert_eq!(chain.len(), 1);
    assert_eq!(engine.tween(chain[0]).unwrap().timeline, b);
    assert!(!engine.has_additive_animation());

    assert!(engine.revert_timeline(b));
    assert!(engine.chain("box", "opacity").is_empty());
    assert_eq!(engine.live_tween_count(), 0);

    let out = engine.update(16.0, Inputs::none());
    assert!(out.changes.is_empty());
    assert!(out.events.contains(&CoreEvent::PropertyReleased {
        target: "box".into(),
        property: "opacity".into(),
    }));
    assert!(out.events.contains(&CoreEvent::TimelineReverted { timeline: a }));
}

#[test]
fn incompatible_chains_are_rejected() {
    let mut engine = engine();
    let mut tl = engine.timeline(TimelineParams::paused());
    tl.add("#box", Properties::new().from_to("left", "0px", "10px"), 0)
        .unwrap();
    let err = tl
        .add("#box", Properties::new().from_to("left", "0%", "50%"), 0)
        .unwrap_err();
    assert!(matches!(
        err,
        kinetic_animation_core::AnimError::ValueMismatch { .. }
    ));
    assert_eq!(engine.chain("box", "left").len(), 1);
}
