use kinetic_animation_core::{
    AnimValue, Config, CoreEvent, Engine, Inputs, Outputs, Properties, SelectorTable, TickMode,
    TimelineId, TimelineParams, TweenState,
};
use serde_json::json;

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn setup() -> (Engine, TimelineId) {
    let mut t = SelectorTable::new();
    t.insert("#box", ["box"]);
    let mut engine = Engine::new(Config::default(), t);
    let id = {
        let mut tl = engine.timeline(TimelineParams::paused());
        tl.add(
            "#box",
            Properties::new()
                .from_to("left", "0px", "200px")
                .duration(1000.0)
                .ease("linear"),
            0,
        )
        .unwrap();
        tl.id()
    };
    (engine, id)
}

fn left(out: &Outputs) -> f32 {
    out.value_of("box", "left").expect("left emitted").numbers()[0]
}

#[test]
fn none_moves_the_playhead_without_rendering() {
    let (mut engine, id) = setup();
    engine.tick_timeline(id, 300.0, TickMode::Force).unwrap();
    let out = engine.tick_timeline(id, 800.0, TickMode::None).unwrap();
    approx(left(out), 60.0, 1e-4);
    assert_eq!(engine.get_timeline(id).unwrap().time(), 800.0);
}

#[test]
fn auto_and_force_agree() {
    let (mut engine, id) = setup();
    let auto = left(engine.tick_timeline(id, 450.0, TickMode::Auto).unwrap());
    let force = left(engine.tick_timeline(id, 450.0, TickMode::Force).unwrap());
    assert_eq!(auto, force);
    approx(auto, 90.0, 1e-4);
}

#[test]
fn complete_jumps_to_the_end() {
    let (mut engine, id) = setup();
    let out = engine.tick_timeline(id, 10.0, TickMode::Complete).unwrap();
    assert_eq!(out.value_of("box", "left"), Some(&AnimValue::parse("200px").unwrap()));
    let chain = engine.chain("box", "left");
    assert_eq!(engine.tween(chain[0]).unwrap().state(), TweenState::Completed);
}

#[test]
fn times_outside_the_timeline_are_clamped() {
    let (mut engine, id) = setup();
    let out = engine.tick_timeline(id, -250.0, TickMode::Force).unwrap();
    assert_eq!(left(out), 0.0);
    let out = engine.tick_timeline(id, 99_999.0, TickMode::Force).unwrap();
    assert_eq!(left(out), 200.0);
}

#[test]
fn ticking_backwards_renders_earlier_values() {
    let (mut engine, id) = setup();
    engine.tick_timeline(id, 900.0, TickMode::Auto).unwrap();
    let out = engine.tick_timeline(id, 100.0, TickMode::Auto).unwrap();
    approx(left(out), 20.0, 1e-4);
    let chain = engine.chain("box", "left");
    assert_eq!(engine.tween(chain[0]).unwrap().state(), TweenState::Running);
}

#[test]
fn computed_lists_every_property_of_a_target() {
    let (mut engine, id) = setup();
    {
        let mut tl = engine.timeline_mut(id).unwrap();
        tl.add(
            "#box",
            Properties::new().from_to("opacity", 0.0f32, 1.0f32).duration(100.0),
            0,
        )
        .unwrap();
    }
    engine.tick_timeline(id, 1000.0, TickMode::Force).unwrap();
    let computed = engine.computed("box");
    assert_eq!(
        computed,
        vec![
            ("left".to_string(), AnimValue::parse("200px").unwrap()),
            ("opacity".to_string(), AnimValue::Number(1.0)),
        ]
    );
    assert!(engine.computed("nothing").is_empty());
}

#[test]
fn outputs_serialize_as_json() {
    let (mut engine, id) = setup();
    engine.update(0.0, Inputs::none());
    let out = engine.tick_timeline(id, 500.0, TickMode::Force).unwrap();
    let v = serde_json::to_value(out).unwrap();
    assert_eq!(
        v["changes"][0],
        json!({
            "timeline": 0,
            "target": "box",
            "property": "left",
            "value": { "type": "Unit", "data": { "value": 100.0, "unit": "px" } }
        })
    );
    assert!(v["events"].as_array().unwrap().is_empty());

    let event = serde_json::to_value(CoreEvent::TimelineLooped {
        timeline: id,
        iteration: 2,
    })
    .unwrap();
    assert_eq!(event, json!({ "TimelineLooped": { "timeline": 0, "iteration": 2 } }));

    let back: Outputs = serde_json::from_value(v).unwrap();
    assert_eq!(back.changes.len(), 1);
}

#[test]
fn event_buffer_is_capped() {
    let mut t = SelectorTable::new();
    t.insert("#box", ["box"]);
    let cfg = Config {
        max_events_per_tick: 2,
        ..Config::default()
    };
    let mut engine = Engine::new(cfg, t);
    for _ in 0..5 {
        let mut tl = engine.timeline(TimelineParams::default());
        tl.add("#box", Properties::new().from_to("x", 0.0f32, 1.0f32), 0)
            .unwrap();
    }
    let out = engine.update(16.0, Inputs::none());
    assert_eq!(out.events.len(), 2);
    assert_eq!(out.changes.len(), 1);
}
