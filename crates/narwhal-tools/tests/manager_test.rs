use beluga::Borders;
use narwhal_core::{Column, ColumnDataSource, Range1d};
use narwhal_render::{DistanceSpec, Ellipse, Glyph, GlyphRenderer, MultiLine, Plot, Spec, Visuals};
use narwhal_tools::{Error, Key, Tool, ToolManager, ToolRegistry, UiEvent};
use serde_json::json;

fn dots(source: &str, size: f64) -> GlyphRenderer {
    GlyphRenderer::new(
        source,
        source,
        Glyph::Ellipse(Ellipse::new(
            Spec::field("x"),
            Spec::field("y"),
            DistanceSpec::data(size),
            DistanceSpec::data(size),
        )),
        Visuals::default(),
    )
}

/// Lines (0), vertices (1) and points (2) on a 100x100 canvas with both axes in [0, 100].
fn plot() -> Plot {
    let mut plot = Plot::new(100.0, 100.0, Borders::uniform(0.0)).unwrap();
    plot.x_range = Range1d::new(0.0, 100.0);
    plot.y_range = Range1d::new(0.0, 100.0);
    plot.add_source(
        "lines",
        ColumnDataSource::from_columns([
            ("xs", Column::NumberList(vec![vec![10.0, 50.0, 90.0]])),
            ("ys", Column::NumberList(vec![vec![20.0, 20.0, 20.0]])),
        ]),
    );
    plot.add_source(
        "vertices",
        ColumnDataSource::from_columns([
            ("x", Column::Number(Vec::new())),
            ("y", Column::Number(Vec::new())),
        ]),
    );
    plot.add_source(
        "points",
        ColumnDataSource::from_columns([
            ("x", Column::Number(vec![20.0])),
            ("y", Column::Number(vec![50.0])),
        ]),
    );
    plot.add_renderer(GlyphRenderer::new(
        "lines",
        "lines",
        Glyph::MultiLine(MultiLine::new("xs", "ys")),
        Visuals::default(),
    ))
    .unwrap();
    plot.add_renderer(dots("vertices", 6.0)).unwrap();
    plot.add_renderer(dots("points", 10.0)).unwrap();
    plot
}

fn manager(plot: &Plot) -> ToolManager {
    let registry = ToolRegistry::default();
    let mut manager = ToolManager::new();
    for spec in [
        json!({"type": "poly_draw", "renderers": [0], "vertex_renderer": 1}),
        json!({"type": "poly_edit", "renderers": [0], "vertex_renderer": 1}),
        json!({"type": "hover", "renderers": [2], "tooltips": [["row", "$index"]]}),
    ] {
        manager.add(registry.build(&spec, plot).unwrap());
    }
    manager
}

#[test]
fn one_gesture_tool_is_active_at_a_time() {
    let mut plot = plot();
    let mut manager = manager(&plot);

    manager.activate(&mut plot, 0).unwrap();
    assert_eq!(manager.active_gesture(), Some(0));
    // Poly draw shows every vertex while active.
    assert_eq!(plot.source("vertices").unwrap().len(), 3);

    manager.activate(&mut plot, 1).unwrap();
    assert_eq!(manager.active_gesture(), Some(1));
    assert!(!manager.tool(0).unwrap().is_active());
    assert!(plot.source("vertices").unwrap().is_empty());

    manager.activate(&mut plot, 2).unwrap();
    assert_eq!(manager.active_gesture(), Some(1));
    assert!(manager.tool(2).unwrap().is_active());

    manager.deactivate(&mut plot, 1).unwrap();
    assert_eq!(manager.active_gesture(), None);
    assert!(manager.tool(2).unwrap().is_active());
}

#[test]
fn moves_reach_inspectors_and_gestures_reach_the_active_tool() {
    let mut plot = plot();
    let mut manager = manager(&plot);
    manager.activate(&mut plot, 1).unwrap();
    manager.activate(&mut plot, 2).unwrap();

    manager.handle(&mut plot, &UiEvent::Move { sx: 21.0, sy: 50.0 }).unwrap();
    let rows: Vec<&str> = manager
        .tooltips()
        .iter()
        .map(|t| t.rows[0].value.as_str())
        .collect();
    assert_eq!(rows, ["0"]);

    manager.handle(&mut plot, &UiEvent::DoubleTap { sx: 30.0, sy: 80.0 }).unwrap();
    let Tool::PolyEdit(edit) = manager.tool(1).unwrap() else {
        panic!("expected poly edit");
    };
    assert!(edit.target().is_some());
    assert_eq!(plot.source("vertices").unwrap().len(), 3);

    manager.handle(&mut plot, &UiEvent::KeyUp { key: Key::Escape }).unwrap();
    assert!(plot.source("vertices").unwrap().is_empty());

    manager.handle(&mut plot, &UiEvent::MoveExit).unwrap();
    assert!(manager.tooltips().is_empty());
}

#[test]
fn events_are_dropped_without_an_active_gesture_tool() {
    let mut plot = plot();
    let mut manager = manager(&plot);
    manager.handle(&mut plot, &UiEvent::DoubleTap { sx: 30.0, sy: 30.0 }).unwrap();
    assert_eq!(plot.source("lines").unwrap().len(), 1);
}

#[test]
fn unknown_tool_ids_are_errors() {
    let mut plot = plot();
    let mut manager = manager(&plot);
    assert!(matches!(manager.tool(7), Err(Error::UnknownToolId { index: 7 })));
    assert!(matches!(
        manager.activate(&mut plot, 7),
        Err(Error::UnknownToolId { .. })
    ));
}

#[test]
fn events_replay_from_json() {
    let mut plot = plot();
    let mut manager = manager(&plot);
    manager.activate(&mut plot, 0).unwrap();
    let events: Vec<UiEvent> = serde_json::from_value(json!([
        {"type": "double_tap", "sx": 30.0, "sy": 30.0},
        {"type": "tap", "sx": 40.0, "sy": 40.0},
        {"type": "double_tap", "sx": 60.0, "sy": 40.0}
    ]))
    .unwrap();
    for event in &events {
        manager.handle(&mut plot, event).unwrap();
    }
    let rows = plot.source("lines").unwrap().number_lists("xs").unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].len(), 3);
    assert!((rows[1][2] - 60.0).abs() < 1e-6);
}
