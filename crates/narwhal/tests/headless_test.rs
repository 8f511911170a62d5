use narwhal::{Headless, HeadlessError, ToolScript};

const SCENE: &str = r##"{
    "width": 100,
    "height": 100,
    "border": 0,
    "background": "white",
    "x_range": {"start": 0, "end": 100},
    "y_range": {"start": 0, "end": 100},
    "sources": {
        "lines": {"xs": [[10, 50, 90]], "ys": [[20, 20, 20]], "name": ["first"]},
        "vertices": {"x": [], "y": []},
        "points": {"x": [20], "y": [50], "label": ["p"]}
    },
    "renderers": [
        {"source": "lines", "glyph": {"type": "MultiLine", "xs": {"field": "xs"}, "ys": {"field": "ys"}},
         "visuals": {"line_color": "navy", "line_width": 2}},
        {"source": "vertices", "glyph": {"type": "Ellipse", "x": {"field": "x"}, "y": {"field": "y"},
         "width": {"value": 6, "units": "screen"}, "height": {"value": 6, "units": "screen"}}},
        {"source": "points", "glyph": {"type": "Ellipse", "x": {"field": "x"}, "y": {"field": "y"},
         "width": {"value": 10, "units": "screen"}, "height": {"value": 10, "units": "screen"}}}
    ]
}"##;

const DRAW: &str = r#"{
    "tools": [
        {"type": "poly_draw", "renderers": [0], "vertex_renderer": 1, "empty_value": "?"},
        {"type": "hover", "renderers": [2], "tooltips": [["label", "@label"]]}
    ],
    "active": 0,
    "events": [
        {"type": "double_tap", "sx": 2, "sy": 97},
        {"type": "tap", "sx": 10, "sy": 90},
        {"type": "move", "sx": 21, "sy": 50}
    ]
}"#;

#[test]
fn replay_draws_a_row_and_reports_sources() {
    let headless = Headless::new();
    let script = ToolScript::from_json(DRAW).unwrap();
    let session = headless.replay_sync(SCENE, &script).unwrap();

    let sources = session.sources_json().unwrap();
    let lines = &sources["lines"]["data"];
    assert_eq!(lines["xs"].as_array().unwrap().len(), 2);
    assert_eq!(lines["name"][1], "?");
    let xs: Vec<f64> = lines["xs"][1]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_f64().unwrap())
        .collect();
    // The trailing vertex follows the last move.
    assert_eq!(xs.len(), 3);
    assert!((xs[0] - 2.0).abs() < 1e-6 && (xs[1] - 10.0).abs() < 1e-6);
    assert!((xs[2] - 21.0).abs() < 1e-6);

    let tooltips = session.tooltips();
    assert_eq!(tooltips.len(), 1);
    assert_eq!(tooltips[0].rows[0].value, "p");
}

#[test]
fn rendered_scenes_are_well_formed_svg() {
    let svg = Headless::new().render_svg_sync(SCENE).unwrap();
    let doc = roxmltree::Document::parse(&svg).unwrap();
    let root = doc.root_element();
    assert_eq!(root.attribute("viewBox"), Some("0 0 100 100"));
    assert!(root
        .descendants()
        .any(|n| n.has_tag_name("path") && n.attribute("stroke") == Some("#000080")));
}

#[test]
fn script_errors_surface_as_headless_errors() {
    let headless = Headless::new();
    let script = ToolScript::from_json(r#"{"tools": [{"type": "lasso"}]}"#).unwrap();
    assert!(matches!(
        headless.replay_sync(SCENE, &script),
        Err(HeadlessError::Tools(narwhal::tools::Error::UnknownTool { .. }))
    ));
    assert!(matches!(
        ToolScript::from_json(r#"{"events": [{"type": "wiggle"}]}"#),
        Err(HeadlessError::Json(_))
    ));
    assert!(matches!(
        headless.load_scene("{"),
        Err(HeadlessError::Render(_))
    ));
}
