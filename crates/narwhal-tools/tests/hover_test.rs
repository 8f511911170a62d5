use beluga::Borders;
use narwhal_core::{Column, ColumnDataSource, Range1d};
use narwhal_render::{DistanceSpec, Ellipse, Glyph, GlyphRenderer, MultiLine, Plot, Spec, Visuals};
use narwhal_tools::{HoverMode, HoverOptions, HoverTool, LinePolicy, PointPolicy, UiEvent};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

/// Points (renderer 0) at y = 50 and one line (renderer 1) through (10, 20), (50, 20), (90, 60);
/// both axes in [0, 100] on a 100x100 canvas, so screen y = 100 - y.
fn plot() -> Plot {
    let mut plot = Plot::new(100.0, 100.0, Borders::uniform(0.0)).unwrap();
    plot.x_range = Range1d::new(0.0, 100.0);
    plot.y_range = Range1d::new(0.0, 100.0);
    plot.add_source(
        "points",
        ColumnDataSource::from_columns([
            ("x", Column::Number(vec![20.0, 60.0])),
            ("y", Column::Number(vec![50.0, 50.0])),
            ("name", Column::Text(vec!["a".into(), "b".into()])),
        ]),
    );
    plot.add_source(
        "lines",
        ColumnDataSource::from_columns([
            ("xs", Column::NumberList(vec![vec![10.0, 50.0, 90.0]])),
            ("ys", Column::NumberList(vec![vec![20.0, 20.0, 60.0]])),
        ]),
    );
    plot.add_renderer(GlyphRenderer::new(
        "points",
        "points",
        Glyph::Ellipse(Ellipse::new(
            Spec::field("x"),
            Spec::field("y"),
            DistanceSpec::data(10.0),
            DistanceSpec::data(10.0),
        )),
        Visuals::default(),
    ))
    .unwrap();
    plot.add_renderer(GlyphRenderer::new(
        "lines",
        "lines",
        Glyph::MultiLine(MultiLine::new("xs", "ys")),
        Visuals::default(),
    ))
    .unwrap();
    plot
}

fn hover(plot: &mut Plot, options: HoverOptions) -> HoverTool {
    let mut tool = HoverTool::new(options);
    tool.activate(plot).unwrap();
    tool
}

fn values(tool: &HoverTool) -> Vec<Vec<String>> {
    tool.tooltips()
        .iter()
        .map(|t| t.rows.iter().map(|r| r.value.clone()).collect())
        .collect()
}

fn point_tooltips() -> Vec<(String, String)> {
    vec![
        ("name".to_string(), "@name".to_string()),
        ("x".to_string(), "@x{%0.1f}".to_string()),
        ("row".to_string(), "$index".to_string()),
    ]
}

#[test]
fn point_tooltips_snap_to_the_data() {
    let mut plot = plot();
    let mut tool = hover(
        &mut plot,
        HoverOptions {
            renderers: vec![0],
            tooltips: point_tooltips(),
            ..HoverOptions::default()
        },
    );
    tool.handle(&mut plot, &UiEvent::Move { sx: 22.0, sy: 51.0 }).unwrap();

    assert_eq!(values(&tool), vec![vec!["a", "20.0", "0"]]);
    let tooltip = &tool.tooltips()[0];
    assert_eq!((tooltip.renderer, tooltip.index), (0, 0));
    assert!(close(tooltip.sx, 20.0) && close(tooltip.sy, 50.0));
    assert!(plot.source("points").unwrap().inspected.contains(0));
    assert!(plot.source("points").unwrap().selected.is_empty());
}

#[test]
fn follow_mouse_anchors_at_the_pointer() {
    let mut plot = plot();
    let mut tool = hover(
        &mut plot,
        HoverOptions {
            renderers: vec![0],
            point_policy: PointPolicy::FollowMouse,
            tooltips: point_tooltips(),
            ..HoverOptions::default()
        },
    );
    tool.handle(&mut plot, &UiEvent::Move { sx: 62.0, sy: 51.0 }).unwrap();
    assert_eq!(values(&tool), vec![vec!["b", "60.0", "1"]]);
    assert_eq!((tool.tooltips()[0].sx, tool.tooltips()[0].sy), (62.0, 51.0));
}

#[test]
fn leaving_the_frame_clears_tooltips() {
    let mut plot = plot();
    let mut tool = hover(&mut plot, HoverOptions::default());
    tool.handle(&mut plot, &UiEvent::Move { sx: 22.0, sy: 51.0 }).unwrap();
    assert_eq!(tool.tooltips().len(), 1);

    tool.handle(&mut plot, &UiEvent::Move { sx: 150.0, sy: 51.0 }).unwrap();
    assert!(tool.tooltips().is_empty());
    assert!(plot.source("points").unwrap().inspected.is_empty());

    tool.handle(&mut plot, &UiEvent::Move { sx: 22.0, sy: 51.0 }).unwrap();
    tool.handle(&mut plot, &UiEvent::MoveExit).unwrap();
    assert!(tool.tooltips().is_empty());
}

#[test]
fn default_tooltips_show_index_and_positions() {
    let mut plot = plot();
    let mut tool = hover(&mut plot, HoverOptions::default());
    tool.handle(&mut plot, &UiEvent::Move { sx: 20.0, sy: 50.0 }).unwrap();
    let labels: Vec<&str> = tool.tooltips()[0].rows.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, ["index", "data (x, y)", "screen (x, y)"]);
    assert_eq!(tool.tooltips()[0].rows[0].value, "0");
    assert_eq!(tool.tooltips()[0].rows[2].value, "(20, 50)");
}

fn line_hover(plot: &mut Plot, line_policy: LinePolicy) -> HoverTool {
    hover(
        plot,
        HoverOptions {
            renderers: vec![1],
            mode: HoverMode::Vline,
            line_policy,
            tooltips: vec![
                ("segment".to_string(), "$segment_index".to_string()),
                ("x".to_string(), "$~x{%0.1f}".to_string()),
            ],
            ..HoverOptions::default()
        },
    )
}

#[test]
fn line_policies_pick_the_reported_vertex() {
    let cases = [
        (LinePolicy::Prev, 40.0, ["0", "10.0"], 10.0),
        (LinePolicy::Next, 40.0, ["1", "50.0"], 50.0),
        (LinePolicy::Nearest, 40.0, ["1", "50.0"], 50.0),
        (LinePolicy::Nearest, 20.0, ["0", "10.0"], 10.0),
        (LinePolicy::Interp, 40.0, ["0", "40.0"], 40.0),
    ];
    for (policy, sx, expected, anchor) in cases {
        let mut plot = plot();
        let mut tool = line_hover(&mut plot, policy);
        tool.handle(&mut plot, &UiEvent::Move { sx, sy: 5.0 }).unwrap();
        assert_eq!(values(&tool), vec![expected.to_vec()], "{policy:?} at {sx}");
        let tooltip = &tool.tooltips()[0];
        assert!(close(tooltip.sx, anchor), "{policy:?} at {sx}: {}", tooltip.sx);
        assert!(close(tooltip.sy, 80.0), "{policy:?} at {sx}: {}", tooltip.sy);
    }
}

#[test]
fn second_segment_reports_its_own_vertices() {
    let mut plot = plot();
    let mut tool = line_hover(&mut plot, LinePolicy::Next);
    tool.handle(&mut plot, &UiEvent::Move { sx: 70.0, sy: 5.0 }).unwrap();
    assert_eq!(values(&tool), vec![vec!["2", "90.0"]]);
    let tooltip = &tool.tooltips()[0];
    assert!(close(tooltip.sx, 90.0) && close(tooltip.sy, 40.0));
    assert_eq!(tooltip.segment_index, Some(2));
}

#[test]
fn inactive_hover_ignores_moves() {
    let mut plot = plot();
    let mut tool = HoverTool::new(HoverOptions::default());
    tool.handle(&mut plot, &UiEvent::Move { sx: 22.0, sy: 51.0 }).unwrap();
    assert!(tool.tooltips().is_empty());
    assert!(plot.source("points").unwrap().inspected.is_empty());
}
