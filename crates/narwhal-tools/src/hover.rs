//! Hover inspector: inspects the rows under the pointer and builds their tooltips.

use crate::Result;
use crate::event::UiEvent;
use crate::template::{TooltipRow, TooltipVars, render_row};
use narwhal_core::{ColumnDataSource, CoordinateMapping, Selection};
use narwhal_render::glyph::multi_line::{LinesData, LinesGeometry, interpolation_hit};
use narwhal_render::{GlyphData, HitGeometry, Plot, RendererId, ScreenGeometry, SpanDirection};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoverMode {
    /// Point under the pointer.
    #[default]
    Mouse,
    /// Vertical line through the pointer.
    Vline,
    /// Horizontal line through the pointer.
    Hline,
}

/// Where point-glyph tooltips are anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointPolicy {
    #[default]
    SnapToData,
    FollowMouse,
}

/// Which point of a hit line segment a tooltip reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinePolicy {
    /// Segment start.
    Prev,
    /// Segment end.
    Next,
    /// Segment end closest to the pointer.
    #[default]
    Nearest,
    /// Intersection of the segment with the hover geometry.
    Interp,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HoverOptions {
    /// Inspected renderers; empty means every renderer of the plot.
    pub renderers: Vec<RendererId>,
    pub mode: HoverMode,
    pub point_policy: PointPolicy,
    pub line_policy: LinePolicy,
    /// `(label, template)` rows of each tooltip.
    pub tooltips: Vec<(String, String)>,
}

impl Default for HoverOptions {
    fn default() -> Self {
        Self {
            renderers: Vec::new(),
            mode: HoverMode::Mouse,
            point_policy: PointPolicy::SnapToData,
            line_policy: LinePolicy::Nearest,
            tooltips: vec![
                ("index".to_string(), "$index".to_string()),
                ("data (x, y)".to_string(), "($x, $y)".to_string()),
                ("screen (x, y)".to_string(), "($sx, $sy)".to_string()),
            ],
        }
    }
}

/// One tooltip, anchored at `(sx, sy)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub renderer: RendererId,
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_index: Option<usize>,
    pub sx: f64,
    pub sy: f64,
    pub rows: Vec<TooltipRow>,
}

#[derive(Debug)]
pub struct HoverTool {
    options: HoverOptions,
    active: bool,
    tooltips: Vec<Tooltip>,
}

impl HoverTool {
    pub fn new(options: HoverOptions) -> Self {
        Self {
            options,
            active: false,
            tooltips: Vec::new(),
        }
    }

    pub fn options(&self) -> &HoverOptions {
        &self.options
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Tooltips of the last inspection.
    pub fn tooltips(&self) -> &[Tooltip] {
        &self.tooltips
    }

    pub fn activate(&mut self, _plot: &mut Plot) -> Result<()> {
        self.active = true;
        Ok(())
    }

    pub fn deactivate(&mut self, plot: &mut Plot) -> Result<()> {
        self.clear(plot)?;
        self.active = false;
        Ok(())
    }

    pub fn handle(&mut self, plot: &mut Plot, event: &UiEvent) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        match *event {
            UiEvent::Move { sx, sy } if plot.frame_bbox().contains(sx, sy) => {
                self.inspect(plot, sx, sy)
            }
            UiEvent::Move { .. } | UiEvent::MoveExit => self.clear(plot),
            _ => Ok(()),
        }
    }

    fn renderers(&self, plot: &Plot) -> Vec<RendererId> {
        if self.options.renderers.is_empty() {
            (0..plot.renderers().len()).collect()
        } else {
            self.options.renderers.clone()
        }
    }

    fn geometry(&self, sx: f64, sy: f64) -> HitGeometry {
        match self.options.mode {
            HoverMode::Mouse => HitGeometry::point(sx, sy),
            HoverMode::Vline => HitGeometry::span(SpanDirection::H, sx, sy),
            HoverMode::Hline => HitGeometry::span(SpanDirection::V, sx, sy),
        }
    }

    fn inspect(&mut self, plot: &mut Plot, sx: f64, sy: f64) -> Result<()> {
        let geometry = self.geometry(sx, sy);
        let mapping = plot.mapping()?;
        let pointer = mapping.map_from_screen(sx, sy);
        self.tooltips.clear();

        for renderer in self.renderers(plot) {
            let inspected = plot.inspect(renderer, &geometry)?;
            if inspected.is_empty() {
                continue;
            }
            let r = plot.renderer(renderer)?;
            let source = plot.source(&r.source)?;
            let data = r.data(source)?;
            let Some(screen) = r.geometry(&data, &mapping) else {
                continue;
            };
            let base = TooltipVars {
                x: pointer.x,
                y: pointer.y,
                sx,
                sy,
                ..TooltipVars::default()
            };
            let hits = match (&data, &screen) {
                (GlyphData::Lines(lines), ScreenGeometry::Lines(screen)) => self.line_hits(
                    &inspected, lines, screen, &geometry, &mapping, base,
                ),
                _ => inspected
                    .indices
                    .iter()
                    .map(|&i| {
                        let (data_x, data_y) = anchor_data(&data, i);
                        let (rx, ry) = match self.options.point_policy {
                            PointPolicy::SnapToData => {
                                r.glyph.anchor(i, &data, &screen).unwrap_or((sx, sy))
                            }
                            PointPolicy::FollowMouse => (sx, sy),
                        };
                        let vars = TooltipVars {
                            index: i,
                            data_x,
                            data_y,
                            ..base
                        };
                        (rx, ry, vars)
                    })
                    .collect(),
            };
            for (rx, ry, vars) in hits {
                let rows = self.render_rows(source, &vars);
                self.tooltips.push(Tooltip {
                    renderer,
                    index: vars.index,
                    segment_index: vars.segment_index,
                    sx: rx,
                    sy: ry,
                    rows,
                });
            }
        }
        tracing::trace!(tooltips = self.tooltips.len(), "hover inspected");
        Ok(())
    }

    /// Tooltip anchors and variables of every hit segment, per the line policy.
    fn line_hits(
        &self,
        inspected: &Selection,
        lines: &LinesData,
        screen: &LinesGeometry,
        geometry: &HitGeometry,
        mapping: &CoordinateMapping,
        base: TooltipVars,
    ) -> Vec<(f64, f64, TooltipVars)> {
        let (sx, sy) = geometry.anchor();
        let mut out = Vec::new();
        for (&i, segments) in &inspected.multiline_indices {
            for &j in segments {
                let hit = match self.options.line_policy {
                    LinePolicy::Interp => interpolation_hit(lines, i, j, geometry, mapping)
                        .map(|(x, y)| {
                            let p = mapping.map_to_screen(x, y);
                            (p.x, p.y, j, (x, y))
                        }),
                    LinePolicy::Prev => vertex_hit(lines, screen, i, j),
                    LinePolicy::Next => vertex_hit(lines, screen, i, j + 1),
                    LinePolicy::Nearest => {
                        let jj = nearest_vertex(screen, i, j, geometry, (sx, sy));
                        vertex_hit(lines, screen, i, jj)
                    }
                };
                let Some((rx, ry, jj, (data_x, data_y))) = hit else {
                    continue;
                };
                out.push((
                    rx,
                    ry,
                    TooltipVars {
                        index: i,
                        segment_index: Some(jj),
                        data_x,
                        data_y,
                        ..base
                    },
                ));
            }
        }
        out
    }

    fn render_rows(&self, source: &ColumnDataSource, vars: &TooltipVars) -> Vec<TooltipRow> {
        self.options
            .tooltips
            .iter()
            .map(|(label, template)| render_row(label, template, source, vars))
            .collect()
    }

    /// Drops the tooltips and empties every inspected set.
    fn clear(&mut self, plot: &mut Plot) -> Result<()> {
        self.tooltips.clear();
        for renderer in self.renderers(plot) {
            let source = plot.renderer_source_mut(renderer)?;
            if source.inspected.is_empty() {
                continue;
            }
            source.inspected.clear();
            source.emit_inspect();
        }
        Ok(())
    }
}

fn vertex_hit(
    lines: &LinesData,
    screen: &LinesGeometry,
    i: usize,
    j: usize,
) -> Option<(f64, f64, usize, (f64, f64))> {
    let (rx, ry) = screen.vertex(i, j)?;
    let data = lines.vertex(i, j)?;
    Some((rx, ry, j, data))
}

/// The end of segment `j` closest to the pointer: by x for vertical spans, by y for horizontal
/// spans, euclidean otherwise. Ties go to the segment end.
fn nearest_vertex(
    screen: &LinesGeometry,
    i: usize,
    j: usize,
    geometry: &HitGeometry,
    (sx, sy): (f64, f64),
) -> usize {
    let (Some(a), Some(b)) = (screen.vertex(i, j), screen.vertex(i, j + 1)) else {
        return j;
    };
    let dist = |(x, y): (f64, f64)| match geometry {
        HitGeometry::Span {
            direction: SpanDirection::H,
            ..
        } => (x - sx).abs(),
        HitGeometry::Span {
            direction: SpanDirection::V,
            ..
        } => (y - sy).abs(),
        _ => (x - sx).hypot(y - sy),
    };
    if dist(a) < dist(b) { j } else { j + 1 }
}

/// Data-space position of a point glyph row.
fn anchor_data(data: &GlyphData, i: usize) -> (f64, f64) {
    let (x, y) = match data {
        GlyphData::Point(d) => (&d.x, &d.y),
        GlyphData::Text(d) => (&d.x, &d.y),
        GlyphData::Lines(_) => return (f64::NAN, f64::NAN),
    };
    (
        x.get(i).copied().unwrap_or(f64::NAN),
        y.get(i).copied().unwrap_or(f64::NAN),
    )
}
