//! Plumbing shared by the edit tools: pointer mapping, hit-driven selection, row deletion and
//! the vertex renderer helpers.

use crate::{Error, Result};
use narwhal_core::{Column, ColumnDataSource, SelectionMode};
use narwhal_render::{HitGeometry, Plot, RendererId, selection_manager};

/// Data-space position under a screen point; `None` outside the frame.
pub fn map_drag(plot: &Plot, sx: f64, sy: f64) -> Result<Option<(f64, f64)>> {
    Ok(plot.screen_to_data(sx, sy)?.map(|p| (p.x, p.y)))
}

/// Post-edit notifications: optionally clear the selection, then fire the structural tier
/// (`redraw`) and the repaint tier (`emit`).
pub fn emit_cds_changes(source: &mut ColumnDataSource, redraw: bool, clear: bool, emit: bool) {
    if clear {
        selection_manager::clear(source);
    }
    if redraw {
        source.emit_change();
    }
    if emit {
        source.emit_data_change();
    }
}

/// Point-selects under `(sx, sy)` on each renderer and returns the ones that were hit.
/// Outside the frame nothing is touched.
pub fn select_event(
    plot: &mut Plot,
    sx: f64,
    sy: f64,
    append: bool,
    renderers: &[RendererId],
) -> Result<Vec<RendererId>> {
    if !plot.frame_bbox().contains(sx, sy) {
        return Ok(Vec::new());
    }
    let mode = if append {
        SelectionMode::Append
    } else {
        SelectionMode::Replace
    };
    let hit = HitGeometry::point(sx, sy);
    let mut selected = Vec::new();
    for &renderer in renderers {
        if plot.select(renderer, &hit, mode)? {
            selected.push(renderer);
        }
    }
    Ok(selected)
}

/// Deletes the selected rows from every column of the source, preserving row order.
pub fn delete_selected(source: &mut ColumnDataSource) -> Result<usize> {
    let len = source.len();
    let rows = source
        .selected
        .indices
        .iter()
        .copied()
        .filter(|&row| row < len)
        .collect();
    let removed = source.remove_rows(&rows)?;
    tracing::debug!(removed, "deleted selected rows");
    emit_cds_changes(source, true, true, true);
    Ok(removed)
}

/// Drops the oldest rows so that one more row fits under `num_objects` (0 = unlimited).
/// Returns the number of dropped rows.
pub fn pop_rows(source: &mut ColumnDataSource, num_objects: usize) -> usize {
    if num_objects == 0 {
        return 0;
    }
    let len = source.len();
    let drop = (len + 1).saturating_sub(num_objects).min(len);
    source.pop_front_rows(drop);
    drop
}

/// `xs`/`ys` column names of a multi-line renderer.
pub fn line_fields(plot: &Plot, renderer: RendererId) -> Result<(String, String)> {
    let r = plot.renderer(renderer)?;
    match r.glyph.coordinate_fields() {
        Some((x, y)) if r.glyph.is_multi() => Ok((x.to_string(), y.to_string())),
        _ => Err(Error::NotEditable {
            renderer: r.name.clone(),
            reason: format!("{} glyph has no xs/ys columns", r.glyph.type_name()),
        }),
    }
}

/// `x`/`y` column names of a point renderer (the vertex renderer).
pub fn point_fields(plot: &Plot, renderer: RendererId) -> Result<(String, String)> {
    let r = plot.renderer(renderer)?;
    match r.glyph.coordinate_fields() {
        Some((x, y)) if !r.glyph.is_multi() => Ok((x.to_string(), y.to_string())),
        _ => Err(Error::NotEditable {
            renderer: r.name.clone(),
            reason: format!("{} glyph has no x/y columns", r.glyph.type_name()),
        }),
    }
}

/// Replaces the vertex renderer's coordinates and clears its selection.
pub fn set_vertices(
    plot: &mut Plot,
    vertex_renderer: RendererId,
    xs: Vec<f64>,
    ys: Vec<f64>,
) -> Result<()> {
    let (xkey, ykey) = point_fields(plot, vertex_renderer)?;
    let source = plot.renderer_source_mut(vertex_renderer)?;
    source.insert_column(xkey, Column::Number(xs));
    source.insert_column(ykey, Column::Number(ys));
    emit_cds_changes(source, true, true, false);
    Ok(())
}

/// Snaps `(x, y)` to the first vertex under the pointer, ignoring `exclude` (the vertex being
/// dragged). Returns the position unchanged when no vertex is hit.
pub fn snap_to_vertex(
    plot: &mut Plot,
    vertex_renderer: RendererId,
    (sx, sy): (f64, f64),
    (x, y): (f64, f64),
    exclude: Option<usize>,
) -> Result<(f64, f64)> {
    let hit = plot.hit_test(vertex_renderer, &HitGeometry::point(sx, sy))?;
    let Some(index) = hit.indices.iter().copied().find(|&i| Some(i) != exclude) else {
        return Ok((x, y));
    };
    let (xkey, ykey) = point_fields(plot, vertex_renderer)?;
    let source = plot.renderer_source(vertex_renderer)?;
    let xs = source.numbers(&xkey)?;
    let ys = source.numbers(&ykey)?;
    match (xs.get(index), ys.get(index)) {
        (Some(&vx), Some(&vy)) => {
            tracing::trace!(index, x = vx, y = vy, "snapped to vertex");
            Ok((vx, vy))
        }
        _ => Ok((x, y)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use narwhal_core::Selection;

    #[test]
    fn pop_rows_keeps_room_for_one_more() {
        let mut source = ColumnDataSource::from_columns([
            ("xs", Column::NumberList(vec![vec![0.0], vec![1.0], vec![2.0]])),
            ("c", Column::Text(vec!["a".into(), "b".into(), "c".into()])),
        ]);
        assert_eq!(pop_rows(&mut source, 0), 0);
        assert_eq!(pop_rows(&mut source, 5), 0);
        assert_eq!(pop_rows(&mut source, 2), 2);
        assert_eq!(source.texts("c").unwrap(), ["c".to_string()]);
    }

    #[test]
    fn delete_selected_removes_rows_and_clears_the_selection() {
        let mut source = ColumnDataSource::from_columns([
            ("x", Column::Number(vec![0.0, 1.0, 2.0, 3.0])),
            ("c", Column::Text(vec!["a".into(), "b".into(), "c".into(), "d".into()])),
        ]);
        source.selected = Selection::from_indices([3, 1]);
        assert_eq!(delete_selected(&mut source).unwrap(), 2);
        assert_eq!(source.numbers("x").unwrap(), [0.0, 2.0]);
        assert_eq!(source.texts("c").unwrap(), ["a".to_string(), "c".to_string()]);
        assert!(source.selected.is_empty());
    }
}
