//! Draws new multi-line rows vertex by vertex.
//!
//! Double-tap starts a row (`xs=[x, x]`), each tap fixes the trailing vertex and starts the next
//! one, moves drag the trailing vertex along, and a second double-tap finishes the row. Existing
//! rows can be selected, dragged and deleted.

use crate::edit::{
    delete_selected, emit_cds_changes, line_fields, map_drag, point_fields, pop_rows,
    select_event, set_vertices, snap_to_vertex,
};
use crate::event::{Key, UiEvent};
use crate::{Error, Result};
use narwhal_core::Value;
use narwhal_render::{Plot, RendererId, selection_manager};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PolyDrawOptions {
    /// Multi-line renderers the tool edits; new rows go to the first one.
    pub renderers: Vec<RendererId>,
    /// Point renderer showing every vertex; taps snap to the vertices it hits.
    pub vertex_renderer: Option<RendererId>,
    /// Whether pans move the selected rows.
    pub drag: bool,
    /// Upper bound on the number of rows; the oldest rows are dropped first. 0 is unlimited.
    pub num_objects: usize,
    /// Value used to pad the non-coordinate columns of a new row.
    pub empty_value: Option<Value>,
}

impl Default for PolyDrawOptions {
    fn default() -> Self {
        Self {
            renderers: Vec::new(),
            vertex_renderer: None,
            drag: true,
            num_objects: 0,
            empty_value: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DrawMode {
    /// Start a new row.
    New,
    /// Fix the trailing vertex and start the next one.
    Add,
    /// Move the trailing vertex.
    Edit,
}

#[derive(Debug)]
pub struct PolyDrawTool {
    options: PolyDrawOptions,
    active: bool,
    drawing: bool,
    basepoint: Option<(f64, f64)>,
    mouse_in_frame: bool,
}

impl PolyDrawTool {
    /// Checks that every renderer draws multi-lines from columns (and the vertex renderer
    /// points from columns).
    pub fn new(plot: &Plot, options: PolyDrawOptions) -> Result<Self> {
        if options.renderers.is_empty() {
            return Err(Error::InvalidTool {
                tool_type: "poly_draw".to_string(),
                message: "at least one renderer is required".to_string(),
            });
        }
        for &renderer in &options.renderers {
            line_fields(plot, renderer)?;
        }
        if let Some(vertex) = options.vertex_renderer {
            point_fields(plot, vertex)?;
        }
        Ok(Self {
            options,
            active: false,
            drawing: false,
            basepoint: None,
            mouse_in_frame: false,
        })
    }

    pub fn options(&self) -> &PolyDrawOptions {
        &self.options
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn activate(&mut self, plot: &mut Plot) -> Result<()> {
        self.active = true;
        self.show_vertices(plot)
    }

    /// Drops an unfinished trailing vertex and hides the vertices.
    pub fn deactivate(&mut self, plot: &mut Plot) -> Result<()> {
        if self.drawing {
            self.remove(plot)?;
            self.drawing = false;
        }
        if let Some(vertex) = self.options.vertex_renderer {
            set_vertices(plot, vertex, Vec::new(), Vec::new())?;
        }
        self.active = false;
        self.basepoint = None;
        Ok(())
    }

    pub fn handle(&mut self, plot: &mut Plot, event: &UiEvent) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        if let Some((sx, sy)) = event.position() {
            self.mouse_in_frame = plot.frame_bbox().contains(sx, sy);
        }
        tracing::trace!(event = event.name(), drawing = self.drawing, "poly draw");

        match *event {
            UiEvent::Tap { sx, sy, shift } => {
                if self.drawing {
                    self.draw(plot, sx, sy, DrawMode::Add, true)?;
                } else {
                    select_event(plot, sx, sy, shift, &self.options.renderers)?;
                }
            }
            UiEvent::DoubleTap { sx, sy } => {
                if self.drawing {
                    self.drawing = false;
                    self.draw(plot, sx, sy, DrawMode::Edit, true)?;
                    tracing::debug!("poly draw finished a row");
                } else {
                    self.drawing = self.draw(plot, sx, sy, DrawMode::New, true)?;
                    if self.drawing {
                        tracing::debug!("poly draw started a row");
                    }
                }
            }
            UiEvent::Move { sx, sy } => {
                if !self.drawing {
                    return Ok(());
                }
                self.draw(plot, sx, sy, DrawMode::Edit, false)?;
            }
            UiEvent::MoveExit => {
                self.mouse_in_frame = false;
                return Ok(());
            }
            UiEvent::PanStart { sx, sy } => {
                if !self.options.drag {
                    return Ok(());
                }
                select_event(plot, sx, sy, true, &self.options.renderers)?;
                self.basepoint = Some((sx, sy));
            }
            UiEvent::Pan { sx, sy } => self.pan(plot, sx, sy)?,
            UiEvent::PanEnd { sx, sy } => {
                if !self.options.drag {
                    return Ok(());
                }
                self.pan(plot, sx, sy)?;
                for &renderer in &self.options.renderers {
                    emit_cds_changes(plot.renderer_source_mut(renderer)?, true, true, true);
                }
                self.basepoint = None;
            }
            UiEvent::KeyUp { key } => self.key_up(plot, key)?,
        }
        self.show_vertices(plot)
    }

    fn key_up(&mut self, plot: &mut Plot, key: Key) -> Result<()> {
        if !self.mouse_in_frame {
            return Ok(());
        }
        for i in 0..self.options.renderers.len() {
            let renderer = self.options.renderers[i];
            match key {
                Key::Backspace => {
                    delete_selected(plot.renderer_source_mut(renderer)?)?;
                }
                Key::Escape => {
                    if self.drawing {
                        self.remove(plot)?;
                        self.drawing = false;
                    }
                    selection_manager::clear(plot.renderer_source_mut(renderer)?);
                }
            }
        }
        Ok(())
    }

    /// Applies one drawing step to the last row of the first renderer. Returns `false` when
    /// nothing changed (pointer outside the frame, no row to edit).
    fn draw(
        &mut self,
        plot: &mut Plot,
        sx: f64,
        sy: f64,
        mode: DrawMode,
        emit: bool,
    ) -> Result<bool> {
        let Some(&renderer) = self.options.renderers.first() else {
            return Ok(false);
        };
        let Some(point) = map_drag(plot, sx, sy)? else {
            return Ok(false);
        };
        let (x, y) = match self.options.vertex_renderer {
            Some(vertex) => snap_to_vertex(plot, vertex, (sx, sy), point, None)?,
            None => point,
        };
        let (xkey, ykey) = line_fields(plot, renderer)?;
        let source = plot.renderer_source_mut(renderer)?;

        match mode {
            DrawMode::New => {
                if pop_rows(source, self.options.num_objects) > 0 {
                    source.selected.clear();
                }
                source.append(&xkey, Value::NumberList(vec![x, x]))?;
                source.append(&ykey, Value::NumberList(vec![y, y]))?;
                source.pad_empty_columns(&[&xkey, &ykey], self.options.empty_value.as_ref())?;
            }
            DrawMode::Edit | DrawMode::Add => {
                let Some((row, last)) = trailing_vertex(source, &xkey, &ykey)? else {
                    tracing::warn!("no row to extend");
                    return Ok(false);
                };
                source.set_in_row(&xkey, row, last, x)?;
                source.set_in_row(&ykey, row, last, y)?;
                if mode == DrawMode::Add {
                    source.splice_row(&xkey, row, last + 1, 0, &[x])?;
                    source.splice_row(&ykey, row, last + 1, 0, &[y])?;
                }
            }
        }
        emit_cds_changes(source, true, false, emit);
        Ok(true)
    }

    /// Removes the trailing vertex of the row being drawn.
    fn remove(&mut self, plot: &mut Plot) -> Result<()> {
        let Some(&renderer) = self.options.renderers.first() else {
            return Ok(());
        };
        let (xkey, ykey) = line_fields(plot, renderer)?;
        let source = plot.renderer_source_mut(renderer)?;
        if let Some((row, last)) = trailing_vertex(source, &xkey, &ykey)? {
            source.splice_row(&xkey, row, last, 1, &[])?;
            source.splice_row(&ykey, row, last, 1, &[])?;
        }
        emit_cds_changes(source, true, true, true);
        Ok(())
    }

    /// Moves every vertex of the selected rows by the data-space pointer delta.
    fn pan(&mut self, plot: &mut Plot, sx: f64, sy: f64) -> Result<()> {
        let Some((bx, by)) = self.basepoint else {
            return Ok(());
        };
        if !self.options.drag {
            return Ok(());
        }
        if let (Some((px, py)), Some((x, y))) = (map_drag(plot, bx, by)?, map_drag(plot, sx, sy)?) {
            let (dx, dy) = (x - px, y - py);
            for &renderer in &self.options.renderers {
                let (xkey, ykey) = line_fields(plot, renderer)?;
                let source = plot.renderer_source_mut(renderer)?;
                let len = source.len();
                let rows: Vec<usize> = source
                    .selected
                    .indices
                    .iter()
                    .copied()
                    .filter(|&row| row < len)
                    .collect();
                for row in rows {
                    let xs = source.row(&xkey, row)?.iter().map(|v| v + dx).collect();
                    let ys = source.row(&ykey, row)?.iter().map(|v| v + dy).collect();
                    source.set_row(&xkey, row, xs)?;
                    source.set_row(&ykey, row, ys)?;
                }
                source.emit_change();
            }
        }
        self.basepoint = Some((sx, sy));
        Ok(())
    }

    /// Mirrors every vertex into the vertex renderer, minus the one following the pointer.
    fn show_vertices(&self, plot: &mut Plot) -> Result<()> {
        let Some(vertex) = self.options.vertex_renderer else {
            return Ok(());
        };
        if !self.active {
            return Ok(());
        }
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for (k, &renderer) in self.options.renderers.iter().enumerate() {
            let (xkey, ykey) = line_fields(plot, renderer)?;
            let source = plot.renderer_source(renderer)?;
            let rows_x = source.number_lists(&xkey)?;
            let rows_y = source.number_lists(&ykey)?;
            let last = rows_x.len().saturating_sub(1);
            for (i, (rx, ry)) in rows_x.iter().zip(rows_y).enumerate() {
                let mut n = rx.len().min(ry.len());
                if self.drawing && k == 0 && i == last {
                    n = n.saturating_sub(1);
                }
                xs.extend_from_slice(&rx[..n]);
                ys.extend_from_slice(&ry[..n]);
            }
        }
        set_vertices(plot, vertex, xs, ys)
    }
}

/// `(row, vertex)` of the trailing vertex of the last row, if that row has a vertex in both
/// coordinate columns.
fn trailing_vertex(
    source: &narwhal_core::ColumnDataSource,
    xkey: &str,
    ykey: &str,
) -> Result<Option<(usize, usize)>> {
    let Some(row) = source.len().checked_sub(1) else {
        return Ok(None);
    };
    let n = source.row(xkey, row)?.len().min(source.row(ykey, row)?.len());
    Ok(n.checked_sub(1).map(|last| (row, last)))
}
