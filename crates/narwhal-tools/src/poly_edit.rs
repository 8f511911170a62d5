//! Edits the vertices of an existing multi-line row.
//!
//! Double-tapping a row copies its `xs`/`ys` into the vertex renderer's source. Vertex edits
//! (drag, insert, delete) happen on that copy and are written back to the row after every
//! change. Double-tapping a vertex inserts a new one after it and follows the pointer until the
//! next double-tap on a vertex.

use crate::edit::{
    delete_selected, emit_cds_changes, line_fields, map_drag, point_fields, select_event,
    set_vertices, snap_to_vertex,
};
use crate::event::{Key, UiEvent};
use crate::{Error, Result};
use narwhal_core::{Selection, Value};
use narwhal_render::{Plot, RendererId, selection_manager};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PolyEditOptions {
    /// Multi-line renderers whose rows can be edited.
    #[serde(default)]
    pub renderers: Vec<RendererId>,
    /// Point renderer holding the vertices of the row being edited.
    pub vertex_renderer: RendererId,
}

/// The row whose vertices are mirrored into the vertex renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditTarget {
    pub renderer: RendererId,
    pub row: usize,
}

#[derive(Debug)]
pub struct PolyEditTool {
    options: PolyEditOptions,
    active: bool,
    drawing: bool,
    target: Option<EditTarget>,
    basepoint: Option<(f64, f64)>,
    mouse_in_frame: bool,
}

impl PolyEditTool {
    pub fn new(plot: &Plot, options: PolyEditOptions) -> Result<Self> {
        if options.renderers.is_empty() {
            return Err(Error::InvalidTool {
                tool_type: "poly_edit".to_string(),
                message: "at least one renderer is required".to_string(),
            });
        }
        for &renderer in &options.renderers {
            line_fields(plot, renderer)?;
        }
        point_fields(plot, options.vertex_renderer)?;
        Ok(Self {
            options,
            active: false,
            drawing: false,
            target: None,
            basepoint: None,
            mouse_in_frame: false,
        })
    }

    pub fn options(&self) -> &PolyEditOptions {
        &self.options
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn target(&self) -> Option<EditTarget> {
        self.target
    }

    pub fn selected_renderer(&self) -> Option<RendererId> {
        self.target.map(|t| t.renderer)
    }

    pub fn activate(&mut self, _plot: &mut Plot) -> Result<()> {
        self.active = true;
        Ok(())
    }

    pub fn deactivate(&mut self, plot: &mut Plot) -> Result<()> {
        self.active = false;
        self.basepoint = None;
        if self.target.is_none() {
            return Ok(());
        }
        if self.drawing {
            self.remove_vertex(plot)?;
            self.drawing = false;
        }
        self.hide_vertices(plot)
    }

    pub fn handle(&mut self, plot: &mut Plot, event: &UiEvent) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        if let Some((sx, sy)) = event.position() {
            self.mouse_in_frame = plot.frame_bbox().contains(sx, sy);
        }
        tracing::trace!(
            event = event.name(),
            drawing = self.drawing,
            editing = self.target.is_some(),
            "poly edit"
        );

        match *event {
            UiEvent::Tap { sx, sy, shift } => self.tap(plot, sx, sy, shift),
            UiEvent::DoubleTap { sx, sy } => self.double_tap(plot, sx, sy),
            UiEvent::Move { sx, sy } => self.pointer_move(plot, sx, sy),
            UiEvent::MoveExit => {
                self.mouse_in_frame = false;
                Ok(())
            }
            UiEvent::PanStart { sx, sy } => {
                select_event(plot, sx, sy, true, &[self.options.vertex_renderer])?;
                self.basepoint = Some((sx, sy));
                Ok(())
            }
            UiEvent::Pan { sx, sy } => {
                if self.basepoint.is_none() {
                    return Ok(());
                }
                self.drag_vertices(plot, sx, sy)?;
                self.write_back(plot, true, false, false)
            }
            UiEvent::PanEnd { sx, sy } => {
                if self.basepoint.is_none() {
                    return Ok(());
                }
                self.drag_vertices(plot, sx, sy)?;
                let vertices = plot.renderer_source_mut(self.options.vertex_renderer)?;
                emit_cds_changes(vertices, false, true, true);
                self.write_back(plot, true, true, true)?;
                self.basepoint = None;
                Ok(())
            }
            UiEvent::KeyUp { key } => self.key_up(plot, key),
        }
    }

    fn double_tap(&mut self, plot: &mut Plot, sx: f64, sy: f64) -> Result<()> {
        let Some((x, y)) = map_drag(plot, sx, sy)? else {
            return Ok(());
        };
        let vertex = self.options.vertex_renderer;
        let vertex_hit = !select_event(plot, sx, sy, false, &[vertex])?.is_empty();
        if !(vertex_hit && self.target.is_some()) {
            return self.show_vertices(plot, sx, sy);
        }

        let (pxkey, pykey) = point_fields(plot, vertex)?;
        let vertices = plot.renderer_source_mut(vertex)?;
        let Some(index) = vertices.selected.first() else {
            return Ok(());
        };
        if self.drawing {
            self.drawing = false;
            selection_manager::clear(vertices);
            tracing::debug!(index, "poly edit committed vertex");
        } else {
            vertices.splice(&pxkey, index + 1, 0, vec![Value::Number(x)])?;
            vertices.splice(&pykey, index + 1, 0, vec![Value::Number(y)])?;
            vertices.selected = Selection::from_indices([index + 1]);
            self.drawing = true;
            tracing::debug!(index = index + 1, "poly edit inserted vertex");
        }
        vertices.emit_change();
        self.write_back(plot, true, true, true)
    }

    fn tap(&mut self, plot: &mut Plot, sx: f64, sy: f64, shift: bool) -> Result<()> {
        let Some(point) = map_drag(plot, sx, sy)? else {
            return Ok(());
        };
        let vertex = self.options.vertex_renderer;
        if !(self.drawing && self.target.is_some()) {
            select_event(plot, sx, sy, shift, &[vertex])?;
            select_event(plot, sx, sy, shift, &self.options.renderers)?;
            return Ok(());
        }

        let Some(index) = plot.renderer_source(vertex)?.selected.first() else {
            return Ok(());
        };
        let (x, y) = snap_to_vertex(plot, vertex, (sx, sy), point, Some(index))?;
        let (pxkey, pykey) = point_fields(plot, vertex)?;
        let vertices = plot.renderer_source_mut(vertex)?;
        let Some(&nx) = vertices.numbers(&pxkey)?.get(index) else {
            return Ok(());
        };
        let Some(&ny) = vertices.numbers(&pykey)?.get(index) else {
            return Ok(());
        };
        vertices.set_number(&pxkey, index, x)?;
        vertices.set_number(&pykey, index, y)?;
        vertices.splice(&pxkey, index + 1, 0, vec![Value::Number(nx)])?;
        vertices.splice(&pykey, index + 1, 0, vec![Value::Number(ny)])?;
        vertices.selected = Selection::from_indices([index + 1]);
        vertices.emit_change();
        self.write_back(plot, true, false, true)
    }

    /// While drawing, the selected vertex follows the pointer (snapping to other vertices).
    fn pointer_move(&mut self, plot: &mut Plot, sx: f64, sy: f64) -> Result<()> {
        if !(self.drawing && self.target.is_some()) {
            return Ok(());
        }
        let Some(point) = map_drag(plot, sx, sy)? else {
            return Ok(());
        };
        let vertex = self.options.vertex_renderer;
        let Some(index) = plot.renderer_source(vertex)?.selected.first() else {
            return Ok(());
        };
        let (x, y) = snap_to_vertex(plot, vertex, (sx, sy), point, Some(index))?;
        let (pxkey, pykey) = point_fields(plot, vertex)?;
        let vertices = plot.renderer_source_mut(vertex)?;
        vertices.set_number(&pxkey, index, x)?;
        vertices.set_number(&pykey, index, y)?;
        vertices.emit_change();
        self.write_back(plot, true, false, false)
    }

    fn key_up(&mut self, plot: &mut Plot, key: Key) -> Result<()> {
        if !self.mouse_in_frame {
            return Ok(());
        }
        let renderers = if self.target.is_some() {
            vec![self.options.vertex_renderer]
        } else {
            self.options.renderers.clone()
        };
        for renderer in renderers {
            match key {
                Key::Backspace => {
                    delete_selected(plot.renderer_source_mut(renderer)?)?;
                    self.write_back(plot, true, true, true)?;
                }
                Key::Escape => {
                    if self.drawing {
                        self.remove_vertex(plot)?;
                        self.drawing = false;
                    } else if self.target.is_some() {
                        self.hide_vertices(plot)?;
                    }
                    let source = plot.renderer_source_mut(renderer)?;
                    emit_cds_changes(source, false, true, false);
                }
            }
        }
        Ok(())
    }

    /// Mirrors the row under the pointer into the vertex renderer, or clears the mirror on a
    /// miss.
    fn show_vertices(&mut self, plot: &mut Plot, sx: f64, sy: f64) -> Result<()> {
        let hit = select_event(plot, sx, sy, false, &self.options.renderers)?;
        let Some(&renderer) = hit.first() else {
            return self.hide_vertices(plot);
        };
        let Some(row) = plot.renderer_source(renderer)?.selected.first() else {
            return self.hide_vertices(plot);
        };
        let (xkey, ykey) = line_fields(plot, renderer)?;
        let source = plot.renderer_source(renderer)?;
        let xs = source.row(&xkey, row)?.to_vec();
        let ys = source.row(&ykey, row)?.to_vec();
        set_vertices(plot, self.options.vertex_renderer, xs, ys)?;
        self.target = Some(EditTarget { renderer, row });
        tracing::debug!(renderer, row, "poly edit showing vertices");
        Ok(())
    }

    fn hide_vertices(&mut self, plot: &mut Plot) -> Result<()> {
        set_vertices(plot, self.options.vertex_renderer, Vec::new(), Vec::new())?;
        self.target = None;
        self.drawing = false;
        Ok(())
    }

    /// Deletes the vertex being placed.
    fn remove_vertex(&mut self, plot: &mut Plot) -> Result<()> {
        if !(self.drawing && self.target.is_some()) {
            return Ok(());
        }
        let vertex = self.options.vertex_renderer;
        let (pxkey, pykey) = point_fields(plot, vertex)?;
        let vertices = plot.renderer_source_mut(vertex)?;
        if let Some(index) = vertices.selected.first().filter(|&i| i < vertices.len()) {
            vertices.splice(&pxkey, index, 1, Vec::new())?;
            vertices.splice(&pykey, index, 1, Vec::new())?;
        }
        vertices.emit_change();
        self.write_back(plot, true, true, true)
    }

    /// Moves the selected vertices by the data-space pointer delta.
    fn drag_vertices(&mut self, plot: &mut Plot, sx: f64, sy: f64) -> Result<()> {
        let Some((bx, by)) = self.basepoint else {
            return Ok(());
        };
        let vertex = self.options.vertex_renderer;
        let from = map_drag(plot, bx, by)?;
        let to = map_drag(plot, sx, sy)?;
        if let (Some((px, py)), Some((x, y))) = (from, to) {
            let (dx, dy) = (x - px, y - py);
            let (pxkey, pykey) = point_fields(plot, vertex)?;
            let vertices = plot.renderer_source_mut(vertex)?;
            let len = vertices.len();
            let selected: Vec<usize> = vertices
                .selected
                .indices
                .iter()
                .copied()
                .filter(|&i| i < len)
                .collect();
            for index in selected {
                let vx = vertices.numbers(&pxkey)?.get(index).copied();
                let vy = vertices.numbers(&pykey)?.get(index).copied();
                let (Some(vx), Some(vy)) = (vx, vy) else {
                    tracing::warn!(index, "selected vertex is missing a coordinate");
                    continue;
                };
                vertices.set_number(&pxkey, index, vx + dx)?;
                vertices.set_number(&pykey, index, vy + dy)?;
            }
            vertices.emit_change();
        }
        self.basepoint = Some((sx, sy));
        Ok(())
    }

    /// Copies the vertex renderer's coordinates back into the edited row.
    fn write_back(&mut self, plot: &mut Plot, redraw: bool, clear: bool, emit: bool) -> Result<()> {
        let Some(target) = self.target else {
            return Ok(());
        };
        let vertex = self.options.vertex_renderer;
        let (pxkey, pykey) = point_fields(plot, vertex)?;
        let vertices = plot.renderer_source(vertex)?;
        let xs = vertices.numbers(&pxkey)?.to_vec();
        let ys = vertices.numbers(&pykey)?.to_vec();

        let (xkey, ykey) = line_fields(plot, target.renderer)?;
        let source = plot.renderer_source_mut(target.renderer)?;
        if target.row >= source.len() {
            tracing::warn!(row = target.row, "edited row no longer exists");
            self.target = None;
            self.drawing = false;
            return Ok(());
        }
        source.set_row(&xkey, target.row, xs)?;
        source.set_row(&ykey, target.row, ys)?;
        emit_cds_changes(source, redraw, clear, emit);
        Ok(())
    }
}
