use crate::error::Result;
use crate::layout::{BoxGeometry, LayoutBox};
use crate::solver::{Constraint, Solver, Strength};

/// Minimum distance between the canvas edges and the plot frame, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Borders {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Borders {
    pub fn uniform(value: f64) -> Self {
        Self {
            left: value,
            top: value,
            right: value,
            bottom: value,
        }
    }
}

impl Default for Borders {
    fn default() -> Self {
        Self::uniform(5.0)
    }
}

/// The canvas box (origin at the top-left corner, sized by the caller) and the plot frame inset
/// inside it.
#[derive(Debug, Clone)]
pub struct Canvas {
    solver: Solver,
    canvas: LayoutBox,
    frame: LayoutBox,
    borders: Borders,
    size: (f64, f64),
}

impl Canvas {
    pub fn new(width: f64, height: f64, borders: Borders) -> Result<Self> {
        let mut solver = Solver::new();
        let canvas = LayoutBox::new(&mut solver, "canvas")?;
        let frame = LayoutBox::new(&mut solver, "frame")?;

        let required = Strength::Required;
        solver.add_constraint(Constraint::eq(canvas.left, 0.0, required))?;
        solver.add_constraint(Constraint::eq(canvas.top, 0.0, required))?;

        solver.add_constraint(Constraint::ge(frame.left, canvas.left, required))?;
        solver.add_constraint(Constraint::ge(frame.top, canvas.top, required))?;
        solver.add_constraint(Constraint::le(frame.right, canvas.right, required))?;
        solver.add_constraint(Constraint::le(frame.bottom, canvas.bottom, required))?;

        let inset = Strength::Medium;
        solver.add_constraint(Constraint::eq(
            frame.left,
            canvas.left + borders.left,
            inset,
        ))?;
        solver.add_constraint(Constraint::eq(frame.top, canvas.top + borders.top, inset))?;
        solver.add_constraint(Constraint::eq(
            frame.right,
            canvas.right - borders.right,
            inset,
        ))?;
        solver.add_constraint(Constraint::eq(
            frame.bottom,
            canvas.bottom - borders.bottom,
            inset,
        ))?;

        solver.add_edit_variable(canvas.width, Strength::Strong)?;
        solver.add_edit_variable(canvas.height, Strength::Strong)?;

        let mut out = Self {
            solver,
            canvas,
            frame,
            borders,
            size: (width, height),
        };
        out.set_size(width, height)?;
        out.solve()?;
        Ok(out)
    }

    pub fn borders(&self) -> Borders {
        self.borders
    }

    pub fn size(&self) -> (f64, f64) {
        self.size
    }

    /// Suggests new canvas dimensions. Values are only visible after [`Canvas::solve`].
    pub fn set_size(&mut self, width: f64, height: f64) -> Result<()> {
        self.solver.suggest_value(self.canvas.width, width)?;
        self.solver.suggest_value(self.canvas.height, height)?;
        self.size = (width, height);
        Ok(())
    }

    pub fn solve(&mut self) -> Result<()> {
        self.solver.update_variables()?;
        tracing::debug!(
            width = self.size.0,
            height = self.size.1,
            "canvas layout solved"
        );
        Ok(())
    }

    pub fn canvas_geometry(&self) -> BoxGeometry {
        self.canvas.geometry(&self.solver)
    }

    pub fn frame_geometry(&self) -> BoxGeometry {
        self.frame.geometry(&self.solver)
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }
}
