use crate::error::Result;
use crate::solver::{Constraint, Solver, Strength, Variable};

/// A rectangle whose edges are solver variables.
///
/// The box registers its own consistency constraints on creation; callers add the constraints
/// that position it and read the values back after [`Solver::update_variables`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutBox {
    pub left: Variable,
    pub top: Variable,
    pub right: Variable,
    pub bottom: Variable,
    pub width: Variable,
    pub height: Variable,
    pub hcenter: Variable,
    pub vcenter: Variable,
}

impl LayoutBox {
    pub fn new(solver: &mut Solver, name: &str) -> Result<Self> {
        let mut var = |field: &str| solver.new_variable(format!("{name}.{field}"));
        let b = Self {
            left: var("left"),
            top: var("top"),
            right: var("right"),
            bottom: var("bottom"),
            width: var("width"),
            height: var("height"),
            hcenter: var("hcenter"),
            vcenter: var("vcenter"),
        };

        let required = Strength::Required;
        solver.add_constraint(Constraint::eq(b.left + b.width, b.right, required))?;
        solver.add_constraint(Constraint::eq(b.top + b.height, b.bottom, required))?;
        solver.add_constraint(Constraint::eq(
            b.left + b.width * 0.5,
            b.hcenter,
            required,
        ))?;
        solver.add_constraint(Constraint::eq(
            b.top + b.height * 0.5,
            b.vcenter,
            required,
        ))?;
        solver.add_constraint(Constraint::ge(b.width, 0.0, required))?;
        solver.add_constraint(Constraint::ge(b.height, 0.0, required))?;
        Ok(b)
    }

    /// Snapshot of the solved values.
    pub fn geometry(&self, solver: &Solver) -> BoxGeometry {
        BoxGeometry {
            left: solver.value(self.left),
            top: solver.value(self.top),
            right: solver.value(self.right),
            bottom: solver.value(self.bottom),
            width: solver.value(self.width),
            height: solver.value(self.height),
            hcenter: solver.value(self.hcenter),
            vcenter: solver.value(self.vcenter),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxGeometry {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
    pub hcenter: f64,
    pub vcenter: f64,
}

impl BoxGeometry {
    /// `(left, top, right, bottom)`.
    pub fn bbox(&self) -> (f64, f64, f64, f64) {
        (self.left, self.top, self.right, self.bottom)
    }

    pub fn xview(&self) -> ViewTransform {
        ViewTransform::Horizontal { left: self.left }
    }

    pub fn yview(&self) -> ViewTransform {
        ViewTransform::Vertical {
            bottom: self.bottom,
        }
    }
}

/// Box-relative offsets to canvas pixels. The vertical view flips the axis so offsets grow
/// upwards from the box bottom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewTransform {
    Horizontal { left: f64 },
    Vertical { bottom: f64 },
}

impl ViewTransform {
    pub fn compute(&self, value: f64) -> f64 {
        match *self {
            ViewTransform::Horizontal { left } => left + value,
            ViewTransform::Vertical { bottom } => bottom - value,
        }
    }

    pub fn invert(&self, screen: f64) -> f64 {
        match *self {
            ViewTransform::Horizontal { left } => screen - left,
            ViewTransform::Vertical { bottom } => bottom - screen,
        }
    }

    pub fn v_compute(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|v| self.compute(*v)).collect()
    }

    pub fn v_invert(&self, screens: &[f64]) -> Vec<f64> {
        screens.iter().map(|s| self.invert(*s)).collect()
    }
}
