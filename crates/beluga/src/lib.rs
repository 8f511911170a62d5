#![forbid(unsafe_code)]

//! Headless linear constraint solving for plot layout.
//!
//! `beluga` solves weighted linear constraint systems (required constraints are hard, the other
//! strengths are weighted least squares) and builds layout boxes on top: a rectangle whose edges
//! are solver variables, and a canvas whose plot frame is inset from the canvas edges.

pub mod canvas;
pub mod error;
pub mod layout;
pub mod solver;

pub use canvas::{Borders, Canvas};
pub use error::{Error, Result};
pub use layout::{BoxGeometry, LayoutBox, ViewTransform};
pub use solver::{
    Constraint, ConstraintId, Expression, RelationalOperator, Solver, Strength, Variable,
};
