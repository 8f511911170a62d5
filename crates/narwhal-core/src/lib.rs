#![forbid(unsafe_code)]

//! Data model for the narwhal plot core (headless).
//!
//! - [`source::ColumnDataSource`]: row-aligned named columns with two-tier change notification
//! - [`selection::Selection`]: selected/inspected row indices
//! - [`scale`]: data space <-> screen space transforms
//! - [`geom`]: typed screen/data points and bounding boxes

pub mod error;
pub mod geom;
pub mod scale;
pub mod selection;
pub mod signal;
pub mod source;

pub use error::{Error, Result};
pub use geom::{BBox, DataPoint, ScreenPoint, data_point, screen_point};
pub use scale::{CoordinateMapping, Range1d, Scale, ScaleKind};
pub use selection::{Selection, SelectionMode};
pub use signal::{Emitter, SubscriberId};
pub use source::{Column, ColumnData, ColumnDataSource, ColumnKind, SourceSignals, Value};
