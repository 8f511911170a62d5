#![forbid(unsafe_code)]

//! Headless glyph rendering for narwhal plots.
//!
//! Glyph views ([`glyph`]) read a [`narwhal_core::ColumnDataSource`], map rows to screen space,
//! and draw them through a [`context::RenderContext`]. [`renderer::GlyphRenderer`] binds a glyph
//! to a source and keeps a lazily rebuilt spatial index for hit-testing; [`plot::Plot`] owns the
//! sources, the renderers and the constraint-solved canvas, and renders scenes to SVG.

pub mod context;
pub mod error;
pub mod glyph;
pub mod hittest;
pub mod plot;
pub mod registry;
pub mod renderer;
pub mod selection_manager;
pub mod spatial;
pub mod svg;
pub mod text;
pub mod visuals;

pub use context::{RecordingContext, RenderContext};
pub use error::{Error, Result};
pub use glyph::{Ellipse, Glyph, GlyphData, MultiLine, Rect, ScreenGeometry, Text};
pub use hittest::{HitGeometry, SpanDirection};
pub use plot::{Legend, LegendEntry, LegendLocation, Plot, PlotSpec, RangeSpec, RendererSpec};
pub use registry::{GlyphFactory, GlyphRegistry};
pub use renderer::{GlyphRenderer, RendererId};
pub use svg::SvgContext;
pub use text::{DeterministicTextMeasurer, TextMeasurer, TextMetrics, TextStyle};
pub use visuals::{DistanceSpec, SpatialUnits, Spec, Visuals};
