//! Selection updates driven by hit tests.
//!
//! Each function writes the source's selection state and fires the matching notification; data
//! columns are never touched.

use crate::Result;
use crate::hittest::HitGeometry;
use crate::renderer::GlyphRenderer;
use narwhal_core::{ColumnDataSource, CoordinateMapping, Selection, SelectionMode};

/// Hit-tests `hit` and merges the result into `source.selected` with `mode`. Returns whether
/// anything was hit; a miss still updates the selection (replace with a miss clears it).
pub fn select(
    renderer: &mut GlyphRenderer,
    source: &mut ColumnDataSource,
    hit: &HitGeometry,
    mapping: &CoordinateMapping,
    mode: SelectionMode,
) -> Result<bool> {
    let result = renderer.hit_test(source, hit, mapping)?;
    let did_hit = !result.is_empty();
    source.selected.update(&result, mode);
    source.emit_selected_change();
    tracing::debug!(
        renderer = %renderer.name,
        hit = did_hit,
        selected = source.selected.indices.len(),
        "selection updated"
    );
    Ok(did_hit)
}

/// Hit-tests `hit` into `source.inspected`, without touching the selection.
pub fn inspect(
    renderer: &mut GlyphRenderer,
    source: &mut ColumnDataSource,
    hit: &HitGeometry,
    mapping: &CoordinateMapping,
) -> Result<Selection> {
    let result = renderer.hit_test(source, hit, mapping)?;
    source.inspected = result.clone();
    source.emit_inspect();
    Ok(result)
}

pub fn clear(source: &mut ColumnDataSource) {
    source.selected.clear();
    source.emit_selected_change();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::{Ellipse, Glyph};
    use crate::visuals::{DistanceSpec, Spec, Visuals};
    use narwhal_core::{BBox, Column, Range1d, ScaleKind};
    use std::cell::Cell;
    use std::rc::Rc;

    fn fixture() -> (GlyphRenderer, ColumnDataSource, CoordinateMapping) {
        let mut source = ColumnDataSource::from_columns([
            ("x", Column::Number(vec![10.0, 50.0, 90.0])),
            ("y", Column::Number(vec![10.0, 50.0, 90.0])),
        ]);
        let glyph = Glyph::Ellipse(Ellipse::new(
            Spec::field("x"),
            Spec::field("y"),
            DistanceSpec::screen(10.0),
            DistanceSpec::screen(10.0),
        ));
        let mut renderer = GlyphRenderer::new("dots", "points", glyph, Visuals::default());
        renderer.attach(&mut source);
        let mapping = CoordinateMapping::new(
            &ScaleKind::Linear,
            Range1d::new(0.0, 100.0),
            &ScaleKind::Linear,
            Range1d::new(0.0, 100.0),
            &BBox::new(0.0, 0.0, 100.0, 100.0),
        )
        .unwrap();
        (renderer, source, mapping)
    }

    #[test]
    fn select_merges_by_mode_and_notifies() {
        let (mut renderer, mut source, mapping) = fixture();
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        source
            .signals_mut()
            .selected_change
            .connect(move |_| counter.set(counter.get() + 1));

        let first = HitGeometry::point(10.0, 90.0);
        let replace = SelectionMode::Replace;
        assert!(select(&mut renderer, &mut source, &first, &mapping, replace).unwrap());
        let second = HitGeometry::point(50.0, 50.0);
        let append = SelectionMode::Append;
        assert!(select(&mut renderer, &mut source, &second, &mapping, append).unwrap());
        assert_eq!(source.selected, Selection::from_indices([0, 1]));

        let miss = HitGeometry::point(30.0, 30.0);
        assert!(!select(&mut renderer, &mut source, &miss, &mapping, replace).unwrap());
        assert!(source.selected.is_empty());
        assert_eq!(fired.get(), 3);
    }

    #[test]
    fn inspect_leaves_the_selection_alone() {
        let (mut renderer, mut source, mapping) = fixture();
        source.selected = Selection::from_indices([2]);
        let hit = HitGeometry::point(50.0, 50.0);
        let inspected = inspect(&mut renderer, &mut source, &hit, &mapping).unwrap();
        assert_eq!(inspected, Selection::from_indices([1]));
        assert_eq!(source.inspected, inspected);
        assert_eq!(source.selected, Selection::from_indices([2]));

        clear(&mut source);
        assert!(source.selected.is_empty());
    }
}
