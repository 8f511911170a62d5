use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// How a new hit-test result is combined with the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    #[default]
    Replace,
    Append,
    Intersect,
    Subtract,
}

/// Selected (or inspected) rows of a data source.
///
/// `multiline_indices` maps a row to the segment indices hit inside that row; it is only filled
/// by multi-segment glyphs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub indices: BTreeSet<usize>,
    #[serde(default)]
    pub line_indices: Vec<usize>,
    #[serde(default)]
    pub multiline_indices: BTreeMap<usize, Vec<usize>>,
}

impl Selection {
    pub fn from_indices(indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            indices: indices.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty() && self.line_indices.is_empty()
    }

    pub fn clear(&mut self) {
        self.indices.clear();
        self.line_indices.clear();
        self.multiline_indices.clear();
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn first(&self) -> Option<usize> {
        self.indices.first().copied()
    }

    pub fn update(&mut self, other: &Selection, mode: SelectionMode) {
        match mode {
            SelectionMode::Replace => *self = other.clone(),
            SelectionMode::Append => {
                self.indices.extend(other.indices.iter().copied());
                for i in &other.line_indices {
                    if !self.line_indices.contains(i) {
                        self.line_indices.push(*i);
                    }
                }
                self.line_indices.sort_unstable();
                for (row, segments) in &other.multiline_indices {
                    let entry = self.multiline_indices.entry(*row).or_default();
                    for s in segments {
                        if !entry.contains(s) {
                            entry.push(*s);
                        }
                    }
                    entry.sort_unstable();
                }
            }
            SelectionMode::Intersect => {
                self.indices.retain(|i| other.indices.contains(i));
                self.line_indices.retain(|i| other.line_indices.contains(i));
                let keep = &self.indices;
                self.multiline_indices.retain(|row, _| keep.contains(row));
            }
            SelectionMode::Subtract => {
                for i in &other.indices {
                    self.indices.remove(i);
                    self.multiline_indices.remove(i);
                }
                self.line_indices.retain(|i| !other.line_indices.contains(i));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_modes_combine_indices() {
        let base = Selection::from_indices([1, 2, 3]);
        let other = Selection::from_indices([3, 4]);

        let mut s = base.clone();
        s.update(&other, SelectionMode::Replace);
        assert_eq!(s.indices.iter().copied().collect::<Vec<_>>(), vec![3, 4]);

        let mut s = base.clone();
        s.update(&other, SelectionMode::Append);
        assert_eq!(
            s.indices.iter().copied().collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );

        let mut s = base.clone();
        s.update(&other, SelectionMode::Intersect);
        assert_eq!(s.indices.iter().copied().collect::<Vec<_>>(), vec![3]);

        let mut s = base;
        s.update(&other, SelectionMode::Subtract);
        assert_eq!(s.indices.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn append_merges_multiline_segments() {
        let mut a = Selection::from_indices([0]);
        a.multiline_indices.insert(0, vec![2]);
        let mut b = Selection::from_indices([0]);
        b.multiline_indices.insert(0, vec![1, 2]);

        a.update(&b, SelectionMode::Append);
        assert_eq!(a.multiline_indices[&0], vec![1, 2]);
        assert_eq!(a.first(), Some(0));
    }
}
