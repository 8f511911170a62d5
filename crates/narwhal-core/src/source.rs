use crate::selection::Selection;
use crate::signal::Emitter;
use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Number,
    Text,
    NumberList,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::Number => f.write_str("number"),
            ColumnKind::Text => f.write_str("text"),
            ColumnKind::NumberList => f.write_str("number list"),
        }
    }
}

/// A single cell value, used when appending or padding rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    NumberList(Vec<f64>),
}

impl Value {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Value::Number(_) => ColumnKind::Number,
            Value::Text(_) => ColumnKind::Text,
            Value::NumberList(_) => ColumnKind::NumberList,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<f64>> for Value {
    fn from(value: Vec<f64>) -> Self {
        Value::NumberList(value)
    }
}

/// One named column. `NumberList` rows hold the nested coordinate arrays of multi-line and
/// polygon glyphs.
///
/// Serializes as a plain JSON array; NaN is written as `null` and `null` reads back as NaN.
/// Empty columns read as an empty slice of any kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Column {
    Number(Vec<f64>),
    Text(Vec<String>),
    NumberList(Vec<Vec<f64>>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawColumn {
    Number(Vec<Option<f64>>),
    Text(Vec<String>),
    NumberList(Vec<Vec<Option<f64>>>),
}

impl<'de> Deserialize<'de> for Column {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let nan = |v: Option<f64>| v.unwrap_or(f64::NAN);
        Ok(match RawColumn::deserialize(deserializer)? {
            RawColumn::Number(values) => Column::Number(values.into_iter().map(nan).collect()),
            RawColumn::Text(values) => Column::Text(values),
            RawColumn::NumberList(rows) => Column::NumberList(
                rows.into_iter()
                    .map(|row| row.into_iter().map(nan).collect())
                    .collect(),
            ),
        })
    }
}

impl Column {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Number(_) => ColumnKind::Number,
            Column::Text(_) => ColumnKind::Text,
            Column::NumberList(_) => ColumnKind::NumberList,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Number(v) => v.len(),
            Column::Text(v) => v.len(),
            Column::NumberList(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn empty(kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Number => Column::Number(Vec::new()),
            ColumnKind::Text => Column::Text(Vec::new()),
            ColumnKind::NumberList => Column::NumberList(Vec::new()),
        }
    }

    /// Pushes `value`, handing it back when its kind does not match the column.
    pub fn try_push(&mut self, value: Value) -> std::result::Result<(), Value> {
        match (self, value) {
            (Column::Number(v), Value::Number(x)) => v.push(x),
            (Column::Text(v), Value::Text(x)) => v.push(x),
            (Column::NumberList(v), Value::NumberList(x)) => v.push(x),
            (_, value) => return Err(value),
        }
        Ok(())
    }

    /// Pushes `empty` when it matches the column kind, otherwise the kind's natural blank
    /// (NaN, `""`, `[]`).
    pub fn push_empty(&mut self, empty: Option<&Value>) {
        match (self, empty) {
            (Column::Number(v), Some(Value::Number(x))) => v.push(*x),
            (Column::Number(v), _) => v.push(f64::NAN),
            (Column::Text(v), Some(Value::Text(x))) => v.push(x.clone()),
            (Column::Text(v), _) => v.push(String::new()),
            (Column::NumberList(v), Some(Value::NumberList(x))) => v.push(x.clone()),
            (Column::NumberList(v), _) => v.push(Vec::new()),
        }
    }

    fn remove_sorted_desc(&mut self, rows: &[usize]) {
        for &row in rows {
            match self {
                Column::Number(v) => {
                    v.remove(row);
                }
                Column::Text(v) => {
                    v.remove(row);
                }
                Column::NumberList(v) => {
                    v.remove(row);
                }
            }
        }
    }

    fn drain_front(&mut self, count: usize) {
        let count = count.min(self.len());
        match self {
            Column::Number(v) => {
                v.drain(..count);
            }
            Column::Text(v) => {
                v.drain(..count);
            }
            Column::NumberList(v) => {
                v.drain(..count);
            }
        }
    }
}

/// Insertion-ordered column map.
///
/// An empty JSON array carries no kind: such columns stay untyped until the first write, which
/// re-types them to the written kind. Columns built in code always keep their kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ColumnData {
    columns: IndexMap<String, Column>,
    #[serde(skip)]
    untyped: BTreeSet<String>,
}

impl<'de> Deserialize<'de> for ColumnData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let columns = IndexMap::<String, Column>::deserialize(deserializer)?;
        let untyped = columns
            .iter()
            .filter(|(_, c)| c.is_empty())
            .map(|(k, _)| k.clone())
            .collect();
        Ok(Self { columns, untyped })
    }
}

impl ColumnData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, column: Column) -> Option<Column> {
        let name = name.into();
        self.untyped.remove(&name);
        self.columns.insert(name, column)
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.get_mut(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Whether `name` still waits for its first write to decide its kind.
    pub fn is_untyped(&self, name: &str) -> bool {
        self.untyped.contains(name)
    }

    /// Mutable access for a write of `kind`; an untyped column takes that kind first.
    fn get_for_write(&mut self, name: &str, kind: ColumnKind) -> Option<&mut Column> {
        let column = self.columns.get_mut(name)?;
        if self.untyped.remove(name) && column.is_empty() && column.kind() != kind {
            *column = Column::empty(kind);
        }
        Some(column)
    }
}

impl FromIterator<(String, Column)> for ColumnData {
    fn from_iter<T: IntoIterator<Item = (String, Column)>>(iter: T) -> Self {
        Self {
            columns: iter.into_iter().collect(),
            untyped: BTreeSet::new(),
        }
    }
}

/// Subscriber lists of a data source.
///
/// Edits fire `change` (structural tier: spatial indexes must be rebuilt) before `data_change`
/// (repaint tier). Selection updates use their own list.
#[derive(Debug, Default)]
pub struct SourceSignals {
    pub change: Emitter<()>,
    pub data_change: Emitter<()>,
    pub selected_change: Emitter<()>,
    pub inspect: Emitter<Selection>,
}

#[derive(Debug, Default)]
pub struct ColumnDataSource {
    data: ColumnData,
    pub selected: Selection,
    pub inspected: Selection,
    signals: SourceSignals,
}

impl ColumnDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(data: ColumnData) -> Self {
        Self {
            data,
            ..Default::default()
        }
    }

    pub fn from_columns<K: Into<String>>(columns: impl IntoIterator<Item = (K, Column)>) -> Self {
        Self::from_data(
            columns
                .into_iter()
                .map(|(k, c)| (k.into(), c))
                .collect(),
        )
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn signals_mut(&mut self) -> &mut SourceSignals {
        &mut self.signals
    }

    /// Row count, taken from the first column.
    pub fn len(&self) -> usize {
        self.data.columns.values().next().map(Column::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.data.names().map(str::to_string).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.data.get(name).is_some()
    }

    pub fn insert_column(&mut self, name: impl Into<String>, column: Column) -> Option<Column> {
        self.data.insert(name, column)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.data.get(name).ok_or_else(|| Error::MissingColumn {
            name: name.to_string(),
        })
    }

    pub fn column_mut(&mut self, name: &str) -> Result<&mut Column> {
        self.data.get_mut(name).ok_or_else(|| Error::MissingColumn {
            name: name.to_string(),
        })
    }

    pub fn numbers(&self, name: &str) -> Result<&[f64]> {
        match self.column(name)? {
            Column::Number(v) => Ok(v),
            other if other.is_empty() => Ok(&[]),
            other => Err(type_error(name, ColumnKind::Number, other.kind())),
        }
    }

    pub fn texts(&self, name: &str) -> Result<&[String]> {
        match self.column(name)? {
            Column::Text(v) => Ok(v),
            other if other.is_empty() => Ok(&[]),
            other => Err(type_error(name, ColumnKind::Text, other.kind())),
        }
    }

    pub fn number_lists(&self, name: &str) -> Result<&[Vec<f64>]> {
        match self.column(name)? {
            Column::NumberList(v) => Ok(v),
            other if other.is_empty() => Ok(&[]),
            other => Err(type_error(name, ColumnKind::NumberList, other.kind())),
        }
    }

    /// Mutable column for a write of `kind`, see [`ColumnData`] for untyped columns.
    fn column_for_write(&mut self, name: &str, kind: ColumnKind) -> Result<&mut Column> {
        self.data
            .get_for_write(name, kind)
            .ok_or_else(|| Error::MissingColumn {
                name: name.to_string(),
            })
    }

    fn numbers_mut(&mut self, name: &str) -> Result<&mut Vec<f64>> {
        match self.column_for_write(name, ColumnKind::Number)? {
            Column::Number(v) => Ok(v),
            other => Err(type_error(name, ColumnKind::Number, other.kind())),
        }
    }

    fn number_lists_mut(&mut self, name: &str) -> Result<&mut Vec<Vec<f64>>> {
        match self.column_for_write(name, ColumnKind::NumberList)? {
            Column::NumberList(v) => Ok(v),
            other => Err(type_error(name, ColumnKind::NumberList, other.kind())),
        }
    }

    /// One row of a `NumberList` column.
    pub fn row(&self, name: &str, row: usize) -> Result<&[f64]> {
        let lists = self.number_lists(name)?;
        lists
            .get(row)
            .map(Vec::as_slice)
            .ok_or_else(|| out_of_bounds(name, row, lists.len()))
    }

    /// Appends one value to one column. Keeping the other columns aligned is the caller's job,
    /// see [`ColumnDataSource::pad_empty_columns`].
    pub fn append(&mut self, name: &str, value: Value) -> Result<()> {
        let column = self.column_for_write(name, value.kind())?;
        let expected = column.kind();
        column
            .try_push(value)
            .map_err(|v| type_error(name, expected, v.kind()))
    }

    /// Pads every column outside `skip` up to the length of the longest column.
    ///
    /// Untyped columns take the kind of `empty` (numbers when there is none); typed columns fall
    /// back to their own blank when `empty` has another kind.
    pub fn pad_empty_columns(&mut self, skip: &[&str], empty: Option<&Value>) -> Result<()> {
        let target = self.data.columns.values().map(Column::len).max().unwrap_or(0);
        let kind = empty.map_or(ColumnKind::Number, Value::kind);
        for name in self.column_names() {
            if skip.contains(&name.as_str()) {
                continue;
            }
            if self.column(&name)?.len() >= target {
                continue;
            }
            let column = self.column_for_write(&name, kind)?;
            while column.len() < target {
                column.push_empty(empty);
            }
        }
        Ok(())
    }

    /// Row-level splice of one column: removes `delete_count` rows at `index` and inserts
    /// `values` in their place.
    pub fn splice(
        &mut self,
        name: &str,
        index: usize,
        delete_count: usize,
        values: Vec<Value>,
    ) -> Result<()> {
        let column = match values.first() {
            Some(first) => self.column_for_write(name, first.kind())?,
            None => self.column_mut(name)?,
        };
        let len = column.len();
        if index > len {
            return Err(out_of_bounds(name, index, len));
        }
        let kind = column.kind();
        if let Some(bad) = values.iter().find(|v| v.kind() != kind) {
            return Err(type_error(name, kind, bad.kind()));
        }
        let end = (index + delete_count).min(len);
        match column {
            Column::Number(v) => {
                v.splice(
                    index..end,
                    values.into_iter().filter_map(|x| match x {
                        Value::Number(n) => Some(n),
                        _ => None,
                    }),
                );
            }
            Column::Text(v) => {
                v.splice(
                    index..end,
                    values.into_iter().filter_map(|x| match x {
                        Value::Text(s) => Some(s),
                        _ => None,
                    }),
                );
            }
            Column::NumberList(v) => {
                v.splice(
                    index..end,
                    values.into_iter().filter_map(|x| match x {
                        Value::NumberList(l) => Some(l),
                        _ => None,
                    }),
                );
            }
        }
        Ok(())
    }

    /// Splice inside the nested coordinate array of one row of a `NumberList` column.
    pub fn splice_row(
        &mut self,
        name: &str,
        row: usize,
        index: usize,
        delete_count: usize,
        values: &[f64],
    ) -> Result<()> {
        let lists = self.number_lists_mut(name)?;
        let rows = lists.len();
        let Some(inner) = lists.get_mut(row) else {
            return Err(out_of_bounds(name, row, rows));
        };
        if index > inner.len() {
            return Err(out_of_bounds(name, index, inner.len()));
        }
        let end = (index + delete_count).min(inner.len());
        inner.splice(index..end, values.iter().copied());
        Ok(())
    }

    pub fn set_number(&mut self, name: &str, row: usize, value: f64) -> Result<()> {
        let values = self.numbers_mut(name)?;
        let len = values.len();
        let slot = values
            .get_mut(row)
            .ok_or_else(|| out_of_bounds(name, row, len))?;
        *slot = value;
        Ok(())
    }

    pub fn set_in_row(&mut self, name: &str, row: usize, index: usize, value: f64) -> Result<()> {
        let lists = self.number_lists_mut(name)?;
        let rows = lists.len();
        let inner = lists
            .get_mut(row)
            .ok_or_else(|| out_of_bounds(name, row, rows))?;
        let len = inner.len();
        let slot = inner
            .get_mut(index)
            .ok_or_else(|| out_of_bounds(name, index, len))?;
        *slot = value;
        Ok(())
    }

    pub fn set_row(&mut self, name: &str, row: usize, values: Vec<f64>) -> Result<()> {
        let lists = self.number_lists_mut(name)?;
        let rows = lists.len();
        let slot = lists
            .get_mut(row)
            .ok_or_else(|| out_of_bounds(name, row, rows))?;
        *slot = values;
        Ok(())
    }

    /// Replaces a whole column, keeping its position.
    pub fn set_column(&mut self, name: &str, column: Column) -> Result<()> {
        self.column(name)?;
        self.data.insert(name, column);
        Ok(())
    }

    /// Deletes `rows` from every column, preserving the order of the remaining rows.
    ///
    /// Every index is checked against every column before anything is removed.
    pub fn remove_rows(&mut self, rows: &BTreeSet<usize>) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        for (name, column) in self.data.iter() {
            if let Some(&last) = rows.last() {
                if last >= column.len() {
                    return Err(out_of_bounds(name, last, column.len()));
                }
            }
        }
        let desc: Vec<usize> = rows.iter().rev().copied().collect();
        for column in self.data.columns.values_mut() {
            column.remove_sorted_desc(&desc);
        }
        tracing::trace!(removed = desc.len(), remaining = self.len(), "removed rows");
        Ok(desc.len())
    }

    /// Drops the `count` oldest rows of every column.
    pub fn pop_front_rows(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        for column in self.data.columns.values_mut() {
            column.drain_front(count);
        }
    }

    /// Swaps in a new data set wholesale; selections are reset.
    pub fn replace_data(&mut self, data: ColumnData) {
        self.data = data;
        self.selected.clear();
        self.inspected.clear();
        self.emit_change();
        self.emit_data_change();
        self.emit_selected_change();
    }

    pub fn validate(&self) -> Result<()> {
        let expected = self.len();
        for (name, column) in self.data.iter() {
            if column.len() != expected {
                return Err(Error::LengthMismatch {
                    name: name.to_string(),
                    expected,
                    actual: column.len(),
                });
            }
        }
        Ok(())
    }

    /// Structural tier: rows were added, removed or replaced.
    pub fn emit_change(&mut self) {
        self.signals.change.emit(&());
    }

    /// Repaint tier: views should redraw.
    pub fn emit_data_change(&mut self) {
        self.signals.data_change.emit(&());
    }

    /// Both tiers, structural first.
    pub fn emit_edited(&mut self) {
        self.emit_change();
        self.emit_data_change();
    }

    pub fn emit_selected_change(&mut self) {
        self.signals.selected_change.emit(&());
    }

    pub fn emit_inspect(&mut self) {
        let inspected = self.inspected.clone();
        self.signals.inspect.emit(&inspected);
    }
}

fn type_error(name: &str, expected: ColumnKind, actual: ColumnKind) -> Error {
    Error::ColumnType {
        name: name.to_string(),
        expected,
        actual,
    }
}

fn out_of_bounds(name: &str, index: usize, len: usize) -> Error {
    Error::IndexOutOfBounds {
        name: name.to_string(),
        index,
        len,
    }
}
