use crate::cell::CellValue;
use crate::error::{Result, TabError};
use crate::row::Row;
use indexmap::{IndexMap, IndexSet};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Column selector: a position or a header label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKey<'a> {
    Index(usize),
    Name(&'a str),
}

impl From<usize> for ColumnKey<'_> {
    fn from(index: usize) -> Self {
        ColumnKey::Index(index)
    }
}

impl<'a> From<&'a str> for ColumnKey<'a> {
    fn from(name: &'a str) -> Self {
        ColumnKey::Name(name)
    }
}

impl<'a> From<&'a String> for ColumnKey<'a> {
    fn from(name: &'a String) -> Self {
        ColumnKey::Name(name.as_str())
    }
}

/// Values for a new column: either a fixed sequence or a per-row generator
pub enum ColumnSource<'a> {
    Values(Vec<CellValue>),
    Generator(Box<dyn FnMut(&Row) -> CellValue + 'a>),
}

impl<'a> ColumnSource<'a> {
    pub fn values<T: Into<CellValue>>(values: Vec<T>) -> Self {
        ColumnSource::Values(values.into_iter().map(Into::into).collect())
    }

    /// Generator invoked once per existing row, in row order
    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnMut(&Row) -> CellValue + 'a,
    {
        ColumnSource::Generator(Box::new(f))
    }
}

impl<T: Into<CellValue>> From<Vec<T>> for ColumnSource<'_> {
    fn from(values: Vec<T>) -> Self {
        ColumnSource::values(values)
    }
}

/// A labelled divider drawn before the row at `index` by grouped exports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Separator {
    pub index: usize,
    pub text: String,
}

/// Transform applied to a column's values when the dataset is exported
type Formatter = Arc<dyn Fn(&CellValue) -> CellValue + Send + Sync>;

/// Formatters in registration order, keyed by column index
#[derive(Clone, Default)]
struct Formatters(Vec<(usize, Formatter)>);

impl Formatters {
    fn insert_column(&mut self, index: usize) {
        for (col, _) in &mut self.0 {
            if *col >= index {
                *col += 1;
            }
        }
    }

    fn remove_column(&mut self, index: usize) {
        self.0.retain(|(col, _)| *col != index);
        for (col, _) in &mut self.0 {
            if *col > index {
                *col -= 1;
            }
        }
    }
}

impl fmt::Debug for Formatters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter().map(|(col, _)| col)).finish()
    }
}

impl PartialEq for Formatters {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(&other.0)
                .all(|((a, f), (b, g))| a == b && Arc::ptr_eq(f, g))
    }
}

/// A single table: ordered rows of equal arity with optional headers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    headers: Option<Vec<String>>,
    rows: Vec<Row>,
    title: Option<String>,
    separators: Vec<Separator>,
    formatters: Formatters,
}

impl Dataset {
    /// Create a new empty dataset
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty dataset whose width is fixed by the headers
    pub fn with_headers<S: Into<String>>(headers: Vec<S>) -> Self {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        Dataset {
            headers: (!headers.is_empty()).then_some(headers),
            ..Self::default()
        }
    }

    /// Create a dataset from optional headers and rows, validating every row
    pub fn from_rows<S, R>(headers: Option<Vec<S>>, rows: Vec<R>) -> Result<Self>
    where
        S: Into<String>,
        R: Into<Row>,
    {
        let mut dataset = match headers {
            Some(h) => Self::with_headers(h),
            None => Self::new(),
        };
        dataset.extend(rows)?;
        Ok(dataset)
    }

    /// Set the title (builder style)
    #[must_use]
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: Option<&str>) {
        self.title = title.map(str::to_string);
    }

    pub fn headers(&self) -> Option<&[String]> {
        self.headers.as_deref()
    }

    /// Replace the headers. An empty list clears them.
    pub fn set_headers<S: Into<String>>(&mut self, headers: Option<Vec<S>>) -> Result<()> {
        let headers: Option<Vec<String>> = headers
            .map(|h| h.into_iter().map(Into::into).collect::<Vec<String>>())
            .filter(|h| !h.is_empty());

        if let Some(h) = &headers {
            if !self.rows.is_empty() && h.len() != self.width() {
                return Err(TabError::Shape {
                    expected: self.width(),
                    actual: h.len(),
                });
            }
        }
        self.headers = headers;
        Ok(())
    }

    /// Number of columns: first row length, else header length, else 0
    pub fn width(&self) -> usize {
        self.rows
            .first()
            .map(Row::len)
            .or_else(|| self.headers.as_ref().map(Vec::len))
            .unwrap_or(0)
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.headers.is_none()
    }

    // ===== Row Operations =====

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Get a row by index (0-based)
    pub fn row(&self, index: usize) -> Result<&Row> {
        self.rows.get(index).ok_or(TabError::RowIndexOutOfBounds {
            index,
            count: self.height(),
        })
    }

    /// Get a cell by row and column index
    pub fn get(&self, row: usize, col: usize) -> Result<&CellValue> {
        let r = self.row(row)?;
        r.get(col).ok_or(TabError::ColumnIndexOutOfBounds {
            index: col,
            count: self.width(),
        })
    }

    /// Replace a single cell
    pub fn set<T: Into<CellValue>>(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        let width = self.width();
        let count = self.height();
        let target = self
            .rows
            .get_mut(row)
            .ok_or(TabError::RowIndexOutOfBounds { index: row, count })?;
        if col >= width {
            return Err(TabError::ColumnIndexOutOfBounds {
                index: col,
                count: width,
            });
        }
        target.set(col, value.into());
        Ok(())
    }

    /// Append a row to the end of the dataset
    pub fn append<R: Into<Row>>(&mut self, row: R) -> Result<()> {
        self.insert(self.height(), row)
    }

    /// Append a row carrying the given tags
    pub fn append_tagged<T, I, S>(&mut self, values: Vec<T>, tags: I) -> Result<()>
    where
        T: Into<CellValue>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.append(Row::new(values).with_tags(tags))
    }

    /// Append several rows; stops at the first row with the wrong width
    pub fn extend<R: Into<Row>>(&mut self, rows: Vec<R>) -> Result<()> {
        for row in rows {
            self.append(row)?;
        }
        Ok(())
    }

    /// Insert a row at the top of the dataset
    pub fn lpush<R: Into<Row>>(&mut self, row: R) -> Result<()> {
        self.insert(0, row)
    }

    /// Insert a row at a specific index
    pub fn insert<R: Into<Row>>(&mut self, index: usize, row: R) -> Result<()> {
        if index > self.height() {
            return Err(TabError::RowIndexOutOfBounds {
                index,
                count: self.height(),
            });
        }
        let row = row.into();
        self.check_row_width(row.len())?;
        self.rows.insert(index, row);
        Ok(())
    }

    /// Delete a row at a specific index, returning it
    pub fn delete(&mut self, index: usize) -> Result<Row> {
        if index >= self.height() {
            return Err(TabError::RowIndexOutOfBounds {
                index,
                count: self.height(),
            });
        }
        Ok(self.rows.remove(index))
    }

    /// Remove and return the last row
    pub fn pop(&mut self) -> Option<Row> {
        self.rows.pop()
    }

    /// Remove and return the first row
    pub fn lpop(&mut self) -> Option<Row> {
        if self.rows.is_empty() {
            None
        } else {
            Some(self.rows.remove(0))
        }
    }

    fn check_row_width(&self, len: usize) -> Result<()> {
        if len == 0 {
            return Err(TabError::EmptyRow);
        }
        let constrained = !self.rows.is_empty() || self.headers.is_some();
        if constrained && len != self.width() {
            return Err(TabError::Shape {
                expected: self.width(),
                actual: len,
            });
        }
        Ok(())
    }

    // ===== Column Operations =====

    /// Resolve a column key to an index
    pub fn column_index<'k, K: Into<ColumnKey<'k>>>(&self, key: K) -> Result<usize> {
        match key.into() {
            ColumnKey::Index(index) => {
                if index < self.width() {
                    Ok(index)
                } else {
                    Err(TabError::ColumnIndexOutOfBounds {
                        index,
                        count: self.width(),
                    })
                }
            }
            ColumnKey::Name(name) => {
                let headers = self.headers.as_ref().ok_or(TabError::HeadersRequired)?;
                headers
                    .iter()
                    .position(|h| h == name)
                    .ok_or_else(|| TabError::ColumnNotFound {
                        name: name.to_string(),
                    })
            }
        }
    }

    /// Get an entire column by index or header
    pub fn column<'k, K: Into<ColumnKey<'k>>>(&self, key: K) -> Result<Vec<CellValue>> {
        let index = self.column_index(key)?;
        Ok(self.rows.iter().map(|row| row[index].clone()).collect())
    }

    /// Add a column at `index` (default: after the last column).
    ///
    /// A header is required when the dataset has headers. On an empty, header-less
    /// dataset a value column creates one row per value.
    pub fn add_column(
        &mut self,
        header: Option<&str>,
        source: ColumnSource<'_>,
        index: Option<usize>,
    ) -> Result<()> {
        let width = self.width();
        let index = index.unwrap_or(width);
        if index > width {
            return Err(TabError::ColumnIndexOutOfBounds {
                index,
                count: width,
            });
        }
        if self.headers.is_some() && header.is_none() {
            return Err(TabError::HeadersRequired);
        }

        let values: Vec<CellValue> = match source {
            ColumnSource::Values(values) => values,
            ColumnSource::Generator(mut generate) => self.rows.iter().map(|r| generate(r)).collect(),
        };

        if self.rows.is_empty() {
            if let Some(headers) = self.headers.as_mut() {
                if !values.is_empty() {
                    return Err(TabError::Shape {
                        expected: 0,
                        actual: values.len(),
                    });
                }
                headers.insert(index, header.unwrap_or_default().to_string());
                self.formatters.insert_column(index);
                return Ok(());
            }
            self.rows = values.into_iter().map(|v| Row::new(vec![v])).collect();
            if let Some(h) = header {
                self.headers = Some(vec![h.to_string()]);
            }
            return Ok(());
        }

        if values.len() != self.height() {
            return Err(TabError::Shape {
                expected: self.height(),
                actual: values.len(),
            });
        }

        for (row, value) in self.rows.iter_mut().zip(values) {
            row.insert_value(index, value);
        }
        self.formatters.insert_column(index);
        if let (Some(headers), Some(h)) = (self.headers.as_mut(), header) {
            headers.insert(index, h.to_string());
        }
        Ok(())
    }

    /// Append a column of values after the last column
    pub fn append_col<T: Into<CellValue>>(&mut self, header: Option<&str>, values: Vec<T>) -> Result<()> {
        self.add_column(header, ColumnSource::values(values), None)
    }

    /// Insert a column of values before the first column
    pub fn lpush_col<T: Into<CellValue>>(&mut self, header: Option<&str>, values: Vec<T>) -> Result<()> {
        self.add_column(header, ColumnSource::values(values), Some(0))
    }

    /// Remove a column by index or header, returning its values.
    ///
    /// Removing the last column also drops the rows, leaving the dataset empty.
    pub fn remove_column<'k, K: Into<ColumnKey<'k>>>(&mut self, key: K) -> Result<Vec<CellValue>> {
        let index = self.column_index(key)?;
        if let Some(headers) = self.headers.as_mut() {
            headers.remove(index);
            if headers.is_empty() {
                self.headers = None;
            }
        }
        self.formatters.remove_column(index);
        let values = self.rows.iter_mut().map(|row| row.remove_value(index)).collect();
        if self.rows.first().is_some_and(Row::is_empty) {
            self.wipe();
        }
        Ok(values)
    }

    // ===== Ordering and Selection =====

    /// Stable in-place sort of the rows by one column
    pub fn sort<'k, K: Into<ColumnKey<'k>>>(&mut self, key: K, reverse: bool) -> Result<()> {
        let index = self.column_index(key)?;
        self.rows.sort_by(|a, b| {
            let ordering = a[index].compare(&b[index]);
            if reverse {
                ordering.reverse()
            } else {
                ordering
            }
        });
        Ok(())
    }

    /// New dataset holding only rows whose tag set satisfies the predicate
    #[must_use]
    pub fn filter<F>(&self, predicate: F) -> Dataset
    where
        F: Fn(&IndexSet<String>) -> bool,
    {
        Dataset {
            headers: self.headers.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| predicate(row.tags()))
                .cloned()
                .collect(),
            title: self.title.clone(),
            separators: Vec::new(),
            formatters: self.formatters.clone(),
        }
    }

    /// New dataset holding only rows tagged with `tag`
    #[must_use]
    pub fn filter_tag(&self, tag: &str) -> Dataset {
        self.filter(|tags| tags.contains(tag))
    }

    /// New dataset with the selected rows (by index) and columns (by header).
    ///
    /// Out-of-range rows and unknown headers are skipped. Selecting no columns gives an
    /// empty dataset.
    pub fn subset(&self, rows: Option<&[usize]>, cols: Option<&[&str]>) -> Result<Dataset> {
        let col_indices: Vec<usize> = match cols {
            Some(names) => {
                let headers = self.headers.as_ref().ok_or(TabError::HeadersRequired)?;
                names
                    .iter()
                    .filter_map(|name| headers.iter().position(|h| h == name))
                    .collect()
            }
            None => (0..self.width()).collect(),
        };
        let keep: Option<HashSet<usize>> = rows.map(|r| r.iter().copied().collect());

        let mut subset = Dataset {
            headers: self
                .headers
                .as_ref()
                .map(|h| col_indices.iter().map(|&i| h[i].clone()).collect::<Vec<_>>())
                .filter(|h| !h.is_empty()),
            title: self.title.clone(),
            ..Dataset::default()
        };
        if col_indices.is_empty() {
            return Ok(subset);
        }
        for (i, row) in self.rows.iter().enumerate() {
            if keep.as_ref().is_some_and(|k| !k.contains(&i)) {
                continue;
            }
            let values: Vec<CellValue> = col_indices.iter().map(|&c| row[c].clone()).collect();
            subset
                .rows
                .push(Row::new(values).with_tags(row.tags().iter().cloned()));
        }
        Ok(subset)
    }

    /// Remove duplicate rows, keeping the first occurrence in order
    pub fn remove_duplicates(&mut self) {
        let mut seen = HashSet::new();
        self.rows.retain(|row| seen.insert(row.key()));
    }

    /// Remove headers, rows, separators and formatters; width becomes unconstrained again
    pub fn wipe(&mut self) {
        self.headers = None;
        self.rows.clear();
        self.separators.clear();
        self.formatters = Formatters::default();
    }

    // ===== Formatters =====

    /// Register a transform for one column's values.
    ///
    /// Formatters run on every export (and in `Display`); the stored values are not
    /// changed. Several formatters on one column run in the order they were added.
    pub fn add_formatter<'k, K, F>(&mut self, key: K, formatter: F) -> Result<()>
    where
        K: Into<ColumnKey<'k>>,
        F: Fn(&CellValue) -> CellValue + Send + Sync + 'static,
    {
        let index = self.column_index(key)?;
        self.formatters.0.push((index, Arc::new(formatter)));
        Ok(())
    }

    pub fn has_formatters(&self) -> bool {
        !self.formatters.0.is_empty()
    }

    pub fn clear_formatters(&mut self) {
        self.formatters = Formatters::default();
    }

    /// The dataset as exports see it: a copy with every formatter applied, or `self` when
    /// there are none
    pub fn formatted(&self) -> Cow<'_, Dataset> {
        if !self.has_formatters() {
            return Cow::Borrowed(self);
        }
        let mut out = self.clone();
        out.formatters = Formatters::default();
        for row in &mut out.rows {
            for (col, formatter) in &self.formatters.0 {
                let value = formatter(&row[*col]);
                row.set(*col, value);
            }
        }
        Cow::Owned(out)
    }

    // ===== Reshaping =====

    /// Swap rows and columns.
    ///
    /// With headers, the first column's values become the new headers (prefixed by the
    /// first header) and every other column becomes a row led by its header.
    #[must_use]
    pub fn transpose(&self) -> Dataset {
        let mut out = Dataset {
            title: self.title.clone(),
            ..Dataset::default()
        };
        if self.width() == 0 {
            return out;
        }

        match &self.headers {
            Some(headers) => {
                let mut new_headers = vec![headers[0].clone()];
                new_headers.extend(self.rows.iter().map(|r| r[0].as_str()));
                out.headers = Some(new_headers);
                for (col, header) in headers.iter().enumerate().skip(1) {
                    let mut values = vec![CellValue::String(header.clone())];
                    values.extend(self.rows.iter().map(|r| r[col].clone()));
                    out.rows.push(Row::new(values));
                }
            }
            None => {
                for col in 0..self.width() {
                    out.rows
                        .push(Row::new(self.rows.iter().map(|r| r[col].clone()).collect()));
                }
            }
        }
        out
    }

    /// Stack another dataset's rows below this one's
    pub fn stack(&self, other: &Dataset) -> Result<Dataset> {
        if !self.rows.is_empty() && !other.rows.is_empty() && self.width() != other.width() {
            return Err(TabError::Shape {
                expected: self.width(),
                actual: other.width(),
            });
        }
        let mut out = self.clone();
        for row in &other.rows {
            out.append(row.clone())?;
        }
        Ok(out)
    }

    /// Join another dataset's columns to the right of this one's
    pub fn stack_cols(&self, other: &Dataset) -> Result<Dataset> {
        if self.headers.is_some() != other.headers.is_some() {
            return Err(TabError::HeadersRequired);
        }
        if self.height() != other.height() {
            return Err(TabError::Shape {
                expected: self.height(),
                actual: other.height(),
            });
        }

        let mut out = Dataset {
            title: self.title.clone(),
            ..Dataset::default()
        };
        if let (Some(left), Some(right)) = (&self.headers, &other.headers) {
            let mut names = left.clone();
            names.extend(right.iter().cloned());
            out.headers = Some(names).filter(|h| !h.is_empty());
        }
        for (left, right) in self.rows.iter().zip(&other.rows) {
            let mut values = left.values().to_vec();
            values.extend(right.values().iter().cloned());
            let tags = left.tags().iter().chain(right.tags()).cloned();
            out.rows.push(Row::new(values).with_tags(tags));
        }
        Ok(out)
    }

    // ===== Separators =====

    pub fn separators(&self) -> &[Separator] {
        &self.separators
    }

    /// Add a separator drawn before the row at `index`
    pub fn insert_separator(&mut self, index: usize, text: &str) -> Result<()> {
        if index > self.height() {
            return Err(TabError::RowIndexOutOfBounds {
                index,
                count: self.height(),
            });
        }
        self.separators.push(Separator {
            index,
            text: text.to_string(),
        });
        Ok(())
    }

    /// Add a separator after the current last row
    pub fn append_separator(&mut self, text: &str) {
        self.separators.push(Separator {
            index: self.height(),
            text: text.to_string(),
        });
    }

    // ===== Records =====

    /// Rows as ordered maps keyed by header. `None` without headers.
    pub fn to_records(&self) -> Option<Vec<IndexMap<String, CellValue>>> {
        let headers = self.headers.as_ref()?;
        Some(
            self.rows
                .iter()
                .map(|row| {
                    headers
                        .iter()
                        .cloned()
                        .zip(row.values().iter().cloned())
                        .collect()
                })
                .collect(),
        )
    }

    /// Build a dataset from records; headers come from the first record's keys and
    /// missing keys in later records become nulls.
    pub fn from_records(records: Vec<IndexMap<String, CellValue>>) -> Result<Self> {
        let Some(first) = records.first() else {
            return Ok(Dataset::new());
        };
        let headers: Vec<String> = first.keys().cloned().collect();
        if headers.is_empty() {
            return Ok(Dataset::new());
        }
        let mut dataset = Dataset::with_headers(headers.clone());
        for record in &records {
            let values: Vec<CellValue> = headers
                .iter()
                .map(|h| record.get(h).cloned().unwrap_or(CellValue::Null))
                .collect();
            dataset.append(values)?;
        }
        Ok(dataset)
    }

    /// Header row (if any) followed by the data rows, all as cell values
    pub(crate) fn to_grid(&self) -> Vec<Vec<CellValue>> {
        let mut grid = Vec::with_capacity(self.height() + 1);
        if let Some(headers) = &self.headers {
            grid.push(headers.iter().map(|h| CellValue::String(h.clone())).collect());
        }
        grid.extend(self.rows.iter().map(|r| r.values().to_vec()));
        grid
    }

    /// Header labels, or positional labels when headers are absent
    pub(crate) fn column_labels(&self) -> Vec<String> {
        match &self.headers {
            Some(h) => h.clone(),
            None => (0..self.width()).map(|i| i.to_string()).collect(),
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid: Vec<Vec<String>> = self
            .formatted()
            .to_grid()
            .iter()
            .map(|row| row.iter().map(CellValue::as_str).collect())
            .collect();
        let Some(first) = grid.first() else {
            return Ok(());
        };

        let widths: Vec<usize> = (0..first.len())
            .map(|col| {
                grid.iter()
                    .map(|row| row[col].chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut lines: Vec<String> = grid
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&widths)
                    .map(|(cell, &w)| format!("{cell:<w$}"))
                    .collect::<Vec<_>>()
                    .join("|")
            })
            .collect();
        if self.headers.is_some() {
            let rule = widths
                .iter()
                .map(|&w| "-".repeat(w))
                .collect::<Vec<_>>()
                .join("|");
            lines.insert(1, rule);
        }
        write!(f, "{}", lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Dataset {
        Dataset::from_rows(
            Some(vec!["first", "last", "age"]),
            vec![
                vec![CellValue::from("John"), "Adams".into(), 90.into()],
                vec![CellValue::from("George"), "Washington".into(), 67.into()],
                vec![CellValue::from("Thomas"), "Jefferson".into(), 83.into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_width_and_height() {
        let data = people();
        assert_eq!(data.width(), 3);
        assert_eq!(data.height(), 3);

        let empty = Dataset::new();
        assert_eq!(empty.width(), 0);
        assert!(empty.is_empty());

        let headed = Dataset::with_headers(vec!["a", "b"]);
        assert_eq!(headed.width(), 2);
        assert_eq!(headed.height(), 0);
    }

    #[test]
    fn test_first_append_fixes_width() {
        let mut data = Dataset::new();
        data.append(vec![1, 2, 3]).unwrap();
        assert_eq!(data.width(), 3);

        let err = data.append(vec![1, 2]).unwrap_err();
        assert!(matches!(
            err,
            TabError::Shape {
                expected: 3,
                actual: 2
            }
        ));
        assert_eq!(data.height(), 1);
    }

    #[test]
    fn test_headers_fix_width() {
        let mut data = Dataset::with_headers(vec!["a", "b"]);
        assert!(data.append(vec![1, 2, 3]).is_err());
        data.append(vec![1, 2]).unwrap();
    }

    #[test]
    fn test_set_headers_checks_width() {
        let mut data = people();
        assert!(data.set_headers(Some(vec!["only", "two"])).is_err());
        assert_eq!(data.headers().unwrap()[0], "first");

        data.set_headers(None::<Vec<String>>).unwrap();
        assert!(data.headers().is_none());
    }

    #[test]
    fn test_insert_and_delete() {
        let mut data = people();
        data.insert(1, vec![CellValue::from("James"), "Madison".into(), 85.into()])
            .unwrap();
        assert_eq!(data.get(1, 0).unwrap(), &CellValue::from("James"));
        assert_eq!(data.get(2, 0).unwrap(), &CellValue::from("George"));

        let removed = data.delete(0).unwrap();
        assert_eq!(removed[0], CellValue::from("John"));
        assert_eq!(data.height(), 3);

        assert!(matches!(
            data.delete(3),
            Err(TabError::RowIndexOutOfBounds { index: 3, count: 3 })
        ));
        assert!(matches!(
            data.insert(5, vec![CellValue::Null, CellValue::Null, CellValue::Null]),
            Err(TabError::RowIndexOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_pop_and_lpop() {
        let mut data = people();
        assert_eq!(data.pop().unwrap()[0], CellValue::from("Thomas"));
        assert_eq!(data.lpop().unwrap()[0], CellValue::from("John"));
        assert_eq!(data.height(), 1);
    }

    #[test]
    fn test_add_column_generator_runs_per_row() {
        let mut data = people();
        let mut calls = Vec::new();
        data.add_column(
            Some("active"),
            ColumnSource::from_fn(|row| {
                calls.push(row[0].as_str());
                CellValue::Bool(true)
            }),
            None,
        )
        .unwrap();

        assert_eq!(calls, vec!["John", "George", "Thomas"]);
        assert_eq!(
            data.column("active").unwrap(),
            vec![CellValue::Bool(true); 3]
        );
        assert_eq!(data.headers().unwrap().len(), 4);
    }

    #[test]
    fn test_add_column_at_index() {
        let mut data = people();
        data.add_column(Some("id"), vec![1, 2, 3].into(), Some(0))
            .unwrap();
        assert_eq!(data.headers().unwrap()[0], "id");
        assert_eq!(data.get(2, 0).unwrap(), &CellValue::Int(3));
        assert_eq!(data.get(2, 1).unwrap(), &CellValue::from("Thomas"));
    }

    #[test]
    fn test_add_column_length_mismatch() {
        let mut data = people();
        let err = data.append_col(Some("x"), vec![1, 2]).unwrap_err();
        assert!(matches!(
            err,
            TabError::Shape {
                expected: 3,
                actual: 2
            }
        ));
        assert_eq!(data.width(), 3);
    }

    #[test]
    fn test_add_column_requires_header_when_headed() {
        let mut data = people();
        assert!(matches!(
            data.append_col(None, vec![1, 2, 3]),
            Err(TabError::HeadersRequired)
        ));
    }

    #[test]
    fn test_add_column_to_empty_dataset_creates_rows() {
        let mut data = Dataset::new();
        data.append_col(Some("n"), vec![1, 2]).unwrap();
        assert_eq!(data.height(), 2);
        assert_eq!(data.width(), 1);
        assert_eq!(data.headers().unwrap(), &["n".to_string()]);
    }

    #[test]
    fn test_remove_column() {
        let mut data = people();
        let ages = data.remove_column("age").unwrap();
        assert_eq!(ages.len(), 3);
        assert_eq!(data.width(), 2);
        assert_eq!(data.headers().unwrap(), &["first".to_string(), "last".to_string()]);

        assert!(matches!(
            data.remove_column("missing"),
            Err(TabError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_remove_last_column_empties_dataset() {
        let mut data = Dataset::from_rows(Some(vec!["only"]), vec![vec![1], vec![2]]).unwrap();
        data.insert_separator(1, "mid").unwrap();

        assert_eq!(data.remove_column(0).unwrap(), vec![CellValue::Int(1), CellValue::Int(2)]);
        assert_eq!(data.width(), 0);
        assert_eq!(data.height(), 0);
        assert!(data.is_empty());
        assert!(data.separators().is_empty());

        data.append(vec!["a", "b"]).unwrap();
        assert_eq!(data.width(), 2);
    }

    #[test]
    fn test_empty_row_rejected() {
        let mut data = Dataset::new();
        assert!(matches!(data.append(Vec::<CellValue>::new()), Err(TabError::EmptyRow)));
        assert!(data.is_empty());

        let mut headed = Dataset::with_headers(vec!["a"]);
        assert!(matches!(headed.lpush(Vec::<CellValue>::new()), Err(TabError::EmptyRow)));
        assert_eq!(headed.height(), 0);
    }

    #[test]
    fn test_formatters_leave_stored_values() {
        let mut data = people();
        data.add_formatter("last", |cell| CellValue::String(cell.as_str().to_uppercase()))
            .unwrap();
        data.add_formatter(2, |cell| CellValue::Int(cell.as_int().unwrap_or(0) + 1))
            .unwrap();
        data.add_formatter("age", |cell| CellValue::String(format!("{} yrs", cell.as_str())))
            .unwrap();

        assert!(data.has_formatters());
        assert_eq!(data.get(0, 1).unwrap(), &CellValue::from("Adams"));

        let shown = data.formatted();
        assert_eq!(shown.get(0, 1).unwrap(), &CellValue::from("ADAMS"));
        assert_eq!(shown.get(1, 2).unwrap(), &CellValue::from("68 yrs"));
        assert!(!shown.has_formatters());

        assert!(matches!(
            data.add_formatter("missing", |cell| cell.clone()),
            Err(TabError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_formatters_follow_column_moves() {
        let mut data = people();
        data.add_formatter("age", |_| CellValue::from("*")).unwrap();

        data.lpush_col(Some("id"), vec![1, 2, 3]).unwrap();
        assert_eq!(data.formatted().get(0, 3).unwrap(), &CellValue::from("*"));

        data.remove_column("first").unwrap();
        assert_eq!(data.formatted().get(0, 2).unwrap(), &CellValue::from("*"));

        data.remove_column("age").unwrap();
        assert!(!data.has_formatters());
    }

    #[test]
    fn test_sort_is_stable() {
        let mut data = Dataset::from_rows(
            Some(vec!["k", "v"]),
            vec![
                vec![CellValue::Int(2), "a".into()],
                vec![CellValue::Int(1), "b".into()],
                vec![CellValue::Int(2), "c".into()],
                vec![CellValue::Int(1), "d".into()],
            ],
        )
        .unwrap();

        data.sort("k", false).unwrap();
        let order: Vec<String> = data.column("v").unwrap().iter().map(CellValue::as_str).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);

        data.sort(0, true).unwrap();
        let order: Vec<String> = data.column(1).unwrap().iter().map(CellValue::as_str).collect();
        assert_eq!(order, vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn test_sort_by_name_without_headers() {
        let mut data = Dataset::from_rows(None::<Vec<String>>, vec![vec![1]]).unwrap();
        assert!(matches!(data.sort("x", false), Err(TabError::HeadersRequired)));
    }

    #[test]
    fn test_filter_is_pure() {
        let mut data = Dataset::with_headers(vec!["name"]);
        data.append_tagged(vec!["a"], ["keep"]).unwrap();
        data.append_tagged(vec!["b"], ["drop"]).unwrap();
        data.append_tagged(vec!["c"], ["keep", "extra"]).unwrap();

        let kept = data.filter_tag("keep");
        assert_eq!(kept.height(), 2);
        assert_eq!(data.height(), 3);

        let either = data.filter(|tags| tags.contains("drop") || tags.contains("extra"));
        assert_eq!(either.column(0).unwrap(), vec![CellValue::from("b"), CellValue::from("c")]);
    }

    #[test]
    fn test_wipe_unconstrains_width() {
        let mut data = people();
        data.wipe();
        assert!(data.is_empty());
        data.append(vec![1]).unwrap();
        assert_eq!(data.width(), 1);
    }

    #[test]
    fn test_transpose_with_headers() {
        let data = Dataset::from_rows(
            Some(vec!["name", "score"]),
            vec![
                vec![CellValue::from("a"), 1.into()],
                vec![CellValue::from("b"), 2.into()],
            ],
        )
        .unwrap();

        let t = data.transpose();
        assert_eq!(
            t.headers().unwrap(),
            &["name".to_string(), "a".to_string(), "b".to_string()]
        );
        assert_eq!(t.height(), 1);
        assert_eq!(
            t.row(0).unwrap().values(),
            &[CellValue::from("score"), CellValue::Int(1), CellValue::Int(2)]
        );
    }

    #[test]
    fn test_stack_and_stack_cols() {
        let data = people();
        let stacked = data.stack(&data).unwrap();
        assert_eq!(stacked.height(), 6);

        let narrow = Dataset::from_rows(None::<Vec<String>>, vec![vec![1]]).unwrap();
        assert!(data.stack(&narrow).is_err());

        let extra = Dataset::from_rows(Some(vec!["x"]), vec![vec![1], vec![2], vec![3]]).unwrap();
        let wide = data.stack_cols(&extra).unwrap();
        assert_eq!(wide.width(), 4);
        assert_eq!(wide.headers().unwrap()[3], "x");

        let headless = Dataset::from_rows(None::<Vec<String>>, vec![vec![1], vec![2], vec![3]]).unwrap();
        assert!(matches!(data.stack_cols(&headless), Err(TabError::HeadersRequired)));
    }

    #[test]
    fn test_remove_duplicates() {
        let mut data = Dataset::from_rows(
            None::<Vec<String>>,
            vec![vec![1, 2], vec![3, 4], vec![1, 2], vec![5, 6], vec![3, 4]],
        )
        .unwrap();
        data.remove_duplicates();
        assert_eq!(data.height(), 3);
        assert_eq!(data.get(2, 0).unwrap(), &CellValue::Int(5));
    }

    #[test]
    fn test_subset() {
        let data = people();
        let sub = data.subset(Some(&[0, 2, 9]), Some(&["age", "first", "nope"])).unwrap();
        assert_eq!(sub.headers().unwrap(), &["age".to_string(), "first".to_string()]);
        assert_eq!(sub.height(), 2);
        assert_eq!(sub.get(1, 1).unwrap(), &CellValue::from("Thomas"));

        let none = data.subset(None, Some(&["nope"])).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_records_roundtrip() {
        let data = people();
        let records = data.to_records().unwrap();
        assert_eq!(records[1]["last"], CellValue::from("Washington"));

        let rebuilt = Dataset::from_records(records).unwrap();
        assert_eq!(rebuilt.headers(), data.headers());
        assert_eq!(rebuilt.rows(), data.rows());
    }

    #[test]
    fn test_separators() {
        let mut data = people();
        data.insert_separator(1, "Founders").unwrap();
        data.append_separator("End");
        assert_eq!(data.separators().len(), 2);
        assert_eq!(data.separators()[1].index, 3);
        assert!(data.insert_separator(10, "x").is_err());
    }

    #[test]
    fn test_display() {
        let data = Dataset::from_rows(
            Some(vec!["id", "name"]),
            vec![
                vec![CellValue::Int(1), "a".into()],
                vec![CellValue::Int(22), "bb".into()],
            ],
        )
        .unwrap();
        assert_eq!(data.to_string(), "id|name\n--|----\n1 |a   \n22|bb  ");
    }
}
