use crate::cell::CellValue;
use indexmap::IndexSet;
use std::ops::Index;

/// A single row: ordered cell values plus a set of tags used for filtering.
///
/// Once a row is attached to a [`Dataset`](crate::Dataset) its length is fixed to the
/// dataset width; the dataset only hands out shared references to attached rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    values: Vec<CellValue>,
    tags: IndexSet<String>,
}

impl Row {
    /// Create an untagged row from values
    pub fn new<T: Into<CellValue>>(values: Vec<T>) -> Self {
        Row {
            values: values.into_iter().map(Into::into).collect(),
            tags: IndexSet::new(),
        }
    }

    /// Attach tags to the row (builder style)
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    pub fn into_values(self) -> Vec<CellValue> {
        self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CellValue> {
        self.values.iter()
    }

    pub fn tags(&self) -> &IndexSet<String> {
        &self.tags
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// True if the row carries at least one of the given tags
    pub fn has_any_tag(&self, tags: &[&str]) -> bool {
        tags.iter().any(|t| self.tags.contains(*t))
    }

    pub(crate) fn set(&mut self, index: usize, value: CellValue) {
        self.values[index] = value;
    }

    pub(crate) fn insert_value(&mut self, index: usize, value: CellValue) {
        self.values.insert(index, value);
    }

    pub(crate) fn remove_value(&mut self, index: usize) -> CellValue {
        self.values.remove(index)
    }

    pub(crate) fn pad_to(&mut self, width: usize, fill: &CellValue) {
        if self.values.len() < width {
            self.values.resize(width, fill.clone());
        }
    }

    /// Identity key of the values only (tags are ignored)
    pub(crate) fn key(&self) -> Vec<String> {
        self.values.iter().map(CellValue::key).collect()
    }
}

impl<T: Into<CellValue>> From<Vec<T>> for Row {
    fn from(values: Vec<T>) -> Self {
        Row::new(values)
    }
}

impl Index<usize> for Row {
    type Output = CellValue;

    fn index(&self, index: usize) -> &CellValue {
        &self.values[index]
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a CellValue;
    type IntoIter = std::slice::Iter<'a, CellValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() {
        let row = Row::new(vec![1, 2]).with_tags(["even", "small"]);
        assert!(row.has_tag("even"));
        assert!(!row.has_tag("odd"));
        assert!(row.has_any_tag(&["odd", "small"]));
        assert_eq!(row.tags().len(), 2);
    }

    #[test]
    fn test_duplicate_tags_collapse() {
        let mut row = Row::new(vec!["a"]).with_tags(["x"]);
        row.add_tag("x");
        assert_eq!(row.tags().len(), 1);
    }

    #[test]
    fn test_pad_to() {
        let mut row = Row::new(vec![1]);
        row.pad_to(3, &CellValue::Null);
        assert_eq!(row.values(), &[CellValue::Int(1), CellValue::Null, CellValue::Null]);

        row.pad_to(2, &CellValue::Null);
        assert_eq!(row.len(), 3);
    }

    #[test]
    fn test_key_ignores_tags() {
        let a = Row::new(vec![1, 2]).with_tags(["a"]);
        let b = Row::new(vec![1, 2]);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_key_keeps_cell_boundaries() {
        let a = Row::new(vec!["a\x1fs:b", "c"]);
        let b = Row::new(vec!["a", "b\x1fs:c"]);
        assert_ne!(a.key(), b.key());
    }
}
