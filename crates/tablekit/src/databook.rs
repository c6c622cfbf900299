use crate::dataset::Dataset;
use crate::error::{Result, TabError};

/// An ordered collection of datasets.
///
/// Sheet titles are not required to be unique; lookups by title return the first match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Databook {
    sheets: Vec<Dataset>,
}

impl Databook {
    /// Create a new empty databook
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a databook from sheets, keeping their order
    #[must_use]
    pub fn from_sheets(sheets: Vec<Dataset>) -> Self {
        Databook { sheets }
    }

    /// Number of sheets
    pub fn size(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn sheets(&self) -> &[Dataset] {
        &self.sheets
    }

    /// Titles in order, `None` for untitled sheets
    pub fn titles(&self) -> Vec<Option<&str>> {
        self.sheets.iter().map(Dataset::title).collect()
    }

    /// Append a sheet; the databook takes ownership
    pub fn add_sheet(&mut self, sheet: Dataset) {
        self.sheets.push(sheet);
    }

    /// First sheet with the given title
    pub fn sheet(&self, title: &str) -> Result<&Dataset> {
        self.sheets
            .iter()
            .find(|s| s.title() == Some(title))
            .ok_or_else(|| TabError::SheetNotFound {
                name: title.to_string(),
            })
    }

    /// First sheet with the given title, mutably
    pub fn sheet_mut(&mut self, title: &str) -> Result<&mut Dataset> {
        self.sheets
            .iter_mut()
            .find(|s| s.title() == Some(title))
            .ok_or_else(|| TabError::SheetNotFound {
                name: title.to_string(),
            })
    }

    /// Get a sheet by index (0-based)
    pub fn sheet_at(&self, index: usize) -> Result<&Dataset> {
        self.sheets.get(index).ok_or_else(|| TabError::SheetNotFound {
            name: format!("index {index}"),
        })
    }

    /// Remove and return the sheet at `index`
    pub fn remove_sheet(&mut self, index: usize) -> Result<Dataset> {
        if index >= self.sheets.len() {
            return Err(TabError::SheetNotFound {
                name: format!("index {index}"),
            });
        }
        Ok(self.sheets.remove(index))
    }

    /// Remove all sheets
    pub fn wipe(&mut self) {
        self.sheets.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Dataset> {
        self.sheets.iter()
    }
}

impl<'a> IntoIterator for &'a Databook {
    type Item = &'a Dataset;
    type IntoIter = std::slice::Iter<'a, Dataset>;

    fn into_iter(self) -> Self::IntoIter {
        self.sheets.iter()
    }
}

impl IntoIterator for Databook {
    type Item = Dataset;
    type IntoIter = std::vec::IntoIter<Dataset>;

    fn into_iter(self) -> Self::IntoIter {
        self.sheets.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titled(title: &str, n: i64) -> Dataset {
        let mut ds = Dataset::new().with_title(title);
        ds.append(vec![n]).unwrap();
        ds
    }

    #[test]
    fn test_add_and_lookup() {
        let mut book = Databook::new();
        book.add_sheet(titled("a", 1));
        book.add_sheet(titled("b", 2));

        assert_eq!(book.size(), 2);
        assert_eq!(book.titles(), vec![Some("a"), Some("b")]);
        assert_eq!(book.sheet("b").unwrap().height(), 1);
        assert!(matches!(
            book.sheet("c"),
            Err(TabError::SheetNotFound { .. })
        ));
    }

    #[test]
    fn test_duplicate_titles_first_match_wins() {
        let mut book = Databook::new();
        book.add_sheet(titled("dup", 1));
        book.add_sheet(titled("dup", 2));

        assert_eq!(book.size(), 2);
        assert_eq!(
            book.sheet("dup").unwrap().get(0, 0).unwrap().as_int(),
            Some(1)
        );
    }

    #[test]
    fn test_sheet_mut_and_remove() {
        let mut book = Databook::from_sheets(vec![titled("x", 1), titled("y", 2)]);
        book.sheet_mut("x").unwrap().append(vec![5]).unwrap();
        assert_eq!(book.sheet_at(0).unwrap().height(), 2);

        let removed = book.remove_sheet(0).unwrap();
        assert_eq!(removed.title(), Some("x"));
        assert_eq!(book.size(), 1);
        assert!(book.remove_sheet(3).is_err());

        book.wipe();
        assert!(book.is_empty());
    }
}
