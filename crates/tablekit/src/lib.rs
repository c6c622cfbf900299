//! Format-agnostic tabular data for tablekit
//!
//! A [`Dataset`] is an ordered collection of equal-width rows with optional column
//! headers, a title and row tags. A [`Databook`] is an ordered collection of datasets.
//! Neither knows anything about file formats: every format lives behind the [`Codec`]
//! trait and is looked up by name in a [`Registry`]. The [`Dispatcher`] routes import and
//! export calls to codecs, checks their capabilities, and auto-detects the format of raw
//! input when none is given.
//!
//! # Examples
//!
//! ## Building a dataset
//!
//! ```
//! use tablekit::{CellValue, Dataset};
//!
//! let mut data = Dataset::with_headers(vec!["name", "age"]);
//! data.append(vec![CellValue::from("Alice"), CellValue::Int(30)]).unwrap();
//! data.append(vec![CellValue::from("Bob"), CellValue::Int(25)]).unwrap();
//!
//! assert_eq!(data.height(), 2);
//! assert_eq!(data.width(), 2);
//! assert_eq!(data.column("age").unwrap(), vec![CellValue::Int(30), CellValue::Int(25)]);
//! ```
//!
//! ## Exporting and importing
//!
//! ```
//! use tablekit::Dataset;
//!
//! let data = Dataset::from_rows(Some(vec!["id", "name"]), vec![vec!["1", "a"]]).unwrap();
//! let csv = data.export("csv").unwrap();
//! assert_eq!(csv.as_text(), Some("id,name\r\n1,a\r\n"));
//!
//! // Without a format name the input is sniffed
//! let back = Dataset::import(csv.as_bytes(), None).unwrap();
//! assert_eq!(back, data);
//! ```
//!
//! ## Books
//!
//! ```
//! use tablekit::{Databook, Dataset};
//!
//! let mut book = Databook::new();
//! book.add_sheet(Dataset::with_headers(vec!["a"]).with_title("first"));
//! book.add_sheet(Dataset::with_headers(vec!["b"]).with_title("second"));
//!
//! let json = book.export("json").unwrap();
//! let back = Databook::import(json.as_bytes(), Some("json")).unwrap();
//! assert_eq!(back.titles(), vec![Some("first"), Some("second")]);
//! ```
//!
//! # Formats
//!
//! | name      | dataset | book     | notes                          |
//! |-----------|---------|----------|--------------------------------|
//! | `xlsx`    | rw      | rw       | binary                         |
//! | `ods`     | r       | r        | binary                         |
//! | `parquet` | rw      |          | binary                         |
//! | `df`      | rw      |          | Arrow IPC file, binary         |
//! | `dbf`     | rw      |          | dBase III, binary              |
//! | `json`    | rw      | rw       |                                |
//! | `html`    | rw      | w        |                                |
//! | `yaml`    | rw      | rw       |                                |
//! | `csv`     | rw      |          |                                |
//! | `tsv`     | rw      |          |                                |
//! | `jira`    | w       |          |                                |
//! | `latex`   | w       |          |                                |
//! | `rst`     | w       | w        |                                |
//!
//! Detection probes codecs in the order of this table. The first match wins, so text that
//! contains `<table` anywhere (even inside a CSV cell) is read as HTML, and single-column
//! CSV is never detected; name the format explicitly in both cases.

mod cell;
mod codec;
mod databook;
mod dataset;
mod dispatch;
mod error;
pub mod formats;
mod options;
mod registry;
mod row;

/// Re-export cell value type.
pub use cell::CellValue;
/// Re-export the codec contract.
pub use codec::{Capabilities, Codec, Operation, Payload};
pub use databook::Databook;
pub use dataset::{ColumnKey, ColumnSource, Dataset, Separator};
pub use dispatch::{detect_format, Dispatcher};
/// Re-export error types.
pub use error::{ErrorKind, Result, TabError};
pub use options::Options;
pub use registry::Registry;
pub use row::Row;
