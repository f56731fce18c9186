//! Path expressions over BETSE YAML configurations.
//!
//! This crate reads parameter values out of simulation configuration trees,
//! tabulates them across a corpus of samples, and writes new values back at
//! the same locations. Paths name a root document (`config` for the primary
//! configuration, `grn` for the gene regulatory network document it
//! references) followed by mapping keys. Values found inside lists are keyed
//! by the element's `name` or position, appended as `_<discriminant>`.

pub mod assemble;
pub mod document;
pub mod error;
pub mod extract;
pub mod key;
pub mod mutate;
pub mod path;
pub mod perturb;
pub mod simulation;
pub mod table;
pub mod tree;
pub mod working;

pub use assemble::{AssemblerConfig, DatasetAssembler};
pub use document::ConfigDocument;
pub use error::{ParamError, TableError};
pub use extract::{Extraction, extract, extract_path};
pub use key::{Discriminant, FlatKey};
pub use mutate::{apply, apply_flat, apply_to_tree, update_document};
pub use path::{Field, PathExpression, RootSelector, parse_path_list};
pub use perturb::Perturber;
pub use simulation::{Episode, EpisodeError, Simulation};
pub use table::{ParamTable, Row, gather_initial_values};
pub use tree::ConfigTree;
pub use working::WorkingDocument;

/// Result type used throughout the library.
pub type Result<T, E = ParamError> = std::result::Result<T, E>;
