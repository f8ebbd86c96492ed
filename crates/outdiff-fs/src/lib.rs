//! Filesystem side of outdiff.
//!
//! Provides the listing collaborator used to discover what exists in each
//! output directory, and the [`DirectoryEvaluator`] that compares two
//! directories and dispatches recognized shared files to specialized
//! evaluators.

pub mod directory;
pub mod error;
pub mod lister;

pub use directory::{DirectoryEvaluator, FILES_NODE};
pub use error::{ListError, ListResult};
pub use lister::{Lister, Listing, ListingConfig, LocalLister};
