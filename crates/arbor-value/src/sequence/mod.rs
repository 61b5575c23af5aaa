//! Chunked sequence trees.
//!
//! Lists, sets, and maps are stored as trees whose node boundaries are chosen
//! by a rolling checksum over the entries, so the tree shape is a function of
//! content alone. Edits rechunk only the neighbourhood of each change.

mod build;
mod chunker;
mod cursor;
mod node;
mod splice;

pub use node::{Item, MetaTuple, Node, SeqKind};

pub(crate) use build::build;
pub(crate) use cursor::LevelCursor;
pub(crate) use splice::{apply, find, get_at, Splice};
