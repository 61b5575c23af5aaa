//! The Arbor value model.
//!
//! Every value is immutable, canonically encoded, and named by the hash of its
//! encoding. Collections are trees of chunks whose boundaries are chosen by a
//! rolling checksum over their contents, so an edit rewrites only the chunks
//! on the path from the changed leaves to a new root and shares every other
//! chunk with the previous version.
//!
//! # Key Types
//!
//! - [`Value`] -- closed sum over primitives, [`Ref`], [`List`], [`Set`],
//!   [`Map`], and [`Struct`]
//! - [`Ref`] -- typed hash pointer carrying the target's height and type
//! - [`TypeDesc`] -- declared type of a value
//! - [`ListEditor`], [`SetEditor`], [`MapEditor`] -- batch mutators
//! - [`ValueStore`] -- read-through/write-through layer over a chunk store
//!
//! # Example
//!
//! ```
//! use arbor_value::{List, Value, ValueStore};
//!
//! # fn main() -> arbor_value::ValueResult<()> {
//! let vs = ValueStore::in_memory();
//! let list = List::new().edit().append(1)?.append("two")?.materialize(&vs)?;
//! let root = vs.write_value(&Value::List(list.clone()))?;
//!
//! let read = vs.read_value(&root)?;
//! assert_eq!(read.as_list()?.get(&vs, 1)?, Value::from("two"));
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod editor;
pub mod error;
pub mod json;
pub mod key;
pub mod list;
pub mod map;
pub mod print;
pub mod reference;
pub mod sequence;
pub mod set;
pub mod stats;
pub mod store;
pub mod types;
pub mod value;

mod cache;

pub use codec::{decode_value, encode_value, raw_encode};
pub use config::{ChunkerConfig, ValueStoreConfig};
pub use editor::{ListEditor, MapEditor, SetEditor};
pub use error::{ValueError, ValueResult};
pub use json::from_json;
pub use key::OrderedKey;
pub use list::{List, ListIter};
pub use map::{Map, MapIter};
pub use print::write_encoded_value;
pub use reference::Ref;
pub use set::{Set, SetIter};
pub use stats::{value_stats, write_value_stats, ValueStats};
pub use store::ValueStore;
pub use types::{StructType, TypeDesc};
pub use value::{Struct, Value, ValueKind};

pub use arbor_types::Hash;
