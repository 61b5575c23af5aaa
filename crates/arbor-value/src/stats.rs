//! Storage statistics for a value and everything reachable from it.

use std::collections::{HashSet, VecDeque};
use std::io::{self, Write};

use arbor_types::Hash;
use serde::Serialize;

use crate::codec;
use crate::error::{ValueError, ValueResult};
use crate::store::ValueStore;
use crate::value::Value;

/// Totals over the chunk graph rooted at one value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValueStats {
    /// Distinct chunks reachable from the value, the value's own chunk
    /// included.
    pub chunk_count: u64,
    /// Sum of the encoded sizes of those chunks.
    pub byte_size: u64,
    /// Height of the value's own chunk: 0 when it holds no refs.
    pub max_height: u64,
    /// Distinct refs followed during the walk.
    pub ref_count: u64,
}

/// Walk every chunk reachable from `value` once.
///
/// The root's size is its canonical encoding, whether or not it was written.
/// A ref whose chunk is missing fails with [`ValueError::DanglingRef`].
pub fn value_stats(value: &Value, vs: &ValueStore) -> ValueResult<ValueStats> {
    let root = value.hash();
    let mut stats = ValueStats {
        chunk_count: 1,
        byte_size: codec::encode_value(value).len() as u64,
        max_height: value.height(),
        ref_count: 0,
    };

    let mut visited: HashSet<Hash> = HashSet::from([root]);
    let mut queue: VecDeque<Hash> = vs
        .direct_children(value)
        .into_iter()
        .map(|r| r.target_hash())
        .collect();

    while let Some(hash) = queue.pop_front() {
        if !visited.insert(hash) {
            continue;
        }
        stats.ref_count += 1;
        let size = vs.chunk_size(&hash)?.ok_or(ValueError::DanglingRef(hash))?;
        stats.chunk_count += 1;
        stats.byte_size += size as u64;

        let child = vs.read_hash(&hash)?;
        queue.extend(
            vs.direct_children(&child)
                .into_iter()
                .map(|r| r.target_hash())
                .filter(|h| !visited.contains(h)),
        );
    }
    Ok(stats)
}

/// Render `stats` as aligned `name: value` lines.
pub fn write_value_stats(w: &mut impl Write, stats: &ValueStats) -> io::Result<()> {
    writeln!(w, "chunks:     {}", stats.chunk_count)?;
    writeln!(w, "bytes:      {}", stats.byte_size)?;
    writeln!(w, "height:     {}", stats.max_height)?;
    writeln!(w, "refs:       {}", stats.ref_count)?;
    Ok(())
}
