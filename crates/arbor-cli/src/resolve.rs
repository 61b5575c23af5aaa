use std::path::PathBuf;

use anyhow::{bail, Context};
use arbor_types::Hash;

/// A parsed object spelling.
#[derive(Debug, PartialEq, Eq)]
pub struct ObjectSpec {
    /// Store directory named in the spelling, if any.
    pub store: Option<PathBuf>,
    pub hash: Hash,
}

/// Parse `#<hex>` or `<store-dir>::#<hex>`.
pub fn parse_object(spec: &str) -> anyhow::Result<ObjectSpec> {
    let (store, hash_part) = match spec.rsplit_once("::") {
        Some((dir, rest)) if !dir.is_empty() => (Some(PathBuf::from(dir)), rest),
        Some(_) => bail!("invalid object {spec:?}: empty store path"),
        None => (None, spec),
    };
    let Some(hex) = hash_part.strip_prefix('#') else {
        bail!("invalid object {spec:?}: expected #<hash>");
    };
    let hash = Hash::from_hex(hex).with_context(|| format!("invalid object {spec:?}"))?;
    Ok(ObjectSpec { store, hash })
}
