//! Label names and the merged label table.

use std::collections::{BTreeMap, BTreeSet};
use crate::error::{MergeError, Result};

/// Largest merged label. Voxels travel through f32 tensors, whose integers
/// are exact up to 2^24.
pub const MAX_LABEL: u32 = 1 << 24;

/// Where the names of one atlas's parcels come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameSource {
    /// Every parcel is named `"{prefix}_{localLabel}"`.
    Prefix(String),
    /// Names keyed by the atlas's own (local) labels.
    PerLabel(BTreeMap<u32, String>),
}

impl NameSource {
    /// Name of local label `local`, which lands on merged label `merged`.
    ///
    /// Labels a per-label table does not cover fall back to the bare merged
    /// index.
    pub fn name_for(&self, local: u32, merged: u32) -> String {
        match self {
            NameSource::Prefix(prefix) => format!("{}_{}", prefix, local),
            NameSource::PerLabel(names) => names
                .get(&local)
                .cloned()
                .unwrap_or_else(|| merged.to_string()),
        }
    }

    /// Names from a per-label table whose label never occurs in `present`.
    pub fn absent_names(&self, present: &BTreeSet<u32>) -> Vec<String> {
        match self {
            NameSource::Prefix(_) => Vec::new(),
            NameSource::PerLabel(names) => names
                .iter()
                .filter(|(label, _)| !present.contains(label))
                .map(|(_, name)| name.clone())
                .collect(),
        }
    }
}

/// Pair supplied atlas names with atlases.
///
/// With no supplied names every atlas gets `fallback(index)`; otherwise the
/// counts must agree and each name becomes a [`NameSource::Prefix`].
pub fn resolve_name_sources<F>(atlas_count: usize, supplied: &[String], mut fallback: F) -> Result<Vec<NameSource>>
where
    F: FnMut(usize) -> NameSource,
{
    if atlas_count == 0 {
        return Err(MergeError::configuration("at least one atlas must be supplied"));
    }
    if supplied.is_empty() {
        return Ok((0..atlas_count).map(&mut fallback).collect());
    }
    if supplied.len() != atlas_count {
        return Err(MergeError::configuration(format!(
            "names count must match atlas count when names are provided ({} names, {} atlases)",
            supplied.len(),
            atlas_count
        )));
    }
    Ok(supplied.iter().cloned().map(NameSource::Prefix).collect())
}

/// One row of the output table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEntry {
    pub index: u32,
    pub name: String,
}

/// Merged label → name, in ascending label order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    entries: Vec<LabelEntry>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry; indices must keep increasing.
    pub fn push(&mut self, index: u32, name: impl Into<String>) -> Result<()> {
        if let Some(last) = self.entries.last() {
            if index <= last.index {
                return Err(MergeError::configuration(format!(
                    "label {} added after label {}",
                    index, last.index
                )));
            }
        }
        self.entries.push(LabelEntry { index, name: name.into() });
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabelEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name of merged label `index`.
    pub fn name(&self, index: u32) -> Option<&str> {
        self.entries
            .binary_search_by_key(&index, |entry| entry.index)
            .ok()
            .map(|i| self.entries[i].name.as_str())
    }
}

/// Narrowest unsigned integer type that stores every merged label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LabelWidth {
    U8,
    U16,
    U32,
}

impl LabelWidth {
    pub fn for_max(max_label: u32) -> Self {
        if max_label <= u8::MAX as u32 {
            LabelWidth::U8
        } else if max_label <= u16::MAX as u32 {
            LabelWidth::U16
        } else {
            LabelWidth::U32
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            LabelWidth::U8 => 8,
            LabelWidth::U16 => 16,
            LabelWidth::U32 => 32,
        }
    }
}
