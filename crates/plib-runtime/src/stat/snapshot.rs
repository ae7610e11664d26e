//! Snapshot results

use std::sync::Arc;

use plib_core::id::StatId;

use super::Totals;

/// One merged stat in a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatEntry {
    pub id: StatId,
    pub name: Arc<str>,
    pub sum: i64,
    pub count: i64,
}

/// Merged totals of every stat known to the registry, indexed by id
///
/// Values are cumulative since each stat was registered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: Vec<StatEntry>,
}

impl Snapshot {
    /// Pair totals with interned names; ids with no totals read as zero
    pub(crate) fn build(names: &[Arc<str>], totals: &[Totals]) -> Self {
        let entries = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let t = totals.get(i).copied().unwrap_or_default();
                StatEntry {
                    id: StatId::new(i as u32),
                    name: Arc::clone(name),
                    sum: t.sum,
                    count: t.count,
                }
            })
            .collect();
        Self { entries }
    }

    /// Number of stats (same as the registry's name count at snapshot time)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[StatEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StatEntry> {
        self.entries.iter()
    }

    pub fn get(&self, id: StatId) -> Option<&StatEntry> {
        self.entries.get(id.as_usize())
    }

    pub fn by_name(&self, name: &str) -> Option<&StatEntry> {
        self.entries.iter().find(|e| &*e.name == name)
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a StatEntry;
    type IntoIter = std::slice::Iter<'a, StatEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
