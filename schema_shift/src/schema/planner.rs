//! Table creation ordering
//!
//! Orders `CREATE TABLE` statements so every foreign-key target exists before
//! the table referencing it.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::schema::types::TableSnapshot;

/// Topological planner over foreign-key dependencies
#[derive(Debug, Default)]
pub struct MigrationPlanner;

impl MigrationPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Creation order for `tables`.
    ///
    /// Ties are broken with entity tables before join tables, then by name.
    /// Self-references and references to tables outside `tables` impose no
    /// constraint. A dependency cycle cannot be satisfied; the smallest
    /// blocked table is released and ordering continues.
    pub fn order<'a>(&self, tables: &[&'a TableSnapshot]) -> Vec<&'a TableSnapshot> {
        let by_name: BTreeMap<&str, &'a TableSnapshot> = tables.iter().copied().map(|t| (t.name.as_str(), t)).collect();

        let mut indegree: BTreeMap<&str, usize> = by_name.keys().map(|name| (*name, 0)).collect();
        let mut dependents: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

        for table in by_name.values() {
            let targets: BTreeSet<&str> = table
                .foreign_keys
                .iter()
                .map(|fk| fk.target_table.as_str())
                .filter(|target| *target != table.name && by_name.contains_key(target))
                .collect();

            for target in targets {
                if let Some(entry) = indegree.get_mut(table.name.as_str()) {
                    *entry += 1;
                }
                dependents.entry(target).or_default().insert(table.name.as_str());
            }
        }

        let is_join = |name: &str| by_name.get(name).map_or(false, |t| t.is_join_table);

        let mut ready: BTreeSet<(bool, &str)> = indegree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(name, _)| (is_join(*name), *name))
            .collect();

        let mut ordered = Vec::with_capacity(by_name.len());
        let mut placed: BTreeSet<&str> = BTreeSet::new();

        while ordered.len() < by_name.len() {
            let next = match ready.iter().next().copied() {
                Some(next) => {
                    ready.remove(&next);
                    next.1
                }
                None => {
                    let Some(forced) = indegree
                        .iter()
                        .filter(|(name, _)| !placed.contains(*name))
                        .map(|(name, _)| (is_join(*name), *name))
                        .min()
                    else {
                        break;
                    };
                    warn!(
                        table = forced.1,
                        "Foreign-key cycle between new tables; creating table before its dependencies"
                    );
                    forced.1
                }
            };

            if !placed.insert(next) {
                continue;
            }
            if let Some(table) = by_name.get(next) {
                ordered.push(*table);
            }

            if let Some(children) = dependents.get(next) {
                for child in children {
                    if let Some(entry) = indegree.get_mut(child) {
                        *entry = entry.saturating_sub(1);
                        if *entry == 0 && !placed.contains(child) {
                            ready.insert((is_join(*child), *child));
                        }
                    }
                }
            }
        }

        ordered
    }
}
