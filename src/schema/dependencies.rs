use super::tables::{get_table, ALL_TABLES};
use super::types::TableSchema;
use std::collections::{BTreeMap, BTreeSet};

/// Orders tables so every foreign-key parent precedes its children
pub struct DependencyResolver {
    /// Map of table name -> tables it depends on
    deps: BTreeMap<&'static str, BTreeSet<&'static str>>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self::for_tables(ALL_TABLES)
    }

    pub fn for_tables(tables: &[&'static TableSchema]) -> Self {
        let deps = tables
            .iter()
            .map(|table| (table.name, table.dependencies().into_iter().collect()))
            .collect();
        Self { deps }
    }

    /// Return all tables in creation order (parents before children).
    ///
    /// Ties are broken alphabetically so the generated DDL is stable.
    pub fn creation_order(&self) -> Result<Vec<&'static TableSchema>, String> {
        let mut remaining: BTreeMap<&str, BTreeSet<&str>> = self
            .deps
            .iter()
            .map(|(name, deps)| {
                let known = deps
                    .iter()
                    .copied()
                    .filter(|dep| self.deps.contains_key(dep))
                    .collect();
                (*name, known)
            })
            .collect();
        let mut ordered = Vec::with_capacity(remaining.len());

        while !remaining.is_empty() {
            let ready: Vec<&str> = remaining
                .iter()
                .filter(|(_, deps)| deps.is_empty())
                .map(|(name, _)| *name)
                .collect();

            if ready.is_empty() {
                let stuck: Vec<&str> = remaining.keys().copied().collect();
                return Err(format!(
                    "Circular dependency detected between: {}",
                    stuck.join(", ")
                ));
            }

            for name in ready {
                remaining.remove(name);
                for deps in remaining.values_mut() {
                    deps.remove(name);
                }
                match get_table(name) {
                    Some(table) => ordered.push(table),
                    None => return Err(format!("Unknown table: {}", name)),
                }
            }
        }

        Ok(ordered)
    }
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new()
    }
}
