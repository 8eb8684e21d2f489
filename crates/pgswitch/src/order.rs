//! Foreign-key aware ordering of tables.
//!
//! Rows are written parent-first: a table comes after every table it references.
//! Deletes run the other way around.

use crate::error::{SwitchError, SwitchResult};
use crate::table::Table;
use std::collections::{BTreeMap, BTreeSet};

/// Sort tables so that each one follows the tables it depends on.
///
/// Among tables that are ready at the same time, names are taken in ascending
/// order so the result is stable. Dependencies on tables that are not part of
/// `tables` are ignored.
pub fn sort_by_dependencies(tables: Vec<Table>) -> SwitchResult<Vec<Table>> {
    let mut pending: BTreeMap<String, Table> = tables
        .into_iter()
        .map(|t| (t.name().to_string(), t))
        .collect();

    // table -> number of unsatisfied dependencies inside the set
    let mut waiting_on: BTreeMap<String, usize> = BTreeMap::new();
    // table -> tables that reference it
    let mut dependents: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for (name, table) in &pending {
        let mut count = 0;
        for dep in table.dependencies() {
            if pending.contains_key(dep) {
                count += 1;
                dependents
                    .entry(dep.to_string())
                    .or_default()
                    .push(name.clone());
            }
        }
        waiting_on.insert(name.clone(), count);
    }

    let mut ready: BTreeSet<String> = waiting_on
        .iter()
        .filter(|(_, n)| **n == 0)
        .map(|(name, _)| name.clone())
        .collect();

    let mut sorted = Vec::with_capacity(pending.len());
    while let Some(name) = ready.pop_first() {
        if let Some(children) = dependents.get(&name) {
            for child in children {
                if let Some(n) = waiting_on.get_mut(child) {
                    *n -= 1;
                    if *n == 0 {
                        ready.insert(child.clone());
                    }
                }
            }
        }
        if let Some(table) = pending.remove(&name) {
            sorted.push(table);
        }
    }

    if !pending.is_empty() {
        return Err(SwitchError::DependencyCycle(pending.into_keys().collect()));
    }

    Ok(sorted)
}

/// Order for deleting rows: the reverse of [`sort_by_dependencies`].
pub fn delete_order(tables: Vec<Table>) -> SwitchResult<Vec<Table>> {
    let mut sorted = sort_by_dependencies(tables)?;
    sorted.reverse();
    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(tables: &[Table]) -> Vec<&str> {
        tables.iter().map(Table::name).collect()
    }

    fn table(name: &str, deps: &[&str]) -> Table {
        deps.iter()
            .fold(Table::new(name, ["id"]), |t, d| t.with_dependency(*d))
    }

    #[test]
    fn no_dependencies_sorts_by_name() {
        let sorted =
            sort_by_dependencies(vec![table("c", &[]), table("a", &[]), table("b", &[])]).unwrap();
        assert_eq!(names(&sorted), vec!["a", "b", "c"]);
    }

    #[test]
    fn parents_come_first() {
        let sorted = sort_by_dependencies(vec![
            table("alerts", &["services"]),
            table("services", &["escalation_policies"]),
            table("escalation_policies", &[]),
        ])
        .unwrap();
        assert_eq!(
            names(&sorted),
            vec!["escalation_policies", "services", "alerts"]
        );
    }

    #[test]
    fn diamond() {
        let sorted = sort_by_dependencies(vec![
            table("d", &["b", "c"]),
            table("b", &["a"]),
            table("c", &["a"]),
            table("a", &[]),
        ])
        .unwrap();
        assert_eq!(names(&sorted), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn unknown_dependencies_are_ignored() {
        let sorted =
            sort_by_dependencies(vec![table("users", &["skipped"]), table("auth", &["users"])])
                .unwrap();
        assert_eq!(names(&sorted), vec!["users", "auth"]);
    }

    #[test]
    fn self_reference_is_not_a_cycle() {
        let sorted = sort_by_dependencies(vec![table("node", &["node"])]).unwrap();
        assert_eq!(names(&sorted), vec!["node"]);
    }

    #[test]
    fn cycle_is_reported() {
        let err = sort_by_dependencies(vec![
            table("a", &["b"]),
            table("b", &["a"]),
            table("root", &[]),
            table("leaf", &["a"]),
        ])
        .unwrap_err();
        match err {
            SwitchError::DependencyCycle(tables) => {
                assert_eq!(tables, vec!["a", "b", "leaf"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn delete_order_is_reversed() {
        let sorted = delete_order(vec![table("child", &["parent"]), table("parent", &[])]).unwrap();
        assert_eq!(names(&sorted), vec!["child", "parent"]);
    }
}
