//! Table creation order.
//!
//! Forward-scan insertion: parentless tables are seeded in lexicographic
//! order, then each dependent table (in catalog order) is inserted right after
//! the last of its already placed parents. Parents that are not placed yet are
//! placed first, recursively; a parent that is already on the recursion stack
//! closes a cycle and is skipped, so cyclic edges may end up inverted.

use std::collections::HashSet;

use crate::graph::SchemaGraph;

/// Compute `tableOrder` for the base tables of `graph`.
pub fn order_tables(graph: &SchemaGraph) -> Vec<String> {
    let names = graph.table_names();

    let mut seeded: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| !graph.has_parent.contains(*name))
        .collect();
    seeded.sort_unstable();
    seeded.dedup();

    let mut placer = Placer {
        graph,
        order: seeded,
        visiting: HashSet::new(),
    };
    for name in names {
        if graph.has_parent.contains(name) {
            placer.place(name);
        }
    }

    placer.order.into_iter().map(str::to_string).collect()
}

struct Placer<'g> {
    graph: &'g SchemaGraph,
    order: Vec<&'g str>,
    visiting: HashSet<&'g str>,
}

impl<'g> Placer<'g> {
    fn position(&self, table: &str) -> Option<usize> {
        self.order.iter().position(|placed| *placed == table)
    }

    fn place(&mut self, table: &'g str) {
        if self.position(table).is_some() || !self.visiting.insert(table) {
            return;
        }

        let parents: Vec<&'g str> = self
            .graph
            .relation(table)
            .map(|relation| relation.dependencies())
            .unwrap_or_default()
            .into_iter()
            .filter(|parent| *parent != table && self.graph.is_table(parent))
            .collect();

        for &parent in &parents {
            self.place(parent);
        }

        let anchor = parents
            .iter()
            .filter_map(|parent| self.position(parent))
            .max();
        match anchor {
            Some(idx) => self.order.insert(idx + 1, table),
            None => self.order.push(table),
        }

        self.visiting.remove(table);
    }
}
