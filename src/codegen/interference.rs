use std::collections::HashMap;

use itertools::Itertools;
use log::debug;

use super::{
    graph::{Graph, Node, ID},
    liveness::LiveInterval,
};

/// Conflict graph over variables: an edge joins two variables iff their
/// live intervals overlap.
///
/// Node ids follow interval order `(start, var)`, so every walk over the
/// graph is reproducible regardless of how the intervals were supplied.
#[derive(Debug, Clone, Default)]
pub struct InterferenceGraph {
    graph: Graph<String>,
    var2id: HashMap<String, ID>,
}

impl InterferenceGraph {
    /// Expects at most one interval per variable.
    pub fn build<'a>(intervals: impl IntoIterator<Item = &'a LiveInterval>) -> Self {
        let intervals: Vec<&LiveInterval> = intervals
            .into_iter()
            .sorted_by(|a, b| (a.start(), a.var()).cmp(&(b.start(), b.var())))
            .collect();

        let mut graph = Graph::with_capacity(intervals.len());
        let mut var2id = HashMap::with_capacity(intervals.len());
        let ids: Vec<ID> = intervals
            .iter()
            .map(|interval| {
                let id = graph.insert(interval.var().to_string());
                var2id.insert(interval.var().to_string(), id);
                id
            })
            .collect();

        for ((&one, a), (&other, b)) in ids.iter().zip(&intervals).tuple_combinations() {
            if a.overlaps(b) {
                graph.double_link(one, other);
            }
        }

        debug!(
            "built interference graph: {} vertices, {} edges",
            graph.nodes().len(),
            graph.edge_count()
        );

        Self { graph, var2id }
    }

    pub fn graph_ref(&self) -> &Graph<String> {
        &self.graph
    }

    pub fn id(&self, var: &str) -> Option<ID> {
        self.var2id.get(var).copied()
    }

    pub fn var(&self, id: ID) -> &str {
        self.graph.get(id).val()
    }

    pub fn node_count(&self) -> usize {
        self.graph.nodes().len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Variables in node order.
    pub fn vars(&self) -> impl Iterator<Item = &str> + '_ {
        self.graph.nodes().iter().map(|node| node.val().as_str())
    }

    pub fn neighbors(&self, var: &str) -> Option<Vec<&str>> {
        let node = self.graph.get(self.id(var)?);
        Some(node.adj().map(|adj| self.var(adj)).collect())
    }

    pub fn degree(&self, var: &str) -> Option<usize> {
        self.id(var).map(|id| self.graph.get(id).degree())
    }

    pub fn interferes(&self, one: &str, other: &str) -> bool {
        match (self.id(one), self.id(other)) {
            (Some(one), Some(other)) => self.graph.is_linked(one, other),
            _ => false,
        }
    }

    pub(super) fn nodes(&self) -> &[Node<String>] {
        self.graph.nodes()
    }
}
