//! Id-keyed reconciliation between two renders of the graph.
//!
//! The renderer animates additions and removals, so a recompute is handed
//! over as a list of changes rather than a fresh element set.

use std::collections::HashMap;
use std::collections::HashSet;
use std::hash::Hash;

use crate::cells::CellId;
use crate::graph::GraphEdge;
use crate::graph::GraphElements;
use crate::graph::GraphNode;

/// Something with a stable identity across renders.
pub trait Keyed {
    type Key: Clone + Eq + Hash + std::fmt::Debug;

    fn key(&self) -> Self::Key;
}

impl Keyed for GraphNode {
    type Key = CellId;

    fn key(&self) -> CellId {
        self.id.clone()
    }
}

impl Keyed for GraphEdge {
    type Key = String;

    fn key(&self) -> String {
        self.id.clone()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Change<T: Keyed> {
    Add(T),
    Remove(T::Key),
    /// Same id in both renders, different contents (moved, resized, restyled).
    Replace(T),
}

pub type NodeChange = Change<GraphNode>;
pub type EdgeChange = Change<GraphEdge>;

/// Removals first (in `prev` order), then replacements and additions (in
/// `next` order).
pub fn diff<T: Keyed + Clone + PartialEq>(prev: &[T], next: &[T]) -> Vec<Change<T>> {
    let next_keys: HashSet<T::Key> = next.iter().map(Keyed::key).collect();
    let previous: HashMap<T::Key, &T> = prev.iter().map(|item| (item.key(), item)).collect();

    let mut changes = Vec::new();
    let mut removed = HashSet::new();
    for item in prev {
        let key = item.key();
        if !next_keys.contains(&key) && removed.insert(key.clone()) {
            changes.push(Change::Remove(key));
        }
    }

    let mut added = HashSet::new();
    for item in next {
        let key = item.key();
        if !added.insert(key.clone()) {
            continue;
        }
        match previous.get(&key) {
            None => changes.push(Change::Add(item.clone())),
            Some(old) if *old != item => changes.push(Change::Replace(item.clone())),
            Some(_) => {}
        }
    }
    changes
}

pub fn get_node_changes(prev: &[GraphNode], next: &[GraphNode]) -> Vec<NodeChange> {
    let _span = tracing::info_span!("cellgraph_node_changes").entered();
    diff(prev, next)
}

pub fn get_edge_changes(prev: &[GraphEdge], next: &[GraphEdge]) -> Vec<EdgeChange> {
    let _span = tracing::info_span!("cellgraph_edge_changes").entered();
    diff(prev, next)
}

/// Applies `changes` in order. Replacements of unknown ids behave like
/// additions so a stale change list never drops elements.
pub fn apply_changes<T: Keyed + Clone>(items: &mut Vec<T>, changes: &[Change<T>]) {
    for change in changes {
        match change {
            Change::Remove(key) => items.retain(|item| &item.key() != key),
            Change::Add(item) => items.push(item.clone()),
            Change::Replace(item) => {
                let key = item.key();
                match items.iter_mut().find(|existing| existing.key() == key) {
                    Some(existing) => *existing = item.clone(),
                    None => items.push(item.clone()),
                }
            }
        }
    }
}

/// Both change lists between two element sets.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElementChanges {
    pub nodes: Vec<NodeChange>,
    pub edges: Vec<EdgeChange>,
}

impl ElementChanges {
    pub fn between(prev: &GraphElements, next: &GraphElements) -> Self {
        Self {
            nodes: get_node_changes(&prev.nodes, &next.nodes),
            edges: get_edge_changes(&prev.edges, &next.edges),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn apply(&self, elements: &mut GraphElements) {
        apply_changes(&mut elements.nodes, &self.nodes);
        apply_changes(&mut elements.edges, &self.edges);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;
    use egui::vec2;

    fn node(id: &str, y: f32) -> GraphNode {
        GraphNode {
            id: CellId::from(id),
            cell: None,
            size: vec2(10.0, 10.0),
            position: pos2(0.0, y),
        }
    }

    fn keys(nodes: &[GraphNode]) -> HashSet<CellId> {
        nodes.iter().map(Keyed::key).collect()
    }

    #[test]
    fn reports_only_membership_changes() {
        let prev = vec![node("a", 0.0), node("b", 10.0)];
        let next = vec![node("b", 10.0), node("c", 20.0)];

        let changes = get_node_changes(&prev, &next);

        assert_eq!(
            changes,
            vec![Change::Remove(CellId::from("a")), Change::Add(node("c", 20.0))]
        );
    }

    #[test]
    fn moved_nodes_are_replaced() {
        let prev = vec![node("a", 0.0)];
        let next = vec![node("a", 5.0)];

        assert_eq!(get_node_changes(&prev, &next), vec![Change::Replace(node("a", 5.0))]);
    }

    #[test]
    fn applying_reproduces_next() {
        let prev = vec![node("a", 0.0), node("b", 10.0), node("c", 20.0)];
        let next = vec![node("d", 0.0), node("b", 15.0), node("e", 30.0)];

        let mut current = prev.clone();
        apply_changes(&mut current, &get_node_changes(&prev, &next));

        assert_eq!(keys(&current), keys(&next));
        for item in &next {
            assert!(current.contains(item));
        }
    }

    #[test]
    fn identical_renders_produce_no_changes() {
        let nodes = vec![node("a", 0.0), node("b", 10.0)];
        assert!(get_node_changes(&nodes, &nodes).is_empty());
    }
}
