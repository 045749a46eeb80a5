//! Which cells go stale when a cell changes or gets disabled.

use std::collections::HashSet;

use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Bfs;

use crate::cells::CellId;
use crate::edges::CellEdge;

/// Reachability over derived cell edges.
#[derive(Clone, Debug)]
pub struct Staleness<'a> {
    graph: DiGraphMap<&'a str, ()>,
}

impl<'a> Staleness<'a> {
    pub fn new(edges: &'a [CellEdge]) -> Self {
        let mut graph = DiGraphMap::new();
        for edge in edges {
            if edge.source != edge.target {
                graph.add_edge(edge.source.as_str(), edge.target.as_str(), ());
            }
        }
        Self { graph }
    }

    /// Every cell downstream of `cell` in BFS order, without `cell` itself.
    pub fn descendants(&self, cell: &CellId) -> Vec<CellId> {
        let start = cell.as_str();
        if !self.graph.contains_node(start) {
            return Vec::new();
        }
        let mut bfs = Bfs::new(&self.graph, start);
        let mut reached = Vec::new();
        while let Some(node) = bfs.next(&self.graph) {
            if node != start {
                reached.push(CellId::from(node));
            }
        }
        reached
    }

    /// Cells that cannot run because something upstream is disabled.
    /// Explicitly disabled cells are not repeated.
    pub fn transitively_disabled(&self, disabled: &[CellId]) -> Vec<CellId> {
        let _span = tracing::info_span!("cellgraph_staleness", disabled = disabled.len()).entered();
        let explicit: HashSet<&str> = disabled.iter().map(CellId::as_str).collect();
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for cell in disabled {
            for descendant in self.descendants(cell) {
                if !explicit.contains(descendant.as_str()) && seen.insert(descendant.clone()) {
                    result.push(descendant);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(source: &str, target: &str) -> CellEdge {
        CellEdge {
            source: source.into(),
            target: target.into(),
        }
    }

    fn ids(cells: &[CellId]) -> Vec<&str> {
        cells.iter().map(CellId::as_str).collect()
    }

    #[test]
    fn descendants_follow_edges_breadth_first() {
        let edges = vec![edge("a", "b"), edge("a", "c"), edge("b", "d"), edge("c", "d")];
        let staleness = Staleness::new(&edges);

        assert_eq!(ids(&staleness.descendants(&"a".into())), vec!["b", "c", "d"]);
        assert!(staleness.descendants(&"d".into()).is_empty());
        assert!(staleness.descendants(&"unknown".into()).is_empty());
    }

    #[test]
    fn cycles_do_not_include_the_start() {
        let edges = vec![edge("a", "b"), edge("b", "a")];
        let staleness = Staleness::new(&edges);

        assert_eq!(ids(&staleness.descendants(&"a".into())), vec!["b"]);
    }

    #[test]
    fn disabled_cells_propagate_downstream() {
        let edges = vec![edge("a", "b"), edge("b", "c"), edge("x", "c")];
        let staleness = Staleness::new(&edges);

        let stale = staleness.transitively_disabled(&["a".into(), "b".into()]);

        assert_eq!(ids(&stale), vec!["c"]);
    }
}
