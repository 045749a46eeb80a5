//! Derives cell-to-cell dependencies from the variable table.

use std::collections::HashSet;

use crate::cells::CellId;
use crate::cells::VariableTable;

/// Which handle pair of a minimap node an edge is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeDirection {
    Inputs,
    Outputs,
}

impl EdgeDirection {
    pub const BOTH: [EdgeDirection; 2] = [EdgeDirection::Inputs, EdgeDirection::Outputs];

    pub fn as_str(self) -> &'static str {
        match self {
            EdgeDirection::Inputs => "inputs",
            EdgeDirection::Outputs => "outputs",
        }
    }
}

/// A declare→use relationship between two cells.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CellEdge {
    pub source: CellId,
    pub target: CellId,
}

impl CellEdge {
    pub fn key(&self) -> String {
        edge_key(&self.source, &self.target, None)
    }
}

/// Deduplication key of an edge. Minimap edges carry their direction.
pub fn edge_key(source: &CellId, target: &CellId, direction: Option<EdgeDirection>) -> String {
    match direction {
        Some(direction) => format!("{source}-{target}-{}", direction.as_str()),
        None => format!("{source}-{target}"),
    }
}

/// Walks every declaring × using cell pair of every variable.
///
/// Self edges are always dropped. Pairs that reference a cell outside the
/// [`EdgeIndex::restrict_to`] set are skipped silently: that happens while
/// a deleted cell is still listed by the kernel.
#[derive(Clone, Debug)]
pub struct EdgeIndex<'a> {
    variables: &'a VariableTable,
    skip_identifier: Option<&'a str>,
    cells: Option<&'a HashSet<CellId>>,
}

impl<'a> EdgeIndex<'a> {
    pub fn new(variables: &'a VariableTable) -> Self {
        Self {
            variables,
            skip_identifier: None,
            cells: None,
        }
    }

    /// Ignore the variable with this name entirely.
    pub fn skip_identifier(mut self, name: Option<&'a str>) -> Self {
        self.skip_identifier = name;
        self
    }

    /// Only emit edges whose endpoints are both in `cells`.
    pub fn restrict_to(mut self, cells: &'a HashSet<CellId>) -> Self {
        self.cells = Some(cells);
        self
    }

    fn is_known(&self, cell: &CellId) -> bool {
        self.cells.map_or(true, |cells| cells.contains(cell))
    }

    /// Unique edges in variable-table order.
    pub fn edges(&self) -> Vec<CellEdge> {
        let mut visited = HashSet::new();
        let mut edges = Vec::new();
        self.for_each_pair(|source, target| {
            if visited.insert(edge_key(source, target, None)) {
                edges.push(CellEdge {
                    source: source.clone(),
                    target: target.clone(),
                });
            }
        });
        edges
    }

    /// Cells that take part in at least one edge.
    pub fn nodes_with_edges(&self) -> HashSet<CellId> {
        let mut nodes = HashSet::new();
        self.for_each_pair(|source, target| {
            nodes.insert(source.clone());
            nodes.insert(target.clone());
        });
        nodes
    }

    fn for_each_pair(&self, mut visit: impl FnMut(&CellId, &CellId)) {
        for variable in self.variables {
            if self.skip_identifier == Some(variable.name.as_str()) {
                continue;
            }
            for source in &variable.declared_by {
                if !self.is_known(source) {
                    log::debug!(
                        "skipping `{}` declared by unknown cell {source}",
                        variable.name
                    );
                    continue;
                }
                for target in &variable.used_by {
                    if source == target {
                        continue;
                    }
                    if !self.is_known(target) {
                        log::debug!("skipping `{}` used by unknown cell {target}", variable.name);
                        continue;
                    }
                    visit(source, target);
                }
            }
        }
    }
}
