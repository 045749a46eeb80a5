//! Node and edge records for the two dependency graph presentations.

mod minimap;
mod tree;

use std::collections::HashSet;

use egui::Pos2;
use egui::Vec2;

use crate::cells::CellHandle;
use crate::cells::CellId;
use crate::cells::CellSource;
use crate::cells::VariableTable;
use crate::edges::edge_key;
use crate::edges::EdgeDirection;
use crate::settings::GraphSettings;

pub use minimap::VerticalElementsBuilder;
pub use tree::is_pure_markdown;
pub use tree::TreeElementsBuilder;

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: CellId,
    /// Live cell content. `None` when the notebook has no content for the id yet.
    pub cell: Option<CellHandle>,
    pub size: Vec2,
    /// Top-left corner. Assigned directly by the minimap builder, by
    /// [`crate::layout`] for the tree.
    pub position: Pos2,
}

impl GraphNode {
    pub fn rect(&self) -> egui::Rect {
        egui::Rect::from_min_size(self.position, self.size)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
    pub id: String,
    pub source: CellId,
    pub target: CellId,
    /// Handle pair the edge binds to. Always `None` in tree mode.
    pub direction: Option<EdgeDirection>,
    pub animated: bool,
    pub stroke_width: f32,
}

impl GraphEdge {
    pub fn new(source: CellId, target: CellId, direction: Option<EdgeDirection>) -> Self {
        Self {
            id: edge_key(&source, &target, direction),
            source,
            target,
            direction,
            animated: false,
            stroke_width: 1.0,
        }
    }

    /// True for exactly one record per logical dependency: minimap graphs
    /// carry each pair twice, once per handle direction.
    pub fn is_canonical(&self) -> bool {
        self.direction != Some(EdgeDirection::Inputs)
    }

    pub fn connects(&self, source: &CellId, target: &CellId) -> bool {
        &self.source == source && &self.target == target
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphElements {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphElements {
    pub fn node(&self, id: &CellId) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| &node.id == id)
    }

    pub fn contains_node(&self, id: &CellId) -> bool {
        self.node(id).is_some()
    }

    pub fn contains_edge(&self, source: &CellId, target: &CellId) -> bool {
        self.edges.iter().any(|edge| edge.connects(source, target))
    }

    pub fn node_ids(&self) -> HashSet<CellId> {
        self.nodes.iter().map(|node| node.id.clone()).collect()
    }

    /// One edge per dependency, whatever the presentation.
    pub fn canonical_edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(|edge| edge.is_canonical())
    }

    /// Smallest rectangle containing every node.
    pub fn bounds(&self) -> egui::Rect {
        self.nodes
            .iter()
            .fold(egui::Rect::NOTHING, |bounds, node| bounds.union(node.rect()))
    }
}

/// Turns cell ids plus the variable table into renderable elements.
pub trait ElementsBuilder {
    fn create_elements(
        &self,
        cell_ids: &[CellId],
        cells: &dyn CellSource,
        variables: &VariableTable,
        settings: &GraphSettings,
    ) -> GraphElements;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GraphMode {
    /// Cells stacked in notebook order, next to the editor.
    #[default]
    Minimap,
    /// Hierarchical layout of the dependencies.
    Tree,
}

impl GraphMode {
    pub fn builder(self) -> &'static dyn ElementsBuilder {
        match self {
            GraphMode::Minimap => &VerticalElementsBuilder,
            GraphMode::Tree => &TreeElementsBuilder,
        }
    }
}

/// Builds the elements for `mode`. Tree positions are still unset; run
/// [`crate::layout::layout_elements`] on the result.
pub fn create_elements(
    mode: GraphMode,
    cell_ids: &[CellId],
    cells: &dyn CellSource,
    variables: &VariableTable,
    settings: &GraphSettings,
) -> GraphElements {
    let _span = tracing::info_span!("cellgraph_elements", ?mode, cells = cell_ids.len()).entered();
    mode.builder()
        .create_elements(cell_ids, cells, variables, settings)
}

/// Cell ids in notebook order with duplicates dropped.
fn unique_cells(cell_ids: &[CellId]) -> (Vec<&CellId>, HashSet<CellId>) {
    let mut seen = HashSet::with_capacity(cell_ids.len());
    let mut ordered = Vec::with_capacity(cell_ids.len());
    for id in cell_ids {
        if seen.insert(id.clone()) {
            ordered.push(id);
        }
    }
    (ordered, seen)
}
