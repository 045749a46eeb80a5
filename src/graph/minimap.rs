use std::collections::HashSet;

use egui::pos2;
use egui::vec2;

use super::unique_cells;
use super::ElementsBuilder;
use super::GraphEdge;
use super::GraphElements;
use super::GraphNode;
use crate::cells::CellId;
use crate::cells::CellSource;
use crate::cells::VariableTable;
use crate::edges::EdgeDirection;
use crate::edges::EdgeIndex;
use crate::settings::GraphSettings;

/// Stacks cells top to bottom in notebook order.
///
/// Node heights follow the line count of the code, capped by
/// [`GraphSettings::max_node_height`]. Each dependency is emitted twice, once
/// per [`EdgeDirection`], so input and output handles can be highlighted
/// independently.
#[derive(Clone, Copy, Debug, Default)]
pub struct VerticalElementsBuilder;

impl ElementsBuilder for VerticalElementsBuilder {
    fn create_elements(
        &self,
        cell_ids: &[CellId],
        cells: &dyn CellSource,
        variables: &VariableTable,
        settings: &GraphSettings,
    ) -> GraphElements {
        let (ordered, known) = unique_cells(cell_ids);

        let mut nodes = Vec::with_capacity(ordered.len());
        let mut y = 0.0;
        for id in ordered {
            let cell = cells.cell(id);
            let lines = cell.as_ref().map_or(1, |cell| cell.line_count());
            let height = settings.minimap_height(lines);
            nodes.push(GraphNode {
                id: id.clone(),
                cell,
                size: vec2(settings.node_width, height),
                position: pos2(0.0, y),
            });
            y += height + settings.node_gap;
        }

        let mut visited = HashSet::new();
        let mut edges = Vec::new();
        for pair in EdgeIndex::new(variables).restrict_to(&known).edges() {
            for direction in EdgeDirection::BOTH {
                let edge = GraphEdge::new(pair.source.clone(), pair.target.clone(), Some(direction));
                if visited.insert(edge.id.clone()) {
                    edges.push(edge);
                }
            }
        }

        GraphElements { nodes, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::CellStore;
    use crate::cells::Variable;

    #[test]
    fn stacks_nodes_with_strictly_increasing_y() {
        let cells: CellStore = [("a", "x = 1"), ("b", "y = x\nz = y"), ("c", "")]
            .into_iter()
            .collect();
        let settings = GraphSettings::default();
        let ids: Vec<CellId> = ["a", "b", "c"].into_iter().map(CellId::from).collect();

        let elements =
            VerticalElementsBuilder.create_elements(&ids, &cells, &VariableTable::new(), &settings);

        let ys: Vec<f32> = elements.nodes.iter().map(|node| node.position.y).collect();
        assert_eq!(ys, vec![0.0, 51.0, 113.0]);
        assert!(elements.nodes.iter().all(|node| node.position.x == 0.0));
        assert_eq!(elements.nodes[1].size.y, 42.0);
    }

    #[test]
    fn emits_both_directions_once() {
        let cells = CellStore::new();
        let variables: VariableTable = [
            Variable::new("x").declared_by(["a"]).used_by(["b"]),
            Variable::new("y").declared_by(["a"]).used_by(["b"]),
        ]
        .into_iter()
        .collect();
        let ids: Vec<CellId> = ["a", "b"].into_iter().map(CellId::from).collect();

        let elements = VerticalElementsBuilder.create_elements(
            &ids,
            &cells,
            &variables,
            &GraphSettings::default(),
        );

        let keys: Vec<&str> = elements.edges.iter().map(|edge| edge.id.as_str()).collect();
        assert_eq!(keys, vec!["a-b-inputs", "a-b-outputs"]);
        assert_eq!(elements.canonical_edges().count(), 1);
    }
}
