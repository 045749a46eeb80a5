use egui::vec2;
use egui::Pos2;

use super::unique_cells;
use super::ElementsBuilder;
use super::GraphEdge;
use super::GraphElements;
use super::GraphNode;
use crate::cells::CellId;
use crate::cells::CellSource;
use crate::cells::VariableTable;
use crate::edges::EdgeIndex;
use crate::settings::GraphSettings;

/// Emits the hierarchical view: one animated edge per dependency, nodes of a
/// fixed size waiting for [`crate::layout`] to place them.
#[derive(Clone, Copy, Debug, Default)]
pub struct TreeElementsBuilder;

impl ElementsBuilder for TreeElementsBuilder {
    fn create_elements(
        &self,
        cell_ids: &[CellId],
        cells: &dyn CellSource,
        variables: &VariableTable,
        settings: &GraphSettings,
    ) -> GraphElements {
        let (ordered, known) = unique_cells(cell_ids);
        let index = EdgeIndex::new(variables)
            .skip_identifier(settings.ambient_identifier.as_deref())
            .restrict_to(&known);
        let nodes_with_edges = index.nodes_with_edges();

        let mut nodes = Vec::with_capacity(ordered.len());
        for id in ordered {
            let cell = cells.cell(id);
            if settings.hide_pure_markdown && !nodes_with_edges.contains(id) {
                let markdown_only = cell
                    .as_ref()
                    .is_some_and(|cell| is_pure_markdown(&cell.read().code, &settings.markdown_prefix));
                if markdown_only {
                    continue;
                }
            }
            nodes.push(GraphNode {
                id: id.clone(),
                cell,
                size: vec2(settings.node_width, settings.tree_node_height),
                position: Pos2::ZERO,
            });
        }

        let edges = index
            .edges()
            .into_iter()
            .map(|pair| GraphEdge {
                animated: true,
                stroke_width: 2.0,
                ..GraphEdge::new(pair.source, pair.target, None)
            })
            .collect();

        GraphElements { nodes, edges }
    }
}

/// Heuristic for cells that only render markdown: after leading blank and
/// `#` comment lines, the code starts with `prefix`.
pub fn is_pure_markdown(code: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return false;
    }
    code.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .is_some_and(|line| line.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::CellStore;
    use crate::cells::Variable;

    fn ids(ids: &[&str]) -> Vec<CellId> {
        ids.iter().copied().map(CellId::from).collect()
    }

    #[test]
    fn markdown_heuristic_tolerates_comments() {
        assert!(is_pure_markdown("  mo.md('# Title')", "mo.md"));
        assert!(is_pure_markdown("# heading comment\n\nmo.md(text)", "mo.md"));
        assert!(!is_pure_markdown("x = mo.md('a')", "mo.md"));
        assert!(!is_pure_markdown("", "mo.md"));
    }

    #[test]
    fn hides_markdown_cells_without_edges() {
        let cells: CellStore = [("a", "x = 1"), ("md", "mo.md('notes')"), ("b", "x + 1")]
            .into_iter()
            .collect();
        let variables: VariableTable = [Variable::new("x").declared_by(["a"]).used_by(["b"])]
            .into_iter()
            .collect();
        let settings = GraphSettings::default().hide_pure_markdown(true);

        let elements =
            TreeElementsBuilder.create_elements(&ids(&["a", "md", "b"]), &cells, &variables, &settings);

        let nodes: Vec<&str> = elements.nodes.iter().map(|node| node.id.as_str()).collect();
        assert_eq!(nodes, vec!["a", "b"]);
    }

    #[test]
    fn keeps_markdown_cells_with_edges() {
        let cells: CellStore = [("a", "x = 1"), ("md", "mo.md(f'{x}')")]
            .into_iter()
            .collect();
        let variables: VariableTable = [Variable::new("x").declared_by(["a"]).used_by(["md"])]
            .into_iter()
            .collect();
        let settings = GraphSettings::default().hide_pure_markdown(true);

        let elements =
            TreeElementsBuilder.create_elements(&ids(&["a", "md"]), &cells, &variables, &settings);

        assert_eq!(elements.nodes.len(), 2);
        assert_eq!(elements.edges.len(), 1);
        assert!(elements.edges[0].animated);
        assert_eq!(elements.edges[0].id, "a-md");
    }

    #[test]
    fn ambient_import_is_not_a_hub() {
        let cells = CellStore::new();
        let variables: VariableTable = [Variable::new("mo").declared_by(["a"]).used_by(["b", "c"])]
            .into_iter()
            .collect();

        let elements = TreeElementsBuilder.create_elements(
            &ids(&["a", "b", "c"]),
            &cells,
            &variables,
            &GraphSettings::default(),
        );

        assert!(elements.edges.is_empty());
        assert_eq!(elements.nodes.len(), 3);
    }
}
