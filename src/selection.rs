//! Which node or edge the user is looking at, and why it is connected.

use crate::cells::CellId;
use crate::cells::Variable;
use crate::cells::VariableTable;
use crate::graph::GraphElements;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GraphSelection {
    #[default]
    None,
    Node(CellId),
    Edge { source: CellId, target: CellId },
}

impl GraphSelection {
    pub fn node(id: impl Into<CellId>) -> Self {
        Self::Node(id.into())
    }

    pub fn edge(source: impl Into<CellId>, target: impl Into<CellId>) -> Self {
        Self::Edge {
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    fn exists_in(&self, elements: &GraphElements) -> bool {
        match self {
            Self::None => true,
            Self::Node(id) => elements.contains_node(id),
            Self::Edge { source, target } => elements.contains_edge(source, target),
        }
    }
}

/// What a [`SelectionController::select`] call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The selection now points at the requested target.
    Selected,
    /// The target was already selected. Hosts may scroll to or focus the cell.
    Reactivated,
    /// The selection is empty, because it was asked for or because the
    /// target no longer exists.
    Cleared,
}

/// Display strings of one variable for the side panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableSummary {
    pub name: String,
    pub data_type: Option<String>,
    pub value: Option<String>,
}

impl From<&Variable> for VariableSummary {
    fn from(variable: &Variable) -> Self {
        Self {
            name: variable.name.clone(),
            data_type: variable.data_type.clone(),
            value: variable.value.clone(),
        }
    }
}

/// Contents of the selection side panel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SelectionPanel {
    #[default]
    Empty,
    Node {
        id: CellId,
        /// Cells this node reads from.
        inputs: Vec<CellId>,
        /// Cells reading from this node.
        outputs: Vec<CellId>,
        declares: Vec<VariableSummary>,
    },
    Edge {
        source: CellId,
        target: CellId,
        /// Variables declared by `source` and used by `target`.
        variables: Vec<VariableSummary>,
    },
}

/// Single-target selection over a rendered graph.
#[derive(Clone, Debug, Default)]
pub struct SelectionController {
    selection: GraphSelection,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &GraphSelection {
        &self.selection
    }

    /// Replaces the current selection. Targets missing from `elements` clear it.
    pub fn select(&mut self, target: GraphSelection, elements: &GraphElements) -> SelectOutcome {
        if target.is_none() {
            self.clear_selection();
            return SelectOutcome::Cleared;
        }
        if !target.exists_in(elements) {
            log::debug!("selection target {target:?} is gone, clearing");
            self.clear_selection();
            return SelectOutcome::Cleared;
        }
        if self.selection == target {
            return SelectOutcome::Reactivated;
        }
        self.selection = target;
        SelectOutcome::Selected
    }

    pub fn clear_selection(&mut self) {
        self.selection = GraphSelection::None;
    }

    /// Drops the selection if a recompute removed its target.
    pub fn retain_valid(&mut self, elements: &GraphElements) {
        if !self.selection.exists_in(elements) {
            log::debug!("selection {:?} vanished after recompute", self.selection);
            self.clear_selection();
        }
    }

    pub fn is_node_selected(&self, id: &CellId) -> bool {
        matches!(&self.selection, GraphSelection::Node(selected) if selected == id)
    }

    pub fn is_edge_selected(&self, source: &CellId, target: &CellId) -> bool {
        matches!(
            &self.selection,
            GraphSelection::Edge { source: s, target: t } if s == source && t == target
        )
    }

    pub fn panel(&self, elements: &GraphElements, variables: &VariableTable) -> SelectionPanel {
        match &self.selection {
            GraphSelection::None => SelectionPanel::Empty,
            GraphSelection::Node(id) => {
                let (inputs, outputs) = node_neighbors(elements, id);
                SelectionPanel::Node {
                    id: id.clone(),
                    inputs,
                    outputs,
                    declares: variables
                        .iter()
                        .filter(|variable| variable.is_declared_by(id))
                        .map(VariableSummary::from)
                        .collect(),
                }
            }
            GraphSelection::Edge { source, target } => SelectionPanel::Edge {
                source: source.clone(),
                target: target.clone(),
                variables: explain_edge(variables, source, target)
                    .into_iter()
                    .map(VariableSummary::from)
                    .collect(),
            },
        }
    }
}

/// `(inputs, outputs)` of `id` in edge order.
pub fn node_neighbors(elements: &GraphElements, id: &CellId) -> (Vec<CellId>, Vec<CellId>) {
    let mut inputs = Vec::new();
    let mut outputs = Vec::new();
    for edge in elements.canonical_edges() {
        if &edge.target == id {
            inputs.push(edge.source.clone());
        }
        if &edge.source == id {
            outputs.push(edge.target.clone());
        }
    }
    (inputs, outputs)
}

/// Variables that make `source` a dependency of `target`.
pub fn explain_edge<'a>(
    variables: &'a VariableTable,
    source: &CellId,
    target: &CellId,
) -> Vec<&'a Variable> {
    variables
        .iter()
        .filter(|variable| variable.is_declared_by(source) && variable.is_used_by(target))
        .collect()
}
