//! `egui` widgets over the derived graph and the run feed.

mod dependency_graph;
mod run_timeline;

pub use dependency_graph::DependencyGraph;
pub use dependency_graph::DependencyGraphResponse;
pub use run_timeline::RunTimeline;

use egui::Ui;

use crate::cells::CellId;
use crate::chart::SharedHover;

/// Writes this widget's hovered cell into `hover`. On mouse leave the
/// shared value goes back to none, but only if this widget set it.
fn publish_hover(ui: &Ui, id: egui::Id, hover: Option<&SharedHover>, hovered: Option<CellId>) {
    let Some(hover) = hover else {
        return;
    };
    let owner_id = id.with("cellgraph_hover_owner");
    let owned = ui.data(|data| data.get_temp::<bool>(owner_id).unwrap_or(false));
    match hovered {
        Some(cell) => {
            if !hover.is_hovered(&cell) {
                hover.set(cell);
                ui.ctx().request_repaint();
            }
            ui.data_mut(|data| data.insert_temp(owner_id, true));
        }
        None if owned => {
            hover.clear();
            ui.data_mut(|data| data.insert_temp(owner_id, false));
            ui.ctx().request_repaint();
        }
        None => {}
    }
}

