// Preludes: re-export commonly used items for convenience
pub use crate::cells::CellId;
pub use crate::cells::CellSource;
pub use crate::cells::CellStore;
pub use crate::cells::Variable;
pub use crate::cells::VariableTable;
pub use crate::chart::chart_values;
pub use crate::chart::SharedHover;
pub use crate::diff::ElementChanges;
pub use crate::graph::create_elements;
pub use crate::graph::GraphElements;
pub use crate::graph::GraphMode;
pub use crate::layout::layout_elements;
pub use crate::runs::RunEvent;
pub use crate::runs::RunStatus;
pub use crate::runs::RunsState;
pub use crate::selection::GraphSelection;
pub use crate::selection::SelectionController;
pub use crate::settings::GraphSettings;
pub use crate::settings::LayoutConfig;
pub use crate::staleness::Staleness;
pub use crate::themes::Styled;
pub use crate::widgets::DependencyGraph;
pub use crate::widgets::RunTimeline;
