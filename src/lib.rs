//! Dependency graphs and run traces for reactive notebooks.
//!
//! Cells declare and use variables. [`edges`] turns the variable table into
//! cell-to-cell dependencies, [`graph`] builds renderable nodes and edges for
//! the minimap and tree presentations, [`layout`] places the tree and
//! [`diff`] hands recomputes to the renderer as id-keyed changes.
//! [`runs`] records kernel status messages per run and [`chart`] turns a run
//! into timeline rows. The [`widgets`] paint both with `egui`.

pub mod cells;
pub mod chart;
pub mod diff;
pub mod edges;
pub mod graph;
pub mod layout;
pub mod prelude;
pub mod runs;
pub mod selection;
pub mod settings;
pub mod staleness;
pub mod themes;
pub mod widgets;

pub use cells::CellId;
pub use cells::VariableTable;
pub use graph::create_elements;
pub use graph::GraphElements;
pub use graph::GraphMode;
pub use settings::GraphSettings;
pub use settings::LayoutConfig;
pub use settings::ParseError;
