use std::collections::HashSet;

use cellgraph::chart::chart_values_in;
use cellgraph::chart::format_chart_time_in;
use cellgraph::diff::ElementChanges;
use cellgraph::edges::EdgeIndex;
use cellgraph::layout::compute_positions;
use cellgraph::prelude::*;
use cellgraph::selection::SelectionPanel;
use chrono::Utc;

fn ids(ids: &[&str]) -> Vec<CellId> {
    ids.iter().copied().map(CellId::from).collect()
}

fn notebook() -> (CellStore, VariableTable) {
    let cells: CellStore = [
        ("setup", "import marimo as mo\nimport polars as pl"),
        ("load", "df = pl.read_csv(path)"),
        ("title", "mo.md('# Sales')"),
        ("plot", "chart = plot(df)"),
        ("stats", "summary = df.describe()\nmo.md(f'{summary}')"),
    ]
    .into_iter()
    .collect();
    let variables: VariableTable = [
        Variable::new("mo").declared_by(["setup"]).used_by(["title", "stats"]),
        Variable::new("pl").declared_by(["setup"]).used_by(["load"]),
        Variable::new("df")
            .declared_by(["load"])
            .used_by(["plot", "stats"])
            .data_type("DataFrame"),
        Variable::new("summary").declared_by(["stats"]),
    ]
    .into_iter()
    .collect();
    (cells, variables)
}

#[test]
fn shared_declaration_fans_out_without_sibling_edges() {
    let variables: VariableTable = [Variable::new("x").declared_by(["A"]).used_by(["B", "C"])]
        .into_iter()
        .collect();

    let keys: Vec<String> = EdgeIndex::new(&variables)
        .edges()
        .iter()
        .map(|edge| edge.key())
        .collect();

    assert_eq!(keys, vec!["A-B", "A-C"]);
}

#[test]
fn edge_keys_are_unique_in_both_modes() {
    let (cells, mut variables) = notebook();
    variables.insert(Variable::new("df_copy").declared_by(["load"]).used_by(["plot"]));
    let order = ids(&["setup", "load", "title", "plot", "stats"]);

    for mode in [GraphMode::Minimap, GraphMode::Tree] {
        let elements = create_elements(mode, &order, &cells, &variables, &GraphSettings::default());
        let mut seen = HashSet::new();
        for edge in &elements.edges {
            assert!(seen.insert(edge.id.clone()), "{mode:?} repeats {}", edge.id);
        }
    }
}

#[test]
fn selected_node_reports_inputs_and_outputs() {
    let variables: VariableTable = [
        Variable::new("a").declared_by(["A"]).used_by(["B"]),
        Variable::new("b").declared_by(["B"]).used_by(["C"]),
    ]
    .into_iter()
    .collect();
    let cells: CellStore = [("A", "a = 1"), ("B", "b = a"), ("C", "b")].into_iter().collect();

    for mode in [GraphMode::Minimap, GraphMode::Tree] {
        let elements = create_elements(
            mode,
            &ids(&["A", "B", "C"]),
            &cells,
            &variables,
            &GraphSettings::default(),
        );
        let mut selection = SelectionController::new();
        selection.select(GraphSelection::node("B"), &elements);

        let SelectionPanel::Node {
            inputs,
            outputs,
            declares,
            ..
        } = selection.panel(&elements, &variables)
        else {
            panic!("{mode:?}: expected a node panel");
        };
        assert_eq!(inputs, ids(&["A"]), "{mode:?}");
        assert_eq!(outputs, ids(&["C"]), "{mode:?}");
        assert_eq!(declares.len(), 1);
        assert_eq!(declares[0].name, "b");
    }
}

#[test]
fn markdown_cells_hide_unless_connected() {
    let (cells, variables) = notebook();
    let order = ids(&["setup", "load", "title", "plot", "stats"]);
    let settings = GraphSettings::default().hide_pure_markdown(true);

    let elements = create_elements(GraphMode::Tree, &order, &cells, &variables, &settings);
    let nodes = elements.node_ids();
    // `mo` is ambient, so `title` has no edges left and is dropped.
    assert!(!nodes.contains(&CellId::from("title")));
    assert!(nodes.contains(&CellId::from("stats")));

    let mut connected = variables.clone();
    connected.insert(Variable::new("heading").declared_by(["title"]).used_by(["plot"]));
    let elements = create_elements(GraphMode::Tree, &order, &cells, &connected, &settings);
    assert!(elements.contains_node(&CellId::from("title")));
}

#[test]
fn recompute_reconciles_and_lays_out() {
    let (mut cells, variables) = notebook();
    let settings = GraphSettings::default();
    let config = LayoutConfig::default();

    let mut rendered = create_elements(
        GraphMode::Tree,
        &ids(&["setup", "load", "title", "plot", "stats"]),
        &cells,
        &variables,
        &settings,
    );
    layout_elements(&mut rendered, &config);

    cells.remove(&CellId::from("title"));
    cells.set_code("notes", "# scratch");
    let mut next = create_elements(
        GraphMode::Tree,
        &ids(&["setup", "load", "plot", "stats", "notes"]),
        &cells,
        &variables,
        &settings,
    );
    layout_elements(&mut next, &config);

    let changes = ElementChanges::between(&rendered, &next);
    assert!(!changes.is_empty());
    changes.apply(&mut rendered);

    assert_eq!(rendered.node_ids(), next.node_ids());
    let edge_ids = |elements: &GraphElements| -> HashSet<String> {
        elements.edges.iter().map(|edge| edge.id.clone()).collect()
    };
    assert_eq!(edge_ids(&rendered), edge_ids(&next));
    assert_eq!(
        compute_positions(&next.nodes, &next.edges, &config),
        compute_positions(&next.nodes, &next.edges, &config)
    );

    let load = next.node(&CellId::from("load")).unwrap().position;
    let plot = next.node(&CellId::from("plot")).unwrap().position;
    assert!(load.y < plot.y);
}

#[test]
fn runs_record_independent_histories() {
    let mut runs = RunsState::new();
    for event in [
        RunEvent::new("R1", "X", RunStatus::Queued, 100.0).code("x = 1"),
        RunEvent::new("R1", "X", RunStatus::Running, 100.5),
        RunEvent::new("R1", "X", RunStatus::Success, 101.0),
        RunEvent::new("R1", "X", RunStatus::Running, 101.5),
        RunEvent::new("R2", "X", RunStatus::Running, 200.0),
    ] {
        runs.apply(&event);
    }

    let first = runs.run(&"R1".into()).unwrap();
    assert_eq!(first.cell_runs.len(), 1);
    assert_eq!(first.cell_runs[0].status, RunStatus::Success);
    assert_eq!(first.cell_runs[0].elapsed_time, Some(0.5));
    assert_eq!(first.cell_runs[0].code, "x = 1");

    let second = runs.run(&"R2".into()).unwrap();
    assert_eq!(second.cell_runs.len(), 1);
    assert_eq!(second.cell_runs[0].status, RunStatus::Running);
    assert_eq!(second.cell_runs[0].elapsed_time, None);

    let rows = chart_values_in(second, &ids(&["X"]), &Utc);
    assert_eq!(rows[0].elapsed_time, "-");
    assert_eq!(rows[0].cell_num, Some(0));
}

#[test]
fn chart_time_in_utc() {
    assert_eq!(
        format_chart_time_in(1_700_000_000.0, &Utc),
        "2023-11-14 22:13:20.000"
    );
    assert_eq!(format_chart_time_in(f64::NAN, &Utc), "");
}

#[test]
fn disabling_a_source_stales_its_consumers() {
    let (_, variables) = notebook();
    let edges = EdgeIndex::new(&variables)
        .skip_identifier(Some("mo"))
        .edges();
    let staleness = Staleness::new(&edges);

    let stale = staleness.transitively_disabled(&ids(&["load"]));

    assert_eq!(stale, ids(&["plot", "stats"]));
    assert_eq!(
        staleness.descendants(&CellId::from("setup")),
        ids(&["load", "plot", "stats"])
    );
}

#[cfg(feature = "serde")]
#[test]
fn kernel_messages_deserialize() {
    let event: RunEvent = serde_json::from_str(
        r#"{"cell_id":"Hbol","run_id":"r-1","status":"success","timestamp":12.5,"elapsed_time":0.2}"#,
    )
    .unwrap();

    assert_eq!(event.status, RunStatus::Success);
    assert_eq!(event.elapsed_time, Some(0.2));
    assert_eq!(event.code, None);
}
