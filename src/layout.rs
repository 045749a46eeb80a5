//! Layered placement of the tree view.
//!
//! Ranks come from the dependency order, nodes inside a rank are ordered by
//! a few barycenter sweeps, then ranks are stacked along the layout
//! direction. Everything iterates in input order, so identical input gives
//! identical positions.

use std::collections::HashMap;
use std::collections::HashSet;

use egui::pos2;
use egui::Pos2;
use egui::Vec2;
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use petgraph::graph::NodeIndex;
use petgraph::visit::depth_first_search;
use petgraph::visit::DfsEvent;
use petgraph::Direction;

use crate::graph::GraphEdge;
use crate::graph::GraphElements;
use crate::graph::GraphNode;
use crate::settings::LayoutConfig;
use crate::settings::LayoutDirection;
use crate::settings::Ranker;

const ORDERING_SWEEPS: usize = 2;

/// Positions every node of `elements` in place.
pub fn layout_elements(elements: &mut GraphElements, config: &LayoutConfig) {
    let positions = compute_positions(&elements.nodes, &elements.edges, config);
    for (node, position) in elements.nodes.iter_mut().zip(positions) {
        node.position = position;
    }
}

/// Top-left corner for each node, in the order of `nodes`.
///
/// Edges naming unknown nodes, self edges and duplicates are ignored. Edges
/// closing a cycle do not constrain the ranking.
pub fn compute_positions(nodes: &[GraphNode], edges: &[GraphEdge], config: &LayoutConfig) -> Vec<Pos2> {
    let _span = tracing::info_span!("cellgraph_layout", nodes = nodes.len(), edges = edges.len())
        .entered();
    if nodes.is_empty() {
        return Vec::new();
    }

    let graph = dependency_dag(nodes, edges);
    let ranks = assign_ranks(&graph, config.ranker);
    let layers = order_layers(&graph, &ranks);
    place(nodes, &layers, config)
}

fn dependency_dag(nodes: &[GraphNode], edges: &[GraphEdge]) -> DiGraph<(), ()> {
    let index: HashMap<_, _> = nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| (&node.id, idx))
        .collect();

    let mut graph = DiGraph::<(), ()>::with_capacity(nodes.len(), edges.len());
    for _ in nodes {
        graph.add_node(());
    }

    let mut seen = HashSet::new();
    for edge in edges {
        let (Some(&from), Some(&to)) = (index.get(&edge.source), index.get(&edge.target)) else {
            continue;
        };
        if from != to && seen.insert((from, to)) {
            graph.add_edge(NodeIndex::new(from), NodeIndex::new(to), ());
        }
    }

    let mut back_edges = HashSet::new();
    depth_first_search(&graph, graph.node_indices(), |event| {
        if let DfsEvent::BackEdge(from, to) = event {
            back_edges.insert((from, to));
        }
    });
    if !back_edges.is_empty() {
        log::debug!("layout ignores {} cyclic dependencies", back_edges.len());
        graph.retain_edges(|graph, edge| {
            graph
                .edge_endpoints(edge)
                .is_some_and(|endpoints| !back_edges.contains(&endpoints))
        });
    }
    graph
}

fn assign_ranks(graph: &DiGraph<(), ()>, ranker: Ranker) -> Vec<usize> {
    let order = match toposort(graph, None) {
        Ok(order) => order,
        Err(cycle) => {
            log::warn!("layout found a cycle through node {:?}", cycle.node_id());
            graph.node_indices().collect()
        }
    };

    let mut ranks = vec![0usize; graph.node_count()];
    for &node in &order {
        ranks[node.index()] = graph
            .neighbors_directed(node, Direction::Incoming)
            .map(|pred| ranks[pred.index()] + 1)
            .max()
            .unwrap_or(0);
    }

    if ranker == Ranker::TightTree {
        for &node in order.iter().rev() {
            let closest_consumer = graph
                .neighbors_directed(node, Direction::Outgoing)
                .map(|succ| ranks[succ.index()])
                .min();
            if let Some(rank) = closest_consumer {
                ranks[node.index()] = ranks[node.index()].max(rank.saturating_sub(1));
            }
        }
    }
    ranks
}

fn order_layers(graph: &DiGraph<(), ()>, ranks: &[usize]) -> Vec<Vec<usize>> {
    let depth = ranks.iter().copied().max().map_or(0, |max| max + 1);
    let mut layers = vec![Vec::new(); depth];
    for (node, &rank) in ranks.iter().enumerate() {
        layers[rank].push(node);
    }

    let mut slot = vec![0usize; ranks.len()];
    let reindex = |layers: &[Vec<usize>], slot: &mut [usize]| {
        for layer in layers {
            for (position, &node) in layer.iter().enumerate() {
                slot[node] = position;
            }
        }
    };
    reindex(&layers, &mut slot);

    for _ in 0..ORDERING_SWEEPS {
        for rank in 1..depth {
            sort_by_barycenter(graph, &mut layers[rank], &slot, Direction::Incoming);
            reindex(&layers, &mut slot);
        }
        for rank in (0..depth.saturating_sub(1)).rev() {
            sort_by_barycenter(graph, &mut layers[rank], &slot, Direction::Outgoing);
            reindex(&layers, &mut slot);
        }
    }
    layers
}

fn sort_by_barycenter(
    graph: &DiGraph<(), ()>,
    layer: &mut [usize],
    slot: &[usize],
    direction: Direction,
) {
    let mut keyed: Vec<(f32, usize)> = layer
        .iter()
        .map(|&node| {
            let (sum, count) = graph
                .neighbors_directed(NodeIndex::new(node), direction)
                .fold((0usize, 0usize), |(sum, count), other| {
                    (sum + slot[other.index()], count + 1)
                });
            let key = if count == 0 {
                slot[node] as f32
            } else {
                sum as f32 / count as f32
            };
            (key, node)
        })
        .collect();
    // Stable: ties keep their current order.
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    for (target, (_, node)) in layer.iter_mut().zip(keyed) {
        *target = node;
    }
}

fn place(nodes: &[GraphNode], layers: &[Vec<usize>], config: &LayoutConfig) -> Vec<Pos2> {
    // `along` runs with the ranks, `across` runs inside a rank.
    let (along, across): (fn(Vec2) -> f32, fn(Vec2) -> f32) = match config.direction {
        LayoutDirection::TopToBottom => (|size: Vec2| size.y, |size: Vec2| size.x),
        LayoutDirection::LeftToRight => (|size: Vec2| size.x, |size: Vec2| size.y),
    };

    let extent = |layer: &[usize]| -> f32 {
        let sizes: f32 = layer.iter().map(|&node| across(nodes[node].size)).sum();
        sizes + config.node_sep * layer.len().saturating_sub(1) as f32
    };
    let widest = layers.iter().map(|layer| extent(layer)).fold(0.0, f32::max);

    let mut positions = vec![Pos2::ZERO; nodes.len()];
    let mut rank_start = 0.0;
    for layer in layers {
        let thickness = layer
            .iter()
            .map(|&node| along(nodes[node].size))
            .fold(0.0, f32::max);
        let mut cursor = (widest - extent(layer)) * 0.5;
        for &node in layer {
            let size = nodes[node].size;
            let main = rank_start + (thickness - along(size)) * 0.5;
            positions[node] = match config.direction {
                LayoutDirection::TopToBottom => pos2(cursor, main),
                LayoutDirection::LeftToRight => pos2(main, cursor),
            };
            cursor += across(size) + config.node_sep;
        }
        rank_start += thickness + config.rank_sep;
    }
    positions
}
