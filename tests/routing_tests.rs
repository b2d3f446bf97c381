//! Routing simulation scenarios

use netgraph::graph::{Graph, GraphError};
use netgraph::logging;
use netgraph::routing::{
    flood, random_walk, RouteEntry, RoutingError, RoutingSimulator, RoutingStrategy,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn scenario_graph() -> Graph {
    Graph::from_edges(4, vec![(0, 1, 1), (1, 2, 1), (0, 2, 5), (2, 3, 1)]).unwrap()
}

/// 0 -> 1 -> 2 is a dead-end branch (2 has out-degree 0); 0 -> 3 -> 4 reaches the end.
fn dead_end_graph() -> Graph {
    Graph::from_edges(5, vec![(0, 1, 1), (1, 2, 1), (0, 3, 1), (3, 4, 1)]).unwrap()
}

/// Only path from 0 to 3 runs into vertex 2, which has no way out.
fn trap_graph() -> Graph {
    Graph::from_edges(4, vec![(0, 1, 1), (1, 2, 1), (3, 0, 1)]).unwrap()
}

#[test]
fn test_historical_routing_reuses_one_path() {
    let mut sim = RoutingSimulator::seeded(42);
    let run = sim
        .simulate(&scenario_graph(), RoutingStrategy::Historical, 0, 3, 5, "IPv4")
        .unwrap();

    assert_eq!(run.packets.len(), 5);
    assert_eq!(run.algorithm_name(), "Historical routing");
    for packet in &run.packets {
        assert_eq!(packet.path(), &[0, 1, 2, 3]);
        assert_eq!(packet.hop_limit(), 3);
    }

    // next-hop chain from the start reaches the end in len(path) - 1 steps
    let chain = run.table.follow(0, 3).unwrap();
    assert_eq!(chain, vec![0, 1, 2, 3]);
    assert_eq!(chain.len() - 1, 3);
    assert_eq!(
        run.table.get(2, 3),
        Some(&RouteEntry::Forward {
            next_hop: 3,
            edge_weight: 1
        })
    );
}

#[test]
fn test_flooding_routing_minimal_hops() {
    let mut sim = RoutingSimulator::seeded(1);
    let run = sim
        .simulate(&scenario_graph(), RoutingStrategy::Flooding, 0, 3, 3, "IPv6")
        .unwrap();
    for packet in &run.packets {
        assert_eq!(packet.path(), &[0, 2, 3]);
    }
    assert_eq!(run.protocol, "IPv6");
    assert_eq!(run.table.get(0, 3), Some(&RouteEntry::Hops { hop_count: 2 }));
    assert_eq!(run.table.next_hop(0, 3), None);
}

#[test]
fn test_random_routing_avoids_or_reports_dead_end() {
    let graph = dead_end_graph();
    let mut delivered = 0;
    let mut dead_ends = 0;
    for seed in 0..32 {
        let mut sim = RoutingSimulator::seeded(seed);
        match sim.simulate(&graph, RoutingStrategy::Random, 0, 4, 1, "IPv4") {
            Ok(run) => {
                assert_eq!(run.packets[0].path(), &[0, 3, 4]);
                delivered += 1;
            }
            Err(RoutingError::DeadEnd { packet, vertex }) => {
                assert_eq!(packet, 1);
                assert_eq!(vertex, 2);
                dead_ends += 1;
            }
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
    assert_eq!(delivered + dead_ends, 32);
    assert!(delivered > 0);
    assert!(dead_ends > 0);
}

#[test]
fn test_random_routing_trap_fails() {
    let mut sim = RoutingSimulator::seeded(5);
    let err = sim
        .simulate(&trap_graph(), RoutingStrategy::Random, 0, 3, 4, "IPv4")
        .unwrap_err();
    assert_eq!(err, RoutingError::DeadEnd { packet: 1, vertex: 2 });
}

#[test]
fn test_random_routing_paths_are_valid() {
    let graph = Graph::from_edges(
        5,
        vec![(0, 1, 1), (0, 2, 1), (1, 3, 1), (2, 3, 1), (1, 2, 1), (3, 4, 1), (2, 4, 1)],
    )
    .unwrap();
    let mut sim = RoutingSimulator::seeded(77);
    let run = sim
        .simulate(&graph, RoutingStrategy::Random, 0, 4, 10, "IPv4")
        .unwrap();
    assert_eq!(run.packets.len(), 10);
    for (i, packet) in run.packets.iter().enumerate() {
        assert_eq!(packet.number(), i + 1);
        let path = packet.path();
        assert_eq!(path.first(), Some(&0));
        assert_eq!(path.last(), Some(&4));
        for hop in path.windows(2) {
            assert!(graph.edge(hop[0], hop[1]).is_some());
        }
        let mut seen = path.to_vec();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), path.len(), "walk revisited a vertex");
        assert!((100..=1000).contains(&packet.size_bytes()));
    }
}

#[test]
fn test_same_seed_same_run() {
    let graph = Graph::from_edges(
        4,
        vec![(0, 1, 1), (0, 2, 1), (1, 3, 1), (2, 3, 1), (1, 2, 1), (2, 1, 1)],
    )
    .unwrap();
    let a = RoutingSimulator::seeded(9)
        .simulate(&graph, RoutingStrategy::Random, 0, 3, 8, "IPv4")
        .unwrap();
    let b = RoutingSimulator::seeded(9)
        .simulate(&graph, RoutingStrategy::Random, 0, 3, 8, "IPv4")
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_unreachable_is_explicit() {
    let graph = scenario_graph();
    let mut sim = RoutingSimulator::seeded(0);
    for strategy in [RoutingStrategy::Flooding, RoutingStrategy::Historical] {
        let err = sim.simulate(&graph, strategy, 3, 0, 1, "IPv4").unwrap_err();
        assert_eq!(
            err,
            RoutingError::Unreachable {
                strategy,
                start: 3,
                end: 0
            }
        );
    }
    assert!(matches!(
        sim.simulate(&graph, RoutingStrategy::Random, 3, 0, 1, "IPv4"),
        Err(RoutingError::DeadEnd { packet: 1, vertex: 3 })
    ));
}

#[test]
fn test_start_equals_end() {
    let graph = scenario_graph();
    let mut sim = RoutingSimulator::seeded(0);
    for strategy in RoutingStrategy::ALL {
        let run = sim.simulate(&graph, strategy, 2, 2, 2, "IPv4").unwrap();
        for packet in &run.packets {
            assert_eq!(packet.path(), &[2]);
            assert_eq!(packet.hop_limit(), 0);
        }
        assert!(run.table.is_empty());
    }
}

#[test]
fn test_tables_rebuilt_each_run() {
    let graph = Graph::from_edges(
        4,
        vec![(0, 1, 1), (1, 3, 1), (0, 2, 1), (2, 3, 1)],
    )
    .unwrap();
    let mut sim = RoutingSimulator::seeded(0);
    let first = sim
        .simulate(&graph, RoutingStrategy::Historical, 0, 3, 1, "IPv4")
        .unwrap();
    let second = sim
        .simulate(&graph, RoutingStrategy::Historical, 1, 3, 1, "IPv4")
        .unwrap();
    assert_eq!(first.table.len(), 2);
    assert_eq!(second.table.len(), 1);
    assert!(second.table.get(0, 3).is_none());
}

#[test]
fn test_flood_matches_bfs_order() {
    // Two equal-hop routes; the lower-index neighbor is explored first
    let graph = Graph::from_edges(4, vec![(0, 2, 1), (0, 1, 9), (1, 3, 9), (2, 3, 1)]).unwrap();
    assert_eq!(flood(&graph, 0, 3).unwrap(), Some(vec![0, 1, 3]));
}

/// A later packet hitting the dead end fails the whole run, even after
/// earlier packets were delivered.
#[test]
fn test_random_routing_late_dead_end_discards_run() {
    logging::init_for_tests();
    let graph = dead_end_graph();
    let mut late_failures = 0;
    for seed in 0..64 {
        let mut sim = RoutingSimulator::seeded(seed);
        match sim.simulate(&graph, RoutingStrategy::Random, 0, 4, 8, "IPv4") {
            Ok(run) => {
                assert_eq!(run.packets.len(), 8);
                assert!(run.paths().all(|p| p == [0usize, 3, 4]));
            }
            Err(RoutingError::DeadEnd { packet, vertex }) => {
                assert!((1..=8).contains(&packet));
                assert_eq!(vertex, 2);
                if packet > 1 {
                    late_failures += 1;
                }
            }
            Err(other) => panic!("unexpected error: {}", other),
        }
        assert_eq!(sim.runs(), 1);
    }
    assert!(late_failures > 0);
}

#[test]
fn test_out_of_range_vertex_is_not_unreachable() {
    let graph = Graph::from_edges(2, vec![(0, 1, 1)]).unwrap();
    assert_eq!(
        flood(&graph, 0, 5),
        Err(GraphError::VertexOutOfRange { vertex: 5, count: 2 })
    );
    assert_eq!(flood(&graph, 1, 0), Ok(None));

    let mut rng = StdRng::seed_from_u64(3);
    assert_eq!(
        random_walk(&graph, 0, 5, 1, &mut rng),
        Err(RoutingError::Graph(GraphError::VertexOutOfRange { vertex: 5, count: 2 }))
    );
    assert_eq!(
        random_walk(&graph, 1, 0, 1, &mut rng),
        Err(RoutingError::DeadEnd { packet: 1, vertex: 1 })
    );
}
