use borderpath_lib::{
    haversine_distance, solve, Coordinate, Edge, Graph, GraphBuilder, MissionProfile, Node,
    NodeId, RouteAlgorithm,
};
use criterion::{criterion_group, criterion_main, Criterion};
use once_cell::sync::Lazy;
use std::hint::black_box;

const GRID_SIZE: i64 = 60;
const SPACING_DEG: f64 = 0.001;

fn grid_id(row: i64, col: i64) -> NodeId {
    row * GRID_SIZE + col
}

fn grid_coordinate(row: i64, col: i64) -> Coordinate {
    Coordinate::new(
        26.9 + row as f64 * SPACING_DEG,
        70.0 + col as f64 * SPACING_DEG,
    )
    .expect("grid coordinate in range")
}

/// Square street grid where every fifth row and column is a fast avenue.
static GRID: Lazy<Graph> = Lazy::new(|| {
    let mut builder = GraphBuilder::new();
    for row in 0..GRID_SIZE {
        for col in 0..GRID_SIZE {
            builder.add_node(Node {
                id: grid_id(row, col),
                coordinate: grid_coordinate(row, col),
            });
        }
    }

    let mut connect = |a: (i64, i64), b: (i64, i64), avenue: bool| {
        let length = haversine_distance(&grid_coordinate(a.0, a.1), &grid_coordinate(b.0, b.1));
        let edge = Edge::new(grid_id(a.0, a.1), grid_id(b.0, b.1), length)
            .with_speed(if avenue { 60.0 } else { 20.0 });
        builder.add_two_way(edge);
    };
    for row in 0..GRID_SIZE {
        for col in 0..GRID_SIZE {
            if col + 1 < GRID_SIZE {
                connect((row, col), (row, col + 1), row % 5 == 0);
            }
            if row + 1 < GRID_SIZE {
                connect((row, col), (row + 1, col), col % 5 == 0);
            }
        }
    }

    let mut graph = builder.build();
    graph.add_travel_times();
    graph
});

fn benchmark_pathfinding(c: &mut Criterion) {
    let graph = &*GRID;
    let origin = grid_id(0, 0);
    let destination = grid_id(GRID_SIZE - 1, GRID_SIZE - 1);

    for mission in [MissionProfile::Stealth, MissionProfile::Speed] {
        for algorithm in [RouteAlgorithm::Dijkstra, RouteAlgorithm::AStar] {
            c.bench_function(&format!("{algorithm}_grid_{mission}"), |b| {
                b.iter(|| {
                    let route = solve(
                        graph,
                        black_box(origin),
                        black_box(destination),
                        algorithm,
                        &mission,
                    )
                    .expect("route exists");
                    black_box(route.hop_count())
                });
            });
        }
    }
}

criterion_group!(benches, benchmark_pathfinding);
criterion_main!(benches);
