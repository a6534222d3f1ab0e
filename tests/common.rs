//! Shared graph fixtures for the integration tests.
#![allow(dead_code)]

use mdpkit::domains::GraphDomain;

pub fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

/// 0 -> 1 -> ... -> n-1 with reward -1 per step; the last node is terminal.
pub fn chain(n: usize) -> GraphDomain {
    let mut builder = GraphDomain::builder(n);
    for node in 0..n - 1 {
        builder = builder.edge(node, "right", node + 1, -1.0).unwrap();
    }
    builder.terminal(n - 1).seed(3).build().unwrap()
}

/// Small stochastic graph with a loop, a risky shortcut and a safe detour.
///
/// Node 3 is terminal.
pub fn stochastic() -> GraphDomain {
    GraphDomain::builder(4)
        .outcome(0, "risky", 3, 0.6, -1.0)
        .unwrap()
        .outcome(0, "risky", 0, 0.4, -1.0)
        .unwrap()
        .edge(0, "safe", 1, -1.0)
        .unwrap()
        .outcome(1, "go", 2, 0.9, -1.0)
        .unwrap()
        .outcome(1, "go", 0, 0.1, -2.0)
        .unwrap()
        .edge(2, "go", 3, 5.0)
        .unwrap()
        .edge(2, "back", 1, 0.0)
        .unwrap()
        .terminal(3)
        .seed(17)
        .build()
        .unwrap()
}

/// `width × height` grid, node id `y * width + x`, unit step cost.
pub fn grid(width: usize, height: usize) -> GraphDomain {
    let mut builder = GraphDomain::builder(width * height);
    for y in 0..height {
        for x in 0..width {
            let id = y * width + x;
            if x + 1 < width {
                builder = builder.edge(id, "east", id + 1, -1.0).unwrap();
            }
            if x > 0 {
                builder = builder.edge(id, "west", id - 1, -1.0).unwrap();
            }
            if y + 1 < height {
                builder = builder.edge(id, "south", id + width, -1.0).unwrap();
            }
            if y > 0 {
                builder = builder.edge(id, "north", id - width, -1.0).unwrap();
            }
        }
    }
    builder.build().unwrap()
}

/// Negated Manhattan distance to `goal` on a grid of the given width.
pub fn manhattan(width: usize, goal: usize) -> impl Fn(&mdpkit::domains::GraphState) -> f64 + 'static {
    move |s| {
        let (x, y) = (s.node() % width, s.node() / width);
        let (gx, gy) = (goal % width, goal / width);
        -((x.abs_diff(gx) + y.abs_diff(gy)) as f64)
    }
}
