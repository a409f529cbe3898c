use std::collections::BinaryHeap;
use std::hash::Hash;

use ahash::AHashMap;
use ordered_float::OrderedFloat;

/// A weighted directed graph the solver can search.
///
/// Neighbor relations may be direction-asymmetric. Production weights are
/// path lengths and therefore non-negative; the solver assumes as much.
pub trait RouteGraph {
    type Node: Copy + Eq + Hash;

    /// Successors of `node`, in a deterministic order.
    fn neighbors(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Cost of traversing the edge `from` → `to`.
    fn weight(&self, from: Self::Node, to: Self::Node) -> f64;
}

/// A solved route: the node sequence from source to destination and its
/// accumulated weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Route<N> {
    pub path: Vec<N>,
    pub total_weight: f64,
}

struct HeapEntry<N> {
    cost: OrderedFloat<f64>,
    seq: u64,
    node: N,
}

impl<N> PartialEq for HeapEntry<N> {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.seq == other.seq
    }
}

impl<N> Eq for HeapEntry<N> {}

impl<N> PartialOrd for HeapEntry<N> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<N> Ord for HeapEntry<N> {
    /// Inverted so that `BinaryHeap` pops the cheapest entry; equal costs
    /// pop in discovery order (first-found tie-break).
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Single-pair shortest path (Dijkstra).
///
/// Returns `None` when `goal` is unreachable from `source` — an expected
/// outcome for disconnected networks, not an error. Ties are broken by
/// first-found order, so results are deterministic given identical
/// neighbor ordering.
pub fn solve<G: RouteGraph>(graph: &G, source: G::Node, goal: G::Node) -> Option<Route<G::Node>> {
    if source == goal {
        return Some(Route {
            path: vec![source],
            total_weight: 0.0,
        });
    }

    let mut dist: AHashMap<G::Node, f64> = AHashMap::new();
    let mut prev: AHashMap<G::Node, G::Node> = AHashMap::new();
    let mut heap = BinaryHeap::new();
    let mut seq = 0_u64;

    dist.insert(source, 0.0);
    heap.push(HeapEntry {
        cost: OrderedFloat(0.0),
        seq,
        node: source,
    });

    while let Some(entry) = heap.pop() {
        let node = entry.node;
        let cost = entry.cost.into_inner();

        if node == goal {
            return Some(Route {
                path: rebuild_path(&prev, source, goal),
                total_weight: cost,
            });
        }
        if dist.get(&node).is_some_and(|&d| cost > d) {
            continue; // stale entry
        }

        for next in graph.neighbors(node) {
            let next_cost = cost + graph.weight(node, next);
            let improved = dist.get(&next).is_none_or(|&d| next_cost < d);
            if improved {
                dist.insert(next, next_cost);
                prev.insert(next, node);
                seq += 1;
                heap.push(HeapEntry {
                    cost: OrderedFloat(next_cost),
                    seq,
                    node: next,
                });
            }
        }
    }

    None
}

/// All-pairs shortest paths over a designated node subset.
///
/// Runs one single-source search per node; pairs with no route are simply
/// absent from the result. After one batch solve, repeated queries between
/// the same endpoints are `O(1)` lookups.
pub fn solve_all<G: RouteGraph>(
    graph: &G,
    nodes: &[G::Node],
) -> AHashMap<(G::Node, G::Node), Route<G::Node>> {
    let mut routes = AHashMap::new();
    for &source in nodes {
        for &goal in nodes {
            if source == goal {
                continue;
            }
            if let Some(route) = solve(graph, source, goal) {
                routes.insert((source, goal), route);
            }
        }
    }
    routes
}

fn rebuild_path<N: Copy + Eq + Hash>(prev: &AHashMap<N, N>, source: N, goal: N) -> Vec<N> {
    let mut path = vec![goal];
    let mut node = goal;
    while node != source {
        match prev.get(&node) {
            Some(&p) => {
                path.push(p);
                node = p;
            }
            None => break,
        }
    }
    path.reverse();
    path
}
