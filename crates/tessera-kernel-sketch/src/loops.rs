//! Closed-loop detection over sketch entity endpoints.

use tessera_kernel_math::Point2;
use tracing::debug;

use crate::curve::Curve2d;
use crate::entity::EntityGeometry;
use crate::id::EntityId;
use crate::sketch::Sketch;

/// Endpoints closer than this belong to the same graph node.
pub const LOOP_CLUSTER_TOLERANCE: f64 = 1e-5;

/// Shortest ring (in entities) reported as a loop.
const MIN_LOOP_LENGTH: usize = 3;

/// An entity spanning two endpoint nodes.
struct GraphEdge {
    id: EntityId,
    a: usize,
    b: usize,
}

/// Endpoint graph in an index arena: nodes are clustered endpoints, and
/// `adjacency[node]` lists `(edge, other node)` pairs.
struct EndpointGraph {
    nodes: Vec<Point2>,
    edges: Vec<GraphEdge>,
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl EndpointGraph {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            adjacency: Vec::new(),
        }
    }

    fn node_for(&mut self, p: Point2) -> usize {
        if let Some(i) = self
            .nodes
            .iter()
            .position(|q| (q - p).norm() <= LOOP_CLUSTER_TOLERANCE)
        {
            return i;
        }
        self.nodes.push(p);
        self.adjacency.push(Vec::new());
        self.nodes.len() - 1
    }

    fn add_edge(&mut self, id: EntityId, a: usize, b: usize) {
        let e = self.edges.len();
        self.edges.push(GraphEdge { id, a, b });
        self.adjacency[a].push((e, b));
        self.adjacency[b].push((e, a));
    }

    /// Depth-first search for a path from `node` back to `target`.
    ///
    /// `path` holds the edges walked so far; `on_path` marks visited nodes.
    fn close_cycle(
        &self,
        node: usize,
        target: usize,
        used: &[bool],
        path: &mut Vec<usize>,
        on_path: &mut [bool],
    ) -> bool {
        for &(e, next) in &self.adjacency[node] {
            if used[e] || path.contains(&e) {
                continue;
            }
            if next == target {
                if path.len() + 1 >= MIN_LOOP_LENGTH {
                    path.push(e);
                    return true;
                }
                continue;
            }
            if on_path[next] {
                continue;
            }
            path.push(e);
            on_path[next] = true;
            if self.close_cycle(next, target, used, path, on_path) {
                return true;
            }
            on_path[next] = false;
            path.pop();
        }
        false
    }
}

impl Sketch {
    /// Rings of entities that enclose a region.
    ///
    /// Construction entities and free points are ignored. Each closed curve
    /// (circle, closed spline, full-turn arc) is a loop on its own. Other
    /// curves connect the clusters of their endpoints; simple cycles of at
    /// least three entities are reported in traversal order, and an entity
    /// joins at most one loop.
    pub fn find_closed_loops(&self) -> Vec<Vec<EntityId>> {
        let mut loops = Vec::new();
        let mut graph = EndpointGraph::new();

        for e in self.entities() {
            if e.construction || matches!(e.geometry, EntityGeometry::Point(_)) {
                continue;
            }
            if e.geometry.is_closed() {
                loops.push(vec![e.id]);
                continue;
            }
            let a = graph.node_for(e.geometry.evaluate(0.0));
            let b = graph.node_for(e.geometry.evaluate(1.0));
            if a != b {
                graph.add_edge(e.id, a, b);
            }
        }

        let mut used = vec![false; graph.edges.len()];
        for start in 0..graph.edges.len() {
            if used[start] {
                continue;
            }
            let (a, b) = (graph.edges[start].a, graph.edges[start].b);
            let mut path = vec![start];
            let mut on_path = vec![false; graph.nodes.len()];
            on_path[a] = true;
            on_path[b] = true;
            if graph.close_cycle(b, a, &used, &mut path, &mut on_path) {
                for &e in &path {
                    used[e] = true;
                }
                loops.push(path.iter().map(|&e| graph.edges[e].id).collect());
            }
        }

        debug!(
            loops = loops.len(),
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "closed loop search"
        );
        loops
    }
}
