//! Cost-weighted best-first search over a [`TerrainField`].
//!
//! The search expands the lowest-scored frontier node each round, where a
//! node's score mixes step cost, accumulated path value, straight-line
//! distance to the goal, and the terrain cost of the cell being entered.
//! Two properties distinguish it from an admissible A*:
//!
//! - Neighbors are marked visited as soon as they are generated, so a
//!   cheaper route discovered later never reopens a cell.
//! - The accumulated path value of a node is recomputed by walking its
//!   parent chain on every expansion, and each ancestor contributes its own
//!   full score, so costs compound along the chain.
//!
//! Both are deliberate: paths come out plausible but carry no optimality
//! guarantee.

use crate::errors::{TerrapathError, TerrapathResult};
use crate::map::{Cell, TerrainField};
use std::f32::consts::SQRT_2;
use tracing::{debug, warn};

pub mod heap;

pub use heap::{HeapEntry, MinHeap};

/// Index of a node in the search tree arena
pub type NodeId = usize;

/// Neighbor directions with their step costs: the four orthogonal steps
/// first, then the diagonals.
const DIRECTIONS: [(i32, i32, f32); 8] = [
    (-1, 0, 1.0),
    (1, 0, 1.0),
    (0, -1, 1.0),
    (0, 1, 1.0),
    (-1, -1, SQRT_2),
    (1, -1, SQRT_2),
    (-1, 1, SQRT_2),
    (1, 1, SQRT_2),
];

/// One explored search node. Immutable once created; the parent is a
/// non-owning index into the arena that created it.
#[derive(Debug, Clone, Copy)]
pub struct SearchNode {
    pub score: f32,
    pub cell: Cell,
    pub parent: Option<NodeId>,
}

/// Arena of search nodes with parent back-references.
///
/// The arena owns every node created during one search; parents are plain
/// indices, so no node owns another. Cleared wholesale at the start of the
/// next search.
#[derive(Debug, Default)]
pub struct SearchTree {
    nodes: Vec<SearchNode>,
}

impl SearchTree {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id]
    }

    fn clear(&mut self) {
        self.nodes.clear();
    }

    fn push(&mut self, node: SearchNode) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Accumulated path value: the sum of `score + 1` over the node and
    /// every ancestor up to the root. Recomputed by walking the parent
    /// chain on every call; nothing is memoized, so a node's score folds
    /// in the full scores of everything created before it on its chain.
    fn cumulative_path_value(&self, id: NodeId) -> f32 {
        let mut total = 0.0;
        let mut current = Some(id);
        while let Some(index) = current {
            let node = &self.nodes[index];
            total += node.score + 1.0;
            current = node.parent;
        }
        total
    }

    /// Cells from `id` back to the root, in that order. The root is the
    /// node with no parent.
    fn path_from(&self, id: NodeId) -> Vec<Cell> {
        let mut cells = Vec::new();
        let mut current = Some(id);
        while let Some(index) = current {
            let node = &self.nodes[index];
            cells.push(node.cell);
            current = node.parent;
        }
        cells
    }
}

/// Best-first pathfinder over a terrain field.
///
/// Owns the frontier heap, the search tree and the visited grid, and
/// clears all three at the start of every search, so one instance can be
/// reused across any number of "new destination" requests.
#[derive(Debug, Default)]
pub struct Pathfinder {
    heap: MinHeap,
    tree: SearchTree,
    visited: Vec<bool>,
}

impl Pathfinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a path from `start` to `goal`, returned in goal-to-start order.
    ///
    /// # Errors
    ///
    /// Returns an error if either endpoint is out of bounds or on
    /// impassable terrain, or if the frontier empties before the goal is
    /// reached (`NoPathFound`).
    pub fn find_path(
        &mut self,
        field: &TerrainField,
        start: Cell,
        goal: Cell,
    ) -> TerrapathResult<Vec<Cell>> {
        check_endpoint(field, start, "start")?;
        check_endpoint(field, goal, "goal")?;

        self.heap.clear();
        self.tree.clear();
        self.visited.clear();
        self.visited
            .resize((field.width() * field.height()) as usize, false);

        let root = self.tree.push(SearchNode {
            score: 0.0,
            cell: start,
            parent: None,
        });
        self.heap.insert(HeapEntry {
            score: 0.0,
            node: root,
        });

        let mut expansions = 0usize;
        while let Some(entry) = self.heap.extract_min() {
            expansions += 1;
            let current = entry.node;
            let cell = self.tree.get(current).cell;
            self.mark_visited(field, cell);

            if cell == goal {
                let path = self.tree.path_from(current);
                debug!(
                    "Path found from {start} to {goal}: {} cells, {expansions} expansions, {} nodes generated",
                    path.len(),
                    self.tree.len()
                );
                return Ok(path);
            }

            self.expand(field, current, goal);
        }

        warn!("Search exhausted after {expansions} expansions without reaching {goal}");
        Err(TerrapathError::NoPathFound { start, goal })
    }

    /// Generate every legal neighbor of `current` into the tree and the
    /// frontier. Out-of-bounds, already-visited and impassable neighbors
    /// are skipped outright and never occupy a frontier slot.
    fn expand(&mut self, field: &TerrainField, current: NodeId, goal: Cell) {
        let cell = self.tree.get(current).cell;
        let travelled = self.tree.cumulative_path_value(current);

        for &(dx, dy, step_cost) in &DIRECTIONS {
            let nx = cell.x as i32 + dx;
            let ny = cell.y as i32 + dy;
            if nx < 0 || ny < 0 || nx >= field.width() as i32 || ny >= field.height() as i32 {
                continue;
            }

            let neighbor = Cell::new(nx as u32, ny as u32);
            if self.is_visited(field, neighbor) || !field.is_passable(neighbor) {
                continue;
            }

            let score = step_cost
                + travelled
                + neighbor.euclidean_distance(&goal)
                + field.traversal_cost(neighbor);
            let id = self.tree.push(SearchNode {
                score,
                cell: neighbor,
                parent: Some(current),
            });
            self.heap.insert(HeapEntry { score, node: id });
            // Visited on generation: this cell is now settled for the rest
            // of the search, even if a cheaper route to it turns up later.
            self.mark_visited(field, neighbor);
        }
    }

    fn visited_index(field: &TerrainField, cell: Cell) -> usize {
        (cell.y * field.width() + cell.x) as usize
    }

    fn is_visited(&self, field: &TerrainField, cell: Cell) -> bool {
        self.visited[Self::visited_index(field, cell)]
    }

    fn mark_visited(&mut self, field: &TerrainField, cell: Cell) {
        self.visited[Self::visited_index(field, cell)] = true;
    }
}

/// Find a path with a fresh [`Pathfinder`], in goal-to-start order
pub fn find_path(field: &TerrainField, start: Cell, goal: Cell) -> TerrapathResult<Vec<Cell>> {
    Pathfinder::new().find_path(field, start, goal)
}

fn check_endpoint(field: &TerrainField, cell: Cell, role: &'static str) -> TerrapathResult<()> {
    if !field.in_bounds(cell) {
        return Err(TerrapathError::CellOutOfBounds {
            cell,
            width: field.width(),
            height: field.height(),
        });
    }
    if !field.is_passable(cell) {
        return Err(TerrapathError::ImpassableEndpoint { role, cell });
    }
    Ok(())
}
