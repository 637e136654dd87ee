//! The multi-occupancy grid of pools that agents move across.

use thiserror::Error;

use crate::{
    agent::AgentId,
    occupancy::Share,
    pool::{PoolId, PoolLayout},
};

/// Maps each pool in a [`PoolLayout`] to the agents currently inside it. Any
/// number of agents may occupy one pool at a time.
///
/// The grid is mutated by one agent step at a time, and its per-pool counts
/// are the authoritative occupancy record; the fractions agents cache are
/// derived from it via [`PoolGrid::occupancy`].
#[derive(Debug, Clone)]
pub struct PoolGrid {
    layout: PoolLayout,
    cells: Vec<Vec<AgentId>>,
    num_agents: usize,
}

#[derive(Debug, Error)]
pub enum RelocationError {
    #[error("pool {0} is outside the layout")]
    PoolOutOfBounds(PoolId),
    #[error("agent {0} is not in pool {1}")]
    AgentNotInPool(AgentId, PoolId),
}

impl PoolGrid {
    /// Creates an empty grid over `layout`.
    pub fn new(layout: PoolLayout) -> Self {
        PoolGrid {
            layout,
            cells: vec![vec![]; layout.num_pools()],
            num_agents: 0,
        }
    }

    /// Returns the layout this grid is built over.
    #[inline]
    pub fn layout(&self) -> &PoolLayout {
        &self.layout
    }

    /// Number of agents placed on the grid.
    #[inline]
    pub fn num_agents(&self) -> usize {
        self.num_agents
    }

    /// Number of agents currently in `pool`.
    ///
    /// ## Panics
    /// Panics if `pool` is outside the layout.
    #[inline]
    pub fn count_of(&self, pool: PoolId) -> usize {
        self.cells[pool.get()].len()
    }

    /// Places a new agent into `pool`.
    ///
    /// ## Panics
    /// Panics if `pool` is outside the layout.
    pub fn place(&mut self, agent: AgentId, pool: PoolId) {
        assert!(
            self.layout.contains(pool),
            "pool {} is outside the layout",
            pool
        );

        self.cells[pool.get()].push(agent);
        self.num_agents += 1;
    }

    /// Moves `agent` from `from` to `to`. The agent must currently be in
    /// `from`; the total population is unchanged.
    pub fn relocate(
        &mut self,
        agent: AgentId,
        from: PoolId,
        to: PoolId,
    ) -> Result<(), RelocationError> {
        use RelocationError::*;

        if !self.layout.contains(from) {
            return Err(PoolOutOfBounds(from));
        }
        if !self.layout.contains(to) {
            return Err(PoolOutOfBounds(to));
        }

        let cell = &mut self.cells[from.get()];
        match cell.iter().position(|&a| a == agent) {
            None => Err(AgentNotInPool(agent, from)),
            Some(idx) => {
                cell.swap_remove(idx);
                self.cells[to.get()].push(agent);

                Ok(())
            }
        }
    }

    /// Per-pool agent counts, in pool id order. This is the view consumed by
    /// grid visualizations and occupancy charts.
    pub fn counts(&self) -> Vec<usize> {
        self.cells.iter().map(Vec::len).collect()
    }

    /// Per-pool occupancy fractions: each pool's count divided by the placed
    /// population. Sums to 1 whenever at least one agent is placed; an empty
    /// grid yields all zeros.
    pub fn occupancy(&self) -> Vec<Share> {
        if self.num_agents == 0 {
            return vec![0.0; self.layout.num_pools()];
        }

        let population = self.num_agents as Share;
        self.cells
            .iter()
            .map(|cell| cell.len() as Share / population)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::{agent::AgentId, pool::PoolId, pool::PoolLayout};

    use super::{PoolGrid, RelocationError};

    fn grid_of_four() -> PoolGrid {
        let mut grid = PoolGrid::new(PoolLayout::line(2));
        for i in 0..4 {
            grid.place(AgentId(i), PoolId(0));
        }

        grid
    }

    #[test]
    fn counts_are_conserved_across_relocations() {
        let mut grid = grid_of_four();

        grid.relocate(AgentId(1), PoolId(0), PoolId(1)).unwrap();
        grid.relocate(AgentId(3), PoolId(0), PoolId(1)).unwrap();

        assert_eq!(grid.counts(), vec![2, 2]);
        assert_eq!(grid.counts().iter().sum::<usize>(), grid.num_agents());
    }

    #[test]
    fn occupancy_sums_to_one() {
        let mut grid = grid_of_four();
        grid.relocate(AgentId(0), PoolId(0), PoolId(1)).unwrap();

        let total: f64 = grid.occupancy().iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn occupancy_recompute_is_idempotent() {
        let grid = grid_of_four();

        assert_eq!(grid.occupancy(), grid.occupancy());
    }

    #[test]
    fn occupancy_of_empty_grid_is_zero() {
        let grid = PoolGrid::new(PoolLayout::line(3));

        assert_eq!(grid.occupancy(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn relocate_rejects_absent_agent() {
        let mut grid = grid_of_four();

        let result = grid.relocate(AgentId(7), PoolId(0), PoolId(1));
        assert!(matches!(
            result,
            Err(RelocationError::AgentNotInPool(AgentId(7), PoolId(0)))
        ));
    }

    #[test]
    fn relocate_rejects_out_of_bounds_pool() {
        let mut grid = grid_of_four();

        let result = grid.relocate(AgentId(0), PoolId(0), PoolId(5));
        assert!(matches!(
            result,
            Err(RelocationError::PoolOutOfBounds(PoolId(5)))
        ));
    }
}
