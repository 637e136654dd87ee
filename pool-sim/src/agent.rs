/*!
Agents, their economic parameters, and the pool-switching rule

An agent is a miner deciding which pool to mine with. All agents share the
same decision rule ([`Agent::act`]); what distinguishes runs is the
[`AgentParams`] each agent holds, assigned at placement time by a
[`ParameterModel`] implementation.

# Parameter models

- [`FixedParams`] gives every agent one parameter set (the original two-pool
  experiments, `w = [30, 20]`).
- [`UniformWeights`] draws each agent's per-pool weights uniformly from an
  integer range (the original lattice experiments, `20..=30`).
*/

use std::fmt::Debug;

use dyn_clone::DynClone;
use rand::{seq::SliceRandom, Rng, RngCore};

use crate::{
    grid::PoolGrid,
    occupancy::Share,
    pool::{PoolId, PoolLayout},
};

/// A unique identifier assigned to each [`Agent`].
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgentId(pub(crate) usize);

impl AgentId {
    /// Returns the [`usize`] corresponding to this [`AgentId`].
    pub fn get(&self) -> usize {
        self.0
    }
}

impl From<usize> for AgentId {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// An action taken by an agent at the end of its step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Remain in the current pool.
    Stay,
    /// Relocate to the given pool.
    Switch(PoolId),
}

/// Economic parameters of a single agent. `weights` and `block_sizes` hold
/// one entry per pool, indexed by [`PoolId`].
#[derive(Debug, Clone, PartialEq)]
pub struct AgentParams {
    /// Fixed reward paid out for mining a block.
    pub reward: f64,
    /// Additional reward earned per unit of block size.
    pub fee_rate: f64,
    /// Participation cost charged per unit of pool weight.
    pub pool_fee: f64,
    /// Block propagation delay rate across the network.
    pub propagation: f64,
    /// Expected time between blocks.
    pub round_time: f64,
    /// Computing-power weight of each pool.
    pub weights: Vec<f64>,
    /// Size of the blocks each pool mines.
    pub block_sizes: Vec<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("{0} weight values given for {1} pools")]
    WrongNumWeights(usize, usize),
    #[error("{0} block size values given for {1} pools")]
    WrongNumBlockSizes(usize, usize),
    #[error("pool weight {0} is not positive and finite")]
    BadWeight(f64),
    #[error("block size {0} is not non-negative and finite")]
    BadBlockSize(f64),
    #[error("round time {0} is not positive and finite")]
    BadRoundTime(f64),
}

impl AgentParams {
    /// The parameter set used by the original two-pool experiments:
    /// `R = 1000`, fee rate 2, pool fee 0.01, propagation 0.005, `T = 600`,
    /// weights `[30, 20]`, block sizes `[100, 100]`.
    pub fn classic_two_pool() -> Self {
        Self::with_weights(vec![30.0, 20.0])
    }

    /// The classic economic constants with the given per-pool weights and a
    /// block size of 100 for every pool.
    pub fn with_weights(weights: Vec<f64>) -> Self {
        let block_sizes = vec![100.0; weights.len()];

        AgentParams {
            reward: 1000.0,
            fee_rate: 2.0,
            pool_fee: 0.01,
            propagation: 0.005,
            round_time: 600.0,
            weights,
            block_sizes,
        }
    }

    /// Checks this parameter set against a layout of `num_pools` pools.
    pub fn validate(&self, num_pools: usize) -> Result<(), ParamsError> {
        use ParamsError::*;

        if self.weights.len() != num_pools {
            return Err(WrongNumWeights(self.weights.len(), num_pools));
        }
        if self.block_sizes.len() != num_pools {
            return Err(WrongNumBlockSizes(self.block_sizes.len(), num_pools));
        }

        if let Some(&w) =
            self.weights.iter().find(|&&w| !w.is_finite() || w <= 0.0)
        {
            return Err(BadWeight(w));
        }
        if let Some(&b) =
            self.block_sizes.iter().find(|&&b| !b.is_finite() || b < 0.0)
        {
            return Err(BadBlockSize(b));
        }
        if !self.round_time.is_finite() || self.round_time <= 0.0 {
            return Err(BadRoundTime(self.round_time));
        }

        Ok(())
    }

    /// Expected payoff of mining in `pool`, given the current `occupancy`
    /// fractions over a population of `num_agents`:
    ///
    /// the pool's per-member share of the block reward, scaled by the pool's
    /// weighted chance of mining the next block, discounted for propagation
    /// delay, minus the pool's participation cost.
    ///
    /// When `occupancy[pool]` is 0 the reward terms are 0 by definition (an
    /// empty pool earns nothing), so the payoff is the bare participation
    /// cost `-pool_fee * weights[pool]` rather than a division error.
    pub fn payoff(
        &self,
        pool: PoolId,
        occupancy: &[Share],
        num_agents: usize,
    ) -> f64 {
        let i = pool.get();
        let share = occupancy[i];

        let reward = if share == 0.0 {
            0.0
        } else {
            let weighted_total: f64 = self
                .weights
                .iter()
                .zip(occupancy)
                .map(|(w, s)| w * s)
                .sum();

            let member_share = (self.reward
                + self.fee_rate * self.block_sizes[i])
                / (num_agents as f64 * share);
            let win_chance = self.weights[i] * share / weighted_total;

            member_share * win_chance
        };

        let delay_discount =
            (-self.block_sizes[i] * self.propagation / self.round_time).exp();

        reward * delay_discount - self.pool_fee * self.weights[i]
    }

    /// Probability that an agent in `current` relocates to `candidate`: the
    /// candidate's occupancy times the payoff gain, floored at 0.
    ///
    /// Deliberately not clamped above 1. The decision rule compares this
    /// value against a uniform draw in `[0, 1)`, so any value of 1 or more is
    /// a certain switch.
    pub fn switch_probability(
        &self,
        current: PoolId,
        candidate: PoolId,
        occupancy: &[Share],
        num_agents: usize,
    ) -> f64 {
        let gain = self.payoff(candidate, occupancy, num_agents)
            - self.payoff(current, occupancy, num_agents);

        occupancy[candidate.get()] * gain.max(0.0)
    }
}

/// A miner deciding which pool to join. Holds static economic parameters and
/// a cached view of the occupancy fractions, refreshed at the start of every
/// step.
#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    pool: PoolId,
    params: AgentParams,
    states: Vec<Share>,
}

impl Agent {
    /// Creates an agent occupying `pool`. The cached occupancy view starts
    /// empty and holds nothing meaningful until the first [`Agent::act`].
    pub fn new(id: AgentId, pool: PoolId, params: AgentParams) -> Self {
        Agent { id, pool, params, states: vec![] }
    }

    #[inline]
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// The pool this agent currently occupies.
    #[inline]
    pub fn pool(&self) -> PoolId {
        self.pool
    }

    #[inline]
    pub fn params(&self) -> &AgentParams {
        &self.params
    }

    /// The occupancy fractions cached by the most recent step.
    #[inline]
    pub fn states(&self) -> &[Share] {
        &self.states
    }

    /// Records that this agent has been moved to `pool`.
    pub(crate) fn set_pool(&mut self, pool: PoolId) {
        self.pool = pool;
    }

    /// Runs one step of the switching rule: refresh the cached occupancy
    /// fractions from `grid`, pick a candidate uniformly at random from the
    /// neighborhood of the current pool, and switch with probability
    /// [`AgentParams::switch_probability`].
    ///
    /// An empty neighborhood, a candidate equal to the current pool, or a
    /// failed probability draw all leave the agent where it is.
    pub fn act<R: Rng + ?Sized>(
        &mut self,
        grid: &PoolGrid,
        rng: &mut R,
    ) -> Action {
        self.states = grid.occupancy();

        let neighborhood = grid.layout().neighbors(self.pool);
        let candidate = match neighborhood.choose(rng) {
            None => return Action::Stay,
            Some(&pool) => pool,
        };
        if candidate == self.pool {
            return Action::Stay;
        }

        let probability = self.params.switch_probability(
            self.pool,
            candidate,
            &self.states,
            grid.num_agents(),
        );

        if rng.gen::<f64>() < probability {
            Action::Switch(candidate)
        } else {
            Action::Stay
        }
    }
}

/// Assigns economic parameters to agents as they are placed into a
/// simulation.
///
/// Implementations must produce weight and block size vectors with one entry
/// per pool in `layout`; [`AgentParams::validate`] describes the full
/// contract. [`ParameterModel::validate`] is called once during the
/// simulation build step.
pub trait ParameterModel: Debug + DynClone + Send + Sync {
    /// Returns the name of this model, as shown in results tables.
    fn name(&self) -> String;

    /// Returns the parameters of the next agent placed into `layout`.
    fn params_for(
        &self,
        layout: &PoolLayout,
        rng: &mut dyn RngCore,
    ) -> AgentParams;

    /// Checks that this model can produce valid parameters for `layout`.
    fn validate(&self, layout: &PoolLayout) -> Result<(), ParamsError> {
        let _ = layout;
        Ok(())
    }
}

dyn_clone::clone_trait_object!(ParameterModel);

/// Gives every agent the same parameter set.
#[derive(Debug, Clone)]
pub struct FixedParams(pub AgentParams);

impl FixedParams {
    /// The original two-pool configuration ([`AgentParams::classic_two_pool`]).
    pub fn classic_two_pool() -> Self {
        FixedParams(AgentParams::classic_two_pool())
    }
}

impl ParameterModel for FixedParams {
    fn name(&self) -> String {
        "Fixed".into()
    }

    fn params_for(
        &self,
        _layout: &PoolLayout,
        _rng: &mut dyn RngCore,
    ) -> AgentParams {
        self.0.clone()
    }

    fn validate(&self, layout: &PoolLayout) -> Result<(), ParamsError> {
        self.0.validate(layout.num_pools())
    }
}

/// Draws each agent's per-pool weights uniformly from an integer range,
/// holding the other economic constants at their classic values.
#[derive(Debug, Clone)]
pub struct UniformWeights {
    low: u32,
    high: u32,
}

impl UniformWeights {
    /// Weights drawn uniformly from `low..=high`.
    ///
    /// ## Panics
    /// Panics if `low` is 0 or greater than `high`.
    pub fn new(low: u32, high: u32) -> Self {
        assert!(
            low > 0 && low <= high,
            "weight range must be positive and non-empty"
        );

        UniformWeights { low, high }
    }
}

impl Default for UniformWeights {
    /// The original lattice configuration: weights in `20..=30`.
    fn default() -> Self {
        Self::new(20, 30)
    }
}

impl ParameterModel for UniformWeights {
    fn name(&self) -> String {
        format!("Uniform weights {}..={}", self.low, self.high)
    }

    fn params_for(
        &self,
        layout: &PoolLayout,
        rng: &mut dyn RngCore,
    ) -> AgentParams {
        let weights = (0..layout.num_pools())
            .map(|_| rng.gen_range(self.low..=self.high) as f64)
            .collect();

        AgentParams::with_weights(weights)
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use crate::{
        grid::PoolGrid,
        pool::{PoolId, PoolLayout},
    };

    use super::{Action, Agent, AgentId, AgentParams, ParamsError};

    #[test]
    fn empty_pool_payoff_is_finite() {
        let params = AgentParams::classic_two_pool();
        let occupancy = [1.0, 0.0];

        let payoff = params.payoff(PoolId(1), &occupancy, 4);
        assert!(payoff.is_finite());
        // Reward terms vanish; only the participation cost remains.
        assert!((payoff - (-0.01 * 20.0)).abs() < 1e-12);
    }

    #[test]
    fn crowded_pool_pays_less_per_member() {
        let params = AgentParams::classic_two_pool();
        let occupancy = [0.75, 0.25];

        let crowded = params.payoff(PoolId(0), &occupancy, 5000);
        let sparse = params.payoff(PoolId(1), &occupancy, 5000);
        assert!(sparse > crowded);
    }

    #[test]
    fn switch_probability_is_directional() {
        let params = AgentParams::classic_two_pool();
        let occupancy = [0.75, 0.25];

        let toward_sparse =
            params.switch_probability(PoolId(0), PoolId(1), &occupancy, 5000);
        let toward_crowded =
            params.switch_probability(PoolId(1), PoolId(0), &occupancy, 5000);

        assert!(toward_sparse > 0.0);
        assert_eq!(toward_crowded, 0.0);
    }

    #[test]
    fn symmetric_pools_give_no_incentive() {
        let params = AgentParams::with_weights(vec![25.0; 4]);
        let occupancy = [0.25; 4];

        for candidate in 1..4 {
            let p = params.switch_probability(
                PoolId(0),
                PoolId(candidate),
                &occupancy,
                1000,
            );
            assert_eq!(p, 0.0);
        }
    }

    #[test]
    fn switch_probability_toward_empty_pool_is_zero() {
        let params = AgentParams::classic_two_pool();
        let occupancy = [1.0, 0.0];

        let p = params.switch_probability(PoolId(0), PoolId(1), &occupancy, 4);
        assert_eq!(p, 0.0);
    }

    #[test]
    fn lone_pool_agent_always_stays() {
        let mut grid = PoolGrid::new(PoolLayout::new(1, 1));
        grid.place(AgentId(0), PoolId(0));

        let mut agent = Agent::new(
            AgentId(0),
            PoolId(0),
            AgentParams::with_weights(vec![25.0]),
        );
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..10 {
            assert_eq!(agent.act(&grid, &mut rng), Action::Stay);
        }
    }

    #[test]
    fn act_refreshes_cached_states() {
        let mut grid = PoolGrid::new(PoolLayout::line(2));
        grid.place(AgentId(0), PoolId(0));
        grid.place(AgentId(1), PoolId(0));

        let mut agent = Agent::new(
            AgentId(0),
            PoolId(0),
            AgentParams::classic_two_pool(),
        );
        assert!(agent.states().is_empty());

        let mut rng = StdRng::seed_from_u64(1);
        agent.act(&grid, &mut rng);
        assert_eq!(agent.states(), &[1.0, 0.0]);
    }

    #[test]
    fn validate_rejects_mismatched_weights() {
        let params = AgentParams::classic_two_pool();

        assert!(matches!(
            params.validate(3),
            Err(ParamsError::WrongNumWeights(2, 3))
        ));
    }

    #[test]
    fn validate_rejects_non_positive_weight() {
        let mut params = AgentParams::classic_two_pool();
        params.weights[1] = 0.0;

        assert!(matches!(
            params.validate(2),
            Err(ParamsError::BadWeight(_))
        ));
    }
}
