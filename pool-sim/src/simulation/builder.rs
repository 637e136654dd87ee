use std::num::NonZeroUsize;

use crate::{
    agent::{ParameterModel, ParamsError, UniformWeights},
    occupancy::{DistributionError, OccupancyDistribution, Share},
    pool::{PoolId, PoolLayout},
};

use super::SimulationGroup;

/// Builds a [`SimulationGroup`].
#[derive(Debug, Default)]
pub struct SimulationBuilder {
    layout: Option<(usize, usize)>,
    num_agents: Option<usize>,
    rounds: Option<usize>,
    repeat_all: Option<usize>,
    seed: Option<u64>,
    distributions: Vec<OccupancyDistribution>,
    model: Option<Box<dyn ParameterModel>>,
}

#[derive(Debug, thiserror::Error)]
pub enum SimulationBuildError {
    #[error("no pool layout was given, or a dimension was 0")]
    NoPoolsGiven,
    #[error("number of agents must be greater than 0")]
    ZeroAgents,
    #[error("number of simulation rounds must be greater than 0")]
    ZeroRounds,
    #[error("cannot repeat each simulation 0 times")]
    RepeatAllZero,
    #[error(transparent)]
    DistributionError(#[from] DistributionError),
    #[error(transparent)]
    ParamsError(#[from] ParamsError),
}

impl SimulationBuilder {
    /// Creates a new [`SimulationBuilder`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Run over a 1-dimensional line of `width` pools.
    pub fn pools(self, width: usize) -> Self {
        self.pool_grid(width, 1)
    }

    /// Run over a `width` by `height` lattice of pools.
    pub fn pool_grid(mut self, width: usize, height: usize) -> Self {
        self.layout = Some((width, height));

        self
    }

    /// Sets the number of agents in the simulation.
    pub fn agents(mut self, num: usize) -> Self {
        self.num_agents = Some(num);

        self
    }

    /// Sets the number of rounds the simulation will last for (default 1).
    pub fn rounds(mut self, rounds: usize) -> Self {
        self.rounds = Some(rounds);

        self
    }

    /// Run every configured simulation `num` times (default 1). Result
    /// metrics can then be averaged over the set of `num` runs.
    pub fn repeat_all(mut self, num: usize) -> Self {
        self.repeat_all = Some(num);

        self
    }

    /// Seeds the group's random source, making every run reproducible: run
    /// `i` of the group executes with `seed + i`. Without a seed, each run
    /// draws fresh entropy.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);

        self
    }

    /// Run the simulation starting from the given initial occupancy
    /// distribution ([`OccupancyDistribution::Equal`] used if none is given).
    pub fn initial_occupancy(
        mut self,
        distribution: OccupancyDistribution,
    ) -> Self {
        self.distributions.push(distribution);

        self
    }

    /// Run the simulation starting from the given per-pool shares.
    pub fn occupancy_values<I>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = Share>,
    {
        let values = values.into_iter().collect();
        self.distributions.push(OccupancyDistribution::SetValues(values));

        self
    }

    /// Run the simulation with `pool` starting at share `value`, and the
    /// remainder split equally between all other pools.
    pub fn pool_share(mut self, pool: PoolId, value: Share) -> Self {
        self.distributions.push(OccupancyDistribution::SetPool(pool, value));

        self
    }

    /// Call [`SimulationBuilder::pool_share`] once for each element of
    /// `values`.
    pub fn pool_share_iter<I>(mut self, pool: PoolId, values: I) -> Self
    where
        I: IntoIterator<Item = Share>,
    {
        for value in values {
            self.distributions
                .push(OccupancyDistribution::SetPool(pool, value));
        }

        self
    }

    /// Sets the [`ParameterModel`] agents draw their parameters from
    /// ([`UniformWeights::default`] used otherwise).
    pub fn parameter_model<M: ParameterModel + 'static>(
        mut self,
        model: M,
    ) -> Self {
        self.model = Some(Box::new(model));

        self
    }

    /// Creates a [`SimulationGroup`] from the specified parameters.
    pub fn build(self) -> Result<SimulationGroup, SimulationBuildError> {
        use SimulationBuildError::*;

        let SimulationBuilder {
            layout,
            num_agents,
            rounds,
            repeat_all,
            seed,
            mut distributions,
            model,
        } = self;

        let layout = match layout {
            None | Some((0, _)) | Some((_, 0)) => return Err(NoPoolsGiven),
            Some((width, height)) => PoolLayout::new(width, height),
        };
        let num_agents = match num_agents {
            None | Some(0) => return Err(ZeroAgents),
            Some(num) => num,
        };
        let rounds =
            NonZeroUsize::new(rounds.unwrap_or(1)).ok_or(ZeroRounds)?;
        let repeat_all =
            NonZeroUsize::new(repeat_all.unwrap_or(1)).ok_or(RepeatAllZero)?;

        if distributions.is_empty() {
            distributions.push(OccupancyDistribution::Equal);
        }
        for distribution in distributions.iter() {
            distribution.validate(layout.num_pools())?;
        }

        let model =
            model.unwrap_or_else(|| Box::new(UniformWeights::default()));
        model.validate(&layout)?;

        Ok(SimulationGroup {
            layout,
            model,
            num_agents,
            distributions,
            repeat_all,
            rounds,
            seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{agent::FixedParams, occupancy::OccupancyDistribution};

    use super::{SimulationBuildError, SimulationBuilder};

    #[test]
    fn example_build() {
        SimulationBuilder::new()
            .pools(2)
            .agents(100)
            .build()
            .expect("valid simulation build");
    }

    #[test]
    fn build_rejects_missing_layout() {
        let result = SimulationBuilder::new().agents(100).build();

        assert!(matches!(result, Err(SimulationBuildError::NoPoolsGiven)));
    }

    #[test]
    fn build_rejects_zero_dimension() {
        let result =
            SimulationBuilder::new().pool_grid(0, 3).agents(100).build();

        assert!(matches!(result, Err(SimulationBuildError::NoPoolsGiven)));
    }

    #[test]
    fn build_rejects_zero_agents() {
        let result = SimulationBuilder::new().pools(2).build();

        assert!(matches!(result, Err(SimulationBuildError::ZeroAgents)));
    }

    #[test]
    fn build_rejects_zero_rounds() {
        let result =
            SimulationBuilder::new().pools(2).agents(100).rounds(0).build();

        assert!(matches!(result, Err(SimulationBuildError::ZeroRounds)));
    }

    #[test]
    fn build_rejects_bad_distribution() {
        let result = SimulationBuilder::new()
            .pools(2)
            .agents(100)
            .initial_occupancy(OccupancyDistribution::SetValues(vec![
                0.9, 0.9,
            ]))
            .build();

        assert!(matches!(
            result,
            Err(SimulationBuildError::DistributionError(_))
        ));
    }

    #[test]
    fn build_rejects_mismatched_fixed_params() {
        let result = SimulationBuilder::new()
            .pools(3)
            .agents(100)
            .parameter_model(FixedParams::classic_two_pool())
            .build();

        assert!(matches!(result, Err(SimulationBuildError::ParamsError(_))));
    }
}
