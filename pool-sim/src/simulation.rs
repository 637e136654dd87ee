//! Building/running simulations and analyzing the resulting data

use std::num::NonZeroUsize;

use rand::{
    distributions::{WeightedError, WeightedIndex},
    prelude::Distribution,
    rngs::StdRng,
    seq::SliceRandom,
    SeedableRng,
};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::{
    agent::{Action, Agent, AgentId, ParameterModel, ParamsError},
    grid::{PoolGrid, RelocationError},
    occupancy::{DistributionError, OccupancyDistribution, Share},
    pool::{PoolId, PoolLayout},
    results::ResultsBuilder,
};

pub mod builder;

pub use builder::{SimulationBuildError, SimulationBuilder};

/// Container for a group of simulations which run over the same pools,
/// population, and parameter model, one per configured initial occupancy
/// distribution. Simulations should be run using this struct's `run_all`
/// method.
#[derive(Debug, Clone)]
pub struct SimulationGroup {
    layout: PoolLayout,
    model: Box<dyn ParameterModel>,
    num_agents: usize,
    distributions: Vec<OccupancyDistribution>,
    repeat_all: NonZeroUsize,
    rounds: NonZeroUsize,
    seed: Option<u64>,
}

impl SimulationGroup {
    /// Adds another initial occupancy distribution to run over.
    pub fn add(&mut self, distribution: OccupancyDistribution) {
        self.distributions.push(distribution);
    }

    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::new()
    }

    /// Runs every configured simulation, `repeat_all` times each.
    pub fn run_all(self) -> Result<ResultsBuilder, SimulationError> {
        let SimulationGroup {
            layout,
            model,
            num_agents,
            distributions,
            repeat_all,
            rounds,
            seed,
        } = self;

        let sims: Vec<_> = distributions
            .into_iter()
            .map(|distribution| Simulation {
                layout,
                model: model.clone(),
                num_agents,
                distribution,
                rounds: rounds.get(),
                seed: None,
            })
            // Clone each simulation repeat_all times
            .flat_map(|sim| vec![sim; repeat_all.get()])
            .enumerate()
            // Seeded groups stay reproducible across repeats: run i of the
            // group uses seed + i
            .map(|(i, mut sim)| {
                sim.seed = seed.map(|s| s.wrapping_add(i as u64));
                sim
            })
            .collect();

        #[cfg(feature = "rayon")]
        let outputs: Result<_, _> =
            sims.into_par_iter().map(|sim| sim.run()).collect();
        #[cfg(not(feature = "rayon"))]
        let outputs: Result<_, _> =
            sims.into_iter().map(|sim| sim.run()).collect();

        Ok(ResultsBuilder::new(outputs?, repeat_all))
    }
}

/// A simulation of the pool selection game.
///
/// # Details
/// Each round, [`Agent::act`] is called once on every agent, in an order
/// reshuffled independently per round. Switches are applied to the shared
/// grid one agent at a time, so agents later in a round observe the moves of
/// agents earlier in it.
#[derive(Debug, Clone)]
struct Simulation {
    layout: PoolLayout,
    model: Box<dyn ParameterModel>,
    num_agents: usize,
    distribution: OccupancyDistribution,
    rounds: usize,
    seed: Option<u64>,
}

/// Contains the output data from a simulation.
#[derive(Debug, Clone)]
pub struct SimulationOutput {
    /// Per-pool agent counts over time: the initial placement followed by
    /// one row per simulated round. This is the series occupancy charts and
    /// grid visualizations consume.
    pub counts: Vec<Vec<usize>>,
    /// The initial occupancy distribution this simulation started from.
    pub distribution: OccupancyDistribution,
    /// The parameter model agents drew their parameters from.
    pub model: Box<dyn ParameterModel>,
    /// Total number of pool switches across all rounds.
    pub relocations: usize,
    pub num_agents: usize,
    pub rounds: usize,
    /// The seed this run executed with, if the group was seeded.
    pub seed: Option<u64>,
}

impl SimulationOutput {
    /// Final per-pool agent counts.
    pub fn final_counts(&self) -> &[usize] {
        self.counts.last().expect("counts history holds the initial state")
    }

    /// Final per-pool occupancy fractions.
    pub fn final_shares(&self) -> Vec<Share> {
        let population = self.num_agents as Share;
        self.final_counts()
            .iter()
            .map(|&count| count as Share / population)
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("agent could not be relocated")]
    RelocationError(#[from] RelocationError),
    #[error("invalid initial occupancy distribution")]
    DistributionError(#[from] DistributionError),
    #[error("invalid agent parameters")]
    ParamsError(#[from] ParamsError),
    #[error("could not create rand::distributions::WeightedIndex")]
    WeightedIndexError(#[from] WeightedError),
}

impl Simulation {
    /// Executes the configured simulation.
    fn run(self) -> Result<SimulationOutput, SimulationError> {
        let Simulation { layout, model, num_agents, distribution, rounds, seed } =
            self;

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // Safety: distributions are validated during the simulation build
        // process, and there's no other way a user can create this struct
        let shares =
            unsafe { distribution.values_unchecked(layout.num_pools()) };
        let placement = WeightedIndex::new(&shares)?;

        let mut grid = PoolGrid::new(layout);
        let mut agents = Vec::with_capacity(num_agents);
        for i in 0..num_agents {
            let id = AgentId(i);
            let pool = PoolId(placement.sample(&mut rng));
            let params = model.params_for(&layout, &mut rng);

            grid.place(id, pool);
            agents.push(Agent::new(id, pool, params));
        }

        let mut counts = Vec::with_capacity(rounds + 1);
        counts.push(grid.counts());

        let mut relocations = 0;
        let mut order: Vec<usize> = (0..agents.len()).collect();
        for _ in 1..=rounds {
            order.shuffle(&mut rng);

            for &i in order.iter() {
                let agent = &mut agents[i];
                if let Action::Switch(to) = agent.act(&grid, &mut rng) {
                    grid.relocate(agent.id(), agent.pool(), to)?;
                    agent.set_pool(to);
                    relocations += 1;
                }
            }

            counts.push(grid.counts());
        }

        Ok(SimulationOutput {
            counts,
            distribution,
            model,
            relocations,
            num_agents,
            rounds,
            seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        agent::{FixedParams, UniformWeights},
        occupancy::OccupancyDistribution,
    };

    use super::SimulationBuilder;

    #[test]
    fn population_is_conserved_every_round() {
        let outputs = SimulationBuilder::new()
            .pool_grid(3, 3)
            .agents(50)
            .rounds(5)
            .parameter_model(UniformWeights::default())
            .seed(9)
            .build()
            .unwrap()
            .run_all()
            .unwrap()
            .data();

        assert_eq!(outputs[0].counts.len(), 6);
        for row in outputs[0].counts.iter() {
            assert_eq!(row.iter().sum::<usize>(), 50);
        }
    }

    #[test]
    fn nobody_leaves_a_fully_occupied_pool_for_an_empty_one() {
        // With everyone in pool 0, the candidate pool's occupancy is 0 and
        // the switch probability is exactly 0.
        let outputs = SimulationBuilder::new()
            .pools(2)
            .agents(4)
            .rounds(1)
            .initial_occupancy(OccupancyDistribution::SetValues(vec![
                1.0, 0.0,
            ]))
            .parameter_model(FixedParams::classic_two_pool())
            .seed(7)
            .build()
            .unwrap()
            .run_all()
            .unwrap()
            .data();

        assert_eq!(outputs[0].final_counts(), &[4, 0]);
        assert_eq!(outputs[0].relocations, 0);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let run = || {
            SimulationBuilder::new()
                .pools(2)
                .agents(200)
                .rounds(20)
                .occupancy_values([0.75, 0.25])
                .parameter_model(FixedParams::classic_two_pool())
                .seed(118)
                .build()
                .unwrap()
                .run_all()
                .unwrap()
                .data()
        };

        let first = run();
        let second = run();
        assert_eq!(first[0].counts, second[0].counts);
        assert_eq!(first[0].relocations, second[0].relocations);
    }

    #[test]
    fn repeats_of_a_seeded_group_differ() {
        let outputs = SimulationBuilder::new()
            .pools(2)
            .agents(200)
            .rounds(10)
            .repeat_all(2)
            .occupancy_values([0.75, 0.25])
            .parameter_model(FixedParams::classic_two_pool())
            .seed(118)
            .build()
            .unwrap()
            .run_all()
            .unwrap()
            .data();

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].seed, Some(118));
        assert_eq!(outputs[1].seed, Some(119));
        // Same configuration, different seed, different trajectory.
        assert_ne!(outputs[0].counts, outputs[1].counts);
    }
}
