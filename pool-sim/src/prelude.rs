/*!
Re-export of common values and datatypes used for running and analyzing
simulations. Must be imported manually.

```
use pool_sim::prelude::*;
```
*/

use crate::{agent, grid, occupancy, pool, results, simulation};

pub use agent::{
    Action, Agent, AgentId, AgentParams, FixedParams, ParameterModel,
    ParamsError, UniformWeights,
};

pub use grid::{PoolGrid, RelocationError};

pub use occupancy::{
    DistributionError, OccupancyDistribution, Percent, Share,
};

pub use pool::{PoolId, PoolLayout};

pub use results::{Average, Format, ResultsBuilder, ResultsTable};

pub use simulation::{
    SimulationBuildError, SimulationBuilder, SimulationError, SimulationGroup,
    SimulationOutput,
};
