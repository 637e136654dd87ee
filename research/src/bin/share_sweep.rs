//! Sweeps pool 0's initial share from 0% to 100% and tabulates the final
//! shares each starting point settles into.

use anyhow::Result;
use pool_sim::prelude::*;

fn main() -> Result<()> {
    let simulation = SimulationBuilder::new()
        .pools(2)
        .agents(1000)
        .rounds(100)
        .repeat_all(10)
        .seed(118)
        .pool_share_iter(PoolId::from(0), (0..=100).percent())
        .parameter_model(FixedParams::classic_two_pool())
        .build()?;

    let results = simulation
        .run_all()?
        .average(Average::Mean)
        .shares()
        .format(Format::CSV)
        .build();

    println!("{}", results);
    Ok(())
}
