//! The classic two-pool experiment: 5000 miners split 75/25 between a
//! high-weight and a low-weight pool, left to re-sort themselves.

use std::time::Instant;

use anyhow::Result;
use pool_sim::prelude::*;

fn main() -> Result<()> {
    let start = Instant::now();

    let simulation = SimulationBuilder::new()
        .pools(2)
        .agents(5000)
        .rounds(200)
        .occupancy_values([0.75, 0.25])
        .parameter_model(FixedParams::classic_two_pool())
        .build()?;

    let results = simulation.run_all()?.all().build();

    println!("{}", results);
    println!("elapsed time: {:.4} secs", start.elapsed().as_secs_f64());
    Ok(())
}
