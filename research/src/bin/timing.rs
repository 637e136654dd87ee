use std::time::Instant;

use anyhow::Result;
use pool_sim::prelude::*;

fn main() -> Result<()> {
    let start = Instant::now();

    let simulation = SimulationBuilder::new()
        .pool_grid(10, 10)
        .agents(1000)
        .rounds(500)
        .repeat_all(8)
        .seed(118)
        .build()?;

    let results = simulation
        .run_all()?
        .average(Average::Mean)
        .relocations()
        .num_agents()
        .rounds()
        .build();

    println!("{}", results);
    println!("elapsed time: {:.4} secs", start.elapsed().as_secs_f64());
    Ok(())
}
