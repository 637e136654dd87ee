//! Pool selection over a 10x10 lattice with per-agent random weights,
//! starting from a uniform random placement. Prints the final count grid.

use anyhow::Result;
use pool_sim::prelude::*;

const WIDTH: usize = 10;
const HEIGHT: usize = 10;

fn main() -> Result<()> {
    let simulation = SimulationBuilder::new()
        .pool_grid(WIDTH, HEIGHT)
        .agents(200)
        .rounds(20)
        .parameter_model(UniformWeights::default())
        .build()?;

    let output = simulation.run_all()?.data().remove(0);

    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            print!("{:>5}", output.final_counts()[y * WIDTH + x]);
        }
        println!();
    }
    println!("relocations: {}", output.relocations);
    Ok(())
}
