use std::time::Instant;

use highway_sim::{SimConfig, Simulation};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let seed = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => 0,
    };
    let mut sim = Simulation::seeded(SimConfig::default(), seed)?;
    sim.populate();

    println!("Simulating...");
    const NUM_FRAMES: u32 = 1600;
    for _ in 0..10 {
        let start = Instant::now();
        for _ in 0..NUM_FRAMES {
            sim.step();
        }
        let frame = start.elapsed() / NUM_FRAMES;
        println!(
            "Frame {}: avg. frame {:?}, {} vehicles ({} on screen), {} anomalies, {} shapes recycled",
            sim.frame(),
            frame,
            sim.report().vehicles,
            sim.report().on_screen,
            sim.anomalies().len(),
            sim.recycled_shapes(),
        );
    }
    Ok(())
}
