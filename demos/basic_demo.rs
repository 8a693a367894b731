//! Basic demonstration of the hive defense simulation.
//!
//! Run with: cargo run --example basic_demo

use glam::Vec2;
use hive_sim::{Intents, SimConfig, SimWorld};

fn main() {
    hive_sim::logging::init(false);

    println!("=== Hive Defense - Simulation Demo ===\n");

    let mut sim = SimWorld::with_config(SimConfig {
        seed: Some(7),
        ..Default::default()
    });

    println!("Initial state:");
    print_summary(&mut sim);

    // Circle the arena, firing, for about 20 seconds at 60 fps.
    println!("\nFlying a loop for 1200 frames...\n");
    for frame in 0..1200u32 {
        let t = frame as f32 * 0.01;
        let intents = Intents {
            movement: Vec2::new(t.cos(), t.sin()),
            fire: frame % 2 == 0,
            use_light_weapon: frame % 300 == 0,
            ..Default::default()
        };
        let changes = sim.advance(16.7, intents);

        for destruction in &changes.destructions {
            println!(
                "  frame {frame}: {:?} destroyed at ({:.0}, {:.0}) +{}",
                destruction.kind, destruction.position.x, destruction.position.y, destruction.points
            );
        }
        if changes.game_over {
            println!("\n--- Game over at frame {frame} ---");
            break;
        }
        if (frame + 1) % 200 == 0 {
            println!("--- Frame {} (t={:.1}s) ---", frame + 1, sim.elapsed_ms() / 1000.0);
            print_summary(&mut sim);
        }
    }

    println!("\n=== Final State (JSON) ===\n");
    match sim.snapshot().to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("snapshot failed: {err}"),
    }
}

fn print_summary(sim: &mut SimWorld) {
    let snapshot = sim.snapshot();
    let hunting = snapshot.bees.iter().filter(|b| b.state == "hunt").count();
    println!(
        "  score={} bees={} (hunting {}) hunters={} cells={} reserve={:.1}",
        snapshot.score,
        snapshot.bees.len(),
        hunting,
        snapshot.hunters.len(),
        snapshot.cells.len(),
        snapshot.honey_reserve
    );
    if let Some(player) = snapshot.player {
        println!(
            "  player: pos=({:.0}, {:.0}) hp={:.0} shield={:.0}",
            player.pos.x, player.pos.y, player.health, player.shield
        );
    }
}
