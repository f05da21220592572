//! Headless симуляция herding
//!
//! Запускает Bevy App без рендера: safe zone, пастух, разбросанные овцы.

use bevy::prelude::*;
use clap::Parser;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use herding_simulation::logger::{set_log_level, LogLevel};
use herding_simulation::{
    create_headless_app, log_info, spawn_herder, spawn_safe_zone, spawn_sheep, HerderConfig,
    HerdingState, SimulationPlugin,
};

/// Headless herding simulation
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// RNG seed (patrol точки + расстановка овец)
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Количество тиков симуляции
    #[arg(long, default_value_t = 1000)]
    ticks: usize,

    /// Количество овец
    #[arg(long, default_value_t = 8)]
    sheep: usize,

    /// Debug логирование (переходы perception/decision)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    set_log_level(if args.verbose { LogLevel::Debug } else { LogLevel::Info });

    HerderConfig::default().validate()?;

    log_info(&format!(
        "Starting headless herding simulation (seed: {}, sheep: {})",
        args.seed, args.sheep
    ));

    let mut app = create_headless_app(args.seed);
    app.add_plugins(SimulationPlugin);

    // Отдельный RNG для расстановки — не сдвигает patrol последовательность
    let mut layout_rng = ChaCha8Rng::seed_from_u64(args.seed ^ 0x5EED);

    let herder = {
        let world = app.world_mut();
        let mut commands = world.commands();
        spawn_safe_zone(&mut commands, Vec3::new(-20.0, 0.0, -20.0));
        for _ in 0..args.sheep {
            let position = Vec3::new(
                layout_rng.gen_range(-15.0..=15.0),
                0.0,
                layout_rng.gen_range(-15.0..=15.0),
            );
            spawn_sheep(&mut commands, position);
        }
        spawn_herder(&mut commands, Vec3::new(10.0, 0.0, 10.0))
    };
    app.world_mut().flush();

    for tick in 0..args.ticks {
        app.update();

        if tick % 100 == 0 {
            let world = app.world();
            if let (Some(transform), Some(state)) = (
                world.get::<Transform>(herder),
                world.get::<HerdingState>(herder),
            ) {
                log_info(&format!(
                    "Tick {}: herder at {:.2?}, mode {:?}",
                    tick, transform.translation, state.mode
                ));
            }
        }
    }

    log_info("Simulation complete!");
    Ok(())
}
