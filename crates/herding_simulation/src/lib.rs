//! Herding Simulation Core
//!
//! ECS-симуляция на Bevy 0.16: один пастух гонит овец в safe zone.
//!
//! Per-tick цикл:
//! - Update: Perception (safe zone + овцы в радиусе) → Decision (herding / patrol)
//! - FixedUpdate: Movement (point-seek + ограниченный поворот), читает только desired position

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy::transform::TransformPlugin;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use thiserror::Error;

// Публичные модули
pub mod ai;
pub mod components;
pub mod logger;
pub mod physics;

// Re-export базовых компонентов для удобства
pub use ai::{HerdMode, HerdingAIPlugin, HerdingState, Perception, PerceptionResult, SafeZoneRef};
pub use components::*;
pub use logger::{init_logger, log, log_error, log_info, log_warning};
pub use physics::{spawn_herder, spawn_safe_zone, spawn_sheep, HerderMovementPlugin};

/// Частота physics tick (movement stage)
pub const PHYSICS_HZ: f64 = 60.0;

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Детерминистичный RNG (seed по умолчанию, если create_headless_app не задал свой)
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app
            // Fixed timestep 60Hz для movement tick
            .insert_resource(Time::<Fixed>::from_hz(PHYSICS_HZ))
            .add_plugins((HerdingAIPlugin, HerderMovementPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время продвигается ровно на 1/60 сек за `app.update()` — прогоны воспроизводимы.
/// `TransformPlugin` держит `GlobalTransform` актуальным для иерархий.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins((MinimalPlugins, TransformPlugin))
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(PHYSICS_HZ))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / PHYSICS_HZ,
        )));

    app
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to encode herd snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Snapshot одного пастуха (plain arrays — без serde фич bevy)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HerderSnapshot {
    pub entity: u32,
    pub translation: [f32; 3],
    pub rotation: [f32; 4],
    pub velocity: [f32; 3],
    pub desired_position: Option<[f32; 3]>,
    pub patrol_target: Option<[f32; 3]>,
    pub mode: String,
}

/// Snapshot всех пастухов для сравнения детерминизма
///
/// Сортировка по Entity index, сериализация через serde_json.
pub fn herd_snapshot(world: &mut World) -> Result<Vec<u8>, SnapshotError> {
    let mut query = world.query::<(Entity, &Transform, &PhysicsBody, &HerdingState)>();

    let mut herders: Vec<HerderSnapshot> = query
        .iter(world)
        .map(|(entity, transform, body, state)| HerderSnapshot {
            entity: entity.index(),
            translation: transform.translation.to_array(),
            rotation: transform.rotation.to_array(),
            velocity: body.velocity.to_array(),
            desired_position: state.desired_position.map(|p| p.to_array()),
            patrol_target: state.patrol_target.map(|p| p.to_array()),
            mode: format!("{:?}", state.mode),
        })
        .collect();

    // Сортируем по Entity ID для детерминизма
    herders.sort_by_key(|snapshot| snapshot.entity);

    Ok(serde_json::to_vec(&herders)?)
}
