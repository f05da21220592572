//! Movement stage: point-seek + поворот с ограниченной угловой скоростью
//!
//! Архитектура:
//! - FixedUpdate (60Hz), независимо от Update (perception/decision)
//! - Читает только `HerdingState::desired_position` — ни овец, ни safe zone
//! - Velocity пишем в `PhysicsBody`; интеграция — `integrate_velocity_to_transform`
//!
//! Детерминизм: fixed timestep, никакого wall-clock в расчётах

use bevy::prelude::*;

use crate::ai::HerdingState;
use crate::components::{Herder, HerderConfig, PhysicsBody};
use crate::physics::layers::{herder_groups, target_groups};

/// Результат movement тика
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringOutput {
    pub velocity: Vec3,
    pub rotation: Quat,
}

/// Поворот (yaw), при котором forward (-Z) смотрит вдоль `direction` в XZ plane
pub fn heading_rotation(direction: Vec3) -> Quat {
    Quat::from_rotation_y(f32::atan2(-direction.x, -direction.z))
}

/// Поворачивает `from` к `to` не больше чем на `max_angle` радиан
pub fn rotate_towards(from: Quat, to: Quat, max_angle: f32) -> Quat {
    let angle = from.angle_between(to);
    if angle <= max_angle || angle <= f32::EPSILON {
        return to;
    }
    from.slerp(to, max_angle / angle)
}

/// Movement тик: куда ехать и куда смотреть
///
/// - `desired == None` → `None` (цели ещё нет, movement пропускается целиком)
/// - ближе `deadband` (в XZ) → velocity = 0, rotation не меняется
/// - иначе velocity = направление * max_speed, поворот не больше `max_turn`
pub fn move_towards(
    position: Vec3,
    rotation: Quat,
    desired: Option<Vec3>,
    max_speed: f32,
    max_turn: f32,
    deadband: f32,
) -> Option<SteeringOutput> {
    let desired = desired?;

    let mut direction = desired - position;
    direction.y = 0.0; // держим высоту

    if direction.length() > deadband {
        let velocity = direction.normalize() * max_speed;
        Some(SteeringOutput {
            velocity,
            rotation: rotate_towards(rotation, heading_rotation(velocity), max_turn),
        })
    } else {
        Some(SteeringOutput {
            velocity: Vec3::ZERO,
            rotation,
        })
    }
}

/// Система: movement stage (FixedUpdate)
///
/// Неактивный пастух не двигается; velocity обнуляется только при `stop_on_deactivate`.
pub fn steer_herders(
    mut query: Query<(
        &Herder,
        &HerderConfig,
        &HerdingState,
        &mut Transform,
        &mut PhysicsBody,
    )>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (herder, config, state, mut transform, mut body) in query.iter_mut() {
        if !herder.active {
            if config.stop_on_deactivate && body.velocity != Vec3::ZERO {
                body.velocity = Vec3::ZERO;
            }
            continue;
        }

        let Some(output) = move_towards(
            transform.translation,
            transform.rotation,
            state.desired_position,
            config.max_speed,
            config.max_turn_per_tick(delta),
            config.arrival_deadband,
        ) else {
            continue;
        };

        body.velocity = output.velocity;
        if transform.rotation != output.rotation {
            transform.rotation = output.rotation;
        }
    }
}

/// Система интеграции velocity → Transform (kinematic, без физического движка)
pub fn integrate_velocity_to_transform(
    mut query: Query<(&PhysicsBody, &mut Transform), With<Herder>>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (body, mut transform) in query.iter_mut() {
        if body.velocity != Vec3::ZERO {
            transform.translation += body.velocity * delta;
        }
    }
}

/// Plugin для movement stage
///
/// Регистрирует системы в FixedUpdate для детерминизма.
pub struct HerderMovementPlugin;

impl Plugin for HerderMovementPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (steer_herders, integrate_velocity_to_transform).chain(), // Последовательное выполнение
        );
    }
}

/// Bundle пастуха без физики (headless)
///
/// Desired/patrol точка стартуют на позиции спавна.
pub fn herder_bundle(position: Vec3) -> impl Bundle {
    (
        Herder::default(),
        Transform::from_translation(position),
        HerdingState::starting_at(position),
    )
}

/// Spawn helper для пастуха (bundle + слой herders)
pub fn spawn_herder(commands: &mut Commands, position: Vec3) -> Entity {
    commands
        .spawn((herder_bundle(position), herder_groups()))
        .id()
}

/// Spawn helper для овцы (marker + слой targets)
pub fn spawn_sheep(commands: &mut Commands, position: Vec3) -> Entity {
    commands
        .spawn((
            crate::components::Sheep,
            Transform::from_translation(position),
            target_groups(),
        ))
        .id()
}

/// Spawn helper для safe zone (находится по Name)
pub fn spawn_safe_zone(commands: &mut Commands, position: Vec3) -> Entity {
    commands
        .spawn((
            Name::new(crate::components::SAFE_ZONE_KEY),
            Transform::from_translation(position),
        ))
        .id()
}
