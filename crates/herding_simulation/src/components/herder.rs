//! Herder компоненты: флаг активности, фиксированные параметры, velocity

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::{HerdingState, Perception, SafeZoneRef};

/// Пастух ("собака") — автономный агент, который гонит овец в safe zone
///
/// Автоматически добавляет config, состояние решений и perception cache
/// через Required Components.
///
/// `active == false` выключает обе каденции (Update и FixedUpdate).
/// Velocity при этом остаётся как была, если `HerderConfig::stop_on_deactivate` не включён.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
#[require(HerderConfig, HerdingState, SafeZoneRef, Perception, PhysicsBody, Transform)]
pub struct Herder {
    pub active: bool,
}

impl Default for Herder {
    fn default() -> Self {
        Self { active: true }
    }
}

/// Параметры пастуха
///
/// Значения по умолчанию — фиксированные константы поведения.
#[derive(Component, Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct HerderConfig {
    /// Скорость движения (units/sec)
    pub max_speed: f32,
    /// Радиус обзора для поиска овец
    pub sight_radius: f32,
    /// Дистанция "за овцой" (по линии овца → safe zone, в обратную сторону)
    pub standoff_distance: f32,
    /// Половина стороны квадрата, в котором генерируется patrol точка
    pub patrol_range: f32,
    /// Patrol точка считается достигнутой ближе этого расстояния
    pub patrol_arrival_radius: f32,
    /// Deadband: ближе этого к desired position — полная остановка
    pub arrival_deadband: f32,
    /// Максимальная скорость поворота (градусы/сек)
    pub turn_rate_degrees: f32,
    /// Обнулять velocity при деактивации
    pub stop_on_deactivate: bool,
}

impl Default for HerderConfig {
    fn default() -> Self {
        Self {
            max_speed: 5.0,
            sight_radius: 7.5,
            standoff_distance: 3.0,
            patrol_range: 10.0,
            patrol_arrival_radius: 0.5,
            arrival_deadband: 0.1,
            turn_rate_degrees: 360.0,
            stop_on_deactivate: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HerderConfigError {
    #[error("herder config field `{field}` must be positive and finite, got {value}")]
    NotPositive { field: &'static str, value: f32 },
}

impl HerderConfig {
    /// Проверяет что все дистанции/скорости положительные и конечные
    pub fn validate(&self) -> Result<(), HerderConfigError> {
        let fields = [
            ("max_speed", self.max_speed),
            ("sight_radius", self.sight_radius),
            ("standoff_distance", self.standoff_distance),
            ("patrol_range", self.patrol_range),
            ("patrol_arrival_radius", self.patrol_arrival_radius),
            ("arrival_deadband", self.arrival_deadband),
            ("turn_rate_degrees", self.turn_rate_degrees),
        ];

        for (field, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(HerderConfigError::NotPositive { field, value });
            }
        }

        Ok(())
    }

    /// Максимальный угол поворота (радианы) за один physics tick длительностью `delta_secs`
    pub fn max_turn_per_tick(&self, delta_secs: f32) -> f32 {
        self.turn_rate_degrees.to_radians() * delta_secs
    }
}

/// Velocity пастуха (пишет movement stage, интегрирует `integrate_velocity_to_transform`)
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct PhysicsBody {
    pub velocity: Vec3,
}
