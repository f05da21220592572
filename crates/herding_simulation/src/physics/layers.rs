//! Collision Layers Constants
//!
//! Rapier collision groups — centralised constants для всего проекта.
//!
//! ## Архитектура:
//! - **Memberships:** на каком слое находится объект
//! - **Filters:** с какими слоями объект коллидирует
//!
//! ## Слои:
//! - GROUP_1: Herders (пастухи)
//! - GROUP_2: Targets (овцы) — perception ищет только в этом слое
//! - GROUP_3: Obstacles (стены, препятствия) — объявлен, perception его не запрашивает

use bevy_rapier3d::prelude::{CollisionGroups, Group};

/// Layer: пастухи
pub const LAYER_HERDERS: Group = Group::GROUP_1;

/// Layer: овцы (category filter для perception)
pub const LAYER_TARGETS: Group = Group::GROUP_2;

/// Layer: препятствия
pub const LAYER_OBSTACLES: Group = Group::GROUP_3;

/// Herder: коллайдит с овцами и препятствиями
pub fn herder_groups() -> CollisionGroups {
    CollisionGroups::new(LAYER_HERDERS, LAYER_TARGETS | LAYER_OBSTACLES)
}

/// Овца: коллайдит со всеми
pub fn target_groups() -> CollisionGroups {
    CollisionGroups::new(LAYER_TARGETS, Group::ALL)
}

/// Препятствие: коллайдит с пастухами и овцами
pub fn obstacle_groups() -> CollisionGroups {
    CollisionGroups::new(LAYER_OBSTACLES, LAYER_HERDERS | LAYER_TARGETS)
}
