//! Herding AI: perception → decision.
//!
//! Movement stage живёт в `physics` (FixedUpdate) и читает только desired position.

use bevy::prelude::*;

pub mod components;
pub mod decision;
pub mod perception;

// Re-export основных типов
pub use components::*;
pub use decision::{decide, herding_standoff, random_patrol_point};
pub use perception::{perceive, select_farthest, EcsWorldView, WorldView};

/// Herding AI Plugin
///
/// Регистрирует AI системы в Update (общая каденция, отдельно от physics tick).
/// Порядок выполнения:
/// 1. perceive_herd — safe zone lookup + выбор самой дальней овцы
/// 2. decide_herd — herding standoff или patrol → desired position
pub struct HerdingAIPlugin;

impl Plugin for HerdingAIPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (perception::perceive_herd, decision::decide_herd).chain(),
        );
    }
}
