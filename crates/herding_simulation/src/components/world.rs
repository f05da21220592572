//! World компоненты: овцы, safe zone, границы уровня
//!
//! Пастух эти entity не владеет и не мутирует — только читает позиции.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Ключ (Name), по которому ищется safe zone
pub const SAFE_ZONE_KEY: &str = "SafeZone";

/// Marker: овца (target identity)
///
/// Может висеть на самой entity коллайдера или на её предке.
/// Собственный AI овец — отдельная система, здесь не моделируется.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Sheep;

/// Границы уровня для patrol точек (XZ plane)
///
/// Опционально: без этого компонента patrol точки не ограничены.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct PatrolBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl PatrolBounds {
    pub fn new(min_x: f32, max_x: f32, min_z: f32, max_z: f32) -> Self {
        Self {
            min_x,
            max_x,
            min_z,
            max_z,
        }
    }

    /// Зажимает точку внутрь границ (Y не трогаем)
    ///
    /// Без panic при min > max (в отличие от `f32::clamp`): побеждает max.
    pub fn clamp(&self, point: Vec3) -> Vec3 {
        Vec3::new(
            point.x.max(self.min_x).min(self.max_x),
            point.y,
            point.z.max(self.min_z).min(self.max_z),
        )
    }
}
