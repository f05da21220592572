//! Decision stage: herding за выбранной овцой или patrol fallback.
//!
//! Вся "интеллектуальная" часть здесь: movement stage — тупой point-seeker,
//! который знает только `desired_position`.

use bevy::prelude::*;
use rand::Rng;

use crate::ai::{HerdMode, HerdingState, Perception, PerceptionResult};
use crate::components::{Herder, HerderConfig, PatrolBounds};
use crate::DeterministicRng;

/// Точка "за овцой" относительно safe zone
///
/// Овца → safe zone направление, desired = овца - направление * standoff.
/// Подходя к этой точке, пастух толкает овцу к safe zone.
/// Если овца стоит ровно в safe zone, направление нулевое → desired = позиция овцы.
pub fn herding_standoff(target: Vec3, safe_zone: Vec3, standoff_distance: f32) -> Vec3 {
    let sheep_to_goal = (safe_zone - target).normalize_or_zero();
    target - sheep_to_goal * standoff_distance
}

/// Новая patrol точка: текущая позиция + случайный offset по X и Z независимо
///
/// Область — квадрат ±range, а не круг (независимое семплирование осей).
///
/// # Panics
/// Если `range` отрицательный или не конечный (пустой диапазон для `gen_range`).
/// `decide_herd` не вызывает decision для конфигов, не прошедших `HerderConfig::validate`.
pub fn random_patrol_point(agent_position: Vec3, range: f32, rng: &mut impl Rng) -> Vec3 {
    let offset_x = rng.gen_range(-range..=range);
    let offset_z = rng.gen_range(-range..=range);
    agent_position + Vec3::new(offset_x, 0.0, offset_z)
}

fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x - b.x, a.z - b.z).length()
}

/// Decision тик для одного пастуха
///
/// Precondition: safe zone найдена (есть `PerceptionResult`).
/// Пишет `state.mode`, `state.desired_position`, при patrol — `state.patrol_target`.
/// Desired position всегда на высоте пастуха.
pub fn decide(
    agent_position: Vec3,
    perception: &PerceptionResult,
    config: &HerderConfig,
    bounds: Option<&PatrolBounds>,
    state: &mut HerdingState,
    rng: &mut impl Rng,
) -> Vec3 {
    let desired = match perception.target {
        Some(target) => {
            state.mode = HerdMode::Herding {
                target: target.entity,
            };
            herding_standoff(
                target.position,
                perception.safe_zone_position,
                config.standoff_distance,
            )
        }
        None => {
            state.mode = HerdMode::Patrol;

            let reached = state
                .patrol_target
                .is_none_or(|patrol| planar_distance(agent_position, patrol) < config.patrol_arrival_radius);

            if reached {
                let mut point = random_patrol_point(agent_position, config.patrol_range, rng);
                if let Some(bounds) = bounds {
                    point = bounds.clamp(point);
                }
                state.patrol_target = Some(point);
            }

            state.patrol_target.unwrap_or(agent_position)
        }
    };

    let desired = Vec3::new(desired.x, agent_position.y, desired.z);
    state.desired_position = Some(desired);
    desired
}

/// Система: decision stage (Update, после perception)
///
/// Без perception результата (safe zone не найдена) — пропуск, desired остаётся прежним.
/// Невалидный config — тоже пропуск; ошибка логируется при каждом изменении config.
pub fn decide_herd(
    mut herders: Query<(
        Entity,
        &Herder,
        Ref<HerderConfig>,
        &Transform,
        &Perception,
        &mut HerdingState,
        Option<&PatrolBounds>,
    )>,
    mut rng: ResMut<DeterministicRng>,
) {
    for (entity, herder, config, transform, perception, mut state, bounds) in herders.iter_mut() {
        if !herder.active {
            continue;
        }

        if let Err(err) = config.validate() {
            if config.is_changed() {
                crate::log_error(&format!("🐕 {:?}: decision disabled: {}", entity, err));
            }
            continue;
        }

        let Some(result) = perception.result.as_ref() else {
            continue;
        };

        let previous_mode = state.mode;
        let previous_patrol = state.patrol_target;

        decide(
            transform.translation,
            result,
            &config,
            bounds,
            &mut state,
            &mut rng.rng,
        );

        if state.mode != previous_mode {
            crate::log(&format!(
                "🐕 {:?}: {:?} → {:?}",
                entity, previous_mode, state.mode
            ));
        }

        if state.mode == HerdMode::Patrol && state.patrol_target != previous_patrol {
            crate::log(&format!(
                "🔍 {:?} Patrol: new point {:?}",
                entity, state.patrol_target
            ));
        }
    }
}
