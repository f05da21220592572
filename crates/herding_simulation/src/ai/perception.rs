//! Perception stage: safe zone lookup + овцы в радиусе обзора.
//!
//! Кандидаты пересобираются с нуля каждый тик (никакого add/remove трекинга):
//! овца, которая исчезла или ушла, просто не попадёт в следующий скан.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::transform::helper::TransformHelper;
use bevy_rapier3d::prelude::{CollisionGroups, Group};

use crate::ai::{Perception, PerceptionResult, SafeZoneRef, SpottedTarget};
use crate::components::{Herder, HerderConfig, Sheep, SAFE_ZONE_KEY};
use crate::physics::layers::LAYER_TARGETS;

/// Граница между AI и миром (spatial query, identity check, named lookup)
///
/// Синхронный и side-effect free с точки зрения пастуха.
/// В игре — `EcsWorldView`, в тестах — фейковый мир.
pub trait WorldView {
    /// Все entity в радиусе `radius` от `center`, чьи collision memberships пересекаются с `category`.
    /// Порядок не гарантирован.
    fn query_in_radius(&self, center: Vec3, radius: f32, category: Group) -> Vec<Entity>;

    /// Identity check: entity (или её предок) несёт `Sheep` marker → возвращает эту овцу
    fn resolve_target(&self, entity: Entity) -> Option<Entity>;

    /// Поиск entity по ключу (Name)
    fn find_by_key(&self, key: &str) -> Option<Entity>;

    fn position_of(&self, entity: Entity) -> Option<Vec3>;

    fn has_target_marker(&self, entity: Entity) -> bool {
        self.resolve_target(entity).is_some()
    }
}

/// ECS реализация WorldView
///
/// Radius query — линейный скан по телам с `CollisionGroups`.
/// Все позиции мировые: считаются через `TransformHelper` по цепочке `ChildOf`,
/// поэтому не зависят от того, успел ли `GlobalTransform` пропагироваться в этом кадре.
#[derive(SystemParam)]
pub struct EcsWorldView<'w, 's> {
    bodies: Query<'w, 's, (Entity, &'static CollisionGroups), With<Transform>>,
    sheep: Query<'w, 's, (), With<Sheep>>,
    parents: Query<'w, 's, &'static ChildOf>,
    named: Query<'w, 's, (Entity, &'static Name)>,
    transforms: TransformHelper<'w, 's>,
}

impl WorldView for EcsWorldView<'_, '_> {
    fn query_in_radius(&self, center: Vec3, radius: f32, category: Group) -> Vec<Entity> {
        let radius_sq = radius * radius;

        self.bodies
            .iter()
            .filter(|(_, groups)| groups.memberships.intersects(category))
            .filter(|(entity, _)| {
                self.position_of(*entity)
                    .is_some_and(|position| position.distance_squared(center) <= radius_sq)
            })
            .map(|(entity, _)| entity)
            .collect()
    }

    fn resolve_target(&self, entity: Entity) -> Option<Entity> {
        // GetComponentInParent-семантика: сама entity, потом вверх по иерархии
        let mut current = entity;
        loop {
            if self.sheep.contains(current) {
                return Some(current);
            }
            current = self.parents.get(current).ok()?.parent();
        }
    }

    fn find_by_key(&self, key: &str) -> Option<Entity> {
        self.named
            .iter()
            .find(|(_, name)| name.as_str() == key)
            .map(|(entity, _)| entity)
    }

    fn position_of(&self, entity: Entity) -> Option<Vec3> {
        self.transforms
            .compute_global_transform(entity)
            .ok()
            .map(|global| global.translation())
    }
}

/// Выбор овцы: максимальная дистанция до safe zone
///
/// Пастух работает с отставшей овцой, а не с ближайшей.
/// Ничья: побеждает первая найденная (строгое `>`).
pub fn select_farthest(
    candidates: impl IntoIterator<Item = SpottedTarget>,
    safe_zone_position: Vec3,
) -> Option<SpottedTarget> {
    let mut best: Option<(SpottedTarget, f32)> = None;

    for candidate in candidates {
        let distance = candidate.position.distance(safe_zone_position);
        match best {
            Some((_, best_distance)) if distance <= best_distance => {}
            _ => best = Some((candidate, distance)),
        }
    }

    best.map(|(target, _)| target)
}

/// Perception тик для одного пастуха
///
/// Возвращает `None` если safe zone ещё не найдена (decision должен пропустить тик).
/// Lookup повторяется каждый тик до первого успеха; успех кэшируется навсегда.
pub fn perceive(
    world: &impl WorldView,
    agent_position: Vec3,
    sight_radius: f32,
    safe_zone: &mut SafeZoneRef,
) -> Option<PerceptionResult> {
    if safe_zone.entity.is_none() {
        safe_zone.entity = world.find_by_key(SAFE_ZONE_KEY);
    }

    let safe_zone_position = world.position_of(safe_zone.entity?)?;

    let candidates = world
        .query_in_radius(agent_position, sight_radius, LAYER_TARGETS)
        .into_iter()
        .filter_map(|hit| world.resolve_target(hit))
        // Позиция самой овцы (носителя marker), а не попавшего child-коллайдера
        .filter_map(|entity| {
            world
                .position_of(entity)
                .map(|position| SpottedTarget { entity, position })
        });

    Some(PerceptionResult {
        safe_zone_position,
        target: select_farthest(candidates, safe_zone_position),
    })
}

/// Система: perception stage (Update)
///
/// Пишет `Perception`; decision stage читает его в том же тике.
pub fn perceive_herd(
    mut herders: Query<(
        Entity,
        &Herder,
        &HerderConfig,
        &mut SafeZoneRef,
        &mut Perception,
    )>,
    world: EcsWorldView,
) {
    for (entity, herder, config, mut safe_zone, mut perception) in herders.iter_mut() {
        if !herder.active {
            continue;
        }

        // Мировая позиция: пастух может быть дочерним (например, на платформе)
        let Some(agent_position) = world.position_of(entity) else {
            continue;
        };

        let was_resolved = safe_zone.is_resolved();
        let result = perceive(&world, agent_position, config.sight_radius, &mut safe_zone);

        if !was_resolved && safe_zone.is_resolved() {
            crate::log(&format!(
                "🏁 {:?}: safe zone resolved → {:?}",
                entity, safe_zone.entity
            ));
        }

        if perception.result != result {
            perception.result = result;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Фейковый мир: позиции, маркеры, иерархия, имена
    #[derive(Default)]
    struct FakeWorld {
        bodies: Vec<(Entity, Vec3, Group)>,
        sheep: Vec<Entity>,
        parents: HashMap<Entity, Entity>,
        names: Vec<(Entity, String)>,
        positions: HashMap<Entity, Vec3>,
    }

    impl FakeWorld {
        fn add_sheep(&mut self, index: u32, position: Vec3) -> Entity {
            let entity = Entity::from_raw(index);
            self.bodies.push((entity, position, LAYER_TARGETS));
            self.sheep.push(entity);
            self.positions.insert(entity, position);
            entity
        }

        fn add_safe_zone(&mut self, index: u32, position: Vec3) -> Entity {
            let entity = Entity::from_raw(index);
            self.names.push((entity, SAFE_ZONE_KEY.to_string()));
            self.positions.insert(entity, position);
            entity
        }
    }

    impl WorldView for FakeWorld {
        fn query_in_radius(&self, center: Vec3, radius: f32, category: Group) -> Vec<Entity> {
            self.bodies
                .iter()
                .filter(|(_, position, groups)| {
                    groups.intersects(category) && position.distance(center) <= radius
                })
                .map(|(entity, _, _)| *entity)
                .collect()
        }

        fn resolve_target(&self, entity: Entity) -> Option<Entity> {
            let mut current = entity;
            loop {
                if self.sheep.contains(&current) {
                    return Some(current);
                }
                current = *self.parents.get(&current)?;
            }
        }

        fn find_by_key(&self, key: &str) -> Option<Entity> {
            self.names
                .iter()
                .find(|(_, name)| name == key)
                .map(|(entity, _)| *entity)
        }

        fn position_of(&self, entity: Entity) -> Option<Vec3> {
            self.positions.get(&entity).copied()
        }
    }

    fn spotted(index: u32, position: Vec3) -> SpottedTarget {
        SpottedTarget {
            entity: Entity::from_raw(index),
            position,
        }
    }

    #[test]
    fn test_select_farthest_any_order() {
        let safe_zone = Vec3::ZERO;
        let near = spotted(1, Vec3::new(2.0, 0.0, 0.0));
        let mid = spotted(2, Vec3::new(0.0, 0.0, 5.0));
        let far = spotted(3, Vec3::new(-9.0, 0.0, 0.0));

        let orders = [
            [near, mid, far],
            [far, near, mid],
            [mid, far, near],
            [far, mid, near],
        ];

        for order in orders {
            let selected = select_farthest(order, safe_zone);
            assert_eq!(selected, Some(far), "order {:?}", order);
        }
    }

    #[test]
    fn test_select_farthest_empty() {
        assert_eq!(select_farthest(Vec::new(), Vec3::ZERO), None);
    }

    #[test]
    fn test_select_farthest_tie_first_found_wins() {
        let first = spotted(1, Vec3::new(4.0, 0.0, 0.0));
        let second = spotted(2, Vec3::new(-4.0, 0.0, 0.0));

        assert_eq!(select_farthest([first, second], Vec3::ZERO), Some(first));
        assert_eq!(select_farthest([second, first], Vec3::ZERO), Some(second));
    }

    #[test]
    fn test_perceive_without_safe_zone_is_noop() {
        let mut world = FakeWorld::default();
        world.add_sheep(1, Vec3::new(1.0, 0.0, 0.0));

        let mut safe_zone = SafeZoneRef::default();
        let result = perceive(&world, Vec3::ZERO, 7.5, &mut safe_zone);

        assert_eq!(result, None);
        assert!(!safe_zone.is_resolved());
    }

    #[test]
    fn test_perceive_retries_safe_zone_lookup() {
        let mut world = FakeWorld::default();
        let sheep = world.add_sheep(1, Vec3::new(3.0, 0.0, 0.0));
        let mut safe_zone = SafeZoneRef::default();

        // Тик 1: safe zone ещё не существует
        assert_eq!(perceive(&world, Vec3::ZERO, 7.5, &mut safe_zone), None);

        // Тик 2: safe zone появилась — никакого закэшированного "not found"
        let zone = world.add_safe_zone(10, Vec3::new(-20.0, 0.0, 0.0));
        let result = perceive(&world, Vec3::ZERO, 7.5, &mut safe_zone)
            .expect("safe zone should resolve on second tick");

        assert_eq!(safe_zone.entity, Some(zone));
        assert_eq!(result.safe_zone_position, Vec3::new(-20.0, 0.0, 0.0));
        assert_eq!(result.target.map(|t| t.entity), Some(sheep));
    }

    #[test]
    fn test_perceive_never_requeries_resolved_safe_zone() {
        let mut world = FakeWorld::default();
        let zone = world.add_safe_zone(10, Vec3::ZERO);
        let mut safe_zone = SafeZoneRef::default();

        perceive(&world, Vec3::ZERO, 7.5, &mut safe_zone);
        assert_eq!(safe_zone.entity, Some(zone));

        // Вторая entity с тем же ключом не перехватывает кэш
        world.add_safe_zone(11, Vec3::new(50.0, 0.0, 0.0));
        let result = perceive(&world, Vec3::ZERO, 7.5, &mut safe_zone).unwrap();

        assert_eq!(safe_zone.entity, Some(zone));
        assert_eq!(result.safe_zone_position, Vec3::ZERO);
    }

    #[test]
    fn test_perceive_picks_farthest_from_safe_zone_in_sight() {
        let mut world = FakeWorld::default();
        world.add_safe_zone(10, Vec3::ZERO);
        let agent = Vec3::new(5.0, 0.0, 0.0);

        world.add_sheep(1, Vec3::new(2.0, 0.0, 0.0)); // 2 от safe zone
        world.add_sheep(2, Vec3::new(5.0, 0.0, 0.0)); // 5
        let far = world.add_sheep(3, Vec3::new(9.0, 0.0, 0.0)); // 9
        world.add_sheep(4, Vec3::new(30.0, 0.0, 0.0)); // дальше всех, но вне обзора

        let mut safe_zone = SafeZoneRef::default();
        let result = perceive(&world, agent, 7.5, &mut safe_zone).unwrap();

        assert_eq!(result.target.map(|t| t.entity), Some(far));
        assert_eq!(result.target.map(|t| t.position), Some(Vec3::new(9.0, 0.0, 0.0)));
    }

    #[test]
    fn test_perceive_no_sheep_in_sight() {
        let mut world = FakeWorld::default();
        world.add_safe_zone(10, Vec3::ZERO);
        world.add_sheep(1, Vec3::new(40.0, 0.0, 0.0));

        let mut safe_zone = SafeZoneRef::default();
        let result = perceive(&world, Vec3::ZERO, 7.5, &mut safe_zone).unwrap();

        assert_eq!(result.target, None);
    }

    #[test]
    fn test_perceive_filters_by_identity_marker() {
        let mut world = FakeWorld::default();
        world.add_safe_zone(10, Vec3::ZERO);

        // В слое targets, но без Sheep marker (категория грубее identity)
        let impostor = Entity::from_raw(5);
        world.bodies.push((impostor, Vec3::new(6.0, 0.0, 0.0), LAYER_TARGETS));
        world.positions.insert(impostor, Vec3::new(6.0, 0.0, 0.0));

        let sheep = world.add_sheep(1, Vec3::new(2.0, 0.0, 0.0));

        let mut safe_zone = SafeZoneRef::default();
        let result = perceive(&world, Vec3::ZERO, 7.5, &mut safe_zone).unwrap();

        assert_eq!(result.target.map(|t| t.entity), Some(sheep));
    }

    #[test]
    fn test_perceive_resolves_marker_on_parent() {
        let mut world = FakeWorld::default();
        world.add_safe_zone(10, Vec3::ZERO);

        // Овца вне обзора, но её child-коллайдер внутри
        let sheep = Entity::from_raw(1);
        world.sheep.push(sheep);
        world.positions.insert(sheep, Vec3::new(8.0, 0.0, 0.0));

        let collider = Entity::from_raw(2);
        world.bodies.push((collider, Vec3::new(7.0, 0.0, 0.0), LAYER_TARGETS));
        world.parents.insert(collider, sheep);

        let mut safe_zone = SafeZoneRef::default();
        let result = perceive(&world, Vec3::ZERO, 7.5, &mut safe_zone).unwrap();

        let target = result.target.unwrap();
        assert_eq!(target.entity, sheep);
        // Позиция берётся у овцы, не у коллайдера
        assert_eq!(target.position, Vec3::new(8.0, 0.0, 0.0));
        assert!(world.has_target_marker(collider));
    }

    #[test]
    fn test_perceive_ignores_other_categories() {
        let mut world = FakeWorld::default();
        world.add_safe_zone(10, Vec3::ZERO);

        // Sheep marker, но тело в слое obstacles — category filter отсекает
        let stray = Entity::from_raw(3);
        world.sheep.push(stray);
        world
            .bodies
            .push((stray, Vec3::new(1.0, 0.0, 0.0), crate::physics::layers::LAYER_OBSTACLES));
        world.positions.insert(stray, Vec3::new(1.0, 0.0, 0.0));

        let mut safe_zone = SafeZoneRef::default();
        let result = perceive(&world, Vec3::ZERO, 7.5, &mut safe_zone).unwrap();

        assert_eq!(result.target, None);
    }
}
