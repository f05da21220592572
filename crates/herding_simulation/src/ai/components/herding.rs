//! Herding AI components (режим, desired position, perception cache).

use bevy::prelude::*;

/// Какая ветка decision stage отработала последней
#[derive(Debug, Clone, Copy, Default, PartialEq, Reflect)]
pub enum HerdMode {
    /// Safe zone ещё не найдена — perception/decision пропускаются
    #[default]
    AwaitingSafeZone,

    /// Гоним конкретную овцу (самую дальнюю от safe zone)
    Herding {
        target: Entity,
    },

    /// Овец не видно — бродим по случайным точкам
    Patrol,
}

/// Состояние пастуха: decision пишет, movement читает
///
/// `desired_position == None` — цели ещё нет, movement stage ничего не делает.
/// `patrol_target == None` — patrol точка не выбрана, следующий patrol тик сгенерирует новую.
#[derive(Component, Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct HerdingState {
    pub mode: HerdMode,
    pub desired_position: Option<Vec3>,
    pub patrol_target: Option<Vec3>,
}

impl HerdingState {
    /// Старт на месте спавна: desired и patrol точка = стартовая позиция
    pub fn starting_at(position: Vec3) -> Self {
        Self {
            mode: HerdMode::AwaitingSafeZone,
            desired_position: Some(position),
            patrol_target: Some(position),
        }
    }
}

/// Кэш safe zone (lookup key → entity), не владеющая ссылка
///
/// Резолвится один раз; пока не найдена, lookup повторяется каждый тик.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct SafeZoneRef {
    pub entity: Option<Entity>,
}

impl SafeZoneRef {
    pub fn is_resolved(&self) -> bool {
        self.entity.is_some()
    }
}

/// Выбранная овца (entity + позиция на момент perception тика)
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct SpottedTarget {
    pub entity: Entity,
    pub position: Vec3,
}

/// Результат perception тика (пересобирается с нуля каждый тик)
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct PerceptionResult {
    pub safe_zone_position: Vec3,
    pub target: Option<SpottedTarget>,
}

/// Component: последний perception результат
///
/// `None` — safe zone не найдена в этом тике, decision пропускается.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Perception {
    pub result: Option<PerceptionResult>,
}
