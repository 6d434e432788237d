//! Fog-of-war for a client's partial view.
//!
//! Every unit sees through a sight-set: the tile offsets within a circular
//! radius of its position. Sight-sets are derived constants computed once
//! per radius and shared read-only by all units. The authoritative server
//! never runs this pass; it sees everything.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use crate::components::PlayerId;
use crate::grid::{GridPoint, GridRect};
use crate::store::StateStore;

/// Sight radius used when nothing else is configured.
pub const DEFAULT_SIGHT_RADIUS: u32 = 5;

/// Largest radius a sight-set is built for; larger requests are clamped.
pub const MAX_SIGHT_RADIUS: u32 = 64;

/// Relative offsets visible from a unit's tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SightSet {
    radius: u32,
    offsets: Vec<GridPoint>,
}

impl SightSet {
    /// Every offset whose Euclidean distance from the origin is at most
    /// `radius`, clamped to [`MAX_SIGHT_RADIUS`].
    #[must_use]
    pub fn new(radius: u32) -> Self {
        let radius = radius.min(MAX_SIGHT_RADIUS);
        let r = radius as i32;
        let limit = i64::from(radius) * i64::from(radius);
        let offsets = (-r..=r)
            .flat_map(|y| (-r..=r).map(move |x| GridPoint::new(x, y)))
            .filter(|p| p.distance_squared(GridPoint::ZERO) <= limit)
            .collect();
        Self { radius, offsets }
    }

    /// Radius this set was built for.
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    /// Offsets relative to the observer.
    #[must_use]
    pub fn offsets(&self) -> &[GridPoint] {
        &self.offsets
    }

    /// Absolute points seen from `origin`.
    pub fn seen_from(&self, origin: GridPoint) -> impl Iterator<Item = GridPoint> + '_ {
        self.offsets.iter().map(move |o| origin.offset(*o))
    }
}

/// The default sight-set, computed on first use and shared for the
/// lifetime of the process.
pub fn default_sight_set() -> &'static SightSet {
    static DEFAULT: OnceLock<SightSet> = OnceLock::new();
    DEFAULT.get_or_init(|| SightSet::new(DEFAULT_SIGHT_RADIUS))
}

/// Outcome of one visibility pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityChange {
    /// Points that became visible.
    pub revealed: Vec<GridPoint>,
    /// Points that were visible and no longer are.
    pub hidden: Vec<GridPoint>,
}

/// Per-player fog state and sight-set cache.
#[derive(Debug, Clone, Default)]
pub struct VisibilityEngine {
    sight_sets: HashMap<u32, Arc<SightSet>>,
    lit: BTreeSet<GridPoint>,
}

impl VisibilityEngine {
    /// Create an engine with the default sight-set preloaded.
    #[must_use]
    pub fn new() -> Self {
        let mut sight_sets = HashMap::new();
        sight_sets.insert(
            DEFAULT_SIGHT_RADIUS,
            Arc::new(default_sight_set().clone()),
        );
        Self {
            sight_sets,
            lit: BTreeSet::new(),
        }
    }

    /// Shared sight-set for a radius, computed once.
    pub fn sight_set(&mut self, radius: u32) -> Arc<SightSet> {
        let radius = radius.min(MAX_SIGHT_RADIUS);
        Arc::clone(
            self.sight_sets
                .entry(radius)
                .or_insert_with(|| Arc::new(SightSet::new(radius))),
        )
    }

    /// Union of the sight of every unit `observer` owns.
    pub fn seen_by(&mut self, store: &StateStore, observer: PlayerId) -> HashSet<GridPoint> {
        let mut seen = HashSet::new();
        for unit in store.units_owned_by(observer) {
            let sight = self.sight_set(unit.sight_radius);
            seen.extend(sight.seen_from(unit.tile()));
        }
        seen
    }

    /// Recompute fog for `observer` over the materialized `view`.
    ///
    /// Tiles in `view` are visible exactly when some owned unit sees them;
    /// previously visible tiles outside `view` are hidden.
    pub fn recompute(
        &mut self,
        store: &mut StateStore,
        observer: PlayerId,
        view: GridRect,
    ) -> VisibilityChange {
        let seen = self.seen_by(store, observer);

        let mut now_lit = BTreeSet::new();
        for point in view.points() {
            let visible = seen.contains(&point);
            store.set_tile_visible(point, visible);
            if visible {
                now_lit.insert(point);
            }
        }
        for point in self.lit.difference(&now_lit) {
            store.set_tile_visible(*point, false);
        }

        let change = VisibilityChange {
            revealed: now_lit.difference(&self.lit).copied().collect(),
            hidden: self.lit.difference(&now_lit).copied().collect(),
        };
        self.lit = now_lit;
        change
    }

    /// True if `point` was visible after the last pass.
    #[must_use]
    pub fn is_visible(&self, point: GridPoint) -> bool {
        self.lit.contains(&point)
    }

    /// Number of visible tiles after the last pass.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.lit.len()
    }
}
