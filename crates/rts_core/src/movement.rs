//! Unit movement planner.
//!
//! Paths are discrete diagonal-or-orthogonal walks over whole tiles; per
//! tick a unit glides toward its next waypoint at a fixed speed and snaps
//! onto it once within the arrival epsilon. Arrivals are the only
//! movement progress other replicas ever hear about: [`advance`] returns
//! a [`MoveStepPayload`] for the caller to broadcast.

use crate::components::Unit;
use crate::config::SimulationConfig;
use crate::error::{GameError, Result};
use crate::grid::GridPoint;
use crate::math::Vec2Fixed;
use crate::protocol::MoveStepPayload;

/// Build the walk from `start` to `target` (both rounded to tiles).
///
/// The first waypoint is the rounded start and the last is the rounded
/// target; each axis moves at most one tile per waypoint. `start == target`
/// yields a single-point path.
///
/// # Errors
///
/// [`GameError::PathTooLong`] when more than `max_len` waypoints would be needed.
pub fn plan_path(start: Vec2Fixed, target: Vec2Fixed, max_len: usize) -> Result<Vec<Vec2Fixed>> {
    let from = start.round_to_grid();
    let to = target.round_to_grid();

    let needed = from.chebyshev_distance(to) as usize + 1;
    if needed > max_len {
        return Err(GameError::PathTooLong {
            from,
            to,
            limit: max_len,
        });
    }

    let mut path = Vec::with_capacity(needed);
    let mut current = from;
    path.push(Vec2Fixed::from_grid(current));
    while current != to && path.len() < max_len {
        current = current.step_toward(to);
        path.push(Vec2Fixed::from_grid(current));
    }
    Ok(path)
}

/// Order `unit` toward `target`.
///
/// Re-issuing the target of a path still in flight is a no-op and returns
/// `false`. Otherwise any unfinished path is discarded, a fresh one is
/// planned from the unit's current position and `step` resets to 0.
pub fn move_to(unit: &mut Unit, target: Vec2Fixed, config: &SimulationConfig) -> Result<bool> {
    let goal = Vec2Fixed::from_grid(target.round_to_grid());
    if !unit.is_idle() && unit.path.last() == Some(&goal) {
        return Ok(false);
    }

    unit.path = plan_path(unit.position, goal, config.max_path_len)?;
    unit.step = 0;
    Ok(true)
}

/// Abandon the current path, leaving the unit idle on the last waypoint
/// it reached. A unit that has not reached any waypoint stays where it is.
pub fn stop(unit: &mut Unit) {
    if let Some(reached) = unit.step.checked_sub(1).and_then(|i| unit.path.get(i)) {
        unit.position = *reached;
    }
    unit.path.clear();
    unit.step = 0;
}

/// Advance `unit` by one simulation tick.
///
/// Idle units are untouched. A unit within the arrival epsilon of its next
/// waypoint snaps onto it, increments `step`, and the returned payload
/// announces the arrival. Otherwise the unit moves along the unit vector
/// toward the waypoint by the configured speed, never overshooting it.
pub fn advance(unit: &mut Unit, config: &SimulationConfig) -> Option<MoveStepPayload> {
    let waypoint = unit.next_waypoint()?;

    let epsilon = config.epsilon();
    if unit.position.distance_squared(waypoint) < epsilon * epsilon {
        unit.position = waypoint;
        unit.step += 1;
        return Some(step_payload(unit));
    }

    let offset = waypoint - unit.position;
    let distance = offset.dot(offset);
    let travel = config.speed();
    if distance <= travel * travel {
        unit.position = waypoint;
    } else {
        unit.position = unit.position + offset.normalize().scale(travel);
    }
    None
}

/// Snapshot of the unit's movement state as broadcast after an arrival.
#[must_use]
pub fn step_payload(unit: &Unit) -> MoveStepPayload {
    MoveStepPayload {
        unit_id: unit.id,
        position: unit.position,
        path: unit.path.clone(),
        step: unit.step,
    }
}

/// Overwrite a replica's movement state with an authoritative step.
///
/// The step index is clamped to the path length.
pub fn apply_step(unit: &mut Unit, step: &MoveStepPayload) {
    unit.position = step.position;
    unit.path.clone_from(&step.path);
    unit.step = step.step.min(unit.path.len());
}

/// Tile the unit will enter next, if it is still travelling.
#[must_use]
pub fn next_tile(unit: &Unit) -> Option<GridPoint> {
    unit.next_waypoint().map(Vec2Fixed::round_to_grid)
}
