//! Determinism and convergence testing utilities.
//!
//! Provides harnesses for verifying that the shared core produces
//! identical results given identical action streams, and that a replica
//! fed the server's broadcasts ends up in the server's state.
//!
//! # Testing Strategy
//!
//! Sources of divergence between processes include:
//!
//! - **Floating-point math**: positions integrate in fixed-point via
//!   [`rts_core::math::Fixed`] and travel as raw bits.
//!
//! - **`HashMap` iteration order**: the tick loop walks units in sorted id
//!   order and [`StateStore::state_hash`] sorts before hashing.
//!
//! - **Replica interpolation**: clients move units locally between
//!   arrivals, so a replica only matches the server once every unit is idle.
//!
//! [`StateStore::state_hash`]: rts_core::store::StateStore::state_hash

use std::thread;

use rts_core::config::SimulationConfig;
use rts_core::game::{Authority, Game};
use rts_core::protocol::Action;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run `script` on `runs` fresh servers for `ticks` ticks each and compare
/// the final state hashes.
#[must_use]
pub fn verify_determinism(
    config: &SimulationConfig,
    script: &[Action],
    runs: usize,
    ticks: u64,
) -> DeterminismResult {
    let hashes: Vec<u64> = (0..runs)
        .map(|_| {
            let (mut game, _) = server_with_script(config.clone(), script);
            for _ in 0..ticks {
                game.tick();
            }
            game.store().state_hash()
        })
        .collect();

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks,
    }
}

/// Build an authoritative game and apply `script` to it.
///
/// Returns the game and every action the server would have broadcast:
/// the script itself followed by any follow-ups.
#[must_use]
pub fn server_with_script(config: SimulationConfig, script: &[Action]) -> (Game, Vec<Action>) {
    let mut game = Game::new(config, Authority::Server);
    let mut broadcast = Vec::new();
    for action in script {
        let follow_up = game.handle_action(action);
        broadcast.push(action.clone());
        broadcast.extend(follow_up);
    }
    (game, broadcast)
}

/// True when no unit has waypoints left.
#[must_use]
pub fn is_quiescent(game: &Game) -> bool {
    game.store().all_units().iter().all(|u| u.is_idle())
}

/// Outcome of feeding a replica the server's broadcasts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvergenceReport {
    /// Server state hash at the end of the run.
    pub server_hash: u64,
    /// Replica state hash at the end of the run.
    pub replica_hash: u64,
    /// Ticks until both sides were idle.
    pub ticks: u64,
    /// Whether both sides reached quiescence within the budget.
    pub settled: bool,
}

impl ConvergenceReport {
    /// True when the replica settled on the server's state.
    #[must_use]
    pub fn converged(&self) -> bool {
        self.settled && self.server_hash == self.replica_hash
    }
}

/// Apply `script` to a server, forward every broadcast to a replica and tick
/// both until idle or `max_ticks` elapse.
#[must_use]
pub fn verify_replica_convergence(
    config: &SimulationConfig,
    script: &[Action],
    max_ticks: u64,
) -> ConvergenceReport {
    let (mut server, broadcast) = server_with_script(config.clone(), script);
    let mut replica = Game::new(config.clone(), Authority::Replica);
    for action in &broadcast {
        replica.handle_action(action);
    }

    let mut ticks = 0;
    while ticks < max_ticks && !(is_quiescent(&server) && is_quiescent(&replica)) {
        for action in server.tick() {
            replica.handle_action(&action);
        }
        replica.tick();
        ticks += 1;
    }

    let report = ConvergenceReport {
        server_hash: server.store().state_hash(),
        replica_hash: replica.store().state_hash(),
        ticks,
        settled: is_quiescent(&server) && is_quiescent(&replica),
    };
    if !report.converged() {
        tracing::debug!(?report, "replica did not converge");
    }
    report
}

/// Compare two server runs of `script` tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if the runs agree, `Some(tick)` if they diverge at that tick.
#[must_use]
pub fn find_first_divergence(
    config: &SimulationConfig,
    script: &[Action],
    num_ticks: u64,
) -> Option<u64> {
    let (mut a, _) = server_with_script(config.clone(), script);
    let (mut b, _) = server_with_script(config.clone(), script);

    if a.store().state_hash() != b.store().state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        let out_a = a.tick();
        let out_b = b.tick();
        if out_a != out_b || a.store().state_hash() != b.store().state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Run `script` on `num_sims` scoped threads and collect final hashes.
///
/// # Panics
///
/// Panics if a simulation thread panics.
#[must_use]
pub fn run_parallel_servers(
    config: &SimulationConfig,
    script: &[Action],
    num_sims: usize,
    num_ticks: u64,
) -> DeterminismResult {
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let (mut game, _) = server_with_script(config.clone(), script);
                    for _ in 0..num_ticks {
                        game.tick();
                    }
                    game.store().state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: num_ticks,
    }
}

/// Proptest strategies for movement and streaming inputs.
pub mod strategies {
    use proptest::prelude::*;
    use rts_core::grid::{GridPoint, GridRect};
    use rts_core::math::{Fixed, Vec2Fixed};

    /// A tile coordinate within a moderate range.
    pub fn arb_grid_point(extent: i32) -> impl Strategy<Value = GridPoint> {
        (-extent..extent, -extent..extent).prop_map(|(x, y)| GridPoint::new(x, y))
    }

    /// A fractional position, quantized to 1/256 of a tile.
    pub fn arb_position(extent: i32) -> impl Strategy<Value = Vec2Fixed> {
        let range = -(extent * 256)..(extent * 256);
        (range.clone(), range).prop_map(|(x, y)| {
            Vec2Fixed::new(Fixed::from_num(x) / 256, Fixed::from_num(y) / 256)
        })
    }

    /// A non-empty rectangle with sides up to `max_side`.
    pub fn arb_rect(extent: i32, max_side: i32) -> impl Strategy<Value = GridRect> {
        (arb_grid_point(extent), 1..=max_side, 1..=max_side)
            .prop_map(|(min, w, h)| GridRect::new(min.x, min.y, min.x + w, min.y + h))
    }
}
