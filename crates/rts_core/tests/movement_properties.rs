//! Property tests for path planning, movement and viewport streaming.

use proptest::prelude::*;
use rts_core::game::{Authority, Game};
use rts_core::grid::GridRect;
use rts_core::math::Vec2Fixed;
use rts_core::movement::{advance, move_to, plan_path};
use rts_core::protocol::Action;
use rts_core::streaming::exposed_strips;
use rts_test_utils::determinism::strategies::{arb_grid_point, arb_position, arb_rect};
use rts_test_utils::determinism::{verify_determinism, verify_replica_convergence};
use rts_test_utils::fixtures::{test_config, test_player, test_unit};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn path_is_a_contiguous_walk(start in arb_position(200), target in arb_position(200)) {
        let path = plan_path(start, target, 4096).unwrap();

        prop_assert_eq!(path[0], Vec2Fixed::from_grid(start.round_to_grid()));
        prop_assert_eq!(*path.last().unwrap(), Vec2Fixed::from_grid(target.round_to_grid()));
        for pair in path.windows(2) {
            let a = pair[0].round_to_grid();
            let b = pair[1].round_to_grid();
            prop_assert_eq!(a.chebyshev_distance(b), 1);
        }
        let span = start.round_to_grid().chebyshev_distance(target.round_to_grid());
        prop_assert_eq!(path.len(), span as usize + 1);
    }

    #[test]
    fn advance_terminates_at_target(start in arb_grid_point(20), target in arb_grid_point(20)) {
        let config = test_config();
        let mut unit = test_unit(test_player("p").id, start.x, start.y);
        move_to(&mut unit, Vec2Fixed::from_grid(target), &config).unwrap();

        let mut last_step = 0;
        for _ in 0..10_000 {
            if let Some(step) = advance(&mut unit, &config) {
                prop_assert!(step.step > last_step);
                prop_assert!(step.step <= step.path.len());
                last_step = step.step;
            }
            if unit.is_idle() {
                break;
            }
        }

        prop_assert!(unit.is_idle());
        prop_assert_eq!(unit.position, Vec2Fixed::from_grid(target));
        prop_assert_eq!(unit.step, unit.path.len());
    }

    #[test]
    fn strips_cover_exactly_the_new_area(old in arb_rect(30, 20), new in arb_rect(30, 20)) {
        let strips = exposed_strips(old, new);
        for point in new.points() {
            let covered = strips.iter().any(|s| s.contains(point));
            prop_assert_eq!(covered, !old.contains(point), "point {}", point);
        }
        for strip in &strips {
            prop_assert!(!strip.is_empty());
            prop_assert_eq!(strip.intersect(&new), *strip);
        }
    }

    #[test]
    fn server_settles_units_on_their_targets(
        targets in proptest::collection::vec(arb_grid_point(6), 1..4)
    ) {
        let mut game = Game::new(test_config(), Authority::Server);
        let owner = test_player("p").id;
        let mut ids = Vec::new();
        for (i, target) in targets.iter().enumerate() {
            let unit = test_unit(owner, i as i32 * 20, 40);
            ids.push(unit.id);
            game.handle_action(&Action::AddUnit(unit));
            game.handle_action(&Action::move_start(
                ids[i],
                Vec2Fixed::from_ints(target.x + i as i32 * 20, target.y + 40),
            ));
        }

        for _ in 0..5_000 {
            game.tick();
        }

        for id in ids {
            let unit = game.store().unit(id).unwrap();
            prop_assert!(unit.is_idle());
            let occupied: Vec<_> = game
                .store()
                .tiles_by_unit_id(id)
                .iter()
                .map(|t| t.point)
                .collect();
            prop_assert_eq!(occupied, vec![unit.tile()]);
        }
    }
}

#[test]
fn replica_matches_server_after_quiescence() {
    let player = test_player("solo");
    let unit = test_unit(player.id, 0, 0);
    let id = unit.id;
    let script = vec![
        Action::PlayerInit(player),
        Action::AddUnit(unit),
        Action::move_start(id, Vec2Fixed::from_ints(-7, 3)),
    ];

    let report = verify_replica_convergence(&test_config(), &script, 2_000);
    assert!(report.converged(), "{report:?}");
    verify_determinism(&test_config(), &script, 3, report.ticks).assert_deterministic();
}

#[test]
fn empty_viewport_loads_nothing() {
    assert!(exposed_strips(GridRect::new(0, 0, 4, 4), GridRect::EMPTY).is_empty());
}
