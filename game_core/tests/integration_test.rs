use game_core::systems::{award_point, score_situation, serve, RoundOutcome};
use game_core::*;
use glam::IVec2;

/// Local match: right paddle driven by the predictor, left paddle by a mirror
/// image predictor, serving after every point.
fn play_local(seed: u64, ticks: usize) -> (SimulationState, Vec<RoundOutcome>, Events) {
    let config = Config::new();
    let mut rng = GameRng::new(seed);
    let mut opponent = Predictor::new();
    let mut own = Predictor::new();
    let mut history = FrameHistory::new(config.history_capacity);
    let mut outcomes = Vec::new();
    let mut seen = Events::new();

    let mut seed_state = SimulationState::default();
    serve(&mut seed_state, Side::Own, &config, &mut rng);
    history.reset_with(seed_state);

    for _ in 0..ticks {
        let previous = *history.latest().unwrap();
        let mirrored = mirror(&previous, &config);
        let mut current = previous;
        current.frame_id += 1;
        current.dir_self = own.intent(&mirrored, &config, &mut rng);
        current.dir_other = opponent.intent(&previous, &config, &mut rng);

        let mut events = Events::new();
        step(&previous, &mut current, &config, &mut events);
        seen.merge(events);
        *history.duplicate_latest().unwrap() = current;

        assert!(current.pos_self >= config.paddle_min_y());
        assert!(current.pos_self <= config.paddle_max_y());
        assert!(current.pos_other >= config.paddle_min_y());
        assert!(current.pos_other <= config.paddle_max_y());
        assert!(current.ball_speed_y.abs() <= config.ball_speed_max);

        if let Some(side) = score_situation(&current, &config) {
            let mut next = current;
            let outcome = award_point(&mut next, side, &config);
            outcomes.push(outcome);
            serve(&mut next, side, &config, &mut rng);
            next.frame_id = 0;
            history.reset_with(next);
            own.reset();
            opponent.reset();
        }
    }
    (*history.latest().unwrap(), outcomes, seen)
}

/// The same frame seen from the right paddle's side of the table
fn mirror(state: &SimulationState, config: &Config) -> SimulationState {
    let mut mirrored = state.reversed();
    mirrored.ball_x = config.arena_right() - state.ball_x;
    mirrored
}

#[test]
fn test_local_match_is_reproducible() {
    let (first_state, first_outcomes, _) = play_local(99, 3_000);
    let (second_state, second_outcomes, _) = play_local(99, 3_000);
    assert_eq!(first_state, second_state);
    assert_eq!(first_outcomes, second_outcomes);
}

#[test]
fn test_local_match_has_rallies() {
    let (_, _, events) = play_local(7, 3_000);
    assert!(events.ball_hit_wall || events.ball_hit_paddle);
}

#[test]
fn test_points_accumulate_until_game_over() {
    let (_, outcomes, _) = play_local(3, 3_000);
    for outcome in outcomes {
        match outcome {
            RoundOutcome::NextRound { score } => {
                assert!(score.has_winner(5, 2).is_none());
            }
            RoundOutcome::GameOver {
                winner,
                final_score,
            } => {
                assert_eq!(final_score.has_winner(5, 2), Some(winner));
            }
        }
    }
}

#[test]
fn test_ball_reflects_off_top_wall_at_full_speed() {
    let config = Config::new();
    let mut previous = SimulationState {
        pos_self: config.center().y,
        pos_other: config.center().y,
        ..SimulationState::default()
    };
    let speed = 45;
    let one_tick = speed * config.tick_micros / 1000;
    previous.set_ball(
        IVec2::new(config.center().x, config.top_wall_y() + one_tick),
        IVec2::new(0, -speed),
    );

    let next = advance(&previous, Intent::Hold, Intent::Hold, &config);

    assert!(next.ball_speed_y > 0);
    assert_eq!(next.ball_speed_y.abs(), speed);
    assert_eq!(next.frame_id, previous.frame_id + 1);
}

#[test]
fn test_rollback_corrects_prediction_in_history() {
    let config = Config::new();
    let mut history = FrameHistory::new(config.history_capacity);
    let mut seed = SimulationState::default();
    serve(&mut seed, Side::Other, &config, &mut GameRng::new(5));
    history.reset_with(seed);

    let mut controller = RollbackController::new();
    let mut events = Events::new();
    for _ in 0..20 {
        history.duplicate_latest().unwrap();
        let slot = history.latest_slot().unwrap();
        resimulate(&mut history, slot, &config, &mut events).unwrap();
    }

    let change = DirectionChange {
        frame_id: 12,
        direction: Intent::Down,
    };
    let received = controller.receive(change, &mut history, &config).unwrap();
    assert_eq!(received, Received::Replayed { frames: 9 });

    let latest = history.latest().unwrap();
    assert_eq!(latest.dir_other, Intent::Down);
    assert_eq!(
        latest.pos_other,
        config.center().y + 9 * config.paddle_step(),
        "paddle moved for every replayed frame"
    );
}
