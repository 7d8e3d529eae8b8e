use crate::{Config, Intent, Score, Side, SimulationState, UniformRandom};
use glam::IVec2;

/// Which side wins the point, if the ball has left the arena
pub fn score_situation(state: &SimulationState, config: &Config) -> Option<Side> {
    if state.ball_x > config.right_goal_x() {
        Some(Side::Own)
    } else if state.ball_x < config.left_goal_x() {
        Some(Side::Other)
    } else {
        None
    }
}

/// What happens after a settled point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Scores carry forward into the next round
    NextRound { score: Score },
    /// Match over; counters have been reset on the state
    GameOver { winner: Side, final_score: Score },
}

/// Credit `side` with a point on `state`. Ends the match when a counter
/// reaches the win score with the required lead.
pub fn award_point(state: &mut SimulationState, side: Side, config: &Config) -> RoundOutcome {
    let mut score = state.score();
    score.increment(side);

    match score.has_winner(config.win_score, config.win_lead) {
        Some(winner) => {
            state.set_score(Score::new());
            RoundOutcome::GameOver {
                winner,
                final_score: score,
            }
        }
        None => {
            state.set_score(score);
            RoundOutcome::NextRound { score }
        }
    }
}

/// Put the ball back in play from the arena centre with both paddles centred.
///
/// The serve angle is drawn from a cone pointed at `toward`: right for the
/// opponent's side, left for our own.
pub fn serve(
    state: &mut SimulationState,
    toward: Side,
    config: &Config,
    rng: &mut impl UniformRandom,
) {
    let spread = config.serve_spread_degrees;
    let base = match toward {
        Side::Other => -spread / 2,
        Side::Own => 180 - spread / 2,
    };
    let angle = f64::from(base + rng.uniform(0, spread)).to_radians();
    let speed = f64::from(config.ball_serve_speed);
    let velocity = IVec2::new((speed * angle.cos()) as i32, (speed * angle.sin()) as i32);

    let center = config.center();
    state.pos_self = center.y;
    state.pos_other = center.y;
    state.dir_self = Intent::Hold;
    state.dir_other = Intent::Hold;
    state.set_ball(center, velocity);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameRng;

    fn setup() -> (Config, SimulationState, GameRng) {
        let config = Config::new();
        let state = SimulationState::default();
        let rng = GameRng::new(12345); // Fixed seed for deterministic tests
        (config, state, rng)
    }

    #[test]
    fn test_own_side_scores_when_ball_exits_right() {
        let (config, mut state, _) = setup();
        state.ball_x = config.right_goal_x() + 1;
        assert_eq!(score_situation(&state, &config), Some(Side::Own));
    }

    #[test]
    fn test_other_side_scores_when_ball_exits_left() {
        let (config, mut state, _) = setup();
        state.ball_x = config.left_goal_x() - 1;
        assert_eq!(score_situation(&state, &config), Some(Side::Other));
    }

    #[test]
    fn test_no_score_inside_goal_lines() {
        let (config, mut state, _) = setup();
        for x in [config.left_goal_x(), 0, 64_000, config.right_goal_x()] {
            state.ball_x = x;
            assert_eq!(score_situation(&state, &config), None, "ball at {x}");
        }
    }

    #[test]
    fn test_award_point_carries_score_forward() {
        let (config, mut state, _) = setup();
        state.score_self = 2;

        let outcome = award_point(&mut state, Side::Other, &config);

        assert_eq!(
            outcome,
            RoundOutcome::NextRound {
                score: Score { own: 2, other: 1 }
            }
        );
        assert_eq!((state.score_self, state.score_other), (2, 1));
    }

    #[test]
    fn test_award_point_ends_match_and_resets_counters() {
        let (config, mut state, _) = setup();
        state.score_self = 4;

        let outcome = award_point(&mut state, Side::Own, &config);

        assert_eq!(
            outcome,
            RoundOutcome::GameOver {
                winner: Side::Own,
                final_score: Score { own: 5, other: 0 }
            }
        );
        assert_eq!((state.score_self, state.score_other), (0, 0));
    }

    #[test]
    fn test_award_point_needs_two_point_lead() {
        let (config, mut state, _) = setup();
        state.score_self = 4;
        state.score_other = 4;

        assert!(matches!(
            award_point(&mut state, Side::Other, &config),
            RoundOutcome::NextRound { .. }
        ));
        assert!(matches!(
            award_point(&mut state, Side::Other, &config),
            RoundOutcome::GameOver {
                winner: Side::Other,
                ..
            }
        ));
    }

    #[test]
    fn test_serve_toward_other_side() {
        let (config, mut state, mut rng) = setup();
        for _ in 0..50 {
            serve(&mut state, Side::Other, &config, &mut rng);
            assert_eq!(state.ball_position(), config.center());
            assert!(state.ball_speed_x > 0, "ball heads right");
            assert!(state.ball_speed_y.abs() <= 22);
        }
    }

    #[test]
    fn test_serve_toward_own_side_centres_paddles() {
        let (config, mut state, mut rng) = setup();
        state.pos_self = config.paddle_min_y();
        state.dir_other = Intent::Down;

        serve(&mut state, Side::Own, &config, &mut rng);

        assert!(state.ball_speed_x < 0, "ball heads left");
        assert_eq!(state.pos_self, config.center().y);
        assert_eq!(state.pos_other, config.center().y);
        assert_eq!(state.dir_other, Intent::Hold);
    }
}
