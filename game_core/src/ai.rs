use crate::systems::{vertical_hit, Sweep};
use crate::{Config, Intent, SimulationState, UniformRandom};
use glam::IVec2;

/// Reflect `y` back into `top..=bottom` until it lands inside
fn fold_into_band(mut y: i32, top: i32, bottom: i32) -> i32 {
    loop {
        if y < top {
            y = 2 * top - y;
        } else if y > bottom {
            y = 2 * bottom - y;
        } else {
            return y;
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Prediction {
    velocity: IVec2,
    elapsed: i32,
    target: i32,
}

/// Computer opponent for the right paddle.
///
/// Predicts where the ball will cross the paddle plane, with an error that
/// shrinks as the ball approaches, and keeps that guess until the ball
/// changes direction or the reaction time runs out.
#[derive(Debug, Clone, Default)]
pub struct Predictor {
    cache: Option<Prediction>,
}

impl Predictor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.cache = None;
    }

    /// Intent for the opponent paddle given the last confirmed frame
    pub fn intent(
        &mut self,
        previous: &SimulationState,
        config: &Config,
        rng: &mut impl UniformRandom,
    ) -> Intent {
        let velocity = previous.ball_velocity();
        let receding = previous.ball_x < config.other_paddle_plane_x() && velocity.x < 0;
        let behind = previous.ball_x > config.arena_right() && velocity.x > 0;
        if receding || behind {
            return Intent::Hold;
        }

        let target = match self.reuse(velocity, config) {
            Some(target) => Some(target),
            None => self.predict(previous, config, rng),
        };

        let position = previous.pos_other;
        match target {
            Some(y) if y < position - config.ai_dead_zone => Intent::Up,
            Some(y) if y > position + config.ai_dead_zone => Intent::Down,
            _ => Intent::Hold,
        }
    }

    fn reuse(&mut self, velocity: IVec2, config: &Config) -> Option<i32> {
        let cached = self.cache.as_mut()?;
        let same_heading =
            cached.velocity.x * velocity.x > 0 && cached.velocity.y * velocity.y > 0;
        if !same_heading || cached.elapsed >= config.ai_reaction_micros {
            return None;
        }
        cached.elapsed += config.tick_micros;
        Some(cached.target)
    }

    fn predict(
        &mut self,
        previous: &SimulationState,
        config: &Config,
        rng: &mut impl UniformRandom,
    ) -> Option<i32> {
        let sweep = Sweep::of(previous);
        let plane = config.other_paddle_plane_x();
        let Some(t) = vertical_hit(plane, -10_000_000, 10_000_000, sweep, config.ai_foresee_micros)
        else {
            self.cache = None;
            return None;
        };

        let crossing = sweep.origin.y + t * sweep.velocity.y / 1000;
        let exact = fold_into_band(crossing, config.top_wall_y(), config.bottom_wall_y());

        let remaining = if sweep.velocity.x < 0 {
            previous.ball_x - config.arena_right()
        } else {
            plane - previous.ball_x
        };
        let error = (config.ai_error * (remaining / config.arena_width)).abs();
        let target = exact + rng.uniform(-error, error);

        self.cache = Some(Prediction {
            velocity: sweep.velocity,
            elapsed: 0,
            target,
        });
        Some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameRng;

    fn approaching(config: &Config, y: i32, speed_y: i32) -> SimulationState {
        let mut state = SimulationState {
            pos_self: config.center().y,
            pos_other: config.center().y,
            ..SimulationState::default()
        };
        state.set_ball(IVec2::new(124_000, y), IVec2::new(45, speed_y));
        state
    }

    #[test]
    fn test_fold_into_band() {
        assert_eq!(fold_into_band(30_000, 2_000, 62_000), 30_000);
        assert_eq!(fold_into_band(-1_000, 2_000, 62_000), 5_000);
        assert_eq!(fold_into_band(70_000, 2_000, 62_000), 54_000);
        assert_eq!(fold_into_band(130_000, 2_000, 62_000), 10_000, "two reflections");
    }

    #[test]
    fn test_holds_while_ball_recedes() {
        let config = Config::new();
        let mut predictor = Predictor::new();
        let mut rng = GameRng::new(1);
        let mut state = approaching(&config, 60_000, 0);
        state.ball_speed_x = -45;
        state.ball_x = 64_000;

        assert_eq!(predictor.intent(&state, &config, &mut rng), Intent::Hold);
    }

    #[test]
    fn test_moves_toward_predicted_crossing() {
        let config = Config::new();
        let mut rng = GameRng::new(1);

        let low = approaching(&config, 50_000, 10);
        assert_eq!(Predictor::new().intent(&low, &config, &mut rng), Intent::Down);

        let high = approaching(&config, 12_000, -10);
        assert_eq!(Predictor::new().intent(&high, &config, &mut rng), Intent::Up);
    }

    #[test]
    fn test_holds_inside_dead_zone() {
        let config = Config::new();
        let mut rng = GameRng::new(1);
        let level = approaching(&config, 32_000, 0);
        assert_eq!(Predictor::new().intent(&level, &config, &mut rng), Intent::Hold);
    }

    #[test]
    fn test_holds_without_interception() {
        let config = Config::new();
        let mut rng = GameRng::new(1);
        let mut far = approaching(&config, 50_000, 10);
        far.ball_x = 0;
        far.ball_speed_x = 1;
        assert_eq!(Predictor::new().intent(&far, &config, &mut rng), Intent::Hold);
    }

    #[test]
    fn test_failed_prediction_drops_cached_target() {
        let config = Config::new();
        let mut rng = GameRng::new(1);
        let mut predictor = Predictor::new();
        let mut state = approaching(&config, 50_000, 10);
        assert_eq!(predictor.intent(&state, &config, &mut rng), Intent::Down);

        // Out of reach and heading changed: recomputed, nothing found
        state.ball_x = 0;
        state.ball_speed_y = -10;
        assert_eq!(predictor.intent(&state, &config, &mut rng), Intent::Hold);

        // Back on the first heading, still out of reach
        state.ball_speed_y = 10;
        assert_eq!(predictor.intent(&state, &config, &mut rng), Intent::Hold);
    }

    #[test]
    fn test_prediction_reused_until_heading_changes() {
        let config = Config::new();
        let mut rng = GameRng::new(1);
        let mut predictor = Predictor::new();
        let mut state = approaching(&config, 50_000, 10);
        assert_eq!(predictor.intent(&state, &config, &mut rng), Intent::Down);

        // Same heading: the stale low prediction is kept
        state.ball_y = 10_000;
        assert_eq!(predictor.intent(&state, &config, &mut rng), Intent::Down);

        // Heading flipped: recomputed from the new position
        state.ball_speed_y = -10;
        assert_eq!(predictor.intent(&state, &config, &mut rng), Intent::Up);
    }

    #[test]
    fn test_prediction_expires_after_reaction_time() {
        let config = Config::new();
        let mut rng = GameRng::new(1);
        let mut predictor = Predictor::new();
        let mut state = approaching(&config, 50_000, 10);
        predictor.intent(&state, &config, &mut rng);

        state.ball_y = 10_000;
        let reuses = config.ai_reaction_micros / config.tick_micros + 1;
        for _ in 0..reuses {
            assert_eq!(predictor.intent(&state, &config, &mut rng), Intent::Down);
        }
        assert_eq!(predictor.intent(&state, &config, &mut rng), Intent::Up, "recomputed");
    }
}
