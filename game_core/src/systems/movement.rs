use crate::{Config, SimulationState};

/// Advance both paddles by their current intents and clamp to the arena
pub fn move_paddles(previous: &SimulationState, current: &mut SimulationState, config: &Config) {
    let step = config.paddle_step();
    current.pos_self = config.clamp_paddle_y(previous.pos_self + current.dir_self.as_i32() * step);
    current.pos_other =
        config.clamp_paddle_y(previous.pos_other + current.dir_other.as_i32() * step);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Intent;

    fn centred(config: &Config) -> SimulationState {
        SimulationState {
            pos_self: config.center().y,
            pos_other: config.center().y,
            ..SimulationState::default()
        }
    }

    #[test]
    fn test_paddles_move_by_intent() {
        let config = Config::new();
        let previous = centred(&config);
        let mut current = previous;
        current.dir_self = Intent::Down;
        current.dir_other = Intent::Up;

        move_paddles(&previous, &mut current, &config);

        assert_eq!(current.pos_self, 32_000 + 2_133);
        assert_eq!(current.pos_other, 32_000 - 2_133);
    }

    #[test]
    fn test_held_paddles_stay() {
        let config = Config::new();
        let previous = centred(&config);
        let mut current = previous;

        move_paddles(&previous, &mut current, &config);

        assert_eq!(current.pos_self, previous.pos_self);
        assert_eq!(current.pos_other, previous.pos_other);
    }

    #[test]
    fn test_paddles_clamp_to_arena() {
        let config = Config::new();
        let previous = SimulationState {
            pos_self: config.paddle_min_y() + 100,
            pos_other: config.paddle_max_y() - 100,
            ..SimulationState::default()
        };
        let mut current = previous;
        current.dir_self = Intent::Up;
        current.dir_other = Intent::Down;

        move_paddles(&previous, &mut current, &config);

        assert_eq!(current.pos_self, config.paddle_min_y());
        assert_eq!(current.pos_other, config.paddle_max_y());
    }
}
