use crate::{Config, Events, Intent, SimulationState};
use glam::IVec2;

/// Linear path of the ball centre: fixed-point origin, velocity in fixed-point
/// units per millisecond (display units per second)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sweep {
    pub origin: IVec2,
    pub velocity: IVec2,
}

impl Sweep {
    pub fn of(state: &SimulationState) -> Self {
        Self {
            origin: state.ball_position(),
            velocity: state.ball_velocity(),
        }
    }

    /// Position after `micros` microseconds
    pub fn at(&self, micros: i32) -> IVec2 {
        self.origin + self.velocity * micros / 1000
    }
}

/// Obstacles the ball can meet during a tick, in resolution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Obstacle {
    TopWall,
    BottomWall,
    OwnPaddle,
    OtherPaddle,
}

/// Microseconds until `start` moving at `speed` reaches `target`, if that
/// happens within `window`
fn crossing_time(target: i32, start: i32, speed: i32, window: i32) -> Option<i64> {
    if speed == 0 {
        return None;
    }
    let t = (i64::from(target) - i64::from(start)) * 1000 / i64::from(speed);
    (0..=i64::from(window)).contains(&t).then_some(t)
}

fn travel(start: i32, speed: i32, micros: i64) -> i64 {
    i64::from(start) + micros * i64::from(speed) / 1000
}

/// Crossing time with the horizontal segment `y`, `x_min..=x_max`
pub fn horizontal_hit(x_min: i32, y: i32, x_max: i32, sweep: Sweep, window: i32) -> Option<i32> {
    let t = crossing_time(y, sweep.origin.y, sweep.velocity.y, window)?;
    let x = travel(sweep.origin.x, sweep.velocity.x, t);
    (i64::from(x_min)..=i64::from(x_max))
        .contains(&x)
        .then_some(t as i32)
}

/// Crossing time with the vertical segment `x`, `y_min..=y_max`
pub fn vertical_hit(x: i32, y_min: i32, y_max: i32, sweep: Sweep, window: i32) -> Option<i32> {
    let t = crossing_time(x, sweep.origin.x, sweep.velocity.x, window)?;
    let y = travel(sweep.origin.y, sweep.velocity.y, t);
    (i64::from(y_min)..=i64::from(y_max))
        .contains(&y)
        .then_some(t as i32)
}

/// First obstacle the ball meets this tick. Paddle faces are placed where the
/// paddles were at the start of the tick. At most one collision is resolved.
pub fn find_collision(previous: &SimulationState, config: &Config) -> Option<(Obstacle, i32)> {
    let sweep = Sweep::of(previous);
    let tick = config.tick_micros;
    let reach = config.paddle_reach();

    if sweep.velocity.y < 0 {
        if let Some(t) = horizontal_hit(0, config.top_wall_y(), config.arena_right(), sweep, tick) {
            return Some((Obstacle::TopWall, t));
        }
    }
    if sweep.velocity.y > 0 {
        if let Some(t) =
            horizontal_hit(0, config.bottom_wall_y(), config.arena_right(), sweep, tick)
        {
            return Some((Obstacle::BottomWall, t));
        }
    }
    if sweep.velocity.x < 0 {
        let y = previous.pos_self;
        if let Some(t) = vertical_hit(config.own_face_x(), y - reach, y + reach, sweep, tick) {
            return Some((Obstacle::OwnPaddle, t));
        }
    }
    if sweep.velocity.x > 0 {
        let y = previous.pos_other;
        if let Some(t) = vertical_hit(config.other_face_x(), y - reach, y + reach, sweep, tick) {
            return Some((Obstacle::OtherPaddle, t));
        }
    }
    None
}

/// Scale the reflected vertical speed by the paddle's movement: half when the
/// paddle moves against it, one and a half when with it.
pub fn paddle_english(speed_y: i32, paddle: Intent, max_speed: i32) -> i32 {
    let speed = match paddle {
        Intent::Down if speed_y < 0 => speed_y / 2,
        Intent::Down => speed_y * 3 / 2,
        Intent::Up if speed_y > 0 => speed_y / 2,
        Intent::Up => speed_y * 3 / 2,
        Intent::Hold => speed_y,
    };
    speed.clamp(-max_speed, max_speed)
}

/// Move the ball through one tick, bouncing off the first obstacle it meets.
///
/// Integration is split at the collision time: the ball travels to the
/// contact point with its old velocity and covers the rest of the tick with
/// the new one.
pub fn move_ball(
    previous: &SimulationState,
    current: &mut SimulationState,
    config: &Config,
    events: &mut Events,
) {
    let sweep = Sweep::of(previous);
    let tick = config.tick_micros;
    let mut velocity = sweep.velocity;
    let mut hit_time = tick;

    if let Some((obstacle, t)) = find_collision(previous, config) {
        hit_time = t;
        match obstacle {
            Obstacle::TopWall | Obstacle::BottomWall => {
                velocity.y = -velocity.y;
                events.ball_hit_wall = true;
            }
            Obstacle::OwnPaddle => {
                velocity.x = -velocity.x;
                velocity.y = paddle_english(velocity.y, current.dir_self, config.ball_speed_max);
                events.ball_hit_paddle = true;
            }
            Obstacle::OtherPaddle => {
                velocity.x = -velocity.x;
                velocity.y = paddle_english(velocity.y, current.dir_other, config.ball_speed_max);
                events.ball_hit_paddle = true;
            }
        }
    }

    let contact = sweep.at(hit_time);
    let position = contact + velocity * (tick - hit_time) / 1000;
    current.set_ball(position, velocity);
}
