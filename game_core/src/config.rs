use crate::Params;
use glam::IVec2;

/// Game configuration
///
/// Geometry is stored in display units; the helper methods return fixed-point
/// values ready for the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub arena_width: i32,
    pub arena_height: i32,
    pub paddle_width: i32,
    pub paddle_height: i32,
    pub paddle_speed: i32,
    pub ball_radius: i32,
    pub ball_serve_speed: i32,
    pub ball_speed_max: i32,
    pub serve_spread_degrees: i32,
    pub win_score: u8,
    pub win_lead: u8,
    pub tick_micros: i32,
    pub history_capacity: usize,
    pub score_ack_timeout_ticks: u32,
    pub handoff_timeout_ticks: u32,
    pub ai_error: i32,
    pub ai_reaction_micros: i32,
    pub ai_foresee_micros: i32,
    pub ai_dead_zone: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            arena_width: Params::ARENA_WIDTH,
            arena_height: Params::ARENA_HEIGHT,
            paddle_width: Params::PADDLE_WIDTH,
            paddle_height: Params::PADDLE_HEIGHT,
            paddle_speed: Params::PADDLE_SPEED,
            ball_radius: Params::BALL_RADIUS,
            ball_serve_speed: Params::BALL_SERVE_SPEED,
            ball_speed_max: Params::BALL_SPEED_MAX,
            serve_spread_degrees: Params::SERVE_SPREAD_DEGREES,
            win_score: Params::WIN_SCORE,
            win_lead: Params::WIN_LEAD,
            tick_micros: Params::TICK_MICROS,
            history_capacity: Params::HISTORY_CAPACITY,
            score_ack_timeout_ticks: Params::SCORE_ACK_TIMEOUT_TICKS,
            handoff_timeout_ticks: Params::HANDOFF_TIMEOUT_TICKS,
            ai_error: Params::AI_ERROR,
            ai_reaction_micros: Params::AI_REACTION_MICROS,
            ai_foresee_micros: Params::AI_FORESEE_MICROS,
            ai_dead_zone: Params::AI_DEAD_ZONE,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowest legal paddle centre
    pub fn paddle_min_y(&self) -> i32 {
        self.paddle_height * Params::FIXED_POINT / 2
    }

    /// Highest legal paddle centre
    pub fn paddle_max_y(&self) -> i32 {
        (self.arena_height - self.paddle_height / 2) * Params::FIXED_POINT
    }

    /// Clamp paddle Y to arena bounds
    pub fn clamp_paddle_y(&self, y: i32) -> i32 {
        y.clamp(self.paddle_min_y(), self.paddle_max_y())
    }

    /// Distance a paddle covers in one tick at full intent
    pub fn paddle_step(&self) -> i32 {
        self.tick_micros * self.paddle_speed / 1000
    }

    /// Line the ball centre bounces on at the top wall
    pub fn top_wall_y(&self) -> i32 {
        self.ball_radius * Params::FIXED_POINT
    }

    /// Line the ball centre bounces on at the bottom wall
    pub fn bottom_wall_y(&self) -> i32 {
        (self.arena_height - self.ball_radius) * Params::FIXED_POINT
    }

    pub fn arena_right(&self) -> i32 {
        self.arena_width * Params::FIXED_POINT
    }

    /// X of the line the ball centre hits on the local (left) paddle face
    pub fn own_face_x(&self) -> i32 {
        (self.paddle_width + self.ball_radius) * Params::FIXED_POINT
    }

    /// X of the line the ball centre hits on the opponent (right) paddle face
    pub fn other_face_x(&self) -> i32 {
        (self.arena_width - self.paddle_width - self.ball_radius) * Params::FIXED_POINT
    }

    /// X of the opponent paddle's front plane, used for interception
    pub fn other_paddle_plane_x(&self) -> i32 {
        (self.arena_width - self.paddle_width) * Params::FIXED_POINT
    }

    /// Half extent of a paddle face segment, widened by the ball radius
    pub fn paddle_reach(&self) -> i32 {
        self.paddle_height * Params::FIXED_POINT / 2 + self.ball_radius * Params::FIXED_POINT
    }

    /// Ball X beyond which the local side wins the point
    pub fn right_goal_x(&self) -> i32 {
        (self.arena_width + self.ball_radius) * Params::FIXED_POINT
    }

    /// Ball X below which the opponent wins the point
    pub fn left_goal_x(&self) -> i32 {
        -self.ball_radius * Params::FIXED_POINT
    }

    pub fn center(&self) -> IVec2 {
        IVec2::new(
            self.arena_width * Params::FIXED_POINT / 2,
            self.arena_height * Params::FIXED_POINT / 2,
        )
    }
}
