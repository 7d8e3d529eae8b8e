/// Game tuning parameters for Pong
///
/// Lengths are display units; the simulation works in fixed point
/// (`FIXED_POINT` sub-units per display unit). Speeds are display units per second.
#[derive(Debug, Clone, Copy)]
pub struct Params;

impl Params {
    pub const FIXED_POINT: i32 = 1000;

    // Arena
    pub const ARENA_WIDTH: i32 = 128;
    pub const ARENA_HEIGHT: i32 = 64;

    // Paddle
    pub const PADDLE_WIDTH: i32 = 3;
    pub const PADDLE_HEIGHT: i32 = 8;
    pub const PADDLE_SPEED: i32 = 64;

    // Ball
    pub const BALL_RADIUS: i32 = 2;
    pub const BALL_SERVE_SPEED: i32 = 45;
    pub const BALL_SPEED_MAX: i32 = 180;
    pub const SERVE_SPREAD_DEGREES: i32 = 60;

    // Score
    pub const WIN_SCORE: u8 = 5;
    pub const WIN_LEAD: u8 = 2;

    // Timing (30 fps)
    pub const TICK_MICROS: i32 = 33_333;
    pub const HISTORY_CAPACITY: usize = 100; // ~3.3 s
    pub const SCORE_ACK_TIMEOUT_TICKS: u32 = 90;
    pub const HANDOFF_TIMEOUT_TICKS: u32 = 300;

    // Predictive controller
    pub const AI_ERROR: i32 = 80;
    pub const AI_REACTION_MICROS: i32 = 500_000;
    pub const AI_FORESEE_MICROS: i32 = 1_000_000;
    pub const AI_DEAD_ZONE: i32 = 5_000;
}
