use crate::Side;
use rand::Rng;

/// Game score tracking, from the local peer's point of view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub own: u8,
    pub other: u8,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, side: Side) {
        match side {
            Side::Own => self.own = self.own.saturating_add(1),
            Side::Other => self.other = self.other.saturating_add(1),
        }
    }

    /// A side wins once it reaches `win_score` and leads by at least `lead`
    pub fn has_winner(&self, win_score: u8, lead: u8) -> Option<Side> {
        if self.own >= win_score && self.own >= self.other.saturating_add(lead) {
            Some(Side::Own)
        } else if self.other >= win_score && self.other >= self.own.saturating_add(lead) {
            Some(Side::Other)
        } else {
            None
        }
    }
}

/// Source of uniformly distributed integers in `[min, max)`
pub trait UniformRandom {
    /// Returns `min` when the range is empty
    fn uniform(&mut self, min: i32, max: i32) -> i32;
}

/// Random number generator
pub struct GameRng(pub rand::rngs::StdRng);

impl GameRng {
    pub fn new(seed: u64) -> Self {
        use rand::SeedableRng;
        Self(rand::rngs::StdRng::seed_from_u64(seed))
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::new(12345)
    }
}

impl UniformRandom for GameRng {
    fn uniform(&mut self, min: i32, max: i32) -> i32 {
        if min >= max {
            min
        } else {
            self.0.gen_range(min..max)
        }
    }
}

/// Events that occurred during the last simulated frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Events {
    pub ball_hit_paddle: bool,
    pub ball_hit_wall: bool,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.ball_hit_paddle = false;
        self.ball_hit_wall = false;
    }

    pub fn merge(&mut self, other: Events) {
        self.ball_hit_paddle |= other.ball_hit_paddle;
        self.ball_hit_wall |= other.ball_hit_wall;
    }
}
