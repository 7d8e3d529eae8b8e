use crate::Score;
use glam::IVec2;
use thiserror::Error;

/// Logical frame identifier, shared between both peers
pub type FrameId = u32;

/// Paddle movement intent for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum Intent {
    Up = -1,
    #[default]
    Hold = 0,
    Down = 1,
}

impl Intent {
    pub fn as_i8(self) -> i8 {
        self as i8
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("paddle intent must be -1, 0 or 1, got {0}")]
pub struct InvalidIntent(pub i8);

impl TryFrom<i8> for Intent {
    type Error = InvalidIntent;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Intent::Up),
            0 => Ok(Intent::Hold),
            1 => Ok(Intent::Down),
            other => Err(InvalidIntent(other)),
        }
    }
}

/// Peer-local side of the arena. `Own` is the left paddle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Own,
    Other,
}

impl Side {
    pub fn flipped(self) -> Self {
        match self {
            Side::Own => Side::Other,
            Side::Other => Side::Own,
        }
    }

    /// Scoring delta as sent on the wire: +1 when the sender's own side scored
    pub fn as_delta(self) -> i8 {
        match self {
            Side::Own => 1,
            Side::Other => -1,
        }
    }

    pub fn from_delta(delta: i8) -> Option<Self> {
        match delta {
            d if d > 0 => Some(Side::Own),
            d if d < 0 => Some(Side::Other),
            _ => None,
        }
    }
}

/// Everything the simulation knows about one frame.
///
/// Positions and speeds are fixed point (x1000). "Own" and "other" are
/// labels local to the peer holding the state; see [`SimulationState::reverse_roles`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SimulationState {
    pub frame_id: FrameId,
    pub score_self: u8,
    pub score_other: u8,
    pub pos_self: i32,
    pub dir_self: Intent,
    pub pos_other: i32,
    pub dir_other: Intent,
    pub ball_x: i32,
    pub ball_y: i32,
    pub ball_speed_x: i32,
    pub ball_speed_y: i32,
}

impl SimulationState {
    pub fn ball_position(&self) -> IVec2 {
        IVec2::new(self.ball_x, self.ball_y)
    }

    pub fn ball_velocity(&self) -> IVec2 {
        IVec2::new(self.ball_speed_x, self.ball_speed_y)
    }

    pub fn set_ball(&mut self, position: IVec2, velocity: IVec2) {
        self.ball_x = position.x;
        self.ball_y = position.y;
        self.ball_speed_x = velocity.x;
        self.ball_speed_y = velocity.y;
    }

    pub fn score(&self) -> Score {
        Score {
            own: self.score_self,
            other: self.score_other,
        }
    }

    pub fn set_score(&mut self, score: Score) {
        self.score_self = score.own;
        self.score_other = score.other;
    }

    pub fn intent(&self, side: Side) -> Intent {
        match side {
            Side::Own => self.dir_self,
            Side::Other => self.dir_other,
        }
    }

    /// Reinterpret a state received from the peer from our own point of view:
    /// swap the own/other fields and mirror the ball's horizontal direction.
    pub fn reverse_roles(&mut self) {
        self.ball_speed_x = -self.ball_speed_x;
        std::mem::swap(&mut self.score_self, &mut self.score_other);
        std::mem::swap(&mut self.pos_self, &mut self.pos_other);
        std::mem::swap(&mut self.dir_self, &mut self.dir_other);
    }

    pub fn reversed(mut self) -> Self {
        self.reverse_roles();
        self
    }
}

/// "The remote paddle's intent became `direction` as of `frame_id`"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionChange {
    pub frame_id: FrameId,
    pub direction: Intent,
}
