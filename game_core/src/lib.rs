pub mod ai;
pub mod config;
pub mod consensus;
pub mod error;
pub mod history;
pub mod params;
pub mod resources;
pub mod rollback;
pub mod state;
pub mod systems;

pub use ai::*;
pub use config::*;
pub use consensus::*;
pub use error::*;
pub use history::*;
pub use params::*;
pub use resources::*;
pub use rollback::*;
pub use state::*;

use systems::*;

/// Run one deterministic simulation step.
///
/// `current` must already carry the intents for its frame; paddles and ball
/// are recomputed from `previous`. Identical inputs always produce identical
/// output.
pub fn step(
    previous: &SimulationState,
    current: &mut SimulationState,
    config: &Config,
    events: &mut Events,
) {
    // Clear events at start of frame
    events.clear();

    // 1. Move paddles based on intents
    move_paddles(previous, current, config);

    // 2. Move ball, resolving at most one collision
    move_ball(previous, current, config, events);
}

/// Produce the frame after `previous` for the given intents
pub fn advance(
    previous: &SimulationState,
    own: Intent,
    other: Intent,
    config: &Config,
) -> SimulationState {
    let mut next = SimulationState {
        frame_id: previous.frame_id.wrapping_add(1),
        dir_self: own,
        dir_other: other,
        ..*previous
    };
    step(previous, &mut next, config, &mut Events::new());
    next
}
