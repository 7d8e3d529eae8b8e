use crate::convert::{from_counters, from_snapshot, intent, to_counters, to_snapshot};
use crate::{
    Fault, IntentSource, LatencyEstimate, LinkDirection, Result, SessionError, Transport,
};
use game_core::systems::{award_point, score_situation, serve, RoundOutcome};
use game_core::{
    resimulate, AckOutcome, Config, DirectionChange, Events, FinalScore, FrameHistory, FrameId,
    GameRng, Predictor, Received, Role, RollbackController, Score, ScoreNotice, ScoringProtocol,
    Side, SimulationState,
};
use proto::{FrameReader, Message};
use tracing::{debug, error, info, trace, warn};

/// Who the other paddle belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Against the predictive controller, no peer
    Local,
    Networked(Role),
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub game: Config,
    pub mode: Mode,
    pub seed: u64,
}

impl SessionConfig {
    pub fn local(seed: u64) -> Self {
        Self {
            game: Config::new(),
            mode: Mode::Local,
            seed,
        }
    }

    pub fn networked(role: Role, seed: u64) -> Self {
        Self {
            game: Config::new(),
            mode: Mode::Networked(role),
            seed,
        }
    }
}

/// Round lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Authority sent the opening state and waits for the follower to adopt it
    AwaitingStateAck { waited: u32 },
    /// Follower waits for the authority's opening state
    AwaitingFullState { waited: u32 },
    Playing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOver {
    pub winner: Side,
    pub final_score: Score,
}

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The session is waiting for the round-start handoff
    pub handoff: bool,
    /// Newest frame after the tick
    pub frame_id: Option<FrameId>,
    /// Frames recomputed because of remote direction changes
    pub replayed: usize,
    pub events: Events,
    /// Side that won a point settled this tick
    pub point: Option<Side>,
    pub game_over: Option<GameOver>,
}

/// Connection to the other peer
pub struct Link {
    transport: Box<dyn Transport>,
    latency: Box<dyn LatencyEstimate>,
    reader: FrameReader,
}

impl Link {
    pub fn new(transport: Box<dyn Transport>, latency: Box<dyn LatencyEstimate>) -> Self {
        Self {
            transport,
            latency,
            reader: FrameReader::new(),
        }
    }

    fn send(&mut self, message: &Message) -> Result<()> {
        let bytes = message.to_bytes()?;
        self.transport.send(&bytes)?;
        trace!(tag = message.tag(), len = bytes.len(), "sent");
        Ok(())
    }

    fn next_message(&mut self) -> Result<Option<Message>> {
        while let Some(bytes) = self.transport.poll() {
            self.reader.extend(&bytes);
        }
        Ok(self.reader.next_message()?)
    }
}

/// Peer messages acted on after the frame is stepped
#[derive(Debug, Default)]
struct Inbox {
    ack: Option<ScoreNotice>,
    final_score: Option<Side>,
}

/// One peer's side of a match.
///
/// Owns the frame history and every piece of protocol state; the host calls
/// [`Session::tick`] once per frame and renders [`Session::latest_state`].
pub struct Session {
    game: Config,
    mode: Mode,
    history: FrameHistory,
    rollback: RollbackController,
    scoring: ScoringProtocol,
    predictor: Predictor,
    rng: GameRng,
    intents: Box<dyn IntentSource>,
    link: Option<Link>,
    phase: RoundPhase,
    serve_toward: Side,
}

impl Session {
    pub fn new(
        config: SessionConfig,
        intents: Box<dyn IntentSource>,
        link: Option<Link>,
    ) -> Result<Self> {
        let role = match (config.mode, link.is_some()) {
            (Mode::Local, false) => Role::Authority,
            (Mode::Networked(role), true) => role,
            (Mode::Local, true) => {
                return Err(SessionError::Config("local session given a peer link"))
            }
            (Mode::Networked(_), false) => {
                return Err(SessionError::Config("networked session needs a peer link"))
            }
        };

        // Resimulating the newest frame needs its predecessor retained
        if config.game.history_capacity < 2 {
            return Err(SessionError::Config("history must hold at least two frames"));
        }

        let mut session = Self {
            history: FrameHistory::new(config.game.history_capacity),
            game: config.game,
            mode: config.mode,
            rollback: RollbackController::new(),
            scoring: ScoringProtocol::new(role),
            predictor: Predictor::new(),
            rng: GameRng::new(config.seed),
            intents,
            link,
            phase: RoundPhase::Playing,
            serve_toward: Side::Own,
        };
        session.start_round()?;
        Ok(session)
    }

    /// Game against the predictive controller
    pub fn local(game: Config, seed: u64, intents: Box<dyn IntentSource>) -> Result<Self> {
        let config = SessionConfig {
            game,
            mode: Mode::Local,
            seed,
        };
        Self::new(config, intents, None)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn config(&self) -> &Config {
        &self.game
    }

    pub fn history(&self) -> &FrameHistory {
        &self.history
    }

    #[cfg(test)]
    pub(crate) fn history_mut(&mut self) -> &mut FrameHistory {
        &mut self.history
    }

    /// Tag of an unknown message the peer stream is stuck on
    pub fn stalled_tag(&self) -> Option<u8> {
        self.link.as_ref().and_then(|link| link.reader.stalled_tag())
    }

    /// Newest frame, for rendering
    pub fn latest_state(&self) -> Option<&SimulationState> {
        self.history.latest().ok()
    }

    pub fn score(&self) -> Score {
        self.latest_state()
            .map(SimulationState::score)
            .unwrap_or_default()
    }

    /// Advance the session by one frame.
    ///
    /// Any error means the session cannot continue; the host should drop it
    /// and build a new one.
    pub fn tick(&mut self) -> Result<TickReport> {
        let result = match self.phase {
            RoundPhase::AwaitingStateAck { waited } => self.await_state_ack(waited),
            RoundPhase::AwaitingFullState { waited } => self.await_full_state(waited),
            RoundPhase::Playing => self.play(),
        };
        match result {
            Ok(mut report) => {
                report.handoff = self.phase != RoundPhase::Playing;
                Ok(report)
            }
            Err(err) => {
                error!(
                    %err,
                    phase = ?self.phase,
                    retained = ?self.history.frame_range(),
                    "session fault"
                );
                Err(err)
            }
        }
    }

    /// Reset per-round state and put the ball in play (or wait for the
    /// authority to do so)
    fn start_round(&mut self) -> Result<()> {
        let score = self.score();
        self.rollback.reset();
        self.scoring.reset();
        self.predictor.reset();

        if self.scoring.role() == Role::Follower {
            self.phase = RoundPhase::AwaitingFullState { waited: 0 };
            debug!("waiting for the round-start state");
            return Ok(());
        }

        let mut opening = SimulationState::default();
        opening.set_score(score);
        serve(&mut opening, self.serve_toward, &self.game, &mut self.rng);
        self.history.reset_with(opening);
        info!(
            own = score.own,
            other = score.other,
            toward = ?self.serve_toward,
            "round started"
        );

        if self.link.is_some() {
            self.send(&Message::FullState(to_snapshot(&opening)))?;
            self.phase = RoundPhase::AwaitingStateAck { waited: 0 };
        } else {
            self.phase = RoundPhase::Playing;
        }
        Ok(())
    }

    fn await_state_ack(&mut self, waited: u32) -> Result<TickReport> {
        while let Some(message) = self.next_message()? {
            if message == Message::StateAck {
                self.fast_forward()?;
                self.phase = RoundPhase::Playing;
                return Ok(self.idle_report());
            }
            debug!(tag = message.tag(), "discarding message from the previous round");
        }
        self.phase = RoundPhase::AwaitingStateAck {
            waited: self.count_wait(waited)?,
        };
        Ok(self.idle_report())
    }

    fn await_full_state(&mut self, waited: u32) -> Result<TickReport> {
        while let Some(message) = self.next_message()? {
            let snapshot = match message {
                Message::FullState(snapshot) => snapshot,
                other => {
                    debug!(tag = other.tag(), "discarding message from the previous round");
                    continue;
                }
            };
            let opening = from_snapshot(&snapshot)?.reversed();
            self.history.reset_with(opening);
            self.send(&Message::StateAck)?;
            self.phase = RoundPhase::Playing;
            info!(
                frame = opening.frame_id,
                own = opening.score_self,
                other = opening.score_other,
                "round started"
            );
            return Ok(self.idle_report());
        }
        self.phase = RoundPhase::AwaitingFullState {
            waited: self.count_wait(waited)?,
        };
        Ok(self.idle_report())
    }

    fn count_wait(&self, waited: u32) -> Result<u32> {
        let waited = waited.saturating_add(1);
        if waited > self.game.handoff_timeout_ticks {
            return Err(Fault::HandoffTimeout {
                ticks: self.game.handoff_timeout_ticks,
            }
            .into());
        }
        Ok(waited)
    }

    /// Catch up with the follower, which started playing one link latency
    /// before the ack reached us
    fn fast_forward(&mut self) -> Result<usize> {
        let latency = self
            .link
            .as_ref()
            .map(|link| link.latency.one_way_latency(LinkDirection::Receiving))
            .unwrap_or_default();
        let tick = u128::from(self.game.tick_micros.unsigned_abs().max(1));
        let frames = latency.as_micros() / tick;
        // The ack cannot have been in flight longer than the handoff allows
        if frames > u128::from(self.game.handoff_timeout_ticks) {
            return Err(Fault::HandoffTimeout {
                ticks: self.game.handoff_timeout_ticks,
            }
            .into());
        }
        let frames = frames as usize;

        let mut events = Events::new();
        for _ in 0..frames {
            self.history.duplicate_latest()?;
            let slot = self.history.latest_slot()?;
            resimulate(&mut self.history, slot, &self.game, &mut events)?;
        }
        debug!(frames, "fast-forwarded after handoff");
        Ok(frames)
    }

    fn play(&mut self) -> Result<TickReport> {
        let previous = *self.history.latest()?;
        let local = self.intents.sample_local_intent();
        let computer = match self.mode {
            Mode::Local => Some(self.predictor.intent(&previous, &self.game, &mut self.rng)),
            Mode::Networked(_) => None,
        };

        let current = {
            let current = self.history.duplicate_latest()?;
            current.dir_self = local;
            if let Some(intent) = computer {
                current.dir_other = intent;
            }
            *current
        };
        let mut report = TickReport {
            frame_id: Some(current.frame_id),
            ..TickReport::default()
        };

        let mut inbox = Inbox::default();
        if self.link.is_some() {
            if let Some(change) = self.rollback.local_intent(&previous, &current) {
                self.send(&Message::DirectionChange {
                    frame_id: change.frame_id,
                    direction: change.direction.as_i8(),
                })?;
            }
            report.replayed += self.rollback.drain_due(&mut self.history, &self.game)?;
            inbox = self.drain_messages(current.frame_id, &mut report)?;
        }

        let slot = self.history.latest_slot()?;
        resimulate(&mut self.history, slot, &self.game, &mut report.events)?;
        let latest = *self.history.latest()?;

        let point = match self.mode {
            Mode::Local => score_situation(&latest, &self.game),
            Mode::Networked(Role::Authority) => self.authority_scoring(&latest, inbox.ack)?,
            Mode::Networked(Role::Follower) => inbox.final_score,
        };
        if let Some(side) = point {
            self.settle(side, &mut report)?;
        }
        Ok(report)
    }

    /// Handle everything the peer sent, in order
    fn drain_messages(&mut self, frame_id: FrameId, report: &mut TickReport) -> Result<Inbox> {
        let mut inbox = Inbox::default();
        let role = self.scoring.role();

        while let Some(message) = self.next_message()? {
            match (role, message) {
                (_, Message::DirectionChange { frame_id: at, direction }) => {
                    let change = DirectionChange {
                        frame_id: at,
                        direction: intent(Message::TAG_DIRECTION_CHANGE, direction)?,
                    };
                    let received = self.rollback.receive(change, &mut self.history, &self.game)?;
                    if let Received::Replayed { frames } = received {
                        report.replayed += frames;
                    }
                }
                (Role::Authority, Message::PotentialScoreAck(counters)) => {
                    inbox.ack = Some(from_counters(counters));
                }
                (Role::Follower, Message::PotentialScore(counters)) => {
                    let notice = from_counters(counters);
                    let counters = self.rollback.counters();
                    if let Some(ack) = self.scoring.on_potential_score(notice, frame_id, counters)? {
                        self.send(&Message::PotentialScoreAck(to_counters(ack)))?;
                    }
                }
                (Role::Follower, Message::FinalScore { frame_id: at, delta }) => {
                    let winner = Side::from_delta(delta).ok_or(Fault::InvalidPayload {
                        tag: Message::TAG_FINAL_SCORE,
                        value: delta,
                    })?;
                    inbox.final_score = self.scoring.on_final_score(FinalScore {
                        frame_id: at,
                        winner,
                    });
                    // The next round's handoff follows; leave it for that phase
                    break;
                }
                (role, other) => {
                    warn!(tag = other.tag(), ?role, "unexpected message dropped");
                }
            }
        }
        Ok(inbox)
    }

    fn authority_scoring(
        &mut self,
        latest: &SimulationState,
        ack: Option<ScoreNotice>,
    ) -> Result<Option<Side>> {
        if let Some(ack) = ack {
            if let AckOutcome::Confirmed(result) = self.scoring.on_ack(ack, latest, &self.game) {
                self.send(&Message::FinalScore {
                    frame_id: result.frame_id,
                    delta: result.winner.as_delta(),
                })?;
                return Ok(Some(result.winner));
            }
        }
        if let Some(notice) = self.scoring.observe(latest, self.rollback.counters(), &self.game)? {
            self.send(&Message::PotentialScore(to_counters(notice)))?;
        }
        Ok(None)
    }

    fn settle(&mut self, side: Side, report: &mut TickReport) -> Result<()> {
        report.point = Some(side);
        let latest = self.history.latest_mut()?;
        match award_point(latest, side, &self.game) {
            RoundOutcome::NextRound { score } => {
                info!(?side, own = score.own, other = score.other, "point");
            }
            RoundOutcome::GameOver {
                winner,
                final_score,
            } => {
                info!(
                    ?winner,
                    own = final_score.own,
                    other = final_score.other,
                    "game over"
                );
                report.game_over = Some(GameOver {
                    winner,
                    final_score,
                });
            }
        }
        self.serve_toward = side;
        self.start_round()
    }

    fn idle_report(&self) -> TickReport {
        TickReport {
            frame_id: self.latest_state().map(|state| state.frame_id),
            ..TickReport::default()
        }
    }

    fn send(&mut self, message: &Message) -> Result<()> {
        match self.link.as_mut() {
            Some(link) => link.send(message),
            None => Ok(()),
        }
    }

    fn next_message(&mut self) -> Result<Option<Message>> {
        match self.link.as_mut() {
            Some(link) => link.next_message(),
            None => Ok(None),
        }
    }
}
