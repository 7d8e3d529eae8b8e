//! Headless host for rollback Pong sessions
//!
//! Runs a local game against the predictive controller, or an authority and
//! a follower joined by an in-memory loopback link. When a networked session
//! hits a fatal fault the host drops both peers and carries on locally.

use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use game_core::{Config, Intent, Role, Score};
use netplay::{
    loopback_pair, FixedLatency, IntentSource, Link, LoopbackClock, Session, SessionConfig,
    TickReport,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RunMode {
    /// One peer against the predictive controller
    Local,
    /// Two peers over an in-memory link
    Loopback,
}

#[derive(Debug, Parser)]
#[command(name = "pong-headless", about = "Drive rollback Pong sessions without a screen")]
struct Args {
    #[arg(long, value_enum, default_value_t = RunMode::Local)]
    mode: RunMode,

    /// Ticks to run before stopping
    #[arg(long, default_value_t = 1800)]
    ticks: u32,

    /// One-way loopback latency, in ticks
    #[arg(long, default_value_t = 2)]
    latency_ticks: u64,

    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Sleep one tick between frames
    #[arg(long)]
    realtime: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    info!(mode = ?args.mode, ticks = args.ticks, seed = args.seed, "starting");
    let tally = run(&args)?;
    info!(
        ticks = tally.ticks,
        own = tally.score.own,
        other = tally.score.other,
        points = tally.points,
        games = tally.games,
        replayed = tally.replayed,
        restarts = tally.restarts,
        "finished"
    );
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Running totals, seen from the local (or authority) side
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Tally {
    ticks: u32,
    points: u32,
    games: u32,
    replayed: usize,
    restarts: u32,
    score: Score,
}

impl Tally {
    fn record(&mut self, report: &TickReport, session: &Session) {
        self.ticks += 1;
        self.replayed += report.replayed;
        if report.point.is_some() {
            self.points += 1;
        }
        if let Some(over) = report.game_over {
            self.games += 1;
            info!(
                winner = ?over.winner,
                own = over.final_score.own,
                other = over.final_score.other,
                "match decided"
            );
        }
        self.score = session.score();
    }
}

/// Input that sweeps the paddle up and down with a fixed period
fn sweep(period: u32) -> Box<dyn IntentSource> {
    let period = period.max(1);
    let mut sample = 0u32;
    Box::new(move || {
        sample = sample.wrapping_add(1);
        match (sample / period) % 4 {
            0 => Intent::Up,
            2 => Intent::Down,
            _ => Intent::Hold,
        }
    })
}

fn run(args: &Args) -> anyhow::Result<Tally> {
    let mut tally = Tally::default();
    match args.mode {
        RunMode::Local => {
            let session = Session::local(Config::new(), args.seed, sweep(9))
                .context("starting local session")?;
            run_local(session, args, args.ticks, &mut tally)?;
        }
        RunMode::Loopback => run_loopback(args, &mut tally)?,
    }
    Ok(tally)
}

fn run_local(
    mut session: Session,
    args: &Args,
    ticks: u32,
    tally: &mut Tally,
) -> anyhow::Result<()> {
    for _ in 0..ticks {
        let report = session.tick().context("local session")?;
        tally.record(&report, &session);
        pace(args, session.config());
    }
    Ok(())
}

fn connect(clock: &LoopbackClock, args: &Args) -> anyhow::Result<(Session, Session)> {
    let tick = u64::from(Config::new().tick_micros.unsigned_abs());
    let latency = FixedLatency::symmetric(Duration::from_micros(args.latency_ticks * tick));
    let (a, b) = loopback_pair(clock, args.latency_ticks);

    let authority = Session::new(
        SessionConfig::networked(Role::Authority, args.seed),
        sweep(9),
        Some(Link::new(Box::new(a), Box::new(latency))),
    )
    .context("starting authority")?;
    let follower = Session::new(
        SessionConfig::networked(Role::Follower, args.seed.wrapping_add(1)),
        sweep(13),
        Some(Link::new(Box::new(b), Box::new(latency))),
    )
    .context("starting follower")?;
    Ok((authority, follower))
}

fn run_loopback(args: &Args, tally: &mut Tally) -> anyhow::Result<()> {
    let clock = LoopbackClock::new();
    let (authority, follower) = connect(&clock, args)?;
    run_peers(&clock, authority, follower, args, tally)
}

/// Tick both peers in lockstep with the link clock; on a fatal fault the
/// remaining ticks are played locally
fn run_peers(
    clock: &LoopbackClock,
    mut authority: Session,
    mut follower: Session,
    args: &Args,
    tally: &mut Tally,
) -> anyhow::Result<()> {
    for tick in 0..args.ticks {
        let stepped = authority
            .tick()
            .and_then(|report| follower.tick().map(|remote| (report, remote)));
        match stepped {
            Ok((report, remote)) => {
                tally.record(&report, &authority);
                tally.replayed += remote.replayed;
            }
            Err(err) if err.is_fatal() => {
                warn!(%err, tick, "networked session failed, restarting locally");
                tally.restarts += 1;
                let session = Session::local(Config::new(), args.seed, sweep(9))
                    .context("restarting into a local session")?;
                return run_local(session, args, args.ticks - tick, tally);
            }
            Err(err) => return Err(err).context("networked session"),
        }
        clock.advance();
        pace(args, authority.config());
    }
    Ok(())
}

fn pace(args: &Args, config: &Config) {
    if args.realtime {
        thread::sleep(Duration::from_micros(u64::from(
            config.tick_micros.unsigned_abs(),
        )));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["pong-headless"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let args = args(&[]);
        assert_eq!(args.mode, RunMode::Local);
        assert_eq!(args.ticks, 1800);
        assert_eq!(args.latency_ticks, 2);
        assert!(!args.realtime);
    }

    #[test]
    fn test_sweep_cycles() {
        let mut input = sweep(2);
        let samples: Vec<Intent> = (0..8).map(|_| input.sample_local_intent()).collect();
        assert_eq!(
            samples,
            vec![
                Intent::Up,
                Intent::Hold,
                Intent::Hold,
                Intent::Down,
                Intent::Down,
                Intent::Hold,
                Intent::Hold,
                Intent::Up,
            ]
        );
    }

    #[test]
    fn test_local_run_counts_ticks() {
        let tally = run(&args(&["--ticks", "300", "--seed", "4"])).unwrap();
        assert_eq!(tally.ticks, 300);
        assert_eq!(tally.restarts, 0);
    }

    #[test]
    fn test_fatal_fault_restarts_locally() {
        let args = args(&["--mode", "loopback", "--ticks", "40"]);
        let (authority, _) = connect(&LoopbackClock::new(), &args).unwrap();

        // A follower with nobody on the other end gives up on the handoff
        let clock = LoopbackClock::new();
        let (_, orphan) = loopback_pair(&clock, 0);
        let mut config = SessionConfig::networked(Role::Follower, 2);
        config.game.handoff_timeout_ticks = 5;
        let follower = Session::new(
            config,
            sweep(13),
            Some(Link::new(
                Box::new(orphan),
                Box::new(FixedLatency::default()),
            )),
        )
        .unwrap();

        let mut tally = Tally::default();
        run_peers(&clock, authority, follower, &args, &mut tally).unwrap();
        assert_eq!(tally.restarts, 1);
        assert_eq!(tally.ticks, 40, "remaining ticks played locally");
    }

    #[test]
    fn test_loopback_run_stays_networked() {
        let tally = run(&args(&["--mode", "loopback", "--ticks", "300"])).unwrap();
        assert_eq!(tally.ticks, 300);
        assert_eq!(tally.restarts, 0);
    }
}
