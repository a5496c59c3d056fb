//! Pong exhibit entry point
//!
//! Builds the configuration, connects the bus, wires both players, and
//! hands control to the session state machine. A line reading `quit` on
//! stdin plays the supervisor role: it writes terminate-requested into
//! the control slot and waits for the session to report idle.

use std::io::BufRead;
use std::sync::Arc;
use std::thread;

use clap::Parser;
use log::{error, info};

use pong_exhibit::bus::Bus;
use pong_exhibit::channel::{ActorRouter, RemoteActorChannel, subscribe_actor_topics};
use pong_exhibit::orchestrator::GameOrchestrator;
use pong_exhibit::player::{BotPlayer, Player};
use pong_exhibit::session::{ControlSlot, NoSensor, SessionStateMachine};
use pong_exhibit::sim::Side;
use pong_exhibit::{Config, Error};

#[derive(Parser)]
#[command(name = "pong-exhibit")]
#[command(about = "Coordinator for the two-player networked Pong exhibit")]
struct Args {
    /// Path to a JSON config file (defaults apply when omitted)
    #[arg(long)]
    config: Option<String>,

    /// MQTT broker host
    #[arg(long)]
    broker_host: Option<String>,

    /// MQTT broker port
    #[arg(long)]
    broker_port: Option<u16>,

    /// Seed for serve angle/direction selection
    #[arg(long)]
    seed: Option<u64>,

    /// Points needed to win a level
    #[arg(long)]
    max_score: Option<u32>,

    /// Target tick rate (Hz)
    #[arg(long)]
    tick_hz: Option<f64>,

    /// Gate level transitions on the presence sensor
    #[arg(long)]
    presence: bool,

    /// Drive the left paddle from the depth camera channel instead of the
    /// built-in bot
    #[arg(long)]
    camera: bool,
}

fn build_config(args: &Args) -> Result<Config, Error> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(host) = &args.broker_host {
        config.broker_host = host.clone();
    }
    if let Some(port) = args.broker_port {
        config.broker_port = port;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(max_score) = args.max_score {
        config.max_score = max_score;
    }
    if let Some(tick_hz) = args.tick_hz {
        config.tick_hz = tick_hz;
    }
    if args.presence {
        config.use_presence = true;
    }
    config.validate()?;
    Ok(config)
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    // Configuration problems are the only fatal errors, and only here
    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };
    info!(
        "max score {}, tick rate {} Hz, broker {}:{}",
        config.max_score, config.tick_hz, config.broker_host, config.broker_port
    );

    let camera_channel = RemoteActorChannel::new(Side::Left);
    let ai_channel = RemoteActorChannel::new(Side::Right);
    let router = Arc::new(ActorRouter::new(camera_channel.slot(), ai_channel.slot()));

    let bus = Bus::connect(&config, router);
    if let Err(e) = subscribe_actor_topics(&bus) {
        // Subscriptions retry with the transport; a failure here only
        // delays inbound actions
        log::warn!("initial subscribe failed: {e}");
    }

    let left = if args.camera {
        info!("left paddle driven by the depth camera");
        Player::Camera(camera_channel)
    } else {
        info!("left paddle driven by the built-in bot");
        Player::Bot(BotPlayer::new(Side::Left))
    };
    let right = Player::Remote(ai_channel);

    let control = Arc::new(ControlSlot::new());
    let mut orchestrator =
        GameOrchestrator::new(config.clone(), bus, left, right, Arc::clone(&control));

    // Supervisor stand-in: `quit` on stdin requests termination
    let supervisor = Arc::clone(&control);
    thread::Builder::new()
        .name("stdin-supervisor".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(text) if text.trim().eq_ignore_ascii_case("quit") => {
                        info!("quit received, requesting termination");
                        supervisor.request_terminate();
                        break;
                    }
                    Ok(_) => {}
                    Err(_) => break,
                }
            }
        })
        .expect("failed to spawn supervisor thread");

    // The presence sensor SDK is wired outside this crate; NoSensor never
    // reports a body, so a gated session would wait at idle forever
    if config.use_presence {
        log::warn!("presence gating enabled but no sensor is wired; the session will stay idle");
    }
    let mut sensor = NoSensor;
    let mut session = SessionStateMachine::new(config, Arc::clone(&control));
    session.run(&mut sensor, &mut orchestrator);

    info!("session ended, goodbye");
}
