mod bots;
mod config;
mod events;
mod server;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use glam::Vec3;
use tokio::task::JoinSet;

use bots::Bot;
use config::ServerConfig;
use events::ServerEvent;
use melee::Replica;
use server::GameServer;

#[derive(Parser)]
#[command(name = "melee-server")]
#[command(about = "Authoritative melee session with scripted players")]
struct Args {
    #[arg(short, long, default_value_t = melee::DEFAULT_TICK_RATE)]
    tick_rate: u32,

    #[arg(short, long, default_value_t = 4)]
    players: usize,

    #[arg(short, long, help = "Stop after this many seconds (runs until Ctrl-C if omitted)")]
    duration_secs: Option<u64>,

    #[arg(long, default_value_t = 0.6, help = "Seconds before a swing ends")]
    swing_secs: f32,

    #[arg(long, default_value_t = 150.0, help = "Weapon reach in world units")]
    reach: f32,

    #[arg(long, default_value_t = 30, help = "Full snapshot every N ticks (0 disables)")]
    snapshot_interval: u32,

    #[arg(long, default_value_t = 0)]
    seed: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig {
        tick_rate: args.tick_rate,
        players: args.players,
        duration: args.duration_secs.map(Duration::from_secs),
        swing_duration: args.swing_secs,
        reach: args.reach,
        snapshot_interval: args.snapshot_interval,
        seed: args.seed,
        ..Default::default()
    };

    let mut server = GameServer::new(config.clone());
    let mut bots = JoinSet::new();

    for index in 0..config.players {
        // Evenly around a circle, everyone facing the middle.
        let angle = index as f32 / config.players as f32 * std::f32::consts::TAU;
        let position = Vec3::new(angle.cos(), 0.0, angle.sin()) * config.arena_radius;
        let yaw = (-angle.cos()).atan2(-angle.sin());

        let (character, peer) = server.join_player(position, yaw)?;
        let replica = Replica::new(character, config.session().movement);
        let bot = Bot::new(replica, peer, config.seed.wrapping_add(index as u64));
        bots.spawn(bots::run(bot, server.running(), config.think_rate));
    }

    log::info!(
        "Session started: {} players at {} Hz",
        config.players,
        config.tick_rate
    );

    let mut ticker =
        tokio::time::interval(Duration::from_secs_f64(1.0 / config.tick_rate.max(1) as f64));
    let deadline = async {
        match config.duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = ticker.tick() => server.tick_once(),
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
        }

        for event in server.drain_events() {
            log_event(event);
        }
    }

    log::info!("Session ending after tick {}", server.authority().tick());
    for character in server.authority().roster().characters() {
        log::info!(
            "{}: health {}, weapon {}",
            character.id,
            character.combat.health(),
            character.combat.weapon().name()
        );
    }

    server.shutdown();
    for event in server.drain_events() {
        log_event(event);
    }

    while let Some(result) = bots.join_next().await {
        if let Err(e) = result? {
            log::warn!("Bot stopped early: {}", e);
        }
    }

    Ok(())
}

fn log_event(event: ServerEvent) {
    match event {
        ServerEvent::PlayerJoined { character } => log::info!("{} joined", character),
        ServerEvent::PlayerLeft { character } => log::info!("{} left", character),
        ServerEvent::Hit {
            attacker,
            victim,
            health,
        } => log::info!("{} hit {} ({} health left)", attacker, victim, health),
        ServerEvent::Error { message } => log::error!("{}", message),
    }
}
