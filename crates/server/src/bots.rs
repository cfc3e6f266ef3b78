use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use melee::{ChannelError, InputEvent, PeerEndpoint, Replica, Weapon};

/// Deterministic per-bot dice. Same seed, same choices within one build.
#[derive(Debug, Clone)]
struct BotRng {
    seed: u64,
    counter: u64,
}

impl BotRng {
    fn new(seed: u64) -> Self {
        Self { seed, counter: 0 }
    }

    fn next_u64(&mut self) -> u64 {
        let mut hasher = DefaultHasher::new();
        (self.seed, self.counter).hash(&mut hasher);
        self.counter += 1;
        hasher.finish()
    }

    fn percent(&mut self) -> f32 {
        self.next_u64() as f32 / u64::MAX as f32
    }
}

/// A scripted participant that plays through a replica exactly like a human client would.
pub struct Bot {
    replica: Replica,
    peer: PeerEndpoint,
    rng: BotRng,
}

impl Bot {
    pub fn new(replica: Replica, peer: PeerEndpoint, seed: u64) -> Self {
        Self {
            replica,
            peer,
            rng: BotRng::new(seed),
        }
    }

    fn sync(&mut self) {
        for broadcast in self.peer.drain() {
            for cue in self.replica.apply(&broadcast) {
                log::trace!(
                    "{} sees {:?} {:?} on {} ({:?})",
                    self.replica.local(),
                    cue.kind,
                    cue.perspective,
                    cue.character,
                    cue.animation()
                );
            }
        }
    }

    fn think(&mut self) -> Option<InputEvent> {
        let character = self.replica.local_character()?;
        let combat = &character.combat;
        let movement = &character.movement;
        let moving = character.move_axes().x > 0.0;
        let roll = self.rng.percent();

        if combat.weapon() == Weapon::None {
            let slot = 1 + (self.rng.next_u64() % 4) as u8;
            return Some(InputEvent::weapon_slot(slot));
        }
        if !moving {
            return (roll < 0.5).then_some(InputEvent::MoveForward(1.0));
        }

        match roll {
            r if r < 0.3 && !combat.is_attacking() => Some(InputEvent::AttackPressed),
            r if r < 0.45 && !movement.is_sprinting() => Some(InputEvent::SprintPressed),
            r if r < 0.55 && movement.is_sprinting() => Some(InputEvent::SprintReleased),
            r if r < 0.6 => Some(InputEvent::MoveForward(0.0)),
            _ => None,
        }
    }

    fn send(&mut self, input: InputEvent) -> Result<(), ChannelError> {
        let (envelope, cues) = self.replica.handle_input(input);
        for cue in cues {
            log::trace!("{} plays {:?} {:?}", cue.character, cue.kind, cue.perspective);
        }
        self.peer.propose(&envelope)
    }
}

pub async fn run(
    mut bot: Bot,
    running: Arc<AtomicBool>,
    think_rate: u32,
) -> Result<(), ChannelError> {
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(
        1.0 / think_rate.max(1) as f64,
    ));
    let mut last = Instant::now();

    while running.load(Ordering::SeqCst) {
        ticker.tick().await;

        let now = Instant::now();
        bot.sync();
        bot.replica.predict((now - last).as_secs_f32());
        last = now;

        if let Some(input) = bot.think() {
            bot.send(input)?;
        }
    }

    log::debug!(
        "Bot {} stopping with {} proposals in flight",
        bot.peer.character(),
        bot.replica.pending_count()
    );
    Ok(())
}
