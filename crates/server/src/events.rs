use melee::CharacterId;

#[derive(Debug, Clone)]
pub enum ServerEvent {
    PlayerJoined {
        character: CharacterId,
    },
    PlayerLeft {
        character: CharacterId,
    },
    Hit {
        attacker: CharacterId,
        victim: CharacterId,
        health: f32,
    },
    Error {
        message: String,
    },
}
