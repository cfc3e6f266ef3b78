use std::fmt;

use bitflags::bitflags;
use rkyv::{Archive, Deserialize, Serialize, rancor};

use crate::character::CharacterId;
use crate::combat::Weapon;

pub const PROTOCOL_VERSION: u32 = 1;
pub const PROTOCOL_MAGIC: u32 = 0x4D454C45;
pub const DEFAULT_TICK_RATE: u32 = 60;

const SEQUENCE_WRAP_THRESHOLD: u32 = u32::MAX / 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct PacketHeader {
    pub magic: u32,
    pub version: u32,
    pub sequence: u32,
}

impl PacketHeader {
    pub fn new(sequence: u32) -> Self {
        Self {
            magic: PROTOCOL_MAGIC,
            version: PROTOCOL_VERSION,
            sequence,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == PROTOCOL_MAGIC && self.version == PROTOCOL_VERSION
    }
}

#[inline]
pub fn sequence_greater_than(s1: u32, s2: u32) -> bool {
    ((s1 > s2) && (s1 - s2 <= SEQUENCE_WRAP_THRESHOLD))
        || ((s1 < s2) && (s2 - s1 > SEQUENCE_WRAP_THRESHOLD))
}

#[inline]
pub fn sequence_at_most(s1: u32, s2: u32) -> bool {
    s1 == s2 || sequence_greater_than(s2, s1)
}

/// Who sent a proposal. Only the authority may drive authority-only transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum Origin {
    Authority,
    Client(CharacterId),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authority => write!(f, "authority"),
            Self::Client(id) => write!(f, "client {}", id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum Proposal {
    BeginAttack,
    EndAttack,
    SetWeapon(Weapon),
    StartSprint,
    StopSprint,
    MoveForward(f32),
    MoveRight(f32),
    Overlap { victim: CharacterId },
}

impl Proposal {
    pub fn is_authority_only(&self) -> bool {
        matches!(self, Self::EndAttack | Self::Overlap { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct ProposalEnvelope {
    pub sequence: u32,
    pub origin: Origin,
    pub character: CharacterId,
    pub proposal: Proposal,
}

impl ProposalEnvelope {
    pub fn from_authority(character: CharacterId, proposal: Proposal) -> Self {
        Self {
            sequence: 0,
            origin: Origin::Authority,
            character,
            proposal,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CharacterFlags: u8 {
        const ATTACKING = 1 << 0;
        const SPRINTING = 1 << 1;
        const HIT_DETECTION = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct CharacterState {
    pub character: CharacterId,
    pub health: f32,
    pub weapon: Weapon,
    pub flags: u8,
    pub max_speed: f32,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub yaw: f32,
}

impl CharacterState {
    pub fn flags(&self) -> CharacterFlags {
        CharacterFlags::from_bits_truncate(self.flags)
    }
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum StateDelta {
    Joined(CharacterState),
    Left {
        character: CharacterId,
    },
    AttackStarted {
        character: CharacterId,
        weapon: Weapon,
    },
    AttackEnded {
        character: CharacterId,
    },
    WeaponChanged {
        character: CharacterId,
        weapon: Weapon,
    },
    SprintChanged {
        character: CharacterId,
        sprinting: bool,
    },
    MaxSpeedChanged {
        character: CharacterId,
        max_speed: f32,
    },
    MoveInput {
        character: CharacterId,
        forward: f32,
        right: f32,
    },
    Damaged {
        attacker: CharacterId,
        victim: CharacterId,
        amount: f32,
        health: f32,
    },
    Snapshot(CharacterState),
}

impl StateDelta {
    /// The character whose fields this delta overwrites.
    pub fn character(&self) -> CharacterId {
        match self {
            Self::Joined(state) | Self::Snapshot(state) => state.character,
            Self::Left { character }
            | Self::AttackStarted { character, .. }
            | Self::AttackEnded { character }
            | Self::WeaponChanged { character, .. }
            | Self::SprintChanged { character, .. }
            | Self::MaxSpeedChanged { character, .. }
            | Self::MoveInput { character, .. } => *character,
            Self::Damaged { victim, .. } => *victim,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Ack {
    pub character: CharacterId,
    pub sequence: u32,
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Broadcast {
    pub tick: u32,
    pub ack: Option<Ack>,
    pub deltas: Vec<StateDelta>,
}

impl Broadcast {
    pub fn new(tick: u32) -> Self {
        Self {
            tick,
            ack: None,
            deltas: Vec::new(),
        }
    }

    pub fn with_deltas(tick: u32, deltas: Vec<StateDelta>) -> Self {
        Self {
            tick,
            ack: None,
            deltas,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ack.is_none() && self.deltas.is_empty()
    }
}

#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum PacketType {
    Propose(ProposalEnvelope),
    Broadcast(Broadcast),
}

#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Packet {
    pub header: PacketHeader,
    pub payload: PacketType,
}

#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
    #[error("bad header: magic {magic:#x}, version {version}")]
    BadHeader { magic: u32, version: u32 },
}

impl Packet {
    pub fn new(header: PacketHeader, payload: PacketType) -> Self {
        Self { header, payload }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, PacketError> {
        rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(PacketError::Serialize)
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, PacketError> {
        let packet =
            rkyv::from_bytes::<Self, rancor::Error>(data).map_err(PacketError::Deserialize)?;
        if !packet.header.is_valid() {
            return Err(PacketError::BadHeader {
                magic: packet.header.magic,
                version: packet.header.version,
            });
        }
        Ok(packet)
    }
}
