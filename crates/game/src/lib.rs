pub mod character;
pub mod combat;
pub mod error;
pub mod movement;
pub mod net;
pub mod replica;
pub mod session;

pub use character::{Character, CharacterId, Roster};
pub use combat::{
    AnimationKind, CombatResolver, CombatState, DAMAGE_PER_HIT, HitReport, STARTING_HEALTH, Weapon,
    WeaponSpec, WeaponTable,
};
pub use error::{ProposalError, RejectedTransition};
pub use movement::{MovementConfig, MovementSpeedController, SpeedEvent, SpeedPhase};
pub use net::{
    Ack, AuthorityEndpoint, Broadcast, ChannelError, CharacterFlags, CharacterState,
    DEFAULT_TICK_RATE, Origin, Packet, PacketError, PacketHeader, PacketType, PeerEndpoint,
    Proposal, ProposalEnvelope, ReplicationChannel, StateDelta,
};
pub use replica::{AnimationCue, InputEvent, Perspective, Replica};
pub use session::{Authority, FixedTimestep, SessionConfig};
