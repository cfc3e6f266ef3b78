mod channel;
mod protocol;

pub use channel::{
    AuthorityEndpoint, ChannelError, DEFAULT_BROADCAST_CAPACITY, PeerEndpoint, ReplicationChannel,
};
pub use protocol::{ArchivedPacket, sequence_at_most, sequence_greater_than};
pub use protocol::{
    Ack, Broadcast, CharacterFlags, CharacterState, DEFAULT_TICK_RATE, Origin, PROTOCOL_MAGIC,
    PROTOCOL_VERSION, Packet, PacketError, PacketHeader, PacketType, Proposal, ProposalEnvelope,
    StateDelta,
};
