use tokio::sync::{broadcast, mpsc};

use crate::character::CharacterId;

use super::protocol::{
    Broadcast, Origin, Packet, PacketError, PacketHeader, PacketType, ProposalEnvelope,
};

pub const DEFAULT_BROADCAST_CAPACITY: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("replication channel closed")]
    Closed,
    #[error("receiver lagged behind by {0} broadcasts")]
    Lagged(u64),
    #[error(transparent)]
    Packet(#[from] PacketError),
    #[error("unexpected {0} payload")]
    UnexpectedPayload(&'static str),
}

/// In-process replication substrate. Proposals flow peer → authority over one queue, and every
/// authoritative broadcast fans out to all connected peers. Both directions carry encoded packets.
/// Each proposal is tagged with the character its peer was bound to on connect.
pub struct ReplicationChannel;

impl ReplicationChannel {
    pub fn open(broadcast_capacity: usize) -> AuthorityEndpoint {
        let (proposal_tx, proposal_rx) = mpsc::unbounded_channel();
        let (broadcast_tx, _) = broadcast::channel(broadcast_capacity.max(1));
        AuthorityEndpoint {
            proposal_tx,
            proposal_rx,
            broadcast_tx,
            send_sequence: 0,
        }
    }
}

pub struct AuthorityEndpoint {
    proposal_tx: mpsc::UnboundedSender<(CharacterId, Vec<u8>)>,
    proposal_rx: mpsc::UnboundedReceiver<(CharacterId, Vec<u8>)>,
    broadcast_tx: broadcast::Sender<Vec<u8>>,
    send_sequence: u32,
}

impl AuthorityEndpoint {
    /// Subscribes a participant that controls `character`. It only sees broadcasts published
    /// after this call.
    pub fn connect(&self, character: CharacterId) -> PeerEndpoint {
        PeerEndpoint {
            character,
            proposal_tx: self.proposal_tx.clone(),
            broadcast_rx: self.broadcast_tx.subscribe(),
            send_sequence: 0,
        }
    }

    pub fn peer_count(&self) -> usize {
        self.broadcast_tx.receiver_count()
    }

    /// Publishes to every connected peer and returns how many received it.
    pub fn publish(&mut self, broadcast: &Broadcast) -> Result<usize, ChannelError> {
        let packet = Packet::new(
            PacketHeader::new(self.send_sequence),
            PacketType::Broadcast(broadcast.clone()),
        );
        self.send_sequence = self.send_sequence.wrapping_add(1);
        let bytes = packet.serialize()?;
        // No subscribers is not an error: the broadcast simply has no audience.
        Ok(self.broadcast_tx.send(bytes).unwrap_or(0))
    }

    /// The origin written inside the packet is discarded: a peer only ever speaks as the
    /// character it was bound to.
    pub fn try_recv(&mut self) -> Result<Option<ProposalEnvelope>, ChannelError> {
        match self.proposal_rx.try_recv() {
            Ok((sender, bytes)) => {
                let mut envelope = decode_proposal(&bytes)?;
                if envelope.origin != Origin::Client(sender) {
                    log::debug!("Peer {} claimed origin {}", sender, envelope.origin);
                }
                envelope.origin = Origin::Client(sender);
                Ok(Some(envelope))
            }
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(ChannelError::Closed),
        }
    }

    /// Drains every queued proposal, skipping packets that fail to decode.
    pub fn drain(&mut self) -> Vec<ProposalEnvelope> {
        let mut proposals = Vec::new();
        loop {
            match self.try_recv() {
                Ok(Some(proposal)) => proposals.push(proposal),
                Ok(None) | Err(ChannelError::Closed) => break,
                Err(e) => log::warn!("Dropping proposal: {}", e),
            }
        }
        proposals
    }
}

pub struct PeerEndpoint {
    character: CharacterId,
    proposal_tx: mpsc::UnboundedSender<(CharacterId, Vec<u8>)>,
    broadcast_rx: broadcast::Receiver<Vec<u8>>,
    send_sequence: u32,
}

impl PeerEndpoint {
    pub fn character(&self) -> CharacterId {
        self.character
    }

    pub fn propose(&mut self, envelope: &ProposalEnvelope) -> Result<(), ChannelError> {
        let packet = Packet::new(
            PacketHeader::new(self.send_sequence),
            PacketType::Propose(*envelope),
        );
        self.send_sequence = self.send_sequence.wrapping_add(1);
        let bytes = packet.serialize()?;
        self.proposal_tx
            .send((self.character, bytes))
            .map_err(|_| ChannelError::Closed)
    }

    pub fn try_recv(&mut self) -> Result<Option<Broadcast>, ChannelError> {
        match self.broadcast_rx.try_recv() {
            Ok(bytes) => decode_broadcast(&bytes).map(Some),
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(broadcast::error::TryRecvError::Lagged(n)) => Err(ChannelError::Lagged(n)),
            Err(broadcast::error::TryRecvError::Closed) => Err(ChannelError::Closed),
        }
    }

    /// Drains every pending broadcast. Lagged gaps are logged and healed by the next snapshot.
    pub fn drain(&mut self) -> Vec<Broadcast> {
        let mut broadcasts = Vec::new();
        loop {
            match self.try_recv() {
                Ok(Some(broadcast)) => broadcasts.push(broadcast),
                Ok(None) | Err(ChannelError::Closed) => break,
                Err(e) => log::warn!("Broadcast stream: {}", e),
            }
        }
        broadcasts
    }
}

fn decode_proposal(bytes: &[u8]) -> Result<ProposalEnvelope, ChannelError> {
    match Packet::deserialize(bytes)?.payload {
        PacketType::Propose(envelope) => Ok(envelope),
        PacketType::Broadcast(_) => Err(ChannelError::UnexpectedPayload("broadcast")),
    }
}

fn decode_broadcast(bytes: &[u8]) -> Result<Broadcast, ChannelError> {
    match Packet::deserialize(bytes)?.payload {
        PacketType::Broadcast(broadcast) => Ok(broadcast),
        PacketType::Propose(_) => Err(ChannelError::UnexpectedPayload("proposal")),
    }
}
