//! Message passing between worker ranks.
//!
//! A [`World`] of `P` ranks is a full mesh of point-to-point channels, one per
//! ordered `(source, destination)` pair, so messages between two ranks arrive
//! reliably and in the order they were sent. Each rank receives a
//! [`Communicator`] endpoint that it moves into its own thread; ranks share no
//! memory, and a band only crosses rank boundaries as a copied [`Message`].
//!
//! Every receive names its source and the message variant it expects. A
//! receive that finds a different variant is a protocol violation and fails
//! with [`CommError::UnexpectedMessage`]. When a rank exits, its endpoint is
//! dropped and any peer waiting on it fails with [`CommError::Disconnected`],
//! which aborts the whole computation instead of leaving it blocked.
//!
//! The protocol built on top of this transport lives in three submodules:
//! - [`halo`]: ghost row refresh between row neighbours.
//! - [`termination`]: vote gathering and decision broadcast.
//! - [`transfer`]: band distribution at setup and result gathering at the end.

pub mod halo;
pub mod termination;
pub mod transfer;

pub use halo::exchange_halo;
pub use termination::TerminationCoordinator;
pub use transfer::{gather_bands, receive_band, scatter_bands, send_band};

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;

/// Rank of the process that distributes work, decides termination and gathers results.
pub const COORDINATOR: usize = 0;

/// Failures of the inter-rank transport and protocol.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommError {
    /// A peer rank outside the world was addressed.
    #[error("rank {rank} is not a member of a world of {size} ranks")]
    InvalidRank { rank: usize, size: usize },

    /// A rank tried to send a message to itself.
    #[error("rank {rank} cannot exchange messages with itself")]
    SelfMessage { rank: usize },

    /// The peer's endpoint was dropped, usually because that rank failed.
    #[error("rank {rank} lost its connection to rank {peer}")]
    Disconnected { rank: usize, peer: usize },

    /// A message of the wrong variant arrived.
    #[error("rank {rank} expected {expected} from rank {peer} but received {found}")]
    UnexpectedMessage {
        rank: usize,
        peer: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// A row or band payload had the wrong number of values.
    #[error("rank {rank} received {actual} values from rank {peer}, expected {expected}")]
    LengthMismatch {
        rank: usize,
        peer: usize,
        expected: usize,
        actual: usize,
    },

    /// A band arrived with metadata that does not match the partition.
    #[error(
        "rank {rank} received a band of {rows} rows at row {offset} from rank {peer}, expected {expected_rows} rows at row {expected_offset}"
    )]
    BandMismatch {
        rank: usize,
        peer: usize,
        offset: usize,
        rows: usize,
        expected_offset: usize,
        expected_rows: usize,
    },
}

/// The closed set of messages exchanged between ranks.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    /// A band of full-width rows starting at global row `offset`. At setup the
    /// payload also carries both ghost rows; when gathering it carries only the
    /// `rows` owned rows.
    BandTransfer {
        offset: usize,
        rows: usize,
        values: Vec<f64>,
    },
    /// The interior columns of a neighbour's edge row.
    HaloRow(Vec<f64>),
    /// A participant's local convergence vote.
    Vote(bool),
    /// The coordinator's combined termination decision.
    Decision(bool),
}

impl Message {
    /// Human-readable variant name used in protocol errors.
    pub fn name(&self) -> &'static str {
        match self {
            Message::BandTransfer { .. } => "band transfer",
            Message::HaloRow(_) => "halo row",
            Message::Vote(_) => "vote",
            Message::Decision(_) => "decision",
        }
    }
}

/// Factory for the endpoints of a fixed-size group of ranks.
pub struct World;

impl World {
    /// Creates the endpoints of `size` fully connected ranks, indexed by rank.
    pub fn create(size: usize) -> Vec<Communicator> {
        // channels[src][dst] carries messages from `src` to `dst`.
        let mut outboxes: Vec<Vec<Option<Sender<Message>>>> =
            (0..size).map(|_| (0..size).map(|_| None).collect()).collect();
        let mut inboxes: Vec<Vec<Option<Receiver<Message>>>> =
            (0..size).map(|_| (0..size).map(|_| None).collect()).collect();

        for src in 0..size {
            for dst in 0..size {
                if src != dst {
                    let (tx, rx) = crossbeam_channel::unbounded();
                    outboxes[src][dst] = Some(tx);
                    inboxes[dst][src] = Some(rx);
                }
            }
        }

        outboxes
            .into_iter()
            .zip(inboxes)
            .enumerate()
            .map(|(rank, (outboxes, inboxes))| Communicator {
                rank,
                size,
                outboxes,
                inboxes,
            })
            .collect()
    }
}

/// One rank's endpoint into a [`World`].
///
/// The endpoint is `Send` so it can be moved into the rank's thread, but it is
/// not `Clone`: exactly one owner speaks for each rank.
pub struct Communicator {
    rank: usize,
    size: usize,
    outboxes: Vec<Option<Sender<Message>>>,
    inboxes: Vec<Option<Receiver<Message>>>,
}

impl Communicator {
    /// The rank of this endpoint.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// The number of ranks in the world.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_coordinator(&self) -> bool {
        self.rank == COORDINATOR
    }

    fn check_peer(&self, peer: usize) -> Result<(), CommError> {
        if peer >= self.size {
            return Err(CommError::InvalidRank {
                rank: peer,
                size: self.size,
            });
        }
        if peer == self.rank {
            return Err(CommError::SelfMessage { rank: self.rank });
        }
        Ok(())
    }

    /// Delivers `message` to `dest`.
    pub fn send(&self, dest: usize, message: Message) -> Result<(), CommError> {
        self.check_peer(dest)?;
        let disconnected = CommError::Disconnected {
            rank: self.rank,
            peer: dest,
        };
        match &self.outboxes[dest] {
            Some(outbox) => outbox.send(message).map_err(|_| disconnected),
            None => Err(disconnected),
        }
    }

    /// Blocks until the next message from `source` arrives.
    pub fn recv(&self, source: usize) -> Result<Message, CommError> {
        self.check_peer(source)?;
        let disconnected = CommError::Disconnected {
            rank: self.rank,
            peer: source,
        };
        match &self.inboxes[source] {
            Some(inbox) => inbox.recv().map_err(|_| disconnected),
            None => Err(disconnected),
        }
    }

    fn unexpected(&self, peer: usize, expected: &'static str, found: &Message) -> CommError {
        CommError::UnexpectedMessage {
            rank: self.rank,
            peer,
            expected,
            found: found.name(),
        }
    }

    /// Receives a halo row of exactly `len` values from `source`.
    pub fn recv_halo_row(&self, source: usize, len: usize) -> Result<Vec<f64>, CommError> {
        match self.recv(source)? {
            Message::HaloRow(values) if values.len() == len => Ok(values),
            Message::HaloRow(values) => Err(CommError::LengthMismatch {
                rank: self.rank,
                peer: source,
                expected: len,
                actual: values.len(),
            }),
            other => Err(self.unexpected(source, "halo row", &other)),
        }
    }

    /// Receives a participant's vote.
    pub fn recv_vote(&self, source: usize) -> Result<bool, CommError> {
        match self.recv(source)? {
            Message::Vote(vote) => Ok(vote),
            other => Err(self.unexpected(source, "vote", &other)),
        }
    }

    /// Receives the coordinator's decision.
    pub fn recv_decision(&self, source: usize) -> Result<bool, CommError> {
        match self.recv(source)? {
            Message::Decision(decision) => Ok(decision),
            other => Err(self.unexpected(source, "decision", &other)),
        }
    }

    /// Receives a band as `(offset, rows, values)`.
    pub fn recv_band(&self, source: usize) -> Result<(usize, usize, Vec<f64>), CommError> {
        match self.recv(source)? {
            Message::BandTransfer {
                offset,
                rows,
                values,
            } => Ok((offset, rows, values)),
            other => Err(self.unexpected(source, "band transfer", &other)),
        }
    }
}
