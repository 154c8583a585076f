// THEORY:
// The `parallel_pipeline` module is the rank environment: a world of P independent
// actors on the tokio runtime that share no memory and talk only through channels.
// Each rank owns one `Communicator`; everything it learns about other ranks arrives
// as an owned `Message`.
//
// Key architectural principles:
// 1.  **Point-to-point channels**: every ordered pair of ranks gets its own unbounded
//     channel, so a receive names its source the way MPI point-to-point does and
//     messages from one peer arrive in the order they were sent.
// 2.  **Combined send/receive**: `send_recv` hands the outgoing buffer to the peer and
//     then waits for the peer's buffer. Sends never block, so a matched pair of
//     `send_recv` calls can never deadlock; the halo parity scheme only has to make
//     sure the pairs match.
// 3.  **Failure is visible**: a rank that returns early drops its channel ends. Any
//     peer waiting on it wakes with `Disconnected` instead of hanging, so an error on
//     the coordinator always unwinds the whole world.
// 4.  **Bracketed lifetime**: `World::launch` builds the channels, spawns every rank,
//     and joins them all before returning, whatever the ranks' outcomes.

use crate::core_modules::buffer_codec::ImageBuffer;
use crate::error::BlurError;
use futures::future::join_all;
use log::{debug, trace};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;

/// The coordinating rank: loads, scatters, gathers and reports.
pub const COORDINATOR: usize = 0;

/// Everything that can travel between ranks.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Interior size of the global image, broadcast by the coordinator.
    Dimensions { width: usize, height: usize },
    /// A packed pixel region.
    Pixels(ImageBuffer),
    /// A rank's compute+exchange wall time.
    Elapsed(Duration),
}

impl Message {
    fn kind(&self) -> String {
        match self {
            Message::Dimensions { .. } => "dimensions".to_string(),
            Message::Pixels(buffer) => format!("{} pixel bytes", buffer.len()),
            Message::Elapsed(_) => "elapsed time".to_string(),
        }
    }
}

/// One rank's endpoint into the world.
pub struct Communicator {
    rank: usize,
    size: usize,
    /// Senders indexed by destination rank.
    outboxes: Vec<mpsc::UnboundedSender<Message>>,
    /// Receivers indexed by source rank.
    inboxes: Vec<mpsc::UnboundedReceiver<Message>>,
}

impl Communicator {
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_coordinator(&self) -> bool {
        self.rank == COORDINATOR
    }

    pub fn send(&self, dest: usize, message: Message) -> Result<(), BlurError> {
        trace!("rank {} -> rank {}: {}", self.rank, dest, message.kind());
        self.outboxes[dest]
            .send(message)
            .map_err(|_| BlurError::Disconnected {
                rank: self.rank,
                peer: dest,
            })
    }

    pub async fn recv(&mut self, source: usize) -> Result<Message, BlurError> {
        let message = self.inboxes[source]
            .recv()
            .await
            .ok_or(BlurError::Disconnected {
                rank: self.rank,
                peer: source,
            })?;
        trace!("rank {} <- rank {}: {}", self.rank, source, message.kind());
        Ok(message)
    }

    /// Receives a pixel payload of exactly `expected_len` bytes.
    pub async fn recv_pixels(
        &mut self,
        source: usize,
        expected_len: usize,
    ) -> Result<ImageBuffer, BlurError> {
        match self.recv(source).await? {
            Message::Pixels(buffer) if buffer.len() == expected_len => Ok(buffer),
            other => Err(self.protocol_error(source, format!("{} pixel bytes", expected_len), &other)),
        }
    }

    /// Sends `outgoing` to `peer` and waits for the peer's buffer of `expected_len` bytes.
    pub async fn send_recv(
        &mut self,
        peer: usize,
        outgoing: ImageBuffer,
        expected_len: usize,
    ) -> Result<ImageBuffer, BlurError> {
        self.send(peer, Message::Pixels(outgoing))?;
        self.recv_pixels(peer, expected_len).await
    }

    /// The coordinator passes `Some(dimensions)`; every rank returns them.
    pub async fn broadcast_dimensions(
        &mut self,
        dimensions: Option<(usize, usize)>,
    ) -> Result<(usize, usize), BlurError> {
        if self.is_coordinator() {
            let (width, height) = dimensions.ok_or_else(|| {
                BlurError::Environment("coordinator has no dimensions to broadcast".to_string())
            })?;
            for dest in (0..self.size).filter(|&r| r != COORDINATOR) {
                self.send(dest, Message::Dimensions { width, height })?;
            }
            return Ok((width, height));
        }
        match self.recv(COORDINATOR).await? {
            Message::Dimensions { width, height } => Ok((width, height)),
            other => Err(self.protocol_error(COORDINATOR, "dimensions".to_string(), &other)),
        }
    }

    /// Collects the longest of all ranks' durations on the coordinator.
    pub async fn reduce_max_elapsed(
        &mut self,
        local: Duration,
    ) -> Result<Option<Duration>, BlurError> {
        if !self.is_coordinator() {
            self.send(COORDINATOR, Message::Elapsed(local))?;
            return Ok(None);
        }
        let mut longest = local;
        for source in (0..self.size).filter(|&r| r != COORDINATOR) {
            match self.recv(source).await? {
                Message::Elapsed(elapsed) => longest = longest.max(elapsed),
                other => {
                    return Err(self.protocol_error(source, "elapsed time".to_string(), &other));
                }
            }
        }
        Ok(Some(longest))
    }

    fn protocol_error(&self, peer: usize, expected: String, got: &Message) -> BlurError {
        BlurError::Protocol {
            rank: self.rank,
            peer,
            expected,
            got: got.kind(),
        }
    }
}

/// Launcher for a world of ranks.
pub struct World;

impl World {
    /// Builds the fully connected channel mesh for `size` ranks.
    pub fn communicators(size: usize) -> Result<Vec<Communicator>, BlurError> {
        if size == 0 {
            return Err(BlurError::Environment(
                "a world needs at least one rank".to_string(),
            ));
        }
        let mut outboxes: Vec<Vec<_>> = (0..size).map(|_| Vec::with_capacity(size)).collect();
        let mut inboxes: Vec<Vec<_>> = (0..size).map(|_| Vec::with_capacity(size)).collect();
        for source in 0..size {
            for dest in 0..size {
                let (tx, rx) = mpsc::unbounded_channel::<Message>();
                outboxes[source].push(tx);
                inboxes[dest].push(rx);
            }
        }
        Ok(outboxes
            .into_iter()
            .zip(inboxes)
            .enumerate()
            .map(|(rank, (outboxes, inboxes))| Communicator {
                rank,
                size,
                outboxes,
                inboxes,
            })
            .collect())
    }

    /// Runs `program` on `size` ranks and returns every rank's outcome, in rank order.
    pub async fn launch<F, Fut, T>(
        size: usize,
        program: F,
    ) -> Result<Vec<Result<T, BlurError>>, BlurError>
    where
        F: Fn(Communicator) -> Fut,
        Fut: Future<Output = Result<T, BlurError>> + Send + 'static,
        T: Send + 'static,
    {
        let communicators = Self::communicators(size)?;
        debug!("launching {} ranks", size);

        let handles: Vec<_> = communicators
            .into_iter()
            .map(|communicator| tokio::spawn(program(communicator)))
            .collect();

        let outcomes = join_all(handles).await;
        Ok(outcomes
            .into_iter()
            .enumerate()
            .map(|(rank, joined)| {
                joined.unwrap_or_else(|join_error| {
                    Err(BlurError::Crashed {
                        rank,
                        reason: join_error.to_string(),
                    })
                })
            })
            .collect())
    }
}

/// Picks the error that explains a failed world: the first one that is not merely a
/// peer noticing somebody else's exit, or else the first error at all.
pub fn root_cause<T>(outcomes: &mut Vec<Result<T, BlurError>>) -> Option<BlurError> {
    let position = outcomes
        .iter()
        .position(|o| matches!(o, Err(e) if !matches!(e, BlurError::Disconnected { .. })))
        .or_else(|| outcomes.iter().position(|o| o.is_err()))?;
    outcomes.remove(position).err()
}
