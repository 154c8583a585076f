// THEORY:
// Every failure in the engine is fatal at the point of detection: this is a single
// batch computation, not a service. The error type exists to carry the failure to
// the edge of the program intact, where it becomes a message and an exit code.
// A rank that fails drops its channel ends, which is how its peers learn about it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlurError {
    /// Bad command-line arguments.
    #[error("usage error: {0}")]
    Usage(String),

    /// Decoding or encoding a bitmap failed.
    #[error("image I/O failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The rank environment could not be brought up.
    #[error("environment initialization failed: {0}")]
    Environment(String),

    /// The image cannot be split across the process grid.
    #[error("image of {width}x{height} pixels is too small for a {grid_x}x{grid_y} process grid")]
    ImageTooSmall {
        width: usize,
        height: usize,
        grid_x: usize,
        grid_y: usize,
    },

    /// A peer rank went away while this rank was waiting on it.
    #[error("rank {rank} lost its connection to rank {peer}")]
    Disconnected { rank: usize, peer: usize },

    /// A rank task panicked or was cancelled before returning.
    #[error("rank {rank} crashed: {reason}")]
    Crashed { rank: usize, reason: String },

    /// A peer sent a message this rank was not expecting.
    #[error("rank {rank} expected {expected} from rank {peer}, got {got}")]
    Protocol {
        rank: usize,
        peer: usize,
        expected: String,
        got: String,
    },
}

impl BlurError {
    /// Process exit code for this failure class.
    pub fn exit_code(&self) -> u8 {
        match self {
            BlurError::Usage(_) => 1,
            BlurError::Image(_) | BlurError::Io(_) => 1,
            BlurError::ImageTooSmall { .. } => 1,
            BlurError::Environment(_) => 2,
            BlurError::Disconnected { .. } | BlurError::Protocol { .. } => 3,
            BlurError::Crashed { .. } => 3,
        }
    }
}
