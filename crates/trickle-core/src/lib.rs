//! trickle-core: wire format, peer-side reassembly, and configuration.
//! All other trickle crates depend on this one.

pub mod config;
pub mod receive;
pub mod wire;

pub use receive::{ReassemblyError, ReassemblyEvent, Reassembler};
pub use wire::{build_frames, is_ack, AttResult, FrameError, ACK_TOKEN};
