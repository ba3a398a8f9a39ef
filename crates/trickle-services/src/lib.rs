//! trickle-services: the transfer state machine and the transport seam it
//! runs behind.

pub mod adapter;
pub mod loader;
pub mod simulated;
pub mod transfer;
pub mod transport;

pub use adapter::PeripheralAdapter;
pub use loader::{BlobLoader, FsLoader, LoadError};
pub use simulated::{SimCentral, SimError};
pub use transfer::{GateOutcome, SessionState, TransferError, TransferSource};
pub use transport::{Notifier, TransportEvent};
