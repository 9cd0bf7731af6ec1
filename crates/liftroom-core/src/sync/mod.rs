//! Lock-screen / widget synchronization.
//!
//! The controller pushes a [`SyncSnapshot`] after every visible change and
//! never waits on, retries, or rolls back because of the surface.

mod boundary;
mod file;
mod types;

pub use boundary::{MemoryBoundary, MemorySurface, NullBoundary, SyncBoundary, SyncPublisher};
pub use file::FileBoundary;
pub use types::{RemoteEvent, SyncSnapshot};
