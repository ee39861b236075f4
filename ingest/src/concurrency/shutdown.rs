//! Shutdown signaling for the import loop.
//!
//! Abstracts a tokio watch channel into a pair of shutdown handle types. The signal
//! carries no payload; a change notification means the loop should stop at the next
//! page boundary.

use tokio::sync::watch;

/// Transmitter side of the shutdown channel.
pub type ShutdownTx = watch::Sender<()>;

/// Receiver side of the shutdown channel.
pub type ShutdownRx = watch::Receiver<()>;

/// Creates the channel used to ask the import loop to stop.
pub fn create_shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    watch::channel(())
}
