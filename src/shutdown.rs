use tokio::sync::broadcast;

/// Global cancellation: one send stops the run.
pub type ShutdownSender = broadcast::Sender<()>;
pub type ShutdownReceiver = broadcast::Receiver<()>;
