pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid task count {0}: must be zero or greater")]
    InvalidTaskCount(i64),

    #[error("config error: {0}")]
    Config(String),

    #[error("acknowledge called more times than tasks were enqueued")]
    AckWithoutTask,

    #[error("timed out waiting for the queue to drain")]
    Timeout,

    #[error("worker panic: {0}")]
    WorkerPanic(String),

    #[error("join failed: {0}")]
    JoinFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Turns a panic payload into a readable message.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Error::WorkerPanic(msg)
    }
}
