use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("index {index} is out of range for a queue of {len} tracks")]
    IndexOutOfRange { index: i64, len: usize },
}
