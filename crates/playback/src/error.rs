use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("Position {index} out of range for {len} files")]
    SeekOutOfRange { index: usize, len: usize },
}

pub type PlaybackResult<T> = Result<T, PlaybackError>;
