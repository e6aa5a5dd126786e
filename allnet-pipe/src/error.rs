use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipeError {
    #[error("I/O failure on pipe: {0}")]
    Io(#[from] std::io::Error),
    #[error("no pipe in the set is registered under that token")]
    UnknownToken,
}
