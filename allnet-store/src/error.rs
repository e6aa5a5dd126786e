use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O failure accessing the store: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed key file")]
    MalformedKey,
    #[error("malformed address file")]
    MalformedAddress,
    #[error("malformed AHRA: {0}")]
    MalformedAhra(String),
    #[error("a contact named {0:?} already has a public key")]
    ContactAlreadyHasKey(String),
}
