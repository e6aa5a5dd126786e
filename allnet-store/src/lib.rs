//! On-disk contact/keyset store, spare RSA key pool, and broadcast-key
//! (AHRA) derivation and verification (spec §3/§4.7/§6).

pub mod address_file;
pub mod ahra;
pub mod bc_keys;
pub mod error;
pub mod key_request;
pub mod keyd;
pub mod keyset;
pub mod pem;
pub mod spare;

pub use ahra::{generate_key, make_address, verify_bc_key, Ahra};
pub use bc_keys::BcKeyStore;
pub use error::StoreError;
pub use key_request::respond_to_key_request;
pub use keyd::{maintain_pool, SpareKeyScheduler, MAX_SPARE_KEYS, MIN_INTERVAL_MS};
pub use keyset::{ContactStore, Keyset, KeysetId};
pub use spare::SparePool;
