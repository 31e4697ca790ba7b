//! # credkit-status: Revocation Status
//!
//! The bitstring status list and the registry that assigns each credential
//! a permanent bit position.
//!
//! - **Bitstring** (`bitstring.rs`): fixed-size bit vector, MSB-first
//!   within each byte, with the gzip + unpadded base64url `encodedList`
//!   codec.
//!
//! - **Registry** (`registry.rs`): identity → `{index, revoked, revoked_at,
//!   issued_at}` with idempotent allocation, revoke/unrevoke, single and
//!   prefix rename, and invariant validation.
//!
//! - **Store** (`store.rs`): the registry file, mutated only under an
//!   exclusive lock file and persisted by atomic rename.

pub mod bitstring;
pub mod error;
pub mod registry;
pub mod store;

pub use bitstring::{decode_list, encode_list, Bitstring, DEFAULT_LIST_SIZE};
pub use error::StatusError;
pub use registry::{RegistryStats, StatusEntry, StatusRegistry};
pub use store::{RegistryStore, DEFAULT_LOCK_TIMEOUT, DEFAULT_STALE_LOCK_AGE};
