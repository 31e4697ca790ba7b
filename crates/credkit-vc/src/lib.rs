//! # credkit-vc: Verifiable Credentials
//!
//! Credential-level operations built on the core, crypto, and status
//! crates:
//!
//! - **Credential** (`credential.rs`): the free-form credential document
//!   with envelope validation at the boundary, and the `credentialStatus`
//!   claim.
//!
//! - **Proof** (`proof.rs`): Data Integrity proof options, attached proofs,
//!   and the two supported cryptosuites.
//!
//! - **Integrity** (`integrity.rs`): the proof engine. Signs and verifies
//!   over `SHA-256(canon(options)) || SHA-256(canon(credential))`.
//!
//! - **Status** (`status.rs`): status claims and the
//!   `BitstringStatusListCredential` regenerated from the registry.
//!
//! - **Verify** (`verify.rs`): the verification orchestrator. One verdict
//!   from signature validity and revocation state.
//!
//! - **Issue** (`issue.rs`): OpenBadgeCredential construction from
//!   achievement templates.
//!
//! ## Security Invariant
//!
//! A credential whose signature is valid but whose status is revoked is
//! reported as `Revoked`, never as verified.

pub mod credential;
pub mod error;
pub mod integrity;
pub mod issue;
pub mod proof;
pub mod status;
pub mod verify;

pub use credential::{Credential, CredentialStatus};
pub use error::{ProofError, VcError};
pub use integrity::ProofEngine;
pub use issue::{CredentialIssuer, IssueRequest, IssuerProfile};
pub use proof::{Cryptosuite, Proof, ProofOptions};
pub use status::{decode_status_list, status_list_credential, StatusListConfig};
pub use verify::{
    FailureKind, KeyResolver, RevocationStatus, StaticKeyResolver, StatusListFetcher,
    StatusSource, VerificationReport, VerificationStatus, Verifier,
};
