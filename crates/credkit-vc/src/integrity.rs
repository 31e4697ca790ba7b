//! # Proof Engine
//!
//! Signs and verifies Data Integrity proofs over credentials.
//!
//! ## Signing input
//!
//! ```text
//! SHA-256(canon(proof options)) || SHA-256(canon(credential without proof))
//! ```
//!
//! The 64-byte concatenation, proof-options digest first, is what Ed25519
//! signs. Raw documents are never signed.
//!
//! ## Proof-options context
//!
//! Under `eddsa-rdfc-2022` the options are canonicalized with the
//! credential's own `@context` injected, or with
//! `[credentials v2, data-integrity v2]` when the credential declares none.
//! The attached proof never carries that context.

use serde_json::Value;

use credkit_core::{
    sha256_digest, Canonicalizers, Timestamp, CREDENTIALS_V2_CONTEXT, DATA_INTEGRITY_V2_CONTEXT,
};
use credkit_crypto::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, SigningInput};

use crate::credential::Credential;
use crate::error::ProofError;
use crate::proof::{Cryptosuite, Proof, ProofOptions};

/// Signs and verifies proofs with a fixed set of canonicalizers.
#[derive(Debug, Clone, Default)]
pub struct ProofEngine {
    canonicalizers: Canonicalizers,
}

impl ProofEngine {
    /// An engine using `canonicalizers`.
    pub fn new(canonicalizers: Canonicalizers) -> Self {
        Self { canonicalizers }
    }

    /// The canonicalizers in use.
    pub fn canonicalizers(&self) -> &Canonicalizers {
        &self.canonicalizers
    }

    /// Sign `credential`, replacing any existing proof.
    ///
    /// Signing the same credential twice with the same `created` yields an
    /// identical proof.
    pub fn sign(
        &self,
        credential: &Credential,
        keypair: &Ed25519KeyPair,
        verification_method: &str,
        cryptosuite: Cryptosuite,
        created: Timestamp,
    ) -> Result<Credential, ProofError> {
        let options = ProofOptions::new(cryptosuite, verification_method, created);
        let input = self.signing_input(&options, credential)?;
        let signature = keypair.sign(&input);

        let proof = Proof {
            options,
            proof_value: signature.to_multibase(),
        };
        let mut signed = credential.clone();
        signed.set_proof(proof.to_value());

        tracing::debug!(
            credential = credential.id(),
            cryptosuite = %cryptosuite,
            verification_method,
            "signed credential"
        );
        Ok(signed)
    }

    /// Parse the attached proof without checking the signature.
    pub fn parse_proof(&self, credential: &Credential) -> Result<Proof, ProofError> {
        let value = credential.proof().ok_or(ProofError::MissingProof)?;
        Proof::parse(value)
    }

    /// Verify the attached proof under `public_key`. Returns the parsed
    /// proof on success.
    ///
    /// Revocation is not consulted here; see
    /// [`Verifier`](crate::verify::Verifier).
    pub fn verify(
        &self,
        credential: &Credential,
        public_key: &Ed25519PublicKey,
    ) -> Result<Proof, ProofError> {
        let proof = self.parse_proof(credential)?;
        self.verify_parsed(credential, &proof, public_key)?;
        Ok(proof)
    }

    /// Verify an already parsed proof.
    pub fn verify_parsed(
        &self,
        credential: &Credential,
        proof: &Proof,
        public_key: &Ed25519PublicKey,
    ) -> Result<(), ProofError> {
        let signature = Ed25519Signature::from_multibase(&proof.proof_value)
            .map_err(|e| ProofError::SignatureInvalid(e.to_string()))?;
        let input = self.signing_input(&proof.options, credential)?;
        credkit_crypto::verify(&input, &signature, public_key)
            .map_err(|e| ProofError::SignatureInvalid(e.to_string()))
    }

    /// The 64-byte input signed for `options` over `credential`.
    pub fn signing_input(
        &self,
        options: &ProofOptions,
        credential: &Credential,
    ) -> Result<SigningInput, ProofError> {
        let algorithm = options.cryptosuite.algorithm();
        let context = options
            .cryptosuite
            .injects_context()
            .then(|| options_context(credential));

        let canonical_options = self
            .canonicalizers
            .canonicalize(algorithm, &options.to_document(context.as_ref()))?;
        let canonical_document = self
            .canonicalizers
            .canonicalize(algorithm, &credential.without_proof())?;

        Ok(SigningInput::new(
            &sha256_digest(&canonical_options),
            &sha256_digest(&canonical_document),
        ))
    }
}

fn options_context(credential: &Credential) -> Value {
    credential.context().cloned().unwrap_or_else(|| {
        Value::Array(vec![
            Value::String(CREDENTIALS_V2_CONTEXT.to_string()),
            Value::String(DATA_INTEGRITY_V2_CONTEXT.to_string()),
        ])
    })
}
