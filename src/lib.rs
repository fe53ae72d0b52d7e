//! # sigscript
//!
//! Manual construction and verification of Pay-to-Pubkey (P2PK)
//! signature scripts for legacy Bitcoin transactions.
//!
//! A spender proves they may consume a previous output by replacing the
//! input's placeholder script with a signature script: a single data push
//! holding the DER-encoded ECDSA signature over the transaction's
//! signature hash, with the sighash-type byte appended. A verifier
//! pushes that data onto a stack, runs the locking script against it,
//! and accepts the input only if exactly one truthy element remains.
//!
//! This crate implements the full path: legacy signature-hash
//! computation with script substitution, signing, push-exact script
//! assembly, and a stack-machine interpreter for the combined check.
//! Node I/O and key custody stay outside; keys enter as decoded bytes
//! (WIF helpers are provided for the bitcoin-cli regtest workflow).
//!
//! ## Usage
//!
//! ```rust
//! use sigscript::{SigScriptEngine, SigHashType};
//! use sigscript::keys::{Network, PrivateKey};
//! use sigscript::sigscript::p2pk_script_pubkey;
//! use sigscript::types::{OutPoint, Transaction};
//!
//! let engine = SigScriptEngine::new();
//! let spender = PrivateKey::generate(Network::Regtest);
//! let locking = p2pk_script_pubkey(&spender.public_key_bytes(engine.secp()));
//!
//! let mut tx = Transaction::new();
//! tx.add_input(OutPoint::new([0x11; 32], 0), locking.clone());
//! tx.add_output(4_800_000_000, vec![0x51]);
//!
//! let script_sig = engine
//!     .build(&mut tx, 0, &locking, &spender.secret_bytes(), SigHashType::ALL)
//!     .unwrap();
//! assert!(engine.verify(&locking, &tx, 0, &script_sig));
//! ```

pub mod constants;
pub mod error;
pub mod keys;
pub mod script;
pub mod sighash;
pub mod sigscript;
pub mod transaction;
pub mod types;

// Re-export commonly used types
pub use constants::*;
pub use error::{Result, SigScriptError};
pub use sighash::SigHashType;
pub use types::*;

use secp256k1::{All, Secp256k1};

/// Signature-script builder/verifier holding a reusable secp256k1
/// context.
pub struct SigScriptEngine {
    secp: Secp256k1<All>,
}

impl SigScriptEngine {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::new(),
        }
    }

    /// The underlying secp256k1 context, for callers deriving public
    /// keys alongside signing.
    pub fn secp(&self) -> &Secp256k1<All> {
        &self.secp
    }

    /// Build the signature script for one input and attach it.
    ///
    /// See [`sigscript::build_signature_script`].
    pub fn build(
        &self,
        tx: &mut Transaction,
        input_index: usize,
        locking_script: &[u8],
        private_key: &[u8],
        hash_type: SigHashType,
    ) -> Result<ByteString> {
        sigscript::build_signature_script(
            &self.secp,
            tx,
            input_index,
            locking_script,
            private_key,
            hash_type,
        )
    }

    /// Sign every input of a transaction against its locking script.
    ///
    /// See [`sigscript::sign_all_inputs`].
    pub fn sign_all(
        &self,
        tx: &mut Transaction,
        locking_scripts: &[ByteString],
        private_key: &[u8],
        hash_type: SigHashType,
    ) -> Result<()> {
        sigscript::sign_all_inputs(&self.secp, tx, locking_scripts, private_key, hash_type)
    }

    /// Verify a signature script against the locking script it spends.
    /// Rejection is reported as `false`, never as an abort.
    ///
    /// See [`sigscript::verify_signature_script`].
    pub fn verify(
        &self,
        locking_script: &[u8],
        tx: &Transaction,
        input_index: usize,
        script_sig: &[u8],
    ) -> bool {
        sigscript::verify_signature_script(&self.secp, locking_script, tx, input_index, script_sig)
    }
}

impl Default for SigScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}
