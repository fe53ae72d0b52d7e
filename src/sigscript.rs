//! Pay-to-Pubkey signature-script construction and verification
//!
//! The signature script for a P2PK input is a single data push holding
//! the DER-encoded ECDSA signature with the sighash-type byte appended:
//! `[pushLen][DER signature][sighashType]`, where `pushLen` equals the
//! payload length. Building computes the signature hash against the
//! locking script being spent, signs it, and attaches the result to the
//! input; verification re-derives the hash from the trailing type byte
//! and checks both the raw signature and the combined script evaluation.

use crate::error::{Result, SigScriptError};
use crate::script::{self, push_data, TxSignatureChecker, OP_CHECKSIG};
use crate::sighash::{signature_hash, SigHashType};
use crate::types::*;
use secp256k1::{
    ecdsa::Signature, Message, PublicKey, Secp256k1, SecretKey, Signing, Verification,
};

/// Build a P2PK locking script: `<pubkey> OP_CHECKSIG`.
pub fn p2pk_script_pubkey(pubkey: &[u8]) -> ByteString {
    let mut script = push_data(pubkey);
    script.push(OP_CHECKSIG);
    script
}

/// Extract the public key embedded in a P2PK locking script, if the
/// script has that exact shape.
pub fn extract_p2pk_pubkey(script_pubkey: &[u8]) -> Option<&[u8]> {
    let (&push_len, rest) = script_pubkey.split_first()?;
    let len = push_len as usize;
    if len != 33 && len != 65 {
        return None;
    }
    if rest.len() != len + 1 || rest[len] != OP_CHECKSIG {
        return None;
    }
    Some(&rest[..len])
}

pub fn is_p2pk(script_pubkey: &[u8]) -> bool {
    extract_p2pk_pubkey(script_pubkey).is_some()
}

/// Sign a signature hash with raw 32-byte private-key material.
///
/// Returns the signature payload: DER signature with the sighash-type
/// byte appended.
pub fn generate_signature<C: Signing>(
    secp: &Secp256k1<C>,
    private_key: &[u8],
    hash: &Hash,
    hash_type: SigHashType,
) -> Result<ByteString> {
    let secret_key =
        SecretKey::from_slice(private_key).map_err(|e| SigScriptError::InvalidKey(e.to_string()))?;
    let signature = secp.sign_ecdsa(&Message::from_digest(*hash), &secret_key);
    let mut payload = signature.serialize_der().to_vec();
    payload.push(hash_type.as_byte());
    Ok(payload)
}

/// Build the signature script for `tx.inputs[input_index]` spending a
/// P2PK output locked by `locking_script`, and attach it to the input.
///
/// The push opcode is computed from the final payload length (DER
/// signature plus type byte), so no length patching is ever needed.
pub fn build_signature_script<C: Signing>(
    secp: &Secp256k1<C>,
    tx: &mut Transaction,
    input_index: usize,
    locking_script: &[u8],
    private_key: &[u8],
    hash_type: SigHashType,
) -> Result<ByteString> {
    if input_index >= tx.inputs.len() {
        return Err(SigScriptError::InvalidReference(format!(
            "input index {} out of range for {} inputs",
            input_index,
            tx.inputs.len()
        )));
    }

    let hash = signature_hash(tx, input_index, locking_script, hash_type)?;
    let payload = generate_signature(secp, private_key, &hash, hash_type)?;
    let script_sig = push_data(&payload);

    tx.inputs[input_index].script_sig = script_sig.clone();
    Ok(script_sig)
}

/// Sign every input of `tx` with one key, each against its own locking
/// script. `locking_scripts[i]` locks the output spent by input `i`.
pub fn sign_all_inputs<C: Signing>(
    secp: &Secp256k1<C>,
    tx: &mut Transaction,
    locking_scripts: &[ByteString],
    private_key: &[u8],
    hash_type: SigHashType,
) -> Result<()> {
    if locking_scripts.len() != tx.inputs.len() {
        return Err(SigScriptError::InvalidReference(format!(
            "{} locking scripts supplied for {} inputs",
            locking_scripts.len(),
            tx.inputs.len()
        )));
    }
    for (i, locking_script) in locking_scripts.iter().enumerate() {
        build_signature_script(secp, tx, i, locking_script, private_key, hash_type)?;
    }
    Ok(())
}

/// Split a P2PK signature script into its DER signature and sighash type.
///
/// The script must be exactly one direct data push; the length-prefix
/// byte must equal the payload length that follows it.
pub fn extract_signature(script_sig: &[u8]) -> Result<(ByteString, SigHashType)> {
    let (&push_len, payload) = script_sig.split_first().ok_or_else(|| {
        SigScriptError::MalformedScript("empty signature script".to_string())
    })?;

    if !(1..=0x4b).contains(&push_len) {
        return Err(SigScriptError::MalformedScript(format!(
            "expected a single direct push, got opcode 0x{:02x}",
            push_len
        )));
    }
    if payload.len() != push_len as usize {
        return Err(SigScriptError::MalformedScript(format!(
            "push length byte {} does not match payload of {} bytes",
            push_len,
            payload.len()
        )));
    }
    if payload.len() < 2 {
        return Err(SigScriptError::MalformedScript(
            "signature payload too short".to_string(),
        ));
    }

    let (der, tail) = payload.split_at(payload.len() - 1);
    Ok((der.to_vec(), SigHashType::from_byte(tail[0])))
}

/// Raw signature check: verify the DER signature carried by `script_sig`
/// against the recomputed signature hash, using the public key embedded
/// in the P2PK locking script.
///
/// Logically subsumed by the full script evaluation, but kept separate so
/// signature-algorithm failures can be told apart from
/// script-interpretation failures.
pub fn check_signature<C: Verification>(
    secp: &Secp256k1<C>,
    locking_script: &[u8],
    tx: &Transaction,
    input_index: usize,
    script_sig: &[u8],
) -> Result<()> {
    let (der, hash_type) = extract_signature(script_sig)?;
    let pubkey_bytes = extract_p2pk_pubkey(locking_script).ok_or_else(|| {
        SigScriptError::MalformedScript("locking script is not pay-to-pubkey".to_string())
    })?;
    let pubkey = PublicKey::from_slice(pubkey_bytes)
        .map_err(|e| SigScriptError::MalformedScript(format!("invalid public key: {}", e)))?;
    let signature = Signature::from_der(&der)
        .map_err(|e| SigScriptError::SignatureMismatch(format!("invalid DER signature: {}", e)))?;

    let hash = signature_hash(tx, input_index, locking_script, hash_type)?;
    secp.verify_ecdsa(&Message::from_digest(hash), &signature, &pubkey)
        .map_err(|e| SigScriptError::SignatureMismatch(e.to_string()))
}

/// Verify a signature script against the locking script it spends.
///
/// Both the raw signature check and the combined script evaluation must
/// succeed. Every cryptographic or script failure folds into `false`;
/// rejection is a normal outcome, not a fatal abort.
pub fn verify_signature_script<C: Verification>(
    secp: &Secp256k1<C>,
    locking_script: &[u8],
    tx: &Transaction,
    input_index: usize,
    script_sig: &[u8],
) -> bool {
    if input_index >= tx.inputs.len() {
        return false;
    }
    if check_signature(secp, locking_script, tx, input_index, script_sig).is_err() {
        return false;
    }
    let checker = TxSignatureChecker { tx, input_index };
    script::verify_script(script_sig, locking_script, &checker).unwrap_or(false)
}
