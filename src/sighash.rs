//! Legacy signature-hash computation
//!
//! The digest a spender signs commits to a modified view of the spending
//! transaction: the targeted input temporarily carries the locking script
//! of the output being spent, every other input carries an empty script,
//! and inputs/outputs are included or excluded according to the sighash
//! type. Amounts of the spent outputs are not part of this legacy scheme.

use crate::error::{Result, SigScriptError};
use crate::transaction::{sha256d, write_compact_size};
use crate::types::*;

pub const SIGHASH_ALL: u8 = 0x01;
pub const SIGHASH_NONE: u8 = 0x02;
pub const SIGHASH_SINGLE: u8 = 0x03;
pub const SIGHASH_ANYONECANPAY: u8 = 0x80;

/// The 8-bit tag carried as the last byte of a signature payload,
/// instructing verifiers which parts of the transaction the signature
/// commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigHashType(u8);

impl SigHashType {
    /// Commit to all inputs and outputs.
    pub const ALL: SigHashType = SigHashType(SIGHASH_ALL);
    /// Commit to no outputs.
    pub const NONE: SigHashType = SigHashType(SIGHASH_NONE);
    /// Commit only to the output paired with the signed input.
    pub const SINGLE: SigHashType = SigHashType(SIGHASH_SINGLE);

    /// Read the type back from the trailing byte of a signature payload.
    pub fn from_byte(byte: u8) -> Self {
        SigHashType(byte)
    }

    pub fn as_byte(self) -> u8 {
        self.0
    }

    /// Base mode with the modifier flags masked off.
    pub fn base(self) -> u8 {
        self.0 & 0x1f
    }

    pub fn anyone_can_pay(self) -> bool {
        self.0 & SIGHASH_ANYONECANPAY != 0
    }

    pub fn with_anyone_can_pay(self) -> Self {
        SigHashType(self.0 | SIGHASH_ANYONECANPAY)
    }
}

impl Default for SigHashType {
    fn default() -> Self {
        Self::ALL
    }
}

fn write_sighash_input(buf: &mut ByteString, input: &TxInput, script: &[u8], sequence: u32) {
    buf.extend_from_slice(&input.prevout.hash);
    buf.extend_from_slice(&(input.prevout.index as u32).to_le_bytes());
    write_compact_size(buf, script.len() as u64);
    buf.extend_from_slice(script);
    buf.extend_from_slice(&sequence.to_le_bytes());
}

/// Compute the digest signed for `tx.inputs[input_index]`.
///
/// `script_code` is the locking script of the output being spent. The
/// serialization rules:
/// 1. the targeted input carries `script_code`, all others an empty script
/// 2. under NONE/SINGLE the other inputs' sequence fields serialize as zero
/// 3. under ANYONECANPAY only the targeted input is serialized
/// 4. NONE serializes no outputs; SINGLE serializes outputs up to and
///    including the target index, earlier slots nulled (value -1, empty
///    script); everything else serializes all outputs
/// 5. the 4-byte hash type is appended, then double SHA-256
pub fn signature_hash(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    hash_type: SigHashType,
) -> Result<Hash> {
    if input_index >= tx.inputs.len() {
        return Err(SigScriptError::InvalidReference(format!(
            "input index {} out of range for {} inputs",
            input_index,
            tx.inputs.len()
        )));
    }

    // Historical bitcoind behavior: SIGHASH_SINGLE with no matching output
    // signs the constant-1 digest instead of failing.
    if hash_type.base() == SIGHASH_SINGLE && input_index >= tx.outputs.len() {
        let mut one = [0u8; 32];
        one[0] = 1;
        return Ok(one);
    }

    let mut buf: ByteString = Vec::with_capacity(256);
    buf.extend_from_slice(&(tx.version as u32).to_le_bytes());

    if hash_type.anyone_can_pay() {
        write_compact_size(&mut buf, 1);
        let target = &tx.inputs[input_index];
        write_sighash_input(&mut buf, target, script_code, target.sequence as u32);
    } else {
        write_compact_size(&mut buf, tx.inputs.len() as u64);
        for (i, input) in tx.inputs.iter().enumerate() {
            let script: &[u8] = if i == input_index { script_code } else { &[] };
            let zero_sequence = i != input_index
                && matches!(hash_type.base(), SIGHASH_NONE | SIGHASH_SINGLE);
            let sequence = if zero_sequence { 0 } else { input.sequence as u32 };
            write_sighash_input(&mut buf, input, script, sequence);
        }
    }

    match hash_type.base() {
        SIGHASH_NONE => write_compact_size(&mut buf, 0),
        SIGHASH_SINGLE => {
            write_compact_size(&mut buf, input_index as u64 + 1);
            for _ in 0..input_index {
                buf.extend_from_slice(&(-1i64).to_le_bytes());
                write_compact_size(&mut buf, 0);
            }
            let target = &tx.outputs[input_index];
            buf.extend_from_slice(&target.value.to_le_bytes());
            write_compact_size(&mut buf, target.script_pubkey.len() as u64);
            buf.extend_from_slice(&target.script_pubkey);
        }
        _ => {
            write_compact_size(&mut buf, tx.outputs.len() as u64);
            for output in &tx.outputs {
                buf.extend_from_slice(&output.value.to_le_bytes());
                write_compact_size(&mut buf, output.script_pubkey.len() as u64);
                buf.extend_from_slice(&output.script_pubkey);
            }
        }
    }

    buf.extend_from_slice(&(tx.lock_time as u32).to_le_bytes());
    buf.extend_from_slice(&(hash_type.as_byte() as u32).to_le_bytes());

    Ok(sha256d(&buf))
}
