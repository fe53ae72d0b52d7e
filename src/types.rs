//! Core transaction types for signature-script construction

use crate::constants::SEQUENCE_FINAL;
use serde::{Deserialize, Serialize};

/// Hash type: 256-bit hash
pub type Hash = [u8; 32];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Natural number type
pub type Natural = u64;

/// Integer type (satoshi amounts)
pub type Integer = i64;

/// Reference to one output of a prior transaction.
///
/// `hash` is stored in serialized (internal) byte order. bitcoin-cli and
/// block explorers display txids reversed; use [`OutPoint::from_txid_hex`]
/// when pasting ids from there.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub hash: Hash,
    pub index: Natural,
}

impl OutPoint {
    pub fn new(hash: Hash, index: Natural) -> Self {
        Self { hash, index }
    }

    /// Parse an outpoint from the display-order txid hex bitcoin-cli emits.
    pub fn from_txid_hex(txid: &str, index: Natural) -> Option<Self> {
        let bytes = hex::decode(txid).ok()?;
        if bytes.len() != 32 {
            return None;
        }
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes);
        hash.reverse();
        Some(Self { hash, index })
    }
}

/// Transaction input: outpoint plus the script proving the spend.
///
/// `script_sig` initially holds the locking script of the output being
/// spent as a placeholder; signing replaces it with the signature script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub prevout: OutPoint,
    pub script_sig: ByteString,
    pub sequence: Natural,
}

impl TxInput {
    pub fn new(prevout: OutPoint, placeholder_script: ByteString) -> Self {
        Self {
            prevout,
            script_sig: placeholder_script,
            sequence: SEQUENCE_FINAL as Natural,
        }
    }
}

/// Transaction output: amount plus locking script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: Integer,
    pub script_pubkey: ByteString,
}

impl TxOutput {
    pub fn new(value: Integer, script_pubkey: ByteString) -> Self {
        Self {
            value,
            script_pubkey,
        }
    }
}

/// Transaction: ordered inputs and outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: Natural,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub lock_time: Natural,
}

impl Transaction {
    /// Create an empty version-1 transaction.
    pub fn new() -> Self {
        Self {
            version: 1,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
        }
    }

    /// Append an input spending `prevout`. The placeholder script is
    /// conventionally the locking script of the output being spent.
    pub fn add_input(&mut self, prevout: OutPoint, placeholder_script: ByteString) -> &mut TxInput {
        self.inputs.push(TxInput::new(prevout, placeholder_script));
        self.inputs.last_mut().unwrap()
    }

    /// Append an output paying `value` satoshis to `script_pubkey`.
    pub fn add_output(&mut self, value: Integer, script_pubkey: ByteString) -> &mut TxOutput {
        self.outputs.push(TxOutput::new(value, script_pubkey));
        self.outputs.last_mut().unwrap()
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

/// Validation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outpoint_from_txid_hex_reverses_order() {
        let txid = "0478a7b4f260df599bfb114c8043e2d8925e16b622d12294a4936625ab8ba470";
        let outpoint = OutPoint::from_txid_hex(txid, 0).unwrap();
        // Internal order is the byte-reverse of the display order.
        assert_eq!(outpoint.hash[0], 0x70);
        assert_eq!(outpoint.hash[31], 0x04);
        assert_eq!(outpoint.index, 0);
    }

    #[test]
    fn test_outpoint_from_txid_hex_rejects_bad_input() {
        assert!(OutPoint::from_txid_hex("zz", 0).is_none());
        assert!(OutPoint::from_txid_hex("abcd", 0).is_none());
    }

    #[test]
    fn test_add_input_holds_placeholder_script() {
        let mut tx = Transaction::new();
        tx.add_input(OutPoint::new([1; 32], 0), vec![0xac]);
        assert_eq!(tx.inputs.len(), 1);
        assert_eq!(tx.inputs[0].script_sig, vec![0xac]);
        assert_eq!(tx.inputs[0].sequence, SEQUENCE_FINAL as Natural);
    }

    #[test]
    fn test_add_output() {
        let mut tx = Transaction::new();
        tx.add_output(4_800_000_000, vec![0x51]);
        assert_eq!(tx.outputs[0].value, 4_800_000_000);
        assert_eq!(tx.outputs[0].script_pubkey, vec![0x51]);
    }
}
