//! Legacy transaction serialization and structural checks

use crate::constants::*;
use crate::error::Result;
use crate::types::*;
use bitcoin_hashes::sha256d::Hash as Sha256dHash;
use bitcoin_hashes::Hash as BitcoinHash;

/// Double SHA-256 of `data`.
pub fn sha256d(data: &[u8]) -> Hash {
    let digest = Sha256dHash::hash(data);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&digest);
    hash
}

/// Append a Bitcoin compact-size integer to `buf`.
pub fn write_compact_size(buf: &mut ByteString, n: u64) {
    match n {
        0..=0xfc => buf.push(n as u8),
        0xfd..=0xffff => {
            buf.push(0xfd);
            buf.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            buf.push(0xfe);
            buf.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            buf.push(0xff);
            buf.extend_from_slice(&n.to_le_bytes());
        }
    }
}

fn write_script(buf: &mut ByteString, script: &[u8]) {
    write_compact_size(buf, script.len() as u64);
    buf.extend_from_slice(script);
}

/// Serialize a transaction in the legacy wire format (no witness data).
///
/// Layout: version, input count, inputs (outpoint, scriptSig, sequence),
/// output count, outputs (value, scriptPubKey), lock time. All integer
/// fields little-endian.
pub fn serialize_transaction(tx: &Transaction) -> ByteString {
    let mut buf = Vec::with_capacity(64 + 64 * tx.inputs.len() + 40 * tx.outputs.len());
    buf.extend_from_slice(&(tx.version as u32).to_le_bytes());
    write_compact_size(&mut buf, tx.inputs.len() as u64);
    for input in &tx.inputs {
        buf.extend_from_slice(&input.prevout.hash);
        buf.extend_from_slice(&(input.prevout.index as u32).to_le_bytes());
        write_script(&mut buf, &input.script_sig);
        buf.extend_from_slice(&(input.sequence as u32).to_le_bytes());
    }
    write_compact_size(&mut buf, tx.outputs.len() as u64);
    for output in &tx.outputs {
        buf.extend_from_slice(&output.value.to_le_bytes());
        write_script(&mut buf, &output.script_pubkey);
    }
    buf.extend_from_slice(&(tx.lock_time as u32).to_le_bytes());
    buf
}

/// Transaction id: double SHA-256 of the serialized transaction, in
/// internal byte order.
pub fn txid(tx: &Transaction) -> Hash {
    sha256d(&serialize_transaction(tx))
}

/// Render a hash in the reversed hex form bitcoin-cli displays.
pub fn txid_hex(hash: &Hash) -> String {
    let mut reversed = *hash;
    reversed.reverse();
    hex::encode(reversed)
}

/// Serialized size of a transaction in bytes.
pub fn serialized_size(tx: &Transaction) -> usize {
    serialize_transaction(tx).len()
}

/// Structural sanity check, run before handing a transaction to the
/// operator for broadcast.
///
/// A transaction is structurally valid if and only if:
/// 1. it has at least one input and one output
/// 2. every output value is within [0, MAX_MONEY]
/// 3. input and output counts are within limits
/// 4. the serialized size is within MAX_TX_SIZE
pub fn check_transaction(tx: &Transaction) -> Result<ValidationResult> {
    if tx.inputs.is_empty() || tx.outputs.is_empty() {
        return Ok(ValidationResult::Invalid(
            "Empty inputs or outputs".to_string(),
        ));
    }

    for (i, output) in tx.outputs.iter().enumerate() {
        if output.value < 0 || output.value > MAX_MONEY {
            return Ok(ValidationResult::Invalid(format!(
                "Invalid output value {} at index {}",
                output.value, i
            )));
        }
    }

    if tx.inputs.len() > MAX_INPUTS {
        return Ok(ValidationResult::Invalid(format!(
            "Too many inputs: {}",
            tx.inputs.len()
        )));
    }

    if tx.outputs.len() > MAX_OUTPUTS {
        return Ok(ValidationResult::Invalid(format!(
            "Too many outputs: {}",
            tx.outputs.len()
        )));
    }

    let tx_size = serialized_size(tx);
    if tx_size > MAX_TX_SIZE {
        return Ok(ValidationResult::Invalid(format!(
            "Transaction too large: {} bytes",
            tx_size
        )));
    }

    Ok(ValidationResult::Valid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_in_one_out() -> Transaction {
        let mut tx = Transaction::new();
        tx.add_input(OutPoint::new([7; 32], 0), vec![]);
        tx.add_output(1000, vec![0x51]);
        tx
    }

    #[test]
    fn test_compact_size_boundaries() {
        let mut buf = Vec::new();
        write_compact_size(&mut buf, 0xfc);
        assert_eq!(buf, vec![0xfc]);

        buf.clear();
        write_compact_size(&mut buf, 0xfd);
        assert_eq!(buf, vec![0xfd, 0xfd, 0x00]);

        buf.clear();
        write_compact_size(&mut buf, 0xffff);
        assert_eq!(buf, vec![0xfd, 0xff, 0xff]);

        buf.clear();
        write_compact_size(&mut buf, 0x1_0000);
        assert_eq!(buf, vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn test_serialize_layout() {
        let tx = one_in_one_out();
        let bytes = serialize_transaction(&tx);
        // version(4) + count(1) + outpoint(36) + script_len(1) + sequence(4)
        // + count(1) + value(8) + script_len(1) + script(1) + lock_time(4)
        assert_eq!(bytes.len(), 61);
        assert_eq!(&bytes[0..4], &[1, 0, 0, 0]);
        assert_eq!(bytes[4], 1); // input count
        assert_eq!(&bytes[5..37], &[7u8; 32][..]);
        assert_eq!(bytes[bytes.len() - 5], 0x51);
    }

    #[test]
    fn test_txid_commits_to_outputs() {
        let tx = one_in_one_out();
        let id = txid(&tx);
        assert_eq!(id, txid(&tx));

        let mut mutated = tx.clone();
        mutated.outputs[0].value += 1;
        assert_ne!(id, txid(&mutated));
    }

    #[test]
    fn test_txid_hex_is_reversed() {
        let mut hash = [0u8; 32];
        hash[0] = 0xab;
        assert!(txid_hex(&hash).ends_with("ab"));
    }

    #[test]
    fn test_check_transaction_valid() {
        assert_eq!(
            check_transaction(&one_in_one_out()).unwrap(),
            ValidationResult::Valid
        );
    }

    #[test]
    fn test_check_transaction_empty_inputs() {
        let mut tx = Transaction::new();
        tx.add_output(1000, vec![]);
        assert!(matches!(
            check_transaction(&tx).unwrap(),
            ValidationResult::Invalid(_)
        ));
    }

    #[test]
    fn test_check_transaction_negative_value() {
        let mut tx = one_in_one_out();
        tx.outputs[0].value = -1;
        assert!(matches!(
            check_transaction(&tx).unwrap(),
            ValidationResult::Invalid(_)
        ));
    }

    #[test]
    fn test_check_transaction_value_above_max() {
        let mut tx = one_in_one_out();
        tx.outputs[0].value = MAX_MONEY + 1;
        assert!(matches!(
            check_transaction(&tx).unwrap(),
            ValidationResult::Invalid(_)
        ));
    }

    #[test]
    fn test_check_transaction_oversized() {
        let mut tx = one_in_one_out();
        tx.inputs[0].script_sig = vec![0; MAX_TX_SIZE];
        assert!(matches!(
            check_transaction(&tx).unwrap(),
            ValidationResult::Invalid(_)
        ));
    }
}
