//! Script execution engine
//!
//! Scripts are opaque byte sequences interpreted by a stack machine.
//! Verification pushes the signature script's data onto the stack, then
//! executes the locking script's opcodes against it; the combined run
//! must end with exactly one truthy element.

use crate::constants::*;
use crate::error::{Result, SigScriptError};
use crate::sighash::{signature_hash, SigHashType};
use crate::types::*;
use ripemd::Ripemd160;
use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1};
use sha2::{Digest, Sha256};

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_1: u8 = 0x51;
pub const OP_16: u8 = 0x60;
pub const OP_NOP: u8 = 0x61;
pub const OP_VERIFY: u8 = 0x69;
pub const OP_RETURN: u8 = 0x6a;
pub const OP_IFDUP: u8 = 0x73;
pub const OP_DEPTH: u8 = 0x74;
pub const OP_DROP: u8 = 0x75;
pub const OP_DUP: u8 = 0x76;
pub const OP_NIP: u8 = 0x77;
pub const OP_OVER: u8 = 0x78;
pub const OP_SWAP: u8 = 0x7c;
pub const OP_SIZE: u8 = 0x82;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_SHA256: u8 = 0xa8;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_HASH256: u8 = 0xaa;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CHECKSIGVERIFY: u8 = 0xad;

/// Build a single data push. The push opcode is computed from the final
/// payload length, so the length prefix always equals the byte count that
/// follows it.
pub fn push_data(data: &[u8]) -> ByteString {
    let mut out = Vec::with_capacity(data.len() + 5);
    match data.len() {
        0 => out.push(OP_0),
        len @ 1..=0x4b => out.push(len as u8),
        len @ 0x4c..=0xff => {
            out.push(OP_PUSHDATA1);
            out.push(len as u8);
        }
        len @ 0x100..=0xffff => {
            out.push(OP_PUSHDATA2);
            out.extend_from_slice(&(len as u16).to_le_bytes());
        }
        len => {
            out.push(OP_PUSHDATA4);
            out.extend_from_slice(&(len as u32).to_le_bytes());
        }
    }
    out.extend_from_slice(data);
    out
}

/// Stack truthiness: any non-zero byte, except negative zero (sign bit
/// alone in the last byte).
pub fn cast_to_bool(data: &[u8]) -> bool {
    for (i, byte) in data.iter().enumerate() {
        if *byte != 0 {
            if i == data.len() - 1 && *byte == 0x80 {
                return false;
            }
            return true;
        }
    }
    false
}

/// Minimal little-endian script-number encoding of a non-negative value.
fn script_num(mut n: u64) -> ByteString {
    let mut out = Vec::new();
    while n > 0 {
        out.push((n & 0xff) as u8);
        n >>= 8;
    }
    if let Some(&last) = out.last() {
        if last & 0x80 != 0 {
            out.push(0);
        }
    }
    out
}

/// Resolves OP_CHECKSIG during script execution.
///
/// `script_code` is the script currently being executed, which for a
/// locking-script run is the script the signature hash was computed
/// against.
pub trait SignatureChecker {
    fn check_sig(&self, sig_with_type: &[u8], pubkey: &[u8], script_code: &[u8]) -> bool;
}

/// Rejects every signature. Used when evaluating scripts outside a
/// transaction context.
pub struct NullSignatureChecker;

impl SignatureChecker for NullSignatureChecker {
    fn check_sig(&self, _sig_with_type: &[u8], _pubkey: &[u8], _script_code: &[u8]) -> bool {
        false
    }
}

/// Checks signatures against the transaction being verified: recomputes
/// the signature hash from the sighash-type byte trailing the signature
/// payload and verifies the DER signature over it.
pub struct TxSignatureChecker<'a> {
    pub tx: &'a Transaction,
    pub input_index: usize,
}

impl SignatureChecker for TxSignatureChecker<'_> {
    fn check_sig(&self, sig_with_type: &[u8], pubkey: &[u8], script_code: &[u8]) -> bool {
        if sig_with_type.len() < 2 {
            return false;
        }
        let (der, tail) = sig_with_type.split_at(sig_with_type.len() - 1);
        let hash_type = SigHashType::from_byte(tail[0]);

        let hash = match signature_hash(self.tx, self.input_index, script_code, hash_type) {
            Ok(hash) => hash,
            Err(_) => return false,
        };
        let signature = match Signature::from_der(der) {
            Ok(signature) => signature,
            Err(_) => return false,
        };
        let pubkey = match PublicKey::from_slice(pubkey) {
            Ok(pubkey) => pubkey,
            Err(_) => return false,
        };

        let secp = Secp256k1::verification_only();
        secp.verify_ecdsa(&Message::from_digest(hash), &signature, &pubkey)
            .is_ok()
    }
}

fn take<'a>(script: &'a [u8], pc: &mut usize, n: usize) -> Result<&'a [u8]> {
    let end = pc
        .checked_add(n)
        .filter(|&end| end <= script.len())
        .ok_or_else(|| {
            SigScriptError::MalformedScript(format!("push of {} bytes overruns script end", n))
        })?;
    let slice = &script[*pc..end];
    *pc = end;
    Ok(slice)
}

/// Decode the data push starting at `pc` (the opcode itself already
/// consumed). A length prefix that does not match the remaining payload
/// is malformed, never silently tolerated.
fn read_push(script: &[u8], pc: &mut usize, opcode: u8) -> Result<ByteString> {
    let len = match opcode {
        OP_0 => 0,
        1..=0x4b => opcode as usize,
        OP_PUSHDATA1 => take(script, pc, 1)?[0] as usize,
        OP_PUSHDATA2 => {
            let bytes = take(script, pc, 2)?;
            u16::from_le_bytes([bytes[0], bytes[1]]) as usize
        }
        OP_PUSHDATA4 => {
            let bytes = take(script, pc, 4)?;
            u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize
        }
        _ => {
            return Err(SigScriptError::MalformedScript(format!(
                "opcode 0x{:02x} is not a data push",
                opcode
            )))
        }
    };
    if len > MAX_SCRIPT_ELEMENT_SIZE {
        return Err(SigScriptError::MalformedScript(format!(
            "pushed element of {} bytes exceeds limit",
            len
        )));
    }
    Ok(take(script, pc, len)?.to_vec())
}

/// Execute a script against `stack`.
///
/// Returns `Ok(true)` if every operation succeeded, `Ok(false)` if an
/// opcode failed (unrecognized opcode, stack underflow, failed VERIFY),
/// and `Err` for structural violations (malformed push, size limits).
/// The final-stack success condition is checked by [`verify_script`].
pub fn eval_script(
    script: &[u8],
    stack: &mut Vec<ByteString>,
    checker: &dyn SignatureChecker,
) -> Result<bool> {
    if script.len() > MAX_SCRIPT_SIZE {
        return Err(SigScriptError::MalformedScript(format!(
            "script of {} bytes exceeds limit",
            script.len()
        )));
    }

    let mut op_count = 0;
    let mut pc = 0usize;

    while pc < script.len() {
        let opcode = script[pc];
        pc += 1;

        if opcode <= OP_PUSHDATA4 {
            let data = read_push(script, &mut pc, opcode)?;
            stack.push(data);
        } else {
            if opcode > OP_16 {
                op_count += 1;
                if op_count > MAX_SCRIPT_OPS {
                    return Err(SigScriptError::ScriptEvaluationFailed(
                        "operation limit exceeded".to_string(),
                    ));
                }
            }
            if !execute_opcode(opcode, stack, script, checker)? {
                return Ok(false);
            }
        }

        if stack.len() > MAX_STACK_SIZE {
            return Err(SigScriptError::ScriptEvaluationFailed(
                "stack overflow".to_string(),
            ));
        }
    }

    Ok(true)
}

/// Combined verification: evaluate the signature script, then the locking
/// script on the same stack. Success requires exactly one truthy element
/// left and no structural error.
pub fn verify_script(
    script_sig: &[u8],
    script_pubkey: &[u8],
    checker: &dyn SignatureChecker,
) -> Result<bool> {
    let mut stack = Vec::new();

    if !eval_script(script_sig, &mut stack, checker)? {
        return Ok(false);
    }
    if !eval_script(script_pubkey, &mut stack, checker)? {
        return Ok(false);
    }

    Ok(stack.len() == 1 && cast_to_bool(&stack[0]))
}

/// Execute a single non-push opcode.
fn execute_opcode(
    opcode: u8,
    stack: &mut Vec<ByteString>,
    script_code: &[u8],
    checker: &dyn SignatureChecker,
) -> Result<bool> {
    match opcode {
        // OP_1 to OP_16 - push numbers 1-16
        OP_1..=OP_16 => {
            stack.push(vec![opcode - 0x50]);
            Ok(true)
        }

        OP_NOP => Ok(true),

        // OP_VERIFY - fail unless top item is truthy
        OP_VERIFY => {
            if let Some(item) = stack.pop() {
                Ok(cast_to_bool(&item))
            } else {
                Ok(false)
            }
        }

        // OP_RETURN - always fail
        OP_RETURN => Ok(false),

        // OP_IFDUP - duplicate top item if truthy
        OP_IFDUP => {
            if let Some(item) = stack.last().cloned() {
                if cast_to_bool(&item) {
                    stack.push(item);
                }
                Ok(true)
            } else {
                Ok(false)
            }
        }

        // OP_DEPTH - push stack size
        OP_DEPTH => {
            let depth = script_num(stack.len() as u64);
            stack.push(depth);
            Ok(true)
        }

        // OP_DROP - remove top item
        OP_DROP => Ok(stack.pop().is_some()),

        // OP_DUP - duplicate top item
        OP_DUP => {
            if let Some(item) = stack.last().cloned() {
                stack.push(item);
                Ok(true)
            } else {
                Ok(false)
            }
        }

        // OP_NIP - remove second-to-top item
        OP_NIP => {
            if stack.len() >= 2 {
                stack.remove(stack.len() - 2);
                Ok(true)
            } else {
                Ok(false)
            }
        }

        // OP_OVER - copy second-to-top item to top
        OP_OVER => {
            if stack.len() >= 2 {
                let second = stack[stack.len() - 2].clone();
                stack.push(second);
                Ok(true)
            } else {
                Ok(false)
            }
        }

        // OP_SWAP - swap top two items
        OP_SWAP => {
            if stack.len() >= 2 {
                let top = stack.len() - 1;
                stack.swap(top, top - 1);
                Ok(true)
            } else {
                Ok(false)
            }
        }

        // OP_SIZE - push size of top item
        OP_SIZE => {
            if let Some(item) = stack.last() {
                let size = script_num(item.len() as u64);
                stack.push(size);
                Ok(true)
            } else {
                Ok(false)
            }
        }

        // OP_EQUAL - push whether top two items are equal
        OP_EQUAL => {
            if stack.len() < 2 {
                return Ok(false);
            }
            let a = stack.pop().unwrap();
            let b = stack.pop().unwrap();
            stack.push(if a == b { vec![1] } else { vec![] });
            Ok(true)
        }

        // OP_EQUALVERIFY - fail unless top two items are equal
        OP_EQUALVERIFY => {
            if stack.len() < 2 {
                return Ok(false);
            }
            let a = stack.pop().unwrap();
            let b = stack.pop().unwrap();
            Ok(a == b)
        }

        // OP_SHA256
        OP_SHA256 => {
            if let Some(item) = stack.pop() {
                stack.push(Sha256::digest(&item).to_vec());
                Ok(true)
            } else {
                Ok(false)
            }
        }

        // OP_HASH160 - RIPEMD160(SHA256(x))
        OP_HASH160 => {
            if let Some(item) = stack.pop() {
                let sha256_hash = Sha256::digest(&item);
                let ripemd160_hash = Ripemd160::digest(sha256_hash);
                stack.push(ripemd160_hash.to_vec());
                Ok(true)
            } else {
                Ok(false)
            }
        }

        // OP_HASH256 - SHA256(SHA256(x))
        OP_HASH256 => {
            if let Some(item) = stack.pop() {
                let first = Sha256::digest(&item);
                stack.push(Sha256::digest(first).to_vec());
                Ok(true)
            } else {
                Ok(false)
            }
        }

        // OP_CHECKSIG - push whether the signature verifies
        OP_CHECKSIG => {
            if stack.len() < 2 {
                return Ok(false);
            }
            let pubkey = stack.pop().unwrap();
            let signature = stack.pop().unwrap();
            let result = checker.check_sig(&signature, &pubkey, script_code);
            stack.push(if result { vec![1] } else { vec![] });
            Ok(true)
        }

        // OP_CHECKSIGVERIFY - fail unless the signature verifies
        OP_CHECKSIGVERIFY => {
            if stack.len() < 2 {
                return Ok(false);
            }
            let pubkey = stack.pop().unwrap();
            let signature = stack.pop().unwrap();
            Ok(checker.check_sig(&signature, &pubkey, script_code))
        }

        // Unknown or disabled opcode
        _ => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(script: &[u8]) -> (Result<bool>, Vec<ByteString>) {
        let mut stack = Vec::new();
        let result = eval_script(script, &mut stack, &NullSignatureChecker);
        (result, stack)
    }

    #[test]
    fn test_push_data_opcode_matches_payload_length() {
        assert_eq!(push_data(&[]), vec![OP_0]);

        let short = push_data(&[0xaa; 10]);
        assert_eq!(short[0], 10);
        assert_eq!(short.len(), 11);

        let boundary = push_data(&[0xaa; 0x4b]);
        assert_eq!(boundary[0], 0x4b);

        let pushdata1 = push_data(&[0xaa; 0x4c]);
        assert_eq!(pushdata1[0], OP_PUSHDATA1);
        assert_eq!(pushdata1[1], 0x4c);

        let pushdata2 = push_data(&[0xaa; 300]);
        assert_eq!(pushdata2[0], OP_PUSHDATA2);
        assert_eq!(&pushdata2[1..3], &300u16.to_le_bytes());
    }

    #[test]
    fn test_eval_direct_push() {
        let (result, stack) = eval(&[0x03, 0xaa, 0xbb, 0xcc]);
        assert!(result.unwrap());
        assert_eq!(stack, vec![vec![0xaa, 0xbb, 0xcc]]);
    }

    #[test]
    fn test_eval_pushdata1() {
        let mut script = vec![OP_PUSHDATA1, 76];
        script.extend_from_slice(&[0x11; 76]);
        let (result, stack) = eval(&script);
        assert!(result.unwrap());
        assert_eq!(stack[0].len(), 76);
    }

    #[test]
    fn test_truncated_push_is_malformed() {
        // Push opcode claims 5 bytes, only 2 follow.
        let (result, _) = eval(&[0x05, 0xaa, 0xbb]);
        assert!(matches!(result, Err(SigScriptError::MalformedScript(_))));
    }

    #[test]
    fn test_pushdata1_missing_length_byte() {
        let (result, _) = eval(&[OP_PUSHDATA1]);
        assert!(matches!(result, Err(SigScriptError::MalformedScript(_))));
    }

    #[test]
    fn test_oversized_element_is_malformed() {
        let mut script = vec![OP_PUSHDATA2];
        script.extend_from_slice(&521u16.to_le_bytes());
        script.extend_from_slice(&[0; 521]);
        let (result, _) = eval(&script);
        assert!(matches!(result, Err(SigScriptError::MalformedScript(_))));
    }

    #[test]
    fn test_eval_op_1() {
        let (result, stack) = eval(&[OP_1]);
        assert!(result.unwrap());
        assert_eq!(stack, vec![vec![1]]);
    }

    #[test]
    fn test_op_dup() {
        let (result, stack) = eval(&[OP_1, OP_DUP]);
        assert!(result.unwrap());
        assert_eq!(stack, vec![vec![1], vec![1]]);
    }

    #[test]
    fn test_op_dup_empty_stack_fails() {
        let (result, _) = eval(&[OP_DUP]);
        assert!(!result.unwrap());
    }

    #[test]
    fn test_op_equal() {
        let (result, stack) = eval(&[OP_1, OP_1, OP_EQUAL]);
        assert!(result.unwrap());
        assert_eq!(stack, vec![vec![1]]);

        let (result, stack) = eval(&[OP_1, 0x52, OP_EQUAL]);
        assert!(result.unwrap());
        assert!(!cast_to_bool(&stack[0]));
    }

    #[test]
    fn test_op_equalverify() {
        let (result, stack) = eval(&[OP_1, OP_1, OP_EQUALVERIFY]);
        assert!(result.unwrap());
        assert!(stack.is_empty());

        let (result, _) = eval(&[OP_1, 0x52, OP_EQUALVERIFY]);
        assert!(!result.unwrap());
    }

    #[test]
    fn test_op_verify() {
        let (result, _) = eval(&[OP_1, OP_VERIFY]);
        assert!(result.unwrap());

        let (result, _) = eval(&[OP_0, OP_VERIFY]);
        assert!(!result.unwrap());
    }

    #[test]
    fn test_op_return_fails() {
        let (result, _) = eval(&[OP_1, OP_RETURN]);
        assert!(!result.unwrap());
    }

    #[test]
    fn test_op_hash160_output_length() {
        let (result, stack) = eval(&[OP_1, OP_HASH160]);
        assert!(result.unwrap());
        assert_eq!(stack[0].len(), 20);
    }

    #[test]
    fn test_op_hash256_output_length() {
        let (result, stack) = eval(&[OP_1, OP_HASH256]);
        assert!(result.unwrap());
        assert_eq!(stack[0].len(), 32);
    }

    #[test]
    fn test_op_size() {
        let (result, stack) = eval(&[0x03, 0xaa, 0xbb, 0xcc, OP_SIZE]);
        assert!(result.unwrap());
        assert_eq!(stack[1], vec![3]);
    }

    #[test]
    fn test_unknown_opcode_fails() {
        let (result, _) = eval(&[0xff]);
        assert!(!result.unwrap());
    }

    #[test]
    fn test_operation_limit() {
        let script = vec![OP_NOP; MAX_SCRIPT_OPS + 1];
        let (result, _) = eval(&script);
        assert!(matches!(
            result,
            Err(SigScriptError::ScriptEvaluationFailed(_))
        ));
    }

    #[test]
    fn test_script_size_limit() {
        let script = vec![OP_1; MAX_SCRIPT_SIZE + 1];
        let (result, _) = eval(&script);
        assert!(matches!(result, Err(SigScriptError::MalformedScript(_))));
    }

    #[test]
    fn test_checksig_without_context_fails() {
        let script = [OP_1, OP_1, OP_CHECKSIG];
        let (result, stack) = eval(&script);
        assert!(result.unwrap());
        assert!(!cast_to_bool(&stack[0]));
    }

    #[test]
    fn test_verify_script_requires_single_truthy_element() {
        // Two truthy items left on the stack is a failure.
        assert!(!verify_script(&[OP_1], &[OP_1], &NullSignatureChecker).unwrap());
        // One truthy item passes.
        assert!(verify_script(&[OP_1], &[], &NullSignatureChecker).unwrap());
        // One falsy item fails.
        assert!(!verify_script(&[OP_0], &[], &NullSignatureChecker).unwrap());
    }

    #[test]
    fn test_cast_to_bool() {
        assert!(!cast_to_bool(&[]));
        assert!(!cast_to_bool(&[0]));
        assert!(!cast_to_bool(&[0, 0x80])); // negative zero
        assert!(cast_to_bool(&[1]));
        assert!(cast_to_bool(&[0x80, 0])); // sign bit not in last byte
    }

    #[test]
    fn test_script_num() {
        assert_eq!(script_num(0), Vec::<u8>::new());
        assert_eq!(script_num(3), vec![3]);
        assert_eq!(script_num(300), vec![0x2c, 0x01]);
        // Values with the top bit set gain a padding byte to stay positive.
        assert_eq!(script_num(0x80), vec![0x80, 0x00]);
    }
}
