//! Tests for the public crate API

use sigscript::keys::{Network, PrivateKey};
use sigscript::sigscript::p2pk_script_pubkey;
use sigscript::transaction::{check_transaction, serialize_transaction, txid};
use sigscript::types::*;
use sigscript::{SigHashType, SigScriptEngine, SATOSHIS_PER_BTC};

#[test]
fn engine_sign_all_signs_every_input() {
    let engine = SigScriptEngine::default();
    let spender = PrivateKey::generate(Network::Regtest);
    let locking = p2pk_script_pubkey(&spender.public_key_bytes(engine.secp()));

    let mut tx = Transaction::new();
    tx.add_input(OutPoint::new([0x01; 32], 0), locking.clone());
    tx.add_input(OutPoint::new([0x02; 32], 1), locking.clone());
    tx.add_output(90 * SATOSHIS_PER_BTC, locking.clone());

    engine
        .sign_all(
            &mut tx,
            &[locking.clone(), locking.clone()],
            &spender.secret_bytes(),
            SigHashType::ALL,
        )
        .unwrap();

    for (i, input) in tx.inputs.iter().enumerate() {
        assert!(
            engine.verify(&locking, &tx, i, &input.script_sig),
            "input {} failed verification",
            i
        );
    }
}

#[test]
fn signed_transaction_passes_structural_checks() {
    let engine = SigScriptEngine::new();
    let spender = PrivateKey::generate(Network::Regtest);
    let locking = p2pk_script_pubkey(&spender.public_key_bytes(engine.secp()));

    let mut tx = Transaction::new();
    tx.add_input(OutPoint::new([0x11; 32], 0), locking.clone());
    tx.add_output(48 * SATOSHIS_PER_BTC, locking.clone());
    engine
        .build(&mut tx, 0, &locking, &spender.secret_bytes(), SigHashType::ALL)
        .unwrap();

    assert_eq!(check_transaction(&tx).unwrap(), ValidationResult::Valid);
    // Signed size: base fields plus the attached signature script.
    assert!(serialize_transaction(&tx).len() > 100);
}

#[test]
fn signing_does_not_change_other_inputs() {
    let engine = SigScriptEngine::new();
    let spender = PrivateKey::generate(Network::Regtest);
    let locking = p2pk_script_pubkey(&spender.public_key_bytes(engine.secp()));

    let mut tx = Transaction::new();
    tx.add_input(OutPoint::new([0x01; 32], 0), locking.clone());
    tx.add_input(OutPoint::new([0x02; 32], 0), locking.clone());
    tx.add_output(SATOSHIS_PER_BTC, locking.clone());

    let before = tx.inputs[1].clone();
    engine
        .build(&mut tx, 0, &locking, &spender.secret_bytes(), SigHashType::ALL)
        .unwrap();
    assert_eq!(tx.inputs[1], before);
}

#[test]
fn transaction_json_roundtrip() {
    let mut tx = Transaction::new();
    tx.add_input(OutPoint::new([0x0a; 32], 3), vec![0x51]);
    tx.add_output(1234, vec![0x52, 0xac]);

    let json = serde_json::to_string(&tx).unwrap();
    let parsed: Transaction = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, tx);
    assert_eq!(txid(&parsed), txid(&tx));
}
