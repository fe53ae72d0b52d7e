//! Spend a regtest coinbase output using the convenience signing path.
//!
//! Where `scriptsig_generate` assembles the signature script byte by
//! byte, this sample signs every input in one call, verifies the result,
//! and reports the finished transaction to the operator. Fixtures come
//! from a local regtest node via bitcoin-cli (`listunspent`,
//! `dumpprivkey`); the output hex goes back in via `sendrawtransaction`.

use anyhow::{anyhow, Result};
use log::{debug, error, info};
use sigscript::keys::{Network, PrivateKey};
use sigscript::sigscript::p2pk_script_pubkey;
use sigscript::transaction::{check_transaction, serialize_transaction, txid, txid_hex};
use sigscript::types::{OutPoint, Transaction, ValidationResult};
use sigscript::{SigHashType, SigScriptEngine, SATOSHIS_PER_BTC};

const SEND_FROM_WIF: &str = "cQYdUpoeJZP7FmxUeiaKSLPo9eHsDAYbWs17DgY44yHX2sATK2Cw";
const RECEIVE_TO_WIF: &str = "cR7X4Nd5WqA5mNwgX67th4Jo3K9vTTm28w8njLL9JT8hHPdbstL8";
const UNSPENT_TXID: &str = "5d1db816efc865ab33eb8d5c9f0238501dfd849fc67cc941565236b36e43b234";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let engine = SigScriptEngine::new();

    let send_from = PrivateKey::from_wif(SEND_FROM_WIF, Network::Regtest)?;
    let receive_to = PrivateKey::from_wif(RECEIVE_TO_WIF, Network::Regtest)?;

    info!(
        "Sending from {} to {}.",
        send_from.address(engine.secp()),
        receive_to.address(engine.secp())
    );

    // The coinbase output being spent is locked directly to the sender's
    // public key.
    let locking_script = p2pk_script_pubkey(&send_from.public_key_bytes(engine.secp()));
    debug!("spending scriptPubKey: {}", hex::encode(&locking_script));

    let outpoint = OutPoint::from_txid_hex(UNSPENT_TXID, 0)
        .ok_or_else(|| anyhow!("bad unspent txid: {}", UNSPENT_TXID))?;

    let mut spend_tx = Transaction::new();
    spend_tx.add_input(outpoint, locking_script.clone());
    spend_tx.add_output(
        49 * SATOSHIS_PER_BTC,
        p2pk_script_pubkey(&receive_to.public_key_bytes(engine.secp())),
    );

    engine.sign_all(
        &mut spend_tx,
        &[locking_script.clone()],
        &send_from.secret_bytes(),
        SigHashType::ALL,
    )?;

    debug!("{}", serde_json::to_string_pretty(&spend_tx)?);

    let verified = engine.verify(&locking_script, &spend_tx, 0, &spend_tx.inputs[0].script_sig);
    info!("Verify signature script result {}.", verified);

    if !verified {
        error!("Signature script did not verify; nothing to broadcast.");
        return Ok(());
    }

    match check_transaction(&spend_tx)? {
        ValidationResult::Valid => {
            info!("txid: {}", txid_hex(&txid(&spend_tx)));
            println!(
                "Broadcast with: bitcoin-cli -regtest sendrawtransaction {}",
                hex::encode(serialize_transaction(&spend_tx))
            );
        }
        ValidationResult::Invalid(reason) => {
            error!("Transaction failed structural checks: {}", reason);
        }
    }

    Ok(())
}
