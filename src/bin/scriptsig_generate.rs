//! Manual scriptSig construction against a regtest coinbase output.
//!
//! Walks the mechanism Bitcoin uses to generate the signature script for
//! a transaction input, one step at a time: compute the signature hash
//! against the locking script being spent, sign it, append the
//! sighash-type byte, wrap the payload in an exact-length push, then
//! verify both the raw signature and the combined script evaluation.
//!
//! Regtest workflow to produce the inputs pasted below:
//!   bitcoind -regtest -server -datadir=<dir>
//!   bitcoin-cli -regtest generate 101
//!   bitcoin-cli -regtest listunspent        (txid + scriptPubKey)
//!   bitcoin-cli -regtest dumpprivkey <addr> (WIF, regtest only!)
//! The finished transaction is printed as raw hex for
//! `bitcoin-cli -regtest sendrawtransaction <hex>`.

use anyhow::{anyhow, Context, Result};
use log::{debug, error, info};
use sigscript::keys::{Network, PrivateKey};
use sigscript::sigscript::{check_signature, p2pk_script_pubkey};
use sigscript::transaction::{check_transaction, serialize_transaction, txid, txid_hex};
use sigscript::types::{OutPoint, Transaction, ValidationResult};
use sigscript::{SigHashType, SigScriptEngine, SATOSHIS_PER_BTC};

// Regtest fixtures from bitcoin-cli (see module docs). The locking script
// of the coinbase output being spent is `<pubkey> OP_CHECKSIG`.
const PRIVATE_KEY_WIF: &str = "cTUB1ab9GsxYu9x87MhM17cZehqngGGXSXRijig5uxNYBfrxgcpA";
const LOCKING_PUBKEY_HEX: &str = "024a36f136bd7c114c599efc07bcba8ac32ea6ebaf8e1e209f91316d9bd2eb74e3";
const UNSPENT_TXID: &str = "0478a7b4f260df599bfb114c8043e2d8925e16b622d12294a4936625ab8ba470";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let engine = SigScriptEngine::new();

    let spender = PrivateKey::from_wif(PRIVATE_KEY_WIF, Network::Regtest)?;
    let recipient = PrivateKey::generate(Network::Regtest);

    let locking_pubkey = hex::decode(LOCKING_PUBKEY_HEX).context("locking pubkey hex")?;
    let locking_script = p2pk_script_pubkey(&locking_pubkey);
    let outpoint = OutPoint::from_txid_hex(UNSPENT_TXID, 0)
        .ok_or_else(|| anyhow!("bad unspent txid: {}", UNSPENT_TXID))?;

    let mut tx = Transaction::new();
    // Sequence below final lets the same outpoint be re-submitted with a
    // higher fee while the transaction is unconfirmed.
    tx.add_input(outpoint, locking_script.clone()).sequence = 1;
    tx.add_output(
        48 * SATOSHIS_PER_BTC,
        p2pk_script_pubkey(&recipient.public_key_bytes(engine.secp())),
    );

    // Construct the transaction signature script manually.
    let script_sig = engine.build(
        &mut tx,
        0,
        &locking_script,
        &spender.secret_bytes(),
        SigHashType::ALL,
    )?;
    debug!("scriptSig: {}", hex::encode(&script_sig));

    // Double-check the signature field alone: the DER payload in the
    // scriptSig must be a signature over the recomputed signature hash by
    // the key matching the spender's public key.
    let signature_result = check_signature(engine.secp(), &locking_script, &tx, 0, &script_sig);
    info!("Valid signature result {}.", signature_result.is_ok());

    // The check peers and miners perform: the combined scriptSig and
    // scriptPubKey from the transaction being spent must evaluate to true.
    let script_verify_result = engine.verify(&locking_script, &tx, 0, &script_sig);
    info!("Script verify result {}.", script_verify_result);

    if !script_verify_result {
        error!("Signature script did not verify; not handing the transaction to the node.");
        return Ok(());
    }

    match check_transaction(&tx)? {
        ValidationResult::Valid => {
            info!("txid: {}", txid_hex(&txid(&tx)));
            info!("raw tx: {}", hex::encode(serialize_transaction(&tx)));
            println!(
                "Broadcast with: bitcoin-cli -regtest sendrawtransaction {}",
                hex::encode(serialize_transaction(&tx))
            );
        }
        ValidationResult::Invalid(reason) => {
            error!("Transaction failed structural checks: {}", reason);
        }
    }

    Ok(())
}
