//! Key material supply: WIF decoding, key generation, addresses
//!
//! The signature core accepts raw decoded key bytes; this module covers
//! the surrounding chores of getting them in and out of the textual
//! forms bitcoin-cli deals in (`dumpprivkey` WIF strings, base58check
//! addresses).

use crate::error::{Result, SigScriptError};
use crate::transaction::sha256d;
use rand::rngs::OsRng;
use ripemd::Ripemd160;
use secp256k1::{PublicKey, Secp256k1, SecretKey, Signing};
use sha2::{Digest, Sha256};

/// Network the key belongs to, selecting WIF and address version bytes.
/// Regtest shares the testnet prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
}

impl Network {
    fn wif_prefix(self) -> u8 {
        match self {
            Network::Mainnet => 0x80,
            Network::Testnet | Network::Regtest => 0xef,
        }
    }

    fn p2pkh_prefix(self) -> u8 {
        match self {
            Network::Mainnet => 0x00,
            Network::Testnet | Network::Regtest => 0x6f,
        }
    }
}

/// RIPEMD160(SHA256(data))
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha256_hash = Sha256::digest(data);
    let ripemd160_hash = Ripemd160::digest(sha256_hash);
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&ripemd160_hash);
    hash
}

fn base58check(mut payload: Vec<u8>) -> String {
    let checksum = sha256d(&payload);
    payload.extend_from_slice(&checksum[..4]);
    bs58::encode(payload).into_string()
}

/// Base58check P2PKH address for a serialized public key.
pub fn p2pkh_address(pubkey: &[u8], network: Network) -> String {
    let mut payload = vec![network.p2pkh_prefix()];
    payload.extend_from_slice(&hash160(pubkey));
    base58check(payload)
}

/// A private key with the metadata its WIF encoding carries.
#[derive(Debug, Clone)]
pub struct PrivateKey {
    secret_key: SecretKey,
    pub compressed: bool,
    pub network: Network,
}

impl PrivateKey {
    /// Generate a fresh random key (compressed, as modern wallets emit).
    pub fn generate(network: Network) -> Self {
        Self {
            secret_key: SecretKey::new(&mut OsRng),
            compressed: true,
            network,
        }
    }

    /// Parse a WIF-encoded private key: base58check payload of the
    /// network prefix byte, the 32-byte scalar, and an optional 0x01
    /// suffix marking a compressed public key.
    pub fn from_wif(wif: &str, network: Network) -> Result<Self> {
        let raw = bs58::decode(wif)
            .into_vec()
            .map_err(|e| SigScriptError::InvalidKey(format!("invalid base58: {}", e)))?;
        if raw.len() < 5 {
            return Err(SigScriptError::InvalidKey("WIF too short".to_string()));
        }

        let (payload, checksum) = raw.split_at(raw.len() - 4);
        if sha256d(payload)[..4] != *checksum {
            return Err(SigScriptError::InvalidKey("bad WIF checksum".to_string()));
        }
        if payload[0] != network.wif_prefix() {
            return Err(SigScriptError::InvalidKey(format!(
                "WIF version byte 0x{:02x} does not match network",
                payload[0]
            )));
        }

        let body = &payload[1..];
        let (key_bytes, compressed) = match body.len() {
            32 => (body, false),
            33 if body[32] == 0x01 => (&body[..32], true),
            _ => {
                return Err(SigScriptError::InvalidKey(
                    "unexpected WIF payload length".to_string(),
                ))
            }
        };

        let secret_key = SecretKey::from_slice(key_bytes)
            .map_err(|e| SigScriptError::InvalidKey(e.to_string()))?;
        Ok(Self {
            secret_key,
            compressed,
            network,
        })
    }

    pub fn to_wif(&self) -> String {
        let mut payload = vec![self.network.wif_prefix()];
        payload.extend_from_slice(&self.secret_key.secret_bytes());
        if self.compressed {
            payload.push(0x01);
        }
        base58check(payload)
    }

    /// Raw 32-byte scalar, the form the signing core consumes.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret_key.secret_bytes()
    }

    pub fn public_key<C: Signing>(&self, secp: &Secp256k1<C>) -> PublicKey {
        PublicKey::from_secret_key(secp, &self.secret_key)
    }

    /// Serialized public key, compressed or uncompressed per the WIF flag.
    pub fn public_key_bytes<C: Signing>(&self, secp: &Secp256k1<C>) -> Vec<u8> {
        let pubkey = self.public_key(secp);
        if self.compressed {
            pubkey.serialize().to_vec()
        } else {
            pubkey.serialize_uncompressed().to_vec()
        }
    }

    /// Base58check P2PKH address of the derived public key.
    pub fn address<C: Signing>(&self, secp: &Secp256k1<C>) -> String {
        p2pkh_address(&self.public_key_bytes(secp), self.network)
    }
}
