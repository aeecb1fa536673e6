//! age encryption for the catalog file, plus HKDF sub-key derivation.

use std::io::{Read, Write};

use age::secrecy::{ExposeSecret, Secret};
use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::{PassrotError, Result};

fn enc<E: std::fmt::Display>(e: E) -> PassrotError {
    PassrotError::Encryption(e.to_string())
}

fn seal(encryptor: age::Encryptor, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut sealed = vec![];
    let mut writer = encryptor.wrap_output(&mut sealed).map_err(enc)?;
    writer.write_all(plaintext).map_err(enc)?;
    writer.finish().map_err(enc)?;
    Ok(sealed)
}

fn drain(mut reader: impl Read) -> Result<Vec<u8>> {
    let mut opened = vec![];
    reader
        .read_to_end(&mut opened)
        .map_err(|e| PassrotError::Decryption(e.to_string()))?;
    Ok(opened)
}

/// Encrypt data under a passphrase (scrypt recipient).
pub fn encrypt_with_passphrase(plaintext: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    let encryptor = age::Encryptor::with_user_passphrase(Secret::new(passphrase.to_string()));
    seal(encryptor, plaintext)
}

pub fn decrypt_with_passphrase(ciphertext: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    let decryptor = match age::Decryptor::new(ciphertext)
        .map_err(|e| PassrotError::Decryption(e.to_string()))?
    {
        age::Decryptor::Passphrase(d) => d,
        _ => {
            return Err(PassrotError::Decryption(
                "catalog is keyfile-encrypted; set PASSROT_KEYFILE".into(),
            ))
        }
    };

    let reader = decryptor
        .decrypt(&Secret::new(passphrase.to_string()), None)
        .map_err(|e| PassrotError::Decryption(e.to_string()))?;
    drain(reader)
}

/// Encrypt data to an x25519 public key.
pub fn encrypt_with_keyfile(plaintext: &[u8], pubkey: &str) -> Result<Vec<u8>> {
    let recipient: age::x25519::Recipient = pubkey
        .parse()
        .map_err(|e: &str| PassrotError::Encryption(e.to_string()))?;

    let encryptor = age::Encryptor::with_recipients(vec![Box::new(recipient)])
        .ok_or_else(|| PassrotError::Encryption("no recipients".into()))?;
    seal(encryptor, plaintext)
}

pub fn decrypt_with_keyfile(ciphertext: &[u8], identity_str: &str) -> Result<Vec<u8>> {
    let identity: age::x25519::Identity = identity_str
        .parse()
        .map_err(|e: &str| PassrotError::InvalidKeyfile(e.to_string()))?;

    let decryptor = match age::Decryptor::new(ciphertext)
        .map_err(|e| PassrotError::Decryption(e.to_string()))?
    {
        age::Decryptor::Recipients(d) => d,
        _ => {
            return Err(PassrotError::Decryption(
                "catalog is passphrase-encrypted; set PASSROT_PASSPHRASE".into(),
            ))
        }
    };

    let reader = decryptor
        .decrypt(std::iter::once(&identity as &dyn age::Identity))
        .map_err(|e| PassrotError::Decryption(e.to_string()))?;
    drain(reader)
}

/// Derive a sub-key using HKDF-SHA256.
pub fn derive_key(master: &[u8], info: &[u8], output_len: usize) -> Vec<u8> {
    let hk = Hkdf::<Sha256>::new(None, master);
    let mut okm = vec![0u8; output_len];
    hk.expand(info, &mut okm)
        .expect("HKDF output length too large");
    okm
}

/// Generate a new age keypair. Returns (secret_key_string, public_key_string).
pub fn generate_keypair() -> (String, String) {
    let identity = age::x25519::Identity::generate();
    let secret_key = identity.to_string();
    let public_key = identity.to_public().to_string();
    (secret_key.expose_secret().clone(), public_key)
}
