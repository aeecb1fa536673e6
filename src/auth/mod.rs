pub mod context;

use std::env;
use std::fs;
use std::io::IsTerminal;

use crate::error::{PassrotError, Result};
use crate::store::{crypto, CatalogKey};
use context::AuthContext;

pub const PASSROT_PASSPHRASE_ENV: &str = "PASSROT_PASSPHRASE";
pub const PASSROT_KEYFILE_ENV: &str = "PASSROT_KEYFILE";
const PASSROT_NON_INTERACTIVE_ENV: &str = "PASSROT_NON_INTERACTIVE";

/// Check if we are in non-interactive mode.
/// True when stdin is not a TTY or PASSROT_NON_INTERACTIVE=1 is set.
pub fn is_non_interactive() -> bool {
    if env::var(PASSROT_NON_INTERACTIVE_ENV)
        .map(|v| v == "1")
        .unwrap_or(false)
    {
        return true;
    }
    !std::io::stdin().is_terminal()
}

/// Resolve catalog credentials. Tries in order:
/// 1. PASSROT_KEYFILE (age identity file)
/// 2. PASSROT_PASSPHRASE
/// 3. Interactive passphrase prompt (only with a TTY)
pub fn resolve_auth() -> Result<(CatalogKey, AuthContext)> {
    if let Ok(keyfile_path) = env::var(PASSROT_KEYFILE_ENV) {
        let (identity, pubkey) = read_keyfile(&keyfile_path)?;
        return Ok((
            CatalogKey::Keyfile { identity, pubkey },
            AuthContext::keyfile(),
        ));
    }

    if let Ok(passphrase) = env::var(PASSROT_PASSPHRASE_ENV) {
        return Ok((CatalogKey::Passphrase(passphrase), AuthContext::passphrase()));
    }

    if is_non_interactive() {
        return Err(PassrotError::AuthFailed(
            "No credentials provided. Set PASSROT_KEYFILE or PASSROT_PASSPHRASE.".into(),
        ));
    }

    let passphrase = dialoguer::Password::new()
        .with_prompt("Enter catalog passphrase")
        .interact()
        .map_err(|e| PassrotError::AuthFailed(format!("Failed to read passphrase: {}", e)))?;

    Ok((CatalogKey::Passphrase(passphrase), AuthContext::passphrase()))
}

/// Resolve the key for `init` (no catalog exists yet).
pub fn resolve_auth_for_init(
    passphrase: Option<String>,
    generate_keyfile: Option<String>,
) -> Result<CatalogKey> {
    if let Some(keyfile_path) = generate_keyfile {
        let (secret_key, public_key) = crypto::generate_keypair();
        fs::write(&keyfile_path, &secret_key)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&keyfile_path, fs::Permissions::from_mode(0o600))?;
        }
        let pubkey_path = format!("{}.pub", keyfile_path);
        fs::write(&pubkey_path, &public_key)?;

        tracing::info!(keyfile = %keyfile_path, "generated catalog keyfile");
        eprintln!("Generated keyfile: {}", keyfile_path);

        return Ok(CatalogKey::Keyfile {
            identity: secret_key,
            pubkey: public_key,
        });
    }

    if let Some(pass) = passphrase.or_else(|| env::var(PASSROT_PASSPHRASE_ENV).ok()) {
        return Ok(CatalogKey::Passphrase(pass));
    }

    if is_non_interactive() {
        return Err(PassrotError::AuthFailed(
            "No passphrase provided. Use --passphrase, PASSROT_PASSPHRASE or --generate-keyfile."
                .into(),
        ));
    }

    let pass = dialoguer::Password::new()
        .with_prompt("Create catalog passphrase")
        .with_confirmation("Confirm passphrase", "Passphrases don't match")
        .interact()
        .map_err(|e| PassrotError::AuthFailed(format!("Failed to read passphrase: {}", e)))?;

    Ok(CatalogKey::Passphrase(pass))
}

/// Read an age keyfile from disk. Returns (identity_string, public_key_string).
pub fn read_keyfile(path: &str) -> Result<(String, String)> {
    let content = fs::read_to_string(path)
        .map_err(|e| PassrotError::InvalidKeyfile(format!("Cannot read {}: {}", path, e)))?;

    let identity: age::x25519::Identity = content
        .trim()
        .parse()
        .map_err(|e: &str| PassrotError::InvalidKeyfile(e.to_string()))?;

    let pubkey = identity.to_public().to_string();
    Ok((content.trim().to_string(), pubkey))
}
