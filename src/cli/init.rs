use passrot::api::PassrotClient;
use passrot::auth;
use passrot::error::{PassrotError, Result};
use passrot::store;

pub fn run(passphrase: Option<String>, generate_keyfile: Option<String>) -> Result<()> {
    if store::is_initialized() {
        return Err(PassrotError::AlreadyInitialized(
            store::catalog_path()?.display().to_string(),
        ));
    }

    let key = auth::resolve_auth_for_init(passphrase, generate_keyfile)?;
    PassrotClient::new(key, "master").init()?;

    eprintln!("Catalog initialized at {}", store::passrot_dir()?.display());
    Ok(())
}
