/// Who is acting on the catalog, for audit attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    Passphrase,
    Keyfile,
}

#[derive(Debug, Clone)]
pub struct AuthContext {
    pub method: AuthMethod,
}

impl AuthContext {
    pub fn passphrase() -> Self {
        Self {
            method: AuthMethod::Passphrase,
        }
    }

    pub fn keyfile() -> Self {
        Self {
            method: AuthMethod::Keyfile,
        }
    }

    pub fn actor_name(&self) -> String {
        match &self.method {
            AuthMethod::Passphrase => "master(passphrase)".to_string(),
            AuthMethod::Keyfile => "master(keyfile)".to_string(),
        }
    }
}
