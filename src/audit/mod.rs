use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::{PassrotError, Result};
use crate::store::{CatalogKey, ItemId};
use crate::types::*;

type HmacSha256 = Hmac<Sha256>;

/// A single audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub item: Option<ItemId>,
    pub actor: String,
    pub outcome: String,
    pub detail: Option<String>,
    pub chain_hmac: String,
}

impl AuditEntry {
    /// Bytes covered by the chain: previous HMAC plus every field but our own HMAC.
    fn chain_input(&self, prev_hmac: &str) -> String {
        format!(
            "{}|{}|{}|{:?}|{}|{}|{:?}",
            prev_hmac,
            self.timestamp.to_rfc3339(),
            self.operation,
            self.item,
            self.actor,
            self.outcome,
            self.detail,
        )
    }
}

/// Append-only, HMAC-chained event log.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
    key: Vec<u8>,
    enabled: bool,
}

impl AuditLog {
    pub fn new(path: PathBuf, key: Vec<u8>) -> Self {
        Self {
            path,
            key,
            enabled: true,
        }
    }

    /// Key the log from catalog credentials.
    pub fn for_key(path: PathBuf, key: &CatalogKey) -> Self {
        Self::new(path, derive_audit_key(&key_material(key)))
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(
        &self,
        operation: &str,
        item: Option<ItemId>,
        actor: &str,
        outcome: &str,
        detail: Option<&str>,
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        log_event(&self.path, operation, item, actor, outcome, detail, &self.key)
    }

    /// Like [`AuditLog::record`] but a failed append is only logged.
    pub fn record_quietly(
        &self,
        operation: &str,
        item: Option<ItemId>,
        actor: &str,
        outcome: &str,
        detail: Option<&str>,
    ) {
        if let Err(e) = self.record(operation, item, actor, outcome, detail) {
            tracing::warn!(operation, error = %e, "audit append failed");
        }
    }

    pub fn entries(&self) -> Result<Vec<AuditEntry>> {
        read_entries(&self.path)
    }

    pub fn verify(&self) -> Result<(usize, bool)> {
        verify_chain(&self.path, &self.key)
    }
}

/// Append an audit entry to the log file.
pub fn log_event(
    audit_path: &Path,
    operation: &str,
    item: Option<ItemId>,
    actor: &str,
    outcome: &str,
    detail: Option<&str>,
    hmac_key: &[u8],
) -> Result<()> {
    let prev_hmac = read_last_hmac(audit_path);

    let mut entry = AuditEntry {
        timestamp: Utc::now(),
        operation: operation.to_string(),
        item,
        actor: actor.to_string(),
        outcome: outcome.to_string(),
        detail: detail.map(|s| s.to_string()),
        chain_hmac: String::new(),
    };
    entry.chain_hmac = compute_chain_hmac(&entry.chain_input(&prev_hmac), hmac_key);

    let json_line =
        serde_json::to_string(&entry).map_err(|e| PassrotError::Serialization(e.to_string()))?;

    if let Some(dir) = audit_path.parent() {
        fs::create_dir_all(dir)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(audit_path)?;
    writeln!(file, "{}", json_line)?;

    Ok(())
}

/// Read all audit entries from the log file.
pub fn read_entries(audit_path: &Path) -> Result<Vec<AuditEntry>> {
    if !audit_path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(fs::File::open(audit_path)?);
    let mut entries = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: AuditEntry =
            serde_json::from_str(&line).map_err(|e| PassrotError::Serialization(e.to_string()))?;
        entries.push(entry);
    }

    Ok(entries)
}

/// Verify the HMAC chain integrity of the audit log.
pub fn verify_chain(audit_path: &Path, hmac_key: &[u8]) -> Result<(usize, bool)> {
    let entries = read_entries(audit_path)?;
    let mut prev_hmac = String::new();

    for (i, entry) in entries.iter().enumerate() {
        let expected = compute_chain_hmac(&entry.chain_input(&prev_hmac), hmac_key);
        if expected != entry.chain_hmac {
            return Err(PassrotError::AuditChainBroken(i));
        }
        prev_hmac = entry.chain_hmac.clone();
    }

    Ok((entries.len(), true))
}

fn read_last_hmac(audit_path: &Path) -> String {
    let Ok(content) = fs::read_to_string(audit_path) else {
        return String::new();
    };

    content
        .lines()
        .rev()
        .filter(|line| !line.trim().is_empty())
        .find_map(|line| serde_json::from_str::<AuditEntry>(line).ok())
        .map(|entry| entry.chain_hmac)
        .unwrap_or_default()
}

fn compute_chain_hmac(data: &str, hmac_key: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(hmac_key).expect("HMAC can take key of any size");
    mac.update(data.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Derive the audit HMAC key from the master key material.
pub fn derive_audit_key(master_material: &[u8]) -> Vec<u8> {
    crate::store::crypto::derive_key(master_material, b"audit-hmac", 32)
}

/// Get the master material from a CatalogKey (for HKDF derivation).
pub fn key_material(key: &CatalogKey) -> Vec<u8> {
    match key {
        CatalogKey::Passphrase(p) => p.as_bytes().to_vec(),
        CatalogKey::Keyfile { identity, .. } => identity.as_bytes().to_vec(),
    }
}
