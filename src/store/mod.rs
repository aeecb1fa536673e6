pub mod crypto;
pub mod lock;

use chrono::NaiveDateTime;
use std::fs;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::clock::DATETIME_FORMAT;
use crate::error::{PassrotError, Result};
use crate::types::*;

pub type ItemId = u64;

/// A protected content item: title, opaque id, access secret and a free-form meta map.
#[derive(Debug, Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Item {
    #[zeroize(skip)]
    pub id: ItemId,
    #[zeroize(skip)]
    pub title: String,
    /// Access password. Empty means the item is not protected.
    pub secret: String,
    #[zeroize(skip)]
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
    #[zeroize(skip)]
    pub created_at: DateTime<Utc>,
    #[zeroize(skip)]
    pub modified_at: DateTime<Utc>,
}

impl Item {
    pub fn new(id: ItemId, title: String, secret: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            secret,
            meta: BTreeMap::new(),
            created_at: now,
            modified_at: now,
        }
    }

    pub fn is_protected(&self) -> bool {
        !self.secret.is_empty()
    }
}

/// `meta[key] < value`, both read as [`DATETIME_FORMAT`] datetimes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaBefore {
    pub key: String,
    pub value: NaiveDateTime,
}

/// Query passed to [`ContentStore::query`]. Results are never paged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    pub protected_only: bool,
    pub meta_before: Option<MetaBefore>,
}

impl ItemFilter {
    pub fn matches(&self, item: &Item) -> bool {
        if self.protected_only && !item.is_protected() {
            return false;
        }
        if let Some(ref cmp) = self.meta_before {
            // Missing or unparseable values never compare as "before".
            let stored = item
                .meta
                .get(&cmp.key)
                .and_then(|raw| NaiveDateTime::parse_from_str(raw.trim(), DATETIME_FORMAT).ok());
            match stored {
                Some(at) if at < cmp.value => {}
                _ => return false,
            }
        }
        true
    }
}

/// The item collection the rotation core reads from and writes to.
pub trait ContentStore {
    fn query(&self, filter: &ItemFilter) -> Result<Vec<Item>>;

    fn get(&self, id: ItemId) -> Option<&Item>;

    fn update_secret(&mut self, id: ItemId, secret: &str) -> Result<()>;

    fn get_meta(&self, id: ItemId, key: &str) -> Option<String>;

    fn set_meta(&mut self, id: ItemId, key: &str, value: &str) -> Result<()>;

    fn delete_meta(&mut self, id: ItemId, key: &str) -> Result<()>;
}

/// The in-memory representation of the whole item catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub next_id: ItemId,
    pub items: BTreeMap<ItemId, Item>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            version: 1,
            created_at: now,
            modified_at: now,
            next_id: 1,
            items: BTreeMap::new(),
        }
    }

    /// Touch the modified timestamp.
    pub fn touch(&mut self) {
        self.modified_at = Utc::now();
    }

    /// Insert a new item and return its id.
    pub fn add_item(&mut self, title: &str, secret: &str) -> ItemId {
        let id = self.next_id;
        self.next_id += 1;
        self.items
            .insert(id, Item::new(id, title.to_string(), secret.to_string()));
        self.touch();
        id
    }

    pub fn remove_item(&mut self, id: ItemId) -> Result<()> {
        self.items
            .remove(&id)
            .map(|_| self.touch())
            .ok_or(PassrotError::ItemNotFound(id))
    }

    pub fn item(&self, id: ItemId) -> Result<&Item> {
        self.items.get(&id).ok_or(PassrotError::ItemNotFound(id))
    }

    fn item_mut(&mut self, id: ItemId) -> Result<&mut Item> {
        self.items.get_mut(&id).ok_or(PassrotError::ItemNotFound(id))
    }
}

impl ContentStore for Catalog {
    fn query(&self, filter: &ItemFilter) -> Result<Vec<Item>> {
        Ok(self
            .items
            .values()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect())
    }

    fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    fn update_secret(&mut self, id: ItemId, secret: &str) -> Result<()> {
        let item = self.item_mut(id).map_err(|_| PassrotError::Persistence {
            id,
            reason: "item no longer exists".into(),
        })?;
        item.secret.zeroize();
        item.secret = secret.to_string();
        item.modified_at = Utc::now();
        self.touch();
        Ok(())
    }

    fn get_meta(&self, id: ItemId, key: &str) -> Option<String> {
        self.items.get(&id)?.meta.get(key).cloned()
    }

    fn set_meta(&mut self, id: ItemId, key: &str, value: &str) -> Result<()> {
        let item = self.item_mut(id)?;
        item.meta.insert(key.to_string(), value.to_string());
        self.touch();
        Ok(())
    }

    fn delete_meta(&mut self, id: ItemId, key: &str) -> Result<()> {
        let item = self.item_mut(id)?;
        if item.meta.remove(key).is_some() {
            self.touch();
        }
        Ok(())
    }
}

/// Encryption mode for the catalog.
#[derive(Debug, Clone)]
pub enum CatalogKey {
    Passphrase(String),
    Keyfile { identity: String, pubkey: String },
}

/// Get the passrot directory path (~/.passrot).
pub fn passrot_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".passrot"))
        .ok_or_else(|| PassrotError::Other("Could not determine home directory".into()))
}

/// Get the catalog file path.
pub fn catalog_path() -> Result<PathBuf> {
    Ok(passrot_dir()?.join("catalog.age"))
}

/// Get the config file path.
pub fn config_path() -> Result<PathBuf> {
    Ok(passrot_dir()?.join("passrot.toml"))
}

/// Get the audit log path.
pub fn audit_path() -> Result<PathBuf> {
    Ok(passrot_dir()?.join("audit.log"))
}

/// Get the schedule registry path.
pub fn schedule_path() -> Result<PathBuf> {
    Ok(passrot_dir()?.join("schedule.toml"))
}

/// Get the notification spool path.
pub fn outbox_path() -> Result<PathBuf> {
    Ok(passrot_dir()?.join("outbox.jsonl"))
}

/// Get the rotation lock path.
pub fn lock_path() -> Result<PathBuf> {
    Ok(passrot_dir()?.join("rotation.lock"))
}

/// Check if the catalog is initialized.
pub fn is_initialized() -> bool {
    catalog_path().map(|p| p.exists()).unwrap_or(false)
}

/// Load and decrypt the catalog from disk.
pub fn load_catalog(key: &CatalogKey) -> Result<Catalog> {
    let path = catalog_path()?;
    if !path.exists() {
        return Err(PassrotError::NotInitialized);
    }

    let ciphertext = fs::read(&path)?;
    let plaintext = match key {
        CatalogKey::Passphrase(pass) => crypto::decrypt_with_passphrase(&ciphertext, pass)?,
        CatalogKey::Keyfile { identity, .. } => crypto::decrypt_with_keyfile(&ciphertext, identity)?,
    };

    rmp_serde::from_slice(&plaintext).map_err(|e| PassrotError::Serialization(e.to_string()))
}

/// Encrypt and save the catalog to disk with atomic rename.
pub fn save_catalog(catalog: &Catalog, key: &CatalogKey) -> Result<()> {
    let path = catalog_path()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let plaintext =
        rmp_serde::to_vec(catalog).map_err(|e| PassrotError::Serialization(e.to_string()))?;

    let ciphertext = match key {
        CatalogKey::Passphrase(pass) => crypto::encrypt_with_passphrase(&plaintext, pass)?,
        CatalogKey::Keyfile { pubkey, .. } => crypto::encrypt_with_keyfile(&plaintext, pubkey)?,
    };

    // Write to a sibling temp file, then rename over the original
    let tmp_path = path.with_extension("age.tmp");
    fs::write(&tmp_path, &ciphertext)?;
    fs::rename(&tmp_path, &path)?;

    Ok(())
}
