use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{PassrotError, Result};
use crate::types::FixedOffset;

/// Configuration file format (~/.passrot/passrot.toml).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub rotation: RotationConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site timezone as a UTC offset ("+02:00"). Stored due dates use this offset.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            utc_offset: default_utc_offset(),
        }
    }
}

impl SiteConfig {
    pub fn offset(&self) -> Result<FixedOffset> {
        self.utc_offset.parse::<FixedOffset>().map_err(|e| {
            PassrotError::InvalidConfig(format!("site.utc_offset '{}': {}", self.utc_offset, e))
        })
    }
}

/// How rotation notices leave the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Append to ~/.passrot/outbox.jsonl.
    #[default]
    Spool,
    /// Pipe an RFC 5322 message into `notify.command`.
    Command,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Administrative address that receives new passwords.
    #[serde(default = "default_recipient")]
    pub recipient: String,
    #[serde(default)]
    pub transport: Transport,
    /// Mail command for the `command` transport (message on stdin).
    #[serde(default = "default_mail_command")]
    pub command: Vec<String>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            recipient: default_recipient(),
            transport: Transport::default(),
            command: default_mail_command(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationConfig {
    #[serde(default = "default_password_length")]
    pub password_length: usize,
    #[serde(default = "default_true")]
    pub special_chars: bool,
    /// Give items without a stored interval a due date (default interval) on manual rotation.
    #[serde(default = "default_true")]
    pub arm_unconfigured_on_manual: bool,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            password_length: default_password_length(),
            special_chars: true,
            arm_unconfigured_on_manual: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_utc_offset() -> String {
    "+00:00".to_string()
}

fn default_recipient() -> String {
    "admin@localhost".to_string()
}

fn default_mail_command() -> Vec<String> {
    vec!["sendmail".to_string(), "-t".to_string(), "-i".to_string()]
}

fn default_password_length() -> usize {
    12
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load config from a path. Returns default config if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| PassrotError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PassrotError::Other(format!("Config serialize error: {}", e)))?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.site.offset()?;
        if self.rotation.password_length == 0 {
            return Err(PassrotError::InvalidConfig(
                "rotation.password_length must be positive".into(),
            ));
        }
        if self.notify.transport == Transport::Command && self.notify.command.is_empty() {
            return Err(PassrotError::InvalidConfig(
                "notify.command is empty but transport is 'command'".into(),
            ));
        }
        Ok(())
    }
}
