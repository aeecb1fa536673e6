//! Rotation notices.
//!
//! The engine only queues [`Notification`]s into an [`Outbox`]; the caller
//! drains it through a [`Notifier`] once the catalog is safely saved. Delivery
//! is fire-and-forget: failures are logged and dropped, never retried.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::{NotifyConfig, Transport};
use crate::error::{PassrotError, Result};
use crate::store::ItemId;
use crate::types::*;

/// A queued notice. The body carries the new secret in clear text.
#[derive(Debug, Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Notification {
    #[zeroize(skip)]
    pub item_id: ItemId,
    #[zeroize(skip)]
    pub recipient: String,
    #[zeroize(skip)]
    pub subject: String,
    pub body: String,
    #[zeroize(skip)]
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn password_changed(
        recipient: &str,
        item_id: ItemId,
        title: &str,
        secret: &str,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            item_id,
            recipient: recipient.to_string(),
            subject: format!("Password changed - {}", title),
            body: format!("New password for item {} is: {}", title, secret),
            created_at: at,
        }
    }
}

/// Notices emitted during a batch, waiting to be dispatched.
#[derive(Debug, Default)]
pub struct Outbox {
    queue: Vec<Notification>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notification: Notification) {
        self.queue.push(notification);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.queue.iter()
    }

    /// Send everything through `notifier`. Returns how many sends succeeded.
    pub fn dispatch(&mut self, notifier: &dyn Notifier) -> usize {
        let mut sent = 0;
        for notification in self.queue.drain(..) {
            match notifier.send(
                &notification.recipient,
                &notification.subject,
                &notification.body,
            ) {
                Ok(()) => sent += 1,
                Err(e) => tracing::warn!(
                    item_id = notification.item_id,
                    error = %e,
                    "rotation notice dropped"
                ),
            }
        }
        sent
    }
}

pub trait Notifier {
    fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;
}

/// Build the notifier selected in config.
pub fn from_config(config: &NotifyConfig, spool: PathBuf) -> Box<dyn Notifier> {
    match config.transport {
        Transport::Spool => Box::new(SpoolNotifier::new(spool)),
        Transport::Command => Box::new(CommandNotifier::new(config.command.clone())),
    }
}

#[derive(Serialize)]
struct SpoolLine<'a> {
    queued_at: DateTime<Utc>,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Appends one JSON line per notice to a local file for an external mailer to pick up.
#[derive(Debug, Clone)]
pub struct SpoolNotifier {
    path: PathBuf,
}

impl SpoolNotifier {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Notifier for SpoolNotifier {
    fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        let line = serde_json::to_string(&SpoolLine {
            queued_at: Utc::now(),
            to: recipient,
            subject,
            body,
        })
        .map_err(|e| PassrotError::Serialization(e.to_string()))?;

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| PassrotError::Notify(format!("{}: {}", self.path.display(), e)))?;
        writeln!(file, "{}", line).map_err(|e| PassrotError::Notify(e.to_string()))?;
        Ok(())
    }
}

/// Header values lose their line breaks so they cannot start new header lines.
fn header_value(raw: &str) -> String {
    raw.replace(['\r', '\n'], " ")
}

/// Build the message piped to the mail command: single-line `To` and `Subject`
/// headers, then the body with CRLF line endings.
pub fn render_message(recipient: &str, subject: &str, body: &str) -> String {
    let mut message = format!(
        "To: {}\r\nSubject: {}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n",
        header_value(recipient),
        header_value(subject)
    );
    for line in body.lines() {
        message.push_str(line);
        message.push_str("\r\n");
    }
    message
}

/// Pipes a plain RFC 5322 message to a sendmail-compatible command.
///
/// The body is written verbatim, so the command must not stop reading at a
/// lone `.` line (sendmail's `-i`, part of the default command).
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    command: Vec<String>,
}

impl CommandNotifier {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl Notifier for CommandNotifier {
    fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| PassrotError::Notify("No mail command configured".into()))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .env_remove("PASSROT_PASSPHRASE")
            .env_remove("PASSROT_KEYFILE")
            .spawn()
            .map_err(|e| PassrotError::Notify(format!("Failed to run '{}': {}", program, e)))?;

        let message = render_message(recipient, subject, body);
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(message.as_bytes())
                .map_err(|e| PassrotError::Notify(e.to_string()))?;
        }

        let status = child
            .wait()
            .map_err(|e| PassrotError::Notify(e.to_string()))?;
        if !status.success() {
            return Err(PassrotError::Notify(format!(
                "'{}' exited with {}",
                program,
                status.code().unwrap_or(-1)
            )));
        }
        Ok(())
    }
}
