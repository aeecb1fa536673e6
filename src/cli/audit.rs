use passrot::audit as audit_mod;
use passrot::error::{PassrotError, Result};
use passrot::store;

use crate::cli::json_output::{AuditEntryItem, AuditShowResponse};
use crate::cli::{client, print_json, AuditCommands};

pub fn run(cmd: &AuditCommands, json: bool) -> Result<()> {
    match cmd {
        AuditCommands::Show { count } => show(*count, json),
        AuditCommands::Verify => verify(),
        AuditCommands::Export => export(),
    }
}

fn show(count: usize, json: bool) -> Result<()> {
    let entries = audit_mod::read_entries(&store::audit_path()?)?;

    let display = if count == 0 {
        &entries[..]
    } else {
        let start = entries.len().saturating_sub(count);
        &entries[start..]
    };

    if json {
        let items: Vec<AuditEntryItem> = display
            .iter()
            .map(|e| AuditEntryItem {
                timestamp: e.timestamp.to_rfc3339(),
                operation: e.operation.clone(),
                item: e.item,
                actor: e.actor.clone(),
                outcome: e.outcome.clone(),
                detail: e.detail.clone(),
            })
            .collect();
        return print_json(&AuditShowResponse {
            shown: items.len(),
            total: entries.len(),
            entries: items,
        });
    }

    if entries.is_empty() {
        eprintln!("No audit log entries.");
        return Ok(());
    }

    for entry in display {
        let item_str = entry
            .item
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{} | {:<16} | {:<10} | {:<20} | {:>4} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.operation,
            entry.outcome,
            entry.actor,
            item_str,
            entry.detail.as_deref().unwrap_or(""),
        );
    }
    eprintln!("\n({} entries shown of {} total)", display.len(), entries.len());
    Ok(())
}

fn verify() -> Result<()> {
    match client()?.verify_audit_chain() {
        Ok((count, _)) => {
            println!("Audit log integrity verified. {} entries, chain intact.", count);
            Ok(())
        }
        Err(e) => {
            eprintln!("INTEGRITY FAILURE: {}", e);
            Err(e)
        }
    }
}

fn export() -> Result<()> {
    let entries = audit_mod::read_entries(&store::audit_path()?)?;
    let json = serde_json::to_string_pretty(&entries)
        .map_err(|e| PassrotError::Serialization(e.to_string()))?;
    println!("{}", json);
    Ok(())
}
