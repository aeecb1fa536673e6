use passrot::api::ItemSummary;
use passrot::error::Result;
use passrot::interval::update::UpdateOutcome;

use crate::cli::json_output::{ItemAddResponse, ItemListResponse, ItemSaveResponse, ItemShowResponse};
use crate::cli::{client, print_json, read_secret_stdin, ItemCommands};

pub fn run(cmd: &ItemCommands, json: bool) -> Result<()> {
    match cmd {
        ItemCommands::Add { title, interval } => add(title, interval.as_deref(), json),
        ItemCommands::List => list(json),
        ItemCommands::Show { id, reveal } => show(*id, *reveal, json),
        ItemCommands::Save {
            id,
            interval,
            secret_stdin,
        } => save(*id, interval.as_deref(), *secret_stdin, json),
        ItemCommands::Remove { id } => remove(*id),
    }
}

fn add(title: &str, interval: Option<&str>, json: bool) -> Result<()> {
    let client = client()?;
    let secret = read_secret_stdin()?;
    let protected = !secret.is_empty();
    let id = client.add_item(title, &secret, interval)?;

    if json {
        print_json(&ItemAddResponse {
            id,
            title: title.to_string(),
            protected,
        })?;
    } else {
        println!("{}", id);
        eprintln!("Item '{}' added with id {}.", title, id);
    }
    Ok(())
}

fn list(json: bool) -> Result<()> {
    let items = client()?.items()?;

    if json {
        return print_json(&ItemListResponse { items });
    }
    for item in &items {
        println!("{}", row(item));
    }
    Ok(())
}

fn show(id: u64, reveal: bool, json: bool) -> Result<()> {
    let client = client()?;
    let item = client.item(id)?;
    let secret = if reveal {
        Some(client.secret(id)?)
    } else {
        None
    };

    if json {
        return print_json(&ItemShowResponse { item, secret });
    }
    println!("{}", row(&item));
    if let Some(secret) = secret {
        println!("password: {}", secret);
    }
    Ok(())
}

fn save(id: u64, interval: Option<&str>, secret_stdin: bool, json: bool) -> Result<()> {
    let client = client()?;
    let secret = if secret_stdin {
        Some(read_secret_stdin()?)
    } else {
        None
    };
    let outcome = client.save_item(id, interval, secret.as_deref())?;

    if json {
        return print_json(&ItemSaveResponse { id, outcome });
    }
    match outcome {
        UpdateOutcome::Unprotected => eprintln!("Item {} is not protected; interval untouched.", id),
        UpdateOutcome::NoField => eprintln!("Item {} saved.", id),
        UpdateOutcome::Cleared => eprintln!("Item {}: rotation interval cleared.", id),
        UpdateOutcome::Ignored => eprintln!("Item {}: interval value ignored.", id),
        UpdateOutcome::Unchanged { interval_days } => {
            eprintln!("Item {}: interval unchanged ({} days).", id, interval_days)
        }
        UpdateOutcome::Rearmed {
            interval_days,
            next_due_at,
        } => eprintln!(
            "Item {}: rotates every {} days, next at {}.",
            id,
            interval_days,
            next_due_at.to_rfc3339()
        ),
    }
    Ok(())
}

fn remove(id: u64) -> Result<()> {
    client()?.remove_item(id)?;
    eprintln!("Item {} removed.", id);
    Ok(())
}

fn row(item: &ItemSummary) -> String {
    let interval = item
        .interval_days
        .map(|days| format!("{}d", days))
        .unwrap_or_else(|| "-".into());
    format!(
        "{:>4} | {:<24} | {:<9} | {:>5} | {}",
        item.id,
        item.title,
        if item.protected { "protected" } else { "open" },
        interval,
        item.next_due_at.as_deref().unwrap_or("-"),
    )
}
