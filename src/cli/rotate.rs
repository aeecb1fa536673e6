use passrot::error::Result;

use crate::cli::{client, print_json};

/// Manual trigger. Rotates every protected item regardless of due date and
/// reports the single completion message.
pub fn run(json: bool) -> Result<()> {
    let outcome = client()?.rotate_all()?;

    if json {
        return print_json(&outcome);
    }
    println!("{}", outcome.message);
    Ok(())
}
