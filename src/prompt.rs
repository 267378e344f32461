//! Interactive confirmation before destructive deletion.

use anyhow::{Context, Result};
use std::io::{BufRead, Write};

/// The only answer that confirms deletion
pub const CONFIRM_TOKEN: &str = "y";

/// Ask the user to confirm deleting originals. Anything other than exactly
/// [`CONFIRM_TOKEN`] (including end of input) counts as a refusal.
pub fn confirm_deletion<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<bool> {
    write!(
        output,
        "WARNING: --delete will PERMANENTLY DELETE original projects after archiving. Type '{}' to confirm: ",
        CONFIRM_TOKEN
    )
    .context("Failed to write confirmation prompt")?;
    output.flush().context("Failed to write confirmation prompt")?;

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;

    Ok(answer.trim_end_matches(&['\r', '\n'][..]) == CONFIRM_TOKEN)
}
