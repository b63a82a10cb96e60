//! Interactive credential prompt for SSH sessions.

use anyhow::{Context, Result};
use dialoguer::{Input, Password};

/// Prompt for username (echoed) and password (hidden). Runs in cooked
/// terminal mode, before the session enters raw mode.
pub fn read_credentials() -> Result<(String, String)> {
    let username: String = Input::new()
        .with_prompt("username")
        .interact_text()
        .context("failed to read username")?;

    let password = Password::new()
        .with_prompt("password")
        .interact()
        .context("failed to read password")?;

    Ok((username, password))
}
