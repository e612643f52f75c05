//! Key Command
//!
//! Manage the stored API key.
//!
//! Usage:
//!   bundlegen key set
//!   bundlegen key clear
//!   bundlegen key path

use console::Term;
use secrecy::SecretString;
use std::io::IsTerminal;
use std::path::Path;

use crate::cli::ui::Output;
use crate::cli::util::{credentials_path, load_settings};
use crate::constants::{credentials, env as env_constants};
use crate::secrets::{FileSecretStore, SecretStore};
use crate::types::{BundleError, Result};

/// Ask for the API key on the terminal without echo
///
/// Returns `None` when stdin or stderr is not interactive.
pub fn prompt_api_key() -> Result<Option<String>> {
    let term = Term::stderr();
    if !can_prompt(std::io::stdin().is_terminal(), term.is_term()) {
        return Ok(None);
    }
    term.write_line(&format!(
        "No API key found in {} or the credential store.",
        env_constants::API_KEY
    ))?;
    term.write_str("API key: ")?;
    let key = term.read_secure_line()?;
    Ok(Some(key))
}

/// The answer is read from stdin and the prompt goes to stderr; both must be a terminal
fn can_prompt(stdin_is_term: bool, stderr_is_term: bool) -> bool {
    stdin_is_term && stderr_is_term
}

/// Prompt for a key and store it
pub fn set(config_file: Option<&Path>) -> Result<()> {
    let store = FileSecretStore::new(credentials_path(&load_settings(config_file)?)?);
    let key = prompt_api_key()?
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .ok_or_else(|| BundleError::Credentials("No API key entered".to_string()))?;

    store.set(credentials::API_KEY_ENTRY, &SecretString::from(key))?;
    Output::default().success(&format!("API key saved to {}", store.path().display()));
    Ok(())
}

/// Remove the stored key
pub fn clear(config_file: Option<&Path>) -> Result<()> {
    let store = FileSecretStore::new(credentials_path(&load_settings(config_file)?)?);
    let output = Output::default();
    if store.clear(credentials::API_KEY_ENTRY)? {
        output.success("Stored API key removed");
    } else {
        output.info("No stored API key");
    }
    Ok(())
}

/// Show the credentials file location
pub fn path(config_file: Option<&Path>) -> Result<()> {
    let path = credentials_path(&load_settings(config_file)?)?;
    println!("{}", path.display());
    Ok(())
}
