//! Account commands.
//!
//! # Usage
//!
//! ```bash
//! sf-cli register -n "Asha Rao" -e asha@example.com -p 'Sunflower#42'
//!
//! # Prints the session entries; export them for the other commands
//! sf-cli login -e asha@example.com -p 'Sunflower#42'
//! ```

use shopfront_client::AppState;
use shopfront_client::session::keys;

use super::{CommandError, emit};

/// Environment variable each session entry is read back from.
fn env_var_for(key: &str) -> &'static str {
    match key {
        keys::ACCESS_TOKEN => "SHOPFRONT_ACCESS_TOKEN",
        keys::EMAIL => "SHOPFRONT_EMAIL",
        _ => "SHOPFRONT_USER_ID",
    }
}

/// Create an account.
///
/// # Errors
///
/// Returns an error if validation fails or the backend rejects the account.
pub async fn register(
    state: &AppState,
    name: &str,
    email: &str,
    password: &str,
) -> Result<(), CommandError> {
    let message = state.api().register(name, email, password).await?;
    emit(&message);
    emit("Sign in with `sf-cli login` to start shopping.");
    Ok(())
}

/// Sign in and print the session entries as shell exports.
///
/// # Errors
///
/// Returns an error if validation fails or the credentials are rejected.
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<(), CommandError> {
    let message = state.api().login(email, password).await?;
    tracing::info!("{message}");

    if let Some(credentials) = state.session().credentials() {
        for (key, value) in credentials.entries() {
            emit(&format!("export {}='{value}'", env_var_for(key)));
        }
    }
    Ok(())
}
