use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

const SERVICE_NAME: &str = "husmah-admin";

/// "Remember me" password storage in the OS keychain, keyed by email.
pub struct CredentialStore;

impl CredentialStore {
    /// Store the password for `email` in the OS keychain
    pub fn store(email: &str, password: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, email).context("Failed to create keyring entry")?;
        entry
            .set_password(password)
            .context("Failed to store password in keychain")?;
        debug!(email, "Stored remembered credentials");
        Ok(())
    }

    /// Retrieve the remembered password for `email`
    pub fn get_password(email: &str) -> Result<String> {
        let entry = Entry::new(SERVICE_NAME, email).context("Failed to create keyring entry")?;
        entry
            .get_password()
            .context("Failed to retrieve password from keychain")
    }

    /// Forget the password for `email`
    pub fn delete(email: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, email).context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete credential from keychain")?;
        Ok(())
    }

    pub fn has_credentials(email: &str) -> bool {
        Entry::new(SERVICE_NAME, email)
            .and_then(|entry| entry.get_password())
            .is_ok()
    }
}
