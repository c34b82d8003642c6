use std::sync::Arc;
use tokio::task;
use tracing::warn;

use crate::error::Result;

pub use bcrypt::DEFAULT_COST;

const DECOY_PASSWORD: &str = "decoy password for unknown usernames";

/// Salted bcrypt hashing of user passwords.
///
/// bcrypt is CPU bound, so hashing and verification run on the blocking pool.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
    /// Hash with the configured cost, checked when no stored hash exists so
    /// that a login for an unknown username costs as much as a real one.
    decoy: Arc<str>,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self> {
        let decoy = bcrypt::hash(DECOY_PASSWORD, cost)?;
        Ok(Self {
            cost,
            decoy: decoy.into(),
        })
    }

    pub async fn hash(&self, password: &str) -> Result<String> {
        let password = password.to_owned();
        let cost = self.cost;
        let hashed = task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
        Ok(hashed)
    }

    /// Checks `password` against a stored hash. A malformed hash never matches.
    /// Without a stored hash the decoy is checked and the result is always false.
    pub async fn verify(&self, password: &str, password_hash: Option<&str>) -> Result<bool> {
        let password = password.to_owned();
        let (password_hash, known) = match password_hash {
            Some(hash) => (hash.to_owned(), true),
            None => (self.decoy.to_string(), false),
        };

        let matches = task::spawn_blocking(move || match bcrypt::verify(password, &password_hash) {
            Ok(matches) => matches,
            Err(e) => {
                warn!("Stored password hash could not be verified: {}", e);
                false
            }
        })
        .await?;

        Ok(known && matches)
    }
}
