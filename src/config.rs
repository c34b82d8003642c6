use anyhow::{bail, Result};
use config::{Config, Environment, File};
use sea_orm::Database;
use serde::Deserialize;
use service::{LoanService, PasswordHasher, TokenIssuer, UserService};
use std::fmt;
use std::path::Path;

use crate::schemas::AppState;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://loanapi.db?mode=rwc";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Prefix of environment variables read into [`Settings`], e.g. `LOANAPI_JWT_SECRET`.
pub const ENV_PREFIX: &str = "LOANAPI";

/// Application settings.
///
/// Sources in increasing priority: built-in defaults, an optional config
/// file, `LOANAPI_*` environment variables and finally command line flags.
#[derive(Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    /// HMAC key used to sign bearer tokens
    pub jwt_secret: String,
    pub token_validity_hours: i64,
    pub bcrypt_cost: u32,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("database_url", &self.database_url)
            .field("bind_address", &self.bind_address)
            .field("jwt_secret", &"<redacted>")
            .field("token_validity_hours", &self.token_validity_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl Settings {
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("jwt_secret", "")?
            .set_default("token_validity_hours", service::token::DEFAULT_VALIDITY_HOURS)?
            .set_default("bcrypt_cost", i64::from(service::password::DEFAULT_COST))?;

        if let Some(path) = config_file {
            tracing::debug!("Reading configuration file {}", path.display());
            builder = builder.add_source(File::from(path));
        }

        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Applies values given on the command line.
    pub fn with_overrides(mut self, database_url: Option<String>, bind_address: Option<String>) -> Self {
        if let Some(database_url) = database_url {
            self.database_url = database_url;
        }
        if let Some(bind_address) = bind_address {
            self.bind_address = bind_address;
        }
        self
    }

    /// Checks the values needed to serve requests.
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            bail!("jwt_secret must be set (e.g. via {}_JWT_SECRET)", ENV_PREFIX);
        }
        if self.token_validity_hours <= 0 {
            bail!("token_validity_hours must be positive, got {}", self.token_validity_hours);
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            bail!("bcrypt_cost must be between 4 and 31, got {}", self.bcrypt_cost);
        }
        Ok(())
    }
}

/// Connects to the database and wires up the services
pub async fn initialize_app_state(settings: &Settings) -> Result<AppState> {
    settings.validate()?;

    tracing::info!("Connecting to database: {}", settings.database_url);
    let db = Database::connect(&settings.database_url).await?;

    let passwords = PasswordHasher::new(settings.bcrypt_cost)?;
    let tokens = TokenIssuer::new(
        &settings.jwt_secret,
        chrono::Duration::hours(settings.token_validity_hours),
    );

    Ok(AppState {
        loans: LoanService::new(db.clone()),
        users: UserService::new(db.clone(), passwords, tokens),
        db,
    })
}
