use std::path::PathBuf;
use std::sync::Arc;

use log::{error, info};
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::store::{file::JsonFileStore, postgres::PgQuestionStore, Store};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    #[serde(default = "default_max_questions")]
    max_questions: usize,
    // secrets
    admin_password: String,
}

impl Config {
    /// The single shared admin password.
    pub fn admin_password(&self) -> &str {
        &self.admin_password
    }

    /// Upper bound on the number of stored questions.
    pub fn max_questions(&self) -> usize {
        self.max_questions
    }
}

fn default_max_questions() -> usize {
    100
}

/// A fairing that loads the application config and puts it in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Which backing medium holds the questions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    File,
    Postgres,
}

/// Configuration for the question store.
#[derive(Deserialize)]
struct StoreConfig {
    // non-secrets
    #[serde(default)]
    store: StoreKind,
    #[serde(default = "default_questions_file")]
    questions_file: PathBuf,
    #[serde(default = "default_db_pool_size")]
    db_pool_size: u32,
    // secrets
    database_url: Option<String>,
}

fn default_questions_file() -> PathBuf {
    PathBuf::from("questions.json")
}

fn default_db_pool_size() -> u32 {
    10
}

/// A fairing that loads the store config, opens the configured backend,
/// performs any setup necessary, and places a [`Store`] into managed state.
pub struct StoreFairing;

#[rocket::async_trait]
impl Fairing for StoreFairing {
    fn info(&self) -> Info {
        Info {
            name: "Question store",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<StoreConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load store config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        let store = match config.store {
            StoreKind::File => {
                info!("Using questions file {}", config.questions_file.display());
                Store::new(Arc::new(JsonFileStore::new(config.questions_file)))
            }
            StoreKind::Postgres => match connect_postgres(&config).await {
                Some(store) => store,
                None => return Err(rocket),
            },
        };

        // Manage the state.
        rocket = rocket.manage(store);
        Ok(rocket)
    }
}

/// Connect to PostgreSQL and ensure the questions table exists.
async fn connect_postgres(config: &StoreConfig) -> Option<Store> {
    let Some(database_url) = config.database_url.as_deref() else {
        error!("`database_url` must be set when `store = \"postgres\"`");
        return None;
    };
    info!("Loaded database config, connecting...");
    let store = match PgQuestionStore::connect(database_url, config.db_pool_size).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to connect to database: {e}");
            return None;
        }
    };
    if let Err(e) = store.ensure_schema().await {
        error!("Failed to prepare database schema: {e}");
        return None;
    }
    info!("...database connection online!");
    Some(Store::new(Arc::new(store)))
}
