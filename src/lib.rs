#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{figment::Figment, Build, Rocket};

use crate::config::{ConfigFairing, StoreFairing};
use crate::logging::LoggerFairing;
use crate::pages::PagesFairing;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod pages;
pub mod store;

/// Build the server from the default figment (`Rocket.toml` plus `ROCKET_*`
/// environment variables).
pub fn build() -> Rocket<Build> {
    rocket_from_figment(rocket::Config::figment())
}

/// Build the server from an explicit figment.
pub fn rocket_from_figment(figment: Figment) -> Rocket<Build> {
    rocket::custom(figment)
        .attach(ConfigFairing)
        .attach(StoreFairing)
        .attach(PagesFairing)
        .attach(LoggerFairing)
        .mount("/", api::routes())
        .register("/", api::catchers())
}

/// Admin password used by every test instance.
#[cfg(test)]
pub(crate) const TEST_ADMIN_PASSWORD: &str = "test-admin-password";

/// A fresh, unused questions file location for a single test.
#[cfg(test)]
pub(crate) fn test_questions_file() -> std::path::PathBuf {
    let random: u32 = rand::random();
    std::env::temp_dir().join(format!("quiz-test-{random}/questions.json"))
}

/// Build a test server backed by the given questions file.
#[cfg(test)]
pub(crate) fn rocket_for_questions_file(questions_file: &std::path::Path) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("admin_password", TEST_ADMIN_PASSWORD))
        .merge(("store", "file"))
        .merge(("questions_file", questions_file))
        .merge(("log_level", "off"));
    rocket_from_figment(figment)
}
