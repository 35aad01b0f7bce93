#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use mailing_list::config::DatabaseSettings;
use mailing_list::database::{self, operator};
use mailing_list::store::CreateOperatorDto;
use mailing_list::{CampaignStore, FixedClock};
use sea_orm::prelude::DateTimeUtc;
use std::path::Path;
use std::sync::Arc;

pub fn t0() -> DateTimeUtc {
    Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap()
}

pub struct TestStore {
    pub store: CampaignStore,
    pub clock: Arc<FixedClock>,
}

pub async fn setup() -> TestStore {
    setup_with(&DatabaseSettings::in_memory()).await
}

/// SQLite file in `dir` behind a pool of several connections, so writes really overlap.
pub fn pooled_file_settings(dir: &Path, connections: u32) -> DatabaseSettings {
    DatabaseSettings {
        url: format!("sqlite://{}?mode=rwc", dir.join("mailing.db").display()),
        max_connections: Some(connections),
        min_connections: Some(connections),
        connect_timeout_secs: None,
        acquire_timeout_secs: None,
        idle_timeout_secs: None,
        sql_log: Some(false),
    }
}

pub async fn setup_with(settings: &DatabaseSettings) -> TestStore {
    let _ = env_logger::builder().is_test(true).try_init();

    let db = database::connect_with_settings(settings)
        .await
        .expect("database");
    let clock = Arc::new(FixedClock::new(t0()));
    let store = CampaignStore::new(db, clock.clone());
    store.init_schema().await.expect("schema");

    TestStore { store, clock }
}

pub async fn operator(store: &CampaignStore, name: &str) -> operator::Model {
    store
        .create_operator(CreateOperatorDto {
            name: name.to_string(),
        })
        .await
        .expect("operator")
}
