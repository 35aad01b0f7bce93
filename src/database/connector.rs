use crate::config::{Config, DatabaseSettings};
use crate::database::models::{customer, mailing, message, operator, tag};
use crate::errors::AppError;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
    Statement,
};
use std::time::Duration;

/// Тип пула подключений SeaORM
pub type DB = DatabaseConnection;

fn connect_options_from_settings(settings: &DatabaseSettings) -> ConnectOptions {
    let mut opt = ConnectOptions::new(settings.url.clone());
    opt.max_connections(20)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(false);

    if let Some(v) = settings.max_connections {
        opt.max_connections(v);
    }
    if let Some(v) = settings.min_connections {
        opt.min_connections(v);
    }
    if let Some(v) = settings.connect_timeout_secs {
        opt.connect_timeout(Duration::from_secs(v));
    }
    if let Some(v) = settings.acquire_timeout_secs {
        opt.acquire_timeout(Duration::from_secs(v));
    }
    if let Some(v) = settings.idle_timeout_secs {
        opt.idle_timeout(Duration::from_secs(v));
    }
    if let Some(v) = settings.sql_log {
        opt.sqlx_logging(v);
    }

    opt
}

/// Подключение по `DATABASE_URL` с параметрами пула из переменных `DATABASE_*`
pub async fn connect(config: &Config) -> Result<DB, AppError> {
    connect_with_settings(&config.database_settings()).await
}

pub async fn connect_with_settings(settings: &DatabaseSettings) -> Result<DB, AppError> {
    let opt = connect_options_from_settings(settings);
    let db = Database::connect(opt).await.map_err(|e| {
        log::error!("Failed to connect to database at {}: {}", settings.url, e);
        AppError::DbError(e)
    })?;

    ping(&db).await?;
    log::info!("Connected to {:?} database", db.get_database_backend());

    Ok(db)
}

/// Легкая проверка, что подключение живо (на том же бэкенде)
pub async fn ping(db: &DB) -> Result<(), AppError> {
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "SELECT 1",
    ))
    .await
    .map_err(|e| {
        log::warn!("DB ping failed: {}", e);
        AppError::DbError(e)
    })?;
    Ok(())
}

async fn create_table<E>(db: &DB, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    log::debug!("Ensured table {}", entity.table_name());
    Ok(())
}

/// Создает пять таблиц, сначала те, на которые ссылаются остальные,
/// вместе с UNIQUE и внешними ключами `ON DELETE SET NULL`
pub async fn create_schema(db: &DB) -> Result<(), AppError> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, operator::Entity).await?;
    create_table(db, &schema, tag::Entity).await?;
    create_table(db, &schema, mailing::Entity).await?;
    create_table(db, &schema, customer::Entity).await?;
    create_table(db, &schema, message::Entity).await?;

    Ok(())
}
