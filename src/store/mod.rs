//! Хранилище рассылок: валидированная запись, списки в порядке по умолчанию
//! и обнуление ссылок при удалении для операторов, тегов, рассылок,
//! клиентов и сообщений.

use sea_orm::prelude::DateTimeUtc;
use sea_orm::{
    ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait, PrimaryKeyTrait, TransactionTrait,
};
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::{Config, DEFAULT_TIMEZONE};
use crate::database::{self, DB, customer, mailing, operator, tag};
use crate::errors::AppError;
use crate::validation::validate_timezone;

pub mod customers;
pub mod mailings;
pub mod messages;
pub mod operators;
pub mod tags;

pub use customers::{CreateCustomerDto, UpdateCustomerDto};
pub use mailings::{CreateMailingDto, UpdateMailingDto};
pub use messages::{CreateMessageDto, UpdateMessageDto};
pub use operators::{CreateOperatorDto, UpdateOperatorDto};
pub use tags::{CreateTagDto, UpdateTagDto};

#[derive(Clone)]
pub struct CampaignStore {
    db: DB,
    clock: Arc<dyn Clock>,
    default_timezone: String,
}

impl CampaignStore {
    pub fn new(db: DB, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            clock,
            default_timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }

    /// Подключается по настройкам из конфигурации, время берется с системных часов
    pub async fn from_config(config: &Config) -> Result<Self, AppError> {
        let timezone = config
            .get_default_timezone()
            .map_err(|e| AppError::validation("timezone", e.to_string()))?;
        let db = database::connect(config).await?;
        Self::new(db, Arc::new(SystemClock)).with_default_timezone(timezone.name())
    }

    /// Загружает [`Config`] из окружения (и `.env`) и подключается
    pub async fn from_env() -> Result<Self, AppError> {
        let config = Config::from_env()?;
        Self::from_config(&config).await
    }

    /// Временная зона для клиентов, созданных без явного указания
    pub fn with_default_timezone(mut self, timezone: &str) -> Result<Self, AppError> {
        validate_timezone(timezone)?;
        self.default_timezone = timezone.to_string();
        Ok(self)
    }

    /// Создает недостающие таблицы
    pub async fn init_schema(&self) -> Result<(), AppError> {
        database::create_schema(&self.db).await
    }

    fn now(&self) -> DateTimeUtc {
        self.clock.now()
    }

    /// Завершает запись, начатую в `txn`: фиксирует при успехе, иначе откатывает
    /// и переводит ошибку в валидационную, если пропала одна из ссылок.
    async fn finish_write<M>(
        &self,
        txn: DatabaseTransaction,
        result: Result<M, DbErr>,
        refs: &[Reference],
    ) -> Result<M, AppError> {
        match result {
            Ok(model) => {
                txn.commit().await?;
                Ok(model)
            }
            Err(err) => {
                txn.rollback().await?;
                Err(self.explain_write_error(err, refs).await)
            }
        }
    }

    async fn explain_write_error(&self, err: DbErr, refs: &[Reference]) -> AppError {
        for reference in refs {
            match reference.ensure(&self.db).await {
                Ok(()) => {}
                Err(missing @ AppError::Validation { .. }) => return missing,
                Err(other) => {
                    log::warn!("Could not recheck {}: {}", reference.field(), other);
                }
            }
        }
        AppError::DbError(err)
    }
}

/// Внешняя ссылка записи, проверяемая в той же транзакции, что и сама запись
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reference {
    Operator(i32),
    Tag(i32),
    Mailing(i32),
    Customer(i32),
}

impl Reference {
    fn field(&self) -> &'static str {
        match self {
            Reference::Operator(_) => "operator",
            Reference::Tag(_) => "tag",
            Reference::Mailing(_) => "mailing",
            Reference::Customer(_) => "customer",
        }
    }

    async fn ensure<C>(&self, conn: &C) -> Result<(), AppError>
    where
        C: ConnectionTrait,
    {
        let field = self.field();
        match *self {
            Reference::Operator(id) => ensure_exists::<operator::Entity, C>(conn, id, field).await,
            Reference::Tag(id) => ensure_exists::<tag::Entity, C>(conn, id, field).await,
            Reference::Mailing(id) => ensure_exists::<mailing::Entity, C>(conn, id, field).await,
            Reference::Customer(id) => ensure_exists::<customer::Entity, C>(conn, id, field).await,
        }
    }
}

/// Открывает транзакцию и проверяет в ней все ссылки
async fn begin_with_references(
    db: &DB,
    refs: &[Reference],
) -> Result<DatabaseTransaction, AppError> {
    let txn = db.begin().await?;
    for reference in refs {
        reference.ensure(&txn).await?;
    }
    Ok(txn)
}

async fn ensure_exists<E, C>(conn: &C, id: i32, field: &'static str) -> Result<(), AppError>
where
    E: EntityTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
    C: ConnectionTrait,
{
    match E::find_by_id(id).one(conn).await? {
        Some(_) => Ok(()),
        None => {
            log::warn!("Rejected reference to missing {} {}", field, id);
            Err(AppError::validation(
                field,
                format!("{} with id {} does not exist", field, id),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FixedClock;
    use crate::config::DatabaseSettings;
    use chrono::{TimeZone, Utc};

    async fn store() -> CampaignStore {
        let db = database::connect_with_settings(&DatabaseSettings::in_memory())
            .await
            .unwrap();
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
        ));
        let store = CampaignStore::new(db, clock);
        store.init_schema().await.unwrap();
        store
    }

    #[tokio::test]
    async fn failed_write_with_vanished_reference_reports_the_field() {
        let store = store().await;
        let err = store
            .explain_write_error(
                DbErr::Custom("FOREIGN KEY constraint failed".into()),
                &[Reference::Operator(7)],
            )
            .await;
        assert!(matches!(err, AppError::Validation { field: "operator", .. }), "{err:?}");
    }

    #[tokio::test]
    async fn failed_write_with_intact_references_stays_a_db_error() {
        let store = store().await;
        let amy = store
            .create_operator(CreateOperatorDto {
                name: "Amy".to_string(),
            })
            .await
            .unwrap();

        let err = store
            .explain_write_error(
                DbErr::Custom("disk I/O error".into()),
                &[Reference::Operator(amy.id)],
            )
            .await;
        assert!(matches!(err, AppError::DbError(_)), "{err:?}");
    }

    #[tokio::test]
    async fn references_are_checked_inside_the_transaction() {
        let store = store().await;
        let err = begin_with_references(&store.db, &[Reference::Tag(3)])
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("tag"));

        // откат по drop освобождает единственное соединение пула
        let mailing = store
            .create_mailing(CreateMailingDto {
                message_text: "after".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(mailing.tag_id, None);
    }
}
