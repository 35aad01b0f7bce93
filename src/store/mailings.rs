use sea_orm::prelude::DateTimeUtc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use super::{CampaignStore, Reference, begin_with_references};
use crate::database::{mailing, message};
use crate::errors::AppError;
use crate::validation::ensure_not_past;

#[derive(Debug, Clone, Default)]
pub struct CreateMailingDto {
    /// По умолчанию текущее время
    pub start_date: Option<DateTimeUtc>,
    /// По умолчанию `start_date` плюс стандартное окно рассылки
    pub stop_date: Option<DateTimeUtc>,
    pub message_text: String,
    pub operator_id: Option<i32>,
    pub tag_id: Option<i32>,
    pub is_started: bool,
    pub is_completed: bool,
}

/// Записываются и проверяются только поля со значением `Some`.
/// `Some(None)` снимает ссылку на оператора или тег.
#[derive(Debug, Clone, Default)]
pub struct UpdateMailingDto {
    pub start_date: Option<DateTimeUtc>,
    pub stop_date: Option<DateTimeUtc>,
    pub message_text: Option<String>,
    pub operator_id: Option<Option<i32>>,
    pub tag_id: Option<Option<i32>>,
    pub is_started: Option<bool>,
    pub is_completed: Option<bool>,
}

impl CampaignStore {
    pub async fn create_mailing(&self, dto: CreateMailingDto) -> Result<mailing::Model, AppError> {
        let now = self.now();
        let start_date = dto.start_date.unwrap_or(now);

        ensure_not_past("start_date", start_date, now)?;
        if let Some(stop_date) = dto.stop_date {
            ensure_not_past("stop_date", stop_date, now)?;
        }
        let refs: Vec<Reference> = [
            dto.operator_id.map(Reference::Operator),
            dto.tag_id.map(Reference::Tag),
        ]
        .into_iter()
        .flatten()
        .collect();

        let active_model = mailing::ActiveModel {
            start_date: Set(start_date),
            stop_date: Set(dto.stop_date),
            message_text: Set(dto.message_text),
            operator_id: Set(dto.operator_id),
            tag_id: Set(dto.tag_id),
            is_started: Set(dto.is_started),
            is_completed: Set(dto.is_completed),
            created_date: Set(now),
            changed_date: Set(now),
            ..Default::default()
        };

        let created = self.save_mailing(active_model, true, &refs).await?;
        log::info!("Created mailing {}: {}", created.id, created);
        Ok(created)
    }

    pub async fn update_mailing(
        &self,
        id: i32,
        dto: UpdateMailingDto,
    ) -> Result<mailing::Model, AppError> {
        let now = self.now();
        let mut active_model = self.get_mailing(id).await?.into_active_model();

        if let Some(start_date) = dto.start_date {
            ensure_not_past("start_date", start_date, now)?;
            active_model.start_date = Set(start_date);
        }
        if let Some(stop_date) = dto.stop_date {
            ensure_not_past("stop_date", stop_date, now)?;
            active_model.stop_date = Set(Some(stop_date));
        }
        if let Some(message_text) = dto.message_text {
            active_model.message_text = Set(message_text);
        }
        let mut refs = Vec::new();
        if let Some(operator_id) = dto.operator_id {
            refs.extend(operator_id.map(Reference::Operator));
            active_model.operator_id = Set(operator_id);
        }
        if let Some(tag_id) = dto.tag_id {
            refs.extend(tag_id.map(Reference::Tag));
            active_model.tag_id = Set(tag_id);
        }
        if let Some(is_started) = dto.is_started {
            active_model.is_started = Set(is_started);
        }
        if let Some(is_completed) = dto.is_completed {
            active_model.is_completed = Set(is_completed);
        }
        active_model.changed_date = Set(now);

        self.save_mailing(active_model, false, &refs).await
    }

    /// Общий путь записи для создания и обновления: сначала заполняет пустую дату окончания,
    /// ссылки проверяются в той же транзакции.
    async fn save_mailing(
        &self,
        mut active_model: mailing::ActiveModel,
        insert: bool,
        refs: &[Reference],
    ) -> Result<mailing::Model, AppError> {
        active_model.fill_default_stop_date();

        let txn = begin_with_references(&self.db, refs).await?;
        let result = if insert {
            active_model.insert(&txn).await
        } else {
            active_model.update(&txn).await
        };
        self.finish_write(txn, result, refs).await
    }

    pub async fn get_mailing(&self, id: i32) -> Result<mailing::Model, AppError> {
        log::debug!("Looking up mailing {}", id);
        mailing::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Mailing with id {} not found", id)))
    }

    /// Все рассылки, раньше начинающиеся идут первыми
    pub async fn list_mailings(&self) -> Result<Vec<mailing::Model>, AppError> {
        let mailings = mailing::Entity::find()
            .order_by_asc(mailing::Column::StartDate)
            .order_by_asc(mailing::Column::Id)
            .all(&self.db)
            .await?;
        Ok(mailings)
    }

    /// Удаляет рассылку, у ее сообщений ссылка обнуляется
    pub async fn delete_mailing(&self, id: i32) -> Result<(), AppError> {
        let now = self.now();
        let txn = self.db.begin().await?;

        let mailing = mailing::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Mailing with id {} not found", id)))?;

        let messages = message::Entity::update_many()
            .set(message::ActiveModel {
                mailing_id: Set(None),
                changed_date: Set(now),
                ..Default::default()
            })
            .filter(message::Column::MailingId.eq(id))
            .exec(&txn)
            .await?;

        mailing.into_active_model().delete(&txn).await?;
        txn.commit().await?;

        log::info!("Deleted mailing {} (cleared {} messages)", id, messages.rows_affected);
        Ok(())
    }
}
