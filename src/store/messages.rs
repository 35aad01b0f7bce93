use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, QueryOrder, Set};

use super::{CampaignStore, Reference, begin_with_references};
use crate::database::{customer, mailing, message};
use crate::errors::AppError;

/// `status` сохраняется как есть, коды статусов определяет сервис доставки
#[derive(Debug, Clone)]
pub struct CreateMessageDto {
    pub mailing_id: Option<i32>,
    pub customer_id: Option<i32>,
    pub status: i32,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateMessageDto {
    pub mailing_id: Option<Option<i32>>,
    pub customer_id: Option<Option<i32>>,
    pub status: Option<i32>,
}

impl CampaignStore {
    pub async fn create_message(&self, dto: CreateMessageDto) -> Result<message::Model, AppError> {
        let refs: Vec<Reference> = [
            dto.mailing_id.map(Reference::Mailing),
            dto.customer_id.map(Reference::Customer),
        ]
        .into_iter()
        .flatten()
        .collect();

        let now = self.now();
        let txn = begin_with_references(&self.db, &refs).await?;
        let result = message::ActiveModel {
            mailing_id: Set(dto.mailing_id),
            customer_id: Set(dto.customer_id),
            status: Set(dto.status),
            created_date: Set(now),
            changed_date: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await;
        let created = self.finish_write(txn, result, &refs).await?;

        log::debug!(
            "Recorded message {} for mailing {:?} to customer {:?} with status {}",
            created.id,
            created.mailing_id,
            created.customer_id,
            created.status
        );
        Ok(created)
    }

    pub async fn update_message(
        &self,
        id: i32,
        dto: UpdateMessageDto,
    ) -> Result<message::Model, AppError> {
        let mut active_model = self.get_message(id).await?.into_active_model();

        let mut refs = Vec::new();
        if let Some(mailing_id) = dto.mailing_id {
            refs.extend(mailing_id.map(Reference::Mailing));
            active_model.mailing_id = Set(mailing_id);
        }
        if let Some(customer_id) = dto.customer_id {
            refs.extend(customer_id.map(Reference::Customer));
            active_model.customer_id = Set(customer_id);
        }
        if let Some(status) = dto.status {
            active_model.status = Set(status);
        }
        active_model.changed_date = Set(self.now());

        let txn = begin_with_references(&self.db, &refs).await?;
        let result = active_model.update(&txn).await;
        self.finish_write(txn, result, &refs).await
    }

    pub async fn get_message(&self, id: i32) -> Result<message::Model, AppError> {
        message::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Message with id {} not found", id)))
    }

    /// Все сообщения по коду статуса
    pub async fn list_messages(&self) -> Result<Vec<message::Model>, AppError> {
        let messages = message::Entity::find()
            .order_by_asc(message::Column::Status)
            .order_by_asc(message::Column::Id)
            .all(&self.db)
            .await?;
        Ok(messages)
    }

    pub async fn delete_message(&self, id: i32) -> Result<(), AppError> {
        let result = message::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Message with id {} not found", id)));
        }
        log::info!("Deleted message {}", id);
        Ok(())
    }

    /// Читаемая подпись с подгруженными рассылкой и клиентом
    pub async fn describe_message(&self, id: i32) -> Result<String, AppError> {
        let message = self.get_message(id).await?;

        let mailing = match message.mailing_id {
            Some(mailing_id) => mailing::Entity::find_by_id(mailing_id).one(&self.db).await?,
            None => None,
        };
        let customer = match message.customer_id {
            Some(customer_id) => customer::Entity::find_by_id(customer_id).one(&self.db).await?,
            None => None,
        };

        Ok(message.label(mailing.as_ref(), customer.as_ref()))
    }
}
