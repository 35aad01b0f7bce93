use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use super::{CampaignStore, Reference, begin_with_references};
use crate::database::{customer, message};
use crate::errors::AppError;
use crate::validation::{validate_phone, validate_timezone};

#[derive(Debug, Clone)]
pub struct CreateCustomerDto {
    pub phone: String,
    pub operator_id: i32,
    pub tag_id: Option<i32>,
    /// Если не указана, берется зона хранилища по умолчанию
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateCustomerDto {
    pub phone: Option<String>,
    pub operator_id: Option<i32>,
    pub tag_id: Option<Option<i32>>,
    pub timezone: Option<String>,
}

impl CampaignStore {
    pub async fn create_customer(&self, dto: CreateCustomerDto) -> Result<customer::Model, AppError> {
        validate_phone(&dto.phone)?;
        let timezone = dto
            .timezone
            .unwrap_or_else(|| self.default_timezone.clone());
        validate_timezone(&timezone)?;
        let refs: Vec<Reference> = std::iter::once(Reference::Operator(dto.operator_id))
            .chain(dto.tag_id.map(Reference::Tag))
            .collect();

        let now = self.now();
        let txn = begin_with_references(&self.db, &refs).await?;
        let result = customer::ActiveModel {
            phone: Set(dto.phone),
            operator_id: Set(Some(dto.operator_id)),
            tag_id: Set(dto.tag_id),
            timezone: Set(timezone),
            created_date: Set(now),
            changed_date: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await;
        let created = self.finish_write(txn, result, &refs).await?;

        log::info!("Created customer {} ({})", created.id, created.phone);
        Ok(created)
    }

    /// Клиенту, чей оператор был удален, при следующем обновлении нужно назначить нового
    pub async fn update_customer(
        &self,
        id: i32,
        dto: UpdateCustomerDto,
    ) -> Result<customer::Model, AppError> {
        let current = self.get_customer(id).await?;
        if dto.operator_id.is_none() && current.operator_id.is_none() {
            return Err(AppError::validation("operator", "this field is required"));
        }
        let mut active_model = current.into_active_model();

        if let Some(phone) = dto.phone {
            validate_phone(&phone)?;
            active_model.phone = Set(phone);
        }
        let mut refs = Vec::new();
        if let Some(operator_id) = dto.operator_id {
            refs.push(Reference::Operator(operator_id));
            active_model.operator_id = Set(Some(operator_id));
        }
        if let Some(tag_id) = dto.tag_id {
            refs.extend(tag_id.map(Reference::Tag));
            active_model.tag_id = Set(tag_id);
        }
        if let Some(timezone) = dto.timezone {
            validate_timezone(&timezone)?;
            active_model.timezone = Set(timezone);
        }
        active_model.changed_date = Set(self.now());

        let txn = begin_with_references(&self.db, &refs).await?;
        let result = active_model.update(&txn).await;
        self.finish_write(txn, result, &refs).await
    }

    pub async fn get_customer(&self, id: i32) -> Result<customer::Model, AppError> {
        log::debug!("Looking up customer {}", id);
        customer::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Customer with id {} not found", id)))
    }

    /// Все клиенты по номеру телефона
    pub async fn list_customers(&self) -> Result<Vec<customer::Model>, AppError> {
        let customers = customer::Entity::find()
            .order_by_asc(customer::Column::Phone)
            .order_by_asc(customer::Column::Id)
            .all(&self.db)
            .await?;
        Ok(customers)
    }

    pub async fn delete_customer(&self, id: i32) -> Result<(), AppError> {
        let now = self.now();
        let txn = self.db.begin().await?;

        let customer = customer::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Customer with id {} not found", id)))?;

        let messages = message::Entity::update_many()
            .set(message::ActiveModel {
                customer_id: Set(None),
                changed_date: Set(now),
                ..Default::default()
            })
            .filter(message::Column::CustomerId.eq(id))
            .exec(&txn)
            .await?;

        customer.into_active_model().delete(&txn).await?;
        txn.commit().await?;

        log::info!("Deleted customer {} (cleared {} messages)", id, messages.rows_affected);
        Ok(())
    }
}
