use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use super::CampaignStore;
use crate::database::{customer, mailing, operator};
use crate::errors::AppError;
use crate::validation::validate_name;

#[derive(Debug, Clone)]
pub struct CreateOperatorDto {
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateOperatorDto {
    pub name: Option<String>,
}

impl CampaignStore {
    /// Уникальность имени обеспечивает ограничение UNIQUE в таблице,
    /// а не предварительная проверка чтением.
    pub async fn create_operator(&self, dto: CreateOperatorDto) -> Result<operator::Model, AppError> {
        validate_name(&dto.name)?;

        let now = self.now();
        let created = operator::ActiveModel {
            name: Set(dto.name),
            created_date: Set(now),
            changed_date: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| AppError::from_write(e, "name"))?;

        log::info!("Created operator {} ({})", created.id, created.name);
        Ok(created)
    }

    pub async fn update_operator(
        &self,
        id: i32,
        dto: UpdateOperatorDto,
    ) -> Result<operator::Model, AppError> {
        let mut active_model = self.get_operator(id).await?.into_active_model();

        if let Some(name) = dto.name {
            validate_name(&name)?;
            active_model.name = Set(name);
        }
        active_model.changed_date = Set(self.now());

        let updated = active_model
            .update(&self.db)
            .await
            .map_err(|e| AppError::from_write(e, "name"))?;
        Ok(updated)
    }

    pub async fn get_operator(&self, id: i32) -> Result<operator::Model, AppError> {
        log::debug!("Looking up operator {}", id);
        operator::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Operator with id {} not found", id)))
    }

    /// Все операторы по имени
    pub async fn list_operators(&self) -> Result<Vec<operator::Model>, AppError> {
        let operators = operator::Entity::find()
            .order_by_asc(operator::Column::Name)
            .order_by_asc(operator::Column::Id)
            .all(&self.db)
            .await?;
        Ok(operators)
    }

    /// Удаляет оператора. Рассылки и клиенты, ссылавшиеся на него, остаются,
    /// ссылка у них обнуляется.
    pub async fn delete_operator(&self, id: i32) -> Result<(), AppError> {
        let now = self.now();
        let txn = self.db.begin().await?;

        let operator = operator::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Operator with id {} not found", id)))?;

        let mailings = mailing::Entity::update_many()
            .set(mailing::ActiveModel {
                operator_id: Set(None),
                changed_date: Set(now),
                ..Default::default()
            })
            .filter(mailing::Column::OperatorId.eq(id))
            .exec(&txn)
            .await?;

        let customers = customer::Entity::update_many()
            .set(customer::ActiveModel {
                operator_id: Set(None),
                changed_date: Set(now),
                ..Default::default()
            })
            .filter(customer::Column::OperatorId.eq(id))
            .exec(&txn)
            .await?;

        operator.into_active_model().delete(&txn).await?;
        txn.commit().await?;

        log::info!(
            "Deleted operator {} (cleared {} mailings, {} customers)",
            id,
            mailings.rows_affected,
            customers.rows_affected
        );
        Ok(())
    }
}
