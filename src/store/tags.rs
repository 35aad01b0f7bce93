use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use super::CampaignStore;
use crate::database::{customer, mailing, tag};
use crate::errors::AppError;
use crate::validation::validate_name;

#[derive(Debug, Clone)]
pub struct CreateTagDto {
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTagDto {
    pub name: Option<String>,
}

impl CampaignStore {
    pub async fn create_tag(&self, dto: CreateTagDto) -> Result<tag::Model, AppError> {
        validate_name(&dto.name)?;

        let now = self.now();
        let created = tag::ActiveModel {
            name: Set(dto.name),
            created_date: Set(now),
            changed_date: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        log::info!("Created tag {} ({})", created.id, created.name);
        Ok(created)
    }

    pub async fn update_tag(&self, id: i32, dto: UpdateTagDto) -> Result<tag::Model, AppError> {
        let mut active_model = self.get_tag(id).await?.into_active_model();

        if let Some(name) = dto.name {
            validate_name(&name)?;
            active_model.name = Set(name);
        }
        active_model.changed_date = Set(self.now());

        Ok(active_model.update(&self.db).await?)
    }

    pub async fn get_tag(&self, id: i32) -> Result<tag::Model, AppError> {
        tag::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tag with id {} not found", id)))
    }

    pub async fn list_tags(&self) -> Result<Vec<tag::Model>, AppError> {
        let tags = tag::Entity::find()
            .order_by_asc(tag::Column::Name)
            .order_by_asc(tag::Column::Id)
            .all(&self.db)
            .await?;
        Ok(tags)
    }

    pub async fn delete_tag(&self, id: i32) -> Result<(), AppError> {
        let now = self.now();
        let txn = self.db.begin().await?;

        let tag = tag::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tag with id {} not found", id)))?;

        let mailings = mailing::Entity::update_many()
            .set(mailing::ActiveModel {
                tag_id: Set(None),
                changed_date: Set(now),
                ..Default::default()
            })
            .filter(mailing::Column::TagId.eq(id))
            .exec(&txn)
            .await?;

        let customers = customer::Entity::update_many()
            .set(customer::ActiveModel {
                tag_id: Set(None),
                changed_date: Set(now),
                ..Default::default()
            })
            .filter(customer::Column::TagId.eq(id))
            .exec(&txn)
            .await?;

        tag.into_active_model().delete(&txn).await?;
        txn.commit().await?;

        log::info!(
            "Deleted tag {} (cleared {} mailings, {} customers)",
            id,
            mailings.rows_affected,
            customers.rows_affected
        );
        Ok(())
    }
}
