use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

fn or_none<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "None".to_string(), |v| v.to_string())
}

// --- Операторы ---
pub mod operator {
    use super::*;

    /// Сотрудник, управляющий рассылками и клиентами
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, DeriveEntityModel)]
    #[sea_orm(table_name = "operators")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        #[sea_orm(column_type = "String(StringLen::N(32))", unique)]
        pub name: String,
        pub created_date: DateTimeUtc,
        pub changed_date: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::mailing::Entity")]
        Mailing,
        #[sea_orm(has_many = "super::customer::Entity")]
        Customer,
    }

    impl Related<super::mailing::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Mailing.def()
        }
    }

    impl Related<super::customer::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Customer.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl fmt::Display for Model {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.name)
        }
    }
}

// --- Теги ---
pub mod tag {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, DeriveEntityModel)]
    #[sea_orm(table_name = "tags")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        #[sea_orm(column_type = "String(StringLen::N(32))")]
        pub name: String,
        pub created_date: DateTimeUtc,
        pub changed_date: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::mailing::Entity")]
        Mailing,
        #[sea_orm(has_many = "super::customer::Entity")]
        Customer,
    }

    impl Related<super::mailing::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Mailing.def()
        }
    }

    impl Related<super::customer::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Customer.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl fmt::Display for Model {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.name)
        }
    }
}

// --- Рассылки ---
pub mod mailing {
    use super::*;
    use chrono::Duration;
    use sea_orm::Set;

    /// Длительность рассылки, если дата окончания не указана
    pub const DEFAULT_WINDOW_DAYS: i64 = 30;
    const PREVIEW_CHARS: usize = 20;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, DeriveEntityModel)]
    #[sea_orm(table_name = "mailings")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub start_date: DateTimeUtc,
        pub stop_date: Option<DateTimeUtc>,
        #[sea_orm(column_type = "Text")]
        pub message_text: String,
        pub operator_id: Option<i32>,
        pub tag_id: Option<i32>,
        pub is_started: bool,
        pub is_completed: bool,
        pub created_date: DateTimeUtc,
        pub changed_date: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::operator::Entity",
            from = "Column::OperatorId",
            to = "super::operator::Column::Id",
            on_update = "Cascade",
            on_delete = "SetNull"
        )]
        Operator,
        #[sea_orm(
            belongs_to = "super::tag::Entity",
            from = "Column::TagId",
            to = "super::tag::Column::Id",
            on_update = "Cascade",
            on_delete = "SetNull"
        )]
        Tag,
        #[sea_orm(has_many = "super::message::Entity")]
        Message,
    }

    impl Related<super::operator::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Operator.def()
        }
    }

    impl Related<super::tag::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Tag.def()
        }
    }

    impl Related<super::message::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Message.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    pub fn default_stop_date(start_date: DateTimeUtc) -> DateTimeUtc {
        start_date + Duration::days(DEFAULT_WINDOW_DAYS)
    }

    impl ActiveModel {
        /// Заполняет пустой `stop_date` от `start_date`. Заданная дата окончания не меняется.
        pub fn fill_default_stop_date(&mut self) {
            if matches!(self.stop_date.try_as_ref(), Some(Some(_))) {
                return;
            }
            if let Some(start_date) = self.start_date.try_as_ref() {
                self.stop_date = Set(Some(default_stop_date(*start_date)));
            }
        }
    }

    impl fmt::Display for Model {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let preview: String = self.message_text.chars().take(PREVIEW_CHARS).collect();
            write!(
                f,
                "{}-{} {}...",
                self.start_date,
                or_none(self.stop_date),
                preview
            )
        }
    }
}

// --- Клиенты ---
pub mod customer {
    use super::*;
    use chrono_tz::Tz;

    use crate::errors::AppError;
    use crate::validation::validate_timezone;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, DeriveEntityModel)]
    #[sea_orm(table_name = "customers")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        #[sea_orm(column_type = "String(StringLen::N(11))")]
        pub phone: String,
        pub operator_id: Option<i32>,
        pub tag_id: Option<i32>,
        #[sea_orm(column_type = "String(StringLen::N(32))")]
        pub timezone: String,
        pub created_date: DateTimeUtc,
        pub changed_date: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::operator::Entity",
            from = "Column::OperatorId",
            to = "super::operator::Column::Id",
            on_update = "Cascade",
            on_delete = "SetNull"
        )]
        Operator,
        #[sea_orm(
            belongs_to = "super::tag::Entity",
            from = "Column::TagId",
            to = "super::tag::Column::Id",
            on_update = "Cascade",
            on_delete = "SetNull"
        )]
        Tag,
        #[sea_orm(has_many = "super::message::Entity")]
        Message,
    }

    impl Related<super::operator::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Operator.def()
        }
    }

    impl Related<super::tag::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Tag.def()
        }
    }

    impl Related<super::message::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Message.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl Model {
        /// Местное время клиента
        pub fn local_time(&self, at: DateTimeUtc) -> Result<chrono::DateTime<Tz>, AppError> {
            let tz = validate_timezone(&self.timezone)?;
            Ok(at.with_timezone(&tz))
        }
    }

    impl fmt::Display for Model {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.phone)
        }
    }
}

// --- Сообщения ---
pub mod message {
    use super::*;

    /// Запись о доставке рассылки клиенту. Коды `status` определяет сервис доставки
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, DeriveEntityModel)]
    #[sea_orm(table_name = "messages")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub mailing_id: Option<i32>,
        pub customer_id: Option<i32>,
        pub status: i32,
        pub created_date: DateTimeUtc,
        pub changed_date: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::mailing::Entity",
            from = "Column::MailingId",
            to = "super::mailing::Column::Id",
            on_update = "Cascade",
            on_delete = "SetNull"
        )]
        Mailing,
        #[sea_orm(
            belongs_to = "super::customer::Entity",
            from = "Column::CustomerId",
            to = "super::customer::Column::Id",
            on_update = "Cascade",
            on_delete = "SetNull"
        )]
        Customer,
    }

    impl Related<super::mailing::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Mailing.def()
        }
    }

    impl Related<super::customer::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Customer.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl Model {
        /// Формирует `"{created_date} {mailing} to {customer}"` по подгруженным записям
        pub fn label(
            &self,
            mailing: Option<&super::mailing::Model>,
            customer: Option<&super::customer::Model>,
        ) -> String {
            format!(
                "{} {} to {}",
                self.created_date,
                or_none(mailing),
                or_none(customer)
            )
        }
    }
}
