//! Widget entity model
//!
//! Saved settings of one sidebar widget instance.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "widgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub title: String,

    /// Authorized page the widget displays
    pub page_id: String,

    /// Content kind name (`BusinessHours`, `About`, `LastPost`), empty when unset
    pub content_option: String,

    pub show_page_name: bool,

    /// JSON-encoded render options (`limit`, `empty_message`)
    pub options: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
