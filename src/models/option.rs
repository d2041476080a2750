//! Option entity model
//!
//! Rows of the generic key-value option store. The value column holds a JSON
//! document serialized as text.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// A single stored option
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "options")]
pub struct Model {
    /// Option name (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,

    /// JSON-encoded option value
    pub value: String,

    /// Timestamp of the last write
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
