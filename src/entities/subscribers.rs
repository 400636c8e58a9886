use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "subscribers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub email: String,

    pub first_name: Option<String>,

    pub last_name: Option<String>,

    /// JSON array of interest categories
    pub interests: Option<String>,

    pub subscription_date: DateTimeUtc,

    pub is_active: bool,

    /// 64-char hex string, the only credential for the public unsubscribe link
    #[sea_orm(unique)]
    pub unsubscribe_token: Option<String>,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
