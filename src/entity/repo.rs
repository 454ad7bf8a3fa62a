//! Repository entity mirrored from GitHub.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "repos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// GitHub numeric repository id, stored as string
    #[sea_orm(unique)]
    pub github_id: String,
    pub name: String,
    pub full_name: String,
    pub html_url: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub private: bool,
    pub fork: bool,
    pub auto_audit: bool,
    pub owner_id: Uuid,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,
    #[sea_orm(has_many = "super::commit::Entity")]
    Commits,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::commit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Commits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
