//! Commit file entity. Unique on (sha, path).

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "commit_files")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sha: String,
    /// Forward-slash normalized path
    pub path: String,
    /// Status, line counts and patch text (see `models::commit_file::FileContent`)
    #[sea_orm(column_type = "JsonBinary")]
    pub content: JsonValue,
    pub commit_id: Uuid,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::commit::Entity",
        from = "Column::CommitId",
        to = "super::commit::Column::Id",
        on_delete = "Cascade"
    )]
    Commit,
}

impl Related<super::commit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Commit.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
