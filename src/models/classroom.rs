use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait, DatabaseTransaction};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;

use super::{Degree, Student, degree, student};
use crate::crud::{CRUDResource, CascadeDelete, Dependents, MergeIntoActiveModel};
use crate::errors::ApiError;
use crate::filtering::{EQUALITY, FilterPolicy};
use crate::join_fields::JoinField;
use crate::query::{FromQueryParams, QueryParams};
use crate::relations;
use crate::validation::{ValidationErrors, Validatable, exists, validators, value_taken};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "classrooms")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub degree_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::degree::Entity",
        from = "Column::DegreeId",
        to = "super::degree::Column::Id"
    )]
    Degree,
    #[sea_orm(has_many = "super::student::Entity")]
    Students,
}

impl Related<super::degree::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Degree.def()
    }
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            ..ActiveModelTrait::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classroom {
    pub id: Uuid,
    pub name: String,
    #[serde(skip)]
    pub degree_id: Uuid,
    pub degree: JoinField<Box<Degree>>,
    pub students: JoinField<Vec<Student>>,
}

impl From<Model> for Classroom {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            degree_id: model.degree_id,
            degree: JoinField::NotLoaded,
            students: JoinField::NotLoaded,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassroomCreate {
    pub name: String,
    pub degree_id: Uuid,
}

/// Absent fields are left alone. An explicit `null` fails validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassroomUpdate {
    #[serde(default, with = "double_option")]
    pub name: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub degree_id: Option<Option<Uuid>>,
}

impl From<ClassroomCreate> for ClassroomUpdate {
    fn from(create: ClassroomCreate) -> Self {
        Self {
            name: Some(Some(create.name)),
            degree_id: Some(Some(create.degree_id)),
        }
    }
}

impl MergeIntoActiveModel<ActiveModel> for ClassroomUpdate {
    fn merge_into_activemodel(self, mut existing: ActiveModel) -> Result<ActiveModel, DbErr> {
        if let Some(Some(name)) = self.name {
            existing.name = Set(name.trim().to_string());
        }
        if let Some(Some(degree_id)) = self.degree_id {
            existing.degree_id = Set(degree_id);
        }
        Ok(existing)
    }
}

impl Validatable for ClassroomUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validators::validate_not_null("name", &self.name));
        if let Some(Some(name)) = &self.name {
            errors.check(validators::validate_required("name", name));
        }
        errors.check(validators::validate_not_null("degree_id", &self.degree_id));
        errors.result()
    }
}

/// `includeDegree` (or `includeDegrees`) and `includeStudents`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassroomIncludes {
    pub degree: bool,
    pub students: bool,
}

impl FromQueryParams for ClassroomIncludes {
    fn from_query(params: &QueryParams) -> Self {
        Self {
            degree: params.flag("includeDegree") || params.flag("includeDegrees"),
            students: params.flag("includeStudents"),
        }
    }
}

#[async_trait]
impl CRUDResource for Classroom {
    type EntityType = Entity;
    type ModelType = Model;
    type ColumnType = Column;
    type ActiveModelType = ActiveModel;
    type CreateModel = ClassroomCreate;
    type UpdateModel = ClassroomUpdate;
    type Includes = ClassroomIncludes;

    const ID_COLUMN: Column = Column::Id;
    const RESOURCE_NAME_SINGULAR: &'static str = "Classroom";
    const RESOURCE_NAME_PLURAL: &'static str = "classrooms";

    fn filter_policy() -> FilterPolicy {
        FilterPolicy::new().allow("name", EQUALITY)
    }

    fn filterable_columns() -> Vec<(&'static str, Column)> {
        vec![("name", Column::Name)]
    }

    fn id(&self) -> Uuid {
        self.id
    }

    async fn validate_changes<C>(
        db: &C,
        id: Option<Uuid>,
        changes: &ClassroomUpdate,
    ) -> Result<(), ApiError>
    where
        C: ConnectionTrait + Sync,
    {
        let mut errors = changes.validate().err().unwrap_or_default();
        if let Some(Some(name)) = &changes.name {
            if value_taken::<Entity, _>(db, Column::Name, name.trim(), Column::Id, id).await? {
                errors.add(validators::taken("name"));
            }
        }
        if let Some(Some(degree_id)) = changes.degree_id {
            if !exists::<degree::Entity, _>(db, degree::Column::Id, degree_id).await? {
                errors.add(validators::invalid_reference("degree_id"));
            }
        }
        errors.result()?;
        Ok(())
    }

    async fn load_relations<C>(
        db: &C,
        items: &mut [Self],
        includes: &ClassroomIncludes,
    ) -> Result<(), DbErr>
    where
        C: ConnectionTrait + Sync,
    {
        relations::attach_to_classrooms(db, items, includes).await
    }
}

#[async_trait]
impl CascadeDelete for Classroom {
    const BLOCKED_REASON: &'static str =
        "Cannot delete this classroom because it has some students attached";

    async fn count_dependents(txn: &DatabaseTransaction, id: Uuid) -> Result<Dependents, DbErr> {
        let students = student::Entity::find()
            .filter(student::Column::ClassroomId.eq(id))
            .count(txn)
            .await?;
        Ok(Dependents {
            classrooms: 0,
            students,
        })
    }

    async fn delete_dependents(txn: &DatabaseTransaction, id: Uuid) -> Result<(), DbErr> {
        student::Entity::delete_many()
            .filter(student::Column::ClassroomId.eq(id))
            .exec(txn)
            .await?;
        Ok(())
    }

    fn dependents_view() -> ClassroomIncludes {
        ClassroomIncludes {
            degree: false,
            students: true,
        }
    }
}
