use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait, DatabaseTransaction, QuerySelect, QueryTrait};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;

use super::{Classroom, Student, classroom, student};
use crate::crud::{CRUDResource, CascadeDelete, Dependents, MergeIntoActiveModel};
use crate::errors::ApiError;
use crate::filtering::{COMPARISONS, EQUALITY, FilterPolicy};
use crate::join_fields::JoinField;
use crate::query::{FromQueryParams, QueryParams};
use crate::relations;
use crate::validation::{ValidationErrors, Validatable, validators, value_taken};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "degrees")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub max_year: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::classroom::Entity")]
    Classrooms,
}

impl Related<super::classroom::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Classrooms.def()
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

/// A degree as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Degree {
    pub id: Uuid,
    pub name: String,
    pub max_year: i32,
    pub classrooms: JoinField<Vec<Classroom>>,
    pub students: JoinField<Vec<Student>>,
}

impl From<Model> for Degree {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            max_year: model.max_year,
            classrooms: JoinField::NotLoaded,
            students: JoinField::NotLoaded,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DegreeCreate {
    pub name: String,
    pub max_year: i32,
}

/// Absent fields are left alone. An explicit `null` fails validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DegreeUpdate {
    #[serde(default, with = "double_option")]
    pub name: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub max_year: Option<Option<i32>>,
}

impl From<DegreeCreate> for DegreeUpdate {
    fn from(create: DegreeCreate) -> Self {
        Self {
            name: Some(Some(create.name)),
            max_year: Some(Some(create.max_year)),
        }
    }
}

impl MergeIntoActiveModel<ActiveModel> for DegreeUpdate {
    fn merge_into_activemodel(self, mut existing: ActiveModel) -> Result<ActiveModel, DbErr> {
        if let Some(Some(name)) = self.name {
            existing.name = Set(name.trim().to_string());
        }
        if let Some(Some(max_year)) = self.max_year {
            existing.max_year = Set(max_year);
        }
        Ok(existing)
    }
}

impl Validatable for DegreeUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validators::validate_not_null("name", &self.name));
        if let Some(Some(name)) = &self.name {
            errors.check(validators::validate_required("name", name));
        }
        errors.check(validators::validate_not_null("max_year", &self.max_year));
        if let Some(Some(max_year)) = self.max_year {
            errors.check(validators::validate_greater_than("max_year", max_year, 0));
        }
        errors.result()
    }
}

/// `includeClassrooms` and `includeStudents`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DegreeIncludes {
    pub classrooms: bool,
    pub students: bool,
}

impl FromQueryParams for DegreeIncludes {
    fn from_query(params: &QueryParams) -> Self {
        Self {
            classrooms: params.flag("includeClassrooms"),
            students: params.flag("includeStudents"),
        }
    }
}

#[async_trait]
impl CRUDResource for Degree {
    type EntityType = Entity;
    type ModelType = Model;
    type ColumnType = Column;
    type ActiveModelType = ActiveModel;
    type CreateModel = DegreeCreate;
    type UpdateModel = DegreeUpdate;
    type Includes = DegreeIncludes;

    const ID_COLUMN: Column = Column::Id;
    const RESOURCE_NAME_SINGULAR: &'static str = "Degree";
    const RESOURCE_NAME_PLURAL: &'static str = "degrees";

    fn filter_policy() -> FilterPolicy {
        FilterPolicy::new()
            .allow("name", EQUALITY)
            .allow("max_year", COMPARISONS)
    }

    fn filterable_columns() -> Vec<(&'static str, Column)> {
        vec![("name", Column::Name), ("max_year", Column::MaxYear)]
    }

    fn id(&self) -> Uuid {
        self.id
    }

    async fn validate_changes<C>(
        db: &C,
        id: Option<Uuid>,
        changes: &DegreeUpdate,
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
        errors.result()?;
        Ok(())
    }

    async fn load_relations<C>(
        db: &C,
        items: &mut [Self],
        includes: &DegreeIncludes,
    ) -> Result<(), DbErr>
    where
        C: ConnectionTrait + Sync,
    {
        relations::attach_to_degrees(db, items, includes).await
    }
}

fn classroom_ids_of(degree_id: Uuid) -> sea_orm::sea_query::SelectStatement {
    classroom::Entity::find()
        .select_only()
        .column(classroom::Column::Id)
        .filter(classroom::Column::DegreeId.eq(degree_id))
        .into_query()
}

#[async_trait]
impl CascadeDelete for Degree {
    const BLOCKED_REASON: &'static str =
        "Cannot delete this degree because it has some classrooms and students attached";

    async fn count_dependents(txn: &DatabaseTransaction, id: Uuid) -> Result<Dependents, DbErr> {
        let classrooms = classroom::Entity::find()
            .filter(classroom::Column::DegreeId.eq(id))
            .count(txn)
            .await?;
        let students = student::Entity::find()
            .filter(student::Column::ClassroomId.in_subquery(classroom_ids_of(id)))
            .count(txn)
            .await?;
        Ok(Dependents {
            classrooms,
            students,
        })
    }

    async fn delete_dependents(txn: &DatabaseTransaction, id: Uuid) -> Result<(), DbErr> {
        student::Entity::delete_many()
            .filter(student::Column::ClassroomId.in_subquery(classroom_ids_of(id)))
            .exec(txn)
            .await?;
        classroom::Entity::delete_many()
            .filter(classroom::Column::DegreeId.eq(id))
            .exec(txn)
            .await?;
        Ok(())
    }

    fn dependents_view() -> DegreeIncludes {
        DegreeIncludes {
            classrooms: true,
            students: true,
        }
    }
}
