use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;

use super::{Classroom, Degree, classroom};
use crate::crud::{CRUDResource, CascadeDelete, MergeIntoActiveModel};
use crate::errors::ApiError;
use crate::filtering::{COMPARISONS, EQUALITY, FilterPolicy};
use crate::join_fields::JoinField;
use crate::query::{FromQueryParams, QueryParams};
use crate::relations;
use crate::validation::{ValidationErrors, Validatable, exists, validators, value_taken};

/// Students must be born strictly before this date.
pub const DATE_OF_BIRTH_CUTOFF: NaiveDate = match NaiveDate::from_ymd_opt(2005, 1, 1) {
    Some(date) => date,
    None => NaiveDate::MIN,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(6))")]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[sea_orm(string_value = "male")]
    Male,
    #[sea_orm(string_value = "female")]
    Female,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub classroom_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub gender: Gender,
    pub date_of_birth: Option<Date>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::classroom::Entity",
        from = "Column::ClassroomId",
        to = "super::classroom::Column::Id"
    )]
    Classroom,
}

impl Related<super::classroom::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Classroom.def()
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
pub struct Student {
    pub id: Uuid,
    #[serde(skip)]
    pub classroom_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: Gender,
    pub date_of_birth: Option<NaiveDate>,
    pub classroom: JoinField<Box<Classroom>>,
    pub degree: JoinField<Box<Degree>>,
}

impl From<Model> for Student {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            classroom_id: model.classroom_id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            gender: model.gender,
            date_of_birth: model.date_of_birth,
            classroom: JoinField::NotLoaded,
            degree: JoinField::NotLoaded,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudentCreate {
    pub classroom_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: Gender,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
}

/// Absent fields are left alone. `date_of_birth: null` clears the date,
/// `null` on any other field fails validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentUpdate {
    #[serde(default, with = "double_option")]
    pub classroom_id: Option<Option<Uuid>>,
    #[serde(default, with = "double_option")]
    pub first_name: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub last_name: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub gender: Option<Option<Gender>>,
    #[serde(default, with = "double_option")]
    pub date_of_birth: Option<Option<NaiveDate>>,
}

impl From<StudentCreate> for StudentUpdate {
    fn from(create: StudentCreate) -> Self {
        Self {
            classroom_id: Some(Some(create.classroom_id)),
            first_name: Some(Some(create.first_name)),
            last_name: Some(Some(create.last_name)),
            email: Some(Some(create.email)),
            gender: Some(Some(create.gender)),
            date_of_birth: Some(create.date_of_birth),
        }
    }
}

impl MergeIntoActiveModel<ActiveModel> for StudentUpdate {
    fn merge_into_activemodel(self, mut existing: ActiveModel) -> Result<ActiveModel, DbErr> {
        if let Some(Some(classroom_id)) = self.classroom_id {
            existing.classroom_id = Set(classroom_id);
        }
        if let Some(Some(first_name)) = self.first_name {
            existing.first_name = Set(first_name.trim().to_string());
        }
        if let Some(Some(last_name)) = self.last_name {
            existing.last_name = Set(last_name.trim().to_string());
        }
        if let Some(Some(email)) = self.email {
            existing.email = Set(email.trim().to_string());
        }
        if let Some(Some(gender)) = self.gender {
            existing.gender = Set(gender);
        }
        if let Some(date_of_birth) = self.date_of_birth {
            existing.date_of_birth = Set(date_of_birth);
        }
        Ok(existing)
    }
}

impl Validatable for StudentUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validators::validate_not_null("classroom_id", &self.classroom_id));
        errors.check(validators::validate_not_null("first_name", &self.first_name));
        if let Some(Some(first_name)) = &self.first_name {
            errors.check(validators::validate_required("first_name", first_name));
        }
        errors.check(validators::validate_not_null("last_name", &self.last_name));
        if let Some(Some(last_name)) = &self.last_name {
            errors.check(validators::validate_required("last_name", last_name));
        }
        errors.check(validators::validate_not_null("email", &self.email));
        if let Some(Some(email)) = &self.email {
            match validators::validate_required("email", email) {
                Ok(()) => errors.check(validators::validate_email("email", email.trim())),
                Err(error) => errors.add(error),
            }
        }
        errors.check(validators::validate_not_null("gender", &self.gender));
        if let Some(Some(date_of_birth)) = self.date_of_birth {
            errors.check(validators::validate_date_before(
                "date_of_birth",
                date_of_birth,
                DATE_OF_BIRTH_CUTOFF,
            ));
        }
        errors.result()
    }
}

/// `includeClassroom` and `includeDegree`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StudentIncludes {
    pub classroom: bool,
    pub degree: bool,
}

impl FromQueryParams for StudentIncludes {
    fn from_query(params: &QueryParams) -> Self {
        Self {
            classroom: params.flag("includeClassroom"),
            degree: params.flag("includeDegree"),
        }
    }
}

#[async_trait]
impl CRUDResource for Student {
    type EntityType = Entity;
    type ModelType = Model;
    type ColumnType = Column;
    type ActiveModelType = ActiveModel;
    type CreateModel = StudentCreate;
    type UpdateModel = StudentUpdate;
    type Includes = StudentIncludes;

    const ID_COLUMN: Column = Column::Id;
    const RESOURCE_NAME_SINGULAR: &'static str = "Student";
    const RESOURCE_NAME_PLURAL: &'static str = "students";

    fn filter_policy() -> FilterPolicy {
        FilterPolicy::new()
            .allow("first_name", EQUALITY)
            .allow("last_name", EQUALITY)
            .allow("email", EQUALITY)
            .allow("gender", EQUALITY)
            .allow("date_of_birth", COMPARISONS)
    }

    fn filterable_columns() -> Vec<(&'static str, Column)> {
        vec![
            ("first_name", Column::FirstName),
            ("last_name", Column::LastName),
            ("email", Column::Email),
            ("gender", Column::Gender),
            ("date_of_birth", Column::DateOfBirth),
        ]
    }

    fn id(&self) -> Uuid {
        self.id
    }

    async fn validate_changes<C>(
        db: &C,
        id: Option<Uuid>,
        changes: &StudentUpdate,
    ) -> Result<(), ApiError>
    where
        C: ConnectionTrait + Sync,
    {
        let mut errors = changes.validate().err().unwrap_or_default();
        if let Some(Some(email)) = &changes.email {
            if value_taken::<Entity, _>(db, Column::Email, email.trim(), Column::Id, id).await? {
                errors.add(validators::taken("email"));
            }
        }
        if let Some(Some(classroom_id)) = changes.classroom_id {
            if !exists::<classroom::Entity, _>(db, classroom::Column::Id, classroom_id).await? {
                errors.add(validators::invalid_reference("classroom_id"));
            }
        }
        errors.result()?;
        Ok(())
    }

    async fn load_relations<C>(
        db: &C,
        items: &mut [Self],
        includes: &StudentIncludes,
    ) -> Result<(), DbErr>
    where
        C: ConnectionTrait + Sync,
    {
        relations::attach_to_students(db, items, includes).await
    }
}

impl CascadeDelete for Student {
    fn dependents_view() -> StudentIncludes {
        StudentIncludes::default()
    }
}
