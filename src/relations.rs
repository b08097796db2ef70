//! Flag-driven relation loading.
//!
//! Every relation level is fetched with a single `IN (...)` query over the whole
//! page, then stitched onto the items in memory. Nothing is fetched unless its
//! flag is set.

use std::collections::{BTreeSet, HashMap};

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::join_fields::JoinField;
use crate::models::{
    Classroom, ClassroomIncludes, Degree, DegreeIncludes, Student, StudentIncludes, classroom,
    degree, student,
};

/// Rows of `E` whose `column` is one of `keys`, ordered by `order`.
///
/// No query is issued for an empty key set.
async fn fetch_where_in<E, C>(
    db: &C,
    column: E::Column,
    keys: BTreeSet<Uuid>,
    order: E::Column,
) -> Result<Vec<E::Model>, DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    if keys.is_empty() {
        return Ok(Vec::new());
    }
    E::find()
        .filter(column.is_in(keys))
        .order_by_asc(order)
        .all(db)
        .await
}

async fn students_by_classroom<C: ConnectionTrait>(
    db: &C,
    classroom_ids: BTreeSet<Uuid>,
) -> Result<HashMap<Uuid, Vec<Student>>, DbErr> {
    let models = fetch_where_in::<student::Entity, _>(
        db,
        student::Column::ClassroomId,
        classroom_ids,
        student::Column::LastName,
    )
    .await?;

    let mut grouped: HashMap<Uuid, Vec<Student>> = HashMap::new();
    for model in models {
        grouped
            .entry(model.classroom_id)
            .or_default()
            .push(model.into());
    }
    Ok(grouped)
}

async fn degrees_by_id<C: ConnectionTrait>(
    db: &C,
    ids: BTreeSet<Uuid>,
) -> Result<HashMap<Uuid, Degree>, DbErr> {
    let models =
        fetch_where_in::<degree::Entity, _>(db, degree::Column::Id, ids, degree::Column::Name)
            .await?;
    Ok(models
        .into_iter()
        .map(|model| (model.id, Degree::from(model)))
        .collect())
}

/// `classrooms` and/or `students` (through classrooms). With both, every
/// loaded classroom carries its students too.
///
/// # Errors
///
/// Propagates database errors.
pub async fn attach_to_degrees<C: ConnectionTrait>(
    db: &C,
    degrees: &mut [Degree],
    includes: &DegreeIncludes,
) -> Result<(), DbErr> {
    if degrees.is_empty() || !(includes.classrooms || includes.students) {
        return Ok(());
    }

    let classrooms: Vec<Classroom> = fetch_where_in::<classroom::Entity, _>(
        db,
        classroom::Column::DegreeId,
        degrees.iter().map(|degree| degree.id).collect(),
        classroom::Column::Name,
    )
    .await?
    .into_iter()
    .map(Classroom::from)
    .collect();

    let students = if includes.students {
        students_by_classroom(db, classrooms.iter().map(|classroom| classroom.id).collect()).await?
    } else {
        HashMap::new()
    };

    let mut classrooms_by_degree: HashMap<Uuid, Vec<Classroom>> = HashMap::new();
    for mut classroom in classrooms {
        if includes.classrooms && includes.students {
            classroom.students =
                JoinField::Loaded(students.get(&classroom.id).cloned().unwrap_or_default());
        }
        classrooms_by_degree
            .entry(classroom.degree_id)
            .or_default()
            .push(classroom);
    }

    for degree in degrees.iter_mut() {
        let owned = classrooms_by_degree.remove(&degree.id).unwrap_or_default();
        if includes.students {
            degree.students = owned
                .iter()
                .flat_map(|classroom| students.get(&classroom.id).into_iter().flatten().cloned())
                .collect();
        }
        if includes.classrooms {
            degree.classrooms = JoinField::Loaded(owned);
        }
    }

    Ok(())
}

/// `degree` and/or `students`.
///
/// # Errors
///
/// Propagates database errors.
pub async fn attach_to_classrooms<C: ConnectionTrait>(
    db: &C,
    classrooms: &mut [Classroom],
    includes: &ClassroomIncludes,
) -> Result<(), DbErr> {
    if classrooms.is_empty() || !(includes.degree || includes.students) {
        return Ok(());
    }

    let degrees = if includes.degree {
        degrees_by_id(db, classrooms.iter().map(|classroom| classroom.degree_id).collect()).await?
    } else {
        HashMap::new()
    };

    let mut students = if includes.students {
        students_by_classroom(db, classrooms.iter().map(|classroom| classroom.id).collect()).await?
    } else {
        HashMap::new()
    };

    for classroom in classrooms.iter_mut() {
        if let Some(degree) = degrees.get(&classroom.degree_id) {
            classroom.degree = JoinField::Loaded(Box::new(degree.clone()));
        }
        if includes.students {
            classroom.students =
                JoinField::Loaded(students.remove(&classroom.id).unwrap_or_default());
        }
    }

    Ok(())
}

/// `classroom` and/or `degree` (through the classroom). With both, the loaded
/// classroom carries its degree too.
///
/// # Errors
///
/// Propagates database errors.
pub async fn attach_to_students<C: ConnectionTrait>(
    db: &C,
    students: &mut [Student],
    includes: &StudentIncludes,
) -> Result<(), DbErr> {
    if students.is_empty() || !(includes.classroom || includes.degree) {
        return Ok(());
    }

    let classrooms: HashMap<Uuid, Classroom> = fetch_where_in::<classroom::Entity, _>(
        db,
        classroom::Column::Id,
        students.iter().map(|student| student.classroom_id).collect(),
        classroom::Column::Name,
    )
    .await?
    .into_iter()
    .map(|model| (model.id, Classroom::from(model)))
    .collect();

    let degrees = if includes.degree {
        degrees_by_id(db, classrooms.values().map(|classroom| classroom.degree_id).collect()).await?
    } else {
        HashMap::new()
    };

    for student in students.iter_mut() {
        let Some(classroom) = classrooms.get(&student.classroom_id) else {
            continue;
        };
        let degree = degrees.get(&classroom.degree_id);

        if let Some(degree) = degree {
            student.degree = JoinField::Loaded(Box::new(degree.clone()));
        }
        if includes.classroom {
            let mut classroom = classroom.clone();
            if let Some(degree) = degree {
                classroom.degree = JoinField::Loaded(Box::new(degree.clone()));
            }
            student.classroom = JoinField::Loaded(Box::new(classroom));
        }
    }

    Ok(())
}
