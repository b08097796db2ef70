//! Connection, schema bootstrap and demo data.

use chrono::{Days, NaiveDate};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ActiveValue::Set, ConnectOptions, ConnectionTrait,
    Database, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, Schema, TransactionTrait,
};
use uuid::Uuid;

use crate::models::{Gender, classroom, degree, student};

/// Degrees created by [`seed_demo_data`]: name and length in years.
pub const DEMO_DEGREES: [(&str, i32); 3] = [("Bachelor", 4), ("Master", 2), ("PhD", 4)];
pub const DEMO_CLASSROOMS_PER_DEGREE: u64 = 7;
pub const DEMO_MALE_STUDENTS_PER_CLASSROOM: u64 = 10;
pub const DEMO_FEMALE_STUDENTS_PER_CLASSROOM: u64 = 5;

const FIRST_NAMES_MALE: [&str; 5] = ["Liam", "Noah", "Lucas", "Hugo", "Mateo"];
const FIRST_NAMES_FEMALE: [&str; 5] = ["Emma", "Alice", "Chloe", "Lea", "Sofia"];
const LAST_NAMES: [&str; 6] = ["Martin", "Bernard", "Dubois", "Moreau", "Laurent", "Garcia"];

/// Open a connection pool. In-memory SQLite is pinned to one connection so
/// every query sees the same database.
///
/// # Errors
///
/// Fails when the database cannot be reached.
pub async fn connect(url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(url.to_owned());
    options.sqlx_logging(false);
    if url.contains(":memory:") {
        options.max_connections(1).min_connections(1);
    }
    Database::connect(options).await
}

/// Create `degrees`, `classrooms` and `students` from the entity definitions,
/// parents first. Existing tables are left alone.
///
/// # Errors
///
/// Propagates database errors.
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let statements = [
        schema.create_table_from_entity(degree::Entity),
        schema.create_table_from_entity(classroom::Entity),
        schema.create_table_from_entity(student::Entity),
    ];
    for mut statement in statements {
        statement.if_not_exists();
        db.execute(backend.build(&statement)).await?;
    }

    tracing::info!("Schema ready");
    Ok(())
}

fn demo_student(
    classroom_id: Uuid,
    classroom_name: &str,
    index: u64,
) -> student::ActiveModel {
    let gender = if index <= DEMO_MALE_STUDENTS_PER_CLASSROOM {
        Gender::Male
    } else {
        Gender::Female
    };
    let slot = usize::try_from(index).unwrap_or_default();
    let pick = |names: &[&'static str]| names.get(slot % names.len()).copied().unwrap_or("Sam");
    let first_name = match gender {
        Gender::Male => pick(&FIRST_NAMES_MALE),
        Gender::Female => pick(&FIRST_NAMES_FEMALE),
    };
    let date_of_birth = NaiveDate::from_ymd_opt(1995, 1, 1)
        .and_then(|base| base.checked_add_days(Days::new(index * 211)));

    student::ActiveModel {
        classroom_id: Set(classroom_id),
        first_name: Set(first_name.to_string()),
        last_name: Set(pick(&LAST_NAMES).to_string()),
        email: Set(format!(
            "{}.student{index}@example.com",
            classroom_name.to_lowercase()
        )),
        gender: Set(gender),
        date_of_birth: Set(date_of_birth),
        ..student::ActiveModel::new()
    }
}

/// Insert the demo degrees, classrooms and students in one transaction.
///
/// Returns `false` without touching anything when degrees already exist.
///
/// # Errors
///
/// Propagates database errors; nothing is written in that case.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<bool, DbErr> {
    if degree::Entity::find().count(db).await? > 0 {
        tracing::info!("Degrees already present, skipping demo data");
        return Ok(false);
    }

    let txn = db.begin().await?;

    for (name, max_year) in DEMO_DEGREES {
        let degree = degree::ActiveModel {
            name: Set(name.to_string()),
            max_year: Set(max_year),
            ..degree::ActiveModel::new()
        }
        .insert(&txn)
        .await?;

        let initial = name.chars().next().unwrap_or('X');
        for number in 1..=DEMO_CLASSROOMS_PER_DEGREE {
            let classroom = classroom::ActiveModel {
                name: Set(format!("{initial}{number}")),
                degree_id: Set(degree.id),
                ..classroom::ActiveModel::new()
            }
            .insert(&txn)
            .await?;

            let total = DEMO_MALE_STUDENTS_PER_CLASSROOM + DEMO_FEMALE_STUDENTS_PER_CLASSROOM;
            let students: Vec<student::ActiveModel> = (1..=total)
                .map(|index| demo_student(classroom.id, &classroom.name, index))
                .collect();
            student::Entity::insert_many(students).exec(&txn).await?;
        }
    }

    txn.commit().await?;
    tracing::info!(degrees = DEMO_DEGREES.len(), "Demo data seeded");
    Ok(true)
}
