//! Sea-ORM entities and their API representations.
//!
//! Each module holds the table definition (`Model`, `Entity`, `Column`, ...)
//! next to the serialized resource, its request payloads and its include flags.

pub mod classroom;
pub mod degree;
pub mod student;

pub use classroom::{Classroom, ClassroomCreate, ClassroomIncludes, ClassroomUpdate};
pub use degree::{Degree, DegreeCreate, DegreeIncludes, DegreeUpdate};
pub use student::{Gender, Student, StudentCreate, StudentIncludes, StudentUpdate};
