//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods.
//! Single-statement methods accept any [`sqlx::PgExecutor`] so they can run
//! against the pool or inside a caller's transaction; multi-statement
//! methods take `&mut PgConnection` and expect the caller to own the
//! transaction.

pub mod attendance_repo;
pub mod category_repo;
pub mod email_job_repo;
pub mod event_repo;
pub mod manager_assignment_repo;
pub mod registration_repo;
pub mod subcategory_repo;
pub mod user_repo;

pub use attendance_repo::AttendanceRepo;
pub use category_repo::CategoryRepo;
pub use email_job_repo::EmailJobRepo;
pub use event_repo::EventRepo;
pub use manager_assignment_repo::ManagerAssignmentRepo;
pub use registration_repo::RegistrationRepo;
pub use subcategory_repo::SubcategoryRepo;
pub use user_repo::UserRepo;
