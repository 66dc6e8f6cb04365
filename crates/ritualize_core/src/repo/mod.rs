//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the narrow create/read/update/delete contract the services and
//!   the CSV codec depend on.
//! - Isolate SQLite query details from ordering, sectioning and interchange.
//!
//! # Invariants
//! - Listings are deterministic: `order ASC`, then insertion order.
//! - Writes are grouped into one unit of work that `commit()` persists.
//! - Repository APIs return semantic errors (`RoutineNotFound`,
//!   `TaskNotFound`) in addition to DB transport errors.

pub mod routine_repo;
