//! Entity model for routines and their tasks.
//!
//! # Responsibility
//! - Define the canonical records shared by ordering, sectioning and CSV
//!   interchange.
//! - Own id generation for newly created entities.
//!
//! # Invariants
//! - Ids are assigned once and never change or get reused.
//! - Every task references exactly one owning routine by id.
//! - A routine exclusively owns its tasks; deleting it deletes them.

pub mod routine;
pub mod task;

use uuid::Uuid;

/// Generates a fresh stable entity id.
///
/// Upper-case hyphenated UUID v4, the same shape the mobile app exports.
pub fn new_entity_id() -> String {
    Uuid::new_v4().hyphenated().to_string().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::new_entity_id;
    use std::collections::HashSet;

    #[test]
    fn generated_ids_are_uppercase_uuids() {
        let id = new_entity_id();
        assert_eq!(id.len(), 36);
        assert_eq!(id, id.to_uppercase());
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn generated_ids_do_not_repeat() {
        let ids = (0..64).map(|_| new_entity_id()).collect::<HashSet<_>>();
        assert_eq!(ids.len(), 64);
    }
}
