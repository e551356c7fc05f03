//! Validation helpers for `trellis`.
//!
//! Field checks run before any write and collect every problem found.
//! Reference checks (parents, dependencies) consult storage through the
//! `EntityLookup` trait so they can run inside the writing transaction.

use crate::error::{TrellisError, ValidationError};
use crate::model::EntityType;
use crate::storage::{EntityUpdate, NewEntity};
use crate::util::id::format_id;

/// Maximum title length in characters.
pub const MAX_TITLE_CHARS: usize = 500;
/// Maximum description length in bytes.
pub const MAX_DESCRIPTION_BYTES: usize = 65_536;

/// Validates entity fields.
pub struct EntityValidator;

impl EntityValidator {
    /// Validate a new entity and return all validation errors found.
    ///
    /// # Errors
    ///
    /// Returns a `Vec<ValidationError>` if any validation rules are violated.
    pub fn validate_new(new: &NewEntity) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        check_title(&new.title, &mut errors);
        check_description(&new.description, &mut errors);

        if new.entity_type == EntityType::Idea && new.parent_id.is_some() {
            errors.push(ValidationError::new("parent_id", "ideas cannot have a parent"));
        }
        if !new.entity_type.is_task_kind() && !new.dependencies.is_empty() {
            errors.push(ValidationError::new(
                "dependencies",
                "only tasks, bugs and research items can have dependencies",
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate a partial update for an entity of the given type.
    ///
    /// # Errors
    ///
    /// Returns a `Vec<ValidationError>` if any supplied field is invalid.
    pub fn validate_update(
        entity_type: EntityType,
        update: &EntityUpdate,
    ) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Some(title) = update.title.as_ref() {
            check_title(title, &mut errors);
        }
        if let Some(description) = update.description.as_ref() {
            check_description(description, &mut errors);
        }
        if entity_type == EntityType::Idea && matches!(update.parent_id, Some(Some(_))) {
            errors.push(ValidationError::new("parent_id", "ideas cannot have a parent"));
        }
        if !entity_type.is_task_kind()
            && update.dependencies.as_ref().is_some_and(|deps| !deps.is_empty())
        {
            errors.push(ValidationError::new(
                "dependencies",
                "only tasks, bugs and research items can have dependencies",
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_title(title: &str, errors: &mut Vec<ValidationError>) {
    if title.trim().is_empty() {
        errors.push(ValidationError::new("title", "cannot be empty"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        errors.push(ValidationError::new("title", "exceeds 500 characters"));
    }
}

fn check_description(description: &str, errors: &mut Vec<ValidationError>) {
    if description.len() > MAX_DESCRIPTION_BYTES {
        errors.push(ValidationError::new("description", "exceeds 64KB"));
    }
}

/// Storage-facing lookups used by reference validation.
pub trait EntityLookup {
    /// Return the type of the entity with this id, if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage lookup fails.
    fn entity_type_of(&self, id: i64) -> Result<Option<EntityType>, TrellisError>;
}

/// Validates parent and dependency references against storage.
pub struct ReferenceValidator;

impl ReferenceValidator {
    /// Check that `parent_id` exists and has the kind `child_type` requires.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the parent does not exist
    /// - `InvalidParent` if it exists with the wrong type (or the child kind takes no parent)
    pub fn validate_parent(
        store: &impl EntityLookup,
        child_type: EntityType,
        child_label: &str,
        parent_id: i64,
    ) -> Result<(), TrellisError> {
        let Some(parent_type) = store.entity_type_of(parent_id)? else {
            return Err(TrellisError::not_found(parent_id.to_string()));
        };

        match child_type.parent_kind() {
            Some(expected) if expected == parent_type => Ok(()),
            expected => Err(TrellisError::InvalidParent {
                child: child_label.to_string(),
                parent: format_id(parent_id, parent_type),
                expected: expected.map_or_else(|| "absent".to_string(), |k| format!("an {k}")),
            }),
        }
    }

    /// Check that every dependency names an existing task-type entity.
    ///
    /// # Errors
    ///
    /// Returns `UnknownDependency` for the first id that is missing or not a task kind.
    pub fn validate_dependencies(
        store: &impl EntityLookup,
        dependencies: &[i64],
    ) -> Result<(), TrellisError> {
        for &dep_id in dependencies {
            match store.entity_type_of(dep_id)? {
                Some(kind) if kind.is_task_kind() => {}
                Some(kind) => {
                    return Err(TrellisError::UnknownDependency {
                        id: format_id(dep_id, kind),
                    });
                }
                None => {
                    return Err(TrellisError::UnknownDependency {
                        id: dep_id.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;
    use std::collections::HashMap;

    struct MapLookup(HashMap<i64, EntityType>);

    impl EntityLookup for MapLookup {
        fn entity_type_of(&self, id: i64) -> Result<Option<EntityType>, TrellisError> {
            Ok(self.0.get(&id).copied())
        }
    }

    fn lookup() -> MapLookup {
        MapLookup(HashMap::from([
            (1, EntityType::Idea),
            (2, EntityType::Epic),
            (3, EntityType::Task),
            (4, EntityType::Bug),
        ]))
    }

    fn new_entity(entity_type: EntityType, title: &str) -> NewEntity {
        NewEntity {
            entity_type,
            title: title.to_string(),
            description: String::new(),
            priority: Priority::Medium,
            parent_id: None,
            dependencies: vec![],
        }
    }

    #[test]
    fn empty_title_rejected() {
        let errors = EntityValidator::validate_new(&new_entity(EntityType::Task, "   ")).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "title");
    }

    #[test]
    fn long_title_rejected() {
        let title = "x".repeat(MAX_TITLE_CHARS + 1);
        assert!(EntityValidator::validate_new(&new_entity(EntityType::Epic, &title)).is_err());
    }

    #[test]
    fn idea_with_parent_rejected() {
        let mut new = new_entity(EntityType::Idea, "Idea");
        new.parent_id = Some(1);
        let errors = EntityValidator::validate_new(&new).unwrap_err();
        assert_eq!(errors[0].field, "parent_id");
    }

    #[test]
    fn epic_with_dependencies_rejected() {
        let mut new = new_entity(EntityType::Epic, "Epic");
        new.dependencies = vec![3];
        assert!(EntityValidator::validate_new(&new).is_err());
    }

    #[test]
    fn update_checks_only_supplied_fields() {
        let update = EntityUpdate::default();
        assert!(EntityValidator::validate_update(EntityType::Task, &update).is_ok());

        let update = EntityUpdate {
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(EntityValidator::validate_update(EntityType::Task, &update).is_err());
    }

    #[test]
    fn parent_must_exist_and_match() {
        let store = lookup();
        assert!(ReferenceValidator::validate_parent(&store, EntityType::Epic, "epic", 1).is_ok());
        assert!(ReferenceValidator::validate_parent(&store, EntityType::Bug, "bug", 2).is_ok());

        let err = ReferenceValidator::validate_parent(&store, EntityType::Epic, "epic", 3).unwrap_err();
        assert!(matches!(err, TrellisError::InvalidParent { ref parent, .. } if parent == "TSK-3"));

        let err = ReferenceValidator::validate_parent(&store, EntityType::Task, "task", 99).unwrap_err();
        assert!(matches!(err, TrellisError::NotFound { .. }));
    }

    #[test]
    fn dependencies_must_be_task_kinds() {
        let store = lookup();
        assert!(ReferenceValidator::validate_dependencies(&store, &[3, 4]).is_ok());

        let err = ReferenceValidator::validate_dependencies(&store, &[3, 2]).unwrap_err();
        assert!(matches!(err, TrellisError::UnknownDependency { ref id } if id == "EPIC-2"));

        let err = ReferenceValidator::validate_dependencies(&store, &[42]).unwrap_err();
        assert!(matches!(err, TrellisError::UnknownDependency { ref id } if id == "42"));
    }
}
