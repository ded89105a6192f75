//! Enum definitions shared across entities

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::models::entity::Entity;

/// Every enum name seen in a run, bound to its ordered value set
#[derive(Debug, Clone, Default)]
pub struct EnumRegistry {
    enums: BTreeMap<String, Vec<String>>,
}

impl EnumRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `values`.
    ///
    /// Re-registering identical values is a no-op; any other value set for a
    /// known name is an [`Error::EnumConflict`].
    pub fn register(&mut self, name: &str, values: &[String]) -> Result<()> {
        match self.enums.get(name) {
            Some(existing) if existing.as_slice() == values => Ok(()),
            Some(existing) => Err(Error::EnumConflict {
                name: name.to_string(),
                existing: existing.clone(),
                conflicting: values.to_vec(),
            }),
            None => {
                self.enums.insert(name.to_string(), values.to_vec());
                Ok(())
            }
        }
    }

    /// Register every enum-typed field of every entity
    pub fn register_entities(&mut self, entities: &[Entity]) -> Result<()> {
        for entity in entities {
            for field in &entity.fields {
                if let Some(def) = &field.enum_def {
                    self.register(&def.name, &def.values)?;
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.enums.get(name).map(Vec::as_slice)
    }

    /// All enums in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.enums.iter()
    }

    pub fn len(&self) -> usize {
        self.enums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enums.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entity::Field;
    use crate::models::field_type::FieldType;

    #[test]
    fn test_identical_redefinition_is_accepted() {
        let entities = vec![
            Entity::new("User").with_field(Field::new("status", FieldType::Text).with_enum("status", &["on", "off"])),
            Entity::new("Device").with_field(Field::new("state", FieldType::Text).with_enum("status", &["on", "off"])),
        ];

        let mut registry = EnumRegistry::new();
        registry.register_entities(&entities).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("status").unwrap(), ["on".to_string(), "off".to_string()]);
    }

    #[test]
    fn test_conflicting_values_are_fatal() {
        let mut registry = EnumRegistry::new();
        registry.register("status", &["on".to_string(), "off".to_string()]).unwrap();

        let err = registry
            .register("status", &["off".to_string(), "on".to_string()])
            .unwrap_err();
        assert!(matches!(err, Error::EnumConflict { ref name, .. } if name == "status"));
    }
}
