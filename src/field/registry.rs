//! Field Registry
//!
//! Composes the fields of one resource type from an ordered list of
//! sub-resource contributors. Fields keep their registration order, and a
//! name registered twice fails the build instead of overwriting.

use super::schema::{Block, ResourceSchema};
use super::{FieldName, GenericField};
use crate::error::RegistryError;
use crate::wrapper::DomainObject;
use std::collections::HashMap;

/// Registration function contributed by one sub-resource module
pub type Setup<T> = fn(&mut FieldsMapBuilder<T>) -> Result<(), RegistryError>;

/// Named sub-resource contributor
pub struct Contributor<T> {
    pub name: &'static str,
    pub setup: Setup<T>,
}

impl<T> Contributor<T> {
    pub const fn new(name: &'static str, setup: Setup<T>) -> Self {
        Self { name, setup }
    }
}

/// Mutable registry used while contributors run
pub struct FieldsMapBuilder<T> {
    contributor: &'static str,
    fields: Vec<GenericField<T>>,
    owners: Vec<&'static str>,
    index: HashMap<FieldName, usize>,
}

impl<T: DomainObject> FieldsMapBuilder<T> {
    fn new() -> Self {
        Self {
            contributor: "",
            fields: Vec::new(),
            owners: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register one field under the running contributor
    pub fn register(&mut self, field: GenericField<T>) -> Result<(), RegistryError> {
        let name = field.name();
        if let Some(&existing) = self.index.get(&name) {
            return Err(RegistryError::DuplicateField {
                field: name,
                first: self.owners[existing],
                second: self.contributor,
            });
        }
        tracing::debug!("register field {} ({})", name, self.contributor);
        self.index.insert(name, self.fields.len());
        self.fields.push(field);
        self.owners.push(self.contributor);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    fn finish(self) -> FieldsMap<T> {
        FieldsMap {
            fields: self.fields,
            index: self.index,
        }
    }
}

/// Read-only, insertion-ordered registry of a resource type's fields
pub struct FieldsMap<T> {
    fields: Vec<GenericField<T>>,
    index: HashMap<FieldName, usize>,
}

impl<T: DomainObject> FieldsMap<T> {
    /// Run every contributor in order
    pub fn build(contributors: &[Contributor<T>]) -> Result<Self, RegistryError> {
        let mut builder = FieldsMapBuilder::new();
        for contributor in contributors {
            builder.contributor = contributor.name;
            (contributor.setup)(&mut builder)?;
        }
        tracing::debug!(
            "built fields map: {} fields from {} contributors",
            builder.fields.len(),
            contributors.len()
        );
        Ok(builder.finish())
    }

    pub fn get(&self, name: &str) -> Option<&GenericField<T>> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Fields in registration order
    pub fn iter(&self) -> impl Iterator<Item = &GenericField<T>> {
        self.fields.iter()
    }

    pub fn names(&self) -> Vec<FieldName> {
        self.fields.iter().map(GenericField::name).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Aggregated schema of every registered field
    pub fn schema(&self, resource_type: &'static str) -> ResourceSchema {
        let mut attributes = Block::default();
        for field in &self.fields {
            attributes.push(field.name(), field.schema().clone());
        }
        ResourceSchema {
            resource_type,
            attributes,
        }
    }
}

impl<T: DomainObject> std::fmt::Debug for FieldsMap<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.fields.iter().map(|field| field.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Category, Schema};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct Probe;

    impl DomainObject for Probe {
        fn id(&self) -> Option<&str> {
            None
        }
    }

    const PROBE: Category = Category::new("probe");
    const ALPHA: FieldName = FieldName::new("alpha");
    const BETA: FieldName = FieldName::new("beta");
    const GAMMA: FieldName = FieldName::new("gamma");

    fn setup_first(fields: &mut FieldsMapBuilder<Probe>) -> Result<(), RegistryError> {
        fields.register(GenericField::new(PROBE, GAMMA, Schema::string()))?;
        fields.register(GenericField::new(PROBE, ALPHA, Schema::string()))?;
        Ok(())
    }

    fn setup_second(fields: &mut FieldsMapBuilder<Probe>) -> Result<(), RegistryError> {
        fields.register(GenericField::new(PROBE, BETA, Schema::int()))
    }

    fn setup_clash(fields: &mut FieldsMapBuilder<Probe>) -> Result<(), RegistryError> {
        fields.register(GenericField::new(PROBE, ALPHA, Schema::bool()))
    }

    #[test]
    fn test_registration_order_is_kept() {
        let map = FieldsMap::build(&[
            Contributor::new("first", setup_first),
            Contributor::new("second", setup_second),
        ])
        .unwrap();
        assert_eq!(map.names(), vec![GAMMA, ALPHA, BETA]);
        assert_eq!(map.len(), 3);
        assert!(map.get("beta").is_some());
        assert!(map.get("delta").is_none());
    }

    #[test]
    fn test_duplicate_name_fails_build() {
        let err = FieldsMap::build(&[
            Contributor::new("first", setup_first),
            Contributor::new("clash", setup_clash),
        ])
        .unwrap_err();
        match err {
            RegistryError::DuplicateField {
                field,
                first,
                second,
            } => {
                assert_eq!(field, ALPHA);
                assert_eq!(first, "first");
                assert_eq!(second, "clash");
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_schema_follows_registration_order() {
        let map = FieldsMap::build(&[Contributor::new("first", setup_first)]).unwrap();
        let schema = map.schema("probe");
        let names: Vec<&str> = schema.attributes.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["gamma", "alpha"]);
    }
}
