use crate::container::ObjectScope;
use crate::foundation::{sort_by_order, Ordered};
use crate::loader::ObjectClassExport;

/// Metadata describing how to build one named object
#[derive(Debug, Clone)]
pub struct ObjectDefinition {
    pub class_name: String,
    pub object_type: String,
    pub scope: ObjectScope,
    pub parent: Option<String>,
    pub class_definition: ObjectClassExport,
}

impl ObjectDefinition {
    pub fn new(
        class_name: impl Into<String>,
        object_type: impl Into<String>,
        class_definition: ObjectClassExport,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            object_type: object_type.into(),
            scope: ObjectScope::Singleton,
            parent: None,
            class_definition,
        }
    }

    /// Definition named after the export's id, else its class name
    pub fn from_export(export: ObjectClassExport, object_type: impl Into<String>) -> Self {
        Self::new(export.object_name().to_string(), object_type, export)
    }

    pub fn with_scope(mut self, scope: ObjectScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn order(&self) -> i32 {
        self.class_definition.order
    }
}

/// Name, declared type and order of a registered definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPriority {
    pub name: String,
    pub object_type: String,
    pub order: i32,
}

impl Ordered for ObjectPriority {
    fn order(&self) -> i32 {
        self.order
    }
}

/// Insertion-ordered map of priorities that can be sorted by order
#[derive(Debug, Clone, Default)]
pub struct ObjectPriorityMap {
    entries: Vec<ObjectPriority>,
}

impl ObjectPriorityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by name
    pub fn put(&mut self, priority: ObjectPriority) {
        match self.entries.iter_mut().find(|p| p.name == priority.name) {
            Some(existing) => *existing = priority,
            None => self.entries.push(priority),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ObjectPriority> {
        self.entries.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|p| p.name.clone()).collect()
    }

    /// Entries in ascending order; ties keep insertion order
    pub fn sorted(&self) -> Vec<ObjectPriority> {
        let mut entries = self.entries.clone();
        sort_by_order(&mut entries);
        entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectPriority> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
