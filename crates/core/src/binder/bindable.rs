use std::borrow::Cow;
use std::marker::PhantomData;

/// Names the target of a conversion
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectType {
    name: Cow<'static, str>,
}

impl ObjectType {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
        }
    }

    pub fn string() -> Self {
        Self::new("string")
    }

    pub fn integer() -> Self {
        Self::new("integer")
    }

    pub fn float() -> Self {
        Self::new("float")
    }

    pub fn boolean() -> Self {
        Self::new("boolean")
    }

    pub fn list() -> Self {
        Self::new("list")
    }

    pub fn config_locations() -> Self {
        Self::new("config_locations")
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Describes what a property should be bound to
#[derive(Debug)]
pub struct Bindable<T> {
    target: Option<ObjectType>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Bindable<T> {
    pub fn of(target: ObjectType) -> Self {
        Self {
            target: Some(target),
            _marker: PhantomData,
        }
    }

    /// A bindable with no declared target; binding it is rejected
    pub fn untyped() -> Self {
        Self {
            target: None,
            _marker: PhantomData,
        }
    }

    pub fn target(&self) -> Option<&ObjectType> {
        self.target.as_ref()
    }
}

impl<T> Clone for Bindable<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            _marker: PhantomData,
        }
    }
}

/// Outcome of a bind: the converted value, or nothing when no source had the property
#[derive(Debug, Clone, PartialEq)]
pub struct BindResult<T> {
    value: Option<T>,
}

impl<T> BindResult<T> {
    pub fn bound(value: T) -> Self {
        Self { value: Some(value) }
    }

    pub fn unbound() -> Self {
        Self { value: None }
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.value.is_some()
    }

    pub fn or_else(self, other: T) -> T {
        self.value.unwrap_or(other)
    }

    pub fn into_inner(self) -> Option<T> {
        self.value
    }
}
