/// Object scope enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectScope {
    /// Built once and cached under its name
    #[default]
    Singleton,
    /// Built on every lookup, never cached
    Prototype,
}

impl ObjectScope {
    pub fn is_singleton(&self) -> bool {
        matches!(self, ObjectScope::Singleton)
    }

    pub fn is_prototype(&self) -> bool {
        matches!(self, ObjectScope::Prototype)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectScope::Singleton => "singleton",
            ObjectScope::Prototype => "prototype",
        }
    }
}

impl std::fmt::Display for ObjectScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ObjectScope {
    type Err = crate::errors::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "singleton" => Ok(ObjectScope::Singleton),
            "prototype" => Ok(ObjectScope::Prototype),
            _ => Err(crate::errors::CoreError::configuration(format!(
                "invalid object scope '{}'",
                s
            ))),
        }
    }
}
