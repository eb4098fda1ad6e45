/// A dotted configuration property name split into its elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigProperty {
    name: String,
    elements: Vec<String>,
}

impl ConfigProperty {
    /// Parse a dotted path such as `application.server.port`
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        let elements = name
            .split('.')
            .filter(|element| !element.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            name: name.to_string(),
            elements,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    pub fn element(&self, index: usize) -> Option<&str> {
        self.elements.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// The original dotted name, used as the lookup key in flat sources
    pub fn full_name(&self) -> &str {
        &self.name
    }
}

impl From<&str> for ConfigProperty {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl std::fmt::Display for ConfigProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dotted_property() {
        let prop = ConfigProperty::parse("application.server.port");
        assert_eq!(prop.len(), 3);
        assert_eq!(prop.element(0), Some("application"));
        assert_eq!(prop.element(2), Some("port"));
        assert_eq!(prop.element(3), None);
        assert_eq!(prop.full_name(), "application.server.port");
    }

    #[test]
    fn test_empty_property() {
        assert!(ConfigProperty::parse("").is_empty());
        assert!(ConfigProperty::parse("  ").is_empty());
        assert!(ConfigProperty::parse("..").is_empty());
        assert!(!ConfigProperty::parse("PORT").is_empty());
    }
}
