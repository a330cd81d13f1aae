/// A capability "block" the assistant can be granted for one exchange.
///
/// `display_name` is what the user sees; `internal_name` is the
/// protocol-facing identifier and the only field that ever crosses the
/// boundary to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    pub id: u32,
    pub display_name: &'static str,
    pub internal_name: &'static str,
    pub description: &'static str,
}

/// Static registry of available capabilities, built once at startup.
#[derive(Debug, Clone)]
pub struct Catalog {
    capabilities: Vec<Capability>,
}

impl Catalog {
    /// The built-in block table for the demo.
    pub fn builtin() -> Self {
        Self {
            capabilities: vec![
                Capability {
                    id: 1,
                    display_name: "Google Search",
                    internal_name: "google_search",
                    description: "Search the web for information",
                },
                Capability {
                    id: 2,
                    display_name: "Browse Website",
                    internal_name: "get_website_url_content",
                    description: "Read the contents of a webpage",
                },
                Capability {
                    id: 3,
                    display_name: "Extract Links to Visit",
                    internal_name: "extract_links",
                    description: "Find useful links to visit",
                },
                Capability {
                    id: 5,
                    display_name: "More coming soon!",
                    internal_name: "coming_soon",
                    description: "Want something? Send me an email :)",
                },
            ],
        }
    }

    pub fn get(&self, id: u32) -> Option<&Capability> {
        self.capabilities.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.get(id).is_some()
    }

    pub fn all(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Capabilities whose display name contains `filter`, case-insensitive.
    /// An empty filter matches everything.
    pub fn matching<'a>(&'a self, filter: &str) -> Vec<&'a Capability> {
        let needle = filter.to_lowercase();
        self.all()
            .iter()
            .filter(|c| c.display_name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ids_are_unique() {
        let catalog = Catalog::builtin();
        for (i, a) in catalog.all().iter().enumerate() {
            for b in catalog.all().iter().skip(i + 1) {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn test_builtin_internal_names_nonempty() {
        let catalog = Catalog::builtin();
        for cap in catalog.all() {
            assert!(!cap.internal_name.is_empty());
        }
    }

    #[test]
    fn test_get_unknown_id() {
        let catalog = Catalog::builtin();
        assert!(catalog.get(999).is_none());
        // id 4 is deliberately absent from the builtin table
        assert!(catalog.get(4).is_none());
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let catalog = Catalog::builtin();
        let lower = catalog.matching("google");
        let upper = catalog.matching("GOOGLE");
        assert_eq!(lower.len(), 1);
        assert_eq!(lower, upper);
        assert_eq!(lower[0].internal_name, "google_search");
    }

    #[test]
    fn test_matching_empty_filter_matches_all() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.matching("").len(), catalog.len());
    }

    #[test]
    fn test_matching_no_hits() {
        let catalog = Catalog::builtin();
        assert!(catalog.matching("zzzz-no-such-block").is_empty());
    }
}
