/// Buyers served when no roster is configured.
pub const DEFAULT_BUYERS: [&str; 4] = ["Bhavani", "Sundari", "Rajeshwari", "Ravi"];

/// The fixed set of buyers a sale may be recorded for.
/// Order is preserved and used when presenting summaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyerRoster {
    names: Vec<String>,
}

impl BuyerRoster {
    /// Build a roster from names. Blank names and repeats are dropped.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut roster: Vec<String> = Vec::new();
        for name in names {
            let name: String = name.into().trim().to_string();
            if !name.is_empty() && !roster.contains(&name) {
                roster.push(name);
            }
        }
        Self { names: roster }
    }

    /// Parse a comma-separated list, e.g. "Bhavani,Ravi".
    pub fn from_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Exact, case-sensitive membership.
    pub fn contains(&self, buyer: &str) -> bool {
        self.names.iter().any(|name| name == buyer)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for BuyerRoster {
    fn default() -> Self {
        Self::new(DEFAULT_BUYERS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roster() {
        let roster = BuyerRoster::default();
        assert_eq!(roster.names(), ["Bhavani", "Sundari", "Rajeshwari", "Ravi"]);
        assert!(roster.contains("Ravi"));
        assert!(!roster.contains("ravi"));
        assert!(!roster.contains(""));
    }

    #[test]
    fn test_from_list_trims_and_dedups() {
        let roster = BuyerRoster::from_list(" Ravi, Bhavani ,,Ravi");
        assert_eq!(roster.names(), ["Ravi", "Bhavani"]);
    }

    #[test]
    fn test_empty_list_gives_empty_roster() {
        assert!(BuyerRoster::from_list(" , ").is_empty());
    }
}
