/// Allow-list of request paths that are admitted without an established identity.
///
/// A pattern ending in `/**` matches the prefix itself and everything below
/// it; any other pattern must match the path exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicPathPolicy {
    exact: Vec<String>,
    prefixes: Vec<String>,
}

impl PublicPathPolicy {
    /// Builds a policy from individual patterns.
    #[must_use]
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut policy = Self::default();
        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }

            match pattern.strip_suffix("/**") {
                Some(prefix) => policy.prefixes.push(prefix.to_owned()),
                None => policy.exact.push(pattern.to_owned()),
            }
        }

        policy
    }

    /// Builds a policy from a comma-separated pattern list.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        Self::new(value.split(','))
    }

    /// Returns whether the path is on the allow-list.
    #[must_use]
    pub fn is_public(&self, path: &str) -> bool {
        if self.exact.iter().any(|pattern| pattern == path) {
            return true;
        }

        self.prefixes.iter().any(|prefix| {
            path == prefix
                || path
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}
