/// Compilation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileConfig {
    /// Endpoint prefixes to expose. Empty exposes only `sdkVersion`.
    pub services: Vec<String>,
    /// Abort on structurally divergent types sharing a name instead of
    /// logging and keeping the most specific definition.
    pub strict_conflicts: bool,
}

impl CompileConfig {
    pub fn new<I, S>(services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            services: services.into_iter().map(Into::into).collect(),
            strict_conflicts: false,
        }
    }

    pub fn strict(mut self) -> Self {
        self.strict_conflicts = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_by_default() {
        let config = CompileConfig::new(["ec2", "s3"]);
        assert_eq!(config.services, vec!["ec2", "s3"]);
        assert!(!config.strict_conflicts);
        assert!(config.strict().strict_conflicts);
    }
}
