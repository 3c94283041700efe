use crate::common::constants::BASELINE_PROHIBITED_NAMESPACE;

/// Per-process deploy service configuration. Built once at startup and injected into
/// the request handlers read-only, so requests share no mutable state.
#[derive(Debug, Clone)]
pub(crate) struct DeployConfig {
    prohibited_namespaces: Vec<String>,
    dry_run: bool,
}

impl DeployConfig {
    /// Assemble the config from the baseline prohibited namespace plus the extra ones
    /// passed through the environment. Entries are whitespace-stripped, empty entries
    /// are dropped.
    pub(crate) fn new(extra_prohibited: &[String], dry_run: bool) -> Self {
        let mut prohibited_namespaces = vec![BASELINE_PROHIBITED_NAMESPACE.to_string()];
        prohibited_namespaces.extend(
            extra_prohibited
                .iter()
                .map(|namespace| namespace.trim().to_string())
                .filter(|namespace| !namespace.is_empty()),
        );

        Self {
            prohibited_namespaces,
            dry_run,
        }
    }

    /// True if deploy requests may not target this namespace.
    pub(crate) fn is_prohibited(&self, namespace: &str) -> bool {
        self.prohibited_namespaces
            .iter()
            .any(|prohibited| prohibited == namespace)
    }

    /// True if composed commands should be echoed back instead of executed.
    pub(crate) fn dry_run(&self) -> bool {
        self.dry_run
    }
}

#[cfg(test)]
mod tests {
    use super::DeployConfig;

    #[test]
    fn test_baseline_always_prohibited() {
        let config = DeployConfig::new(&[], false);
        assert!(config.is_prohibited("kube-system"));
        assert!(!config.is_prohibited("default"));
    }

    #[test]
    fn test_extra_namespaces_are_stripped_and_appended() {
        let extra = vec![
            "monitoring ".to_string(),
            " prod".to_string(),
            "".to_string(),
        ];
        let config = DeployConfig::new(&extra, false);
        assert!(config.is_prohibited("kube-system"));
        assert!(config.is_prohibited("monitoring"));
        assert!(config.is_prohibited("prod"));
        assert!(!config.is_prohibited(""));
    }
}
