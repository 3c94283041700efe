/// This namespace is always prohibited, deploy requests may never target it.
pub(crate) const BASELINE_PROHIBITED_NAMESPACE: &str = "kube-system";

/// Environment variable carrying extra prohibited namespaces, comma-separated.
pub(crate) const PROHIBITED_NAMESPACES_ENV: &str = "PROHIBITED_NAMESPACES";

/// Branch cloned when a deploy request does not name one.
pub(crate) const DEFAULT_GIT_BRANCH: &str = "master";
