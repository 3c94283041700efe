use std::path::PathBuf;

/// Builder for the composite deploy command line: idempotent namespace creation
/// followed by `helm upgrade --install`. Building is pure and deterministic, the
/// command is only composed here, never executed.
pub(crate) struct HelmDeployCommand {
    namespace: String,
    release_name: String,
    chart: String,
    values_file: Option<PathBuf>,
}

impl HelmDeployCommand {
    pub(crate) fn new<N, R, C>(namespace: N, release_name: R, chart: C) -> Self
    where
        N: ToString,
        R: ToString,
        C: ToString,
    {
        Self {
            namespace: namespace.to_string(),
            release_name: release_name.to_string(),
            chart: chart.to_string(),
            values_file: None,
        }
    }

    /// Points the upgrade at a staged values file.
    #[must_use]
    pub(crate) fn with_values_file(mut self, values_file: Option<PathBuf>) -> Self {
        self.values_file = values_file;
        self
    }

    /// Composes the final shell command line. Namespace creation tolerates the
    /// namespace already existing.
    pub(crate) fn build(self) -> String {
        let mut cmd = format!(
            "kubectl create ns {namespace} || true && \
             helm upgrade -i --wait --cleanup-on-fail --force \
             --namespace {namespace} {release_name} {chart}",
            namespace = self.namespace,
            release_name = self.release_name,
            chart = self.chart,
        );
        if let Some(values_file) = self.values_file {
            cmd.push_str(format!(" -f {}", values_file.display()).as_str());
        }
        cmd
    }
}
