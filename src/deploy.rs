use crate::{
    command::ShellRunner,
    common::error::{
        ChartCheckoutConflict, ChartRepoConflict, MissingChartSource, ProhibitedNamespace, Result,
    },
    config::DeployConfig,
    helm::HelmDeployCommand,
    stage::Staging,
};
use serde::Deserialize;
use snafu::ensure;
use tracing::info;

/// A request to realize one Helm release. The chart either comes straight from a
/// chart reference, or from a git-hosted chart source with optional branch, commit
/// and subpath -- never both.
#[derive(Debug, Deserialize)]
pub(crate) struct DeployRequest {
    pub(crate) namespace: String,
    pub(crate) release: String,
    pub(crate) chart: Option<String>,
    pub(crate) repo: Option<String>,
    pub(crate) branch: Option<String>,
    pub(crate) sha: Option<String>,
    pub(crate) path: Option<String>,
    pub(crate) values: Option<serde_json::Value>,
}

impl DeployRequest {
    /// Enforces the prohibited-namespace and mutual-exclusion rules. No side effects,
    /// must run before any resource is staged.
    pub(crate) fn validate(&self, config: &DeployConfig) -> Result<()> {
        ensure!(
            !config.is_prohibited(self.namespace.as_str()),
            ProhibitedNamespace {
                namespace: self.namespace.clone()
            }
        );
        ensure!(
            !(self.chart.is_some() && self.repo.is_some()),
            ChartRepoConflict
        );
        ensure!(
            !(self.chart.is_some()
                && (self.branch.is_some() || self.sha.is_some() || self.path.is_some())),
            ChartCheckoutConflict
        );
        ensure!(
            self.chart.is_some() || self.repo.is_some(),
            MissingChartSource
        );
        Ok(())
    }
}

/// Sequences one deploy request end-to-end: validation, staging, command build and
/// execution. Cleanup of staged resources runs whichever way the pipeline went; a
/// cleanup failure takes precedence over the pipeline's own error.
pub(crate) async fn deploy(
    config: &DeployConfig,
    request: &DeployRequest,
) -> Result<Option<String>> {
    deploy_in(config, request, Staging::new()).await
}

async fn deploy_in(
    config: &DeployConfig,
    request: &DeployRequest,
    mut staging: Staging,
) -> Result<Option<String>> {
    request.validate(config)?;

    let runner = ShellRunner::new(config.dry_run());
    let outcome = execute(&runner, request, &mut staging).await;
    let cleanup = staging.cleanup().await;
    cleanup.and(outcome)
}

async fn execute(
    runner: &ShellRunner,
    request: &DeployRequest,
    staging: &mut Staging,
) -> Result<Option<String>> {
    let chart = match (request.repo.as_deref(), request.chart.as_deref()) {
        (Some(repo), _) => {
            let checkout = staging
                .stage_checkout(
                    runner,
                    repo,
                    request.branch.as_deref(),
                    request.sha.as_deref(),
                )
                .await?;
            let chart_path = match request.path.as_deref() {
                Some(path) => checkout.join(path),
                None => checkout,
            };
            chart_path.display().to_string()
        }
        (None, Some(chart)) => chart.to_string(),
        (None, None) => return MissingChartSource.fail(),
    };

    let values_file = match request.values.as_ref() {
        Some(values) => Some(staging.stage_values(values).await?),
        None => None,
    };

    let cmd = HelmDeployCommand::new(
        request.namespace.as_str(),
        request.release.as_str(),
        chart.as_str(),
    )
    .with_values_file(values_file)
    .build();

    info!(
        namespace = %request.namespace,
        release = %request.release,
        %chart,
        "Deploying Helm release"
    );
    runner.run(cmd.as_str()).await
}

#[cfg(test)]
mod tests {
    use super::{deploy_in, DeployRequest};
    use crate::{common::error::Error, config::DeployConfig, stage::Staging};
    use serde_json::json;

    fn request(body: serde_json::Value) -> DeployRequest {
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn test_failed_clone_leaves_no_staged_paths() {
        let scratch = tempfile::tempdir().unwrap();
        let config = DeployConfig::new(&[], false);
        let request = request(json!({
            "namespace": "default",
            "release": "flux",
            "repo": scratch.path().join("no-such-origin.git").display().to_string(),
            "values": {"mysqlRootPassword": "hello"},
        }));

        let error = deploy_in(
            &config,
            &request,
            Staging::new_in(scratch.path().to_path_buf()),
        )
        .await
        .unwrap_err();

        assert!(matches!(error, Error::CommandFailed { .. }));
        // The checkout directory staged before the clone failed must be gone, and
        // no values file was ever written.
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_failed_deploy_command_leaves_no_staged_values_file() {
        let scratch = tempfile::tempdir().unwrap();
        let config = DeployConfig::new(&[], false);
        let request = request(json!({
            "namespace": "no-cluster-here",
            "release": "flux",
            "chart": "stable/flux",
            "values": {"mysqlRootPassword": "hello"},
        }));

        // Without a reachable cluster the composed command exits non-zero with
        // nothing on stdout, so the pipeline fails after the values file was staged.
        let error = deploy_in(
            &config,
            &request,
            Staging::new_in(scratch.path().to_path_buf()),
        )
        .await
        .unwrap_err();

        assert!(matches!(error, Error::CommandFailed { .. }));
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_prohibited_namespace_is_rejected() {
        let config = DeployConfig::new(&[], true);
        let request = request(json!({
            "namespace": "kube-system",
            "release": "flux",
            "chart": "stable/flux",
        }));
        let error = request.validate(&config).unwrap_err();
        assert!(matches!(error, Error::ProhibitedNamespace { .. }));
        assert_eq!(error.to_string(), "This namespace is not allowed");
    }

    #[test]
    fn test_chart_and_repo_conflict() {
        let config = DeployConfig::new(&[], true);
        let request = request(json!({
            "namespace": "default",
            "release": "flux",
            "chart": "stable/flux",
            "repo": "git@github.com:fluxcd/flux.git",
        }));
        let error = request.validate(&config).unwrap_err();
        assert_eq!(error.to_string(), "Can not use both \"chart\" and \"repo\"");
    }

    #[test]
    fn test_chart_and_checkout_options_conflict() {
        let config = DeployConfig::new(&[], true);
        for field in ["branch", "sha", "path"] {
            let request = request(json!({
                "namespace": "default",
                "release": "flux",
                "chart": "stable/flux",
                field: "something",
            }));
            let error = request.validate(&config).unwrap_err();
            assert_eq!(
                error.to_string(),
                "Can not use both \"chart\" and \"branch/sha/path\""
            );
        }
    }

    #[test]
    fn test_chart_source_is_required() {
        let config = DeployConfig::new(&[], true);
        let request = request(json!({
            "namespace": "default",
            "release": "flux",
        }));
        let error = request.validate(&config).unwrap_err();
        assert!(matches!(error, Error::MissingChartSource));
    }

    #[test]
    fn test_repo_with_checkout_options_is_valid() {
        let config = DeployConfig::new(&[], true);
        let request = request(json!({
            "namespace": "default",
            "release": "flux",
            "repo": "git@github.com:fluxcd/flux.git",
            "branch": "main",
            "sha": "abc123",
            "path": "charts/flux",
        }));
        request.validate(&config).unwrap();
    }
}
