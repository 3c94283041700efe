use crate::{
    command::ShellRunner,
    common::{
        constants::DEFAULT_GIT_BRANCH,
        error::{
            CreateCheckoutDir, RemoveCheckoutDir, RemoveValuesFile, Result, SerializeValues,
            WriteValuesFile,
        },
    },
};
use snafu::ResultExt;
use std::{
    env,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};
use tracing::debug;

/// Returns a temporary path unique per call within the process, derived from wall-clock
/// time at microsecond granularity. Collisions are accepted as negligible, this is not
/// cryptographically unique. Callers append their own extension.
fn temp_path_in(base_dir: &Path) -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    base_dir.join(format!("{}.{:06}", now.as_secs(), now.subsec_micros()))
}

/// Flattens a git remote into a single path component: the double slash is collapsed
/// and the remaining slashes become hyphens.
pub(crate) fn remote_path_name(remote: &str) -> String {
    remote.replace("//", "").replace('/', "-")
}

/// Tracks the temporary resources staged for one deploy request. Staged paths are
/// request-local and never shared; `cleanup` must run once the request settles,
/// whichever way it settled.
#[derive(Debug)]
pub(crate) struct Staging {
    base_dir: PathBuf,
    values_file: Option<PathBuf>,
    checkout_dir: Option<PathBuf>,
}

impl Staging {
    pub(crate) fn new() -> Self {
        Self::new_in(env::temp_dir())
    }

    pub(crate) fn new_in(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            values_file: None,
            checkout_dir: None,
        }
    }

    /// Serializes the values mapping to YAML and writes it to a uniquely named
    /// temporary file, which lives until `cleanup`.
    pub(crate) async fn stage_values(&mut self, values: &serde_json::Value) -> Result<PathBuf> {
        let values_yaml = serde_yaml::to_string(values).context(SerializeValues)?;

        let filepath = PathBuf::from(format!("{}.yaml", temp_path_in(&self.base_dir).display()));
        tokio::fs::write(filepath.as_path(), values_yaml)
            .await
            .context(WriteValuesFile {
                filepath: filepath.clone(),
            })?;

        self.values_file = Some(filepath.clone());
        Ok(filepath)
    }

    /// Shallow-clones `repo` at `branch` into a uniquely named temporary directory,
    /// which lives until `cleanup`. When a commit is given, it is fetched at depth 1
    /// and checked out after the clone.
    pub(crate) async fn stage_checkout(
        &mut self,
        runner: &ShellRunner,
        repo: &str,
        branch: Option<&str>,
        sha: Option<&str>,
    ) -> Result<PathBuf> {
        // TODO: cache checkouts under the remote's path name and fetch instead of
        // re-cloning on every request.
        let path = PathBuf::from(format!(
            "{}-{}",
            temp_path_in(&self.base_dir).display(),
            remote_path_name(repo)
        ));

        // git is fine with cloning into an existing empty directory, and creating it
        // up front keeps the cleanup path uniform with dry-run.
        tokio::fs::create_dir(path.as_path())
            .await
            .context(CreateCheckoutDir { path: path.clone() })?;
        self.checkout_dir = Some(path.clone());

        let branch = branch.unwrap_or(DEFAULT_GIT_BRANCH);
        let clone_cmd = format!(
            "git clone --depth=1 -b {branch} {repo} {path}",
            path = path.display()
        );
        if let Some(stdout) = runner.run(clone_cmd.as_str()).await? {
            debug!(%stdout, "Clone command standard output");
        }

        if let Some(sha) = sha {
            let pin_cmd = format!(
                "git -C {path} fetch --depth=1 origin {sha} && git -C {path} checkout FETCH_HEAD",
                path = path.display()
            );
            runner.run(pin_cmd.as_str()).await?;
        }

        Ok(path)
    }

    /// Deletes whatever this request staged. Runs on every exit path; removal
    /// failures propagate and may mask the error that ended the request.
    pub(crate) async fn cleanup(&mut self) -> Result<()> {
        if let Some(filepath) = self.values_file.take() {
            tokio::fs::remove_file(filepath.as_path())
                .await
                .context(RemoveValuesFile { filepath })?;
        }
        if let Some(path) = self.checkout_dir.take() {
            tokio::fs::remove_dir_all(path.as_path())
                .await
                .context(RemoveCheckoutDir { path })?;
        }
        Ok(())
    }
}
