use snafu::Snafu;
use std::path::PathBuf;

/// A wrapper for fallible operations across the deploy pipeline which propagate to the
/// request boundary using the try operator -- '?'.
pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[snafu(context(suffix(false)))]
pub(crate) enum Error {
    /// Error for when the request body is not valid JSON. The fixed message is the
    /// user-facing error string, no parse detail is leaked.
    #[snafu(display("JSONDecodeError"))]
    RequestParse { source: serde_json::Error },

    /// Error for when the target namespace is in the prohibited set.
    #[snafu(display("This namespace is not allowed"))]
    ProhibitedNamespace { namespace: String },

    /// Error for when a request carries both a chart reference and a git repository.
    #[snafu(display("Can not use both \"chart\" and \"repo\""))]
    ChartRepoConflict,

    /// Error for when a chart reference is combined with git checkout options.
    #[snafu(display("Can not use both \"chart\" and \"branch/sha/path\""))]
    ChartCheckoutConflict,

    /// Error for when a request names neither a chart nor a git repository.
    #[snafu(display("One of \"chart\" or \"repo\" is required"))]
    MissingChartSource,

    /// Error for when an external command exits non-zero without producing output.
    /// The display is the captured stderr, which is the user-facing error string.
    #[snafu(display("{std_err}"))]
    CommandFailed { std_err: String },

    /// Error for when an external command could not be spawned at all.
    #[snafu(display("Failed to run command {cmd}: {source}"))]
    CommandSpawn { source: std::io::Error, cmd: String },

    /// Error for when command output is not valid UTF-8.
    #[snafu(display("Failed to decode command output: {source}"))]
    U8VectorToString { source: std::str::Utf8Error },

    /// Error for when the values mapping could not be serialized to YAML.
    #[snafu(display("Failed to serialize values to YAML: {source}"))]
    SerializeValues { source: serde_yaml::Error },

    /// Error for when the staged values file could not be written.
    #[snafu(display("Failed to write values file {}: {}", filepath.display(), source))]
    WriteValuesFile {
        source: std::io::Error,
        filepath: PathBuf,
    },

    /// Error for when the repository staging directory could not be created.
    #[snafu(display("Failed to create checkout directory {}: {}", path.display(), source))]
    CreateCheckoutDir {
        source: std::io::Error,
        path: PathBuf,
    },

    /// Error for when a staged values file could not be removed during cleanup.
    #[snafu(display("Failed to remove staged values file {}: {}", filepath.display(), source))]
    RemoveValuesFile {
        source: std::io::Error,
        filepath: PathBuf,
    },

    /// Error for when a staged checkout directory could not be removed during cleanup.
    #[snafu(display("Failed to remove staged checkout {}: {}", path.display(), source))]
    RemoveCheckoutDir {
        source: std::io::Error,
        path: PathBuf,
    },
}

impl Error {
    /// True for the recognized request-level failures which are reported in-band as
    /// `{status: "error", result: <message>}` with HTTP 200. Everything else is an
    /// internal fault and surfaces as HTTP 500.
    pub(crate) fn is_reportable(&self) -> bool {
        matches!(
            self,
            Error::RequestParse { .. }
                | Error::ProhibitedNamespace { .. }
                | Error::ChartRepoConflict
                | Error::ChartCheckoutConflict
                | Error::MissingChartSource
                | Error::CommandFailed { .. }
        )
    }
}
