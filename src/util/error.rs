/// Fatal startup failures from the sensing library.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("failed to load sensing library '{path}': {source}")]
    LibraryLoad {
        path: String,
        #[source]
        source: libloading::Error,
    },

    #[error(
        "sensing library init failed (code {0}): could not open the SMU interface. \
         Is the ryzen_smu kernel driver loaded, and are you running as root?"
    )]
    InitFailed(i32),

    #[error("PM tables are not supported on this CPU (code {0})")]
    Unsupported(i32),
}

/// A single poll failed. Non-fatal: the caller skips the refresh cycle and
/// keeps the last-known snapshot.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("sensor read transaction failed (code {0})")]
    ReadFailed(i32),

    #[error("reader has already been torn down")]
    TornDown,
}

impl InitError {
    /// Whether the failure smells like missing privilege rather than
    /// unsupported hardware. Used for the sudo hint at exit.
    pub fn is_likely_permission(&self) -> bool {
        matches!(self, Self::InitFailed(_))
    }
}
