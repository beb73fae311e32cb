use thiserror::Error;

/// Errors that can cross an API boundary of this crate.
///
/// Per the error-handling design, these are reserved for boundary failures
/// (malformed input, bad CLI arguments). The routing/scheduling/forwarding
/// control-flow outcomes described in the specification's error table
/// (infeasible request, missed deadline, dropped bundle, stale MSR route,
/// ...) are never represented here: they are typed results (`Option`,
/// status transitions, observer events), not `Result::Err` values.
#[derive(Error, Debug)]
pub enum CgsrError {
    #[error("failed to parse contact plan ({0})")]
    ContactPlanParse(String),

    #[error("failed to open contact plan file {path}: {source}")]
    ContactPlanIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode simulation input: {0}")]
    SimInputDecode(#[from] serde_json::Error),

    #[error("failed to read simulation input file {path}: {source}")]
    SimInputIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, CgsrError>;
