use std::io;

use thiserror::Error;

/// Errors raised while running a log server session
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("no command given")]
    EmptyCommand,

    #[error(transparent)]
    Io(#[from] io::Error),
}
