//! Error handling
//!
//! Failures come in two kinds. An `Initialization` error means the execution context was never
//! established. A `Query` error means a question asked of an established context could not be
//! answered. Both carry a `Fault` describing the underlying cause.

use std::fmt;
use std::io;
use std::os::raw::c_int;
use std::string::FromUtf8Error;

use thiserror::Error;

use crate::topology::Rank;

/// Result type of the reporter operations
pub type Result<T> = std::result::Result<T, Error>;

/// The question asked of an execution context
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Query {
    /// Total number of participants
    Size,
    /// Identity of the calling participant
    Rank,
    /// Name of the host the calling participant runs on
    Name,
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            Query::Size => "size",
            Query::Rank => "rank",
            Query::Name => "name",
        };
        f.write_str(s)
    }
}

/// Low-level cause reported by a runtime
#[derive(Error, Debug)]
pub enum Fault {
    /// The runtime returned a non-success return code
    #[error("runtime returned error code {0}")]
    Code(c_int),

    /// The runtime has already been initialized in this process
    #[error("runtime has already been initialized")]
    AlreadyInitialized,

    /// A launcher exported only one half of the rank/size pair
    #[error("{present} is set but {missing} is not")]
    MissingVar {
        /// The variable that was found
        present: &'static str,
        /// Its partner that was not
        missing: &'static str,
    },

    /// A launcher variable holds something other than a usable integer
    #[error("invalid value {value:?} in {var}")]
    InvalidVar {
        /// Name of the variable
        var: &'static str,
        /// Its raw contents
        value: String,
    },

    /// The command line has more arguments than a C `argc` can count
    #[error("{0} command line arguments exceed the range of argc")]
    TooManyArgs(usize),

    /// The backend named in the configuration is unknown or not compiled in
    #[error("unknown runtime backend {0:?}")]
    UnknownBackend(String),

    /// A context reported fewer than one participant
    #[error("context size {0} is not positive")]
    InvalidSize(Rank),

    /// A rank that does not fall into `[0, size)`
    #[error("rank {rank} is outside of a context of size {size}")]
    RankOutOfRange {
        /// The offending rank
        rank: Rank,
        /// Size of the context
        size: Rank,
    },

    /// The processor name came back empty
    #[error("processor name is empty")]
    EmptyName,

    /// The processor name is not UTF-8
    #[error("processor name is not valid UTF-8")]
    Utf8(#[from] FromUtf8Error),
}

/// Error kinds surfaced by the reporter
#[derive(Error, Debug)]
pub enum Error {
    /// The execution context could not be established
    #[error("join failed: {0}")]
    Initialization(#[source] Fault),

    /// A query against an established execution context failed
    #[error("{query} query failed: {fault}")]
    Query {
        /// Which query failed
        query: Query,
        /// What went wrong
        #[source]
        fault: Fault,
    },

    /// The greeting could not be written
    #[error("writing greeting failed: {0}")]
    Output(#[from] io::Error),
}

impl Error {
    /// Wraps a fault raised while answering `query`.
    pub fn query(query: Query, fault: Fault) -> Self {
        Error::Query { query, fault }
    }
}
