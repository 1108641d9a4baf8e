//! Runtime backend selection
//!
//! The backend is picked at compile time and can be overridden through the
//! `MPI_REPORTER_BACKEND` environment variable.
use std::env;
use std::fmt;
use std::str::FromStr;

use crate::error::Fault;

/// Environment variable that overrides the default backend
pub const BACKEND_VAR: &str = "MPI_REPORTER_BACKEND";

/// The runtimes the reporter can join through
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Backend {
    /// Identity exported by the process launcher, see `launcher`
    Launcher,
    /// A real MPI library, only available with the `mpi` feature
    #[cfg(feature = "mpi")]
    Mpi,
}

impl Default for Backend {
    #[cfg(feature = "mpi")]
    fn default() -> Self {
        Backend::Mpi
    }

    #[cfg(not(feature = "mpi"))]
    fn default() -> Self {
        Backend::Launcher
    }
}

impl FromStr for Backend {
    type Err = Fault;

    fn from_str(s: &str) -> Result<Self, Fault> {
        match s.trim().to_ascii_lowercase().as_str() {
            "launcher" => Ok(Backend::Launcher),
            #[cfg(feature = "mpi")]
            "mpi" => Ok(Backend::Mpi),
            _ => Err(Fault::UnknownBackend(s.to_owned())),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Backend::Launcher => f.write_str("launcher"),
            #[cfg(feature = "mpi")]
            Backend::Mpi => f.write_str("mpi"),
        }
    }
}

impl Backend {
    /// Backend requested by the environment of the current process.
    pub fn from_env() -> Result<Self, Fault> {
        Backend::from_value(env::var(BACKEND_VAR).ok().as_deref())
    }

    /// Backend requested by an optional configuration value.
    ///
    /// A missing or empty value selects the default backend.
    pub fn from_value(value: Option<&str>) -> Result<Self, Fault> {
        match value {
            Some(v) if !v.trim().is_empty() => v.parse(),
            _ => Ok(Backend::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_selects_default() {
        assert_eq!(Backend::from_value(None).unwrap(), Backend::default());
        assert_eq!(Backend::from_value(Some("  ")).unwrap(), Backend::default());
    }

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(Backend::from_value(Some("Launcher")).unwrap(), Backend::Launcher);
        assert_eq!("launcher".parse::<Backend>().unwrap().to_string(), "launcher");
    }

    #[test]
    fn unknown_name_is_rejected() {
        match Backend::from_value(Some("tcp")) {
            Err(Fault::UnknownBackend(name)) => assert_eq!(name, "tcp"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[cfg(not(feature = "mpi"))]
    #[test]
    fn mpi_needs_the_feature() {
        assert!(Backend::from_value(Some("mpi")).is_err());
        assert_eq!(Backend::default(), Backend::Launcher);
    }
}
