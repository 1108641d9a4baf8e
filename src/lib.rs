#![deny(missing_docs)]
#![warn(missing_copy_implementations)]
#![warn(trivial_casts)]
#![warn(trivial_numeric_casts)]
#![warn(unused_extern_crates)]
#![warn(unused_import_braces)]
#![warn(unused_qualifications)]

//! Rank reporting for distributed runs
//!
//! Every participant of a distributed run joins the execution context, finds out its rank, the
//! number of participants and the host it runs on, prints a greeting and leaves the context
//! again:
//!
//! ```text
//! $ mpiexec -n 2 mpi-reporter
//! Hello, I am rank 0 of 2 total ranks
//! Hello, I am rank 1 of 2 total ranks
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use mpi_reporter::launcher::Launcher;
//!
//! let mut stdout = std::io::stdout().lock();
//! let mut stderr = std::io::stderr().lock();
//! if let Ok(report) = mpi_reporter::reporter::run(Launcher::from_env(), &mut stdout, &mut stderr) {
//!     assert!(report.rank < report.size);
//! }
//! ```
//!
//! # Runtimes
//!
//! The execution context is provided by a `Runtime`:
//!
//! - `launcher::Launcher` reads the identity that `mpirun`, `mpiexec` or `srun` export into the
//!   environment and needs no MPI library at all.
//! - `mpi::Mpi` (feature `mpi`) goes through `MPI_Init`, `MPI_Comm_size`, `MPI_Comm_rank`,
//!   `MPI_Get_processor_name` and `MPI_Finalize` of the system MPI library.
//!
//! Which one the binary uses is decided by `config::Backend`.

/// The raw C language MPI API
#[cfg(feature = "mpi")]
#[allow(missing_docs)]
pub mod ffi;

pub mod config;
pub mod environment;
pub mod error;
pub mod launcher;
#[cfg(feature = "mpi")]
pub mod mpi;
pub mod reporter;
pub mod topology;

pub use crate::environment::initialize;
pub use crate::error::{Error, Result};

/// Traits needed to drive a runtime
pub mod traits {
    pub use crate::environment::{Context, Runtime};
}
