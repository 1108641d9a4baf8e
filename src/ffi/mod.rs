//! The raw C language MPI API
//!
//! Documented in the [Message Passing Interface specification][spec]
//!
//! [spec]: http://www.mpi-forum.org/docs/docs.html
pub use mpi_sys::*;
