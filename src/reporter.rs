//! Reporting the identity of a participant
//!
//! `run()` joins the execution context, asks for the size, the rank and the processor name, in
//! that order, writes one greeting line and leaves the context again. A failure is written to the
//! diagnostic sink while the context is still held, and only then is the context left.
//!
//! # Examples
//!
//! ```
//! use mpi_reporter::launcher::Launcher;
//! use mpi_reporter::reporter;
//!
//! let runtime = Launcher::from_lookup(|_| None);
//! let (mut out, mut diag) = (Vec::new(), Vec::new());
//! let report = reporter::run(runtime, &mut out, &mut diag).unwrap();
//! assert_eq!(report.rank, 0);
//! assert_eq!(String::from_utf8(out).unwrap(), "Hello, I am rank 0 of 1 total ranks\n");
//! assert!(diag.is_empty());
//! ```
use std::fmt;
use std::io::Write;

use log::{debug, trace};

use crate::environment::{self, Context, Runtime};
use crate::error::{Error, Query, Result};
use crate::topology::{self, Rank};

/// Progress of a single run, in the order the states are entered
///
/// A failed query skips straight to `ContextLeft`, a failed join straight to `Terminated`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Stage {
    /// Nothing has happened yet
    NotStarted,
    /// The execution context is established
    ContextJoined,
    /// The number of participants is known
    SizeKnown,
    /// The own rank is known
    RankKnown,
    /// The processor name is known
    NameKnown,
    /// The greeting has been written
    Reported,
    /// The execution context has been left
    ContextLeft,
    /// The process is about to exit
    Terminated,
}

impl Stage {
    /// Record that this stage has been entered.
    pub fn enter(self) {
        trace!("reporter stage: {:?}", self);
    }
}

/// What a participant found out about itself
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Report {
    /// Rank of this participant
    pub rank: Rank,
    /// Number of participants
    pub size: Rank,
    /// Name of the host this participant runs on
    pub processor_name: String,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hello, I am rank {} of {} total ranks", self.rank, self.size)
    }
}

/// Writes the one-line diagnostic for `err`.
///
/// A diagnostic that cannot be written is dropped, the exit status still tells.
fn diagnose<E: Write>(diag: &mut E, err: &Error) {
    let _ = writeln!(diag, "{}", err);
    let _ = diag.flush();
}

/// Asks an established context who the caller is and writes the greeting.
fn greet<C: Context, W: Write>(world: &C, out: &mut W) -> Result<Report> {
    let size = world
        .size()
        .and_then(topology::check_size)
        .map_err(|e| Error::query(Query::Size, e))?;
    Stage::SizeKnown.enter();

    let rank = world
        .rank()
        .and_then(|rank| topology::check_rank(rank, size))
        .map_err(|e| Error::query(Query::Rank, e))?;
    Stage::RankKnown.enter();

    let processor_name = world
        .processor_name()
        .map_err(|e| Error::query(Query::Name, e))?;
    Stage::NameKnown.enter();
    debug!("rank {} runs on {}", rank, processor_name);

    let report = Report {
        rank,
        size,
        processor_name,
    };
    writeln!(out, "{}", report)?;
    out.flush()?;
    Stage::Reported.enter();
    Ok(report)
}

/// Report the identity of the calling participant to `out`.
///
/// On failure one line goes to `diag` before the context is left. The context is left before
/// this returns whenever the join succeeded, on success as well as on failure. A failed join
/// leaves nothing.
pub fn run<R, W, E>(runtime: R, out: &mut W, diag: &mut E) -> Result<Report>
where
    R: Runtime,
    W: Write,
    E: Write,
{
    Stage::NotStarted.enter();
    let mut universe = environment::initialize(runtime).map_err(|err| {
        diagnose(diag, &err);
        err
    })?;
    Stage::ContextJoined.enter();

    let result = greet(universe.world(), out);
    if let Err(ref err) = result {
        diagnose(diag, err);
    }

    universe.finalize();
    Stage::ContextLeft.enter();
    result
}
