//! Prints the rank of the calling process within its distributed run.
//!
//! Run with: mpiexec -n 4 mpi-reporter
use std::io::{self, Write};
use std::process::ExitCode;

use log::debug;

use mpi_reporter::config::Backend;
use mpi_reporter::launcher::Launcher;
use mpi_reporter::reporter::{self, Stage};
use mpi_reporter::Error;

fn report(backend: Backend) -> Result<(), Error> {
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    match backend {
        Backend::Launcher => reporter::run(Launcher::from_env(), &mut stdout, &mut stderr)?,
        #[cfg(feature = "mpi")]
        Backend::Mpi => {
            reporter::run(mpi_reporter::mpi::Mpi::from_env(), &mut stdout, &mut stderr)?
        }
    };
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let outcome = match Backend::from_env() {
        Ok(backend) => {
            debug!("using {} backend", backend);
            // Failures are diagnosed by the reporter itself, before the context is left.
            report(backend)
        }
        Err(fault) => {
            let err = Error::Initialization(fault);
            let _ = writeln!(io::stderr(), "{}", err);
            Err(err)
        }
    };

    Stage::Terminated.enter();
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
