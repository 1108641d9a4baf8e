//! Runtime backed by an MPI library
//!
//! Joining calls `MPI_Init`, leaving calls `MPI_Finalize`. All queries go to `MPI_COMM_WORLD`.
//!
//! # Standard section(s)
//!
//! 6.4.1, 8.1.1, 8.7
use std::ffi::{CString, OsString};
use std::os::raw::{c_char, c_int};
use std::ptr;

use conv::ConvUtil;
use log::debug;

use crate::environment::{Context, Runtime};
use crate::error::Fault;
use crate::ffi;
use crate::topology::{self, Rank};

/// MPI_SUCCESS constant, cast as a c_int here for easier checking of MPI return values
pub const MPI_SUCCESS: c_int = ffi::MPI_SUCCESS as c_int;

fn check(code: c_int) -> Result<(), Fault> {
    if code == MPI_SUCCESS {
        Ok(())
    } else {
        Err(Fault::Code(code))
    }
}

/// Whether the MPI library has been initialized
fn is_initialized() -> bool {
    let mut res: c_int = 0;
    unsafe {
        ffi::MPI_Initialized(&mut res);
    }
    res != 0
}

/// Whether the MPI library has been finalized
fn is_finalized() -> bool {
    let mut res: c_int = 0;
    unsafe {
        ffi::MPI_Finalized(&mut res);
    }
    res != 0
}

/// Converts an argument count into a C `argc`.
fn argc(count: usize) -> Result<c_int, Fault> {
    count.value_as().map_err(|_| Fault::TooManyArgs(count))
}

/// Joins the MPI world with the given command line.
pub struct Mpi {
    args: Vec<OsString>,
}

impl Mpi {
    /// Pass the command line of the current process to `MPI_Init`.
    pub fn from_env() -> Self {
        Mpi::with_args(std::env::args_os())
    }

    /// Pass `args` to `MPI_Init`, unexamined.
    pub fn with_args<I: IntoIterator<Item = OsString>>(args: I) -> Self {
        Mpi {
            args: args.into_iter().collect(),
        }
    }
}

impl Runtime for Mpi {
    type Context = MpiContext;

    fn name(&self) -> &'static str {
        "mpi"
    }

    fn join(self) -> Result<MpiContext, Fault> {
        if is_initialized() {
            return Err(Fault::AlreadyInitialized);
        }
        if let Some(version) = option_env!("MPI_REPORTER_MPI_VERSION") {
            debug!("built against MPI library version {}", version);
        }

        // Arguments with interior NUL bytes cannot be passed through a C argv.
        let args: Vec<CString> = self
            .args
            .iter()
            .filter_map(|arg| CString::new(arg.as_encoded_bytes().to_vec()).ok())
            .collect();
        let mut argv: Vec<*mut c_char> = args.iter().map(|a| a.as_ptr() as *mut c_char).collect();
        argv.push(ptr::null_mut());
        let mut argc = argc(args.len())?;
        let mut argv_ptr = argv.as_mut_ptr();

        check(unsafe { ffi::MPI_Init(&mut argc, &mut argv_ptr) })?;

        let mut context = MpiContext {
            _args: args,
            _argv: argv,
            left: false,
        };
        // Queries report failures through return codes instead of aborting the process.
        if let Err(fault) = check(unsafe {
            ffi::MPI_Comm_set_errhandler(ffi::RSMPI_COMM_WORLD, ffi::RSMPI_ERRORS_RETURN)
        }) {
            context.leave();
            return Err(fault);
        }
        Ok(context)
    }
}

/// Context established by `MPI_Init`
pub struct MpiContext {
    // MPI implementations may hold on to argv after `MPI_Init` returns.
    _args: Vec<CString>,
    _argv: Vec<*mut c_char>,
    left: bool,
}

impl Context for MpiContext {
    fn size(&self) -> Result<Rank, Fault> {
        let mut res: Rank = 0;
        check(unsafe { ffi::MPI_Comm_size(ffi::RSMPI_COMM_WORLD, &mut res) })?;
        Ok(res)
    }

    fn rank(&self) -> Result<Rank, Fault> {
        let mut res: Rank = 0;
        check(unsafe { ffi::MPI_Comm_rank(ffi::RSMPI_COMM_WORLD, &mut res) })?;
        Ok(res)
    }

    fn processor_name(&self) -> Result<String, Fault> {
        let bufsize = unsafe { ffi::RSMPI_MAX_PROCESSOR_NAME }
            .value_as::<usize>()
            .unwrap_or(topology::MAX_PROCESSOR_NAME);
        let mut buf = vec![0u8; bufsize];
        let mut len: c_int = 0;

        check(unsafe { ffi::MPI_Get_processor_name(buf.as_mut_ptr() as *mut c_char, &mut len) })?;
        buf.truncate(len.value_as::<usize>().unwrap_or(0));
        topology::bound_name(String::from_utf8(buf)?)
    }

    fn leave(&mut self) {
        if self.left {
            return;
        }
        self.left = true;
        if !is_finalized() {
            unsafe {
                ffi::MPI_Finalize();
            }
        }
    }
}
