//! Runtime backed by the process launcher's environment.
//!
//! Launchers such as `mpirun`, `mpiexec` and `srun` export the identity of every process they
//! start through environment variables. This runtime reads those variables instead of talking to
//! an MPI library. A process started without a launcher runs as a singleton, rank 0 of 1, the
//! same way MPI treats it.
//!
//! # Environment Variables
//!
//! | Launcher | Rank | Size |
//! |----------|------|------|
//! | Open MPI | `OMPI_COMM_WORLD_RANK` | `OMPI_COMM_WORLD_SIZE` |
//! | MPICH Hydra (PMI) | `PMI_RANK` | `PMI_SIZE` |
//! | Slurm | `SLURM_PROCID` | `SLURM_STEP_NUM_TASKS` |
//!
//! Launchers are checked in this order and the first one with either variable set wins.
//!
//! Slurm also exports `SLURM_PROCID` and the job-wide `SLURM_NTASKS` into an `sbatch` script.
//! A binary run straight from that script is a single process, so the Slurm scheme only applies
//! inside a job step started by `srun`, which is what `SLURM_STEP_NUM_TASKS` marks.

use std::env;
use std::ffi::OsString;

use conv::ConvUtil;
use log::debug;

use crate::environment::{Context, Runtime};
use crate::error::Fault;
use crate::topology::{self, Rank};

/// Environment variables exported by one kind of launcher
#[derive(Copy, Clone, Debug)]
pub struct Scheme {
    /// Human readable name of the launcher
    pub name: &'static str,
    /// Variable holding the rank
    pub rank: &'static str,
    /// Variable holding the size
    pub size: &'static str,
    /// Variable that must be set for the scheme to apply at all
    pub requires: Option<&'static str>,
}

/// Known launchers, in the order they are checked
pub const SCHEMES: [Scheme; 3] = [
    Scheme {
        name: "Open MPI",
        rank: "OMPI_COMM_WORLD_RANK",
        size: "OMPI_COMM_WORLD_SIZE",
        requires: None,
    },
    Scheme {
        name: "PMI",
        rank: "PMI_RANK",
        size: "PMI_SIZE",
        requires: None,
    },
    Scheme {
        name: "Slurm",
        rank: "SLURM_PROCID",
        size: "SLURM_STEP_NUM_TASKS",
        requires: Some("SLURM_STEP_NUM_TASKS"),
    },
];

#[derive(Debug)]
struct Detected {
    scheme: Scheme,
    rank: Option<String>,
    size: Option<String>,
}

/// Reads the participant identity exported by a launcher.
pub struct Launcher {
    detected: Option<Detected>,
    hostname: fn() -> OsString,
}

impl Launcher {
    /// Inspect the environment of the current process.
    pub fn from_env() -> Self {
        Launcher::from_lookup(|key| env::var(key).ok())
    }

    /// Inspect an environment given as a lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let detected = SCHEMES.iter().find_map(|scheme| {
            if let Some(var) = scheme.requires {
                lookup(var)?;
            }
            let rank = lookup(scheme.rank);
            let size = lookup(scheme.size);
            if rank.is_none() && size.is_none() {
                None
            } else {
                Some(Detected {
                    scheme: *scheme,
                    rank,
                    size,
                })
            }
        });
        Launcher {
            detected,
            hostname: gethostname::gethostname,
        }
    }

    /// Replace the source of the host name.
    pub fn with_hostname(mut self, hostname: fn() -> OsString) -> Self {
        self.hostname = hostname;
        self
    }

    /// Name of the detected launcher, `None` for a singleton
    pub fn scheme(&self) -> Option<&'static str> {
        self.detected.as_ref().map(|d| d.scheme.name)
    }
}

/// Parses a launcher variable as a non-negative `Rank`.
fn parse_var(var: &'static str, value: &str) -> Result<Rank, Fault> {
    let invalid = || Fault::InvalidVar {
        var,
        value: value.to_owned(),
    };
    let n: u64 = value.trim().parse().map_err(|_| invalid())?;
    n.value_as::<Rank>().map_err(|_| invalid())
}

impl Runtime for Launcher {
    type Context = LauncherContext;

    fn name(&self) -> &'static str {
        "launcher"
    }

    fn join(self) -> Result<LauncherContext, Fault> {
        let (rank, size) = match self.detected {
            None => {
                debug!("no launcher detected, running as a singleton");
                (0, 1)
            }
            Some(Detected {
                scheme,
                rank: Some(rank),
                size: Some(size),
            }) => {
                debug!("detected {} launcher", scheme.name);
                let rank = parse_var(scheme.rank, &rank)?;
                let size = parse_var(scheme.size, &size)?;
                if size == 0 {
                    return Err(Fault::InvalidVar {
                        var: scheme.size,
                        value: size.to_string(),
                    });
                }
                (rank, size)
            }
            Some(Detected {
                scheme, rank: None, ..
            }) => {
                return Err(Fault::MissingVar {
                    present: scheme.size,
                    missing: scheme.rank,
                })
            }
            Some(Detected { scheme, .. }) => {
                return Err(Fault::MissingVar {
                    present: scheme.rank,
                    missing: scheme.size,
                })
            }
        };
        Ok(LauncherContext {
            rank,
            size,
            hostname: self.hostname,
            joined: true,
        })
    }
}

/// Context established by the `Launcher` runtime
#[derive(Debug)]
pub struct LauncherContext {
    rank: Rank,
    size: Rank,
    hostname: fn() -> OsString,
    joined: bool,
}

impl LauncherContext {
    /// Whether the context has not been left yet
    pub fn is_joined(&self) -> bool {
        self.joined
    }
}

impl Context for LauncherContext {
    fn size(&self) -> Result<Rank, Fault> {
        Ok(self.size)
    }

    fn rank(&self) -> Result<Rank, Fault> {
        Ok(self.rank)
    }

    fn processor_name(&self) -> Result<String, Fault> {
        let name = (self.hostname)();
        let name = String::from_utf8(name.as_encoded_bytes().to_vec())?;
        topology::bound_name(name)
    }

    fn leave(&mut self) {
        self.joined = false;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn launcher(vars: &[(&str, &str)]) -> Launcher {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Launcher::from_lookup(move |key| env.get(key).cloned())
    }

    #[test]
    fn singleton_without_launcher() {
        let runtime = launcher(&[]);
        assert_eq!(runtime.scheme(), None);
        let context = runtime.join().unwrap();
        assert_eq!(context.rank().unwrap(), 0);
        assert_eq!(context.size().unwrap(), 1);
    }

    #[test]
    fn reads_open_mpi_variables() {
        let runtime = launcher(&[("OMPI_COMM_WORLD_RANK", "2"), ("OMPI_COMM_WORLD_SIZE", "4")]);
        assert_eq!(runtime.scheme(), Some("Open MPI"));
        let context = runtime.join().unwrap();
        assert_eq!(context.rank().unwrap(), 2);
        assert_eq!(context.size().unwrap(), 4);
    }

    #[test]
    fn open_mpi_wins_over_slurm() {
        // mpirun inside an allocation still sees the Slurm variables of the job step.
        let runtime = launcher(&[
            ("SLURM_PROCID", "0"),
            ("SLURM_STEP_NUM_TASKS", "1"),
            ("OMPI_COMM_WORLD_RANK", "5"),
            ("OMPI_COMM_WORLD_SIZE", "8"),
        ]);
        let context = runtime.join().unwrap();
        assert_eq!(context.rank().unwrap(), 5);
        assert_eq!(context.size().unwrap(), 8);
    }

    #[test]
    fn half_configured_launcher_fails_to_join() {
        let err = launcher(&[("PMI_RANK", "1")]).join().unwrap_err();
        assert!(matches!(
            err,
            Fault::MissingVar {
                present: "PMI_RANK",
                missing: "PMI_SIZE"
            }
        ));

        let err = launcher(&[("SLURM_STEP_NUM_TASKS", "3")]).join().unwrap_err();
        assert!(matches!(
            err,
            Fault::MissingVar {
                present: "SLURM_STEP_NUM_TASKS",
                missing: "SLURM_PROCID"
            }
        ));
    }

    #[test]
    fn reads_slurm_step_variables() {
        let runtime = launcher(&[
            ("SLURM_JOB_ID", "4711"),
            ("SLURM_NTASKS", "8"),
            ("SLURM_PROCID", "3"),
            ("SLURM_STEP_ID", "0"),
            ("SLURM_STEP_NUM_TASKS", "4"),
        ]);
        assert_eq!(runtime.scheme(), Some("Slurm"));
        let context = runtime.join().unwrap();
        assert_eq!(context.rank().unwrap(), 3);
        assert_eq!(context.size().unwrap(), 4);
    }

    #[test]
    fn batch_script_without_step_is_a_singleton() {
        // What a binary sees when an sbatch script runs it without srun.
        let runtime = launcher(&[
            ("SLURM_JOB_ID", "4711"),
            ("SLURM_NTASKS", "4"),
            ("SLURM_PROCID", "0"),
        ]);
        assert_eq!(runtime.scheme(), None);
        let context = runtime.join().unwrap();
        assert_eq!(context.rank().unwrap(), 0);
        assert_eq!(context.size().unwrap(), 1);
    }

    #[test]
    fn garbage_values_fail_to_join() {
        for (rank, size) in [("x", "2"), ("1", "two"), ("-1", "2"), ("0", "99999999999")] {
            let err = launcher(&[("PMI_RANK", rank), ("PMI_SIZE", size)])
                .join()
                .unwrap_err();
            assert!(matches!(err, Fault::InvalidVar { .. }), "{} of {}", rank, size);
        }
    }

    #[test]
    fn empty_world_fails_to_join() {
        let err = launcher(&[("PMI_RANK", "0"), ("PMI_SIZE", "0")])
            .join()
            .unwrap_err();
        assert!(matches!(err, Fault::InvalidVar { var: "PMI_SIZE", .. }));
    }

    #[test]
    fn processor_name_is_the_hostname() {
        let context = launcher(&[])
            .with_hostname(|| OsString::from("node042"))
            .join()
            .unwrap();
        assert_eq!(context.processor_name().unwrap(), "node042");
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_hostname_is_a_fault() {
        use std::os::unix::ffi::OsStringExt;

        let context = launcher(&[])
            .with_hostname(|| OsString::from_vec(vec![0x6e, 0xff, 0x6e]))
            .join()
            .unwrap();
        assert!(matches!(context.processor_name(), Err(Fault::Utf8(_))));
    }

    #[test]
    fn leave_is_idempotent() {
        let mut context = launcher(&[]).join().unwrap();
        assert!(context.is_joined());
        context.leave();
        context.leave();
        assert!(!context.is_joined());
    }
}
