//! Environmental management
//!
//! A participant joins the execution context through a `Runtime`. A successful join produces a
//! `Context` that is held by a `Universe` for as long as it is needed. Dropping the `Universe`
//! leaves the context again, so every exit path after a successful join leaves exactly once,
//! and a failed join never leaves at all.
use log::{debug, trace};

use crate::error::{Error, Fault, Result};
use crate::topology::Rank;

/// Something that can establish an execution context.
pub trait Runtime {
    /// The context established by a successful join
    type Context: Context;

    /// Name of the runtime, used in diagnostics
    fn name(&self) -> &'static str;

    /// Join the execution context.
    fn join(self) -> std::result::Result<Self::Context, Fault>;
}

/// An established execution context.
pub trait Context {
    /// Number of participants in this context
    fn size(&self) -> std::result::Result<Rank, Fault>;

    /// The `Rank` that identifies the calling participant within this context
    fn rank(&self) -> std::result::Result<Rank, Fault>;

    /// Names the processor that the calling participant is running on.
    fn processor_name(&self) -> std::result::Result<String, Fault>;

    /// Leave the context.
    ///
    /// Must be idempotent. Only the first call releases anything.
    fn leave(&mut self);
}

/// Global context
///
/// Holds a joined execution context and leaves it when dropped.
pub struct Universe<C: Context> {
    context: C,
    left: bool,
}

impl<C: Context> Universe<C> {
    /// The 'world' context
    ///
    /// Contains all participants of the run.
    pub fn world(&self) -> &C {
        &self.context
    }

    /// Leave the context before the `Universe` goes out of scope.
    pub fn finalize(&mut self) {
        if !self.left {
            trace!("leaving execution context");
            self.context.leave();
            self.left = true;
        }
    }
}

impl<C: Context> Drop for Universe<C> {
    fn drop(&mut self) {
        self.finalize();
    }
}

/// Initialize the execution context.
///
/// Joins through `runtime` and returns a `Universe` holding the context. A failed join maps to
/// `Error::Initialization`.
pub fn initialize<R: Runtime>(runtime: R) -> Result<Universe<R::Context>> {
    debug!("joining execution context through {} runtime", runtime.name());
    let context = runtime.join().map_err(Error::Initialization)?;
    Ok(Universe {
        context,
        left: false,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    struct Counting {
        leaves: Rc<Cell<usize>>,
    }

    impl Context for Counting {
        fn size(&self) -> std::result::Result<Rank, Fault> {
            Ok(1)
        }

        fn rank(&self) -> std::result::Result<Rank, Fault> {
            Ok(0)
        }

        fn processor_name(&self) -> std::result::Result<String, Fault> {
            Ok(String::from("localhost"))
        }

        fn leave(&mut self) {
            self.leaves.set(self.leaves.get() + 1);
        }
    }

    struct CountingRuntime {
        leaves: Rc<Cell<usize>>,
        fail: bool,
    }

    impl Runtime for CountingRuntime {
        type Context = Counting;

        fn name(&self) -> &'static str {
            "counting"
        }

        fn join(self) -> std::result::Result<Counting, Fault> {
            if self.fail {
                Err(Fault::Code(1))
            } else {
                Ok(Counting {
                    leaves: self.leaves,
                })
            }
        }
    }

    fn runtime(fail: bool) -> (CountingRuntime, Rc<Cell<usize>>) {
        let leaves = Rc::new(Cell::new(0));
        let runtime = CountingRuntime {
            leaves: leaves.clone(),
            fail,
        };
        (runtime, leaves)
    }

    #[test]
    fn drop_leaves_once() {
        let (runtime, leaves) = runtime(false);
        let universe = initialize(runtime).unwrap();
        assert_eq!(universe.world().size().unwrap(), 1);
        assert_eq!(leaves.get(), 0);
        drop(universe);
        assert_eq!(leaves.get(), 1);
    }

    #[test]
    fn finalize_is_idempotent() {
        let (runtime, leaves) = runtime(false);
        let mut universe = initialize(runtime).unwrap();
        universe.finalize();
        universe.finalize();
        drop(universe);
        assert_eq!(leaves.get(), 1);
    }

    #[test]
    fn failed_join_never_leaves() {
        let (runtime, leaves) = runtime(true);
        match initialize(runtime) {
            Err(Error::Initialization(Fault::Code(1))) => {}
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("join should have failed"),
        }
        assert_eq!(leaves.get(), 0);
    }
}
