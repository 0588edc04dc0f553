//! Spawn-join for benchmark workers.
//!
//! Most stores are passive and are fine with [`std::thread`], which is what [`DefaultThread`]
//! wraps. A store that runs its own executor can return a different [`Thread`] from
//! [`crate::Store::thread`], and the harness will spawn, pin and join its workers through it.
//!
//! Workers never return a value: everything they measure goes into shared per-worker slots.

/// A join handle returned by [`Thread::spawn`].
pub trait JoinHandle {
    /// Join the thread, consume the boxed self.
    fn join(self: Box<Self>);
}

/// A thread management abstraction.
pub trait Thread: Send {
    /// Spawn a new thread running a boxed closure.
    fn spawn(&self, f: Box<dyn FnOnce() + Send>) -> Box<dyn JoinHandle>;

    /// Pin the current thread to a CPU core. `core` wraps around the available cores.
    fn pin(&self, core: usize);
}

/// A zero-sized wrapper for [`std::thread`] functions.
#[derive(Clone, Debug)]
pub struct DefaultThread;

/// A wrapper for [`std::thread::JoinHandle`].
pub struct DefaultJoinHandle(std::thread::JoinHandle<()>);

impl JoinHandle for DefaultJoinHandle {
    fn join(self: Box<Self>) {
        if let Err(e) = self.0.join() {
            std::panic::resume_unwind(e);
        }
    }
}

impl Thread for DefaultThread {
    fn spawn(&self, f: Box<dyn FnOnce() + Send>) -> Box<dyn JoinHandle> {
        Box::new(DefaultJoinHandle(std::thread::spawn(f)))
    }

    fn pin(&self, core: usize) {
        match core_affinity::get_core_ids() {
            Some(cores) if !cores.is_empty() => {
                if !core_affinity::set_for_current(cores[core % cores.len()]) {
                    log::warn!("failed to pin worker to core {}", core);
                }
            }
            _ => log::warn!("core ids unavailable, worker {} not pinned", core),
        }
    }
}
