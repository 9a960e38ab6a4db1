use std::thread::{self, JoinHandle};
use std::time::Duration;

use oneshot::RecvTimeoutError;
use thread_priority::ThreadPriority;
use vsnd_core::device::TxComplete;
use vsnd_core::{Error, Result};

/// A running completion simulator.
///
/// Dropping a session without [`Session::terminate`] still asks the thread to
/// exit, but does not wait for it.
pub struct Session {
    stop: Option<oneshot::Sender<()>>,
    exited: oneshot::Receiver<()>,
    thread: Option<JoinHandle<()>>,
}

impl Session {
    pub fn spawn(tick: Duration, on_complete: TxComplete) -> Result<Session> {
        let (stop_sender, stop_receiver) = oneshot::channel();
        let (exit_sender, exit_receiver) = oneshot::channel();

        let thread = thread::Builder::new()
            .name("vsnd-virtual".into())
            .spawn(move || {
                CompletionThread { tick, on_complete }.run(stop_receiver);
                let _ = exit_sender.send(());
            })
            .map_err(Error::ThreadSpawn)?;

        tracing::debug!(?tick, "completion thread spawned");

        Ok(Session {
            stop: Some(stop_sender),
            exited: exit_receiver,
            thread: Some(thread),
        })
    }

    /// Stops the thread and waits up to `timeout` for it to exit.
    ///
    /// Returns `false` if the thread did not acknowledge in time; it is then
    /// detached and exits on its own.
    ///
    /// Called from the completion thread itself (a framework stopping the
    /// device from its completion callback), this only signals the thread,
    /// which exits once the callback returns.
    pub fn terminate(mut self, timeout: Duration) -> bool {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }

        if self.is_current_thread() {
            self.thread = None;
            tracing::debug!("completion thread stopped from its own callback");
            return true;
        }

        match self.exited.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if let Some(thread) = self.thread.take() {
                    if thread.join().is_err() {
                        tracing::error!("completion thread panicked");
                    }
                }

                tracing::debug!("completion thread exited");
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(?timeout, "completion thread did not exit in time, detaching");
                false
            }
        }
    }

    fn is_current_thread(&self) -> bool {
        self.thread
            .as_ref()
            .is_some_and(|handle| handle.thread().id() == thread::current().id())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

struct CompletionThread {
    tick: Duration,
    on_complete: TxComplete,
}

impl CompletionThread {
    fn run(self, stop: oneshot::Receiver<()>) {
        if let Err(e) = thread_priority::set_current_thread_priority(ThreadPriority::Min) {
            tracing::warn!(?e, "failed to lower completion thread priority");
        }

        loop {
            match stop.recv_timeout(self.tick) {
                Err(RecvTimeoutError::Timeout) => self.on_complete.signal(),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }
}
