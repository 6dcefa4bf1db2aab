// src/supervisor/registry.rs

use std::sync::{Mutex, MutexGuard};

use tracing::trace;

use super::process::ProcessHandle;
use super::Generation;

#[derive(Debug, Default)]
struct RunState {
    current: Generation,
    process: Option<ProcessHandle>,
}

/// Result of advancing the registry.
#[derive(Debug)]
pub struct Advance {
    /// The freshly created generation; it is now the current one.
    pub generation: Generation,
    /// Process of the previous generation, if it was still registered. The
    /// caller owns it from here on and is expected to kill it.
    pub previous: Option<ProcessHandle>,
}

/// Single source of truth for which generation may touch the output buffer.
///
/// Every method holds the lock for the duration of the call only. Nothing in
/// here performs subprocess I/O; the closures passed to [`gate`] and
/// [`try_advance_with`] must be short buffer operations. A buffer whose
/// writer can block (see [`OutputBuffer`]) stalls every other caller for as
/// long as it blocks.
///
/// [`OutputBuffer`]: crate::buffer::OutputBuffer
/// [`gate`]: Registry::gate
/// [`try_advance_with`]: Registry::try_advance_with
#[derive(Debug, Default)]
pub struct Registry {
    state: Mutex<RunState>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Move to a new generation and hand over the previous process.
    pub fn advance(&self) -> Advance {
        let mut state = self.lock();
        Self::advance_locked(&mut state)
    }

    /// Run `prepare` and then advance, inside one critical section.
    ///
    /// If `prepare` fails nothing is advanced and the error is returned.
    pub fn try_advance_with<T, E>(
        &self,
        prepare: impl FnOnce() -> Result<T, E>,
    ) -> Result<(Advance, T), E> {
        let mut state = self.lock();
        let value = prepare()?;
        Ok((Self::advance_locked(&mut state), value))
    }

    fn advance_locked(state: &mut RunState) -> Advance {
        state.current = state.current.next();
        let previous = state.process.take();
        trace!(generation = %state.current, had_previous = previous.is_some(), "advanced");
        Advance {
            generation: state.current,
            previous,
        }
    }

    /// Register `handle` as the running process of `id`.
    ///
    /// If `id` is no longer current the handle is given back; the caller lost
    /// the race and must kill its process itself.
    pub fn set_process(&self, id: Generation, handle: ProcessHandle) -> Result<(), ProcessHandle> {
        let mut state = self.lock();
        if state.current != id {
            return Err(handle);
        }
        state.process = Some(handle);
        Ok(())
    }

    pub fn is_current(&self, id: Generation) -> bool {
        self.lock().current == id
    }

    pub fn current(&self) -> Generation {
        self.lock().current
    }

    /// Forget the process of `id` if it is still current. Returns whether it
    /// was current.
    pub fn mark_done(&self, id: Generation) -> bool {
        let mut state = self.lock();
        if state.current != id {
            return false;
        }
        state.process = None;
        true
    }

    /// Run `f` under the lock if and only if `id` is current.
    ///
    /// No newer generation can be created while `f` runs, so a write made
    /// from here can never land after a newer run cleared the buffer.
    pub fn gate<R>(&self, id: Generation, f: impl FnOnce() -> R) -> Option<R> {
        let state = self.lock();
        if state.current != id {
            return None;
        }
        let out = f();
        drop(state);
        Some(out)
    }

    /// Whether a process is registered for the current generation.
    pub fn has_process(&self) -> bool {
        self.lock().process.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn handle(id: Generation) -> ProcessHandle {
        ProcessHandle::new(id, None).0
    }

    #[test]
    fn advance_hands_over_previous_process_once() {
        let reg = Registry::new();
        let first = reg.advance();
        assert!(first.previous.is_none());
        reg.set_process(first.generation, handle(first.generation)).unwrap();

        let second = reg.advance();
        assert_eq!(second.previous.map(|h| h.generation()), Some(first.generation));
        assert!(!reg.has_process());

        let third = reg.advance();
        assert!(third.previous.is_none());
    }

    #[test]
    fn set_process_rejects_stale_generation() {
        let reg = Registry::new();
        let old = reg.advance().generation;
        let _new = reg.advance().generation;

        let returned = reg.set_process(old, handle(old)).unwrap_err();
        assert_eq!(returned.generation(), old);
        assert!(!reg.has_process());
    }

    #[test]
    fn mark_done_is_idempotent_and_ignores_stale() {
        let reg = Registry::new();
        let id = reg.advance().generation;
        reg.set_process(id, handle(id)).unwrap();

        assert!(reg.mark_done(id));
        assert!(!reg.has_process());
        assert!(reg.mark_done(id));
        assert!(!reg.has_process());

        let newer = reg.advance().generation;
        reg.set_process(newer, handle(newer)).unwrap();
        assert!(!reg.mark_done(id));
        assert!(reg.has_process(), "stale mark_done must not clear newer process");
    }

    #[test]
    fn gate_runs_only_for_current() {
        let reg = Registry::new();
        let id = reg.advance().generation;
        assert_eq!(reg.gate(id, || 7), Some(7));
        reg.advance();
        let mut ran = false;
        assert_eq!(reg.gate(id, || ran = true), None);
        assert!(!ran);
    }

    #[test]
    fn failed_prepare_does_not_advance() {
        let reg = Registry::new();
        let before = reg.advance().generation;
        let res: Result<(Advance, ()), &str> = reg.try_advance_with(|| Err("unreadable"));
        assert!(res.is_err());
        assert_eq!(reg.current(), before);

        let (adv, cmd) = reg.try_advance_with(|| Ok::<_, ()>("echo")).unwrap();
        assert!(adv.generation > before);
        assert_eq!(cmd, "echo");
    }

    proptest! {
        #[test]
        fn advances_are_strictly_increasing(n in 1usize..200) {
            let reg = Registry::new();
            let mut last = reg.current();
            for _ in 0..n {
                let next = reg.advance().generation;
                prop_assert!(next > last);
                prop_assert!(reg.is_current(next));
                prop_assert!(!reg.is_current(last));
                last = next;
            }
        }
    }
}
