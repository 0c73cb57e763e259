//! Active-Effect Stack
//!
//! The stack tracks which effect is currently running, so that reads
//! performed during a run are attributed to the right effect.
//!
//! # Implementation
//!
//! Each runtime owns one stack. When an effect starts running it is pushed;
//! when the run ends it is popped, restoring whatever was active before.
//! The top of the stack is the currently-active effect, and an empty stack
//! means reads record no dependency at all.
//!
//! A stack (rather than a single slot) keeps nested and re-entrant runs
//! well-defined: an effect whose body runs another effect gets its own
//! context back once the inner run completes.

use parking_lot::Mutex;

use super::effect::EffectId;

/// The stack of currently running effects, owned by a runtime.
#[derive(Debug, Default)]
pub(crate) struct ActiveEffectStack {
    stack: Mutex<Vec<EffectId>>,
}

impl ActiveEffectStack {
    /// Push an effect as it starts running.
    pub(crate) fn push(&self, effect: EffectId) {
        self.stack.lock().push(effect);
    }

    /// Pop the most recently pushed effect, returning it.
    ///
    /// Callers verify the popped entry matches the run that is ending; a
    /// mismatch indicates unbalanced push/pop and is caught by a debug
    /// assertion at the call site.
    pub(crate) fn pop(&self) -> Option<EffectId> {
        self.stack.lock().pop()
    }

    /// Get the currently active effect, if any.
    pub(crate) fn current(&self) -> Option<EffectId> {
        self.stack.lock().last().copied()
    }

    /// Check whether any effect is currently running.
    pub(crate) fn is_active(&self) -> bool {
        !self.stack.lock().is_empty()
    }
}
