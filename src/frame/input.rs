//! Between-frame input hand-off
//!
//! Input handlers write into an [`InputLatch`] whenever the device reports;
//! the scheduler takes exactly one snapshot per frame. Continuous values
//! (joystick, aim) are last-write-wins. Discrete triggers (split, launch) stay
//! latched until a snapshot consumes them, so a press between frames is seen once.

use std::sync::Arc;

use parking_lot::Mutex;

/// Per-game input state that can be latched
pub trait FrameInput: Clone + Default {
    /// Reset one-shot triggers after they were handed to a frame
    fn clear_triggers(&mut self);
}

/// Shared input slot read once per frame
pub struct InputLatch<I> {
    state: Arc<Mutex<I>>,
}

impl<I: FrameInput> InputLatch<I> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(I::default())),
        }
    }

    /// Handle for the input-handling collaborator
    pub fn writer(&self) -> InputWriter<I> {
        InputWriter {
            state: self.state.clone(),
        }
    }

    /// Copy the current input and clear its triggers
    pub fn take_snapshot(&self) -> I {
        let mut state = self.state.lock();
        let snapshot = state.clone();
        state.clear_triggers();
        snapshot
    }

    /// Copy the current input without consuming triggers
    pub fn peek(&self) -> I {
        self.state.lock().clone()
    }
}

impl<I: FrameInput> Default for InputLatch<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable write handle
pub struct InputWriter<I> {
    state: Arc<Mutex<I>>,
}

impl<I> Clone for InputWriter<I> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<I: FrameInput> InputWriter<I> {
    /// Apply an edit to the latched input
    pub fn update(&self, edit: impl FnOnce(&mut I)) {
        let mut state = self.state.lock();
        edit(&mut *state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct TestInput {
        axis: f32,
        fire: bool,
    }

    impl FrameInput for TestInput {
        fn clear_triggers(&mut self) {
            self.fire = false;
        }
    }

    #[test]
    fn test_trigger_is_delivered_once() {
        let latch: InputLatch<TestInput> = InputLatch::new();
        let writer = latch.writer();
        writer.update(|i| i.fire = true);

        assert!(latch.take_snapshot().fire);
        assert!(!latch.take_snapshot().fire);
    }

    #[test]
    fn test_continuous_value_persists_across_snapshots() {
        let latch: InputLatch<TestInput> = InputLatch::new();
        let writer = latch.writer();
        writer.update(|i| i.axis = 0.5);
        writer.update(|i| i.axis = 0.75);

        assert_eq!(latch.take_snapshot().axis, 0.75);
        assert_eq!(latch.take_snapshot().axis, 0.75);
    }

    #[test]
    fn test_peek_keeps_triggers() {
        let latch: InputLatch<TestInput> = InputLatch::new();
        latch.writer().update(|i| i.fire = true);
        assert!(latch.peek().fire);
        assert!(latch.take_snapshot().fire);
    }
}
