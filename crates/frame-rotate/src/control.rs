use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::RotationAngle;

/// Shared, lock-free handle to the currently selected rotation.
///
/// Clones observe the same value. Writers (UI, stdin, config reload) call
/// [`RotationControl::set`]; the frame path calls [`RotationControl::get`]
/// exactly once per frame.
#[derive(Clone, Debug, Default)]
pub struct RotationControl {
    turns: Arc<AtomicU8>,
}

impl RotationControl {
    pub fn new(angle: RotationAngle) -> Self {
        Self {
            turns: Arc::new(AtomicU8::new(angle.quarter_turns())),
        }
    }

    pub fn get(&self) -> RotationAngle {
        RotationAngle::from_quarter_turns(self.turns.load(Ordering::Acquire))
    }

    /// Store a new angle and return the previous one.
    pub fn set(&self, angle: RotationAngle) -> RotationAngle {
        let prev = self.turns.swap(angle.quarter_turns(), Ordering::AcqRel);
        RotationAngle::from_quarter_turns(prev)
    }
}
