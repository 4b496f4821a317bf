//=========================================================================
// Input Buffer
//
// Collects engine input events between two event-loop wake-ups on the
// window thread, then hands them over as one batch.
//
// Responsibilities:
// - Keep discrete events (keys, buttons, controllers) in arrival order
// - Drop consecutive duplicate discrete events
// - Coalesce continuous events (cursor, scroll, enter/leave): last wins
//
// Notes:
// A batch lists discrete events first, then the coalesced continuous ones.
// Storage is reused between batches.
//=========================================================================

//=== Standard Library Imports ============================================
use std::collections::HashSet;

//=== Internal Modules ====================================================
use crate::core::input::InputEvent;

//=== InputBuffer Struct ==================================================
pub(crate) struct InputBuffer {
    discrete: Vec<InputEvent>,
    continuous: HashSet<InputEvent>,
}

impl InputBuffer {
    //--- Construction -----------------------------------------------------
    pub(crate) fn new() -> Self {
        const DISCRETE_BASE: usize = 64;
        const CONTINUOUS_BASE: usize = 4;

        Self {
            discrete: Vec::with_capacity(DISCRETE_BASE),
            continuous: HashSet::with_capacity(CONTINUOUS_BASE),
        }
    }

    //--- Event Intake -----------------------------------------------------

    /// Routes `event` to the discrete or continuous store.
    pub(crate) fn push(&mut self, event: InputEvent) {
        if event.is_continuous() {
            self.push_continuous(event);
        } else {
            self.push_discrete(event);
        }
    }

    /// The latest event of a kind replaces any earlier one.
    pub(crate) fn push_continuous(&mut self, event: InputEvent) {
        self.continuous.replace(event);
    }

    /// Appends unless identical to the previous discrete event.
    pub(crate) fn push_discrete(&mut self, event: InputEvent) {
        if self.discrete.last() != Some(&event) {
            self.discrete.push(event);
        }
    }

    //--- Drain ------------------------------------------------------------

    /// Takes the current batch, or `None` if nothing was buffered.
    pub(crate) fn drain(&mut self) -> Option<Vec<InputEvent>> {
        if self.is_empty() {
            return None;
        }

        let mut batch = Vec::with_capacity(self.len());
        batch.append(&mut self.discrete);
        batch.extend(self.continuous.drain());
        Some(batch)
    }

    //--- Utilities --------------------------------------------------------
    pub(crate) fn len(&self) -> usize {
        self.discrete.len() + self.continuous.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.discrete.is_empty() && self.continuous.is_empty()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
