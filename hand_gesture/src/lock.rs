//! Per-hand engagement locks.
//!
//! A hand's channel may update only while its lock is open.  Updating
//! closes the lock; the end-of-cycle check reopens every lock unless two
//! fists are held.  The result is one update per cycle normally, and a
//! single update followed by a freeze while the double-fist pose lasts.

use crate::landmark::Handedness;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngagementLock {
    engaged: bool,
}

impl EngagementLock {
    pub fn should_update(&self) -> bool { !self.engaged }

    pub fn engage(&mut self) { self.engaged = true; }

    pub fn release(&mut self) { self.engaged = false; }

    pub fn is_engaged(&self) -> bool { self.engaged }
}

/// The left and right locks together.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngagementLocks {
    left:  EngagementLock,
    right: EngagementLock,
}

impl EngagementLocks {
    pub fn get(&self, hand: Handedness) -> &EngagementLock {
        match hand {
            Handedness::Left  => &self.left,
            Handedness::Right => &self.right,
        }
    }

    pub fn get_mut(&mut self, hand: Handedness) -> &mut EngagementLock {
        match hand {
            Handedness::Left  => &mut self.left,
            Handedness::Right => &mut self.right,
        }
    }

    pub fn release_all(&mut self) {
        self.left.release();
        self.right.release();
    }

    /// End-of-cycle rule: fewer than two fists clears every lock.
    /// Returns true when the locks were cleared.
    pub fn end_cycle(&mut self, fist_count: usize) -> bool {
        if fist_count < 2 {
            self.release_all();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engage_blocks_updates() {
        let mut lock = EngagementLock::default();
        assert!(lock.should_update());
        lock.engage();
        assert!(!lock.should_update());
    }

    #[test]
    fn end_cycle_clears_below_two_fists() {
        let mut locks = EngagementLocks::default();
        locks.get_mut(Handedness::Left).engage();
        locks.get_mut(Handedness::Right).engage();
        assert!(locks.end_cycle(1));
        assert!(!locks.get(Handedness::Left).is_engaged());
        assert!(!locks.get(Handedness::Right).is_engaged());
    }

    #[test]
    fn end_cycle_keeps_locks_with_two_fists() {
        let mut locks = EngagementLocks::default();
        locks.get_mut(Handedness::Left).engage();
        assert!(!locks.end_cycle(2));
        assert!(locks.get(Handedness::Left).is_engaged());
        assert!(!locks.get(Handedness::Right).is_engaged());
    }
}
