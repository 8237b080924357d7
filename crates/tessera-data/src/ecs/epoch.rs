// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The frame counter used to timestamp component writes.

use std::fmt;

/// The largest epoch before the counter wraps back to [`Epoch::FIRST`].
///
/// Matches the largest integer a 64-bit float represents exactly, so epochs can cross
/// into hosts that only have floating-point numbers.
pub const MAX_SAFE_EPOCH: u64 = (1 << 53) - 1;

/// A simulation tick number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Epoch(pub u64);

impl Epoch {
    /// Reserved for "never written".
    pub const NEVER: Epoch = Epoch(0);
    /// The epoch every manager starts at.
    pub const FIRST: Epoch = Epoch(1);

    /// Returns the raw tick number.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns true if `self` is strictly later than `since`.
    pub const fn is_newer_than(self, since: Epoch) -> bool {
        self.0 > since.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A monotonically increasing frame counter.
///
/// The host calls [`increment`](EpochManager::increment) once per simulation tick;
/// every component write made during the tick is stamped with
/// [`current`](EpochManager::current).
#[derive(Debug, Clone)]
pub struct EpochManager {
    current: Epoch,
}

impl EpochManager {
    /// Creates a manager positioned at [`Epoch::FIRST`].
    pub fn new() -> Self {
        Self {
            current: Epoch::FIRST,
        }
    }

    /// Returns the current epoch.
    pub fn current(&self) -> Epoch {
        self.current
    }

    /// Advances to the next epoch and returns it.
    ///
    /// Wraps back to [`Epoch::FIRST`] at [`MAX_SAFE_EPOCH`].
    pub fn increment(&mut self) -> Epoch {
        self.current = if self.current.0 >= MAX_SAFE_EPOCH {
            log::warn!("Epoch counter reached {MAX_SAFE_EPOCH}; wrapping back to 1.");
            Epoch::FIRST
        } else {
            Epoch(self.current.0 + 1)
        };
        self.current
    }

    /// Resets the counter to [`Epoch::FIRST`].
    pub fn reset(&mut self) {
        self.current = Epoch::FIRST;
    }

    /// Returns true if a write stamped `write_epoch` happened after `since_epoch`.
    pub fn is_changed_since(write_epoch: Epoch, since_epoch: Epoch) -> bool {
        write_epoch.is_newer_than(since_epoch)
    }

    #[cfg(test)]
    pub(crate) fn set_current(&mut self, epoch: Epoch) {
        self.current = epoch;
    }
}

impl Default for EpochManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_one_and_increments() {
        let mut epochs = EpochManager::new();
        assert_eq!(epochs.current(), Epoch(1));
        assert_eq!(epochs.increment(), Epoch(2));
        assert_eq!(epochs.current(), Epoch(2));
    }

    #[test]
    fn test_reset() {
        let mut epochs = EpochManager::new();
        epochs.increment();
        epochs.increment();
        epochs.reset();
        assert_eq!(epochs.current(), Epoch::FIRST);
    }

    #[test]
    fn test_wraps_at_safe_ceiling() {
        let mut epochs = EpochManager::new();
        epochs.set_current(Epoch(MAX_SAFE_EPOCH));
        assert_eq!(epochs.increment(), Epoch::FIRST);
    }

    #[test]
    fn test_is_changed_since() {
        assert!(EpochManager::is_changed_since(Epoch(5), Epoch(4)));
        assert!(!EpochManager::is_changed_since(Epoch(5), Epoch(5)));
        assert!(!EpochManager::is_changed_since(Epoch::NEVER, Epoch::NEVER));
    }
}
