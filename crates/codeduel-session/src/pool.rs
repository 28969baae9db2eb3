//! The code pool: hands out short numeric game codes and takes them back.
//!
//! Codes are drawn from a pre-shuffled sequence so consecutive games don't
//! get guessable neighbouring codes, and released codes go to the back of
//! the queue. Reuse only keeps the code space small; a code is never
//! handed out while a live session holds it.
//!
//! # Concurrency note
//!
//! `CodePool` is a plain struct with `&mut self` methods. It is owned by
//! the [`SessionRegistry`](crate::SessionRegistry), so every allocate and
//! release happens under the registry's lock together with the session
//! creation or teardown that goes with it.

use std::collections::{HashSet, VecDeque};
use std::ops::RangeInclusive;

use codeduel_protocol::GameCode;
use rand::seq::SliceRandom;

use crate::SessionError;

/// The four-digit codes handed out by default.
pub const DEFAULT_CODE_RANGE: RangeInclusive<u16> = 1000..=9999;

/// A finite pool of game codes.
#[derive(Debug)]
pub struct CodePool {
    /// Codes ready to be handed out, front first.
    free: VecDeque<GameCode>,

    /// Codes currently held by a session. Lets `release` ignore codes that
    /// were never handed out or were already returned.
    in_use: HashSet<GameCode>,
}

impl CodePool {
    /// Creates a pool of every code in `range`, in random order.
    pub fn shuffled(range: RangeInclusive<u16>) -> Self {
        let mut codes: Vec<GameCode> = range.map(GameCode::from).collect();
        codes.shuffle(&mut rand::rng());
        Self::from_codes(codes)
    }

    /// Creates a pool that hands out `codes` in the given order.
    pub fn from_codes(codes: impl IntoIterator<Item = GameCode>) -> Self {
        Self {
            free: codes.into_iter().collect(),
            in_use: HashSet::new(),
        }
    }

    /// Removes and returns the next free code.
    ///
    /// # Errors
    /// [`SessionError::PoolExhausted`] if every code is in use.
    pub fn allocate(&mut self) -> Result<GameCode, SessionError> {
        let code = self.free.pop_front().ok_or(SessionError::PoolExhausted)?;
        self.in_use.insert(code.clone());
        Ok(code)
    }

    /// Returns a code to the back of the pool.
    ///
    /// Releasing a code that is not in use is ignored, so a code can never
    /// be queued twice.
    pub fn release(&mut self, code: GameCode) {
        if self.in_use.remove(&code) {
            self.free.push_back(code);
        } else {
            tracing::warn!(%code, "released a code that was not in use");
        }
    }

    /// Number of codes ready to be handed out.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Returns `true` if `code` is currently held by a session.
    pub fn is_in_use(&self, code: &GameCode) -> bool {
        self.in_use.contains(code)
    }
}

impl Default for CodePool {
    fn default() -> Self {
        Self::shuffled(DEFAULT_CODE_RANGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(list: &[&str]) -> Vec<GameCode> {
        list.iter().map(|c| GameCode::new(*c)).collect()
    }

    #[test]
    fn test_allocate_hands_out_in_order() {
        let mut pool = CodePool::from_codes(codes(&["4217", "1000"]));
        assert_eq!(pool.allocate().unwrap(), GameCode::new("4217"));
        assert_eq!(pool.allocate().unwrap(), GameCode::new("1000"));
    }

    #[test]
    fn test_allocate_empty_pool_reports_exhaustion() {
        let mut pool = CodePool::from_codes(codes(&["4217"]));
        pool.allocate().unwrap();
        assert!(matches!(pool.allocate(), Err(SessionError::PoolExhausted)));
    }

    #[test]
    fn test_release_makes_code_allocatable_again() {
        let mut pool = CodePool::from_codes(codes(&["4217"]));
        let code = pool.allocate().unwrap();
        assert!(pool.is_in_use(&code));

        pool.release(code.clone());

        assert!(!pool.is_in_use(&code));
        assert_eq!(pool.allocate().unwrap(), code);
    }

    #[test]
    fn test_release_twice_queues_code_once() {
        let mut pool = CodePool::from_codes(codes(&["4217"]));
        let code = pool.allocate().unwrap();
        pool.release(code.clone());
        pool.release(code);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_release_unknown_code_is_ignored() {
        let mut pool = CodePool::from_codes(codes(&["4217"]));
        pool.release(GameCode::new("9999"));
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_shuffled_covers_whole_range_without_duplicates() {
        let mut pool = CodePool::shuffled(1000..=1099);
        let mut seen = HashSet::new();
        while let Ok(code) = pool.allocate() {
            assert_eq!(code.as_str().len(), 4);
            assert!(seen.insert(code), "code handed out twice");
        }
        assert_eq!(seen.len(), 100);
    }
}
