use crate::core::Block;
use log::info;
use std::sync::atomic::{AtomicU32, Ordering};

// Difficulty adjustment constants
const TARGET_BLOCK_TIME_SECS: i64 = 15; // Desired average time between blocks
const TARGET_TOLERANCE_SECS: i64 = 3; // No adjustment inside target +/- tolerance
const DIFFICULTY_ADJUSTMENT_PERIOD: u32 = 3; // Adjust every 3 blocks
const AVERAGING_WINDOW: usize = 3; // Intervals averaged at each adjustment
const INITIAL_DIFFICULTY: u32 = 5; // Starting difficulty
const MIN_DIFFICULTY: u32 = 2; // Minimum difficulty
const MAX_DIFFICULTY: u32 = 6; // Maximum difficulty

/// Owns the number of leading zero hex digits a block hash needs.
///
/// Only the ledger's append path writes it; any thread may read it at any time.
#[derive(Debug)]
pub struct DifficultyController {
    difficulty: AtomicU32,
}

impl Default for DifficultyController {
    fn default() -> Self {
        Self::new()
    }
}

impl DifficultyController {
    pub fn new() -> DifficultyController {
        Self::with_difficulty(INITIAL_DIFFICULTY)
    }

    /// Start from a specific difficulty, clamped to the allowed range
    pub fn with_difficulty(difficulty: u32) -> DifficultyController {
        DifficultyController {
            difficulty: AtomicU32::new(difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)),
        }
    }

    pub fn get_difficulty(&self) -> u32 {
        self.difficulty.load(Ordering::SeqCst)
    }

    /// Force a value, clamped to the allowed range. Used when a ledger falls back to genesis.
    pub fn reset(&self, difficulty: u32) {
        self.difficulty
            .store(difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY), Ordering::SeqCst);
    }

    /// Re-evaluate the difficulty after a block has been appended to `chain`.
    /// Does nothing unless the newest block's height is a multiple of the period.
    pub fn adjust(&self, chain: &[Block]) -> u32 {
        let current = self.get_difficulty();
        let newest = match chain.last() {
            Some(block) => block.get_height(),
            None => return current,
        };
        if newest == 0 || newest % DIFFICULTY_ADJUSTMENT_PERIOD != 0 {
            return current;
        }

        let timestamps = Self::timestamps_of(chain);
        let average = match Self::average_creation_time(&timestamps, newest as usize) {
            Some(average) => average / 1000,
            None => return current,
        };
        info!("Average creation time of the last blocks is {average} seconds");

        let next = Self::next_difficulty(average, current);
        if next > current {
            info!("Difficulty was increased to {next}");
        } else if next < current {
            info!("Difficulty was decreased to {next}");
        } else {
            info!("Difficulty stays at {current}");
        }
        self.difficulty.store(next, Ordering::SeqCst);
        next
    }

    /// Replay the adjustment rule over a whole chain instead of trusting a stored
    /// value. Used after bulk-loading blocks.
    pub fn recalculate_from_history(&self, chain: &[Block]) -> u32 {
        let difficulty = Self::difficulty_for_timestamps(&Self::timestamps_of(chain));
        self.difficulty.store(difficulty, Ordering::SeqCst);
        info!("Difficulty recalculated from {} blocks: {difficulty}", chain.len());
        difficulty
    }

    /// Difficulty reached by a chain whose block `i` was created at `timestamps[i]`
    pub fn difficulty_for_timestamps(timestamps: &[i64]) -> u32 {
        let mut difficulty = INITIAL_DIFFICULTY;
        let mut height = DIFFICULTY_ADJUSTMENT_PERIOD as usize;
        while height < timestamps.len() {
            if let Some(average) = Self::average_creation_time(timestamps, height) {
                difficulty = Self::next_difficulty(average / 1000, difficulty);
            }
            height += DIFFICULTY_ADJUSTMENT_PERIOD as usize;
        }
        difficulty
    }

    /// Average gap in milliseconds over the (up to) three intervals ending at `height`.
    /// The gap between genesis and block 1 never counts, so near the start of the
    /// chain fewer intervals are averaged.
    pub fn average_creation_time(timestamps: &[i64], height: usize) -> Option<i64> {
        if height >= timestamps.len() {
            return None;
        }
        let end = height.saturating_sub(AVERAGING_WINDOW).max(1);
        if height <= end {
            return None;
        }

        let summed: i64 = (end + 1..=height)
            .map(|i| timestamps[i] - timestamps[i - 1])
            .sum();
        Some(summed / (height - end) as i64)
    }

    /// One adjustment step for an average block time given in whole seconds
    fn next_difficulty(average_secs: i64, current: u32) -> u32 {
        if average_secs < TARGET_BLOCK_TIME_SECS - TARGET_TOLERANCE_SECS
            && current < MAX_DIFFICULTY
        {
            current + 1
        } else if average_secs > TARGET_BLOCK_TIME_SECS + TARGET_TOLERANCE_SECS
            && current > MIN_DIFFICULTY
        {
            current - 1
        } else {
            current
        }
    }

    fn timestamps_of(chain: &[Block]) -> Vec<i64> {
        chain.iter().map(|block| block.get_timestamp()).collect()
    }

    pub fn get_initial_difficulty() -> u32 {
        INITIAL_DIFFICULTY
    }
}
