use crate::core::Block;
use log::info;

pub const INITIAL_DIFFICULTY: u32 = 4; // Starting difficulty
pub const MIN_DIFFICULTY: u32 = 1; // Minimum difficulty
pub const MAX_DIFFICULTY: u32 = 8; // Maximum difficulty

/// The legacy protocol always requires a `"0000"` prefix
pub const LEGACY_DIFFICULTY: u32 = 4;

/// Number of trailing blocks looked at when retargeting
pub const RETARGET_WINDOW: usize = 10;

/// Difficulty retargeting from observed block intervals
pub struct DifficultyAdjustment;

impl DifficultyAdjustment {
    /// Next difficulty given recent blocks (oldest first) and a target interval.
    ///
    /// Fewer than two blocks carry no interval, so `current` is kept.
    pub fn next_difficulty(recent_blocks: &[Block], current: u32, target_block_time_ms: u64) -> u32 {
        let Some(average) = Self::average_interval(recent_blocks) else {
            return current;
        };

        let new_difficulty = Self::adjust_difficulty(current, average, target_block_time_ms as f64);
        if new_difficulty != current {
            info!("Difficulty adjustment: {current} -> {new_difficulty} (average interval {average:.0}ms, target {target_block_time_ms}ms)");
        }
        new_difficulty
    }

    /// Mean milliseconds between consecutive blocks
    fn average_interval(blocks: &[Block]) -> Option<f64> {
        if blocks.len() < 2 {
            return None;
        }

        let total: i64 = blocks
            .windows(2)
            .map(|pair| pair[1].get_timestamp() - pair[0].get_timestamp())
            .sum();
        Some(total as f64 / (blocks.len() - 1) as f64)
    }

    /// Adjust difficulty based on actual vs target time
    fn adjust_difficulty(current_difficulty: u32, average: f64, target: f64) -> u32 {
        let new_difficulty = if average < target * 0.5 {
            // Blocks are being mined too fast
            current_difficulty + 1
        } else if average > target * 2.0 {
            // Blocks are being mined too slow
            current_difficulty.saturating_sub(1)
        } else {
            current_difficulty
        };

        new_difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
    }

    pub fn is_valid_difficulty(difficulty: u32) -> bool {
        (MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&difficulty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::HashMode;

    fn create_test_block(timestamp: i64, difficulty: u32) -> Block {
        Block::with_timestamp(1, timestamp, "0".repeat(64), vec![], difficulty, HashMode::Modern)
            .unwrap()
    }

    fn blocks_with_interval(interval: i64, count: usize, difficulty: u32) -> Vec<Block> {
        (0..count)
            .map(|i| create_test_block(1_000_000 + i as i64 * interval, difficulty))
            .collect()
    }

    #[test]
    fn test_difficulty_increase_for_fast_blocks() {
        let blocks = blocks_with_interval(1_000, 5, 4);
        assert_eq!(DifficultyAdjustment::next_difficulty(&blocks, 4, 10_000), 5);
    }

    #[test]
    fn test_difficulty_decrease_for_slow_blocks() {
        let blocks = blocks_with_interval(30_000, 5, 4);
        assert_eq!(DifficultyAdjustment::next_difficulty(&blocks, 4, 10_000), 3);
    }

    #[test]
    fn test_difficulty_stable_for_normal_blocks() {
        let blocks = blocks_with_interval(10_000, 5, 4);
        assert_eq!(DifficultyAdjustment::next_difficulty(&blocks, 4, 10_000), 4);
    }

    #[test]
    fn test_difficulty_bounds() {
        let fast = blocks_with_interval(1, 5, MAX_DIFFICULTY);
        assert_eq!(
            DifficultyAdjustment::next_difficulty(&fast, MAX_DIFFICULTY, 10_000),
            MAX_DIFFICULTY
        );

        let slow = blocks_with_interval(100_000, 5, MIN_DIFFICULTY);
        assert_eq!(
            DifficultyAdjustment::next_difficulty(&slow, MIN_DIFFICULTY, 10_000),
            MIN_DIFFICULTY
        );
    }

    #[test]
    fn test_too_few_blocks_keeps_current() {
        let blocks = blocks_with_interval(1, 1, 3);
        assert_eq!(DifficultyAdjustment::next_difficulty(&blocks, 3, 10_000), 3);
        assert_eq!(DifficultyAdjustment::next_difficulty(&[], 6, 10_000), 6);
    }

    #[test]
    fn test_valid_range() {
        assert!(!DifficultyAdjustment::is_valid_difficulty(0));
        assert!(DifficultyAdjustment::is_valid_difficulty(1));
        assert!(DifficultyAdjustment::is_valid_difficulty(8));
        assert!(!DifficultyAdjustment::is_valid_difficulty(9));
    }
}
