//! Per-session throughput statistics.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Summary reported when a session's final chunk completes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Characters of input text across all chunks.
    pub total_characters: usize,
    /// Number of chunks received.
    pub chunks: usize,
    /// Seconds between session start and finalization.
    pub elapsed_seconds: f64,
    /// `total_characters / elapsed_seconds`, or 0 when no time has elapsed.
    pub chars_per_second: f64,
}

impl SessionStats {
    #[allow(clippy::cast_precision_loss)]
    pub fn new(total_characters: usize, chunks: usize, elapsed: Duration) -> Self {
        let elapsed_seconds = elapsed.as_secs_f64();
        let chars_per_second = if elapsed_seconds > 0.0 {
            total_characters as f64 / elapsed_seconds
        } else {
            0.0
        };
        Self {
            total_characters,
            chunks,
            elapsed_seconds,
            chars_per_second,
        }
    }

    /// Human-readable summary, e.g.
    /// `Generated 1,234 characters in 3 chunks (2.0s, 617.0 chars/s)`.
    pub fn summary(&self) -> String {
        format!(
            "Generated {} characters in {} chunks ({:.1}s, {:.1} chars/s)",
            group_thousands(self.total_characters),
            self.chunks,
            self.elapsed_seconds,
            self.chars_per_second
        )
    }
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_over_two_seconds() {
        let stats = SessionStats::new(12, 2, Duration::from_secs(2));
        assert_eq!(stats.total_characters, 12);
        assert_eq!(stats.chunks, 2);
        assert!((stats.chars_per_second - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_elapsed_does_not_divide() {
        let stats = SessionStats::new(40, 1, Duration::ZERO);
        assert!(stats.chars_per_second.abs() < f64::EPSILON);
    }

    #[test]
    fn test_summary_format() {
        let stats = SessionStats::new(1234, 3, Duration::from_secs(2));
        assert_eq!(
            stats.summary(),
            "Generated 1,234 characters in 3 chunks (2.0s, 617.0 chars/s)"
        );
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }
}
