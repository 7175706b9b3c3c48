/// Streak thresholds derived from patience.
///
/// `low = round(patience / 3)` and `high = round(patience / 2)`, rounding half
/// to even. A streak shorter than `low` leaves the stale counter running, a
/// streak in `[low, high)` forgives staleness, and a streak of at least `high`
/// also adopts the current loss as the new best.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImprovementBands {
    pub low: usize,
    pub high: usize,
}

impl ImprovementBands {
    pub fn from_patience(patience: usize) -> Self {
        Self {
            low: round_half_even(patience, 3),
            high: round_half_even(patience, 2),
        }
    }
}

fn round_half_even(numerator: usize, denominator: usize) -> usize {
    (numerator as f64 / denominator as f64).round_ties_even() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bands(patience: usize) -> (usize, usize) {
        let b = ImprovementBands::from_patience(patience);
        (b.low, b.high)
    }

    #[test]
    fn test_small_patience() {
        assert_eq!(bands(0), (0, 0));
        // 0.5 rounds down to even
        assert_eq!(bands(1), (0, 0));
        assert_eq!(bands(2), (1, 1));
        // 1.5 rounds up to even
        assert_eq!(bands(3), (1, 2));
        assert_eq!(bands(4), (1, 2));
    }

    #[test]
    fn test_half_ties_round_to_even() {
        // 2.5 -> 2
        assert_eq!(bands(5), (2, 2));
        // 3.5 -> 4
        assert_eq!(bands(7), (2, 4));
        // 4.5 -> 4
        assert_eq!(bands(9), (3, 4));
    }

    #[test]
    fn test_typical_patience() {
        assert_eq!(bands(10), (3, 5));
        assert_eq!(bands(12), (4, 6));
        assert_eq!(bands(30), (10, 15));
    }
}
