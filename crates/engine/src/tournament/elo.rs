//! Elo rating math
//!
//! Pure functions; the voting path owns the locking and storage.

/// Expected score of the winner given both ratings
///
/// Logistic curve over the rating difference with the standard 400 scale.
pub fn expected_score(r_winner: f64, r_loser: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((r_loser - r_winner) / 400.0))
}

/// Rating points the winner gains (and the loser loses)
///
/// `ΔW = K * (1 − E_W)`; the update is zero-sum by construction.
pub fn rating_delta(k: f64, r_winner: f64, r_loser: f64) -> f64 {
    k * (1.0 - expected_score(r_winner, r_loser))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_ratings_expect_half() {
        assert!((expected_score(1200.0, 1200.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_k32_equal_ratings_moves_sixteen() {
        let delta = rating_delta(32.0, 1200.0, 1200.0);
        assert!((delta - 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_underdog_win_moves_more() {
        let upset = rating_delta(32.0, 1100.0, 1300.0);
        let expected_win = rating_delta(32.0, 1300.0, 1100.0);
        assert!(upset > expected_win);
        assert!(upset > 16.0 && upset < 32.0);
        assert!(expected_win > 0.0 && expected_win < 16.0);
    }

    #[test]
    fn test_expected_scores_sum_to_one() {
        for (a, b) in [(1200.0, 1200.0), (1500.0, 900.0), (1000.0, 1450.0)] {
            let sum = expected_score(a, b) + expected_score(b, a);
            assert!((sum - 1.0).abs() < 1e-12);
        }
    }
}
