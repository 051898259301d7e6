//! Expense Splitting
//!
//! Pure share arithmetic for admin-issued shared expenses. Shares always
//! round UP to the cash increment, so the collected sum can exceed but never
//! undershoot the original total.

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::ApiError;

/// Smallest cash unit shares are rounded to (5 centimes).
pub const CASH_INCREMENT: f64 = 0.05;

/// How an expense total is divided among the selected participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    Equal,
    Weighted,
}

/// Round `amount` up to the nearest multiple of `increment`.
///
/// Ceiling division scaled by `1/increment`; deterministic and the smallest
/// such multiple that is >= `amount`.
pub fn round_up_to_nearest(amount: f64, increment: f64) -> f64 {
    (amount / increment).ceil() * increment
}

/// Compute one share per participant, in input order.
///
/// - Equal: every share is `round_up(total / count)`.
/// - Weighted: `round_up(total * weight / sum_of_weights)`, with a default
///   weight of 1 for participants absent from the mapping. Rounding happens
///   per share, matching the equal mode, so a weighted batch can also
///   over-collect by a few increments.
pub fn compute_shares(
    total: f64,
    participants: &[Uuid],
    mode: SplitMode,
    weights: Option<&HashMap<Uuid, f64>>,
    reason: &str,
) -> Result<Vec<(Uuid, f64)>, ApiError> {
    if reason.trim().is_empty() {
        return Err(ApiError::Validation("A reason is required".to_string()));
    }
    if participants.is_empty() {
        return Err(ApiError::Validation(
            "Select at least one participant".to_string(),
        ));
    }
    if !(total >= 0.0) || !total.is_finite() {
        return Err(ApiError::Validation(
            "Total amount must be a non-negative number".to_string(),
        ));
    }

    match mode {
        SplitMode::Equal => {
            let share = round_up_to_nearest(total / participants.len() as f64, CASH_INCREMENT);
            Ok(participants.iter().map(|&id| (id, share)).collect())
        }
        SplitMode::Weighted => {
            let weights = weights.ok_or_else(|| {
                ApiError::Validation("Weights are required for a weighted split".to_string())
            })?;

            let weight_of = |id: &Uuid| weights.get(id).copied().unwrap_or(1.0);

            // A zero weight sum divides by zero and produces NaN shares.
            if participants.iter().any(|id| {
                let w = weight_of(id);
                !(w > 0.0) || !w.is_finite()
            }) {
                return Err(ApiError::Validation(
                    "Weights must be positive numbers".to_string(),
                ));
            }

            let total_weight: f64 = participants.iter().map(weight_of).sum();

            Ok(participants
                .iter()
                .map(|&id| {
                    let share = total * weight_of(&id) / total_weight;
                    (id, round_up_to_nearest(share, CASH_INCREMENT))
                })
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_round_up_smallest_multiple() {
        // round_up(x, 0.05) * 20 is the smallest integer >= x * 20
        for x in [0.0, 0.01, 0.05, 33.333333, 49.99, 50.0, 123.456] {
            let rounded = round_up_to_nearest(x, 0.05);
            let scaled = rounded * 20.0;
            assert!((scaled - scaled.round()).abs() < EPS, "not a multiple: {x}");
            assert!(rounded + EPS >= x);
            assert!(rounded - 0.05 < x, "not the smallest multiple for {x}");
        }
    }

    #[test]
    fn test_round_up_exact_multiple_unchanged() {
        assert!((round_up_to_nearest(33.35, 0.05) - 33.35).abs() < EPS);
    }

    #[test]
    fn test_equal_split_of_100_among_3() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let shares = compute_shares(100.0, &ids, SplitMode::Equal, None, "pizza").unwrap();

        for (_, share) in &shares {
            assert!((share - 33.35).abs() < EPS);
        }
        let sum: f64 = shares.iter().map(|(_, s)| s).sum();
        assert!((sum - 100.05).abs() < EPS);
        assert!(sum + EPS >= 100.0);
    }

    #[test]
    fn test_equal_split_never_under_collects() {
        for (total, count) in [(10.0, 3), (99.99, 7), (0.01, 2), (250.0, 6)] {
            let ids: Vec<Uuid> = (0..count).map(|_| Uuid::new_v4()).collect();
            let shares = compute_shares(total, &ids, SplitMode::Equal, None, "r").unwrap();
            let sum: f64 = shares.iter().map(|(_, s)| s).sum();
            assert!(sum + EPS >= total, "under-collected: {total}/{count}");
            for (_, share) in shares {
                assert!(share + EPS >= total / count as f64);
            }
        }
    }

    #[test]
    fn test_weighted_split_monotone_in_weight() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let weights: HashMap<Uuid, f64> =
            [(ids[0], 1.0), (ids[1], 2.0), (ids[2], 3.0)].into_iter().collect();

        let shares =
            compute_shares(90.0, &ids, SplitMode::Weighted, Some(&weights), "trip").unwrap();

        assert!(shares[0].1 <= shares[1].1 + EPS);
        assert!(shares[1].1 <= shares[2].1 + EPS);
        let sum: f64 = shares.iter().map(|(_, s)| s).sum();
        assert!(sum + EPS >= 90.0);
    }

    #[test]
    fn test_weighted_split_defaults_missing_weight_to_one() {
        let ids: Vec<Uuid> = (0..2).map(|_| Uuid::new_v4()).collect();
        let weights: HashMap<Uuid, f64> = [(ids[0], 1.0)].into_iter().collect();

        let shares =
            compute_shares(20.0, &ids, SplitMode::Weighted, Some(&weights), "r").unwrap();

        // Both end up at weight 1 -> equal shares.
        assert!((shares[0].1 - shares[1].1).abs() < EPS);
    }

    #[test]
    fn test_weighted_split_requires_weights() {
        let ids = vec![Uuid::new_v4()];
        let err = compute_shares(10.0, &ids, SplitMode::Weighted, None, "r").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_empty_participants_rejected() {
        let err = compute_shares(10.0, &[], SplitMode::Equal, None, "r").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_weighted_split_rejects_all_zero_weights() {
        let ids: Vec<Uuid> = (0..2).map(|_| Uuid::new_v4()).collect();
        let weights: HashMap<Uuid, f64> =
            [(ids[0], 0.0), (ids[1], 0.0)].into_iter().collect();

        let err =
            compute_shares(100.0, &ids, SplitMode::Weighted, Some(&weights), "r").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_weighted_split_rejects_negative_weight() {
        let ids: Vec<Uuid> = (0..2).map(|_| Uuid::new_v4()).collect();
        let weights: HashMap<Uuid, f64> =
            [(ids[0], -1.0), (ids[1], 2.0)].into_iter().collect();

        let err =
            compute_shares(50.0, &ids, SplitMode::Weighted, Some(&weights), "r").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_negative_total_rejected() {
        let ids = vec![Uuid::new_v4()];
        let err = compute_shares(-10.0, &ids, SplitMode::Equal, None, "r").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_shares_are_always_finite() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let weights: HashMap<Uuid, f64> = [(ids[0], 0.5)].into_iter().collect();

        let shares =
            compute_shares(75.0, &ids, SplitMode::Weighted, Some(&weights), "r").unwrap();
        for (_, share) in shares {
            assert!(share.is_finite() && share >= 0.0);
        }
    }

    #[test]
    fn test_blank_reason_rejected() {
        let ids = vec![Uuid::new_v4()];
        let err = compute_shares(10.0, &ids, SplitMode::Equal, None, "   ").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
