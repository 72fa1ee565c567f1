use lenspeer_common::EngagementFeatures;

/// Maps profile attributes to a relative outreach priority.
///
/// Total and deterministic for a given model state: degenerate input scores
/// 0.0 rather than failing. Scores are not guaranteed stable across process
/// restarts; the cycle only relies on relative ordering within a run and on
/// the persisted score for replay ordering.
pub trait EngagementModel: Send + Sync {
    fn score(&self, features: &EngagementFeatures) -> f64;
}

/// Rule-based default model.
///
/// `audience * ratio_factor + interest_bonus`, clamped to [0, 1]:
/// - `audience`: log-scaled follower count, saturating around 100k followers
/// - `ratio_factor`: damps accounts that follow far more than follow them back
/// - `interest_bonus`: declared interests read as an active profile
pub struct HeuristicModel;

impl EngagementModel for HeuristicModel {
    fn score(&self, features: &EngagementFeatures) -> f64 {
        let audience = ((features.followers as f64 + 1.0).log10() / 5.0).min(1.0);

        let ratio = if features.following == 0 {
            1.0
        } else {
            (features.followers as f64 / features.following as f64).min(1.0)
        };
        let ratio_factor = 0.5 + 0.5 * ratio;

        let interest_bonus = (features.interest_count as f64 * 0.02).min(0.1);

        (audience * ratio_factor + interest_bonus).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(followers: u32, following: u32, interest_count: u32) -> EngagementFeatures {
        EngagementFeatures {
            followers,
            following,
            interest_count,
        }
    }

    #[test]
    fn empty_profile_scores_zero() {
        let score = HeuristicModel.score(&features(0, 0, 0));
        assert_eq!(score, 0.0);
    }

    #[test]
    fn more_followers_score_higher() {
        let small = HeuristicModel.score(&features(5, 10, 0));
        let large = HeuristicModel.score(&features(500, 10, 0));
        assert!(large > small, "large={large}, small={small}");
    }

    #[test]
    fn follow_heavy_accounts_are_damped() {
        let balanced = HeuristicModel.score(&features(100, 100, 0));
        let follow_heavy = HeuristicModel.score(&features(100, 5000, 0));
        assert!(follow_heavy < balanced, "follow_heavy={follow_heavy}, balanced={balanced}");
    }

    #[test]
    fn interests_add_a_capped_bonus() {
        let none = HeuristicModel.score(&features(100, 10, 0));
        let some = HeuristicModel.score(&features(100, 10, 3));
        let many = HeuristicModel.score(&features(100, 10, 50));
        assert!(some > none);
        assert!((many - none - 0.1).abs() < 1e-9, "bonus caps at 0.1: {many} vs {none}");
    }

    #[test]
    fn score_stays_in_unit_interval() {
        let max = HeuristicModel.score(&features(u32::MAX, 0, u32::MAX));
        assert!((0.0..=1.0).contains(&max));
    }

    #[test]
    fn deterministic_for_same_input() {
        let f = features(123, 45, 6);
        assert_eq!(HeuristicModel.score(&f), HeuristicModel.score(&f));
    }
}
