//! Loyalty tiers, the reward catalogue and bonus points.

use serde::{Deserialize, Serialize};

use crate::types::Money;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LoyaltyError {
    #[error("{reward} needs {needed} points but only {available} are available")]
    InsufficientPoints {
        reward: &'static str,
        needed: u32,
        available: u32,
    },
    #[error("unknown reward: {0}")]
    UnknownReward(String),
}

/// Loyalty level, derived from the current points balance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Tier {
    pub const ALL: [Self; 4] = [Self::Bronze, Self::Silver, Self::Gold, Self::Platinum];

    /// Points needed to reach this tier.
    #[must_use]
    pub const fn threshold(self) -> u32 {
        match self {
            Self::Bronze => 0,
            Self::Silver => 250,
            Self::Gold => 500,
            Self::Platinum => 1000,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
        }
    }

    #[must_use]
    pub fn for_points(points: u32) -> Self {
        Self::ALL
            .into_iter()
            .rev()
            .find(|tier| points >= tier.threshold())
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Bronze => Some(Self::Silver),
            Self::Silver => Some(Self::Gold),
            Self::Gold => Some(Self::Platinum),
            Self::Platinum => None,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a points balance sits between tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierProgress {
    pub tier: Tier,
    pub next_tier: Option<Tier>,
    /// Points still needed for the next tier. Zero at the top tier.
    pub points_to_next: u32,
    /// Progress from the current tier's threshold to the next, 0..=100.
    pub percent: u8,
}

impl TierProgress {
    #[must_use]
    pub fn for_points(points: u32) -> Self {
        let tier = Tier::for_points(points);
        let Some(next) = tier.next() else {
            return Self {
                tier,
                next_tier: None,
                points_to_next: 0,
                percent: 100,
            };
        };

        let span = next.threshold() - tier.threshold();
        let into = points - tier.threshold();
        let percent = u8::try_from(u64::from(into) * 100 / u64::from(span)).unwrap_or(100);

        Self {
            tier,
            next_tier: Some(next),
            points_to_next: next.threshold() - points,
            percent,
        }
    }
}

/// Something points can be spent on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reward {
    FreeCoffee,
    FreePastry,
    LunchSpecial,
}

impl Reward {
    /// Cheapest first.
    pub const CATALOGUE: [Self; 3] = [Self::FreeCoffee, Self::FreePastry, Self::LunchSpecial];

    #[must_use]
    pub const fn cost(self) -> u32 {
        match self {
            Self::FreeCoffee => 100,
            Self::FreePastry => 150,
            Self::LunchSpecial => 300,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FreeCoffee => "Free Coffee",
            Self::FreePastry => "Free Pastry",
            Self::LunchSpecial => "Lunch Special",
        }
    }

    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::FreeCoffee => "free-coffee",
            Self::FreePastry => "free-pastry",
            Self::LunchSpecial => "lunch-special",
        }
    }

    /// The cheapest reward the balance cannot yet cover, with the shortfall.
    #[must_use]
    pub fn next_for(points: u32) -> Option<(Self, u32)> {
        Self::CATALOGUE
            .into_iter()
            .find(|reward| reward.cost() > points)
            .map(|reward| (reward, reward.cost() - points))
    }

    /// Spend points on this reward, returning the remaining balance.
    ///
    /// # Errors
    ///
    /// Returns [`LoyaltyError::InsufficientPoints`] if `available` is short.
    pub const fn redeem(self, available: u32) -> Result<u32, LoyaltyError> {
        match available.checked_sub(self.cost()) {
            Some(remaining) => Ok(remaining),
            None => Err(LoyaltyError::InsufficientPoints {
                reward: self.name(),
                needed: self.cost(),
                available,
            }),
        }
    }
}

impl std::str::FromStr for Reward {
    type Err = LoyaltyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::CATALOGUE
            .into_iter()
            .find(|reward| reward.slug() == s)
            .ok_or_else(|| LoyaltyError::UnknownReward(s.to_owned()))
    }
}

/// Bonus awarded on large wallet top-ups.
pub const TOP_UP_BONUS_POINTS: u32 = 50;
/// Smallest top-up, in whole shillings, that earns the bonus.
pub const TOP_UP_BONUS_THRESHOLD: i64 = 1_000;

#[must_use]
pub fn top_up_bonus(amount: Money) -> u32 {
    if amount >= Money::from_shillings(TOP_UP_BONUS_THRESHOLD) {
        TOP_UP_BONUS_POINTS
    } else {
        0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(Tier::for_points(0), Tier::Bronze);
        assert_eq!(Tier::for_points(249), Tier::Bronze);
        assert_eq!(Tier::for_points(250), Tier::Silver);
        assert_eq!(Tier::for_points(999), Tier::Gold);
        assert_eq!(Tier::for_points(5_000), Tier::Platinum);
    }

    #[test]
    fn test_tier_progress() {
        let progress = TierProgress::for_points(375);
        assert_eq!(progress.tier, Tier::Silver);
        assert_eq!(progress.next_tier, Some(Tier::Gold));
        assert_eq!(progress.points_to_next, 125);
        assert_eq!(progress.percent, 50);

        let top = TierProgress::for_points(1_200);
        assert_eq!(top.next_tier, None);
        assert_eq!(top.percent, 100);
    }

    #[test]
    fn test_next_reward() {
        assert_eq!(Reward::next_for(70), Some((Reward::FreeCoffee, 30)));
        assert_eq!(Reward::next_for(120), Some((Reward::FreePastry, 30)));
        assert_eq!(Reward::next_for(300), None);
    }

    #[test]
    fn test_redeem() {
        assert_eq!(Reward::FreeCoffee.redeem(130), Ok(30));
        assert_eq!(
            Reward::LunchSpecial.redeem(299),
            Err(LoyaltyError::InsufficientPoints {
                reward: "Lunch Special",
                needed: 300,
                available: 299,
            })
        );
    }

    #[test]
    fn test_reward_from_slug() {
        assert_eq!("free-pastry".parse::<Reward>().unwrap(), Reward::FreePastry);
        assert!("free-car".parse::<Reward>().is_err());
    }

    #[test]
    fn test_top_up_bonus() {
        assert_eq!(top_up_bonus(Money::from_shillings(999)), 0);
        assert_eq!(top_up_bonus(Money::from_shillings(1_000)), 50);
        assert_eq!(top_up_bonus(Money::from_shillings(5_000)), 50);
    }
}
