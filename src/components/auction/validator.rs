//! Règles métier d'une enchère : valeur totale minimale et mise de départ plafonnée.

use std::fmt;

use crate::components::utils::amount_parser::format_amount;

/// Règle enfreinte, avec les montants utiles au message d'erreur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    BelowMinimumWorth { total: i64, minimum: i64 },
    BidExceedsRatio { total: i64, max_allowed: i64, bid: i64, percent: i64 },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Violation::BelowMinimumWorth { total, minimum } => write!(f,
                "Total worth must be **≥ {}**.\nCurrent total worth: ◊ {}",
                format_amount(minimum), format_amount(total)
            ),
            Violation::BidExceedsRatio { total, max_allowed, bid, percent } => write!(f,
                "Your starting bid must be **≤ {}%** of total worth.\n\n\
                **Total Worth**: ◊ {}\n**Max Allowed ({}%)**: ◊ {}\n**Your Bid**: ◊ {}\n\n\
                Please adjust your bid.",
                percent, format_amount(total), percent, format_amount(max_allowed), format_amount(bid)
            ),
        }
    }
}

/// Seuils appliqués aux enchères.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuctionRules {
    pub minimum_worth: i64,
    pub max_bid_percent: i64,
}

impl Default for AuctionRules {
    fn default() -> Self {
        Self {
            minimum_worth: 10_000_000,
            max_bid_percent: 30,
        }
    }
}

impl AuctionRules {
    /// Mise maximale : `floor(total * percent / 100)` sans dépassement.
    ///
    /// `total` doit être positif.
    pub fn max_allowed(&self, total: i64) -> i64 {
        total / 100 * self.max_bid_percent + total % 100 * self.max_bid_percent / 100
    }
    /// Vérifie une nouvelle enchère et retourne sa valeur totale.
    pub fn validate_creation(&self, value_each: i64, quantity: i64, starting_bid: i64) -> Result<i64, Violation> {
        let total = value_each.saturating_mul(quantity);
        if total < self.minimum_worth {
            return Err(Violation::BelowMinimumWorth { total, minimum: self.minimum_worth });
        }
        self.check_ratio(total, starting_bid)
    }
    /// Vérifie une modification de la mise. La valeur totale minimale n'est
    /// vérifiée qu'à la création.
    pub fn validate_bid_edit(&self, value_each: i64, quantity: i64, new_bid: i64) -> Result<i64, Violation> {
        self.check_ratio(value_each.saturating_mul(quantity), new_bid)
    }
    fn check_ratio(&self, total: i64, bid: i64) -> Result<i64, Violation> {
        let max_allowed = self.max_allowed(total);
        if bid > max_allowed {
            return Err(Violation::BidExceedsRatio { total, max_allowed, bid, percent: self.max_bid_percent });
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_worth() {
        let rules = AuctionRules::default();
        assert_eq!(rules.validate_creation(5_000_000, 2, 0), Ok(10_000_000));
        assert_eq!(
            rules.validate_creation(5_000_000, 1, 0),
            Err(Violation::BelowMinimumWorth { total: 5_000_000, minimum: 10_000_000 })
        );
        for (value_each, quantity) in [(1, 9_999_999), (9_999_999, 1), (3_333_333, 3), (1_000, 10_000)] {
            let rejected = rules.validate_creation(value_each, quantity, 0).is_err();
            assert_eq!(rejected, value_each * quantity < 10_000_000, "{} x {}", value_each, quantity);
        }
    }

    #[test]
    fn ratio_boundary() {
        let rules = AuctionRules::default();
        assert_eq!(rules.max_allowed(15_000_000), 4_500_000);
        assert_eq!(rules.validate_creation(5_000_000, 3, 4_500_000), Ok(15_000_000));
        assert_eq!(
            rules.validate_creation(5_000_000, 3, 4_500_001),
            Err(Violation::BidExceedsRatio { total: 15_000_000, max_allowed: 4_500_000, bid: 4_500_001, percent: 30 })
        );
    }

    #[test]
    fn max_allowed_truncates() {
        let rules = AuctionRules::default();
        assert_eq!(rules.max_allowed(10_000_001), 3_000_000);
        assert_eq!(rules.max_allowed(10_000_003), 3_000_000);
        assert_eq!(rules.max_allowed(10_000_004), 3_000_001);
        assert_eq!(rules.max_allowed(99), 29);
        assert_eq!(rules.max_allowed(i64::MAX), i64::MAX / 100 * 30 + i64::MAX % 100 * 30 / 100);
    }

    #[test]
    fn bid_edit_skips_minimum() {
        let rules = AuctionRules::default();
        assert_eq!(rules.validate_bid_edit(1_000, 1, 300), Ok(1_000));
        assert!(rules.validate_bid_edit(1_000, 1, 301).is_err());
    }

    #[test]
    fn custom_rules() {
        let rules = AuctionRules { minimum_worth: 1_000, max_bid_percent: 50 };
        assert_eq!(rules.validate_creation(100, 10, 500), Ok(1_000));
        assert!(rules.validate_creation(100, 10, 501).is_err());
    }

    #[test]
    fn messages_carry_amounts() {
        let violation = Violation::BidExceedsRatio { total: 15_000_000, max_allowed: 4_500_000, bid: 5_000_000, percent: 30 };
        let text = violation.to_string();
        assert!(text.contains("◊ 15,000,000"));
        assert!(text.contains("◊ 4,500,000"));
        assert!(text.contains("◊ 5,000,000"));
    }
}
