//! Money and rating arithmetic shared by the cart and the catalog views.
//!
//! Everything here works on [`Decimal`] so currency amounts never pick up
//! binary floating point drift.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::str::FromStr;
use tracing::debug;

/// Discount price when the product is actually on sale, base price otherwise.
pub fn effective_price(price: Decimal, discount_price: Option<Decimal>) -> Decimal {
    match discount_price {
        Some(discount) if discount < price => discount,
        _ => price,
    }
}

pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

pub fn cart_total<I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, i32)>,
{
    lines
        .into_iter()
        .map(|(unit_price, quantity)| line_total(unit_price, quantity))
        .sum()
}

/// What the product page shows next to a reduced price.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DiscountSummary {
    pub savings: Option<Decimal>,
    pub discount_percent: Option<u32>,
}

impl DiscountSummary {
    pub fn compute(price: Decimal, discount_price: Option<Decimal>) -> Self {
        let Some(discount) = discount_price else {
            return Self::default();
        };
        if price <= Decimal::ZERO || discount >= price {
            return Self::default();
        }

        let savings = price - discount;
        let percent = (savings / price * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);

        match percent.to_u32() {
            Some(discount_percent) => Self {
                savings: Some(savings),
                discount_percent: Some(discount_percent),
            },
            None => Self::default(),
        }
    }

    /// Same as [`compute`](Self::compute) for raw form/query values. Anything
    /// that does not parse as a decimal means "no discount shown".
    pub fn parse(price: &str, discount_price: Option<&str>) -> Self {
        let Some(raw_discount) = discount_price else {
            return Self::default();
        };
        match (Decimal::from_str(price.trim()), Decimal::from_str(raw_discount.trim())) {
            (Ok(price), Ok(discount)) => Self::compute(price, Some(discount)),
            (price_res, discount_res) => {
                debug!(
                    price_ok = price_res.is_ok(),
                    discount_ok = discount_res.is_ok(),
                    "Ignoring unparsable discount input"
                );
                Self::default()
            }
        }
    }
}

/// Five-star breakdown for a float rating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StarRating {
    pub full: u8,
    pub half: u8,
    pub empty: u8,
}

impl StarRating {
    pub fn from_rating(rating: f64) -> Self {
        let rating = if rating.is_finite() { rating.clamp(0.0, 5.0) } else { 0.0 };
        let full = rating.floor() as u8;
        let half = if full < 5 && rating - f64::from(full) >= 0.5 { 1 } else { 0 };
        StarRating {
            full,
            half,
            empty: 5 - full - half,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn effective_price_prefers_lower_discount() {
        assert_eq!(effective_price(dec!(20.00), Some(dec!(15.00))), dec!(15.00));
        assert_eq!(effective_price(dec!(20.00), None), dec!(20.00));
        // a "discount" above the base price is not a sale
        assert_eq!(effective_price(dec!(20.00), Some(dec!(25.00))), dec!(20.00));
    }

    #[test]
    fn cart_total_is_exact() {
        let total = cart_total([(dec!(10.00), 2), (dec!(15.00), 1)]);
        assert_eq!(total, dec!(35.00));

        let drift_prone = cart_total([(dec!(0.10), 3), (dec!(0.20), 1)]);
        assert_eq!(drift_prone, dec!(0.50));
    }

    #[test]
    fn discount_summary_for_a_quarter_off() {
        let summary = DiscountSummary::compute(dec!(80.00), Some(dec!(60.00)));
        assert_eq!(summary.savings, Some(dec!(20.00)));
        assert_eq!(summary.discount_percent, Some(25));
    }

    #[test]
    fn discount_summary_absent_without_sale() {
        assert_eq!(DiscountSummary::compute(dec!(0), Some(dec!(0))), DiscountSummary::default());
        assert_eq!(DiscountSummary::compute(dec!(80.00), None), DiscountSummary::default());
        assert_eq!(
            DiscountSummary::compute(dec!(80.00), Some(dec!(90.00))),
            DiscountSummary::default()
        );
    }

    #[test]
    fn discount_percent_rounds_half_to_even() {
        // 12.5% -> 12, 37.5% -> 38
        assert_eq!(
            DiscountSummary::compute(dec!(8.00), Some(dec!(7.00))).discount_percent,
            Some(12)
        );
        assert_eq!(
            DiscountSummary::compute(dec!(8.00), Some(dec!(5.00))).discount_percent,
            Some(38)
        );
        // 33.33..% -> 33
        assert_eq!(
            DiscountSummary::compute(dec!(30.00), Some(dec!(20.00))).discount_percent,
            Some(33)
        );
    }

    #[test]
    fn unparsable_input_degrades_to_no_discount() {
        assert_eq!(DiscountSummary::parse("abc", Some("10")), DiscountSummary::default());
        assert_eq!(DiscountSummary::parse("80.00", Some("sixty")), DiscountSummary::default());
        assert_eq!(DiscountSummary::parse("80.00", None), DiscountSummary::default());

        let parsed = DiscountSummary::parse(" 80.00", Some("60.00"));
        assert_eq!(parsed.discount_percent, Some(25));
    }

    #[test]
    fn star_rating_breakdown() {
        assert_eq!(StarRating::from_rating(3.6), StarRating { full: 3, half: 1, empty: 1 });
        assert_eq!(StarRating::from_rating(4.2), StarRating { full: 4, half: 0, empty: 1 });
        assert_eq!(StarRating::from_rating(0.0), StarRating { full: 0, half: 0, empty: 5 });
        assert_eq!(StarRating::from_rating(5.0), StarRating { full: 5, half: 0, empty: 0 });
        assert_eq!(StarRating::from_rating(f64::NAN), StarRating { full: 0, half: 0, empty: 5 });
    }
}
