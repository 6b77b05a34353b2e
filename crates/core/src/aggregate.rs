//! Rating aggregation.
//!
//! Averages are never stored. Every view recomputes them from the rating rows
//! it can see, so there is no denormalized column to keep in sync.
//!
//! Pooling matters: an owner's average across several stores is the mean of
//! every individual rating on those stores, not the mean of each store's
//! average. Callers pool values first and call [`average`] once.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::RatingValue;

/// Number of decimal places used when an average is shown to a person.
pub const DISPLAY_DECIMAL_PLACES: u32 = 2;

/// Arithmetic mean of a sequence of ratings.
///
/// An empty sequence averages to `0.0`.
///
/// ```
/// use store_ratings_core::{RatingValue, average};
///
/// let ratings = [5, 1, 1].map(|v| RatingValue::new(v).unwrap());
/// assert!((average(ratings) - 7.0 / 3.0).abs() < 1e-9);
/// assert_eq!(average(Vec::<RatingValue>::new()), 0.0);
/// ```
pub fn average<I>(values: I) -> f64
where
    I: IntoIterator<Item = RatingValue>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0_u64, 0_u32), |(sum, count), value| {
            (sum + u64::from(value.get()), count.saturating_add(1))
        });

    if count == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)] // sums of ratings stay far below 2^52
    let sum = sum as f64;
    sum / f64::from(count)
}

/// Round an average for display.
///
/// Half-way values round away from zero, matching how averages have always
/// been shown in the admin listings (`2.345` becomes `2.35`).
#[must_use]
pub fn round_for_display(avg: f64) -> Decimal {
    Decimal::from_f64_retain(avg)
        .unwrap_or_default()
        .round_dp_with_strategy(DISPLAY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}
