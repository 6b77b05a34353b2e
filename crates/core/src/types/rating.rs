//! Star rating values.

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`RatingValue`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RatingError {
    /// The value is outside `1..=5`.
    #[error("rating must be between {min} and {max}", min = RatingValue::MIN, max = RatingValue::MAX)]
    OutOfRange,
    /// The value has a fractional part.
    #[error("rating must be a whole number")]
    NotWhole,
}

/// A single star rating, always in `1..=5`.
///
/// Deserializing goes through [`RatingValue::new`] so an out-of-range value can
/// never be observed by the ledger.
///
/// ```
/// use store_ratings_core::RatingValue;
///
/// assert_eq!(RatingValue::new(4).unwrap().get(), 4);
/// assert!(RatingValue::new(0).is_err());
/// assert!(RatingValue::new(6).is_err());
/// assert!(RatingValue::from_f64(3.5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct RatingValue(u8);

impl RatingValue {
    /// Lowest allowed rating.
    pub const MIN: u8 = 1;
    /// Highest allowed rating.
    pub const MAX: u8 = 5;

    /// Validate an integer rating.
    ///
    /// # Errors
    ///
    /// Returns `RatingError::OutOfRange` unless `1 <= value <= 5`.
    pub fn new(value: i64) -> Result<Self, RatingError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(RatingError::OutOfRange)
    }

    /// Validate a rating that arrived as a JSON number.
    ///
    /// # Errors
    ///
    /// Returns `RatingError::NotWhole` for fractional values and
    /// `RatingError::OutOfRange` for anything outside `1..=5`.
    #[allow(clippy::cast_possible_truncation)] // checked to be a small whole number first
    pub fn from_f64(value: f64) -> Result<Self, RatingError> {
        if !value.is_finite() || value < f64::from(Self::MIN) || value > f64::from(Self::MAX) {
            return Err(RatingError::OutOfRange);
        }
        if value.fract() != 0.0 {
            return Err(RatingError::NotWhole);
        }
        Self::new(value as i64)
    }

    /// The rating as a plain number.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for RatingValue {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RatingValue> for u8 {
    fn from(value: RatingValue) -> Self {
        value.0
    }
}

impl From<RatingValue> for f64 {
    fn from(value: RatingValue) -> Self {
        Self::from(value.0)
    }
}

impl std::fmt::Display for RatingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Stored as SMALLINT with a CHECK (value BETWEEN 1 AND 5)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for RatingValue {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i16 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i16 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for RatingValue {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <i16 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(i64::from(raw))?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for RatingValue {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i16 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&i16::from(self.0), buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_inclusive() {
        assert_eq!(RatingValue::new(1).unwrap().get(), 1);
        assert_eq!(RatingValue::new(5).unwrap().get(), 5);
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(RatingValue::new(0), Err(RatingError::OutOfRange));
        assert_eq!(RatingValue::new(6), Err(RatingError::OutOfRange));
        assert_eq!(RatingValue::new(-3), Err(RatingError::OutOfRange));
        assert_eq!(RatingValue::new(i64::MAX), Err(RatingError::OutOfRange));
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(RatingValue::from_f64(4.0).unwrap().get(), 4);
        assert_eq!(RatingValue::from_f64(2.5), Err(RatingError::NotWhole));
        assert_eq!(RatingValue::from_f64(5.5), Err(RatingError::OutOfRange));
        assert_eq!(RatingValue::from_f64(f64::NAN), Err(RatingError::OutOfRange));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: RatingValue = serde_json::from_str("3").unwrap();
        assert_eq!(ok.get(), 3);
        assert!(serde_json::from_str::<RatingValue>("9").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "3");
    }
}
