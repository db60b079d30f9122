use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::numeric::parse_decimal;

/// Italian VAT rates offered for selection (`AliquotaIVA`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum VatRate {
    /// 4% (aliquota minima)
    Minimum,
    /// 5%
    Reduced5,
    /// 10%
    Reduced10,
    /// 22% (aliquota ordinaria)
    #[default]
    Standard,
}

impl VatRate {
    /// All selectable rates in ascending order.
    pub const ALL: [VatRate; 4] = [
        VatRate::Minimum,
        VatRate::Reduced5,
        VatRate::Reduced10,
        VatRate::Standard,
    ];

    /// Text as written in the document, e.g. "22.00".
    pub fn as_str(self) -> &'static str {
        match self {
            VatRate::Minimum => "4.00",
            VatRate::Reduced5 => "5.00",
            VatRate::Reduced10 => "10.00",
            VatRate::Standard => "22.00",
        }
    }

    /// Rate as a percentage value.
    pub fn percent(self) -> Decimal {
        match self {
            VatRate::Minimum => Decimal::from(4),
            VatRate::Reduced5 => Decimal::from(5),
            VatRate::Reduced10 => Decimal::from(10),
            VatRate::Standard => Decimal::from(22),
        }
    }

    /// Rate to preselect for a stored `AliquotaIVA` value.
    ///
    /// An exact textual match wins. Otherwise the nearest rate by absolute
    /// difference is chosen; when two rates are equally near, the lower one
    /// (first in [`VatRate::ALL`]) wins. Empty or unparseable text selects 22%.
    pub fn nearest(stored: &str) -> VatRate {
        let stored = stored.trim();
        if let Some(exact) = Self::ALL.iter().find(|r| r.as_str() == stored) {
            return *exact;
        }
        let Ok(value) = parse_decimal(stored) else {
            return VatRate::Standard;
        };

        let mut best = VatRate::ALL[0];
        let mut best_distance = (best.percent() - value).abs();
        for rate in &Self::ALL[1..] {
            let distance = (rate.percent() - value).abs();
            if distance < best_distance {
                best = *rate;
                best_distance = distance;
            }
        }
        best
    }
}

impl fmt::Display for VatRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match() {
        assert_eq!(VatRate::nearest("10.00"), VatRate::Reduced10);
        assert_eq!(VatRate::nearest("4.00"), VatRate::Minimum);
    }

    #[test]
    fn nearest_by_distance() {
        assert_eq!(VatRate::nearest("7.00"), VatRate::Reduced5);
        assert_eq!(VatRate::nearest("22"), VatRate::Standard);
        assert_eq!(VatRate::nearest("0.00"), VatRate::Minimum);
        assert_eq!(VatRate::nearest("15"), VatRate::Reduced10);
        assert_eq!(VatRate::nearest("17"), VatRate::Standard);
    }

    #[test]
    fn tie_prefers_lower_rate() {
        assert_eq!(VatRate::nearest("7.50"), VatRate::Reduced5);
        assert_eq!(VatRate::nearest("16"), VatRate::Reduced10);
    }

    #[test]
    fn empty_or_garbage_defaults_to_standard() {
        assert_eq!(VatRate::nearest(""), VatRate::Standard);
        assert_eq!(VatRate::nearest("n/a"), VatRate::Standard);
    }
}
