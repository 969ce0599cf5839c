//! Discount schedule handling for benefit streams
//!
//! Supports:
//! - Flat annual rate over a year range
//! - Year-by-year rate tables
//!
//! Discount factors compound annually from the schedule's first year, so the
//! first covered year is already discounted by one full year.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};

/// Inclusive range of calendar years over which benefits accrue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HorizonYears")]
pub struct Horizon {
    pub start_year: i32,
    pub end_year: i32,
}

#[derive(Deserialize)]
struct HorizonYears {
    start_year: i32,
    end_year: i32,
}

impl TryFrom<HorizonYears> for Horizon {
    type Error = RiskError;

    fn try_from(years: HorizonYears) -> Result<Self> {
        Self::new(years.start_year, years.end_year)
    }
}

impl Horizon {
    pub fn new(start_year: i32, end_year: i32) -> Result<Self> {
        let horizon = Self {
            start_year,
            end_year,
        };
        horizon.validate()?;
        Ok(horizon)
    }

    pub fn validate(&self) -> Result<()> {
        if self.end_year < self.start_year {
            return Err(RiskError::InvalidHorizon {
                start_year: self.start_year,
                end_year: self.end_year,
            });
        }
        Ok(())
    }

    /// Number of years in the horizon
    pub fn len(&self) -> usize {
        (i64::from(self.end_year) - i64::from(self.start_year) + 1).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start_year..=self.end_year
    }
}

/// Year-indexed annual discount rates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RateTable")]
pub struct DiscountSchedule {
    /// First covered year
    start_year: i32,

    /// Annual rate for each year from `start_year`, contiguous
    rates: Vec<f64>,
}

#[derive(Deserialize)]
struct RateTable {
    start_year: i32,
    rates: Vec<f64>,
}

impl TryFrom<RateTable> for DiscountSchedule {
    type Error = RiskError;

    fn try_from(table: RateTable) -> Result<Self> {
        let entries = table
            .rates
            .iter()
            .enumerate()
            .map(|(offset, &rate)| {
                i32::try_from(offset)
                    .ok()
                    .and_then(|offset| table.start_year.checked_add(offset))
                    .map(|year| (year, rate))
                    .ok_or_else(|| {
                        RiskError::InvalidDiscountSchedule(format!(
                            "{} rates from {} run past the last representable year",
                            table.rates.len(),
                            table.start_year
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(&entries)
    }
}

impl DiscountSchedule {
    /// Build from (year, rate) pairs; years must increase by exactly one
    pub fn new(entries: &[(i32, f64)]) -> Result<Self> {
        let Some(&(start_year, _)) = entries.first() else {
            return Err(RiskError::InvalidDiscountSchedule("no years".to_string()));
        };

        for pair in entries.windows(2) {
            if pair[0].0.checked_add(1) != Some(pair[1].0) {
                return Err(RiskError::InvalidDiscountSchedule(format!(
                    "year {} follows {}; years must be contiguous",
                    pair[1].0, pair[0].0
                )));
            }
        }
        for &(year, rate) in entries {
            if !rate.is_finite() || rate <= -1.0 {
                return Err(RiskError::InvalidDiscountSchedule(format!(
                    "rate {} for year {} is invalid",
                    rate, year
                )));
            }
        }

        Ok(Self {
            start_year,
            rates: entries.iter().map(|&(_, rate)| rate).collect(),
        })
    }

    /// Single rate for every year in `start_year..=end_year`
    pub fn flat(start_year: i32, end_year: i32, annual_rate: f64) -> Result<Self> {
        Horizon::new(start_year, end_year)?;
        let entries: Vec<(i32, f64)> = (start_year..=end_year).map(|y| (y, annual_rate)).collect();
        Self::new(&entries)
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    pub fn end_year(&self) -> i32 {
        // Construction guarantees the last year fits in i32
        self.start_year + (self.rates.len() as i32 - 1)
    }

    /// Rate for a given year, if covered
    pub fn rate(&self, year: i32) -> Option<f64> {
        let offset = year.checked_sub(self.start_year)?;
        usize::try_from(offset)
            .ok()
            .and_then(|idx| self.rates.get(idx).copied())
    }

    /// (year, rate) pairs in year order
    pub fn entries(&self) -> Vec<(i32, f64)> {
        self.rates
            .iter()
            .enumerate()
            .map(|(offset, &rate)| (self.start_year + offset as i32, rate))
            .collect()
    }

    /// Fail with `DiscountScheduleGap` unless every horizon year is covered
    pub fn check_covers(&self, horizon: &Horizon) -> Result<()> {
        horizon.validate()?;
        if horizon.start_year < self.start_year || horizon.end_year > self.end_year() {
            return Err(RiskError::DiscountScheduleGap {
                covered_start: self.start_year,
                covered_end: self.end_year(),
                horizon_start: horizon.start_year,
                horizon_end: horizon.end_year,
            });
        }
        Ok(())
    }

    /// Discount factor for each horizon year:
    /// prod over k = start_year..=year of 1 / (1 + rate_k)
    pub fn discount_factors(&self, horizon: &Horizon) -> Result<Vec<(i32, f64)>> {
        self.check_covers(horizon)?;

        let mut factor = 1.0;
        let mut factors = Vec::with_capacity(horizon.len());
        for (year, rate) in self.entries() {
            if year > horizon.end_year {
                break;
            }
            factor /= 1.0 + rate;
            if year >= horizon.start_year {
                factors.push((year, factor));
            }
        }
        Ok(factors)
    }

    /// Present value of a constant annual amount received in every horizon year
    pub fn pv_level_stream(&self, annual_amount: f64, horizon: &Horizon) -> Result<f64> {
        Ok(self
            .discount_factors(horizon)?
            .iter()
            .map(|(_, factor)| annual_amount * factor)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_schedule() {
        let schedule = DiscountSchedule::flat(2016, 2072, 0.02).unwrap();
        assert_eq!(schedule.start_year(), 2016);
        assert_eq!(schedule.end_year(), 2072);
        assert_eq!(schedule.rate(2040), Some(0.02));
        assert_eq!(schedule.rate(2015), None);
        assert_eq!(schedule.rate(2073), None);
        assert_eq!(schedule.entries().len(), 57);
    }

    #[test]
    fn test_rejects_gaps_and_bad_rates() {
        assert!(matches!(
            DiscountSchedule::new(&[(2020, 0.02), (2022, 0.02)]),
            Err(RiskError::InvalidDiscountSchedule(_))
        ));
        assert!(DiscountSchedule::new(&[(2020, 0.02), (2020, 0.02)]).is_err());
        assert!(DiscountSchedule::new(&[(2020, -1.0)]).is_err());
        assert!(DiscountSchedule::new(&[]).is_err());
    }

    #[test]
    fn test_discount_factors_compound_from_first_year() {
        let schedule = DiscountSchedule::new(&[(2020, 0.10), (2021, 0.05), (2022, 0.02)]).unwrap();
        let factors = schedule.discount_factors(&Horizon::new(2021, 2022).unwrap()).unwrap();

        assert_eq!(factors.len(), 2);
        assert_eq!(factors[0].0, 2021);
        assert_relative_eq!(factors[0].1, 1.0 / (1.10 * 1.05), epsilon = 1e-12);
        assert_relative_eq!(factors[1].1, 1.0 / (1.10 * 1.05 * 1.02), epsilon = 1e-12);
    }

    #[test]
    fn test_level_stream() {
        let schedule = DiscountSchedule::flat(2016, 2025, 0.02).unwrap();
        let pv = schedule
            .pv_level_stream(10_000.0, &Horizon::new(2016, 2025).unwrap())
            .unwrap();
        // 10,000 * annuity-immediate factor at 2% for 10 years
        let expected = 10_000.0 * (1.0 - 1.02_f64.powi(-10)) / 0.02;
        assert_relative_eq!(pv, expected, max_relative = 1e-12);
        assert_relative_eq!(pv, 89_825.85, epsilon = 0.01);
    }

    #[test]
    fn test_horizon_beyond_schedule() {
        let schedule = DiscountSchedule::flat(2016, 2025, 0.02).unwrap();
        let result = schedule.discount_factors(&Horizon::new(2016, 2030).unwrap());
        assert!(matches!(
            result,
            Err(RiskError::DiscountScheduleGap {
                covered_end: 2025,
                horizon_end: 2030,
                ..
            })
        ));
        assert!(schedule.check_covers(&Horizon::new(2010, 2020).unwrap()).is_err());
    }

    #[test]
    fn test_horizon() {
        let horizon = Horizon::new(2016, 2065).unwrap();
        assert_eq!(horizon.len(), 50);
        assert_eq!(horizon.years().next(), Some(2016));
        assert!(Horizon::new(2020, 2019).is_err());
    }

    #[test]
    fn test_horizon_len_at_year_extremes() {
        let horizon = Horizon::new(i32::MIN, i32::MAX).unwrap();
        assert_eq!(horizon.len() as u64, 1u64 << 32);
        assert_eq!(Horizon::new(i32::MAX, i32::MAX).unwrap().len(), 1);
    }

    #[test]
    fn test_schedule_ending_at_last_year() {
        let schedule = DiscountSchedule::new(&[(i32::MAX - 1, 0.02), (i32::MAX, 0.03)]).unwrap();
        assert_eq!(schedule.end_year(), i32::MAX);
        assert_eq!(schedule.entries(), vec![(i32::MAX - 1, 0.02), (i32::MAX, 0.03)]);
        assert!(DiscountSchedule::new(&[(i32::MAX, 0.02), (i32::MIN, 0.02)]).is_err());
    }

    #[test]
    fn test_json_goes_through_validation() {
        let schedule: DiscountSchedule =
            serde_json::from_str(r#"{"start_year": 2016, "rates": [0.02, 0.03]}"#).unwrap();
        assert_eq!(schedule.end_year(), 2017);
        assert_eq!(schedule.rate(2017), Some(0.03));

        for bad in [
            r#"{"start_year": 2016, "rates": [-1.0]}"#,
            r#"{"start_year": 2016, "rates": []}"#,
            r#"{"start_year": 2147483647, "rates": [0.02, 0.02]}"#,
        ] {
            let error = serde_json::from_str::<DiscountSchedule>(bad).unwrap_err();
            assert!(error.to_string().contains("invalid discount schedule"), "{}", error);
        }

        let horizon: Horizon =
            serde_json::from_str(r#"{"start_year": 2016, "end_year": 2065}"#).unwrap();
        assert_eq!(horizon.len(), 50);
        assert!(serde_json::from_str::<Horizon>(r#"{"start_year": 2066, "end_year": 2065}"#).is_err());
    }
}
