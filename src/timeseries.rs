//! Monthly resampling of shipment value

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::data::ShipmentRecord;

/// Calendar month key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    /// 1..=12
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    /// The following calendar month
    pub fn succ(self) -> Self {
        if self.month == 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    /// Short dashboard label, e.g. `Oct 2025`
    pub fn label(&self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%b %Y").to_string())
            .unwrap_or_else(|| self.to_string())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Contiguous monthly totals in ascending order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlySeries {
    pub months: Vec<YearMonth>,
    pub totals: Vec<f64>,
}

impl MonthlySeries {
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn last_month(&self) -> Option<YearMonth> {
        self.months.last().copied()
    }
}

/// Sum shipment value per calendar month
///
/// Months between the first and last shipment that saw no activity are
/// present with a total of zero, so consecutive entries are always one
/// calendar month apart.
pub fn monthly_totals(records: &[ShipmentRecord]) -> MonthlySeries {
    let mut sums: BTreeMap<YearMonth, f64> = BTreeMap::new();
    for record in records {
        *sums.entry(YearMonth::from_date(record.date)).or_insert(0.0) += record.value;
    }

    let (first, last) = match (sums.keys().next(), sums.keys().next_back()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return MonthlySeries::default(),
    };

    let mut series = MonthlySeries::default();
    let mut month = first;
    while month <= last {
        series.months.push(month);
        series.totals.push(sums.get(&month).copied().unwrap_or(0.0));
        month = month.succ();
    }
    series
}
