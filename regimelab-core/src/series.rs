//! Price and ratio series types.
//!
//! Every series in this crate is ordered most-recent-first. The ordering is
//! carried by `ReverseChronoSeries<T>` so that indexing `[0]` always means
//! "latest observation" and `[n]` means "n periods back".

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// A single daily bar as delivered by the market-data collaborator.
///
/// Only `date` and `close` are required. When `adj_close` is present it takes
/// precedence over `close` (see [`PricePoint::effective_close`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
    #[serde(
        rename = "adjClose",
        alias = "adj_close",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub adj_close: Option<f64>,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            close,
            adj_close: None,
        }
    }

    pub fn with_adj_close(mut self, adj_close: f64) -> Self {
        self.adj_close = Some(adj_close);
        self
    }

    /// Adjusted close if the provider supplied one, raw close otherwise.
    pub fn effective_close(&self) -> f64 {
        self.adj_close.unwrap_or(self.close)
    }
}

/// One observation per calendar month (the latest bar of that month).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl MonthlyPoint {
    pub fn month_key(&self) -> MonthKey {
        MonthKey::of(self.date)
    }
}

/// Numerator/denominator ratio for one aligned month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Calendar month identity used for alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

/// Items that carry a date, so a series can be re-sorted into canonical order.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for PricePoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for MonthlyPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for RatioPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Sequence ordered most-recent-first.
///
/// Derefs to `[T]`, so `series[0]` is the latest point. Construct from dated
/// items with [`ReverseChronoSeries::from_unordered`], or from values already
/// known to be in reverse-chronological order with
/// [`ReverseChronoSeries::from_most_recent_first`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReverseChronoSeries<T> {
    items: Vec<T>,
}

impl<T> ReverseChronoSeries<T> {
    pub fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// Wrap a vector the caller guarantees is already most-recent-first.
    pub fn from_most_recent_first(items: Vec<T>) -> Self {
        Self { items }
    }

    /// Most recent item, if any.
    pub fn latest(&self) -> Option<&T> {
        self.items.first()
    }

    /// Map every item, preserving order.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> ReverseChronoSeries<U> {
        ReverseChronoSeries {
            items: self.items.iter().map(f).collect(),
        }
    }
}

impl<T: Dated> ReverseChronoSeries<T> {
    /// Sort dated items into most-recent-first order.
    ///
    /// The sort is stable, so among duplicate dates the caller's relative
    /// order is kept.
    pub fn from_unordered(mut items: Vec<T>) -> Self {
        items.sort_by_key(|item| std::cmp::Reverse(item.date()));
        Self { items }
    }
}

impl<T> Default for ReverseChronoSeries<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Deref for ReverseChronoSeries<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<'a, T> IntoIterator for &'a ReverseChronoSeries<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Daily history for one instrument, most-recent-first.
pub type DailyHistory = ReverseChronoSeries<PricePoint>;
/// Monthly closes, most-recent-first.
pub type MonthlySeries = ReverseChronoSeries<MonthlyPoint>;
/// Aligned monthly ratios, most-recent-first.
pub type RatioSeries = ReverseChronoSeries<RatioPoint>;

impl RatioSeries {
    /// Raw ratio values, most-recent-first.
    pub fn values(&self) -> ReverseChronoSeries<f64> {
        self.map(|p| p.value)
    }
}
