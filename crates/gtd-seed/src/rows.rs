//! Bulk-seed row deserialization.
//!
//! The seed file is a JSON array of objects keyed by GTD column names. Cells
//! arrive as strings, numbers, booleans or null, and every accessor reads them
//! through their text form so the parsing rules are the same whatever the
//! exporter produced.

use chrono::{Days, NaiveDate};
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_YEAR: i64 = 1900;

/// One spreadsheet cell.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Blank,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Cell {
    /// Text form. Whole numbers keep a trailing `.0` (`2001` → `"2001.0"`).
    pub fn text(&self) -> String {
        match self {
            Cell::Blank => String::new(),
            Cell::Bool(b) => b.to_string(),
            Cell::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e7 => {
                format!("{n:.1}")
            }
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }

    /// Parsed as floating point, if the text is a finite number.
    pub fn number(&self) -> Option<f64> {
        self.text().parse::<f64>().ok().filter(|n| n.is_finite())
    }

    /// Integer by truncation, or `default` when unparseable.
    pub fn int_or(&self, default: i64) -> i64 {
        self.number().map(|n| n.trunc() as i64).unwrap_or(default)
    }

    /// `true` only for `1` / `1.0`.
    pub fn flag(&self) -> bool {
        matches!(self.text().as_str(), "1" | "1.0")
    }
}

/// One incident row.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedRow {
    pub iyear: Cell,
    pub imonth: Cell,
    pub iday: Cell,
    pub region_txt: Cell,
    pub country_txt: Cell,
    pub provstate: Cell,
    pub city: Cell,
    pub latitude: Cell,
    pub longitude: Cell,
    pub summary: Cell,
    pub motive: Cell,
    pub multiple: Cell,
    pub success: Cell,
    pub suicide: Cell,
    pub target1: Cell,
    pub gname: Cell,
}

impl SeedRow {
    /// Incident date. Missing parts default to 1900 / January / 1st, and a
    /// day past the end of the month rolls into the next one.
    pub fn event_date(&self) -> NaiveDate {
        let year = self.iyear.int_or(DEFAULT_YEAR);
        let month = Some(self.imonth.int_or(1))
            .filter(|m| (1..=12).contains(m))
            .unwrap_or(1);
        let day = Some(self.iday.int_or(1))
            .filter(|d| (1..=31).contains(d))
            .unwrap_or(1);

        i32::try_from(year)
            .ok()
            .and_then(|y| NaiveDate::from_ymd_opt(y, month as u32, 1))
            .and_then(|first| first.checked_add_days(Days::new(day as u64 - 1)))
            .or_else(|| NaiveDate::from_ymd_opt(DEFAULT_YEAR as i32, 1, 1))
            .unwrap_or_default()
    }

    pub fn latitude(&self) -> f64 {
        self.latitude.number().unwrap_or(0.0)
    }

    pub fn longitude(&self) -> f64 {
        self.longitude.number().unwrap_or(0.0)
    }
}

/// Parse a seed document.
pub fn parse_rows(json: &str) -> Result<Vec<SeedRow>> {
    Ok(serde_json::from_str(json)?)
}
