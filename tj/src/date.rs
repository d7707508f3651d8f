//! World calendar and renewal periods
//!
//! The host calendar has four 28-day seasons per year and a 7-day week that
//! starts on day 1 of every season.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DAYS_PER_WEEK: u32 = 7;
pub const DAYS_PER_SEASON: u32 = 28;
pub const SEASONS_PER_YEAR: u32 = 4;
pub const DAYS_PER_YEAR: u32 = DAYS_PER_SEASON * SEASONS_PER_YEAR;

/// Errors from parsing a date or period
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateParseError {
    #[error("Unknown season: {0}")]
    UnknownSeason(String),

    #[error("Invalid day '{0}' (expected 1-28)")]
    InvalidDay(String),

    #[error("Invalid year '{0}' (expected 1 or later)")]
    InvalidYear(String),

    #[error("Expected '<season> <day> [year]', got '{0}'")]
    Malformed(String),

    #[error("Unknown renew period: {0}")]
    UnknownPeriod(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    #[default]
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    /// Zero-based index within the year
    pub fn index(self) -> u32 {
        match self {
            Season::Spring => 0,
            Season::Summer => 1,
            Season::Fall => 2,
            Season::Winter => 3,
        }
    }

    /// Season for a zero-based index, wrapping past winter
    pub fn from_index(index: u32) -> Self {
        Self::ALL[(index % SEASONS_PER_YEAR) as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
            Season::Winter => "winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Season {
    type Err = DateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "fall" | "autumn" => Ok(Season::Fall),
            "winter" => Ok(Season::Winter),
            other => Err(DateParseError::UnknownSeason(other.to_string())),
        }
    }
}

/// A date on the world calendar
///
/// Missing fields decode to spring 1 of year 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldDate {
    pub season: Season,
    pub day: u32,
    pub year: u32,
}

impl Default for WorldDate {
    fn default() -> Self {
        Self {
            season: Season::Spring,
            day: 1,
            year: 1,
        }
    }
}

impl WorldDate {
    /// Create a date, clamping the day to 1..=28 and the year to at least 1
    pub fn new(year: u32, season: Season, day: u32) -> Self {
        Self {
            season,
            day: day.clamp(1, DAYS_PER_SEASON),
            year: year.max(1),
        }
    }

    /// Days elapsed since spring 1 of year 1
    pub fn total_days(&self) -> u64 {
        u64::from(self.year.max(1) - 1) * u64::from(DAYS_PER_YEAR) + u64::from(self.day_of_year())
    }

    /// Inverse of [`WorldDate::total_days`]
    ///
    /// Saturates at the last day of year `u32::MAX`.
    pub fn from_total_days(total: u64) -> Self {
        let days_per_year = u64::from(DAYS_PER_YEAR);
        let total = total.min(u64::from(u32::MAX) * days_per_year - 1);
        let year = (total / days_per_year + 1) as u32;
        let day_of_year = (total % days_per_year) as u32;
        Self {
            season: Season::from_index(day_of_year / DAYS_PER_SEASON),
            day: day_of_year % DAYS_PER_SEASON + 1,
            year,
        }
    }

    /// Zero-based day within the year
    pub fn day_of_year(&self) -> u32 {
        self.season.index() * DAYS_PER_SEASON + self.day.clamp(1, DAYS_PER_SEASON) - 1
    }

    /// Day of the week, 1 (Monday) through 7 (Sunday)
    pub fn day_of_week(&self) -> u32 {
        (self.day.clamp(1, DAYS_PER_SEASON) - 1) % DAYS_PER_WEEK + 1
    }

    pub fn add_days(&self, days: u32) -> Self {
        Self::from_total_days(self.total_days().saturating_add(u64::from(days)))
    }

    pub fn tomorrow(&self) -> Self {
        self.add_days(1)
    }
}

impl PartialOrd for WorldDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WorldDate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.total_days().cmp(&other.total_days())
    }
}

impl fmt::Display for WorldDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}, year {}", self.season, self.day, self.year)
    }
}

impl FromStr for WorldDate {
    type Err = DateParseError;

    /// Parse `"<season> <day>[, year <year>]"`; parts may also be separated by `-` or `/`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s
            .split(|c: char| c.is_whitespace() || c == '-' || c == '/' || c == ',')
            .filter(|p| !p.is_empty() && !p.eq_ignore_ascii_case("year"))
            .collect();

        let (season, day, year) = match parts.as_slice() {
            [season, day] => (*season, *day, None),
            [season, day, year] => (*season, *day, Some(*year)),
            _ => return Err(DateParseError::Malformed(s.to_string())),
        };

        let season: Season = season.parse()?;
        let day: u32 = day
            .parse()
            .ok()
            .filter(|d| (1..=DAYS_PER_SEASON).contains(d))
            .ok_or_else(|| DateParseError::InvalidDay(day.to_string()))?;
        let year: u32 = match year {
            Some(y) => y
                .trim_start_matches(['y', 'Y'])
                .parse()
                .ok()
                .filter(|y| *y >= 1)
                .ok_or_else(|| DateParseError::InvalidYear(y.to_string()))?,
            None => 1,
        };

        Ok(Self { season, day, year })
    }
}

/// How often a completed task comes back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Never,
    Weekly,
    Monthly,
    Annually,
}

impl Period {
    pub fn is_renewing(self) -> bool {
        self != Period::Never
    }

    /// Days from `today` until the next occurrence of `target` for this period
    ///
    /// Renewing periods are cyclic: weekly compares weekdays, monthly compares
    /// days of the season, annually compares days of the year. The result is
    /// then in `0..cycle`, where 0 means the renewal is due today. For `Never`
    /// the absolute difference in days is returned and may be negative.
    pub fn days_until(self, today: WorldDate, target: WorldDate) -> i64 {
        let diff = |a: u32, b: u32| i64::from(a) - i64::from(b);
        match self {
            // total_days stays below 2^39, so both fit in i64
            Period::Never => target.total_days() as i64 - today.total_days() as i64,
            Period::Weekly => {
                diff(target.day_of_week(), today.day_of_week()).rem_euclid(i64::from(DAYS_PER_WEEK))
            }
            Period::Monthly => {
                diff(target.day, today.day).rem_euclid(i64::from(DAYS_PER_SEASON))
            }
            Period::Annually => {
                diff(target.day_of_year(), today.day_of_year()).rem_euclid(i64::from(DAYS_PER_YEAR))
            }
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Period::Never => "never",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::Annually => "annually",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Period {
    type Err = DateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "never" | "none" => Ok(Period::Never),
            "weekly" => Ok(Period::Weekly),
            "monthly" => Ok(Period::Monthly),
            "annually" | "yearly" => Ok(Period::Annually),
            other => Err(DateParseError::UnknownPeriod(other.to_string())),
        }
    }
}
