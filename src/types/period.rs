use serde::{Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A calendar month of a given year. One grid source file covers exactly one `Month`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct Month(pub i32, pub u32);

impl Month {
    pub fn year(self) -> i32 {
        self.0
    }
    pub fn month(self) -> u32 {
        self.1
    }
    pub fn new(month: u32, year: i32) -> Self {
        Self(year, month)
    }

    /// English month name, e.g. "January".
    pub fn name(self) -> &'static str {
        MONTH_NAMES[(self.1 as usize).saturating_sub(1).min(11)]
    }

    /// The `{MonthName}-{year}` stem used by grid source file names.
    pub fn file_stem(self) -> String {
        format!("{}-{}", self.name(), self.0)
    }

    /// Parses a `{month}-{year}` file stem. The month may be a full English month name
    /// or its three-letter abbreviation, in any case.
    pub fn from_file_stem(stem: &str) -> Option<Self> {
        let (month_part, year_part) = stem.rsplit_once('-')?;
        let year: i32 = year_part.trim().parse().ok()?;
        let month_part = month_part.trim().to_ascii_lowercase();
        if month_part.len() < 3 {
            return None;
        }
        let month = MONTH_NAMES.iter().position(|name| {
            let name = name.to_ascii_lowercase();
            name == month_part || (month_part.len() == 3 && name.starts_with(&month_part))
        })?;
        Some(Self(year, month as u32 + 1))
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.0, self.1)
    }
}

/// The time dimension of a skill table row: a single month, or every month of the run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub enum PeriodLabel {
    Month(Month),
    All,
}

impl Display for PeriodLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PeriodLabel::Month(month) => write!(f, "{}", month.file_stem()),
            PeriodLabel::All => write!(f, "ALL"),
        }
    }
}

impl FromStr for Month {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Month::from_file_stem(s).ok_or_else(|| format!("'{s}' is not a '{{month}}-{{year}}' period"))
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Serialize for PeriodLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_stem() {
        assert_eq!(Month::from_file_stem("January-2019"), Some(Month(2019, 1)));
        assert_eq!(Month::from_file_stem("december-2020"), Some(Month(2020, 12)));
        assert_eq!(Month::from_file_stem("Sep-2018"), Some(Month(2018, 9)));
        assert_eq!(Month::from_file_stem("Ju-2018"), None);
        assert_eq!(Month::from_file_stem("Smarch-2018"), None);
        assert_eq!(Month::from_file_stem("March"), None);
    }

    #[test]
    fn test_display_and_ordering() {
        let jan = Month::new(1, 2020);
        let dec = Month::new(12, 2019);
        assert!(dec < jan);
        assert_eq!(jan.to_string(), "2020-01");
        assert_eq!(jan.file_stem(), "January-2020");
        assert_eq!(PeriodLabel::Month(jan).to_string(), "January-2020");
        assert_eq!(PeriodLabel::All.to_string(), "ALL");
        assert!(PeriodLabel::Month(jan) < PeriodLabel::All);
    }

    #[test]
    fn test_serializes_as_text() {
        let jan = Month::new(1, 2020);
        assert_eq!(serde_json::to_string(&jan).unwrap(), "\"2020-01\"");
        assert_eq!(serde_json::to_string(&PeriodLabel::All).unwrap(), "\"ALL\"");
    }
}
