use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Calendar month key used by occupancy rows and the working-days table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown month '{0}'")]
pub struct UnknownMonth(pub String);

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// Zero-based position, January = 0.
    pub fn index(self) -> usize {
        self as usize
    }

    /// One-based month number as used by `chrono`.
    pub fn number(self) -> u32 {
        self.index() as u32 + 1
    }

    pub fn from_number(number: u32) -> Option<Self> {
        if (1..=12).contains(&number) {
            Some(Self::ALL[(number - 1) as usize])
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Month::January => "january",
            Month::February => "february",
            Month::March => "march",
            Month::April => "april",
            Month::May => "may",
            Month::June => "june",
            Month::July => "july",
            Month::August => "august",
            Month::September => "september",
            Month::October => "october",
            Month::November => "november",
            Month::December => "december",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Month::January => "jan",
            Month::February => "feb",
            Month::March => "mar",
            Month::April => "apr",
            Month::May => "may",
            Month::June => "jun",
            Month::July => "jul",
            Month::August => "aug",
            Month::September => "sep",
            Month::October => "oct",
            Month::November => "nov",
            Month::December => "dec",
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Month {
    type Err = UnknownMonth;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = value.trim().to_ascii_lowercase();
        if let Ok(number) = key.parse::<u32>() {
            return Self::from_number(number).ok_or_else(|| UnknownMonth(value.to_string()));
        }
        Self::ALL
            .into_iter()
            .find(|month| month.as_str() == key || month.short_name() == key)
            .ok_or_else(|| UnknownMonth(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_short_and_numeric_keys() {
        assert_eq!("january".parse::<Month>().unwrap(), Month::January);
        assert_eq!("Feb".parse::<Month>().unwrap(), Month::February);
        assert_eq!(" 12 ".parse::<Month>().unwrap(), Month::December);
        assert!("13".parse::<Month>().is_err());
        assert!("smarch".parse::<Month>().is_err());
    }

    #[test]
    fn index_and_number_agree() {
        for (idx, month) in Month::ALL.into_iter().enumerate() {
            assert_eq!(month.index(), idx);
            assert_eq!(Month::from_number(month.number()), Some(month));
        }
    }
}
