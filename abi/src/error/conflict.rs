// exclusion violation detail as reported by postgres:
// "Key (room_id, stay)=(101, [2024-12-24,2024-12-27)) conflicts with existing key (room_id, stay)=(101, [2024-12-20,2024-12-25))."

use chrono::NaiveDate;
use regex::Regex;
use std::{collections::HashMap, convert::Infallible, str::FromStr};

use crate::{Booking, RoomId, StaySpan};

const DETAIL_PATTERN: &str = r#"\((?P<k1>[a-zA-Z0-9_-]+)\s*,\s*(?P<k2>[a-zA-Z0-9_-]+)\)=\((?P<v1>[a-zA-Z0-9_-]+)\s*,\s*\[(?P<v2>[^\)\]]+)"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictInfo {
    Parsed(BookingConflict),
    Unparsed(String),
}

/// The stay that was requested and the live stay it ran into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingConflict {
    pub new: BookingWindow,
    pub old: BookingWindow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingWindow {
    pub room_id: RoomId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl BookingWindow {
    pub fn new(room_id: RoomId, stay: StaySpan) -> Self {
        Self {
            room_id,
            check_in: stay.check_in(),
            check_out: stay.check_out(),
        }
    }
}

impl ConflictInfo {
    pub fn between(room_id: RoomId, requested: StaySpan, existing: &Booking) -> Self {
        Self::Parsed(BookingConflict {
            new: BookingWindow::new(room_id, requested),
            old: BookingWindow::new(existing.room_id, existing.stay),
        })
    }

    pub fn from_detail(detail: &str) -> Self {
        match detail.parse::<BookingConflict>() {
            Ok(conflict) => Self::Parsed(conflict),
            Err(()) => Self::Unparsed(detail.to_string()),
        }
    }
}

impl FromStr for ConflictInfo {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_detail(s))
    }
}

impl FromStr for BookingConflict {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParsedInfo::from_str(s)?.try_into()
    }
}

impl TryFrom<ParsedInfo> for BookingConflict {
    type Error = ();

    fn try_from(value: ParsedInfo) -> Result<Self, Self::Error> {
        Ok(Self {
            new: value.new.try_into()?,
            old: value.old.try_into()?,
        })
    }
}

impl TryFrom<HashMap<String, String>> for BookingWindow {
    type Error = ();

    fn try_from(value: HashMap<String, String>) -> Result<Self, Self::Error> {
        let stay_str = value.get("stay").ok_or(())?.replace('"', "");

        let mut split = stay_str.splitn(2, ',');
        let check_in = parse_date(split.next().ok_or(())?)?;
        let check_out = parse_date(split.next().ok_or(())?)?;

        Ok(Self {
            room_id: value.get("room_id").ok_or(())?.parse().map_err(|_| ())?,
            check_in,
            check_out,
        })
    }
}

struct ParsedInfo {
    new: HashMap<String, String>,
    old: HashMap<String, String>,
}

impl FromStr for ParsedInfo {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let re = Regex::new(DETAIL_PATTERN).map_err(|_| ())?;

        let mut maps: Vec<HashMap<String, String>> = re
            .captures_iter(s)
            .map(|cap| {
                HashMap::from([
                    (cap["k1"].to_string(), cap["v1"].to_string()),
                    (cap["k2"].to_string(), cap["v2"].to_string()),
                ])
            })
            .collect();

        if maps.len() != 2 {
            return Err(());
        }

        let old = maps.pop().ok_or(())?;
        let new = maps.pop().ok_or(())?;
        Ok(Self { new, old })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, ()> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| ())
}
