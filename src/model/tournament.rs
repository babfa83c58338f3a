use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use itertools::Itertools;
use serde::Serialize;
use strum_macros::EnumString;

/// Game mode inferred from a tournament's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumString, strum_macros::Display)]
#[strum(ascii_case_insensitive)]
pub enum GameFormat {
    #[strum(serialize = "ARAM")]
    Aram,
    #[strum(serialize = "1v1")]
    OneVsOne,
    #[strum(serialize = "3v3")]
    ThreeVsThree,
    #[strum(serialize = "5v5")]
    FiveVsFive,
    #[strum(serialize = "other")]
    Other,
}

impl GameFormat {
    pub fn from_name(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("aram") {
            Self::Aram
        } else if name.contains("1v1") || name.contains("1vs1") {
            Self::OneVsOne
        } else if name.contains("3v3") || name.contains("3vs3") {
            Self::ThreeVsThree
        } else if name.contains("5v5") || name.contains("5vs5") {
            Self::FiveVsFive
        } else {
            Self::Other
        }
    }
}

/// Schedule window a scrape is restricted to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, EnumString, strum_macros::Display)]
#[strum(ascii_case_insensitive)]
pub enum TimeFrame {
    #[default]
    #[strum(to_string = "TODAY", serialize = "t")]
    Today,
    #[strum(to_string = "THIS_WEEK", serialize = "w", serialize = "week")]
    ThisWeek,
    #[strum(to_string = "THIS_WEEKEND", serialize = "we", serialize = "weekend")]
    ThisWeekend,
}

impl TimeFrame {
    /// Whether `start` falls into this window, as seen from `now`.
    pub fn contains(self, start: &DateTime<Tz>, now: &DateTime<Tz>) -> bool {
        let day = start.date_naive();
        let today = now.date_naive();
        match self {
            Self::Today => day == today,
            Self::ThisWeek => day >= today && day.iso_week() == today.iso_week(),
            Self::ThisWeekend => {
                let saturday = week_day(today, Weekday::Sat);
                let sunday = week_day(today, Weekday::Sun);
                day >= today.max(saturday) && day <= sunday
            }
        }
    }
}

fn week_day(date: NaiveDate, weekday: Weekday) -> NaiveDate {
    let offset = i64::from(weekday.num_days_from_monday())
        - i64::from(date.weekday().num_days_from_monday());
    date + Duration::days(offset)
}

/// Site a tournament was scraped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum Website {
    Battlefy,
    #[strum(serialize = "ESL")]
    Esl,
    Challengermode,
}

/// A scheduled tournament.
///
/// `format` and `starts_in` are derived once in [`Tournament::new`] and are
/// not refreshed when the other fields change.
#[derive(Debug, Clone, Serialize)]
pub struct Tournament {
    pub name: String,
    pub start: DateTime<Tz>,
    pub region: String,
    pub ttype: String,
    pub website: Website,
    pub host: Option<String>,
    pub link: Option<String>,
    pub format: GameFormat,
    #[serde(skip)]
    pub starts_in: Duration,
}

impl Tournament {
    /// Create a tournament, deriving its format from the name and
    /// `starts_in` from the time left until `start`.
    pub fn new(
        name: impl Into<String>,
        start: DateTime<Tz>,
        region: impl Into<String>,
        ttype: impl Into<String>,
        website: Website,
    ) -> Self {
        let name = name.into();
        let format = GameFormat::from_name(&name);
        let starts_in = start.with_timezone(&Utc) - Utc::now();
        Self {
            name,
            start,
            region: region.into(),
            ttype: ttype.into(),
            website,
            host: None,
            link: None,
            format,
            starts_in,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// Identity is `(name, start)`, regardless of source site.
impl PartialEq for Tournament {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.start == other.start
    }
}

impl Eq for Tournament {}

impl fmt::Display for Tournament {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {}",
            self.name,
            self.ttype,
            self.start.format("%a %d.%m. %H:%M %Z"),
            format_starts_in(self.starts_in)
        )?;
        if let Some(link) = &self.link {
            write!(f, " | {link}")?;
        }
        Ok(())
    }
}

fn format_starts_in(delta: Duration) -> String {
    if delta <= Duration::zero() {
        return "running".to_string();
    }
    let hours = delta.num_hours();
    let minutes = delta.num_minutes() % 60;
    if hours >= 24 {
        format!("in {}d {}h", hours / 24, hours % 24)
    } else {
        format!("in {hours}h {minutes}m")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TournamentList {
    pub tournaments: Vec<Tournament>,
}

impl TournamentList {
    pub fn new(tournaments: Vec<Tournament>) -> Self {
        Self { tournaments }
    }

    pub fn append(&mut self, tournaments: impl IntoIterator<Item = Tournament>) {
        self.tournaments.extend(tournaments);
    }

    pub fn len(&self) -> usize {
        self.tournaments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tournaments.is_empty()
    }

    /// Keep only tournaments of the given format.
    pub fn filter_format(self, format: GameFormat) -> Self {
        Self {
            tournaments: self
                .tournaments
                .into_iter()
                .filter(|t| t.format == format)
                .collect(),
        }
    }

    /// Order by start time, earliest first.
    pub fn sort_by_start(&mut self) {
        self.tournaments.sort_by_key(|t| t.start.with_timezone(&Utc));
    }
}

impl fmt::Display for TournamentList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tournaments.is_empty() {
            return f.write_str("No tournaments found.");
        }
        write!(f, "{}", self.tournaments.iter().join("\n"))
    }
}
