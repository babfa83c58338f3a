use std::str::FromStr;

use ::scraper::{ElementRef, Selector};
use chrono::{DateTime, Datelike, Month, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::dispatch::StalkContext;
use crate::error::{Result, StalkError};
use crate::model::{TimeFrame, Tournament, TournamentList, Website};
use crate::scraper::{self, element_text, select_text, Html};
use crate::task::{Task, TaskGroup};

const WEBSITE_KEY: &str = "BATTLEFY";
const HOST_PAGE_BASE: &str = "https://battlefy.com/";

/// Tournaments listed on the Battlefy browse pages of every configured region.
///
/// In deep mode every tournament also carries the link to its host page.
#[instrument(skip(ctx))]
pub(crate) async fn get_tournaments(
    ctx: StalkContext,
    time_frame: TimeFrame,
    deep: bool,
) -> Result<TournamentList> {
    debug!(websites = ?ctx.config.websites, "selected websites");
    if !ctx.config.website_enabled(WEBSITE_KEY) {
        warn!("battlefy scraper is disabled");
        return Ok(TournamentList::default());
    }
    if ctx.config.regions.is_empty() {
        warn!("no region selected");
        return Ok(TournamentList::default());
    }

    let tz = ctx.config.timezone()?;
    let tasks = region_pages(&ctx.config)
        .into_iter()
        .map(|(region, url)| {
            let ctx = ctx.clone();
            Task::from_future(
                format!("battlefy {region}"),
                get_region(ctx, url, region, tz, time_frame, deep),
            )
        })
        .collect();

    let mut tournaments = TournamentList::default();
    for found in ctx.pool.submit(TaskGroup::new("battlefy", tasks)).await {
        tournaments.append(found.tournaments);
    }
    Ok(tournaments)
}

/// Browse page of every configured region. A region without a page is
/// skipped so the others are still scraped.
fn region_pages(config: &Config) -> Vec<(String, String)> {
    config
        .regions
        .iter()
        .filter_map(|region| match config.battlefy_url(region) {
            Ok(url) => Some((region.clone(), url.to_string())),
            Err(err) => {
                warn!(%region, error = %err, "skipping battlefy region");
                None
            }
        })
        .collect()
}

async fn get_region(
    ctx: StalkContext,
    url: String,
    region: String,
    tz: Tz,
    time_frame: TimeFrame,
    deep: bool,
) -> Result<TournamentList> {
    debug!(%region, %url, "scraping battlefy region");
    let document = scraper::get_document(&ctx.http, &url).await?;
    let now = Utc::now().with_timezone(&tz);

    let tournaments: Vec<Tournament> = parse_cards(&document, &region, &now)?
        .into_iter()
        .filter(|t| time_frame.contains(&t.start, &now))
        .map(|t| {
            let link = t.host.as_deref().filter(|_| deep).map(host_page);
            match link {
                Some(link) => t.with_link(link),
                None => t,
            }
        })
        .collect();

    debug!(%region, count = tournaments.len(), "tournaments in time frame");
    Ok(TournamentList::new(tournaments))
}

/// `Summoners Inn` is hosted at `https://battlefy.com/summoners-inn`.
fn host_page(host: &str) -> String {
    format!("{HOST_PAGE_BASE}{}", host.replace(' ', "-").to_lowercase())
}

fn parse_cards(document: &Html, region: &str, now: &DateTime<Tz>) -> Result<Vec<Tournament>> {
    let card_selector = Selector::parse("div.card-container")?;
    let cards: Vec<ElementRef> = document.select(&card_selector).collect();
    debug!(count = cards.len(), "tournament cards found");

    Ok(cards
        .iter()
        .filter_map(|card| match parse_card(card, region, now) {
            Ok(tournament) => Some(tournament),
            Err(err) => {
                debug!(error = %err, "skipping unreadable tournament card");
                None
            }
        })
        .collect())
}

fn parse_card(card: &ElementRef, region: &str, now: &DateTime<Tz>) -> Result<Tournament> {
    let name_selector = Selector::parse("h4")?;
    let table_selector = Selector::parse("table")?;
    let td_selector = Selector::parse("td")?;
    let host_selector = Selector::parse("span.org-name")?;

    let cells: Vec<Vec<String>> = card
        .select(&table_selector)
        .map(|table| table.select(&td_selector).map(|td| element_text(&td)).collect())
        .collect();
    let cell = |table: usize, index: usize, context: &'static str| {
        cells
            .get(table)
            .and_then(|tds| tds.get(index))
            .ok_or(StalkError::ElementNotFound { context })
    };

    let date = cell(0, 1, "battlefy start date")?;
    let time = cell(0, 3, "battlefy start time")?;
    let ttype = cell(1, 3, "battlefy tournament type")?;
    let start = parse_start(date, time, now)?;

    let name = select_text(card, &name_selector);
    let host = select_text(card, &host_selector);

    let tournament = Tournament::new(name, start, region, ttype.as_str(), Website::Battlefy);
    Ok(if host.is_empty() {
        tournament
    } else {
        tournament.with_host(host)
    })
}

/// Parse a card's start, e.g. `Sun, Feb 17th` and `2:00 PM GMT`, into the
/// timezone of `now`.
///
/// The page omits the year: a month earlier than the current one is taken
/// to be next year.
pub(crate) fn parse_start(date: &str, time: &str, now: &DateTime<Tz>) -> Result<DateTime<Tz>> {
    let invalid = || StalkError::InvalidDate(format!("{date} {time}"));

    // The weekday is ignored
    let (month, day) = match date.split_whitespace().collect::<Vec<_>>()[..] {
        [_, month, day] => (month, day),
        _ => return Err(invalid()),
    };
    let month = Month::from_str(month).map_err(|_| invalid())?.number_from_month();
    let day: u32 = day.trim_end_matches(|c: char| c.is_ascii_alphabetic()).parse()?;

    let (clock, source_tz) = match time.split_whitespace().collect::<Vec<_>>()[..] {
        [clock, meridiem, zone] => (format!("{clock} {meridiem}"), zone),
        _ => return Err(invalid()),
    };
    let clock = NaiveTime::parse_from_str(&clock, "%I:%M %p")?;
    let source_tz = Tz::from_str(source_tz).map_err(|_| invalid())?;

    let year = if month < now.month() {
        now.year() + 1
    } else {
        now.year()
    };
    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(invalid)?
        .and_time(clock);

    let start = source_tz
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(invalid)?;
    Ok(start.with_timezone(&now.timezone()))
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;
    use chrono_tz::Europe::Berlin;

    use super::*;

    fn now() -> DateTime<Tz> {
        Berlin.with_ymd_and_hms(2026, 2, 10, 12, 0, 0).unwrap()
    }

    const BROWSE_PAGE: &str = r#"
        <html><body>
        <div class="card-container">
            <h4 class="text-16px font-400 text-white">Weekly 5v5 Cup</h4>
            <span class="text-16px ellipsis font-400 text-white ml-10 org-name">Summoners Inn</span>
            <table><tr><td>Date</td><td>Tue, Feb 10th</td><td>Time</td><td>5:00 PM GMT</td></tr></table>
            <table><tr><td>Region</td><td>EU West</td><td>Type</td><td>Team</td></tr></table>
        </div>
        <div class="card-container">
            <h4>Broken card</h4>
            <table><tr><td>Date</td></tr></table>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_parse_start_localizes_to_configured_timezone() {
        let start = parse_start("Sun, Feb 17th", "2:00 PM GMT", &now()).unwrap();
        assert_eq!(start.timezone(), Berlin);
        assert_eq!((start.year(), start.month(), start.day()), (2026, 2, 17));
        assert_eq!(start.hour(), 15);
    }

    #[test]
    fn test_parse_start_noon_and_midnight() {
        let noon = parse_start("Sun, Mar 1st", "12:00 PM GMT", &now()).unwrap();
        assert_eq!(noon.with_timezone(&Utc).hour(), 12);
        let midnight = parse_start("Sun, Mar 1st", "12:30 AM GMT", &now()).unwrap();
        assert_eq!(midnight.with_timezone(&Utc).hour(), 0);
        assert_eq!(midnight.with_timezone(&Utc).day(), 1);
    }

    #[test]
    fn test_parse_start_past_month_is_next_year() {
        let start = parse_start("Fri, Jan 2nd", "8:00 PM GMT", &now()).unwrap();
        assert_eq!(start.year(), 2027);
    }

    #[test]
    fn test_parse_start_rejects_garbage() {
        assert!(parse_start("soon", "2:00 PM GMT", &now()).is_err());
        assert!(parse_start("Sun, Foo 17th", "2:00 PM GMT", &now()).is_err());
        assert!(parse_start("Sun, Feb 17th", "2:00 PM Nowhere", &now()).is_err());
    }

    #[test]
    fn test_parse_cards_skips_unreadable() {
        let document = Html::parse_document(BROWSE_PAGE);
        let tournaments = parse_cards(&document, "EU", &now()).unwrap();

        assert_eq!(tournaments.len(), 1);
        let cup = &tournaments[0];
        assert_eq!(cup.name, "Weekly 5v5 Cup");
        assert_eq!(cup.ttype, "Team");
        assert_eq!(cup.host.as_deref(), Some("Summoners Inn"));
        assert_eq!(cup.start.hour(), 18);
        assert!(TimeFrame::Today.contains(&cup.start, &now()));
    }

    fn config_with_regions(regions: &[&str], urls: &[(&str, &str)]) -> Config {
        Config {
            regions: regions.iter().map(|r| r.to_string()).collect(),
            battlefy_urls: urls
                .iter()
                .map(|(region, url)| (region.to_string(), url.to_string()))
                .collect(),
            ..Config::default()
        }
    }

    #[test]
    fn test_region_without_page_is_skipped() {
        let config = config_with_regions(
            &["EU", "OCE", "NA"],
            &[("EU", "https://battlefy.com/eu"), ("NA", "https://battlefy.com/na")],
        );
        assert_eq!(
            region_pages(&config),
            vec![
                ("EU".to_string(), "https://battlefy.com/eu".to_string()),
                ("NA".to_string(), "https://battlefy.com/na".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_region_page_does_not_fail_scrape() {
        let config = config_with_regions(&["OCE"], &[]);
        let ctx = StalkContext {
            http: reqwest::Client::new(),
            pool: crate::task::TaskPool::new(2),
            config: std::sync::Arc::new(config),
        };

        let tournaments = get_tournaments(ctx, TimeFrame::Today, false).await.unwrap();
        assert_eq!(tournaments.len(), 0);
    }

    #[test]
    fn test_host_page() {
        assert_eq!(host_page("Summoners Inn"), "https://battlefy.com/summoners-inn");
    }
}
