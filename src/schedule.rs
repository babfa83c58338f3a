//! Scrape upcoming tournaments by schedule.
//!
//! A scrape command is a list of free-form arguments. Each one is a call
//! (which schedule source to scrape), a format filter or a time frame.

use std::str::FromStr;

use itertools::Itertools;
use serde::Serialize;
use strum_macros::{EnumIter, EnumString};
use tracing::{debug, error, instrument, warn};

use crate::dispatch::StalkContext;
use crate::error::{Result, StalkError};
use crate::merge::merge;
use crate::model::{GameFormat, TimeFrame, TournamentList};
use crate::scraper::battlefy;
use crate::task::{Task, TaskGroup};

/// A schedule source a scrape can be dispatched to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumString, EnumIter, strum_macros::Display,
)]
#[strum(ascii_case_insensitive)]
pub enum CallId {
    #[strum(to_string = "battlefy", serialize = "bat", serialize = "b")]
    Battlefy,
    #[strum(
        to_string = "battlefy_deep",
        serialize = "bat_deep",
        serialize = "bat_d",
        serialize = "b_d",
        serialize = "bd"
    )]
    BattlefyDeep,
    #[strum(to_string = "esl", serialize = "e")]
    Esl,
    #[strum(to_string = "toornament", serialize = "to", serialize = "toor")]
    Toornament,
    #[strum(
        to_string = "challengermode",
        serialize = "chal",
        serialize = "c",
        serialize = "challenger"
    )]
    Challengermode,
}

/// Arguments of a scrape command, split by kind and without aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeArgs {
    pub calls: Vec<CallId>,
    pub filters: Vec<GameFormat>,
    pub time_frames: Vec<TimeFrame>,
}

impl ScrapeArgs {
    /// The first time frame given, or [`TimeFrame::Today`].
    pub fn time_frame(&self) -> TimeFrame {
        if self.time_frames.len() > 1 {
            debug!("only the first time frame will be used");
        }
        self.time_frames.first().copied().unwrap_or_default()
    }
}

/// Resolve every argument's alias. Unknown arguments are logged and skipped.
pub fn interpret_args<S: AsRef<str>>(args: &[S]) -> ScrapeArgs {
    let mut parsed = ScrapeArgs::default();
    for arg in args {
        let arg = arg.as_ref().trim();
        if let Ok(call) = CallId::from_str(arg) {
            parsed.calls.push(call);
        } else if let Some(filter) = parse_filter(arg) {
            parsed.filters.push(filter);
        } else if let Ok(time_frame) = TimeFrame::from_str(arg) {
            parsed.time_frames.push(time_frame);
        } else {
            error!("Can't understand a given argument: {}", StalkError::UnknownArgument(arg.to_string()));
        }
    }
    parsed.calls = parsed.calls.into_iter().unique().collect();
    debug!(
        calls = ?parsed.calls,
        filters = ?parsed.filters,
        time_frames = ?parsed.time_frames,
        "interpreted args"
    );
    parsed
}

fn parse_filter(arg: &str) -> Option<GameFormat> {
    GameFormat::from_str(arg)
        .ok()
        .filter(|format| *format != GameFormat::Other)
}

/// Scrape every call, merge the results without duplicates and keep only
/// tournaments matching every filter.
#[instrument(skip(ctx))]
pub async fn run_scrape_batch(
    ctx: &StalkContext,
    calls: &[CallId],
    filters: &[GameFormat],
    time_frame: TimeFrame,
) -> Result<TournamentList> {
    if calls.is_empty() {
        return Ok(TournamentList::default());
    }

    let tasks = calls
        .iter()
        .map(|&call| {
            let ctx = ctx.clone();
            Task::new(move |call| scrape_call(ctx, call, time_frame), call)
        })
        .collect();
    let group = TaskGroup::new(format!("calls: {}", calls.iter().join(", ")), tasks);
    debug!(count = group.task_count(), "submitting scrape calls");

    let results = ctx.pool.submit(group).await;
    let mut tournaments = merge(results).unwrap_or_default();

    debug!(count = tournaments.len(), "applying filters");
    for &filter in filters {
        tournaments = tournaments.filter_format(filter);
    }
    tournaments.sort_by_start();

    debug!(count = tournaments.len(), "tournaments remain");
    Ok(tournaments)
}

/// Run a single schedule source.
async fn scrape_call(
    ctx: StalkContext,
    call: CallId,
    time_frame: TimeFrame,
) -> Result<TournamentList> {
    match call {
        CallId::Battlefy => battlefy::get_tournaments(ctx, time_frame, false).await,
        CallId::BattlefyDeep => battlefy::get_tournaments(ctx, time_frame, true).await,
        CallId::Esl | CallId::Toornament | CallId::Challengermode => {
            warn!(%call, "no schedule scraper available");
            Ok(TournamentList::default())
        }
    }
}
