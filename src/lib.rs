//! Collects League of Legends amateur rosters and tournament schedules.
//!
//! Given a tournament, league or match URL, [`StalkClient::stalk`] finds the
//! teams and players behind it, optionally looks up every player's rank and
//! renders the result as chat or report text. [`StalkClient::scrape`] lists
//! upcoming tournaments from schedule sites.

pub mod classify;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod merge;
pub mod model;
pub mod rank;
pub mod schedule;
pub(crate) mod scraper;
pub mod stalk;
pub mod task;

pub use classify::{classify, ResourceType, Site};
pub use client::StalkClient;
pub use config::Config;
pub use dispatch::{DispatchTable, Extractor, NotImplemented, StalkContext};
pub use error::{ConfigError, Result, StalkError};
pub use merge::{merge, Merge};
pub use model::*;
pub use rank::{OpGgLookup, RankLookup};
pub use schedule::{interpret_args, CallId, ScrapeArgs};
pub use stalk::{OutputFormat, StalkResult};
pub use task::{GroupOutcome, Task, TaskFailure, TaskGroup, TaskPool, TaskStatus};
