use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use crate::classify::classify;
use crate::config::Config;
use crate::dispatch::{DispatchTable, StalkContext};
use crate::error::{Result, StalkError};
use crate::model::{GameFormat, TimeFrame, TournamentList};
use crate::rank::{OpGgLookup, RankLookup};
use crate::schedule::{self, CallId};
use crate::stalk::{self, OutputFormat, StalkResult, NO_VIABLE_CALLS_MESSAGE};
use crate::task::{Task, TaskGroup, TaskPool};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// The main entry point for stalking rosters and scraping schedules.
///
/// `StalkClient` owns the HTTP client, an immutable config snapshot, the
/// worker pool every task runs on, the dispatch table and the rank source.
/// Its entry points always answer with text meant for a user, except
/// [`StalkClient::run_scrape_batch`] which returns the tournaments.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> lolstalk::Result<()> {
/// use lolstalk::{Config, OutputFormat, StalkClient};
///
/// let client = StalkClient::with_config(Config::default())?;
/// let text = client
///     .stalk(
///         "https://www.summoners-inn.de/de/leagues/sinn/1338-season-3",
///         true,
///         OutputFormat::Chat,
///     )
///     .await;
/// println!("{text}");
/// # Ok(())
/// # }
/// ```
pub struct StalkClient {
    http: reqwest::Client,
    config: Arc<Config>,
    pool: TaskPool,
    dispatch: DispatchTable,
    ranks: Arc<dyn RankLookup>,
}

impl StalkClient {
    /// Create a client with the default configuration.
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new(), Config::default())
    }

    /// Create a client for `config`, applying its request timeout.
    pub fn with_config(config: Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(StalkError::ClientBuild)?;
        Ok(Self::with_client(http, config))
    }

    /// Create a client using the provided [`reqwest::Client`].
    ///
    /// Use this when you need to configure proxies, headers, etc.
    pub fn with_client(client: reqwest::Client, config: Config) -> Self {
        Self {
            ranks: Arc::new(OpGgLookup::new(client.clone())),
            pool: TaskPool::new(config.max_concurrency),
            config: Arc::new(config),
            dispatch: DispatchTable::standard(),
            http: client,
        }
    }

    /// Replace the table mapping URL shapes to extractors.
    pub fn with_dispatch(mut self, dispatch: DispatchTable) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Replace where player ranks are looked up.
    pub fn with_rank_lookup(mut self, ranks: Arc<dyn RankLookup>) -> Self {
        self.ranks = ranks;
        self
    }

    /// The configuration snapshot this client was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn context(&self) -> StalkContext {
        StalkContext {
            http: self.http.clone(),
            pool: self.pool.clone(),
            config: Arc::clone(&self.config),
        }
    }

    /// Collect the rosters behind `url` and render them as text.
    ///
    /// Never fails: unknown URLs, unsupported pages and empty results are
    /// answered with a message.
    #[instrument(skip(self))]
    pub async fn stalk(&self, url: &str, enrich: bool, format: OutputFormat) -> String {
        let (site, resource) = match classify(url) {
            Ok(classified) => classified,
            Err(err) => {
                warn!(error = %err, "no tool for url");
                return stalk::no_matching_tool(url);
            }
        };

        let extractor = self.dispatch.resolve(site, resource);
        info!(extractor = extractor.name(), "starting stalk");

        let ctx = self.context();
        let owned_url = url.to_string();
        let group = TaskGroup::new(
            format!("stalk: {url}"),
            vec![Task::from_future(url, async move {
                extractor.extract(ctx, owned_url).await
            })],
        );

        let Some(result) = self.pool.submit(group).await.into_iter().next() else {
            return stalk::nothing_found(url);
        };
        if let StalkResult::Message(message) = result {
            return message;
        }
        if result.is_empty() {
            return stalk::nothing_found(url);
        }

        let region = match self.config.region() {
            Ok(region) => region.to_string(),
            Err(err) => {
                error!(error = %err, "cannot render without a region");
                return err.to_string();
            }
        };

        let result = if enrich {
            debug!("adding ranks");
            result
                .enrich(Arc::clone(&self.ranks), &self.pool, &region)
                .await
        } else {
            result
        };

        result.render(format, &region)
    }

    /// Run a scrape command such as `["bat", "5v5", "week"]` and render the
    /// tournaments found.
    #[instrument(skip(self, args))]
    pub async fn scrape<S: AsRef<str>>(&self, args: &[S]) -> String {
        let parsed = schedule::interpret_args(args);
        if parsed.calls.is_empty() {
            debug!("no viable calls in command, stopping");
            return NO_VIABLE_CALLS_MESSAGE.to_string();
        }

        match self
            .run_scrape_batch(&parsed.calls, &parsed.filters, parsed.time_frame())
            .await
        {
            Ok(tournaments) => tournaments.to_string(),
            Err(err) => {
                error!(error = %err, "scrape failed");
                err.to_string()
            }
        }
    }

    /// Scrape every call and return the merged, deduplicated and filtered
    /// tournaments.
    pub async fn run_scrape_batch(
        &self,
        calls: &[CallId],
        filters: &[GameFormat],
        time_frame: TimeFrame,
    ) -> Result<TournamentList> {
        schedule::run_scrape_batch(&self.context(), calls, filters, time_frame).await
    }
}

impl Default for StalkClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StalkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StalkClient")
            .field("config", &self.config)
            .field("pool", &self.pool)
            .field("dispatch", &self.dispatch)
            .finish_non_exhaustive()
    }
}
