use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::classify::{ResourceType, Site};
use crate::config::Config;
use crate::error::Result;
use crate::scraper::{challengermode, primeleague, summoners_inn, toornament};
use crate::stalk::StalkResult;
use crate::task::TaskPool;

pub const NOT_IMPLEMENTED_MESSAGE: &str = "This feature is not ready yet.";

/// Everything an extractor may use: cheap to clone, read-only.
#[derive(Debug, Clone)]
pub struct StalkContext {
    pub http: reqwest::Client,
    pub pool: TaskPool,
    pub config: Arc<Config>,
}

/// Turns a URL of one site and resource type into a domain object.
#[async_trait]
pub trait Extractor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract(&self, ctx: StalkContext, url: String) -> Result<StalkResult>;
}

/// Placeholder for URL shapes that are recognized but not supported yet.
#[derive(Debug, Clone, Copy)]
pub struct NotImplemented;

#[async_trait]
impl Extractor for NotImplemented {
    fn name(&self) -> &'static str {
        "feature_not_implemented_yet"
    }

    async fn extract(&self, _ctx: StalkContext, _url: String) -> Result<StalkResult> {
        Ok(StalkResult::Message(NOT_IMPLEMENTED_MESSAGE.to_string()))
    }
}

/// The built-in site extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteExtractor {
    ChallengermodeMatch,
    ToornamentTournament,
    SummonersInnSeason,
    SummonersInnGroup,
    SummonersInnTeam,
    PrimeleagueLeague,
    PrimeleagueTeam,
}

#[async_trait]
impl Extractor for SiteExtractor {
    fn name(&self) -> &'static str {
        match self {
            Self::ChallengermodeMatch => "challengermode::quick_stalk",
            Self::ToornamentTournament => "toornament::stalk",
            Self::SummonersInnSeason => "summoners_inn::stalk",
            Self::SummonersInnGroup => "summoners_inn::stalk_group",
            Self::SummonersInnTeam => "summoners_inn::stalk_team",
            Self::PrimeleagueLeague => "primeleague::stalk",
            Self::PrimeleagueTeam => "primeleague::stalk_team",
        }
    }

    async fn extract(&self, ctx: StalkContext, url: String) -> Result<StalkResult> {
        match self {
            Self::ChallengermodeMatch => challengermode::get_match(ctx, url)
                .await
                .map(StalkResult::TeamList),
            Self::ToornamentTournament => toornament::get_tournament(ctx, url)
                .await
                .map(StalkResult::TeamList),
            Self::SummonersInnSeason => summoners_inn::get_season(ctx, url)
                .await
                .map(StalkResult::TeamListList),
            Self::SummonersInnGroup => summoners_inn::get_group(ctx, url)
                .await
                .map(StalkResult::TeamList),
            Self::SummonersInnTeam => summoners_inn::get_team(ctx, url)
                .await
                .map(StalkResult::Team),
            Self::PrimeleagueLeague => primeleague::get_league(ctx, url)
                .await
                .map(StalkResult::TeamList),
            Self::PrimeleagueTeam => primeleague::get_team(ctx, url)
                .await
                .map(StalkResult::Team),
        }
    }
}

/// Static mapping from `(site, resource type)` to the extractor handling it.
#[derive(Clone, Default)]
pub struct DispatchTable {
    entries: HashMap<(Site, ResourceType), Arc<dyn Extractor>>,
}

impl DispatchTable {
    /// A table without entries; every lookup resolves to [`NotImplemented`].
    pub fn empty() -> Self {
        Self::default()
    }

    /// The table used for real stalks.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table
            .register(Site::Challengermode, ResourceType::Match, SiteExtractor::ChallengermodeMatch)
            .register(Site::Challengermode, ResourceType::Tournament, NotImplemented)
            .register(Site::Toornament, ResourceType::Tournament, SiteExtractor::ToornamentTournament)
            .register(Site::SummonersInn, ResourceType::Season, SiteExtractor::SummonersInnSeason)
            .register(Site::SummonersInn, ResourceType::Group, SiteExtractor::SummonersInnGroup)
            .register(Site::SummonersInn, ResourceType::Team, SiteExtractor::SummonersInnTeam)
            .register(Site::Primeleague, ResourceType::League, SiteExtractor::PrimeleagueLeague)
            .register(Site::Primeleague, ResourceType::Team, SiteExtractor::PrimeleagueTeam);
        table
    }

    /// Route `(site, resource)` to `extractor`, replacing any earlier entry.
    ///
    /// Returns the table so registrations can be chained.
    pub fn register(
        &mut self,
        site: Site,
        resource: ResourceType,
        extractor: impl Extractor + 'static,
    ) -> &mut Self {
        self.entries.insert((site, resource), Arc::new(extractor));
        self
    }

    /// Whether an extractor is registered for `(site, resource)`.
    pub fn contains(&self, site: Site, resource: ResourceType) -> bool {
        self.entries.contains_key(&(site, resource))
    }

    /// Look up the extractor; gaps resolve to [`NotImplemented`].
    pub fn resolve(&self, site: Site, resource: ResourceType) -> Arc<dyn Extractor> {
        match self.entries.get(&(site, resource)) {
            Some(extractor) => Arc::clone(extractor),
            None => {
                warn!(%site, %resource, "no extractor registered");
                Arc::new(NotImplemented)
            }
        }
    }
}

impl std::fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut entries: Vec<String> = self
            .entries
            .iter()
            .map(|((site, resource), e)| format!("{site}/{resource} -> {}", e.name()))
            .collect();
        entries.sort();
        f.debug_struct("DispatchTable")
            .field("entries", &entries)
            .finish()
    }
}
