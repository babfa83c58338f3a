//! Solo queue rank lookup and roster enrichment.

use std::future::Future;
use std::sync::Arc;

use ::scraper::Selector;
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::model::{Player, Rank, Team, TeamList, TeamListList};
use crate::scraper;
use crate::task::{Task, TaskGroup, TaskPool};

/// Source of player ranks. A lookup never fails: anything that goes wrong
/// is reported as [`Rank::unranked`].
#[async_trait]
pub trait RankLookup: Send + Sync {
    async fn lookup(&self, summoner_name: &str, region: &str) -> Rank;
}

/// Reads the solo queue tier from a player's op.gg profile.
#[derive(Debug, Clone)]
pub struct OpGgLookup {
    http: reqwest::Client,
}

impl OpGgLookup {
    /// Create a lookup sharing the given HTTP client.
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn fetch_tier(&self, summoner_name: &str, region: &str) -> Result<String> {
        let url = profile_url(summoner_name, region);
        let document = scraper::get_document(&self.http, &url).await?;
        let selector = Selector::parse("div.TierRank")?;
        Ok(scraper::select_text(&document.root_element(), &selector))
    }
}

#[async_trait]
impl RankLookup for OpGgLookup {
    async fn lookup(&self, summoner_name: &str, region: &str) -> Rank {
        match self.fetch_tier(summoner_name, region).await {
            Ok(tier) => Rank::from_tier_text(&tier),
            Err(err) => {
                debug!(summoner_name, region, error = %err, "rank lookup failed");
                Rank::unranked()
            }
        }
    }
}

fn profile_url(summoner_name: &str, region: &str) -> String {
    format!(
        "https://{}.op.gg/summoner/userName={}",
        region.to_lowercase(),
        summoner_name.replace(' ', "+")
    )
}

/// Roster entries shown in task logs.
trait Labelled {
    fn label(&self) -> String;
}

impl Labelled for Player {
    fn label(&self) -> String {
        self.summoner_name.clone()
    }
}

impl Labelled for Team {
    fn label(&self) -> String {
        self.name.clone()
    }
}

impl Labelled for TeamList {
    fn label(&self) -> String {
        self.name.clone()
    }
}

/// Run `enrich` on every item through the pool and put the results back in
/// their original positions. Items whose task failed are kept unchanged.
async fn enrich_each<T, F, Fut>(pool: &TaskPool, group_name: String, items: Vec<T>, enrich: F) -> Vec<T>
where
    T: Labelled + Clone + Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
{
    let tasks = items
        .iter()
        .cloned()
        .enumerate()
        .map(|(index, item)| {
            let label = item.label();
            let work = enrich(item);
            Task::from_future(label, async move { Ok((index, work.await)) })
        })
        .collect();

    let mut items = items;
    for (index, enriched) in pool.submit(TaskGroup::new(group_name, tasks)).await {
        items[index] = enriched;
    }
    items
}

/// Look up every player's rank, then compute the team's average and max.
#[instrument(skip_all, fields(team = %team.name))]
pub async fn enrich_team(
    lookup: Arc<dyn RankLookup>,
    pool: &TaskPool,
    region: &str,
    mut team: Team,
) -> Team {
    let players = std::mem::take(&mut team.players);
    team.players = enrich_each(
        pool,
        format!("ranks: {}", team.name),
        players,
        |player: Player| {
            let lookup = Arc::clone(&lookup);
            let region = region.to_string();
            async move {
                let rank = lookup.lookup(&player.summoner_name, &region).await;
                player.with_rank(rank)
            }
        },
    )
    .await;
    team.calc_average_max_rank();
    team
}

/// Enrich every team of a list, keeping the team order.
pub async fn enrich_team_list(
    lookup: Arc<dyn RankLookup>,
    pool: &TaskPool,
    region: &str,
    mut team_list: TeamList,
) -> TeamList {
    let teams = std::mem::take(&mut team_list.teams);
    team_list.teams = enrich_each(
        pool,
        format!("add ranks to team list {}", team_list.name),
        teams,
        |team: Team| {
            let lookup = Arc::clone(&lookup);
            let pool = pool.clone();
            let region = region.to_string();
            async move { enrich_team(lookup, &pool, &region, team).await }
        },
    )
    .await;
    team_list
}

/// Enrich every group of a season, keeping the group order.
pub async fn enrich_team_list_list(
    lookup: Arc<dyn RankLookup>,
    pool: &TaskPool,
    region: &str,
    mut lists: TeamListList,
) -> TeamListList {
    let team_lists = std::mem::take(&mut lists.team_lists);
    lists.team_lists = enrich_each(
        pool,
        "add ranks to team lists".to_string(),
        team_lists,
        |list: TeamList| {
            let lookup = Arc::clone(&lookup);
            let pool = pool.clone();
            let region = region.to_string();
            async move { enrich_team_list(lookup, &pool, &region, list).await }
        },
    )
    .await;
    lists
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use super::*;

    /// Serves ranks from a fixed table, unknown names are unranked.
    pub(crate) struct FakeLookup(pub HashMap<String, Rank>);

    impl FakeLookup {
        pub(crate) fn with(entries: &[(&str, &str)]) -> Arc<dyn RankLookup> {
            Arc::new(Self(
                entries
                    .iter()
                    .map(|(name, tier)| (name.to_string(), Rank::from_tier_text(tier)))
                    .collect(),
            ))
        }
    }

    #[async_trait]
    impl RankLookup for FakeLookup {
        async fn lookup(&self, summoner_name: &str, _region: &str) -> Rank {
            if summoner_name == "slowpoke" {
                tokio::time::sleep(std::time::Duration::from_millis(30)).await;
            }
            self.0
                .get(summoner_name)
                .cloned()
                .unwrap_or_else(Rank::unranked)
        }
    }

    #[test]
    fn test_profile_url() {
        assert_eq!(
            profile_url("Hide on bush", "KR"),
            "https://kr.op.gg/summoner/userName=Hide+on+bush"
        );
    }

    #[tokio::test]
    async fn test_enrich_team_keeps_order_and_names() {
        let lookup = FakeLookup::with(&[("slowpoke", "Gold 1"), ("quick", "Gold 3")]);
        let team = Team::new(
            "UOL",
            vec![Player::new("slowpoke"), Player::new("quick"), Player::new("nobody")],
        );

        let team = enrich_team(lookup, &TaskPool::new(4), "EUW", team).await;

        let names: Vec<&str> = team.players.iter().map(|p| p.summoner_name.as_str()).collect();
        assert_eq!(names, vec!["slowpoke", "quick", "nobody"]);
        assert_eq!(team.players[0].rank.as_ref().unwrap().display, "Gold 1");
        assert_eq!(team.players[2].rank, Some(Rank::unranked()));
        // Gold 1 = 16, Gold 3 = 14
        assert_eq!(team.average_rank.unwrap().display, "Gold 2");
        assert_eq!(team.max_rank.unwrap().display, "Gold 1");
    }

    #[tokio::test]
    async fn test_enrich_team_list_list_on_single_slot_pool() {
        let lookup = FakeLookup::with(&[("a", "Master"), ("b", "Iron 4")]);
        let lists = TeamListList::new(vec![
            TeamList::new("Division 1", vec![Team::new("A", vec![Player::new("a")])]),
            TeamList::new(
                "Division 2",
                vec![
                    Team::new("B", vec![Player::new("b")]),
                    Team::new("C", vec![]),
                ],
            ),
        ]);

        let enriched = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            enrich_team_list_list(lookup, &TaskPool::new(1), "EUW", lists),
        )
        .await
        .expect("enrichment deadlocked");

        assert_eq!(enriched.team_lists[0].name, "Division 1");
        assert_eq!(
            enriched.team_lists[0].teams[0].max_rank.as_ref().unwrap().display,
            "Master"
        );
        let division_2 = &enriched.team_lists[1];
        assert_eq!(division_2.teams[0].average_rank.as_ref().unwrap().rating, 1);
        assert_eq!(division_2.teams[1].average_rank, Some(Rank::unranked()));
    }
}
