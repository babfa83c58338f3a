use serde::Serialize;

use super::player::{Player, Rank};

const OPGG_MULTI_PATH: &str = "op.gg/multi/query=";

/// A team and its confirmed roster.
#[derive(Debug, Clone, Serialize)]
pub struct Team {
    pub name: String,
    pub players: Vec<Player>,
    pub average_rank: Option<Rank>,
    pub max_rank: Option<Rank>,
}

impl Team {
    pub fn new(name: impl Into<String>, players: Vec<Player>) -> Self {
        Self {
            name: name.into(),
            players,
            average_rank: None,
            max_rank: None,
        }
    }

    /// op.gg multi-search link for the whole roster.
    pub fn multi_link(&self, region: &str) -> String {
        let names: String = self
            .players
            .iter()
            .map(|p| format!("{}%2C", p.summoner_name.replace(' ', "")))
            .collect();
        format!(
            "https://{}.{OPGG_MULTI_PATH}{names}",
            region.to_lowercase()
        )
    }

    /// Recompute `average_rank` and `max_rank` from ranked players only.
    pub fn calc_average_max_rank(&mut self) {
        let ratings: Vec<u32> = self
            .players
            .iter()
            .filter_map(|p| p.rank.as_ref())
            .filter(|r| r.is_ranked())
            .map(|r| u32::from(r.rating))
            .collect();

        let (average, max) = if ratings.is_empty() {
            (0, 0)
        } else {
            let sum: u32 = ratings.iter().sum();
            let count = ratings.len() as f64;
            let average = (f64::from(sum) / count).round_ties_even() as u32;
            (average, ratings.iter().copied().max().unwrap_or_default())
        };

        self.average_rank = Some(Rank::from_rating(average as u8));
        self.max_rank = Some(Rank::from_rating(max as u8));
    }
}

/// Teams are the same entity when their names match.
impl PartialEq for Team {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Team {}

/// A named group of teams, such as a division or a tournament's participants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamList {
    pub name: String,
    pub teams: Vec<Team>,
}

impl TeamList {
    pub fn new(name: impl Into<String>, teams: Vec<Team>) -> Self {
        Self {
            name: name.into(),
            teams,
        }
    }
}

/// Every group of a league season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamListList {
    pub team_lists: Vec<TeamList>,
}

impl TeamListList {
    pub fn new(team_lists: Vec<TeamList>) -> Self {
        Self { team_lists }
    }

    /// Teams across every group.
    pub fn team_count(&self) -> usize {
        self.team_lists.iter().map(|l| l.teams.len()).sum()
    }
}
