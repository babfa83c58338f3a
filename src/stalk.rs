use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use strum_macros::EnumString;

use crate::model::{Team, TeamList, TeamListList};
use crate::rank::{self, RankLookup};
use crate::task::TaskPool;

pub const NO_MATCHING_TOOL_MESSAGE: &str =
    "The given URL could not be matched with any available tool. The URL was:";
pub const NO_VIABLE_CALLS_MESSAGE: &str = "No viable calls in command.";

/// Answer for a URL whose extraction produced nothing.
pub fn nothing_found(url: &str) -> String {
    format!("Nothing could be found for {url}.")
}

pub fn no_matching_tool(url: &str) -> String {
    format!("{NO_MATCHING_TOOL_MESSAGE} {url}")
}

/// What an extractor produced for a URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StalkResult {
    Team(Team),
    TeamList(TeamList),
    TeamListList(TeamListList),
    /// A finished answer for the user, rendered as is.
    Message(String),
}

/// How a stalk result is turned into text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    /// Condensed, one line per team.
    #[default]
    Chat,
    /// Every player with their rank; the first line is the title.
    Report,
}

impl StalkResult {
    /// Nothing worth showing: no teams and no players anywhere.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Team(team) => team.players.is_empty(),
            Self::TeamList(list) => list.teams.is_empty(),
            Self::TeamListList(lists) => lists.team_count() == 0,
            Self::Message(_) => false,
        }
    }

    /// Look up the ranks of every player in the result.
    pub async fn enrich(self, lookup: Arc<dyn RankLookup>, pool: &TaskPool, region: &str) -> Self {
        match self {
            Self::Team(team) => Self::Team(rank::enrich_team(lookup, pool, region, team).await),
            Self::TeamList(list) => {
                Self::TeamList(rank::enrich_team_list(lookup, pool, region, list).await)
            }
            Self::TeamListList(lists) => {
                Self::TeamListList(rank::enrich_team_list_list(lookup, pool, region, lists).await)
            }
            Self::Message(message) => Self::Message(message),
        }
    }

    /// Render as text in `format`, with op.gg links for `region`.
    pub fn render(&self, format: OutputFormat, region: &str) -> String {
        match self {
            Self::Message(message) => message.clone(),
            Self::Team(team) => render_teams(&team.name, std::slice::from_ref(team), format, region),
            Self::TeamList(list) => render_teams(&list.name, &list.teams, format, region),
            Self::TeamListList(lists) => {
                let sections: Vec<String> = lists
                    .team_lists
                    .iter()
                    .map(|list| render_teams(&list.name, &list.teams, format, region))
                    .collect();
                sections.join("\n\n")
            }
        }
    }
}

fn render_teams(title: &str, teams: &[Team], format: OutputFormat, region: &str) -> String {
    let section = Section {
        title,
        teams,
        format,
        region,
    };
    section.to_string().trim_end().to_string()
}

/// One titled block of teams in the requested format.
struct Section<'a> {
    title: &'a str,
    teams: &'a [Team],
    format: OutputFormat,
    region: &'a str,
}

impl fmt::Display for Section<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format {
            OutputFormat::Chat => {
                writeln!(f, "**{}**", self.title)?;
                for team in self.teams {
                    write!(f, "{}: {}", team.name, team.multi_link(self.region))?;
                    if let (Some(avg), Some(max)) = (&team.average_rank, &team.max_rank) {
                        write!(f, " (avg {avg}, max {max})")?;
                    }
                    writeln!(f)?;
                }
            }
            OutputFormat::Report => {
                writeln!(f, "{}", self.title)?;
                for team in self.teams {
                    writeln!(f, "\n{}", team.name)?;
                    writeln!(f, "{}", team.multi_link(self.region))?;
                    if let (Some(avg), Some(max)) = (&team.average_rank, &team.max_rank) {
                        writeln!(f, "Average: {avg}, Max: {max}")?;
                    }
                    for player in &team.players {
                        match &player.rank {
                            Some(rank) => writeln!(f, "    {}: {rank}", player.summoner_name)?,
                            None => writeln!(f, "    {}", player.summoner_name)?,
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Player, Rank};
    use crate::rank::tests::FakeLookup;

    fn team_list() -> TeamList {
        TeamList::new(
            "Division 1",
            vec![
                Team::new("UOL", vec![Player::new("Vizi"), Player::new("Hu Nter")]),
                Team::new("SK", vec![Player::new("Jenax")]),
            ],
        )
    }

    #[test]
    fn test_is_empty() {
        assert!(StalkResult::TeamList(TeamList::new("x", vec![])).is_empty());
        assert!(StalkResult::Team(Team::new("x", vec![])).is_empty());
        assert!(StalkResult::TeamListList(TeamListList::new(vec![TeamList::new("x", vec![])]))
            .is_empty());
        assert!(!StalkResult::TeamList(team_list()).is_empty());
        assert!(!StalkResult::Message(String::new()).is_empty());
    }

    #[test]
    fn test_render_chat() {
        let out = StalkResult::TeamList(team_list()).render(OutputFormat::Chat, "EUW");
        assert_eq!(
            out,
            "**Division 1**\n\
             UOL: https://euw.op.gg/multi/query=Vizi%2CHuNter%2C\n\
             SK: https://euw.op.gg/multi/query=Jenax%2C"
        );
    }

    #[test]
    fn test_render_report_with_ranks() {
        let mut team = Team::new(
            "UOL",
            vec![Player::new("Vizi").with_rank(Rank::from_tier_text("Diamond 2"))],
        );
        team.calc_average_max_rank();

        let out = StalkResult::Team(team).render(OutputFormat::Report, "EUW");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "UOL");
        assert!(lines.contains(&"Average: Diamond 2, Max: Diamond 2"));
        assert!(lines.contains(&"    Vizi: Diamond 2"));
    }

    #[test]
    fn test_render_report_of_every_group() {
        let lists = TeamListList::new(vec![
            team_list(),
            TeamList::new("Division 2", vec![Team::new("MOUZ", vec![Player::new("Kirei")])]),
        ]);

        let out = StalkResult::TeamListList(lists).render(OutputFormat::Report, "EUW");
        assert_eq!(
            out,
            "Division 1\n\
             \n\
             UOL\n\
             https://euw.op.gg/multi/query=Vizi%2CHuNter%2C\n    \
             Vizi\n    \
             Hu Nter\n\
             \n\
             SK\n\
             https://euw.op.gg/multi/query=Jenax%2C\n    \
             Jenax\n\
             \n\
             Division 2\n\
             \n\
             MOUZ\n\
             https://euw.op.gg/multi/query=Kirei%2C\n    \
             Kirei"
        );
    }

    #[test]
    fn test_render_message_verbatim() {
        let out = StalkResult::Message("hello".to_string()).render(OutputFormat::Report, "EUW");
        assert_eq!(out, "hello");
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("report".parse::<OutputFormat>().unwrap(), OutputFormat::Report);
        assert_eq!(OutputFormat::default(), OutputFormat::Chat);
    }

    #[tokio::test]
    async fn test_enrich_adds_ranks_to_chat_output() {
        let lookup = FakeLookup::with(&[("Vizi", "Gold 1"), ("Hu Nter", "Gold 1")]);
        let result = StalkResult::TeamList(team_list())
            .enrich(lookup, &TaskPool::new(2), "EUW")
            .await;

        let out = result.render(OutputFormat::Chat, "EUW");
        assert!(out.contains("UOL: https://euw.op.gg/multi/query=Vizi%2CHuNter%2C (avg Gold 1, max Gold 1)"));
        assert!(out.contains("(avg Unranked, max Unranked)"));
    }
}
