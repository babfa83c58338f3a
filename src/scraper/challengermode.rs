use ::scraper::{ElementRef, Selector};
use tracing::{debug, instrument};

use crate::dispatch::StalkContext;
use crate::error::Result;
use crate::model::{Player, Team, TeamList};
use crate::scraper::{self, select_text, Html};

/// Both rosters of a single match.
#[instrument(skip(ctx))]
pub(crate) async fn get_match(ctx: StalkContext, url: String) -> Result<TeamList> {
    let document = scraper::get_document(&ctx.http, &url).await?;
    let team_list = parse_match(&document)?;
    debug!(title = %team_list.name, teams = team_list.teams.len(), "parsed match");
    Ok(team_list)
}

fn parse_match(document: &Html) -> Result<TeamList> {
    let title_selector = Selector::parse("div.h1 a")?;
    let block_selector = Selector::parse("div.col-md-6")?;

    let title = select_text(&document.root_element(), &title_selector);
    let teams = document
        .select(&block_selector)
        .map(|block| parse_team(&block))
        .collect::<Result<Vec<Option<Team>>>>()?
        .into_iter()
        .flatten()
        .collect();

    Ok(TeamList::new(title, teams))
}

/// `None` for layout columns that hold no roster.
fn parse_team(block: &ElementRef) -> Result<Option<Team>> {
    let name_selector = Selector::parse("div.dis--blk--sm")?;
    let profile_selector = Selector::parse("a.link-white-dark[href]")?;

    let players: Vec<Player> = block
        .select(&profile_selector)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(summoner_from_profile_link)
        .map(Player::new)
        .collect();
    if players.is_empty() {
        return Ok(None);
    }

    // The name element also holds the roster summary; the name is its first text.
    let name = block
        .select(&name_selector)
        .next()
        .and_then(|e| e.text().map(str::trim).find(|t| !t.is_empty()))
        .unwrap_or_default()
        .to_string();

    Ok(Some(Team::new(name, players)))
}

/// `https://euw.op.gg/summoner/userName=Hu+Nter` yields `Hu Nter`.
fn summoner_from_profile_link(href: &str) -> Option<String> {
    let (_, name) = href.split_once('=')?;
    let name = name.replace('+', " ");
    (!name.is_empty()).then_some(name)
}
