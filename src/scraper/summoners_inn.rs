use ::scraper::{ElementRef, Selector};
use tracing::{debug, info, instrument};

use crate::dispatch::StalkContext;
use crate::error::{Result, StalkError};
use crate::model::{Player, Team, TeamList, TeamListList};
use crate::scraper::{self, collect_links, element_text, origin, select_text, Html};
use crate::task::{Task, TaskGroup};

const GROUP_STAGE_HEADING: &str = "Gruppenphase";
const GROUP_LINK_SEGMENTS: [&str; 2] = ["gruppenphase", "group"];
const CONFIRMED_PLAYER: &str = "Bestätigter Spieler";

/// Every group of a season's group stage with its teams.
#[instrument(skip(ctx))]
pub(crate) async fn get_season(ctx: StalkContext, url: String) -> Result<TeamListList> {
    let links = {
        let document = scraper::get_document(&ctx.http, &url).await?;
        parse_group_links(&document, &origin(&url))?
    };

    info!(count = links.len(), "stalking groups");
    let tasks = links
        .into_iter()
        .map(|link| {
            let ctx = ctx.clone();
            Task::new(move |link| get_group(ctx, link), link)
        })
        .collect();
    let team_lists = ctx.pool.submit(TaskGroup::new(format!("stalk: {url}"), tasks)).await;

    info!(groups = team_lists.len(), "finished season");
    Ok(TeamListList::new(team_lists))
}

/// The teams of one group, named after its division.
#[instrument(skip(ctx))]
pub(crate) async fn get_group(ctx: StalkContext, url: String) -> Result<TeamList> {
    let (division, links) = {
        let document = scraper::get_document(&ctx.http, &url).await?;
        parse_group(&document, &origin(&url))?
    };

    let tasks = links
        .into_iter()
        .map(|link| {
            let ctx = ctx.clone();
            Task::new(move |link| fetch_team(ctx, link), link)
        })
        .collect();
    let teams: Vec<Team> = ctx
        .pool
        .submit(TaskGroup::new(format!("stalk: {division}"), tasks))
        .await
        .into_iter()
        .flatten()
        .collect();

    debug!(%division, count = teams.len(), "parsed group");
    Ok(TeamList::new(division, teams))
}

#[instrument(skip(ctx))]
pub(crate) async fn get_team(ctx: StalkContext, url: String) -> Result<Team> {
    fetch_team(ctx, url.clone())
        .await?
        .ok_or_else(|| StalkError::Extraction {
            url,
            reason: "team has been deleted".to_string(),
        })
}

/// `None` when the team page no longer shows a roster.
async fn fetch_team(ctx: StalkContext, url: String) -> Result<Option<Team>> {
    let document = scraper::get_document(&ctx.http, &url).await?;
    let name_selector = Selector::parse("div.content-portrait-head a")?;
    parse_roster(&document, &name_selector)
}

fn parse_group_links(document: &Html, base_url: &str) -> Result<Vec<String>> {
    let section_selector = Selector::parse("section.boxed-section")?;
    let heading_selector = Selector::parse("h2")?;
    let link_selector = Selector::parse("a[href]")?;

    let group_stage = document
        .select(&section_selector)
        .find(|section| select_text(section, &heading_selector).contains(GROUP_STAGE_HEADING))
        .ok_or(StalkError::ElementNotFound {
            context: "group stage section",
        })?;

    Ok(collect_links(&group_stage, &link_selector, base_url)
        .into_iter()
        .filter(|link| {
            link.split('/')
                .any(|segment| GROUP_LINK_SEGMENTS.contains(&segment))
        })
        .collect())
}

fn parse_group(document: &Html, base_url: &str) -> Result<(String, Vec<String>)> {
    let division_selector = Selector::parse("#container > div > h1")?;
    let table_selector = Selector::parse("table.table-fixed-single")?;
    let link_selector = Selector::parse("a[href]")?;

    let division = select_text(&document.root_element(), &division_selector);
    let table = document
        .select(&table_selector)
        .next()
        .ok_or(StalkError::ElementNotFound {
            context: "group standings table",
        })?;

    Ok((division, collect_links(&table, &link_selector, base_url)))
}

/// Read a team page roster, keeping confirmed players only.
///
/// Shared by every site built on the same league platform; only the element
/// holding the team name differs.
pub(crate) fn parse_roster(document: &Html, name_selector: &Selector) -> Result<Option<Team>> {
    let grid_selector = Selector::parse("ul.content-portrait-grid-l")?;
    let Some(grid) = document.select(&grid_selector).next() else {
        return Ok(None);
    };

    let name = select_text(&document.root_element(), name_selector);
    let players = parse_confirmed_players(&grid)?;
    Ok(Some(Team::new(name, players)))
}

fn parse_confirmed_players(grid: &ElementRef) -> Result<Vec<Player>> {
    let item_selector = Selector::parse("li")?;
    let status_selector = Selector::parse("span.txt-status-positive")?;
    let summoner_selector = Selector::parse(r#"span[title^="League of Legends"]"#)?;

    Ok(grid
        .select(&item_selector)
        .filter(|item| {
            item.select(&status_selector)
                .next()
                .is_some_and(|status| element_text(&status) == CONFIRMED_PLAYER)
        })
        .filter_map(|item| item.select(&summoner_selector).next())
        .map(|summoner| Player::new(element_text(&summoner)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.summoners-inn.de";

    const SEASON_PAGE: &str = r#"
        <html><body>
        <section class="boxed-section"><h2>Playoffs</h2>
            <a href="/de/leagues/sinn/1338-season-3/playoffs/1">Playoffs</a>
        </section>
        <section class="boxed-section"><h2>Gruppenphase</h2>
            <a href="/de/leagues/sinn/1338-season-3/group/209-gruppenphase/5055-division-1-1">Division 1</a>
            <a href="/de/leagues/sinn/1338-season-3/group/209-gruppenphase/5056-division-2-1">Division 2</a>
            <a href="/de/leagues/sinn/1338-season-3/group/209-gruppenphase/5055-division-1-1">Division 1</a>
            <a href="/de/leagues/sinn/1338-season-3/rules">Regeln</a>
        </section>
        </body></html>
    "#;

    const TEAM_PAGE: &str = r#"
        <html><body>
        <div class="content-portrait-head"><a href="/x">Unicorns of Love</a></div>
        <ul class="content-portrait-grid-l">
            <li>
                <span title="League of Legends » LoL Summoner Name (EU West)">Vizicsacsi</span>
                <span class="txt-status-positive">Bestätigter Spieler</span>
            </li>
            <li>
                <span title="League of Legends » LoL Summoner Name (EU West)">Benched</span>
                <span class="txt-status-negative">Ersatzspieler</span>
            </li>
            <li>
                <span title="League of Legends » LoL Summoner Name (EU West)">Hu Nter</span>
                <span class="txt-status-positive">Bestätigter Spieler</span>
            </li>
        </ul>
        </body></html>
    "#;

    #[test]
    fn test_parse_group_links() {
        let document = Html::parse_document(SEASON_PAGE);
        let links = parse_group_links(&document, BASE).unwrap();
        assert_eq!(
            links,
            vec![
                "https://www.summoners-inn.de/de/leagues/sinn/1338-season-3/group/209-gruppenphase/5055-division-1-1",
                "https://www.summoners-inn.de/de/leagues/sinn/1338-season-3/group/209-gruppenphase/5056-division-2-1",
            ]
        );
    }

    #[test]
    fn test_parse_group_links_without_group_stage() {
        let document = Html::parse_document("<html><body><h1>News</h1></body></html>");
        assert!(matches!(
            parse_group_links(&document, BASE),
            Err(StalkError::ElementNotFound { .. })
        ));
    }

    #[test]
    fn test_parse_group() {
        let document = Html::parse_document(
            r#"<html><body><div id="container"><div><h1> Division 1.1 </h1></div></div>
            <table class="table table-fixed-single table-responsive">
                <tr><td><a href="/de/leagues/sinn/teams/1-uol">UOL</a></td></tr>
                <tr><td><a href="/de/leagues/sinn/teams/2-sk">SK</a></td></tr>
            </table></body></html>"#,
        );
        let (division, links) = parse_group(&document, BASE).unwrap();
        assert_eq!(division, "Division 1.1");
        assert_eq!(links.len(), 2);
        assert_eq!(links[1], "https://www.summoners-inn.de/de/leagues/sinn/teams/2-sk");
    }

    #[test]
    fn test_parse_roster_keeps_confirmed_players() {
        let document = Html::parse_document(TEAM_PAGE);
        let selector = Selector::parse("div.content-portrait-head a").unwrap();
        let team = parse_roster(&document, &selector).unwrap().unwrap();

        assert_eq!(team.name, "Unicorns of Love");
        let names: Vec<&str> = team.players.iter().map(|p| p.summoner_name.as_str()).collect();
        assert_eq!(names, vec!["Vizicsacsi", "Hu Nter"]);
    }

    #[test]
    fn test_parse_roster_of_deleted_team() {
        let document = Html::parse_document("<html><body><h1>Gelöscht</h1></body></html>");
        let selector = Selector::parse("h1").unwrap();
        assert!(parse_roster(&document, &selector).unwrap().is_none());
    }
}
