use ::scraper::Selector;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::dispatch::StalkContext;
use crate::error::{Result, StalkError};
use crate::model::{Player, Team, TeamList};
use crate::scraper::{self, absolute_url, element_text, origin, select_text, Html};
use crate::task::{Task, TaskGroup};

const MAX_PARTICIPANT_PAGES: u32 = 50;

/// Every participant of a tournament with the summoner names they registered.
#[instrument(skip(ctx))]
pub(crate) async fn get_tournament(ctx: StalkContext, url: String) -> Result<TeamList> {
    let participants_url = participants_url(&url);
    let base_url = origin(&url);

    let (title, mut links) = {
        let document = scraper::get_document(&ctx.http, &participants_url).await?;
        (parse_title(&document)?, parse_team_links(&document, &base_url)?)
    };

    for page in 2..=MAX_PARTICIPANT_PAGES {
        let page_url = format!("{participants_url}?page={page}");
        let page_links = match scraper::get_document(&ctx.http, &page_url).await {
            Ok(document) => parse_team_links(&document, &base_url)?,
            Err(err) => {
                debug!(page, error = %err, "stopping at unreadable participants page");
                Vec::new()
            }
        };
        if page_links.is_empty() {
            break;
        }
        links.extend(page_links);
    }

    let links: Vec<String> = links.into_iter().unique().collect();
    debug!(%title, count = links.len(), "found participants");

    let tasks = links
        .into_iter()
        .map(|link| {
            let ctx = ctx.clone();
            Task::new(move |link| get_team(ctx, link), link)
        })
        .collect();
    let teams = ctx
        .pool
        .submit(TaskGroup::new(format!("stalk: {title}"), tasks))
        .await;

    Ok(TeamList::new(title, teams))
}

async fn get_team(ctx: StalkContext, url: String) -> Result<Team> {
    let info_url = format!("{url}info");
    let document = scraper::get_document(&ctx.http, &info_url).await?;
    parse_team(&document)
}

/// `.../tournaments/{id}/information` becomes `.../tournaments/{id}/participants`.
fn participants_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some((head, _)) => format!("{head}/participants"),
        None => format!("{trimmed}/participants"),
    }
}

fn parse_title(document: &Html) -> Result<String> {
    let selector = Selector::parse("div.information div.name h1")?;
    let title = select_text(&document.root_element(), &selector);
    if title.is_empty() {
        return Err(StalkError::ElementNotFound {
            context: "tournament title",
        });
    }
    Ok(title)
}

fn parse_team_links(document: &Html, base_url: &str) -> Result<Vec<String>> {
    let card_selector = Selector::parse("div.size-1-of-4")?;
    let link_selector = Selector::parse("a[href]")?;

    Ok(document
        .select(&card_selector)
        .filter_map(|card| card.select(&link_selector).next())
        .filter_map(|a| a.value().attr("href"))
        .map(|href| absolute_url(base_url, href.trim()))
        .collect())
}

fn parse_team(document: &Html) -> Result<Team> {
    let name_selector = Selector::parse("div.title span")?;
    let summoner_selector = Selector::parse("div.summoner_player_id")?;

    let name = select_text(&document.root_element(), &name_selector);
    let players = document
        .select(&summoner_selector)
        .filter_map(|entry| {
            let text = element_text(&entry);
            let (_, summoner) = text.split_once(':')?;
            let summoner = summoner.trim();
            (!summoner.is_empty()).then(|| Player::new(summoner))
        })
        .collect();

    Ok(Team::new(name, players))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participants_url() {
        assert_eq!(
            participants_url("https://www.toornament.com/tournaments/2324026559405285376/information"),
            "https://www.toornament.com/tournaments/2324026559405285376/participants"
        );
        assert_eq!(
            participants_url("https://www.toornament.com/tournaments/1/information/"),
            "https://www.toornament.com/tournaments/1/participants"
        );
    }

    #[test]
    fn test_parse_participants_page() {
        let document = Html::parse_document(
            r#"<html><body>
            <div class="information"><div class="name"><h1>Summer Clash</h1></div></div>
            <div class="size-1-of-4"><a href="/tournaments/1/participants/11/">UOL</a></div>
            <div class="size-1-of-4"><a href="/tournaments/1/participants/12/">SK</a></div>
            <div class="size-1-of-4"><span>no link</span></div>
            </body></html>"#,
        );

        assert_eq!(parse_title(&document).unwrap(), "Summer Clash");
        assert_eq!(
            parse_team_links(&document, "https://www.toornament.com").unwrap(),
            vec![
                "https://www.toornament.com/tournaments/1/participants/11/",
                "https://www.toornament.com/tournaments/1/participants/12/",
            ]
        );
    }

    #[test]
    fn test_parse_team() {
        let document = Html::parse_document(
            r#"<html><body>
            <div class="title"><div><span>Unicorns of Love</span></div></div>
            <div class="text secondary small summoner_player_id">Summoner Name:
                Vizicsacsi</div>
            <div class="text secondary small summoner_player_id">Summoner Name: Hu Nter</div>
            <div class="text secondary small summoner_player_id">Summoner Name:</div>
            </body></html>"#,
        );

        let team = parse_team(&document).unwrap();
        assert_eq!(team.name, "Unicorns of Love");
        let names: Vec<&str> = team.players.iter().map(|p| p.summoner_name.as_str()).collect();
        assert_eq!(names, vec!["Vizicsacsi", "Hu Nter"]);
    }
}
