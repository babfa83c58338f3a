use ::scraper::Selector;
use tracing::{debug, instrument};

use crate::dispatch::StalkContext;
use crate::error::{Result, StalkError};
use crate::model::{Team, TeamList};
use crate::scraper::summoners_inn::parse_roster;
use crate::scraper::{self, collect_links, element_text, origin, select_text, Html};
use crate::task::{Task, TaskGroup};

const INCOMPLETE_SIGN_UP: &str = "Nicht genug Spieler";

/// Every team with a complete sign-up for a league.
#[instrument(skip(ctx))]
pub(crate) async fn get_league(ctx: StalkContext, url: String) -> Result<TeamList> {
    let title = {
        let document = scraper::get_document(&ctx.http, &url).await?;
        parse_title(&document)?
    };

    let participants_url = format!("{}/participants", url.trim_end_matches('/'));
    let links = {
        let document = scraper::get_document(&ctx.http, &participants_url).await?;
        parse_participant_links(&document, &origin(&url))?
    };
    debug!(%title, count = links.len(), "found participants");

    let tasks = links
        .into_iter()
        .map(|link| {
            let ctx = ctx.clone();
            Task::new(move |link| fetch_team(ctx, link), link)
        })
        .collect();
    let teams: Vec<Team> = ctx
        .pool
        .submit(TaskGroup::new(format!("stalk: {title}"), tasks))
        .await
        .into_iter()
        .flatten()
        .collect();

    Ok(TeamList::new(title, teams))
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

async fn fetch_team(ctx: StalkContext, url: String) -> Result<Option<Team>> {
    let document = scraper::get_document(&ctx.http, &url).await?;
    let name_selector = Selector::parse("h1")?;
    parse_roster(&document, &name_selector)
}

fn parse_title(document: &Html) -> Result<String> {
    let selector = Selector::parse("h1")?;
    let title = select_text(&document.root_element(), &selector);
    if title.is_empty() {
        return Err(StalkError::ElementNotFound {
            context: "league title",
        });
    }
    Ok(title)
}

/// Team links of the participants table, skipping incomplete sign-ups.
fn parse_participant_links(document: &Html, base_url: &str) -> Result<Vec<String>> {
    let row_selector = Selector::parse("tr")?;
    let pending_selector = Selector::parse("span.txt-status-pending")?;
    let link_selector = Selector::parse("a[href]")?;

    let mut links: Vec<String> = Vec::new();
    for row in document.select(&row_selector) {
        let incomplete = row
            .select(&pending_selector)
            .any(|status| element_text(&status).contains(INCOMPLETE_SIGN_UP));
        if incomplete {
            continue;
        }
        for link in collect_links(&row, &link_selector, base_url) {
            if !links.contains(&link) {
                links.push(link);
            }
        }
    }
    Ok(links)
}
