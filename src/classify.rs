use serde::Serialize;
use strum_macros::{EnumIter, EnumString};
use tracing::debug;

use crate::error::{Result, StalkError};

/// Sites a stalk URL can point to.
///
/// The serialized name is the keyword looked for in the URL. Variants are
/// listed in matching order: the first keyword contained in the URL wins.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumString, EnumIter, strum_macros::Display,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Site {
    Challengermode,
    Toornament,
    SummonersInn,
    Primeleague,
}

/// The kind of page a URL shows on its site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ResourceType {
    Tournament,
    Match,
    Season,
    Group,
    Team,
    League,
}

impl Site {
    /// Path keyword sets per resource type, most specific first.
    ///
    /// A season URL is a prefix of its group and team URLs, so `{leagues}`
    /// must be tried last.
    fn patterns(self) -> &'static [(ResourceType, &'static [&'static str])] {
        match self {
            Site::Challengermode => &[
                (ResourceType::Tournament, &["Tournaments", "Show"]),
                (ResourceType::Match, &["Challenges", "View"]),
            ],
            Site::Toornament => &[(ResourceType::Tournament, &["tournaments", "information"])],
            Site::SummonersInn => &[
                (ResourceType::Group, &["leagues", "group"]),
                (ResourceType::Team, &["leagues", "teams"]),
                (ResourceType::Season, &["leagues"]),
            ],
            Site::Primeleague => &[
                (ResourceType::Team, &["leagues", "teams"]),
                (ResourceType::League, &["leagues"]),
            ],
        }
    }

    /// Every resource type this site can be classified as.
    pub fn resource_types(self) -> impl Iterator<Item = ResourceType> {
        self.patterns().iter().map(|(resource, _)| *resource)
    }
}

/// Map a URL to the site and resource type it points to.
pub fn classify(url: &str) -> Result<(Site, ResourceType)> {
    use strum::IntoEnumIterator;

    let unrecognized = || StalkError::UnrecognizedUrl {
        url: url.to_string(),
    };

    let site = Site::iter()
        .find(|site| url.contains(&site.to_string()))
        .ok_or_else(unrecognized)?;

    let segments: Vec<&str> = url.split('/').collect();
    let resource = site
        .patterns()
        .iter()
        .find(|(_, keywords)| keywords.iter().all(|k| segments.contains(k)))
        .map(|(resource, _)| *resource)
        .ok_or_else(unrecognized)?;

    debug!(url, %site, %resource, "classified url");
    Ok((site, resource))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEASON: &str = "https://www.summoners-inn.de/de/leagues/sinn/1338-season-3";

    #[test]
    fn test_classify_season() {
        assert_eq!(
            classify(SEASON).unwrap(),
            (Site::SummonersInn, ResourceType::Season)
        );
    }

    #[test]
    fn test_classify_team_beats_season() {
        let url = format!("{SEASON}/teams/94634-unicorns-of-love");
        assert_eq!(
            classify(&url).unwrap(),
            (Site::SummonersInn, ResourceType::Team)
        );
    }

    #[test]
    fn test_classify_group_beats_season() {
        let url = format!("{SEASON}/group/209-gruppenphase/5055-division-1-1");
        assert_eq!(
            classify(&url).unwrap(),
            (Site::SummonersInn, ResourceType::Group)
        );
    }

    #[test]
    fn test_classify_other_sites() {
        assert_eq!(
            classify("https://www.toornament.com/tournaments/2324026559405285376/information")
                .unwrap(),
            (Site::Toornament, ResourceType::Tournament)
        );
        assert_eq!(
            classify("https://www.challengermode.com/Challenges/View/672fa046-3b77").unwrap(),
            (Site::Challengermode, ResourceType::Match)
        );
        assert_eq!(
            classify("https://www.challengermode.com/Tournaments/Show/30ddf5f5-5e59").unwrap(),
            (Site::Challengermode, ResourceType::Tournament)
        );
        assert_eq!(
            classify("https://www.primeleague.gg/leagues/prm/1234-spring-split").unwrap(),
            (Site::Primeleague, ResourceType::League)
        );
    }

    #[test]
    fn test_classify_unrecognized() {
        let err = classify("https://example.com/foo").unwrap_err();
        assert!(matches!(err, StalkError::UnrecognizedUrl { url } if url == "https://example.com/foo"));

        // Known site, unknown page shape
        assert!(classify("https://www.toornament.com/en_GB/games").is_err());
        assert!(classify("https://www.summoners-inn.de/de/news").is_err());
    }

    #[test]
    fn test_keywords_are_exact_segments() {
        // "teams-overview" must not count as the "teams" segment
        let url = format!("{SEASON}/teams-overview");
        assert_eq!(classify(&url).unwrap().1, ResourceType::Season);
    }
}
