use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use strum_macros::{EnumString, FromRepr};

/// Solo queue tier as shown by ladder sites.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, EnumString, FromRepr,
    strum_macros::Display,
)]
#[strum(ascii_case_insensitive)]
pub enum Tier {
    Iron,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Emerald,
    Diamond,
    Master,
    Grandmaster,
    Challenger,
}

impl Tier {
    /// Master and above have no divisions.
    pub fn is_apex(self) -> bool {
        self >= Tier::Master
    }
}

const DIVIDED_TIERS: u8 = 7;
const MAX_RATING: u8 = DIVIDED_TIERS * 4 + 3;

/// Ladder standing of a player, ordered by `rating`.
///
/// `rating` is `0` for unranked players and grows by one per division:
/// Iron 4 is `1`, Diamond 1 is `28`, Master, Grandmaster and Challenger
/// are `29`, `30` and `31`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rank {
    pub rating: u8,
    pub display: String,
}

impl Rank {
    /// The rank of a player without a placement, rating `0`.
    pub fn unranked() -> Self {
        Self {
            rating: 0,
            display: "Unranked".to_string(),
        }
    }

    pub fn is_ranked(&self) -> bool {
        self.rating > 0
    }

    /// Parse tier text such as `Gold 2`, `platinum IV` or `Master`.
    ///
    /// Anything that does not look like a tier yields [`Rank::unranked`].
    pub fn from_tier_text(text: &str) -> Self {
        let mut parts = text.split_whitespace();
        let Some(tier) = parts.next().and_then(|t| Tier::from_str(t).ok()) else {
            return Self::unranked();
        };

        if tier.is_apex() {
            let rating = DIVIDED_TIERS * 4 + (tier as u8 - Tier::Master as u8) + 1;
            return Self::from_rating(rating);
        }

        let Some(division) = parts.next().and_then(parse_division) else {
            return Self::unranked();
        };
        Self::from_rating(tier as u8 * 4 + (5 - division))
    }

    /// Build the rank for a rating, clamping anything above Challenger.
    pub fn from_rating(rating: u8) -> Self {
        if rating == 0 {
            return Self::unranked();
        }
        let rating = rating.min(MAX_RATING);

        let display = if rating > DIVIDED_TIERS * 4 {
            let apex = Tier::from_repr((Tier::Master as u8 + rating - DIVIDED_TIERS * 4 - 1) as usize);
            apex.map(|t| t.to_string()).unwrap_or_default()
        } else {
            let tier = Tier::from_repr(((rating - 1) / 4) as usize);
            let division = 4 - (rating - 1) % 4;
            tier.map(|t| format!("{t} {division}")).unwrap_or_default()
        };

        Self { rating, display }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

fn parse_division(token: &str) -> Option<u8> {
    match token.to_ascii_lowercase().as_str() {
        "1" | "i" => Some(1),
        "2" | "ii" => Some(2),
        "3" | "iii" => Some(3),
        "4" | "iv" => Some(4),
        _ => None,
    }
}

/// A roster member identified by their summoner name.
///
/// Two players are the same person when their names are byte-for-byte equal.
#[derive(Debug, Clone, Serialize)]
pub struct Player {
    pub summoner_name: String,
    pub rank: Option<Rank>,
}

impl Player {
    pub fn new(summoner_name: impl Into<String>) -> Self {
        Self {
            summoner_name: summoner_name.into(),
            rank: None,
        }
    }

    pub fn with_rank(self, rank: Rank) -> Self {
        Self {
            rank: Some(rank),
            ..self
        }
    }
}

impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.summoner_name == other.summoner_name
    }
}

impl Eq for Player {}
