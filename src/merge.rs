use crate::model::{TeamList, TeamListList, TournamentList};

/// Collections that can absorb another partial result of the same shape.
///
/// Duplicates are decided by the element type's `PartialEq`, never by
/// position, so the merged result does not depend on completion order.
pub trait Merge: Sized {
    /// Append every element of `other`.
    fn merge_from(&mut self, other: Self);

    /// Drop later duplicates, keeping the first occurrence of each element.
    fn remove_duplicates(&mut self);
}

/// Fold partial results into the first one, deduplicating after every step.
///
/// Returns `None` when there is nothing to merge.
pub fn merge<T: Merge>(results: Vec<T>) -> Option<T> {
    let mut results = results.into_iter();
    let mut total = results.next()?;
    total.remove_duplicates();
    for partial in results {
        total.merge_from(partial);
        total.remove_duplicates();
    }
    Some(total)
}

fn dedup_by_eq<T: PartialEq>(items: &mut Vec<T>) {
    let mut kept: Vec<T> = Vec::with_capacity(items.len());
    for item in items.drain(..) {
        if !kept.contains(&item) {
            kept.push(item);
        }
    }
    *items = kept;
}

impl Merge for TournamentList {
    fn merge_from(&mut self, other: Self) {
        self.append(other.tournaments);
    }

    fn remove_duplicates(&mut self) {
        dedup_by_eq(&mut self.tournaments);
    }
}

impl Merge for TeamList {
    fn merge_from(&mut self, other: Self) {
        if self.name.is_empty() {
            self.name = other.name;
        }
        self.teams.extend(other.teams);
    }

    fn remove_duplicates(&mut self) {
        dedup_by_eq(&mut self.teams);
    }
}

impl Merge for TeamListList {
    fn merge_from(&mut self, other: Self) {
        self.team_lists.extend(other.team_lists);
    }

    /// Lists with the same name are the same group; their teams are merged.
    fn remove_duplicates(&mut self) {
        let mut kept: Vec<TeamList> = Vec::with_capacity(self.team_lists.len());
        for list in self.team_lists.drain(..) {
            match kept.iter_mut().find(|k| k.name == list.name) {
                Some(existing) => {
                    existing.merge_from(list);
                    existing.remove_duplicates();
                }
                None => kept.push(list),
            }
        }
        self.team_lists = kept;
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono_tz::Europe::Berlin;
    use itertools::Itertools;

    use super::*;
    use crate::model::{Player, Team, Tournament, Website};

    fn cup(name: &str, hour: u32, website: Website) -> Tournament {
        let start = Berlin.with_ymd_and_hms(2026, 5, 2, hour, 0, 0).unwrap();
        Tournament::new(name, start, "EU", "Team", website)
    }

    fn identities(list: &TournamentList) -> Vec<(String, i64)> {
        list.tournaments
            .iter()
            .map(|t| (t.name.clone(), t.start.timestamp()))
            .sorted()
            .collect()
    }

    /// Partial results of different shapes: empty, single, all duplicates
    /// and mixed.
    fn partials() -> Vec<TournamentList> {
        vec![
            TournamentList::default(),
            TournamentList::new(vec![cup("Cup A", 18, Website::Battlefy)]),
            TournamentList::new(vec![
                cup("Cup A", 18, Website::Battlefy),
                cup("Cup A", 18, Website::Esl),
                cup("Cup A", 18, Website::Challengermode),
            ]),
            TournamentList::new(vec![
                cup("Cup A", 18, Website::Battlefy),
                cup("Cup B", 19, Website::Battlefy),
                cup("Cup A", 20, Website::Battlefy),
            ]),
            TournamentList::new(vec![
                cup("Cup C", 12, Website::Challengermode),
                cup("Cup B", 19, Website::Esl),
                cup("Cup C", 12, Website::Battlefy),
            ]),
        ]
    }

    #[test]
    fn test_merge_empty_is_none() {
        assert!(merge(Vec::<TournamentList>::new()).is_none());
    }

    #[test]
    fn test_same_cup_from_two_sources_collapses() {
        let battlefy = TournamentList::new(vec![cup("Cup A", 18, Website::Battlefy)]);
        let esl = TournamentList::new(vec![cup("Cup A", 18, Website::Esl)]);

        let merged = merge(vec![battlefy, esl]).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.tournaments[0].website, Website::Battlefy);
    }

    #[test]
    fn test_merge_with_itself_is_idempotent() {
        for list in partials() {
            let mut once = list.clone();
            once.remove_duplicates();

            assert_eq!(merge(vec![list.clone(), list.clone()]).unwrap(), once);
            assert_eq!(merge(vec![once.clone(), once.clone(), once.clone()]).unwrap(), once);
        }
    }

    #[test]
    fn test_remove_duplicates_keeps_first() {
        let mut list = partials().remove(2);
        list.remove_duplicates();
        assert_eq!(list.len(), 1);
        assert_eq!(list.tournaments[0].website, Website::Battlefy);
    }

    #[test]
    fn test_merge_is_order_independent() {
        let partials = partials();
        let expected = identities(&merge(partials.clone()).unwrap());
        for perm in partials.into_iter().permutations(5) {
            assert_eq!(identities(&merge(perm).unwrap()), expected);
        }

        let names: Vec<&str> = expected.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["Cup A", "Cup A", "Cup B", "Cup C"]);
    }

    #[test]
    fn test_merge_of_empty_partials_is_empty() {
        let merged = merge(vec![TournamentList::default(), TournamentList::default()]).unwrap();
        assert!(merged.is_empty());
    }

    #[test]
    fn test_team_lists_merge_by_name() {
        let first = TeamListList::new(vec![TeamList::new(
            "Division 1",
            vec![Team::new("UOL", vec![Player::new("a")])],
        )]);
        let second = TeamListList::new(vec![
            TeamList::new(
                "Division 1",
                vec![
                    Team::new("UOL", vec![Player::new("a")]),
                    Team::new("SK", vec![Player::new("b")]),
                ],
            ),
            TeamList::new("Division 2", vec![]),
        ]);

        let merged = merge(vec![first, second]).unwrap();
        assert_eq!(merged.team_lists.len(), 2);
        assert_eq!(merged.team_lists[0].teams.len(), 2);
    }
}
