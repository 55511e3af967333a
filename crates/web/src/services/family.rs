//! Family statistics.

use chrono::NaiveDate;

use family_planner_core::RELATIONSHIPS;

use crate::models::family::FamilyMember;

/// Width of an age bucket in years.
const BUCKET_YEARS: u32 = 10;

/// Members in one ten-year age band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgeBucket {
    /// Lower bound, e.g. 30 for `30-39`.
    pub start: u32,
    pub count: usize,
}

impl AgeBucket {
    /// Label such as `30-39`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}-{}", self.start, self.start + BUCKET_YEARS - 1)
    }
}

/// Counts shown next to the member list.
#[derive(Debug, Clone, Default)]
pub struct FamilyStats {
    pub total: usize,
    /// Relationship and member count, in catalog order, only non-zero entries.
    pub by_relationship: Vec<(String, usize)>,
    /// Youngest band first, only non-empty bands.
    pub age_buckets: Vec<AgeBucket>,
    /// Members with no birth date recorded.
    pub without_birth_date: usize,
}

/// Whole years between `birth_date` and `today`, counting a year only once
/// the birthday has passed. `None` for a birth date in the future.
#[must_use]
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> Option<u32> {
    today.years_since(birth_date)
}

/// Compute statistics for a family.
#[must_use]
pub fn family_stats(members: &[FamilyMember], today: NaiveDate) -> FamilyStats {
    let mut by_relationship: Vec<(String, usize)> = RELATIONSHIPS
        .entries()
        .iter()
        .map(|r| ((*r).to_owned(), 0))
        .collect();
    let mut age_buckets: Vec<AgeBucket> = Vec::new();
    let mut without_birth_date = 0;

    for member in members {
        match by_relationship
            .iter_mut()
            .find(|(r, _)| *r == member.relationship)
        {
            Some(entry) => entry.1 += 1,
            None => by_relationship.push((member.relationship.clone(), 1)),
        }

        let Some(age) = member.birth_date.and_then(|b| age_on(b, today)) else {
            without_birth_date += 1;
            continue;
        };
        let start = age / BUCKET_YEARS * BUCKET_YEARS;
        match age_buckets.iter_mut().find(|b| b.start == start) {
            Some(bucket) => bucket.count += 1,
            None => age_buckets.push(AgeBucket { start, count: 1 }),
        }
    }

    by_relationship.retain(|(_, count)| *count > 0);
    age_buckets.sort_by_key(|b| b.start);

    FamilyStats {
        total: members.len(),
        by_relationship,
        age_buckets,
        without_birth_date,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use family_planner_core::FamilyMemberId;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn member(name: &str, relationship: &str, birth_date: Option<NaiveDate>) -> FamilyMember {
        FamilyMember {
            id: FamilyMemberId::new(1),
            name: name.to_owned(),
            relationship: relationship.to_owned(),
            birth_date,
        }
    }

    #[test]
    fn test_age_counts_birthday_not_yet_reached() {
        let today = date(2026, 6, 15);
        assert_eq!(age_on(date(1990, 6, 15), today), Some(36));
        assert_eq!(age_on(date(1990, 6, 16), today), Some(35));
        assert_eq!(age_on(date(2026, 6, 16), today), None);
    }

    #[test]
    fn test_age_for_leap_day_birthday() {
        assert_eq!(age_on(date(2008, 2, 29), date(2026, 2, 28)), Some(17));
        assert_eq!(age_on(date(2008, 2, 29), date(2026, 3, 1)), Some(18));
    }

    #[test]
    fn test_family_stats_buckets_and_relationships() {
        let today = date(2026, 6, 15);
        let members = vec![
            member("Alex", "Spouse/Partner", Some(date(1988, 1, 2))),
            member("Sam", "Child", Some(date(2016, 9, 1))),
            member("Robin", "Child", Some(date(2019, 3, 3))),
            member("Pat", "Parent", None),
        ];
        let stats = family_stats(&members, today);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.without_birth_date, 1);
        assert_eq!(
            stats.by_relationship,
            vec![
                ("Spouse/Partner".to_owned(), 1),
                ("Child".to_owned(), 2),
                ("Parent".to_owned(), 1),
            ]
        );
        assert_eq!(
            stats.age_buckets,
            vec![
                AgeBucket { start: 0, count: 2 },
                AgeBucket { start: 30, count: 1 },
            ]
        );
        assert_eq!(stats.age_buckets[1].label(), "30-39");
    }

    #[test]
    fn test_ten_year_boundary() {
        let today = date(2026, 6, 15);
        let stats = family_stats(&[member("Kim", "Child", Some(date(2016, 6, 15)))], today);
        assert_eq!(stats.age_buckets[0].label(), "10-19");
    }
}
