use std::{
    borrow::Cow,
    io::{self, Write},
};

use clap::ValueEnum;

use crate::aggregation::AlbumStats;

/// Decides whether an album is a removal candidate
pub trait Policy {
    fn matches(&self, album: &AlbumStats) -> bool;
}

impl<F> Policy for F
where
    F: Fn(&AlbumStats) -> bool,
{
    fn matches(&self, album: &AlbumStats) -> bool {
        self(album)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Criterion {
    /// Average star rating is below the threshold
    AverageRatingBelow(f64),
    /// No track is rated above the threshold
    MaxRatingAtMost(f64),
    AveragePlayCountBelow(f64),
    TotalPlayCountAtMost(u64),
    /// At least this fraction (0-1) of the album's tracks are rated
    RatedFractionAtLeast(f64),
}

impl Criterion {
    fn matches(self, album: &AlbumStats, unrated_matches: bool) -> bool {
        match self {
            Criterion::AverageRatingBelow(threshold) => album
                .average_rating
                .map_or(unrated_matches, |rating| rating < threshold),
            Criterion::MaxRatingAtMost(threshold) => album
                .max_rating
                .map_or(unrated_matches, |rating| rating <= threshold),
            Criterion::AveragePlayCountBelow(threshold) => album.average_play_count < threshold,
            Criterion::TotalPlayCountAtMost(threshold) => album.total_play_count <= threshold,
            Criterion::RatedFractionAtLeast(fraction) => album.rated_fraction() >= fraction,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Combine {
    /// Every criterion must match
    #[default]
    All,
    /// Any single criterion is enough
    Any,
}

/// A set of threshold criteria.
///
/// An album without any rated track never matches a rating criterion unless
/// `unrated_matches` is set. A policy without criteria matches nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdPolicy {
    pub criteria: Vec<Criterion>,
    pub combine: Combine,
    pub unrated_matches: bool,
}

impl Policy for ThresholdPolicy {
    fn matches(&self, album: &AlbumStats) -> bool {
        if self.criteria.is_empty() {
            return false;
        }
        let mut results = self
            .criteria
            .iter()
            .map(|criterion| criterion.matches(album, self.unrated_matches));
        match self.combine {
            Combine::All => results.all(|matched| matched),
            Combine::Any => results.any(|matched| matched),
        }
    }
}

/// Albums matching the policy, in their original order
pub fn select_candidates<'a>(
    albums: &'a [AlbumStats],
    policy: &impl Policy,
) -> Vec<&'a AlbumStats> {
    albums.iter().filter(|album| policy.matches(album)).collect()
}

/// Write one album ID per line.
///
/// Line breaks inside an ID are written as `\n` and `\r` so every
/// candidate stays on a single line.
pub fn write_report<W: Write>(mut writer: W, candidates: &[&AlbumStats]) -> io::Result<()> {
    for album in candidates {
        writeln!(writer, "{}", single_line(&album.album_id))?;
    }
    writer.flush()
}

fn single_line(album_id: &str) -> Cow<'_, str> {
    if album_id.contains(['\n', '\r']) {
        Cow::Owned(album_id.replace('\n', "\\n").replace('\r', "\\r"))
    } else {
        Cow::Borrowed(album_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album(id: &str, average_rating: Option<f64>, average_play_count: f64) -> AlbumStats {
        AlbumStats {
            album_id: id.to_owned(),
            track_count: 4,
            rated_track_count: if average_rating.is_some() { 4 } else { 0 },
            average_rating,
            max_rating: average_rating,
            total_play_count: (average_play_count * 4.0) as u64,
            average_play_count,
            total_size_bytes: 0,
            total_time_ms: 0,
        }
    }

    fn policy(criteria: Vec<Criterion>) -> ThresholdPolicy {
        ThresholdPolicy {
            criteria,
            ..Default::default()
        }
    }

    #[test]
    fn test_average_rating_below() {
        let policy = policy(vec![Criterion::AverageRatingBelow(2.0)]);
        assert!(policy.matches(&album("A", Some(1.5), 0.0)));
        assert!(!policy.matches(&album("A", Some(2.0), 0.0)));
        assert!(!policy.matches(&album("A", Some(4.0), 0.0)));
    }

    #[test]
    fn test_unrated_is_not_low() {
        let unrated = album("A", None, 0.0);
        assert!(!policy(vec![Criterion::AverageRatingBelow(2.0)]).matches(&unrated));
        assert!(!policy(vec![Criterion::MaxRatingAtMost(5.0)]).matches(&unrated));
    }

    #[test]
    fn test_unrated_matches_when_opted_in() {
        let policy = ThresholdPolicy {
            criteria: vec![Criterion::AverageRatingBelow(2.0)],
            unrated_matches: true,
            ..Default::default()
        };
        assert!(policy.matches(&album("A", None, 0.0)));
        assert!(!policy.matches(&album("A", Some(3.0), 0.0)));
    }

    #[test]
    fn test_max_rating_at_most() {
        let policy = policy(vec![Criterion::MaxRatingAtMost(3.0)]);
        assert!(policy.matches(&album("A", Some(3.0), 0.0)));
        assert!(!policy.matches(&album("A", Some(3.5), 0.0)));
    }

    #[test]
    fn test_play_counts() {
        let average = policy(vec![Criterion::AveragePlayCountBelow(1.0)]);
        assert!(average.matches(&album("A", None, 0.5)));
        assert!(!average.matches(&album("A", None, 1.0)));

        let total = policy(vec![Criterion::TotalPlayCountAtMost(4)]);
        assert!(total.matches(&album("A", None, 1.0)));
        assert!(!total.matches(&album("A", None, 2.0)));
    }

    #[test]
    fn test_rated_fraction_at_least() {
        let policy = policy(vec![
            Criterion::RatedFractionAtLeast(0.5),
            Criterion::MaxRatingAtMost(3.0),
        ]);
        let mut barely_rated = album("A", Some(1.0), 0.0);
        barely_rated.rated_track_count = 1;
        assert!(!policy.matches(&barely_rated));
        barely_rated.rated_track_count = 2;
        assert!(policy.matches(&barely_rated));
    }

    #[test]
    fn test_combine_all_and_any() {
        let criteria = vec![
            Criterion::AverageRatingBelow(2.0),
            Criterion::AveragePlayCountBelow(1.0),
        ];
        let low_rating_played = album("A", Some(1.0), 10.0);

        let all = policy(criteria.clone());
        assert!(!all.matches(&low_rating_played));
        assert!(all.matches(&album("B", Some(1.0), 0.0)));

        let any = ThresholdPolicy {
            criteria,
            combine: Combine::Any,
            unrated_matches: false,
        };
        assert!(any.matches(&low_rating_played));
        assert!(!any.matches(&album("C", Some(4.0), 10.0)));
    }

    #[test]
    fn test_empty_policy_matches_nothing() {
        assert!(!policy(vec![]).matches(&album("A", Some(0.0), 0.0)));
        let any = ThresholdPolicy {
            combine: Combine::Any,
            ..Default::default()
        };
        assert!(!any.matches(&album("A", Some(0.0), 0.0)));
    }

    #[test]
    fn test_closure_policy() {
        let albums = vec![album("A", Some(1.0), 0.0), album("B", None, 0.0)];
        let candidates = select_candidates(&albums, &|album: &AlbumStats| {
            album.average_rating.is_none()
        });
        assert_eq!(candidates, vec![&albums[1]]);
    }

    #[test]
    fn test_select_candidates_keeps_order() {
        let albums = vec![
            album("C", Some(1.0), 0.0),
            album("A", Some(5.0), 0.0),
            album("B", Some(1.0), 0.0),
        ];
        let policy = policy(vec![Criterion::AverageRatingBelow(3.0)]);
        let candidates = select_candidates(&albums, &policy);
        let ids: Vec<_> = candidates.iter().map(|a| a.album_id.as_str()).collect();
        assert_eq!(ids, vec!["C", "B"]);
    }

    #[test]
    fn test_write_report() {
        let albums = vec![album("First", None, 0.0), album("Second Album", None, 0.0)];
        let candidates: Vec<_> = albums.iter().collect();
        let mut output = Vec::new();
        write_report(&mut output, &candidates).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "First\nSecond Album\n");
    }

    #[test]
    fn test_write_report_line_breaks_in_album() {
        let albums = vec![album("Live\nat Home", None, 0.0), album("B\r\nSide", None, 0.0)];
        let candidates: Vec<_> = albums.iter().collect();
        let mut output = Vec::new();
        write_report(&mut output, &candidates).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert_eq!(output.lines().count(), 2);
        assert_eq!(output, "Live\\nat Home\nB\\r\\nSide\n");
    }

    #[test]
    fn test_write_report_empty() {
        let mut output = Vec::new();
        write_report(&mut output, &[]).unwrap();
        assert!(output.is_empty());
    }
}
