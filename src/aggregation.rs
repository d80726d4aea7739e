use std::collections::HashMap;

use crate::apple_music::custom_types::TrackRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct AlbumStats {
    pub album_id: String,
    pub track_count: usize,
    pub rated_track_count: usize,
    /// Mean star rating over rated tracks only
    pub average_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub total_play_count: u64,
    pub average_play_count: f64,
    pub total_size_bytes: u64,
    pub total_time_ms: u64,
}

impl AlbumStats {
    pub fn rated_fraction(&self) -> f64 {
        self.rated_track_count as f64 / self.track_count as f64
    }
}

#[derive(Default)]
struct Accumulator {
    track_count: usize,
    rated_track_count: usize,
    rating_sum: f64,
    max_rating: Option<f64>,
    play_count_sum: u64,
    size_sum: u64,
    time_sum: u64,
}

impl Accumulator {
    fn add(&mut self, track: &TrackRecord) {
        self.track_count += 1;
        if let Some(rating) = track.rating {
            let stars = rating.stars();
            self.rated_track_count += 1;
            self.rating_sum += stars;
            self.max_rating = Some(self.max_rating.map_or(stars, |max| max.max(stars)));
        }
        self.play_count_sum = self
            .play_count_sum
            .saturating_add(track.play_count.unwrap_or_default());
        self.size_sum = self
            .size_sum
            .saturating_add(track.size_bytes.unwrap_or_default());
        self.time_sum = self
            .time_sum
            .saturating_add(track.total_time_ms.unwrap_or_default());
    }

    fn finish(self, album_id: String) -> AlbumStats {
        let average_rating = (self.rated_track_count > 0)
            .then(|| self.rating_sum / self.rated_track_count as f64);
        AlbumStats {
            album_id,
            track_count: self.track_count,
            rated_track_count: self.rated_track_count,
            average_rating,
            max_rating: self.max_rating,
            total_play_count: self.play_count_sum,
            average_play_count: self.play_count_sum as f64 / self.track_count as f64,
            total_size_bytes: self.size_sum,
            total_time_ms: self.time_sum,
        }
    }
}

/// Group tracks by album and compute per-album statistics.
///
/// Albums are returned in the order they are first encountered. Tracks
/// without an album are skipped.
pub fn aggregate_albums(tracks: &[TrackRecord]) -> Vec<AlbumStats> {
    let mut album_indices: HashMap<&str, usize> = HashMap::new();
    let mut albums: Vec<(&str, Accumulator)> = Vec::new();

    for track in tracks {
        let Some(album) = track.album.as_deref() else {
            continue;
        };
        let index = *album_indices.entry(album).or_insert_with(|| {
            albums.push((album, Accumulator::default()));
            albums.len() - 1
        });
        albums[index].1.add(track);
    }

    albums
        .into_iter()
        .map(|(album, accumulator)| accumulator.finish(album.to_owned()))
        .collect()
}
