use clap::ValueEnum;

use crate::apple_music::api_types;

/// Track rating as stored in the library, in percent (one star = 20)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rating(u8);

impl Rating {
    pub const PERCENT_PER_STAR: u8 = 20;

    pub fn from_percent(percent: u8) -> Self {
        Self(percent)
    }

    #[cfg(test)]
    pub fn from_stars(stars: u8) -> Self {
        Self(stars.saturating_mul(Self::PERCENT_PER_STAR))
    }

    /// Half stars are kept, e.g. 70% is 3.5
    pub fn stars(self) -> f64 {
        f64::from(self.0) / f64::from(Self::PERCENT_PER_STAR)
    }
}

/// How tracks are attributed to albums
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AlbumKey {
    /// The album name
    #[default]
    Album,
    /// "Album Artist - Album", falling back to the track artist
    AlbumArtist,
    /// "Album (Year)"
    AlbumYear,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackRecord {
    pub track_id: Option<u64>,
    pub name: Option<String>,
    /// Grouping key; `None` if the track has no album
    pub album: Option<String>,
    pub rating: Option<Rating>,
    pub play_count: Option<u64>,
    /// Bytes
    pub size_bytes: Option<u64>,
    /// Milliseconds
    pub total_time_ms: Option<u64>,
}

impl AlbumKey {
    fn key_for(self, track: &api_types::library_xml::Track) -> Option<String> {
        let album = track.album.as_deref()?;
        let key = match self {
            AlbumKey::Album => album.to_owned(),
            AlbumKey::AlbumArtist => {
                match track.album_artist.as_deref().or(track.artist.as_deref()) {
                    Some(artist) => format!("{artist} - {album}"),
                    None => album.to_owned(),
                }
            }
            AlbumKey::AlbumYear => match track.year {
                Some(year) => format!("{album} ({year})"),
                None => album.to_owned(),
            },
        };
        Some(key)
    }
}

impl TrackRecord {
    pub fn from_library_track(track: api_types::library_xml::Track, album_key: AlbumKey) -> Self {
        let album = album_key.key_for(&track);
        // A computed rating is inherited from the album, not given to the track
        let rating = match track.rating_computed {
            Some(true) => None,
            _ => track.rating.map(Rating::from_percent),
        };
        TrackRecord {
            track_id: track.track_id,
            name: track.name,
            album,
            rating,
            play_count: track.play_count,
            size_bytes: track.size,
            total_time_ms: track.total_time,
        }
    }
}
