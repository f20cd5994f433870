//! Identifier classification for user-supplied YouTube ids and input files.

use std::{path::Path, sync::LazyLock};

use regex::Regex;

use crate::error::Error;

static PLAYLIST_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^PL[-_a-zA-Z0-9]{16,}$").unwrap());
static CHANNEL_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^UC[-_a-zA-Z0-9]{22,}$").unwrap());
static USER_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").unwrap());
static VIDEO_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:v=|youtu\.be/|shorts/|embed/)([0-9A-Za-z_-]{11})").unwrap()
});

/// What kind of collection a YouTube id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionType {
    Playlist,
    Channel,
    User,
}

impl CollectionType {
    /// Classifies a YouTube id. Comma-separated ids are only meaningful as a
    /// list of playlists.
    pub fn detect(id: &str) -> Option<Self> {
        if id.is_empty() {
            return None;
        }
        if id.contains(',') {
            return id
                .split(',')
                .all(|part| PLAYLIST_ID_RE.is_match(part))
                .then_some(CollectionType::Playlist);
        }
        if PLAYLIST_ID_RE.is_match(id) {
            return Some(CollectionType::Playlist);
        }
        if CHANNEL_ID_RE.is_match(id) {
            return Some(CollectionType::Channel);
        }
        if USER_ID_RE.is_match(id) {
            return Some(CollectionType::User);
        }
        None
    }

    /// Classifies and rejects ids that cannot be resolved.
    pub fn validate(id: &str) -> Result<Self, Error> {
        let collection_type =
            Self::detect(id).ok_or_else(|| Error::InvalidId(id.to_string()))?;
        if collection_type == CollectionType::Channel && id.len() > 24 {
            return Err(Error::InvalidId(id.to_string()));
        }
        Ok(collection_type)
    }
}

/// Extracts the 11-character video id from the usual watch URL shapes.
/// A bare video id is accepted as-is.
pub fn video_id_from_url(url: &str) -> Option<String> {
    if let Some(captures) = VIDEO_URL_RE.captures(url) {
        return Some(captures[1].to_string());
    }
    let trimmed = url.trim();
    (trimmed.len() == 11
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'))
    .then(|| trimmed.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Txt,
}

impl FileKind {
    pub fn detect(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("csv") => Some(FileKind::Csv),
            Some("txt") => Some(FileKind::Txt),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_playlist_channel_and_user_ids() {
        assert_eq!(
            CollectionType::detect("PLn3nHXu50t5SNxEEYn1CqF_GAB1KBjZFe"),
            Some(CollectionType::Playlist)
        );
        assert_eq!(
            CollectionType::detect("UC_x5XG1OV2P6uZZ5FSM9Ttw"),
            Some(CollectionType::Channel)
        );
        assert_eq!(
            CollectionType::detect("GoogleDevelopers"),
            Some(CollectionType::User)
        );
        assert_eq!(CollectionType::detect("not a valid id!"), None);
        assert_eq!(CollectionType::detect(""), None);
    }

    #[test]
    fn comma_separated_ids_must_all_be_playlists() {
        let ids = "PLn3nHXu50t5SNxEEYn1CqF_GAB1KBjZFe,PLn3nHXu50t5RZo3rrWTSQYZnUpHPNmRns";
        assert_eq!(CollectionType::detect(ids), Some(CollectionType::Playlist));
        assert_eq!(
            CollectionType::detect("PLn3nHXu50t5SNxEEYn1CqF_GAB1KBjZFe,GoogleDevelopers"),
            None
        );
    }

    #[test]
    fn validate_rejects_overlong_channel_ids() {
        let overlong = format!("UC{}", "a".repeat(30));
        assert!(matches!(
            CollectionType::validate(&overlong),
            Err(Error::InvalidId(_))
        ));
    }

    #[test]
    fn extracts_video_id_from_common_url_shapes() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ?rel=0",
            "dQw4w9WgXcQ",
        ] {
            assert_eq!(video_id_from_url(url).as_deref(), Some("dQw4w9WgXcQ"), "{url}");
        }
        assert_eq!(video_id_from_url("https://example.com/"), None);
    }

    #[test]
    fn detects_file_kind_by_extension() {
        assert_eq!(FileKind::detect(&PathBuf::from("list.csv")), Some(FileKind::Csv));
        assert_eq!(FileKind::detect(&PathBuf::from("titles.txt")), Some(FileKind::Txt));
        assert_eq!(FileKind::detect(&PathBuf::from("data.json")), None);
    }
}
