//! YouTube Data API v3 client. Every fetch-or-retrieve operation checks the
//! JSON cache first and saves what it fetched, so a warm cache run makes no
//! API calls at all.

use std::collections::HashMap;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use reqwest_retry_after::RetryAfterMiddleware;
use serde::de::DeserializeOwned;

use crate::{
    cache::JsonCache,
    error::Error,
    types::{
        ApiPage, ChannelResource, PlaylistItemResource, PlaylistResource, VideoAuthor,
        VideoResource,
    },
    yt::CollectionSource,
};

const YOUTUBE_API: &str = "https://www.googleapis.com/youtube/v3";
pub const RESULTS_PER_PAGE: usize = 50; // max: 50
pub const MAX_VIDEOS_PER_REQUEST: usize = 50; // for the videos endpoint

pub struct YouTubeApiClient {
    http: ClientWithMiddleware,
    api_key: String,
    base_url: String,
    cache: JsonCache,
}

impl YouTubeApiClient {
    pub fn new(api_key: impl Into<String>, cache: JsonCache) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        let http = ClientBuilder::new(reqwest::Client::new())
            .with(RetryAfterMiddleware::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        YouTubeApiClient {
            http,
            api_key: api_key.into(),
            base_url: YOUTUBE_API.into(),
            cache,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, Error> {
        let resp = self
            .http
            .get(format!("{}/{}", self.base_url, endpoint))
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                %message,
                "HTTP error response from youtube-api"
            );
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json::<T>().await?)
    }

    async fn get_paged<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>, Error> {
        let max_results = RESULTS_PER_PAGE.to_string();
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = params.to_vec();
            query.push(("maxResults", max_results.as_str()));
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let page: ApiPage<T> = self.get_json(endpoint, &query).await?;
            items.extend(page.items);
            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        Ok(items)
    }

    /// Check that a YouTube search is successful, validating the API key.
    pub async fn credentials_ok(&self) -> bool {
        #[derive(serde::Deserialize)]
        struct AnyItem {}

        match self
            .get_json::<ApiPage<AnyItem>>("search", &[("part", "snippet"), ("maxResults", "1")])
            .await
        {
            Ok(page) => !page.items.is_empty(),
            Err(_) => false,
        }
    }
}

impl CollectionSource for YouTubeApiClient {
    async fn channel(&self, id: &str, for_username: bool) -> anyhow::Result<ChannelResource> {
        let fname = format!("channel_{id}");
        if let Some(channel) = self.cache.load(&fname) {
            return Ok(channel);
        }

        tracing::debug!(channel_id = %id, "query youtube-api for Channel");
        let id_param = if for_username { "forUsername" } else { "id" };
        let page: ApiPage<ChannelResource> = self
            .get_json(
                "channels",
                &[
                    (id_param, id),
                    ("part", "brandingSettings,snippet,contentDetails"),
                ],
            )
            .await?;

        let channel = page.items.into_iter().next().ok_or_else(|| {
            let kind = if for_username { "username" } else { "channelId" };
            Error::NotFound(format!("Invalid {kind} `{id}`"))
        })?;

        self.cache.save(&fname, &channel)?;
        Ok(channel)
    }

    async fn channel_playlists(&self, channel_id: &str) -> anyhow::Result<Vec<PlaylistResource>> {
        let fname = format!("channel_{channel_id}_playlists");
        if let Some(playlists) = self.cache.load(&fname) {
            return Ok(playlists);
        }

        tracing::debug!(%channel_id, "query youtube-api for Playlists of channel");
        let playlists: Vec<PlaylistResource> = self
            .get_paged("playlists", &[("channelId", channel_id), ("part", "snippet")])
            .await?;

        self.cache.save(&fname, &playlists)?;
        Ok(playlists)
    }

    async fn playlist(&self, playlist_id: &str) -> anyhow::Result<PlaylistResource> {
        let fname = format!("playlist_{playlist_id}");
        if let Some(playlist) = self.cache.load(&fname) {
            return Ok(playlist);
        }

        tracing::debug!(%playlist_id, "query youtube-api for Playlist");
        let page: ApiPage<PlaylistResource> = self
            .get_json("playlists", &[("id", playlist_id), ("part", "snippet")])
            .await?;

        let playlist = page
            .items
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("Invalid playlistId `{playlist_id}`")))?;

        self.cache.save(&fname, &playlist)?;
        Ok(playlist)
    }

    /// Same request for both channels and playlists; channel mode goes
    /// through the channel's `uploads` playlist.
    async fn playlist_items(&self, playlist_id: &str) -> anyhow::Result<Vec<PlaylistItemResource>> {
        let fname = format!("playlist_{playlist_id}_videos");
        if let Some(items) = self.cache.load(&fname) {
            return Ok(items);
        }

        tracing::debug!(%playlist_id, "query youtube-api for PlaylistItems of playlist");
        let items: Vec<PlaylistItemResource> = self
            .get_paged(
                "playlistItems",
                &[
                    ("playlistId", playlist_id),
                    ("part", "snippet,contentDetails,status"),
                ],
            )
            .await?;

        self.cache.save(&fname, &items)?;
        Ok(items)
    }

    /// Split over several requests so each includes at most
    /// [`MAX_VIDEOS_PER_REQUEST`] ids, avoiding too-large URIs.
    async fn videos(&self, video_ids: &[&str]) -> anyhow::Result<Vec<VideoResource>> {
        tracing::debug!(count = video_ids.len(), "query youtube-api for Videos");

        let chunks = video_ids
            .chunks(MAX_VIDEOS_PER_REQUEST)
            .map(|chunk| {
                let ids = chunk.join(",");
                async move {
                    self.get_json::<ApiPage<VideoResource>>(
                        "videos",
                        &[
                            ("id", ids.as_str()),
                            ("part", "snippet,contentDetails,statistics"),
                        ],
                    )
                    .await
                }
            })
            .collect::<Vec<_>>();

        let pages = futures::future::try_join_all(chunks).await?;
        Ok(pages.into_iter().flat_map(|page| page.items).collect())
    }

    async fn videos_authors(
        &self,
        video_ids: &[&str],
    ) -> anyhow::Result<HashMap<String, VideoAuthor>> {
        if let Some(authors) = self.cache.load("videos_channels") {
            return Ok(authors);
        }

        tracing::debug!(
            count = video_ids.len(),
            "query youtube-api for Video details"
        );
        let authors: HashMap<String, VideoAuthor> = self
            .videos(video_ids)
            .await?
            .into_iter()
            .map(|video| {
                (
                    video.id,
                    VideoAuthor {
                        channel_id: video.snippet.channel_id,
                        channel_title: video.snippet.channel_title,
                    },
                )
            })
            .collect();

        self.cache.save("videos_channels", &authors)?;
        Ok(authors)
    }
}
