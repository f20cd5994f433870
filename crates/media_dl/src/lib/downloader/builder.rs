use media_datastore::DataStore;

use crate::{
    yt::{CollectionSource, MediaFetcher},
    DownloadRequest, MediaDownloader,
};

pub struct MediaDownloaderBuilder<D = (), S = (), F = ()> {
    request: DownloadRequest,
    store: D,
    source: S,
    fetcher: F,
}

impl MediaDownloaderBuilder {
    pub fn new(request: DownloadRequest) -> Self {
        Self {
            request,
            store: (),
            source: (),
            fetcher: (),
        }
    }
}

impl<D, S, F> MediaDownloaderBuilder<D, S, F> {
    pub fn store<D2: DataStore + Send + Sync + 'static>(
        self,
        store: D2,
    ) -> MediaDownloaderBuilder<D2, S, F> {
        MediaDownloaderBuilder {
            request: self.request,
            store,
            source: self.source,
            fetcher: self.fetcher,
        }
    }

    pub fn source<S2: CollectionSource + Send + Sync + 'static>(
        self,
        source: S2,
    ) -> MediaDownloaderBuilder<D, S2, F> {
        MediaDownloaderBuilder {
            request: self.request,
            store: self.store,
            source,
            fetcher: self.fetcher,
        }
    }

    pub fn fetcher<F2: MediaFetcher + Send + Sync + 'static>(
        self,
        fetcher: F2,
    ) -> MediaDownloaderBuilder<D, S, F2> {
        MediaDownloaderBuilder {
            request: self.request,
            store: self.store,
            source: self.source,
            fetcher,
        }
    }
}

impl<D, S, F> MediaDownloaderBuilder<D, S, F>
where
    D: DataStore + Send + Sync + 'static,
    S: CollectionSource + Send + Sync + 'static,
    F: MediaFetcher + Send + Sync + 'static,
{
    pub fn build(self) -> MediaDownloader<D, S, F> {
        // per-collection cache so re-runs of the same id resume from disk
        let cache_dir = self
            .request
            .output_dir
            .join("data")
            .join(&self.request.youtube_id)
            .join("cache");
        MediaDownloader {
            request: self.request,
            cache_dir,
            store: self.store,
            source: self.source,
            fetcher: self.fetcher,
        }
    }
}
