pub mod collection_source;
pub mod datastore;
pub mod fetcher;
