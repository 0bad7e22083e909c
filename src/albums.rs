use crate::client::Client;
use crate::errors::{Error, Result};
use crate::types::Album;

impl Client {
    /// Returns the first album whose title matches `title` exactly, from a
    /// single unpaged listing. Duplicate titles resolve to whichever the
    /// service listed first.
    pub async fn find_album_by_title(&self, title: &str) -> Result<Option<Album>> {
        let response = self.api().list_albums().await?;
        Ok(response.albums.into_iter().find(|album| album.title == title))
    }

    /// Finds the album titled `title`, creating it when absent. A found
    /// album is re-fetched by id so the caller gets its full detail.
    pub async fn get_or_create_album(&self, title: &str) -> Result<Album> {
        if title.is_empty() {
            return Err(Error::InvalidAlbumTitle);
        }

        if let Some(album) = self.find_album_by_title(title).await? {
            return self.api().get_album(&album.id).await;
        }

        log::info!("Creating album {}", title);
        self.api().create_album(title).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{PhotosApi, RawUploadResponse, UploadTransport};
    use crate::retry::RetryConfig;
    use crate::types::{BatchCreateRequest, BatchCreateResponse, ListAlbumsResponse};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn album(id: &str, title: &str) -> Album {
        Album {
            id: id.to_string(),
            title: title.to_string(),
            product_url: None,
            is_writeable: Some(true),
            media_items_count: None,
            cover_photo_base_url: None,
        }
    }

    /// Album-only API double counting which calls were made.
    struct AlbumApi {
        albums: Vec<Album>,
        list_calls: AtomicU32,
        get_calls: AtomicU32,
        create_calls: AtomicU32,
    }

    impl AlbumApi {
        fn new(albums: Vec<Album>) -> Self {
            Self {
                albums,
                list_calls: AtomicU32::new(0),
                get_calls: AtomicU32::new(0),
                create_calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl PhotosApi for AlbumApi {
        async fn batch_create(&self, _request: &BatchCreateRequest) -> Result<BatchCreateResponse> {
            unimplemented!("not used by album tests")
        }

        async fn list_albums(&self) -> Result<ListAlbumsResponse> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(ListAlbumsResponse {
                albums: self.albums.clone(),
                next_page_token: None,
            })
        }

        async fn get_album(&self, id: &str) -> Result<Album> {
            self.get_calls.fetch_add(1, Ordering::SeqCst);
            self.albums
                .iter()
                .find(|album| album.id == id)
                .cloned()
                .ok_or_else(|| Error::api(404, format!("album {} not found", id)))
        }

        async fn create_album(&self, title: &str) -> Result<Album> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            Ok(album("created-id", title))
        }
    }

    struct NoTransport;

    #[async_trait]
    impl UploadTransport for NoTransport {
        async fn send_upload(&self, _filename: &str, _body: Bytes) -> Result<RawUploadResponse> {
            unimplemented!("not used by album tests")
        }
    }

    fn client_with(api: Arc<AlbumApi>) -> Client {
        Client::with_parts(Arc::new(NoTransport), api, None, RetryConfig::default())
    }

    #[tokio::test]
    async fn test_empty_title_fails_before_any_call() {
        let api = Arc::new(AlbumApi::new(vec![]));
        let client = client_with(api.clone());

        let result = client.get_or_create_album("").await;

        assert!(matches!(result, Err(Error::InvalidAlbumTitle)));
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 0);
        assert_eq!(api.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_existing_album_is_fetched_not_created() {
        let api = Arc::new(AlbumApi::new(vec![
            album("a1", "Other"),
            album("a2", "Trip"),
        ]));
        let client = client_with(api.clone());

        let found = client.get_or_create_album("Trip").await.unwrap();

        assert_eq!(found.id, "a2");
        assert_eq!(api.get_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_album_is_created() {
        let api = Arc::new(AlbumApi::new(vec![album("a1", "Other")]));
        let client = client_with(api.clone());

        let created = client.get_or_create_album("Trip").await.unwrap();

        assert_eq!(created.id, "created-id");
        assert_eq!(created.title, "Trip");
        assert_eq!(api.get_calls.load(Ordering::SeqCst), 0);
        assert_eq!(api.create_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_duplicate_titles_first_match_wins() {
        let api = Arc::new(AlbumApi::new(vec![
            album("first", "Trip"),
            album("second", "Trip"),
        ]));
        let client = client_with(api.clone());

        let found = client.find_album_by_title("Trip").await.unwrap().unwrap();
        assert_eq!(found.id, "first");
    }

    #[tokio::test]
    async fn test_title_match_is_exact() {
        let api = Arc::new(AlbumApi::new(vec![album("a1", "Trip 2024")]));
        let client = client_with(api.clone());

        let found = client.find_album_by_title("Trip").await.unwrap();
        assert!(found.is_none());
    }
}
