use crate::catalog::api_types::{ApiAlbum, ApiSong, ApiTrack};
use crate::catalog::error::ApiError;
use crate::catalog::types::{Album, AlbumSummary, Song, Track};
use crate::config::ApiConfig;
use color_eyre::{eyre::eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use url::Url;

/// REST resources exposed by the catalog API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
  Albums,
  Songs,
  Tracklist,
}

impl Resource {
  pub fn as_str(&self) -> &'static str {
    match self {
      Resource::Albums => "albums",
      Resource::Songs => "songs",
      Resource::Tracklist => "tracklist",
    }
  }
}

impl fmt::Display for Resource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Catalog API client
#[derive(Clone)]
pub struct CatalogClient {
  http: reqwest::Client,
  base_url: Url,
}

impl CatalogClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let base_url = Url::parse(&config.base_url)
      .map_err(|e| eyre!("Invalid API base URL {}: {}", config.base_url, e))?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let http = reqwest::Client::builder()
      .default_headers(headers)
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base_url })
  }

  /// `{base}/{resource}/` or `{base}/{resource}/{id}/`
  fn endpoint(&self, resource: Resource, id: Option<&str>) -> String {
    let base = self.base_url.as_str().trim_end_matches('/');
    match id {
      Some(id) => format!("{}/{}/{}/", base, resource, id),
      None => format!("{}/{}/", base, resource),
    }
  }

  async fn get_json(&self, url: &str) -> Result<Value, ApiError> {
    tracing::debug!(%url, "GET");

    let response = self.http.get(url).send().await.map_err(|e| {
      tracing::warn!(%url, error = %e, "request failed");
      ApiError::from(e)
    })?;

    let status = response.status();
    tracing::debug!(%url, status = status.as_u16(), "response");
    if !status.is_success() {
      tracing::warn!(%url, status = status.as_u16(), "non-success status");
      return Err(ApiError::Http {
        status: status.as_u16(),
      });
    }

    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
  }

  /// List every record of a resource, unwrapping a paginated envelope if present
  pub async fn fetch_collection<T: DeserializeOwned>(
    &self,
    resource: Resource,
  ) -> Result<Vec<T>, ApiError> {
    let body = self.get_json(&self.endpoint(resource, None)).await?;
    Ok(serde_json::from_value(unwrap_envelope(body))?)
  }

  /// Get a single record of a resource by id
  pub async fn fetch_entity<T: DeserializeOwned>(
    &self,
    resource: Resource,
    id: &str,
  ) -> Result<T, ApiError> {
    let body = self.get_json(&self.endpoint(resource, Some(id))).await?;
    Ok(serde_json::from_value(unwrap_envelope(body))?)
  }

  /// Get all albums for the listing page
  pub async fn albums(&self) -> Result<Vec<AlbumSummary>, ApiError> {
    let albums: Vec<ApiAlbum> = self.fetch_collection(Resource::Albums).await?;
    Ok(albums.into_iter().map(ApiAlbum::into_summary).collect())
  }

  /// Get one album with its tracklist
  pub async fn album(&self, id: u64) -> Result<Album, ApiError> {
    let album: ApiAlbum = self
      .fetch_entity(Resource::Albums, &id.to_string())
      .await?;
    Ok(album.into_full())
  }
}

// Songs and tracklist items are not browsed by any page yet.
#[allow(dead_code)]
impl CatalogClient {
  pub async fn songs(&self) -> Result<Vec<Song>, ApiError> {
    let songs: Vec<ApiSong> = self.fetch_collection(Resource::Songs).await?;
    Ok(songs.into_iter().map(Song::from).collect())
  }

  pub async fn song(&self, id: u64) -> Result<Song, ApiError> {
    let song: ApiSong = self.fetch_entity(Resource::Songs, &id.to_string()).await?;
    Ok(song.into())
  }

  pub async fn tracklist(&self) -> Result<Vec<Track>, ApiError> {
    let items: Vec<ApiTrack> = self.fetch_collection(Resource::Tracklist).await?;
    Ok(items.into_iter().map(Track::from).collect())
  }

  pub async fn tracklist_item(&self, id: u64) -> Result<Track, ApiError> {
    let item: ApiTrack = self
      .fetch_entity(Resource::Tracklist, &id.to_string())
      .await?;
    Ok(item.into())
  }
}

/// Return `results` from a paginated envelope, or the body itself
fn unwrap_envelope(body: Value) -> Value {
  match body {
    Value::Object(mut map) => match map.remove("results") {
      Some(results) if !results.is_null() => results,
      Some(results) => {
        map.insert("results".to_string(), results);
        Value::Object(map)
      }
      None => Value::Object(map),
    },
    other => other,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::{catalog as client, serve};
  use axum::extract::Path;
  use axum::http::StatusCode;
  use axum::routing::get;
  use axum::{Json, Router};
  use serde_json::json;

  #[test]
  fn test_unwrap_envelope() {
    assert_eq!(
      unwrap_envelope(json!({ "count": 1, "results": [1] })),
      json!([1])
    );
    assert_eq!(unwrap_envelope(json!([1, 2])), json!([1, 2]));
    assert_eq!(unwrap_envelope(json!({ "id": 3 })), json!({ "id": 3 }));
    assert_eq!(
      unwrap_envelope(json!({ "results": null })),
      json!({ "results": null })
    );
  }

  #[test]
  fn test_endpoint_paths() {
    let client = client("http://localhost:8000/api/".to_string());
    assert_eq!(
      client.endpoint(Resource::Albums, None),
      "http://localhost:8000/api/albums/"
    );
    assert_eq!(
      client.endpoint(Resource::Tracklist, Some("4")),
      "http://localhost:8000/api/tracklist/4/"
    );
  }

  #[tokio::test]
  async fn test_albums_from_paginated_envelope() {
    let router = Router::new().route(
      "/api/albums/",
      get(|| async {
        Json(json!({
          "count": 2,
          "next": null,
          "results": [
            { "id": 1, "title": "Blue", "artist": "Joni Mitchell", "release_year": 1971 },
            { "id": 2, "title": "Hejira", "artist": "Joni Mitchell", "release_year": 1976 }
          ]
        }))
      }),
    );
    let client = client(serve(router).await);

    let albums = client.albums().await.unwrap();
    assert_eq!(albums.len(), 2);
    assert_eq!(albums[1].title, "Hejira");
  }

  #[tokio::test]
  async fn test_albums_from_bare_array() {
    let router = Router::new().route("/api/albums/", get(|| async { Json(json!([])) }));
    let client = client(serve(router).await);

    assert!(client.albums().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_album_detail() {
    let router = Router::new().route(
      "/api/albums/:id/",
      get(|Path(id): Path<u64>| async move {
        Json(json!({
          "id": id,
          "title": "Blue",
          "artist": "Joni Mitchell",
          "format": "cd",
          "price": "9.99",
          "tracklist": [
            { "id": 1, "position": 1, "song": { "id": 5, "title": "All I Want", "running_time": 214 } }
          ]
        }))
      }),
    );
    let client = client(serve(router).await);

    let album = client.album(42).await.unwrap();
    assert_eq!(album.id, 42);
    assert_eq!(album.tracklist.len(), 1);
  }

  #[tokio::test]
  async fn test_songs_and_tracklist_resources() {
    let router = Router::new()
      .route(
        "/api/songs/",
        get(|| async { Json(json!({ "results": [{ "id": 1, "title": "River", "running_time": 240 }] })) }),
      )
      .route(
        "/api/songs/:id/",
        get(|Path(id): Path<u64>| async move {
          Json(json!({ "id": id, "title": "Case of You", "running_time": 260 }))
        }),
      )
      .route(
        "/api/tracklist/",
        get(|| async {
          Json(json!([
            { "id": 8, "position": 1, "title": "All I Want", "running_time": 212 },
            { "id": 9, "position": 3, "song": { "id": 1, "title": "River", "running_time": 240 } }
          ]))
        }),
      )
      .route(
        "/api/tracklist/:id/",
        get(|| async { Json(json!({ "id": 9, "position": 3, "song": { "id": 1, "title": "River", "running_time": 240 } })) }),
      );
    let client = client(serve(router).await);

    let songs = client.songs().await.unwrap();
    assert_eq!(songs[0].title, "River");

    let song = client.song(5).await.unwrap();
    assert_eq!(song.id, 5);
    assert_eq!(song.title, "Case of You");
    assert_eq!(song.running_time, 260);

    let items = client.tracklist().await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title.as_deref(), Some("All I Want"));
    assert_eq!(items[1].song.as_ref().and_then(|s| s.title.as_deref()), Some("River"));

    let item = client.tracklist_item(9).await.unwrap();
    assert_eq!(item.position, Some(3));
  }

  #[tokio::test]
  async fn test_http_error_status() {
    let router = Router::new().route(
      "/api/albums/:id/",
      get(|| async { (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))) }),
    );
    let client = client(serve(router).await);

    let err = client.album(999).await.unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 404 }));
  }

  #[tokio::test]
  async fn test_decode_error() {
    let router = Router::new().route("/api/albums/", get(|| async { "<html>oops</html>" }));
    let client = client(serve(router).await);

    let err = client.albums().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
  }

  #[tokio::test]
  async fn test_network_error() {
    // Bind and immediately release a port so nothing is listening on it
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client(format!("http://{}/api", addr));
    let err = client.albums().await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
  }
}
