//! Random cat image search

use reqwest::Url;

use crate::{
    cancel::CancelToken,
    catalog::BreedRecord,
    http::{ApiHttpClient, FetchError},
};

/// Search endpoint, relative to the API base URL
const SEARCH_ENDPOINT: &str = "images/search";

/// A search result
#[derive(Debug, Clone, Eq, PartialEq, serde::Deserialize)]
pub struct CatRecord {
    /// Image identifier
    pub id: String,
    /// Image URL
    #[serde(rename = "url")]
    pub image_url: String,
    /// Breeds of the cat in the picture
    pub breeds: Vec<BreedRecord>,
}

/// Error when picking an image from search results
#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    /// Search returned nothing
    #[error("Search returned no cat")]
    Empty,
}

/// Build search URL, for a full size JPEG image, optionally restricted to a breed
#[must_use]
pub fn build_search_url(base: &Url, breed_filter: Option<&str>) -> Url {
    #[expect(clippy::unwrap_used)] // base URL is absolute
    let mut url = base.join(SEARCH_ENDPOINT).unwrap();
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("size", "full")
            .append_pair("mime_types", "jpg");
        if let Some(breed) = breed_filter.filter(|b| !b.is_empty()) {
            query.append_pair("breed_ids", breed);
        }
    }
    url
}

/// Fetch search results
pub async fn search_cats(
    http: &ApiHttpClient,
    breed_filter: Option<&str>,
    cancel: &CancelToken,
) -> Result<Vec<CatRecord>, FetchError> {
    let url = build_search_url(http.base_url(), breed_filter);
    log::debug!("Fetching cat data from {url}");
    let cats: Vec<CatRecord> = http.get_json(url, cancel).await?;
    log::debug!("Got {} search result(s)", cats.len());
    Ok(cats)
}

/// Get image URL of first search result
pub fn resolve_image_url(results: &[CatRecord]) -> Result<&str, ResolveError> {
    let cat = results.first().ok_or(ResolveError::Empty)?;
    log::debug!("Got cat {} image URL: {}", cat.id, cat.image_url);
    Ok(&cat.image_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::tests::{Reply, TestServer};

    const BASE_URL: &str = "https://api.thecatapi.com/v1/";

    #[test]
    fn search_url_unfiltered() {
        let base = Url::parse(BASE_URL).unwrap();
        let url = build_search_url(&base, None);
        assert_eq!(
            url.as_str(),
            "https://api.thecatapi.com/v1/images/search?size=full&mime_types=jpg"
        );
        assert!(!url.as_str().contains("breed_ids"));
        assert_eq!(build_search_url(&base, Some("")), url);
    }

    #[test]
    fn search_url_filtered() {
        let base = Url::parse(BASE_URL).unwrap();
        let url = build_search_url(&base, Some("beng"));
        assert!(url.as_str().contains("size=full&mime_types=jpg"));
        assert!(url.as_str().contains("breed_ids=beng"));
        assert_eq!(url, build_search_url(&base, Some("beng")));
    }

    #[test]
    fn search_url_encoding() {
        let base = Url::parse(BASE_URL).unwrap();
        let url = build_search_url(&base, Some("a b&c"));
        let breed_ids = url
            .query_pairs()
            .find(|(k, _)| k == "breed_ids")
            .map(|(_, v)| v.into_owned());
        assert_eq!(breed_ids.as_deref(), Some("a b&c"));
    }

    #[test]
    fn resolve_first() {
        let cats: Vec<CatRecord> = serde_json::from_str(
            r#"[{"id":"aqt","url":"https://cdn.example/aqt.jpg","breeds":[]}]"#,
        )
        .unwrap();
        assert_eq!(
            resolve_image_url(&cats).unwrap(),
            "https://cdn.example/aqt.jpg"
        );

        let cats: Vec<CatRecord> = serde_json::from_str(
            r#"[
                {"breeds":[{"id":"beng","name":"Bengal"}],"id":"1","url":"https://cdn.example/1.jpg","width":749,"height":677},
                {"breeds":[],"id":"2","url":"https://cdn.example/2.jpg"}
            ]"#,
        )
        .unwrap();
        assert_eq!(cats[0].breeds[0].id, "beng");
        assert_eq!(resolve_image_url(&cats).unwrap(), "https://cdn.example/1.jpg");
    }

    #[test]
    fn resolve_empty() {
        assert!(matches!(resolve_image_url(&[]), Err(ResolveError::Empty)));
    }

    #[tokio::test]
    async fn search() {
        let server = TestServer::start([(
            "/v1/images/search",
            Reply::json(
                r#"[{"id":"xyz","url":"https://cdn.example/xyz.jpg","breeds":[{"id":"beng","name":"Bengal"}]}]"#,
            ),
        )])
        .await;
        let cats = search_cats(&server.client(), Some("beng"), &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(cats.len(), 1);
        assert_eq!(cats[0].image_url, "https://cdn.example/xyz.jpg");

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].query.as_deref(),
            Some("size=full&mime_types=jpg&breed_ids=beng")
        );
    }

    #[tokio::test]
    async fn search_decode_error() {
        let server = TestServer::start([(
            "/v1/images/search",
            Reply::json(r#"[{"id":"xyz","breeds":[]}]"#),
        )])
        .await;
        assert!(matches!(
            search_cats(&server.client(), None, &CancelToken::new()).await,
            Err(FetchError::Decode { .. })
        ));
    }
}
