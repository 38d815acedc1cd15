//! Typed read-only gateway over the CMS REST surface, plus tenant domain
//! resolution.
//!
//! Every CMS response is wrapped in a `{ data, meta? }` envelope. The gateway
//! unwraps it and absorbs transport failures: an unreachable CMS, a timeout,
//! or a non-success status all come back as an absent or empty result, so a
//! partially-down CMS degrades a page to "not found" instead of failing the
//! pipeline. Only a 2xx body that cannot be decoded is reported as an error.

mod domain;

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use sitekit_shared::{
    AppConfig, Block, Envelope, NavigationItem, Page, Result, Site, SiteKitError, Theme,
    resolve_token,
};
use tracing::{debug, instrument, warn};
use url::Url;

pub use domain::{DomainKey, DomainResolver};

/// Default timeout in seconds for CMS requests.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// User-Agent string for CMS requests.
const USER_AGENT: &str = concat!("SiteKit/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for the CMS client.
#[derive(Debug, Clone)]
pub struct CmsOptions {
    /// Base URL of the CMS (items live under `<base>/items/...`).
    pub base_url: Url,
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
    /// Opaque API token, sent as a bearer header when present.
    pub token: Option<String>,
}

impl CmsOptions {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            token: None,
        }
    }

    /// Build options from the `[cms]` config section and the token env var.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let base_url = Url::parse(&config.cms.base_url).map_err(|e| {
            SiteKitError::config(format!("invalid cms.base_url '{}': {e}", config.cms.base_url))
        })?;
        Ok(Self {
            base_url,
            timeout_secs: config.cms.timeout_secs,
            token: resolve_token(config),
        })
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Read-only CMS accessor. Cheap to clone (the HTTP pool is shared).
#[derive(Debug, Clone)]
pub struct CmsClient {
    client: Client,
    base_url: Url,
}

impl CmsClient {
    pub fn new(opts: &CmsOptions) -> Result<Self> {
        let client = build_client(opts)?;
        Ok(Self {
            client,
            base_url: opts.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch the enabled site registered for `domain`, with its theme and logo expanded.
    #[instrument(skip(self))]
    pub async fn site_by_domain(&self, domain: &str) -> Result<Option<Site>> {
        let url = self.endpoint(
            &["items", "sites"],
            &[
                ("filter[domain][_eq]", domain),
                ("filter[enabled][_eq]", "true"),
                ("fields", "*,theme.*,logo.*"),
            ],
        )?;
        let sites: Vec<Site> = self.fetch_list(url).await?;
        Ok(sites.into_iter().next())
    }

    /// Fetch a theme by id.
    #[instrument(skip(self))]
    pub async fn theme(&self, id: &str) -> Result<Option<Theme>> {
        let url = self.endpoint(&["items", "themes", id], &[("fields", "*")])?;
        self.fetch_data(url).await
    }

    /// Fetch all published pages of a site, sorted by slug.
    #[instrument(skip(self))]
    pub async fn site_pages(&self, site_id: &str) -> Result<Vec<Page>> {
        let url = self.endpoint(
            &["items", "pages"],
            &[
                ("filter[site][_eq]", site_id),
                ("filter[published][_eq]", "true"),
                ("fields", "*,blocks.*"),
                ("sort", "slug"),
            ],
        )?;
        self.fetch_list(url).await
    }

    /// Fetch the published page of a site with the given slug.
    #[instrument(skip(self))]
    pub async fn page(&self, site_id: &str, slug: &str) -> Result<Option<Page>> {
        let url = self.endpoint(
            &["items", "pages"],
            &[
                ("filter[site][_eq]", site_id),
                ("filter[slug][_eq]", slug),
                ("filter[published][_eq]", "true"),
                ("fields", "*,blocks.*"),
            ],
        )?;
        let pages: Vec<Page> = self.fetch_list(url).await?;
        Ok(pages.into_iter().next())
    }

    /// Fetch a site's navigation items, sorted by their `sort` key.
    #[instrument(skip(self))]
    pub async fn navigation(&self, site_id: &str) -> Result<Vec<NavigationItem>> {
        let url = self.endpoint(
            &["items", "navigation"],
            &[
                ("filter[site][_eq]", site_id),
                ("sort", "sort"),
                ("fields", "*"),
            ],
        )?;
        self.fetch_list(url).await
    }

    /// Fetch the blocks attached to a page, sorted by `order` at the source.
    #[instrument(skip(self))]
    pub async fn blocks(&self, page_id: &str) -> Result<Vec<Block>> {
        let url = self.endpoint(
            &["items", "blocks"],
            &[
                ("filter[page][_eq]", page_id),
                ("sort", "order"),
                ("fields", "*"),
            ],
        )?;
        self.fetch_list(url).await
    }

    /// Public URL of an uploaded file.
    pub fn file_url(&self, file_id: &str) -> String {
        match self.endpoint(&["assets", file_id], &[]) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}/assets/{file_id}", self.base_url.as_str().trim_end_matches('/')),
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Append path segments and query pairs to the base URL.
    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                SiteKitError::config(format!("CMS base URL cannot be a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn fetch_list<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>> {
        Ok(self.fetch_data::<Vec<T>>(url).await?.unwrap_or_default())
    }

    /// GET `url` and unwrap the envelope's `data`.
    ///
    /// Transport failures and non-success statuses yield `Ok(None)`.
    async fn fetch_data<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(%url, error = %e, "CMS request failed");
                return Ok(None);
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "CMS returned non-success status");
            return Ok(None);
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                warn!(%url, error = %e, "failed to read CMS response body");
                return Ok(None);
            }
        };

        let envelope: Envelope<Option<T>> = serde_json::from_slice(&body)
            .map_err(|e| SiteKitError::parse(format!("{url}: malformed CMS response: {e}")))?;

        debug!(%url, bytes = body.len(), "CMS response decoded");
        Ok(envelope.data)
    }
}

/// Build a reqwest client with appropriate settings.
fn build_client(opts: &CmsOptions) -> Result<Client> {
    let mut headers = HeaderMap::new();
    if let Some(token) = &opts.token {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| SiteKitError::config(format!("invalid CMS token: {e}")))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(Duration::from_secs(opts.timeout_secs))
        .build()
        .map_err(|e| SiteKitError::Network(format!("failed to build HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sitekit_shared::{BlockType, ThemeRef};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> CmsClient {
        let opts = CmsOptions::new(Url::parse(&server.uri()).unwrap());
        CmsClient::new(&opts).unwrap()
    }

    #[test]
    fn endpoint_encodes_filters() {
        let opts = CmsOptions::new(Url::parse("https://cms.example.com/api/").unwrap());
        let client = CmsClient::new(&opts).unwrap();
        let url = client
            .endpoint(&["items", "sites"], &[("filter[domain][_eq]", "a b.example")])
            .unwrap();

        assert_eq!(url.path(), "/api/items/sites");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![("filter[domain][_eq]".to_string(), "a b.example".to_string())]
        );
    }

    #[test]
    fn file_url_points_at_assets() {
        let opts = CmsOptions::new(Url::parse("https://cms.example.com").unwrap());
        let client = CmsClient::new(&opts).unwrap();
        assert_eq!(client.file_url("abc-123"), "https://cms.example.com/assets/abc-123");
    }

    #[tokio::test]
    async fn site_by_domain_returns_first_match() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/items/sites"))
            .and(query_param("filter[domain][_eq]", "verify.uans.us"))
            .and(query_param("filter[enabled][_eq]", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{
                    "id": "s1",
                    "domain": "verify.uans.us",
                    "name": "Verify",
                    "enabled": true,
                    "theme": "t9"
                }]
            })))
            .mount(&server)
            .await;

        let site = client_for(&server)
            .site_by_domain("verify.uans.us")
            .await
            .unwrap()
            .expect("site found");
        assert_eq!(site.name, "Verify");
        assert_eq!(site.theme, Some(ThemeRef::Id("t9".into())));
    }

    #[tokio::test]
    async fn empty_match_set_is_absent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/items/sites"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;

        let site = client_for(&server).site_by_domain("ghost.example").await.unwrap();
        assert!(site.is_none());
    }

    #[tokio::test]
    async fn non_success_status_is_absent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.theme("t1").await.unwrap().is_none());
        assert!(client.site_pages("s1").await.unwrap().is_empty());
        assert!(client.navigation("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_cms_is_absent() {
        // Nothing listens on port 1.
        let opts = CmsOptions::new(Url::parse("http://127.0.0.1:1").unwrap());
        let client = CmsClient::new(&opts).unwrap();

        assert!(client.site_by_domain("uans.us").await.unwrap().is_none());
        assert!(client.blocks("p1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/items/themes/t1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).theme("t1").await.unwrap_err();
        assert!(matches!(err, SiteKitError::Parse { .. }));
    }

    #[tokio::test]
    async fn null_data_is_absent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/items/themes/missing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": null })))
            .mount(&server)
            .await;

        assert!(client_for(&server).theme("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn blocks_request_is_sorted_by_order() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/items/blocks"))
            .and(query_param("filter[page][_eq]", "p1"))
            .and(query_param("sort", "order"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "id": "b1", "name": "Top", "type": "hero", "props": { "title": "Hi" }, "order": 1 },
                    { "id": "b2", "name": "Later", "type": "brand_new", "props": {}, "order": 2 }
                ],
                "meta": { "filter_count": 2 }
            })))
            .mount(&server)
            .await;

        let blocks = client_for(&server).blocks("p1").await.unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].block_type, BlockType::Hero);
        assert_eq!(blocks[1].block_type, BlockType::Unknown("brand_new".into()));
    }

    #[tokio::test]
    async fn token_is_sent_as_bearer() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/items/navigation"))
            .and(header("authorization", "Bearer secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": 1, "label": "Home", "href": "/", "sort": 1 }]
            })))
            .mount(&server)
            .await;

        let mut opts = CmsOptions::new(Url::parse(&server.uri()).unwrap());
        opts.token = Some("secret-token".into());
        let client = CmsClient::new(&opts).unwrap();

        let nav = client.navigation("s1").await.unwrap();
        assert_eq!(nav.len(), 1);
        assert_eq!(nav[0].label, "Home");
    }

    #[tokio::test]
    async fn page_filters_by_site_and_slug() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/items/pages"))
            .and(query_param("filter[site][_eq]", "s1"))
            .and(query_param("filter[slug][_eq]", "about"))
            .and(query_param("filter[published][_eq]", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": "p2", "site": "s1", "slug": "about", "published": true, "blocks": [] }]
            })))
            .mount(&server)
            .await;

        let page = client_for(&server).page("s1", "about").await.unwrap();
        assert_eq!(page.map(|p| p.id), Some("p2".to_string()));
    }
}
