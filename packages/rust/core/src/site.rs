//! Site data aggregation: domain → one complete tenant snapshot.

use sitekit_cms::{CmsClient, DomainKey, DomainResolver};
use sitekit_shared::{Result, Site, SiteData, Theme, ThemeRef};
use sitekit_storage::PreferenceStore;
use sitekit_theme::{default_theme, missing_required_keys};
use tracing::{debug, info, instrument, warn};

/// Everything needed to turn a domain into site data.
#[derive(Debug)]
pub struct SiteContext<'a, S: PreferenceStore> {
    pub client: &'a CmsClient,
    pub resolver: &'a DomainResolver,
    pub store: &'a S,
}

// Manual impls: the derives would require `S: Clone`.
impl<S: PreferenceStore> Clone for SiteContext<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: PreferenceStore> Copy for SiteContext<'_, S> {}

impl<'a, S: PreferenceStore> SiteContext<'a, S> {
    pub fn new(client: &'a CmsClient, resolver: &'a DomainResolver, store: &'a S) -> Self {
        Self {
            client,
            resolver,
            store,
        }
    }

    /// The tenant key for a request. An explicit override wins over the
    /// resolver.
    pub async fn domain(&self, domain_override: Option<&str>) -> DomainKey {
        match domain_override.map(str::trim).filter(|d| !d.is_empty()) {
            Some(domain) => DomainKey::new(domain.to_ascii_lowercase()),
            None => self.resolver.resolve(self.store).await,
        }
    }
}

/// Fetch the snapshot for the effective domain.
///
/// `Ok(None)` means no enabled site is registered for the domain.
pub async fn fetch_site_data<S: PreferenceStore>(
    ctx: &SiteContext<'_, S>,
    domain_override: Option<&str>,
) -> Result<Option<SiteData>> {
    let domain = ctx.domain(domain_override).await;
    fetch_site_data_for(ctx.client, &domain).await
}

/// Fetch the snapshot for an already-resolved domain.
#[instrument(skip_all, fields(domain = %domain))]
pub async fn fetch_site_data_for(client: &CmsClient, domain: &DomainKey) -> Result<Option<SiteData>> {
    let Some(site) = client.site_by_domain(domain.as_str()).await? else {
        info!("no site registered for domain");
        return Ok(None);
    };

    let theme = resolve_theme(client, &site).await;

    let (pages, navigation) = tokio::join!(
        client.site_pages(&site.id),
        client.navigation(&site.id)
    );
    // The requested page is fetched on its own; a bad listing only empties `pages`.
    let pages = pages.unwrap_or_else(|e| {
        warn!(site = %site.id, error = %e, "page listing unreadable, continuing without it");
        Vec::new()
    });
    let mut navigation = navigation?;
    navigation.sort_by_key(|item| item.sort);

    debug!(
        site = %site.id,
        theme = %theme.id,
        pages = pages.len(),
        navigation = navigation.len(),
        "site data assembled"
    );

    Ok(Some(SiteData {
        site,
        theme,
        pages,
        navigation,
    }))
}

/// The site's theme, or the default theme when it has none or the
/// reference can't be loaded.
async fn resolve_theme(client: &CmsClient, site: &Site) -> Theme {
    let theme = match &site.theme {
        Some(ThemeRef::Embedded(theme)) => theme.as_ref().clone(),
        Some(ThemeRef::Id(id)) => match client.theme(id).await {
            Ok(Some(theme)) => theme,
            Ok(None) => {
                warn!(site = %site.id, theme = %id, "theme not found, using default theme");
                return default_theme();
            }
            Err(e) => {
                warn!(site = %site.id, theme = %id, error = %e, "theme unreadable, using default theme");
                return default_theme();
            }
        },
        None => return default_theme(),
    };

    let missing = missing_required_keys(&theme);
    if !missing.is_empty() {
        warn!(site = %site.id, theme = %theme.id, ?missing, "theme lacks required variables");
    }
    theme
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sitekit_cms::CmsOptions;
    use sitekit_storage::{DEV_DOMAIN_KEY, MemoryStore};
    use url::Url;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> CmsClient {
        CmsClient::new(&CmsOptions::new(Url::parse(&server.uri()).unwrap())).unwrap()
    }

    async fn mount_json(server: &MockServer, at: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn mount_site(server: &MockServer, site: serde_json::Value) {
        mount_json(server, "/items/sites", json!({ "data": [site] })).await;
        mount_json(server, "/items/pages", json!({ "data": [] })).await;
        mount_json(
            server,
            "/items/navigation",
            json!({ "data": [
                { "id": 2, "label": "About", "href": "/about", "sort": 2 },
                { "id": 1, "label": "Home", "href": "/", "sort": 1 }
            ] }),
        )
        .await;
    }

    #[tokio::test]
    async fn unknown_domain_is_none() {
        let server = MockServer::start().await;
        mount_json(&server, "/items/sites", json!({ "data": [] })).await;

        let client = client_for(&server);
        let resolver = DomainResolver::new(None, "uans.us");
        let store = MemoryStore::new();
        let ctx = SiteContext::new(&client, &resolver, &store);

        let data = fetch_site_data(&ctx, Some("ghost.example")).await.unwrap();
        assert!(data.is_none());
    }

    #[tokio::test]
    async fn site_without_theme_gets_default() {
        let server = MockServer::start().await;
        mount_site(&server, json!({ "id": "s1", "domain": "uans.us", "name": "UAN", "enabled": true })).await;

        let client = client_for(&server);
        let data = fetch_site_data_for(&client, &DomainKey::new("uans.us"))
            .await
            .unwrap()
            .expect("site");

        assert_eq!(data.theme, default_theme());
        let labels: Vec<_> = data.navigation.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["Home", "About"]);
    }

    #[tokio::test]
    async fn unreadable_theme_reference_falls_back() {
        let server = MockServer::start().await;
        mount_site(
            &server,
            json!({ "id": "s1", "domain": "uans.us", "name": "UAN", "enabled": true, "theme": "t1" }),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/items/themes/t1"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let data = fetch_site_data_for(&client, &DomainKey::new("uans.us"))
            .await
            .unwrap()
            .expect("site");
        assert_eq!(data.theme, default_theme());
    }

    #[tokio::test]
    async fn referenced_theme_is_fetched() {
        let server = MockServer::start().await;
        mount_site(
            &server,
            json!({ "id": "s1", "domain": "uans.us", "name": "UAN", "enabled": true, "theme": 7 }),
        )
        .await;
        mount_json(
            &server,
            "/items/themes/7",
            json!({ "data": { "id": 7, "name": "Earth", "css_vars": { "primary": "#332211" } } }),
        )
        .await;

        let client = client_for(&server);
        let data = fetch_site_data_for(&client, &DomainKey::new("uans.us"))
            .await
            .unwrap()
            .expect("site");
        assert_eq!(data.theme.name, "Earth");
        assert_eq!(data.theme.css_vars.get("primary").map(String::as_str), Some("#332211"));
    }

    #[tokio::test]
    async fn loopback_host_uses_dev_domain() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items/sites"))
            .and(query_param("filter[domain][_eq]", "verify.uans.us"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let resolver = DomainResolver::new(Some("localhost:5173".into()), "uans.us");
        let store = MemoryStore::new();
        store.set(DEV_DOMAIN_KEY, "verify.uans.us").await.unwrap();
        let ctx = SiteContext::new(&client, &resolver, &store);

        assert_eq!(ctx.domain(None).await.as_str(), "verify.uans.us");
        assert!(fetch_site_data(&ctx, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unreadable_page_listing_is_skipped() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            "/items/sites",
            json!({ "data": [{ "id": "s1", "domain": "uans.us", "name": "UAN", "enabled": true }] }),
        )
        .await;
        mount_json(&server, "/items/pages", json!({ "data": [{ "id": "p1" }] })).await;
        mount_json(&server, "/items/navigation", json!({ "data": [] })).await;

        let client = client_for(&server);
        let data = fetch_site_data_for(&client, &DomainKey::new("uans.us"))
            .await
            .unwrap()
            .expect("site data");
        assert!(data.pages.is_empty());
        assert_eq!(data.site.id, "s1");
    }

    #[tokio::test]
    async fn malformed_listing_is_an_error() {
        let server = MockServer::start().await;
        mount_json(&server, "/items/sites", json!({ "data": "not a list" })).await;

        let client = client_for(&server);
        assert!(fetch_site_data_for(&client, &DomainKey::new("uans.us")).await.is_err());
    }
}
