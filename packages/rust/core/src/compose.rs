//! Page composition: one `(domain, slug)` request → page state.
//!
//! Every request enters `Loading` and ends in exactly one of `Loaded`,
//! `NotFound` or `Errored`. Requests are stamped with a [`Generation`]; only
//! the newest one may commit, so a slow response to an older request never
//! overwrites a newer page.

use std::collections::HashSet;
use std::time::Instant;

use serde::Serialize;
use sitekit_cms::{CmsClient, DomainKey};
use sitekit_shared::{Block, BlockRef, Page, Result, Site, SiteData};
use sitekit_storage::PreferenceStore;
use tracing::{debug, info, instrument, warn};

use crate::site::{SiteContext, fetch_site_data_for};

/// Slug of a site's root route.
pub const INDEX_SLUG: &str = "index";

const GENERIC_ERROR: &str = "Failed to load page";

// ---------------------------------------------------------------------------
// Requests and results
// ---------------------------------------------------------------------------

/// What to compose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    /// Explicit tenant domain; `None` lets the resolver decide.
    pub domain: Option<String>,
    pub slug: String,
}

impl PageRequest {
    /// An empty slug means the index page.
    pub fn new(domain: Option<String>, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        let slug = match slug.trim().trim_matches('/') {
            "" => INDEX_SLUG.to_string(),
            s => s.to_string(),
        };
        Self { domain, slug }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, INDEX_SLUG)
    }
}

/// Token identifying one composition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Generation(u64);

/// Title and description for the document head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
}

impl PageMetadata {
    pub fn new(site: &Site, page: Option<&Page>) -> Self {
        let site_name = site.name.as_str();
        let lead = page
            .and_then(|p| p.seo_title.as_deref().filter(|t| !t.is_empty()))
            .or_else(|| page.map(|p| p.slug.as_str()).filter(|s| !s.is_empty()))
            .unwrap_or(site_name);
        let description = page
            .and_then(|p| p.seo_description.as_deref().filter(|d| !d.is_empty()))
            .map(str::to_string)
            .unwrap_or_else(|| format!("{site_name} - Sovereign Identity"));

        Self {
            title: format!("{lead} | {site_name}"),
            description,
        }
    }
}

/// A successfully composed page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedPage {
    pub site_data: SiteData,
    /// `None` when the site has no published page for the slug.
    pub page: Option<Page>,
    /// Unordered; rendering sorts them.
    pub blocks: Vec<Block>,
    pub metadata: PageMetadata,
    pub logo_url: Option<String>,
}

/// Result of one load, before it is committed.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(Box<LoadedPage>),
    NotFound(DomainKey),
    Errored(String),
}

/// Lifecycle state of the composer.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PageState {
    #[default]
    Idle,
    Loading(PageRequest),
    Loaded(Box<LoadedPage>),
    NotFound(DomainKey),
    Errored(String),
}

impl From<LoadOutcome> for PageState {
    fn from(outcome: LoadOutcome) -> Self {
        match outcome {
            LoadOutcome::Loaded(page) => Self::Loaded(page),
            LoadOutcome::NotFound(domain) => Self::NotFound(domain),
            LoadOutcome::Errored(message) => Self::Errored(message),
        }
    }
}

impl PageState {
    /// Short state name for logs and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading(_) => "loading",
            Self::Loaded(_) => "loaded",
            Self::NotFound(_) => "not_found",
            Self::Errored(_) => "errored",
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Loaded(_) | Self::NotFound(_) | Self::Errored(_))
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting composition status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once the state is committed.
    fn done(&self, state: &PageState);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _state: &PageState) {}
}

// ---------------------------------------------------------------------------
// Composer
// ---------------------------------------------------------------------------

/// Drives requests through the page state machine.
pub struct PageComposer<'a, S: PreferenceStore> {
    ctx: SiteContext<'a, S>,
    state: PageState,
    latest: Generation,
}

impl<'a, S: PreferenceStore> PageComposer<'a, S> {
    pub fn new(ctx: SiteContext<'a, S>) -> Self {
        Self {
            ctx,
            state: PageState::Idle,
            latest: Generation(0),
        }
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn into_state(self) -> PageState {
        self.state
    }

    /// Generation of the newest request.
    pub fn latest(&self) -> Generation {
        self.latest
    }

    /// Start a request: enter `Loading` and supersede any in-flight one.
    pub fn begin(&mut self, request: &PageRequest) -> Generation {
        self.latest = Generation(self.latest.0 + 1);
        self.state = PageState::Loading(request.clone());
        debug!(generation = self.latest.0, slug = %request.slug, "composition started");
        self.latest
    }

    /// Fetch everything the request needs. Never fails; errors become
    /// [`LoadOutcome::Errored`].
    #[instrument(skip_all, fields(domain = ?request.domain, slug = %request.slug))]
    pub async fn load(&self, request: &PageRequest, progress: &dyn ProgressReporter) -> LoadOutcome {
        let start = Instant::now();
        let outcome = match self.try_load(request, progress).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "page composition failed");
                let message = e.to_string();
                LoadOutcome::Errored(if message.trim().is_empty() {
                    GENERIC_ERROR.to_string()
                } else {
                    message
                })
            }
        };
        info!(elapsed_ms = start.elapsed().as_millis() as u64, "page load finished");
        outcome
    }

    /// Apply an outcome if `generation` is still the newest request.
    ///
    /// Returns `false` (and leaves the state untouched) for stale outcomes.
    pub fn commit(&mut self, generation: Generation, outcome: LoadOutcome) -> bool {
        if generation != self.latest {
            debug!(
                generation = generation.0,
                latest = self.latest.0,
                "discarding stale composition result"
            );
            return false;
        }
        self.state = outcome.into();
        debug!(state = self.state.label(), "composition committed");
        true
    }

    /// Begin, load and commit one request.
    pub async fn compose(&mut self, request: &PageRequest, progress: &dyn ProgressReporter) -> &PageState {
        let generation = self.begin(request);
        let outcome = self.load(request, progress).await;
        self.commit(generation, outcome);
        progress.done(&self.state);
        &self.state
    }

    async fn try_load(&self, request: &PageRequest, progress: &dyn ProgressReporter) -> Result<LoadOutcome> {
        progress.phase("Resolving domain");
        let domain = self.ctx.domain(request.domain.as_deref()).await;

        progress.phase("Fetching site");
        let Some(site_data) = fetch_site_data_for(self.ctx.client, &domain).await? else {
            return Ok(LoadOutcome::NotFound(domain));
        };

        progress.phase("Fetching page");
        let page = self.ctx.client.page(&site_data.site.id, &request.slug).await?;
        let blocks = match &page {
            Some(page) => resolve_blocks(self.ctx.client, page).await?,
            None => {
                info!(site = %site_data.site.id, slug = %request.slug, "no published page for slug");
                Vec::new()
            }
        };

        let metadata = PageMetadata::new(&site_data.site, page.as_ref());
        let logo_url = site_data
            .site
            .logo
            .as_ref()
            .map(|logo| self.ctx.client.file_url(logo.id()));

        Ok(LoadOutcome::Loaded(Box::new(LoadedPage {
            site_data,
            page,
            blocks,
            metadata,
            logo_url,
        })))
    }
}

/// A page's blocks: embedded records as-is, bare ids fetched by page.
pub async fn resolve_blocks(client: &CmsClient, page: &Page) -> Result<Vec<Block>> {
    let mut blocks = page.embedded_blocks();
    if !page.has_block_references() {
        return Ok(blocks);
    }

    let wanted: HashSet<&str> = page
        .blocks
        .iter()
        .filter_map(|b| match b {
            BlockRef::Id(id) => Some(id.as_str()),
            BlockRef::Embedded(_) | BlockRef::Malformed(_) => None,
        })
        .collect();

    let fetched = client.blocks(&page.id).await?;
    let before = blocks.len();
    blocks.extend(fetched.into_iter().filter(|b| wanted.contains(b.id.as_str())));

    let found = blocks.len() - before;
    if found < wanted.len() {
        warn!(page = %page.id, wanted = wanted.len(), found, "some referenced blocks are missing");
    }
    Ok(blocks)
}
