//! CLI command definitions, routing, and tracing setup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use sitekit_blocks::FormSubmission;
use sitekit_cms::{CmsClient, CmsOptions, DomainResolver};
use sitekit_core::{
    PageComposer, PageRequest, PageState, ProgressReporter, SiteContext, fetch_site_data,
    render_state,
};
use sitekit_shared::{AppConfig, BlockType, init_config, load_config, load_config_from};
use sitekit_storage::{DEV_DOMAIN_KEY, PreferenceStore, Storage};
use sitekit_theme::{DarkMode, PreferenceSource, StyleScope, apply, effective_variables};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// SiteKit: compose multi-tenant CMS sites into themed pages.
#[derive(Parser)]
#[command(
    name = "sitekit",
    version,
    about = "Resolve a tenant domain, fetch its CMS content, and render themed pages.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.sitekit/sitekit.toml.
    #[arg(long, env = "SITEKIT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Override `cms.base_url` from the config file.
    #[arg(long, env = "SITEKIT_CMS_URL", global = true)]
    pub cms_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// How the tenant for a command is chosen.
#[derive(clap::Args, Debug, Clone)]
pub(crate) struct Target {
    /// Tenant domain (skips host resolution).
    #[arg(long)]
    pub domain: Option<String>,

    /// Request host to resolve the tenant from (e.g. `localhost:5173`).
    #[arg(long)]
    pub host: Option<String>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Render a page to HTML.
    Render {
        #[command(flatten)]
        target: Target,

        /// Page slug.
        #[arg(short, long, default_value = "index")]
        slug: String,

        /// Force dark mode for this render.
        #[arg(long, conflicts_with = "light")]
        dark: bool,

        /// Force light mode for this render.
        #[arg(long)]
        light: bool,

        /// Write the document here instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print a tenant's site data as JSON.
    Site {
        #[command(flatten)]
        target: Target,
    },

    /// Print a tenant's theme as CSS custom properties.
    Theme {
        #[command(flatten)]
        target: Target,

        /// Use the dark-mode variable set.
        #[arg(long)]
        dark: bool,

        /// Print the effective variables as JSON instead of CSS.
        #[arg(long)]
        json: bool,
    },

    /// Inspect or change the stored dark-mode preference.
    DarkMode {
        #[command(subcommand)]
        action: DarkModeAction,
    },

    /// Inspect or change the tenant used for loopback hosts.
    DevDomain {
        #[command(subcommand)]
        action: DevDomainAction,
    },

    /// Submit values to a form block.
    SubmitForm {
        #[command(flatten)]
        target: Target,

        /// Slug of the page holding the form.
        #[arg(short, long, default_value = "index")]
        slug: String,

        /// Id of the form block.
        #[arg(long)]
        block: String,

        /// Field value as `name=value` (repeatable).
        #[arg(short, long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Dark-mode subcommands.
#[derive(Subcommand)]
pub(crate) enum DarkModeAction {
    /// Show the current mode and where it comes from.
    Get,
    /// Store an explicit choice.
    Set {
        #[arg(action = ArgAction::Set)]
        value: bool,
    },
    /// Flip the current mode.
    Toggle,
    /// Forget the stored choice and follow the system preference.
    Reset,
}

/// Dev-domain subcommands.
#[derive(Subcommand)]
pub(crate) enum DevDomainAction {
    /// Show the stored override.
    Get,
    /// Store an override.
    Set { domain: String },
    /// Remove the override.
    Clear,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

fn parse_field(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got '{raw}'")),
    }
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "sitekit=info",
        1 => "sitekit=debug",
        _ => "sitekit=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Shared runtime
// ---------------------------------------------------------------------------

/// Resolved config plus the handles most commands need.
struct Runtime {
    config: AppConfig,
    client: CmsClient,
    store: Storage,
}

impl Runtime {
    async fn open(cli: &CliSettings) -> Result<Self> {
        let config = cli.load_config()?;
        let client = CmsClient::new(&CmsOptions::from_config(&config)?)?;
        let store = open_store(&config).await?;
        Ok(Self {
            config,
            client,
            store,
        })
    }

    fn resolver(&self, target: &Target) -> DomainResolver {
        DomainResolver::new(target.host.clone(), self.config.cms.base_domain.clone())
    }

    fn latency(&self) -> Duration {
        Duration::from_millis(self.config.forms.simulated_latency_ms)
    }
}

/// Global flags that shape config loading.
struct CliSettings {
    config: Option<PathBuf>,
    cms_url: Option<String>,
}

impl CliSettings {
    fn load_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => load_config_from(path)?,
            None => load_config()?,
        };
        if let Some(url) = &self.cms_url {
            config.cms.base_url = url.clone();
            config.validate()?;
        }
        Ok(config)
    }
}

async fn open_store(config: &AppConfig) -> Result<Storage> {
    let path = config.database_path()?;
    Storage::open(&path)
        .await
        .wrap_err_with(|| format!("failed to open preference store at {}", path.display()))
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let settings = CliSettings {
        config: cli.config,
        cms_url: cli.cms_url,
    };

    match cli.command {
        Command::Render {
            target,
            slug,
            dark,
            light,
            out,
        } => {
            let force = match (dark, light) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            cmd_render(&settings, &target, &slug, force, out.as_deref()).await
        }
        Command::Site { target } => cmd_site(&settings, &target).await,
        Command::Theme { target, dark, json } => cmd_theme(&settings, &target, dark, json).await,
        Command::DarkMode { action } => cmd_dark_mode(&settings, action).await,
        Command::DevDomain { action } => cmd_dev_domain(&settings, action).await,
        Command::SubmitForm {
            target,
            slug,
            block,
            fields,
        } => cmd_submit_form(&settings, &target, &slug, &block, fields).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&settings).await,
        },
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
        }
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _state: &PageState) {
        self.finish();
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn compose(rt: &Runtime, target: &Target, slug: &str) -> PageState {
    let resolver = rt.resolver(target);
    let ctx = SiteContext::new(&rt.client, &resolver, &rt.store);
    let mut composer = PageComposer::new(ctx);

    let request = PageRequest::new(target.domain.clone(), slug);
    let reporter = CliProgress::new();
    composer.compose(&request, &reporter).await;
    composer.into_state()
}

async fn cmd_render(
    settings: &CliSettings,
    target: &Target,
    slug: &str,
    force_dark: Option<bool>,
    out: Option<&Path>,
) -> Result<()> {
    let rt = Runtime::open(settings).await?;

    let is_dark = match force_dark {
        Some(dark) => dark,
        None => DarkMode::load(&rt.store, rt.config.theme.system_prefers_dark)
            .await
            .is_dark(),
    };

    info!(domain = ?target.domain, host = ?target.host, slug, is_dark, "rendering page");
    let state = compose(&rt, target, slug).await;

    let mut scope = StyleScope::new(rt.config.theme.variable_prefix.clone());
    let rendered = render_state(&state, &mut scope, is_dark);
    let html = &rendered.html;

    match out {
        Some(path) => {
            std::fs::write(path, html).wrap_err_with(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {} ({} bytes)", path.display(), html.len());
        }
        None => print!("{html}"),
    }

    match state {
        PageState::Loaded(_) => {
            if rendered.fallbacks > 0 {
                warn!(
                    fallbacks = rendered.fallbacks,
                    blocks = rendered.blocks,
                    "some blocks rendered as placeholders"
                );
            }
            Ok(())
        }
        PageState::NotFound(domain) => Err(eyre!("no site registered for domain '{domain}'")),
        PageState::Errored(message) => Err(eyre!("page failed to load: {message}")),
        PageState::Idle | PageState::Loading(_) => Err(eyre!("page load did not settle")),
    }
}

async fn cmd_site(settings: &CliSettings, target: &Target) -> Result<()> {
    let rt = Runtime::open(settings).await?;
    let resolver = rt.resolver(target);
    let ctx = SiteContext::new(&rt.client, &resolver, &rt.store);

    let data = fetch_site_data(&ctx, target.domain.as_deref())
        .await?
        .ok_or_else(|| eyre!("no site registered for this domain"))?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

async fn cmd_theme(settings: &CliSettings, target: &Target, dark: bool, json: bool) -> Result<()> {
    let rt = Runtime::open(settings).await?;
    let resolver = rt.resolver(target);
    let ctx = SiteContext::new(&rt.client, &resolver, &rt.store);

    let data = fetch_site_data(&ctx, target.domain.as_deref())
        .await?
        .ok_or_else(|| eyre!("no site registered for this domain"))?;

    if json {
        let vars = effective_variables(&data.theme, dark);
        println!("{}", serde_json::to_string_pretty(&vars)?);
        return Ok(());
    }

    let mut scope = StyleScope::new(rt.config.theme.variable_prefix.clone());
    let applied = apply(&mut scope, &data.theme, dark);
    println!("/* {} ({}) */", data.theme.name, if dark { "dark" } else { "light" });
    println!("{}", applied.scope().to_css());
    Ok(())
}

async fn cmd_dark_mode(settings: &CliSettings, action: DarkModeAction) -> Result<()> {
    let config = settings.load_config()?;
    let store = open_store(&config).await?;
    let system = config.theme.system_prefers_dark;
    let mut mode = DarkMode::load(&store, system).await;

    match action {
        DarkModeAction::Get => {}
        DarkModeAction::Set { value } => mode.set(value).await?,
        DarkModeAction::Toggle => {
            mode.toggle().await?;
        }
        DarkModeAction::Reset => mode.reset(system).await?,
    }

    let source = match mode.source() {
        PreferenceSource::Stored => "stored",
        PreferenceSource::System => "system",
    };
    println!("{} ({source})", if mode.is_dark() { "dark" } else { "light" });
    Ok(())
}

async fn cmd_dev_domain(settings: &CliSettings, action: DevDomainAction) -> Result<()> {
    let config = settings.load_config()?;
    let store = open_store(&config).await?;

    match action {
        DevDomainAction::Get => match store.get(DEV_DOMAIN_KEY).await? {
            Some(domain) => println!("{domain}"),
            None => println!("(unset, loopback hosts use {})", config.cms.base_domain),
        },
        DevDomainAction::Set { domain } => {
            let domain = domain.trim().to_ascii_lowercase();
            if domain.is_empty() {
                return Err(eyre!("domain must not be empty"));
            }
            store.set(DEV_DOMAIN_KEY, &domain).await?;
            println!("Loopback hosts now resolve to {domain}");
        }
        DevDomainAction::Clear => {
            store.remove(DEV_DOMAIN_KEY).await?;
            println!("Dev domain cleared");
        }
    }
    Ok(())
}

async fn cmd_submit_form(
    settings: &CliSettings,
    target: &Target,
    slug: &str,
    block_id: &str,
    fields: Vec<(String, String)>,
) -> Result<()> {
    let rt = Runtime::open(settings).await?;

    let page = match compose(&rt, target, slug).await {
        PageState::Loaded(page) => page,
        PageState::NotFound(domain) => return Err(eyre!("no site registered for domain '{domain}'")),
        PageState::Errored(message) => return Err(eyre!("page failed to load: {message}")),
        PageState::Idle | PageState::Loading(_) => return Err(eyre!("page load did not settle")),
    };

    let block = page
        .blocks
        .iter()
        .find(|b| b.id == block_id)
        .ok_or_else(|| eyre!("page '{slug}' has no block '{block_id}'"))?;
    if block.block_type != BlockType::Form {
        return Err(eyre!("block '{block_id}' is a {} block, not a form", block.block_type));
    }

    let form = FormSubmission::from_props(&block.props, rt.latency())?;
    let values: BTreeMap<String, String> = fields.into_iter().collect();

    let progress = CliProgress::new();
    progress.phase("Submitting");
    let result = form.submit(&values).await;
    progress.finish();

    let receipt = result?;
    println!("{}", serde_json::to_string_pretty(&receipt)?);
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(settings: &CliSettings) -> Result<()> {
    let config = settings.load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");

    // Only report preferences that exist; showing config never creates the store.
    let db_path = config.database_path()?;
    if db_path.exists() {
        let prefs = open_store(&config).await?.list().await?;
        if !prefs.is_empty() {
            println!("# Stored preferences ({})", db_path.display());
            for (key, value) in prefs {
                println!("# {key} = {value}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_pairs_parse() {
        assert_eq!(parse_field("email=a@b.org").unwrap(), ("email".into(), "a@b.org".into()));
        assert_eq!(parse_field("note=a=b").unwrap(), ("note".into(), "a=b".into()));
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=x").is_err());
    }

    #[test]
    fn cli_parses_render_flags() {
        let cli = Cli::try_parse_from([
            "sitekit", "-vv", "render", "--domain", "verify.uans.us", "--slug", "about", "--dark",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Render { target, slug, dark, light, .. } => {
                assert_eq!(target.domain.as_deref(), Some("verify.uans.us"));
                assert_eq!(slug, "about");
                assert!(dark && !light);
            }
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn dark_and_light_conflict() {
        assert!(Cli::try_parse_from(["sitekit", "render", "--dark", "--light"]).is_err());
    }

    #[test]
    fn submit_form_collects_fields() {
        let cli = Cli::try_parse_from([
            "sitekit", "submit-form", "--block", "f1", "--field", "name=Ada", "-f", "email=a@b.org",
        ])
        .unwrap();
        match cli.command {
            Command::SubmitForm { block, fields, slug, .. } => {
                assert_eq!(block, "f1");
                assert_eq!(slug, "index");
                assert_eq!(fields.len(), 2);
            }
            _ => panic!("expected submit-form"),
        }
    }

    #[test]
    fn dark_mode_set_takes_bool() {
        let cli = Cli::try_parse_from(["sitekit", "dark-mode", "set", "true"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::DarkMode { action: DarkModeAction::Set { value: true } }
        ));
    }
}
