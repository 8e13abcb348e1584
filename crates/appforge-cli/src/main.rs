//! AppForge - Generate self-contained HTML apps from a prompt
//!
//! A command-line app builder with:
//! - Prompt-driven generation against any configured provider
//! - Bundled starter templates that work fully offline
//! - A local gallery of saved projects
//! - Quota-gated exports: standalone HTML, PWA bundle, app package

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use appforge_core::ai::{
    AppGenerator, CredentialStore, GenClient, GenClientConfig, GenerationSource, ProviderId,
    TEMPLATES,
};
use appforge_core::export::{DenyReason, ExportOutcome, ExportService};
use appforge_core::paths;
use appforge_core::storage::{
    achievement_by_id, export_quota, AchievementEngine, BillingCycle, Database, ExportHistory,
    ExportKind, KvStore, LicenseManager, ProjectStore, QuotaLimit, Tier, UsageTracker,
    ACHIEVEMENTS,
};

/// AppForge - prompt in, app out
#[derive(Parser)]
#[command(name = "appforge")]
#[command(about = "Generate self-contained HTML apps from a prompt", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an app and save it to the gallery
    Generate {
        /// What to build
        prompt: String,

        /// Project name (defaults to the prompt)
        #[arg(short, long)]
        name: Option<String>,

        /// Use a bundled template instead of a provider
        #[arg(short, long)]
        template: Option<String>,

        /// Provider to generate with (anthropic, openai, openrouter)
        #[arg(short, long)]
        provider: Option<String>,

        /// Model ID override
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List bundled templates
    Templates,

    /// Manage saved projects
    Projects {
        #[command(subcommand)]
        action: ProjectCommands,
    },

    /// Export a saved project (html, pwa, apk)
    Export {
        /// Export kind
        kind: String,

        /// Project ID (defaults to the most recent project)
        #[arg(short, long)]
        project: Option<String>,

        /// Output directory (defaults to ~/.appforge/exports)
        #[arg(short, long)]
        out_dir: Option<std::path::PathBuf>,
    },

    /// Show or change the license
    License {
        #[command(subcommand)]
        action: Option<LicenseCommands>,
    },

    /// Show usage counters for the current period
    Usage,

    /// Show the export history
    History,

    /// Show unlocked and locked achievements
    Achievements,

    /// Manage provider API keys
    Auth {
        #[command(subcommand)]
        action: AuthCommands,
    },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// List saved projects
    List,
    /// Print a project's document to stdout
    Show { id: String },
    /// Delete a project
    Delete { id: String },
}

#[derive(Subcommand)]
enum LicenseCommands {
    /// Show the current license
    Show,
    /// Upgrade to a tier (free, pro, team)
    Upgrade {
        tier: String,
        /// Billing cycle (monthly, yearly, lifetime)
        #[arg(short, long, default_value = "monthly")]
        cycle: String,
    },
    /// Return to the free tier
    Downgrade,
}

#[derive(Subcommand)]
enum AuthCommands {
    /// Store an API key for a provider
    SetKey { provider: String, key: String },
    /// Show which providers have keys configured
    Status,
}

/// Service handles built once at startup and passed to every command
struct Services {
    license: LicenseManager,
    history: ExportHistory,
    projects: ProjectStore,
    achievements: AchievementEngine,
    export: ExportService,
}

impl Services {
    fn open() -> Result<Self> {
        let db_path = paths::database_path();
        tracing::debug!("Opening database at {:?}", db_path);
        let db = Database::open_shared(&db_path)?;
        let kv = KvStore::new(db.clone());
        let usage = UsageTracker::new(kv.clone());
        let license = LicenseManager::new(kv.clone(), usage);
        let history = ExportHistory::new(kv.clone());
        let achievements = AchievementEngine::new(kv);
        let projects = ProjectStore::new(db);
        let export = ExportService::new(
            license.clone(),
            history.clone(),
            achievements.clone(),
            projects.clone(),
        );

        Ok(Self {
            license,
            history,
            projects,
            achievements,
            export,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let services = Services::open()?;

    match cli.command {
        Commands::Generate {
            prompt,
            name,
            template,
            provider,
            model,
        } => generate(&services, &prompt, name, template, provider, model).await,
        Commands::Templates => {
            for t in TEMPLATES {
                println!("{:<12} {:<14} {}", t.id, t.name, t.description);
            }
            Ok(())
        }
        Commands::Projects { action } => projects(&services, action),
        Commands::Export {
            kind,
            project,
            out_dir,
        } => export(&services, &kind, project, out_dir),
        Commands::License { action } => license(&services, action),
        Commands::Usage => usage(&services),
        Commands::History => history(&services),
        Commands::Achievements => achievements(&services),
        Commands::Auth { action } => auth(action),
    }
}

async fn generate(
    services: &Services,
    prompt: &str,
    name: Option<String>,
    template: Option<String>,
    provider: Option<String>,
    model: Option<String>,
) -> Result<()> {
    let name = name.unwrap_or_else(|| prompt.to_string());

    // Template path: fully offline, no provider involved
    if let Some(template_id) = template {
        let Some(def) = appforge_core::ai::template_by_id(&template_id) else {
            eprintln!("Unknown template '{template_id}'. Run `appforge templates` to list them.");
            std::process::exit(1);
        };
        let id = services
            .projects
            .save(&name, prompt, Some(def.id), def.html)?;
        println!("Saved '{name}' from template '{}' ({id})", def.id);
        return Ok(());
    }

    let generator = build_generator(provider, model)?;
    if !generator.has_provider() {
        eprintln!("No API key configured; using the demo template.");
        eprintln!("Run `appforge auth set-key <provider> <key>` to enable generation.");
    }

    let app = generator.generate_or_fallback(prompt).await?;

    if app.source == GenerationSource::Provider {
        for badge in services.export.record_generation() {
            println!("Achievement unlocked: {} - {}", badge.name, badge.description);
        }
    }

    let id = services.projects.save(&name, prompt, None, &app.html)?;
    match app.source {
        GenerationSource::Provider => println!("Generated '{name}' ({id})"),
        GenerationSource::DemoTemplate => println!("Saved demo app as '{name}' ({id})"),
    }
    println!("Export it with: appforge export html --project {id}");
    Ok(())
}

/// Resolve the generator from flags and stored credentials
fn build_generator(provider: Option<String>, model: Option<String>) -> Result<AppGenerator> {
    let credentials = CredentialStore::load()?;

    let provider_id = match provider {
        Some(ref name) => match ProviderId::parse(name) {
            Some(id) => Some(id),
            None => {
                eprintln!("Unknown provider '{name}' (expected anthropic, openai, openrouter).");
                std::process::exit(1);
            }
        },
        None => credentials.configured_providers().into_iter().next(),
    };

    let Some(provider_id) = provider_id else {
        return Ok(AppGenerator::offline());
    };

    match credentials.get(&provider_id) {
        Some(key) => {
            let config = GenClientConfig::for_provider(provider_id, model.as_deref());
            Ok(AppGenerator::new(GenClient::new(config, key.clone())))
        }
        None => {
            eprintln!("No API key stored for {provider_id}.");
            Ok(AppGenerator::offline())
        }
    }
}

fn projects(services: &Services, action: ProjectCommands) -> Result<()> {
    match action {
        ProjectCommands::List => {
            let projects = services.projects.list()?;
            if projects.is_empty() {
                println!("No saved projects. Start with `appforge generate \"...\"`.");
                return Ok(());
            }
            for p in projects {
                let origin = p.template.as_deref().unwrap_or("ai");
                println!(
                    "{}  {:<24} [{}] {}",
                    p.id,
                    p.name,
                    origin,
                    p.updated_at.format("%Y-%m-%d %H:%M")
                );
            }
            Ok(())
        }
        ProjectCommands::Show { id } => match services.projects.get(&id)? {
            Some(project) => {
                println!("{}", project.html);
                Ok(())
            }
            None => {
                eprintln!("No project with id {id}");
                std::process::exit(1);
            }
        },
        ProjectCommands::Delete { id } => {
            services.projects.delete(&id)?;
            println!("Deleted {id}");
            Ok(())
        }
    }
}

fn export(
    services: &Services,
    kind: &str,
    project: Option<String>,
    out_dir: Option<std::path::PathBuf>,
) -> Result<()> {
    // String boundary: unknown kinds deny, they never crash
    let Some(kind) = ExportKind::parse(kind) else {
        eprintln!("Unknown export kind '{kind}' (expected html, pwa, apk).");
        std::process::exit(1);
    };

    let project = match project {
        Some(id) => services.projects.get(&id)?,
        None => {
            let latest = services.projects.list()?.into_iter().next();
            match latest {
                Some(info) => services.projects.get(&info.id)?,
                None => None,
            }
        }
    };
    let Some(project) = project else {
        eprintln!("Nothing to export. Generate a project first.");
        std::process::exit(1);
    };

    let out_dir = out_dir.unwrap_or_else(paths::exports_dir);
    let outcome = services
        .export
        .export(kind, &project.name, &project.html, &out_dir)?;

    match outcome {
        ExportOutcome::Completed {
            entry,
            path,
            unlocked,
        } => {
            println!(
                "Exported {} ({} bytes) -> {}",
                entry.filename,
                entry.size_bytes,
                path.display()
            );
            for badge in unlocked {
                println!("Achievement unlocked: {} - {}", badge.name, badge.description);
            }
            Ok(())
        }
        ExportOutcome::Denied { kind, reason } => {
            let tier = services.license.current().tier;
            match reason {
                DenyReason::FeatureLocked => {
                    eprintln!("{kind} export is not included in the {tier} tier.");
                }
                DenyReason::QuotaExhausted => {
                    eprintln!("{kind} export quota for this period is spent on the {tier} tier.");
                }
            }
            eprintln!("Upgrade with: appforge license upgrade pro");
            std::process::exit(1);
        }
    }
}

fn license(services: &Services, action: Option<LicenseCommands>) -> Result<()> {
    match action.unwrap_or(LicenseCommands::Show) {
        LicenseCommands::Show => {
            let license = services.license.validate();
            println!("Tier:     {}", license.tier);
            match license.expires_at {
                Some(at) => println!("Expires:  {}", format_timestamp(at)),
                None => println!("Expires:  never"),
            }
            let features = license.features();
            println!(
                "Features: html={} pwa={} apk={}",
                features.html_export, features.pwa_export, features.apk_export
            );
            Ok(())
        }
        LicenseCommands::Upgrade { tier, cycle } => {
            let Some(tier) = Tier::parse(&tier) else {
                eprintln!("Unknown tier '{tier}' (expected free, pro, team).");
                std::process::exit(1);
            };
            let Some(cycle) = BillingCycle::parse(&cycle) else {
                eprintln!("Unknown billing cycle '{cycle}' (expected monthly, yearly, lifetime).");
                std::process::exit(1);
            };
            let license = services.license.upgrade(tier, cycle);
            println!("Now on the {} tier.", license.tier);
            for badge in services.achievements.evaluate(&services.export.stats()) {
                println!("Achievement unlocked: {} - {}", badge.name, badge.description);
            }
            Ok(())
        }
        LicenseCommands::Downgrade => {
            services.license.downgrade();
            println!("Back on the free tier.");
            Ok(())
        }
    }
}

fn usage(services: &Services) -> Result<()> {
    let license = services.license.validate();
    let counters = services.license.usage().counters();

    println!("Period started: {}", format_timestamp(counters.period_start));
    println!("AI generations: {} (unlimited)", counters.ai_generations);
    println!(
        "PWA exports:    {} {}",
        counters.pwa_exports,
        quota_line(license.tier, ExportKind::Pwa)
    );
    println!(
        "App packages:   {} {}",
        counters.apk_builds,
        quota_line(license.tier, ExportKind::Apk)
    );
    Ok(())
}

fn quota_line(tier: Tier, kind: ExportKind) -> String {
    match export_quota(tier, kind) {
        QuotaLimit::Unlimited => "(unlimited)".to_string(),
        QuotaLimit::Limited(max) => format!("(limit {max})"),
    }
}

fn history(services: &Services) -> Result<()> {
    let entries = services.history.list();
    if entries.is_empty() {
        println!("No exports yet.");
        return Ok(());
    }
    for entry in entries {
        println!(
            "{}  {:<5} {:<32} {:>9} bytes",
            format_timestamp(entry.timestamp),
            entry.kind,
            entry.filename,
            entry.size_bytes
        );
    }
    Ok(())
}

fn achievements(services: &Services) -> Result<()> {
    let unlocked = services.achievements.unlocked();
    for id in &unlocked {
        if let Some(def) = achievement_by_id(id) {
            println!("[x] {:<16} {}", def.name, def.description);
        }
    }
    for def in ACHIEVEMENTS {
        if !unlocked.iter().any(|id| id == def.id) {
            println!("[ ] {:<16} {}", def.name, def.description);
        }
    }
    Ok(())
}

fn auth(action: AuthCommands) -> Result<()> {
    match action {
        AuthCommands::SetKey { provider, key } => {
            let Some(provider_id) = ProviderId::parse(&provider) else {
                eprintln!("Unknown provider '{provider}' (expected anthropic, openai, openrouter).");
                std::process::exit(1);
            };
            let mut credentials = CredentialStore::load()?;
            credentials.set(provider_id, key);
            credentials.save()?;
            println!("Stored key for {provider_id}.");
            Ok(())
        }
        AuthCommands::Status => {
            let credentials = CredentialStore::load()?;
            let configured = credentials.configured_providers();
            if configured.is_empty() {
                println!("No providers configured.");
            }
            for provider in configured {
                println!("{provider}: key stored");
            }
            Ok(())
        }
    }
}

fn format_timestamp(unix_secs: u64) -> String {
    DateTime::<Utc>::from_timestamp(unix_secs as i64, 0)
        .unwrap_or_else(Utc::now)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}
