// Command line entry point.
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Run one pipeline step: preview, materialize, or resume after sign-in

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lesson_slides::config::{AiProviderKind, AppConfig, AuthMode, ServiceAccountKey};
use lesson_slides::core::ai::{AiConfig, AiProvider, LimitedModelCaller};
use lesson_slides::core::presentation::{
    AuthSession, MaterializeError, MaterializerService, TokenProvider,
};
use lesson_slides::core::slides::{
    DraftService, GenerationObserver, Lesson, NoticeLevel, PreviewBundle, Subject, Unit,
};
use lesson_slides::infra::ai::{GeminiClient, JsonUsageStore, OpenRouterClient};
use lesson_slides::infra::google::{
    GoogleApiClient, NativeLoginOptions, NativeTokenProvider, RefreshTokenLogin,
    ServiceAccountTokenProvider, WebPopupTokenProvider,
};
use lesson_slides::infra::pending::JsonFilePendingStore;

#[derive(Parser)]
#[command(name = "lesson-slides", version, about = "Turn lesson pages into Google Slides decks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Draft slides for a lesson and save the preview as JSON
    Preview {
        /// Course export with `subject`, `units` and `lessons`
        #[arg(long)]
        course: PathBuf,
        /// Lesson to draft; the first one given is used
        #[arg(long = "lesson", required = true)]
        lessons: Vec<String>,
        /// Where to write the preview bundle
        #[arg(long)]
        out: PathBuf,
    },
    /// Create a Google Slides deck from a saved preview
    Materialize {
        #[arg(long)]
        preview: PathBuf,
    },
    /// Finish a browser sign-in and create the deck that was waiting for it
    Resume {
        /// The full URL Google redirected to, fragment included
        #[arg(long)]
        callback_url: Option<String>,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseFile {
    #[serde(default)]
    subject: Option<Subject>,
    #[serde(default)]
    units: Vec<Unit>,
    #[serde(default)]
    lessons: Vec<Lesson>,
}

/// Prints generation progress to the terminal.
struct ConsoleObserver;

impl GenerationObserver for ConsoleObserver {
    fn on_progress(&self, percent: u8, status: &str) {
        println!("[{:>3}%] {}", percent, status);
    }

    fn on_notice(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Error => eprintln!("❌ {}", message),
            NoticeLevel::Warning => eprintln!("⚠️  {}", message),
            NoticeLevel::Success => println!("✅ {}", message),
            NoticeLevel::Info => println!("{}", message),
        }
    }
}

type Materializer =
    MaterializerService<GoogleApiClient, Box<dyn TokenProvider>, JsonFilePendingStore>;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    // Keep runtime files in a dedicated folder so the repo root stays tidy.
    tokio::fs::create_dir_all(&config.data_dir)
        .await
        .with_context(|| format!("Failed to create data directory {:?}", config.data_dir))?;

    match cli.command {
        Command::Preview {
            course,
            lessons,
            out,
        } => run_preview(&config, &course, &lessons, &out).await,
        Command::Materialize { preview } => run_materialize(&config, &preview).await,
        Command::Resume { callback_url } => run_resume(&config, callback_url.as_deref()).await,
    }
}

// ============================================================================
// COMMANDS
// ============================================================================

async fn run_preview(
    config: &AppConfig,
    course_path: &Path,
    lesson_ids: &[String],
    out: &Path,
) -> Result<()> {
    let course: CourseFile = read_json(course_path).await?;
    let drafts = DraftService::new(build_model_caller(config).await?);

    let report = drafts
        .generate_preview(
            lesson_ids,
            &course.lessons,
            course.subject.as_ref(),
            &course.units,
            &ConsoleObserver,
        )
        .await?;

    let bundle = drafts
        .take_preview()
        .await
        .context("Generation finished without a preview")?;
    let json = serde_json::to_string_pretty(&bundle)?;
    tokio::fs::write(out, json)
        .await
        .with_context(|| format!("Failed to write preview to {:?}", out))?;

    println!(
        "Wrote {} slides to {} ({} sections skipped)",
        report.total_slides,
        out.display(),
        report.skipped()
    );
    Ok(())
}

async fn run_materialize(config: &AppConfig, preview_path: &Path) -> Result<()> {
    let bundle: PreviewBundle = read_json(preview_path).await?;
    let session = Arc::new(AuthSession::new());
    let provider = token_provider(config, session.clone()).await?;
    let materializer = build_materializer(config, session, provider);

    let target = bundle.materialization_target();
    report_outcome(materializer.materialize(&bundle.slides, &target).await)
}

async fn run_resume(config: &AppConfig, callback_url: Option<&str>) -> Result<()> {
    let session = Arc::new(AuthSession::new());

    let provider = match callback_url {
        Some(url) => {
            if config.auth_mode != AuthMode::Web {
                bail!("--callback-url only applies to GOOGLE_AUTH_MODE=web");
            }
            let web = web_provider(config, session.clone());
            web.complete_redirect(url).await?;
            Box::new(web) as Box<dyn TokenProvider>
        }
        None => token_provider(config, session.clone()).await?,
    };

    let materializer = build_materializer(config, session, provider);
    match materializer.resume_pending().await {
        Ok(None) => {
            println!("Nothing waiting to be created.");
            Ok(())
        }
        Ok(Some(url)) => report_outcome(Ok(url)),
        Err(e) => report_outcome(Err(e)),
    }
}

fn report_outcome(result: Result<String, MaterializeError>) -> Result<()> {
    match result {
        Ok(url) => {
            println!("✅ Presentation created: {}", url);
            Ok(())
        }
        Err(MaterializeError::AuthRedirectInProgress { consent_url }) => {
            println!("Sign in with Google to continue:\n{}", consent_url);
            println!("Then run `lesson-slides resume --callback-url '<redirected URL>'`.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

// ============================================================================
// DEPENDENCY INJECTION
// ============================================================================

async fn build_model_caller(
    config: &AppConfig,
) -> Result<LimitedModelCaller<Box<dyn AiProvider>, JsonUsageStore>> {
    let (api_key, model) = config.ai_credentials()?;
    let provider: Box<dyn AiProvider> = match config.ai_provider {
        AiProviderKind::Gemini => Box::new(GeminiClient::new(api_key.to_string())),
        AiProviderKind::OpenRouter => Box::new(OpenRouterClient::new(api_key.to_string())),
    };
    let ai_config = AiConfig {
        model: model.to_string(),
        ..AiConfig::default()
    };
    let usage = JsonUsageStore::open(config.usage_ledger_path()).await;

    Ok(LimitedModelCaller::new(
        provider,
        usage,
        ai_config,
        config.monthly_call_limit,
    ))
}

fn build_materializer(
    config: &AppConfig,
    session: Arc<AuthSession>,
    provider: Box<dyn TokenProvider>,
) -> Materializer {
    MaterializerService::new(
        GoogleApiClient::new(config.google_api_key.clone()),
        provider,
        session,
        JsonFilePendingStore::in_dir(&config.data_dir),
        config.template_id.clone(),
    )
}

fn web_provider(config: &AppConfig, session: Arc<AuthSession>) -> WebPopupTokenProvider {
    WebPopupTokenProvider::new(
        config.google_client_id.clone(),
        config.redirect_uri.clone(),
        session,
    )
    .with_state_file(config.oauth_state_path())
}

/// Picks the sign-in flow for the configured auth mode.
async fn token_provider(
    config: &AppConfig,
    session: Arc<AuthSession>,
) -> Result<Box<dyn TokenProvider>> {
    let provider: Box<dyn TokenProvider> = match config.auth_mode {
        AuthMode::Web => Box::new(web_provider(config, session)),
        AuthMode::Native => {
            let refresh_token = config
                .refresh_token
                .clone()
                .context("Missing GOOGLE_REFRESH_TOKEN environment variable!")?;
            Box::new(NativeTokenProvider::new(
                RefreshTokenLogin::new(refresh_token, config.client_secret.clone()),
                NativeLoginOptions::google(config.google_client_id.clone()),
            ))
        }
        AuthMode::ServiceAccount => {
            let provider = match &config.service_account_key {
                Some(ServiceAccountKey::Path(path)) => {
                    ServiceAccountTokenProvider::from_file(path).await?
                }
                Some(ServiceAccountKey::Json(json)) => ServiceAccountTokenProvider::from_json(json)?,
                None => bail!("Neither GOOGLE_SERVICE_ACCOUNT_KEY nor GOOGLE_SERVICE_ACCOUNT_JSON is set."),
            };
            Box::new(provider)
        }
    };
    Ok(provider)
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("{:?} is not valid JSON", path))
}
