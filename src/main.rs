use anyhow::{Context, Result};
use clap::Parser;
use interview_room::api::{ContextFile, ContextMaterial};
use interview_room::session::{self, Difficulty};
use interview_room::{
    create_router, AppState, AudioBackendConfig, AudioBackendFactory, AudioSource, Config,
    FileSink, HttpInterviewApi, ImageDirSource, InterviewApi, InterviewSession, PipelineConfig,
    SessionConfig, SessionParts, Voice,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Run a mock interview against the interview backend
#[derive(Debug, Parser)]
#[command(name = "interview-room", version, about)]
struct Args {
    /// Configuration file (extension optional)
    #[arg(long, default_value = "config/interview-room")]
    config: String,

    /// Resume or other context document to tailor the interview to
    #[arg(long)]
    context_file: Option<PathBuf>,

    /// Free-text context (job description, notes)
    #[arg(long)]
    context_text: Option<String>,

    /// WAV files replayed as the microphone, one per answer
    #[arg(long, num_args = 1.., required = true)]
    answers: Vec<PathBuf>,

    /// Directory of still images used as the camera
    #[arg(long)]
    frames: PathBuf,

    /// Where synthesized AI speech is written
    #[arg(long, default_value = "tts-out")]
    tts_out: PathBuf,

    #[arg(long)]
    scenario: Option<String>,

    #[arg(long)]
    language: Option<String>,

    /// 1 (gentle) to 10 (merciless)
    #[arg(long)]
    difficulty: Option<u8>,

    #[arg(long)]
    voice: Option<Voice>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let mut session_config = SessionConfig::from_config(&cfg);
    if let Some(scenario) = args.scenario {
        session_config.scenario = scenario;
    }
    if let Some(language) = args.language {
        session_config.language = language;
    }
    if let Some(level) = args.difficulty {
        session_config.difficulty = Difficulty::new(level);
    }
    if let Some(voice) = args.voice {
        session_config.voice = voice;
    }

    let material = ContextMaterial {
        file: match &args.context_file {
            Some(path) => Some(ContextFile {
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "resume".to_string()),
                bytes: std::fs::read(path)
                    .with_context(|| format!("Failed to read context file {}", path.display()))?,
            }),
            None => None,
        },
        manual_text: args.context_text,
    };

    let api: Arc<dyn InterviewApi> = Arc::new(
        HttpInterviewApi::new(cfg.backend.base_url.clone()).context("Failed to create backend client")?,
    );

    let bootstrap = session::prepare(
        api.as_ref(),
        &material,
        &session_config.scenario,
        &session_config.language,
    )
    .await
    .context("Failed to prepare the interview")?;

    let microphone = AudioBackendFactory::create(
        AudioSource::Files(args.answers),
        AudioBackendConfig {
            sample_rate: cfg.audio.sample_rate,
            block_size: cfg.audio.block_size,
        },
    )
    .context("Failed to open the microphone source")?;

    let camera = ImageDirSource::open(&args.frames, cfg.video.sampling_interval())
        .context("Failed to open the camera source")?;
    let speaker = FileSink::new(&args.tts_out).context("Failed to open the speech output")?;

    let parts = SessionParts {
        api,
        microphone,
        camera: Arc::new(camera),
        face_detector: None,
        speaker: Arc::new(speaker),
    };
    let pipeline = PipelineConfig {
        video: cfg.video.clone(),
        analysis: cfg.analysis.clone(),
    };

    let session = match InterviewSession::start(session_config, pipeline, bootstrap, parts) {
        Ok(session) => Arc::new(session),
        Err(e) => {
            if let Some(hint) = e.remediation() {
                warn!("{}", hint);
            }
            return Err(e).context("Failed to start the interview session");
        }
    };

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind control API to {}", addr))?;
    info!("Control API listening on http://{}", addr);

    let app = create_router(AppState::new(Arc::clone(&session)));
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
            }
            info!("Shutdown requested");
        })
        .await
        .context("Control API failed")?;

    let stats = session.end().await;
    info!("Final stats: {}", serde_json::to_string(&stats)?);

    Ok(())
}
