use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::info;
use voice_persona_client::{
    BackendClient, Config, ConsolePipeline, PersonaSync, PersonaSyncState, PressOutcome,
    RecordingSession, ReplayDevice, SaveStatus, SessionTerminator, SubmitOutcome,
    TranscriptionClient, VoiceRecorder,
};

#[derive(Parser)]
#[command(name = "voice-client", version, about = "Voice chat client for the avatar backend")]
struct Cli {
    /// Configuration file, extension optional
    #[arg(long, default_value = "config/voice-client")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect or edit the user persona
    Persona {
        #[command(subcommand)]
        action: PersonaAction,
    },
    /// Record a WAV file through the voice recorder and print the reply
    Transcribe { wav: PathBuf },
    /// Tell the backend the conversation has ended
    EndSession {
        /// Transcript reference (defaults to session.transcript_path)
        #[arg(long)]
        transcript: Option<String>,
    },
}

#[derive(Subcommand)]
enum PersonaAction {
    /// Fetch the persona once and print it
    Show,
    /// Keep polling and print the persona whenever it changes
    Watch,
    /// Edit fields (KEY=VALUE) and save
    Set {
        #[arg(required = true)]
        assignments: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config).context("Failed to load configuration")?;

    info!("{} using backend {}", cfg.service.name, cfg.api.base_url);

    let backend = BackendClient::new(&cfg.api.base_url, cfg.api.request_timeout())
        .context("Failed to create backend client")?;

    match cli.command {
        Command::Persona { action } => run_persona(action, backend, &cfg).await,
        Command::Transcribe { wav } => run_transcribe(wav, backend, &cfg).await,
        Command::EndSession { transcript } => {
            let transcript = transcript.unwrap_or_else(|| cfg.session.transcript_path.clone());
            let terminator = SessionTerminator::new(backend);
            let acknowledged = terminator
                .end_session(&transcript, Some(Box::new(|| println!("Chat ended"))))
                .await;
            if !acknowledged {
                bail!("Backend did not acknowledge the end of the session");
            }
            Ok(())
        }
    }
}

async fn run_persona(action: PersonaAction, backend: BackendClient, cfg: &Config) -> Result<()> {
    let sync = PersonaSync::new(backend, &cfg.persona);

    match action {
        PersonaAction::Show => {
            sync.refresh().await.context("Failed to load persona")?;
            print_persona(&sync.snapshot());
        }
        PersonaAction::Watch => {
            let poller = sync.spawn_poller();
            let mut last_seen = None;

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    _ = sleep(cfg.persona.poll_interval()) => {
                        let state = sync.snapshot();
                        if state.last_synced_at() != last_seen {
                            last_seen = state.last_synced_at();
                            print_persona(&state);
                        }
                    }
                }
            }

            poller.stop();
        }
        PersonaAction::Set { assignments } => {
            sync.refresh().await.context("Failed to load persona")?;
            sync.begin_editing()?;

            for assignment in &assignments {
                let Some((key, value)) = assignment.split_once('=') else {
                    bail!("Expected KEY=VALUE, got '{}'", assignment);
                };
                sync.change_field(key.trim(), value)?;
            }

            match sync.save().await? {
                SaveStatus::Saved => print_persona(&sync.snapshot()),
                status => bail!("Persona was not saved ({:?})", status),
            }
        }
    }

    Ok(())
}

async fn run_transcribe(wav: PathBuf, backend: BackendClient, cfg: &Config) -> Result<()> {
    let device = ReplayDevice::from_wav_file(&wav, cfg.audio.frame_duration_ms)?;
    let session = RecordingSession::new(Box::new(device), cfg.audio.capture());
    let transcription = TranscriptionClient::new(backend, cfg.voice.forward_to);
    let mut recorder = VoiceRecorder::new(session, transcription, Arc::new(ConsolePipeline::new()));

    match recorder.press().await {
        PressOutcome::Started => {}
        other => bail!("Recorder did not start: {:?}", other),
    }

    match recorder.press().await {
        PressOutcome::Stopped(SubmitOutcome::Forwarded(count)) => {
            info!("Forwarded {} messages", count);
            Ok(())
        }
        PressOutcome::Stopped(SubmitOutcome::NoMessages) => {
            info!("Backend returned no messages");
            Ok(())
        }
        PressOutcome::Stopped(SubmitOutcome::Failed(e)) => Err(e.into()),
        other => bail!("Transcription did not complete: {:?}", other),
    }
}

fn print_persona(state: &PersonaSyncState) {
    let rows = state.field_rows();
    if rows.is_empty() {
        println!("Loading user data...");
        return;
    }

    for row in rows {
        println!("{}: {}", row.label, row.text);
    }

    if let Some(synced) = state.last_synced_display() {
        println!("Last updated: {}", synced.to_rfc2822());
    }
}
