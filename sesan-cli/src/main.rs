//! sesan - command-line client for the speech analysis service
//!
//! Drives the remote analysis pipeline end to end: authentication,
//! participant enrollment, audio submission with a live progress timeline,
//! and retrieval of results, reports and study statistics.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sesan_client::{ApiClient, ProgressMonitor, SessionStore};
use sesan_common::config::Config;
use sesan_common::types::{GroupType, NewParticipant, Participant};
use sesan_common::CorrelationToken;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "sesan", version, about = "Client for the speech analysis service")]
struct Cli {
    /// Base URL of the analysis service (overrides config file and env)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Alternate config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start registration; the service emails a verification code
    Register {
        email: String,
        #[arg(long, env = "SESAN_PASSWORD")]
        password: String,
    },
    /// Complete registration with the emailed code and store the session
    VerifyRegister { email: String, code: String },
    /// Check credentials; the service emails a login code
    Login {
        email: String,
        #[arg(long, env = "SESAN_PASSWORD")]
        password: String,
    },
    /// Complete login with the emailed code and store the session
    VerifyLogin { email: String, code: String },
    /// Ask for the verification code to be re-sent
    ResendCode { email: String },
    /// Show the authenticated user
    Whoami,
    /// Drop the stored session
    Logout,

    /// Manage study participants
    #[command(subcommand)]
    Participant(ParticipantCommand),

    /// Submit a recording for analysis and watch its progress
    Analyze {
        /// Participant the recording belongs to
        #[arg(long)]
        participant: i64,
        /// Audio file (wav, mp3, m4a or webm)
        file: PathBuf,
    },

    /// Browse analysis results
    #[command(subcommand)]
    Results(ResultsCommand),

    /// Study reports and statistics
    #[command(subcommand)]
    Report(ReportCommand),
}

#[derive(Subcommand)]
enum ParticipantCommand {
    /// Enroll a new participant
    Add {
        name: String,
        #[arg(long)]
        age: u32,
        #[arg(long)]
        gender: String,
        /// Study group: alzheimer, mci or control
        #[arg(long)]
        group: GroupType,
        /// MMSE score (0-30), when assessed
        #[arg(long)]
        mmse: Option<u32>,
    },
    /// List enrolled participants
    List,
    /// Show one participant
    Show { id: i64 },
}

#[derive(Subcommand)]
enum ResultsCommand {
    /// List analyses, newest first
    List {
        #[arg(long, default_value_t = 100)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Show one analysis in full
    Show { id: i64 },
    /// List analyses for one participant
    Participant { id: i64 },
    /// Delete an analysis
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum ReportCommand {
    /// Aggregate study statistics
    Stats,
    /// Per-participant reports for one study group
    Group { group: GroupType },
    /// Download an analysis's PDF report
    Download {
        analysis_id: i64,
        /// Destination path (default: rapor_<id>.pdf)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    debug!(
        "sesan v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = Config::load(cli.config.as_ref(), cli.api_url.as_deref())?;
    let session = SessionStore::new(config.session_file.clone());
    let client = ApiClient::new(&config)?;

    match cli.command {
        Command::Register { email, password } => {
            let message = client.register(&email, &password).await?;
            println!("{}", message.message);
            println!("Complete with: sesan verify-register {} <code>", email);
        }
        Command::VerifyRegister { email, code } => {
            let token = client.verify_register(&email, &code).await?;
            session.save(&token.access_token)?;
            println!("Registered and logged in as {}", email);
        }
        Command::Login { email, password } => {
            let message = client.login(&email, &password).await?;
            println!("{}", message.message);
            println!("Complete with: sesan verify-login {} <code>", email);
        }
        Command::VerifyLogin { email, code } => {
            let token = client.verify_login(&email, &code).await?;
            session.save(&token.access_token)?;
            println!("Logged in as {}", email);
        }
        Command::ResendCode { email } => {
            let message = client.resend_code(&email).await?;
            println!("{}", message.message);
        }
        Command::Whoami => {
            let client = authed(client, &session)?;
            let user = client.me().await?;
            println!("{} (id {}, verified: {})", user.email, user.id, user.is_verified);
        }
        Command::Logout => {
            session.clear()?;
            println!("Session cleared");
        }

        Command::Participant(command) => {
            let client = authed(client, &session)?;
            run_participant(client, command).await?;
        }

        Command::Analyze { participant, file } => {
            let client = authed(client, &session)?;
            run_analyze(client, participant, file).await?;
        }

        Command::Results(command) => {
            let client = authed(client, &session)?;
            run_results(client, command).await?;
        }

        Command::Report(command) => {
            let client = authed(client, &session)?;
            run_report(client, command).await?;
        }
    }

    Ok(())
}

/// Attach the stored session token to the client
fn authed(client: ApiClient, session: &SessionStore) -> Result<ApiClient> {
    let token = session.load_required()?;
    Ok(client.with_token(token))
}

fn print_participant(p: &Participant) {
    let mmse = p
        .mmse_score
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{:>4}  {:<24} {:>3}  {:<8} {:<10} MMSE {}",
        p.id, p.name, p.age, p.gender, p.group_type, mmse
    );
}

async fn run_participant(client: ApiClient, command: ParticipantCommand) -> Result<()> {
    match command {
        ParticipantCommand::Add {
            name,
            age,
            gender,
            group,
            mmse,
        } => {
            let created = client
                .create_participant(&NewParticipant {
                    name,
                    age,
                    gender,
                    group_type: group,
                    mmse_score: mmse,
                })
                .await?;
            println!("Enrolled participant {}:", created.id);
            print_participant(&created);
        }
        ParticipantCommand::List => {
            let participants = client.list_participants().await?;
            if participants.is_empty() {
                println!("No participants enrolled yet");
            }
            for p in &participants {
                print_participant(p);
            }
        }
        ParticipantCommand::Show { id } => {
            let p = client.get_participant(id).await?;
            print_participant(&p);
        }
    }
    Ok(())
}

/// Submit a recording and render the progress timeline while it runs
async fn run_analyze(client: ApiClient, participant: i64, file: PathBuf) -> Result<()> {
    // One fresh token per submission attempt; a retry starts over with a
    // new token and a new job
    let token = CorrelationToken::new();
    let (monitor, mut progress) = ProgressMonitor::start(client.clone(), token);

    let mut submission = tokio::spawn({
        let client = client.clone();
        let file = file.clone();
        async move { client.submit_analysis(participant, &file, &token).await }
    });

    // Render progress lines until either the job goes terminal or the
    // upload request returns; a failed submission never produces a terminal
    // snapshot, so the monitor cannot be waited on unconditionally
    let outcome = loop {
        tokio::select! {
            maybe = progress.recv() => match maybe {
                Some(snapshot) => {
                    let title = snapshot
                        .steps
                        .iter()
                        .find(|s| s.step == snapshot.current_step)
                        .map(|s| s.title.as_str())
                        .unwrap_or("");
                    if snapshot.message.is_empty() {
                        println!("[{}/{}] {}", snapshot.current_step, snapshot.total_steps, title);
                    } else {
                        println!(
                            "[{}/{}] {}: {}",
                            snapshot.current_step, snapshot.total_steps, title, snapshot.message
                        );
                    }
                }
                None => break submission.await.context("submission task failed")?,
            },
            res = &mut submission => break res.context("submission task failed")?,
        }
    };
    monitor.stop().await;
    let result = outcome.context("analysis failed")?;

    println!();
    println!("Analysis {} finished for participant {}", result.id, result.participant_id);
    println!("Transcript: {}", result.transcript);
    println!(
        "Emotion: {} (intensity {:.2})",
        result.emotion_analysis.tone, result.emotion_analysis.intensity
    );
    println!(
        "Fluency {:.2}, coherence {:.2}",
        result.content_analysis.fluency_score, result.content_analysis.coherence_score
    );
    if result.clinical_report.is_some() {
        println!("Clinical report available: sesan report download {}", result.id);
    }
    Ok(())
}

async fn run_results(client: ApiClient, command: ResultsCommand) -> Result<()> {
    match command {
        ResultsCommand::List { limit, offset } => {
            let page = client.list_results(limit, offset).await?;
            println!("{} analyses total", page.total);
            for item in &page.items {
                println!(
                    "{:>4}  participant {:>4}  {}  {}",
                    item.id,
                    item.participant_id,
                    item.created_at.format("%Y-%m-%d %H:%M"),
                    item.transcript
                );
            }
        }
        ResultsCommand::Show { id } => {
            let result = client.get_result(id).await?;
            println!("Analysis {} (participant {})", result.id, result.participant_id);
            println!("Recorded {}", result.created_at);
            println!();
            println!("Transcript:\n{}", result.transcript);
            println!();
            let f = &result.acoustic_features;
            println!(
                "Duration {:.1}s, pitch {:.1}±{:.1} Hz, tempo {:.1}",
                f.duration, f.pitch.mean, f.pitch.std, f.tempo
            );
            if let Some(adv) = &result.advanced_acoustic {
                println!(
                    "Jitter {:.4}, shimmer {:.4}, HNR {:.1} dB",
                    adv.jitter.local, adv.shimmer.local, adv.hnr
                );
            }
            if let Some(ling) = &result.linguistic_analysis {
                println!(
                    "{} words ({} unique), TTR {:.3}, {} hesitations",
                    ling.word_count, ling.unique_word_count, ling.type_token_ratio,
                    ling.hesitation_count
                );
            }
            if let Some(report) = &result.clinical_report {
                println!();
                println!("{}", report);
            }
        }
        ResultsCommand::Participant { id } => {
            let items = client.results_for_participant(id).await?;
            for item in &items {
                println!(
                    "{:>4}  {}  {}",
                    item.id,
                    item.created_at.format("%Y-%m-%d %H:%M"),
                    item.transcript
                );
            }
        }
        ResultsCommand::Delete { id } => {
            client.delete_result(id).await?;
            println!("Deleted analysis {}", id);
        }
    }
    Ok(())
}

async fn run_report(client: ApiClient, command: ReportCommand) -> Result<()> {
    match command {
        ReportCommand::Stats => {
            let stats = client.statistics().await?;
            println!(
                "{} participants, {} analyses",
                stats.total_participants, stats.total_analyses
            );
            // Fixed group order; the maps come back unordered
            for group in GroupType::ALL {
                let key = group.to_string();
                let count = stats.group_counts.get(&key).copied().unwrap_or(0);
                let mmse = stats
                    .avg_mmse
                    .get(&key)
                    .and_then(|m| *m)
                    .map(|m| format!("{:.1}", m))
                    .unwrap_or_else(|| "-".to_string());
                println!("  {:<10} {:>3} participants, mean MMSE {}", group, count, mmse);
            }
        }
        ReportCommand::Group { group } => {
            let report = client.group_report(group).await?;
            println!("Group: {}", report.group_type);
            for entry in &report.participants {
                println!(
                    "{:>4}  {:<24} {} analyses",
                    entry.participant.id, entry.participant.name, entry.analyses_count
                );
            }
        }
        ReportCommand::Download { analysis_id, output } => {
            let dest = output.unwrap_or_else(|| PathBuf::from(format!("rapor_{}.pdf", analysis_id)));
            let bytes = client.download_report(analysis_id, &dest).await?;
            println!("Wrote {} ({} bytes)", dest.display(), bytes);
        }
    }
    Ok(())
}
