use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use quill_rs::adk::error::QuillError;
use quill_rs::quill::builder::Builder;
use quill_rs::quill::config::QuillConfig;
use quill_rs::quill::format::HtmlFormatter;
use quill_rs::quill::server;
use quill_rs::quill::workflow::{Decision, HumanInput, RunOutcome};

use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Draft and review a post, then pause for approval
    Run {
        /// What the post is about
        #[arg(short, long)]
        topic: String,

        /// Session id to store the paused run under (random if omitted)
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Approve or reject a paused draft
    Resume {
        #[arg(short, long)]
        session: String,

        /// Approved or Rejected
        #[arg(short, long)]
        decision: Decision,

        /// Corrections for the writer when rejecting
        #[arg(short, long)]
        feedback: Option<String>,
    },
    /// Show a paused session, or list all of them
    Status {
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Discard a paused session
    Cancel {
        #[arg(short, long)]
        session: String,
    },
    /// Convert a plain-text draft to HTML and print it
    Format {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Serve the HTTP API; publishing uses the credential cached by an earlier `run`
    Serve {
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    if let Commands::Format { file } = &args.command {
        let text = tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("cannot read {}", file.display()))?;
        println!("{}", HtmlFormatter::default().format(&text));
        return Ok(());
    }

    let config = QuillConfig::load(args.config.as_deref())?;
    let builder = Builder::new(config);

    match args.command {
        Commands::Run { topic, session } => {
            let workflow = builder.build()?;
            let outcome = match session {
                Some(id) => workflow.start_session(&id, topic).await?,
                None => workflow.start(topic).await?,
            };
            report(&outcome);
        }
        Commands::Resume {
            session,
            decision,
            feedback,
        } => {
            if decision == Decision::Rejected && feedback.is_none() {
                log::warn!("Rejecting without feedback; the writer will only see the topic");
            }
            let workflow = builder.build()?;
            let outcome = workflow
                .resume(&session, HumanInput { decision, feedback })
                .await?;
            report(&outcome);
        }
        Commands::Status { session } => {
            let workflow = builder.build_offline()?;
            match session {
                Some(id) => match workflow.status(&id).await? {
                    Some(checkpoint) => {
                        println!("Session:   {}", checkpoint.session_id);
                        println!("Topic:     {}", checkpoint.state.topic);
                        println!("Paused at: {}", checkpoint.node);
                        println!("Revisions: {}", checkpoint.state.revisions);
                        println!("Updated:   {}", checkpoint.updated_at);
                        println!("\n{}", checkpoint.state.content);
                    }
                    None => bail!("no paused session '{}'", id),
                },
                None => {
                    let sessions = workflow.sessions().await?;
                    if sessions.is_empty() {
                        println!("No paused sessions");
                    }
                    for id in sessions {
                        println!("{}", id);
                    }
                }
            }
        }
        Commands::Cancel { session } => {
            let workflow = builder.build_offline()?;
            if !workflow.cancel(&session).await? {
                bail!("no paused session '{}'", session);
            }
            println!("Cancelled {}", session);
        }
        Commands::Serve { port } => {
            let workflow = builder.build_for_server()?;
            server::serve(Arc::new(workflow), port)
                .await
                .map_err(|e| QuillError::other(e.to_string()))?;
        }
        Commands::Format { .. } => {}
    }

    Ok(())
}

fn report(outcome: &RunOutcome) {
    let state = outcome.state();
    match outcome {
        RunOutcome::Suspended { session_id, .. } => {
            println!("{}\n", state.content);
            println!("Draft {} is waiting for approval.", state.revisions);
            println!(
                "Resume with: quill-rs resume --session {} --decision Approved|Rejected [--feedback ...]",
                session_id
            );
        }
        RunOutcome::Completed { .. } => {
            println!(
                "Published: {}",
                state.published_url.as_deref().unwrap_or("(no url)")
            );
        }
    }
}
