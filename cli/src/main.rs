use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use pollview::config::{ClientConfig, ConfigError, parse_locale};
use pollview::render::render_view;
use pollview::{
    CancelOutcome, HttpPollService, LoadOutcome, Messages, PollController, ServiceError, SharedSession, User,
    VoteOutcome,
};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("poll service error: {0}")]
    Service(#[from] ServiceError),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Poll(String),
    #[error("sign in with --user or POLL_USERNAME to vote")]
    SignInRequired,
    #[error("option {0:?} is not part of this poll")]
    UnknownOption(String),
}

#[derive(Parser, Debug)]
#[command(name = "pollview", about = "View a poll's results and cast or cancel a vote")]
struct Cli {
    /// Overrides POLL_SERVER_PROTOCOL / POLL_SERVER_IP / POLL_SERVER_PORT.
    #[arg(long, env = "POLL_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "POLL_USERNAME")]
    user: Option<String>,

    /// `ru` or `en`; overrides POLL_LOCALE.
    #[arg(long)]
    locale: Option<String>,

    /// Print the poll snapshot as JSON instead of the text view.
    #[arg(long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show results for a poll.
    Show { poll_id: String },
    /// Vote for an option (by title).
    Vote { poll_id: String, option: String },
    /// Withdraw your vote.
    Cancel { poll_id: String },
    /// Re-fetch and print the poll every few seconds.
    Watch {
        poll_id: String,
        #[arg(long, default_value_t = 5)]
        interval_secs: u64,
    },
}

struct CliContext {
    controller: PollController<HttpPollService>,
    messages: Messages,
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let ctx = build_context(&cli)?;

    match cli.command {
        Command::Show { poll_id } => run_show(&ctx, &poll_id).await,
        Command::Vote { poll_id, option } => run_vote(&ctx, &poll_id, &option).await,
        Command::Cancel { poll_id } => run_cancel(&ctx, &poll_id).await,
        Command::Watch { poll_id, interval_secs } => run_watch(&ctx, &poll_id, interval_secs).await,
    }
}

fn build_context(cli: &Cli) -> Result<CliContext, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(locale) = cli.locale.as_deref() {
        config.locale = parse_locale(Some(locale))?;
    }
    let service = match cli.base_url.as_deref() {
        Some(base_url) => HttpPollService::new(base_url, config.timeouts)?,
        None => HttpPollService::from_config(&config)?,
    };
    tracing::debug!(base_url = service.base_url(), "poll service configured");

    let session = match cli.user.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        Some(username) => SharedSession::signed_in(User::new(username)),
        None => SharedSession::anonymous(),
    };
    let messages = Messages::for_locale(config.locale);
    let controller = PollController::new(service, Arc::new(session), messages);
    Ok(CliContext { controller, messages, json: cli.json })
}

async fn load(ctx: &CliContext, poll_id: &str) -> Result<(), CliError> {
    match ctx.controller.load(poll_id).await {
        LoadOutcome::Loaded => Ok(()),
        LoadOutcome::Failed | LoadOutcome::Superseded => {
            print_view(ctx)?;
            Err(CliError::Poll(ctx.messages.load_failed.to_owned()))
        }
    }
}

async fn run_show(ctx: &CliContext, poll_id: &str) -> Result<(), CliError> {
    load(ctx, poll_id).await?;
    print_view(ctx)
}

async fn run_vote(ctx: &CliContext, poll_id: &str, option: &str) -> Result<(), CliError> {
    load(ctx, poll_id).await?;
    let view = ctx.controller.view();
    if view.poll.as_ref().is_some_and(|poll| poll.option(option).is_none()) {
        return Err(CliError::UnknownOption(option.to_owned()));
    }

    let outcome = ctx.controller.vote(option).await;
    print_view(ctx)?;
    match outcome {
        VoteOutcome::Voted => Ok(()),
        VoteOutcome::SignInRequired => Err(CliError::SignInRequired),
        VoteOutcome::Failed | VoteOutcome::NotReady | VoteOutcome::Superseded => Err(last_error(ctx)),
    }
}

async fn run_cancel(ctx: &CliContext, poll_id: &str) -> Result<(), CliError> {
    load(ctx, poll_id).await?;
    let outcome = ctx.controller.cancel_vote().await;
    print_view(ctx)?;
    match outcome {
        CancelOutcome::Cancelled => Ok(()),
        CancelOutcome::NotReady => Err(CliError::SignInRequired),
        CancelOutcome::Failed => Err(last_error(ctx)),
    }
}

async fn run_watch(ctx: &CliContext, poll_id: &str, interval_secs: u64) -> Result<(), CliError> {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    loop {
        interval.tick().await;
        // Failed refreshes keep the last good snapshot on screen.
        let _ = ctx.controller.load(poll_id).await;
        print_view(ctx)?;
    }
}

fn last_error(ctx: &CliContext) -> CliError {
    let message = ctx
        .controller
        .view()
        .error
        .unwrap_or_else(|| ctx.messages.vote_failed.to_owned());
    CliError::Poll(message)
}

fn print_view(ctx: &CliContext) -> Result<(), CliError> {
    let view = ctx.controller.view();
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&view.poll)?);
    } else {
        print!("{}", render_view(&view, &ctx.messages));
    }
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
