//! CLI command implementations

pub mod admin;
pub mod auth;
pub mod kyc;
pub mod logs;
pub mod payment;
pub mod pin;
pub mod status;
pub mod transactions;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use sendo_core::{EntryPoint, Error, LogEvent, LoggingService, SendoContext, SessionState};

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let sendo_dir = get_sendo_dir().ok()?;
    std::fs::create_dir_all(&sendo_dir).ok()?;
    LoggingService::new(&sendo_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Log a failed command; a rejected session is recorded as its own event
pub fn log_failure(logger: &Option<LoggingService>, command: &str, err: &anyhow::Error) {
    let core = err.downcast_ref::<Error>();
    if matches!(core, Some(Error::Unauthorized)) {
        log_event(logger, LogEvent::new("session_expired").with_command(command));
    }
    let message = match core {
        Some(core) => core.user_message(),
        None => format!("{:#}", err),
    };
    log_event(
        logger,
        LogEvent::new("command_failed")
            .with_command(command)
            .with_error(message),
    );
}

/// Get the Sendo directory from environment or default
pub fn get_sendo_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("SENDO_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".sendo"))
        .context("Could not find home directory; set SENDO_DIR")
}

/// Build the Sendo context over the configured API
pub fn get_context() -> Result<SendoContext> {
    let sendo_dir = get_sendo_dir()?;
    SendoContext::new(&sendo_dir).context("Failed to initialize Sendo context")
}

/// Context with a live session, or a hint on how to get one
pub fn get_logged_in_context() -> Result<SendoContext> {
    let ctx = get_context()?;
    match ctx.session.state() {
        SessionState::Authenticated(_) => Ok(ctx),
        SessionState::Expired => bail!("Your session has expired. Run `sendo login` again."),
        SessionState::Anonymous => bail!("Not logged in. Run `sendo login` first."),
    }
}

/// True when prompts can be shown
pub fn is_interactive() -> bool {
    atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout)
}

/// Print a serializable value as pretty JSON
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
