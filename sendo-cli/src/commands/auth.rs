//! Login and logout commands

use anyhow::{bail, Result};
use dialoguer::{Input, Password};
use sendo_core::{LogEvent, OperationResult};

use super::{get_context, get_logger, is_interactive, log_event, log_failure, print_json};
use crate::output;

pub async fn login(email: Option<String>, password: Option<String>, json: bool) -> Result<()> {
    let logger = get_logger();
    let ctx = get_context()?;

    let email = match email {
        Some(email) => email,
        None if is_interactive() => Input::<String>::new().with_prompt("Email").interact_text()?,
        None => bail!("--email is required when not running interactively"),
    };
    let password = match password {
        Some(password) => password,
        None if is_interactive() => Password::new().with_prompt("Password").interact()?,
        None => bail!("Set SENDO_PASSWORD or pass --password when not running interactively"),
    };

    let pb = output::spinner("Logging in...");
    let result = ctx.auth.login(&email, &password).await;
    pb.finish_and_clear();
    drop(password);

    let session = match result {
        Ok(session) => session,
        Err(e) => {
            let err = anyhow::Error::from(e);
            log_failure(&logger, "login", &err);
            return Err(err);
        }
    };
    log_event(&logger, LogEvent::new("login").with_command("login"));

    if json {
        let profile = session.profile.clone();
        return print_json(&OperationResult::ok(profile));
    }

    match &session.profile {
        Some(profile) => output::success(&format!("Logged in as {}", profile.display_name())),
        None => {
            output::success("Logged in");
            output::warning("Your profile could not be loaded; some commands may be unavailable.");
        }
    }
    Ok(())
}

pub async fn logout(json: bool) -> Result<()> {
    let logger = get_logger();
    let ctx = get_context()?;
    let was_logged_in = ctx.session.is_logged_in();

    let result = ctx.auth.logout().await;
    log_event(&logger, LogEvent::new("logout").with_command("logout"));

    if let Err(e) = result {
        // the local session is gone either way
        let err = anyhow::Error::from(e);
        log_failure(&logger, "logout", &err);
        if json {
            return print_json(&OperationResult::<()>::fail(format!("{:#}", err)));
        }
        output::warning(&format!("Logged out locally; the server call failed: {:#}", err));
        return Ok(());
    }

    if json {
        return print_json(&OperationResult::ok(was_logged_in));
    }
    if was_logged_in {
        output::success("Logged out");
    } else {
        output::info("No active session");
    }
    Ok(())
}
