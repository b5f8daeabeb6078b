//! PIN command - set or check the account passcode

use anyhow::{bail, Result};
use clap::Subcommand;
use dialoguer::Password;
use sendo_core::{LogEvent, OperationResult, Pin};

use super::{get_logged_in_context, get_logger, is_interactive, log_event, log_failure, print_json};
use crate::output;

#[derive(Subcommand)]
pub enum PinCommands {
    /// Set or replace the 4-digit PIN used to confirm payments
    Set,
    /// Check a PIN against the one on the account
    Verify,
}

fn read_pin(prompt: &str, confirm: bool) -> Result<Pin> {
    if !is_interactive() {
        bail!("PIN entry needs an interactive terminal");
    }
    let mut input = Password::new().with_prompt(prompt).validate_with(
        |input: &String| -> std::result::Result<(), String> {
            Pin::new(input.as_str()).map(|_| ()).map_err(|e| e.user_message())
        },
    );
    if confirm {
        input = input.with_confirmation("Repeat PIN", "PINs do not match");
    }
    Ok(Pin::new(input.interact()?)?)
}

pub async fn run(command: PinCommands, json: bool) -> Result<()> {
    let logger = get_logger();
    let result = match command {
        PinCommands::Set => set(json).await,
        PinCommands::Verify => verify(json).await,
    };
    match &result {
        Ok(()) => log_event(&logger, LogEvent::new("command_executed").with_command("pin")),
        Err(e) => log_failure(&logger, "pin", e),
    }
    result
}

async fn set(json: bool) -> Result<()> {
    let ctx = get_logged_in_context()?;
    let replacing = ctx.api.has_pincode().await?;
    let pin = read_pin(if replacing { "New PIN" } else { "PIN" }, true)?;

    let pb = output::spinner("Saving PIN...");
    let saved = ctx.api.set_passcode(&pin).await;
    pb.finish_and_clear();
    saved?;

    if json {
        return print_json(&OperationResult::ok(true));
    }
    output::success(if replacing { "PIN updated" } else { "PIN set" });
    Ok(())
}

async fn verify(json: bool) -> Result<()> {
    let ctx = get_logged_in_context()?;
    if !ctx.api.has_pincode().await? {
        bail!("No PIN is configured on this account. Run `sendo pin set` first.");
    }
    let pin = read_pin("PIN", false)?;

    let pb = output::spinner("Checking PIN...");
    let checked = ctx.api.verify_pincode(&pin).await;
    pb.finish_and_clear();
    let valid = checked?;

    if json {
        return print_json(&OperationResult::ok(valid));
    }
    if valid {
        output::success("PIN is correct");
        Ok(())
    } else {
        bail!("Incorrect PIN code")
    }
}
