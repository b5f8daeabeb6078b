//! Transfer and withdraw commands
//!
//! Both run the core payment flow: destination and amount, a confirmation
//! prompt, then the PIN. Ctrl-C while the request is in flight aborts it.

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use colored::Colorize;
use dialoguer::{Confirm, Input, Password};
use rust_decimal::Decimal;
use sendo_core::ports::{ConfirmationPrompt, Confirmer};
use sendo_core::services::{PaymentFlow, PaymentKind, SubmitOutcome};
use sendo_core::{Error, LogEvent, LoggingService, OperationResult, Pin, SendoContext};

use super::{get_logged_in_context, get_logger, is_interactive, log_event, log_failure, print_json};
use crate::output;

/// Yes/no prompt on the terminal
struct TerminalConfirmer;

#[async_trait]
impl Confirmer for TerminalConfirmer {
    async fn confirm(&self, prompt: &ConfirmationPrompt) -> bool {
        let prompt = prompt.clone();
        tokio::task::spawn_blocking(move || {
            println!();
            println!("{}", prompt.title.bold());
            Confirm::new()
                .with_prompt(format!(
                    "{} [{} / {}]",
                    prompt.message, prompt.confirm_text, prompt.cancel_text
                ))
                .default(false)
                .interact()
                .unwrap_or(false)
        })
        .await
        .unwrap_or(false)
    }
}

pub async fn transfer(wallet: Option<String>, amount: Option<Decimal>, json: bool) -> Result<()> {
    run(PaymentKind::Transfer, wallet, amount, json).await
}

pub async fn withdraw(phone: Option<String>, amount: Option<Decimal>, json: bool) -> Result<()> {
    run(PaymentKind::Withdrawal, phone, amount, json).await
}

async fn run(
    kind: PaymentKind,
    destination: Option<String>,
    amount: Option<Decimal>,
    json: bool,
) -> Result<()> {
    let logger = get_logger();
    let command = kind.as_str();

    let result = execute(kind, destination, amount, &logger).await;
    match &result {
        Ok(Some(_)) => log_event(
            &logger,
            LogEvent::new(format!("{}_submitted", kind)).with_flow(command),
        ),
        Ok(None) => log_event(
            &logger,
            LogEvent::new(format!("{}_cancelled", kind)).with_flow(command),
        ),
        Err(e) => log_failure(&logger, command, e),
    }

    if json {
        let report: OperationResult<Option<SubmitOutcome>> = match result {
            Ok(outcome) => OperationResult::ok(outcome),
            Err(e) => OperationResult::fail(format!("{:#}", e)),
        };
        return print_json(&report);
    }

    match result? {
        Some(outcome) => {
            let reference = outcome
                .receipt
                .as_ref()
                .and_then(|r| r.transaction_id.clone());
            match (kind, reference) {
                (PaymentKind::Transfer, Some(reference)) => {
                    output::success(&format!("Transfer sent (reference {})", reference))
                }
                (PaymentKind::Transfer, None) => output::success("Transfer sent"),
                (PaymentKind::Withdrawal, _) => output::success("Withdrawal requested"),
            }
            if !outcome.board_reloaded {
                output::warning("Could not refresh the transaction list.");
            }
        }
        None => println!("Cancelled."),
    }
    Ok(())
}

/// `Ok(None)` when the user backed out before anything was sent
async fn execute(
    kind: PaymentKind,
    destination: Option<String>,
    amount: Option<Decimal>,
    logger: &Option<LoggingService>,
) -> Result<Option<SubmitOutcome>> {
    let interactive = is_interactive();
    if !interactive {
        bail!("{} needs an interactive terminal for confirmation and PIN entry", kind);
    }

    let ctx = get_logged_in_context()?;
    if !ctx.api.has_pincode().await? {
        bail!("No PIN is configured on this account. Run `sendo pin set` first.");
    }

    let destination = match destination {
        Some(d) => d,
        None => {
            let label = match kind {
                PaymentKind::Transfer => "Destination wallet",
                PaymentKind::Withdrawal => "Phone number",
            };
            Input::<String>::new().with_prompt(label).interact_text()?
        }
    };
    let amount = match amount {
        Some(a) => a,
        None => Input::<Decimal>::new().with_prompt("Amount").interact_text()?,
    };

    let flow = flow_for(&ctx, kind);
    flow.set_amount(amount)?;

    match kind {
        PaymentKind::Transfer => {
            let pb = output::spinner("Verifying wallet...");
            let verified = flow.verify_destination(&destination).await;
            pb.finish_and_clear();
            let recipient = verified?;
            println!(
                "Recipient: {} ({})",
                recipient.name.bold(),
                recipient.matricule
            );
        }
        PaymentKind::Withdrawal => flow.set_destination(&destination),
    }

    if !flow.confirm().await? {
        return Ok(None);
    }

    loop {
        let pin = prompt_pin()?;
        let pb = output::spinner("Submitting...");
        let submitted = tokio::select! {
            result = flow.submit_with_pin(pin) => result,
            _ = tokio::signal::ctrl_c() => {
                flow.dismiss();
                Err(Error::Cancelled)
            }
        };
        pb.finish_and_clear();

        match submitted {
            Ok(outcome) => return Ok(Some(outcome)),
            Err(Error::InvalidPin(_)) => {
                let message = flow
                    .pin_error()
                    .unwrap_or_else(|| "Incorrect PIN code".to_string());
                output::error(&message);
                log_event(
                    logger,
                    LogEvent::new(format!("{}_failed", kind))
                        .with_flow(kind.as_str())
                        .with_error("invalid_pin"),
                );
                let retry = Confirm::new()
                    .with_prompt("Try another PIN?")
                    .default(true)
                    .interact()?;
                if !retry {
                    flow.dismiss();
                    return Ok(None);
                }
            }
            Err(Error::Cancelled) => return Ok(None),
            Err(e) => {
                log_event(
                    logger,
                    LogEvent::new(format!("{}_failed", kind))
                        .with_flow(kind.as_str())
                        .with_error(e.user_message()),
                );
                return Err(e.into());
            }
        }
    }
}

fn flow_for(ctx: &SendoContext, kind: PaymentKind) -> PaymentFlow {
    let confirmer = Arc::new(TerminalConfirmer);
    match kind {
        PaymentKind::Transfer => ctx.transfer_flow(confirmer),
        PaymentKind::Withdrawal => ctx.withdrawal_flow(confirmer),
    }
}

fn prompt_pin() -> Result<Pin> {
    let code = Password::new()
        .with_prompt("PIN code")
        .validate_with(|input: &String| -> std::result::Result<(), String> {
            Pin::new(input.as_str()).map(|_| ()).map_err(|e| e.user_message())
        })
        .interact()?;
    Ok(Pin::new(code)?)
}
