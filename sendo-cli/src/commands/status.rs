//! Status command - show session and account summary

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use rust_decimal::Decimal;
use serde::Serialize;
use sendo_core::SessionState;

use super::{get_context, print_json};
use crate::output;

#[derive(Serialize)]
struct StatusView {
    api_url: String,
    session: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    merchant_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wallet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    balance: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    currency: Option<String>,
    roles: Vec<String>,
}

pub async fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let state = ctx.session.state();

    let mut view = StatusView {
        api_url: ctx.config.api_url.clone(),
        session: state.label(),
        expires_at: None,
        name: None,
        email: None,
        merchant_id: None,
        wallet: None,
        balance: None,
        currency: None,
        roles: Vec::new(),
    };

    if let SessionState::Authenticated(session) = &state {
        view.expires_at = session
            .credentials
            .issued_at
            .map(|issued| issued + ctx.session.ttl());
        if let Some(profile) = &session.profile {
            view.name = Some(profile.display_name());
            view.email = Some(profile.email.clone()).filter(|e| !e.is_empty());
            view.merchant_id = profile.merchant_id();
            view.roles = profile.role_names().into_iter().map(String::from).collect();
            if let Some(wallet) = &profile.wallet {
                view.wallet = Some(wallet.matricule.clone());
                view.balance = Some(wallet.balance);
                view.currency = Some(wallet.currency.clone());
            }
        }
    }

    if json {
        return print_json(&view);
    }

    println!("{}", "Sendo Status".bold());
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let session_label = match state {
        SessionState::Authenticated(_) => view.session.green(),
        SessionState::Expired => view.session.yellow(),
        SessionState::Anonymous => view.session.dimmed(),
    };
    table.add_row(vec!["Session".to_string(), session_label.to_string()]);
    table.add_row(vec!["API".to_string(), view.api_url.clone()]);
    if let Some(expires_at) = view.expires_at {
        table.add_row(vec!["Expires".to_string(), output::format_datetime(Some(expires_at))]);
    }
    if let Some(name) = &view.name {
        table.add_row(vec!["Name".to_string(), name.clone()]);
    }
    if let Some(email) = &view.email {
        table.add_row(vec!["Email".to_string(), email.clone()]);
    }
    if let Some(merchant_id) = view.merchant_id {
        table.add_row(vec!["Merchant".to_string(), merchant_id.to_string()]);
    }
    if let Some(wallet) = &view.wallet {
        table.add_row(vec!["Wallet".to_string(), wallet.clone()]);
    }
    if let (Some(balance), Some(currency)) = (view.balance, &view.currency) {
        table.add_row(vec!["Balance".to_string(), output::format_amount(balance, currency)]);
    }
    if !view.roles.is_empty() {
        table.add_row(vec!["Roles".to_string(), view.roles.join(", ")]);
    }

    println!("{}", table);

    match state {
        SessionState::Anonymous => {
            println!();
            output::info("Run `sendo login` to start a session.");
        }
        SessionState::Expired => {
            println!();
            output::warning("Your session has expired. Run `sendo login` again.");
        }
        SessionState::Authenticated(_) => {}
    }

    Ok(())
}
