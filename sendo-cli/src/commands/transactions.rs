//! Transactions command - list and inspect merchant transactions

use anyhow::Result;
use chrono::NaiveDate;
use clap::Subcommand;
use colored::Colorize;
use serde_json::json;
use sendo_core::{LogEvent, MerchantTransaction, TransactionFilter, TransactionStatus};

use super::{get_logged_in_context, get_logger, log_event, log_failure, print_json};
use crate::output;

#[derive(Subcommand)]
pub enum TransactionsCommands {
    /// List transactions page by page
    List {
        /// Page number
        #[arg(long, default_value = "1")]
        page: u32,
        /// Filter by status (pending, completed, failed, blocked)
        #[arg(long)]
        status: Option<TransactionStatus>,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Text search within the page
        #[arg(long, short)]
        search: Option<String>,
    },
    /// Show one transaction in detail
    Show {
        /// Transaction id
        id: i64,
    },
}

pub async fn run(command: TransactionsCommands, json: bool) -> Result<()> {
    let logger = get_logger();
    let result = match command {
        TransactionsCommands::List {
            page,
            status,
            from,
            to,
            search,
        } => {
            let filter = TransactionFilter {
                status,
                start_date: from,
                end_date: to,
                search: search.filter(|s| !s.trim().is_empty()),
            };
            list(filter, page, json).await
        }
        TransactionsCommands::Show { id } => show(id, json).await,
    };

    match &result {
        Ok(()) => log_event(&logger, LogEvent::new("command_executed").with_command("transactions")),
        Err(e) => log_failure(&logger, "transactions", e),
    }
    result
}

async fn list(filter: TransactionFilter, page: u32, json: bool) -> Result<()> {
    let ctx = get_logged_in_context()?;

    let pb = output::spinner("Loading transactions...");
    let loaded = ctx.board.load_page(filter, page).await;
    pb.finish_and_clear();
    let snapshot = loaded?;
    let visible = ctx.board.visible();

    if json {
        return print_json(&json!({
            "page": snapshot.page,
            "totalPages": snapshot.total_pages,
            "totalItems": snapshot.total_items,
            "totalCommission": snapshot.total_commission,
            "items": visible,
        }));
    }

    if visible.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["ID", "Date", "Type", "Status", "Amount", "Commission", "Description"]);
    for tx in &visible {
        table.add_row(vec![
            tx.id.to_string(),
            output::format_datetime(tx.transaction.created_at.or(tx.created_at)),
            tx.transaction.kind.clone(),
            output::status_label(tx.status()).to_string(),
            output::format_amount(tx.transaction.amount, tx.currency()),
            output::format_amount(tx.amount, tx.currency()),
            tx.transaction.description.clone().unwrap_or_default(),
        ]);
    }
    println!("{}", table);

    let currency = visible.first().map(|tx| tx.currency()).unwrap_or_default();
    println!(
        "Page {} of {} ({} transactions) - total commission {}",
        snapshot.page,
        snapshot.total_pages.max(1),
        snapshot.total_items,
        output::format_amount(snapshot.total_commission, currency).bold()
    );
    Ok(())
}

async fn show(id: i64, json: bool) -> Result<()> {
    let ctx = get_logged_in_context()?;

    let pb = output::spinner("Loading transaction...");
    let fetched = ctx.api.merchant_transaction(id).await;
    pb.finish_and_clear();
    let tx = fetched?;

    if json {
        return print_json(&tx);
    }
    print_detail(&tx);
    Ok(())
}

fn print_detail(tx: &MerchantTransaction) {
    let detail = &tx.transaction;
    let currency = tx.currency();
    let amount = |value: Option<rust_decimal::Decimal>| {
        value
            .map(|v| output::format_amount(v, currency))
            .unwrap_or_else(|| "-".to_string())
    };

    let mut table = output::create_table();
    table.add_row(vec!["ID".to_string(), tx.id.to_string()]);
    table.add_row(vec![
        "Reference".to_string(),
        detail.transaction_id.clone().unwrap_or_else(|| "-".to_string()),
    ]);
    table.add_row(vec!["Type".to_string(), detail.kind.clone()]);
    table.add_row(vec!["Status".to_string(), output::status_label(tx.status()).to_string()]);
    table.add_row(vec!["Amount".to_string(), output::format_amount(detail.amount, currency)]);
    table.add_row(vec!["Sendo fees".to_string(), amount(detail.sendo_fees)]);
    table.add_row(vec!["Partner fees".to_string(), amount(detail.partner_fees)]);
    table.add_row(vec!["TVA".to_string(), amount(detail.tva)]);
    table.add_row(vec!["Total".to_string(), amount(detail.total_amount)]);
    table.add_row(vec!["Commission".to_string(), output::format_amount(tx.amount, currency)]);
    table.add_row(vec![
        "Withdrawn".to_string(),
        if tx.is_withdrawn { "yes" } else { "no" }.to_string(),
    ]);
    if let Some(method) = &detail.method {
        table.add_row(vec!["Method".to_string(), method.clone()]);
    }
    if let Some(provider) = &detail.provider {
        table.add_row(vec!["Provider".to_string(), provider.clone()]);
    }
    if let Some(description) = &detail.description {
        table.add_row(vec!["Description".to_string(), description.clone()]);
    }
    table.add_row(vec!["Created".to_string(), output::format_datetime(detail.created_at)]);
    println!("{}", table);
}
