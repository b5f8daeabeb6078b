//! Administration commands: roles, user accounts, statistics, commissions

use anyhow::Result;
use chrono::NaiveDate;
use clap::Subcommand;
use colored::Colorize;
use sendo_core::domain::{DateRange, MerchantStatistics, NewUser, UserStatus};
use sendo_core::{LogEvent, OperationResult};

use super::{get_logged_in_context, get_logger, log_event, log_failure, print_json};
use crate::output;

#[derive(Subcommand)]
pub enum RolesCommands {
    /// List all roles
    List,
    /// Create a role
    Create {
        /// Role name
        name: String,
    },
    /// Rename a role
    Rename {
        /// Role id
        id: i64,
        /// New name
        name: String,
    },
    /// Give roles to a user
    Assign {
        /// User id
        user_id: i64,
        /// Role ids, comma separated
        #[arg(value_delimiter = ',', required = true)]
        role_ids: Vec<i64>,
    },
    /// Take a role away from a user
    Remove {
        /// User id
        user_id: i64,
        /// Role id
        role_id: i64,
    },
}

#[derive(Subcommand)]
pub enum UsersCommands {
    /// Create an account with a role
    Invite {
        #[arg(long)]
        firstname: String,
        #[arg(long)]
        lastname: String,
        #[arg(long)]
        email: String,
        /// Role id (see `sendo roles list`)
        #[arg(long)]
        role: i64,
        /// Phone number, 9 to 15 digits
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        country: Option<String>,
    },
    /// Activate or suspend an account
    SetStatus {
        /// Account email
        email: String,
        /// ACTIVE or SUSPENDED
        status: UserStatus,
    },
}

/// Run an admin action and record the outcome in the event log
async fn logged<F, T>(command: &str, action: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    let logger = get_logger();
    let result = action.await;
    match &result {
        Ok(_) => log_event(&logger, LogEvent::new("command_executed").with_command(command)),
        Err(e) => log_failure(&logger, command, e),
    }
    result
}

pub async fn roles(command: RolesCommands, json: bool) -> Result<()> {
    logged("roles", async {
        let ctx = get_logged_in_context()?;
        match command {
            RolesCommands::List => {
                let roles = ctx.admin.roles().await?;
                if json {
                    return print_json(&roles);
                }
                if roles.is_empty() {
                    println!("No roles defined.");
                    return Ok(());
                }
                let mut table = output::create_table();
                table.set_header(vec!["ID", "Name", "Created"]);
                for role in &roles {
                    table.add_row(vec![
                        role.id.to_string(),
                        role.name.clone(),
                        output::format_datetime(role.created_at),
                    ]);
                }
                println!("{}", table);
            }
            RolesCommands::Create { name } => {
                let role = ctx.admin.create_role(&name).await?;
                if json {
                    return print_json(&OperationResult::ok(role));
                }
                output::success(&format!("Created role {} (id {})", role.name, role.id));
            }
            RolesCommands::Rename { id, name } => {
                let role = ctx.admin.rename_role(id, &name).await?;
                if json {
                    return print_json(&OperationResult::ok(role));
                }
                output::success(&format!("Role {} is now {}", role.id, role.name));
            }
            RolesCommands::Assign { user_id, role_ids } => {
                ctx.admin.assign_roles(user_id, role_ids.clone()).await?;
                if json {
                    return print_json(&OperationResult::ok(role_ids));
                }
                let ids: Vec<String> = role_ids.iter().map(i64::to_string).collect();
                output::success(&format!(
                    "Assigned role(s) {} to user {}",
                    ids.join(", "),
                    user_id
                ));
            }
            RolesCommands::Remove { user_id, role_id } => {
                ctx.admin.remove_role(user_id, role_id).await?;
                if json {
                    return print_json(&OperationResult::ok(role_id));
                }
                output::success(&format!("Removed role {} from user {}", role_id, user_id));
            }
        }
        Ok(())
    })
    .await
}

pub async fn users(command: UsersCommands, json: bool) -> Result<()> {
    logged("users", async {
        let ctx = get_logged_in_context()?;
        match command {
            UsersCommands::Invite {
                firstname,
                lastname,
                email,
                role,
                phone,
                address,
                country,
            } => {
                let user = NewUser {
                    firstname,
                    lastname,
                    email,
                    phone,
                    address,
                    country,
                    role_id: role,
                    ..Default::default()
                };
                ctx.admin.invite_user(&user).await?;
                if json {
                    return print_json(&OperationResult::ok(user.email.trim().to_lowercase()));
                }
                output::success(&format!("Invited {} with role {}", user.email.trim(), role));
            }
            UsersCommands::SetStatus { email, status } => {
                ctx.admin.set_user_status(&email, status).await?;
                if json {
                    return print_json(&OperationResult::ok(status));
                }
                output::success(&format!("{} is now {}", email, status));
            }
        }
        Ok(())
    })
    .await
}

pub async fn stats(
    merchant: Option<i64>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    logged("stats", async {
        let ctx = get_logged_in_context()?;
        let range = DateRange {
            start_date: from,
            end_date: to,
        };

        let pb = output::spinner("Loading statistics...");
        let fetched = ctx.admin.merchant_statistics(merchant, &range).await;
        pb.finish_and_clear();
        let stats = fetched?;

        if json {
            return print_json(&stats);
        }
        print_statistics(&stats);
        Ok(())
    })
    .await
}

fn print_statistics(stats: &MerchantStatistics) {
    let merchant = &stats.merchant;
    let summary = &stats.summary;
    let currency = "XAF";

    println!(
        "{} {}",
        merchant.user.name.bold(),
        format!("(merchant {})", merchant.id).dimmed()
    );
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Balance".to_string(), output::format_amount(merchant.balance, currency)]);
    if let Some(status) = &merchant.status {
        table.add_row(vec!["Status".to_string(), status.clone()]);
    }
    table.add_row(vec!["Total fees".to_string(), output::format_amount(summary.total_fees, currency)]);
    table.add_row(vec![
        "Withdrawn".to_string(),
        output::format_amount(summary.total_withdrawn, currency),
    ]);
    table.add_row(vec![
        "Available".to_string(),
        output::format_amount(summary.available_balance, currency),
    ]);
    table.add_row(vec![
        "Pending withdrawals".to_string(),
        output::format_amount(summary.pending_withdrawals, currency),
    ]);
    table.add_row(vec!["Transactions".to_string(), summary.total_transactions.to_string()]);
    println!("{}", table);

    if !stats.recent_fees.is_empty() {
        println!();
        println!("{}", "Recent fees".bold());
        let mut fees = output::create_table();
        fees.set_header(vec!["ID", "Date", "Amount", "Withdrawn", "Transaction"]);
        for fee in &stats.recent_fees {
            fees.add_row(vec![
                fee.id.to_string(),
                output::format_datetime(fee.created_at),
                output::format_amount(fee.amount, currency),
                if fee.is_withdrawn { "yes" } else { "no" }.to_string(),
                fee.transaction
                    .as_ref()
                    .map(|t| t.id.clone())
                    .unwrap_or_else(|| "-".to_string()),
            ]);
        }
        println!("{}", fees);
    }

    if !stats.recent_withdrawals.is_empty() {
        println!();
        println!(
            "{} recent withdrawal(s); use --json for details",
            stats.recent_withdrawals.len()
        );
    }
}

pub async fn commissions(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    kind: Option<String>,
    json: bool,
) -> Result<()> {
    logged("commissions", async {
        let ctx = get_logged_in_context()?;
        let range = DateRange {
            start_date: from,
            end_date: to,
        };

        let pb = output::spinner("Loading commissions...");
        let fetched = ctx.admin.commissions(&range, kind.as_deref()).await;
        pb.finish_and_clear();
        let report = fetched?;

        if json {
            return print_json(&report);
        }

        // the report shape is not fixed; flat objects read better as a table
        match report.as_object() {
            Some(fields) if fields.values().all(|v| !v.is_object() && !v.is_array()) => {
                let mut table = output::create_table();
                for (key, value) in fields {
                    let shown = match value {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    table.add_row(vec![key.clone(), shown]);
                }
                println!("{}", table);
            }
            _ => println!("{}", serde_json::to_string_pretty(&report)?),
        }
        Ok(())
    })
    .await
}
