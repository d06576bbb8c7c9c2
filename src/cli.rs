//! Line shell - turns typed commands into store commands and renders snapshots

use anyhow::{anyhow, bail, Context, Result};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::app::session::SessionKind;
use crate::messages::{StoreCommand, StoreSnapshot};
use crate::models::{parse_calendar_date, Credentials, NewRecord, Record, RecordKind, Registration, Totals};

pub const HELP: &str = r#"Commands:
────────────────────────────────────────────────────────────
  login <email> <password>          Log in
  register <username> <email> <pw>  Create an account
  guest                             Log in as a guest
  logout                            End the session
  refresh                           Reload incomes and expenses
  fetch <income|expense>            Reload one collection
  incomes | expenses                List a collection
  totals                            Show income, expenses, balance, min/max
  status                            Show session state
  add <income|expense> <title> <amount> <category> <YYYY-MM-DD> [description]
  delete <income|expense> <id>      Delete a record
  clear                             Dismiss the current error
  help                              This text
  quit                              Exit
────────────────────────────────────────────────────────────
Quote arguments containing spaces: add expense "Weekly shop" 54.20 food 2024-03-02"#;

/// What a typed line asks for
#[derive(Debug, Clone)]
pub enum Action {
    Run(StoreCommand),
    Show(View),
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Records(RecordKind),
    Totals,
    Status,
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Action>> {
    let tokens = tokenize(line)?;
    let Some((command, args)) = tokens.split_first() else {
        return Ok(None);
    };

    let action = match command.to_lowercase().as_str() {
        "login" => {
            let [email, password] = expect_args::<2>(args, "login <email> <password>")?;
            Action::Run(StoreCommand::Login(Credentials::new(email, password)))
        }
        "register" | "signup" => {
            let [username, email, password] =
                expect_args::<3>(args, "register <username> <email> <password>")?;
            Action::Run(StoreCommand::Register(Registration {
                username,
                email,
                password,
            }))
        }
        "guest" => Action::Run(StoreCommand::GuestLogin),
        "logout" => Action::Run(StoreCommand::Logout),
        "refresh" => Action::Run(StoreCommand::Refresh),
        "fetch" => {
            let [kind] = expect_args::<1>(args, "fetch <income|expense>")?;
            match parse_kind(&kind)? {
                RecordKind::Income => Action::Run(StoreCommand::FetchIncomes),
                RecordKind::Expense => Action::Run(StoreCommand::FetchExpenses),
            }
        }
        "incomes" => Action::Show(View::Records(RecordKind::Income)),
        "expenses" => Action::Show(View::Records(RecordKind::Expense)),
        "totals" => Action::Show(View::Totals),
        "status" => Action::Show(View::Status),
        "add" => parse_add(args)?,
        "delete" | "rm" => {
            let [kind, id] = expect_args::<2>(args, "delete <income|expense> <id>")?;
            Action::Run(StoreCommand::DeleteRecord {
                kind: parse_kind(&kind)?,
                id,
            })
        }
        "clear" => Action::Run(StoreCommand::ClearError),
        "help" | "?" => Action::Help,
        "quit" | "exit" | "q" => Action::Quit,
        other => bail!("Unknown command '{}'. Type 'help' for a list.", other),
    };

    Ok(Some(action))
}

fn parse_add(args: &[String]) -> Result<Action> {
    const USAGE: &str = "add <income|expense> <title> <amount> <category> <YYYY-MM-DD> [description]";
    if args.len() < 5 {
        bail!("Usage: {}", USAGE);
    }

    let kind = parse_kind(&args[0])?;
    let amount = Decimal::from_str(&args[2]).with_context(|| format!("Invalid amount '{}'", args[2]))?;
    let date = parse_calendar_date(&args[4]).with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", args[4]))?;

    let mut record = NewRecord::new(args[1].clone(), amount, args[3].clone(), date);
    if args.len() > 5 {
        record = record.with_description(args[5..].join(" "));
    }

    Ok(Action::Run(StoreCommand::AddRecord { kind, record }))
}

fn parse_kind(s: &str) -> Result<RecordKind> {
    RecordKind::from_str(s).map_err(|e| anyhow!(e))
}

fn expect_args<const N: usize>(args: &[String], usage: &str) -> Result<[String; N]> {
    <[String; N]>::try_from(args.to_vec()).map_err(|_| anyhow!("Usage: {}", usage))
}

/// Split a line into words, respecting quotes
fn tokenize(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut quoted = false;
    let mut escape_next = false;

    for c in input.chars() {
        if escape_next {
            current.push(c);
            escape_next = false;
            continue;
        }

        match c {
            '\\' if !in_single_quote => {
                escape_next = true;
            }
            '\'' if !in_double_quote => {
                in_single_quote = !in_single_quote;
                quoted = true;
            }
            '"' if !in_single_quote => {
                in_double_quote = !in_double_quote;
                quoted = true;
            }
            c if c.is_whitespace() && !in_single_quote && !in_double_quote => {
                if !current.is_empty() || quoted {
                    tokens.push(std::mem::take(&mut current));
                    quoted = false;
                }
            }
            _ => {
                current.push(c);
            }
        }
    }

    if in_single_quote || in_double_quote {
        bail!("Unterminated quote");
    }
    if !current.is_empty() || quoted {
        tokens.push(current);
    }

    Ok(tokens)
}

// ============================================================================
// Rendering
// ============================================================================

pub fn render_records(kind: RecordKind, records: &[Record]) -> String {
    if records.is_empty() {
        return format!("No {} recorded.", kind.collection_key());
    }

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(format!(
        "{:<26} {:<10} {:>12}  {:<14} {}",
        "ID", "DATE", "AMOUNT", "CATEGORY", "TITLE"
    ));
    for record in records {
        let mut line = format!(
            "{:<26} {:<10} {:>12}  {:<14} {}",
            record.id,
            record.date.format("%Y-%m-%d").to_string(),
            record.amount.round_dp(2),
            record.category,
            record.title
        );
        if let Some(description) = &record.description {
            line.push_str(&format!(" ({})", description));
        }
        lines.push(line);
    }
    lines.join("\n")
}

pub fn render_totals(totals: &Totals) -> String {
    format!(
        "Income:   {:>12}\nExpenses: {:>12}\nBalance:  {:>12}\n\n{:<9} {:>12} {:>12}\n{:<9} {:>12} {:>12}\n{:<9} {:>12} {:>12}",
        totals.income.round_dp(2),
        totals.expenses.round_dp(2),
        totals.balance.round_dp(2),
        "",
        "MIN",
        "MAX",
        "Income",
        totals.income_range.min.round_dp(2),
        totals.income_range.max.round_dp(2),
        "Expense",
        totals.expense_range.min.round_dp(2),
        totals.expense_range.max.round_dp(2)
    )
}

pub fn render_status(snapshot: &StoreSnapshot) -> String {
    let session = match snapshot.session_kind {
        Some(SessionKind::Server) => "logged in",
        Some(SessionKind::LocalGuest) => "local guest (offline)",
        None => "logged out",
    };
    let mut status = format!(
        "Session: {} | incomes: {} | expenses: {} | balance: {}",
        session,
        snapshot.incomes.len(),
        snapshot.expenses.len(),
        snapshot.totals.balance.round_dp(2)
    );
    if snapshot.loading {
        status.push_str(" | loading…");
    }
    if let Some(error) = &snapshot.error {
        status.push_str(&format!("\nError: {}", error));
    }
    status
}

/// Human-readable notes about what changed between two snapshots
pub fn describe_changes(prev: &StoreSnapshot, next: &StoreSnapshot) -> Vec<String> {
    let mut notes = Vec::new();

    if prev.session_kind != next.session_kind {
        notes.push(match next.session_kind {
            Some(SessionKind::Server) => String::from("Logged in."),
            Some(SessionKind::LocalGuest) => {
                String::from("Guest endpoint unavailable: using a local offline session.")
            }
            None => String::from("Logged out."),
        });
    }

    for (kind, before, after) in [
        (RecordKind::Income, &prev.incomes, &next.incomes),
        (RecordKind::Expense, &prev.expenses, &next.expenses),
    ] {
        if before != after && !(after.is_empty() && next.session_kind.is_none()) {
            notes.push(format!("{}: {} entries", kind.collection_key(), after.len()));
        }
    }

    if next.error != prev.error {
        if let Some(error) = &next.error {
            notes.push(format!("Error: {}", error));
        }
    }

    notes
}
