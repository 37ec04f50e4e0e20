//! Interactive subscription-manager menu.
//!
//! A thin shell over the core's select/execute entry points: renders
//! the ranked sender table and dispatches the operator's commands.

use std::io::{self, Write};

use mailsweep_core::{
    MailAccount, Outcome, ScanResult, SenderRecord, UnsubscribeAction, Unsubscriber,
    select, select_automatable,
};

/// Width of the menu frame.
const FRAME_WIDTH: usize = 80;

/// Longest display name shown before truncation.
const NAME_WIDTH: usize = 40;

/// Runs the interactive menu until the operator quits.
///
/// Commands: a numeric index unsubscribes one sender (with
/// confirmation), `all` batch-unsubscribes every automatable sender,
/// `q` quits.
pub async fn run<A: MailAccount>(
    account: &A,
    result: &ScanResult,
    min_count: u32,
    dry_run: bool,
) -> anyhow::Result<()> {
    let ranked = select(result, min_count);
    let unsubscriber = Unsubscriber::new(account)?;

    loop {
        print_table(&ranked);

        print!("> ");
        io::stdout().flush()?;
        let Some(line) = read_line()? else {
            break;
        };

        match line.trim().to_lowercase().as_str() {
            "" => {}
            "q" => break,
            "all" => batch(&unsubscriber, result, min_count, dry_run).await,
            other => match other.parse::<usize>() {
                Ok(index) if index < ranked.len() => {
                    unsubscribe_one(&unsubscriber, ranked[index], dry_run).await?;
                }
                Ok(_) => println!("Invalid ID number."),
                Err(_) => println!("Invalid input."),
            },
        }
    }

    Ok(())
}

/// Non-interactive batch mode (`--yes`).
pub async fn run_batch<A: MailAccount>(
    account: &A,
    result: &ScanResult,
    min_count: u32,
    dry_run: bool,
) -> anyhow::Result<()> {
    let unsubscriber = Unsubscriber::new(account)?;
    batch(&unsubscriber, result, min_count, dry_run).await;
    Ok(())
}

/// Unsubscribes every automatable sender, paced by the executor.
async fn batch<A: MailAccount>(
    unsubscriber: &Unsubscriber<'_, A>,
    result: &ScanResult,
    min_count: u32,
    dry_run: bool,
) {
    let batchable = select_automatable(result, min_count);
    if batchable.is_empty() {
        println!("No senders with an automated unsubscribe method.");
        return;
    }

    println!("\nStarting batch unsubscribe for {} senders...", batchable.len());
    let summary = unsubscriber
        .execute_batch(&batchable, dry_run, report_outcome)
        .await;

    println!(
        "\nBatch complete. {} succeeded, {} failed.",
        summary.succeeded, summary.failed
    );
}

/// Handles one sender from the menu.
async fn unsubscribe_one<A: MailAccount>(
    unsubscriber: &Unsubscriber<'_, A>,
    record: &SenderRecord,
    dry_run: bool,
) -> anyhow::Result<()> {
    println!("\nTarget: {} <{}>", record.display_name, record.address);

    match record.action() {
        UnsubscribeAction::OneClick(url) => println!("Method: one-click POST ({url})"),
        UnsubscribeAction::Mailto(target) => {
            println!("Method: unsubscribe email ({})", target.address);
        }
        UnsubscribeAction::Manual(link) => {
            println!("Method: manual link");
            println!("Open the link below to unsubscribe:\n\n{link}\n");
            if !dry_run
                && confirm("Open it in your browser now? (y/n): ")?
                && opener::open(&link).is_err()
            {
                println!("Could not open a browser, use the link above.");
            }
            return Ok(());
        }
        UnsubscribeAction::NoMethod => {
            println!("Error: no valid unsubscribe method parsed.");
            return Ok(());
        }
    }

    if dry_run || confirm("Confirm? (y/n): ")? {
        let outcome = unsubscriber.execute(record, dry_run).await;
        println!("{}", outcome.message);
    }

    Ok(())
}

/// Prints the ranked sender table.
fn print_table(ranked: &[&SenderRecord]) {
    println!("\n{}", "=".repeat(FRAME_WIDTH));
    println!("SUBSCRIPTION MANAGER - {} lists found", ranked.len());
    println!("{}", "=".repeat(FRAME_WIDTH));
    println!("{:<4} | {:<5} | {:<6} | Sender", "ID", "Freq", "Auto?");
    println!("{}", "-".repeat(FRAME_WIDTH));

    for (index, record) in ranked.iter().enumerate() {
        let auto = if record.methods.is_automatable() {
            "YES"
        } else {
            "NO"
        };
        println!(
            "{index:<4} | {:<5} | {auto:<6} | {} <{}>",
            record.occurrence_count,
            truncate(&record.display_name, NAME_WIDTH),
            record.address
        );
    }

    println!("{}", "-".repeat(FRAME_WIDTH));
    println!("Commands: [ID] to unsubscribe | [all] to auto-unsub all possible | [q] to quit");
}

/// Prints one batch outcome line.
fn report_outcome(record: &SenderRecord, outcome: &Outcome) {
    println!(
        "[{}]: {}",
        record.address,
        if outcome.succeeded { "Done." } else { "Failed." }
    );
}

/// Asks a yes/no question.
fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt}");
    io::stdout().flush()?;
    Ok(read_line()?.is_some_and(|line| line.trim().eq_ignore_ascii_case("y")))
}

/// Reads one line from stdin; `None` on end of input.
fn read_line() -> anyhow::Result<Option<String>> {
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

/// Truncates a display name to `max` characters.
fn truncate(name: &str, max: usize) -> String {
    if name.chars().count() > max {
        let cut: String = name.chars().take(max).collect();
        format!("{cut}..")
    } else {
        name.to_string()
    }
}
