// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Initialise logging (RUST_LOG, default "warn")
// 2. Parse command-line arguments using clap
// 3. Collect the links to validate (scan documents, or take them as given)
// 4. Validate them through the validator manager
// 5. Print the results and exit with a proper code
//    (0 = no broken links, 1 = broken links, 2 = error)
// =============================================================================

mod cli;

use anyhow::Result;
use clap::Parser;
use log::{error, info};

use doc_linkcheck::checker::{Level, LinkReport, LinkValidationItem, LinkValidatorManager};
use doc_linkcheck::scan;

use cli::{CheckOptions, Cli, Commands};

/// Source recorded for links given directly on the command line.
const COMMAND_LINE_SOURCE: &str = "<command line>";

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = no broken links
//   Ok(1) = broken links found
//   Err   = the run itself failed
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { paths, options } => {
            let items = scan::scan_paths(&paths)?;
            info!("Found {} link(s) in {} root(s)", items.len(), paths.len());
            validate_and_report(items, &options).await
        }
        Commands::Check { links, options } => {
            let items = links
                .into_iter()
                .map(|link| LinkValidationItem::new(link, COMMAND_LINE_SOURCE))
                .collect();
            validate_and_report(items, &options).await
        }
    }
}

async fn validate_and_report(items: Vec<LinkValidationItem>, options: &CheckOptions) -> Result<i32> {
    if items.is_empty() {
        if !options.json {
            println!("✅ No links found to check");
        } else {
            println!("[]");
        }
        return Ok(0);
    }

    let manager = build_manager(options)?;
    let reports = manager.validate_all(items, options.concurrency).await;
    info!(
        "Validated {} link(s), {} distinct resource(s)",
        reports.len(),
        manager.cache_len().await
    );

    print_results(&reports, options.json)?;

    let broken = reports.iter().filter(|r| r.result.is_error()).count();
    Ok(if broken > 0 { 1 } else { 0 })
}

fn build_manager(options: &CheckOptions) -> Result<LinkValidatorManager> {
    let mut manager = LinkValidatorManager::with_default_validators(options.http_settings())?;

    for host in &options.exclude_hosts {
        manager.exclude_host(host)?;
    }
    for pattern in &options.exclude_patterns {
        manager.exclude_pattern(pattern)?;
    }

    Ok(manager)
}

// Prints the results either as a table or JSON
fn print_results(reports: &[LinkReport], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
    } else {
        print_table(reports);
    }
    Ok(())
}

fn print_table(reports: &[LinkReport]) {
    println!("{:<60} {:<12} {:<40} {}", "LINK", "LEVEL", "MESSAGE", "SOURCE");
    println!("{}", "=".repeat(130));

    for report in reports {
        println!(
            "{:<60} {:<12} {:<40} {}",
            truncate(&report.item.link, 57),
            format_level(report.result.level),
            truncate(&report.result.message, 37),
            report.item.source
        );
    }

    println!();
    println!("📊 Summary:");
    for level in [Level::Valid, Level::Warning, Level::Error, Level::Unknown] {
        let count = reports.iter().filter(|r| r.result.level == level).count();
        println!("   {} {}", format_level(level), count);
    }
    println!("   📋 Total: {}", reports.len());
}

fn format_level(level: Level) -> &'static str {
    match level {
        Level::Valid => "✅ VALID",
        Level::Warning => "⚠️  WARNING",
        Level::Error => "❌ ERROR",
        Level::Unknown => "❔ UNKNOWN",
    }
}

// Shortens long text for the table, on a char boundary
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}
