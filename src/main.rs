//! IP Speed Tester - Main CLI Application
//!
//! Probes every candidate address in the input list, then writes the
//! reachable ones to the report, fastest first.

use clap::Parser;
use ip_speed_tester::{
    cli::Cli,
    config::{display_config_summary, load_config, EnvManager},
    error::{AppError, ErrorReporter, Result},
    executor::SpeedTestRunner,
    input::read_candidates,
    logging::LoggerFactory,
    output::{OutputFormatterFactory, ReportWriter},
    PKG_NAME, VERSION,
};
use std::{error::Error, process};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(99);
    }));

    let cli = Cli::parse();
    let use_color = cli.use_colors();
    let verbose = cli.verbose || cli.debug;

    if let Err(e) = run_application(cli).await {
        ErrorReporter::new(use_color, verbose).report_error(&e);

        if let Some(source) = e.source() {
            eprintln!("Caused by: {}", source);
        }

        print_error_suggestions(&e);

        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run_application(cli: Cli) -> Result<()> {
    if cli.debug {
        println!("{} v{}", PKG_NAME, VERSION);
        if let (Some(built), Some(commit)) = (option_env!("BUILD_TIME"), option_env!("GIT_COMMIT")) {
            println!("Built {} from {}", built, commit);
        }
        println!("Debug mode enabled");
        println!();
    }

    let config = load_config(cli)?;

    if config.debug {
        println!("Configuration loaded successfully:");
        println!("{}", display_config_summary(&config));
        for warning in EnvManager::validate_current_env() {
            println!("{}", warning);
        }
        println!();
    }

    let loggers = LoggerFactory::new(config.clone());
    let logger = loggers.create_logger("APP").await;
    let formatter = OutputFormatterFactory::from_config(&config);

    // Missing or empty input stops here, before the report is touched
    let list = read_candidates(&config.input_file, config.default_port)?;

    for invalid in &list.invalid {
        eprintln!("{}", formatter.format_invalid_line(invalid)?);
        logger.warn("Skipping invalid candidate line")
            .field("line", invalid.line_number)
            .field("content", &invalid.content)
            .field("reason", &invalid.reason)
            .log()
            .await;
    }

    println!("{}", formatter.format_header(&format!("{} v{}", PKG_NAME, VERSION))?);
    println!("{}", formatter.format_run_plan(&config, list.len(), list.invalid.len())?);
    println!();

    if list.is_empty() {
        println!("{}", formatter.format_warning("No valid candidates, writing an empty report")?);
    }

    let runner = SpeedTestRunner::from_config(&config, &loggers)
        .await?
        .with_formatter(OutputFormatterFactory::from_config(&config));
    let execution = runner.run(&list).await?;

    ReportWriter::from_config(&config)
        .write(&config.output_file, &execution.results)
        .await?;

    println!();
    println!("{}", formatter.format_results_table(&execution.results)?);
    println!();
    println!("{}", formatter.format_execution_summary(&execution.summary())?);
    println!();
    println!("{}", formatter.format_success(&format!(
        "{} result(s) saved to {}",
        execution.results.len(),
        config.output_file.display()
    ))?);

    logger.info("Report written")
        .field("path", config.output_file.display().to_string())
        .field("results", execution.results.len())
        .log()
        .await;

    Ok(())
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Input(_) => {
            eprintln!();
            eprintln!("Input help:");
            eprintln!("  - Create the candidate list (default: ip.txt) or pass --input FILE");
            eprintln!("  - One candidate per line: 104.16.0.1:443 # label");
            eprintln!("  - Lines starting with '#' or '-' are ignored");
        },
        AppError::Config(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Check your .env file format");
            eprintln!("  - Verify URL formats (must start with http:// or https://)");
            eprintln!("  - --connect-timeout cannot exceed --max-time");
            eprintln!("  - Run with --help to list every option");
        },
        AppError::Io(_) => {
            eprintln!();
            eprintln!("File help:");
            eprintln!("  - Check that the report directory exists and is writable");
        },
        _ => {}
    }
}
