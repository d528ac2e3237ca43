//! Wardprobe CLI: run the Substore page-object suite
//!
//! ## Usage
//!
//! ```bash
//! wardprobe list                                  # List test cases
//! wardprobe config --config suite.yaml            # Show resolved configuration
//! wardprobe run --config suite.yaml --report r.json
//! wardprobe run --filter requisition --headed     # Subset, visible browser
//! ```

use clap::Parser;
use std::process::ExitCode;
use wardprobe::SuiteConfig;
use wardprobe_cli::{
    init_logging, load_suite_config, Cli, CliConfig, CliError, CliResult, ColorChoice, Commands,
    ConfigArgs, ListArgs, ProgressReporter, RunArgs, SuiteReport, TestCase, Verbosity,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = build_config(&cli);
    init_logging(
        config.verbosity,
        config.log_format,
        config.color.should_color(),
    )?;

    match cli.command {
        Commands::List(args) => run_list(&args),
        Commands::Config(args) => run_config(&args),
        Commands::Run(args) => run_suite(config, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.clone().into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
        .with_log_format(cli.log_format.clone().into())
}

fn select_cases(filter: Option<&str>) -> CliResult<Vec<TestCase>> {
    let cases = TestCase::select(filter);
    if cases.is_empty() {
        return Err(CliError::invalid_argument(format!(
            "no test case matches '{}'",
            filter.unwrap_or_default()
        )));
    }
    Ok(cases)
}

fn run_list(args: &ListArgs) -> CliResult<()> {
    for case in select_cases(args.filter.as_deref())? {
        println!("{:<24} {}", case.id(), case.description());
    }
    Ok(())
}

fn run_config(args: &ConfigArgs) -> CliResult<()> {
    let suite = load_suite_config(args.config.as_deref())?;
    print!("{}", suite.to_yaml()?);
    Ok(())
}

fn run_suite(mut config: CliConfig, args: &RunArgs) -> CliResult<()> {
    config = config.with_fail_fast(args.fail_fast);
    if let Some(ref report) = args.report {
        config = config.with_report(report);
    }

    let mut suite = load_suite_config(args.config.as_deref())?;
    if args.headed {
        suite = suite.with_headless(false);
    }
    if let Some(ref dir) = args.screenshot_dir {
        suite = suite.with_screenshot_dir(dir);
    }
    let cases = select_cases(args.filter.as_deref())?;

    let reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let report = execute(&suite, &cases, reporter, config.fail_fast)?;

    if let Some(ref path) = config.report {
        report.write_json(path)?;
    }
    if report.all_passed() {
        Ok(())
    } else {
        Err(CliError::test_execution(format!(
            "{} of {} test cases failed",
            report.failed(),
            report.total()
        )))
    }
}

#[cfg(feature = "browser")]
fn execute(
    suite: &SuiteConfig,
    cases: &[TestCase],
    reporter: ProgressReporter,
    fail_fast: bool,
) -> CliResult<SuiteReport> {
    let driver = wardprobe::ChromiumDriver::launch(suite.browser.clone())?;
    let outcome = wardprobe_cli::SuiteRunner::new(&driver, suite, reporter)
        .with_fail_fast(fail_fast)
        .run(cases);
    if let Err(e) = driver.close() {
        tracing::warn!(error = %e.chain(), "Failed to close browser");
    }
    outcome
}

#[cfg(not(feature = "browser"))]
fn execute(
    _suite: &SuiteConfig,
    _cases: &[TestCase],
    _reporter: ProgressReporter,
    _fail_fast: bool,
) -> CliResult<SuiteReport> {
    Err(CliError::config(
        "built without the 'browser' feature; rebuild with --features browser",
    ))
}
