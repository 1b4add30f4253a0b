use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fipsscan::analysis::compliance;
use fipsscan::config::Config;
use fipsscan::output::OutputFormat;
use fipsscan::rules::Severity;
use fipsscan::{ScanOptions, CONFIG_FILE};

#[derive(Parser)]
#[command(
    name = "fipsscan",
    about = "FIPS compliance scanner for crypto API usage",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a program model for crypto API usage
    Scan {
        /// Program model file or directory of *.program.json files
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Rule file (YAML or TOML); overrides the config and built-in rules
        #[arg(long, short = 'r')]
        rules: Option<PathBuf>,

        /// Config file path
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Output format (console, json, html, sarif)
        #[arg(long, short = 'f', default_value = "console")]
        format: String,

        /// Minimum severity to fail (info, low, medium, high, critical)
        #[arg(long)]
        fail_on: Option<String>,

        /// Write output to file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// List the active rules
    ListRules {
        /// Rule file to list instead of the built-in rules
        #[arg(long, short = 'r')]
        rules: Option<PathBuf>,

        /// Output format (table, json)
        #[arg(long, short = 'f', default_value = "table")]
        format: String,
    },

    /// Generate a starter .fipsscan.toml config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scan {
            path,
            rules,
            config,
            format,
            fail_on,
            output,
        } => cmd_scan(path, rules, config, format, fail_on, output),
        Commands::ListRules { rules, format } => cmd_list_rules(rules, format),
        Commands::Init { force } => cmd_init(force),
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn cmd_scan(
    path: PathBuf,
    rules: Option<PathBuf>,
    config: Option<PathBuf>,
    format_str: String,
    fail_on_str: Option<String>,
    output_path: Option<PathBuf>,
) -> Result<i32, fipsscan::error::ScanError> {
    let format = OutputFormat::from_str_lenient(&format_str).unwrap_or_else(|| {
        eprintln!("Warning: unknown format '{}', using console", format_str);
        OutputFormat::Console
    });

    let fail_on = fail_on_str.and_then(|s| {
        let sev = Severity::from_str_lenient(&s);
        if sev.is_none() {
            eprintln!("Warning: unknown severity '{}', using config default", s);
        }
        sev
    });

    let options = ScanOptions {
        config_path: config,
        rules_path: rules,
        format,
        fail_on_override: fail_on,
    };

    let report = fipsscan::scan(&path, &options)?;
    let rendered = fipsscan::render_report(&report, format)?;

    match output_path {
        Some(out) => std::fs::write(&out, &rendered)?,
        None => print!("{}", rendered),
    }

    // Exit code: 0 = pass, 1 = non-compliant findings at or above threshold
    Ok(if report.verdict.pass { 0 } else { 1 })
}

fn cmd_list_rules(
    rules_path: Option<PathBuf>,
    format_str: String,
) -> Result<i32, fipsscan::error::ScanError> {
    let rules = fipsscan::load_rules(rules_path.as_deref())?;

    match format_str.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&rules)?;
            println!("{}", json);
        }
        _ => {
            println!(
                "{:<10} {:<18} {:<9} {:<5} {:<5} API",
                "ID", "CATEGORY", "SEVERITY", "ALG", "PROV"
            );
            println!("{}", "-".repeat(90));
            for rule in rules.rules() {
                println!(
                    "{:<10} {:<18} {:<9} {:<5} {:<5} {}",
                    rule.id,
                    rule.category,
                    rule.severity.to_string(),
                    rule.algorithm_arg_index,
                    rule.provider_arg_index
                        .map(|i| i.to_string())
                        .unwrap_or_else(|| "-".into()),
                    rule.api(),
                );
            }
            println!();
            println!("FIPS providers: {}", compliance::fips_providers().join(", "));
        }
    }

    Ok(0)
}

fn cmd_init(force: bool) -> Result<i32, fipsscan::error::ScanError> {
    let path = PathBuf::from(CONFIG_FILE);

    if path.exists() && !force {
        eprintln!("{CONFIG_FILE} already exists. Use --force to overwrite.");
        return Ok(1);
    }

    std::fs::write(&path, Config::starter_toml())?;
    println!("Created {CONFIG_FILE}");

    Ok(0)
}
