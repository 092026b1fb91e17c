// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Alpha Policy Engine CLI
//!
//! A command-line interface for classifying URLs against a rule-set file.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, FixedOffset, Utc};
use clap::{Parser, Subcommand};

use alpha_policy_engine::policy::{ClassifyContext, DecisionEngine, RuleSetConfig};

#[derive(Parser)]
#[command(name = "alpha-policy", version, about = "Alpha Policy Engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify a URL and print the decision as JSON
    Classify {
        /// Path to the rule-set YAML file
        #[arg(short, long)]
        rules: PathBuf,
        /// Evaluation instant (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<String>,
        /// Override the domain derived from the URL
        #[arg(long)]
        domain: Option<String>,
        url: String,
    },
    /// Check that a rule-set file is valid
    Check {
        #[arg(short, long)]
        rules: PathBuf,
    },
    /// Classify URLs read from stdin, one per line
    Repl {
        #[arg(short, long)]
        rules: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Classify {
            rules,
            at,
            domain,
            url,
        } => run_classify(&rules, at.as_deref(), domain, &url),
        Command::Check { rules } => run_check(&rules),
        Command::Repl { rules } => run_repl(&rules),
    }
}

fn load_engine(rules_path: &Path) -> Result<DecisionEngine, String> {
    let yaml = fs::read_to_string(rules_path)
        .map_err(|e| format!("Failed to read rules file: {}", e))?;

    RuleSetConfig::from_yaml(&yaml)
        .map(DecisionEngine::from_config)
        .map_err(|e| format!("Failed to parse rules: {}", e))
}

fn parse_instant(at: Option<&str>) -> Result<DateTime<FixedOffset>, String> {
    match at {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map_err(|e| format!("Invalid --at timestamp '{}': {}", raw, e)),
        None => Ok(Utc::now().fixed_offset()),
    }
}

fn run_classify(rules: &Path, at: Option<&str>, domain: Option<String>, url: &str) -> ExitCode {
    let engine = match load_engine(rules) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let now = match parse_instant(at) {
        Ok(now) => now,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut ctx = ClassifyContext::at(now);
    if let Some(domain) = domain {
        ctx = ctx.with_domain_hint(domain);
    }

    let decision = engine.classify(url, &ctx);
    match serde_json::to_string_pretty(&decision) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to encode decision: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_check(rules: &Path) -> ExitCode {
    match load_engine(rules) {
        Ok(engine) => {
            let invalid = engine.invalid_rules();
            if invalid.is_empty() {
                println!("OK: Rule file is valid ({} active rules)", engine.rule_count());
                ExitCode::SUCCESS
            } else {
                eprintln!(
                    "INVALID: {} regex rule(s) will never match: {}",
                    invalid.len(),
                    invalid.join(", ")
                );
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_repl(rules: &Path) -> ExitCode {
    let engine = match load_engine(rules) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Alpha Policy Engine REPL");
    println!("Loaded {} active rules", engine.rule_count());
    println!("Enter URLs, or 'quit' to exit.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line == "quit" || line == "exit" {
            break;
        }

        let decision = engine.classify(line, &ClassifyContext::utc(Utc::now()));
        match decision.matched_pattern() {
            Some(pattern) => println!(
                "{} ({}) [{}]",
                decision.category, decision.reason, pattern
            ),
            None => println!("{} ({})", decision.category, decision.reason),
        }
    }

    ExitCode::SUCCESS
}
