//! `growthwatch` - CLI for child growth screening
//!
//! This binary loads the growth reference table once at startup and renders
//! expected ranges and growth verdicts for the command-line user.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use growthwatch::cli::{
    AssessCommand, ClassifyCommand, Cli, Command, ConfigCommand, RangeCommand, ReferenceCommand,
};
use growthwatch::{
    init_logging, ChildProfile, Config, Gender, GrowthAssessor, GrowthClassifier, GrowthStatus,
    GrowthVerdict, ImportOutcome, RangeCalculator, ReferenceStore, ReferenceTable,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    // Config commands load (or validate) the file themselves.
    match cli.command {
        Command::Range(cmd) => handle_range(&load_config(cli.config)?, &cmd),
        Command::Classify(cmd) => handle_classify(&load_config(cli.config)?, &cmd),
        Command::Assess(cmd) => handle_assess(&load_config(cli.config)?, &cmd),
        Command::Reference(cmd) => handle_reference(&load_config(cli.config)?, cmd),
        Command::Config(cmd) => handle_config(cli.config, cmd),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    Config::load_from(path).context("failed to load configuration")
}

fn open_store(config: &Config) -> Result<ReferenceStore> {
    let path = config.database_path();
    ReferenceStore::open(&path)
        .with_context(|| format!("failed to open reference store at {}", path.display()))
}

fn load_calculator(config: &Config) -> Result<RangeCalculator> {
    let table = open_store(config)?
        .load_table()
        .context("failed to load reference table")?;
    Ok(RangeCalculator::with_z_score(table, config.growth.z_score)?)
}

/// Message shown when an age has no reference row.
fn out_of_range_message(table: &ReferenceTable, age: u32, gender: Gender) -> String {
    match table.supported_age_years(gender) {
        Some((youngest, oldest)) if (youngest..=oldest).contains(&age) => format!(
            "No {gender} reference row for month {} (age {age}). \
             The stored table has a gap there; re-import the reference file to restore it.",
            age * 12
        ),
        Some((youngest, oldest)) => format!(
            "Age {age} is outside the reference data for {gender}. \
             Please provide an age between {youngest} and {oldest} years."
        ),
        None => format!(
            "No reference data for {gender}. \
             Import a table with `growthwatch reference import --gender {gender} FILE`."
        ),
    }
}

fn print_verdict(calculator: &RangeCalculator, verdict: &GrowthVerdict, age: u32, gender: Gender) {
    if let Some(range) = verdict.range() {
        println!(
            "Expected height at age {age}: {:.2} - {:.2} cm",
            range.lower, range.upper
        );
    }
    match verdict.status {
        GrowthStatus::Normal => println!(
            "Growth is NORMAL: {:.2} cm is within the expected range.",
            verdict.predicted
        ),
        GrowthStatus::Undergrowth => println!(
            "Possible UNDERGROWTH: {:.2} cm is below the expected range. \
             Please consult a healthcare provider.",
            verdict.predicted
        ),
        GrowthStatus::Overgrowth => println!(
            "Possible OVERGROWTH: {:.2} cm is above the expected range. \
             Please consult a healthcare provider.",
            verdict.predicted
        ),
        GrowthStatus::OutOfRange => {
            println!("{}", out_of_range_message(calculator.table(), age, gender));
        }
    }
}

fn handle_range(config: &Config, cmd: &RangeCommand) -> Result<()> {
    let calculator = load_calculator(config)?;
    let gender = Gender::from(cmd.gender);
    let range = calculator.expected_range(cmd.age, gender)?;

    if cmd.json {
        let output = serde_json::json!({
            "age": cmd.age,
            "gender": gender,
            "z_score": calculator.z_score(),
            "range": range,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    match range {
        Some(range) => println!(
            "Expected height for a {}-year-old {}: {:.2} - {:.2} cm (z = \u{b1}{})",
            cmd.age,
            gender,
            range.lower,
            range.upper,
            calculator.z_score()
        ),
        None => println!("{}", out_of_range_message(calculator.table(), cmd.age, gender)),
    }
    Ok(())
}

fn handle_classify(config: &Config, cmd: &ClassifyCommand) -> Result<()> {
    let calculator = load_calculator(config)?;
    let gender = Gender::from(cmd.gender);
    let verdict = GrowthClassifier::new(&calculator).classify(cmd.height, cmd.age, gender)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        print_verdict(&calculator, &verdict, cmd.age, gender);
    }
    Ok(())
}

fn handle_assess(config: &Config, cmd: &AssessCommand) -> Result<()> {
    let calculator = load_calculator(config)?;
    let assessor = GrowthAssessor::new(&calculator, &config.estimator)
        .with_horizon(config.growth.horizon_years);

    let profile = ChildProfile {
        age_years: cmd.age,
        gender: Gender::from(cmd.gender),
        height_cm: cmd.height,
        weight_kg: cmd.weight,
    };
    let assessment = assessor.assess(&profile)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
        return Ok(());
    }

    println!("BMI: {:.1} ({})", assessment.bmi, assessment.bmi_category);
    println!("Predicted next height: {:.2} cm", assessment.predicted_height);
    print_verdict(
        &calculator,
        &assessment.verdict,
        assessment.target_age_years,
        profile.gender,
    );
    Ok(())
}

fn handle_reference(config: &Config, cmd: ReferenceCommand) -> Result<()> {
    let mut store = open_store(config)?;

    match cmd {
        ReferenceCommand::Import { gender, file } => {
            let gender = Gender::from(gender);
            let outcome = store
                .import_file(gender, &file)
                .with_context(|| format!("failed to import {}", file.display()))?;
            match outcome {
                ImportOutcome::Imported { source_id, rows } => {
                    println!("Imported {rows} {gender} rows (source #{source_id}).");
                }
                ImportOutcome::Skipped { source_id } => {
                    println!("Already imported as source #{source_id}; nothing to do.");
                }
            }
        }
        ReferenceCommand::List { gender, json } => {
            let gender = gender.map(Gender::from);
            let rows: Vec<_> = store
                .rows()?
                .into_iter()
                .filter(|row| gender.map_or(true, |g| row.gender == g))
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if rows.is_empty() {
                println!("No reference rows stored.");
            } else {
                println!("{:<8} {:>6} {:>10} {:>10} {:>10}", "Gender", "Month", "L", "M", "S");
                for row in &rows {
                    println!(
                        "{:<8} {:>6} {:>10.4} {:>10.4} {:>10.5}",
                        row.gender.as_str(),
                        row.age_months,
                        row.params.l,
                        row.params.m,
                        row.params.s
                    );
                }
            }
        }
        ReferenceCommand::Delete { gender, month, yes } => {
            let gender = Gender::from(gender);
            match month {
                Some(month) => {
                    if store.delete_month(gender, month)? {
                        println!("Deleted {gender} row for month {month}.");
                    } else {
                        println!("No {gender} row for month {month}.");
                    }
                }
                None if yes => {
                    let deleted = store.delete_gender(gender)?;
                    println!("Deleted {deleted} {gender} rows.");
                }
                None => {
                    println!("This will delete all {gender} reference rows.");
                    println!("Use --yes to confirm.");
                }
            }
        }
        ReferenceCommand::Status { json } => {
            let stats = store.stats()?;
            if json {
                let output = serde_json::json!({
                    "database_path": store.path(),
                    "stats": stats,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("growthwatch reference store");
                println!("---------------------------");
                println!("Database:      {}", store.path().display());
                println!("Male rows:     {}", stats.male_rows);
                println!("Female rows:   {}", stats.female_rows);
                println!("Imports:       {}", stats.sources);
                match stats.last_import {
                    Some(at) => println!("Last import:   {}", at.to_rfc3339()),
                    None => println!("Last import:   never"),
                }
                println!("Size:          {} bytes", stats.db_size_bytes);
            }
        }
    }
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = load_config(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Reference]");
                println!("  Database path:  {}", config.database_path().display());
                println!();
                println!("[Growth]");
                println!("  Z-score:        {}", config.growth.z_score);
                println!("  Horizon years:  {}", config.growth.horizon_years);
                println!();
                println!("[Estimator]");
                println!("  Intercept:      {}", config.estimator.intercept);
                println!("  Age:            {}", config.estimator.age);
                println!("  Height:         {}", config.estimator.height);
                println!("  Weight:         {}", config.estimator.weight);
                println!("  BMI:            {}", config.estimator.bmi);
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            validate_config_file(path)?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}

fn validate_config_file(path: PathBuf) -> Result<Config> {
    let display = path.display().to_string();
    Config::load_from(Some(path)).with_context(|| format!("invalid configuration in {display}"))
}
