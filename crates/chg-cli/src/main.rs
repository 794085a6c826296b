//! `chg-params` command line tool
//!
//! Builds a parameter store from the environment, a defaults file and
//! command-line options, then resolves, expands or explains one query.

mod defaults;

use anyhow::{Context, Result};
use chg_filter::{Contexts, LabelExpression};
use chg_params::{
    render, ChangelogNode, ChangelogPosition, Explanation, MissingPropertyMode, ParameterStore,
    StoreConfig,
};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}

fn cli() -> Command {
    Command::new("chg-params")
        .version(chg_params::VERSION)
        .about("Resolve changelog parameters the way a migration run sees them")
        .subcommand_required(true)
        .arg(
            Arg::new("defaults-file")
                .long("defaults-file")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML or YAML defaults file"),
        )
        .arg(
            Arg::new("define")
                .short('D')
                .global(true)
                .action(ArgAction::Append)
                .value_parser(parse_key_value)
                .help("Parameter override (key=value)"),
        )
        .arg(
            Arg::new("contexts")
                .long("contexts")
                .global(true)
                .help("Active contexts, comma separated"),
        )
        .arg(
            Arg::new("labels")
                .long("labels")
                .global(true)
                .help("Label filter expression"),
        )
        .arg(
            Arg::new("database")
                .long("database")
                .global(true)
                .help("Target database short name"),
        )
        .arg(
            Arg::new("changelog")
                .long("changelog")
                .global(true)
                .action(ArgAction::Append)
                .help("Changelog logical path; repeat for includes, outermost first"),
        )
        .arg(
            Arg::new("local")
                .long("local")
                .global(true)
                .action(ArgAction::Append)
                .value_parser(parse_key_value)
                .help("Local parameter of the innermost changelog (key=value)"),
        )
        .arg(
            Arg::new("missing-property-mode")
                .long("missing-property-mode")
                .global(true)
                .value_parser(["preserve", "empty", "error"])
                .help("What expand does with unresolved placeholders"),
        )
        .arg(
            Arg::new("no-env")
                .long("no-env")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Do not read the process environment"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Output as JSON"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Write logs as JSON lines"),
        )
        .subcommand(
            Command::new("resolve")
                .about("Print the value a key resolves to")
                .arg(Arg::new("key").required(true)),
        )
        .subcommand(
            Command::new("expand")
                .about("Expand ${...} placeholders in text")
                .arg(Arg::new("text").required(true)),
        )
        .subcommand(
            Command::new("explain")
                .about("Show every candidate for a key and which one wins")
                .arg(Arg::new("key").required(true)),
        )
}

fn init_tracing(json: bool) {
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()));
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn pairs<'a>(matches: &'a ArgMatches, id: &str) -> impl Iterator<Item = (String, String)> + 'a {
    matches
        .get_many::<(String, String)>(id)
        .into_iter()
        .flatten()
        .cloned()
}

/// Store and innermost changelog described by the options
fn build_store(matches: &ArgMatches) -> Result<(ParameterStore, Option<ChangelogNode>)> {
    let defaults = matches
        .get_one::<PathBuf>("defaults-file")
        .map(|path| defaults::load(path))
        .transpose()?
        .unwrap_or_default();

    let mode = match matches.get_one::<String>("missing-property-mode") {
        Some(mode) => mode.parse::<MissingPropertyMode>()?,
        None => defaults.missing_property_mode.unwrap_or_default(),
    };
    let config = StoreConfig::new()
        .with_missing_property_mode(mode)
        .with_seed_environment(!matches.get_flag("no-env"));

    let mut builder = ParameterStore::builder().with_config(config);
    if let Some(profile) = defaults.database {
        builder = builder.with_database(profile);
    }
    let mut store = builder.build();

    // Overrides go first so they win over defaults-file entries
    store.add_overrides(pairs(matches, "define"));
    store.add_defaults_file_parameters(defaults.entries);

    if let Some(contexts) = matches.get_one::<String>("contexts") {
        store.set_contexts(Some(Contexts::parse(contexts)));
    }
    if let Some(labels) = matches.get_one::<String>("labels") {
        let labels = LabelExpression::parse(labels).context("invalid --labels expression")?;
        store.set_labels(Some(labels));
    }
    if let Some(database) = matches.get_one::<String>("database") {
        store.set_database(Some(database.clone()));
    }

    let changelog = matches
        .get_many::<String>("changelog")
        .and_then(|paths| ChangelogNode::chain(paths.cloned()));
    for (key, value) in pairs(matches, "local") {
        store
            .set_local(key, value, changelog.as_ref().map(|node| node as &dyn ChangelogPosition))
            .context("--local needs at least one --changelog")?;
    }

    tracing::debug!(
        entries = store.len(),
        changelog = changelog.as_ref().map(ChangelogNode::logical_path),
        "built parameter store"
    );
    Ok((store, changelog))
}

fn print_explanation(explanation: &Explanation) {
    if let Some(execution) = explanation.execution {
        println!("{}: execution value {execution}", explanation.key);
    }
    for (i, candidate) in explanation.candidates.iter().enumerate() {
        let marker = if explanation.winner == Some(i) {
            "*"
        } else if candidate.accepted {
            " "
        } else {
            "x"
        };
        let scope = candidate.scope.as_deref().unwrap_or("-");
        println!(
            "{marker} {:<6} {scope:<24} {} = {}  contexts[{}] labels[{}] databases[{}]",
            candidate.tier,
            candidate.key,
            render(&candidate.value),
            candidate.contexts,
            candidate.labels,
            candidate.databases,
        );
    }
    match &explanation.value {
        Some(value) => println!("=> {}", render(value)),
        None => println!("=> (absent)"),
    }
}

fn run(matches: &ArgMatches) -> Result<ExitCode> {
    let json = matches.get_flag("json");
    let (store, changelog) = build_store(matches)?;
    let position = changelog.as_ref().map(|node| node as &dyn ChangelogPosition);

    match matches.subcommand() {
        Some(("resolve", args)) => {
            let key = args.get_one::<String>("key").map_or("", String::as_str);
            let value = store.resolve(key, position);
            if json {
                println!("{}", serde_json::json!({ "key": key, "value": value.as_deref() }));
            } else if let Some(value) = &value {
                println!("{}", render(value));
            }
            if value.is_none() {
                tracing::info!(key, "parameter not set");
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(("expand", args)) => {
            let text = args.get_one::<String>("text").map_or("", String::as_str);
            match store.expand(text, position) {
                Ok(expanded) => {
                    if json {
                        println!("{}", serde_json::json!({ "text": expanded }));
                    } else {
                        println!("{expanded}");
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => {
                    eprintln!("error: {err}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Some(("explain", args)) => {
            let key = args.get_one::<String>("key").map_or("", String::as_str);
            let explanation = store.explain(key, position);
            if json {
                println!("{}", serde_json::to_string_pretty(&explanation)?);
            } else {
                print_explanation(&explanation);
            }
            Ok(ExitCode::SUCCESS)
        }
        _ => Ok(ExitCode::FAILURE),
    }
}

fn main() -> Result<ExitCode> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));
    run(&matches)
}
