//! Command implementations for the fathom CLI.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::cli::args::{Command, FathomArgs, IndexArgs, SearchArgs, SourceArgs};
use crate::cli::output::{output_report, output_results};
use crate::config::{PlatformConfig, load_or_bootstrap};
use crate::document::Document;
use crate::platform::SearchPlatform;
use crate::policy::{IndexPolicy, Policy, QueryPolicy};
use crate::search::{QueryCriteria, SpatialFilter};

/// Execute a CLI command.
pub fn execute_command(args: FathomArgs) -> Result<()> {
    match &args.command {
        Command::Index(index_args) => index_documents(index_args, &args),
        Command::Search(search_args) => search_documents(search_args, &args),
    }
}

fn index_documents(args: &IndexArgs, cli_args: &FathomArgs) -> Result<()> {
    let platform = load_platform(cli_args)?;
    let report = load_and_index(&platform, &args.source)?;
    output_report(&report, cli_args)
}

fn search_documents(args: &SearchArgs, cli_args: &FathomArgs) -> Result<()> {
    let platform = load_platform(cli_args)?;
    load_and_index(&platform, &args.source)?;
    let name = args.source.index_name();

    if let Some(path) = &args.query_policy {
        let document = load_or_bootstrap(
            platform.repository().as_ref(),
            QueryPolicy::DATABASE,
            &QueryPolicy::document_id(&name),
            Some(path),
            true,
        )?;
        QueryPolicy::from_document(&document)
            .with_context(|| format!("invalid query policy {}", path.display()))?;
    }

    let criteria = build_criteria(args)?;
    let results = platform.search(
        &name,
        &name,
        &criteria,
        args.suggest,
        args.start,
        args.limit,
    )?;
    output_results(&results, cli_args)
}

fn load_platform(cli_args: &FathomArgs) -> Result<SearchPlatform> {
    let config = match &cli_args.config {
        Some(path) => PlatformConfig::from_file(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => PlatformConfig::default(),
    };
    Ok(SearchPlatform::new(config)?)
}

/// Store the policy and the documents in the platform's repository, then
/// index them. The database, index and policy all share one name.
fn load_and_index(
    platform: &SearchPlatform,
    source: &SourceArgs,
) -> Result<crate::indexing::IndexReport> {
    let name = source.index_name();
    let repository = platform.repository();

    let document = load_or_bootstrap(
        repository.as_ref(),
        IndexPolicy::DATABASE,
        &IndexPolicy::document_id(&name),
        Some(&source.policy),
        true,
    )?;
    IndexPolicy::from_document(&document)
        .with_context(|| format!("invalid index policy {}", source.policy.display()))?;

    if let Err(err) = repository.create_database(&name) {
        log::debug!("create_database `{name}` failed, continuing: {err}");
    }
    let loaded = load_documents(platform, &name, &source.documents)?;
    log::info!("loaded {loaded} documents into `{name}`");

    Ok(platform.index_database(&name, true)?)
}

fn load_documents(platform: &SearchPlatform, database: &str, path: &Path) -> Result<usize> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut loaded = 0;
    for (line_number, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let json: serde_json::Value = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid JSON", path.display(), line_number + 1))?;
        let document = Document::from_json(Some(database), json)
            .with_context(|| format!("{}:{}: invalid document", path.display(), line_number + 1))?;
        platform.repository().save_document(&document, true)?;
        loaded += 1;
    }
    Ok(loaded)
}

fn build_criteria(args: &SearchArgs) -> Result<QueryCriteria> {
    let mut criteria = match &args.keywords {
        Some(keywords) => QueryCriteria::keywords(keywords.as_str()),
        None => QueryCriteria::new(),
    };
    criteria.match_all = args.all;
    criteria.score_only = args.score_only;
    criteria.detailed = args.detailed;
    criteria.owner = args.owner.clone();
    for (field, value) in &args.filters {
        criteria = criteria.filter(field.as_str(), value.as_str());
    }
    if let Some(near) = &args.near {
        let [latitude, longitude] = near.as_slice() else {
            bail!("--near takes a latitude and a longitude");
        };
        criteria = criteria.with_spatial(SpatialFilter {
            latitude: *latitude,
            longitude: *longitude,
            radius: args.radius,
            unit: Some(args.unit.into()),
        });
    }
    criteria.validate()?;
    Ok(criteria)
}
