//! Handler functions for provision, index, and search commands.

use std::io::{self, Write};
use std::time::Duration;

use docgate_acl::{ACL_FIELDS, Confirmation, LabelGenerator, Provisioner};
use docgate_core::{DocgateConfig, Error, Result};
use docgate_index::{
    EnsureOutcome, SearchIndexDefinition, Similarity, VectorField, VectorIndexDefinition,
    ensure_search_index, wait_until_queryable,
};
use docgate_search::{AclFilter, SearchHit, Searcher, create_embedding_provider};
use docgate_store::create_store;

use crate::cli::{IndexAction, ProvisionArgs, SearchAction, SearchArgs};

// ============================================================================
// Provision
// ============================================================================

/// Handle `docgate provision`.
///
/// Always plans first and prints the dry-run summary. With `--run`, applies
/// after confirmation (`--yes` skips the prompt). A declined prompt is an
/// error, so the process exits non-zero without touching the store.
pub async fn handle_provision(config_path: Option<&str>, args: ProvisionArgs) -> Result<()> {
    let mut config = DocgateConfig::load(config_path)?;
    if let Some(min) = args.min {
        config.acl.min = min;
    }
    if let Some(max) = args.max {
        config.acl.max = max;
    }
    if let Some(batch_size) = args.batch_size {
        config.acl.batch_size = batch_size;
    }
    config.validate()?;

    let store = create_store(&config)?;
    let provisioner = Provisioner::from_config(store, &config)?;
    let range = provisioner.range();
    let mut generator = match args.seed {
        Some(seed) => LabelGenerator::seeded(range, seed),
        None => LabelGenerator::new(range),
    };

    let plan = provisioner.plan(&mut generator).await?;
    print!("{}", plan.summary());

    if !args.run {
        println!("dry run: nothing was written (pass --run to apply)");
        return Ok(());
    }

    let confirmation = if args.yes {
        Confirmation::Confirmed
    } else {
        prompt_confirmation(plan.total_documents)?
    };

    let report = provisioner.apply(plan, confirmation, &mut generator).await?;
    print!("{}", report.summary());
    Ok(())
}

/// Ask the operator to confirm the overwrite on stdin.
fn prompt_confirmation(total_documents: u64) -> Result<Confirmation> {
    print!("This will overwrite the ACL attributes of {total_documents} documents. Continue? [y/N] ");
    io::stdout()
        .flush()
        .map_err(|e| Error::io_with_path(e, "stdout"))?;

    let mut answer = String::new();
    io::stdin()
        .read_line(&mut answer)
        .map_err(|e| Error::io_with_path(e, "stdin"))?;

    Ok(parse_confirmation(&answer))
}

fn parse_confirmation(answer: &str) -> Confirmation {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Confirmation::Confirmed,
        _ => Confirmation::Declined,
    }
}

// ============================================================================
// Index
// ============================================================================

/// Handle `docgate index` subcommands.
pub async fn handle_index(config_path: Option<&str>, action: IndexAction) -> Result<()> {
    let config = DocgateConfig::load(config_path)?;
    let store = create_store(&config)?;

    match action {
        IndexAction::Create { wait, timeout } => {
            let search_def = SearchIndexDefinition::new(&config.index.search_index)
                .with_number_fields(ACL_FIELDS);
            let similarity: Similarity = config.index.similarity.parse()?;
            let vector_def = VectorIndexDefinition::new(&config.index.vector_index)
                .with_vector(VectorField::new(
                    &config.index.embedding_path,
                    config.index.embedding_dimensions,
                    similarity,
                ))
                .with_filter_fields(ACL_FIELDS);
            vector_def.validate()?;

            let outcome = ensure_search_index(
                store.as_ref(),
                search_def.name(),
                search_def.kind(),
                &search_def.to_definition(),
            )
            .await?;
            println!("search index {}: {}", search_def.name(), describe(&outcome));

            let outcome = ensure_search_index(
                store.as_ref(),
                vector_def.name(),
                vector_def.kind(),
                &vector_def.to_definition(),
            )
            .await?;
            println!("vector index {}: {}", vector_def.name(), describe(&outcome));

            if wait {
                wait_for_indexes(&config, store.as_ref(), timeout, 30).await?;
            }
        }
        IndexAction::Status => {
            let statuses = store.list_search_indexes().await?;
            if statuses.is_empty() {
                println!("no search indexes");
            }
            for status in statuses {
                println!(
                    "{} ({}): {}{}",
                    status.name,
                    status.kind,
                    status.status,
                    if status.queryable { ", queryable" } else { "" }
                );
            }
        }
        IndexAction::Wait { timeout, interval } => {
            wait_for_indexes(&config, store.as_ref(), timeout, interval).await?;
        }
    }
    Ok(())
}

fn describe(outcome: &EnsureOutcome) -> &'static str {
    match outcome {
        EnsureOutcome::Created { .. } => "submitted (build runs on the store)",
        EnsureOutcome::AlreadyExists { .. } => "already exists, skipped",
    }
}

async fn wait_for_indexes(
    config: &DocgateConfig,
    store: &dyn docgate_store::IndexAdmin,
    timeout_secs: u64,
    interval_secs: u64,
) -> Result<()> {
    let names = [
        config.index.search_index.as_str(),
        config.index.vector_index.as_str(),
    ];
    let ready = wait_until_queryable(
        store,
        &names,
        Duration::from_secs(timeout_secs),
        Duration::from_secs(interval_secs.max(1)),
    )
    .await?;

    if !ready {
        return Err(Error::store(format!(
            "indexes not queryable within {timeout_secs}s; builds continue on the store"
        )));
    }
    println!("indexes queryable: {} {}", names[0], names[1]);
    Ok(())
}

// ============================================================================
// Search
// ============================================================================

/// Handle `docgate search` subcommands.
pub async fn handle_search(config_path: Option<&str>, action: SearchAction) -> Result<()> {
    let config = DocgateConfig::load(config_path)?;
    let store = create_store(&config)?;
    let embedder = create_embedding_provider(&config)?;
    let searcher = Searcher::new(store, embedder, &config);

    let (label, args) = match &action {
        SearchAction::Text(args) => ("text", args),
        SearchAction::Vector(args) => ("vector", args),
        SearchAction::Hybrid(args) => ("hybrid", args),
    };
    let filter = build_filter(&args.acl);

    let hits = match action {
        SearchAction::Text(ref args) => searcher.text(&args.query, filter, args.limit).await?,
        SearchAction::Vector(ref args) => searcher.vector(&args.query, filter, args.limit).await?,
        SearchAction::Hybrid(ref args) => searcher.hybrid(&args.query, filter, args.limit).await?,
    };

    println!("{} {label} search results", hits.len());
    for (i, hit) in hits.iter().enumerate() {
        print_hit(i + 1, hit, &config.index.text_field);
    }
    Ok(())
}

fn build_filter(clauses: &[(String, i64)]) -> AclFilter {
    clauses
        .iter()
        .fold(AclFilter::new(), |filter, (field, value)| {
            filter.require(field, *value)
        })
}

fn print_hit(rank: usize, hit: &SearchHit, text_field: &str) {
    let id = hit.id.as_deref().unwrap_or("-");
    match hit.score {
        Some(score) => println!("{rank}. {id} (score {score:.4})"),
        None => println!("{rank}. {id}"),
    }
    if let Some(content) = hit.str_field(text_field) {
        println!("   {}", snippet(content, 200));
    }
    let labels: Vec<String> = ACL_FIELDS
        .iter()
        .filter_map(|f| hit.fields.get(*f).map(|v| format!("{f}={v}")))
        .collect();
    if !labels.is_empty() {
        println!("   {}", labels.join(" "));
    }
}

fn snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

// ============================================================================
// Tests
// ============================================================================
