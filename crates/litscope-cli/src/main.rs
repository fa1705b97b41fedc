use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use litscope_core::{AppConfig, CoalescedRow, ExitCode, LitscopeError, SourceKind, write_atomic, write_coalesced};
use litscope_science::cache::CitationCache;
use litscope_science::dedup::{self, DedupOptions};
use litscope_science::enrichment::{self, CitationStatus};
use litscope_science::pdf::{self, LopdfExtractor};
use litscope_science::references::{self, MatchMethod};
use litscope_science::sources::{CrossRefSource, SemanticScholarSource};
use litscope_science::tables::{self, TableMaps};
use litscope_science::ScienceError;

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "litscope",
    about = "Literature-review tooling: coalesce search exports, mine papers, render tables",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file. Defaults to $LITSCOPE_CONFIG, then ~/.config/litscope/config.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting LITSCOPE_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

/// Options shared by every command that reads the queries directory.
#[derive(Args)]
struct QueryArgs {
    /// Directory of `<SOURCE>_<query>` export files.
    #[arg(long)]
    queries: Option<PathBuf>,

    /// Drop records published before this year.
    #[arg(long)]
    min_year: Option<i32>,

    /// Source priority, e.g. `IEEE,SCP,WOS,ACM`.
    #[arg(long, value_delimiter = ',')]
    order: Option<Vec<String>>,

    /// Abort on the first malformed record.
    #[arg(long)]
    strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge all exports into one deduplicated CSV.
    Coalesce {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Look up citation counts for records with a DOI.
        #[arg(long)]
        citations: bool,
    },

    /// Report hits and duplicates without writing output.
    CountDupes {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Per-query hit counts for each source.
    CountHits {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Extract text and titles from a directory of PDFs.
    ExtractText {
        #[arg(long)]
        papers: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        titles: Option<PathBuf>,
    },

    /// Build the paper-mentions-paper matrix.
    CrossRefs {
        #[arg(long, value_enum, default_value_t = MethodArg::Exact)]
        method: MethodArg,
        #[arg(long)]
        text_dir: Option<PathBuf>,
        #[arg(long)]
        titles: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Collect CrossRef reference lists for a file of identifiers.
    DoiRefs {
        #[arg(long)]
        idents: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Render the paper/category matrix as a LaTeX table.
    CategoryTable {
        /// One row per theme, citing the papers in it.
        #[arg(long)]
        compressed: bool,
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Render the tool/feature LaTeX table from cited-tools JSON.
    ToolTable {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List tools per feature and circumstance from cited-tools JSON.
    ToolFeatures {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Print the config file path.
    Path,
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    Exact,
    Canonical,
}

impl From<MethodArg> for MatchMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Exact => MatchMethod::Exact,
            MethodArg::Canonical => MatchMethod::Canonical,
        }
    }
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let start = Instant::now();
    let cli = Cli::parse();
    let json_output = cli.json || std::env::var("LITSCOPE_JSON").as_deref() == Ok("1");

    if let Err(err) = run(cli, json_output, start).await {
        let code = exit_code(&err);
        if json_output {
            let envelope = serde_json::json!({
                "status": "error",
                "message": format!("{err:#}"),
                "meta": { "duration_ms": start.elapsed().as_millis() }
            });
            let _ = print_json(&envelope);
        } else {
            eprintln!("error: {err:#}");
        }
        std::process::exit(code as i32);
    }
}

async fn run(cli: Cli, json_output: bool, start: Instant) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let config = AppConfig::load_from(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    init_logging(&config);

    match cli.command {
        // ── Coalescing ─────────────────────────────────────────────────────

        Commands::Coalesce { query, output, citations } => {
            let (dir, order, options) = query_settings(&config, &query)?;
            let coalescer = dedup::coalesce_queries(&dir, &order, &options)?;
            let report = coalescer.report();
            let records = coalescer.into_records();

            let (counts, enrichment_report) = if citations || config.citations.enabled {
                let source = SemanticScholarSource::from_config(&config.citations)?;
                let mut cache =
                    CitationCache::load(&config.citations.cache_path, config.citations.flush_each_update)
                        .with_context(|| format!("loading cache {}", config.citations.cache_path.display()))?;
                let (statuses, enrichment_report) = enrichment::enrich(&records, &source, &mut cache).await?;
                let counts: Vec<Option<u64>> = statuses.iter().map(CitationStatus::count).collect();
                (counts, Some(enrichment_report))
            } else {
                (vec![None; records.len()], None)
            };

            let output = output.unwrap_or_else(|| config.workspace.output.clone());
            let written = write_coalesced(
                &output,
                records
                    .iter()
                    .zip(counts)
                    .map(|(record, count)| CoalescedRow::new(record, count)),
            )
            .with_context(|| format!("writing {}", output.display()))?;

            if json_output {
                print_ok(
                    serde_json::json!({
                        "report": report,
                        "citations": enrichment_report,
                        "output": output,
                        "written": written,
                    }),
                    start,
                )?;
            } else {
                println!("Removed {} duplicates", report.duplicates);
                if report.rejected > 0 {
                    println!("Skipped {} malformed records", report.rejected);
                }
                if let Some(r) = enrichment_report {
                    println!(
                        "Citations: {} cached, {} fetched, {} not found, {} failed, {} without DOI",
                        r.cached, r.fetched, r.not_found, r.failed, r.without_doi
                    );
                }
                println!("Wrote {written} records to {}", output.display());
            }
        }

        Commands::CountDupes { query } => {
            let (dir, order, options) = query_settings(&config, &query)?;
            let report = dedup::coalesce_queries(&dir, &order, &options)?.report();

            if json_output {
                print_ok(&report, start)?;
            } else {
                println!("Total hits: {}", report.hits);
                println!("Removed {} duplicates", report.duplicates);
                println!("New total hits: {}", report.retained);
            }
        }

        Commands::CountHits { query } => {
            let (dir, order, options) = query_settings(&config, &query)?;
            let sources = dedup::count_hits(&dir, &order, &options)?;

            if json_output {
                print_ok(&sources, start)?;
            } else {
                for source in &sources {
                    println!("{}:", source.source.display_name());
                    for q in &source.queries {
                        println!("  {:<30} {}", q.query_id, q.hits);
                    }
                    println!("  {:<30} {}", "total", source.total);
                    println!("---");
                }
            }
        }

        // ── Papers ─────────────────────────────────────────────────────────

        Commands::ExtractText { papers, out, titles } => {
            let papers = papers.unwrap_or_else(|| config.workspace.papers_dir.clone());
            let out = out.unwrap_or_else(|| config.workspace.text_dir.clone());
            let titles = titles.unwrap_or_else(|| config.workspace.titles.clone());
            if !papers.is_dir() {
                return Err(LitscopeError::DirectoryNotFound(papers.display().to_string()).into());
            }

            let report = pdf::extract_directory(&LopdfExtractor, &papers, &out, &titles)?;

            if json_output {
                print_ok(&report, start)?;
            } else {
                println!(
                    "Extracted {} papers into {} ({} failed)",
                    report.extracted,
                    out.display(),
                    report.failed.len()
                );
                println!("Titles written to {}", titles.display());
            }
        }

        Commands::CrossRefs { method, text_dir, titles, output } => {
            let text_dir = text_dir.unwrap_or_else(|| config.workspace.text_dir.clone());
            let titles = titles.unwrap_or_else(|| config.workspace.titles.clone());
            let output = output.unwrap_or_else(|| config.workspace.cross_references.clone());

            let matrix = references::cross_reference(&text_dir, &titles, method.into())
                .with_context(|| format!("cross-referencing titles from {}", titles.display()))?;
            matrix.write(&output)?;

            if json_output {
                print_ok(
                    serde_json::json!({
                        "papers": matrix.titles.len(),
                        "mentions": matrix.mentions(),
                        "output": output,
                    }),
                    start,
                )?;
            } else {
                println!(
                    "{} mentions among {} papers, written to {}",
                    matrix.mentions(),
                    matrix.titles.len(),
                    output.display()
                );
            }
        }

        Commands::DoiRefs { idents, output } => {
            let dois = references::read_idents(&idents)
                .with_context(|| format!("reading {}", idents.display()))?;
            let source = CrossRefSource::from_config(&config.crossref)?;
            let report = references::collect_references(&source, &dois).await;

            let body = serde_json::to_string_pretty(&report)?;
            match output {
                Some(path) => {
                    write_atomic(&path, body.as_bytes())?;
                    if json_output {
                        print_ok(
                            serde_json::json!({
                                "works": report.works.len(),
                                "failed": report.failed,
                                "output": path,
                            }),
                            start,
                        )?;
                    } else {
                        println!("Collected references of {} works into {}", report.works.len(), path.display());
                    }
                }
                None if json_output => print_ok(&report, start)?,
                None => println!("{body}"),
            }
        }

        // ── Tables ─────────────────────────────────────────────────────────

        Commands::CategoryTable { compressed, input, output } => {
            let matrix = read_input(input.as_deref())?;
            let rendered = if compressed {
                tables::category::generate_compressed(&matrix, &table_maps(&config)?)?
            } else {
                tables::category::generate(&matrix)?
            };
            write_output(output.as_deref(), &rendered)?;
        }

        Commands::ToolTable { input, output } => {
            let json = read_input(input.as_deref())?;
            let rendered = tables::tools::generate_table(
                &json,
                &table_maps(&config)?,
                u64::from(config.tables.min_tool_citations),
            )?;
            write_output(output.as_deref(), &rendered)?;
        }

        Commands::ToolFeatures { input, output } => {
            let json = read_input(input.as_deref())?;
            let rendered = tables::tools::list_features(
                &json,
                &table_maps(&config)?,
                u64::from(config.tables.min_tool_citations),
            )?;
            write_output(output.as_deref(), &rendered)?;
        }

        // ── Config ─────────────────────────────────────────────────────────

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                if json_output {
                    print_ok(&config, start)?;
                } else {
                    print!("{}", config.to_toml()?);
                }
            }
            ConfigAction::Path => {
                if json_output {
                    print_ok(
                        serde_json::json!({ "path": config_path, "exists": config_path.exists() }),
                        start,
                    )?;
                } else {
                    println!("{}", config_path.display());
                }
            }
        },
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn query_settings(config: &AppConfig, args: &QueryArgs) -> Result<(PathBuf, Vec<SourceKind>, DedupOptions)> {
    let dir = args
        .queries
        .clone()
        .unwrap_or_else(|| config.workspace.queries_dir.clone());
    let order = match &args.order {
        Some(prefixes) if prefixes.is_empty() => bail!("--order needs at least one source"),
        Some(prefixes) => SourceKind::parse_order(prefixes.as_slice())?,
        None => config.source_order()?,
    };
    let options = DedupOptions {
        min_year: args.min_year.unwrap_or(config.dedup.min_year),
        strict: args.strict || config.dedup.strict,
    };
    Ok((dir, order, options))
}

fn table_maps(config: &AppConfig) -> Result<TableMaps> {
    let maps = TableMaps::load(config.tables.maps_path.as_deref())?;
    Ok(maps.with_policy(config.tables.unmapped))
}

/// Contents of `path`, or stdin when absent or `-`.
fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => {
            std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))
        }
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            Ok(buf)
        }
    }
}

/// Write to `path` atomically, or to stdout when absent or `-`.
fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(p) if p != Path::new("-") => {
            write_atomic(p, contents.as_bytes()).with_context(|| format!("writing {}", p.display()))
        }
        _ => {
            print!("{contents}");
            Ok(())
        }
    }
}

fn print_ok(data: impl Serialize, start: Instant) -> Result<()> {
    print_json(&serde_json::json!({
        "status": "ok",
        "data": data,
        "meta": { "duration_ms": start.elapsed().as_millis() }
    }))
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> ExitCode {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<LitscopeError>() {
            return core_exit_code(e);
        }
        if let Some(e) = cause.downcast_ref::<ScienceError>() {
            return match e {
                ScienceError::Core(core) => core_exit_code(core),
                ScienceError::Http(_) | ScienceError::ApiError(..) | ScienceError::RateLimit(..) => {
                    ExitCode::NetworkError
                }
                ScienceError::NotFound(_) => ExitCode::NotFound,
                ScienceError::Io(_) => ExitCode::FileSystemError,
                ScienceError::UndefinedAlias { .. } | ScienceError::MalformedTable(_) => {
                    ExitCode::InvalidArgs
                }
                _ => ExitCode::GeneralError,
            };
        }
        if cause.downcast_ref::<std::io::Error>().is_some() {
            return ExitCode::FileSystemError;
        }
    }
    ExitCode::GeneralError
}

fn core_exit_code(err: &LitscopeError) -> ExitCode {
    match err {
        LitscopeError::DirectoryNotFound(_) => ExitCode::NotFound,
        LitscopeError::Io(_) => ExitCode::FileSystemError,
        LitscopeError::MissingField { .. }
        | LitscopeError::InvalidField { .. }
        | LitscopeError::UnknownSource(_)
        | LitscopeError::ConfigError(_) => ExitCode::InvalidArgs,
        _ => ExitCode::GeneralError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_order_flag_is_comma_separated() {
        let cli = Cli::try_parse_from(["litscope", "count-dupes", "--order", "ACM,IEEE", "--min-year", "2012"]).unwrap();
        let Commands::CountDupes { query } = cli.command else {
            panic!("expected count-dupes");
        };
        let (_, order, options) = query_settings(&AppConfig::default(), &query).unwrap();
        assert_eq!(order, vec![SourceKind::AcmDl, SourceKind::Ieee]);
        assert_eq!(options.min_year, 2012);
        assert!(!options.strict);
    }

    #[test]
    fn test_exit_code_for_missing_directory() {
        let err: anyhow::Error = ScienceError::Core(LitscopeError::DirectoryNotFound("queries".into())).into();
        assert!(matches!(exit_code(&err), ExitCode::NotFound));
        let err = anyhow::Error::from(LitscopeError::UnknownSource("DBLP".into())).context("loading config");
        assert!(matches!(exit_code(&err), ExitCode::InvalidArgs));
    }
}
