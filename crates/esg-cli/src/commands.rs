use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use esg_cli::headers::{parse_header_list, read_csv_headers};
use esg_cli::server::{self, AppState};
use esg_cli::summary::{entity_summaries, print_entities, print_mapping};
use esg_map::{
    AliasDictionary, AliasRepository, ChatCompletionResolver, ConfidenceThresholds,
    MappingEngine, ResolverConfig,
};

use crate::cli::{EngineArgs, EntitiesArgs, MapArgs, OutputFormatArg, ServeArgs};

const BIND_VAR: &str = "ESG_HTTP_BIND";
const DEFAULT_BIND: &str = "127.0.0.1:8080";

pub async fn run_map(args: &MapArgs) -> Result<()> {
    let headers = match (&args.headers, &args.csv) {
        (Some(list), _) => parse_header_list(list),
        (None, Some(path)) => read_csv_headers(path)?,
        (None, None) => anyhow::bail!("either --headers or --csv is required"),
    };

    let base = AliasDictionary::builtin().context("load built-in aliases")?;
    let dictionary = match &args.engine.aliases_dir {
        Some(dir) => AliasRepository::new(dir)?.resolve(&args.company, &base)?,
        None => base,
    };
    let engine = build_engine(Arc::new(dictionary), &args.engine)?
        .with_thresholds(ConfidenceThresholds::new(args.high, args.suggest));

    let result = engine.auto_map(&headers, &args.entity, &args.company).await;
    match args.format {
        OutputFormatArg::Table => print_mapping(&headers, &args.entity, &result, &engine),
        OutputFormatArg::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }
    Ok(())
}

pub fn run_entities(args: &EntitiesArgs) -> Result<()> {
    let base = AliasDictionary::builtin().context("load built-in aliases")?;
    let dictionary = match (&args.company, &args.aliases_dir) {
        (Some(company), Some(dir)) => AliasRepository::new(dir)?.resolve(company, &base)?,
        _ => base,
    };
    let summaries = entity_summaries(&dictionary);
    match args.format {
        OutputFormatArg::Table => print_entities(&summaries),
        OutputFormatArg::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
    }
    Ok(())
}

pub async fn run_serve(args: &ServeArgs) -> Result<()> {
    let addr = bind_address(args.bind)?;
    let base = AliasDictionary::builtin().context("load built-in aliases")?;
    let engine = build_engine(Arc::new(base), &args.engine)?;
    let mut state = AppState::new(engine);
    if let Some(dir) = &args.engine.aliases_dir {
        let repository = AliasRepository::new(dir)?;
        info!(dir = %repository.base_dir().display(), "company alias overrides enabled");
        state = state.with_repository(repository);
    }
    server::serve(addr, state).await
}

/// Builds an engine, attaching the AI resolver when it is configured.
fn build_engine(dictionary: Arc<AliasDictionary>, args: &EngineArgs) -> Result<MappingEngine> {
    let engine = MappingEngine::new(dictionary);
    if args.no_ai {
        debug!("AI fallback disabled by flag");
        return Ok(engine);
    }
    match ResolverConfig::from_env() {
        Some(config) => {
            debug!(?config, "AI fallback enabled");
            let resolver = ChatCompletionResolver::new(config).context("build AI resolver")?;
            Ok(engine.with_resolver(Arc::new(resolver)))
        }
        None => {
            debug!("AI fallback off: no API key configured");
            Ok(engine)
        }
    }
}

fn bind_address(flag: Option<SocketAddr>) -> Result<SocketAddr> {
    if let Some(addr) = flag {
        return Ok(addr);
    }
    let value = std::env::var(BIND_VAR).unwrap_or_else(|_| DEFAULT_BIND.to_string());
    value
        .trim()
        .parse()
        .with_context(|| format!("invalid {BIND_VAR} address '{value}'"))
}
