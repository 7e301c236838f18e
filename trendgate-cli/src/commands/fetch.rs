//! One-off queries through the same cache, cooldown and retry path as the server

use super::{init_logger, load_config};
use anyhow::{anyhow, Context, Result};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use trendgate_core::config::TrendGateConfig;
use trendgate_core::fetch::{FetchError, FetchOrchestrator};
use trendgate_core::http::query::split_keywords;
use trendgate_core::provider::GoogleTrendsProvider;

fn orchestrator(config: &TrendGateConfig) -> Result<FetchOrchestrator> {
    config.validate()?;
    let provider = GoogleTrendsProvider::new(config.provider.google_settings())
        .context("Failed to create Google Trends client")?;
    Ok(FetchOrchestrator::from_config(config, Arc::new(provider)))
}

fn failure(err: FetchError) -> anyhow::Error {
    anyhow!("{} ({})", err.message, err.kind)
}

fn resolve_geo(config: &TrendGateConfig, geo: Option<&str>) -> String {
    geo.map(str::trim)
        .filter(|g| !g.is_empty())
        .unwrap_or(&config.provider.default_geo)
        .to_string()
}

pub async fn related(keyword: &str, geo: Option<&str>, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    init_logger(&config)?;
    let geo = resolve_geo(&config, geo);

    let related = orchestrator(&config)?
        .fetch_related(keyword, &geo, &config.provider.timeframe)
        .await
        .map_err(failure)?;

    let out = json!({ "query": keyword.trim(), "geo": geo, "related_queries": related });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

pub async fn interest(keywords: &str, geo: Option<&str>, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    init_logger(&config)?;
    let geo = resolve_geo(&config, geo);

    let timeline = orchestrator(&config)?
        .fetch_interest(&split_keywords(keywords), &geo, &config.provider.timeframe)
        .await
        .map_err(failure)?;

    println!("{}", serde_json::to_string_pretty(&json!({ "records": timeline.records() }))?);
    Ok(())
}
