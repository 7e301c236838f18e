//! Scripted provider shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use trendgate_core::provider::{
    InterestPoint, InterestTimeline, ProviderError, RankedQuery, RelatedQueries, TrendsProvider,
};

/// Plays back queued related-query answers, then a default one
///
/// Every call is timestamped with tokio's clock, so paused-time tests can
/// check the spacing between attempts exactly.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<RelatedQueries, ProviderError>>>,
    calls: Mutex<Vec<(String, Instant)>>,
    latency: Duration,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self { script: Mutex::new(VecDeque::new()), calls: Mutex::new(Vec::new()), latency: Duration::ZERO }
    }

    /// Queue answers for the next calls, in order
    pub fn with_script(
        self,
        answers: impl IntoIterator<Item = Result<RelatedQueries, ProviderError>>,
    ) -> Self {
        self.script.lock().unwrap().extend(answers);
        self
    }

    /// Simulated network time per call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }

    pub fn called_with(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(keyword, _)| keyword.clone()).collect()
    }

    fn record(&self, keyword: &str) {
        self.calls.lock().unwrap().push((keyword.to_string(), Instant::now()));
    }
}

/// Default answer: one top query derived from the keyword
pub fn related_for(keyword: &str) -> RelatedQueries {
    RelatedQueries {
        top: vec![RankedQuery::new(format!("{} repair", keyword), 100)],
        rising: vec![RankedQuery::new(format!("{} cost", keyword), 250)],
    }
}

#[async_trait::async_trait]
impl TrendsProvider for ScriptedProvider {
    async fn related_queries(
        &self,
        keyword: &str,
        _geo: &str,
        _timeframe: &str,
    ) -> Result<RelatedQueries, ProviderError> {
        self.record(keyword);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if keyword == "zzznoresult" {
            return Ok(RelatedQueries::default());
        }

        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(related_for(keyword)))
    }

    async fn interest_over_time(
        &self,
        keywords: &[String],
        _geo: &str,
        _timeframe: &str,
    ) -> Result<InterestTimeline, ProviderError> {
        self.record(&keywords.join(","));
        Ok(InterestTimeline {
            keywords: keywords.to_vec(),
            points: vec![
                InterestPoint {
                    date: chrono::NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
                    values: vec![40; keywords.len()],
                    is_partial: false,
                },
                InterestPoint {
                    date: chrono::NaiveDate::from_ymd_opt(2024, 1, 14).unwrap(),
                    values: vec![60; keywords.len()],
                    is_partial: true,
                },
            ],
        })
    }
}
