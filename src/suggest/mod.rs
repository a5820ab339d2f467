//! LLM-backed feature suggestions
//!
//! The crate never talks to a provider itself. Callers plug a
//! [`SuggestionClient`] in; [`FeatureSuggestor`] builds the prompts from a
//! [`TableSummary`] and parses whatever comes back as best it can. Client
//! failures are logged and produce empty results.

mod client;
mod summary;

pub use client::{
    resolve_api_key, CredentialSource, EnvCredentials, ProviderKind, StaticClient, SuggestionClient,
    SuggestionRequest,
};
pub use summary::{ColumnInfo, ColumnSummary, NumericSummary, TableSummary, ValueCounts};

use crate::config::TaskType;
use crate::error::FeatureError;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

const FEATURE_SYSTEM_PROMPT: &str =
    "You are a feature engineering expert. Suggest creative, impactful features based on domain knowledge.";
const ANALYSIS_SYSTEM_PROMPT: &str =
    "You are an expert ML engineer. Analyze data and provide actionable preprocessing recommendations.";
const FIX_SYSTEM_PROMPT: &str = "You are an expert data scientist specializing in data preprocessing \
     and cleaning for machine learning. Provide concise, actionable recommendations.";
const EXPLAIN_SYSTEM_PROMPT: &str = "You are explaining data preprocessing steps to a non-technical \
     audience. Be clear, concise, and explain why each step matters.";

/// Data quality problem a fix is requested for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    #[default]
    Missing,
    Outlier,
    Imbalance,
    Duplicates,
}

impl IssueType {
    pub fn name(&self) -> &'static str {
        match self {
            IssueType::Missing => "missing",
            IssueType::Outlier => "outlier",
            IssueType::Imbalance => "imbalance",
            IssueType::Duplicates => "duplicates",
        }
    }
}

impl FromStr for IssueType {
    type Err = FeatureError;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "missing" => Ok(IssueType::Missing),
            "outlier" | "outliers" => Ok(IssueType::Outlier),
            "imbalance" => Ok(IssueType::Imbalance),
            "duplicates" => Ok(IssueType::Duplicates),
            other => Err(FeatureError::invalid_parameter(
                "issue_type",
                other,
                "expected one of missing, outlier, imbalance, duplicates",
            )),
        }
    }
}

/// One suggested feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureSuggestion {
    Structured {
        name: String,
        #[serde(default)]
        method: String,
        #[serde(default)]
        impact: String,
    },
    /// Response text that could not be read as a suggestion list
    Raw(String),
}

/// Prompt builder and response parser around a [`SuggestionClient`]
pub struct FeatureSuggestor<C: SuggestionClient> {
    client: C,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl<C: SuggestionClient> FeatureSuggestor<C> {
    /// Use the provider's default model
    pub fn new(client: C) -> Self {
        let model = client.provider().default_model().to_string();
        Self {
            client,
            model,
            temperature: 0.7,
            max_tokens: 500,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask for 5-10 new features. Empty on any failure.
    pub fn suggest_features(&self, df: &DataFrame, task: TaskType, target: Option<&str>) -> Vec<FeatureSuggestion> {
        let Some(summary) = self.summarize(df, target) else {
            return Vec::new();
        };

        let prompt = format!(
            "Suggest feature engineering strategies for this dataset:\n\n\
             Task: {}\nColumns: {:?}\nSummary: {}\n\n\
             Suggest 5-10 new features to create, including:\n\
             - Feature name\n- Calculation/creation method\n- Expected impact on model performance\n\n\
             Return as a JSON array of objects with keys: name, method, impact\n",
            task_name(task),
            summary.column_names(),
            pretty(&summary),
        );

        match self.complete(prompt, FEATURE_SYSTEM_PROMPT) {
            Some(text) => parse_suggestions(&text),
            None => Vec::new(),
        }
    }

    /// Ask for a structured analysis of the table. An empty object on failure.
    pub fn analyze(&self, df: &DataFrame, task: TaskType, target: Option<&str>) -> Value {
        let empty = Value::Object(serde_json::Map::new());
        let Some(summary) = self.summarize(df, target) else {
            return empty;
        };

        let prompt = format!(
            "Analyze this dataset for a {} task and recommend preprocessing steps.\n\n\
             Dataset summary:\n{}\n\n\
             Return a JSON object with keys: data_quality, preprocessing_steps, feature_engineering, warnings\n",
            task_name(task),
            pretty(&summary),
        );

        match self.complete(prompt, ANALYSIS_SYSTEM_PROMPT) {
            Some(text) => parse_analysis(&text),
            None => empty,
        }
    }

    /// Cleaning recommendations for `issue`, scoped to `column` when it exists
    /// in `df`. Empty on any failure.
    pub fn suggest_fix(&self, df: &DataFrame, column: Option<&str>, issue: IssueType) -> String {
        let context = match column.filter(|c| df.column(c).is_ok()) {
            Some(c) => ColumnInfo::from_frame(df, c)
                .map_err(|e| tracing::warn!(column = c, error = %e, "Could not describe column"))
                .ok()
                .and_then(|info| serde_json::to_string_pretty(&info).ok()),
            None => {
                if let Some(c) = column {
                    tracing::debug!(column = c, "Column not in table, describing whole table");
                }
                self.summarize(df, None).map(|summary| pretty(&summary))
            }
        };
        let Some(context) = context else {
            return String::new();
        };

        let prompt = format!(
            "Analyze this data quality issue and provide specific preprocessing recommendations:\n\n\
             Issue Type: {}\nColumn: {}\n\nData Characteristics:\n{}\n\n\
             Provide:\n1. Root cause analysis of the issue\n\
             2. 2-3 specific preprocessing strategies (with pros/cons)\n\
             3. Recommended approach with rationale\n4. Code snippet example if applicable\n\n\
             Keep response concise and actionable (max 300 words).\n",
            issue.name(),
            column.unwrap_or("Multiple columns"),
            context,
        );

        self.complete(prompt, FIX_SYSTEM_PROMPT).unwrap_or_default()
    }

    /// Plain-language explanation of a cleaning step. Empty on any failure.
    pub fn explain_cleaning_step(&self, action: &str, details: &Value, context: Option<&Value>) -> String {
        let render = |v: &Value| serde_json::to_string_pretty(v).unwrap_or_default();
        let prompt = format!(
            "Explain this data preprocessing step in simple terms:\n\n\
             Action: {}\nDetails: {}\nContext: {}\n\n\
             Provide:\n1. What was done (1 sentence)\n2. Why it was necessary (1 sentence)\n\
             3. Impact on the data (1 sentence)\n\n\
             Total: max 3 sentences, non-technical language.\n",
            action,
            render(details),
            context.map(render).unwrap_or_else(|| "Not provided".to_string()),
        );

        self.complete(prompt, EXPLAIN_SYSTEM_PROMPT).unwrap_or_default()
    }

    fn summarize(&self, df: &DataFrame, target: Option<&str>) -> Option<TableSummary> {
        TableSummary::from_frame(df, target)
            .map_err(|e| tracing::warn!(error = %e, "Could not summarize table for suggestions"))
            .ok()
    }

    fn complete(&self, prompt: String, system: &str) -> Option<String> {
        let request = SuggestionRequest::new(prompt, self.model.clone())
            .with_system(system.to_string())
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        match self.client.complete(&request) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(
                    provider = self.client.provider().name(),
                    model = %self.model,
                    error = %e,
                    "Suggestion request failed"
                );
                None
            }
        }
    }
}

fn task_name(task: TaskType) -> &'static str {
    match task {
        TaskType::Classification => "classification",
        TaskType::Regression => "regression",
    }
}

fn pretty(summary: &TableSummary) -> String {
    serde_json::to_string_pretty(summary).unwrap_or_default()
}

/// Body of the first ```json fence, or the whole text
fn extract_json(text: &str) -> &str {
    const FENCE: &str = "```json";
    match text.find(FENCE) {
        Some(start) => {
            let body = &text[start + FENCE.len()..];
            let end = body.find("```").unwrap_or(body.len());
            body[..end].trim()
        }
        None => text.trim(),
    }
}

/// A JSON array of suggestion objects, otherwise the whole text as one raw entry
pub fn parse_suggestions(text: &str) -> Vec<FeatureSuggestion> {
    match serde_json::from_str::<Value>(extract_json(text)) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .map(|item| {
                serde_json::from_value::<FeatureSuggestion>(item.clone()).unwrap_or_else(|_| match item {
                    Value::String(s) => FeatureSuggestion::Raw(s),
                    other => FeatureSuggestion::Raw(other.to_string()),
                })
            })
            .collect(),
        _ => vec![FeatureSuggestion::Raw(text.to_string())],
    }
}

/// A JSON value, otherwise `{"raw_response": text}`
pub fn parse_analysis(text: &str) -> Value {
    serde_json::from_str(extract_json(text)).unwrap_or_else(|_| serde_json::json!({ "raw_response": text }))
}
