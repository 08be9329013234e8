//! Web search skill backed by the Bing Web Search REST API.

use planwright_core::{
    FunctionDescriptor, FunctionRegistry, ParameterSpec, PlanwrightError, Result,
};
use serde::Deserialize;

use crate::SkillProvider;

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Web search connector settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Subscription key credential for the search service.
    pub key: String,

    /// Search endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Default number of results to return.
    #[serde(default = "default_count")]
    pub count: u8,
}

fn default_endpoint() -> String {
    "https://api.bing.microsoft.com/v7.0/search".to_string()
}

fn default_count() -> u8 {
    3
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    web_pages: Option<WebPages>,
}

#[derive(Debug, Deserialize)]
struct WebPages {
    value: Vec<WebResult>,
}

#[derive(Debug, Deserialize)]
struct WebResult {
    name: String,
    snippet: String,
}

/// Searches the web and returns the top result snippets, under the
/// `search` collection.
#[derive(Debug, Clone)]
pub struct SearchSkill {
    config: SearchConfig,
    client: reqwest::Client,
}

impl SearchSkill {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    async fn find(
        client: reqwest::Client,
        config: SearchConfig,
        query: String,
        count: u8,
    ) -> Result<String> {
        let response = client
            .get(&config.endpoint)
            .header(SUBSCRIPTION_KEY_HEADER, &config.key)
            .query(&[("q", query.as_str()), ("count", &count.to_string())])
            .send()
            .await
            .map_err(|e| PlanwrightError::skill(format!("search request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PlanwrightError::skill(format!(
                "search service returned HTTP {}",
                response.status()
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| PlanwrightError::skill(format!("invalid search response: {e}")))?;

        let results = parsed
            .web_pages
            .map(|pages| pages.value)
            .unwrap_or_default();

        Ok(results
            .iter()
            .map(|r| format!("{}: {}", r.name, r.snippet))
            .collect::<Vec<String>>()
            .join("\n"))
    }
}

impl SkillProvider for SearchSkill {
    fn register_into(&self, registry: &mut FunctionRegistry) -> Result<()> {
        let client = self.client.clone();
        let config = self.config.clone();
        let default_count = self.config.count;
        registry.register(
            FunctionDescriptor::builder()
                .collection("search")
                .name("find")
                .description("Searches the web and returns snippets of the top results.")
                .parameter(ParameterSpec::new("input", "The search query."))
                .parameter(
                    ParameterSpec::new("count", "Number of results to return.")
                        .with_default(default_count.to_string()),
                )
                .invoke(move |args| {
                    let client = client.clone();
                    let config = config.clone();
                    Box::pin(async move {
                        let query = args.require("input")?.to_string();
                        let count = args
                            .require("count")?
                            .parse::<u8>()
                            .map_err(|_| PlanwrightError::skill("count must be a number"))?;
                        Self::find(client, config, query, count).await
                    })
                })
                .build()?,
        )
    }
}
