//! Token-overlap ranking of agents against a free-text query
//!
//! Scoring is deliberately simple: a query token counts as matched when it
//! appears anywhere in the agent's lower-cased description or capability
//! tags, so `index` in a query also hits an agent advertising `indexing`.
//! Short tokens can therefore over-match; there is no minimum-length guard.

use serde::{Deserialize, Serialize};

use super::matcher;
use crate::models::AgentDescriptor;

/// Score added when all required resources are covered
pub const DEFAULT_RESOURCE_BOOST: f64 = 0.2;

/// Tunables for ranking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscoveryConfig {
    pub resource_boost: f64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            resource_boost: DEFAULT_RESOURCE_BOOST,
        }
    }
}

/// Which grant satisfied which requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMatch {
    pub requirement: String,
    pub grant: String,
}

/// A ranked candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryResult {
    pub agent: AgentDescriptor,
    pub score: f64,
    pub matched_capabilities: Vec<String>,
    #[serde(default)]
    pub matched_resources: Vec<ResourceMatch>,
}

/// Lower-case and split on anything that is not a word character
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolve every requirement against the agent's grants.
///
/// Returns `None` as soon as one requirement is left uncovered.
pub fn cover_requirements(agent: &AgentDescriptor, requirements: &[String]) -> Option<Vec<ResourceMatch>> {
    requirements
        .iter()
        .map(|req| {
            matcher::covering_grant(&agent.resources, req).map(|grant| ResourceMatch {
                requirement: req.clone(),
                grant: grant.uri.clone(),
            })
        })
        .collect()
}

/// Add the resource boost for `matched` of `total` requirements, clamped to 1.0
pub fn boosted_score(base: f64, matched: usize, total: usize, config: &DiscoveryConfig) -> f64 {
    if total == 0 {
        return base;
    }
    let boost = (matched as f64 / total as f64) * config.resource_boost;
    (base + boost).min(1.0)
}

/// Rank `candidates` for `query`.
///
/// Candidates that match no query token, or that leave any required resource
/// uncovered, are dropped. Ties keep input order. An empty query yields an
/// empty result.
pub fn discover(
    query: &str,
    candidates: &[AgentDescriptor],
    limit: Option<usize>,
    required_resources: Option<&[String]>,
    config: &DiscoveryConfig,
) -> Vec<DiscoveryResult> {
    let tokens = tokenize(query);
    if tokens.is_empty() {
        return Vec::new();
    }

    let requirements = required_resources.filter(|r| !r.is_empty());

    let mut results: Vec<DiscoveryResult> = candidates
        .iter()
        .filter_map(|agent| {
            let corpus = corpus_for(agent);
            let matched: Vec<String> = tokens
                .iter()
                .filter(|t| corpus.contains(t.as_str()))
                .cloned()
                .collect();
            if matched.is_empty() {
                return None;
            }

            let mut score = matched.len() as f64 / tokens.len() as f64;
            let mut matched_resources = Vec::new();

            if let Some(reqs) = requirements {
                matched_resources = cover_requirements(agent, reqs)?;
                score = boosted_score(score, matched_resources.len(), reqs.len(), config);
            }

            tracing::debug!(agent = %agent.name, score, matched = ?matched, "Candidate matched");

            Some(DiscoveryResult {
                agent: agent.clone(),
                score,
                matched_capabilities: matched,
                matched_resources,
            })
        })
        .collect();

    // `sort_by` is stable, so equal scores keep candidate order
    results.sort_by(|a, b| b.score.total_cmp(&a.score));

    if let Some(limit) = limit {
        results.truncate(limit);
    }

    results
}

fn corpus_for(agent: &AgentDescriptor) -> String {
    let mut corpus = agent.description.to_lowercase();
    for cap in &agent.capabilities {
        corpus.push(' ');
        corpus.push_str(&cap.to_lowercase());
    }
    corpus
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourceGrant;

    fn agent(name: &str, description: &str, caps: &[&str]) -> AgentDescriptor {
        AgentDescriptor::new(
            name,
            description,
            caps.iter().map(|c| c.to_string()).collect(),
            format!("http://localhost/{}", name),
        )
    }

    fn sample_agents() -> Vec<AgentDescriptor> {
        vec![
            agent("crawler", "Searches the web", &["search", "index"]),
            agent("reviewer", "Reviews pull requests", &["code", "review"]),
            agent("warehouse", "Data warehouse", &["data", "search"]),
        ]
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Web  Search, indexing!"), vec!["web", "search", "indexing"]);
        assert_eq!(tokenize("snake_case-token"), vec!["snake_case", "token"]);
        assert!(tokenize("  ,;  ").is_empty());
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let results = discover("", &sample_agents(), None, None, &DiscoveryConfig::default());
        assert!(results.is_empty());

        let results = discover("!!", &sample_agents(), None, None, &DiscoveryConfig::default());
        assert!(results.is_empty());
    }

    #[test]
    fn test_no_matches_returns_nothing() {
        let results = discover(
            "quantum chemistry",
            &sample_agents(),
            None,
            None,
            &DiscoveryConfig::default(),
        );
        assert!(results.is_empty());
    }

    #[test]
    fn test_search_agent_ranked_first() {
        let results = discover(
            "web search indexing",
            &sample_agents(),
            None,
            None,
            &DiscoveryConfig::default(),
        );

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].agent.name, "crawler");
        assert_eq!(results[0].matched_capabilities, vec!["web", "search"]);
        assert!((results[0].score - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(results[1].agent.name, "warehouse");
        assert!((results[1].score - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_substring_matching_tolerates_stems() {
        let agents = vec![agent("indexer", "", &["indexing"])];
        let results = discover("index", &agents, None, None, &DiscoveryConfig::default());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 1.0);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let agents = vec![
            agent("first", "", &["search"]),
            agent("second", "", &["search"]),
            agent("third", "", &["search"]),
        ];
        let results = discover("search", &agents, None, None, &DiscoveryConfig::default());
        let names: Vec<_> = results.iter().map(|r| r.agent.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_limit_truncates() {
        let results = discover("search", &sample_agents(), Some(1), None, &DiscoveryConfig::default());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].agent.name, "crawler");
    }

    #[test]
    fn test_scores_stay_in_unit_range() {
        let agents = vec![
            agent("a", "search search", &["search"]).with_resources(vec![ResourceGrant::new("/")]),
            agent("b", "code", &["review"]).with_resources(vec![ResourceGrant::new("/")]),
        ];
        let reqs = vec!["/srv".to_string()];
        let config = DiscoveryConfig { resource_boost: 5.0 };
        for result in discover("search code", &agents, None, Some(&reqs), &config) {
            assert!(result.score >= 0.0 && result.score <= 1.0);
        }
    }

    #[test]
    fn test_resource_requirements_filter_and_boost() {
        let agents = vec![
            agent("vm1-dev", "Developer", &["code"])
                .with_resources(vec![ResourceGrant::new("file://vm1/home/amit/projects/*")]),
            agent("vm2-dev", "Developer", &["code"])
                .with_resources(vec![ResourceGrant::new("file://vm2/home/amit/projects/*")]),
        ];
        let reqs = vec!["file://vm1/home/amit/projects/app".to_string()];

        let results = discover(
            "code review",
            &agents,
            None,
            Some(&reqs),
            &DiscoveryConfig::default(),
        );

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].agent.name, "vm1-dev");
        assert!((results[0].score - 0.7).abs() < 1e-9);
        assert_eq!(
            results[0].matched_resources,
            vec![ResourceMatch {
                requirement: "file://vm1/home/amit/projects/app".to_string(),
                grant: "file://vm1/home/amit/projects/*".to_string(),
            }]
        );
    }

    #[test]
    fn test_every_requirement_must_be_covered() {
        let agents = vec![agent("dev", "", &["code"])
            .with_resources(vec![ResourceGrant::new("github.com/acme/api")])];
        let reqs = vec![
            "github.com/acme/api".to_string(),
            "github.com/acme/web".to_string(),
        ];
        let results = discover("code", &agents, None, Some(&reqs), &DiscoveryConfig::default());
        assert!(results.is_empty());
    }

    #[test]
    fn test_boost_clamped_to_one() {
        let agents = vec![agent("dev", "", &["code"]).with_resources(vec![ResourceGrant::new("/")])];
        let reqs = vec!["/src".to_string()];
        let results = discover("code", &agents, None, Some(&reqs), &DiscoveryConfig::default());
        assert_eq!(results[0].score, 1.0);
    }

    #[test]
    fn test_empty_requirement_list_means_no_filter() {
        let agents = vec![agent("dev", "", &["code"])];
        let reqs: Vec<String> = Vec::new();
        let results = discover("code", &agents, None, Some(&reqs), &DiscoveryConfig::default());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 1.0);
    }

    #[test]
    fn test_boosted_score() {
        let config = DiscoveryConfig::default();
        assert!((boosted_score(0.5, 1, 2, &config) - 0.6).abs() < 1e-9);
        assert_eq!(boosted_score(0.5, 0, 0, &config), 0.5);
        assert_eq!(boosted_score(0.95, 2, 2, &config), 1.0);
    }
}
