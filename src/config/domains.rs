// src/config/domains.rs
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::RankingError;
use crate::matching::fuzzy::MatcherConfig;
use crate::matching::normalize::BrandCatalog;
use crate::pipeline::enrichment::LinkTemplate;
use crate::scoring::transforms::SignalTransform;
use crate::scoring::weights::{SourceSpec, WeightTable};

/// Everything that differs between leaderboards. Pure data: tuning a domain
/// is a config change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainConfig {
    pub domain: String,
    pub weights: WeightTable,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub brands: BrandCatalog,
    /// Attach a demand band ("Hard to Book", "Queueing", "Available").
    #[serde(default)]
    pub status_bands: bool,
    #[serde(default)]
    pub link: Option<LinkTemplate>,
    /// Published leaderboard length; everything is kept when unset.
    #[serde(default)]
    pub max_items: Option<usize>,
}

impl DomainConfig {
    pub fn new(domain: &str, weights: WeightTable) -> Self {
        Self {
            domain: domain.to_string(),
            weights,
            matcher: MatcherConfig::default(),
            brands: BrandCatalog::default(),
            status_bands: false,
            link: None,
            max_items: None,
        }
    }

    pub fn validate(&self) -> Result<(), RankingError> {
        self.weights.validate().map_err(|e| match e {
            RankingError::MalformedWeightConfiguration(msg) => {
                RankingError::MalformedWeightConfiguration(format!("{}: {}", self.domain, msg))
            }
            other => other,
        })
    }
}

/// Olive Young style beauty chart: two rank signals and an editorial score.
pub fn beauty() -> DomainConfig {
    let weights = WeightTable::new(vec![
        SourceSpec::new("primary_rank", 0.4, SignalTransform::Rank { max_rank: 100 }),
        SourceSpec::new("review_rank", 0.4, SignalTransform::Rank { max_rank: 100 })
            .impute_from("primary_rank", 5.0),
        SourceSpec::new("editorial", 0.2, SignalTransform::Direct).fallback(80.0),
    ]);
    let mut config = DomainConfig::new("beauty", weights);
    config.brands = BrandCatalog::from_pairs([
        ("라운드랩", "Round Lab"),
        ("토리든", "Torriden"),
        ("아누아", "Anua"),
        ("퓌", "fwee"),
        ("메디큐브", "medicube"),
        ("닥터지", "Dr.G"),
        ("달바", "d'Alba"),
        ("에스트라", "Aestura"),
        ("조선미녀", "Beauty of Joseon"),
        ("코스알엑스", "COSRX"),
    ]);
    config.link = Some(LinkTemplate::amazon_search());
    config.max_items = Some(30);
    config
}

/// Streaming charts: views plus a hype signal, with a bonus for tentpole titles.
pub fn media() -> DomainConfig {
    let weights = WeightTable::new(vec![
        SourceSpec::new("views_rank", 0.6, SignalTransform::Rank { max_rank: 100 }),
        SourceSpec::new("hype", 0.4, SignalTransform::Direct).impute_from("views_rank", 5.0),
    ])
    .with_bonus(&["squid game", "오징어 게임"], 3.0);
    let mut config = DomainConfig::new("media", weights);
    config.max_items = Some(20);
    config
}

/// Tourism popularity with review volume and a landmark bonus.
pub fn place() -> DomainConfig {
    let weights = WeightTable::new(vec![
        SourceSpec::new("tourism_rank", 0.7, SignalTransform::Rank { max_rank: 100 }),
        SourceSpec::new("visitor_rating", 0.3, SignalTransform::Scaled { max: 5.0 })
            .impute_from("tourism_rank", 5.0),
    ])
    .with_bonus(
        &[
            "gyeongbokgung",
            "n seoul tower",
            "bukchon",
            "haeundae",
            "hallasan",
            "nami island",
            "경복궁",
            "남산서울타워",
            "북촌한옥마을",
            "해운대",
        ],
        5.0,
    );
    let mut config = DomainConfig::new("place", weights);
    config.status_bands = true;
    config.link = Some(LinkTemplate::klook_search());
    config.max_items = Some(20);
    config
}

/// NIK index: Naver saves 50%, Google hype 20%, social 20%, editorial 10%.
pub fn restaurants() -> DomainConfig {
    let weights = WeightTable::new(vec![
        SourceSpec::new("naver_saves", 0.5, SignalTransform::Ratio { ceiling: 15000.0 }),
        SourceSpec::new(
            "google_hype",
            0.2,
            SignalTransform::RatingVolume {
                max_rating: 5.0,
                cap: 10.0,
                volume_multiplier: 2.0,
                scale: 10.0,
            },
        )
        .impute_from("naver_saves", 5.0),
        SourceSpec::new("social", 0.2, SignalTransform::Direct).fallback(75.0),
        SourceSpec::new("editorial", 0.1, SignalTransform::Direct).fallback(80.0),
    ]);
    let mut config = DomainConfig::new("restaurants", weights);
    config.status_bands = true;
    config.max_items = Some(10);
    config
}

/// Convenience-store food chart.
pub fn food() -> DomainConfig {
    let weights = WeightTable::new(vec![
        SourceSpec::new("store_rank", 0.6, SignalTransform::Rank { max_rank: 100 }),
        SourceSpec::new("review_rank", 0.4, SignalTransform::Rank { max_rank: 100 })
            .impute_from("store_rank", 5.0),
    ]);
    let mut config = DomainConfig::new("food", weights);
    config.link = Some(LinkTemplate::amazon_search());
    config.max_items = Some(20);
    config
}

/// Domain name to configuration. Starts from the built-in presets; a JSON
/// file can replace presets or add new domains.
#[derive(Debug, Clone)]
pub struct DomainRegistry {
    domains: BTreeMap<String, DomainConfig>,
}

impl DomainRegistry {
    pub fn builtin() -> Self {
        let domains = [beauty(), media(), place(), restaurants(), food()]
            .into_iter()
            .map(|config| (config.domain.clone(), config))
            .collect();
        Self { domains }
    }

    /// Built-in presets overlaid with the JSON array of `DomainConfig` at `path`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut registry = Self::builtin();
        let Some(path) = path else {
            debug!("No domain config file; using built-in presets");
            return Ok(registry);
        };

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read domain config {}", path.display()))?;
        let overrides: Vec<DomainConfig> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse domain config {}", path.display()))?;
        for config in overrides {
            info!("Domain '{}' configured from {}", config.domain, path.display());
            registry.insert(config);
        }
        Ok(registry)
    }

    pub fn insert(&mut self, config: DomainConfig) {
        self.domains.insert(config.domain.clone(), config);
    }

    pub fn get(&self, domain: &str) -> Result<&DomainConfig, RankingError> {
        self.domains
            .get(domain)
            .ok_or_else(|| RankingError::UnknownDomain(domain.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.domains.keys().map(|k| k.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_builtin_presets_are_valid() {
        let registry = DomainRegistry::builtin();
        assert_eq!(
            registry.names(),
            vec!["beauty", "food", "media", "place", "restaurants"]
        );
        for name in registry.names() {
            let config = registry.get(name).unwrap();
            assert!(config.validate().is_ok(), "preset {} is invalid", name);
        }
    }

    #[test]
    fn test_unknown_domain() {
        let registry = DomainRegistry::builtin();
        assert!(matches!(
            registry.get("furniture"),
            Err(RankingError::UnknownDomain(_))
        ));
    }

    #[test]
    fn test_file_overrides_and_adds_domains() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{
                    "domain": "beauty",
                    "weights": {{
                        "sources": [
                            {{"name": "primary_rank", "weight": 1.0, "transform": {{"kind": "rank", "maxRank": 50}}}}
                        ]
                    }},
                    "matcher": {{"rankWindow": 5}},
                    "maxItems": 10
                }},
                {{
                    "domain": "books",
                    "weights": {{
                        "sources": [
                            {{"name": "sales", "weight": 0.5, "transform": {{"kind": "direct"}}}},
                            {{"name": "reviews", "weight": 0.4, "transform": {{"kind": "direct"}}}}
                        ]
                    }}
                }}
            ]"#
        )
        .unwrap();

        let registry = DomainRegistry::load(Some(file.path())).unwrap();
        let beauty = registry.get("beauty").unwrap();
        assert_eq!(beauty.matcher.rank_window, 5);
        assert_eq!(beauty.matcher.min_shared_tokens, 2);
        assert_eq!(beauty.max_items, Some(10));
        assert!(beauty.brands.is_empty());

        // Loads fine, but its weights sum to 0.9.
        let books = registry.get("books").unwrap();
        let err = books.validate().unwrap_err();
        assert!(err.to_string().contains("books"));
        assert!(err.is_fatal_before_persist());

        assert!(registry.get("media").is_ok());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(DomainRegistry::load(Some(Path::new("/nonexistent/domains.json"))).is_err());
        assert!(DomainRegistry::load(None).is_ok());
    }
}
