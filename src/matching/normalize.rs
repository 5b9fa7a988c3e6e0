// src/matching/normalize.rs
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::core::CandidateRecord;

// Innermost bracket group of each style; applied repeatedly for nesting.
static BRACKET_ANNOTATION: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"\([^()]*\)|\[[^\[\]]*\]|\{[^{}]*\}|【[^【】]*】|<[^<>]*>").ok()
});

const MAX_BRACKET_PASSES: usize = 4;

/// Alias table mapping source brand spellings to one canonical brand,
/// e.g. `"라운드랩" -> "Round Lab"`. Lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrandCatalog {
    #[serde(default)]
    aliases: HashMap<String, String>,
}

impl BrandCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, A, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, C)>,
        A: AsRef<str>,
        C: Into<String>,
    {
        let mut catalog = Self::new();
        for (alias, canonical) in pairs {
            catalog.insert(alias.as_ref(), canonical);
        }
        catalog
    }

    pub fn insert(&mut self, alias: &str, canonical: impl Into<String>) {
        self.aliases
            .insert(alias.trim().to_lowercase(), canonical.into());
    }

    /// Canonical spelling for `brand`, or `brand` itself when unknown.
    pub fn resolve<'a>(&'a self, brand: &'a str) -> &'a str {
        self.aliases
            .get(&brand.trim().to_lowercase())
            .map(|s| s.as_str())
            .unwrap_or(brand)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Builds matching keys. Holds the brand catalog so that per-domain alias
/// tables are data, not code.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    catalog: BrandCatalog,
}

impl Normalizer {
    pub fn new(catalog: BrandCatalog) -> Self {
        Self { catalog }
    }

    /// Key for `{brand, display_name}`. Never panics.
    pub fn key(&self, brand: Option<&str>, display_name: &str) -> String {
        let brand_key = brand
            .map(|b| clean_text(self.catalog.resolve(b)))
            .unwrap_or_default();

        let mut name_key = clean_text(&strip_annotations(display_name));
        if name_key.is_empty() {
            // The whole name was an annotation; keep its content instead.
            name_key = clean_text(display_name);
        }

        let key = join_brand(&brand_key, &name_key);
        if key.is_empty() {
            let fallback = raw_concat(brand, display_name);
            debug!(
                "Normalization produced an empty key for {:?}; using raw fallback {:?}",
                display_name, fallback
            );
            return fallback;
        }
        key
    }

    /// Normalized brand alone, used by the secondary matcher's brand filter.
    pub fn brand_key(&self, brand: &str) -> String {
        clean_text(self.catalog.resolve(brand))
    }

    /// Cache identity: brand plus the pre-translation name.
    pub fn identity_key(&self, record: &CandidateRecord) -> String {
        let name = record
            .raw_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&record.display_name);
        self.key(record.brand.as_deref(), name)
    }

    /// Key for `{brand, display_name}` only.
    pub fn display_key(&self, record: &CandidateRecord) -> String {
        self.key(record.brand.as_deref(), &record.display_name)
    }
}

/// `Normalizer::key` without a brand catalog.
pub fn normalize(brand: Option<&str>, display_name: &str) -> String {
    Normalizer::default().key(brand, display_name)
}

fn strip_annotations(text: &str) -> String {
    let Some(re) = BRACKET_ANNOTATION.as_ref() else {
        return text.to_string();
    };
    let mut current = text.to_string();
    for _ in 0..MAX_BRACKET_PASSES {
        let next = re.replace_all(&current, " ").into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Diacritic-free, lower-cased, punctuation-free, single-spaced text.
fn clean_text(text: &str) -> String {
    // NFD splits accents off, NFC afterwards re-forms Hangul syllables.
    let folded: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .nfc()
        .collect::<String>()
        .to_lowercase();

    let spaced: String = folded
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn join_brand(brand_key: &str, name_key: &str) -> String {
    if brand_key.is_empty() {
        return name_key.to_string();
    }
    if name_key.is_empty() {
        return brand_key.to_string();
    }
    let already_prefixed = name_key == brand_key
        || name_key
            .strip_prefix(brand_key)
            .map(|rest| rest.starts_with(' '))
            .unwrap_or(false);
    if already_prefixed {
        name_key.to_string()
    } else {
        format!("{} {}", brand_key, name_key)
    }
}

fn raw_concat(brand: Option<&str>, display_name: &str) -> String {
    let brand_raw = brand.map(|b| b.trim().to_lowercase()).unwrap_or_default();
    join_brand(&brand_raw, &display_name.trim().to_lowercase())
}
