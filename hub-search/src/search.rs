use serde::Serialize;
use std::collections::HashMap;

use crate::search_data::{Hub, HubDataset, HubIdx, HubKind};

/// Broad country queries ("China", "美国") stop collecting after this many
/// country-tier hits so a single keystroke can't enumerate half the dataset
pub const COUNTRY_TIER_LIMIT: usize = 100;

/// Which tier produced a match, strongest first. Results are ordered by
/// tier, and the controller uses `ExactCode` to decide the active tab.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Clone, Copy, Serialize)]
pub enum MatchReason {
    ExactCode,
    PrefixCode,
    City,
    Country,
    Other,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'d> {
    /// Position in the dataset, lets owners of the dataset keep results
    /// without holding the borrow
    pub idx: HubIdx,
    pub hub: &'d Hub,
    pub reason: MatchReason,
}

/// Static side-table bridging scripts: English city keys to their localized
/// names, plus localized display names for hub codes that lack a `name_zh`
/// of their own. Loaded once alongside the dataset, read-only.
#[derive(Debug, Default)]
pub struct CityNames {
    cities: HashMap<String, String>,
    hubs_by_code: HashMap<String, String>,
}

impl CityNames {
    pub fn new(
        cities: HashMap<String, String>,
        hubs_by_code: HashMap<String, String>,
    ) -> CityNames {
        let cities = cities
            .into_iter()
            .map(|(key, localized)| (key.to_lowercase(), localized))
            .collect();
        CityNames {
            cities,
            hubs_by_code,
        }
    }

    /// Localized name for an English city key, `None` when the table
    /// doesn't know the city
    pub fn localized_city(&self, english: &str) -> Option<&str> {
        self.cities.get(&english.to_lowercase()).map(String::as_str)
    }

    pub fn localized_hub_name(&self, code: &str) -> Option<&str> {
        self.hubs_by_code.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cities.len() + self.hubs_by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty() && self.hubs_by_code.is_empty()
    }
}

/// Ranks hubs against a free-text query.
///
/// Every candidate lands in at most one tier, the strongest that accepts
/// it: exact code, code prefix, city, country (capped), then substring
/// anywhere. Tiers concatenate in that order and dataset order is kept
/// within a tier, so results are deterministic for a given dataset.
/// An empty or whitespace query returns no hits, the caller shows its
/// browsing view instead. Mixed-script queries are bridged through the
/// `CityNames` side-table.
pub fn search<'d>(
    dataset: &'d HubDataset,
    query: &str,
    filter: Option<HubKind>,
    names: &CityNames,
) -> Vec<SearchHit<'d>> {
    let q = query.trim();
    if q.is_empty() {
        return Vec::new();
    }
    let q_code = q.to_uppercase();
    let q_text = q.to_lowercase();

    let mut exact = Vec::new();
    let mut prefix = Vec::new();
    let mut city = Vec::new();
    let mut country = Vec::new();
    let mut other = Vec::new();

    for (idx, hub) in dataset.iter().enumerate() {
        if let Some(kind) = filter {
            if hub.kind != kind {
                continue;
            }
        }
        let hit = |reason| SearchHit {
            idx: idx as HubIdx,
            hub,
            reason,
        };
        if hub.code == q_code || hub.icao.as_deref() == Some(q_code.as_str()) {
            exact.push(hit(MatchReason::ExactCode));
        } else if hub.code.starts_with(&q_code) {
            prefix.push(hit(MatchReason::PrefixCode));
        } else if city_matches(hub, q, &q_text, names) {
            city.push(hit(MatchReason::City));
        } else if hub.country.to_lowercase().contains(&q_text) {
            // over-cap country matches are dropped, not demoted: the tier
            // already accepted them and tiers are exclusive
            if country.len() < COUNTRY_TIER_LIMIT {
                country.push(hit(MatchReason::Country));
            }
        } else if substring_matches(hub, q, &q_text, names) {
            other.push(hit(MatchReason::Other));
        }
    }

    let mut out = exact;
    out.extend(prefix);
    out.extend(city);
    out.extend(country);
    out.extend(other);
    out
}

/// City tier: the hub's own city equals or extends the query, or the query
/// is written in the city's localized name, resolved through the
/// side-table back to the English city key.
fn city_matches(hub: &Hub, q: &str, q_text: &str, names: &CityNames) -> bool {
    let hub_city = hub.city.to_lowercase();
    if hub_city == q_text || hub_city.starts_with(q_text) {
        return true;
    }
    if let Some(localized) = names.localized_city(&hub_city) {
        if localized == q || localized.starts_with(q) || localized.contains(q) {
            return true;
        }
    }
    false
}

fn substring_matches(hub: &Hub, q: &str, q_text: &str, names: &CityNames) -> bool {
    if hub.name.to_lowercase().contains(q_text) || hub.city.to_lowercase().contains(q_text) {
        return true;
    }
    if let Some(name_zh) = &hub.name_zh {
        if name_zh.contains(q) {
            return true;
        }
    }
    names
        .localized_hub_name(&hub.code)
        .map_or(false, |localized| localized.contains(q))
}
