use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Position of a hub within the dataset's load order, used by indexes which
/// need a `Copy` key back into the dataset
pub type HubIdx = u32;

/// Stable identifier assigned at load time, formatted `<kind>:<n>` where n
/// counts records of that kind in source order. Reloading the same sources
/// produces the same ids.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Clone, Serialize, Deserialize)]
pub struct HubId(String);

impl HubId {
    pub(crate) fn assign(kind: HubKind, n: u32) -> HubId {
        HubId(format!("{}:{}", kind, n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HubId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum HubKind {
    Airport,
    Port,
    Warehouse,
}

impl fmt::Display for HubKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Airport => "airport",
            Self::Port => "port",
            Self::Warehouse => "warehouse",
        })
    }
}

/// Who operates a warehouse, from the `type` field of warehouses.json
#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarehouseCategory {
    PartnerFulfillment,
    RetailerFulfillment,
    FreightForwarder,
}

/// A located point of interest on the map: an airport, a seaport or an
/// overseas warehouse. The kind-specific optional fields are resolved at the
/// load boundary, nothing downstream checks whether a field "exists".
#[derive(Serialize, Deserialize, Clone)]
pub struct Hub {
    pub id: HubId,
    pub kind: HubKind,
    /// IATA code for airports, UN/LOCODE for ports, operator code for
    /// warehouses. Not guaranteed unique, see `HubDataset::find_by_code`.
    pub code: String,
    /// ICAO alias code, airports only
    pub icao: Option<String>,
    pub name: String,
    pub name_zh: Option<String>,
    pub city: String,
    /// May be a bare country code or a mixed "code localized-name" string,
    /// matching treats it as free text
    pub country: String,
    /// (lng, lat) in decimal degrees, validated before the hub is built
    pub location: geo::Point<f64>,
    pub is_international: bool,
    /// Warehouses only
    pub category: Option<WarehouseCategory>,
    pub state: Option<String>,
    pub address: Option<String>,
}

impl fmt::Debug for Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}{}]",
            self.code,
            self.name,
            self.id,
            if self.is_international { "*" } else { "" }
        )
    }
}

impl PartialEq for Hub {
    fn eq(&self, rhs: &Self) -> bool {
        self.id == rhs.id
    }
}

impl Eq for Hub {}

impl Hub {
    /// Ranking weight for suggestion lists, international gateways come
    /// before domestic hubs. Dataset order breaks ties as the sources are
    /// pre-sorted by cargo throughput upstream.
    pub fn importance(&self) -> usize {
        if self.is_international {
            1
        } else {
            0
        }
    }
}

/// The in-memory hub collection
/// * loaded once at startup from the static JSON sources
/// * append-only while loading, never mutated afterwards
/// * insert order is preserved and is the tie-break order for search and
///   nearest-hub ranking
/// * shared read-only by every consumer, the search-state controller owns it
#[derive(Serialize, Deserialize)]
pub struct HubDataset {
    hubs: Vec<Hub>,
    /// first occupant of a (kind, code) slot wins, duplicates stay
    /// reachable through iteration only
    by_code: HashMap<(HubKind, String), HubIdx>,
}

impl HubDataset {
    pub fn builder() -> Builder {
        Builder {
            data: HubDataset {
                hubs: Vec::new(),
                by_code: HashMap::new(),
            },
            kind_counts: HashMap::new(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hub> {
        self.hubs.iter()
    }

    pub fn of_kind(&self, kind: HubKind) -> impl Iterator<Item = &Hub> {
        self.hubs.iter().filter(move |hub| hub.kind == kind)
    }

    pub fn hub_at(&self, idx: HubIdx) -> Option<&Hub> {
        self.hubs.get(idx as usize)
    }

    pub fn get(&self, id: &HubId) -> Option<&Hub> {
        self.hubs.iter().find(|hub| &hub.id == id)
    }

    /// Earliest-loaded hub of the kind carrying this code. Sources are not
    /// deduplicated, a code claimed by two records resolves to the first.
    pub fn find_by_code(&self, kind: HubKind, code: &str) -> Option<&Hub> {
        let idx = *self.by_code.get(&(kind, code.to_uppercase()))?;
        self.hub_at(idx)
    }

    pub fn len(&self) -> usize {
        self.hubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hubs.is_empty()
    }

    pub fn stats(&self) -> DatasetStats {
        let mut stats = DatasetStats::default();
        for hub in &self.hubs {
            match hub.kind {
                HubKind::Airport => stats.airports += 1,
                HubKind::Port => stats.ports += 1,
                HubKind::Warehouse => stats.warehouses += 1,
            }
        }
        stats
    }
}

#[derive(Debug, Default, Eq, PartialEq)]
pub struct DatasetStats {
    pub airports: usize,
    pub ports: usize,
    pub warehouses: usize,
}

impl fmt::Display for DatasetStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} airports, {} ports, {} warehouses",
            self.airports, self.ports, self.warehouses
        )
    }
}

/// Assembles a `HubDataset` during the one-off load, assigning ids and
/// rejecting records whose coordinates are invalid. Dropped records are the
/// caller's to log, the builder never panics on data.
pub struct Builder {
    data: HubDataset,
    kind_counts: HashMap<HubKind, u32>,
}

impl Builder {
    pub fn add_airport(
        &mut self,
        code: String,
        icao: Option<String>,
        name: String,
        name_zh: Option<String>,
        city: String,
        country: String,
        location: geo::Point<f64>,
        is_international: bool,
    ) -> Result<HubId, crate::geometry::GeoError> {
        self.add(Hub {
            id: self.next_id(HubKind::Airport),
            kind: HubKind::Airport,
            code,
            icao,
            name,
            name_zh,
            city,
            country,
            location,
            is_international,
            category: None,
            state: None,
            address: None,
        })
    }

    pub fn add_port(
        &mut self,
        code: String,
        name: String,
        name_zh: Option<String>,
        city: String,
        country: String,
        location: geo::Point<f64>,
        is_international: bool,
    ) -> Result<HubId, crate::geometry::GeoError> {
        self.add(Hub {
            id: self.next_id(HubKind::Port),
            kind: HubKind::Port,
            code,
            icao: None,
            name,
            name_zh,
            city,
            country,
            location,
            is_international,
            category: None,
            state: None,
            address: None,
        })
    }

    pub fn add_warehouse(
        &mut self,
        code: String,
        name: String,
        name_zh: Option<String>,
        city: String,
        country: String,
        location: geo::Point<f64>,
        category: WarehouseCategory,
        state: Option<String>,
        address: Option<String>,
    ) -> Result<HubId, crate::geometry::GeoError> {
        self.add(Hub {
            id: self.next_id(HubKind::Warehouse),
            kind: HubKind::Warehouse,
            code,
            icao: None,
            name,
            name_zh,
            city,
            country,
            location,
            is_international: false,
            category: Some(category),
            state,
            address,
        })
    }

    fn next_id(&self, kind: HubKind) -> HubId {
        HubId::assign(kind, self.kind_counts.get(&kind).copied().unwrap_or(0))
    }

    fn add(&mut self, hub: Hub) -> Result<HubId, crate::geometry::GeoError> {
        crate::geometry::validate(hub.location)?;
        *self.kind_counts.entry(hub.kind).or_insert(0) += 1;
        let idx = self.data.hubs.len() as HubIdx;
        self.data
            .by_code
            .entry((hub.kind, hub.code.to_uppercase()))
            .or_insert(idx);
        let id = hub.id.clone();
        self.data.hubs.push(hub);
        Ok(id)
    }

    pub fn build(mut self) -> HubDataset {
        self.data.hubs.shrink_to_fit();
        eprintln!("hub dataset built: {}", self.data.stats());
        self.data
    }
}
