use geo::Point;
use std::sync::Arc;

use hub_search::geometry::GeoError;
use hub_search::nearest::nearest_hubs;
use hub_search::search::{search, CityNames, MatchReason, SearchHit};
use hub_search::search_data::{Hub, HubDataset, HubId, HubIdx, HubKind};

use crate::geocode::{GeocodeError, Geocoder, PlaceDetails, PlaceSuggestion};
use crate::map::MapSurface;

/// Fixed order in which kinds claim the active tab, both for exact-code
/// matches and for equal result counts. Warehouse codes collide with free
/// text most easily so they get first claim.
pub const KIND_PRIORITY: [HubKind; 3] = [HubKind::Warehouse, HubKind::Airport, HubKind::Port];

/// The map stops accepting markers beyond this, panning with tens of
/// thousands of markers stalls the renderer
pub const MAP_MARKER_LIMIT: usize = 5000;
/// The result list shows this many rows plus an overflow hint
pub const RESULT_LIST_LIMIT: usize = 200;
/// Nearby hubs listed under a searched address
const NEARBY_LIMIT: usize = 5;
const ADDRESS_ZOOM: u8 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Airports,
    Ports,
    Warehouses,
}

impl CategoryFilter {
    fn kind(self) -> Option<HubKind> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Airports => Some(HubKind::Airport),
            CategoryFilter::Ports => Some(HubKind::Port),
            CategoryFilter::Warehouses => Some(HubKind::Warehouse),
        }
    }
}

/// Everything the result pane needs to redraw, replaced wholesale on every
/// keystroke or filter toggle. Results are dataset positions so the state
/// carries no borrow of the dataset.
pub struct QueryState {
    pub query: String,
    pub filter: CategoryFilter,
    /// Which kind's tab is showing, survives queries with no matches
    pub active_kind: HubKind,
    pub results: Vec<(HubIdx, MatchReason)>,
    pub suggestions: Vec<PlaceSuggestion>,
}

/// Ticket for an in-flight address or routing request. Only the response
/// matching the newest ticket may touch the state, anything older is
/// stale and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// Owns the query state, runs the engine on input events and pushes the
/// outcome at the map surface and result pane. Holds the only mutable
/// handle on the state, collaborator responses re-enter through token
/// checked methods.
pub struct SearchController<M: MapSurface> {
    data: Arc<HubDataset>,
    names: CityNames,
    map: M,
    state: QueryState,
    latest_request: u64,
}

impl<M: MapSurface> SearchController<M> {
    pub fn new(data: Arc<HubDataset>, names: CityNames, map: M) -> SearchController<M> {
        let mut controller = SearchController {
            data,
            names,
            map,
            state: QueryState {
                query: String::new(),
                filter: CategoryFilter::All,
                active_kind: HubKind::Airport,
                results: Vec::new(),
                suggestions: Vec::new(),
            },
            latest_request: 0,
        };
        controller.refresh();
        controller
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Hubs of the current result set, at most `RESULT_LIST_LIMIT` rows
    pub fn visible_results(&self) -> Vec<(&Hub, MatchReason)> {
        self.state
            .results
            .iter()
            .take(RESULT_LIST_LIMIT)
            .filter_map(|&(idx, reason)| self.data.hub_at(idx).map(|hub| (hub, reason)))
            .collect()
    }

    /// How many matches the list cannot show
    pub fn overflow_count(&self) -> usize {
        self.state.results.len().saturating_sub(RESULT_LIST_LIMIT)
    }

    pub fn set_query(&mut self, query: &str) {
        self.state.query = query.to_owned();
        self.refresh();
    }

    pub fn set_filter(&mut self, filter: CategoryFilter) {
        self.state.filter = filter;
        self.refresh();
    }

    /// A result row or map popup was chosen
    pub fn focus_hub(&mut self, id: &HubId) {
        if let Some(hub) = self.data.get(id) {
            self.map.focus_on_hub(hub);
        }
    }

    /// Recomputes results for the current query and filter, decides the
    /// active tab and republishes markers. Never fails: text that matches
    /// nothing is an empty result.
    fn refresh(&mut self) {
        let query = self.state.query.clone();
        if query.trim().is_empty() {
            // browsing view: no ranking, the filtered dataset is the marker set
            self.state.results = Vec::new();
            self.publish_browse();
            return;
        }
        match self.state.filter.kind() {
            Some(kind) => {
                let hits = search(&self.data, &query, Some(kind), &self.names);
                self.state.active_kind = kind;
                self.state.results = collect(hits);
            }
            None => {
                let data = &self.data;
                let names = &self.names;
                let per_kind: Vec<(HubKind, Vec<SearchHit<'_>>)> = KIND_PRIORITY
                    .iter()
                    .map(|&kind| (kind, search(data, &query, Some(kind), names)))
                    .collect();
                match auto_select(&per_kind) {
                    Some(kind) => {
                        let hits = per_kind
                            .into_iter()
                            .find(|(candidate, _)| *candidate == kind)
                            .map(|(_, hits)| hits)
                            .unwrap_or_default();
                        self.state.active_kind = kind;
                        self.state.results = collect(hits);
                    }
                    None => {
                        // nothing matched anywhere: empty result, keep the tab
                        self.state.results = Vec::new();
                    }
                }
            }
        }
        self.publish_results();
    }

    fn publish_results(&mut self) {
        let data = &self.data;
        let markers: Vec<&Hub> = self
            .state
            .results
            .iter()
            .take(MAP_MARKER_LIMIT)
            .filter_map(|&(idx, _)| data.hub_at(idx))
            .collect();
        self.map.set_markers(&markers);
    }

    fn publish_browse(&mut self) {
        let markers: Vec<&Hub> = match self.state.filter.kind() {
            Some(kind) => self.data.of_kind(kind).take(MAP_MARKER_LIMIT).collect(),
            None => self.data.iter().take(MAP_MARKER_LIMIT).collect(),
        };
        self.map.set_markers(&markers);
    }

    /// Stamp a new address/routing request. Issuing a ticket invalidates
    /// every earlier one.
    pub fn begin_request(&mut self) -> RequestToken {
        self.latest_request += 1;
        RequestToken(self.latest_request)
    }

    fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.latest_request
    }

    /// Accepts an autocomplete response unless a newer request has been
    /// issued since. Provider failure empties the dropdown, it never
    /// surfaces as an error. Returns whether the state changed.
    pub fn apply_suggestions(
        &mut self,
        token: RequestToken,
        response: Result<Vec<PlaceSuggestion>, GeocodeError>,
    ) -> bool {
        if !self.is_current(token) {
            return false;
        }
        match response {
            Ok(suggestions) => self.state.suggestions = suggestions,
            Err(err) => {
                eprintln!("geocode: suggestions failed: {}", err);
                self.state.suggestions.clear();
            }
        }
        true
    }

    /// Runs the whole autocomplete round-trip: issue a ticket, ask the
    /// geocoder, apply the response if it still is the newest.
    pub async fn lookup_address(&mut self, geocoder: &dyn Geocoder, input: &str) {
        let token = self.begin_request();
        let response = geocoder.suggest(input).await;
        self.apply_suggestions(token, response);
    }

    /// A suggestion was chosen: focus the address and return the hubs
    /// around it for the nearby panel
    pub fn address_resolved(
        &mut self,
        token: RequestToken,
        details: &PlaceDetails,
    ) -> Result<Vec<(&Hub, f64)>, GeoError> {
        if !self.is_current(token) {
            return Ok(Vec::new());
        }
        let location = Point::new(details.lng, details.lat);
        self.map.focus_on_coordinate(
            location,
            ADDRESS_ZOOM,
            Some(details.formatted_address.as_str()),
        );
        nearest_hubs(&self.data, location, NEARBY_LIMIT)
    }

    /// Measurement tool hooks, the report itself comes from
    /// `distance::measure`
    pub fn show_measurement(&mut self, from: Point<f64>, to: Point<f64>) {
        self.map.show_distance_line(from, to);
    }

    pub fn clear_measurement(&mut self) {
        self.map.clear_distance_line();
    }
}

fn collect(hits: Vec<SearchHit<'_>>) -> Vec<(HubIdx, MatchReason)> {
    hits.into_iter().map(|hit| (hit.idx, hit.reason)).collect()
}

/// Which kind's tab should show for a filterless query. A kind owning an
/// exact-code match wins outright, then the biggest result set, both in
/// `KIND_PRIORITY` order. `None` when every kind came up empty.
pub fn auto_select(per_kind: &[(HubKind, Vec<SearchHit<'_>>)]) -> Option<HubKind> {
    for (kind, hits) in per_kind {
        if hits
            .iter()
            .any(|hit| hit.reason == MatchReason::ExactCode)
        {
            return Some(*kind);
        }
    }
    let mut best: Option<(HubKind, usize)> = None;
    for (kind, hits) in per_kind {
        let count = hits.len();
        if count > 0 && best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((*kind, count));
        }
    }
    best.map(|(kind, _)| kind)
}

#[cfg(test)]
mod test {
    use super::*;
    use futures::future::BoxFuture;
    use hub_search::search_data::WarehouseCategory;

    /// Records what the controller pushed at the map
    #[derive(Default)]
    struct RecordingMap {
        marker_codes: Vec<String>,
        focused: Vec<String>,
        lines: usize,
    }

    impl MapSurface for RecordingMap {
        fn set_markers(&mut self, hubs: &[&Hub]) {
            self.marker_codes = hubs.iter().map(|hub| hub.code.clone()).collect();
        }

        fn focus_on_hub(&mut self, hub: &Hub) {
            self.focused.push(hub.code.clone());
        }

        fn focus_on_coordinate(&mut self, _location: Point<f64>, _zoom: u8, label: Option<&str>) {
            self.focused.push(label.unwrap_or("<coordinate>").to_owned());
        }

        fn show_distance_line(&mut self, _from: Point<f64>, _to: Point<f64>) {
            self.lines += 1;
        }

        fn clear_distance_line(&mut self) {}
    }

    fn dataset() -> Arc<HubDataset> {
        let mut builder = HubDataset::builder();
        builder
            .add_airport(
                "PEK".to_owned(),
                Some("ZBAA".to_owned()),
                "Beijing Capital Intl".to_owned(),
                None,
                "Beijing".to_owned(),
                "CN 中国".to_owned(),
                Point::new(116.5846, 40.0801),
                true,
            )
            .unwrap();
        builder
            .add_airport(
                "PVG".to_owned(),
                None,
                "Shanghai Pudong Intl".to_owned(),
                None,
                "Shanghai".to_owned(),
                "CN 中国".to_owned(),
                Point::new(121.8052, 31.1434),
                true,
            )
            .unwrap();
        builder
            .add_port(
                "CNSHA".to_owned(),
                "Port of Shanghai".to_owned(),
                None,
                "Shanghai".to_owned(),
                "CN 中国".to_owned(),
                Point::new(121.49, 31.23),
                true,
            )
            .unwrap();
        builder
            .add_port(
                "CNTAO".to_owned(),
                "Port of Qingdao".to_owned(),
                None,
                "Qingdao".to_owned(),
                "CN 中国".to_owned(),
                Point::new(120.38, 36.07),
                true,
            )
            .unwrap();
        builder
            .add_warehouse(
                "PEK-WH1".to_owned(),
                "Beijing Bonded Warehouse".to_owned(),
                None,
                "Beijing".to_owned(),
                "CN 中国".to_owned(),
                Point::new(116.5, 40.0),
                WarehouseCategory::FreightForwarder,
                None,
                None,
            )
            .unwrap();
        Arc::new(builder.build())
    }

    fn controller() -> SearchController<RecordingMap> {
        SearchController::new(dataset(), CityNames::default(), RecordingMap::default())
    }

    #[test]
    fn exact_code_picks_that_kind() {
        let mut controller = controller();
        controller.set_query("PVG");
        assert_eq!(controller.state().active_kind, HubKind::Airport);
        let results = controller.visible_results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.code, "PVG");
    }

    #[test]
    fn exact_match_beats_prefix_in_higher_priority_kinds() {
        // "PEK" is a prefix of the warehouse code but exactly the airport
        // code, the exact match takes the tab despite warehouse priority
        let mut controller = controller();
        controller.set_query("PEK");
        assert_eq!(controller.state().active_kind, HubKind::Airport);
    }

    #[test]
    fn biggest_result_set_claims_the_tab() {
        let mut controller = controller();
        // city match: one airport, one port each for Shanghai, warehouse
        // none: tie broken by priority, warehouse empty so airport wins
        // over port
        controller.set_query("Shanghai");
        assert_eq!(controller.state().active_kind, HubKind::Airport);
        // ports outnumber the rest for "Port of"
        controller.set_query("Port of");
        assert_eq!(controller.state().active_kind, HubKind::Port);
    }

    #[test]
    fn no_matches_keeps_previous_tab() {
        let mut controller = controller();
        controller.set_query("Port of");
        assert_eq!(controller.state().active_kind, HubKind::Port);
        controller.set_query("zzzzzz");
        assert!(controller.visible_results().is_empty());
        assert_eq!(controller.state().active_kind, HubKind::Port);
    }

    #[test]
    fn explicit_filter_pins_the_tab() {
        let mut controller = controller();
        controller.set_filter(CategoryFilter::Warehouses);
        controller.set_query("Beijing");
        assert_eq!(controller.state().active_kind, HubKind::Warehouse);
        let results = controller.visible_results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.code, "PEK-WH1");
    }

    #[test]
    fn empty_query_browses_the_filtered_dataset() {
        let mut controller = controller();
        controller.set_filter(CategoryFilter::Ports);
        controller.set_query("");
        assert!(controller.visible_results().is_empty());
        assert_eq!(controller.map.marker_codes, ["CNSHA", "CNTAO"]);
    }

    #[test]
    fn markers_follow_the_result_set() {
        let mut controller = controller();
        controller.set_query("Qingdao");
        assert_eq!(controller.map.marker_codes, ["CNTAO"]);
    }

    #[test]
    fn stale_suggestions_are_dropped() {
        let mut controller = controller();
        let first = controller.begin_request();
        let second = controller.begin_request();
        // the older request resolves after the newer one
        let newer = vec![PlaceSuggestion {
            place_id: "q2".to_owned(),
            description: "Second Street".to_owned(),
        }];
        assert!(controller.apply_suggestions(second, Ok(newer)));
        let older = vec![PlaceSuggestion {
            place_id: "q1".to_owned(),
            description: "First Street".to_owned(),
        }];
        assert!(!controller.apply_suggestions(first, Ok(older)));
        assert_eq!(controller.state().suggestions.len(), 1);
        assert_eq!(controller.state().suggestions[0].place_id, "q2");
    }

    #[test]
    fn geocoder_failure_degrades_to_no_suggestions() {
        let mut controller = controller();
        let token = controller.begin_request();
        controller.state.suggestions = vec![PlaceSuggestion {
            place_id: "old".to_owned(),
            description: "Old Road".to_owned(),
        }];
        let failed = Err(GeocodeError::Unavailable("proxy 502".to_owned()));
        assert!(controller.apply_suggestions(token, failed));
        assert!(controller.state().suggestions.is_empty());
    }

    struct OutOfOrderGeocoder;

    impl Geocoder for OutOfOrderGeocoder {
        fn suggest<'a>(
            &'a self,
            input: &'a str,
        ) -> BoxFuture<'a, Result<Vec<PlaceSuggestion>, GeocodeError>> {
            let suggestion = PlaceSuggestion {
                place_id: input.to_owned(),
                description: input.to_owned(),
            };
            Box::pin(async move { Ok(vec![suggestion]) })
        }

        fn details<'a>(
            &'a self,
            place_id: &'a str,
        ) -> BoxFuture<'a, Result<PlaceDetails, GeocodeError>> {
            Box::pin(async move { Err(GeocodeError::UnknownPlace(place_id.to_owned())) })
        }
    }

    #[tokio::test]
    async fn lookup_address_round_trip() {
        let mut controller = controller();
        controller.lookup_address(&OutOfOrderGeocoder, "alexanderplatz").await;
        assert_eq!(controller.state().suggestions.len(), 1);
        assert_eq!(controller.state().suggestions[0].place_id, "alexanderplatz");
    }

    #[test]
    fn resolved_address_focuses_and_lists_nearby() {
        let mut controller = controller();
        let token = controller.begin_request();
        let details = PlaceDetails {
            formatted_address: "People's Square, Shanghai".to_owned(),
            lat: 31.23,
            lng: 121.47,
        };
        let nearby = controller.address_resolved(token, &details).unwrap();
        assert_eq!(nearby.len(), NEARBY_LIMIT);
        // the port sits closest to People's Square
        assert_eq!(nearby[0].0.code, "CNSHA");
        assert_eq!(controller.map.focused, ["People's Square, Shanghai"]);
    }

    #[test]
    fn measurement_draws_and_clears_the_line() {
        let mut controller = controller();
        controller.show_measurement(Point::new(116.58, 40.08), Point::new(121.80, 31.14));
        assert_eq!(controller.map.lines, 1);
        controller.clear_measurement();
    }

    #[test]
    fn selecting_a_result_focuses_the_map() {
        let mut controller = controller();
        controller.set_query("PVG");
        let id = controller.visible_results()[0].0.id.clone();
        controller.focus_hub(&id);
        assert_eq!(controller.map.focused, ["PVG"]);
    }

    #[test]
    fn stale_address_resolution_is_ignored() {
        let mut controller = controller();
        let first = controller.begin_request();
        let _second = controller.begin_request();
        let details = PlaceDetails {
            formatted_address: "Somewhere Old".to_owned(),
            lat: 31.23,
            lng: 121.47,
        };
        let nearby = controller.address_resolved(first, &details).unwrap();
        assert!(nearby.is_empty());
        assert!(controller.map.focused.is_empty());
    }
}
