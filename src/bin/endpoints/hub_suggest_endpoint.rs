use lazysort::SortedBy;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use urlencoding::decode;
use warp::Filter;

use freight_radar::Suggester;
use hub_search::search_data::{Hub, HubDataset, HubIdx, HubKind};

use super::with_data;

const RESULT_LIMIT: usize = 20;

#[derive(Serialize)]
struct FEHubSuggestion<'s> {
    id: &'s str,
    kind: HubKind,
    code: &'s str,
    name: &'s str,
    city: &'s str,
}

/// International gateways first, then the upstream throughput order the
/// dataset was loaded in
fn most_important((idx1, hub1): &(HubIdx, &Hub), (idx2, hub2): &(HubIdx, &Hub)) -> Ordering {
    hub1.importance()
        .cmp(&hub2.importance())
        .reverse()
        .then(idx1.cmp(idx2))
}

async fn hub_suggest_handler(
    query: String,
    data: Arc<HubDataset>,
    index: Arc<Suggester<HubIdx>>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match decode(&query) {
        Ok(query) => {
            let matches: Vec<(HubIdx, &Hub)> = index
                .search(&query)
                .into_iter()
                .filter_map(|idx| data.hub_at(idx).map(|hub| (idx, hub)))
                .collect();
            let result: Vec<FEHubSuggestion<'_>> = matches
                .into_iter()
                .sorted_by(most_important)
                .take(RESULT_LIMIT)
                .map(|(_idx, hub)| FEHubSuggestion {
                    id: hub.id.as_str(),
                    kind: hub.kind,
                    code: &hub.code,
                    name: &hub.name,
                    city: &hub.city,
                })
                .collect();
            Ok(warp::reply::json(&result))
        }
        Err(err) => {
            eprintln!("dir: failed to decode query={:?}: {:?}", &query, err);
            Err(warp::reject::not_found())
        }
    }
}

pub fn hub_suggest_route(
    data: Arc<HubDataset>,
    index: Arc<Suggester<HubIdx>>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let cors = warp::cors().allow_any_origin();
    warp::path!("suggestHubs" / String)
        .and(with_data(data))
        .and(with_data(index))
        .and_then(hub_suggest_handler)
        .with(cors)
}

#[cfg(test)]
mod test {
    use super::most_important;
    use hub_search::search_data::{Hub, HubDataset};
    use std::cmp::Ordering;

    fn two_hubs() -> HubDataset {
        let mut builder = HubDataset::builder();
        builder
            .add_port(
                "CNDLC".to_owned(),
                "Port of Dalian".to_owned(),
                None,
                "Dalian".to_owned(),
                "CN".to_owned(),
                geo::Point::new(121.63, 38.93),
                false,
            )
            .unwrap();
        builder
            .add_port(
                "CNTXG".to_owned(),
                "Port of Tianjin".to_owned(),
                None,
                "Tianjin".to_owned(),
                "CN".to_owned(),
                geo::Point::new(117.73, 39.0),
                true,
            )
            .unwrap();
        builder.build()
    }

    #[test]
    fn international_hubs_rank_first() {
        let data = two_hubs();
        let hubs: Vec<&Hub> = data.iter().collect();
        // the international port loaded second still sorts first
        assert_eq!(most_important(&(0, hubs[0]), &(1, hubs[1])), Ordering::Greater);
        assert_eq!(most_important(&(1, hubs[1]), &(0, hubs[0])), Ordering::Less);
        // equal importance falls back to load order
        assert_eq!(most_important(&(0, hubs[0]), &(0, hubs[0])), Ordering::Equal);
    }
}
