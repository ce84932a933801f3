use std::sync::Arc;
use warp::Filter;

mod hub_suggest_endpoint;

pub use hub_suggest_endpoint::hub_suggest_route;

pub fn with_data<D: Sync + Send>(
    db: Arc<D>,
) -> impl Filter<Extract = (Arc<D>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || db.clone())
}
