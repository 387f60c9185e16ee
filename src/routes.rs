use crate::traits::RequestBody;
use crate::{api, AppState};

pub(crate) fn router() -> axum::Router<AppState> {
    use axum::routing::{get, post};

    axum::Router::new()
        // Mods
        .route("/mod", get(api::mods::GetMod::as_handler_query))
        .route(
            "/mods",
            get(api::mods::ListMods::as_handler_query)
                .post(api::submit_mod::SubmitMod::as_json_handler),
        )
        // Maps
        .route("/map", get(api::maps::GetMap::as_handler_query))
        .route(
            "/maps",
            post(api::submit_map::SubmitMapToMod::as_json_handler),
        )
        // Reference sets
        .route(
            "/difficulties",
            get(api::reference::ListDifficulties::as_handler_query),
        )
        .route(
            "/lengths",
            get(api::reference::ListLengths::as_handler_query),
        )
        .route("/tech", get(api::reference::GetTech::as_handler_query))
        .route("/techs", get(api::reference::ListTechs::as_handler_query))
        // Ratings
        .route(
            "/map-rating",
            get(api::ratings::GetMapRatingSummary::as_handler_query),
        )
        .route("/ratings", post(api::ratings::RateMap::as_json_handler))
}
