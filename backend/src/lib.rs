pub mod auth;
pub mod catchers;
pub mod config;
pub mod cors;
pub mod error;
pub mod processor;
pub mod queries;
pub mod rate_limiter;
pub mod routes;
pub mod session;
pub mod store;
pub mod utils;
pub use shared::user_info;
pub use shared::{models::*, error::*, user_info::*};

use rocket::{catchers, routes, Build, Rocket};

use crate::catchers::{
    bad_request, forbidden, internal_error, not_found, too_many_requests, unauthorized,
    unprocessable,
};
use crate::cors::CORS;
use crate::routes::*;

pub fn build_rocket(state: AppState) -> Rocket<Build> {
    rocket::build()
        .attach(CORS::new(state.config.allowed_origin.clone()))
        .manage(state)
        .mount(
            "/api",
            routes![
                list_candidates,
                resolve_identity,
                submit_ballot,
                get_results,
                list_voted_voters,
                add_candidate,
                update_candidate,
                delete_candidate,
                reset_election,
                all_options
            ],
        )
        .register(
            "/",
            catchers![
                bad_request,
                unauthorized,
                forbidden,
                not_found,
                unprocessable,
                too_many_requests,
                internal_error
            ],
        )
}

#[cfg(test)]
mod tests;
