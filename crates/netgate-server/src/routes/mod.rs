// ── Route table ──
//
// Reads need any valid bearer token; mutations need the admin role.
// Both are enforced by the extractors each handler takes.

mod auth;
mod backup;
mod dns;
mod groups;
mod logs;
mod network;
mod rules;

use axum::Router;
use axum::routing::{get, patch, post, put};

use netgate_core::{CommandResult, CoreError};

use crate::error::ApiError;
use crate::state::AppState;

/// Build the route table. `/auth/register` is only routed when the
/// controller allows self-registration.
pub fn routes(state: &AppState) -> Router<AppState> {
    let mut router = Router::new()
        .route("/", get(auth::root))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // ── Firewall rules ──
        .route(
            "/firewall/rules",
            get(rules::list_rules).post(rules::create_rule),
        )
        .route("/firewall/rules/order", put(rules::reorder_rules))
        .route(
            "/firewall/rules/{id}",
            get(rules::get_rule)
                .put(rules::update_rule)
                .delete(rules::delete_rule),
        )
        .route("/firewall/evaluate", post(rules::evaluate))
        // ── Rule groups ──
        .route(
            "/firewall/groups",
            get(groups::list_groups).post(groups::create_group),
        )
        .route(
            "/firewall/groups/{id}",
            put(groups::update_group).delete(groups::delete_group),
        )
        .route("/firewall/groups/{id}/rules", get(groups::group_rules))
        .route(
            "/firewall/groups/{id}/rules/enable",
            patch(groups::set_rules_enabled),
        )
        // ── Network ──
        .route(
            "/network/interfaces",
            get(network::list_interfaces).post(network::save_interface),
        )
        .route(
            "/network/interfaces/{name}",
            put(network::update_interface).delete(network::delete_interface),
        )
        .route("/nat", get(network::get_nat).patch(network::set_nat))
        .route(
            "/routes",
            get(network::list_routes).post(network::create_route),
        )
        .route(
            "/routes/{id}",
            put(network::update_route).delete(network::delete_route),
        )
        // ── DNS ──
        .route(
            "/dns/domains",
            get(dns::list_domains).post(dns::block_domain),
        )
        .route("/dns/domains/{domain}", axum::routing::delete(dns::unblock_domain))
        .route("/dns/adblocklist", post(dns::import_adblock_list))
        .route("/dns/doh-block", post(dns::block_doh))
        // ── Logs ──
        .route("/logs", get(logs::list_logs))
        .route("/logs/blocked", get(logs::list_blocked))
        .route("/logs/alerts", get(logs::list_alerts))
        // ── Backup ──
        .route("/backup/export", get(backup::export_backup))
        .route("/backup/import", post(backup::import_backup));

    if state.controller().auth().registration_enabled() {
        router = router.route("/auth/register", post(auth::register));
    }
    router
}

/// A command answered with a result of the wrong shape.
fn unexpected(result: &CommandResult) -> ApiError {
    ApiError::from(CoreError::Internal(format!(
        "unexpected command result: {result:?}"
    )))
}
