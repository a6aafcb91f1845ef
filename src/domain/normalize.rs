//! Normalization of raw scan payloads into canonical [`Route`] records.
//!
//! Upstream rows arrive with variable field names and plenty of optional
//! values. Every target field resolves through an explicit candidate list,
//! first non-empty source wins, so the mapping stays auditable without the
//! transport layer in the picture.

use serde::Deserialize;

use super::freshness::parse_timestamp;
use super::route::{derive_demand, derive_risk, Route, SecurityBand};

/// A raw scan response. A missing `results` key fails deserialization so the
/// caller can treat the payload as malformed; missing sub-lists are empty.
#[derive(Clone, Debug, Deserialize)]
pub struct ScanPayload {
    pub results: ScanResults,
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub start_system_name: Option<String>,
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub cache_expires_at: Option<String>,
}

/// The two sourcing modes of one scan, both optional.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ScanResults {
    #[serde(default)]
    pub instant: Vec<ScanRow>,
    #[serde(default)]
    pub list: Vec<ScanRow>,
}

/// One raw opportunity row. Everything is optional; the normalizer fills the
/// gaps.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ScanRow {
    #[serde(default)]
    pub type_id: Option<i64>,
    #[serde(default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub jumps: Option<u32>,
    #[serde(default)]
    pub est_profit_budget: Option<f64>,
    #[serde(default)]
    pub margin_pct: Option<f64>,
    #[serde(default)]
    pub security: Option<f64>,
    #[serde(default)]
    pub best_buy_system: Option<String>,
    #[serde(default)]
    pub best_sell_system: Option<String>,
    #[serde(default)]
    pub origin_system_name: Option<String>,
    #[serde(default)]
    pub max_units_trade: Option<f64>,
    #[serde(default)]
    pub max_units_budget: Option<f64>,
    #[serde(default)]
    pub volume_m3: Option<f64>,
    #[serde(default)]
    pub unit_volume_m3: Option<f64>,
    #[serde(default)]
    pub cargo_m3_used: Option<f64>,
    #[serde(default)]
    pub buy_price: Option<f64>,
    #[serde(default)]
    pub home_sell: Option<f64>,
    #[serde(default)]
    pub sell_price: Option<f64>,
    #[serde(default)]
    pub best_buy: Option<f64>,
    #[serde(default)]
    pub best_sell: Option<f64>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub origin_generated_at: Option<String>,
    #[serde(default)]
    pub origin_cache_expires_at: Option<String>,
}

/// Map a scan payload to canonical routes.
///
/// `instant` rows precede `list` rows and relative order is preserved within
/// each group. A row missing identifying fields is still normalized to a
/// best-effort record rather than dropped. `fallback_start` names the origin
/// when neither the row nor the payload carries one.
pub fn normalize(payload: &ScanPayload, fallback_start: &str) -> Vec<Route> {
    payload
        .results
        .instant
        .iter()
        .chain(payload.results.list.iter())
        .enumerate()
        .map(|(index, row)| normalize_row(row, payload, fallback_start, index))
        .collect()
}

fn normalize_row(
    row: &ScanRow,
    payload: &ScanPayload,
    fallback_start: &str,
    index: usize,
) -> Route {
    let mode = non_empty(row.mode.as_deref()).unwrap_or("scan");
    let id = format!("{mode}-{}-{index}", row.type_id.unwrap_or(0));

    let from = non_empty(row.origin_system_name.as_deref())
        .or_else(|| non_empty(payload.start_system_name.as_deref()))
        .unwrap_or(fallback_start)
        .to_string();
    let to = non_empty(row.best_buy_system.as_deref())
        .or_else(|| non_empty(row.best_sell_system.as_deref()))
        .unwrap_or("Unknown")
        .to_string();

    // Units only matter when no explicit cargo figure survives.
    let units = positive(row.max_units_trade)
        .or_else(|| positive(row.max_units_budget))
        .unwrap_or(0.0);
    let volume = positive(row.cargo_m3_used)
        .or_else(|| positive(row.volume_m3))
        .or_else(|| positive(row.unit_volume_m3).map(|unit| unit * units))
        .unwrap_or(units);

    let security_value = row.security.unwrap_or(0.0);
    let margin_pct = row.margin_pct.unwrap_or(0.0);

    let buy_price = positive(row.buy_price).or_else(|| positive(row.home_sell));
    let sell_price = positive(row.sell_price)
        .or_else(|| positive(row.best_buy))
        .or_else(|| positive(row.best_sell));

    let generated_at = parse_timestamp(
        non_empty(row.origin_generated_at.as_deref())
            .or_else(|| non_empty(payload.generated_at.as_deref())),
    );
    let expires_at = parse_timestamp(
        non_empty(row.origin_cache_expires_at.as_deref())
            .or_else(|| non_empty(payload.cache_expires_at.as_deref())),
    );

    Route {
        id,
        from,
        to,
        jumps: row.jumps.unwrap_or(0),
        profit: row.est_profit_budget.unwrap_or(0.0),
        volume,
        risk: derive_risk(security_value),
        demand: derive_demand(margin_pct),
        security: SecurityBand::from_value(security_value),
        commodities: vec![non_empty(row.type_name.as_deref())
            .unwrap_or("Unknown")
            .to_string()],
        mode: mode.to_string(),
        buy_price,
        sell_price,
        generated_at,
        expires_at,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

// Zero reads as "not quoted" in upstream numeric fields.
fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn parse(json: &str) -> ScanPayload {
        serde_json::from_str(json).unwrap()
    }

    // ---- payload shape ----

    #[test]
    fn empty_payload_normalizes_to_no_routes() {
        let payload = parse(r#"{"results": {"instant": [], "list": []}}"#);
        assert!(normalize(&payload, "Jita").is_empty());
    }

    #[test]
    fn missing_sublists_default_to_empty() {
        let payload = parse(r#"{"results": {}}"#);
        assert!(normalize(&payload, "Jita").is_empty());
    }

    #[test]
    fn missing_results_key_is_malformed() {
        assert!(serde_json::from_str::<ScanPayload>(r#"{"cached": true}"#).is_err());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let payload = parse(
            r#"{"results": {"instant": [{"type_id": 34, "shiny_new_field": 1}]}, "elapsed_ms": 90}"#,
        );
        assert_eq!(normalize(&payload, "Jita").len(), 1);
    }

    // ---- ordering & identity ----

    #[test]
    fn instant_rows_precede_list_rows_with_running_index() {
        let payload = parse(
            r#"{"results": {
                "instant": [
                    {"type_id": 34, "mode": "instant"},
                    {"type_id": 35, "mode": "instant"}
                ],
                "list": [{"type_id": 36, "mode": "list"}]
            }}"#,
        );
        let routes = normalize(&payload, "Jita");
        let ids: Vec<&str> = routes.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["instant-34-0", "instant-35-1", "list-36-2"]);
    }

    #[test]
    fn mode_and_type_id_default_in_route_ids() {
        let payload = parse(r#"{"results": {"instant": [{}, {"type_id": 44992}]}}"#);
        let routes = normalize(&payload, "Jita");
        assert_eq!(routes[0].id, "scan-0-0");
        assert_eq!(routes[1].id, "scan-44992-1");
        assert_eq!(routes[0].mode, "scan");
    }

    // ---- field resolution chains ----

    #[test]
    fn origin_resolution_prefers_row_then_payload_then_caller() {
        let payload = parse(
            r#"{
                "start_system_name": "Perimeter",
                "results": {"instant": [
                    {"origin_system_name": "Jita"},
                    {},
                    {"origin_system_name": ""}
                ]}
            }"#,
        );
        let routes = normalize(&payload, "Hek");
        assert_eq!(routes[0].from, "Jita");
        assert_eq!(routes[1].from, "Perimeter");
        // empty string falls through like an absent field
        assert_eq!(routes[2].from, "Perimeter");

        let bare = parse(r#"{"results": {"instant": [{}]}}"#);
        assert_eq!(normalize(&bare, "Hek")[0].from, "Hek");
    }

    #[test]
    fn destination_resolution_tries_both_aliases() {
        let payload = parse(
            r#"{"results": {"instant": [
                {"best_buy_system": "Amarr", "best_sell_system": "Rens"},
                {"best_sell_system": "Rens"},
                {}
            ]}}"#,
        );
        let routes = normalize(&payload, "Jita");
        assert_eq!(routes[0].to, "Amarr");
        assert_eq!(routes[1].to, "Rens");
        assert_eq!(routes[2].to, "Unknown");
    }

    #[test]
    fn volume_resolution_chain() {
        let payload = parse(
            r#"{"results": {"instant": [
                {"cargo_m3_used": 120.5, "volume_m3": 999.0},
                {"volume_m3": 300.0, "unit_volume_m3": 5.0, "max_units_trade": 10},
                {"unit_volume_m3": 5.0, "max_units_trade": 10},
                {"max_units_budget": 250},
                {}
            ]}}"#,
        );
        let routes = normalize(&payload, "Jita");
        assert_eq!(routes[0].volume, 120.5);
        assert_eq!(routes[1].volume, 300.0);
        assert_eq!(routes[2].volume, 50.0);
        assert_eq!(routes[3].volume, 250.0);
        assert_eq!(routes[4].volume, 0.0);
    }

    #[test]
    fn zero_cargo_figure_falls_through_the_chain() {
        let payload = parse(
            r#"{"results": {"instant": [
                {"cargo_m3_used": 0.0, "volume_m3": 42.0}
            ]}}"#,
        );
        assert_eq!(normalize(&payload, "Jita")[0].volume, 42.0);
    }

    #[test]
    fn unit_count_prefers_trade_cap_over_budget_cap() {
        let payload = parse(
            r#"{"results": {"instant": [
                {"unit_volume_m3": 2.0, "max_units_trade": 30, "max_units_budget": 500}
            ]}}"#,
        );
        assert_eq!(normalize(&payload, "Jita")[0].volume, 60.0);
    }

    #[test]
    fn price_resolution_chains() {
        let payload = parse(
            r#"{"results": {"instant": [
                {"buy_price": 100.0, "home_sell": 90.0, "sell_price": 140.0, "best_buy": 130.0},
                {"home_sell": 90.0, "best_buy": 130.0},
                {"best_sell": 120.0},
                {"buy_price": 0.0, "sell_price": 0.0}
            ]}}"#,
        );
        let routes = normalize(&payload, "Jita");
        assert_eq!(routes[0].buy_price, Some(100.0));
        assert_eq!(routes[0].sell_price, Some(140.0));
        assert_eq!(routes[1].buy_price, Some(90.0));
        assert_eq!(routes[1].sell_price, Some(130.0));
        assert_eq!(routes[2].buy_price, None);
        assert_eq!(routes[2].sell_price, Some(120.0));
        assert_eq!(routes[3].buy_price, None);
        assert_eq!(routes[3].sell_price, None);
    }

    #[test]
    fn derived_fields_follow_raw_security_and_margin() {
        let payload = parse(
            r#"{"results": {"instant": [
                {"security": 0.9, "margin_pct": 12.0},
                {"security": 0.3, "margin_pct": 60.0}
            ]}}"#,
        );
        let routes = normalize(&payload, "Jita");
        assert_eq!(routes[0].security, SecurityBand::Highsec);
        assert!((routes[0].risk - 0.15).abs() < 1e-9);
        assert_eq!(routes[0].demand, 57);
        assert_eq!(routes[1].security, SecurityBand::Lowsec);
        assert!((routes[1].risk - 0.45).abs() < 1e-9);
        assert_eq!(routes[1].demand, 95);
    }

    #[test]
    fn timestamps_prefer_row_level_origin_values() {
        let payload = parse(
            r#"{
                "generated_at": "2026-05-01T10:00:00Z",
                "cache_expires_at": "2026-05-01T10:05:00Z",
                "results": {"instant": [
                    {"origin_generated_at": "2026-05-01T09:00:00Z"},
                    {}
                ]}
            }"#,
        );
        let routes = normalize(&payload, "Jita");
        assert_eq!(routes[0].generated_at, Some(datetime!(2026-05-01 09:00:00 UTC)));
        assert_eq!(routes[0].expires_at, Some(datetime!(2026-05-01 10:05:00 UTC)));
        assert_eq!(routes[1].generated_at, Some(datetime!(2026-05-01 10:00:00 UTC)));
    }

    #[test]
    fn absent_timestamps_stay_absent() {
        let payload = parse(r#"{"results": {"instant": [{"type_id": 34}]}}"#);
        let route = &normalize(&payload, "Jita")[0];
        assert_eq!(route.generated_at, None);
        assert_eq!(route.expires_at, None);
    }

    // ---- best-effort rows ----

    #[test]
    fn bare_row_normalizes_to_defaults() {
        let payload = parse(r#"{"results": {"list": [{}]}}"#);
        let route = &normalize(&payload, "Jita")[0];
        assert_eq!(route.id, "scan-0-0");
        assert_eq!(route.from, "Jita");
        assert_eq!(route.to, "Unknown");
        assert_eq!(route.jumps, 0);
        assert_eq!(route.profit, 0.0);
        assert_eq!(route.commodities, vec!["Unknown".to_string()]);
        assert_eq!(route.security, SecurityBand::Nullsec);
        assert!((route.risk - 0.6).abs() < 1e-9);
        assert_eq!(route.demand, 45);
        // the zero-jump guard holds for synthesized rows too
        assert_eq!(route.profit_per_jump(), 0.0);
        assert!(route.score().is_finite());
    }

    #[test]
    fn full_row_carries_everything_through() {
        let payload = parse(
            r#"{
                "cached": true,
                "start_system_name": "Jita",
                "results": {"instant": [{
                    "type_id": 44992,
                    "type_name": "PLEX",
                    "jumps": 9,
                    "est_profit_budget": 1250000.0,
                    "margin_pct": 14.2,
                    "security": 0.7,
                    "best_buy_system": "Amarr",
                    "cargo_m3_used": 180.0,
                    "buy_price": 3400000.0,
                    "sell_price": 3920000.0,
                    "mode": "instant"
                }]}
            }"#,
        );
        let route = &normalize(&payload, "Hek")[0];
        assert_eq!(route.id, "instant-44992-0");
        assert_eq!(route.from, "Jita");
        assert_eq!(route.to, "Amarr");
        assert_eq!(route.jumps, 9);
        assert_eq!(route.primary_commodity(), "PLEX");
        assert_eq!(route.eta_minutes(), 23);
        assert!(route.score() > 0.0);
    }
}
