//! Canonical route records, risk/demand derivation, and ranking.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Coarse security tier derived from the raw security value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityBand {
    Highsec,
    Lowsec,
    Nullsec,
}

impl SecurityBand {
    /// `s >= 0.5` is Highsec, `0.1 <= s < 0.5` is Lowsec, everything below is Nullsec.
    pub fn from_value(s: f64) -> Self {
        if s >= 0.5 {
            SecurityBand::Highsec
        } else if s >= 0.1 {
            SecurityBand::Lowsec
        } else {
            SecurityBand::Nullsec
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SecurityBand::Highsec => "Highsec",
            SecurityBand::Lowsec => "Lowsec",
            SecurityBand::Nullsec => "Nullsec",
        }
    }
}

/// Risk in `[0.05, 0.6]` from the raw security value; lower security reads riskier.
/// Bounded away from 0 and 1 so the score multiplier never degenerates.
pub fn derive_risk(security: f64) -> f64 {
    (0.6 - 0.5 * security).clamp(0.05, 0.6)
}

/// Demand in `[35, 95]` from the raw margin percentage, centered on typical margins.
pub fn derive_demand(margin_pct: f64) -> u8 {
    (margin_pct + 45.0).round().clamp(35.0, 95.0) as u8
}

/// One normalized hauling opportunity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub from: String,
    pub to: String,
    pub jumps: u32,
    /// Expected profit in ISK for the whole haul; signed, negative means a loss.
    pub profit: f64,
    /// Cargo size in m3.
    pub volume: f64,
    pub risk: f64,
    pub demand: u8,
    pub security: SecurityBand,
    /// First entry is the primary commodity for display.
    pub commodities: Vec<String>,
    /// Sourcing tag the row arrived under (`instant`, `list`, `demo`, ...).
    pub mode: String,
    pub buy_price: Option<f64>,
    pub sell_price: Option<f64>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub generated_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
}

impl Route {
    /// Profit per jump; defined as 0 for zero-jump routes.
    pub fn profit_per_jump(&self) -> f64 {
        if self.jumps == 0 {
            0.0
        } else {
            self.profit / self.jumps as f64
        }
    }

    /// Composite ranking signal. Increases with profit-per-jump and demand,
    /// decreases with risk. A heuristic, not a valuation.
    pub fn score(&self) -> f64 {
        self.profit_per_jump() * (1.0 - self.risk) * (1.0 + self.demand as f64 / 200.0)
    }

    /// Estimated travel time, 2.5 minutes per jump.
    pub fn eta_minutes(&self) -> u32 {
        (self.jumps as f64 * 2.5).round() as u32
    }

    pub fn primary_commodity(&self) -> &str {
        self.commodities.first().map(String::as_str).unwrap_or("Unknown")
    }
}

/// Sorting options for the route table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteSort {
    #[default]
    Score,
    Profit,
    Jumps,
}

impl RouteSort {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Score => "Score",
            Self::Profit => "Profit",
            Self::Jumps => "Jumps",
        }
    }
}

/// Filter options for the route table.
#[derive(Clone, Debug, Default)]
pub struct RouteFilter {
    pub start: Option<String>,
    pub max_jumps: Option<u32>,
    pub min_profit: Option<f64>,
}

impl RouteFilter {
    pub fn matches(&self, route: &Route) -> bool {
        if let Some(ref start) = self.start {
            if &route.from != start { return false; }
        }
        if let Some(max) = self.max_jumps {
            if route.jumps > max { return false; }
        }
        if let Some(min) = self.min_profit {
            if route.profit < min { return false; }
        }

        true
    }
}

/// Sort routes by the given criteria. Stable, so tied entries keep their
/// normalization order.
pub fn sort_routes(routes: &mut [Route], sort: RouteSort, descending: bool) {
    routes.sort_by(|a, b| {
        let ord = match sort {
            RouteSort::Score => a
                .score()
                .partial_cmp(&b.score())
                .unwrap_or(std::cmp::Ordering::Equal),
            RouteSort::Profit => a
                .profit
                .partial_cmp(&b.profit)
                .unwrap_or(std::cmp::Ordering::Equal),
            RouteSort::Jumps => a.jumps.cmp(&b.jumps),
        };
        if descending { ord.reverse() } else { ord }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn route(id: &str, jumps: u32, profit: f64, risk: f64, demand: u8) -> Route {
        Route {
            id: id.to_string(),
            from: "Jita".to_string(),
            to: "Amarr".to_string(),
            jumps,
            profit,
            volume: 100.0,
            risk,
            demand,
            security: SecurityBand::Highsec,
            commodities: vec!["Tritanium".to_string()],
            mode: "scan".to_string(),
            buy_price: None,
            sell_price: None,
            generated_at: None,
            expires_at: None,
        }
    }

    // ---- risk & demand derivation ----

    #[test]
    fn highsec_route_risk() {
        // security 0.8 -> risk 0.6 - 0.4 = 0.2
        assert!(approx_eq(derive_risk(0.8), 0.2));
        assert_eq!(SecurityBand::from_value(0.8), SecurityBand::Highsec);
    }

    #[test]
    fn nullsec_route_risk_caps_at_upper_bound() {
        assert!(approx_eq(derive_risk(0.0), 0.6));
        assert_eq!(SecurityBand::from_value(0.0), SecurityBand::Nullsec);
    }

    #[test]
    fn risk_never_reaches_zero() {
        // security above 1.1 would push risk negative without the clamp
        assert!(approx_eq(derive_risk(1.2), 0.05));
    }

    #[test]
    fn security_band_boundaries() {
        assert_eq!(SecurityBand::from_value(0.5), SecurityBand::Highsec);
        assert_eq!(SecurityBand::from_value(0.45), SecurityBand::Lowsec);
        assert_eq!(SecurityBand::from_value(0.1), SecurityBand::Lowsec);
        assert_eq!(SecurityBand::from_value(0.09), SecurityBand::Nullsec);
        assert_eq!(SecurityBand::from_value(-1.0), SecurityBand::Nullsec);
    }

    #[test]
    fn demand_clamps_into_display_band() {
        assert_eq!(derive_demand(50.0), 95);
        assert_eq!(derive_demand(0.0), 45);
        assert_eq!(derive_demand(-50.0), 35);
        assert_eq!(derive_demand(10.4), 55);
    }

    // ---- scoring ----

    #[test]
    fn zero_jump_route_has_zero_profit_per_jump() {
        let r = route("a", 0, 500_000.0, 0.2, 60);
        assert!(approx_eq(r.profit_per_jump(), 0.0));
        assert!(r.score().is_finite());
        assert!(approx_eq(r.score(), 0.0));
    }

    #[test]
    fn profit_per_jump_divides_by_jumps() {
        let r = route("a", 4, 100.0, 0.2, 60);
        assert!(approx_eq(r.profit_per_jump(), 25.0));
    }

    #[test]
    fn score_increases_with_profit() {
        let low = route("a", 5, 1_000_000.0, 0.2, 60);
        let high = route("b", 5, 2_000_000.0, 0.2, 60);
        assert!(high.score() > low.score());
    }

    #[test]
    fn score_increases_with_demand() {
        let low = route("a", 5, 1_000_000.0, 0.2, 40);
        let high = route("b", 5, 1_000_000.0, 0.2, 90);
        assert!(high.score() > low.score());
    }

    #[test]
    fn score_decreases_with_risk() {
        let safe = route("a", 5, 1_000_000.0, 0.1, 60);
        let risky = route("b", 5, 1_000_000.0, 0.5, 60);
        assert!(safe.score() > risky.score());
    }

    #[test]
    fn score_monotonicity_holds_across_a_fixture_sweep() {
        // perturb one input at a time over a spread of base routes
        for &jumps in &[1u32, 4, 12] {
            for &profit in &[150_000.0, 2_500_000.0, 80_000_000.0] {
                for &risk in &[0.05, 0.3, 0.55] {
                    for &demand in &[35u8, 60, 94] {
                        let base = route("base", jumps, profit, risk, demand);
                        let richer = route("richer", jumps, profit * 1.5, risk, demand);
                        let wanted = route("wanted", jumps, profit, risk, demand + 1);
                        let riskier = route("riskier", jumps, profit, risk + 0.04, demand);
                        assert!(richer.score() > base.score());
                        assert!(wanted.score() > base.score());
                        assert!(riskier.score() < base.score());
                    }
                }
            }
        }
    }

    #[test]
    fn eta_rounds_half_jumps_up() {
        assert_eq!(route("a", 0, 0.0, 0.2, 60).eta_minutes(), 0);
        assert_eq!(route("a", 3, 0.0, 0.2, 60).eta_minutes(), 8); // 7.5 -> 8
        assert_eq!(route("a", 9, 0.0, 0.2, 60).eta_minutes(), 23); // 22.5 -> 23
        assert_eq!(route("a", 4, 0.0, 0.2, 60).eta_minutes(), 10);
    }

    // ---- filter & sort ----

    #[test]
    fn filter_by_start_system() {
        let filter = RouteFilter {
            start: Some("Jita".to_string()),
            ..Default::default()
        };
        let mut other = route("a", 3, 100.0, 0.2, 60);
        other.from = "Rens".to_string();
        assert!(filter.matches(&route("b", 3, 100.0, 0.2, 60)));
        assert!(!filter.matches(&other));
    }

    #[test]
    fn filter_by_jumps_and_profit() {
        let filter = RouteFilter {
            max_jumps: Some(5),
            min_profit: Some(1_000.0),
            ..Default::default()
        };
        assert!(filter.matches(&route("a", 5, 1_000.0, 0.2, 60)));
        assert!(!filter.matches(&route("b", 6, 1_000.0, 0.2, 60)));
        assert!(!filter.matches(&route("c", 5, 999.0, 0.2, 60)));
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(RouteFilter::default().matches(&route("a", 0, -5.0, 0.6, 35)));
    }

    #[test]
    fn sort_by_score_descending() {
        let mut routes = vec![
            route("low", 10, 1_000_000.0, 0.5, 40),
            route("high", 2, 5_000_000.0, 0.1, 90),
        ];
        sort_routes(&mut routes, RouteSort::Score, true);
        assert_eq!(routes[0].id, "high");
    }

    #[test]
    fn sort_by_jumps_ascending() {
        let mut routes = vec![
            route("far", 9, 100.0, 0.2, 60),
            route("near", 2, 100.0, 0.2, 60),
            route("mid", 5, 100.0, 0.2, 60),
        ];
        sort_routes(&mut routes, RouteSort::Jumps, false);
        let ids: Vec<&str> = routes.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid", "far"]);
    }

    #[test]
    fn sort_keeps_tied_entries_in_order() {
        let mut routes = vec![
            route("first", 4, 100.0, 0.2, 60),
            route("second", 4, 100.0, 0.2, 60),
            route("third", 4, 100.0, 0.2, 60),
        ];
        sort_routes(&mut routes, RouteSort::Profit, true);
        let ids: Vec<&str> = routes.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }
}
