//! Synthetic routes shown before the first live scan.
//!
//! No timestamps on purpose, so demo data never reads as stale.

use super::route::{derive_demand, derive_risk, Route, SecurityBand};

fn demo(
    id: &str,
    from: &str,
    to: &str,
    jumps: u32,
    profit: f64,
    volume: f64,
    security: f64,
    margin_pct: f64,
    commodities: &[&str],
) -> Route {
    Route {
        id: id.to_string(),
        from: from.to_string(),
        to: to.to_string(),
        jumps,
        profit,
        volume,
        risk: derive_risk(security),
        demand: derive_demand(margin_pct),
        security: SecurityBand::from_value(security),
        commodities: commodities.iter().map(|c| c.to_string()).collect(),
        mode: "demo".to_string(),
        buy_price: None,
        sell_price: None,
        generated_at: None,
        expires_at: None,
    }
}

/// The bundled demo set, hub-to-hub hauls with a spread of risk profiles.
pub fn demo_routes() -> Vec<Route> {
    vec![
        demo(
            "jita-amarr", "Jita", "Amarr", 9, 128_000_000.0, 12_400.0, 0.6, 22.0,
            &["Large Skill Injector", "Nanite Repair Paste"],
        ),
        demo(
            "jita-dodixie", "Jita", "Dodixie", 12, 94_500_000.0, 9_800.0, 0.55, 17.0,
            &["Mexallon", "Isogen"],
        ),
        demo(
            "jita-rens", "Jita", "Rens", 14, 87_000_000.0, 16_200.0, 0.5, 15.0,
            &["Compressed Veldspar", "Tritanium"],
        ),
        demo(
            "jita-hek", "Jita", "Hek", 11, 76_300_000.0, 7_500.0, 0.55, 13.0,
            &["Oxygen Isotopes"],
        ),
        demo(
            "perimeter-jita", "Perimeter", "Jita", 1, 8_400_000.0, 2_100.0, 0.9, 6.0,
            &["PLEX"],
        ),
        demo(
            "amarr-rens", "Amarr", "Rens", 17, 143_000_000.0, 21_000.0, 0.45, 26.0,
            &["Warrior II", "Hammerhead II"],
        ),
        demo(
            "dodixie-hek", "Dodixie", "Hek", 13, 69_800_000.0, 11_300.0, 0.5, 12.0,
            &["Hypersynaptic Fibers"],
        ),
        demo(
            "rens-jita", "Rens", "Jita", 14, 91_200_000.0, 14_800.0, 0.5, 16.0,
            &["Pyerite", "Zydrine"],
        ),
        demo(
            "hek-amarr", "Hek", "Amarr", 19, 152_500_000.0, 18_600.0, 0.3, 31.0,
            &["Covert Ops Cloaking Device II"],
        ),
        demo(
            "jita-ec-p8r", "Jita", "EC-P8R", 6, 210_000_000.0, 4_200.0, 0.0, 55.0,
            &["Quafe Zero", "Exile"],
        ),
    ]
}
