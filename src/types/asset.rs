use serde::{Deserialize, Serialize};

/// A single tradable asset as reported by the upstream pricing API.
///
/// Market fields are decimal strings, exactly as they appear on the wire.
/// Converting to floating point before render/compute time loses precision,
/// so the conversion helpers below are the only sanctioned crossing point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Identity key. Stable across fetches and updates, never reassigned.
    pub id: String,
    pub rank: String,
    pub symbol: String,
    pub name: String,
    pub price_usd: String,
    pub change_percent24_hr: String,
    pub market_cap_usd: String,
    pub volume_usd24_hr: String,
    pub supply: String,
    pub max_supply: Option<String>,
    pub vwap24_hr: String,
}

impl Asset {
    pub fn price(&self) -> f64 {
        parse_market_field(&self.price_usd)
    }

    pub fn change_percent(&self) -> f64 {
        parse_market_field(&self.change_percent24_hr)
    }

    pub fn market_cap(&self) -> f64 {
        parse_market_field(&self.market_cap_usd)
    }

    pub fn volume(&self) -> f64 {
        parse_market_field(&self.volume_usd24_hr)
    }

    pub fn circulating_supply(&self) -> f64 {
        parse_market_field(&self.supply)
    }

    pub fn max_supply(&self) -> Option<f64> {
        self.max_supply.as_deref().map(parse_market_field)
    }
}

fn parse_market_field(raw: &str) -> f64 {
    raw.parse().unwrap_or(0.0)
}

/// Response envelope used by every upstream endpoint: `{ "data": ... }`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[cfg(test)]
pub fn test_asset(id: &str, rank: &str, price: &str) -> Asset {
    Asset {
        id: id.to_string(),
        rank: rank.to_string(),
        symbol: id.to_uppercase(),
        name: id.to_string(),
        price_usd: price.to_string(),
        change_percent24_hr: "1.25".to_string(),
        market_cap_usd: "1000000000".to_string(),
        volume_usd24_hr: "50000000".to_string(),
        supply: "19000000".to_string(),
        max_supply: Some("21000000".to_string()),
        vwap24_hr: "100.0".to_string(),
    }
}
