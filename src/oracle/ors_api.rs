use dotenv::dotenv;
use reqwest::Client;
use serde_json::{json, Value};
use std::env;
use tracing::{debug, error, trace, warn};

use crate::config::constant::{ORS_BASE_URL, ORS_PROFILE};
use crate::error::{DispatchError, DispatchResult};

use super::AutocompleteSuggestion;

/// Routing oracle backed by the openrouteservice HTTP API. Grounded on the
/// teacher's OSRM/Google provider modules: a thin `reqwest::Client` wrapper,
/// `tracing` at every I/O boundary, and JSON decoded through `serde_json::Value`
/// rather than strict response structs, since ORS responses carry more fields
/// than we consume.
pub struct OrsOracle {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OrsOracle {
    /// Reads `ORS_API_KEY` from the environment (via `.env` if present).
    /// Fails with `InvalidInput` rather than panicking, since a missing key
    /// is a deployment mistake the caller should be able to report cleanly.
    pub fn from_env() -> DispatchResult<Self> {
        dotenv().ok();
        let api_key = env::var("ORS_API_KEY").map_err(|_| {
            DispatchError::InvalidInput("ORS_API_KEY is not set".to_string())
        })?;
        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: ORS_BASE_URL.to_string(),
        })
    }

    fn auth_header(&self) -> String {
        self.api_key.clone()
    }

    pub(super) async fn matrix(&self, points: &[(f64, f64)]) -> DispatchResult<Vec<Vec<f64>>> {
        let url = format!("{}/v2/matrix/{}", self.base_url, ORS_PROFILE);
        let locations: Vec<[f64; 2]> = points.iter().map(|(lon, lat)| [*lon, *lat]).collect();
        let payload = json!({
            "locations": locations,
            "metrics": ["distance"],
        });
        trace!(%url, n = points.len(), "requesting distance matrix from ORS");

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!("ORS matrix request failed: {e}");
                DispatchError::RoutingOracleError(format!("matrix request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, "ORS matrix call returned non-success status");
            return Err(DispatchError::RoutingOracleError(format!(
                "ORS matrix call failed with status {status}"
            )));
        }

        let body: Value = response.json().await.map_err(|e| {
            error!("failed to parse ORS matrix response: {e}");
            DispatchError::RoutingOracleError(format!("invalid matrix response: {e}"))
        })?;

        let distances = body["distances"].as_array().ok_or_else(|| {
            DispatchError::RoutingOracleError("ORS response missing distances field".to_string())
        })?;

        let matrix = distances
            .iter()
            .map(|row| {
                row.as_array()
                    .unwrap_or(&Vec::new())
                    .iter()
                    .map(|v| v.as_f64().unwrap_or(f64::INFINITY))
                    .collect::<Vec<f64>>()
            })
            .collect::<Vec<Vec<f64>>>();

        debug!(n = matrix.len(), "received distance matrix from ORS");
        Ok(matrix)
    }

    pub(super) async fn polyline(&self, ordered_points: &[(f64, f64)]) -> DispatchResult<String> {
        let url = format!("{}/v2/directions/{}", self.base_url, ORS_PROFILE);
        let coordinates: Vec<[f64; 2]> = ordered_points
            .iter()
            .map(|(lon, lat)| [*lon, *lat])
            .collect();
        let payload = json!({ "coordinates": coordinates });
        trace!(%url, "requesting directions from ORS");

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!("ORS directions request failed: {e}");
                DispatchError::RoutingOracleError(format!("directions request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, "ORS directions call returned non-success status");
            return Err(DispatchError::RoutingOracleError(format!(
                "ORS directions call failed with status {status}"
            )));
        }

        let body: Value = response.json().await.map_err(|e| {
            DispatchError::RoutingOracleError(format!("invalid directions response: {e}"))
        })?;

        let geometry = body["routes"][0]["geometry"]
            .as_str()
            .ok_or_else(|| {
                DispatchError::RoutingOracleError("ORS response missing route geometry".to_string())
            })?
            .to_string();

        Ok(geometry)
    }

    pub(super) async fn geocode(
        &self,
        address: &str,
        focus: Option<(f64, f64)>,
    ) -> DispatchResult<(f64, f64)> {
        let mut url = format!(
            "{}/geocode/search?api_key={}&text={}",
            self.base_url,
            self.api_key,
            urlencode(address)
        );
        if let Some((lon, lat)) = focus {
            url.push_str(&format!("&focus.point.lon={lon}&focus.point.lat={lat}"));
        }
        trace!(%url, "requesting geocode from ORS");

        let response = self.client.get(&url).send().await.map_err(|e| {
            DispatchError::RoutingOracleError(format!("geocode request failed: {e}"))
        })?;

        let body: Value = response.json().await.map_err(|e| {
            DispatchError::RoutingOracleError(format!("invalid geocode response: {e}"))
        })?;

        let coords = body["features"][0]["geometry"]["coordinates"]
            .as_array()
            .ok_or_else(|| DispatchError::Unreachable(format!("no geocode match for {address}")))?;

        let lon = coords[0].as_f64().unwrap_or(0.0);
        let lat = coords[1].as_f64().unwrap_or(0.0);
        Ok((lon, lat))
    }

    pub(super) async fn autocomplete(
        &self,
        prefix: &str,
    ) -> DispatchResult<Vec<AutocompleteSuggestion>> {
        let url = format!(
            "{}/geocode/autocomplete?api_key={}&text={}",
            self.base_url,
            self.api_key,
            urlencode(prefix)
        );
        trace!(%url, "requesting autocomplete from ORS");

        let response = self.client.get(&url).send().await.map_err(|e| {
            DispatchError::RoutingOracleError(format!("autocomplete request failed: {e}"))
        })?;

        let body: Value = response.json().await.map_err(|e| {
            DispatchError::RoutingOracleError(format!("invalid autocomplete response: {e}"))
        })?;

        let features = body["features"].as_array().cloned().unwrap_or_default();
        let suggestions = features
            .iter()
            .filter_map(|f| {
                let label = f["properties"]["label"].as_str()?.to_string();
                let coords = f["geometry"]["coordinates"].as_array()?;
                let lon = coords.first()?.as_f64()?;
                let lat = coords.get(1)?.as_f64()?;
                Some(AutocompleteSuggestion {
                    label,
                    coord: (lon, lat),
                })
            })
            .collect();

        Ok(suggestions)
    }
}

fn urlencode(s: &str) -> String {
    s.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}
