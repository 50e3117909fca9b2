use tracing::trace;

use crate::error::DispatchResult;

use super::AutocompleteSuggestion;

/// Straight-line distance oracle. Treats `(lon, lat)` pairs as planar
/// coordinates and reports distances in the same units as the input, scaled
/// by [`EuclideanOracle::scale`] to approximate metres for realistic-looking
/// fixture data. Used for the reproducible end-to-end test scenarios and for
/// offline demos where no `ORS_API_KEY` is configured.
#[derive(Debug, Clone, Copy)]
pub struct EuclideanOracle {
    scale: f64,
}

impl EuclideanOracle {
    /// `scale` converts a unit of input coordinate distance into metres.
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }

    fn dist(&self, a: (f64, f64), b: (f64, f64)) -> f64 {
        let dx = a.0 - b.0;
        let dy = a.1 - b.1;
        (dx * dx + dy * dy).sqrt() * self.scale
    }

    pub(super) async fn matrix(&self, points: &[(f64, f64)]) -> DispatchResult<Vec<Vec<f64>>> {
        trace!(n = points.len(), "computing euclidean distance matrix");
        let n = points.len();
        let mut out = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                out[i][j] = self.dist(points[i], points[j]);
            }
        }
        Ok(out)
    }

    pub(super) async fn polyline(&self, ordered_points: &[(f64, f64)]) -> DispatchResult<String> {
        let encoded = ordered_points
            .iter()
            .map(|(lon, lat)| format!("{lon:.6},{lat:.6}"))
            .collect::<Vec<_>>()
            .join(";");
        Ok(encoded)
    }

    pub(super) async fn geocode(
        &self,
        address: &str,
        focus: Option<(f64, f64)>,
    ) -> DispatchResult<(f64, f64)> {
        // Deterministic pseudo-geocoding: hash the address into an offset
        // around `focus` (or the origin) so repeated calls are stable.
        let hash: u64 = address.bytes().fold(0u64, |acc, b| {
            acc.wrapping_mul(31).wrapping_add(b as u64)
        });
        let (fx, fy) = focus.unwrap_or((0.0, 0.0));
        let dx = (hash % 1000) as f64 / 1000.0;
        let dy = ((hash / 1000) % 1000) as f64 / 1000.0;
        Ok((fx + dx, fy + dy))
    }

    pub(super) async fn autocomplete(
        &self,
        prefix: &str,
    ) -> DispatchResult<Vec<AutocompleteSuggestion>> {
        let coord = self.geocode(prefix, None).await?;
        Ok(vec![AutocompleteSuggestion {
            label: prefix.to_string(),
            coord,
        }])
    }
}
