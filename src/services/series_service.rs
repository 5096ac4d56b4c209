use crate::api::aggregator::{AggregatorClient, FetchError, Point};
use crate::models::{PlotPoint, Series};

/// Split points into `(low, high)` series, keeping payload order.
///
/// Anything not typed `"low"` lands in the high series, including
/// types the aggregator does not document.
pub fn partition_points(points: &[Point]) -> (Series, Series) {
    let mut low = Vec::new();
    let mut high = Vec::new();

    for point in points {
        let plotted = PlotPoint {
            x: point.time,
            y: point.count,
        };
        if point.is_low() {
            low.push(plotted);
        } else {
            high.push(plotted);
        }
    }

    (low, high)
}

/// Fetch the latest payload and partition it
pub async fn fetch_series(client: &AggregatorClient) -> Result<(Series, Series), FetchError> {
    let points = client.fetch_points().await?;
    Ok(partition_points(&points))
}
