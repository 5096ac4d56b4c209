use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Status message the aggregator sends with a usable payload
pub const MESSAGE_OK: &str = "ok";

/// Classification the aggregator gives to below-watermark buckets
pub const POINT_TYPE_LOW: &str = "low";

/// One aggregated bucket as reported by the aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Bucket start, epoch milliseconds
    pub time: i64,
    pub count: f64,
    /// Usually `"low"` or `"high"`. Kept as sent, so a missing, null or
    /// non-string type still parses.
    #[serde(rename = "type", default)]
    pub kind: Option<Value>,
}

impl Point {
    /// Only an exact `"low"` counts as low
    pub fn is_low(&self) -> bool {
        matches!(&self.kind, Some(Value::String(kind)) if kind == POINT_TYPE_LOW)
    }
}

/// Body of the data endpoint.
///
/// `message` is kept as raw JSON so a non-string status is reported as a
/// bad response rather than a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseBody {
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub points: Option<Vec<Point>>,
}

impl ResponseBody {
    /// Check the status message and hand back the points.
    ///
    /// An ok message without a point list is rejected, so the chart keeps
    /// what it shows instead of being cleared.
    pub fn into_points(self) -> Result<Vec<Point>, FetchError> {
        match self.message {
            Some(Value::String(ref message)) if message == MESSAGE_OK => {
                self.points.ok_or_else(|| {
                    FetchError::BadResponse("ok message without a points list".to_string())
                })
            }
            Some(other) => Err(FetchError::BadResponse(format!(
                "server message was {}",
                other
            ))),
            None => Err(FetchError::BadResponse("missing message field".to_string())),
        }
    }
}

/// Failures of a single fetch
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request did not complete
    #[error("Network error: {0}")]
    Network(String),
    /// The body was not a JSON document of the expected shape
    #[error("Parse error: {0}")]
    Parse(String),
    /// The document parsed but was not marked ok
    #[error("Bad response: {0}")]
    BadResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_uses_type_key() {
        let point: Point =
            serde_json::from_str(r#"{"time":1655406600000,"count":70,"type":"high"}"#).unwrap();
        assert_eq!(point.time, 1655406600000);
        assert_eq!(point.count, 70.0);
        assert_eq!(point.kind, Some(Value::String("high".to_string())));
        assert!(!point.is_low());
    }

    #[test]
    fn test_point_without_usable_type_is_not_low() {
        let body: ResponseBody = serde_json::from_str(
            r#"{"message":"ok","points":[
                {"time":1,"count":2,"type":"low"},
                {"time":3,"count":4},
                {"time":5,"count":6,"type":null},
                {"time":7,"count":8,"type":1}
            ]}"#,
        )
        .unwrap();
        let points = body.into_points().unwrap();

        assert_eq!(points.len(), 4);
        assert!(points[0].is_low());
        assert!(points[1..].iter().all(|p| !p.is_low()));
    }

    #[test]
    fn test_ok_message_with_empty_points() {
        let body: ResponseBody = serde_json::from_str(r#"{"message":"ok","points":[]}"#).unwrap();
        assert!(body.into_points().unwrap().is_empty());
    }

    #[test]
    fn test_ok_message_with_null_points_is_bad_response() {
        let body: ResponseBody = serde_json::from_str(r#"{"message":"ok","points":null}"#).unwrap();
        assert!(matches!(body.into_points(), Err(FetchError::BadResponse(_))));
    }

    #[test]
    fn test_ok_message_without_points_is_bad_response() {
        let body: ResponseBody = serde_json::from_str(r#"{"message":"ok"}"#).unwrap();
        assert!(matches!(body.into_points(), Err(FetchError::BadResponse(_))));
    }

    #[test]
    fn test_error_message_is_bad_response() {
        let body: ResponseBody =
            serde_json::from_str(r#"{"message":"error","points":[]}"#).unwrap();
        let err = body.into_points().unwrap_err();
        assert!(matches!(err, FetchError::BadResponse(_)));
        assert!(err.to_string().contains("error"));
    }

    #[test]
    fn test_non_string_message_is_bad_response() {
        let body: ResponseBody = serde_json::from_str(r#"{"message":1,"points":[]}"#).unwrap();
        assert!(matches!(body.into_points(), Err(FetchError::BadResponse(_))));
    }

    #[test]
    fn test_missing_message_is_bad_response() {
        let body: ResponseBody = serde_json::from_str(r#"{"points":[]}"#).unwrap();
        assert!(matches!(
            body.into_points(),
            Err(FetchError::BadResponse(_))
        ));
    }
}
