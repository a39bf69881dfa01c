use axum::http::StatusCode;
use axum::response::Json;
use compute::MonthFilter;
use tracing::warn;

use crate::schemas::ErrorResponse;

/// Parse an optional `month` query value into a typed filter.
///
/// A missing value means no restriction. A present but malformed value is a
/// client error, never silently ignored.
pub fn parse_month(
    month: Option<&str>,
) -> Result<Option<MonthFilter>, (StatusCode, Json<ErrorResponse>)> {
    match month {
        None => Ok(None),
        Some(raw) => match raw.parse::<MonthFilter>() {
            Ok(filter) => Ok(Some(filter)),
            Err(parse_error) => {
                warn!("Rejected month query value '{}': {}", raw, parse_error);
                Err((
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: parse_error.to_string(),
                        code: "INVALID_MONTH_FILTER".to_string(),
                        success: false,
                    }),
                ))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_month_is_no_filter() {
        assert!(parse_month(None).unwrap().is_none());
    }

    #[test]
    fn valid_month_parses() {
        let filter = parse_month(Some("2024-03")).unwrap().unwrap();
        assert_eq!(filter.to_string(), "2024-03");
    }

    #[test]
    fn malformed_month_is_bad_request() {
        let (status, body) = parse_month(Some("March 2024")).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0.code, "INVALID_MONTH_FILTER");
    }
}
