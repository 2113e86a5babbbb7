use anyhow::{Context, Error, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("fuelwatch/", env!("CARGO_PKG_VERSION"));

/// Builds the shared HTTP client with a bounded per-request timeout.
pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("Failed to build HTTP client")
}

/// Retries an async operation with configurable attempts and delays
///
/// # Parameters
/// - `operation`: Closure returning a future
/// - `retries`: Number of retry attempts (total runs = 1 initial + retries)
/// - `delay_ms`: Milliseconds between retry attempts
///
/// # Returns
/// Either the successful result or the error after all attempts
pub async fn with_retry<F, Fut, T>(
    mut operation: F,
    retries: usize,
    delay_ms: u64,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, reqwest::Error>>,
{
    let mut attempt = 1;
    loop {
        match operation().await.map_err(anyhow::Error::from) {
            Ok(val) => return Ok(val),
            Err(err) => {
                if attempt > retries {
                    return Err(err);
                }
                debug!(
                    "Attempt {}/{} failed: {}. Retrying...",
                    attempt, retries, err
                );
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

/// GETs `url` and returns the body, treating non-2xx statuses as errors.
pub async fn fetch_text(
    client: &reqwest::Client,
    url: &str,
    retries: usize,
    delay_ms: u64,
) -> Result<String> {
    debug!("Requesting {}", url);
    let response = with_retry(
        || async {
            client
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
        },
        retries,
        delay_ms,
    )
    .await
    .with_context(|| format!("Request to {url} failed"))?;

    response
        .text()
        .await
        .with_context(|| format!("Failed to read response body from {url}"))
}

/// Parses decimals written with either `.` or `,` as the decimal separator.
///
/// When both appear, the last one is the decimal separator and the other
/// groups thousands (`1.395,4205`, `1,395.4205`). A lone `,` is decimal; several
/// `.` are thousands separators.
pub fn parse_local_decimal(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '$')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        (None, Some(_)) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        _ => cleaned,
    };
    Decimal::from_str(&normalized).ok()
}

/// Parses `YYYY-MM-DD` or `DD/MM/YYYY`, ignoring any time part.
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().split([' ', 'T']).next()?;
    ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Parses a timestamp in ISO or day-first notation, defaulting to midnight.
pub fn parse_flexible_date_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
    ]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    .or_else(|| parse_flexible_date(raw).map(|d| d.and_time(NaiveTime::MIN)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_local_decimal() {
        assert_eq!(parse_local_decimal("1395.42"), Some(dec!(1395.42)));
        assert_eq!(parse_local_decimal("1.395,4205"), Some(dec!(1395.4205)));
        assert_eq!(parse_local_decimal("1,395.4205"), Some(dec!(1395.4205)));
        assert_eq!(parse_local_decimal("1250,5"), Some(dec!(1250.5)));
        assert_eq!(parse_local_decimal("1.234.567"), Some(dec!(1234567)));
        assert_eq!(parse_local_decimal(" $ 1.250,00 "), Some(dec!(1250.00)));
        assert_eq!(parse_local_decimal(""), None);
        assert_eq!(parse_local_decimal("n/d"), None);
    }

    #[test]
    fn test_parse_flexible_dates() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(parse_flexible_date("2025-03-07"), Some(expected));
        assert_eq!(parse_flexible_date("07/03/2025"), Some(expected));
        assert_eq!(parse_flexible_date("2025-03-07 00:01:00"), Some(expected));
        assert_eq!(parse_flexible_date("March 7"), None);

        assert_eq!(
            parse_flexible_date_time("07/03/2025 00:01"),
            expected.and_hms_opt(0, 1, 0)
        );
        assert_eq!(
            parse_flexible_date_time("2025-03-07"),
            expected.and_hms_opt(0, 0, 0)
        );
    }

    #[tokio::test]
    async fn test_fetch_text_rejects_error_status() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = http_client(5).unwrap();
        let err = fetch_text(&client, &server.uri(), 1, 1).await.unwrap_err();
        assert!(err.to_string().contains("failed"));
        // One initial attempt plus one retry
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }
}
