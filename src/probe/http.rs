//! HTTP probe implementation: health check plus metrics scrape.

use chrono::Utc;
use std::time::Duration;

use super::ProbeError;
use crate::store::CounterSnapshot;

/// Probe a target: confirm `/health` answers 2xx, then scrape `/metrics`.
///
/// Returns the parsed counter snapshot on success.
pub async fn run_probe(
    client: &reqwest::Client,
    base_url: &str,
    timeout: Duration,
) -> Result<CounterSnapshot, ProbeError> {
    let health_url = format!("{}/health", base_url);
    let response = client
        .get(&health_url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| classify_reqwest_error(e, timeout))?;

    if !response.status().is_success() {
        return Err(ProbeError::UnhealthyStatus(response.status().as_u16()));
    }

    let metrics_url = format!("{}/metrics", base_url);
    let body = client
        .get(&metrics_url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| classify_reqwest_error(e, timeout))?
        .text()
        .await
        .map_err(|e| ProbeError::Network(e.to_string()))?;

    parse_exposition(&body)
}

fn classify_reqwest_error(e: reqwest::Error, timeout: Duration) -> ProbeError {
    if e.is_timeout() {
        ProbeError::Timeout(timeout)
    } else {
        ProbeError::Network(e.to_string())
    }
}

/// Parse a line-oriented `key value` metrics exposition.
///
/// Recognized keys:
/// ```text
/// http_requests_total <int>
/// http_errors_total <int>
/// http_response_time_avg <float, ms>
/// app_uptime <int, seconds>
/// ```
/// Unknown keys and comment/blank lines are ignored; missing keys default
/// to zero. A recognized key with an unparseable value is an error.
pub fn parse_exposition(body: &str) -> Result<CounterSnapshot, ProbeError> {
    let mut snapshot = CounterSnapshot {
        timestamp: Utc::now(),
        request_count: 0,
        error_count: 0,
        response_time_avg_ms: 0.0,
        uptime_seconds: 0,
    };

    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let key = match parts.next() {
            Some(k) => k,
            None => continue,
        };
        let value = parts
            .next()
            .ok_or_else(|| ProbeError::Exposition(format!("no value for {}", key)))?;

        match key {
            "http_requests_total" => snapshot.request_count = parse_int(key, value)?,
            "http_errors_total" => snapshot.error_count = parse_int(key, value)?,
            "http_response_time_avg" => {
                snapshot.response_time_avg_ms = value.parse::<f64>().map_err(|_| {
                    ProbeError::Exposition(format!("bad float for {}: {}", key, value))
                })?;
            }
            "app_uptime" => snapshot.uptime_seconds = parse_int(key, value)?,
            _ => {}
        }
    }

    Ok(snapshot)
}

fn parse_int(key: &str, value: &str) -> Result<u64, ProbeError> {
    value
        .parse::<u64>()
        .map_err(|_| ProbeError::Exposition(format!("bad integer for {}: {}", key, value)))
}
