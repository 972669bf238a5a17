use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

use crate::types::{MetricAggregation, MetricFilter, MetricPoint, MetricsQuery, MetricsResponse};
use crate::{HttpTransport, SdkError};

pub const QUERY_PATH: &str = "/v2/metrics/cloud/query";

pub const RECEIVED_RECORDS: &str = "io.confluent.kafka.server/received_records";
/// Request counts per principal; also reports human users (`u-...`)
pub const REQUEST_COUNT: &str = "io.confluent.kafka.server/request_count";

pub const TOPIC_LABEL: &str = "metric.topic";
pub const PRINCIPAL_LABEL: &str = "metric.principal_id";

const CLUSTER_FIELD: &str = "resource.kafka.id";

/// Query parameters shared by every metrics request
#[derive(Debug, Clone)]
pub struct QueryWindow {
    /// Trailing period ending now
    pub window: Duration,
    pub granularity: String,
    /// Page size
    pub limit: u32,
}

/// Client for the telemetry metrics API
#[derive(Debug, Clone)]
pub struct MetricsClient {
    transport: HttpTransport,
    cluster_id: String,
    window: QueryWindow,
}

impl MetricsClient {
    pub fn new(transport: HttpTransport, cluster_id: &str, window: QueryWindow) -> Self {
        Self {
            transport,
            cluster_id: cluster_id.to_string(),
            window,
        }
    }

    /// Run a grouped query over the trailing window, following every page
    pub async fn query(&self, metric: &str, group_by: &str) -> Result<Vec<MetricPoint>, SdkError> {
        let query = MetricsQuery {
            aggregations: vec![MetricAggregation {
                metric: metric.to_string(),
            }],
            filter: MetricFilter {
                field: CLUSTER_FIELD.to_string(),
                op: "EQ".to_string(),
                value: self.cluster_id.clone(),
            },
            granularity: self.window.granularity.clone(),
            group_by: vec![group_by.to_string()],
            intervals: vec![trailing_interval(Utc::now(), self.window.window)?],
            limit: self.window.limit,
        };

        let mut points = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = BTreeSet::new();
        loop {
            let response: MetricsResponse = match &page_token {
                Some(token) => {
                    self.transport
                        .post_with_query(QUERY_PATH, &[("page_token", token.as_str())], &query)
                        .await?
                }
                None => self.transport.post(QUERY_PATH, &query).await?,
            };
            points.extend(response.data);

            match response.meta.pagination.next_page_token {
                Some(token) if !token.is_empty() => {
                    if !seen_tokens.insert(token.clone()) {
                        return Err(SdkError::InvalidResponse(format!(
                            "{metric} pagination repeated page token {token}"
                        )));
                    }
                    page_token = Some(token);
                }
                _ => break,
            }
        }

        log::debug!("{metric} grouped by {group_by}: {} points", points.len());
        Ok(points)
    }

    /// Topics that received at least one record in the window
    pub async fn active_topics(&self) -> Result<BTreeSet<String>, SdkError> {
        let points = self.query(RECEIVED_RECORDS, TOPIC_LABEL).await?;
        Ok(points.into_iter().filter_map(|p| p.topic).collect())
    }

    /// Request count per principal, summed over the window
    pub async fn connections_by_principal(&self) -> Result<BTreeMap<String, f64>, SdkError> {
        let points = self.query(REQUEST_COUNT, PRINCIPAL_LABEL).await?;
        let mut totals = BTreeMap::new();
        for point in points {
            if let Some(principal) = point.principal_id {
                *totals.entry(principal).or_insert(0.0) += point.value;
            }
        }
        Ok(totals)
    }
}

/// ISO-8601 interval `<now - window>/<now>` at second precision
pub fn trailing_interval(now: DateTime<Utc>, window: Duration) -> Result<String, SdkError> {
    let window = TimeDelta::from_std(window)
        .map_err(|e| SdkError::InvalidRequest(format!("activity window out of range: {e}")))?;
    let start = now
        .checked_sub_signed(window)
        .ok_or_else(|| SdkError::InvalidRequest("activity window out of range".to_string()))?;
    Ok(format!(
        "{}/{}",
        start.to_rfc3339_opts(SecondsFormat::Secs, true),
        now.to_rfc3339_opts(SecondsFormat::Secs, true)
    ))
}
