//! The read operations behind the dashboard.
//!
//! Each operation builds the shared [`Predicate`] from the request's
//! [`FilterSpec`], runs parameterized SQL against an [`IncidentStore`], and
//! shapes the rows into a typed result. Column names and SQL keywords come
//! only from fixed allow-lists; every request-supplied value is bound.

use chrono::NaiveDate;
use moosicbox_json_utils::database::ToValue as _;
use ops_dashboard_analytics_models::{
    DATE_FORMAT, DistributionDimension, FilterOptions, FilterSpec, Heatmap, HeatmapRow,
    IncidentPage, Kpi, LabelCount, PageRequest, ParameterError, SortSpec, TrendGranularity,
    TrendPoint,
};
use ops_dashboard_database_models::{INCIDENT_COLUMNS, IncidentRow};
use switchy_database::{DatabaseValue, Row};

use crate::AnalyticsError;
use crate::pivot::densify;
use crate::predicate::Predicate;
use crate::store::IncidentStore;

/// Computes the headline KPIs for the filtered incidents.
///
/// The top direction is the first entry of the direction distribution, so
/// it shares that ordering: highest count first, ties by label.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the filter is invalid or a query fails.
pub async fn compute_kpi<S: IncidentStore + ?Sized>(
    store: &S,
    filter: &FilterSpec,
) -> Result<Kpi, AnalyticsError> {
    let predicate = Predicate::from_filter(filter)?;
    let wc = predicate.where_clause();

    let sql = format!(
        "SELECT COUNT(*) AS total_incidents,
                COALESCE(SUM(intensity), 0)::bigint AS total_intensity,
                COALESCE(AVG(intensity), 0)::float8 AS avg_intensity
         FROM incidents{wc}"
    );
    log::debug!("KPI query: {sql}");

    let rows = store.fetch(&sql, &predicate.values()).await?;
    let row = rows.first().ok_or_else(|| AnalyticsError::Conversion {
        message: "KPI query returned no rows".to_string(),
    })?;

    let total_incidents = count_column(row, "total_incidents")?;
    let total_intensity: i64 = row
        .to_value("total_intensity")
        .map_err(|e| conversion("total_intensity", e))?;
    let avg_intensity: f64 = row
        .to_value("avg_intensity")
        .map_err(|e| conversion("avg_intensity", e))?;

    let top_direction = fetch_distribution(store, &predicate, DistributionDimension::Direction)
        .await?
        .into_iter()
        .next()
        .map(|entry| entry.label);

    Ok(Kpi {
        total_incidents,
        total_intensity,
        avg_intensity: round2(avg_intensity),
        top_direction,
    })
}

/// Counts filtered incidents per day or per week, ascending by bucket.
///
/// Only buckets with at least one incident are returned.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the filter is invalid or a query fails.
pub async fn compute_trend<S: IncidentStore + ?Sized>(
    store: &S,
    filter: &FilterSpec,
    granularity: TrendGranularity,
) -> Result<Vec<TrendPoint>, AnalyticsError> {
    let predicate = Predicate::from_filter(filter)?;
    let wc = predicate.where_clause();
    let unit = trunc_unit(granularity);

    let sql = format!(
        "SELECT date_trunc('{unit}', occurred_at)::date::text AS bucket, COUNT(*) AS cnt
         FROM incidents{wc}
         GROUP BY bucket
         ORDER BY bucket"
    );
    log::debug!("Trend ({granularity}) query: {sql}");

    let rows = store.fetch(&sql, &predicate.values()).await?;

    let mut points = rows
        .iter()
        .map(|row| {
            Ok(TrendPoint {
                bucket: date_column(row, "bucket")?,
                count: count_column(row, "cnt")?,
            })
        })
        .collect::<Result<Vec<_>, AnalyticsError>>()?;
    points.sort_by_key(|point| point.bucket);

    Ok(points)
}

/// Counts filtered incidents per label of `dimension`, ordered by count
/// descending and then label ascending.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the filter is invalid or a query fails.
pub async fn compute_distribution<S: IncidentStore + ?Sized>(
    store: &S,
    filter: &FilterSpec,
    dimension: DistributionDimension,
) -> Result<Vec<LabelCount>, AnalyticsError> {
    let predicate = Predicate::from_filter(filter)?;
    fetch_distribution(store, &predicate, dimension).await
}

async fn fetch_distribution<S: IncidentStore + ?Sized>(
    store: &S,
    predicate: &Predicate,
    dimension: DistributionDimension,
) -> Result<Vec<LabelCount>, AnalyticsError> {
    let column = dimension.column();
    let wc = predicate.where_clause();

    let sql = format!(
        "SELECT {column} AS label, COUNT(*) AS cnt
         FROM incidents{wc}
         GROUP BY {column}
         ORDER BY cnt DESC, label ASC"
    );
    log::debug!("Distribution ({dimension}) query: {sql}");

    let rows = store.fetch(&sql, &predicate.values()).await?;

    let mut entries = rows
        .iter()
        .map(|row| {
            Ok(LabelCount {
                label: row.to_value("label").map_err(|e| conversion("label", e))?,
                count: count_column(row, "cnt")?,
            })
        })
        .collect::<Result<Vec<_>, AnalyticsError>>()?;
    sort_by_count_then_label(&mut entries);

    Ok(entries)
}

/// Orders entries by count descending, breaking ties by label ascending.
///
/// Applied after every grouped label query so the ordering does not depend
/// on the store's collation.
pub fn sort_by_count_then_label(entries: &mut [LabelCount]) {
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
}

/// Builds the dense sector × week heatmap for the filtered incidents.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the filter is invalid or a query fails.
pub async fn compute_heatmap<S: IncidentStore + ?Sized>(
    store: &S,
    filter: &FilterSpec,
) -> Result<Heatmap, AnalyticsError> {
    let predicate = Predicate::from_filter(filter)?;
    let wc = predicate.where_clause();

    let sql = format!(
        "SELECT sector, date_trunc('week', occurred_at)::date::text AS week, COUNT(*) AS cnt
         FROM incidents{wc}
         GROUP BY sector, week
         ORDER BY sector, week"
    );
    log::debug!("Heatmap query: {sql}");

    let rows = store.fetch(&sql, &predicate.values()).await?;

    let cells = rows
        .iter()
        .map(|row| {
            let sector: String = row.to_value("sector").map_err(|e| conversion("sector", e))?;
            Ok((sector, date_column(row, "week")?, count_column(row, "cnt")?))
        })
        .collect::<Result<Vec<(String, NaiveDate, u64)>, AnalyticsError>>()?;

    let grid = densify(cells);

    Ok(Heatmap {
        columns: grid.columns,
        rows: grid
            .rows
            .into_iter()
            .map(|row| HeatmapRow {
                sector: row.key,
                values: row.values,
            })
            .collect(),
    })
}

/// Lists one page of filtered incidents together with the total count.
///
/// Rows are ordered by the requested field and direction, then by
/// identifier descending so that pages never overlap or skip rows when the
/// primary field has duplicates.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the filter is invalid or a query fails.
pub async fn list_incidents<S: IncidentStore + ?Sized>(
    store: &S,
    filter: &FilterSpec,
    sort: SortSpec,
    page: PageRequest,
) -> Result<IncidentPage, AnalyticsError> {
    let predicate = Predicate::from_filter(filter)?;
    let wc = predicate.where_clause();
    let values = predicate.values();

    let limit = i64::try_from(page.limit())
        .map_err(|_| ParameterError::new("page_size", "page_size is out of range"))?;
    let offset = page
        .offset()
        .and_then(|offset| i64::try_from(offset).ok())
        .ok_or_else(|| ParameterError::new("page", "page is out of range"))?;

    let count_sql = format!("SELECT COUNT(*) AS total FROM incidents{wc}");
    log::debug!("Incident count query: {count_sql}");

    let count_rows = store.fetch(&count_sql, &values).await?;
    let total = count_rows
        .first()
        .map_or(Ok(0), |row| count_column(row, "total"))?;

    let limit_idx = predicate.next_placeholder();
    let offset_idx = limit_idx + 1;
    let order_by = order_by_clause(sort);

    let sql = format!(
        "SELECT {INCIDENT_COLUMNS}
         FROM incidents{wc}
         ORDER BY {order_by}
         LIMIT ${limit_idx} OFFSET ${offset_idx}"
    );
    log::debug!("Incident page query: {sql}");

    let rows = store
        .fetch(
            &sql,
            &predicate.values_with([DatabaseValue::Int64(limit), DatabaseValue::Int64(offset)]),
        )
        .await?;

    let items = rows
        .iter()
        .map(incident_from_row)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(IncidentPage {
        total,
        page: page.page(),
        page_size: page.page_size(),
        items,
    })
}

/// Renders the list ordering: the requested key, then `id DESC`.
///
/// The tie-break is appended even when the primary key is `id` itself.
#[must_use]
pub fn order_by_clause(sort: SortSpec) -> String {
    format!("{} {}, id DESC", sort.field.column(), sort.order.keyword())
}

/// Fetches a single incident by identifier.
///
/// # Errors
///
/// Returns [`AnalyticsError::NotFound`] if no incident has this
/// identifier, or another [`AnalyticsError`] if the query fails.
pub async fn get_incident<S: IncidentStore + ?Sized>(
    store: &S,
    id: i64,
) -> Result<IncidentRow, AnalyticsError> {
    let sql = format!("SELECT {INCIDENT_COLUMNS} FROM incidents WHERE id = $1");

    let rows = store.fetch(&sql, &[DatabaseValue::Int64(id)]).await?;
    let row = rows.first().ok_or(AnalyticsError::NotFound { id })?;

    incident_from_row(row)
}

/// Lists the values available for each filter dimension and the overall
/// date span of the data.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if a query fails.
pub async fn list_filter_options<S: IncidentStore + ?Sized>(
    store: &S,
) -> Result<FilterOptions, AnalyticsError> {
    let sectors = fetch_distinct(store, DistributionDimension::Sector).await?;
    let directions = fetch_distinct(store, DistributionDimension::Direction).await?;
    let event_types = fetch_distinct(store, DistributionDimension::EventType).await?;

    let rows = store
        .fetch(
            "SELECT MIN(occurred_at)::date::text AS min_date,
                    MAX(occurred_at)::date::text AS max_date
             FROM incidents",
            &[],
        )
        .await?;

    let (min_date, max_date) = match rows.first() {
        Some(row) => (
            optional_date_column(row, "min_date")?,
            optional_date_column(row, "max_date")?,
        ),
        None => (None, None),
    };

    Ok(FilterOptions {
        sectors,
        directions,
        event_types,
        min_date,
        max_date,
    })
}

async fn fetch_distinct<S: IncidentStore + ?Sized>(
    store: &S,
    dimension: DistributionDimension,
) -> Result<Vec<String>, AnalyticsError> {
    let column = dimension.column();
    let sql = format!("SELECT DISTINCT {column} AS label FROM incidents ORDER BY label");

    let rows = store.fetch(&sql, &[]).await?;

    let mut labels = rows
        .iter()
        .map(|row| row.to_value("label").map_err(|e| conversion("label", e)))
        .collect::<Result<Vec<String>, _>>()?;
    labels.sort_unstable();

    Ok(labels)
}

const fn trunc_unit(granularity: TrendGranularity) -> &'static str {
    match granularity {
        TrendGranularity::Day => "day",
        TrendGranularity::Week => "week",
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn incident_from_row(row: &Row) -> Result<IncidentRow, AnalyticsError> {
    Ok(IncidentRow {
        id: row.to_value("id").map_err(|e| conversion("id", e))?,
        occurred_at: row
            .to_value("occurred_at")
            .map_err(|e| conversion("occurred_at", e))?,
        sector: row.to_value("sector").map_err(|e| conversion("sector", e))?,
        direction: row
            .to_value("direction")
            .map_err(|e| conversion("direction", e))?,
        event_type: row
            .to_value("event_type")
            .map_err(|e| conversion("event_type", e))?,
        intensity: row
            .to_value("intensity")
            .map_err(|e| conversion("intensity", e))?,
        source: row.to_value("source").map_err(|e| conversion("source", e))?,
        summary: row.to_value("summary").map_err(|e| conversion("summary", e))?,
    })
}

fn count_column(row: &Row, column: &str) -> Result<u64, AnalyticsError> {
    let value: i64 = row.to_value(column).map_err(|e| conversion(column, e))?;
    u64::try_from(value).map_err(|_| AnalyticsError::Conversion {
        message: format!("Negative count in column '{column}': {value}"),
    })
}

fn date_column(row: &Row, column: &str) -> Result<NaiveDate, AnalyticsError> {
    let text: String = row.to_value(column).map_err(|e| conversion(column, e))?;
    parse_date(column, &text)
}

fn optional_date_column(row: &Row, column: &str) -> Result<Option<NaiveDate>, AnalyticsError> {
    let text: Option<String> = row.to_value(column).map_err(|e| conversion(column, e))?;
    text.map(|text| parse_date(column, &text)).transpose()
}

fn parse_date(column: &str, text: &str) -> Result<NaiveDate, AnalyticsError> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|e| AnalyticsError::Conversion {
        message: format!("Invalid date '{text}' in column '{column}': {e}"),
    })
}

fn conversion(column: &str, error: impl std::fmt::Display) -> AnalyticsError {
    AnalyticsError::Conversion {
        message: format!("Failed to read column '{column}': {error}"),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDateTime, NaiveTime};
    use ops_dashboard_analytics_models::{FilterParams, MinIntensity, SortField, SortOrder};

    use super::*;
    use crate::testing::{RecordingStore, row, squash};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn text(s: &str) -> DatabaseValue {
        DatabaseValue::String(s.to_string())
    }

    fn label_row(label: &str, count: i64) -> Row {
        row(vec![("label", text(label)), ("cnt", DatabaseValue::Int64(count))])
    }

    fn kpi_row(total: i64, sum: i64, avg: f64) -> Row {
        row(vec![
            ("total_incidents", DatabaseValue::Int64(total)),
            ("total_intensity", DatabaseValue::Int64(sum)),
            ("avg_intensity", DatabaseValue::Real64(avg)),
        ])
    }

    fn incident_row(id: i64, intensity: i32) -> Row {
        let occurred_at = date("2024-01-01").and_time(NaiveTime::MIN);
        row(vec![
            ("id", DatabaseValue::Int64(id)),
            ("occurred_at", DatabaseValue::DateTime(occurred_at)),
            ("sector", text("North")),
            ("direction", text("Kharkiv")),
            ("event_type", text("Recon")),
            ("intensity", DatabaseValue::Int32(intensity)),
            ("source", DatabaseValue::Null),
            ("summary", text("Recon in North/Kharkiv")),
        ])
    }

    fn dated_filter() -> FilterSpec {
        FilterSpec::parse(&FilterParams {
            from: Some("2024-01-01".to_string()),
            to: Some("2024-01-01".to_string()),
            ..FilterParams::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn kpi_reads_totals_and_top_direction() {
        let store = RecordingStore::new()
            .with_rows(vec![kpi_row(3, 41, 13.666_666)])
            .with_rows(vec![label_row("Sumy", 2), label_row("Dnipro", 1)]);

        let kpi = compute_kpi(&store, &FilterSpec::default()).await.unwrap();

        assert_eq!(
            kpi,
            Kpi {
                total_incidents: 3,
                total_intensity: 41,
                avg_intensity: 13.67,
                top_direction: Some("Sumy".to_string()),
            }
        );

        let calls = store.calls();
        assert_eq!(calls.len(), 2);
        assert!(!calls[0].sql.contains("WHERE"));
        assert!(squash(&calls[1].sql).contains("GROUP BY direction ORDER BY cnt DESC, label ASC"));
    }

    #[tokio::test]
    async fn kpi_with_no_matches_is_zero_and_has_no_top_direction() {
        let store = RecordingStore::new().with_rows(vec![kpi_row(0, 0, 0.0)]);

        let kpi = compute_kpi(&store, &FilterSpec::default()).await.unwrap();

        assert_eq!(kpi.total_incidents, 0);
        assert_eq!(kpi.total_intensity, 0);
        assert!(kpi.avg_intensity.abs() < f64::EPSILON);
        assert_eq!(kpi.top_direction, None);
    }

    #[tokio::test]
    async fn kpi_top_direction_ties_break_by_label() {
        let store = RecordingStore::new()
            .with_rows(vec![kpi_row(4, 10, 2.5)])
            .with_rows(vec![label_row("Sumy", 2), label_row("Dnipro", 2)]);

        let kpi = compute_kpi(&store, &FilterSpec::default()).await.unwrap();

        assert_eq!(kpi.top_direction.as_deref(), Some("Dnipro"));
    }

    #[tokio::test]
    async fn kpi_same_day_range_binds_next_midnight_to_both_queries() {
        let store = RecordingStore::new()
            .with_rows(vec![kpi_row(1, 5, 5.0)])
            .with_rows(vec![label_row("Kherson", 1)]);

        let kpi = compute_kpi(&store, &dated_filter()).await.unwrap();
        assert_eq!(kpi.total_incidents, 1);

        let next_midnight: NaiveDateTime = date("2024-01-02").and_time(NaiveTime::MIN);
        for call in store.calls() {
            assert!(squash(&call.sql).contains("WHERE occurred_at >= $1 AND occurred_at < $2"));
            assert_eq!(call.params.len(), 2);
            assert!(matches!(call.params[1], DatabaseValue::DateTime(dt) if dt == next_midnight));
        }
    }

    #[tokio::test]
    async fn trend_by_week_truncates_to_week_and_stays_ascending() {
        let store = RecordingStore::new().with_rows(vec![
            row(vec![("bucket", text("2024-01-08")), ("cnt", DatabaseValue::Int64(3))]),
            row(vec![("bucket", text("2024-01-01")), ("cnt", DatabaseValue::Int64(5))]),
        ]);

        let trend = compute_trend(&store, &FilterSpec::default(), TrendGranularity::Week)
            .await
            .unwrap();

        assert_eq!(
            trend,
            vec![
                TrendPoint {
                    bucket: date("2024-01-01"),
                    count: 5,
                },
                TrendPoint {
                    bucket: date("2024-01-08"),
                    count: 3,
                },
            ]
        );
        assert!(store.calls()[0].sql.contains("date_trunc('week', occurred_at)"));
    }

    #[tokio::test]
    async fn trend_by_day_has_no_zero_fill() {
        let store = RecordingStore::new().with_rows(vec![
            row(vec![("bucket", text("2024-01-01")), ("cnt", DatabaseValue::Int64(1))]),
            row(vec![("bucket", text("2024-01-04")), ("cnt", DatabaseValue::Int64(2))]),
        ]);

        let trend = compute_trend(&store, &FilterSpec::default(), TrendGranularity::Day)
            .await
            .unwrap();

        assert_eq!(trend.len(), 2);
        assert!(store.calls()[0].sql.contains("date_trunc('day', occurred_at)"));
    }

    #[tokio::test]
    async fn distribution_orders_by_count_desc_then_label_asc() {
        let store = RecordingStore::new().with_rows(vec![
            label_row("A", 3),
            label_row("C", 5),
            label_row("B", 5),
        ]);

        let dist = compute_distribution(
            &store,
            &FilterSpec::default(),
            DistributionDimension::Direction,
        )
        .await
        .unwrap();

        let pairs: Vec<(&str, u64)> = dist.iter().map(|e| (e.label.as_str(), e.count)).collect();
        assert_eq!(pairs, vec![("B", 5), ("C", 5), ("A", 3)]);
    }

    #[tokio::test]
    async fn distribution_groups_by_requested_column() {
        for (dimension, column) in [
            (DistributionDimension::Sector, "sector"),
            (DistributionDimension::Direction, "direction"),
            (DistributionDimension::EventType, "event_type"),
        ] {
            let store = RecordingStore::new();
            compute_distribution(&store, &FilterSpec::default(), dimension)
                .await
                .unwrap();

            let sql = squash(&store.calls()[0].sql);
            assert!(sql.starts_with(&format!("SELECT {column} AS label")));
            assert!(sql.contains(&format!("GROUP BY {column}")));
        }
    }

    #[tokio::test]
    async fn heatmap_zero_fills_missing_sector_weeks() {
        let store = RecordingStore::new().with_rows(vec![
            row(vec![
                ("sector", text("North")),
                ("week", text("2024-01-01")),
                ("cnt", DatabaseValue::Int64(2)),
            ]),
            row(vec![
                ("sector", text("South")),
                ("week", text("2024-01-08")),
                ("cnt", DatabaseValue::Int64(1)),
            ]),
        ]);

        let heatmap = compute_heatmap(&store, &FilterSpec::default()).await.unwrap();

        assert_eq!(heatmap.columns, vec![date("2024-01-01"), date("2024-01-08")]);
        assert_eq!(
            heatmap.rows,
            vec![
                HeatmapRow {
                    sector: "North".to_string(),
                    values: vec![2, 0],
                },
                HeatmapRow {
                    sector: "South".to_string(),
                    values: vec![0, 1],
                },
            ]
        );
        assert!(squash(&store.calls()[0].sql).contains("GROUP BY sector, week"));
    }

    #[tokio::test]
    async fn heatmap_with_no_rows_is_empty() {
        let store = RecordingStore::new();
        let heatmap = compute_heatmap(&store, &FilterSpec::default()).await.unwrap();
        assert_eq!(heatmap, Heatmap::default());
    }

    #[tokio::test]
    async fn list_sorts_with_id_tie_break_and_binds_limit_offset() {
        let items = (1..=5).map(|id| incident_row(id, 3)).collect();
        let store = RecordingStore::new()
            .with_rows(vec![row(vec![("total", DatabaseValue::Int64(12))])])
            .with_rows(items);

        let sort = SortSpec::parse("intensity", "asc").unwrap();
        let page = PageRequest::new(1, 5).unwrap();
        let result = list_incidents(&store, &FilterSpec::default(), sort, page)
            .await
            .unwrap();

        assert_eq!(result.total, 12);
        assert_eq!(result.page, 1);
        assert_eq!(result.page_size, 5);
        assert_eq!(result.items.len(), 5);
        assert_eq!(result.items[0].source, None);

        let calls = store.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(squash(&calls[0].sql), "SELECT COUNT(*) AS total FROM incidents");
        assert!(
            squash(&calls[1].sql).ends_with("ORDER BY intensity ASC, id DESC LIMIT $1 OFFSET $2")
        );
        assert!(matches!(calls[1].params[..], [DatabaseValue::Int64(5), DatabaseValue::Int64(0)]));
    }

    #[tokio::test]
    async fn list_placeholders_continue_after_filter_values() {
        let store = RecordingStore::new()
            .with_rows(vec![row(vec![("total", DatabaseValue::Int64(40))])]);
        let filter = FilterSpec {
            sector: Some("East".to_string()),
            min_intensity: Some(MinIntensity::new(5).unwrap()),
            ..FilterSpec::default()
        };

        let page = PageRequest::new(3, 10).unwrap();
        let result = list_incidents(&store, &filter, SortSpec::default(), page)
            .await
            .unwrap();

        assert!(result.items.is_empty());
        let calls = store.calls();
        assert_eq!(calls[0].params.len(), 2);
        let sql = squash(&calls[1].sql);
        assert!(sql.contains("WHERE sector = $1 AND intensity >= $2"));
        assert!(sql.ends_with("ORDER BY occurred_at DESC, id DESC LIMIT $3 OFFSET $4"));
        assert!(matches!(
            calls[1].params[..],
            [
                DatabaseValue::String(_),
                DatabaseValue::Int32(5),
                DatabaseValue::Int64(10),
                DatabaseValue::Int64(20),
            ]
        ));
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty_with_total() {
        let store = RecordingStore::new()
            .with_rows(vec![row(vec![("total", DatabaseValue::Int64(12))])])
            .with_rows(Vec::new());

        let page = PageRequest::new(50, 5).unwrap();
        let result = list_incidents(&store, &FilterSpec::default(), SortSpec::default(), page)
            .await
            .unwrap();

        assert_eq!(result.total, 12);
        assert!(result.items.is_empty());
        assert!(matches!(store.calls()[1].params[1], DatabaseValue::Int64(245)));
    }

    #[tokio::test]
    async fn offset_beyond_bigint_is_rejected_before_querying() {
        let store = RecordingStore::new();

        let page = PageRequest::new(i64::MAX / 4, 5).unwrap();
        assert!(page.offset().is_some());
        let err = list_incidents(&store, &FilterSpec::default(), SortSpec::default(), page)
            .await
            .unwrap_err();

        assert!(matches!(err, AnalyticsError::InvalidParameter(ref e) if e.parameter == "page"));
        assert!(store.calls().is_empty());
    }

    #[test]
    fn order_by_always_appends_id_desc() {
        for field in SortField::all() {
            for order in [SortOrder::Asc, SortOrder::Desc] {
                let clause = order_by_clause(SortSpec {
                    field: *field,
                    order,
                });
                assert!(clause.ends_with(", id DESC"), "{clause}");
            }
        }
        assert_eq!(
            order_by_clause(SortSpec {
                field: SortField::Id,
                order: SortOrder::Asc,
            }),
            "id ASC, id DESC"
        );
    }

    #[tokio::test]
    async fn get_incident_maps_row() {
        let store = RecordingStore::new().with_rows(vec![incident_row(42, 17)]);

        let incident = get_incident(&store, 42).await.unwrap();

        assert_eq!(incident.id, 42);
        assert_eq!(incident.intensity, 17);
        assert_eq!(incident.sector, "North");
        let calls = store.calls();
        assert!(calls[0].sql.ends_with("WHERE id = $1"));
        assert!(matches!(calls[0].params[..], [DatabaseValue::Int64(42)]));
    }

    #[tokio::test]
    async fn get_missing_incident_is_not_found() {
        let store = RecordingStore::new();

        let err = get_incident(&store, 999).await.unwrap_err();

        assert!(matches!(err, AnalyticsError::NotFound { id: 999 }));
    }

    #[tokio::test]
    async fn store_failure_propagates_as_unavailable() {
        let store = RecordingStore::new().with_failure("connection reset");

        let err = compute_heatmap(&store, &FilterSpec::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AnalyticsError::StoreUnavailable(ref m) if m == "connection reset"));
        assert_eq!(store.calls().len(), 1);
    }

    #[tokio::test]
    async fn missing_column_is_a_conversion_error() {
        let store = RecordingStore::new().with_rows(vec![row(vec![("cnt", DatabaseValue::Int64(1))])]);

        let err = compute_trend(&store, &FilterSpec::default(), TrendGranularity::Day)
            .await
            .unwrap_err();

        assert!(matches!(err, AnalyticsError::Conversion { .. }));
    }

    async fn run_every_aggregate(filter: &FilterSpec) -> (Vec<String>, Vec<(String, String)>) {
        let store = RecordingStore::new()
            .with_rows(vec![kpi_row(4, 20, 5.0)])
            .with_rows(vec![label_row("Donetsk", 4)])
            .with_rows(vec![row(vec![
                ("bucket", text("2024-01-01")),
                ("cnt", DatabaseValue::Int64(4)),
            ])])
            .with_rows(vec![label_row("West", 3), label_row("East", 1)])
            .with_rows(vec![row(vec![
                ("sector", text("West")),
                ("week", text("2024-01-01")),
                ("cnt", DatabaseValue::Int64(4)),
            ])]);

        let results = vec![
            format!("{:?}", compute_kpi(&store, filter).await.unwrap()),
            format!(
                "{:?}",
                compute_trend(&store, filter, TrendGranularity::Day)
                    .await
                    .unwrap()
            ),
            format!(
                "{:?}",
                compute_distribution(&store, filter, DistributionDimension::Sector)
                    .await
                    .unwrap()
            ),
            format!("{:?}", compute_heatmap(&store, filter).await.unwrap()),
        ];
        let queries = store
            .calls()
            .into_iter()
            .map(|call| (call.sql, format!("{:?}", call.params)))
            .collect();

        (results, queries)
    }

    #[tokio::test]
    async fn identical_filters_produce_identical_queries_and_results() {
        let filter = FilterSpec {
            direction: Some("Donetsk".to_string()),
            min_intensity: Some(MinIntensity::new(2).unwrap()),
            ..dated_filter()
        };

        let (first_results, first_queries) = run_every_aggregate(&filter).await;
        let (second_results, second_queries) = run_every_aggregate(&filter).await;

        assert_eq!(first_queries.len(), 5);
        assert_eq!(first_results, second_results);
        assert_eq!(first_queries, second_queries);
    }

    #[tokio::test]
    async fn filter_options_are_sorted_and_dates_optional() {
        let store = RecordingStore::new()
            .with_rows(vec![row(vec![("label", text("South"))]), row(vec![("label", text("North"))])])
            .with_rows(vec![row(vec![("label", text("Sumy"))])])
            .with_rows(vec![row(vec![("label", text("EW"))])])
            .with_rows(vec![row(vec![
                ("min_date", text("2024-01-01")),
                ("max_date", DatabaseValue::Null),
            ])]);

        let options = list_filter_options(&store).await.unwrap();

        assert_eq!(options.sectors, vec!["North", "South"]);
        assert_eq!(options.directions, vec!["Sumy"]);
        assert_eq!(options.event_types, vec!["EW"]);
        assert_eq!(options.min_date, Some(date("2024-01-01")));
        assert_eq!(options.max_date, None);
        assert!(store.calls().iter().all(|c| c.params.is_empty()));
    }
}
