//! HTTP handler functions for the incident dashboard API.
//!
//! Handlers validate every parameter before touching the store, then
//! delegate to `ops_dashboard_analytics::queries`.

use actix_web::{HttpResponse, web};
use ops_dashboard_analytics::queries;
use ops_dashboard_analytics_models::{
    DEFAULT_PAGE_SIZE, DistributionDimension, FilterParams, FilterSpec, PageRequest,
    ParameterError, SortSpec, TrendGranularity,
};
use ops_dashboard_server_models::{
    ApiBanner, ApiHealth, IncidentListQueryParams, TrendQueryParams,
};

use crate::{ApiError, AppState};

/// `GET /`
pub async fn root() -> HttpResponse {
    HttpResponse::Ok().json(ApiBanner {
        message: "Operational incident dashboard API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth::ok())
}

/// `GET /filters`
///
/// Lists the values each filter dimension can take and the date span of
/// the data.
pub async fn filters(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let options = queries::list_filter_options(state.db.as_ref()).await?;
    Ok(HttpResponse::Ok().json(options))
}

/// `GET /kpi`
pub async fn kpi(
    params: web::Query<FilterParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let filter = FilterSpec::parse(&params)?;
    let kpi = queries::compute_kpi(state.db.as_ref(), &filter).await?;
    Ok(HttpResponse::Ok().json(kpi))
}

/// `GET /trend`
///
/// Incident counts per day (default) or per week.
pub async fn trend(
    params: web::Query<FilterParams>,
    trend: web::Query<TrendQueryParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let filter = FilterSpec::parse(&params)?;
    let granularity = trend_granularity(&trend)?;
    let points = queries::compute_trend(state.db.as_ref(), &filter, granularity).await?;
    Ok(HttpResponse::Ok().json(points))
}

/// `GET /distribution/sectors`
pub async fn distribution_sectors(
    params: web::Query<FilterParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    distribution(&params, &state, DistributionDimension::Sector).await
}

/// `GET /distribution/directions`
pub async fn distribution_directions(
    params: web::Query<FilterParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    distribution(&params, &state, DistributionDimension::Direction).await
}

/// `GET /distribution/types`
pub async fn distribution_types(
    params: web::Query<FilterParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    distribution(&params, &state, DistributionDimension::EventType).await
}

async fn distribution(
    params: &FilterParams,
    state: &AppState,
    dimension: DistributionDimension,
) -> Result<HttpResponse, ApiError> {
    let filter = FilterSpec::parse(params)?;
    let entries = queries::compute_distribution(state.db.as_ref(), &filter, dimension).await?;
    Ok(HttpResponse::Ok().json(entries))
}

/// `GET /heatmap`
///
/// Sector × week incident counts with every cell present.
pub async fn heatmap(
    params: web::Query<FilterParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let filter = FilterSpec::parse(&params)?;
    let heatmap = queries::compute_heatmap(state.db.as_ref(), &filter).await?;
    Ok(HttpResponse::Ok().json(heatmap))
}

/// `GET /incidents`
///
/// One page of incidents plus the total matching count.
pub async fn incidents(
    params: web::Query<FilterParams>,
    list: web::Query<IncidentListQueryParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let filter = FilterSpec::parse(&params)?;
    let (sort, page) = list_request(&list)?;
    let page = queries::list_incidents(state.db.as_ref(), &filter, sort, page).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// `GET /incidents/{id}`
pub async fn incident(
    id: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let incident = queries::get_incident(state.db.as_ref(), id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(incident))
}

fn trend_granularity(params: &TrendQueryParams) -> Result<TrendGranularity, ParameterError> {
    params
        .group
        .as_deref()
        .map_or(Ok(TrendGranularity::Day), TrendGranularity::parse)
}

fn list_request(
    params: &IncidentListQueryParams,
) -> Result<(SortSpec, PageRequest), ParameterError> {
    let sort = SortSpec::parse(
        params.sort.as_deref().unwrap_or("occurred_at"),
        params.order.as_deref().unwrap_or("desc"),
    )?;
    let page = PageRequest::new(
        params.page.unwrap_or(1),
        params
            .page_size
            .unwrap_or_else(|| i64::from(DEFAULT_PAGE_SIZE)),
    )?;
    Ok((sort, page))
}
