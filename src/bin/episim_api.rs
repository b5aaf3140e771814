use std::net::SocketAddr;

use ::log::{error, info};
use anyhow::Context;
use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;

use episim::model::Compartment;
use episim::{Scenario, TimeSeries};

#[derive(Debug, Serialize)]
struct RunResponse {
    return_code: i32,
    run_id: String,
    days: u32,
    population: f64,
    compartments: Vec<&'static str>,
    /// One row per compartment, one value per day.
    data: Vec<Vec<f64>>,
    peak_infected: f64,
    peak_day: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    episim::log::init(None, None)?;

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8000);

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/defaults", get(defaults))
        .route("/run_simulation", post(run_simulation));

    let addr: SocketAddr = format!("{}:{}", host, port).parse().context("invalid HOST/PORT")?;
    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.context("bind failed")?;
    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({"ok": true}))
}

async fn defaults() -> impl IntoResponse {
    Json(Scenario::default())
}

async fn run_simulation(Json(scenario): Json<Scenario>) -> impl IntoResponse {
    // Integration is CPU-bound; keep it off the async workers.
    let join = tokio::task::spawn_blocking(move || run_simulation_sync(&scenario));

    match join.await {
        Ok(Ok(resp)) => (StatusCode::OK, Json(resp)).into_response(),
        Ok(Err((code, body))) => (code, Json(body)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"return_code": 2, "error": format!("join error: {e}")})),
        )
            .into_response(),
    }
}

fn run_simulation_sync(scenario: &Scenario) -> Result<RunResponse, (StatusCode, serde_json::Value)> {
    let run_id = format!("{:?}-{}", scenario.model, chrono::Utc::now().timestamp_millis()).to_lowercase();

    let model = scenario.build().map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            json!({"return_code": 1, "error": format!("invalid scenario: {e}")}),
        )
    })?;

    let series = model.get_data().map_err(|e| {
        error!("run {run_id} failed: {e}");
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({"return_code": 2, "error": format!("simulation failed: {e}")}),
        )
    })?;

    let (peak_day, peak_infected) = peak(&series);
    info!("run {run_id}: {} days, peak infected {peak_infected:.0} on day {peak_day}", series.days());

    Ok(RunResponse {
        return_code: 0,
        run_id,
        days: scenario.days,
        population: scenario.population,
        compartments: series.compartments().iter().map(|c| c.label()).collect(),
        data: series.into_rows(),
        peak_infected,
        peak_day,
    })
}

fn peak(series: &TimeSeries) -> (usize, f64) {
    series
        .get(Compartment::Infected)
        .unwrap_or(&[])
        .iter()
        .copied()
        .enumerate()
        .fold((0, 0.0), |best, (day, v)| if v > best.1 { (day, v) } else { best })
}
