//! HTTP surface: the form page, submission handling, and the JSON API.
//!
//! The page handlers always answer 200 with either the results block or an
//! inline error banner; the JSON API maps the error taxonomy onto status
//! codes instead.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{Form, Query, State},
    http::StatusCode,
    response::{Html, Json},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing::error;

use crate::chart::render_components_chart;
use crate::error::AirCheckError;
use crate::models::AirReport;
use crate::service::AirQualityService;

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AirQualityService>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index).post(submit))
        .route("/api/check", get(api_check))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn run(state: AppState, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Web server running at http://localhost:{port}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct SubmitForm {
    #[serde(default)]
    city: String,
}

#[derive(Debug, Deserialize)]
struct CheckParams {
    #[serde(default)]
    city: String,
}

async fn index() -> Html<String> {
    Html(page(&form_section("")))
}

async fn submit(State(state): State<AppState>, Form(form): Form<SubmitForm>) -> Html<String> {
    let body = match state.service.check(&form.city).await {
        Ok(report) => format!(
            "{}{}",
            form_section(report.query.as_str()),
            results_section(&report)
        ),
        Err(check_error) => format!(
            "{}{}",
            form_section(form.city.trim()),
            error_banner(&check_error)
        ),
    };
    Html(page(&body))
}

async fn api_check(
    State(state): State<AppState>,
    Query(params): Query<CheckParams>,
) -> Result<Json<ApiReport>, (StatusCode, Json<ApiError>)> {
    match state.service.check(&params.city).await {
        Ok(report) => Ok(Json(ApiReport::from(&report))),
        Err(check_error) => Err((
            status_for(&check_error),
            Json(ApiError {
                error: check_error.kind(),
                message: check_error.user_message(),
            }),
        )),
    }
}

fn status_for(check_error: &AirCheckError) -> StatusCode {
    match check_error {
        AirCheckError::MissingCredential => StatusCode::SERVICE_UNAVAILABLE,
        AirCheckError::EmptyInput => StatusCode::BAD_REQUEST,
        AirCheckError::GeocodeNotFound => StatusCode::NOT_FOUND,
        AirCheckError::AirQualityUnavailable => StatusCode::BAD_GATEWAY,
    }
}

/// JSON rendition of one error outcome
#[derive(Debug, Serialize)]
struct ApiError {
    error: &'static str,
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct ApiComponent {
    code: String,
    concentration: f64,
}

/// JSON rendition of one report
#[derive(Debug, Serialize)]
struct ApiReport {
    query: String,
    latitude: f64,
    longitude: f64,
    aqi: i64,
    label: &'static str,
    advice: &'static str,
    components: Vec<ApiComponent>,
    observed_at: Option<String>,
}

impl From<&AirReport> for ApiReport {
    fn from(report: &AirReport) -> Self {
        Self {
            query: report.query.clone(),
            latitude: report.coordinates.latitude,
            longitude: report.coordinates.longitude,
            aqi: report.reading.aqi,
            label: report.label,
            advice: report.advice,
            components: report
                .reading
                .components
                .iter()
                .map(|(code, concentration)| ApiComponent {
                    code: code.clone(),
                    concentration: *concentration,
                })
                .collect(),
            observed_at: report
                .reading
                .observed_at
                .and_then(|dt| chrono::DateTime::from_timestamp(dt, 0))
                .map(|stamp| stamp.to_rfc3339()),
        }
    }
}

fn page(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Air Quality Checker</title>
<style>
body {{ font-family: sans-serif; max-width: 52rem; margin: 2rem auto; padding: 0 1rem; color: #222; }}
input[type=text] {{ width: 20rem; padding: 0.4rem; }}
button {{ padding: 0.4rem 0.8rem; }}
table {{ border-collapse: collapse; margin: 1rem 0; }}
th, td {{ border: 1px solid #ccc; padding: 0.3rem 0.8rem; text-align: left; }}
.metric {{ font-size: 2rem; margin: 0.3rem 0; }}
.error {{ color: #b00020; }}
.coords {{ color: #555; }}
footer {{ margin-top: 2rem; border-top: 1px solid #ccc; color: #555; }}
</style>
</head>
<body>
<h1>Air Quality Checker</h1>
<p>Enter a city name (e.g., Taipei or Paris,FR) to check real-time air quality.</p>
{body}
<footer>
<p>Data Source: <a href="https://openweathermap.org/api/air-pollution">OpenWeatherMap Air Pollution API</a></p>
</footer>
</body>
</html>
"#
    )
}

fn form_section(prefill: &str) -> String {
    format!(
        r#"<form method="post" action="/">
<label for="city">City name (add country code if possible, e.g., Tokyo,JP | Paris,FR | Taipei)</label><br>
<input type="text" id="city" name="city" value="{}" placeholder="e.g., Taipei or Paris,FR">
<button type="submit">Check Air Quality</button>
</form>
"#,
        escape_html(prefill)
    )
}

fn error_banner(check_error: &AirCheckError) -> String {
    format!(
        "<p class=\"error\">{}</p>\n",
        escape_html(check_error.user_message())
    )
}

fn results_section(report: &AirReport) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "<p class=\"coords\">Coordinates: {}</p>\n",
        report.coordinates.display()
    ));

    section.push_str("<h2>Air Quality Index (AQI)</h2>\n");
    section.push_str("<p>AQI scale ranges from 1 (Good) to 5 (Very Poor).</p>\n");
    section.push_str(&format!(
        "<p class=\"metric\">{} / {}</p>\n",
        report.reading.aqi,
        escape_html(report.label)
    ));
    section.push_str(&format!("<p>{}</p>\n", escape_html(report.advice)));

    section.push_str("<h2>Pollutant Concentrations (µg/m³)</h2>\n");
    section.push_str("<table>\n<tr><th>Pollutant</th><th>Concentration</th></tr>\n");
    for (code, concentration) in report.reading.display_rows() {
        section.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>\n",
            escape_html(&code),
            concentration
        ));
    }
    section.push_str("</table>\n");

    match render_components_chart(&report.reading.components) {
        Ok(svg) => section.push_str(&svg),
        Err(render_error) => {
            // The page still carries the table; only the chart is lost.
            error!("{:#}", render_error);
        }
    }

    section
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
