//! API route handlers.
//!
//! Request handling for budget allocation and A/B-test recommendation,
//! plus health and status introspection.

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use super::envelope::{ApiErrorResponse, ApiResponse};
use crate::ab_engine::{
    RatePredictor, SelectionError, TrainingDiagnostics, VariationGenerator, VariationSelector,
    FeatureEncoder,
};
use crate::allocation::{insights, AllocationError, AllocationOrchestrator};
use crate::llm::LlmBackend;
use crate::types::{CampaignRecord, ScoredVariation, Variation};

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers. The trained predictor and encoder are
/// read-only after startup; only the campaign working set mutates.
#[derive(Clone)]
pub struct ApiState {
    /// Historical records plus appended submissions.
    pub records: Arc<RwLock<Vec<CampaignRecord>>>,
    /// Size of the immutable historical base set.
    pub historical_count: usize,
    pub encoder: Arc<FeatureEncoder>,
    pub predictor: Arc<dyn RatePredictor>,
    pub diagnostics: Arc<TrainingDiagnostics>,
    pub orchestrator: Arc<AllocationOrchestrator>,
    pub llm: Arc<dyn LlmBackend>,
    /// Candidate-slate size for A/B recommendations.
    pub candidate_count: usize,
    /// Optional pinned seed for candidate sampling.
    pub seed: Option<u64>,
    /// Token budget / temperature for the insights completion.
    pub insights_max_tokens: usize,
    pub temperature: f64,
}

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AllocateRequest {
    pub product: String,
}

#[derive(Debug, Serialize)]
pub struct AllocateResponse {
    pub allocation: crate::types::AllocationDistribution,
    pub source: crate::types::AllocationSource,
    pub insights: String,
}

#[derive(Debug, Deserialize)]
pub struct AbTestRequest {
    /// Business category, e.g. "fashion".
    pub company: String,
    pub campaign_type: String,
    pub target_audience: String,
    pub channel_used: String,
    pub clicks: f64,
}

#[derive(Debug, Serialize)]
pub struct TopCampaignSummary {
    pub campaign_id: String,
    pub company: String,
    pub conversion_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct AbTestResponse {
    pub top_campaign: TopCampaignSummary,
    pub candidates: Vec<Variation>,
    pub recommendation: ScoredVariation,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/health — liveness probe.
pub async fn get_health() -> Response {
    ApiResponse::ok(serde_json::json!({
        "status": "ok",
        "service": "adpilot",
    }))
}

/// GET /api/v1/status — working-set and model introspection.
pub async fn get_status(State(state): State<ApiState>) -> Response {
    let records = state.records.read().await;
    let channels: Vec<&str> = crate::allocation::extractor::EXTRACTION_CHANNELS
        .iter()
        .map(|(channel, _)| channel.as_str())
        .collect();

    ApiResponse::ok(serde_json::json!({
        "records": records.len(),
        "historical": state.historical_count,
        "submitted": records.len() - state.historical_count,
        "model": state.diagnostics.as_ref(),
        "channels": channels,
        "candidate_count": state.candidate_count,
    }))
}

/// POST /api/v1/allocate — resolve a budget split plus insights.
pub async fn allocate_budget(
    State(state): State<ApiState>,
    Json(req): Json<AllocateRequest>,
) -> Response {
    let product = req.product.trim();
    if product.is_empty() {
        return ApiErrorResponse::bad_request("product must not be empty");
    }

    info!(product, "Allocation request received");
    let resolved = match state.orchestrator.allocate(product).await {
        Ok(resolved) => resolved,
        Err(e) => return upstream_failure(e),
    };

    let insights = match insights::generate(
        state.llm.as_ref(),
        &resolved.distribution,
        state.insights_max_tokens,
        state.temperature,
    )
    .await
    {
        Ok(text) => text,
        Err(e) => return upstream_failure(AllocationError::GenerativeUnavailable(e)),
    };

    ApiResponse::ok(AllocateResponse {
        allocation: resolved.distribution,
        source: resolved.source,
        insights,
    })
}

/// POST /api/v1/abtest — append a submitted campaign, recompute the top
/// campaign, and recommend a variation.
pub async fn recommend_variation(
    State(state): State<ApiState>,
    Json(req): Json<AbTestRequest>,
) -> Response {
    if req.clicks < 0.0 {
        return ApiErrorResponse::bad_request("clicks must be non-negative");
    }

    let submitted = submitted_record(&req);
    let (top_campaign, candidates) = {
        let mut records = state.records.write().await;
        records.push(submitted);

        // Top campaign is recomputed over the extended working set.
        let Some(top) = CampaignRecord::top_of(&records) else {
            return ApiErrorResponse::internal("campaign working set is empty");
        };
        let top = top.clone();
        let candidates =
            VariationGenerator::new(state.seed).generate(&top, state.candidate_count);
        (top, candidates)
    };

    match VariationSelector::select(
        &candidates,
        &top_campaign,
        state.predictor.as_ref(),
        state.encoder.as_ref(),
    ) {
        Ok(recommendation) => ApiResponse::ok(AbTestResponse {
            top_campaign: TopCampaignSummary {
                campaign_id: top_campaign.campaign_id.clone(),
                company: top_campaign.company.clone(),
                conversion_rate: top_campaign.conversion_rate,
            },
            candidates,
            recommendation,
        }),
        Err(SelectionError::Encoding(e)) => {
            // A candidate referenced a category the model never saw.
            // Failing the request beats scoring a corrupted feature row.
            ApiErrorResponse::bad_request(e.to_string())
        }
        Err(e @ SelectionError::EmptyCandidateSet) => ApiErrorResponse::internal(e.to_string()),
    }
}

/// Legacy health endpoint at root level.
pub async fn legacy_health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

// ============================================================================
// Helpers
// ============================================================================

fn upstream_failure(error: AllocationError) -> Response {
    error!(error = %error, "Allocation chain failed");
    ApiErrorResponse::upstream_unavailable(error.to_string())
}

/// Fill a submitted campaign out to a full record. Fields the submitter
/// does not provide get demo defaults; the conversion rate is 0.0
/// ("unscored"), so a submission can never displace a measured top
/// campaign.
fn submitted_record(req: &AbTestRequest) -> CampaignRecord {
    let mut rng = rand::thread_rng();
    CampaignRecord {
        campaign_id: format!("C{}", rng.gen_range(100..1000)),
        company: req.company.clone(),
        campaign_type: req.campaign_type.clone(),
        target_audience: req.target_audience.clone(),
        channel_used: req.channel_used.clone(),
        clicks: req.clicks,
        impressions: rng.gen_range(5_000..=100_000),
        conversion_rate: 0.0,
        duration_days: rng.gen_range(5..=30),
        acquisition_cost: f64::from(rng.gen_range(50..=200)),
        roi: rng.gen_range(1.0..5.0),
        engagement_score: f64::from(rng.gen_range(50..=100)),
        location: "USA".to_string(),
        language: "English".to_string(),
        customer_segment: "Gen Z".to_string(),
        date: Utc::now().format("%Y-%m-%d").to_string(),
    }
}
