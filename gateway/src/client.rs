//! Async HTTP client for the floor-plan backend.
//!
//! Thin wrapper over `reqwest`: every call maps transport failures to
//! [`GatewayError::Request`] and non-2xx statuses to
//! [`GatewayError::Response`]. A failed call never touches local editor
//! state; the caller keeps its unsaved edits and decides what to tell the
//! user.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use std::time::Duration;

use planner::doc::{Element, ElementId, PlanSnapshot};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, error, info, warn};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::record::ElementRecord;
use crate::sequence::{SaveOutcome, SaveSequencer};

/// Identifier of a floor plan on the backend.
pub type PlanId = u64;

/// Multipart field name the upload endpoint reads the file from.
const UPLOAD_FIELD: &str = "document_upload";

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct SaveRequest<'a> {
    elements: &'a [Element],
    timestamp: String,
}

#[derive(Deserialize)]
struct CreateResponse {
    new_id: Option<u64>,
}

#[derive(Serialize)]
struct DeleteRequest {
    element_id: ElementId,
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct PlanClient {
    http: reqwest::Client,
    base_url: String,
    saves: SaveSequencer,
}

impl PlanClient {
    /// Build a client with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::HttpClientBuild`] if the TLS backend cannot
    /// be initialized.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| GatewayError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.clone(), saves: SaveSequencer::new() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Fetch a plan: `GET /floorplan_editor/:id`.
    ///
    /// # Errors
    ///
    /// Transport failure, non-2xx status, or a body that is not a plan.
    pub async fn load_plan(&self, plan_id: PlanId) -> Result<PlanSnapshot, GatewayError> {
        let response = self.http.get(self.url(&format!("/floorplan_editor/{plan_id}"))).send().await;
        let text = read_body(response).await?;
        let snapshot: PlanSnapshot = serde_json::from_str(&text).map_err(|e| GatewayError::Parse(e.to_string()))?;
        info!(plan_id, elements = snapshot.elements.len(), "floor plan loaded");
        Ok(snapshot)
    }

    /// Fetch a plan, degrading any failure to an empty plan.
    pub async fn load_plan_or_empty(&self, plan_id: PlanId) -> PlanSnapshot {
        match self.load_plan(plan_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(plan_id, error = %e, "floor plan load failed; starting with an empty plan");
                PlanSnapshot::default()
            }
        }
    }

    /// Save the whole element list: `POST /save_floorplan/:id` with
    /// `{elements, timestamp}`.
    ///
    /// Returns [`SaveOutcome::Superseded`] if another save on this client
    /// started while this one was in flight.
    ///
    /// # Errors
    ///
    /// Transport failure or non-2xx status. Local state is not rolled back.
    pub async fn save_plan(&self, plan_id: PlanId, snapshot: &PlanSnapshot) -> Result<SaveOutcome, GatewayError> {
        let ticket = self.saves.begin();
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| GatewayError::Timestamp(e.to_string()))?;
        let body = SaveRequest { elements: &snapshot.elements, timestamp };
        debug!(plan_id, ticket = ticket.get(), elements = body.elements.len(), "saving floor plan");

        let response = self.http.post(self.url(&format!("/save_floorplan/{plan_id}"))).json(&body).send().await;
        if let Err(e) = read_body(response).await {
            error!(plan_id, ticket = ticket.get(), error = %e, "floor plan save failed");
            return Err(e);
        }

        let outcome = self.saves.finish(ticket);
        match outcome {
            SaveOutcome::Saved => info!(plan_id, ticket = ticket.get(), "floor plan saved"),
            SaveOutcome::Superseded => warn!(plan_id, ticket = ticket.get(), "save overtaken by a newer save"),
        }
        Ok(outcome)
    }

    /// Create one element from its flattened record: `POST /element`.
    /// Returns the backend id, if the backend assigned one.
    ///
    /// # Errors
    ///
    /// Transport failure, non-2xx status, or an unparseable body.
    pub async fn create_element(&self, record: &ElementRecord) -> Result<Option<u64>, GatewayError> {
        let response = self.http.post(self.url("/element")).json(record).send().await;
        let text = read_body(response).await?;
        let created: CreateResponse = serde_json::from_str(&text).map_err(|e| GatewayError::Parse(e.to_string()))?;
        info!(element_type = %record.element_type, new_id = ?created.new_id, "element created");
        Ok(created.new_id)
    }

    /// Delete one element: `DELETE /element/selected` with `{element_id}`.
    ///
    /// # Errors
    ///
    /// Transport failure or non-2xx status.
    pub async fn delete_element(&self, element_id: ElementId) -> Result<(), GatewayError> {
        let response = self
            .http
            .delete(self.url("/element/selected"))
            .json(&DeleteRequest { element_id })
            .send()
            .await;
        read_body(response).await?;
        info!(element_id, "element deleted");
        Ok(())
    }

    /// Store an element's safety properties:
    /// `POST /save_safety_info/:plan/:element` with form field `safety_data`.
    /// Returns the backend's acknowledgement fragment.
    ///
    /// # Errors
    ///
    /// Transport failure or non-2xx status.
    pub async fn save_safety_info(
        &self,
        plan_id: PlanId,
        element_id: ElementId,
        safety: &serde_json::Value,
    ) -> Result<String, GatewayError> {
        let form = [("safety_data", safety.to_string())];
        let response = self
            .http
            .post(self.url(&format!("/save_safety_info/{plan_id}/{element_id}")))
            .form(&form)
            .send()
            .await;
        let text = read_body(response).await?;
        info!(plan_id, element_id, "safety info saved");
        Ok(text)
    }

    /// Machine info side panel: `GET /machine_info/:element`.
    ///
    /// # Errors
    ///
    /// Transport failure or non-2xx status.
    pub async fn machine_info(&self, element_id: ElementId) -> Result<String, GatewayError> {
        let response = self.http.get(self.url(&format!("/machine_info/{element_id}"))).send().await;
        read_body(response).await
    }

    /// Document list side panel: `GET /get_documents/:plan/:element`.
    ///
    /// # Errors
    ///
    /// Transport failure or non-2xx status.
    pub async fn documents(&self, plan_id: PlanId, element_id: ElementId) -> Result<String, GatewayError> {
        let response = self.http.get(self.url(&format!("/get_documents/{plan_id}/{element_id}"))).send().await;
        read_body(response).await
    }

    /// Attach a document to an element:
    /// `POST /upload_document/:plan/:element` (multipart). Returns the
    /// refreshed document list fragment.
    ///
    /// # Errors
    ///
    /// Transport failure or non-2xx status.
    pub async fn upload_document(
        &self,
        plan_id: PlanId,
        element_id: ElementId,
        file_name: String,
        bytes: Vec<u8>,
    ) -> Result<String, GatewayError> {
        let size = bytes.len();
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part(UPLOAD_FIELD, part);
        let response = self
            .http
            .post(self.url(&format!("/upload_document/{plan_id}/{element_id}")))
            .multipart(form)
            .send()
            .await;
        let text = read_body(response).await?;
        info!(plan_id, element_id, size, "document uploaded");
        Ok(text)
    }
}

/// Read a response body, turning transport errors and non-2xx statuses into
/// gateway errors.
async fn read_body(response: Result<reqwest::Response, reqwest::Error>) -> Result<String, GatewayError> {
    let response = response.map_err(|e| GatewayError::Request(e.to_string()))?;
    let status = response.status();
    let text = response.text().await.map_err(|e| GatewayError::Request(e.to_string()))?;
    if !status.is_success() {
        return Err(GatewayError::Response { status: status.as_u16(), body: text });
    }
    Ok(text)
}
