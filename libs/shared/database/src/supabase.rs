use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{Appointment, BlockedSlot, DoctorSummary, PastAppointment, WorkplaceSummary};

use crate::store::{
    AppointmentStore, ArchiveOutcome, ArchiveStore, BlockedSlotStore, DirectoryStore, StoreError,
};

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_base_url(&config.supabase_url, &config.supabase_service_key)
    }

    pub fn with_base_url(base_url: &str, service_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&self.service_key)
            .map_err(|e| StoreError::Backend(format!("invalid service key: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.service_key))
            .map_err(|e| StoreError::Backend(format!("invalid service key: {}", e)))?;

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                404 => StoreError::NotFound(error_text),
                409 => StoreError::Duplicate(error_text),
                _ => StoreError::Backend(format!("API error ({}): {}", status, error_text)),
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Same as `request` but asks PostgREST to echo the written rows.
    async fn write<T>(&self, method: Method, path: &str, body: Value) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        self.request_with_headers(method, path, Some(body), Some(headers)).await
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

/// Store backed by a PostgREST (Supabase) schema with `appointments`,
/// `past_appointments`, `blocked_slots`, `workplaces` and `doctors` tables
/// and an `archive_appointment` function performing the archive move in one
/// transaction.
pub struct SupabaseStore {
    client: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    async fn fetch_appointments(&self, query: &str) -> Result<Vec<Appointment>, StoreError> {
        let path = format!("/rest/v1/appointments?{}&order=appointment_time.asc", query);
        self.client.request(Method::GET, &path, None).await
    }
}

fn first<T>(mut rows: Vec<T>, what: &str) -> Result<T, StoreError> {
    if rows.is_empty() {
        return Err(StoreError::Backend(format!("{} returned no rows", what)));
    }
    Ok(rows.swap_remove(0))
}

#[async_trait]
impl AppointmentStore for SupabaseStore {
    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let rows = self.fetch_appointments(&format!("id=eq.{}", id)).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_appointment(&self, mut appointment: Appointment) -> Result<Appointment, StoreError> {
        appointment.version = 1;
        let rows = self
            .client
            .write(Method::POST, "/rest/v1/appointments", serde_json::to_value(&appointment)?)
            .await?;
        first(rows, "appointment insert")
    }

    async fn find_by_doctor_and_workplace(
        &self,
        doctor_id: i64,
        workplace_id: i64,
    ) -> Result<Vec<Appointment>, StoreError> {
        self.fetch_appointments(&format!("doctor_id=eq.{}&workplace_id=eq.{}", doctor_id, workplace_id))
            .await
    }

    async fn find_by_workplace_and_date(
        &self,
        workplace_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, StoreError> {
        self.fetch_appointments(&format!("workplace_id=eq.{}&appointment_date=eq.{}", workplace_id, date))
            .await
    }

    async fn find_by_doctor_and_date(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, StoreError> {
        self.fetch_appointments(&format!("doctor_id=eq.{}&appointment_date=eq.{}", doctor_id, date))
            .await
    }

    async fn find_before_date(&self, date: NaiveDate) -> Result<Vec<Appointment>, StoreError> {
        self.fetch_appointments(&format!("appointment_date=lt.{}", date)).await
    }

    async fn update_appointment(&self, appointment: &Appointment) -> Result<Appointment, StoreError> {
        let mut next = appointment.clone();
        next.version += 1;

        // The version filter turns the PATCH into a compare-and-set.
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&version=eq.{}",
            appointment.id, appointment.version
        );
        let rows: Vec<Appointment> = self
            .client
            .write(Method::PATCH, &path, serde_json::to_value(&next)?)
            .await?;

        if let Some(updated) = rows.into_iter().next() {
            return Ok(updated);
        }

        match self.get_appointment(appointment.id).await? {
            Some(_) => Err(StoreError::VersionConflict {
                id: appointment.id,
                expected: appointment.version,
            }),
            None => Err(StoreError::NotFound(appointment.id.to_string())),
        }
    }

    async fn delete_appointment(&self, id: Uuid) -> Result<(), StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        let rows: Vec<Value> = self
            .client
            .request_with_headers(
                Method::DELETE,
                &format!("/rest/v1/appointments?id=eq.{}", id),
                None,
                Some(headers),
            )
            .await?;

        if rows.is_empty() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ArchiveStore for SupabaseStore {
    async fn archive_appointment(
        &self,
        past: PastAppointment,
        expected_version: i64,
    ) -> Result<ArchiveOutcome, StoreError> {
        let body = json!({
            "past": past,
            "expected_version": expected_version,
        });
        self.client
            .request(Method::POST, "/rest/v1/rpc/archive_appointment", Some(body))
            .await
    }

    async fn get_past_appointment(&self, id: Uuid) -> Result<Option<PastAppointment>, StoreError> {
        let rows: Vec<PastAppointment> = self
            .client
            .request(Method::GET, &format!("/rest/v1/past_appointments?id=eq.{}", id), None)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn find_past_by_doctor(&self, doctor_id: i64) -> Result<Vec<PastAppointment>, StoreError> {
        let path = format!(
            "/rest/v1/past_appointments?doctor_id=eq.{}&order=appointment_time.asc",
            doctor_id
        );
        self.client.request(Method::GET, &path, None).await
    }
}

#[async_trait]
impl BlockedSlotStore for SupabaseStore {
    async fn insert_blocked_slot(&self, slot: BlockedSlot) -> Result<BlockedSlot, StoreError> {
        let rows = self
            .client
            .write(Method::POST, "/rest/v1/blocked_slots", serde_json::to_value(&slot)?)
            .await?;
        first(rows, "blocked slot insert")
    }

    async fn get_blocked_slot(&self, id: Uuid) -> Result<Option<BlockedSlot>, StoreError> {
        let rows: Vec<BlockedSlot> = self
            .client
            .request(Method::GET, &format!("/rest/v1/blocked_slots?id=eq.{}", id), None)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn find_active_blocked_slots(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<BlockedSlot>, StoreError> {
        let path = format!(
            "/rest/v1/blocked_slots?doctor_id=eq.{}&block_date=eq.{}&is_active=eq.true&order=start_time.asc.nullsfirst",
            doctor_id, date
        );
        self.client.request(Method::GET, &path, None).await
    }

    async fn list_blocked_slots(&self, doctor_id: i64) -> Result<Vec<BlockedSlot>, StoreError> {
        let path = format!(
            "/rest/v1/blocked_slots?doctor_id=eq.{}&order=block_date.asc,start_time.asc.nullsfirst",
            doctor_id
        );
        self.client.request(Method::GET, &path, None).await
    }

    async fn deactivate_blocked_slot(&self, id: Uuid) -> Result<BlockedSlot, StoreError> {
        let rows: Vec<BlockedSlot> = self
            .client
            .write(
                Method::PATCH,
                &format!("/rest/v1/blocked_slots?id=eq.{}", id),
                json!({ "is_active": false }),
            )
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl DirectoryStore for SupabaseStore {
    async fn workplace_summary(&self, workplace_id: i64) -> Result<Option<WorkplaceSummary>, StoreError> {
        let path = format!("/rest/v1/workplaces?id=eq.{}&select=id,name,type,address", workplace_id);
        let rows: Vec<WorkplaceSummary> = self.client.request(Method::GET, &path, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn doctor_summary(&self, doctor_id: i64) -> Result<Option<DoctorSummary>, StoreError> {
        let path = format!("/rest/v1/doctors?id=eq.{}&select=id,name,specialization", doctor_id);
        let rows: Vec<DoctorSummary> = self.client.request(Method::GET, &path, None).await?;
        Ok(rows.into_iter().next())
    }
}
