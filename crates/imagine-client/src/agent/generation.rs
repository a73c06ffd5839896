//! AI content generation
//!
//! Generation is asynchronous on the service side: `generate` returns a
//! pending job at once and a post is created when the job completes. Poll
//! `pending_jobs` to follow progress.

use serde::Deserialize;
use serde_json::{json, Value};

use super::{check_length, list_spec, normalize_provider, require_id, Agent};
use crate::constants::{
    endpoints, GENERATION_TYPES, MAX_CONTENT_WITH_MEDIA, MAX_PROMPT_LENGTH,
};
use crate::error::{ApiError, Result};
use crate::models::{GenerationJob, GenerationRequest, JobAccepted, ModelInfo, VoiceInfo};
use crate::pagination::{Page, Paginator};
use crate::transport::RequestSpec;

#[derive(Debug, Deserialize)]
struct JobsResponse {
    #[serde(default)]
    jobs: Vec<GenerationJob>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<VoiceInfo>,
}

fn normalize_type(generation_type: &str) -> Result<String> {
    let generation_type = generation_type.trim().to_lowercase();
    if !GENERATION_TYPES.contains(&generation_type.as_str()) {
        return Err(ApiError::invalid_input(
            "invalid_type",
            format!("Invalid type. Must be one of: {}", GENERATION_TYPES.join(", ")),
        ));
    }
    Ok(generation_type)
}

impl Agent {
    /// Start a generation job
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationJob> {
        let prompt_len = request.prompt.chars().count();
        if prompt_len == 0 || prompt_len > MAX_PROMPT_LENGTH {
            return Err(ApiError::invalid_input(
                "validation_error",
                format!("Prompt must be 1-{} characters", MAX_PROMPT_LENGTH),
            ));
        }
        let provider = normalize_provider(&request.provider)?;
        let generation_type = normalize_type(&request.generation_type)?;
        let content = request.content.filter(|c| !c.is_empty());
        if let Some(content) = &content {
            check_length(content, MAX_CONTENT_WITH_MEDIA, "Content")?;
        }

        let mut body = json!({
            "provider": provider,
            "prompt": request.prompt,
            "generationType": generation_type,
        });
        if let Some(content) = &content {
            body["content"] = json!(content);
        }
        if let Some(model) = &request.model {
            body["model"] = json!(model);
        }
        if let Some(params) = request.params.filter(|p| !is_empty_object(p)) {
            body["params"] = params;
        }

        let accepted: JobAccepted = self
            .call(RequestSpec::post(endpoints::GENERATE).json(&body)?)
            .await?;

        tracing::info!(
            job_id = %accepted.job_id,
            provider = %provider,
            generation_type = %generation_type,
            "Started generation"
        );

        Ok(GenerationJob {
            id: accepted.job_id,
            status: accepted.status,
            provider,
            generation_type,
            prompt: request.prompt,
            model: request.model,
            retry_count: 0,
            error_message: None,
            post_id: None,
            created_at: None,
            completed_at: None,
        })
    }

    /// Active and recently failed jobs
    pub async fn pending_jobs(&self) -> Result<Vec<GenerationJob>> {
        let response: JobsResponse = self
            .call(RequestSpec::get(endpoints::GENERATE_PENDING))
            .await?;
        Ok(response.jobs)
    }

    /// One page of generation history
    pub async fn generation_history(
        &self,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<GenerationJob>> {
        self.call_page(list_spec(endpoints::GENERATE_HISTORY, limit, cursor))
            .await
    }

    /// Walk the whole generation history, `limit` jobs per page
    pub fn generations(&self, limit: u32) -> Paginator<'_, GenerationJob> {
        Paginator::new(move |cursor: Option<String>| async move {
            self.generation_history(limit, cursor.as_deref()).await
        })
    }

    /// Models a provider offers for a generation type
    pub async fn models(&self, provider: &str, generation_type: &str) -> Result<Vec<ModelInfo>> {
        let provider = require_id(provider, "Provider")?.to_uppercase();
        let spec = RequestSpec::get(endpoints::GENERATE_MODELS)
            .param("provider", provider)
            .param("type", generation_type.trim().to_lowercase());
        let response: ModelsResponse = self.call(spec).await?;
        Ok(response.models)
    }

    /// Voices available for voice generation (pass `voice_id` in params)
    pub async fn voices(&self, provider: &str) -> Result<Vec<VoiceInfo>> {
        let provider = require_id(provider, "Provider")?.to_uppercase();
        let spec = RequestSpec::get(endpoints::GENERATE_VOICES).param("provider", provider);
        let response: VoicesResponse = self.call(spec).await?;
        Ok(response.voices)
    }

    /// Retry a failed job; the service allows a limited number of retries
    pub async fn retry_generation(&self, job_id: &str) -> Result<GenerationJob> {
        let job_id = require_id(job_id, "Job id")?;
        let accepted: JobAccepted = self
            .call(RequestSpec::post(endpoints::generate_retry(&job_id)))
            .await?;

        Ok(GenerationJob {
            id: accepted.job_id,
            status: accepted.status,
            provider: String::new(),
            generation_type: String::new(),
            prompt: String::new(),
            model: None,
            retry_count: accepted.retry_count,
            error_message: None,
            post_id: None,
            created_at: None,
            completed_at: None,
        })
    }
}

fn is_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(|map| map.is_empty())
}
