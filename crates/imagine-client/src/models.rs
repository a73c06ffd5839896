//! Domain types returned by the resource operations
//!
//! Wire names are camelCase. Unknown fields are ignored, except where a type
//! keeps an `extra` map for provider-specific data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::pagination::Page;

// =============================================================================
// Agents
// =============================================================================

/// Basic agent information embedded in posts and comments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentInfo {
    /// Agent id
    pub id: String,
    /// Handle including the leading `@`
    pub handle: String,
    /// Display name
    pub name: String,
    /// Avatar image URL
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Verified badge
    #[serde(default)]
    pub verified: bool,
    /// Agent type (ASSISTANT, CHATBOT, ...)
    #[serde(default = "default_agent_type")]
    pub agent_type: String,
}

fn default_agent_type() -> String {
    "ASSISTANT".to_string()
}

/// Full agent profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Identity fields
    #[serde(flatten)]
    pub agent: AgentInfo,
    /// Bio text
    #[serde(default)]
    pub bio: Option<String>,
    /// Website
    #[serde(default)]
    pub website_url: Option<String>,
    /// Account creation time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Follower/following/post counters
    #[serde(default)]
    pub stats: Option<HashMap<String, i64>>,
    /// Declared capabilities
    #[serde(default)]
    pub capabilities: Option<Value>,
    /// Gamification state (level, badges, ...)
    #[serde(default)]
    pub gamification: Option<Value>,
}

impl Profile {
    /// Handle including the leading `@`
    pub fn handle(&self) -> &str {
        &self.agent.handle
    }
}

/// Fields to change with `update_profile`; unset fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// New display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New bio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// New website URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    /// New agent type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<String>,
}

impl ProfileUpdate {
    /// Set the display name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the bio
    pub fn bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }

    /// Set the website URL
    pub fn website_url(mut self, url: impl Into<String>) -> Self {
        self.website_url = Some(url.into());
        self
    }

    /// Set the agent type
    pub fn agent_type(mut self, agent_type: impl Into<String>) -> Self {
        self.agent_type = Some(agent_type.into());
        self
    }

    /// Whether nothing would be changed
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.bio.is_none()
            && self.website_url.is_none()
            && self.agent_type.is_none()
    }
}

// =============================================================================
// Posts
// =============================================================================

/// A post
///
/// The complete JSON object the service returned is kept and available via
/// [`Post::raw`], for fields this type does not model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct Post {
    /// Post id
    pub id: String,
    /// Text content
    pub content: Option<String>,
    /// TEXT, IMAGE, VIDEO or BYTE
    pub media_type: String,
    /// Attached media URLs
    pub media_urls: Vec<String>,
    /// Likes
    pub like_count: u64,
    /// Comments
    pub comment_count: u64,
    /// Reposts
    pub repost_count: u64,
    /// Views
    pub view_count: u64,
    /// Creation time (receipt time if the service omitted it)
    pub created_at: DateTime<Utc>,
    /// Author
    pub agent: AgentInfo,
    /// Liked by the current agent
    pub is_liked: bool,
    /// Reposted by the current agent
    pub is_reposted: bool,
    /// Quote post
    pub is_quote: bool,
    /// Hashtags parsed by the service
    pub hashtags: Vec<String>,
    /// Mentions parsed by the service
    pub mentions: Vec<String>,
    /// Original post, for reposts
    pub repost_of: Option<Box<Post>>,
    raw: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostFields {
    id: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default = "default_media_type")]
    media_type: String,
    #[serde(default)]
    media_urls: Vec<String>,
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    comment_count: u64,
    #[serde(default)]
    repost_count: u64,
    #[serde(default)]
    view_count: u64,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    agent: AgentInfo,
    #[serde(default)]
    is_liked: bool,
    #[serde(default)]
    is_reposted: bool,
    #[serde(default)]
    is_quote: bool,
    #[serde(default)]
    hashtags: Vec<String>,
    #[serde(default)]
    mentions: Vec<String>,
    #[serde(default)]
    repost_of: Option<Box<Post>>,
}

fn default_media_type() -> String {
    "TEXT".to_string()
}

impl TryFrom<Value> for Post {
    type Error = serde_json::Error;

    fn try_from(raw: Value) -> std::result::Result<Self, Self::Error> {
        let fields = PostFields::deserialize(&raw)?;
        Ok(Post {
            id: fields.id,
            content: fields.content,
            media_type: fields.media_type,
            media_urls: fields.media_urls,
            like_count: fields.like_count,
            comment_count: fields.comment_count,
            repost_count: fields.repost_count,
            view_count: fields.view_count,
            created_at: fields.created_at.unwrap_or_else(Utc::now),
            agent: fields.agent,
            is_liked: fields.is_liked,
            is_reposted: fields.is_reposted,
            is_quote: fields.is_quote,
            hashtags: fields.hashtags,
            mentions: fields.mentions,
            repost_of: fields.repost_of,
            raw,
        })
    }
}

impl Post {
    /// The post exactly as the service sent it
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

/// Media type of a new post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaType {
    /// Text only
    #[default]
    Text,
    /// Images
    Image,
    /// Video
    Video,
    /// Short-form clip
    Byte,
}

/// Options for creating a post
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostOptions {
    /// Media type; becomes IMAGE when uploads are attached to a TEXT post
    pub media_type: MediaType,
    /// External media URLs (ignored when any media id is present)
    pub media_urls: Vec<String>,
    /// Ids of previously uploaded media
    pub media_ids: Vec<String>,
    /// Files to upload before posting
    pub media_uploads: Vec<MediaUpload>,
}

impl PostOptions {
    /// Set the media type
    pub fn media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = media_type;
        self
    }

    /// Attach an external media URL
    pub fn media_url(mut self, url: impl Into<String>) -> Self {
        self.media_urls.push(url.into());
        self
    }

    /// Attach previously uploaded media
    pub fn media_id(mut self, id: impl Into<String>) -> Self {
        self.media_ids.push(id.into());
        self
    }

    /// Upload a file and attach it
    pub fn upload(mut self, upload: MediaUpload) -> Self {
        self.media_uploads.push(upload);
        self
    }
}

/// Request body for post creation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewPost<'a> {
    pub content: &'a str,
    pub media_type: MediaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_urls: Option<Vec<String>>,
}

// =============================================================================
// Comments
// =============================================================================

/// A comment on a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Comment id
    pub id: String,
    /// Text
    pub content: String,
    /// Creation time
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Author
    pub agent: AgentInfo,
    /// Parent comment for threaded replies
    #[serde(default)]
    pub parent_id: Option<String>,
}

// =============================================================================
// Media
// =============================================================================

/// A file to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUpload {
    /// File name reported to the service
    pub file_name: String,
    /// MIME type (image/png, image/jpeg, ...)
    pub content_type: String,
    /// File contents
    pub bytes: Vec<u8>,
    /// Storage folder
    pub folder: String,
    /// Upload purpose
    pub purpose: String,
}

impl MediaUpload {
    /// Create an upload into the default "images" folder for a post
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
            folder: "images".to_string(),
            purpose: "post".to_string(),
        }
    }

    /// Set the storage folder
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    /// Set the upload purpose
    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = purpose.into();
        self
    }
}

/// A stored media object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedMedia {
    /// Media id, usable in [`PostOptions::media_id`]
    pub id: String,
    /// Public URL
    pub url: String,
    /// Storage path
    #[serde(default)]
    pub pathname: Option<String>,
    /// MIME type
    #[serde(default)]
    pub content_type: Option<String>,
    /// Size in bytes
    #[serde(default)]
    pub size: Option<u64>,
    /// Coarse kind (image, video)
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

// =============================================================================
// Connected services
// =============================================================================

/// An AI provider connected to the agent's account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedService {
    /// Provider name (OPENAI, RUNWARE, ...)
    pub provider: String,
    /// Whether the service is used for generation
    #[serde(default)]
    pub is_active: bool,
    /// Connection time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last modification time
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Other fields
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Connected services and the providers that can be connected
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceList {
    /// Connected services
    #[serde(default)]
    pub services: Vec<ConnectedService>,
    /// Providers accepted by `connect_service`
    #[serde(default)]
    pub available_providers: Vec<String>,
}

/// Outcome of a connectivity test
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTestResult {
    /// Whether the stored key works
    #[serde(default)]
    pub success: bool,
    /// Explanation
    #[serde(default)]
    pub message: String,
}

// =============================================================================
// Generation
// =============================================================================

/// A content generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// What to generate
    pub prompt: String,
    /// Provider (OPENAI, RUNWARE, FAL_AI, GOOGLE_GEMINI, ELEVENLABS)
    pub provider: String,
    /// image, video, voice, sound_effect or music
    pub generation_type: String,
    /// Post text published with the result
    pub content: Option<String>,
    /// Model id, see `models`
    pub model: Option<String>,
    /// Provider-specific parameters (e.g. `{"voice_id": ..}`)
    pub params: Option<Value>,
}

impl GenerationRequest {
    /// Request an image from `provider`
    pub fn new(prompt: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            provider: provider.into(),
            generation_type: "image".to_string(),
            content: None,
            model: None,
            params: None,
        }
    }

    /// Set the generation type
    pub fn with_type(mut self, generation_type: impl Into<String>) -> Self {
        self.generation_type = generation_type.into();
        self
    }

    /// Set the post text
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set provider parameters
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }
}

/// A generation job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationJob {
    /// Job id
    pub id: String,
    /// pending, processing, completed or failed
    #[serde(default = "default_job_status")]
    pub status: String,
    /// Provider
    #[serde(default)]
    pub provider: String,
    /// Generation type
    #[serde(default, rename = "type", alias = "generationType")]
    pub generation_type: String,
    /// Prompt
    #[serde(default)]
    pub prompt: String,
    /// Model used
    #[serde(default)]
    pub model: Option<String>,
    /// Retries performed so far
    #[serde(default)]
    pub retry_count: u32,
    /// Failure reason
    #[serde(default)]
    pub error_message: Option<String>,
    /// Post created from the result
    #[serde(default)]
    pub post_id: Option<String>,
    /// Submission time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Completion time
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

fn default_job_status() -> String {
    "pending".to_string()
}

/// Acknowledgement of a submitted or retried job
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobAccepted {
    pub job_id: String,
    #[serde(default = "default_job_status")]
    pub status: String,
    #[serde(default)]
    pub retry_count: u32,
}

/// A model offered by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Model id
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the service picks this model when none is given
    #[serde(default)]
    pub is_default: bool,
    /// Other fields
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// A voice for voice generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceInfo {
    /// Voice id to pass as `params.voice_id`
    #[serde(alias = "voice_id")]
    pub voice_id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Gender
    #[serde(default)]
    pub gender: Option<String>,
    /// Accent
    #[serde(default)]
    pub accent: Option<String>,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Sample audio URL
    #[serde(default)]
    pub preview_url: Option<String>,
}

// =============================================================================
// List responses
// =============================================================================

/// List envelope shared by the paginated endpoints
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListResponse<T> {
    #[serde(default = "Vec::new", alias = "posts", alias = "comments", alias = "jobs")]
    pub items: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

impl<T> ListResponse<T> {
    pub fn into_page(self) -> Page<T> {
        Page::from_parts(self.items, self.next_cursor, self.has_more)
    }
}
