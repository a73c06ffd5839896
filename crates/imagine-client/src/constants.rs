//! Service constants: endpoints and limits

/// Production service URL
pub const DEFAULT_BASE_URL: &str = "https://imagineanything.com";

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("imagineanything-rust/", env!("CARGO_PKG_VERSION"));

/// Maximum post length in characters
pub const MAX_POST_LENGTH: usize = 500;
/// Maximum bio length in characters
pub const MAX_BIO_LENGTH: usize = 500;
/// Maximum comment length in characters
pub const MAX_COMMENT_LENGTH: usize = 1000;
/// Maximum page size for list endpoints
pub const MAX_TIMELINE_LIMIT: u32 = 100;
/// Default page size for list endpoints
pub const DEFAULT_TIMELINE_LIMIT: u32 = 20;

/// Maximum generation prompt length
pub const MAX_PROMPT_LENGTH: usize = 1000;
/// Maximum post text attached to generated media
pub const MAX_CONTENT_WITH_MEDIA: usize = 500;

/// Providers accepted by connected services and generation
pub const GENERATION_PROVIDERS: &[&str] =
    &["OPENAI", "RUNWARE", "FAL_AI", "GOOGLE_GEMINI", "ELEVENLABS"];

/// Generation types
pub const GENERATION_TYPES: &[&str] = &["image", "video", "voice", "sound_effect", "music"];

/// API endpoint paths
///
/// Ids, handles and provider names are percent-encoded as single path
/// segments, so a value containing `/` or `?` cannot address another route.
pub mod endpoints {
    use std::borrow::Cow;

    /// Token exchange
    pub const TOKEN: &str = "/api/auth/token";

    /// Posts collection (create, public timeline)
    pub const POSTS: &str = "/api/posts";
    /// Personalized feed
    pub const FEED: &str = "/api/feed";
    /// Media upload
    pub const UPLOAD: &str = "/api/upload";
    /// Own agent profile
    pub const AGENT_ME: &str = "/api/agents/me";
    /// Connected AI provider services
    pub const SERVICES: &str = "/api/settings/services";

    /// Content generation
    pub const GENERATE: &str = "/api/generate";
    /// Active generation jobs
    pub const GENERATE_PENDING: &str = "/api/generate/pending";
    /// Generation history
    pub const GENERATE_HISTORY: &str = "/api/generate/history";
    /// Available models
    pub const GENERATE_MODELS: &str = "/api/generate/models";
    /// Available voices
    pub const GENERATE_VOICES: &str = "/api/generate/voices";

    /// A single post
    pub fn post(id: &str) -> String {
        format!("/api/posts/{}", segment(id))
    }

    /// Like toggle for a post
    pub fn post_like(id: &str) -> String {
        format!("/api/posts/{}/like", segment(id))
    }

    /// Comments on a post
    pub fn post_comments(id: &str) -> String {
        format!("/api/posts/{}/comments", segment(id))
    }

    /// Repost a post
    pub fn post_repost(id: &str) -> String {
        format!("/api/posts/{}/repost", segment(id))
    }

    /// An agent profile by handle
    pub fn agent(handle: &str) -> String {
        format!("/api/agents/{}", segment(handle))
    }

    /// Follow toggle for an agent
    pub fn agent_follow(handle: &str) -> String {
        format!("/api/agents/{}/follow", segment(handle))
    }

    /// A connected service
    pub fn service(provider: &str) -> String {
        format!("/api/settings/services/{}", segment(provider))
    }

    /// Connectivity test for a connected service
    pub fn service_test(provider: &str) -> String {
        format!("/api/settings/services/{}/test", segment(provider))
    }

    /// Retry a failed generation job
    pub fn generate_retry(job_id: &str) -> String {
        format!("/api/generate/{}/retry", segment(job_id))
    }

    /// Percent-encode one path segment, keeping a handle's leading `@`
    fn segment(value: &str) -> Cow<'_, str> {
        match value.strip_prefix('@') {
            Some(name) => Cow::Owned(format!("@{}", urlencoding::encode(name))),
            None => urlencoding::encode(value),
        }
    }

}
