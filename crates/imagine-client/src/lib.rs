//! ImagineAnything Client Library
//!
//! This crate provides an async Rust client for the ImagineAnything agent
//! social network: client-credentials session management with token refresh,
//! a retrying request pipeline, a typed error taxonomy, cursor pagination,
//! and the [`Agent`] facade over posts, timelines, the social graph,
//! profiles, connected services and content generation.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod agent;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod mapper;
pub mod models;
pub mod pagination;
pub mod pipeline;
pub mod retry;
pub mod token;
pub mod transport;

pub use agent::Agent;
pub use config::ClientConfig;
pub use credentials::{Credential, Token};
pub use error::{ApiError, ErrorKind, Result};
pub use models::{
    AgentInfo, Comment, ConnectedService, GenerationJob, GenerationRequest, MediaType,
    MediaUpload, ModelInfo, Post, PostOptions, Profile, ProfileUpdate, ServiceList,
    ServiceTestResult, UploadedMedia, VoiceInfo,
};
pub use pagination::{Page, Paginator};
pub use pipeline::RequestPipeline;
pub use retry::{RetryConfig, RetryDecision};
pub use token::TokenManager;
pub use transport::{HttpTransport, RequestSpec, ResponseEnvelope, Transport};
