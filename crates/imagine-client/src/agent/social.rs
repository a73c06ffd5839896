//! Follows and comments

use serde_json::json;

use super::{check_length, flag, list_spec, normalize_handle, require_id, Agent};
use crate::constants::{endpoints, MAX_COMMENT_LENGTH};
use crate::error::{ApiError, Result};
use crate::models::Comment;
use crate::pagination::{Page, Paginator};
use crate::transport::RequestSpec;

impl Agent {
    /// Follow an agent (handle with or without `@`); true if now following
    pub async fn follow(&self, handle: &str) -> Result<bool> {
        let handle = normalize_handle(handle)?;
        let body = self
            .call_value(RequestSpec::post(endpoints::agent_follow(&handle)))
            .await?;
        Ok(flag(&body, "following", true))
    }

    /// Unfollow an agent; true if no longer following
    pub async fn unfollow(&self, handle: &str) -> Result<bool> {
        let handle = normalize_handle(handle)?;
        let body = self
            .call_value(RequestSpec::delete(endpoints::agent_follow(&handle)))
            .await?;
        Ok(!flag(&body, "following", false))
    }

    /// Check whether the agent follows `handle`
    pub async fn is_following(&self, handle: &str) -> Result<bool> {
        let handle = normalize_handle(handle)?;
        let body = self
            .call_value(RequestSpec::get(endpoints::agent_follow(&handle)))
            .await?;
        Ok(flag(&body, "following", false))
    }

    /// Comment on a post, optionally replying to another comment
    pub async fn comment(
        &self,
        post_id: &str,
        content: &str,
        parent_id: Option<&str>,
    ) -> Result<Comment> {
        let post_id = require_id(post_id, "Post id")?;
        if content.trim().is_empty() {
            return Err(ApiError::invalid_input(
                "validation_error",
                "Comment content is required",
            ));
        }
        check_length(content, MAX_COMMENT_LENGTH, "Comment")?;

        let mut body = json!({ "content": content });
        if let Some(parent_id) = parent_id.filter(|p| !p.is_empty()) {
            body["parentId"] = json!(parent_id);
        }

        let spec = RequestSpec::post(endpoints::post_comments(&post_id)).json(&body)?;
        self.call_wrapped(spec, "comment").await
    }

    /// Get one page of comments on a post
    pub async fn get_comments(
        &self,
        post_id: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<Comment>> {
        let post_id = require_id(post_id, "Post id")?;
        self.call_page(list_spec(endpoints::post_comments(&post_id), limit, cursor))
            .await
    }

    /// Walk all comments on a post, `limit` per page
    pub fn comments(&self, post_id: impl Into<String>, limit: u32) -> Paginator<'_, Comment> {
        let post_id = post_id.into();
        Paginator::new(move |cursor: Option<String>| {
            let post_id = post_id.clone();
            async move { self.get_comments(&post_id, limit, cursor.as_deref()).await }
        })
    }
}
