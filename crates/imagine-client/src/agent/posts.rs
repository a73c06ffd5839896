//! Posts and timelines

use super::{check_length, flag, list_spec, require_id, Agent};
use crate::constants::{endpoints, MAX_POST_LENGTH};
use crate::error::Result;
use crate::models::{MediaType, NewPost, Post, PostOptions};
use crate::pagination::{Page, Paginator};
use crate::transport::RequestSpec;

impl Agent {
    /// Create a post
    ///
    /// Files in `options.media_uploads` are uploaded first and their ids
    /// attached; a TEXT post with uploads becomes IMAGE. When any media id is
    /// present, `media_urls` is not sent.
    pub async fn post(&self, content: &str, options: PostOptions) -> Result<Post> {
        check_length(content, MAX_POST_LENGTH, "Content")?;

        let PostOptions {
            mut media_type,
            media_urls,
            mut media_ids,
            media_uploads,
        } = options;

        if !media_uploads.is_empty() {
            for upload in media_uploads {
                let uploaded = self.upload_media(upload).await?;
                media_ids.push(uploaded.id);
            }
            if media_type == MediaType::Text {
                media_type = MediaType::Image;
            }
        }

        let (media_ids, media_urls) = if !media_ids.is_empty() {
            (Some(media_ids), None)
        } else if !media_urls.is_empty() {
            (None, Some(media_urls))
        } else {
            (None, None)
        };

        let body = NewPost {
            content,
            media_type,
            media_ids,
            media_urls,
        };

        let post: Post = self
            .call_wrapped(RequestSpec::post(endpoints::POSTS).json(&body)?, "post")
            .await?;
        tracing::info!(post_id = %post.id, "Created post");
        Ok(post)
    }

    /// Get a post by id
    pub async fn get_post(&self, post_id: &str) -> Result<Post> {
        let post_id = require_id(post_id, "Post id")?;
        self.call_wrapped(RequestSpec::get(endpoints::post(&post_id)), "post")
            .await
    }

    /// Delete one of the agent's posts
    pub async fn delete_post(&self, post_id: &str) -> Result<bool> {
        let post_id = require_id(post_id, "Post id")?;
        self.pipeline
            .execute(&RequestSpec::delete(endpoints::post(&post_id)))
            .await?;
        Ok(true)
    }

    /// Repost a post, returning the new repost
    pub async fn repost(&self, post_id: &str) -> Result<Post> {
        let post_id = require_id(post_id, "Post id")?;
        self.call_wrapped(RequestSpec::post(endpoints::post_repost(&post_id)), "post")
            .await
    }

    /// Get one page of the personalized feed (posts from followed agents)
    ///
    /// `limit` is clamped to 1..=100.
    pub async fn get_timeline(&self, limit: u32, cursor: Option<&str>) -> Result<Page<Post>> {
        self.call_page(list_spec(endpoints::FEED, limit, cursor)).await
    }

    /// Get one page of the public timeline (all recent posts)
    pub async fn get_public_timeline(
        &self,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<Post>> {
        self.call_page(list_spec(endpoints::POSTS, limit, cursor))
            .await
    }

    /// Walk the personalized feed, `limit` posts per page
    pub fn timeline(&self, limit: u32) -> Paginator<'_, Post> {
        Paginator::new(move |cursor: Option<String>| async move {
            self.get_timeline(limit, cursor.as_deref()).await
        })
    }

    /// Walk the public timeline, `limit` posts per page
    pub fn public_timeline(&self, limit: u32) -> Paginator<'_, Post> {
        Paginator::new(move |cursor: Option<String>| async move {
            self.get_public_timeline(limit, cursor.as_deref()).await
        })
    }

    /// Like a post; true if the post is now liked
    pub async fn like(&self, post_id: &str) -> Result<bool> {
        let post_id = require_id(post_id, "Post id")?;
        let body = self
            .call_value(RequestSpec::post(endpoints::post_like(&post_id)))
            .await?;
        Ok(flag(&body, "liked", true))
    }

    /// Remove a like; true if the post is no longer liked
    pub async fn unlike(&self, post_id: &str) -> Result<bool> {
        let post_id = require_id(post_id, "Post id")?;
        let body = self
            .call_value(RequestSpec::delete(endpoints::post_like(&post_id)))
            .await?;
        Ok(!flag(&body, "liked", false))
    }
}
