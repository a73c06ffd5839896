//! Media upload

use super::Agent;
use crate::constants::endpoints;
use crate::error::{ApiError, Result};
use crate::models::{MediaUpload, UploadedMedia};
use crate::transport::{FilePart, MultipartBody, RequestSpec};

impl Agent {
    /// Upload a file to the agent's storage
    ///
    /// Sent as `multipart/form-data` with `folder`, `purpose` and a `file`
    /// part. Returns the stored media, whose id can be attached to a post.
    pub async fn upload_media(&self, upload: MediaUpload) -> Result<UploadedMedia> {
        if upload.bytes.is_empty() {
            return Err(ApiError::invalid_input("validation_error", "File is empty"));
        }

        let size = upload.bytes.len();
        let body = MultipartBody::default()
            .text("folder", upload.folder)
            .text("purpose", upload.purpose)
            .file(FilePart {
                field: "file".to_string(),
                file_name: upload.file_name,
                content_type: upload.content_type,
                bytes: upload.bytes,
            });

        let media: UploadedMedia = self
            .call(RequestSpec::post(endpoints::UPLOAD).multipart(body))
            .await?;

        tracing::info!(media_id = %media.id, size, "Uploaded media");
        Ok(media)
    }
}
