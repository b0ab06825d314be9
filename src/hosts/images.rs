use std::time::Duration;

use tracing::{error, warn};
use uuid::Uuid;

use super::dto::UploadItem;
use crate::{error::AppError, state::AppState};

/// An object already written to storage.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub key: String,
    pub url: String,
}

/// Uploads every file under `<host_id>/<random>.<ext>`.
///
/// If any upload fails or times out, the objects written so far, and the one
/// that timed out, are deleted before the error is returned.
pub async fn upload_all(
    st: &AppState,
    host_id: i64,
    files: Vec<UploadItem>,
) -> Result<Vec<StoredImage>, AppError> {
    let limit = st.config.storage.timeout();
    let mut stored = Vec::with_capacity(files.len());

    for img in files {
        let ext = ext_from_mime(&img.content_type).unwrap_or("bin");
        let key = format!("{}/{}.{}", host_id, Uuid::new_v4(), ext);

        let outcome = tokio::time::timeout(
            limit,
            st.storage.put_object(&key, img.body, &img.content_type),
        )
        .await;

        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(format!("put_object {key}: {e:#}")),
            Err(_) => {
                let reason = format!("put_object {key}: timed out after {limit:?}");
                // The write may still land after we stop waiting.
                stored.push(StoredImage {
                    url: st.storage.public_url(&key),
                    key: key.clone(),
                });
                Some(reason)
            }
        };
        if let Some(reason) = failure {
            error!(host_id, written = stored.len(), %reason, "image upload failed");
            discard(st, &stored).await;
            return Err(AppError::Upstream(reason));
        }

        let url = st.storage.public_url(&key);
        stored.push(StoredImage { key, url });
    }

    Ok(stored)
}

/// Compensating delete for objects whose registration did not commit.
/// Failures are logged and otherwise ignored.
pub async fn discard(st: &AppState, images: &[StoredImage]) {
    let limit: Duration = st.config.storage.timeout();
    for img in images {
        match tokio::time::timeout(limit, st.storage.delete_object(&img.key)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(key = %img.key, error = %e, "orphaned object: delete failed"),
            Err(_) => warn!(key = %img.key, "orphaned object: delete timed out"),
        }
    }
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}
