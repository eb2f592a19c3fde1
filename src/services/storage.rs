use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::fs;
use tracing::warn;
use uuid::Uuid;

use crate::error::AppError;

const PROFILE_IMAGES: &str = "profile-images";

/// URL prefix the upload root is served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// File-backed blob store for user uploads.
#[derive(Clone)]
pub struct StorageService {
    root: Arc<PathBuf>,
}

impl StorageService {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root: Arc::new(root),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_structure(&self) -> Result<(), AppError> {
        fs::create_dir_all(self.root().join(PROFILE_IMAGES)).await?;
        Ok(())
    }

    /// Stores a profile image under a fresh name and returns its public URL.
    pub async fn put_profile_image(
        &self,
        user_id: &str,
        content_type: Option<&str>,
        file_name: Option<&str>,
        data: &[u8],
    ) -> Result<String, AppError> {
        let extension = image_extension(content_type, file_name).ok_or_else(|| {
            AppError::BadRequest("profile image must be a PNG, JPEG, GIF or WebP file".into())
        })?;
        let suffix = Uuid::new_v4().simple().to_string();
        let name = format!("{}-{}.{extension}", safe_segment(user_id), &suffix[..12]);

        let dir = self.root().join(PROFILE_IMAGES);
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join(&name), data).await?;

        Ok(format!("{PUBLIC_PREFIX}/{PROFILE_IMAGES}/{name}"))
    }

    /// Deletes a previously stored image. URLs that do not point into this
    /// store are ignored.
    pub async fn remove_by_url(&self, url: &str) {
        let Some(relative) = url
            .strip_prefix(PUBLIC_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            return;
        };
        if relative.split('/').any(|segment| segment == ".." || segment.is_empty()) {
            return;
        }
        let path = self.root().join(relative);
        if let Err(err) = fs::remove_file(&path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), "could not remove old upload: {err}");
            }
        }
    }
}

fn image_extension(content_type: Option<&str>, file_name: Option<&str>) -> Option<&'static str> {
    let by_type = content_type.and_then(|mime| match mime {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    });
    by_type.or_else(|| {
        let ext = Path::new(file_name?).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some("png"),
            "jpg" | "jpeg" => Some("jpg"),
            "gif" => Some("gif"),
            "webp" => Some("webp"),
            _ => None,
        }
    })
}

fn safe_segment(raw: &str) -> String {
    raw.chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '-')
        .collect()
}
