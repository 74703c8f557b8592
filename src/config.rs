use std::env;
use std::path::PathBuf;

/// Which backend holds the collection documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    Cloud,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Local => "local",
            StorageBackend::Cloud => "cloud",
        }
    }
}

/// Where normalized photo payloads land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoStorageMode {
    /// Base64 embedded in the record itself.
    Inline,
    /// JPEG files under the photos directory.
    Disk,
    /// Uploaded to the media service.
    Cloud,
}

impl PhotoStorageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoStorageMode::Inline => "inline",
            PhotoStorageMode::Disk => "disk",
            PhotoStorageMode::Cloud => "cloud",
        }
    }
}

#[derive(Clone)]
pub struct CloudConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
    pub api_base: String,
    pub delivery_base: String,
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub photos_dir: PathBuf,
    pub storage_backend: StorageBackend,
    pub photo_storage: PhotoStorageMode,
    pub author_secret: String,
    pub reader_secret: String,
    pub cloud: Option<CloudConfig>,
}

impl Config {
    pub fn from_env() -> Self {
        let storage_backend = match env::var("STORAGE_BACKEND").as_deref() {
            Ok("cloud") => StorageBackend::Cloud,
            Ok("local") | Err(_) => StorageBackend::Local,
            Ok(other) => panic!("STORAGE_BACKEND must be 'local' or 'cloud', got '{}'", other),
        };
        let photo_storage = match env::var("PHOTO_STORAGE").as_deref() {
            Ok("inline") | Err(_) => PhotoStorageMode::Inline,
            Ok("disk") => PhotoStorageMode::Disk,
            Ok("cloud") => PhotoStorageMode::Cloud,
            Ok(other) => panic!(
                "PHOTO_STORAGE must be 'inline', 'disk' or 'cloud', got '{}'",
                other
            ),
        };

        let cloud_required = storage_backend == StorageBackend::Cloud
            || photo_storage == PhotoStorageMode::Cloud;
        let cloud = Self::cloud_from_env(cloud_required);

        let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()));
        let photos_dir = env::var("PHOTOS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("photos"));

        Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            data_dir,
            photos_dir,
            storage_backend,
            photo_storage,
            author_secret: env::var("AUTHOR_SECRET").unwrap_or_else(|_| "admin123".to_string()),
            reader_secret: env::var("READER_SECRET").unwrap_or_else(|_| "love123".to_string()),
            cloud,
        }
    }

    /// The three media-service secrets stand or fall together. When any
    /// cloud mode is selected they are required; otherwise a partial set is
    /// still a configuration error rather than a half-configured client.
    fn cloud_from_env(required: bool) -> Option<CloudConfig> {
        let cloud_name = env::var("CLOUDINARY_CLOUD_NAME").ok();
        let api_key = env::var("CLOUDINARY_API_KEY").ok();
        let api_secret = env::var("CLOUDINARY_API_SECRET").ok();

        let any_set = cloud_name.is_some() || api_key.is_some() || api_secret.is_some();
        if !required && !any_set {
            return None;
        }

        Some(CloudConfig {
            cloud_name: cloud_name.expect("CLOUDINARY_CLOUD_NAME must be set for cloud storage"),
            api_key: api_key.expect("CLOUDINARY_API_KEY must be set for cloud storage"),
            api_secret: api_secret.expect("CLOUDINARY_API_SECRET must be set for cloud storage"),
            folder: env::var("CLOUDINARY_FOLDER").unwrap_or_else(|_| "memory_locker".to_string()),
            api_base: env::var("CLOUDINARY_API_BASE")
                .unwrap_or_else(|_| "https://api.cloudinary.com/v1_1".to_string()),
            delivery_base: env::var("CLOUDINARY_DELIVERY_BASE")
                .unwrap_or_else(|_| "https://res.cloudinary.com".to_string()),
        })
    }
}
