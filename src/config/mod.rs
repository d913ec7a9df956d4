use axum::http::HeaderName;
use std::env;
use std::path::PathBuf;

/// Header carrying an externally supplied trace identifier
pub const DEFAULT_TRACE_HEADER: &str = "x-trace-id";

/// Runtime configuration for the upload router
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Root directory holding the `jpg/`, `pdf/`, `png/` and `others/` subtrees
    /// (default: "./media")
    pub media_root: PathBuf,

    /// Maximum accepted upload size in bytes (default: 256 MB)
    pub max_file_size: usize,

    /// Write through a temp file and rename over the destination (default: false)
    pub atomic_writes: bool,

    /// Inbound/outbound trace header (default: "x-trace-id")
    pub trace_header: HeaderName,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("./media"),
            max_file_size: 256 * 1024 * 1024, // 256 MB
            atomic_writes: false,
            trace_header: HeaderName::from_static(DEFAULT_TRACE_HEADER),
        }
    }
}

impl RouterConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            media_root: env::var("MEDIA_ROOT")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(default.media_root),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            atomic_writes: env::var("ATOMIC_WRITES")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(default.atomic_writes),

            trace_header: env::var("TRACE_HEADER")
                .ok()
                .and_then(|v| HeaderName::from_bytes(v.trim().to_lowercase().as_bytes()).ok())
                .unwrap_or(default.trace_header),
        }
    }

    /// Config rooted at an explicit directory, everything else default
    pub fn development(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
            ..Self::default()
        }
    }
}
