use thiserror::Error;

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(super) server: ServerSettings,
    pub(super) runtime: RuntimeSettings,
    pub(super) api: ApiSettings,
    pub(super) cors: CorsSettings,
    pub(super) redis: RedisSettings,
    pub(super) upstream: UpstreamSettings,
    pub(super) listing: ListingSettings,
    pub(super) limits: LimitSettings,
    pub(super) presence: PresenceSettings,
    pub(super) telemetry: TelemetrySettings,
}

#[derive(Debug, Clone)]
pub(crate) struct ServerSettings {
    pub(super) host: ServerHost,
    pub(super) port: ServerPort,
}

#[derive(Debug, Clone)]
pub(crate) struct ApiSettings {
    pub(crate) project_name: String,
    pub(crate) version: String,
    pub(crate) prefix: String,
}

#[derive(Debug, Clone)]
pub(crate) struct CorsSettings {
    pub(crate) origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct RedisSettings {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) db: u16,
    pub(crate) password: String,
}

/// Base URLs of the remote services the gateway fronts.
#[derive(Debug, Clone)]
pub(crate) struct UpstreamSettings {
    pub(crate) auth_url: String,
    pub(crate) teacher_tools_url: String,
    pub(crate) quiz_url: String,
    pub(crate) content_url: String,
    pub(crate) learning_path_url: String,
    pub(crate) forum_url: String,
    pub(crate) ai_url: String,
    pub(crate) timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct ListingSettings {
    pub(crate) page_size: usize,
    pub(crate) max_page_size: usize,
    pub(crate) session_cache_seconds: u64,
    pub(crate) collection_cache_seconds: u64,
    pub(crate) collection_cache_backend: CacheBackend,
}

/// Where collection snapshots live between page views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheBackend {
    Redis,
    /// Process-local map; snapshots are not shared between gateway instances.
    Memory,
}

#[derive(Debug, Clone)]
pub(crate) struct LimitSettings {
    pub(crate) max_upload_size_mb: u64,
    pub(crate) allowed_upload_extensions: Vec<String>,
    pub(crate) ai_ask_rate_limit: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct PresenceSettings {
    pub(crate) refresh_seconds: u64,
    pub(crate) service_token: String,
}

#[derive(Debug, Clone)]
pub(crate) struct TelemetrySettings {
    pub(crate) log_level: String,
    pub(crate) json: bool,
    pub(crate) prometheus_enabled: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct RuntimeSettings {
    pub(crate) environment: Environment,
    pub(crate) strict_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Environment {
    Development,
    Production,
    Staging,
    Test,
}

impl Environment {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Test => "test",
        }
    }

    pub(super) fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum UpstreamService {
    Auth,
    TeacherTools,
    Quiz,
    Content,
    LearningPath,
    Forum,
    Ai,
}

impl UpstreamService {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::TeacherTools => "teacher_tools",
            Self::Quiz => "quiz",
            Self::Content => "content",
            Self::LearningPath => "learning_path",
            Self::Forum => "forum",
            Self::Ai => "ai",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ServerHost(pub(super) String);

#[derive(Debug, Clone, Copy)]
pub(crate) struct ServerPort(pub(super) u16);

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("invalid server host: {0}")]
    InvalidHost(String),
    #[error("invalid server port: {0}")]
    InvalidPort(String),
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("invalid cors origins: {0}")]
    InvalidCors(String),
    #[error("missing required secret for {0}")]
    MissingSecret(&'static str),
}

impl RedisSettings {
    pub(crate) fn redis_url(&self) -> String {
        if self.password.is_empty() {
            format!("redis://{}:{}/{}", self.host, self.port, self.db)
        } else {
            format!("redis://:{}@{}:{}/{}", self.password, self.host, self.port, self.db)
        }
    }
}

impl UpstreamSettings {
    pub(crate) fn base_url(&self, service: UpstreamService) -> &str {
        match service {
            UpstreamService::Auth => &self.auth_url,
            UpstreamService::TeacherTools => &self.teacher_tools_url,
            UpstreamService::Quiz => &self.quiz_url,
            UpstreamService::Content => &self.content_url,
            UpstreamService::LearningPath => &self.learning_path_url,
            UpstreamService::Forum => &self.forum_url,
            UpstreamService::Ai => &self.ai_url,
        }
    }

    pub(super) fn all(&self) -> [(&'static str, &str); 7] {
        [
            ("AUTH_SERVICE_URL", &self.auth_url),
            ("TEACHER_TOOLS_URL", &self.teacher_tools_url),
            ("QUIZ_SERVICE_URL", &self.quiz_url),
            ("CONTENT_SERVICE_URL", &self.content_url),
            ("LEARNING_PATH_URL", &self.learning_path_url),
            ("FORUM_SERVICE_URL", &self.forum_url),
            ("AI_SERVICE_URL", &self.ai_url),
        ]
    }
}

impl ServerHost {
    pub(super) fn parse(value: String) -> Result<Self, ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::InvalidHost(value));
        }

        Ok(Self(value))
    }
}

impl ServerPort {
    pub(super) fn parse(value: String) -> Result<Self, ConfigError> {
        let parsed: u16 = value.parse().map_err(|_| ConfigError::InvalidPort(value.clone()))?;
        if parsed == 0 {
            return Err(ConfigError::InvalidPort(value));
        }

        Ok(Self(parsed))
    }
}
