use super::parsing::{
    env_optional, env_or_default, is_http_url, normalize_base_url, parse_bool,
    parse_cache_backend, parse_cors_origins, parse_environment, parse_string_list, parse_u16, parse_u64, parse_usize,
};
use super::types::{
    ApiSettings, ConfigError, CorsSettings, LimitSettings, ListingSettings, PresenceSettings,
    RedisSettings, RuntimeSettings, ServerHost, ServerPort, ServerSettings, Settings,
    TelemetrySettings, UpstreamSettings,
};

const DEFAULT_UPLOAD_EXTENSIONS: &[&str] = &["pdf", "docx", "md", "txt"];

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("LEARNBRIDGE_HOST", "0.0.0.0");
        let port = env_or_default("LEARNBRIDGE_PORT", "8080");

        let environment = parse_environment(
            env_optional("LEARNBRIDGE_ENV").or_else(|| env_optional("ENVIRONMENT")),
        );
        let strict_config = env_optional("LEARNBRIDGE_STRICT_CONFIG")
            .map(|value| parse_bool(&value))
            .unwrap_or(false)
            || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "LearnBridge Gateway");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let prefix = env_or_default("API_PREFIX", "/api");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let redis_host = env_or_default("REDIS_HOST", "localhost");
        let redis_port = parse_u16("REDIS_PORT", env_or_default("REDIS_PORT", "6379"))?;
        let redis_db = parse_u16("REDIS_DB", env_or_default("REDIS_DB", "0"))?;
        let redis_password = env_or_default("REDIS_PASSWORD", "");

        let upstream = UpstreamSettings {
            auth_url: normalize_base_url(env_or_default(
                "AUTH_SERVICE_URL",
                "http://localhost:5001",
            )),
            teacher_tools_url: normalize_base_url(env_or_default(
                "TEACHER_TOOLS_URL",
                "http://localhost:5002",
            )),
            quiz_url: normalize_base_url(env_or_default(
                "QUIZ_SERVICE_URL",
                "http://localhost:5003",
            )),
            content_url: normalize_base_url(env_or_default(
                "CONTENT_SERVICE_URL",
                "http://localhost:5004",
            )),
            learning_path_url: normalize_base_url(env_or_default(
                "LEARNING_PATH_URL",
                "http://localhost:5005",
            )),
            forum_url: normalize_base_url(env_or_default(
                "FORUM_SERVICE_URL",
                "http://localhost:5006",
            )),
            ai_url: normalize_base_url(env_or_default("AI_SERVICE_URL", "http://localhost:5007")),
            timeout_seconds: parse_u64(
                "UPSTREAM_TIMEOUT_SECONDS",
                env_or_default("UPSTREAM_TIMEOUT_SECONDS", "30"),
            )?,
        };

        let page_size = parse_usize("LIST_PAGE_SIZE", env_or_default("LIST_PAGE_SIZE", "10"))?;
        let max_page_size = parse_usize("MAX_PAGE_SIZE", env_or_default("MAX_PAGE_SIZE", "100"))?;
        let session_cache_seconds = parse_u64(
            "SESSION_CACHE_SECONDS",
            env_or_default("SESSION_CACHE_SECONDS", "30"),
        )?;
        let collection_cache_seconds = parse_u64(
            "COLLECTION_CACHE_SECONDS",
            env_or_default("COLLECTION_CACHE_SECONDS", "60"),
        )?;
        let collection_cache_backend =
            parse_cache_backend(env_optional("COLLECTION_CACHE_BACKEND"))?;

        let max_upload_size_mb =
            parse_u64("MAX_UPLOAD_SIZE_MB", env_or_default("MAX_UPLOAD_SIZE_MB", "25"))?;
        let allowed_upload_extensions = parse_string_list(
            env_optional("ALLOWED_UPLOAD_EXTENSIONS"),
            DEFAULT_UPLOAD_EXTENSIONS,
        );
        let ai_ask_rate_limit =
            parse_u64("AI_ASK_RATE_LIMIT", env_or_default("AI_ASK_RATE_LIMIT", "20"))?;

        let refresh_seconds = parse_u64(
            "PRESENCE_REFRESH_SECONDS",
            env_or_default("PRESENCE_REFRESH_SECONDS", "30"),
        )?;
        let service_token = env_or_default("SERVICE_TOKEN", "");

        let log_level = env_or_default("LEARNBRIDGE_LOG_LEVEL", "info");
        let json =
            env_optional("LEARNBRIDGE_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, prefix },
            cors: CorsSettings { origins: cors_origins },
            redis: RedisSettings {
                host: redis_host,
                port: redis_port,
                db: redis_db,
                password: redis_password,
            },
            upstream,
            listing: ListingSettings {
                page_size,
                max_page_size,
                session_cache_seconds,
                collection_cache_seconds,
                collection_cache_backend,
            },
            limits: LimitSettings {
                max_upload_size_mb,
                allowed_upload_extensions,
                ai_ask_rate_limit,
            },
            presence: PresenceSettings { refresh_seconds, service_token },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn upstream(&self) -> &UpstreamSettings {
        &self.upstream
    }

    pub(crate) fn listing(&self) -> &ListingSettings {
        &self.listing
    }

    pub(crate) fn limits(&self) -> &LimitSettings {
        &self.limits
    }

    pub(crate) fn presence(&self) -> &PresenceSettings {
        &self.presence
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.listing.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "LIST_PAGE_SIZE",
                value: "0".to_string(),
            });
        }

        if self.listing.max_page_size < self.listing.page_size {
            return Err(ConfigError::InvalidValue {
                field: "MAX_PAGE_SIZE",
                value: self.listing.max_page_size.to_string(),
            });
        }

        if self.presence.refresh_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "PRESENCE_REFRESH_SECONDS",
                value: "0".to_string(),
            });
        }

        if self.upstream.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "UPSTREAM_TIMEOUT_SECONDS",
                value: "0".to_string(),
            });
        }

        for (field, url) in self.upstream.all() {
            if !is_http_url(url) {
                return Err(ConfigError::InvalidValue { field, value: url.to_string() });
            }
        }

        if self.limits.allowed_upload_extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ALLOWED_UPLOAD_EXTENSIONS",
                value: String::from("<empty>"),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.presence.service_token.is_empty() {
            return Err(ConfigError::MissingSecret("SERVICE_TOKEN"));
        }

        Ok(())
    }
}
