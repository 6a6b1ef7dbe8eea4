use std::{env, path::PathBuf};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Public base URL used to build photo links.
    pub app_url: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub storage_root: PathBuf,
    pub max_upload_kb: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let app_url = env::var("APP_URL").unwrap_or_else(|_| format!("http://{host}:{port}"));
        let token_ttl_hours = env::var("TOKEN_TTL_HOURS")
            .ok()
            .and_then(|h| h.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(24);
        let storage_root = env::var("STORAGE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("storage/app/public"));
        let max_upload_kb = env::var("MAX_UPLOAD_KB")
            .ok()
            .and_then(|kb| kb.parse::<usize>().ok())
            .filter(|kb| *kb > 0)
            .unwrap_or(2048);
        Ok(Self {
            port,
            database_url,
            host,
            app_url,
            jwt_secret,
            token_ttl_hours,
            storage_root,
            max_upload_kb,
        })
    }

    /// Request body ceiling: the photo itself plus room for the text fields
    /// and multipart framing.
    pub fn max_body_bytes(&self) -> usize {
        self.max_upload_kb
            .saturating_mul(1024)
            .saturating_add(64 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            database_url: String::new(),
            host: "127.0.0.1".into(),
            port: 3000,
            app_url: "http://127.0.0.1:3000".into(),
            jwt_secret: "secret".into(),
            token_ttl_hours: 24,
            storage_root: PathBuf::from("storage/app/public"),
            max_upload_kb: 2048,
        }
    }

    #[test]
    fn body_limit_leaves_room_for_form_fields() {
        assert_eq!(config().max_body_bytes(), (2048 + 64) * 1024);
    }

    #[test]
    fn huge_upload_limit_does_not_overflow() {
        let huge = AppConfig {
            max_upload_kb: usize::MAX,
            ..config()
        };
        assert_eq!(huge.max_body_bytes(), usize::MAX);
    }
}
