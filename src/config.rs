use anyhow::Result;
use serde::Deserialize;
use std::env;

use crate::quota::PlanLimits;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub public_base_url: String,
    pub frontend_url: Option<String>,
    pub upload_dir: String,
    pub jwt_secret: String,
    pub allowed_mime_types: Vec<String>,
    pub max_file_size: usize,
    pub max_batch_files: usize,
    pub quota_free_bytes: i64,
    pub quota_pro_bytes: i64,
    pub quota_business_bytes: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/linkpixel".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5001".to_string())
                .parse()?,
            public_base_url: env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:5001".to_string()),
            frontend_url: env::var("FRONTEND_URL").ok(),
            upload_dir: env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "./uploads".to_string()),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "change-me".to_string()),
            allowed_mime_types: env::var("ALLOWED_MIME_TYPES")
                .unwrap_or_else(|_| "image/jpeg,image/png,image/webp".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_file_size: env::var("MAX_FILE_SIZE")
                .unwrap_or_else(|_| "5242880".to_string()) // 5MB
                .parse()?,
            max_batch_files: env::var("MAX_BATCH_FILES")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            quota_free_bytes: env::var("QUOTA_FREE_BYTES")
                .unwrap_or_else(|_| "1073741824".to_string()) // 1GB
                .parse()?,
            quota_pro_bytes: env::var("QUOTA_PRO_BYTES")
                .unwrap_or_else(|_| "10737418240".to_string()) // 10GB
                .parse()?,
            quota_business_bytes: env::var("QUOTA_BUSINESS_BYTES")
                .unwrap_or_else(|_| "107374182400".to_string()) // 100GB
                .parse()?,
        })
    }

    pub fn plan_limits(&self) -> PlanLimits {
        PlanLimits {
            free: self.quota_free_bytes,
            pro: self.quota_pro_bytes,
            business: self.quota_business_bytes,
        }
    }
}
