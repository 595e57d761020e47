use crate::errors::{PricingError, PricingResult};
use crate::models::precision::{Precision, MAX_DECIMAL_PLACES};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub precision: Precision,
    pub heatmap_steps: usize,
    pub heatmap_max_steps: usize,
    pub dashboard_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> PricingResult<Self> {
        dotenvy::dotenv().ok();

        let server_port = env_var_or("SERVER_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| PricingError::Config(format!("SERVER_PORT: {e}")))?;

        let decimal_places = env_var_or("PRICE_DECIMALS", "10")
            .parse::<u32>()
            .map_err(|e| PricingError::Config(format!("PRICE_DECIMALS: {e}")))?;
        if decimal_places > MAX_DECIMAL_PLACES {
            return Err(PricingError::Config(format!(
                "PRICE_DECIMALS: {decimal_places} exceeds {MAX_DECIMAL_PLACES}"
            )));
        }

        let heatmap_steps = env_var_or("HEATMAP_STEPS", "10")
            .parse::<usize>()
            .map_err(|e| PricingError::Config(format!("HEATMAP_STEPS: {e}")))?;

        let heatmap_max_steps = env_var_or("HEATMAP_MAX_STEPS", "50")
            .parse::<usize>()
            .map_err(|e| PricingError::Config(format!("HEATMAP_MAX_STEPS: {e}")))?;

        if heatmap_steps == 0 || heatmap_steps > heatmap_max_steps {
            return Err(PricingError::Config(format!(
                "HEATMAP_STEPS: {heatmap_steps} must be in 1..={heatmap_max_steps}"
            )));
        }

        Ok(Self {
            server_port,
            precision: Precision::new(decimal_places),
            heatmap_steps,
            heatmap_max_steps,
            dashboard_dir: PathBuf::from(env_var_or("DASHBOARD_DIR", "dashboard/dist")),
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 3001,
            precision: Precision::default(),
            heatmap_steps: 10,
            heatmap_max_steps: 50,
            dashboard_dir: PathBuf::from("dashboard/dist"),
        }
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
