use crate::board::Layout;

#[derive(Debug, Clone)]
pub struct Config {
    pub narrator_api_key: Option<String>,
    pub narrator_model: String,
    pub narrator_base: String,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub device_id_path: String,
    pub sqlite_path: String,
    pub layout: Layout,
    pub seed: Option<u64>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            narrator_api_key: std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("API_KEY"))
                .ok()
                .filter(|k| !k.is_empty()),
            narrator_model: std::env::var("NARRATOR_MODEL").unwrap_or_else(|_| "gemini-3-pro-preview".to_string()),
            narrator_base: std::env::var("NARRATOR_BASE").unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
            supabase_url: std::env::var("SUPABASE_URL").ok(),
            supabase_anon_key: std::env::var("SUPABASE_ANON_KEY").ok(),
            device_id_path: std::env::var("DEVICE_ID_PATH").unwrap_or_else(|_| "./.lumina_device_id".to_string()),
            sqlite_path: std::env::var("SQLITE_PATH").unwrap_or_else(|_| "./readings.sqlite".to_string()),
            layout: std::env::var("LAYOUT").ok().and_then(|v| Layout::parse(&v)).unwrap_or(Layout::Grid),
            seed: std::env::var("SEED").ok().and_then(|v| v.parse().ok()),
            email: std::env::var("LUMINA_EMAIL").ok(),
            password: std::env::var("LUMINA_PASSWORD").ok(),
        }
    }

    /// Both hosted-service settings are present.
    pub fn access_configured(&self) -> bool {
        self.supabase_url.is_some() && self.supabase_anon_key.is_some()
    }
}
