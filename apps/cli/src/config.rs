use std::{collections::HashMap, fs};

#[derive(Debug, Clone)]
pub struct Settings {
    pub store_url: Option<String>,
    pub submit_timeout_secs: u64,
    pub thank_you_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_url: None,
            submit_timeout_secs: 15,
            thank_you_delay_ms: 1500,
        }
    }
}

/// Defaults, overlaid by `signup.toml` in the working directory, overlaid by
/// environment variables.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("signup.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            apply_file(&mut settings, &file_cfg);
        }
    }

    if let Ok(v) = std::env::var("SIGNUP_STORE_URL") {
        settings.store_url = Some(v);
    }
    if let Ok(v) = std::env::var("SIGNUP_SUBMIT_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.submit_timeout_secs = parsed;
        }
    }
    if let Ok(v) = std::env::var("SIGNUP_THANK_YOU_DELAY_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.thank_you_delay_ms = parsed;
        }
    }

    settings
}

fn apply_file(settings: &mut Settings, file_cfg: &HashMap<String, String>) {
    if let Some(v) = file_cfg.get("store_url") {
        settings.store_url = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("submit_timeout_secs") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.submit_timeout_secs = parsed;
        }
    }
    if let Some(v) = file_cfg.get("thank_you_delay_ms") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.thank_you_delay_ms = parsed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let mut settings = Settings::default();
        let file_cfg: HashMap<String, String> = toml::from_str(
            r#"
            store_url = "https://store.example.com/exec"
            submit_timeout_secs = "30"
            "#,
        )
        .expect("parse toml");

        apply_file(&mut settings, &file_cfg);
        assert_eq!(
            settings.store_url.as_deref(),
            Some("https://store.example.com/exec")
        );
        assert_eq!(settings.submit_timeout_secs, 30);
        assert_eq!(settings.thank_you_delay_ms, 1500);
    }

    #[test]
    fn unparseable_numbers_keep_defaults() {
        let mut settings = Settings::default();
        let file_cfg =
            HashMap::from([("submit_timeout_secs".to_string(), "forever".to_string())]);

        apply_file(&mut settings, &file_cfg);
        assert_eq!(settings.submit_timeout_secs, 15);
    }
}
