//! Providers command handler

use anyhow::Result;

use promptbatch::analyzer::{ProviderKind, GEMINI_MODELS};
use promptbatch::Config;

/// List providers with their models and API key status.
#[cfg(not(tarpaulin_include))]
pub fn handle() -> Result<()> {
    let config = Config::load()?;
    let listing = render_provider_list(&config, |var| {
        std::env::var(var).is_ok_and(|v| !v.trim().is_empty())
    });
    print!("{}", listing);
    Ok(())
}

/// Render the provider table. `env_has_key` reports whether a variable is set.
pub fn render_provider_list(config: &Config, env_has_key: impl Fn(&str) -> bool) -> String {
    let mut out = format!(
        "{:<10}{:<24}{:<20}{}\n",
        "PROVIDER", "MODEL", "API KEY VARIABLE", "KEY"
    );

    for kind in ProviderKind::ALL {
        let settings = config.provider_settings(kind.name()).cloned().unwrap_or_default();
        let model = settings
            .model
            .unwrap_or_else(|| kind.default_model().to_string());
        let env_var = settings
            .api_key_env
            .unwrap_or_else(|| kind.default_api_key_env().to_string());
        let status = if settings.api_key.is_some_and(|k| !k.trim().is_empty()) {
            "set (config)"
        } else if env_has_key(&env_var) {
            "set"
        } else {
            "missing"
        };
        out.push_str(&format!(
            "{:<10}{:<24}{:<20}{}\n",
            kind.name(),
            model,
            env_var,
            status
        ));
    }

    out.push_str(&format!("\nDefault provider: {}\n", config.providers.default));
    out.push_str("\nGemini models:\n");
    for model in GEMINI_MODELS {
        out.push_str(&format!("  {}\n", model));
    }
    out
}
