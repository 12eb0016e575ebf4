use anyhow::Context;

/// Where we store secrets in the OS keyring.
///
/// Constant so upgrades don't orphan secrets.
const SERVICE: &str = "intervue";

/// Takes precedence over the keyring when set and non-blank.
pub const LLM_API_KEY_ENV: &str = "INTERVUE_LLM_API_KEY";
pub const DETECTOR_API_KEY_ENV: &str = "INTERVUE_DETECTOR_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKey {
    LlmApiKey,
    DetectorApiKey,
}

impl SecretKey {
    fn user(self) -> &'static str {
        match self {
            SecretKey::LlmApiKey => "llm_api_key",
            SecretKey::DetectorApiKey => "detector_api_key",
        }
    }

    fn env_var(self) -> &'static str {
        match self {
            SecretKey::LlmApiKey => LLM_API_KEY_ENV,
            SecretKey::DetectorApiKey => DETECTOR_API_KEY_ENV,
        }
    }
}

pub fn set_secret(key: SecretKey, value: &str) -> anyhow::Result<()> {
    let entry = keyring::Entry::new(SERVICE, key.user()).context("create keyring entry")?;
    entry.set_password(value).context("set secret")
}

pub fn get_secret(key: SecretKey) -> anyhow::Result<Option<String>> {
    let entry = keyring::Entry::new(SERVICE, key.user()).context("create keyring entry")?;

    match entry.get_password() {
        Ok(v) => Ok(Some(v)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(anyhow::Error::new(e)).context("get secret"),
    }
}

pub fn delete_secret(key: SecretKey) -> anyhow::Result<()> {
    let entry = keyring::Entry::new(SERVICE, key.user()).context("create keyring entry")?;
    match entry.delete_credential() {
        Ok(()) => Ok(()),
        Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(anyhow::Error::new(e)).context("delete secret"),
    }
}

/// Environment first, then the keyring.
pub fn resolve_secret(key: SecretKey) -> anyhow::Result<Option<String>> {
    if let Some(value) = non_blank(std::env::var(key.env_var()).ok()) {
        return Ok(Some(value));
    }
    Ok(non_blank(get_secret(key)?))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_are_stable() {
        // Never touch the developer's real keyring in tests.
        assert_eq!(SecretKey::LlmApiKey.user(), "llm_api_key");
        assert_eq!(SecretKey::DetectorApiKey.user(), "detector_api_key");
        assert_eq!(SecretKey::LlmApiKey.env_var(), "INTERVUE_LLM_API_KEY");
        assert_eq!(
            SecretKey::DetectorApiKey.env_var(),
            "INTERVUE_DETECTOR_API_KEY"
        );
    }

    #[test]
    fn blank_values_are_treated_as_missing() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some(" sk-1 ".into())).as_deref(), Some("sk-1"));
    }
}
