use url::Url;

use crate::errors::ValidationError;

pub const MIN_API_KEY_CHARS: usize = 10;
pub const MIN_TEXT_CHARS: usize = 3;
pub const DALLE_PROMPT_MAX_CHARS: usize = 4000;

pub fn validate_secret(raw: &str, min_chars: usize) -> Result<String, ValidationError> {
    let secret = raw.trim();
    if secret.is_empty() {
        return Err(ValidationError("A value is required.".to_string()));
    }
    if secret.chars().count() < min_chars {
        return Err(ValidationError(format!(
            "Enter at least {min_chars} characters."
        )));
    }
    Ok(secret.to_string())
}

/// Accepts absolute `https://` URLs with a host and nothing after the path. The trailing slash
/// is dropped so paths can be appended with `format!`.
pub fn validate_https_url(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed)
        .map_err(|err| ValidationError(format!("'{trimmed}' is not a valid URL ({err}).")))?;
    if parsed.scheme() != "https" {
        return Err(ValidationError("Endpoint must use https://.".to_string()));
    }
    if parsed.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(ValidationError("Endpoint must include a host.".to_string()));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(ValidationError(
            "Endpoint must not include a query string or fragment.".to_string(),
        ));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

pub fn validate_text(raw: &str, max_chars: Option<usize>) -> Result<String, ValidationError> {
    let text = raw.trim();
    let count = text.chars().count();
    if count < MIN_TEXT_CHARS {
        return Err(ValidationError(format!(
            "Enter at least {MIN_TEXT_CHARS} characters."
        )));
    }
    if let Some(max) = max_chars {
        if count > max {
            return Err(ValidationError(format!(
                "Enter at most {max} characters ({count} given)."
            )));
        }
    }
    Ok(text.to_string())
}
