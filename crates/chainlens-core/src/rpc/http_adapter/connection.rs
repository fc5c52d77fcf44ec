use std::path::Path;

use reqwest::Url;

use crate::error::CoreError;

/// A validated daemon endpoint with any URL-embedded credentials split off.
#[derive(Debug, PartialEq, Eq)]
pub(super) struct Endpoint {
    pub(super) url: String,
    pub(super) embedded_auth: Option<(String, String)>,
}

pub(super) fn resolve_auth(
    user: Option<&str>,
    pass: Option<&str>,
    embedded: Option<(String, String)>,
    cookie_file: Option<&Path>,
) -> Result<Option<(String, String)>, CoreError> {
    match (user, pass) {
        (Some(u), Some(p)) => return Ok(Some((u.to_owned(), p.to_owned()))),
        (Some(_), None) | (None, Some(_)) => {
            return Err(CoreError::InvalidArgument(
                "both rpc user and rpc pass must be set together".to_owned(),
            ));
        }
        (None, None) => {}
    }

    if embedded.is_some() {
        return Ok(embedded);
    }

    let Some(cookie_file) = cookie_file else {
        return Ok(None);
    };

    let content = std::fs::read_to_string(cookie_file).map_err(|e| {
        CoreError::InvalidArgument(format!(
            "failed to read rpc cookie file {}: {e}",
            cookie_file.display()
        ))
    })?;
    let line = content
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .ok_or_else(|| {
            CoreError::InvalidArgument(format!(
                "rpc cookie file {} is empty",
                cookie_file.display()
            ))
        })?;

    let (cookie_user, cookie_pass) = line.split_once(':').ok_or_else(|| {
        CoreError::InvalidArgument(format!(
            "rpc cookie file {} must contain `username:password`",
            cookie_file.display()
        ))
    })?;
    if cookie_user.is_empty() || cookie_pass.is_empty() {
        return Err(CoreError::InvalidArgument(format!(
            "rpc cookie file {} must contain non-empty `username:password`",
            cookie_file.display()
        )));
    }

    Ok(Some((cookie_user.to_owned(), cookie_pass.to_owned())))
}

pub(super) fn parse_connection(connection: &str) -> Result<Endpoint, CoreError> {
    let mut parsed = Url::parse(connection).map_err(|e| {
        CoreError::InvalidArgument(format!(
            "invalid connection `{connection}`: expected HTTP(S) URL ({e})"
        ))
    })?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(CoreError::InvalidArgument(format!(
                "unsupported connection scheme `{other}`; expected http or https"
            )))
        }
    }

    let embedded_auth = match (parsed.username(), parsed.password()) {
        ("", None) => None,
        (user, Some(pass)) if !user.is_empty() => Some((user.to_owned(), pass.to_owned())),
        _ => {
            return Err(CoreError::InvalidArgument(format!(
                "connection `{}` must embed both user and password or neither",
                redact(&parsed)
            )))
        }
    };

    // Credentials travel in the Authorization header, never in the logged URL.
    if embedded_auth.is_some() {
        let _ = parsed.set_username("");
        let _ = parsed.set_password(None);
    }

    Ok(Endpoint {
        url: parsed.to_string(),
        embedded_auth,
    })
}

/// Build the daemon URL from discrete connection parameters.
pub(super) fn url_from_parts(host: &str, port: u16) -> String {
    format!("http://{host}:{port}/")
}

/// `connection` with any embedded user and password removed, for logging.
/// Text that does not parse as a URL is returned unchanged.
pub fn redact_connection(connection: &str) -> String {
    Url::parse(connection)
        .map(|url| redact(&url))
        .unwrap_or_else(|_| connection.to_owned())
}

fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    let _ = shown.set_username("");
    let _ = shown.set_password(None);
    shown.to_string()
}
