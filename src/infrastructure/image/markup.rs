//! Extraction of continuation data from conversion service pages.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;

use crate::domain::errors::ResponseIssue;

static FORM_ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<form\b[^>]*\bclass="form ajax-form"[^>]*\baction="([^"]*)""#)
        .expect("Invalid regex")
});

static TOKEN_INPUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<input\b[^>]*\bname="token"[^>]*>"#).expect("Invalid regex"));

static VALUE_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bvalue="([^"]*)""#).expect("Invalid regex"));

static OUTPUT_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<div\b[^>]*\bid="output"[^>]*>.*?<img\b[^>]*\bsrc="([^"]+)""#)
        .expect("Invalid regex")
});

/// Continuation of the first conversion stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionForm {
    /// Where the token must be posted.
    pub action: Url,
    /// Hidden token identifying the uploaded source.
    pub token: String,
}

/// Extracts the form action and token from the conversion page.
///
/// # Errors
/// Returns the missing or malformed field.
pub fn parse_conversion_form(html: &str) -> Result<ConversionForm, ResponseIssue> {
    let action = FORM_ACTION_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or(ResponseIssue::MissingConversionForm)?;

    let token = TOKEN_INPUT_RE
        .find(html)
        .and_then(|input| VALUE_ATTR_RE.captures(input.as_str()))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|token| !token.is_empty())
        .ok_or(ResponseIssue::MissingToken)?;

    let action =
        Url::parse(action).map_err(|_| ResponseIssue::InvalidActionUrl(action.to_string()))?;

    Ok(ConversionForm {
        action,
        token: token.to_string(),
    })
}

/// Extracts the converted image URL from the result page.
/// Relative sources are resolved against `page_url`.
///
/// # Errors
/// Returns the missing or malformed field.
pub fn parse_converted_image_url(html: &str, page_url: &Url) -> Result<Url, ResponseIssue> {
    let src = OUTPUT_IMAGE_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or(ResponseIssue::MissingDownloadUrl)?;

    page_url
        .join(src)
        .map_err(|_| ResponseIssue::InvalidDownloadUrl(src.to_string()))
}
