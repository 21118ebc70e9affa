//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Returns the content hash for main.css.
///
/// The hash is computed at build time from the CSS file content.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Digits of a phone number, for `tel:` and `wa.me` links.
///
/// Usage in templates: `{{ phone|digits }}`
#[askama::filter_fn]
pub fn digits(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(value.to_string().chars().filter(char::is_ascii_digit).collect())
}

/// Filled and empty stars for a 1-5 rating.
///
/// Usage in templates: `{{ testimonial.rating|stars }}`
#[askama::filter_fn]
pub fn stars(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let rating = value.to_string().parse::<usize>().unwrap_or(5).min(5);
    Ok(format!("{}{}", "★".repeat(rating), "☆".repeat(5 - rating)))
}
