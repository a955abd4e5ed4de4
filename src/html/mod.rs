//! Streaming HTML clean-up with lol_html
//!
//! Runs on raw markup before it is parsed into a [`crate::dom::Document`].

use lol_html::{element, rewrite_str, RewriteStrSettings};

use crate::dom::OVERLAY_ATTRIBUTE;

/// Errors during HTML rewriting
#[derive(Debug, thiserror::Error)]
pub enum SanitizeError {
    #[error("HTML rewrite failed: {0}")]
    Rewrite(String),
}

/// Remove scripts, styles, event handlers and `javascript:` URLs
pub fn sanitize_html(html: &str) -> Result<String, SanitizeError> {
    let result = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("script", |el| {
                    el.remove();
                    Ok(())
                }),
                element!("style", |el| {
                    el.remove();
                    Ok(())
                }),
                element!("*", |el| {
                    let handlers: Vec<String> = el
                        .attributes()
                        .iter()
                        .map(|attr| attr.name())
                        .filter(|name| name.starts_with("on"))
                        .collect();
                    for name in handlers {
                        el.remove_attribute(&name);
                    }
                    for attr in ["href", "src"] {
                        if let Some(value) = el.get_attribute(attr) {
                            if value.trim().to_lowercase().starts_with("javascript:") {
                                el.remove_attribute(attr);
                            }
                        }
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| SanitizeError::Rewrite(e.to_string()))?;

    Ok(result)
}

/// Drop overlay markup saved along with a document.
///
/// Highlight wrappers are replaced by their content and markers removed, so
/// the markup matches the pristine document anchors were recorded against.
pub fn strip_overlay_markup(html: &str) -> Result<String, SanitizeError> {
    let wrappers = format!("span[{}=\"highlight\"]", OVERLAY_ATTRIBUTE);
    let markers = format!("span[{}=\"annotation-marker\"]", OVERLAY_ATTRIBUTE);

    let result = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(wrappers, |el| {
                    el.remove_and_keep_content();
                    Ok(())
                }),
                element!(markers, |el| {
                    el.remove();
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| SanitizeError::Rewrite(e.to_string()))?;

    Ok(result)
}
