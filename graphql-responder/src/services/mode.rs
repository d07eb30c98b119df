use http::HeaderMap;
use http::header::ACCEPT;
use mediatype::MediaTypeList;
use mediatype::names::HTML;
use mediatype::names::TEXT;

/// How a request is answered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResponseMode {
    /// The execution result as `application/json`.
    Json,
    /// The interactive explorer page.
    Explorer,
}

impl ResponseMode {
    /// Pick the mode of a request.
    ///
    /// The explorer is served only when it is enabled, the client did not ask
    /// for the raw result and some `accept` header lists `text/html`.
    pub fn select(explorer_enabled: bool, raw: Option<bool>, headers: &HeaderMap) -> Self {
        let mode = if explorer_enabled && raw != Some(true) && prefers_html(headers) {
            ResponseMode::Explorer
        } else {
            ResponseMode::Json
        };
        tracing::debug!(?mode, explorer_enabled, ?raw, "selected response mode");
        mode
    }
}

/// Returns true if any `accept` header contains `text/html`, whatever its parameters.
fn prefers_html(headers: &HeaderMap) -> bool {
    headers.get_all(ACCEPT).iter().any(|value| {
        value
            .to_str()
            .map(|accept_str| {
                let mut list = MediaTypeList::new(accept_str);

                list.any(|mime| {
                    mime.as_ref()
                        .map(|mime| mime.ty == TEXT && mime.subty == HTML)
                        .unwrap_or(false)
                })
            })
            .unwrap_or(false)
    })
}
