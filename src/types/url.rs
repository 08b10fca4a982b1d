//! Resolution of chrome-supplied URLs into reserved internal pages or
//! external navigation targets.

use url::Url;

pub const SPEED_DIAL_URL: &str = "gx://speed";
pub const SETTINGS_URL: &str = "gx://settings";
pub const CORNER_URL: &str = "gx://corner";
pub const BLANK_URL: &str = "about:blank";

const SEARCH_PREFIX: &str = "https://www.google.com/search?q=";

/// Where a URL-accepting command should take a surface.
///
/// Resolved once at the entry of every command; handlers never string-match
/// reserved URLs themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedUrl {
    /// Speed dial / home page.
    Home,
    Settings,
    /// News / games corner.
    Corner,
    /// Anything else: handed to the engine for navigation.
    External(String),
}

impl ResolvedUrl {
    /// Resolve raw chrome input. Empty input and `about:blank` map to the home page;
    /// scheme-less input is normalized to an `https://` URL or a web search.
    pub fn resolve(input: &str) -> ResolvedUrl {
        let trimmed = input.trim();
        match trimmed {
            "" | BLANK_URL | SPEED_DIAL_URL => return ResolvedUrl::Home,
            SETTINGS_URL => return ResolvedUrl::Settings,
            CORNER_URL => return ResolvedUrl::Corner,
            _ => {}
        }

        if let Ok(parsed) = Url::parse(trimmed) {
            if !looks_like_host_port(&parsed) {
                return ResolvedUrl::External(trimmed.to_string());
            }
        }

        if trimmed.contains('.') && !trimmed.contains(char::is_whitespace) {
            return ResolvedUrl::External(format!("https://{}", trimmed));
        }
        if trimmed.starts_with("localhost") && !trimmed.contains(char::is_whitespace) {
            return ResolvedUrl::External(format!("http://{}", trimmed));
        }

        let query: String = url::form_urlencoded::byte_serialize(trimmed.as_bytes()).collect();
        ResolvedUrl::External(format!("{}{}", SEARCH_PREFIX, query))
    }

    /// The reserved pseudo-URL shown in the address bar for internal pages.
    pub fn reserved_url(&self) -> Option<&'static str> {
        match self {
            ResolvedUrl::Home => Some(SPEED_DIAL_URL),
            ResolvedUrl::Settings => Some(SETTINGS_URL),
            ResolvedUrl::Corner => Some(CORNER_URL),
            ResolvedUrl::External(_) => None,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.reserved_url().is_some()
    }

    /// The URL the chrome should display for this target.
    pub fn display_url(&self) -> &str {
        match self {
            ResolvedUrl::External(url) => url,
            other => other.reserved_url().unwrap_or(SPEED_DIAL_URL),
        }
    }
}

/// `localhost:3000` and `example.com:8080` parse as URLs with an odd scheme.
fn looks_like_host_port(parsed: &Url) -> bool {
    parsed.cannot_be_a_base()
        && (parsed.scheme().contains('.') || parsed.scheme() == "localhost")
        && !parsed.path().is_empty()
        && parsed.path().chars().all(|c| c.is_ascii_digit() || c == '/')
}

/// One of the `gx://` pseudo-URLs. Only the coordinator can show these; an
/// engine asked to load one directly has nothing to fetch.
pub fn is_reserved_url(url: &str) -> bool {
    matches!(url.trim(), SPEED_DIAL_URL | SETTINGS_URL | CORNER_URL)
}

/// Engine-side URLs produced by rendering synthesized HTML.
pub fn is_synthetic_engine_url(url: &str) -> bool {
    url.is_empty() || url == BLANK_URL || url.starts_with("data:")
}
