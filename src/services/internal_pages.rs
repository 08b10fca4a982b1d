//! HTML for the reserved `gx://` pages and the navigation error page.
//!
//! Pages are rendered locally and handed to the engine with `load_html`, so
//! showing one never touches the network.

use crate::types::resources::ResourceLimits;
use crate::types::url::ResolvedUrl;

/// Values that feed into the rendered pages.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub limits: ResourceLimits,
}

struct Shortcut {
    name: &'static str,
    url: &'static str,
}

const SHORTCUTS: &[Shortcut] = &[
    Shortcut { name: "Google", url: "https://www.google.com" },
    Shortcut { name: "YouTube", url: "https://www.youtube.com" },
    Shortcut { name: "GitHub", url: "https://github.com" },
    Shortcut { name: "Wikipedia", url: "https://www.wikipedia.org" },
    Shortcut { name: "Reddit", url: "https://www.reddit.com" },
    Shortcut { name: "Twitch", url: "https://www.twitch.tv" },
    Shortcut { name: "Discord", url: "https://discord.com" },
    Shortcut { name: "Netflix", url: "https://www.netflix.com" },
];

const CORNER_ITEMS: &[(&str, &str)] = &[
    ("Featured Games", "https://store.steampowered.com"),
    ("Free Games", "https://store.epicgames.com/free-games"),
    ("Game News", "https://www.ign.com"),
    ("Releases", "https://www.gamespot.com/games/upcoming"),
];

const BASE_STYLE: &str = "body { font-family: 'Inter', sans-serif; background-color: #0c0c0c; \
color: #fff; margin: 0; padding: 20px; } a { color: #b36bff; text-decoration: none; } \
.card { background-color: #181818; border-radius: 8px; padding: 15px; margin: 8px; display: inline-block; }";

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Render the page behind a reserved URL. `None` for external targets.
pub fn render(page: &ResolvedUrl, ctx: &PageContext) -> Option<String> {
    match page {
        ResolvedUrl::Home => Some(speed_dial()),
        ResolvedUrl::Settings => Some(settings(&ctx.limits)),
        ResolvedUrl::Corner => Some(corner()),
        ResolvedUrl::External(_) => None,
    }
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>{}</title><style>{}</style></head>
<body>
{}
</body></html>"#,
        title, BASE_STYLE, body
    )
}

fn speed_dial() -> String {
    let cards: String = SHORTCUTS
        .iter()
        .map(|s| {
            format!(
                r#"<a class="card" href="{}">{}</a>"#,
                escape_html(s.url),
                escape_html(s.name)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let body = format!(
        r#"<form action="https://www.google.com/search" method="get">
<input class="search-box" name="q" placeholder="Search the web" autofocus>
</form>
<div class="shortcuts">
{}
</div>"#,
        cards
    );
    page("Speed Dial", &body)
}

fn settings(limits: &ResourceLimits) -> String {
    let checked = if limits.is_limiter_enabled { " checked" } else { "" };
    let slider = |id: &str, label: &str, value: u8| {
        format!(
            r#"<div class="setting-item"><label for="{id}">{label}</label>
<input type="range" min="0" max="100" value="{value}" id="{id}"><span>{value}%</span></div>"#
        )
    };
    let body = format!(
        r#"<h1>Browser Settings</h1>
<section>
<h2>Resource Limiter</h2>
<div class="setting-item"><label for="limiter-toggle">Limit resource usage</label>
<input type="checkbox" id="limiter-toggle"{}></div>
{}
{}
{}
</section>"#,
        checked,
        slider("cpu-slider", "CPU limit", limits.cpu_limit),
        slider("ram-slider", "RAM limit", limits.ram_limit),
        slider("network-slider", "Network limit", limits.network_limit),
    );
    page("Settings", &body)
}

fn corner() -> String {
    let items: String = CORNER_ITEMS
        .iter()
        .map(|(name, url)| format!(r#"<a class="card" href="{}">{}</a>"#, url, name))
        .collect::<Vec<_>>()
        .join("\n");
    page("Corner", &format!("<h1>Corner</h1>\n<div>{}</div>", items))
}

/// Page shown in place of a navigation that could not be completed.
pub fn error_page(url: &str, error: &str) -> String {
    let body = format!(
        r#"<h2>This page could not be loaded</h2>
<p>URL: {}</p>
<p>Error: {}</p>"#,
        escape_html(url),
        escape_html(error)
    );
    page("Page not loaded", &body)
}
