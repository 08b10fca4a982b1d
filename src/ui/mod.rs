//! Xiavion windowed host.
//!
//! Uses `wry` child webviews inside one `tao` window:
//! - Windows: WebView2
//! - Linux: WebKitGTK (child webviews need X11)
//! - macOS: WKWebView
//!
//! The chrome is itself a webview; it reaches the coordinator through
//! `window.shellAPI` over wry IPC.

pub mod webview_app;
