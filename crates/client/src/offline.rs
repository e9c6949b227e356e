//! Synthetic responses for when neither network nor cache can answer.
//!
//! Selection, first match wins:
//! 1. `Accept` mentions `text/html` → offline page (200)
//! 2. path ends in `.css` → base stylesheet so the offline page is styled
//! 3. path ends in `.js` → script that marks the demo container as offline
//! 4. anything else → empty 503
//!
//! Fallbacks are built fresh each time and never stored.

use cyft_core::{Request, Response};

const OFFLINE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Cyft - Offline</title>
    <style>
      body {
        font-family: -apple-system, system-ui, sans-serif;
        background: #fff;
        color: #1a1a1a;
        margin: 0;
        display: flex;
        align-items: center;
        justify-content: center;
        min-height: 100vh;
        text-align: center;
        padding: 2rem;
      }
      .offline-container { max-width: 600px; }
      h1 { font-size: 3rem; font-weight: 700; margin-bottom: 1rem; }
      p { font-size: 1.25rem; line-height: 1.6; color: #666; margin-bottom: 2rem; }
      .retry-btn {
        display: inline-block;
        padding: 1rem 2rem;
        background: #1a1a1a;
        color: white;
        text-decoration: none;
        border-radius: 0.5rem;
        font-weight: 600;
        transition: transform 0.2s;
      }
      .retry-btn:hover { transform: translateY(-2px); }
    </style>
</head>
<body>
    <div class="offline-container">
        <h1>You're Offline</h1>
        <p>The Cyft experience requires an internet connection. Please check your connection and try again.</p>
        <a href="/" class="retry-btn" onclick="location.reload(); return false;">Try Again</a>
    </div>
</body>
</html>"#;

const OFFLINE_CSS: &str = "/* offline base styles */
body { background: #fff; color: #1a1a1a; font-family: system-ui, sans-serif; }
.section { background: #fff; padding: 2rem; }
.demo__container { background: #f8f8f8; padding: 2rem; border-radius: 0.5rem; }
.btn { background: #1a1a1a; color: white; padding: 1rem 2rem; border-radius: 0.5rem; }
[data-loading-indicator] { position: fixed; bottom: 20px; right: 20px; }";

const OFFLINE_JS: &str = r#"console.log('[Cyft] Running in offline mode');
document.addEventListener('DOMContentLoaded', () => {
  const demo = document.getElementById('demo-container');
  if (demo && !demo.querySelector('[data-offline-message]')) {
    const msg = document.createElement('div');
    msg.setAttribute('data-offline-message', '');
    msg.innerHTML = '<p style="text-align:center;color:#666;">Connection required for interactive demo</p>';
    demo.prepend(msg);
  }
});"#;

/// Build the fallback for `request`.
pub fn offline_response(request: &Request) -> Response {
    let path = request.path();

    if request.accept().contains("text/html") {
        Response::new(200, OFFLINE_HTML).with_header("content-type", "text/html; charset=utf-8")
    } else if path.ends_with(".css") {
        Response::new(200, OFFLINE_CSS).with_header("content-type", "text/css; charset=utf-8")
    } else if path.ends_with(".js") {
        Response::new(200, OFFLINE_JS).with_header("content-type", "application/javascript; charset=utf-8")
    } else {
        Response::new(503, "")
    }
}
