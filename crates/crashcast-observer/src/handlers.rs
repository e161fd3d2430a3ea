//! REST API endpoint handlers for the observer server.
//!
//! All handlers read from the in-memory [`LiveSnapshot`] via the shared
//! [`AppState`]; none of them touch the database.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/status` | Current round snapshot |
//! | `GET` | `/api/history` | Recently completed rounds |
//!
//! [`LiveSnapshot`]: crate::state::LiveSnapshot

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use crashcast_types::RoundLogEntry;

use crate::state::{AppState, LiveSnapshot};

/// Serve a minimal HTML page showing the round in play and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let live = state.live.read().await;
    let round = live
        .round_id
        .map_or_else(|| String::from("--"), |id| id.to_string());
    let score = live.live_score.to_string();
    let phase = if live.crashed { "CRASHED" } else { "LIVE" };
    let history_count = live.previous_rounds.len();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Crashcast Observer</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        a:hover {{ text-decoration: underline; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        li::before {{ content: "GET "; color: #7ee787; font-weight: bold; }}
        .status {{ color: #3fb950; font-weight: bold; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Crashcast Observer</h1>
    <p class="subtitle">Live round monitoring server</p>

    <p>Status: <span class="status">RUNNING</span></p>

    <div>
        <div class="metric">
            <div class="label">Round</div>
            <div class="value">{round}</div>
        </div>
        <div class="metric">
            <div class="label">Multiplier</div>
            <div class="value">{score}x</div>
        </div>
        <div class="metric">
            <div class="label">Phase</div>
            <div class="value">{phase}</div>
        </div>
        <div class="metric">
            <div class="label">History</div>
            <div class="value">{history_count}</div>
        </div>
    </div>

    <hr>

    <h2>API Endpoints</h2>
    <ul>
        <li><a href="/api/status">/api/status</a> -- Current round snapshot</li>
        <li><a href="/api/history">/api/history</a> -- Recently completed rounds</li>
    </ul>

    <h2>WebSocket</h2>
    <ul>
        <li style="list-style:none;"><code>ws://host:port/ws/game</code> -- Live game event stream</li>
    </ul>
</body>
</html>"#
    ))
}

/// `GET /api/status` -- the current live snapshot as JSON.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<LiveSnapshot> {
    let live = state.live.read().await;
    Json(live.clone())
}

/// `GET /api/history` -- recently completed rounds, newest first.
pub async fn get_history(State(state): State<Arc<AppState>>) -> Json<Vec<RoundLogEntry>> {
    let live = state.live.read().await;
    Json(live.previous_rounds.clone())
}
