use axum::response::Html;

/// GET /
/// Serves the embedded single-page chat widget. The page keeps the transcript
/// in the browser and posts it back with every message.
pub async fn widget_handler() -> Html<&'static str> {
    Html(include_str!("../../static/chat.html"))
}
