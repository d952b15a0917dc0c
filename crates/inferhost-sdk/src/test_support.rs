//! In-process HTTP servers for exercising the clients end to end.

use axum::Router;
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral localhost port and return its base URL.
pub(crate) async fn spawn_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Bearer-only auth for exercising clients without an IAM server.
pub(crate) struct StaticAuth;

impl crate::auth::AuthProvider for StaticAuth {
    fn auth_headers(&self) -> crate::error::SdkResult<reqwest::header::HeaderMap> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_static("Bearer test"),
        );
        Ok(headers)
    }
}
