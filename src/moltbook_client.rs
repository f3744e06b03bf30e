use anyhow::{Context, Result};
use reqwest::StatusCode;

use crate::models::*;

#[derive(Clone)]
pub struct MoltbookClient {
    base_url: String,
    client: reqwest::Client,
}

impl MoltbookClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Fetch the newest posts. A non-200 status degrades to an empty list so
    /// the run skips quietly instead of failing; transport errors propagate.
    pub async fn get_recent_posts(&self, limit: usize) -> Result<Vec<PostSummary>> {
        let url = format!("{}/posts?sort=new&limit={}", self.base_url, limit);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch recent posts")?;

        if response.status() != StatusCode::OK {
            tracing::warn!("Recent posts request returned {}", response.status());
            return Ok(Vec::new());
        }

        let parsed: PostsResponse = response
            .json()
            .await
            .context("Failed to parse recent posts response")?;

        Ok(parsed.posts)
    }

    /// Fetch one post with its comments. No status check: an error body
    /// carries no `post` key and collapses to an empty detail.
    pub async fn get_post(&self, post_id: &str) -> Result<PostDetail> {
        let url = format!("{}/posts/{}", self.base_url, post_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch post {}", post_id))?;

        let parsed: PostDetailResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse post {} response", post_id))?;

        Ok(parsed.post.unwrap_or_default())
    }

    /// Publish a comment under the given agent credential. Returns whether
    /// the API confirmed creation; no retry on failure.
    pub async fn create_comment(
        &self,
        post_id: &str,
        api_key: &str,
        body: String,
        parent_comment_id: Option<String>,
    ) -> Result<bool> {
        let url = format!("{}/posts/{}/comments", self.base_url, post_id);
        let request = CreateCommentRequest {
            body,
            parent_comment_id,
        };

        let response = self
            .client
            .post(&url)
            .header("X-Agent-API-Key", api_key)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to post comment on {}", post_id))?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Comment creation returned {}: {}", status, body);
        }

        Ok(status == StatusCode::CREATED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn recent_posts_parses_list_on_200() {
        let app = Router::new().route(
            "/posts",
            get(|| async {
                Json(json!({
                    "posts": [
                        {"id": "1", "title": "A", "body": "first", "agent": {"name": "x"}},
                        {"id": "2", "title": "B"}
                    ]
                }))
            }),
        );
        let base = serve(app).await;

        let client = MoltbookClient::new(base);
        let posts = client.get_recent_posts(10).await.unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, "1");
        assert_eq!(posts[0].agent.as_ref().unwrap().name, "x");
        assert_eq!(posts[1].body, "");
        assert!(posts[1].agent.is_none());
    }

    #[tokio::test]
    async fn recent_posts_degrades_to_empty_on_error_status() {
        let app = Router::new().route(
            "/posts",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = serve(app).await;

        let client = MoltbookClient::new(base);
        let posts = client.get_recent_posts(10).await.unwrap();

        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn post_detail_returns_comments() {
        let app = Router::new().route(
            "/posts/:id",
            get(|Path(id): Path<String>| async move {
                Json(json!({
                    "post": {
                        "id": id,
                        "title": "A",
                        "body": "text",
                        "comments": [{"agent": {"name": "y"}, "body": "nice"}]
                    }
                }))
            }),
        );
        let base = serve(app).await;

        let client = MoltbookClient::new(base);
        let detail = client.get_post("1").await.unwrap();

        assert_eq!(detail.id, "1");
        assert_eq!(detail.comments.len(), 1);
        assert_eq!(detail.comments[0].agent.as_ref().unwrap().name, "y");
    }

    #[tokio::test]
    async fn post_detail_missing_post_key_collapses_to_empty() {
        let app = Router::new().route(
            "/posts/:id",
            get(|| async { Json(json!({"error": "not found"})) }),
        );
        let base = serve(app).await;

        let client = MoltbookClient::new(base);
        let detail = client.get_post("404").await.unwrap();

        assert!(detail.comments.is_empty());
    }

    #[tokio::test]
    async fn create_comment_sends_credential_and_reports_201() {
        let seen: Arc<Mutex<Vec<(String, Value)>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_handler = seen.clone();
        let app = Router::new().route(
            "/posts/:id/comments",
            post(
                move |headers: HeaderMap, Path(id): Path<String>, Json(body): Json<Value>| {
                    let seen = seen_handler.clone();
                    async move {
                        let key = headers
                            .get("X-Agent-API-Key")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default()
                            .to_string();
                        seen.lock().unwrap().push((key, body));
                        (StatusCode::CREATED, Json(json!({"comment": {"id": "c1", "post_id": id}})))
                    }
                },
            ),
        );
        let base = serve(app).await;

        let client = MoltbookClient::new(base);
        let ok = client
            .create_comment("1", "agent-key", "hello".to_string(), None)
            .await
            .unwrap();

        assert!(ok);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "agent-key");
        assert_eq!(seen[0].1["body"], "hello");
        // Top-level comments must not carry a parent reference at all.
        assert!(seen[0].1.get("parent_comment_id").is_none());
    }

    #[tokio::test]
    async fn create_comment_reports_false_on_rejection() {
        let app = Router::new().route(
            "/posts/:id/comments",
            post(|| async { (StatusCode::FORBIDDEN, "bad key") }),
        );
        let base = serve(app).await;

        let client = MoltbookClient::new(base);
        let ok = client
            .create_comment("1", "wrong-key", "hello".to_string(), None)
            .await
            .unwrap();

        assert!(!ok);
    }

    #[tokio::test]
    async fn create_comment_includes_parent_when_threaded() {
        let seen: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_handler = seen.clone();
        let app = Router::new().route(
            "/posts/:id/comments",
            post(move |Json(body): Json<Value>| {
                let seen = seen_handler.clone();
                async move {
                    seen.lock().unwrap().push(body);
                    (StatusCode::CREATED, Json(json!({})))
                }
            }),
        );
        let base = serve(app).await;

        let client = MoltbookClient::new(base);
        let ok = client
            .create_comment("1", "k", "reply".to_string(), Some("c9".to_string()))
            .await
            .unwrap();

        assert!(ok);
        assert_eq!(seen.lock().unwrap()[0]["parent_comment_id"], "c9");
    }
}
