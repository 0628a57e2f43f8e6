//! Defines every route of the content-operations API.
//!
//! ## Structure
//! - **Public**
//!   - `GET  /healthz`, `GET /readyz`
//!   - `GET  /login`: login page, `POST /login`: issue a token
//!   - unmatched paths: not-found page (404)
//!
//! - **Pages** (auth gate)
//!   - `/`, `/dashboard`, `/calendar`, `/ad-tracking`, `/profile`,
//!     `/change-password`, `/users`, `/history`, `/instagram-dm`,
//!     `/newsletter-template`, `/youtube-repurposing`, `/shared-docs/{document_id}`
//!
//! - **Upload sessions** (auth gate)
//!   - `POST   /api/uploads`: open session
//!   - `GET    /api/uploads/{session_id}`: view, `DELETE`: tear down
//!   - `POST   /api/uploads/{session_id}/files`: add multipart batch
//!   - `DELETE /api/uploads/{session_id}/files/{file_id}`: remove file
//!   - `GET    /api/uploads/{session_id}/files/{file_id}/preview`
//!   - `PATCH  /api/uploads/{session_id}/files/{file_id}/metadata`
//!   - `PATCH  /api/uploads/{session_id}/submission`
//!   - `DELETE /api/uploads/{session_id}/error`: dismiss banner
//!   - `POST   /api/uploads/{session_id}/submit`
//!   - `GET    /api/submissions`, `GET /api/submissions/{id}`,
//!     `GET /api/submissions/{id}/files/{file_id}`
//!
//! - **Script workflow** (auth gate)
//!   - `POST /api/scripts`, `GET|DELETE /api/scripts/{id}`
//!   - `POST /api/scripts/{id}/generate`, `PUT /api/scripts/{id}/script`
//!   - `POST /api/scripts/{id}/final`, `/back`, `/new`
//!
//! Denied requests are redirected to `/login`.

use crate::{
    handlers::{
        auth_handlers::{login, logout},
        health_handlers::{healthz, readyz},
        page_handlers::{PAGE_ROUTES, login_page, not_found, page_route, shared_document},
        script_handlers::{
            back_to_editor, create_workflow, delete_workflow, generate, get_workflow, new_script,
            save_script, view_final,
        },
        upload_handlers::{
            add_files, close_session, create_session, dismiss_error, download_submitted_file,
            get_session, get_submission, list_submissions, preview_file, remove_file, submit,
            update_metadata, update_submission,
        },
    },
    middleware::auth::require_auth,
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post, put},
};

/// Build the full router with state applied.
///
/// `max_upload_bytes` bounds request bodies, which is what limits batch size
/// on the wire.
pub fn routes(state: AppState, max_upload_bytes: usize) -> Router {
    let mut pages = Router::new().route("/shared-docs/{document_id}", get(shared_document));
    for (path, page) in PAGE_ROUTES {
        pages = pages.route(path, page_route(page, path));
    }

    let protected = pages
        .merge(api_routes())
        .route("/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/login", get(login_page).post(login))
        .merge(protected)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/uploads", post(create_session))
        .route(
            "/api/uploads/{session_id}",
            get(get_session).delete(close_session),
        )
        .route("/api/uploads/{session_id}/files", post(add_files))
        .route(
            "/api/uploads/{session_id}/files/{file_id}",
            delete(remove_file),
        )
        .route(
            "/api/uploads/{session_id}/files/{file_id}/preview",
            get(preview_file),
        )
        .route(
            "/api/uploads/{session_id}/files/{file_id}/metadata",
            patch(update_metadata),
        )
        .route(
            "/api/uploads/{session_id}/submission",
            patch(update_submission),
        )
        .route("/api/uploads/{session_id}/error", delete(dismiss_error))
        .route("/api/uploads/{session_id}/submit", post(submit))
        .route("/api/submissions", get(list_submissions))
        .route("/api/submissions/{submission_id}", get(get_submission))
        .route(
            "/api/submissions/{submission_id}/files/{file_id}",
            get(download_submitted_file),
        )
        .route("/api/scripts", post(create_workflow))
        .route(
            "/api/scripts/{id}",
            get(get_workflow).delete(delete_workflow),
        )
        .route("/api/scripts/{id}/generate", post(generate))
        .route("/api/scripts/{id}/script", put(save_script))
        .route("/api/scripts/{id}/final", post(view_final))
        .route("/api/scripts/{id}/back", post(back_to_editor))
        .route("/api/scripts/{id}/new", post(new_script))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        services::submission_store::tests::memory_pool,
    };
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
        response::Response,
    };
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "content-ops-test-boundary";

    struct TestApp {
        router: Router,
        token: String,
        _dir: TempDir,
    }

    impl TestApp {
        async fn new(max_files: usize) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let cfg = AppConfig {
                storage_dir: dir.path().to_string_lossy().into_owned(),
                max_files,
                generation_delay_ms: 0,
                admin_username: "editor".into(),
                admin_password: "s3cret".into(),
                ..AppConfig::default()
            };
            let state = AppState::new(&cfg, memory_pool().await);
            let router = routes(state, cfg.max_upload_bytes);

            let mut app = Self {
                router,
                token: String::new(),
                _dir: dir,
            };
            let res = app
                .send(
                    Method::POST,
                    "/login",
                    Some(json!({"username": "editor", "password": "s3cret"})),
                    false,
                )
                .await;
            assert_eq!(res.status(), StatusCode::OK);
            app.token = body_json(res).await["token"].as_str().unwrap().to_string();
            app
        }

        async fn call(&self, request: Request<Body>) -> Response {
            self.router.clone().oneshot(request).await.unwrap()
        }

        async fn send(&self, method: Method, uri: &str, body: Option<Value>, auth: bool) -> Response {
            let mut builder = Request::builder().method(method).uri(uri);
            if auth {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token));
            }
            let request = match body {
                Some(json) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json.to_string())),
                None => builder.body(Body::empty()),
            };
            self.call(request.unwrap()).await
        }

        async fn upload(&self, session: &str, names: &[&str]) -> Response {
            let mut body = String::new();
            for name in names {
                body.push_str(&format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: video/mp4\r\n\r\nbytes-of-{name}\r\n"
                ));
            }
            body.push_str(&format!("--{BOUNDARY}--\r\n"));

            let request = Request::builder()
                .method(Method::POST)
                .uri(format!("/api/uploads/{session}/files"))
                .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap();
            self.call(request).await
        }

        async fn open_session(&self) -> String {
            let res = self.send(Method::POST, "/api/uploads", None, true).await;
            assert_eq!(res.status(), StatusCode::CREATED);
            body_json(res).await["id"].as_str().unwrap().to_string()
        }
    }

    async fn body_json(res: Response) -> Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn protected_paths_redirect_to_login() {
        let app = TestApp::new(5).await;
        for path in ["/", "/calendar", "/shared-docs/abc", "/api/uploads"] {
            let res = app.send(Method::GET, path, None, false).await;
            assert_eq!(res.status(), StatusCode::SEE_OTHER, "{path}");
            assert_eq!(res.headers()[header::LOCATION], "/login");
        }

        let res = app.send(Method::GET, "/login", None, false).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["page"], "login");
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthorized() {
        let app = TestApp::new(5).await;
        let res = app
            .send(
                Method::POST,
                "/login",
                Some(json!({"username": "editor", "password": "wrong"})),
                false,
            )
            .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_revokes_token() {
        let app = TestApp::new(5).await;
        let res = app.send(Method::POST, "/logout", None, true).await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        let res = app.send(Method::GET, "/dashboard", None, true).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn pages_render_and_unknown_paths_are_not_found() {
        let app = TestApp::new(5).await;

        let res = app.send(Method::GET, "/ad-tracking", None, true).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["page"], "ad_tracking");

        let res = app.send(Method::GET, "/shared-docs/doc-42", None, true).await;
        let body = body_json(res).await;
        assert_eq!(body["page"], "shared_document");
        assert_eq!(body["params"]["document_id"], "doc-42");

        let res = app.send(Method::GET, "/nowhere", None, false).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(res).await["page"], "not_found");
    }

    #[tokio::test]
    async fn upload_batch_limit_over_http() {
        let app = TestApp::new(2).await;
        let session = app.open_session().await;

        let res = app.upload(&session, &["a.mp4"]).await;
        assert_eq!(res.status(), StatusCode::OK);
        let res = app.upload(&session, &["b.mp4"]).await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = app.upload(&session, &["c.mp4"]).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let view = body_json(
            app.send(Method::GET, &format!("/api/uploads/{session}"), None, true)
                .await,
        )
        .await;
        assert_eq!(view["files"].as_array().unwrap().len(), 2);
        assert_eq!(view["metadata"].as_object().unwrap().len(), 2);
        assert_eq!(view["error"], "You can upload a maximum of 2 files");

        let view = body_json(
            app.send(Method::DELETE, &format!("/api/uploads/{session}/error"), None, true)
                .await,
        )
        .await;
        assert!(view["error"].is_null());
    }

    #[tokio::test]
    async fn oversized_batch_is_refused_whole() {
        let app = TestApp::new(2).await;
        let session = app.open_session().await;

        let res = app.upload(&session, &["a.mp4", "b.mp4", "c.mp4"]).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(res).await["error"],
            "You can upload a maximum of 2 files"
        );

        let view = body_json(
            app.send(Method::GET, &format!("/api/uploads/{session}"), None, true)
                .await,
        )
        .await;
        assert!(view["files"].as_array().unwrap().is_empty());
        assert_eq!(view["error"], "You can upload a maximum of 2 files");
    }

    #[tokio::test]
    async fn preview_is_revoked_on_removal() {
        let app = TestApp::new(3).await;
        let session = app.open_session().await;
        let files = body_json(app.upload(&session, &["a.mp4"]).await).await;
        let file_id = files[0]["id"].as_str().unwrap().to_string();
        let preview = files[0]["preview_url"].as_str().unwrap().to_string();

        let res = app.send(Method::GET, &preview, None, true).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "video/mp4");
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"bytes-of-a.mp4");

        let res = app
            .send(
                Method::DELETE,
                &format!("/api/uploads/{session}/files/{file_id}"),
                None,
                true,
            )
            .await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);

        let res = app.send(Method::GET, &preview, None, true).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn submit_validates_then_records() {
        let app = TestApp::new(3).await;
        let session = app.open_session().await;
        let files = body_json(app.upload(&session, &["a.mp4", "b.mp4"]).await).await;
        let first = files[0]["id"].as_str().unwrap().to_string();

        let res = app
            .send(
                Method::PATCH,
                &format!("/api/uploads/{session}/files/{first}/metadata"),
                Some(json!({"title": "Cut A"})),
                true,
            )
            .await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = app
            .send(
                Method::PATCH,
                &format!("/api/uploads/{session}/submission"),
                Some(json!({"description": "Launch week", "target_date": "2026-11-02"})),
                true,
            )
            .await;
        assert_eq!(res.status(), StatusCode::OK);

        let submit_uri = format!("/api/uploads/{session}/submit");
        let res = app.send(Method::POST, &submit_uri, None, true).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(res).await["error"].as_str().unwrap().contains("title"));

        let history = body_json(app.send(Method::GET, "/api/submissions", None, true).await).await;
        assert!(history.as_array().unwrap().is_empty());

        app.send(
            Method::PATCH,
            &format!("/api/uploads/{session}/submission"),
            Some(json!({"title": "Launch", "video_type": "Testimonial"})),
            true,
        )
        .await;
        let res = app.send(Method::POST, &submit_uri, None, true).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let receipt = body_json(res).await;
        assert_eq!(receipt["file_count"], 2);
        let submission_id = receipt["submission_id"].as_str().unwrap().to_string();

        let detail = body_json(
            app.send(Method::GET, &format!("/api/submissions/{submission_id}"), None, true)
                .await,
        )
        .await;
        assert_eq!(detail["submission"]["video_type"], "Testimonial");
        assert_eq!(detail["submission"]["target_date"], "2026-11-02");
        assert_eq!(detail["files"][0]["title"], "Cut A");

        let res = app
            .send(
                Method::GET,
                &format!("/api/submissions/{submission_id}/files/{first}"),
                None,
                true,
            )
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"bytes-of-a.mp4");
    }

    #[tokio::test]
    async fn unknown_video_type_is_bad_request() {
        let app = TestApp::new(3).await;
        let session = app.open_session().await;
        let res = app
            .send(
                Method::PATCH,
                &format!("/api/uploads/{session}/submission"),
                Some(json!({"video_type": "Bloopers"})),
                true,
            )
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn script_workflow_over_http() {
        let app = TestApp::new(3).await;
        let res = app.send(Method::POST, "/api/scripts", None, true).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let created = body_json(res).await;
        assert_eq!(created["state"], "input");
        let id = created["id"].as_str().unwrap().to_string();

        let res = app
            .send(
                Method::POST,
                &format!("/api/scripts/{id}/final"),
                None,
                true,
            )
            .await;
        assert_eq!(res.status(), StatusCode::CONFLICT);

        let res = app
            .send(
                Method::POST,
                &format!("/api/scripts/{id}/generate"),
                Some(json!({"topic": "", "duration_seconds": 30})),
                true,
            )
            .await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let view = body_json(app.send(Method::GET, &format!("/api/scripts/{id}"), None, true).await).await;
        assert_eq!(view["state"], "input");
        assert_eq!(view["notifications"][0]["kind"], "error");

        let res = app
            .send(
                Method::POST,
                &format!("/api/scripts/{id}/generate"),
                Some(json!({"topic": "Client wins", "duration_seconds": 30, "key_points": ["Show the result"]})),
                true,
            )
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let mut script = body_json(res).await;
        script["title"] = json!("Edited title");

        let view = body_json(
            app.send(Method::PUT, &format!("/api/scripts/{id}/script"), Some(script), true)
                .await,
        )
        .await;
        assert_eq!(view["state"], "editing");
        assert_eq!(view["script"]["title"], "Edited title");

        let view = body_json(app.send(Method::POST, &format!("/api/scripts/{id}/final"), None, true).await).await;
        assert_eq!(view["state"], "final");
        let view = body_json(app.send(Method::POST, &format!("/api/scripts/{id}/back"), None, true).await).await;
        assert_eq!(view["state"], "editing");
        let view = body_json(app.send(Method::POST, &format!("/api/scripts/{id}/new"), None, true).await).await;
        assert_eq!(view["state"], "input");
        assert!(view["script"].is_null());
    }
}
