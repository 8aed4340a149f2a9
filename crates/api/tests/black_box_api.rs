use std::net::SocketAddr;

use chrono::{Duration as ChronoDuration, Utc};
use jarvis_auth::{JwtClaims, Role};
use jarvis_core::{TenantId, UserId};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use jarvis_api::ApiConfig;

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory backend, ephemeral port.
        let app = jarvis_api::app::build_app(&ApiConfig::in_memory(JWT_SECRET))
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn register(&self, company: &str, email: &str) -> Account {
        let res = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "name": "Owner",
                "email": email,
                "password": "secret123",
                "company_name": company,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        Account {
            token: body["token"].as_str().unwrap().to_string(),
            user_id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
            tenant_id: body["tenant"]["id"].as_str().unwrap().parse().unwrap(),
            subdomain: body["tenant"]["subdomain"].as_str().unwrap().to_string(),
        }
    }

    async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap()
    }

    async fn create_client(&self, token: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/clients"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn get(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct Account {
    token: String,
    user_id: UserId,
    tenant_id: TenantId,
    subdomain: String,
}

fn mint_jwt(secret: &str, sub: UserId, tenant_id: TenantId, issued_at: chrono::DateTime<Utc>, ttl: ChronoDuration) -> String {
    let claims = JwtClaims {
        sub,
        tenant_id,
        role: Role::ADMIN,
        issued_at,
        expires_at: issued_at + ttl,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[tokio::test]
async fn health_and_unknown_routes_are_public() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv.client.get(srv.url("/nope")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    for path in ["/api/auth/me", "/api/clients", "/api/activities", "/api/users"] {
        let res = srv.client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "unauthenticated");
    }

    let res = srv.get("not-a-jwt", "/api/clients").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_and_me_round_trip() {
    let srv = TestServer::spawn().await;
    let acct = srv.register("Acme Seguros", "ana@acme.io").await;
    assert!(acct.subdomain.starts_with("acme-seguros-"));

    let res = srv.login("ana@acme.io", "wrong-password").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let res = srv.login("nobody@acme.io", "secret123").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv.login("ANA@acme.io", "secret123").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();
    assert!(body["user"].get("password_hash").is_none());

    let res = srv.get(&token, "/api/auth/me").await;
    assert_eq!(res.status(), StatusCode::OK);
    let me: Value = res.json().await.unwrap();
    assert_eq!(me["user"]["email"], "ana@acme.io");
    assert_eq!(me["tenant"]["id"], acct.tenant_id.to_string());
}

#[tokio::test]
async fn tenant_isolation_hides_other_tenants_rows() {
    let srv = TestServer::spawn().await;
    let a = srv.register("Acme", "a@acme.io").await;
    let b = srv.register("Globex", "b@globex.io").await;

    let res = srv
        .create_client(&a.token, json!({ "type": "PF", "name": "Maria", "document": "123" }))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_str().unwrap();

    let res = srv.get(&b.token, &format!("/api/clients/{id}")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv
        .client
        .put(srv.url(&format!("/api/clients/{id}")))
        .bearer_auth(&b.token)
        .json(&json!({ "name": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv.get(&b.token, "/api/clients").await;
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["total"], 0);

    let res = srv.get(&a.token, &format!("/api/clients/{id}")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let row: Value = res.json().await.unwrap();
    assert_eq!(row["name"], "Maria");
}

#[tokio::test]
async fn tenant_in_the_body_is_ignored() {
    let srv = TestServer::spawn().await;
    let a = srv.register("Acme", "a@acme.io").await;
    let b = srv.register("Globex", "b@globex.io").await;

    let res = srv
        .create_client(
            &a.token,
            json!({ "type": "PJ", "name": "Sneaky", "document": "42", "tenant_id": b.tenant_id }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["tenant_id"], a.tenant_id.to_string());

    let page: Value = srv.get(&b.token, "/api/clients").await.json().await.unwrap();
    assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn admin_only_routes_reject_plain_users() {
    let srv = TestServer::spawn().await;
    let admin = srv.register("Acme", "a@acme.io").await;

    let res = srv
        .client
        .post(srv.url("/api/users"))
        .bearer_auth(&admin.token)
        .json(&json!({ "name": "Bea", "email": "bea@acme.io", "password": "secret123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let body: Value = srv.login("bea@acme.io", "secret123").await.json().await.unwrap();
    let user_token = body["token"].as_str().unwrap().to_string();

    let res = srv.get(&user_token, "/api/users").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = srv.get(&admin.token, "/api/users").await;
    assert_eq!(res.status(), StatusCode::OK);

    let new_product = json!({ "name": "Pet", "category": "pet", "commission_rate": 9.5 });
    let res = srv
        .client
        .post(srv.url("/api/products"))
        .bearer_auth(&user_token)
        .json(&new_product)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = srv
        .client
        .post(srv.url("/api/products"))
        .bearer_auth(&admin.token)
        .json(&new_product)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // the role gate runs before the body is read
    let res = srv
        .client
        .post(srv.url("/api/products"))
        .bearer_auth(&user_token)
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = srv
        .client
        .put(srv.url(&format!("/api/users/{}/role", admin.user_id)))
        .bearer_auth(&user_token)
        .json(&json!({ "role": 42 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // reads stay open to every role
    let res = srv.get(&user_token, "/api/products").await;
    assert_eq!(res.status(), StatusCode::OK);
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["total"], 9);
}

#[tokio::test]
async fn deleted_client_keeps_its_audit_history() {
    let srv = TestServer::spawn().await;
    let acct = srv.register("Acme", "a@acme.io").await;

    let created: Value = srv
        .create_client(&acct.token, json!({ "type": "PF", "name": "Maria", "document": "123" }))
        .await
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap();

    let res = srv
        .client
        .delete(srv.url(&format!("/api/clients/{id}")))
        .bearer_auth(&acct.token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["client"]["document"], "123");

    assert_eq!(
        srv.get(&acct.token, &format!("/api/clients/{id}")).await.status(),
        StatusCode::NOT_FOUND
    );

    let history: Value = srv
        .get(&acct.token, &format!("/api/activities/client/{id}"))
        .await
        .json()
        .await
        .unwrap();
    let actions: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["deleted", "created"]);
    assert_eq!(history[0]["user_id"], acct.user_id.to_string());
}

#[tokio::test]
async fn bulk_import_reports_each_failure() {
    let srv = TestServer::spawn().await;
    let acct = srv.register("Acme", "a@acme.io").await;

    let res = srv
        .client
        .post(srv.url("/api/clients/import/bulk"))
        .bearer_auth(&acct.token)
        .json(&json!({
            "clients": [
                { "type": "PF", "name": "One", "document": "1" },
                { "type": "PF", "name": "Two", "document": "2" },
                { "type": "PF", "name": "Again", "document": "1" },
                { "type": "PJ", "name": "Four", "document": "4" },
                { "type": "PJ", "name": "Five", "document": "5" }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let report: Value = res.json().await.unwrap();
    assert_eq!(report["success"], 4);
    assert_eq!(report["failed"], 1);
    assert_eq!(report["errors"][0]["index"], 2);
    assert_eq!(report["errors"][0]["error"], "a record with this value already exists");

    let res = srv
        .client
        .post(srv.url("/api/clients/import/bulk"))
        .bearer_auth(&acct.token)
        .json(&json!({ "clients": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_ordering_ignores_unlisted_columns() {
    let srv = TestServer::spawn().await;
    let acct = srv.register("Acme", "a@acme.io").await;
    for (name, doc) in [("Carla", "3"), ("Ana", "1"), ("Bruno", "2")] {
        srv.create_client(&acct.token, json!({ "type": "PF", "name": name, "document": doc }))
            .await;
    }

    let by_name: Value = srv
        .get(&acct.token, "/api/clients?order_by=name&order=asc")
        .await
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = by_name["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ana", "Bruno", "Carla"]);

    let hostile: Value = srv
        .get(&acct.token, "/api/clients?order_by=name%3B%20DROP%20TABLE%20clients&limit=2&offset=1")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(hostile["total"], 3);
    assert_eq!(hostile["limit"], 2);
    assert_eq!(hostile["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn expired_and_forged_tokens_are_rejected() {
    let srv = TestServer::spawn().await;
    let acct = srv.register("Acme", "a@acme.io").await;

    let fresh = mint_jwt(JWT_SECRET, acct.user_id, acct.tenant_id, Utc::now(), ChronoDuration::minutes(5));
    assert_eq!(srv.get(&fresh, "/api/clients").await.status(), StatusCode::OK);

    let expired = mint_jwt(
        JWT_SECRET,
        acct.user_id,
        acct.tenant_id,
        Utc::now() - ChronoDuration::hours(2),
        ChronoDuration::hours(1),
    );
    assert_eq!(srv.get(&expired, "/api/clients").await.status(), StatusCode::UNAUTHORIZED);

    let forged = mint_jwt("other-secret", acct.user_id, acct.tenant_id, Utc::now(), ChronoDuration::minutes(5));
    assert_eq!(srv.get(&forged, "/api/clients").await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn followup_agenda_and_completion() {
    let srv = TestServer::spawn().await;
    let acct = srv.register("Acme", "a@acme.io").await;
    let client: Value = srv
        .create_client(&acct.token, json!({ "type": "PF", "name": "Maria", "document": "123" }))
        .await
        .json()
        .await
        .unwrap();

    let res = srv
        .client
        .post(srv.url("/api/followups"))
        .bearer_auth(&acct.token)
        .json(&json!({
            "client_id": client["id"],
            "type": "call",
            "title": "Renewal call",
            "due_date": Utc::now() - ChronoDuration::hours(1),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let followup: Value = res.json().await.unwrap();
    let id = followup["id"].as_str().unwrap();

    let overdue: Value = srv.get(&acct.token, "/api/followups/overdue").await.json().await.unwrap();
    assert_eq!(overdue["total"], 1);

    let past_end: Value = srv
        .get(&acct.token, "/api/followups/overdue?limit=1&offset=1")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(past_end["total"], 1);
    assert_eq!(past_end["offset"], 1);
    assert_eq!(past_end["data"].as_array().unwrap().len(), 0);

    let res = srv
        .client
        .post(srv.url(&format!("/api/followups/{id}/complete")))
        .bearer_auth(&acct.token)
        .json(&json!({ "result": "renewed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let done: Value = res.json().await.unwrap();
    assert_eq!(done["status"], "completed");
    assert_eq!(done["result"], "renewed");

    let overdue: Value = srv.get(&acct.token, "/api/followups/overdue").await.json().await.unwrap();
    assert_eq!(overdue["total"], 0);
}
