//! End-to-end tests over a live server.

mod common;

use canopy::{
    handler, middleware_fn, provider, BootError, HandlerError, HandlerOutcome, LogLevel,
    MiddlewareOutcome, Node, RateLimitSpec, RouteModule, StaticModules,
};
use serde_json::{json, Value};

use common::{spawn, spawn_server};

fn health_handler() -> canopy::node::HandlerFn {
    handler(|_ctx| async { Ok(HandlerOutcome::Json(json!({"status": "ok"}))) })
}

#[tokio::test]
async fn test_health_route_from_tree() {
    let tree = Node::server(vec![Node::get("/health", health_handler())]);
    let (addr, shutdown) = spawn(tree).await;

    let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.json::<Value>().await.unwrap(), json!({"status": "ok"}));

    shutdown.trigger();
}

#[tokio::test]
async fn test_directory_config_guards_admin_routes_only() {
    let require_admin = middleware_fn(|ctx| async move {
        if ctx.headers.contains_key("x-admin") {
            Ok(MiddlewareOutcome::Continue)
        } else {
            Ok(MiddlewareOutcome::HaltWithError {
                status: 403,
                message: "admin only".to_string(),
            })
        }
    });

    let source = StaticModules::new()
        .route("routes/health", RouteModule::new().get(health_handler()))
        .config(
            "routes/admin",
            Node::fragment(vec![
                Node::logger(LogLevel::Debug, vec![]),
                Node::middleware(require_admin, vec![]),
            ]),
        )
        .route(
            "routes/admin/dashboard",
            RouteModule::new().get(handler(|_ctx| async {
                Ok(HandlerOutcome::Json(json!({"admin": true})))
            })),
        );

    let tree = Node::server(vec![Node::routes("routes")]);
    let (addr, shutdown) = spawn_server(tree, source).await.unwrap();
    let client = reqwest::Client::new();

    // the guard only covers the admin directory
    let health = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(health.status(), 200);

    let denied = client
        .get(format!("http://{addr}/admin/dashboard"))
        .send()
        .await
        .unwrap();
    assert_eq!(denied.status(), 403);
    assert_eq!(
        denied.json::<Value>().await.unwrap(),
        json!({"error": "admin only"})
    );

    let allowed = client
        .get(format!("http://{addr}/admin/dashboard"))
        .header("x-admin", "yes")
        .send()
        .await
        .unwrap();
    assert_eq!(allowed.status(), 200);
    assert_eq!(allowed.json::<Value>().await.unwrap(), json!({"admin": true}));

    shutdown.trigger();
}

#[tokio::test]
async fn test_bracket_segment_binds_path_param() {
    let source = StaticModules::new().route(
        "routes/posts/[id]",
        RouteModule::new().get(handler(|ctx| async move {
            Ok(HandlerOutcome::Json(json!({"id": ctx.param("id")})))
        })),
    );

    let tree = Node::server(vec![Node::routes("routes")]);
    let (addr, shutdown) = spawn_server(tree, source).await.unwrap();

    let response = reqwest::get(format!("http://{addr}/posts/42"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.json::<Value>().await.unwrap(), json!({"id": "42"}));

    shutdown.trigger();
}

#[tokio::test]
async fn test_augment_then_halt_never_reaches_handler() {
    let attach_user = middleware_fn(|_ctx| async {
        Ok(MiddlewareOutcome::augment(json!({"user": {"id": 7}})))
    });
    let reject = middleware_fn(|ctx| async move {
        // runs after the augment; the merged field must be visible
        assert!(ctx.extras.contains_key("user"));
        Ok(MiddlewareOutcome::HaltWithError {
            status: 403,
            message: "nope".to_string(),
        })
    });

    let tree = Node::server(vec![Node::middleware(
        attach_user,
        vec![Node::middleware(
            reject,
            vec![Node::get(
                "/secret",
                handler(|_ctx| async {
                    Err::<HandlerOutcome, _>(HandlerError::new("handler must not run"))
                }),
            )],
        )],
    )]);
    let (addr, shutdown) = spawn(tree).await;

    let response = reqwest::get(format!("http://{addr}/secret")).await.unwrap();
    assert_eq!(response.status(), 403);
    assert_eq!(response.json::<Value>().await.unwrap(), json!({"error": "nope"}));

    shutdown.trigger();
}

#[tokio::test]
async fn test_rejected_provider_aborts_boot() {
    let failing = provider(|| async {
        Err::<canopy::node::ServiceHandle, _>("connection refused".into())
    });
    let tree = Node::server(vec![Node::db(failing, vec![Node::get("/never", health_handler())])]);

    let err = spawn_server(tree, StaticModules::new()).await.unwrap_err();
    assert!(matches!(err, BootError::Service(_)));
}

#[tokio::test]
async fn test_rate_limit_scopes_to_its_subtree() {
    let spec = RateLimitSpec {
        max: 2,
        window_secs: 3600,
    };
    let tree = Node::server(vec![
        Node::rate_limiter(spec, vec![Node::get("/limited", health_handler())]),
        Node::get("/open", health_handler()),
    ]);
    let (addr, shutdown) = spawn(tree).await;
    let client = reqwest::Client::new();

    for _ in 0..2 {
        let ok = client
            .get(format!("http://{addr}/limited"))
            .send()
            .await
            .unwrap();
        assert_eq!(ok.status(), 200);
    }
    let rejected = client
        .get(format!("http://{addr}/limited"))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), 429);

    // sibling route shares no bucket
    for _ in 0..5 {
        let ok = client.get(format!("http://{addr}/open")).send().await.unwrap();
        assert_eq!(ok.status(), 200);
    }

    shutdown.trigger();
}

#[tokio::test]
async fn test_handler_descriptor_tree_renders_full_response() {
    let tree = Node::server(vec![Node::post(
        "/items",
        handler(|ctx| async move {
            Ok(HandlerOutcome::Render(Node::response(vec![
                Node::status(201),
                Node::body(json!({"echo": ctx.body})),
                Node::headers(
                    [("x-made-by".to_string(), "canopy".to_string())]
                        .into_iter()
                        .collect(),
                ),
            ])))
        }),
    )]);
    let (addr, shutdown) = spawn(tree).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/items"))
        .json(&json!({"name": "widget"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    assert_eq!(
        response.headers().get("x-made-by").unwrap().to_str().unwrap(),
        "canopy"
    );
    assert_eq!(
        response.json::<Value>().await.unwrap(),
        json!({"echo": {"name": "widget"}})
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_group_prefix_applies_to_directory_routes() {
    let source = StaticModules::new().route(
        "routes/users/index",
        RouteModule::new().get(handler(|_ctx| async {
            Ok(HandlerOutcome::Json(json!(["alice", "bob"])))
        })),
    );

    let tree = Node::server(vec![Node::group("/api", vec![Node::routes("routes")])]);
    let (addr, shutdown) = spawn_server(tree, source).await.unwrap();

    let response = reqwest::get(format!("http://{addr}/api/users")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.json::<Value>().await.unwrap(),
        json!(["alice", "bob"])
    );

    shutdown.trigger();
}
