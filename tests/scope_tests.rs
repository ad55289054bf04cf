mod common;

use http::Method;
use waymark::{handler, Call, DomainPattern, HandlerResult, Outcome, RouteKind, RouterBuilder};

use common::output::echo;
use common::requests::{body, body_for, ctx};

fn say(text: &'static str) -> waymark::HandlerRef {
    handler(move |_call| {
        echo(text);
        Ok(())
    })
}

#[derive(Default)]
struct Dashboard;

impl Dashboard {
    fn index(&self, _call: &Call) -> HandlerResult {
        echo("dashboard");
        Ok(())
    }
}

#[test]
fn test_nested_mounts_compose_prefixes() {
    let mut builder = RouterBuilder::new();
    builder
        .mount("/movies", |movies| {
            movies.get("/", say("movies"))?;
            movies.mount(r"/(\d+)", |movie| {
                movie.get("/", handler(|call| {
                    echo(format!("movie {}", call.param(0).unwrap_or_default()));
                    Ok(())
                }))?;
                movie.get("/photos", handler(|call| {
                    echo(format!("photos of {}", call.param(0).unwrap_or_default()));
                    Ok(())
                }))?;
                Ok(())
            })?;
            movies.get("/latest", say("latest"))?;
            Ok(())
        })
        .unwrap();
    builder.get("/", say("home")).unwrap();
    let router = builder.build();

    assert_eq!(body(&router, "GET", "/movies"), "movies");
    assert_eq!(body(&router, "GET", "/movies/7"), "movie 7");
    assert_eq!(body(&router, "GET", "/movies/7/photos"), "photos of 7");
    assert_eq!(body(&router, "GET", "/movies/latest"), "latest");
    assert_eq!(body(&router, "GET", "/"), "home");
}

#[test]
fn test_group_keeps_enclosing_scope() {
    let mut builder = RouterBuilder::new();
    builder
        .mount("/api", |api| {
            api.group(|grouped| {
                grouped.get("/status", say("status"))?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
    let router = builder.build();

    assert_eq!(body(&router, "GET", "/api/status"), "status");
    assert_eq!(body_for(&router, &ctx("GET", "/status")).1.outcome, Outcome::NotFound);
}

#[test]
fn test_namespaces_nest_and_restore() {
    let mut builder = RouterBuilder::new();
    builder
        .controllers_mut()
        .register::<Dashboard>("App::Admin::Dashboard")
        .instance("index", Dashboard::index);
    builder.set_namespace("App");

    let mut root = builder.registrar();
    root.namespace("Admin")
        .get("/admin", "Dashboard@index")
        .unwrap();
    root.get("/plain", "Dashboard@index").unwrap();
    let router = builder.build();

    assert_eq!(body(&router, "GET", "/admin"), "dashboard");
    // Outside the nested block the namespace is `App` again.
    assert_eq!(body_for(&router, &ctx("GET", "/plain")).1.outcome, Outcome::NotFound);
}

#[test]
fn test_domain_scoped_routes() {
    let mut builder = RouterBuilder::new();
    builder.get("/", say("public home")).unwrap();
    builder
        .registrar()
        .domain("admin.example.com")
        .unwrap()
        .get("/", say("admin home"))
        .unwrap();
    builder
        .registrar()
        .domain("*.tenants.example.com")
        .unwrap()
        .get("/whoami", handler(|call| {
            echo(call.request().host.clone().unwrap_or_default());
            Ok(())
        }))
        .unwrap();
    let router = builder.build();

    let admin = ctx("GET", "/").with_host("admin.example.com");
    assert_eq!(body_for(&router, &admin).0, "admin home");

    let public = ctx("GET", "/").with_host("www.example.com");
    assert_eq!(body_for(&router, &public).0, "public home");
    assert_eq!(body(&router, "GET", "/"), "public home");

    let tenant = ctx("GET", "/whoami").with_header("Host", "Acme.Tenants.Example.com:8080");
    assert_eq!(body_for(&router, &tenant).0, "acme.tenants.example.com");

    let outsider = ctx("GET", "/whoami").with_host("example.org");
    assert_eq!(body_for(&router, &outsider).1.outcome, Outcome::NotFound);
}

#[test]
fn test_custom_domain_rule() {
    let mut builder = RouterBuilder::new();
    let internal = DomainPattern::custom("internal", |host| host.ends_with(".internal"));
    builder
        .registrar()
        .domain_pattern(internal)
        .get("/health", say("ok"))
        .unwrap();
    let router = builder.build();

    let inside = ctx("GET", "/health").with_host("svc-a.internal");
    assert_eq!(body_for(&router, &inside).0, "ok");
    let outside = ctx("GET", "/health").with_host("svc-a.example.com");
    assert_eq!(body_for(&router, &outside).1.outcome, Outcome::NotFound);
}

#[test]
fn test_scoped_not_found_inside_mount_uses_prefix() {
    let mut builder = RouterBuilder::new();
    builder.set_404(say("site 404"));
    builder
        .mount("/api", |api| {
            api.get("/users", say("users"))?;
            api.set_404_for("/(.*)", handler(|call| {
                echo(format!("api 404 {}", call.param(0).unwrap_or_default()));
                Ok(())
            }))?;
            Ok(())
        })
        .unwrap();
    let router = builder.build();

    assert_eq!(body(&router, "GET", "/api/users"), "users");
    assert_eq!(body(&router, "GET", "/api/nope"), "api 404 nope");
    assert_eq!(body(&router, "GET", "/api/v2/users"), "api 404 v2/users");
    assert_eq!(body(&router, "GET", "/api"), "site 404");
    assert_eq!(body(&router, "GET", "/web"), "site 404");
}

#[test]
fn test_domain_scoped_not_found() {
    let mut builder = RouterBuilder::new();
    builder.set_404(say("global 404"));
    builder
        .registrar()
        .domain("admin.example.com")
        .unwrap()
        .set_404(say("admin 404"));
    let router = builder.build();

    let admin = ctx("GET", "/missing").with_host("admin.example.com");
    assert_eq!(body_for(&router, &admin).0, "admin 404");
    assert_eq!(body(&router, "GET", "/missing"), "global 404");
}

#[test]
fn test_latest_universal_not_found_wins() {
    let mut builder = RouterBuilder::new();
    builder.set_404(say("first"));
    builder.set_404(say("second"));
    let router = builder.build();
    assert_eq!(body(&router, "GET", "/missing"), "second");
}

#[test]
fn test_routes_listing() {
    let mut builder = RouterBuilder::new();
    builder.before("GET", "/admin/.*", say("auth")).unwrap();
    builder.post("/users", "Users@create").unwrap();
    builder.get("/users", say("list")).unwrap();
    builder
        .registrar()
        .domain("api.example.com")
        .unwrap()
        .get("/v1", say("v1"))
        .unwrap();
    let router = builder.build();

    let routes = router.routes();
    let rows: Vec<(RouteKind, Method, Option<&str>, &str, &str)> = routes
        .iter()
        .map(|r| {
            (
                r.kind,
                r.method.clone(),
                r.domain.as_deref(),
                r.pattern.as_str(),
                r.handler.as_str(),
            )
        })
        .collect();

    assert_eq!(
        rows,
        vec![
            (RouteKind::Before, Method::GET, None, "/admin/.*", "<closure>"),
            (RouteKind::After, Method::GET, Some("api.example.com"), "/v1", "<closure>"),
            (RouteKind::After, Method::GET, None, "/users", "<closure>"),
            (RouteKind::After, Method::POST, None, "/users", "Users@create"),
        ]
    );
    router.dump_routes();
}

#[test]
fn test_invalid_registrations_are_rejected() {
    let mut builder = RouterBuilder::new();
    assert!(matches!(
        builder.get("/broken(", say("x")),
        Err(waymark::RouterError::InvalidPattern { .. })
    ));
    assert!(matches!(
        builder.match_methods("GET|NOT A METHOD", "/", say("x")),
        Err(waymark::RouterError::InvalidMethod(_))
    ));
    assert!(matches!(
        builder.registrar().domain("bad host/"),
        Err(waymark::RouterError::InvalidDomain(_))
    ));
    assert!(matches!(
        waymark::HandlerRef::controller("NoSeparator"),
        Err(waymark::RouterError::InvalidHandler(_))
    ));
}
