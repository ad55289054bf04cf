mod common;

use std::io::Write;

use http::Method;
use waymark::{handler, RequestContext, RequestId, RouterBuilder, RouterConfig};

use common::output::echo;
use common::requests::{body, body_for, ctx};

fn path_echo_router(config: RouterConfig) -> waymark::Router {
    let mut builder = RouterBuilder::new().with_config(config);
    builder
        .all("(.*)", handler(|call| {
            echo(format!("{} /{}", call.request().method, call.param(0).unwrap_or_default()));
            Ok(())
        }))
        .unwrap();
    builder.build()
}

#[test]
fn test_trailing_slash_and_query_are_ignored() {
    let router = path_echo_router(RouterConfig::default());
    assert_eq!(body(&router, "GET", "/about/"), "GET /about");
    assert_eq!(body(&router, "GET", "/about?x=1&y=2"), "GET /about");
    assert_eq!(body(&router, "GET", ""), "GET /");
}

#[test]
fn test_override_applies_only_to_post() {
    let router = path_echo_router(RouterConfig::default());

    let get = ctx("GET", "/r").with_header("X-HTTP-Method-Override", "DELETE");
    assert_eq!(body_for(&router, &get).0, "GET /r");

    let to_get = ctx("POST", "/r").with_header("X-HTTP-Method-Override", "GET");
    assert_eq!(body_for(&router, &to_get).0, "POST /r");

    let to_patch = ctx("POST", "/r").with_header("x-http-method-override", "Patch");
    assert_eq!(body_for(&router, &to_patch).0, "PATCH /r");
}

#[test]
fn test_custom_override_header_from_toml_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "method_override_header = \"X-Tunnel-Method\"").unwrap();
    writeln!(file, "base_path = \"/app/\"").unwrap();
    let config = RouterConfig::load(file.path()).unwrap();
    let router = path_echo_router(config);

    let tunnelled = ctx("POST", "/app/items").with_header("X-Tunnel-Method", "PUT");
    assert_eq!(body_for(&router, &tunnelled).0, "PUT /items");

    let default_header = ctx("POST", "/app/items").with_header("X-HTTP-Method-Override", "PUT");
    assert_eq!(body_for(&router, &default_header).0, "POST /items");
}

#[test]
fn test_explicit_base_path_only_strips_whole_segments() {
    let router = path_echo_router(RouterConfig::default().with_base_path("/app"));
    assert_eq!(body(&router, "GET", "/app/users"), "GET /users");
    assert_eq!(body(&router, "GET", "/app"), "GET /");
    assert_eq!(body(&router, "GET", "/application"), "GET /application");
}

#[test]
fn test_request_outside_detected_base_path_is_matched_unchanged() {
    let router = path_echo_router(RouterConfig::default());
    let request = ctx("GET", "/elsewhere/page").with_script_name("/blog/index.php");
    assert_eq!(body_for(&router, &request).0, "GET /elsewhere/page");
}

#[test]
fn test_missing_script_name_means_root_base() {
    let router = path_echo_router(RouterConfig::default());
    let request = RequestContext::new(Method::GET, "/sub/folder/about");
    assert_eq!(body_for(&router, &request).0, "GET /sub/folder/about");
}

#[test]
fn test_decoding_can_be_disabled() {
    let config = RouterConfig {
        decode_path: false,
        ..RouterConfig::default()
    };
    let router = path_echo_router(config);
    assert_eq!(body(&router, "GET", "/a%20b"), "GET /a%20b");

    let decoding = path_echo_router(RouterConfig::default());
    assert_eq!(body(&decoding, "GET", "/a%20b"), "GET /a b");
}

#[test]
fn test_head_is_matched_as_get_and_reported() {
    let router = path_echo_router(RouterConfig::default());
    let (output, report) = body_for(&router, &ctx("HEAD", "/page"));
    assert_eq!(output, "");
    assert_eq!(report.method, Method::GET);
    assert!(report.suppress_body);
    assert_eq!(report.path, "/page");
}

#[test]
fn test_request_id_header_is_reused() {
    let router = path_echo_router(RouterConfig::default());
    let id = RequestId::new();
    let request = ctx("GET", "/").with_header("X-Request-Id", &id.to_string());
    let (_, report) = body_for(&router, &request);
    assert_eq!(report.request_id, id);

    let (_, fresh) = body_for(&router, &ctx("GET", "/"));
    assert_ne!(fresh.request_id, id);
}

#[test]
fn test_invalid_request_method_is_rejected() {
    assert!(matches!(
        RequestContext::parse("GE T", "/"),
        Err(waymark::RouterError::InvalidMethod(_))
    ));
}
