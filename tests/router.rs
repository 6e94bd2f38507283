use http::{header, Method, StatusCode};
use hyper::{Body, Request, Response};
use radixmux::{matched_route_path_param, method_wild, user_value, Router};

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

async fn noop(_: Request<Body>) -> Result<Response<Body>, hyper::Error> {
  Ok(Response::new(Body::empty()))
}

fn request(method: Method, uri: &str) -> Request<Body> {
  Request::builder()
    .method(method)
    .uri(uri)
    .body(Body::empty())
    .unwrap()
}

fn counter() -> Arc<AtomicUsize> {
  Arc::new(AtomicUsize::new(0))
}

// a handler that bumps the counter on every invocation
fn counting(
  hits: &Arc<AtomicUsize>,
) -> impl Fn(Request<Body>) -> futures::future::BoxFuture<'static, Result<Response<Body>, hyper::Error>>
{
  let hits = Arc::clone(hits);
  move |_req: Request<Body>| {
    let hits = Arc::clone(&hits);
    Box::pin(async move {
      hits.fetch_add(1, Ordering::SeqCst);
      Ok(Response::new(Body::empty()))
    })
  }
}

#[tokio::test]
async fn dispatch_captures_params() {
  let hits = counter();
  let mut router = Router::new();

  let routed = Arc::clone(&hits);
  router.handle(Method::GET, "/user/{name}", move |req: Request<Body>| {
    let routed = Arc::clone(&routed);
    async move {
      assert_eq!(user_value(&req, "name"), Some("gopher"));
      routed.fetch_add(1, Ordering::SeqCst);
      Ok(Response::new(Body::empty()))
    }
  });

  router
    .serve(request(Method::GET, "/user/gopher"))
    .await
    .unwrap();
  assert_eq!(hits.load(Ordering::SeqCst), 1, "routing failed");
}

#[tokio::test]
async fn api_shortcuts() {
  let hits = counter();
  let mut router = Router::new();

  router.get("/GET", counting(&hits));
  router.head("/HEAD", counting(&hits));
  router.post("/POST", counting(&hits));
  router.put("/PUT", counting(&hits));
  router.patch("/PATCH", counting(&hits));
  router.delete("/DELETE", counting(&hits));
  router.connect("/CONNECT", counting(&hits));
  router.options("/OPTIONS", counting(&hits));
  router.trace("/TRACE", counting(&hits));
  router.any("/ANY", counting(&hits));
  router.handle(Method::GET, "/Handler", counting(&hits));

  let requests = [
    (Method::GET, "/GET"),
    (Method::HEAD, "/HEAD"),
    (Method::POST, "/POST"),
    (Method::PUT, "/PUT"),
    (Method::PATCH, "/PATCH"),
    (Method::DELETE, "/DELETE"),
    (Method::CONNECT, "/CONNECT"),
    (Method::OPTIONS, "/OPTIONS"),
    (Method::TRACE, "/TRACE"),
    (Method::GET, "/Handler"),
  ];
  for (method, path) in requests {
    let before = hits.load(Ordering::SeqCst);
    router.serve(request(method.clone(), path)).await.unwrap();
    assert_eq!(
      hits.load(Ordering::SeqCst),
      before + 1,
      "routing {} {} failed",
      method,
      path
    );
  }

  // the wild route answers every method, custom ones included
  let methods = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::CONNECT,
    Method::OPTIONS,
    Method::TRACE,
    Method::from_bytes(b"CUSTOM").unwrap(),
  ];
  for method in methods {
    let before = hits.load(Ordering::SeqCst);
    router.serve(request(method.clone(), "/ANY")).await.unwrap();
    assert_eq!(
      hits.load(Ordering::SeqCst),
      before + 1,
      "routing ANY failed for method {}",
      method
    );
  }
}

#[test]
fn invalid_registration_panics() {
  let mut router = Router::new();

  assert!(
    catch_unwind(AssertUnwindSafe(|| router.get("", noop))).is_err(),
    "registering an empty path did not panic"
  );
  assert!(
    catch_unwind(AssertUnwindSafe(|| router.get("noSlashRoot", noop))).is_err(),
    "registering a path without leading '/' did not panic"
  );
  assert!(
    catch_unwind(AssertUnwindSafe(|| router.get("/users/{}", noop))).is_err(),
    "registering an empty parameter name did not panic"
  );
  assert!(
    catch_unwind(AssertUnwindSafe(|| router.get("/src/{filepath:*}/x", noop))).is_err(),
    "registering a non-terminal catch-all did not panic"
  );
}

#[tokio::test]
async fn regex_user_values() {
  let hits = counter();
  let mut router = Router::new();
  router.get("/metrics", noop);

  let routed = Arc::clone(&hits);
  let mut v4 = router.group("/v4");
  let mut id = v4.group("/{id:^[1-9]\\d*}");
  id.get("/click", move |req: Request<Body>| {
    let routed = Arc::clone(&routed);
    async move {
      assert_eq!(user_value(&req, "id"), Some("123"));
      routed.fetch_add(1, Ordering::SeqCst);
      Ok(Response::new(Body::empty()))
    }
  });

  router
    .serve(request(Method::GET, "/v4/123/click"))
    .await
    .unwrap();
  assert_eq!(hits.load(Ordering::SeqCst), 1);

  let response = router.serve(request(Method::GET, "/metrics")).await.unwrap();
  assert_eq!(response.status(), StatusCode::OK);

  // the regex rejects segments it does not fully match
  let response = router
    .serve(request(Method::GET, "/v4/0123/click"))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn chaining_through_not_found() {
  let hits = counter();

  let mut router2 = Router::new();
  router2.post("/bar", counting(&hits));
  let router2 = Arc::new(router2);

  let mut router1 = Router::new();
  router1.post("/foo", counting(&hits));
  let chained = Arc::clone(&router2);
  router1.not_found = Some(Arc::new(move |req: Request<Body>| {
    let chained = Arc::clone(&chained);
    async move { chained.serve(req).await }
  }));

  let response = router1.serve(request(Method::POST, "/foo")).await.unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(hits.load(Ordering::SeqCst), 1);

  let response = router1.serve(request(Method::POST, "/bar")).await.unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(hits.load(Ordering::SeqCst), 2);

  let response = router1.serve(request(Method::POST, "/qax")).await.unwrap();
  assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mutable_router() {
  let first = counter();
  let second = counter();

  let mut router = Router::new();
  router.get("/", counting(&first));

  assert!(
    catch_unwind(AssertUnwindSafe(|| router.get("/", noop))).is_err(),
    "duplicate registration did not panic"
  );

  router.mutable(true);
  router.get("/", counting(&second));

  router.serve(request(Method::GET, "/")).await.unwrap();
  assert_eq!(first.load(Ordering::SeqCst), 0, "stale handler invoked");
  assert_eq!(second.load(Ordering::SeqCst), 1, "handler was not replaced");
}

#[tokio::test]
async fn options_handling() {
  let mut router = Router::new();
  router.post("/path", noop);

  let allow = |response: &Response<Body>| {
    response
      .headers()
      .get(header::ALLOW)
      .map(|v| v.to_str().unwrap().to_string())
      .unwrap_or_default()
  };

  // server-wide
  let response = router.serve(request(Method::OPTIONS, "*")).await.unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(allow(&response), "OPTIONS, POST");

  // path
  let response = router.serve(request(Method::OPTIONS, "/path")).await.unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(allow(&response), "OPTIONS, POST");

  let response = router
    .serve(request(Method::OPTIONS, "/doesnotexist"))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::NOT_FOUND);

  // add another method and a global OPTIONS handler adjusting the status
  router.get("/path", noop);
  router.global_options = Some(Arc::new(|_: Request<Body>| async {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    Ok::<_, hyper::Error>(response)
  }));

  let response = router.serve(request(Method::OPTIONS, "*")).await.unwrap();
  assert_eq!(response.status(), StatusCode::NO_CONTENT);
  assert_eq!(allow(&response), "GET, OPTIONS, POST");

  let response = router.serve(request(Method::OPTIONS, "/path")).await.unwrap();
  assert_eq!(response.status(), StatusCode::NO_CONTENT);
  assert_eq!(allow(&response), "GET, OPTIONS, POST");

  // a registered OPTIONS handler takes priority on its path
  let custom = counter();
  router.options("/path", counting(&custom));

  let response = router.serve(request(Method::OPTIONS, "*")).await.unwrap();
  assert_eq!(response.status(), StatusCode::NO_CONTENT);
  assert_eq!(custom.load(Ordering::SeqCst), 0, "custom handler called on *");

  let response = router.serve(request(Method::OPTIONS, "/path")).await.unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(custom.load(Ordering::SeqCst), 1, "custom handler not called");
}

#[tokio::test]
async fn method_not_allowed() {
  let mut router = Router::new();
  router.post("/path", noop);

  let response = router.serve(request(Method::GET, "/path")).await.unwrap();
  assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
  assert_eq!(response.headers()[header::ALLOW], "OPTIONS, POST");

  // additional methods show up; OPTIONS is not duplicated
  router.delete("/path", noop);
  router.options("/path", noop);

  let response = router.serve(request(Method::GET, "/path")).await.unwrap();
  assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
  assert_eq!(response.headers()[header::ALLOW], "DELETE, OPTIONS, POST");

  // custom handler
  router.method_not_allowed = Some(Arc::new(|_: Request<Body>| async {
    let mut response = Response::new(Body::from("custom method"));
    *response.status_mut() = StatusCode::IM_A_TEAPOT;
    Ok::<_, hyper::Error>(response)
  }));

  let response = router
    .serve(request(Method::from_bytes(b"QUX").unwrap(), "/path"))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
  assert_eq!(response.headers()[header::ALLOW], "DELETE, OPTIONS, POST");
  let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
  assert_eq!(&body[..], b"custom method");
}

async fn check_redirect(router: &Router, method: Method, uri: &str, code: StatusCode, location: &str) {
  let response = router.serve(request(method.clone(), uri)).await.unwrap();
  assert_eq!(response.status(), code, "{} {}", method, uri);
  let got = response
    .headers()
    .get(header::LOCATION)
    .map(|v| v.to_str().unwrap())
    .unwrap_or("");
  assert_eq!(got, location, "{} {}", method, uri);
}

#[tokio::test]
async fn redirects() {
  for (method, code) in [
    (Method::GET, StatusCode::MOVED_PERMANENTLY),
    (Method::PATCH, StatusCode::PERMANENT_REDIRECT),
    (Method::PUT, StatusCode::PERMANENT_REDIRECT),
  ] {
    let mut router = Router::new();
    for route in [
      "/path",
      "/dir/",
      "/",
      "/{proc}/StaTus",
      "/USERS/{name}/enTRies/",
      "/static/{filepath:*}",
    ] {
      router.handle(method.clone(), route, noop);
    }

    // trailing slash redirects
    check_redirect(&router, method.clone(), "/path/", code, "/path").await;
    check_redirect(&router, method.clone(), "/dir", code, "/dir/").await;
    // query strings survive the redirect
    check_redirect(&router, method.clone(), "/path/?key=val", code, "/path?key=val").await;
    // case fixing, with and without slash repair
    check_redirect(&router, method.clone(), "/PATH", code, "/path").await;
    check_redirect(&router, method.clone(), "/DIR/", code, "/dir/").await;
    check_redirect(&router, method.clone(), "/PATH/", code, "/path").await;
    check_redirect(&router, method.clone(), "/DIR", code, "/dir/").await;
    check_redirect(&router, method.clone(), "/paTh?name=foo", code, "/path?name=foo").await;
    // parameters keep the request spelling while statics are corrected
    check_redirect(&router, method.clone(), "/sergio/status/", code, "/sergio/StaTus").await;
    check_redirect(
      &router,
      method.clone(),
      "/users/atreugo/eNtriEs",
      code,
      "/USERS/atreugo/enTRies/",
    )
    .await;
    check_redirect(&router, method.clone(), "/STatiC/test.go", code, "/static/test.go").await;

    let response = router.serve(request(method.clone(), "/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
  }

  // CONNECT never redirects
  let mut router = Router::new();
  router.handle(Method::CONNECT, "/path", noop);
  let response = router
    .serve(request(Method::CONNECT, "/path/"))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn custom_not_found() {
  let hits = counter();
  let mut router = Router::new();
  router.get("/path", noop);

  let invoked = Arc::clone(&hits);
  router.not_found = Some(Arc::new(move |_: Request<Body>| {
    let invoked = Arc::clone(&invoked);
    async move {
      invoked.fetch_add(1, Ordering::SeqCst);
      let mut response = Response::new(Body::empty());
      *response.status_mut() = StatusCode::NOT_FOUND;
      Ok::<_, hyper::Error>(response)
    }
  }));

  let response = router.serve(request(Method::GET, "/nope")).await.unwrap();
  assert_eq!(response.status(), StatusCode::NOT_FOUND);
  assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn wild_method_fallback() {
  let any_hits = counter();
  let post_hits = counter();

  let mut router = Router::new();
  router.any("/{path:*}", counting(&any_hits));
  router.post("/specific", counting(&post_hits));

  let methods = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
    Method::TRACE,
  ];
  for method in methods {
    let any_before = any_hits.load(Ordering::SeqCst);
    let post_before = post_hits.load(Ordering::SeqCst);

    let response = router
      .serve(request(method.clone(), "/specific"))
      .await
      .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    if method == Method::POST {
      assert_eq!(post_hits.load(Ordering::SeqCst), post_before + 1);
    } else {
      assert_eq!(
        any_hits.load(Ordering::SeqCst),
        any_before + 1,
        "wild route not used for {}",
        method
      );
    }
  }
}

#[tokio::test]
async fn panic_handler() {
  let handled = counter();

  let mut router = Router::new();
  let seen = Arc::clone(&handled);
  router.panic_handler = Some(Box::new(move |method, path, _payload| {
    assert_eq!(method, &Method::PUT);
    assert_eq!(path, "/user/gopher");
    seen.fetch_add(1, Ordering::SeqCst);
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
  }));

  router.put("/user/{name}", |_: Request<Body>| async {
    panic!("oops!");
    #[allow(unreachable_code)]
    Ok(Response::new(Body::empty()))
  });

  let response = router
    .serve(request(Method::PUT, "/user/gopher"))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(handled.load(Ordering::SeqCst), 1, "panic was not handled");
}

#[test]
fn manual_lookup() {
  let mut router = Router::new();

  let (handler, _, tsr) = router.lookup(&Method::GET, "/nope");
  assert!(handler.is_none());
  assert!(!tsr);

  router.handle(Method::GET, "/user/{name}", noop);

  let (handler, params, tsr) = router.lookup(&Method::GET, "/user/gopher");
  assert!(handler.is_some());
  assert!(!tsr);
  assert_eq!(params.by_name("name"), Some("gopher"));

  let (handler, _, tsr) = router.lookup(&Method::GET, "/user/gopher/");
  assert!(handler.is_none());
  assert!(tsr);

  // the wild tree backs every method
  router.any("/wild/{x}", noop);
  let (handler, params, _) = router.lookup(&Method::DELETE, "/wild/7");
  assert!(handler.is_some());
  assert_eq!(params.by_name("x"), Some("7"));
}

#[tokio::test]
async fn matched_route_path() {
  let hits = counter();
  let mut router = Router::new();
  router.save_matched_route_path = true;

  let capture = |route: &'static str| {
    let hits = Arc::clone(&hits);
    move |req: Request<Body>| {
      let hits = Arc::clone(&hits);
      async move {
        assert_eq!(
          user_value(&req, matched_route_path_param()),
          Some(route),
          "wrong matched route"
        );
        hits.fetch_add(1, Ordering::SeqCst);
        Ok(Response::new(Body::empty()))
      }
    }
  };

  router.get("/user/{name}", capture("/user/{name}"));
  router.get("/user/{name}/details", capture("/user/{name}/details"));
  router.get("/", capture("/"));

  router
    .serve(request(Method::GET, "/user/gopher"))
    .await
    .unwrap();
  router
    .serve(request(Method::GET, "/user/gopher/details"))
    .await
    .unwrap();
  router.serve(request(Method::GET, "/")).await.unwrap();

  assert_eq!(hits.load(Ordering::SeqCst), 3, "routing failed");
}

#[test]
fn list_registered() {
  let mut router = Router::new();
  router.get("/bar", noop);
  router.patch("/foo", noop);

  let mut v1 = router.group("/v1");
  v1.post("/users/{name}/{surname?}", noop);
  v1.delete("/users/{id?}", noop);

  let list = router.list();
  assert_eq!(list.len(), 4);
  assert_eq!(list[&Method::GET], vec!["/bar".to_string()]);
  assert_eq!(list[&Method::PATCH], vec!["/foo".to_string()]);
  assert_eq!(list[&Method::POST], vec!["/v1/users/{name}/{surname?}".to_string()]);
  assert_eq!(list[&Method::DELETE], vec!["/v1/users/{id?}".to_string()]);
}

#[tokio::test]
async fn optional_params() {
  let hits = counter();
  let mut router = Router::new();

  let routed = Arc::clone(&hits);
  router.post("/v1/users/{name}/{surname?}", move |req: Request<Body>| {
    let routed = Arc::clone(&routed);
    async move {
      assert_eq!(user_value(&req, "name"), Some("ana"));
      if routed.fetch_add(1, Ordering::SeqCst) == 0 {
        assert_eq!(user_value(&req, "surname"), None);
      } else {
        assert_eq!(user_value(&req, "surname"), Some("lopez"));
      }
      Ok(Response::new(Body::empty()))
    }
  });

  let response = router
    .serve(request(Method::POST, "/v1/users/ana"))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::OK);

  let response = router
    .serve(request(Method::POST, "/v1/users/ana/lopez"))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::OK);

  assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn same_prefix_param_routes() {
  let hits = counter();
  let mut router = Router::new();
  let mut v1 = router.group("/v1");

  let routed = Arc::clone(&hits);
  v1.get("/foo/{id}/{pageSize}/{page}", move |req: Request<Body>| {
    let routed = Arc::clone(&routed);
    async move {
      assert_eq!(user_value(&req, "id"), Some("1"));
      assert_eq!(user_value(&req, "pageSize"), Some("20"));
      assert_eq!(user_value(&req, "page"), Some("4"));
      routed.fetch_add(1, Ordering::SeqCst);
      Ok(Response::new(Body::empty()))
    }
  });

  let routed = Arc::clone(&hits);
  v1.get("/foo/{id}/{iid}", move |req: Request<Body>| {
    let routed = Arc::clone(&routed);
    async move {
      assert_eq!(user_value(&req, "id"), Some("2"));
      assert_eq!(user_value(&req, "iid"), Some("3"));
      routed.fetch_add(1, Ordering::SeqCst);
      Ok(Response::new(Body::empty()))
    }
  });

  let routed = Arc::clone(&hits);
  v1.get("/foo/{id}", move |req: Request<Body>| {
    let routed = Arc::clone(&routed);
    async move {
      assert_eq!(user_value(&req, "id"), Some("v3"));
      routed.fetch_add(1, Ordering::SeqCst);
      Ok(Response::new(Body::empty()))
    }
  });

  router
    .serve(request(Method::GET, "/v1/foo/1/20/4"))
    .await
    .unwrap();
  router.serve(request(Method::GET, "/v1/foo/2/3")).await.unwrap();
  router.serve(request(Method::GET, "/v1/foo/v3")).await.unwrap();

  assert_eq!(hits.load(Ordering::SeqCst), 3, "not all routes were hit");
}

#[test]
fn group_validation() {
  let mut router = Router::new();
  let mut group = router.group("/v1");

  assert!(
    catch_unwind(AssertUnwindSafe(|| { group.group("v999"); })).is_err(),
    "group prefix without leading '/' did not panic"
  );
  assert!(
    catch_unwind(AssertUnwindSafe(|| { group.group("/v999/"); })).is_err(),
    "group prefix with trailing '/' did not panic"
  );
  assert!(
    catch_unwind(AssertUnwindSafe(|| { group.group(""); })).is_err(),
    "empty group prefix did not panic"
  );
  assert!(
    catch_unwind(AssertUnwindSafe(|| group.get("buzz", noop))).is_err(),
    "group route without leading '/' did not panic"
  );
  assert!(
    catch_unwind(AssertUnwindSafe(|| group.get("", noop))).is_err(),
    "empty group route did not panic"
  );
}

#[tokio::test]
async fn group_routing() {
  let hits = counter();
  let mut router = Router::new();

  router.post("/foo", counting(&hits));
  router.group("/boo").post("/bar", counting(&hits));
  router.group("/goo").post("/bar", counting(&hits));

  let mut moo = router.group("/moo");
  moo.post("/bar", counting(&hits));
  let mut foo = moo.group("/foo");
  foo.post("/bar", counting(&hits));
  foo.group("/foo").post("/bar", counting(&hits));
  // "/" keeps the same scope
  foo.group("/").post("/same", counting(&hits));

  let paths = [
    "/foo",
    "/boo/bar",
    "/goo/bar",
    "/moo/bar",
    "/moo/foo/bar",
    "/moo/foo/foo/bar",
    "/moo/foo/same",
  ];
  for path in paths {
    let before = hits.load(Ordering::SeqCst);
    let response = router.serve(request(Method::POST, path)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK, "POST {}", path);
    assert_eq!(hits.load(Ordering::SeqCst), before + 1, "POST {}", path);
  }

  let response = router.serve(request(Method::POST, "/qax")).await.unwrap();
  assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn custom_methods() {
  let hits = counter();
  let mut router = Router::new();
  router.handle(Method::from_bytes(b"MKCOL").unwrap(), "/dav", counting(&hits));

  let response = router
    .serve(request(Method::from_bytes(b"MKCOL").unwrap(), "/dav"))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(hits.load(Ordering::SeqCst), 1);

  // custom methods take part in the Allow negotiation
  let response = router.serve(request(Method::GET, "/dav")).await.unwrap();
  assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
  assert_eq!(response.headers()[header::ALLOW], "MKCOL, OPTIONS");

  let response = router.serve(request(Method::OPTIONS, "*")).await.unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(response.headers()[header::ALLOW], "MKCOL, OPTIONS");
}

#[tokio::test]
async fn serve_static_files() {
  assert!(
    catch_unwind(AssertUnwindSafe(|| {
      Router::new().serve_files("/noFilepath", std::env::temp_dir())
    }))
    .is_err(),
    "registering a path without the catch-all suffix did not panic"
  );

  let dir = std::env::temp_dir().join("radixmux-serve-files-test");
  std::fs::create_dir_all(&dir).unwrap();
  std::fs::write(dir.join("favicon.ico"), b"fake ico").unwrap();

  let mut router = Router::new();
  router.serve_files("/static/{filepath:*}", &dir);

  let response = router
    .serve(request(Method::GET, "/static/favicon.ico"))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(response.headers()[header::CONTENT_TYPE], "image/x-icon");
  let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
  assert_eq!(&body[..], b"fake ico");

  let response = router
    .serve(request(Method::GET, "/static/missing.txt"))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wild_method_is_a_token() {
  // the wild method is a real, registrable method token
  let hits = counter();
  let mut router = Router::new();
  router.handle(method_wild(), "/anything", counting(&hits));

  let response = router
    .serve(request(Method::from_bytes(b"BREW").unwrap(), "/anything"))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(hits.load(Ordering::SeqCst), 1);
}
