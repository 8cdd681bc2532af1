//! End-to-end routing tests for the vhost proxy.

use vhost_proxy::config::VhostConfig;

mod common;

#[tokio::test]
async fn test_routes_by_host_and_rejects_unknown() {
    let (a_addr, a) = common::start_recording_backend("from-a").await;
    let (b_addr, b) = common::start_recording_backend("from-b").await;

    let proxy = common::start_proxy(
        vec![
            VhostConfig::new("a.example.com", a_addr.to_string()),
            VhostConfig::new("b.example.com", b_addr.to_string()),
        ],
        5,
    )
    .await;

    let res = common::send_request(proxy.addr, "a.example.com", "/foo", &[]).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body, "from-a");

    let requests = a.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].target, "/foo");
    assert_eq!(requests[0].header("host"), Some("a.example.com"));

    let res = common::send_request(proxy.addr, "b.example.com", "/", &[]).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body, "from-b");

    let a_before = a.connections();
    let b_before = b.connections();
    let res = common::send_request(proxy.addr, "c.example.com", "/foo", &[]).await;
    assert_eq!(res.status, 404);
    assert_eq!(a.connections(), a_before, "404 must not reach backend a");
    assert_eq!(b.connections(), b_before, "404 must not reach backend b");
}

#[tokio::test]
async fn test_unmatched_host_never_contacts_backend() {
    let (addr, backend) = common::start_recording_backend("never").await;
    let proxy = common::start_proxy(vec![VhostConfig::new("a.example.com", addr.to_string())], 5).await;

    for host in ["c.example.com", "example.com", "a.example.com.evil"] {
        let res = common::send_request(proxy.addr, host, "/", &[]).await;
        assert_eq!(res.status, 404, "host {}", host);
    }

    assert_eq!(backend.connections(), 0);
}

#[tokio::test]
async fn test_path_and_query_preserved() {
    let (addr, backend) = common::start_recording_backend("ok").await;
    let proxy = common::start_proxy(vec![VhostConfig::new("a.example.com", addr.to_string())], 5).await;

    for target in ["/", "/foo", "/deep/nested/path", "/search?q=rust&page=2"] {
        let res = common::send_request(proxy.addr, "a.example.com", target, &[]).await;
        assert_eq!(res.status, 200);
    }

    let targets: Vec<_> = backend.requests().into_iter().map(|r| r.target).collect();
    assert_eq!(
        targets,
        vec!["/", "/foo", "/deep/nested/path", "/search?q=rust&page=2"]
    );
}

#[tokio::test]
async fn test_host_port_and_case_insensitive() {
    let (addr, backend) = common::start_recording_backend("ok").await;
    let proxy = common::start_proxy(vec![VhostConfig::new("a.example.com", addr.to_string())], 5).await;

    let res = common::send_request(proxy.addr, "A.Example.COM:8080", "/x", &[]).await;
    assert_eq!(res.status, 200);
    assert_eq!(backend.requests()[0].header("host"), Some("A.Example.COM:8080"));
}

#[tokio::test]
async fn test_adds_remote_ip_headers() {
    let (addr, backend) = common::start_recording_backend("ok").await;
    let proxy = common::start_proxy(vec![VhostConfig::new("a.example.com", addr.to_string())], 5).await;

    let res = common::send_request(
        proxy.addr,
        "a.example.com",
        "/",
        &["Proxy-RemoteIP: 203.0.113.9", "X-Forwarded-For: 198.51.100.1"],
    )
    .await;
    assert_eq!(res.status, 200);

    let request = &backend.requests()[0];
    assert_eq!(request.header_values("proxy-remoteip"), vec!["203.0.113.9", "127.0.0.1"]);
    assert_eq!(request.header("x-forwarded-for"), Some("198.51.100.1, 127.0.0.1"));
}

#[tokio::test]
async fn test_hop_by_hop_headers_not_forwarded() {
    let (addr, backend) = common::start_recording_backend("ok").await;
    let proxy = common::start_proxy(vec![VhostConfig::new("a.example.com", addr.to_string())], 5).await;

    let res = common::send_request(
        proxy.addr,
        "a.example.com",
        "/",
        &[
            "Connection: X-Session-Hop",
            "X-Session-Hop: 1",
            "Keep-Alive: timeout=5",
            "Proxy-Connection: keep-alive",
            "X-Trace: abc",
        ],
    )
    .await;
    assert_eq!(res.status, 200);

    let request = &backend.requests()[0];
    assert!(request.header("keep-alive").is_none());
    assert!(request.header("proxy-connection").is_none());
    assert!(request.header("x-session-hop").is_none());
    assert_eq!(request.header("x-trace"), Some("abc"));
    assert_eq!(request.header_values("connection"), Vec::<&str>::new());
}

#[tokio::test]
async fn test_backend_base_path_is_joined() {
    let (addr, backend) = common::start_recording_backend("ok").await;
    let proxy = common::start_proxy(
        vec![VhostConfig::new("a.example.com", format!("{}/app", addr))],
        5,
    )
    .await;

    let res = common::send_request(proxy.addr, "a.example.com", "/users?id=1", &[]).await;
    assert_eq!(res.status, 200);
    assert_eq!(backend.requests()[0].target, "/app/users?id=1");
}

#[tokio::test]
async fn test_path_prefixed_vhost_and_catch_all() {
    let (api_addr, api) = common::start_recording_backend("api").await;
    let (site_addr, site) = common::start_recording_backend("site").await;
    let (default_addr, default) = common::start_recording_backend("default").await;

    let proxy = common::start_proxy(
        vec![
            VhostConfig::new("a.example.com", site_addr.to_string()),
            VhostConfig::new("a.example.com/api", api_addr.to_string()),
            VhostConfig::new("", default_addr.to_string()),
        ],
        5,
    )
    .await;

    let res = common::send_request(proxy.addr, "a.example.com", "/api/users", &[]).await;
    assert_eq!(res.body, "api");
    let res = common::send_request(proxy.addr, "a.example.com", "/index.html", &[]).await;
    assert_eq!(res.body, "site");
    let res = common::send_request(proxy.addr, "other.example.com", "/", &[]).await;
    assert_eq!(res.body, "default");

    assert_eq!(api.requests()[0].target, "/api/users");
    assert_eq!(site.requests().len(), 1);
    assert_eq!(default.requests().len(), 1);
}

#[tokio::test]
async fn test_bare_prefix_path_falls_through_without_redirect() {
    let (api_addr, api) = common::start_recording_backend("api").await;
    let (site_addr, site) = common::start_recording_backend("site").await;

    let proxy = common::start_proxy(
        vec![
            VhostConfig::new("a.example.com", site_addr.to_string()),
            VhostConfig::new("a.example.com/api", api_addr.to_string()),
        ],
        5,
    )
    .await;

    let res = common::send_request(proxy.addr, "a.example.com", "/api", &[]).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body, "site");
    assert_eq!(site.requests()[0].target, "/api");
    assert_eq!(api.connections(), 0);
}

#[tokio::test]
async fn test_duplicate_vhost_last_wins() {
    let (first_addr, first) = common::start_recording_backend("first").await;
    let (second_addr, _second) = common::start_recording_backend("second").await;

    let proxy = common::start_proxy(
        vec![
            VhostConfig::new("a.example.com", first_addr.to_string()),
            VhostConfig::new("a.example.com", second_addr.to_string()),
        ],
        5,
    )
    .await;

    let res = common::send_request(proxy.addr, "a.example.com", "/", &[]).await;
    assert_eq!(res.body, "second");
    assert_eq!(first.connections(), 0);
}

#[tokio::test]
async fn test_repeated_gets_are_identical_upstream() {
    let (addr, backend) = common::start_recording_backend("ok").await;
    let proxy = common::start_proxy(vec![VhostConfig::new("", addr.to_string())], 5).await;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    for _ in 0..5 {
        let res = client
            .get(format!("http://{}/resource?id=42", proxy.addr))
            .header("X-Client", "test")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(res.text().await.unwrap(), "ok");
    }

    let requests = backend.requests();
    assert_eq!(requests.len(), 5);
    for request in &requests[1..] {
        assert_eq!(request, &requests[0]);
    }
    assert_eq!(requests[0].header("proxy-remoteip"), Some("127.0.0.1"));
}

#[tokio::test]
async fn test_relays_status_headers_and_chunked_body() {
    let (addr, _backend) = common::start_raw_backend(
        "HTTP/1.1 201 Created\r\n\
         Transfer-Encoding: chunked\r\n\
         X-Backend: yes\r\n\
         Keep-Alive: timeout=5\r\n\
         Connection: close\r\n\r\n\
         5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n"
            .to_string(),
    )
    .await;
    let proxy = common::start_proxy(vec![VhostConfig::new("", addr.to_string())], 5).await;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let res = client
        .get(format!("http://{}/created", proxy.addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 201);
    assert_eq!(res.headers().get("x-backend").unwrap(), "yes");
    assert!(res.headers().get("keep-alive").is_none());
    assert_eq!(res.text().await.unwrap(), "hello world");
}
