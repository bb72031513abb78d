//! End to end lookups against a mocked phpIPAM server.

use phpipam_sdb::api::Api;
use phpipam_sdb::resolver::{self, phpipam::LINE_SEPARATOR};
use phpipam_sdb::{Error, Profile};

use serde_json::{json, Value};
use wiremock::matchers::{basic_auth, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER: &str = "read_api_user";
const PASSWORD: &str = "xxxxx";
const TOKEN: &str = "h.8Ox2mQ7r%YkD5eAZ";

fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "code": 200,
        "success": true,
        "data": data,
        "time": 0.004
    }))
}

fn not_found(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "code": 200,
        "success": false,
        "message": message,
        "time": 0.002
    }))
}

fn subnet(description: &str, netmask: &str) -> Value {
    json!({
        "id": "27",
        "subnet": "10.100.15.0",
        "mask": "24",
        "description": description,
        "calculation": {
            "Type": "IPv4",
            "Subnet netmask": netmask,
            "Subnet bitmask": "24"
        }
    })
}

/// Mock server that hands out TOKEN for the right credentials.
async fn ipam() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/lookup/user"))
        .and(basic_auth(USER, PASSWORD))
        .respond_with(ok(json!({"token": TOKEN, "expires": "2026-10-16 23:59:59"})))
        .mount(&server)
        .await;
    server
}

async fn mount_search(server: &MockServer, key: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/api/lookup/addresses/search_hostname_partial/{}", key)))
        .and(header("token", TOKEN))
        .and(header("content-type", "application/json"))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_subnet(server: &MockServer, id: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/api/lookup/subnets/{}", id)))
        .and(header("token", TOKEN))
        .respond_with(response)
        .mount(server)
        .await;
}

fn profile(server: &MockServer) -> Profile {
    Profile::new(&server.uri(), USER, PASSWORD)
}

// the blocking client must stay off the async runtime threads
async fn get(profile: Profile, key: &str) -> Result<String, Error> {
    let key = key.to_string();
    tokio::task::spawn_blocking(move || resolver::get(&profile, &key))
        .await
        .unwrap()
}

async fn token_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/api/lookup/user")
        .count()
}

#[test]
fn test_missing_configuration() {
    let mut no_url = Profile::new("http://127.0.0.1:9", USER, PASSWORD);
    no_url.url = None;
    assert!(matches!(
        resolver::get(&no_url, "www01"),
        Err(Error::Configuration(_))
    ));

    let mut no_auth = Profile::new("http://127.0.0.1:9", USER, PASSWORD);
    no_auth.auth = None;
    assert!(matches!(Api::new(&no_auth), Err(Error::Configuration(_))));
}

#[tokio::test]
async fn test_single_match() {
    let server = ipam().await;
    mount_search(
        &server,
        "www01",
        ok(json!([
            {"id": "301", "ip": "10.100.15.20", "hostname": "www01", "subnetId": "27"}
        ])),
    )
    .await;
    mount_subnet(&server, "27", ok(subnet("PV Backwww", "255.255.255.0"))).await;

    let found = get(profile(&server), "www01").await.unwrap();
    assert_eq!(found, "10.100.15.20:255.255.255.0:PV Backwww:27");
}

#[tokio::test]
async fn test_hostname_not_found() {
    let server = ipam().await;
    mount_search(&server, "www01", ok(json!([]))).await;
    assert_eq!(get(profile(&server), "www01").await.unwrap(), "");

    let server = ipam().await;
    mount_search(&server, "www02", not_found("Address not found")).await;
    assert_eq!(get(profile(&server), "www02").await.unwrap(), "");
}

#[tokio::test]
async fn test_two_matches_keep_search_order() {
    let server = ipam().await;
    mount_search(
        &server,
        "www01",
        ok(json!([
            {"id": "301", "ip": "10.100.15.20", "hostname": "www01", "subnetId": "27"},
            {"id": "302", "ip": "10.100.7.20", "hostname": "www01", "subnetId": 19}
        ])),
    )
    .await;
    mount_subnet(&server, "27", ok(subnet("PV Backwww", "255.255.255.0"))).await;
    mount_subnet(&server, "19", ok(subnet("PV Frontwww", "255.255.255.0"))).await;

    let found = get(profile(&server), "www01").await.unwrap();
    let lines: Vec<&str> = found.split(LINE_SEPARATOR).collect();
    assert_eq!(
        lines,
        vec![
            "10.100.15.20:255.255.255.0:PV Backwww:27",
            "10.100.7.20:255.255.255.0:PV Frontwww:19",
        ]
    );
}

#[tokio::test]
async fn test_partial_hostname_excluded() {
    let server = ipam().await;
    mount_search(
        &server,
        "www01",
        ok(json!([
            {"id": "301", "ip": "10.100.15.20", "hostname": "www01", "subnetId": "27"},
            {"id": "303", "ip": "10.100.15.21", "hostname": "www01-mgmt", "subnetId": "27"},
            {"id": "304", "ip": "10.100.15.22", "hostname": null, "subnetId": "27"}
        ])),
    )
    .await;
    mount_subnet(&server, "27", ok(subnet("PV Backwww", "255.255.255.0"))).await;

    let found = get(profile(&server), "www01").await.unwrap();
    assert_eq!(found, "10.100.15.20:255.255.255.0:PV Backwww:27");
}

#[tokio::test]
async fn test_empty_subnet_skipped() {
    let server = ipam().await;
    mount_search(
        &server,
        "www01",
        ok(json!([
            {"id": "301", "ip": "10.100.15.20", "hostname": "www01", "subnetId": "27"},
            {"id": "302", "ip": "10.100.7.20", "hostname": "www01", "subnetId": "19"},
            {"id": "305", "ip": "10.100.9.20", "hostname": "www01", "subnetId": "31"}
        ])),
    )
    .await;
    mount_subnet(&server, "27", not_found("No subnets found")).await;
    mount_subnet(&server, "19", ok(subnet("PV Frontwww", "255.255.255.0"))).await;
    mount_subnet(&server, "31", ok(json!({}))).await;

    let found = get(profile(&server), "www01").await.unwrap();
    assert_eq!(found, "10.100.7.20:255.255.255.0:PV Frontwww:19");
}

#[tokio::test]
async fn test_subnet_without_description() {
    let server = ipam().await;
    mount_search(
        &server,
        "db01",
        ok(json!([{"ip": "10.1.2.3", "hostname": "db01", "subnetId": "8"}])),
    )
    .await;
    mount_subnet(
        &server,
        "8",
        ok(json!({"id": "8", "description": null, "calculation": {"Subnet netmask": "255.255.0.0"}})),
    )
    .await;

    let found = get(profile(&server), "db01").await.unwrap();
    assert_eq!(found, "10.1.2.3:255.255.0.0::8");
}

#[tokio::test]
async fn test_key_stays_one_path_segment() {
    let server = ipam().await;
    mount_search(
        &server,
        "rack1%2Fwww01",
        ok(json!([{"ip": "10.100.15.20", "hostname": "rack1/www01", "subnetId": "27"}])),
    )
    .await;
    mount_subnet(&server, "27", ok(subnet("PV Backwww", "255.255.255.0"))).await;

    let found = get(profile(&server), "rack1/www01").await.unwrap();
    assert_eq!(found, "10.100.15.20:255.255.255.0:PV Backwww:27");
}

#[tokio::test]
async fn test_authentication_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/lookup/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": 401,
            "success": false,
            "message": "Invalid username or password"
        })))
        .mount(&server)
        .await;

    let err = get(profile(&server), "www01").await.unwrap_err();
    match err {
        Error::Authentication { url, source } => {
            assert!(url.ends_with("/api/lookup/user"));
            assert_eq!(source.status().map(|s| s.as_u16()), Some(401));
        }
        other => panic!("expected authentication error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_token_missing_from_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/lookup/user"))
        .respond_with(ok(json!({"expires": "2026-10-16 23:59:59"})))
        .mount(&server)
        .await;

    assert!(matches!(
        get(profile(&server), "www01").await,
        Err(Error::Parse(_))
    ));
}

#[tokio::test]
async fn test_search_failure_aborts() {
    let server = ipam().await;
    mount_search(&server, "www01", ResponseTemplate::new(500)).await;

    assert!(matches!(
        get(profile(&server), "www01").await,
        Err(Error::Request { .. })
    ));
}

#[tokio::test]
async fn test_subnet_failure_aborts_without_partial_output() {
    let server = ipam().await;
    mount_search(
        &server,
        "www01",
        ok(json!([
            {"ip": "10.100.15.20", "hostname": "www01", "subnetId": "27"},
            {"ip": "10.100.7.20", "hostname": "www01", "subnetId": "19"}
        ])),
    )
    .await;
    mount_subnet(&server, "27", ok(subnet("PV Backwww", "255.255.255.0"))).await;
    mount_subnet(&server, "19", ResponseTemplate::new(503)).await;

    match get(profile(&server), "www01").await {
        Err(Error::Request { url, .. }) => assert!(url.ends_with("/subnets/19")),
        other => panic!("expected request error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_new_token_per_lookup() {
    let server = ipam().await;
    mount_search(&server, "www01", ok(json!([]))).await;

    get(profile(&server), "www01").await.unwrap();
    get(profile(&server), "www01").await.unwrap();
    assert_eq!(token_requests(&server).await, 2);
}

#[tokio::test]
async fn test_custom_app_id_and_trailing_slash() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/saltapi/user"))
        .and(basic_auth(USER, PASSWORD))
        .respond_with(ok(json!({"token": TOKEN})))
        .mount(&server)
        .await;

    let profile = Profile::new(&format!("{}/", server.uri()), USER, PASSWORD).with_app_id("saltapi");
    let (token, base_url) = tokio::task::spawn_blocking(move || {
        Api::new(&profile).map(|api| (api.token().to_string(), api.base_url().to_string()))
    })
    .await
    .unwrap()
    .unwrap();
    assert_eq!(token, TOKEN);
    assert_eq!(base_url, format!("{}/api/saltapi", server.uri()));
}
