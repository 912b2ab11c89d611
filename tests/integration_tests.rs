//! Integration tests using wiremock to simulate the HasOffers API.

use hasoffers::{Client, Error};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RATE_LIMITED: &str = "API usage exceeded rate limit. Configured: 50/10s window";

fn client_for(server: &MockServer, max_retries: usize) -> Client {
    Client::builder()
        .root(server.uri())
        .unwrap()
        .network_token("tok")
        .network_id("demo")
        .max_retries(max_retries)
        .build()
        .unwrap()
}

fn success(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "request": {},
        "response": {
            "status": 1,
            "httpStatus": 200,
            "data": data,
            "errors": [],
            "errorMessage": null
        }
    }))
}

fn failure(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "request": {},
        "response": {
            "status": -1,
            "httpStatus": 200,
            "data": "",
            "errors": [{ "publicMessage": message }],
            "errorMessage": message
        }
    }))
}

#[tokio::test]
async fn test_successful_call() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Offer.json"))
        .and(query_param("NetworkId", "demo"))
        .and(query_param("NetworkToken", "tok"))
        .and(query_param("Method", "findById"))
        .and(query_param("id", "1"))
        .respond_with(success(json!({ "Offer": { "id": "1", "name": "Summer" } })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 1);
    let response = client
        .call("Offer", "findById", &json!({ "id": 1 }))
        .await
        .unwrap();

    assert_eq!(response.status, 1);
    assert_eq!(response.http_status, 200);
    assert_eq!(response.error_message, "");
    assert_eq!(response.status_code.as_u16(), 200);
    assert_eq!(response.attempts, 1);
    assert!(!response.was_retried());
    assert_eq!(response.request.target, "Offer");
    assert!(response.raw_body.contains("Summer"));

    let offer = response.extract_one(None).unwrap().unwrap();
    assert_eq!(offer.id(), Some(1));
    assert_eq!(offer["name"], "Summer");
}

#[tokio::test]
async fn test_nested_params_are_bracket_encoded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Conversion.json"))
        .and(query_param("contain[0]", "Offer"))
        .and(query_param("filters[Stat.date][conditional]", "BETWEEN"))
        .and(query_param("filters[Stat.date][values][1]", "2024-01-31"))
        .respond_with(success(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 1);
    let response = client
        .call(
            "Conversion",
            "findAll",
            &json!({
                "contain": ["Offer"],
                "filters": {
                    "Stat.date": { "conditional": "BETWEEN", "values": ["2024-01-01", "2024-01-31"] }
                }
            }),
        )
        .await
        .unwrap();

    assert_eq!(response.extract_all(None).unwrap(), None);
}

#[tokio::test]
async fn test_api_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Offer.json"))
        .respond_with(failure("Invalid Method: Offer::findEverything"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 3);
    let result = client.call("Offer", "findEverything", &()).await;

    match result {
        Err(Error::Api {
            message,
            errors,
            raw_response,
        }) => {
            assert_eq!(message, "Invalid Method: Offer::findEverything");
            assert_eq!(errors[0]["publicMessage"], "Invalid Method: Offer::findEverything");
            assert!(raw_response.contains("\"status\":-1"));
        }
        _ => panic!("Expected Api error, got {:?}", result),
    }
}

#[tokio::test]
async fn test_malformed_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Offer.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": 1 })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 3);
    let result = client.call("Offer", "findAll", &()).await;

    match result {
        Err(Error::MalformedResponse { raw_response }) => {
            assert_eq!(raw_response, r#"{"status":1}"#);
        }
        _ => panic!("Expected MalformedResponse, got {:?}", result),
    }
}

#[tokio::test]
async fn test_invalid_json_is_a_transport_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Offer.json"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 3);
    let err = client.call("Offer", "findAll", &()).await.unwrap_err();
    assert!(err.is_transport());

    match err {
        Error::Decode {
            raw_response,
            status,
            ..
        } => {
            assert_eq!(status.as_u16(), 502);
            assert_eq!(raw_response, "<html>Bad Gateway</html>");
        }
        other => panic!("Expected Decode error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_failure() {
    // Nothing listens on port 1
    let client = Client::builder()
        .root("http://127.0.0.1:1/")
        .unwrap()
        .network_token("tok")
        .network_id("demo")
        .max_retries(3)
        .build()
        .unwrap();

    let result = client.call("Offer", "findAll", &()).await;

    match result {
        Err(err @ Error::Transport(_)) => assert!(err.is_transport()),
        _ => panic!("Expected Transport error, got {:?}", result),
    }
}

#[tokio::test]
async fn test_rate_limit_exhausts_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Conversion.json"))
        .respond_with(failure(RATE_LIMITED))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 3);
    let start = Instant::now();
    let result = client.call("Conversion", "findAll", &()).await;
    let elapsed = start.elapsed();

    match result {
        Err(Error::RateLimitExceeded {
            attempts, message, ..
        }) => {
            assert_eq!(attempts, 3);
            assert_eq!(message, RATE_LIMITED);
        }
        _ => panic!("Expected RateLimitExceeded, got {:?}", result),
    }

    // Two 250ms pauses between three attempts
    assert!(elapsed >= Duration::from_millis(500), "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn test_rate_limit_without_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Conversion.json"))
        .respond_with(failure(RATE_LIMITED))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 1);
    let result = client.call("Conversion", "findAll", &()).await;

    match result {
        Err(Error::RateLimitExceeded { attempts, .. }) => assert_eq!(attempts, 1),
        _ => panic!("Expected RateLimitExceeded, got {:?}", result),
    }
}

#[tokio::test]
async fn test_rate_limit_then_success() {
    let mock_server = MockServer::start().await;
    let attempt_count = Arc::new(AtomicUsize::new(0));
    let attempt_count_clone = attempt_count.clone();

    // First two requests are throttled, third succeeds
    Mock::given(method("GET"))
        .and(path("/Offer.json"))
        .respond_with(move |_req: &wiremock::Request| {
            let count = attempt_count_clone.fetch_add(1, Ordering::SeqCst);
            if count < 2 {
                failure(RATE_LIMITED)
            } else {
                success(json!({ "Offer": { "id": "9" } }))
            }
        })
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .root(mock_server.uri())
        .unwrap()
        .network_token("tok")
        .network_id("demo")
        .max_retries(5)
        .retry_delay(Duration::from_millis(10))
        .build()
        .unwrap();

    let response = client.call("Offer", "findById", &json!({ "id": 9 })).await.unwrap();

    assert_eq!(response.attempts, 3);
    assert!(response.was_retried());
    assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
    assert_eq!(response.extract_one(None).unwrap().unwrap().id(), Some(9));
}

#[tokio::test]
async fn test_paged_collection_with_contained_models() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Conversion.json"))
        .and(query_param("Method", "findAll"))
        .and(query_param("contain[0]", "Offer"))
        .and(query_param("limit", "10"))
        .respond_with(success(json!({
            "page": 1,
            "current": 1,
            "count": 1,
            "pageCount": 1,
            "data": {
                "1": {
                    "Conversion": { "id": "5", "payout": "10" },
                    "Offer": { "id": "2" }
                }
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 1);
    let response = client
        .entity("Conversion")
        .find_all()
        .contain(["Offer"])
        .limit(10)
        .send()
        .await
        .unwrap();

    let page = response.page().unwrap();
    assert_eq!((page.page, page.count, page.page_count), (1, 1, 1));

    let records = response.extract_all(None).unwrap().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["id"], json!(5));
    assert_eq!(records[0]["payout"], "10");
    assert_eq!(records[0]["Offer"], json!({ "id": "2" }));
}

#[tokio::test]
async fn test_extraction_with_wrong_model() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Conversion.json"))
        .respond_with(success(json!({ "Conversion": { "id": "7" } })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 1);
    let response = client.entity("Conversion").find_by_id(7).send().await.unwrap();

    assert!(matches!(
        response.extract_one(Some("Offer")),
        Err(Error::Mapping { .. })
    ));
    assert_eq!(response.extract_one(None).unwrap().unwrap().id(), Some(7));
}

#[tokio::test]
async fn test_concurrent_fluent_calls() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Offer.json"))
        .and(query_param("Method", "findById"))
        .respond_with(success(json!({ "Offer": { "id": "1" } })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/Advertiser.json"))
        .and(query_param("Method", "findAll"))
        .respond_with(success(json!({ "4": { "Advertiser": { "id": "4" } } })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 1);
    let offers = client.entity("Offer");
    let advertisers = client.entity("Advertiser");

    let (offer, advertiser) = tokio::join!(
        offers.find_by_id(1).send(),
        advertisers.find_all().send()
    );

    let offer = offer.unwrap();
    let advertiser = advertiser.unwrap();
    assert_eq!(offer.request.method, "findById");
    assert_eq!(advertiser.request.target, "Advertiser");
    assert_eq!(offer.extract_one(None).unwrap().unwrap().id(), Some(1));
    assert_eq!(advertiser.extract_all(None).unwrap().unwrap()[0].id(), Some(4));
}

#[tokio::test]
async fn test_debug_logging_does_not_change_results() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("hasoffers=info")
        .with_test_writer()
        .try_init();

    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Offer.json"))
        .respond_with(success(json!({})))
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .root(mock_server.uri())
        .unwrap()
        .network_token("tok")
        .network_id("demo")
        .debug(true)
        .build()
        .unwrap();

    let response = client.entity("Offer").find_all().send().await.unwrap();
    assert_eq!(response.extract_one(None).unwrap(), None);
}

#[tokio::test]
async fn test_unencodable_params_never_hit_the_wire() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(success(json!({})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 1);

    let result = client.call("Offer", "findAll", &json!({ "filters": { "id": null } })).await;
    assert!(matches!(result, Err(Error::Encoding(_))));

    let result = client.call("Offer", "findAll", &json!(["not", "a", "map"])).await;
    assert!(matches!(result, Err(Error::Encoding(_))));
}

#[tokio::test]
async fn test_success_with_loosely_typed_envelope_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Offer.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {
                "status": 1.0,
                "httpStatus": "200",
                "data": { "Offer": { "id": 3.0 } },
                "errors": {},
                "errorMessage": false
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 1);
    let response = client.entity("Offer").find_by_id(3).send().await.unwrap();

    assert_eq!(response.status, 1);
    assert_eq!(response.error_message, "");
    // Non-numeric httpStatus falls back to the transport status
    assert_eq!(response.http_status, 200);
    assert_eq!(response.extract_one(None).unwrap().unwrap().id(), Some(3));
}
