//! Verify operations against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector names an operation, its options as JSON, the request the
//! client is expected to send, a simulated response, and either the decoded
//! result or the expected error. Results are compared as parsed JSON so key
//! order in the fixtures does not matter.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use cloudant_core::{
    AuthConfig, ClientConfig, CloudantClient, CloudantError, HttpMethod, HttpRequest, HttpResponse, ServiceResponse,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

const BASE_URL: &str = "https://acct.example.com";

/// Records every request and answers each with the case's simulated response.
struct Recorder {
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    client: CloudantClient,
}

fn recorder(case: &Value) -> Recorder {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let sim = case["simulated_response"].clone();
    let seen = Arc::clone(&requests);
    let transport = move |req: &HttpRequest| -> Result<HttpResponse, CloudantError> {
        seen.lock().unwrap().push(req.clone());
        let headers: Vec<(String, String)> = sim["headers"]
            .as_object()
            .map(|h| {
                h.iter()
                    .map(|(k, v)| (k.clone(), v.as_str().unwrap().to_string()))
                    .collect()
            })
            .unwrap_or_default();
        let body = match &sim["body"] {
            Value::Null => Vec::new(),
            other => serde_json::to_vec(other).unwrap(),
        };
        Ok(HttpResponse::new(sim["status"].as_u64().unwrap() as u16, headers, body))
    };
    let config = ClientConfig {
        max_retries: 0,
        ..ClientConfig::new(BASE_URL, AuthConfig::NoAuth)
    };
    let client = CloudantClient::with_transport(config, Arc::new(transport)).unwrap();
    Recorder { requests, client }
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "HEAD" => HttpMethod::Head,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn check_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");

    let url = Url::parse(&req.url).unwrap();
    assert_eq!(url.path(), expected["path"].as_str().unwrap(), "{name}: path");

    let query: BTreeMap<String, String> = url.query_pairs().into_owned().collect();
    let expected_query: BTreeMap<String, String> = serde_json::from_value(expected["query"].clone()).unwrap();
    assert_eq!(query, expected_query, "{name}: query");

    for (header, value) in expected["headers"].as_object().unwrap() {
        assert_eq!(req.header(header), value.as_str(), "{name}: header {header}");
    }

    match &expected["body"] {
        Value::Null => assert!(req.body.is_none(), "{name}: unexpected body"),
        body => {
            let sent: Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&sent, body, "{name}: body");
        }
    }
}

fn check_error(name: &str, err: &CloudantError, expected: &Value) {
    if let Some(message) = expected["validation"].as_str() {
        match err {
            CloudantError::Validation(m) => assert_eq!(m, message, "{name}: validation message"),
            other => panic!("{name}: expected validation error, got {other:?}"),
        }
        return;
    }
    match err {
        CloudantError::Api { status, error, .. } => {
            assert_eq!(Some(*status as u64), expected["status"].as_u64(), "{name}: status");
            assert_eq!(error.as_deref(), expected["error"].as_str(), "{name}: error code");
        }
        other => panic!("{name}: expected API error, got {other:?}"),
    }
}

/// Run one vector through `call`, which maps options `O` to a result `T`.
fn run_case<O, T>(case: &Value, call: impl Fn(&CloudantClient, &O) -> Result<ServiceResponse<T>, CloudantError>)
where
    O: DeserializeOwned,
    T: Serialize + DeserializeOwned,
{
    let name = case["name"].as_str().unwrap();
    let options: O = serde_json::from_value(case["options"].clone()).unwrap();
    let rec = recorder(case);

    let outcome = call(&rec.client, &options);
    let requests = rec.requests.lock().unwrap();

    if let Some(expected_err) = case.get("expected_error") {
        let err = outcome.err().unwrap_or_else(|| panic!("{name}: expected an error"));
        check_error(name, &err, expected_err);
        if expected_err.get("validation").is_some() {
            assert!(requests.is_empty(), "{name}: validation failure must not send a request");
            return;
        }
    } else {
        let response = outcome.unwrap_or_else(|e| panic!("{name}: {e}"));
        assert_eq!(
            Some(response.status_code as u64),
            case["simulated_response"]["status"].as_u64(),
            "{name}: status"
        );
        let expected: T = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(
            serde_json::to_value(response.into_result()).unwrap(),
            serde_json::to_value(expected).unwrap(),
            "{name}: parsed result"
        );
    }

    assert_eq!(requests.len(), 1, "{name}: request count");
    check_request(name, &requests[0], &case["expected_request"]);
}

fn run(case: &Value) {
    match case["operation"].as_str().unwrap() {
        "get_server_information" => run_case(case, |c, _: &Value| c.get_server_information()),
        "get_uuids" => run_case(case, CloudantClient::get_uuids),
        "put_cors_configuration" => run_case(case, CloudantClient::put_cors_configuration),
        "post_search_analyze" => run_case(case, CloudantClient::post_search_analyze),
        "put_database" => run_case(case, CloudantClient::put_database),
        "get_database_information" => run_case(case, CloudantClient::get_database_information),
        "delete_database" => run_case(case, CloudantClient::delete_database),
        "post_dbs_info" => run_case(case, CloudantClient::post_dbs_info),
        "get_document" => run_case(case, CloudantClient::get_document),
        "put_document" => run_case(case, CloudantClient::put_document),
        "post_all_docs" => run_case(case, CloudantClient::post_all_docs),
        "post_bulk_docs" => run_case(case, CloudantClient::post_bulk_docs),
        "post_find" => run_case(case, CloudantClient::post_find),
        "post_index" => run_case(case, CloudantClient::post_index),
        "delete_index" => run_case(case, CloudantClient::delete_index),
        other => panic!("no runner for operation {other}"),
    }
}

fn run_file(raw: &str) {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    for case in vectors["cases"].as_array().unwrap() {
        run(case);
    }
}

#[test]
fn server_test_vectors() {
    run_file(include_str!("../../test-vectors/server.json"));
}

#[test]
fn database_test_vectors() {
    run_file(include_str!("../../test-vectors/databases.json"));
}

#[test]
fn document_test_vectors() {
    run_file(include_str!("../../test-vectors/documents.json"));
}

#[test]
fn query_test_vectors() {
    run_file(include_str!("../../test-vectors/queries.json"));
}
