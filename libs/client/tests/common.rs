//! An in process stand in for the parts of the USOS api we call.

use std::collections::{BTreeMap, HashMap};

use axum::extract::Query;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, HOST};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::routing::{get, post};
use axum::Router;
use base64::{engine::general_purpose, Engine as _};
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::sign::Signer;
use url::Url;
use usos_auth_client::{signature_base_string, UsosClient, UsosClientBuilder};

pub const CONSUMER_KEY: &str = "test-consumer-key";
pub const CONSUMER_SECRET: &str = "test-consumer-secret";
pub const GOOD_VERIFIER: &str = "12345678";

type Reply = (StatusCode, [(axum::http::HeaderName, &'static str); 1], String);

fn reply(status: StatusCode, content_type: &'static str, body: &str) -> Reply {
    (status, [(CONTENT_TYPE, content_type)], body.to_string())
}

/// Split `OAuth k="v", ...` into its decoded parameters.
fn oauth_params(headers: &HeaderMap) -> Option<BTreeMap<String, String>> {
    let auth = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let rest = auth.strip_prefix("OAuth ")?;
    rest.split(", ")
        .map(|pair| {
            let (k, v) = pair.split_once('=')?;
            let v = v.strip_prefix('"')?.strip_suffix('"')?;
            let v = urlencoding::decode(v).ok()?.into_owned();
            Some((k.to_string(), v))
        })
        .collect()
}

/// The secret the mock handed out alongside each token.
fn token_secret(token: Option<&str>) -> Option<&'static str> {
    match token {
        None => Some(""),
        Some("req-token") => Some("req-secret"),
        Some("acc-token") => Some("acc-secret"),
        Some(_) => None,
    }
}

fn hmac_sha1(base: &str, key: &str) -> String {
    let key = PKey::hmac(key.as_bytes()).expect("hmac key");
    let mut signer = Signer::new(MessageDigest::sha1(), &key).expect("signer");
    signer.update(base.as_bytes()).expect("sign update");
    general_purpose::STANDARD.encode(signer.sign_to_vec().expect("sign"))
}

/// Recompute the HMAC-SHA1 signature of this request and return the oauth
/// parameters only when it matches and the consumer is the expected one.
fn verified_params(method: &Method, headers: &HeaderMap, uri: &Uri) -> Option<BTreeMap<String, String>> {
    let mut params = oauth_params(headers)?;
    let signature = params.remove("oauth_signature")?;
    if params.get("oauth_consumer_key").map(String::as_str) != Some(CONSUMER_KEY)
        || params.get("oauth_signature_method").map(String::as_str) != Some("HMAC-SHA1")
    {
        return None;
    }

    let host = headers.get(HOST)?.to_str().ok()?;
    let url = Url::parse(&format!("http://{}{}", host, uri)).ok()?;
    let signed: Vec<(&str, String)> = params
        .iter()
        .map(|(k, v)| (k.as_str(), v.clone()))
        .collect();
    let base = signature_base_string(method.as_str(), &url, &signed);

    let secret = token_secret(params.get("oauth_token").map(String::as_str))?;
    let key = format!(
        "{}&{}",
        urlencoding::encode(CONSUMER_SECRET),
        urlencoding::encode(secret)
    );
    if hmac_sha1(&base, &key) == signature {
        Some(params)
    } else {
        None
    }
}

fn param<'a>(params: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    params.get(name).map(String::as_str)
}

async fn request_token(
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    let params = match verified_params(&method, &headers, &uri) {
        Some(p) if param(&p, "oauth_callback") == Some("oob") => p,
        _ => {
            return reply(StatusCode::UNAUTHORIZED, "text/plain", "oauth_problem=signature_invalid")
        }
    };
    if param(&params, "oauth_token").is_some() {
        return reply(StatusCode::BAD_REQUEST, "text/plain", "oauth_problem=parameter_rejected");
    }
    if query.get("scopes").map(String::as_str) != Some("studies") {
        return reply(StatusCode::BAD_REQUEST, "text/plain", "oauth_problem=scope_invalid");
    }
    reply(
        StatusCode::OK,
        "application/x-www-form-urlencoded",
        "oauth_token=req-token&oauth_token_secret=req-secret&oauth_callback_confirmed=true",
    )
}

async fn access_token(method: Method, uri: Uri, headers: HeaderMap) -> Reply {
    let params = match verified_params(&method, &headers, &uri) {
        Some(p) if param(&p, "oauth_token") == Some("req-token") => p,
        _ => return reply(StatusCode::UNAUTHORIZED, "text/plain", "oauth_problem=token_rejected"),
    };
    if param(&params, "oauth_verifier") != Some(GOOD_VERIFIER) {
        return reply(StatusCode::UNAUTHORIZED, "text/plain", "oauth_problem=verifier_invalid");
    }
    reply(
        StatusCode::OK,
        "application/x-www-form-urlencoded",
        "oauth_token=acc-token&oauth_token_secret=acc-secret",
    )
}

fn is_authorised_call(method: &Method, headers: &HeaderMap, uri: &Uri) -> bool {
    verified_params(method, headers, uri)
        .map(|p| param(&p, "oauth_token") == Some("acc-token"))
        .unwrap_or(false)
}

async fn users_user(
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    if !is_authorised_call(&method, &headers, &uri) {
        return reply(StatusCode::UNAUTHORIZED, "application/json", r#"{"message": "no"}"#);
    }
    if query.get("fields").map(String::as_str)
        != Some("id|first_name|last_name|student_programmes")
    {
        return reply(StatusCode::BAD_REQUEST, "application/json", r#"{"message": "fields"}"#);
    }
    reply(
        StatusCode::OK,
        "application/json",
        r#"{
            "id": "100200",
            "first_name": "Jan",
            "last_name": "Kowalski",
            "student_programmes": [
                {"id": "7", "programme": {"id": "103A-INxxx-ISP", "description": {"pl": "Informatyka", "en": "Computer Science"}}}
            ]
        }"#,
    )
}

async fn courses_user(method: Method, uri: Uri, headers: HeaderMap) -> Reply {
    if !is_authorised_call(&method, &headers, &uri) {
        return reply(StatusCode::UNAUTHORIZED, "application/json", r#"{"message": "no"}"#);
    }
    reply(
        StatusCode::OK,
        "application/json",
        r#"{"course_editions": {
            "2023Z": [{"course_id": "103A-INxxx-ISP-PROI", "course_name": {"pl": "Programowanie obiektowe"}, "term_id": "2023Z"}],
            "2024L": [{"course_id": "103A-INxxx-ISP-BD1", "course_name": {"en": "Databases"}, "term_id": "2024L"}]
        }}"#,
    )
}

/// Start the mock and return its address.
pub async fn spawn_mock() -> String {
    sketching::test_init();

    let app = Router::new()
        .route("/services/oauth/request_token", post(request_token))
        .route("/services/oauth/access_token", post(access_token))
        .route("/services/users/user", get(users_user))
        .route("/services/courses/user", get(courses_user));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind mock usos");
    let addr = listener.local_addr().expect("no local addr");

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    format!("http://{}", addr)
}

pub fn client_for(address: String, consumer_secret: &str) -> UsosClient {
    UsosClientBuilder::new()
        .address(address)
        .consumer(CONSUMER_KEY.to_string(), consumer_secret.to_string())
        .connect_timeout(5)
        .no_proxy()
        .build()
        .expect("failed to build client")
}

/// Start the mock and return a client pointed at it.
pub async fn setup_test() -> UsosClient {
    client_for(spawn_mock().await, CONSUMER_SECRET)
}
