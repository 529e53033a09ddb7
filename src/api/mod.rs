use rocket::{serde::json::Json, Catcher, Request, Route};
use serde_json::{json, Value};

mod admin;
mod auth;
mod public;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(admin::routes());
    routes.extend(public::routes());
    routes.extend(auth::routes());
    routes
}

/// Catchers that keep every unhandled failure in the `{"error": ...}` shape.
pub fn catchers() -> Vec<Catcher> {
    catchers![bad_request, forbidden, not_found, unprocessable, server_error]
}

#[catch(400)]
fn bad_request() -> Json<Value> {
    Json(json!({ "error": "Malformed request" }))
}

#[catch(403)]
fn forbidden() -> Json<Value> {
    Json(json!({ "error": "Access denied" }))
}

#[catch(404)]
fn not_found(req: &Request<'_>) -> Json<Value> {
    Json(json!({ "error": format!("No such page: {}", req.uri()) }))
}

#[catch(422)]
fn unprocessable() -> Json<Value> {
    Json(json!({ "error": "Malformed request parameters" }))
}

#[catch(500)]
fn server_error() -> Json<Value> {
    Json(json!({ "error": "An unexpected server error occurred" }))
}

#[cfg(test)]
mod tests {
    use rocket::{http::Status, local::asynchronous::Client};

    use super::*;

    #[backend_test]
    async fn unknown_route_is_json_404(client: Client) {
        let response = client.get("/no/such/page").dispatch().await;

        assert_eq!(Status::NotFound, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("/no/such/page"));
    }
}
