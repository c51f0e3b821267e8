// Request extractors that reject with the API's JSON error body

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Typed URL path segments
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);

/// Typed query string
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::wallet::DepositRequest;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::IntoResponse;

    fn json_request(body: &'static str) -> Request<Body> {
        Request::post("/api/wallet/deposit")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let result = JsonBody::<DepositRequest>::from_request(json_request("{\"amount\":"), &()).await;
        let err = result.err().unwrap();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "JSON malformado");
    }

    #[tokio::test]
    async fn test_wrong_field_type_is_bad_request_not_unprocessable() {
        let result =
            JsonBody::<DepositRequest>::from_request(json_request("{\"amount\":\"muito\"}"), &())
                .await;
        let response = result.err().unwrap().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_content_type_is_bad_request() {
        let request = Request::post("/api/wallet/deposit")
            .body(Body::from("{\"amount\": 10}"))
            .unwrap();
        let result = JsonBody::<DepositRequest>::from_request(request, &()).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_valid_body_passes_through() {
        let JsonBody(body) =
            JsonBody::<DepositRequest>::from_request(json_request("{\"amount\": 25.5}"), &())
                .await
                .unwrap();
        assert_eq!(body.amount, rust_decimal::Decimal::new(255, 1));
    }
}
