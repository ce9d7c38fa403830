pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::nesting::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/pack", post(handlers::handle_pack))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use xmltree::{Element, XMLNode};

    use super::*;
    use crate::config::Config;
    use crate::nesting::shelf::ShelfOracle;

    fn test_router() -> Router {
        build_router(AppState {
            config: Config::default(),
            oracle: Arc::new(ShelfOracle),
        })
    }

    async fn post_pack(body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/pack")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = test_router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn element_count(svg: &str) -> usize {
        Element::parse(svg.as_bytes())
            .unwrap()
            .children
            .iter()
            .filter(|n| matches!(n, XMLNode::Element(_)))
            .count()
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["oracle"], "shelf");
    }

    #[tokio::test]
    async fn test_two_documents_nest_onto_one_sheet() {
        let shape1 = r#"<svg><rect height="100" width="100" /></svg>"#;
        let shape2 = r#"<svg>
            <rect height="100" width="100" />
            <rect height="100" width="100" />
        </svg>"#;

        let (status, body) = post_pack(json!({
            "height": 40,
            "width": 60,
            "shapes": [shape1, shape2]
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        let sheets = body.as_array().unwrap();
        assert_eq!(sheets.len(), 1);

        let sheet = sheets[0].as_str().unwrap();
        assert_eq!(element_count(sheet), 3);

        let root = Element::parse(sheet.as_bytes()).unwrap();
        assert_eq!(root.attributes.get("viewBox").unwrap(), "0 0 5760 3840");
    }

    #[tokio::test]
    async fn test_overflow_spreads_across_sheets() {
        let shapes = r#"<svg>
            <rect width="150" height="150" />
            <rect width="150" height="150" />
            <rect width="150" height="150" />
        </svg>"#;

        let (status, body) = post_pack(json!({
            "height": 2,
            "width": 2,
            "dpi": 100,
            "shapes": [shapes]
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        let sheets = body.as_array().unwrap();
        assert_eq!(sheets.len(), 3);
        let total: usize = sheets
            .iter()
            .map(|s| element_count(s.as_str().unwrap()))
            .sum();
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn test_sheet_too_small_is_no_shape_fits() {
        let (status, body) = post_pack(json!({
            "height": 1,
            "width": 1,
            "dpi": 1,
            "shapes": [r#"<svg><rect width="100" height="100"/></svg>"#]
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "NO_SHAPE_FITS");
    }

    #[tokio::test]
    async fn test_oversized_shape_is_one_shape_too_big() {
        let (status, body) = post_pack(json!({
            "height": 100,
            "width": 100,
            "dpi": 1,
            "shapes": [r#"<svg><rect width="50" height="50"/><rect width="500" height="500"/></svg>"#]
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "ONE_SHAPE_TOO_BIG");
    }

    #[tokio::test]
    async fn test_empty_shapes_rejected() {
        let (status, body) = post_pack(json!({
            "height": 1,
            "width": 1,
            "shapes": []
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_missing_field_is_validation_error() {
        let (status, body) = post_pack(json!({
            "width": 10,
            "shapes": [r#"<svg><rect width="1" height="1"/></svg>"#]
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_wrongly_typed_fields_are_validation_errors() {
        for body in [
            json!({ "height": "tall", "width": 10, "shapes": ["<svg/>"] }),
            json!({ "height": 1, "width": 1, "rotation_count": -4, "shapes": ["<svg/>"] }),
        ] {
            let (status, body) = post_pack(body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn test_body_that_is_not_json_is_validation_error() {
        let request = Request::builder()
            .method("POST")
            .uri("/pack")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_oversized_sheet_is_validation_error() {
        let (status, body) = post_pack(json!({
            "height": 1e300,
            "width": 1,
            "dpi": 1e10,
            "shapes": [r#"<svg><rect width="1" height="1"/></svg>"#]
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_non_positive_size_rejected() {
        let (status, body) = post_pack(json!({
            "height": 0,
            "width": 10,
            "shapes": [r#"<svg><rect width="1" height="1"/></svg>"#]
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unreadable_shape_is_malformed_input() {
        let (status, body) = post_pack(json!({
            "height": 10,
            "width": 10,
            "shapes": ["<svg><rect></svg>"]
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "MALFORMED_INPUT");
    }

    #[tokio::test]
    async fn test_documents_without_shapes_return_no_sheets() {
        let (status, body) = post_pack(json!({
            "height": 10,
            "width": 10,
            "shapes": ["<svg></svg>"]
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }
}
