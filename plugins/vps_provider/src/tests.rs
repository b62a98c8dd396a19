use std::collections::BTreeMap;

use chrono::Utc;
use portal_core::orders::OrderStatus;
use portal_core::storage::models::{Order, Service};

use super::*;

fn request(config: &[(&str, &str)]) -> DeploymentRequest {
    DeploymentRequest {
        order: Order {
            id: 12,
            user: 1,
            service: 3,
            provider: 1,
            status: OrderStatus::Deploying,
            days_left: 30,
            deleted: false,
            date: Utc::now(),
        },
        service: Service {
            id: 3,
            uri: "vps-small".to_string(),
            name: "Small VPS".to_string(),
            category: 1,
            provider: 1,
            period_days: 30,
            deleted: false,
        },
        config: config
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>(),
    }
}

#[test]
fn test_requirements() {
    let requirements = VpsProvider.order_requirements();

    assert_eq!(requirements.required().collect::<Vec<_>>(), vec![SERVER_NAME_FIELD]);
    assert_eq!(
        requirements.get(SERVER_NAME_FIELD).and_then(|f| f.placeholder.as_deref()),
        Some("web-01")
    );
    assert_eq!(requirements.get(ROOT_PASSWORD_FIELD).map(|f| f.field_type), Some(FieldType::Password));
}

#[test]
fn test_plugin_exposes_provider() {
    let plugin = factory();
    assert_eq!(plugin.identifier(), IDENTIFIER);
    assert!(plugin.provider().is_some());
}

#[tokio::test]
async fn test_deploy_returns_reference() {
    let receipt = VpsProvider
        .deploy(&request(&[(SERVER_NAME_FIELD, " web-01 "), (ROOT_PASSWORD_FIELD, "pw")]))
        .await
        .unwrap();

    assert_eq!(receipt.reference.as_deref(), Some("vps-12-web-01"));
    assert_eq!(receipt.message, "server vps-12-web-01 provisioned");
}

#[tokio::test]
async fn test_deploy_rejects_bad_server_names() {
    for config in [vec![], vec![(SERVER_NAME_FIELD, "  ")], vec![(SERVER_NAME_FIELD, "bad name")], vec![(SERVER_NAME_FIELD, "-edge")]] {
        let result = VpsProvider.deploy(&request(&config)).await;
        assert!(matches!(result, Err(DeployError::Rejected(_))), "{:?} should be rejected", config);
    }
}
