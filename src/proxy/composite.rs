//! Sequential multi-step operations.
//!
//! Steps run strictly in order over the same shared session. Each step's
//! request is built from the results gathered so far. The first failing step
//! aborts the whole operation; partial results are never returned.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::error::GatewayError;
use crate::proxy::forwarder::Forward;
use crate::proxy::request::ProxyRequest;

type StepBuilder = Box<dyn Fn(&CompositeResult) -> Result<ProxyRequest, GatewayError> + Send + Sync>;

/// Step results in execution order, keyed by step name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositeResult {
    entries: Vec<(String, Value)>,
}

impl CompositeResult {
    pub fn get(&self, step: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == step)
            .map(|(_, value)| value)
    }

    pub fn steps(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, step: String, value: Value) {
        self.entries.push((step, value));
    }
}

impl Serialize for CompositeResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[derive(Default)]
pub struct Composite {
    steps: Vec<(String, StepBuilder)>,
}

impl Composite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step<F>(mut self, name: impl Into<String>, build: F) -> Self
    where
        F: Fn(&CompositeResult) -> Result<ProxyRequest, GatewayError> + Send + Sync + 'static,
    {
        self.steps.push((name.into(), Box::new(build)));
        self
    }

    pub async fn run<F>(&self, forwarder: &F) -> Result<CompositeResult, GatewayError>
    where
        F: Forward + ?Sized,
    {
        let mut results = CompositeResult::default();

        for (name, build) in &self.steps {
            let failed = |status: Option<u16>, reason: String| {
                tracing::error!(step = %name, status = ?status, reason = %reason, "Composite step failed");
                GatewayError::CompositeStepFailed {
                    step: name.clone(),
                    status,
                    reason,
                }
            };

            let request = build(&results).map_err(|e| failed(None, e.to_string()))?;
            let response = forwarder
                .forward(&request)
                .await
                .map_err(|e| failed(None, e.to_string()))?;

            if !response.is_success() {
                return Err(failed(
                    Some(response.status.as_u16()),
                    format!("upstream answered {}", response.status),
                ));
            }

            let value = response
                .json()
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&response.body).into_owned()));
            tracing::debug!(step = %name, "Composite step completed");
            results.push(name.clone(), value);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::upstream::UpstreamResponse;

    /// Answers by path and records every call.
    struct ScriptedForwarder {
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedForwarder {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Forward for ScriptedForwarder {
        async fn forward(&self, request: &ProxyRequest) -> Result<UpstreamResponse, GatewayError> {
            self.calls.lock().unwrap().push(request.path.clone());
            match request.path.as_str() {
                "Orders" => Ok(UpstreamResponse::new(StatusCode::CREATED, r#"{"DocEntry":7,"CardCode":"C001"}"#)),
                "BusinessPartners('C001')" => Ok(UpstreamResponse::new(StatusCode::OK, r#"{"CardName":"Acme"}"#)),
                _ => Ok(UpstreamResponse::new(StatusCode::NOT_FOUND, r#"{"error":"missing"}"#)),
            }
        }
    }

    fn order_then_partner() -> Composite {
        Composite::new()
            .step("order", |_| ProxyRequest::post_json("Orders", &json!({ "CardCode": "C001" })))
            .step("partner", |done| {
                let code = done
                    .get("order")
                    .and_then(|v| v["CardCode"].as_str())
                    .unwrap_or_default()
                    .to_string();
                ProxyRequest::get(format!("BusinessPartners('{}')", code))
            })
    }

    #[tokio::test]
    async fn test_steps_run_in_order_and_feed_each_other() {
        let forwarder = ScriptedForwarder::new();
        let result = order_then_partner().run(&forwarder).await.unwrap();

        assert_eq!(forwarder.calls(), vec!["Orders", "BusinessPartners('C001')"]);
        assert_eq!(result.steps().collect::<Vec<_>>(), vec!["order", "partner"]);
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "order": { "DocEntry": 7, "CardCode": "C001" },
                "partner": { "CardName": "Acme" }
            })
        );
    }

    #[tokio::test]
    async fn test_failing_step_aborts_without_partial_result() {
        let forwarder = ScriptedForwarder::new();
        let composite = Composite::new()
            .step("order", |_| ProxyRequest::post_json("Orders", &json!({})))
            .step("missing", |_| ProxyRequest::get("Nowhere"))
            .step("never", |_| ProxyRequest::get("Orders"));

        let err = composite.run(&forwarder).await.unwrap_err();

        match err {
            GatewayError::CompositeStepFailed { step, status, .. } => {
                assert_eq!(step, "missing");
                assert_eq!(status, Some(404));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(forwarder.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_step_builder_error_names_the_step() {
        let forwarder = ScriptedForwarder::new();
        let composite = Composite::new().step("blank", |_| ProxyRequest::get(""));

        let err = composite.run(&forwarder).await.unwrap_err();
        assert!(matches!(err, GatewayError::CompositeStepFailed { ref step, status: None, .. } if step == "blank"));
        assert!(forwarder.calls().is_empty());
    }
}
