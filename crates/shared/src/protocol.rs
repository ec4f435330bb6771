use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

/// One retrieved passage. Order within a response is the backend's ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub content: String,
    pub url: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl HealthResponse {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_backend_response_preserving_result_order() {
        let body = r#"{
            "answer": "Cosense is a wiki.",
            "results": [
                {"title": "B", "content": "second", "url": "https://b", "score": 0.2},
                {"title": "A", "content": "first", "url": "https://a", "score": 0.9}
            ]
        }"#;

        let response: QueryResponse = serde_json::from_str(body).expect("decode");
        let titles: Vec<&str> = response.results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A"]);
    }

    #[test]
    fn rejects_response_missing_results() {
        let err = serde_json::from_str::<QueryResponse>(r#"{"answer": "x"}"#)
            .expect_err("results are required");
        assert!(err.to_string().contains("results"));
    }

    #[test]
    fn health_response_tolerates_missing_model() {
        let health: HealthResponse = serde_json::from_str(r#"{"status": "ok"}"#).expect("decode");
        assert!(health.is_ok());
        assert_eq!(health.model, None);
    }
}
