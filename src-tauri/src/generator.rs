use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::models::{GeneratedQuery, QueryResult};

#[async_trait]
pub trait QueryGenerator: Send + Sync {
    async fn generate(&self, question: &str) -> AppResult<GeneratedQuery>;
}

/// Answers every question with the same templated query and two fixed rows.
pub struct MockGenerator {
    delay: Duration,
}

impl MockGenerator {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    fn sample_result() -> QueryResult {
        QueryResult {
            columns: vec!["id".into(), "name".into(), "last_login".into()],
            rows: vec![
                vec![json!(1), json!("Alice"), json!("2023-03-15")],
                vec![json!(2), json!("Bob"), json!("2023-02-20")],
            ],
        }
    }
}

#[async_trait]
impl QueryGenerator for MockGenerator {
    async fn generate(&self, question: &str) -> AppResult<GeneratedQuery> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::validation("Please enter a question"));
        }

        tokio::time::sleep(self.delay).await;

        Ok(GeneratedQuery {
            sql: format!(
                "SELECT * FROM users WHERE name LIKE '%{}%'",
                question.replace('\'', "''")
            ),
            result: Self::sample_result(),
        })
    }
}

fn keyword_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)\b(FROM|WHERE|SELECT|AND|OR|ORDER BY|GROUP BY|LIMIT|INSERT INTO|VALUES|UPDATE|SET|DELETE)\b",
        )
        .unwrap_or_else(|e| unreachable!("keyword pattern is valid: {e}"))
    })
}

/// Breaks a query onto one line per clause and one line per list item.
pub fn format_sql(sql: &str) -> String {
    keyword_pattern()
        .replace_all(sql, "\n$1")
        .replace(',', ",\n")
}
