use crate::domain::port::Logger;
use std::collections::HashMap;
use uuid::Uuid;

/// tracing によるログ実装
/// コンポーネント・相関IDを構造化フィールドとして出力する
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// 追加コンテキストをキー順の "k=v, k=v" 形式にする
fn format_context(context: Option<HashMap<String, String>>) -> String {
    let Some(context) = context else {
        return String::new();
    };
    let mut pairs: Vec<(String, String)> = context.into_iter().collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_correlation_id(correlation_id: Option<Uuid>) -> String {
    correlation_id.map(|id| id.to_string()).unwrap_or_default()
}

impl Logger for TracingLogger {
    fn debug(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    ) {
        tracing::debug!(
            component,
            correlation_id = %format_correlation_id(correlation_id),
            context = %format_context(context),
            "{}",
            message
        );
    }

    fn info(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    ) {
        tracing::info!(
            component,
            correlation_id = %format_correlation_id(correlation_id),
            context = %format_context(context),
            "{}",
            message
        );
    }

    fn warn(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    ) {
        tracing::warn!(
            component,
            correlation_id = %format_correlation_id(correlation_id),
            context = %format_context(context),
            "{}",
            message
        );
    }

    fn error(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    ) {
        tracing::error!(
            component,
            correlation_id = %format_correlation_id(correlation_id),
            context = %format_context(context),
            "{}",
            message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_context_is_sorted_by_key() {
        let mut context = HashMap::new();
        context.insert("seats".to_string(), "A1,A2".to_string());
        context.insert("date".to_string(), "2020-02-15 20:00:00".to_string());
        context.insert("booking_id".to_string(), "b-1".to_string());

        assert_eq!(
            format_context(Some(context)),
            "booking_id=b-1, date=2020-02-15 20:00:00, seats=A1,A2"
        );
        assert_eq!(format_context(None), "");
    }

    #[test]
    fn test_logging_without_subscriber_does_not_panic() {
        let logger = TracingLogger::new();
        logger.info("Test", "message", Some(Uuid::new_v4()), None);
        logger.error("Test", "message", None, Some(HashMap::new()));
    }
}
