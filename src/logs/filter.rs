//! Pure views over the merged log sequence

use crate::types::{LogEntry, LogLevel};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogFilter {
    pub scope_id: Option<String>,
    pub min_level: Option<LogLevel>,
    pub text: Option<String>,
}

impl LogFilter {
    pub fn scope(scope_id: impl Into<String>) -> Self {
        Self {
            scope_id: Some(scope_id.into()),
            ..Default::default()
        }
    }

    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = Some(level);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(scope) = &self.scope_id {
            if entry.scope_id.as_deref() != Some(scope.as_str()) {
                return false;
            }
        }
        if let Some(level) = self.min_level {
            if entry.level < level {
                return false;
            }
        }
        if let Some(needle) = &self.text {
            let needle = needle.to_lowercase();
            if !entry.message.to_lowercase().contains(&needle)
                && !entry.category.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(scope: Option<&str>, level: LogLevel, category: &str, message: &str) -> LogEntry {
        LogEntry {
            timestamp: Utc::now(),
            level,
            scope_id: scope.map(str::to_string),
            category: category.to_string(),
            message: message.to_string(),
            payload: None,
        }
    }

    #[test]
    fn combines_scope_level_and_text() {
        let filter = LogFilter::scope("bot-1")
            .with_min_level(LogLevel::Warning)
            .with_text("Reserves");

        assert!(filter.matches(&entry(Some("bot-1"), LogLevel::Error, "pool", "reserves stale")));
        assert!(!filter.matches(&entry(Some("bot-2"), LogLevel::Error, "pool", "reserves stale")));
        assert!(!filter.matches(&entry(Some("bot-1"), LogLevel::Info, "pool", "reserves stale")));
        assert!(!filter.matches(&entry(Some("bot-1"), LogLevel::Error, "trade", "filled")));
        assert!(!filter.matches(&entry(None, LogLevel::Error, "pool", "reserves stale")));
    }

    #[test]
    fn text_matches_category_too() {
        let filter = LogFilter::default().with_text("arb");
        assert!(filter.matches(&entry(None, LogLevel::Debug, "arbitrage", "scan done")));
    }
}
