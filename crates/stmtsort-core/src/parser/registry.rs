//! Ordered parser registry with format auto-detection.

use tracing::{debug, trace};

use super::{
    AibCreditParser, AibDebitParser, ParseOutcome, ParseSettings, RevolutDebitParser,
    StatementParser,
};
use crate::pdf::StatementText;

/// Parsers in a fixed priority order.
///
/// Formats can share table layouts, so the first parser whose format check
/// passes wins. Order is exactly registration order.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn StatementParser>>,
}

impl ParserRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// The built-in parsers, highest priority first:
    /// `AIB-debit`, `AIB-credit`, `Revolut-debit-EUR`.
    pub fn with_default_parsers() -> Self {
        Self::new()
            .register(AibDebitParser::new())
            .register(AibCreditParser::new())
            .register(RevolutDebitParser::new())
    }

    /// Append a parser with the lowest priority so far.
    pub fn register(mut self, parser: impl StatementParser + 'static) -> Self {
        self.parsers.push(Box::new(parser));
        self
    }

    /// Parser names in priority order.
    pub fn names(&self) -> Vec<&'static str> {
        self.parsers.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// First parser whose format check accepts the statement.
    pub fn select(&self, text: &StatementText) -> Option<&dyn StatementParser> {
        self.parsers
            .iter()
            .map(|p| p.as_ref())
            .find(|p| p.matches(text))
    }

    /// Parse with the first matching parser.
    ///
    /// Returns the parser's name and its outcome, or `None` when no parser
    /// recognizes the format.
    pub fn parse(
        &self,
        text: &StatementText,
        settings: &ParseSettings,
    ) -> Option<(&'static str, ParseOutcome)> {
        for parser in &self.parsers {
            match parser.parse(text, settings) {
                ParseOutcome::NotThisFormat => {
                    trace!("{} does not recognize the format", parser.name());
                }
                outcome => {
                    debug!("Format recognized by {}", parser.name());
                    return Some((parser.name(), outcome));
                }
            }
        }
        None
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_default_parsers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::statement::ScanStats;

    struct Always(&'static str);

    impl StatementParser for Always {
        fn name(&self) -> &'static str {
            self.0
        }

        fn matches(&self, _text: &StatementText) -> bool {
            true
        }

        fn extract(&self, _text: &StatementText, _settings: &ParseSettings) -> ParseOutcome {
            ParseOutcome::Unparseable {
                diagnostic: self.0.to_string(),
                stats: ScanStats::default(),
            }
        }
    }

    #[test]
    fn test_default_order() {
        assert_eq!(
            ParserRegistry::with_default_parsers().names(),
            vec!["AIB-debit", "AIB-credit", "Revolut-debit-EUR"]
        );
    }

    #[test]
    fn test_debit_statement_selects_debit_parser() {
        let registry = ParserRegistry::with_default_parsers();
        let text = StatementText::from_text(
            "Statement of Account\nPersonal Bank Account\nDate of Statement\n01/03/2023 SHOP 1.00\n",
        );
        assert_eq!(registry.select(&text).map(|p| p.name()), Some("AIB-debit"));

        let (name, outcome) = registry.parse(&text, &ParseSettings::default()).unwrap();
        assert_eq!(name, "AIB-debit");
        assert!(matches!(outcome, ParseOutcome::Parsed { .. }));
    }

    #[test]
    fn test_credit_statement_selects_credit_parser() {
        let registry = ParserRegistry::with_default_parsers();
        let text = StatementText::from_text("Account Statement - 1st May, 2024\nCredit Limit\n");
        assert_eq!(registry.select(&text).map(|p| p.name()), Some("AIB-credit"));
    }

    #[test]
    fn test_unknown_format_is_none() {
        let registry = ParserRegistry::with_default_parsers();
        let text = StatementText::from_text("Some other bank\n01/01/2024 THING 1.00");
        assert!(registry.select(&text).is_none());
        assert!(registry.parse(&text, &ParseSettings::default()).is_none());
    }

    #[test]
    fn test_first_registered_wins() {
        let registry = ParserRegistry::new().register(Always("first")).register(Always("second"));
        let (name, _) = registry
            .parse(&StatementText::from_text("anything"), &ParseSettings::default())
            .unwrap();
        assert_eq!(name, "first");
    }

    #[test]
    fn test_registered_parser_is_lowest_priority() {
        let registry = ParserRegistry::with_default_parsers().register(Always("fallback"));
        assert_eq!(registry.len(), 4);

        let debit = StatementText::from_text(
            "Statement of Account\nPersonal Bank Account\nDate of Statement\n",
        );
        assert_eq!(registry.select(&debit).map(|p| p.name()), Some("AIB-debit"));
        assert_eq!(
            registry.select(&StatementText::from_text("unknown")).map(|p| p.name()),
            Some("fallback")
        );
    }
}
