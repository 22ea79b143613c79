//! The deterministic merchant-rule table.

/// One merchant rule: a substring pattern mapped to a category slug with a
/// fixed confidence.
#[derive(Debug, Clone, Copy)]
pub struct MerchantRule {
    /// Lowercase substring to look for in the merchant name.
    pub pattern: &'static str,
    /// Target category slug.
    pub slug: &'static str,
    /// Confidence assigned when this rule wins.
    pub confidence: f64,
}

const fn rule(pattern: &'static str, slug: &'static str, confidence: f64) -> MerchantRule {
    MerchantRule {
        pattern,
        slug,
        confidence,
    }
}

/// Rule-based categorization for known merchants.
///
/// Declaration order is priority: the first matching pattern wins, not the
/// longest or most specific one.
pub const MERCHANT_RULES: &[MerchantRule] = &[
    rule("starbucks", "coffee", 0.95),
    rule("tim hortons", "coffee", 0.95),
    rule("dunkin", "coffee", 0.95),
    rule("mcdonalds", "dining", 0.95),
    rule("burger king", "dining", 0.95),
    rule("subway", "dining", 0.95),
    rule("burrito", "dining", 0.90),
    rule("taco", "dining", 0.90),
    rule("pizza", "dining", 0.90),
    rule("safeway", "groceries", 0.95),
    rule("walmart", "shopping", 0.80),
    rule("costco", "groceries", 0.85),
    rule("save-on", "groceries", 0.95),
    rule("whole foods", "groceries", 0.95),
    rule("uber", "transportation", 0.90),
    rule("lyft", "transportation", 0.95),
    rule("shell", "transportation", 0.90),
    rule("chevron", "transportation", 0.90),
    rule("amazon", "shopping", 0.75),
];

/// Tests the rule table against a merchant name.
///
/// Case-insensitive substring containment, first declared match wins.
#[must_use]
pub fn match_merchant_rule(merchant_name: &str) -> Option<&'static MerchantRule> {
    let lowered = merchant_name.to_lowercase();
    MERCHANT_RULES
        .iter()
        .find(|rule| lowered.contains(rule.pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_merchant_matches() {
        let rule = match_merchant_rule("Starbucks #4821").unwrap();
        assert_eq!(rule.slug, "coffee");
        assert!(rule.confidence > 0.9);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        assert!(match_merchant_rule("WHOLE FOODS MARKET").is_some());
        assert!(match_merchant_rule("whole foods market").is_some());
    }

    #[test]
    fn test_declaration_order_wins_over_specificity() {
        // "taco" is declared before "pizza"; a merchant containing both
        // resolves to the earlier pattern, regardless of length or position.
        let rule = match_merchant_rule("Pizza & Taco Palace").unwrap();
        assert_eq!(rule.pattern, "taco");
        assert_eq!(rule.slug, "dining");
    }

    #[test]
    fn test_uber_eats_is_transportation() {
        // Quirk of the table: "uber" matches before any food pattern could.
        let rule = match_merchant_rule("Uber Eats").unwrap();
        assert_eq!(rule.slug, "transportation");
    }

    #[test]
    fn test_unknown_merchant_has_no_match() {
        assert!(match_merchant_rule("Joe's Hardware Emporium").is_none());
    }
}
