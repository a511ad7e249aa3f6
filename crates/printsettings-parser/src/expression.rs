//! Operand extraction from `enabled` expressions.
//!
//! This is not a boolean parser. `and` and `or` are treated as the same plain
//! separator, one leading `not ` is stripped from each operand and nothing is
//! evaluated. Operands are returned verbatim otherwise, so a comparison such as
//! `adhesion_type == 'brim'` comes back whole and simply fails to resolve to a
//! setting later on. Parentheses are not understood either.

const SEPARATORS: [&str; 2] = [" and ", " or "];
const NEGATION: &str = "not ";
const HARD_DISABLE_MARKER: &str = "False";

/// Split an expression into operand names.
///
/// `"a and not b"` gives `["a", "b"]`, `"a or b"` gives `["a", "b"]`.
/// Always yields at least one (possibly empty) operand.
pub fn extract_operands(expression: &str) -> Vec<String> {
    let mut operands = vec![expression];
    for separator in SEPARATORS {
        operands = operands
            .into_iter()
            .flat_map(|part| part.split(separator))
            .collect();
    }

    operands
        .into_iter()
        .map(|operand| operand.strip_prefix(NEGATION).unwrap_or(operand).to_string())
        .collect()
}

/// True when the expression mentions `False` anywhere, which marks settings
/// their plugin switched off outright. Literal substring match on purpose.
pub fn is_hard_disabled(expression: &str) -> bool {
    expression.contains(HARD_DISABLE_MARKER)
}

/// Requirement keys for an `enabled` expression, or `None` when it is hard
/// disabled and contributes no relation.
pub fn requirement_keys(expression: &str) -> Option<Vec<String>> {
    if is_hard_disabled(expression) {
        None
    } else {
        Some(extract_operands(expression))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negation_is_stripped_on_both_sides() {
        assert_eq!(extract_operands("a and not b"), vec!["a", "b"]);
        assert_eq!(extract_operands("not a and b"), vec!["a", "b"]);
        assert_eq!(extract_operands("a or b"), vec!["a", "b"]);
    }

    #[test]
    fn mixed_separators_split_alike() {
        assert_eq!(
            extract_operands("support_enable or not adhesion_enable and prime_tower_enable"),
            vec!["support_enable", "adhesion_enable", "prime_tower_enable"]
        );
    }

    #[test]
    fn only_one_negation_is_removed() {
        assert_eq!(extract_operands("not not a"), vec!["not a"]);
    }

    #[test]
    fn single_operand_and_empty_expression() {
        assert_eq!(extract_operands("retraction_enable"), vec!["retraction_enable"]);
        assert_eq!(extract_operands(""), vec![""]);
    }

    #[test]
    fn separators_need_surrounding_spaces() {
        assert_eq!(extract_operands("brand_new_setting"), vec!["brand_new_setting"]);
        assert_eq!(extract_operands("notable or x"), vec!["notable", "x"]);
    }

    #[test]
    fn false_anywhere_disables_the_pair() {
        assert_eq!(requirement_keys("False"), None);
        assert_eq!(requirement_keys("a and False"), None);
        assert_eq!(requirement_keys("not a or b == False"), None);
        assert_eq!(requirement_keys("a and b"), Some(vec!["a".into(), "b".into()]));
        // lower-case false is not the marker
        assert_eq!(requirement_keys("false"), Some(vec!["false".into()]));
    }
}
