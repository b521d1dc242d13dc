//! Condition rule codec.
//!
//! # Grammar
//! ```text
//! rule    := clause ( '&' clause )*
//! clause  := key ( ( '=' | '!=' ) values )+
//! values  := value ( ',' value )*
//! ```
//!
//! `=` feeds the clause's `matches` set, `!=` its `unmatches` set. Clauses
//! that repeat a key accumulate into the same `MatchPair`. Whitespace between
//! tokens is ignored and values are form-url-decoded.
//!
//! # Design Decisions
//! - Hand-written scanner: separators are runs of `& ! = ,`, everything else
//!   up to whitespace or a separator is content
//! - Encoding escapes a value only when it would collide with the grammar,
//!   so plain addresses stay readable in stored rules

use std::collections::BTreeMap;
use thiserror::Error;
use url::form_urlencoded;

use super::MatchPair;

/// Clause key → match/unmatch sets, ordered by key.
pub type Condition = BTreeMap<String, MatchPair>;

/// A condition rule string that violates the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal condition rule \"{rule}\": {kind} at index {index}")]
pub struct ParseError {
    /// The full rule that failed to parse.
    pub rule: String,
    /// Byte offset of the offending token.
    pub index: usize,
    pub kind: ParseErrorKind,
}

/// What exactly went wrong while decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("operator '{0}' is not preceded by a clause key")]
    MissingKey(String),

    #[error("clause key '{0}' has no operator")]
    MissingOperator(String),

    #[error("operator '{0}' is not followed by a value")]
    MissingValue(String),

    #[error("',' does not follow a value")]
    DanglingComma,

    #[error("'{0}' is not separated from the previous clause by '&'")]
    MissingSeparator(String),
}

#[derive(Debug)]
struct Token<'a> {
    index: usize,
    separator: &'a str,
    content: Option<&'a str>,
}

fn is_separator(c: char) -> bool {
    matches!(c, '&' | '!' | '=' | ',')
}

fn tokenize(rule: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut chars = rule.char_indices().peekable();

    loop {
        while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
        let Some(&(start, _)) = chars.peek() else {
            break;
        };

        let mut sep_end = start;
        while let Some((i, c)) = chars.next_if(|(_, c)| is_separator(*c)) {
            sep_end = i + c.len_utf8();
        }
        while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}

        let content = match chars.peek() {
            Some(&(content_start, _)) => {
                let mut content_end = content_start;
                while let Some((i, c)) =
                    chars.next_if(|(_, c)| !is_separator(*c) && !c.is_whitespace())
                {
                    content_end = i + c.len_utf8();
                }
                (content_end > content_start).then(|| &rule[content_start..content_end])
            }
            None => None,
        };

        tokens.push(Token {
            index: start,
            separator: &rule[start..sep_end],
            content,
        });
    }

    tokens
}

fn decode_value(raw: &str) -> String {
    // Raw values never contain '&' or '=', so the parser yields a single key.
    form_urlencoded::parse(raw.as_bytes())
        .next()
        .map(|(value, _)| value.into_owned())
        .unwrap_or_else(|| raw.to_string())
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Matches,
    Unmatches,
}

fn side_mut(pair: &mut MatchPair, side: Side) -> &mut std::collections::BTreeSet<String> {
    match side {
        Side::Matches => &mut pair.matches,
        Side::Unmatches => &mut pair.unmatches,
    }
}

/// Parse a condition rule into its clause map.
///
/// A blank rule decodes to an empty map.
pub fn decode(rule: &str) -> Result<Condition, ParseError> {
    let mut condition = Condition::new();

    let mut key: Option<&str> = None;
    let mut has_operator = false;
    let mut side: Option<Side> = None;

    for token in tokenize(rule) {
        let fail = |kind| ParseError {
            rule: rule.to_string(),
            index: token.index,
            kind,
        };

        match token.separator {
            "" | "&" => {
                if token.separator.is_empty() && key.is_some() {
                    let content = token.content.unwrap_or_default();
                    return Err(fail(ParseErrorKind::MissingSeparator(content.to_string())));
                }
                if let Some(previous) = key {
                    if !has_operator {
                        return Err(fail(ParseErrorKind::MissingOperator(previous.to_string())));
                    }
                }
                let content = token
                    .content
                    .ok_or_else(|| fail(ParseErrorKind::MissingValue("&".to_string())))?;
                key = Some(content);
                has_operator = false;
                side = None;
            }
            op @ ("=" | "!=") => {
                let current = key.ok_or_else(|| fail(ParseErrorKind::MissingKey(op.to_string())))?;
                let content = token
                    .content
                    .ok_or_else(|| fail(ParseErrorKind::MissingValue(op.to_string())))?;
                let target = if op == "=" { Side::Matches } else { Side::Unmatches };
                let pair = condition.entry(current.to_string()).or_default();
                side_mut(pair, target).insert(decode_value(content));
                has_operator = true;
                side = Some(target);
            }
            "," => {
                let content = token
                    .content
                    .ok_or_else(|| fail(ParseErrorKind::MissingValue(",".to_string())))?;
                let (Some(current), Some(target)) = (key, side) else {
                    return Err(fail(ParseErrorKind::DanglingComma));
                };
                let pair = condition.entry(current.to_string()).or_default();
                side_mut(pair, target).insert(decode_value(content));
            }
            other => return Err(fail(ParseErrorKind::UnknownOperator(other.to_string()))),
        }
    }

    if let (Some(last), false) = (key, has_operator) {
        return Err(ParseError {
            rule: rule.to_string(),
            index: rule.len(),
            kind: ParseErrorKind::MissingOperator(last.to_string()),
        });
    }

    Ok(condition)
}

fn needs_escape(c: char) -> bool {
    is_separator(c) || matches!(c, '%' | '+') || c.is_whitespace()
}

fn push_value(out: &mut String, value: &str) {
    if value.chars().any(needs_escape) {
        out.extend(form_urlencoded::byte_serialize(value.as_bytes()));
    } else {
        out.push_str(value);
    }
}

/// Append the textual form of `condition` to `out`.
///
/// Emits `key=v1,v2` then `&key!=v3` per key; empty sets and keys whose
/// sets are both empty are omitted entirely. Empty values have no textual
/// form that `decode` accepts, so they are dropped.
pub fn encode(condition: &Condition, out: &mut String) {
    let mut first = true;
    for (key, pair) in condition {
        for (operator, values) in [("=", &pair.matches), ("!=", &pair.unmatches)] {
            let mut values = values.iter().filter(|v| !v.is_empty()).peekable();
            if values.peek().is_none() {
                continue;
            }
            if !first {
                out.push('&');
            }
            first = false;

            out.push_str(key);
            out.push_str(operator);
            for (i, value) in values.enumerate() {
                if i > 0 {
                    out.push(',');
                }
                push_value(out, value);
            }
        }
    }
}

/// Encode into a fresh string.
pub fn to_rule_string(condition: &Condition) -> String {
    let mut out = String::new();
    encode(condition, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn pair(matches: &[&str], unmatches: &[&str]) -> MatchPair {
        MatchPair::new(set(matches), set(unmatches))
    }

    #[test]
    fn test_decode_blank_is_empty() {
        assert!(decode("").unwrap().is_empty());
        assert!(decode("   \t ").unwrap().is_empty());
    }

    #[test]
    fn test_decode_match_and_unmatch() {
        let condition = decode("consumer.host = 10.0.0.1,10.0.0.2 & consumer.host != 10.0.0.9").unwrap();
        assert_eq!(condition.len(), 1);
        assert_eq!(
            condition["consumer.host"],
            pair(&["10.0.0.1", "10.0.0.2"], &["10.0.0.9"])
        );
    }

    #[test]
    fn test_decode_accumulates_repeated_keys() {
        let condition = decode("host=a&method=get&host=b&host!=c").unwrap();
        assert_eq!(condition["host"], pair(&["a", "b"], &["c"]));
        assert_eq!(condition["method"], pair(&["get"], &[]));
    }

    #[test]
    fn test_decode_operators_chain_on_one_key() {
        // Dubbo-style rules may put both operators on one clause.
        let condition = decode("host = a,b != c").unwrap();
        assert_eq!(condition["host"], pair(&["a", "b"], &["c"]));
    }

    #[test]
    fn test_decode_url_decodes_values() {
        let condition = decode("tag=a%2Cb,c%26d").unwrap();
        assert_eq!(condition["tag"], pair(&["a,b", "c&d"], &[]));
    }

    #[test]
    fn test_decode_errors() {
        let err = decode("= 10.0.0.1").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingKey("=".into()));
        assert_eq!(err.index, 0);

        let err = decode("consumer.host").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingOperator("consumer.host".into()));

        let err = decode("a & b = 1").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingOperator("a".into()));

        let err = decode("a = ").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingValue("=".into()));

        let err = decode("a = 1,").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingValue(",".into()));

        let err = decode("a , 1").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::DanglingComma);

        let err = decode("a == 1").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownOperator("==".into()));

        let err = decode("a = 1 b = 2").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingSeparator("b".into()));

        let err = decode("a = 1 &").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingValue("&".into()));
    }

    #[test]
    fn test_error_message_names_rule() {
        let err = decode("a ! b").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("\"a ! b\""));
        assert!(message.contains("'!'"));
    }

    #[test]
    fn test_encode_layout() {
        let mut condition = Condition::new();
        condition.insert("consumer.host".into(), pair(&["10.0.0.2", "10.0.0.1"], &["10.0.0.9"]));
        condition.insert("method".into(), pair(&[], &["close"]));
        condition.insert("unused".into(), pair(&[], &[]));

        assert_eq!(
            to_rule_string(&condition),
            "consumer.host=10.0.0.1,10.0.0.2&consumer.host!=10.0.0.9&method!=close"
        );
    }

    #[test]
    fn test_encode_appends_to_existing_buffer() {
        let mut condition = Condition::new();
        condition.insert("host".into(), pair(&["a"], &[]));

        let mut out = String::from("prefix:");
        encode(&condition, &mut out);
        assert_eq!(out, "prefix:host=a");
    }

    #[test]
    fn test_encode_empty_condition() {
        assert_eq!(to_rule_string(&Condition::new()), "");
    }

    #[test]
    fn test_encode_drops_empty_values() {
        let mut condition = Condition::new();
        condition.insert("consumer.host".into(), pair(&["", "a"], &[""]));
        let encoded = to_rule_string(&condition);
        assert_eq!(encoded, "consumer.host=a");
        assert_eq!(decode(&encoded).unwrap()["consumer.host"], pair(&["a"], &[]));

        let mut only_empty = Condition::new();
        only_empty.insert("consumer.host".into(), pair(&[""], &[]));
        assert_eq!(to_rule_string(&only_empty), "");
        assert!(decode(&to_rule_string(&only_empty)).unwrap().is_empty());
    }

    #[test]
    fn test_encode_escapes_grammar_characters() {
        let mut condition = Condition::new();
        condition.insert("tag".into(), pair(&["a,b", "x y", "fe80::1"], &["k=v"]));

        let encoded = to_rule_string(&condition);
        assert!(encoded.contains("fe80::1"));
        assert!(!encoded.contains("a,b"));
        assert_eq!(decode(&encoded).unwrap(), condition);
    }

    #[test]
    fn test_round_trip() {
        let mut condition = Condition::new();
        condition.insert("consumer.host".into(), pair(&["10.20.153.10", "10.20.153.11"], &["192.168.1.1"]));
        condition.insert("application".into(), pair(&["shop"], &[]));
        condition.insert("method".into(), pair(&[], &["find*"]));

        assert_eq!(decode(&to_rule_string(&condition)).unwrap(), condition);
    }

    #[test]
    fn test_reencode_is_semantically_equal() {
        let original = " host != c &host = b , a ";
        let reencoded = to_rule_string(&decode(original).unwrap());
        assert_eq!(reencoded, "host=a,b&host!=c");
        assert_eq!(decode(&reencoded).unwrap(), decode(original).unwrap());
    }
}
