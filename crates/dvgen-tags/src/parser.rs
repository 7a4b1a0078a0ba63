//! # Tag Parser
//!
//! Recursive-descent parser over a [`Cursor`]. The grammar:
//!
//! ```text
//! tag       := '+'? qualified args? ('=' payload)?
//! qualified := NAME (':' NAME)?
//! args      := '(' (arg (',' arg)*)? ')'
//! arg       := WORD ':' literal | literal
//! payload   := tag          when the payload starts with '+'
//!            | literal      otherwise, the rest of the input
//! literal   := '"' ... '"' | '`' ... '`' | WORD
//! ```
//!
//! The payload is right-recursive, so composition nests to any depth:
//!
//! ```text
//! +k8s:ifEnabled(FeatureX)=+k8s:eachVal=+k8s:maxLength=16
//! ```

use crate::cursor::Cursor;
use crate::error::{ParseError, ParseErrorKind};
use crate::tag::{Literal, Payload, Scope, Tag, TagArg};

/// Parse one tag line in `scope`. Nested payload tags inherit `scope`.
///
/// # Errors
///
/// Returns [`ParseError`] with the byte position and offending token for
/// empty names, malformed arguments, unbalanced parentheses, unterminated
/// strings, empty payloads and trailing input.
pub fn parse_tag(input: &str, scope: Scope) -> Result<Tag, ParseError> {
    let mut parser = Parser {
        cursor: Cursor::new(input),
        scope,
    };
    parser.tag()
}

/// Parse every line that starts with `+`, skipping all others.
///
/// # Errors
///
/// Stops at the first line that fails to parse.
pub fn parse_tags<I, S>(lines: I, scope: Scope) -> Result<Vec<Tag>, ParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter(|line| line.as_ref().trim_start().starts_with('+'))
        .map(|line| parse_tag(line.as_ref(), scope))
        .collect()
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/')
}

struct Parser<'a> {
    cursor: Cursor<'a>,
    scope: Scope,
}

impl<'a> Parser<'a> {
    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            position: self.cursor.position(),
            token: self.cursor.token(),
            kind,
        }
    }

    fn tag(&mut self) -> Result<Tag, ParseError> {
        self.cursor.skip_whitespace();
        let start = self.cursor.position();
        self.cursor.eat('+');

        let first = self.cursor.take_while(is_name_char);
        if first.is_empty() {
            return Err(self.error(ParseErrorKind::EmptyName));
        }
        let (namespace, name) = if self.cursor.eat(':') {
            let name = self.cursor.take_while(is_name_char);
            if name.is_empty() {
                return Err(self.error(ParseErrorKind::EmptyName));
            }
            (Some(first.to_string()), name.to_string())
        } else {
            (None, first.to_string())
        };

        let args = if self.cursor.peek() == Some('(') {
            self.args()?
        } else {
            Vec::new()
        };

        let payload = if self.cursor.eat('=') {
            Some(self.payload()?)
        } else {
            self.cursor.skip_whitespace();
            match self.cursor.peek() {
                None => None,
                Some(')') => return Err(self.error(ParseErrorKind::UnexpectedCloseParen)),
                Some(_) => return Err(self.error(ParseErrorKind::TrailingInput)),
            }
        };

        let raw = self.cursor.input()[start..self.cursor.position()]
            .trim_end()
            .to_string();
        Ok(Tag {
            namespace,
            name,
            scope: self.scope,
            args,
            payload,
            raw,
        })
    }

    fn args(&mut self) -> Result<Vec<TagArg>, ParseError> {
        let open = self.cursor.position();
        self.cursor.eat('(');
        let mut args = Vec::new();
        self.cursor.skip_whitespace();
        if self.cursor.eat(')') {
            return Ok(args);
        }
        loop {
            args.push(self.arg()?);
            self.cursor.skip_whitespace();
            if self.cursor.eat(',') {
                continue;
            }
            if self.cursor.eat(')') {
                return Ok(args);
            }
            if self.cursor.is_eof() {
                return Err(ParseError {
                    position: open,
                    token: "(".to_string(),
                    kind: ParseErrorKind::UnclosedParen,
                });
            }
            return Err(self.error(ParseErrorKind::InvalidArgument));
        }
    }

    fn arg(&mut self) -> Result<TagArg, ParseError> {
        self.cursor.skip_whitespace();
        match self.cursor.peek() {
            None => Err(self.error(ParseErrorKind::UnclosedParen)),
            Some('"') | Some('`') => Ok(TagArg {
                name: None,
                value: Literal::String(self.quoted()?),
            }),
            Some(_) => {
                let word = self.cursor.take_while(is_word_char);
                if word.is_empty() {
                    return Err(self.error(ParseErrorKind::InvalidArgument));
                }
                self.cursor.skip_whitespace();
                if self.cursor.eat(':') {
                    if !word.chars().all(is_name_char) {
                        return Err(self.error(ParseErrorKind::InvalidArgument));
                    }
                    let value = self.literal()?;
                    Ok(TagArg {
                        name: Some(word.to_string()),
                        value,
                    })
                } else {
                    Ok(TagArg {
                        name: None,
                        value: Literal::from_word(word),
                    })
                }
            }
        }
    }

    fn literal(&mut self) -> Result<Literal, ParseError> {
        self.cursor.skip_whitespace();
        match self.cursor.peek() {
            Some('"') | Some('`') => Ok(Literal::String(self.quoted()?)),
            None => Err(self.error(ParseErrorKind::UnclosedParen)),
            Some(_) => {
                let word = self.cursor.take_while(is_word_char);
                if word.is_empty() {
                    Err(self.error(ParseErrorKind::InvalidArgument))
                } else {
                    Ok(Literal::from_word(word))
                }
            }
        }
    }

    fn payload(&mut self) -> Result<Payload, ParseError> {
        self.cursor.skip_whitespace();
        match self.cursor.peek() {
            None => Err(self.error(ParseErrorKind::EmptyPayload)),
            Some('+') => Ok(Payload::Tag(Box::new(self.tag()?))),
            Some('"') | Some('`') => {
                let s = self.quoted()?;
                self.cursor.skip_whitespace();
                if !self.cursor.is_eof() {
                    return Err(self.error(ParseErrorKind::TrailingInput));
                }
                Ok(Payload::Literal(Literal::String(s)))
            }
            Some(_) => {
                let rest = self.cursor.take_rest().trim_end();
                Ok(Payload::Literal(Literal::from_word(rest)))
            }
        }
    }

    /// A `"..."` string with backslash escapes, or a raw `` `...` `` string.
    fn quoted(&mut self) -> Result<String, ParseError> {
        let start = self.cursor.position();
        let quote = match self.cursor.bump() {
            Some(q) => q,
            None => return Err(self.error(ParseErrorKind::UnexpectedToken)),
        };
        let unterminated = || ParseError {
            position: start,
            token: quote.to_string(),
            kind: ParseErrorKind::UnterminatedString,
        };
        let mut out = String::new();
        loop {
            match self.cursor.bump() {
                None => return Err(unterminated()),
                Some(c) if c == quote => return Ok(out),
                Some('\\') if quote == '"' => match self.cursor.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                    None => return Err(unterminated()),
                },
                Some(c) => out.push(c),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Tag {
        parse_tag(input, Scope::Field).unwrap()
    }

    fn fail(input: &str) -> ParseError {
        parse_tag(input, Scope::Field).unwrap_err()
    }

    #[test]
    fn bare_qualified_tag() {
        let tag = parse("+k8s:required");
        assert_eq!(tag.namespace.as_deref(), Some("k8s"));
        assert_eq!(tag.name, "required");
        assert!(tag.args.is_empty());
        assert!(tag.payload.is_none());
        assert_eq!(tag.raw, "+k8s:required");
    }

    #[test]
    fn unqualified_tag_without_plus() {
        let tag = parse("optional");
        assert_eq!(tag.namespace, None);
        assert_eq!(tag.name, "optional");
    }

    #[test]
    fn literal_payloads() {
        assert_eq!(parse("+k8s:maxLength=16").literal(), Some(&Literal::Int(16)));
        assert_eq!(parse("+k8s:minimum=-1").literal(), Some(&Literal::Int(-1)));
        assert_eq!(
            parse("+k8s:format=k8s-uuid").literal(),
            Some(&Literal::Word("k8s-uuid".into()))
        );
        assert_eq!(
            parse(r#"+k8s:neq="a \"b\"""#).literal(),
            Some(&Literal::String("a \"b\"".into()))
        );
        assert_eq!(
            parse("+k8s:neq=`raw\\n`").literal(),
            Some(&Literal::String("raw\\n".into()))
        );
    }

    #[test]
    fn positional_and_named_args() {
        let tag = parse(r#"+k8s:unionMember(union: "u1", memberName: Foo)"#);
        assert_eq!(tag.arg("union"), Some(&Literal::String("u1".into())));
        assert_eq!(tag.arg("memberName"), Some(&Literal::Word("Foo".into())));
        assert_eq!(tag.positional(0), None);

        let tag = parse("+k8s:ifEnabled(FeatureX)=+k8s:required");
        assert_eq!(tag.positional(0), Some(&Literal::Word("FeatureX".into())));
    }

    #[test]
    fn nested_payload_recurses() {
        let tag = parse("+k8s:ifEnabled(FeatureX)=+k8s:eachVal=+k8s:maxLength=16");
        let each = tag.nested().unwrap();
        assert_eq!(each.name, "eachVal");
        assert_eq!(each.scope, Scope::Field);
        let inner = each.nested().unwrap();
        assert_eq!(inner.name, "maxLength");
        assert_eq!(inner.literal(), Some(&Literal::Int(16)));
        assert_eq!(inner.raw, "+k8s:maxLength=16");
    }

    #[test]
    fn item_selector_args() {
        let tag = parse(r#"+k8s:item(type: "Approved", stage: 2)=+k8s:optional"#);
        assert_eq!(tag.args.len(), 2);
        assert_eq!(tag.arg("stage"), Some(&Literal::Int(2)));
        assert_eq!(tag.nested().unwrap().name, "optional");
    }

    #[test]
    fn display_reconstructs_tag() {
        let tag = parse(r#"+k8s:item(type: "A")=+k8s:maxLength=3"#);
        assert_eq!(tag.to_string(), r#"+k8s:item(type: "A")=+k8s:maxLength=3"#);
    }

    #[test]
    fn rejects_empty_names() {
        assert_eq!(fail("+").kind, ParseErrorKind::EmptyName);
        assert_eq!(fail("+k8s:").kind, ParseErrorKind::EmptyName);
        assert_eq!(fail("+k8s:(x)").kind, ParseErrorKind::EmptyName);
    }

    #[test]
    fn rejects_bad_arguments() {
        let err = fail("+k8s:item(a b)");
        assert_eq!(err.kind, ParseErrorKind::InvalidArgument);
        assert_eq!(err.token, "b");
        assert_eq!(fail("+k8s:item(=x)").kind, ParseErrorKind::InvalidArgument);
        assert_eq!(fail("+k8s:item(key=value)").kind, ParseErrorKind::InvalidArgument);
        assert_eq!(fail("+k8s:item(a,)").kind, ParseErrorKind::InvalidArgument);
    }

    #[test]
    fn rejects_unbalanced_parens() {
        let err = fail("+k8s:item(a: 1");
        assert_eq!(err.kind, ParseErrorKind::UnclosedParen);
        assert_eq!(err.position, 9);
        assert_eq!(fail("+k8s:required)").kind, ParseErrorKind::UnexpectedCloseParen);
    }

    #[test]
    fn rejects_unterminated_strings() {
        let err = fail(r#"+k8s:neq="abc"#);
        assert_eq!(err.kind, ParseErrorKind::UnterminatedString);
        assert_eq!(err.position, 9);
        assert_eq!(
            fail("+k8s:item(k: `abc)").kind,
            ParseErrorKind::UnterminatedString
        );
    }

    #[test]
    fn rejects_empty_payload_and_trailing_input() {
        assert_eq!(fail("+k8s:maxLength=").kind, ParseErrorKind::EmptyPayload);
        assert_eq!(fail("+k8s:maxLength=  ").kind, ParseErrorKind::EmptyPayload);
        assert_eq!(fail("+k8s:required extra").kind, ParseErrorKind::TrailingInput);
        assert_eq!(fail(r#"+k8s:neq="a" b"#).kind, ParseErrorKind::TrailingInput);
    }

    #[test]
    fn batch_skips_non_tag_lines() {
        let lines = [
            "Name is the object name.",
            "+k8s:required",
            "",
            "  +k8s:maxLength=63",
        ];
        let tags = parse_tags(lines, Scope::Type).unwrap();
        assert_eq!(tags.len(), 2);
        assert!(tags.iter().all(|t| t.scope == Scope::Type));
    }

    #[test]
    fn batch_stops_on_first_error() {
        assert!(parse_tags(["+k8s:required", "+k8s:item("], Scope::Field).is_err());
    }

    #[test]
    fn tag_serializes_to_json() {
        let tag = parse("+k8s:eachVal=+k8s:minimum=0");
        let json = serde_json::to_value(&tag).unwrap();
        assert_eq!(json["name"], "eachVal");
        assert_eq!(json["payload"]["tag"]["name"], "minimum");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// The parser returns a value or an error for every input.
        #[test]
        fn never_panics(input in "\\PC{0,40}") {
            let _ = parse_tag(&input, Scope::Field);
        }

        /// Integer payloads survive parsing exactly.
        #[test]
        fn integer_payloads(n in any::<i64>()) {
            let tag = parse_tag(&format!("+k8s:minimum={n}"), Scope::Field).unwrap();
            prop_assert_eq!(tag.literal(), Some(&Literal::Int(n)));
        }
    }
}
