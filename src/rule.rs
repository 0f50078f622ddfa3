//! Adjacency rule grammar: parsing, the `match` relation, and round-trip printing.
//!
//! Grammar (descending precedence):
//! ```text
//! primary  := IDENT | '(' expr ')' | '[' expr '>' expr ']' | '^' primary
//! compound := primary ('+' primary)*
//! expr     := compound ('|' compound)*
//! ```

use std::fmt;

use crate::error::WfcError;

/// A parsed adjacency rule tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Rule {
    Simple(String),
    Negated(Box<Rule>),
    Directional(Box<Rule>, Box<Rule>),
    Compound(Vec<Rule>),
    Choice(Vec<Rule>),
}

impl Rule {
    pub fn simple(token: impl Into<String>) -> Rule {
        Rule::Simple(token.into())
    }

    pub fn negated(inner: Rule) -> Rule {
        Rule::Negated(Box::new(inner))
    }

    pub fn directional(origin: Rule, destination: Rule) -> Rule {
        Rule::Directional(Box::new(origin), Box::new(destination))
    }

    /// Precedence tier used by the printer to decide when parentheses are required.
    /// Primaries (Simple, Negated, Directional) are 3; Compound is 2; Choice is 1.
    fn precedence(&self) -> u8 {
        match self {
            Rule::Simple(_) | Rule::Negated(_) | Rule::Directional(_, _) => 3,
            Rule::Compound(_) => 2,
            Rule::Choice(_) => 1,
        }
    }

    /// The `~` match relation from the data model.
    ///
    /// `Negated` and `Choice` distribute over any shape of the other operand, so
    /// they are peeled off before the same-kind comparisons below; anything left
    /// over that isn't the same kind on both sides is false by definition.
    pub fn matches(&self, other: &Rule) -> bool {
        if let Rule::Negated(r) = self {
            return !r.matches(other);
        }
        if let Rule::Negated(r) = other {
            return !r.matches(self);
        }
        if let Rule::Choice(opts) = self {
            return opts.iter().any(|s| s.matches(other));
        }
        if let Rule::Choice(opts) = other {
            return opts.iter().any(|s| s.matches(self));
        }
        match (self, other) {
            (Rule::Simple(a), Rule::Simple(b)) => a == b,
            (Rule::Directional(o1, d1), Rule::Directional(o2, d2)) => {
                // A directional rule never matches itself, even when origin
                // and destination happen to be equal (e.g. [A>A] vs [A>A]).
                if o1 == o2 && d1 == d2 {
                    false
                } else {
                    o1.matches(d2) && d1.matches(o2)
                }
            }
            (Rule::Compound(ps), Rule::Compound(qs)) => {
                ps.len() == qs.len() && ps.iter().zip(qs.iter()).all(|(p, q)| p.matches(q))
            }
            _ => false,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", print_rule(self))
    }
}

fn print_rule(rule: &Rule) -> String {
    match rule {
        Rule::Simple(s) => s.clone(),
        Rule::Negated(inner) => format!("^{}", wrap(inner, 3)),
        Rule::Directional(o, d) => format!("[{}>{}]", print_rule(o), print_rule(d)),
        Rule::Compound(parts) => parts
            .iter()
            .map(|p| wrap(p, 3))
            .collect::<Vec<_>>()
            .join("+"),
        Rule::Choice(opts) => opts
            .iter()
            .map(|o| wrap(o, 2))
            .collect::<Vec<_>>()
            .join("|"),
    }
}

fn wrap(rule: &Rule, min_level: u8) -> String {
    let s = print_rule(rule);
    if rule.precedence() < min_level {
        format!("({})", s)
    } else {
        s
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tok {
    Ident,
    Caret,
    LBracket,
    RBracket,
    Gt,
    Plus,
    Pipe,
    LParen,
    RParen,
}

#[derive(Debug, Clone)]
struct Token {
    kind: Tok,
    text: String,
    pos: usize,
}

fn tokenize(input: &str) -> Result<Vec<Token>, WfcError> {
    let mut tokens = Vec::new();
    let bytes: Vec<(usize, char)> = input.char_indices().collect();
    let mut i = 0;
    while i < bytes.len() {
        let (pos, c) = bytes[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        match c {
            '^' => {
                tokens.push(Token { kind: Tok::Caret, text: "^".into(), pos });
                i += 1;
            }
            '[' => {
                tokens.push(Token { kind: Tok::LBracket, text: "[".into(), pos });
                i += 1;
            }
            ']' => {
                tokens.push(Token { kind: Tok::RBracket, text: "]".into(), pos });
                i += 1;
            }
            '>' => {
                tokens.push(Token { kind: Tok::Gt, text: ">".into(), pos });
                i += 1;
            }
            '+' => {
                tokens.push(Token { kind: Tok::Plus, text: "+".into(), pos });
                i += 1;
            }
            '|' => {
                tokens.push(Token { kind: Tok::Pipe, text: "|".into(), pos });
                i += 1;
            }
            '(' => {
                tokens.push(Token { kind: Tok::LParen, text: "(".into(), pos });
                i += 1;
            }
            ')' => {
                tokens.push(Token { kind: Tok::RParen, text: ")".into(), pos });
                i += 1;
            }
            c if c.is_ascii_alphanumeric() || c == '_' => {
                let start = i;
                let mut text = String::new();
                while i < bytes.len() {
                    let (_, c2) = bytes[i];
                    if c2.is_ascii_alphanumeric() || c2 == '_' {
                        text.push(c2);
                        i += 1;
                    } else {
                        break;
                    }
                }
                tokens.push(Token { kind: Tok::Ident, text, pos: bytes[start].0 });
            }
            other => {
                return Err(WfcError::ParseError {
                    position: pos,
                    message: format!("unexpected character '{}'", other),
                });
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    end_pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_pos(&self) -> usize {
        self.tokens.get(self.pos).map(|t| t.pos).unwrap_or(self.end_pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: Tok, what: &str) -> Result<Token, WfcError> {
        match self.bump() {
            Some(tok) if tok.kind == kind => Ok(tok),
            Some(tok) => Err(WfcError::ParseError {
                position: tok.pos,
                message: format!("expected {}, found '{}'", what, tok.text),
            }),
            None => Err(WfcError::ParseError {
                position: self.end_pos,
                message: format!("expected {}, found end of input", what),
            }),
        }
    }

    // expr := compound ('|' compound)*
    fn parse_expr(&mut self) -> Result<Rule, WfcError> {
        let mut options = vec![self.parse_compound()?];
        while matches!(self.peek(), Some(t) if t.kind == Tok::Pipe) {
            self.bump();
            options.push(self.parse_compound()?);
        }
        if options.len() == 1 {
            Ok(options.into_iter().next().unwrap())
        } else {
            Ok(Rule::Choice(options))
        }
    }

    // compound := primary ('+' primary)*
    fn parse_compound(&mut self) -> Result<Rule, WfcError> {
        let mut parts = vec![self.parse_primary()?];
        while matches!(self.peek(), Some(t) if t.kind == Tok::Plus) {
            self.bump();
            parts.push(self.parse_primary()?);
        }
        if parts.len() == 1 {
            Ok(parts.into_iter().next().unwrap())
        } else {
            Ok(Rule::Compound(parts))
        }
    }

    // primary := IDENT | '(' expr ')' | '[' expr '>' expr ']' | '^' primary
    fn parse_primary(&mut self) -> Result<Rule, WfcError> {
        match self.peek() {
            Some(t) if t.kind == Tok::Ident => {
                let tok = self.bump().unwrap();
                Ok(Rule::Simple(tok.text))
            }
            Some(t) if t.kind == Tok::LParen => {
                self.bump();
                let inner = self.parse_expr()?;
                self.expect(Tok::RParen, "')'")?;
                Ok(inner)
            }
            Some(t) if t.kind == Tok::LBracket => {
                self.bump();
                let origin = self.parse_expr()?;
                self.expect(Tok::Gt, "'>'")?;
                let destination = self.parse_expr()?;
                self.expect(Tok::RBracket, "']'")?;
                Ok(Rule::directional(origin, destination))
            }
            Some(t) if t.kind == Tok::Caret => {
                self.bump();
                let inner = self.parse_primary()?;
                Ok(Rule::negated(inner))
            }
            Some(t) => Err(WfcError::ParseError {
                position: t.pos,
                message: format!("unexpected token '{}'", t.text),
            }),
            None => Err(WfcError::ParseError {
                position: self.end_pos,
                message: "unexpected end of input".into(),
            }),
        }
    }
}

/// Parse a rule string into a [`Rule`] tree.
///
/// Parsing is pure: the same input string always yields an equal tree, so
/// callers (notably [`crate::tile::TileCatalog`]) may memoize it by the raw text.
pub fn parse(input: &str) -> Result<Rule, WfcError> {
    let tokens = tokenize(input)?;
    let end_pos = input.len();
    let mut parser = Parser { tokens, pos: 0, end_pos };
    let rule = parser.parse_expr()?;
    if let Some(tok) = parser.peek() {
        return Err(WfcError::ParseError {
            position: tok.pos,
            message: format!("unexpected trailing token '{}'", tok.text),
        });
    }
    let _ = parser.peek_pos();
    Ok(rule)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple() {
        assert_eq!(parse("Forest").unwrap(), Rule::simple("Forest"));
    }

    #[test]
    fn parses_negation() {
        assert_eq!(
            parse("^Forest").unwrap(),
            Rule::negated(Rule::simple("Forest"))
        );
    }

    #[test]
    fn parses_directional() {
        let r = parse("[A>B]").unwrap();
        assert_eq!(
            r,
            Rule::directional(Rule::simple("A"), Rule::simple("B"))
        );
    }

    #[test]
    fn parses_compound_left_to_right() {
        let r = parse("A+B+C").unwrap();
        assert_eq!(
            r,
            Rule::Compound(vec![Rule::simple("A"), Rule::simple("B"), Rule::simple("C")])
        );
    }

    #[test]
    fn parses_choice_lowest_precedence() {
        let r = parse("A+B|C").unwrap();
        assert_eq!(
            r,
            Rule::Choice(vec![
                Rule::Compound(vec![Rule::simple("A"), Rule::simple("B")]),
                Rule::simple("C"),
            ])
        );
    }

    #[test]
    fn parses_the_scenario_5_example() {
        let r = parse("Forest+[^Reef>(Desert|Mountain+Cliff|Jungle)]|(Sand|Grass)").unwrap();
        match &r {
            Rule::Choice(opts) => assert_eq!(opts.len(), 2),
            other => panic!("expected Choice, got {:?}", other),
        }
        assert!(r.matches(&Rule::simple("Sand")));
        assert!(!r.matches(&Rule::simple("Forest")));
    }

    #[test]
    fn whitespace_is_ignored() {
        assert_eq!(parse("  A  +  B ").unwrap(), parse("A+B").unwrap());
    }

    #[test]
    fn rejects_unbalanced_brackets() {
        assert!(parse("[A>B").is_err());
        assert!(parse("(A+B").is_err());
    }

    #[test]
    fn directional_never_matches_itself() {
        let r = parse("[A>B]").unwrap();
        assert!(!r.matches(&r));
    }

    #[test]
    fn directional_with_equal_origin_and_destination_never_matches_itself() {
        let r = parse("[A>A]").unwrap();
        assert!(!r.matches(&r));
        assert!(!r.matches(&parse("[A>A]").unwrap()));
    }

    #[test]
    fn directional_match_flips() {
        let xy = parse("[x>y]").unwrap();
        let uv = parse("[u>v]").unwrap();
        let yx = parse("[y>x]").unwrap();
        let vu = parse("[v>u]").unwrap();
        assert_eq!(xy.matches(&uv), yx.matches(&vu));
    }

    #[test]
    fn match_is_symmetric_without_directional() {
        let a = parse("A+^B|C").unwrap();
        let b = parse("D|A+^B").unwrap();
        assert_eq!(a.matches(&b), b.matches(&a));
    }

    #[test]
    fn compound_is_position_sensitive() {
        let ab = parse("A+B").unwrap();
        let ba = parse("B+A").unwrap();
        assert!(!ab.matches(&ba));
    }

    #[test]
    fn print_round_trips_through_parse() {
        let cases = [
            "Forest",
            "^Forest",
            "[A>B]",
            "A+B+C",
            "A|B|C",
            "Forest+[^Reef>(Desert|Mountain+Cliff|Jungle)]|(Sand|Grass)",
            "^(A|B)",
            "(A+B)+C",
        ];
        for case in cases {
            let parsed = parse(case).unwrap();
            let printed = parsed.to_string();
            let reparsed = parse(&printed).unwrap();
            assert_eq!(parsed, reparsed, "round trip failed for {}", case);
        }
    }

    #[test]
    fn cross_kind_matches_are_false() {
        let simple = Rule::simple("A");
        let compound = Rule::Compound(vec![Rule::simple("A"), Rule::simple("B")]);
        assert!(!simple.matches(&compound));
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn parse_never_panics_on_arbitrary_text(text in ".{0,40}") {
            let _ = parse(&text);
        }

        #[test]
        fn simple_idents_always_parse_and_match_reflexively(id in "[a-zA-Z_][a-zA-Z0-9_]{0,10}") {
            let rule = parse(&id).unwrap();
            prop_assert_eq!(&rule, &Rule::simple(id));
            prop_assert!(rule.matches(&rule));
        }

        #[test]
        fn printed_compound_round_trips(
            a in "[a-zA-Z]{1,6}",
            b in "[a-zA-Z]{1,6}",
            c in "[a-zA-Z]{1,6}",
        ) {
            let source = format!("{}+{}|{}", a, b, c);
            let parsed = parse(&source).unwrap();
            let reparsed = parse(&parsed.to_string()).unwrap();
            prop_assert_eq!(parsed, reparsed);
        }
    }
}
