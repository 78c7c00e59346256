use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::ast::*;
use crate::lexer::{self, Token};
use crate::tokenizer::{self, AND, BRACKET, BRACKET_OPEN, CONDITION, ESCAPE, INSTRUCTION, OR, STOP};

type Span = SimpleSpan;

/// Parse error with source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Byte range of the offending text.
    pub span: std::ops::Range<usize>,
    /// What went wrong.
    pub message: String,
}

impl ParseError {
    fn new(span: std::ops::Range<usize>, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }

    fn shifted(mut self, offset: usize) -> Self {
        self.span = self.span.start + offset..self.span.end + offset;
        self
    }
}

// ---------------------------------------------------------------------------
// Segment grammar
// ---------------------------------------------------------------------------

/// Value expression parser.
///
/// Function application binds tighter than binary operators, so
/// `Size(a)+b` adds `b` to the result of the call.
fn expr_parser<'a, I>() -> impl Parser<'a, I, Expr, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = Span>,
{
    recursive(|expr| {
        let word = select! { Token::Word(w) => w }.labelled("word");
        let name = word
            .clone()
            .repeated()
            .at_least(1)
            .collect::<Vec<String>>()
            .map(|words| words.join(" "))
            .labelled("name");

        let integer = just(Token::Minus)
            .or_not()
            .then(word)
            .try_map(|(sign, digits): (Option<Token>, String), span| {
                digits
                    .parse::<i64>()
                    .map(|n| if sign.is_some() { -n } else { n })
                    .map_err(|_| Rich::custom(span, format!("invalid integer: {digits}")))
            });

        let deref = just(Token::At)
            .ignore_then(name.clone())
            .map(Primary::Deref)
            .labelled("dereference");

        let numeric = just(Token::Hash)
            .ignore_then(choice((
                integer.map(Primary::Integer),
                name.clone().map(Primary::IntegerOf),
            )))
            .labelled("integer");

        let verb_call = name
            .clone()
            .or_not()
            .then_ignore(just(Token::Colon))
            .then(name.clone())
            .map(|(noun, verb)| Primary::VerbCall { noun, verb })
            .labelled("verb call");

        let group = expr
            .clone()
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .map(|e| Primary::Group(Box::new(e)));

        let primary = choice((deref, numeric, verb_call, group, name.map(Primary::Atom)));

        let args = expr
            .or_not()
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .labelled("arguments");

        let item = primary
            .then(args.or_not())
            .map(|(primary, args)| match args {
                Some(args) => Item::Call {
                    callee: primary,
                    args: args.map(Box::new),
                },
                None => Item::Primary(primary),
            });

        let term = item
            .separated_by(just(Token::Comma))
            .at_least(1)
            .collect::<Vec<Item>>()
            .map(Term);

        let binop = select! {
            Token::Plus => BinOp::Union,
            Token::Minus => BinOp::Difference,
            Token::Slash => BinOp::Intersect,
            Token::Star => BinOp::Concat,
        }
        .labelled("operator");

        term.clone()
            .then(binop.then(term).repeated().collect::<Vec<_>>())
            .map(|(head, tail)| Expr { head, tail })
    })
}

fn condition_parser<'a, I>() -> impl Parser<'a, I, Condition, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = Span>,
{
    let comparison = select! {
        Token::AddAssign => Comparison::Contains,
        Token::Assign => Comparison::Contains,
        Token::RemoveAssign => Comparison::NotContains,
        Token::Equals => Comparison::Equals,
        Token::NotEquals => Comparison::NotEquals,
        Token::EqualsOrLess => Comparison::EqualsOrLess,
        Token::EqualsOrMore => Comparison::EqualsOrMore,
        Token::More => Comparison::IsMore,
        Token::Less => Comparison::IsLess,
    }
    .labelled("comparison");

    let compare = expr_parser()
        .or_not()
        .then(comparison)
        .then(expr_parser().or_not())
        .map(|((subject, comparison), value)| Condition::Compare {
            subject,
            comparison,
            value,
        });

    choice((compare, expr_parser().map(Condition::Bare))).then_ignore(end())
}

fn action_parser<'a, I>() -> impl Parser<'a, I, Action, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = Span>,
{
    let op = select! {
        Token::AddAssign => InstructionOp::Add,
        Token::RemoveAssign => InstructionOp::Remove,
        Token::Assign => InstructionOp::Assign,
    }
    .labelled("assignment");

    let apply = expr_parser()
        .or_not()
        .then(op)
        .then(expr_parser().or_not())
        .map(|((target, op), value)| Action::Apply { target, op, value });

    choice((apply, expr_parser().map(Action::Bare))).then_ignore(end())
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

fn lex_body(body: &str) -> Result<Vec<(Token, std::ops::Range<usize>)>, Vec<ParseError>> {
    let (tokens, errors) = lexer::lex(body);
    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors
            .into_iter()
            .map(|e| ParseError::new(e.span, e.message))
            .collect())
    }
}

fn rich_errors(errors: Vec<Rich<'_, Token>>) -> Vec<ParseError> {
    errors
        .into_iter()
        .map(|e| ParseError::new(e.span().into_range(), e.to_string()))
        .collect()
}

/// Parse the body of a condition segment (the text after `?`).
pub fn parse_condition(body: &str) -> Result<Condition, Vec<ParseError>> {
    if body.trim().is_empty() {
        return Ok(Condition::Always);
    }
    let tokens = lex_body(body)?;
    let token_iter = tokens
        .iter()
        .map(|(tok, span)| (tok.clone(), Span::from(span.clone())));
    let len = body.len();
    let eoi: Span = (len..len).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let (output, errors) = condition_parser().parse(stream).into_output_errors();
    match output {
        Some(condition) if errors.is_empty() => Ok(condition),
        _ => Err(rich_errors(errors)),
    }
}

/// Parse the body of an instruction segment (the text after `!`).
///
/// A trailing run of `<` becomes the break count; whatever precedes it is
/// the action.
pub fn parse_instruction(body: &str) -> Result<Instruction, Vec<ParseError>> {
    let trimmed = body.trim_end();
    let mut split = trimmed.trim_end_matches(STOP).len();
    if trimmed[..split].ends_with(ESCAPE) && split < trimmed.len() {
        split += 1;
    }
    let break_count = trimmed.len() - split;
    let action_text = &trimmed[..split];

    if action_text.trim().is_empty() {
        return Ok(Instruction {
            action: None,
            break_count,
        });
    }

    let tokens = lex_body(action_text)?;
    let token_iter = tokens
        .iter()
        .map(|(tok, span)| (tok.clone(), Span::from(span.clone())));
    let len = action_text.len();
    let eoi: Span = (len..len).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let (output, errors) = action_parser().parse(stream).into_output_errors();
    match output {
        Some(action) if errors.is_empty() => Ok(Instruction {
            action: Some(action),
            break_count,
        }),
        _ => Err(rich_errors(errors)),
    }
}

fn parse_segment(body: &str, offset: usize, errors: &mut Vec<ParseError>) -> Segment {
    let mut chars = body.chars();
    let result = match chars.next() {
        Some(CONDITION) => parse_condition(chars.as_str()).map(Segment::Condition),
        Some(INSTRUCTION) => parse_instruction(chars.as_str()).map(Segment::Instruction),
        _ => Err(vec![ParseError::new(
            0..body.len(),
            format!("expected `{CONDITION}` or `{INSTRUCTION}` segment, found {body:?}"),
        )]),
    };
    result.unwrap_or_else(|errs| {
        // spans inside the segment body start after the marker character
        errors.extend(errs.into_iter().map(|e| e.shifted(offset + 1)));
        Segment::Invalid
    })
}

/// Parse a stored block expression such as `[?a=x]&[!b+=y]`.
///
/// Always produces a chain; segments that fail to parse become
/// [`Segment::Invalid`] and their errors are returned alongside. An empty
/// expression is a single always-true condition.
pub fn parse_chain(expression: &str) -> (Chain, Vec<ParseError>) {
    let mut errors = Vec::new();
    let mut segments: Vec<(Option<Connector>, Segment)> = Vec::new();
    let mut pos = 0usize;
    let mut connector = None;

    if expression.trim().is_empty() {
        return (
            Chain {
                first: Segment::Condition(Condition::Always),
                rest: Vec::new(),
            },
            errors,
        );
    }

    loop {
        let Some(end) = tokenizer::find_token_end(expression, pos, BRACKET) else {
            errors.push(ParseError::new(
                pos..expression.len(),
                format!("expected `{BRACKET_OPEN}...]` segment"),
            ));
            segments.push((connector, Segment::Invalid));
            break;
        };
        let body = &expression[pos + 1..end - 1];
        segments.push((connector, parse_segment(body, pos + 1, &mut errors)));
        pos = end;

        match expression[pos..].chars().next() {
            None => break,
            Some(AND) => connector = Some(Connector::And),
            Some(OR) => connector = Some(Connector::Or),
            Some(other) => {
                errors.push(ParseError::new(
                    pos..pos + other.len_utf8(),
                    format!("expected `{AND}` or `{OR}` between segments, found {other:?}"),
                ));
                break;
            }
        }
        pos += 1;
    }

    let mut iter = segments.into_iter();
    let first = iter.next().map_or(Segment::Invalid, |(_, s)| s);
    let rest = iter
        .map(|(c, s)| (c.unwrap_or(Connector::And), s))
        .collect();
    (Chain { first, rest }, errors)
}

/// Turn an authored run such as `apple=red&knife` into stored chain text,
/// `[?apple=red]&[?knife]`, bracketing each `&`/`|` separated piece with
/// the segment marker `kind`.
pub fn chain_text(kind: char, run: &str) -> String {
    let mut out = String::with_capacity(run.len() + 4);
    for (separator, piece) in tokenizer::split_top_level(run, &[AND, OR]) {
        if let Some(sep) = separator {
            out.push(sep);
        }
        out.push(BRACKET_OPEN);
        out.push(kind);
        out.push_str(piece);
        out.push(tokenizer::BRACKET_CLOSE);
    }
    out
}

/// Fold stored chains with `&`, skipping empty ones.
pub fn fold_chains<'a>(chains: impl IntoIterator<Item = &'a str>) -> String {
    chains
        .into_iter()
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(name: &str) -> Expr {
        Expr::primary(Primary::Atom(name.to_string()))
    }

    #[test]
    fn condition_with_implicit_subject() {
        let condition = parse_condition("=red").unwrap();
        assert_eq!(
            condition,
            Condition::Compare {
                subject: None,
                comparison: Comparison::Contains,
                value: Some(atom("red")),
            }
        );
    }

    #[test]
    fn condition_comparisons() {
        let condition = parse_condition("apple<>red").unwrap();
        assert!(matches!(
            condition,
            Condition::Compare { comparison: Comparison::NotEquals, .. }
        ));
        let condition = parse_condition("score>=#3").unwrap();
        let Condition::Compare { value: Some(value), .. } = condition else {
            panic!("expected comparison");
        };
        assert_eq!(value, Expr::primary(Primary::Integer(3)));
    }

    #[test]
    fn bare_condition() {
        assert_eq!(parse_condition("knife").unwrap(), Condition::Bare(atom("knife")));
        assert_eq!(parse_condition("").unwrap(), Condition::Always);
    }

    #[test]
    fn multi_word_names_join() {
        assert_eq!(
            parse_condition("big door").unwrap(),
            Condition::Bare(atom("big door"))
        );
    }

    #[test]
    fn verb_calls_with_and_without_noun() {
        let instruction = parse_instruction("door:open").unwrap();
        assert_eq!(
            instruction.action,
            Some(Action::Bare(Expr::primary(Primary::VerbCall {
                noun: Some("door".to_string()),
                verb: "open".to_string(),
            })))
        );
        let instruction = parse_instruction(":look").unwrap();
        assert_eq!(
            instruction.action,
            Some(Action::Bare(Expr::primary(Primary::VerbCall {
                noun: None,
                verb: "look".to_string(),
            })))
        );
    }

    #[test]
    fn call_binds_tighter_than_operators() {
        let Ok(Instruction {
            action: Some(Action::Apply { value: Some(value), .. }),
            ..
        }) = parse_instruction("total=Size(@bag)+#1")
        else {
            panic!("expected assignment");
        };
        assert_eq!(value.tail.len(), 1);
        assert!(matches!(value.head.0[0], Item::Call { .. }));
    }

    #[test]
    fn negative_integers() {
        let Ok(Instruction {
            action: Some(Action::Apply { value: Some(value), op, .. }),
            ..
        }) = parse_instruction("score+=#-2")
        else {
            panic!("expected assignment");
        };
        assert_eq!(op, InstructionOp::Add);
        assert_eq!(value, Expr::primary(Primary::Integer(-2)));
    }

    #[test]
    fn break_markers() {
        let plain = parse_instruction("<<<").unwrap();
        assert_eq!(plain.break_count, 3);
        assert!(plain.action.is_none());

        let after = parse_instruction("apple=eaten<").unwrap();
        assert_eq!(after.break_count, 1);
        assert!(after.action.is_some());

        assert_eq!(parse_instruction("apple=x").unwrap().break_count, 0);
    }

    #[test]
    fn chain_of_segments() {
        let (chain, errors) = parse_chain("[?a=x]&[?b]|[!c+=d]");
        assert!(errors.is_empty(), "{errors:?}");
        assert!(matches!(chain.first, Segment::Condition(_)));
        assert_eq!(chain.rest.len(), 2);
        assert_eq!(chain.rest[0].0, Connector::And);
        assert_eq!(chain.rest[1].0, Connector::Or);
        assert!(matches!(chain.rest[1].1, Segment::Instruction(_)));
        assert!(!chain.is_condition());
    }

    #[test]
    fn bad_segments_are_invalid_with_errors() {
        let (chain, errors) = parse_chain("[?a=]]");
        assert_eq!(
            chain.first,
            Segment::Condition(Condition::Compare {
                subject: Some(atom("a")),
                comparison: Comparison::Contains,
                value: None,
            })
        );
        assert_eq!(errors.len(), 1);

        let (chain, errors) = parse_chain("[?a=(]");
        assert_eq!(chain.first, Segment::Invalid);
        assert!(!errors.is_empty());
    }

    #[test]
    fn empty_chain_is_always_true() {
        let (chain, errors) = parse_chain("");
        assert!(errors.is_empty());
        assert_eq!(chain.first, Segment::Condition(Condition::Always));
    }

    #[test]
    fn authored_runs_become_chains() {
        assert_eq!(chain_text('?', "apple=red&knife"), "[?apple=red]&[?knife]");
        assert_eq!(chain_text('!', "F(a&b)|c"), "[!F(a&b)]|[!c]");
        assert_eq!(fold_chains(["[?a]", "", "[?b]"]), "[?a]&[?b]");
    }
}
