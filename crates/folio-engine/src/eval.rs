//! Expression evaluation.
//!
//! Chains are evaluated left to right with short-circuit `&`/`|`. Value
//! expressions fold their operators strictly left to right, carrying a
//! numeric hint that decides how ordered comparisons read a value.

use folio_core::Properties;
use folio_dsl::ast::{
    Action, BinOp, Chain, Comparison, Condition, Connector, Expr, Instruction, InstructionOp,
    Item, Primary, Segment, Term,
};
use folio_dsl::parser;
use strsim::jaro_winkler;

use crate::context::{Context, Value};
use crate::functions::Function;

const FUZZY_THRESHOLD: f64 = 0.8;

/// Result of evaluating a block expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Verdict {
    pub(crate) holds: bool,
    /// Scopes to unwind, from a trailing `<` run in an instruction.
    pub(crate) breaks: usize,
}

impl Verdict {
    const TRUE: Verdict = Verdict {
        holds: true,
        breaks: 0,
    };
}

impl Context<'_> {
    /// Parse a stored block expression, reporting syntax errors.
    pub(crate) fn parse(&mut self, noun: &str, expression: &str) -> Chain {
        let (chain, errors) = parser::parse_chain(expression);
        for e in errors {
            self.error(noun, format!("{} in `{expression}`", e.message));
        }
        chain
    }

    /// Evaluate a stored block expression such as `[?a=x]&[!b+=y]`. An empty
    /// expression holds.
    pub(crate) fn eval_expression(&mut self, noun: &str, expression: &str) -> Verdict {
        if expression.trim().is_empty() {
            return Verdict::TRUE;
        }
        let chain = self.parse(noun, expression);
        self.eval_chain(noun, &chain)
    }

    pub(crate) fn eval_chain(&mut self, noun: &str, chain: &Chain) -> Verdict {
        let mut verdict = self.eval_segment(noun, &chain.first);
        for (connector, segment) in &chain.rest {
            match connector {
                Connector::And if !verdict.holds => return verdict,
                Connector::Or if verdict.holds => return verdict,
                _ => {}
            }
            let next = self.eval_segment(noun, segment);
            verdict = Verdict {
                holds: next.holds,
                breaks: verdict.breaks.max(next.breaks),
            };
        }
        verdict
    }

    fn eval_segment(&mut self, noun: &str, segment: &Segment) -> Verdict {
        match segment {
            Segment::Condition(condition) => Verdict {
                holds: self.eval_condition(noun, condition),
                breaks: 0,
            },
            Segment::Instruction(instruction) => {
                self.exec_instruction(noun, instruction);
                Verdict {
                    holds: true,
                    breaks: instruction.break_count,
                }
            }
            Segment::Invalid => Verdict {
                holds: false,
                breaks: 0,
            },
        }
    }

    // -- Conditions --

    fn eval_condition(&mut self, noun: &str, condition: &Condition) -> bool {
        match condition {
            Condition::Always => true,
            Condition::Bare(expr) => self.eval_expr(noun, expr).holds(),
            Condition::Compare {
                subject,
                comparison,
                value,
            } => {
                let subject = self.subject_value(noun, subject.as_ref());
                let value = match value {
                    Some(expr) => self.eval_expr(noun, expr),
                    None => Value::default(),
                };
                let holds = compare(&subject, *comparison, &value);
                tracing::trace!(noun, ?comparison, holds, "condition");
                holds
            }
        }
    }

    /// The value a condition's left side stands for. Its atoms name nouns
    /// whose values are united; a numeric or nameless side is taken as is.
    fn subject_value(&mut self, noun: &str, subject: Option<&Expr>) -> Value {
        let Some(expr) = subject else {
            return Value::text(self.value_of(noun));
        };
        let value = self.eval_expr(noun, expr);
        if value.numeric || value.props.text_values().is_empty() {
            return value;
        }
        let mut united = Value::default();
        for name in value.props.text_values() {
            let named = Value::text(self.value_of(name));
            self.combine(noun, &mut united, BinOp::Union, &named);
        }
        united
    }

    // -- Instructions --

    fn exec_instruction(&mut self, noun: &str, instruction: &Instruction) {
        match &instruction.action {
            None => {}
            Some(Action::Bare(expr)) => {
                self.eval_expr(noun, expr);
            }
            Some(Action::Apply { target, op, value }) => {
                let targets = match target {
                    Some(expr) => self.eval_expr(noun, expr).props.text_values().to_vec(),
                    None => vec![noun.to_string()],
                };
                let value = match value {
                    Some(expr) => self.eval_expr(noun, expr).props,
                    None => Properties::new(),
                };
                if targets.is_empty() {
                    self.warning(noun, "instruction names no target");
                }
                for target in &targets {
                    let changed = apply(self.value_mut(target), *op, &value);
                    tracing::debug!(noun, target = %target, ?op, changed, "instruction");
                }
            }
        }
    }

    // -- Value expressions --

    pub(crate) fn eval_expr(&mut self, noun: &str, expr: &Expr) -> Value {
        let mut acc = self.eval_term(noun, &expr.head);
        for (op, term) in &expr.tail {
            let rhs = self.eval_term(noun, term);
            self.combine(noun, &mut acc, *op, &rhs);
        }
        acc
    }

    fn eval_term(&mut self, noun: &str, term: &Term) -> Value {
        let mut items = term.0.iter();
        let Some(first) = items.next() else {
            return Value::default();
        };
        let mut acc = self.eval_item(noun, first);
        for item in items {
            let next = self.eval_item(noun, item);
            self.combine(noun, &mut acc, BinOp::Union, &next);
        }
        acc
    }

    /// Fold `rhs` into `acc`. Multiplication and division only touch the
    /// integer when the right side is numeric.
    fn combine(&mut self, noun: &str, acc: &mut Value, op: BinOp, rhs: &Value) {
        let (a, b) = (acc.props.integer(), rhs.props.integer());
        let integer = match op {
            BinOp::Union => {
                acc.props.add_values(&rhs.props);
                a.saturating_add(b)
            }
            BinOp::Difference => {
                acc.props.remove_values(&rhs.props);
                a.saturating_sub(b)
            }
            BinOp::Intersect => {
                acc.props.common_values(&rhs.props);
                if !rhs.numeric {
                    a
                } else if b == 0 {
                    self.warning(noun, "division by zero");
                    a
                } else {
                    a.checked_div(b).unwrap_or(a)
                }
            }
            BinOp::Concat => {
                acc.props.concat_values(&rhs.props);
                if rhs.numeric { a.saturating_mul(b) } else { a }
            }
        };
        acc.props.set_integer(integer);
        acc.numeric |= rhs.numeric;
    }

    fn eval_item(&mut self, noun: &str, item: &Item) -> Value {
        match item {
            Item::Primary(primary) => self.eval_primary(noun, primary),
            Item::Call { callee, args } => {
                let names = self.eval_primary(noun, callee).props;
                let mut args = match args {
                    Some(expr) => self.eval_expr(noun, expr),
                    None => Value::default(),
                };
                if names.text_values().is_empty() {
                    self.warning(noun, "call without a function name");
                    return Value::default();
                }
                for name in names.text_values() {
                    let Some(function) = Function::lookup(name) else {
                        self.unknown_function(noun, name);
                        return Value::default();
                    };
                    args = self.call(noun, function, args);
                }
                args
            }
        }
    }

    fn unknown_function(&mut self, noun: &str, name: &str) {
        let lower = name.to_lowercase();
        let suggestion = Function::ALL
            .iter()
            .map(|f| (f.name(), jaro_winkler(&lower, &f.name().to_lowercase())))
            .filter(|(_, score)| *score >= FUZZY_THRESHOLD)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        let mut message = format!("unknown function: {name}");
        if let Some((candidate, _)) = suggestion {
            message.push_str(&format!(" (did you mean \"{candidate}\"?)"));
        }
        self.error(noun, message);
    }

    fn eval_primary(&mut self, noun: &str, primary: &Primary) -> Value {
        match primary {
            Primary::Atom(atom) => Value::text(Properties::from_text(atom.clone())),
            Primary::Integer(n) => Value::number(*n),
            Primary::IntegerOf(name) => Value::number(self.value_of(name).integer()),
            Primary::Deref(name) => {
                let value = self.value_of(name);
                Value::text(Properties::from_atoms(value.text_values().iter().cloned()))
            }
            Primary::VerbCall { noun: target, verb } => {
                let target = target.as_deref().unwrap_or(noun);
                let ran = self.run_verb(target, verb);
                Value::text(Properties::from_integer(i64::from(ran)))
            }
            Primary::Group(expr) => self.eval_expr(noun, expr),
        }
    }
}

fn compare(subject: &Value, comparison: Comparison, value: &Value) -> bool {
    let numeric = subject.numeric || value.numeric;
    let number = |v: &Value| {
        if numeric {
            v.props.integer()
        } else {
            v.props.count()
        }
    };
    // `apple=#3` has no atoms to look for; it tests the integer instead
    let integer_only = value.numeric && value.props.text_values().is_empty();
    let (s, v) = (&subject.props, &value.props);
    match comparison {
        Comparison::Contains if integer_only => s.integer() == v.integer(),
        Comparison::Contains => s.contains_all(v),
        Comparison::NotContains if integer_only => s.integer() != v.integer(),
        Comparison::NotContains => !s.contains_any(v),
        Comparison::Equals => s.is_equivalent(v),
        Comparison::NotEquals => !s.is_equivalent(v),
        Comparison::EqualsOrLess => number(subject) <= number(value),
        Comparison::EqualsOrMore => number(subject) >= number(value),
        Comparison::IsMore => number(subject) > number(value),
        Comparison::IsLess => number(subject) < number(value),
    }
}

/// Apply an instruction to one target value. Returns whether it changed.
fn apply(target: &mut Properties, op: InstructionOp, value: &Properties) -> bool {
    match op {
        InstructionOp::Add => {
            let added = target.add_values(value);
            target.set_integer(target.integer().saturating_add(value.integer())) || added
        }
        InstructionOp::Remove => {
            let removed = target.remove_values(value);
            target.set_integer(target.integer().saturating_sub(value.integer())) || removed
        }
        InstructionOp::Assign => target.set_values(value),
    }
}
