use std::rc::Rc;

use pest::error::{Error, ErrorVariant};
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;

use super::ast::*;

#[derive(Parser)]
#[grammar = "parser/binding_grammar.pest"] // relative to src
pub struct BindingParser;

const TAB_WIDTH: usize = 2;

impl BindingParser {
    /// Parses a single binding expression such as `items[$index] | upper`.
    pub fn parse_to_ast_from_str(expression: &str) -> Result<Rc<ExpressionType>, Error<Rule>> {
        parse_to_ast(expression)
    }

    /// Parses text containing `${}` interpolations. Text with no interpolation
    /// yields `None` so callers can keep it as a static string.
    pub fn parse_interpolation_from_str(
        text: &str,
    ) -> Result<Option<Rc<ExpressionType>>, Error<Rule>> {
        parse_interpolation(text)
    }
}

pub fn parse_to_token_tree(expression: &str) -> Result<String, String> {
    let mut tree = vec![];
    match BindingParser::parse(Rule::expression_root, expression) {
        Ok(pairs) => {
            for pair in pairs {
                tree.push(pair_to_string(pair, 0).join("\n"));
            }
        }
        Err(rule) => {
            return Err(format!("Parse error due to {:?}", rule));
        }
    }
    Ok(tree.join("\n"))
}

fn pair_to_string(pair: Pair<Rule>, level: usize) -> Vec<String> {
    let mut tree = vec![];
    let span = pair.as_span();
    let rule_name = format!(
        "{:?} => ({},{}) #{:?}",
        pair.as_rule(),
        span.start(),
        span.end(),
        span.as_str()
    );
    let string_pads = " ".repeat(level * TAB_WIDTH);
    tree.push(format!("{}{}", string_pads, rule_name));
    for child_pair in pair.into_inner() {
        tree.append(pair_to_string(child_pair, level + 1).as_mut());
    }
    tree
}

pub fn parse_to_pairs(expression: &str) -> Result<Pairs<Rule>, Error<Rule>> {
    BindingParser::parse(Rule::expression_root, expression)
}

pub fn parse_to_ast(expression: &str) -> Result<Rc<ExpressionType>, Error<Rule>> {
    let root = BindingParser::parse(Rule::expression_root, expression)?
        .next()
        .ok_or_else(|| get_custom_error("Empty expression", expression))?;
    for pair in root.into_inner() {
        if pair.as_rule() == Rule::expression {
            return build_ast_from_expression(pair);
        }
    }
    Err(get_custom_error("Empty expression", expression))
}

pub fn parse_interpolation(text: &str) -> Result<Option<Rc<ExpressionType>>, Error<Rule>> {
    let root = BindingParser::parse(Rule::interpolation_root, text)?
        .next()
        .ok_or_else(|| get_custom_error("Empty interpolation", text))?;
    let (cooked, expressions) = build_template_parts(root.into_inner(), Rule::interpolation_chars)?;
    if expressions.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Rc::new(ExpressionType::Template {
            cooked,
            expressions,
        })))
    }
}

fn get_custom_error(message: &str, input: &str) -> Error<Rule> {
    Error::new_from_pos(
        ErrorVariant::CustomError {
            message: message.to_string(),
        },
        pest::Position::from_start(input),
    )
}

fn get_unexpected_error(src: &'static str, pair: &Pair<Rule>) -> Error<Rule> {
    let message = format!("Unexpected state reached - {} - {:?}", src, pair.as_rule());
    Error::new_from_span(ErrorVariant::CustomError { message }, pair.as_span())
}

fn expect_inner<'i>(pair: &Pair<'i, Rule>) -> Result<Pair<'i, Rule>, Error<Rule>> {
    pair.clone()
        .into_inner()
        .next()
        .ok_or_else(|| get_unexpected_error("missing child", pair))
}

fn build_ast_from_expression(pair: Pair<Rule>) -> Result<Rc<ExpressionType>, Error<Rule>> {
    Ok(match pair.as_rule() {
        Rule::expression => {
            let mut inner = pair.into_inner();
            let first = inner
                .next()
                .ok_or_else(|| get_custom_error("Empty expression", ""))?;
            let mut expr = build_ast_from_expression(first)?;
            for converter in inner {
                let mut parts = converter.into_inner();
                let name = match parts.next() {
                    Some(n) => n.as_str().to_string(),
                    None => return Err(get_custom_error("Converter without name", "")),
                };
                let args = parts
                    .map(build_ast_from_expression)
                    .collect::<Result<Vec<_>, _>>()?;
                expr = Rc::new(ExpressionType::ValueConverter {
                    expression: expr,
                    name,
                    args,
                });
            }
            expr
        }
        Rule::assignment => {
            let mut inner = pair.clone().into_inner();
            let target = build_ast_from_expression(
                inner
                    .next()
                    .ok_or_else(|| get_unexpected_error("assignment", &pair))?,
            )?;
            match inner.next() {
                None => target,
                Some(value) => {
                    if !target.is_assignable() {
                        return Err(Error::new_from_span(
                            ErrorVariant::CustomError {
                                message: format!("Expression '{}' is not assignable", target),
                            },
                            pair.as_span(),
                        ));
                    }
                    Rc::new(ExpressionType::Assign {
                        target,
                        value: build_ast_from_expression(value)?,
                    })
                }
            }
        }
        Rule::conditional => {
            let mut inner = pair.clone().into_inner();
            let condition = build_ast_from_expression(
                inner
                    .next()
                    .ok_or_else(|| get_unexpected_error("conditional", &pair))?,
            )?;
            match (inner.next(), inner.next()) {
                (Some(yes), Some(no)) => Rc::new(ExpressionType::Conditional {
                    condition,
                    yes: build_ast_from_expression(yes)?,
                    no: build_ast_from_expression(no)?,
                }),
                _ => condition,
            }
        }
        Rule::nullish
        | Rule::logical_or
        | Rule::logical_and
        | Rule::equality
        | Rule::relational
        | Rule::additive
        | Rule::multiplicative => build_ast_from_binary_chain(pair)?,
        Rule::unary => build_ast_from_unary(pair)?,
        Rule::postfix => build_ast_from_postfix(pair)?,
        _ => build_ast_from_primary(pair)?,
    })
}

fn build_ast_from_binary_chain(pair: Pair<Rule>) -> Result<Rc<ExpressionType>, Error<Rule>> {
    let mut inner = pair.clone().into_inner();
    let mut left = build_ast_from_expression(
        inner
            .next()
            .ok_or_else(|| get_unexpected_error("binary chain", &pair))?,
    )?;
    while let Some(op_pair) = inner.next() {
        let operator = BinaryOperator::from_token(op_pair.as_str().trim())
            .ok_or_else(|| get_unexpected_error("binary operator", &op_pair))?;
        let right_pair = inner
            .next()
            .ok_or_else(|| get_unexpected_error("binary operand", &op_pair))?;
        let right = build_ast_from_expression(right_pair)?;
        left = Rc::new(ExpressionType::Binary {
            operator,
            left,
            right,
        });
    }
    Ok(left)
}

fn build_ast_from_unary(pair: Pair<Rule>) -> Result<Rc<ExpressionType>, Error<Rule>> {
    let mut operators = vec![];
    let mut operand = None;
    for p in pair.clone().into_inner() {
        if p.as_rule() == Rule::op_unary {
            operators.push(
                UnaryOperator::from_token(p.as_str().trim())
                    .ok_or_else(|| get_unexpected_error("unary operator", &p))?,
            );
        } else {
            operand = Some(build_ast_from_expression(p)?);
        }
    }
    let mut expr = operand.ok_or_else(|| get_unexpected_error("unary operand", &pair))?;
    for operator in operators.into_iter().rev() {
        expr = Rc::new(ExpressionType::Unary {
            operator,
            operand: expr,
        });
    }
    Ok(expr)
}

fn build_arguments(pair: Pair<Rule>) -> Result<Vec<Rc<ExpressionType>>, Error<Rule>> {
    pair.into_inner().map(build_ast_from_expression).collect()
}

fn build_ast_from_postfix(pair: Pair<Rule>) -> Result<Rc<ExpressionType>, Error<Rule>> {
    let mut inner = pair.clone().into_inner();
    let mut expr = build_ast_from_expression(
        inner
            .next()
            .ok_or_else(|| get_unexpected_error("postfix", &pair))?,
    )?;
    for op in inner {
        expr = match op.as_rule() {
            Rule::member | Rule::optional_member => {
                let optional = op.as_rule() == Rule::optional_member;
                let name = expect_inner(&op)?.as_str().to_string();
                match &*expr {
                    ExpressionType::AccessThis { ancestor } if *ancestor > 0 && !optional => {
                        Rc::new(ExpressionType::AccessScope {
                            name,
                            ancestor: *ancestor,
                        })
                    }
                    _ => Rc::new(ExpressionType::AccessMember {
                        object: expr.clone(),
                        name,
                        optional,
                    }),
                }
            }
            Rule::keyed => Rc::new(ExpressionType::AccessKeyed {
                object: expr.clone(),
                key: build_ast_from_expression(expect_inner(&op)?)?,
            }),
            Rule::call => {
                let args = build_arguments(op)?;
                match &*expr {
                    ExpressionType::AccessScope { name, ancestor } => {
                        Rc::new(ExpressionType::CallScope {
                            name: name.clone(),
                            args,
                            ancestor: *ancestor,
                        })
                    }
                    ExpressionType::AccessMember {
                        object,
                        name,
                        optional: false,
                    } => Rc::new(ExpressionType::CallMember {
                        object: object.clone(),
                        name: name.clone(),
                        args,
                    }),
                    _ => Rc::new(ExpressionType::CallFunction {
                        func: expr.clone(),
                        args,
                    }),
                }
            }
            _ => return Err(get_unexpected_error("postfix operator", &op)),
        };
    }
    Ok(expr)
}

fn build_ast_from_primary(pair: Pair<Rule>) -> Result<Rc<ExpressionType>, Error<Rule>> {
    Ok(match pair.as_rule() {
        Rule::number => {
            let n = pair
                .as_str()
                .parse::<f64>()
                .map_err(|e| get_unexpected_error_with_message(&pair, e.to_string()))?;
            ExpressionType::literal(LiteralType::NumberLiteral(n))
        }
        Rule::string => {
            ExpressionType::literal(LiteralType::StringLiteral(string_literal_value(&pair)?))
        }
        Rule::boolean => ExpressionType::literal(LiteralType::BooleanLiteral(
            pair.as_str() == "true",
        )),
        Rule::null_lit => ExpressionType::literal(LiteralType::NullLiteral),
        Rule::undefined_lit => ExpressionType::literal(LiteralType::Undefined),
        Rule::this_ref => Rc::new(ExpressionType::AccessThis { ancestor: 0 }),
        Rule::parent_chain => Rc::new(ExpressionType::AccessThis {
            ancestor: pair.into_inner().count() as u32,
        }),
        Rule::identifier => ExpressionType::scope(pair.as_str(), 0),
        Rule::template => {
            let (cooked, expressions) = build_template_parts(pair.into_inner(), Rule::template_chars)?;
            Rc::new(ExpressionType::Template {
                cooked,
                expressions,
            })
        }
        Rule::array_literal => Rc::new(ExpressionType::ArrayLiteral(build_arguments(pair)?)),
        Rule::object_literal => {
            let mut entries = vec![];
            for entry in pair.into_inner() {
                let mut parts = entry.clone().into_inner();
                let (key, value) = match (parts.next(), parts.next()) {
                    (Some(k), Some(v)) => (k, v),
                    _ => return Err(get_unexpected_error("object entry", &entry)),
                };
                let key = match key.as_rule() {
                    Rule::string => string_literal_value(&key)?,
                    _ => key.as_str().to_string(),
                };
                entries.push((key, build_ast_from_expression(value)?));
            }
            Rc::new(ExpressionType::ObjectLiteral(entries))
        }
        Rule::expression
        | Rule::assignment
        | Rule::conditional
        | Rule::unary
        | Rule::postfix => build_ast_from_expression(pair)?,
        _ => return Err(get_unexpected_error("primary", &pair)),
    })
}

fn get_unexpected_error_with_message(pair: &Pair<Rule>, message: String) -> Error<Rule> {
    Error::new_from_span(ErrorVariant::CustomError { message }, pair.as_span())
}

fn build_template_parts(
    pairs: Pairs<Rule>,
    chars_rule: Rule,
) -> Result<(Vec<String>, Vec<Rc<ExpressionType>>), Error<Rule>> {
    let mut cooked = vec![String::new()];
    let mut expressions = vec![];
    for part in pairs {
        let rule = part.as_rule();
        if rule == chars_rule {
            if let Some(last) = cooked.last_mut() {
                if chars_rule == Rule::template_chars {
                    last.push_str(&unescape(part.as_str()));
                } else {
                    last.push_str(part.as_str());
                }
            }
        } else if rule == Rule::template_substitution {
            expressions.push(build_ast_from_expression(expect_inner(&part)?)?);
            cooked.push(String::new());
        } else if rule != Rule::EOI {
            return Err(get_unexpected_error("template part", &part));
        }
    }
    Ok((cooked, expressions))
}

fn string_literal_value(pair: &Pair<Rule>) -> Result<String, Error<Rule>> {
    Ok(unescape(expect_inner(pair)?.as_str()))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
