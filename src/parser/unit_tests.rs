use super::api::BindingParser;
use super::api::Rule;
use super::ast::{BinaryOperator, ExpressionType, LiteralType, UnaryOperator};

use pest::consumes_to;
use pest::parses_to;
use std::rc::Rc;

fn parse(expression: &str) -> Rc<ExpressionType> {
    match BindingParser::parse_to_ast_from_str(expression) {
        Ok(ast) => ast,
        Err(e) => panic!("Failed to parse {:?}: {}", expression, e),
    }
}

fn num(n: f64) -> Rc<ExpressionType> {
    ExpressionType::literal(LiteralType::NumberLiteral(n))
}

fn string(s: &str) -> Rc<ExpressionType> {
    ExpressionType::literal(LiteralType::StringLiteral(s.to_string()))
}

#[test]
fn test_decimal_number_token() {
    parses_to! {
        parser: BindingParser,
        input: "10.5",
        rule: Rule::number,
        tokens: [
            number(0, 4)
        ]
    };
}

#[test]
fn test_single_quoted_string_token() {
    parses_to! {
        parser: BindingParser,
        input: "'ab'",
        rule: Rule::string,
        tokens: [
            string(0, 4, [
                single_quoted(1, 3)
            ])
        ]
    };
}

#[test]
fn test_literals() {
    assert_eq!(parse("42"), num(42.0));
    assert_eq!(parse(".5"), num(0.5));
    assert_eq!(parse("1e3"), num(1000.0));
    assert_eq!(parse("'it\\'s'"), string("it's"));
    assert_eq!(parse("\"a\\nb\""), string("a\nb"));
    assert_eq!(
        parse("true"),
        ExpressionType::literal(LiteralType::BooleanLiteral(true))
    );
    assert_eq!(parse("null"), ExpressionType::literal(LiteralType::NullLiteral));
    assert_eq!(parse("undefined"), ExpressionType::literal(LiteralType::Undefined));
}

#[test]
fn test_keyword_prefixed_identifiers() {
    assert_eq!(parse("trueValue"), ExpressionType::scope("trueValue", 0));
    assert_eq!(parse("index"), ExpressionType::scope("index", 0));
    assert_eq!(parse("nullable"), ExpressionType::scope("nullable", 0));
    assert_eq!(parse("$index"), ExpressionType::scope("$index", 0));
}

#[test]
fn test_member_and_keyed_access() {
    let expected = ExpressionType::keyed(
        ExpressionType::member(ExpressionType::scope("model", 0), "items"),
        num(1.0),
    );
    assert_eq!(parse("model.items[1]"), expected);
}

#[test]
fn test_optional_member() {
    assert_eq!(
        *parse("user?.name"),
        ExpressionType::AccessMember {
            object: ExpressionType::scope("user", 0),
            name: "name".to_string(),
            optional: true,
        }
    );
}

#[test]
fn test_parent_chain_becomes_ancestor_depth() {
    assert_eq!(parse("$parent.name"), ExpressionType::scope("name", 1));
    assert_eq!(parse("$parent.$parent.name"), ExpressionType::scope("name", 2));
    assert_eq!(*parse("$parent"), ExpressionType::AccessThis { ancestor: 1 });
    assert_eq!(*parse("$this"), ExpressionType::AccessThis { ancestor: 0 });
    assert_eq!(
        parse("this.name"),
        ExpressionType::member(Rc::new(ExpressionType::AccessThis { ancestor: 0 }), "name")
    );
}

#[test]
fn test_calls() {
    match &*parse("format(a, 2)") {
        ExpressionType::CallScope {
            name,
            args,
            ancestor,
        } => {
            assert_eq!(name, "format");
            assert_eq!(args.len(), 2);
            assert_eq!(*ancestor, 0);
        }
        other => panic!("Unexpected node {:?}", other),
    }
    match &*parse("$parent.save()") {
        ExpressionType::CallScope { ancestor, .. } => assert_eq!(*ancestor, 1),
        other => panic!("Unexpected node {:?}", other),
    }
    match &*parse("items.push(3)") {
        ExpressionType::CallMember { name, args, .. } => {
            assert_eq!(name, "push");
            assert_eq!(args[0], num(3.0));
        }
        other => panic!("Unexpected node {:?}", other),
    }
    assert!(matches!(
        &*parse("handlers[0]()"),
        ExpressionType::CallFunction { .. }
    ));
}

#[test]
fn test_binary_precedence() {
    let expected = Rc::new(ExpressionType::Binary {
        operator: BinaryOperator::Add,
        left: num(1.0),
        right: Rc::new(ExpressionType::Binary {
            operator: BinaryOperator::Multiply,
            left: num(2.0),
            right: num(3.0),
        }),
    });
    assert_eq!(parse("1 + 2 * 3"), expected);
    assert_eq!(parse("(1 + 2) * 3").to_string(), "((1 + 2) * 3)");
    assert_eq!(parse("a - b - c").to_string(), "((a - b) - c)");
    assert_eq!(parse("a || b && c").to_string(), "(a || (b && c))");
    assert_eq!(parse("a === b").to_string(), "(a === b)");
    assert_eq!(parse("a <= b").to_string(), "(a <= b)");
    assert_eq!(parse("'x' in obj").to_string(), "('x' in obj)");
    assert_eq!(parse("a ?? b || c").to_string(), "(a ?? (b || c))");
}

#[test]
fn test_unary() {
    assert_eq!(
        *parse("!done"),
        ExpressionType::Unary {
            operator: UnaryOperator::LogicalNot,
            operand: ExpressionType::scope("done", 0),
        }
    );
    assert_eq!(parse("typeof x").to_string(), "typeof x");
    assert_eq!(parse("-a + -b").to_string(), "(-a + -b)");
    assert_eq!(parse("!!flag").to_string(), "!!flag");
}

#[test]
fn test_conditional_is_right_associative() {
    assert_eq!(
        parse("a ? b : c ? d : e").to_string(),
        "(a ? b : (c ? d : e))"
    );
    assert_eq!(
        parse("checked ? a.message : b.message").to_string(),
        "(checked ? a.message : b.message)"
    );
}

#[test]
fn test_assignment() {
    match &*parse("items[1] = 0") {
        ExpressionType::Assign { target, value } => {
            assert!(matches!(&**target, ExpressionType::AccessKeyed { .. }));
            assert_eq!(*value, num(0.0));
        }
        other => panic!("Unexpected node {:?}", other),
    }
    assert!(BindingParser::parse_to_ast_from_str("1 = 2").is_err());
    assert!(BindingParser::parse_to_ast_from_str("a + b = 2").is_err());
}

#[test]
fn test_value_converters() {
    match &*parse("price | currency:'EUR':2 | upper") {
        ExpressionType::ValueConverter {
            expression,
            name,
            args,
        } => {
            assert_eq!(name, "upper");
            assert!(args.is_empty());
            match &**expression {
                ExpressionType::ValueConverter { name, args, .. } => {
                    assert_eq!(name, "currency");
                    assert_eq!(args, &vec![string("EUR"), num(2.0)]);
                }
                other => panic!("Unexpected node {:?}", other),
            }
        }
        other => panic!("Unexpected node {:?}", other),
    }
    assert_eq!(parse("a || b").to_string(), "(a || b)");
}

#[test]
fn test_array_and_object_literals() {
    assert_eq!(parse("[1, 'two', x]").to_string(), "[1, 'two', x]");
    assert_eq!(parse("[]").to_string(), "[]");
    assert_eq!(parse("{a: 1, 'b c': y}").to_string(), "{a: 1, b c: y}");
}

#[test]
fn test_template_literal() {
    match &*parse("`Hello ${first + ' ' + last}!`") {
        ExpressionType::Template {
            cooked,
            expressions,
        } => {
            assert_eq!(cooked, &vec!["Hello ".to_string(), "!".to_string()]);
            assert_eq!(expressions.len(), 1);
        }
        other => panic!("Unexpected node {:?}", other),
    }
}

#[test]
fn test_interpolation() {
    let parsed = BindingParser::parse_interpolation_from_str("${count} items in ${ cart.name }")
        .unwrap()
        .unwrap();
    match &*parsed {
        ExpressionType::Template {
            cooked,
            expressions,
        } => {
            assert_eq!(
                cooked,
                &vec!["".to_string(), " items in ".to_string(), "".to_string()]
            );
            assert_eq!(expressions[1].to_string(), "cart.name");
        }
        other => panic!("Unexpected node {:?}", other),
    }
    assert!(BindingParser::parse_interpolation_from_str("plain text")
        .unwrap()
        .is_none());
}

#[test]
fn test_parse_errors() {
    assert!(BindingParser::parse_to_ast_from_str("").is_err());
    assert!(BindingParser::parse_to_ast_from_str("a +").is_err());
    assert!(BindingParser::parse_to_ast_from_str("a.").is_err());
    assert!(BindingParser::parse_to_ast_from_str("(a").is_err());
}
