//! Binding expression AST.
//!
//! Nodes are immutable once built and are shared between every binding created
//! from the same template instruction, hence the `Rc` children.

use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralType {
    Undefined,
    NullLiteral,
    BooleanLiteral(bool),
    NumberLiteral(f64),
    StringLiteral(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    LooselyEqual,
    LooselyUnequal,
    StrictlyEqual,
    StrictlyUnequal,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
    In,
    LogicalAnd,
    LogicalOr,
    NullishCoalescing,
}

impl BinaryOperator {
    /// Operators whose right operand is only evaluated on demand.
    pub fn is_short_circuit(&self) -> bool {
        matches!(
            self,
            BinaryOperator::LogicalAnd
                | BinaryOperator::LogicalOr
                | BinaryOperator::NullishCoalescing
        )
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "+" => BinaryOperator::Add,
            "-" => BinaryOperator::Subtract,
            "*" => BinaryOperator::Multiply,
            "/" => BinaryOperator::Divide,
            "%" => BinaryOperator::Modulo,
            "==" => BinaryOperator::LooselyEqual,
            "!=" => BinaryOperator::LooselyUnequal,
            "===" => BinaryOperator::StrictlyEqual,
            "!==" => BinaryOperator::StrictlyUnequal,
            "<" => BinaryOperator::LessThan,
            ">" => BinaryOperator::GreaterThan,
            "<=" => BinaryOperator::LessThanEqual,
            ">=" => BinaryOperator::GreaterThanEqual,
            "in" => BinaryOperator::In,
            "&&" => BinaryOperator::LogicalAnd,
            "||" => BinaryOperator::LogicalOr,
            "??" => BinaryOperator::NullishCoalescing,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::LooselyEqual => "==",
            BinaryOperator::LooselyUnequal => "!=",
            BinaryOperator::StrictlyEqual => "===",
            BinaryOperator::StrictlyUnequal => "!==",
            BinaryOperator::LessThan => "<",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::LessThanEqual => "<=",
            BinaryOperator::GreaterThanEqual => ">=",
            BinaryOperator::In => "in",
            BinaryOperator::LogicalAnd => "&&",
            BinaryOperator::LogicalOr => "||",
            BinaryOperator::NullishCoalescing => "??",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    LogicalNot,
    Minus,
    Plus,
    TypeOf,
    Void,
}

impl UnaryOperator {
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "!" => UnaryOperator::LogicalNot,
            "-" => UnaryOperator::Minus,
            "+" => UnaryOperator::Plus,
            "typeof" => UnaryOperator::TypeOf,
            "void" => UnaryOperator::Void,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::LogicalNot => "!",
            UnaryOperator::Minus => "-",
            UnaryOperator::Plus => "+",
            UnaryOperator::TypeOf => "typeof ",
            UnaryOperator::Void => "void ",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionType {
    Literal(LiteralType),
    ArrayLiteral(Vec<Rc<ExpressionType>>),
    ObjectLiteral(Vec<(String, Rc<ExpressionType>)>),
    /// `this` / `$this` (ancestor 0) or a bare `$parent` chain.
    AccessThis {
        ancestor: u32,
    },
    /// A name resolved against the scope chain; `ancestor` counts `$parent` hops.
    AccessScope {
        name: String,
        ancestor: u32,
    },
    AccessMember {
        object: Rc<ExpressionType>,
        name: String,
        optional: bool,
    },
    AccessKeyed {
        object: Rc<ExpressionType>,
        key: Rc<ExpressionType>,
    },
    CallScope {
        name: String,
        args: Vec<Rc<ExpressionType>>,
        ancestor: u32,
    },
    CallMember {
        object: Rc<ExpressionType>,
        name: String,
        args: Vec<Rc<ExpressionType>>,
    },
    CallFunction {
        func: Rc<ExpressionType>,
        args: Vec<Rc<ExpressionType>>,
    },
    Conditional {
        condition: Rc<ExpressionType>,
        yes: Rc<ExpressionType>,
        no: Rc<ExpressionType>,
    },
    Binary {
        operator: BinaryOperator,
        left: Rc<ExpressionType>,
        right: Rc<ExpressionType>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Rc<ExpressionType>,
    },
    Assign {
        target: Rc<ExpressionType>,
        value: Rc<ExpressionType>,
    },
    /// Backtick templates and `${}` interpolations. `cooked` always holds
    /// exactly one more part than `expressions`.
    Template {
        cooked: Vec<String>,
        expressions: Vec<Rc<ExpressionType>>,
    },
    ValueConverter {
        expression: Rc<ExpressionType>,
        name: String,
        args: Vec<Rc<ExpressionType>>,
    },
}

impl ExpressionType {
    pub fn literal(value: LiteralType) -> Rc<Self> {
        Rc::new(ExpressionType::Literal(value))
    }

    pub fn scope(name: impl Into<String>, ancestor: u32) -> Rc<Self> {
        Rc::new(ExpressionType::AccessScope {
            name: name.into(),
            ancestor,
        })
    }

    pub fn member(object: Rc<Self>, name: impl Into<String>) -> Rc<Self> {
        Rc::new(ExpressionType::AccessMember {
            object,
            name: name.into(),
            optional: false,
        })
    }

    pub fn keyed(object: Rc<Self>, key: Rc<Self>) -> Rc<Self> {
        Rc::new(ExpressionType::AccessKeyed { object, key })
    }

    /// Only scope, member and keyed accesses (and converters wrapping them) can
    /// receive a value.
    pub fn is_assignable(&self) -> bool {
        match self {
            ExpressionType::AccessScope { .. }
            | ExpressionType::AccessMember { .. }
            | ExpressionType::AccessKeyed { .. } => true,
            ExpressionType::ValueConverter { expression, .. } => expression.is_assignable(),
            _ => false,
        }
    }
}

fn write_args(f: &mut Formatter<'_>, args: &[Rc<ExpressionType>]) -> fmt::Result {
    write!(f, "(")?;
    for (i, a) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", a)?;
    }
    write!(f, ")")
}

fn write_ancestor(f: &mut Formatter<'_>, ancestor: u32) -> fmt::Result {
    for _ in 0..ancestor {
        write!(f, "$parent.")?;
    }
    Ok(())
}

/// Unparses back to expression source; used in error messages and logs.
impl Display for ExpressionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionType::Literal(l) => match l {
                LiteralType::Undefined => write!(f, "undefined"),
                LiteralType::NullLiteral => write!(f, "null"),
                LiteralType::BooleanLiteral(b) => write!(f, "{}", b),
                LiteralType::NumberLiteral(n) => write!(f, "{}", n),
                LiteralType::StringLiteral(s) => write!(f, "'{}'", s.replace('\'', "\\'")),
            },
            ExpressionType::ArrayLiteral(elements) => {
                write!(f, "[")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, "]")
            }
            ExpressionType::ObjectLiteral(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            ExpressionType::AccessThis { ancestor } => {
                if *ancestor == 0 {
                    write!(f, "$this")
                } else {
                    for i in 0..*ancestor {
                        if i > 0 {
                            write!(f, ".")?;
                        }
                        write!(f, "$parent")?;
                    }
                    Ok(())
                }
            }
            ExpressionType::AccessScope { name, ancestor } => {
                write_ancestor(f, *ancestor)?;
                write!(f, "{}", name)
            }
            ExpressionType::AccessMember {
                object,
                name,
                optional,
            } => write!(f, "{}{}{}", object, if *optional { "?." } else { "." }, name),
            ExpressionType::AccessKeyed { object, key } => write!(f, "{}[{}]", object, key),
            ExpressionType::CallScope {
                name,
                args,
                ancestor,
            } => {
                write_ancestor(f, *ancestor)?;
                write!(f, "{}", name)?;
                write_args(f, args)
            }
            ExpressionType::CallMember { object, name, args } => {
                write!(f, "{}.{}", object, name)?;
                write_args(f, args)
            }
            ExpressionType::CallFunction { func, args } => {
                write!(f, "{}", func)?;
                write_args(f, args)
            }
            ExpressionType::Conditional { condition, yes, no } => {
                write!(f, "({} ? {} : {})", condition, yes, no)
            }
            ExpressionType::Binary {
                operator,
                left,
                right,
            } => write!(f, "({} {} {})", left, operator.as_str(), right),
            ExpressionType::Unary { operator, operand } => {
                write!(f, "{}{}", operator.as_str(), operand)
            }
            ExpressionType::Assign { target, value } => write!(f, "{} = {}", target, value),
            ExpressionType::Template {
                cooked,
                expressions,
            } => {
                write!(f, "`")?;
                for (i, part) in cooked.iter().enumerate() {
                    write!(f, "{}", part)?;
                    if let Some(e) = expressions.get(i) {
                        write!(f, "${{{}}}", e)?;
                    }
                }
                write!(f, "`")
            }
            ExpressionType::ValueConverter {
                expression,
                name,
                args,
            } => {
                write!(f, "{} | {}", expression, name)?;
                for a in args {
                    write!(f, ":{}", a)?;
                }
                Ok(())
            }
        }
    }
}
