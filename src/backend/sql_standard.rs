//! Standard SQL backend: renders expression trees as SQL text.
//!
//! Every rule turns one node whose arguments are already rendered into a
//! [`Rendered`] fragment carrying the binding strength of its outermost
//! operator, so enclosing operators know when to parenthesize.

use crate::backend::{Backend, Compiler};
use crate::config::RewriteConfig;
use crate::error::{Error, Result};
use crate::expression::{BinaryOperator, Expr, Operation, UnaryOperator};
use crate::rewrite::{produce, Production, Rule, Sequence};
use crate::schema::table::qualified_name;
use crate::types::literal::format_float;
use crate::types::{Literal, Rendered};
use log::{debug, info};
use strum::IntoEnumIterator;

/// Binding strength of select-list items (aliased columns, projections);
/// no operator accepts them as operands
const LIST: u8 = 0;
const NOT: u8 = 15;
/// Between `*` and `**`: `-2 ** 2` is `-(2 ** 2)`
const NEGATIVE: u8 = 45;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Associativity {
    Left,
    Right,
    Neither,
}

/// SQL spelling, binding strength and associativity of a binary operator
fn binary_syntax(op: BinaryOperator) -> (&'static str, u8, Associativity) {
    use Associativity::*;
    match op {
        BinaryOperator::Power => ("**", 50, Right),
        BinaryOperator::Multiply => ("*", 40, Left),
        BinaryOperator::Divide => ("/", 40, Left),
        BinaryOperator::FloorDivide => ("//", 40, Left),
        BinaryOperator::Modulus => ("%", 40, Left),
        BinaryOperator::Add => ("+", 30, Left),
        BinaryOperator::Subtract => ("-", 30, Left),
        BinaryOperator::Equals => ("=", 20, Neither),
        BinaryOperator::NotEquals => ("<>", 20, Neither),
        BinaryOperator::GreaterEqual => (">=", 20, Neither),
        BinaryOperator::GreaterThan => (">", 20, Neither),
        BinaryOperator::LessEqual => ("<=", 20, Neither),
        BinaryOperator::LessThan => ("<", 20, Neither),
        BinaryOperator::IdenticalTo => ("IS NOT DISTINCT FROM", 20, Neither),
        BinaryOperator::And => ("AND", 10, Left),
        BinaryOperator::Xor => ("XOR", 8, Left),
        BinaryOperator::Or => ("OR", 5, Left),
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// SQL fragment for a terminal value; lists, schemas and non-finite
/// floats have none
pub fn sql_fragment(literal: &Literal) -> Option<Rendered> {
    let text = match literal {
        Literal::Rendered(rendered) => return Some(rendered.clone()),
        Literal::Null => "NULL".to_string(),
        Literal::Boolean(true) => "TRUE".to_string(),
        Literal::Boolean(false) => "FALSE".to_string(),
        Literal::Int(value) => return Some(number(value.to_string())),
        Literal::Float(value) if value.is_finite() => return Some(number(format_float(*value))),
        Literal::Float(_) => return None,
        Literal::Decimal(value) => return Some(number(value.to_string())),
        Literal::Text(text) => quote(text),
        Literal::Date(date) => format!("DATE {}", quote(&date.to_string())),
        Literal::Time(time) => format!("TIME {}", quote(&time.to_string())),
        Literal::Timestamp(ts) => format!("TIMESTAMP {}", quote(&ts.to_string())),
        Literal::List(_) | Literal::Schema(_) => return None,
    };
    Some(Rendered::atom(text))
}

/// A negative number binds like a unary minus
fn number(text: String) -> Rendered {
    if text.starts_with('-') {
        Rendered::new(text, NEGATIVE)
    } else {
        Rendered::atom(text)
    }
}

/// Fragment of an already rewritten argument
fn operand(expr: &Expr) -> Option<Rendered> {
    sql_fragment(expr.as_literal()?).filter(|rendered| rendered.precedence > LIST)
}

fn wrap(fragment: &Rendered, parenthesize: bool) -> String {
    if parenthesize {
        format!("({})", fragment.text)
    } else {
        fragment.text.clone()
    }
}

fn rendered(text: String, precedence: u8) -> Expr {
    Expr::Literal(Literal::Rendered(Rendered::new(text, precedence)))
}

/// Typed scalars render as SQL literals
pub struct ScalarRule;

impl Rule for ScalarRule {
    fn name(&self) -> &str {
        "sql_scalar"
    }

    fn try_match<'e>(&self, expr: &'e Expr) -> Option<Production<'e>> {
        let (_, value) = expr.as_scalar()?;
        let fragment = sql_fragment(value)?;
        produce(move || Expr::Literal(Literal::Rendered(fragment)))
    }
}

/// Tables render as their qualified name
pub struct TableRule;

impl Rule for TableRule {
    fn name(&self) -> &str {
        "sql_table"
    }

    fn try_match<'e>(&self, expr: &'e Expr) -> Option<Production<'e>> {
        if expr.operation()? != &Operation::Table {
            return None;
        }
        let args = expr.args();
        let name = args.first()?.as_literal()?.as_text()?;
        let qualifier = move |index: usize| args.get(index)?.as_literal()?.as_text();
        produce(move || {
            let name = qualified_name(qualifier(2), qualifier(3), name);
            rendered(name, Rendered::ATOM)
        })
    }
}

/// Columns render as their name, or `name AS alias` in a select list
pub struct ColumnRule;

impl Rule for ColumnRule {
    fn name(&self) -> &str {
        "sql_column"
    }

    fn try_match<'e>(&self, expr: &'e Expr) -> Option<Production<'e>> {
        if expr.operation()? != &Operation::Column || !expr.args().first()?.is_terminal() {
            return None;
        }
        let name = expr.column_name()?;
        let alias = expr.alias();
        produce(move || match alias {
            Some(alias) => rendered(format!("{} AS {}", name, alias), LIST),
            None => rendered(name.to_string(), Rendered::ATOM),
        })
    }
}

/// Projections render as a comma-separated column list
pub struct ProjectionRule;

impl Rule for ProjectionRule {
    fn name(&self) -> &str {
        "sql_projection"
    }

    fn try_match<'e>(&self, expr: &'e Expr) -> Option<Production<'e>> {
        if expr.operation()? != &Operation::Projection || !expr.args().first()?.is_terminal() {
            return None;
        }
        let names = expr.projected_names()?;
        produce(move || rendered(names.join(", "), LIST))
    }
}

/// One binary operator rendered through its template
pub struct BinaryTemplate {
    op: BinaryOperator,
    name: String,
}

impl BinaryTemplate {
    pub fn new(op: BinaryOperator) -> Self {
        Self {
            op,
            name: format!("sql_{}", op),
        }
    }
}

fn render_binary(op: BinaryOperator, left: &Rendered, right: &Rendered) -> Expr {
    let (symbol, precedence, associativity) = binary_syntax(op);
    let left_parens = left.precedence < precedence
        || (left.precedence == precedence && associativity != Associativity::Left);
    // `a - -1` would open a line comment
    let right_parens = right.precedence < precedence
        || (right.precedence == precedence && associativity != Associativity::Right)
        || (symbol.ends_with('-') && right.text.starts_with('-'));
    rendered(
        format!(
            "{} {} {}",
            wrap(left, left_parens),
            symbol,
            wrap(right, right_parens)
        ),
        precedence,
    )
}

impl Rule for BinaryTemplate {
    fn name(&self) -> &str {
        &self.name
    }

    fn try_match<'e>(&self, expr: &'e Expr) -> Option<Production<'e>> {
        let (left, right) = expr.as_binary(self.op)?;
        let left = operand(left)?;
        let right = operand(right)?;
        let op = self.op;
        produce(move || render_binary(op, &left, &right))
    }
}

/// `NOT operand`
pub struct NotRule;

impl Rule for NotRule {
    fn name(&self) -> &str {
        "sql_not"
    }

    fn try_match<'e>(&self, expr: &'e Expr) -> Option<Production<'e>> {
        let (op, inner) = expr.unary_parts()?;
        if op != UnaryOperator::Not {
            return None;
        }
        let inner = operand(inner)?;
        produce(move || rendered(format!("NOT {}", wrap(&inner, inner.precedence < NOT)), NOT))
    }
}

/// User-defined nodes render as function calls: `name(arg, ...)`
pub struct FunctionRule;

impl Rule for FunctionRule {
    fn name(&self) -> &str {
        "sql_function"
    }

    fn try_match<'e>(&self, expr: &'e Expr) -> Option<Production<'e>> {
        let Operation::Function(name) = expr.operation()? else {
            return None;
        };
        let args = expr
            .args()
            .iter()
            .map(operand)
            .collect::<Option<Vec<_>>>()?;
        produce(move || {
            let args: Vec<&str> = args.iter().map(|arg| arg.text.as_str()).collect();
            rendered(format!("{}({})", name, args.join(", ")), Rendered::ATOM)
        })
    }
}

/// Rules for scalars, tables, columns, projections, functions and
/// every binary and unary operator
pub fn standard_rules() -> Sequence {
    let mut rules = Sequence::default()
        .with_rule(ScalarRule)
        .with_rule(TableRule)
        .with_rule(ColumnRule)
        .with_rule(ProjectionRule)
        .with_rule(FunctionRule)
        .with_rule(NotRule);
    for op in BinaryOperator::iter() {
        rules = rules.with_rule(BinaryTemplate::new(op));
    }
    rules
}

/// Materialized rows returned by a [`SqlRunner`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Literal>>,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Execution substrate for compiled SQL
pub trait SqlRunner: Send + Sync {
    fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    fn run(&self, sql: &str) -> Result<QueryResult>;
}

/// Logs the SQL and returns no rows
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunRunner;

impl SqlRunner for DryRunRunner {
    fn run(&self, sql: &str) -> Result<QueryResult> {
        info!("Dry run: {}", sql);
        Ok(QueryResult::default())
    }
}

/// Backend compiling expressions to standard SQL text
pub struct SqlStandard<R = DryRunRunner> {
    compiler: Compiler,
    runner: R,
}

impl SqlStandard<DryRunRunner> {
    pub fn new() -> Self {
        Self::with_config(RewriteConfig::default())
    }

    pub fn with_config(config: RewriteConfig) -> Self {
        Self::with_rules(standard_rules(), config, DryRunRunner)
    }
}

impl Default for SqlStandard<DryRunRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: SqlRunner> SqlStandard<R> {
    pub fn with_rules(rules: Sequence, config: RewriteConfig, runner: R) -> Self {
        Self {
            compiler: Compiler::new(rules, config),
            runner,
        }
    }

    /// Same rules and configuration, executing through `runner`
    pub fn with_runner<T: SqlRunner>(self, runner: T) -> SqlStandard<T> {
        SqlStandard {
            compiler: self.compiler,
            runner,
        }
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }
}

impl<R: SqlRunner> Backend for SqlStandard<R> {
    type Output = String;
    type Result = QueryResult;

    fn connect(&mut self) -> Result<()> {
        self.runner.connect()
    }

    fn compile(&self, expr: &Expr) -> Result<String> {
        let literal = self.compiler.compile(expr)?;
        let fragment = sql_fragment(&literal).ok_or_else(|| {
            Error::Backend(format!("no SQL form for value {}", literal.repr()))
        })?;
        debug!("Compiled SQL: {}", fragment.text);
        Ok(fragment.text)
    }

    fn execute(&self, expr: &Expr) -> Result<QueryResult> {
        let sql = self.compile(expr)?;
        self.runner.run(&sql)
    }
}
