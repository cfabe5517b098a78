//! Recursive-descent parser for script cells.

use super::ast::{BinOp, BoolOp, CmpOp, Expr, Stmt, StmtKind, Target, UnaryOp};
use super::error::ScriptError;
use super::lexer::{MAX_PAREN_LEVEL, Tok, Token, tokenize};
use super::value::Value;

const KEYWORDS: &[&str] = &[
    "and", "as", "break", "class", "continue", "def", "del", "elif", "else", "for", "from", "if",
    "import", "in", "is", "lambda", "not", "or", "pass", "return", "while", "with", "yield",
];

/// Parse cell source into statements.
pub fn parse_program(source: &str) -> Result<Vec<Stmt>, ScriptError> {
    let tokens = tokenize(source)?;
    Parser {
        tokens,
        pos: 0,
        depth: 0,
    }
    .program()
}

type PResult<T> = Result<T, ScriptError>;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Nested expressions and unary operators currently open
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Tok {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Tok {
        self.tokens
            .get(self.pos + offset)
            .map(|t| &t.tok)
            .unwrap_or(&Tok::Eof)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn advance(&mut self) -> Tok {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    /// Run `parse` one nesting level deeper, refusing to recurse past the limit.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= MAX_PAREN_LEVEL {
            return Err(ScriptError::syntax(self.line(), "too many nested parentheses"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn is_op(&self, op: &str) -> bool {
        matches!(self.peek(), Tok::Op(o) if *o == op)
    }

    fn is_keyword(&self, kw: &str) -> bool {
        matches!(self.peek(), Tok::Name(n) if n == kw)
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.is_op(op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.is_keyword(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: &str) -> PResult<()> {
        if self.eat_op(op) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{op}'")))
        }
    }

    fn expect_keyword(&mut self, kw: &str) -> PResult<()> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{kw}'")))
        }
    }

    fn expect_name(&mut self) -> PResult<String> {
        match self.peek() {
            Tok::Name(n) if !KEYWORDS.contains(&n.as_str()) => {
                let n = n.clone();
                self.pos += 1;
                Ok(n)
            }
            _ => Err(self.unexpected("a name")),
        }
    }

    fn unexpected(&self, expected: &str) -> ScriptError {
        let found = match self.peek() {
            Tok::Name(n) => format!("'{n}'"),
            Tok::Int(i) => i.to_string(),
            Tok::Float(f) => f.to_string(),
            Tok::Str(_) => "string".to_string(),
            Tok::Op(o) => format!("'{o}'"),
            Tok::Newline => "end of line".to_string(),
            Tok::Indent => "unexpected indent".to_string(),
            Tok::Dedent => "dedent".to_string(),
            Tok::Eof => "end of input".to_string(),
        };
        ScriptError::syntax(
            self.line(),
            format!("invalid syntax: expected {expected}, found {found}"),
        )
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn program(&mut self) -> PResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        loop {
            while matches!(self.peek(), Tok::Newline) {
                self.pos += 1;
            }
            match self.peek() {
                Tok::Eof => break,
                Tok::Indent => {
                    return Err(ScriptError::new(
                        super::error::ErrorKind::IndentationError,
                        "unexpected indent",
                    )
                    .at_line(self.line()));
                }
                _ => stmts.extend(self.statement()?),
            }
        }
        Ok(stmts)
    }

    fn statement(&mut self) -> PResult<Vec<Stmt>> {
        let line = self.line();
        let kind = match self.peek() {
            Tok::Name(n) if n == "for" => self.for_stmt()?,
            Tok::Name(n) if n == "while" => self.while_stmt()?,
            Tok::Name(n) if n == "if" => self.if_stmt()?,
            _ => return self.simple_line(),
        };
        Ok(vec![Stmt { kind, line }])
    }

    /// One or more `;`-separated simple statements ending the logical line.
    fn simple_line(&mut self) -> PResult<Vec<Stmt>> {
        let mut stmts = self.simple_stmt()?;
        while self.eat_op(";") {
            if matches!(self.peek(), Tok::Newline | Tok::Eof) {
                break;
            }
            stmts.extend(self.simple_stmt()?);
        }
        match self.peek() {
            Tok::Newline => {
                self.pos += 1;
                Ok(stmts)
            }
            Tok::Eof | Tok::Dedent => Ok(stmts),
            _ => Err(self.unexpected("end of line")),
        }
    }

    fn simple_stmt(&mut self) -> PResult<Vec<Stmt>> {
        let line = self.line();
        let single = |kind: StmtKind| -> PResult<Vec<Stmt>> { Ok(vec![Stmt { kind, line }]) };

        if self.eat_keyword("pass") {
            return single(StmtKind::Pass);
        }
        if self.eat_keyword("break") {
            return single(StmtKind::Break);
        }
        if self.eat_keyword("continue") {
            return single(StmtKind::Continue);
        }
        if self.eat_keyword("import") {
            return self.import_stmt(line);
        }
        if self.eat_keyword("from") {
            return single(self.from_import()?);
        }
        if let Tok::Name(n) = self.peek()
            && KEYWORDS.contains(&n.as_str())
            && !matches!(n.as_str(), "not" | "lambda")
        {
            return Err(ScriptError::syntax(
                line,
                format!("invalid syntax: '{n}' is not supported here"),
            ));
        }

        let first = self.expr_list()?;

        if self.is_op("=") {
            let mut targets = Vec::new();
            let mut value = first;
            while self.eat_op("=") {
                targets.push(to_target(value, line)?);
                value = self.expr_list()?;
            }
            return single(StmtKind::Assign { targets, value });
        }

        let aug = match self.peek() {
            Tok::Op("+=") => Some(BinOp::Add),
            Tok::Op("-=") => Some(BinOp::Sub),
            Tok::Op("*=") => Some(BinOp::Mul),
            Tok::Op("/=") => Some(BinOp::Div),
            Tok::Op("//=") => Some(BinOp::FloorDiv),
            Tok::Op("%=") => Some(BinOp::Mod),
            Tok::Op("**=") => Some(BinOp::Pow),
            _ => None,
        };
        if let Some(op) = aug {
            self.pos += 1;
            let target = to_target(first, line)?;
            if matches!(target, Target::Tuple(_)) {
                return Err(ScriptError::syntax(
                    line,
                    "illegal expression for augmented assignment",
                ));
            }
            let value = self.expr_list()?;
            return single(StmtKind::AugAssign { target, op, value });
        }

        single(StmtKind::Expr(first))
    }

    fn dotted_name(&mut self) -> PResult<String> {
        let mut parts = vec![self.expect_name()?];
        while self.eat_op(".") {
            parts.push(self.expect_name()?);
        }
        Ok(parts.join("."))
    }

    fn import_stmt(&mut self, line: usize) -> PResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        loop {
            let module = self.dotted_name()?;
            let alias = if self.eat_keyword("as") {
                Some(self.expect_name()?)
            } else {
                None
            };
            stmts.push(Stmt {
                kind: StmtKind::Import { module, alias },
                line,
            });
            if !self.eat_op(",") {
                break;
            }
        }
        Ok(stmts)
    }

    fn from_import(&mut self) -> PResult<StmtKind> {
        let module = self.dotted_name()?;
        self.expect_keyword("import")?;
        let parenthesized = self.eat_op("(");

        let mut names = Vec::new();
        loop {
            if self.is_op("*") {
                return Err(ScriptError::syntax(self.line(), "wildcard imports are not supported"));
            }
            let name = self.expect_name()?;
            let alias = if self.eat_keyword("as") {
                Some(self.expect_name()?)
            } else {
                None
            };
            names.push((name, alias));
            if !self.eat_op(",") {
                break;
            }
            if parenthesized && self.is_op(")") {
                break;
            }
        }

        if parenthesized {
            self.expect_op(")")?;
        }
        Ok(StmtKind::FromImport { module, names })
    }

    fn for_stmt(&mut self) -> PResult<StmtKind> {
        self.expect_keyword("for")?;
        let line = self.line();

        // Targets are parsed below comparison level so `in` is not consumed
        let mut items = vec![self.postfix()?];
        let mut is_tuple = false;
        while self.eat_op(",") {
            is_tuple = true;
            if self.is_keyword("in") {
                break;
            }
            items.push(self.postfix()?);
        }
        let target_expr = if is_tuple {
            Expr::Tuple(items)
        } else {
            items.remove(0)
        };
        let target = to_target(target_expr, line)?;

        self.expect_keyword("in")?;
        let iter = self.expr_list()?;
        self.expect_op(":")?;
        let body = self.suite()?;
        Ok(StmtKind::For { target, iter, body })
    }

    fn while_stmt(&mut self) -> PResult<StmtKind> {
        self.expect_keyword("while")?;
        let cond = self.expr()?;
        self.expect_op(":")?;
        let body = self.suite()?;
        Ok(StmtKind::While { cond, body })
    }

    fn if_stmt(&mut self) -> PResult<StmtKind> {
        self.expect_keyword("if")?;
        let mut branches = Vec::new();
        let cond = self.expr()?;
        self.expect_op(":")?;
        branches.push((cond, self.suite()?));

        let mut orelse = Vec::new();
        loop {
            if self.eat_keyword("elif") {
                let cond = self.expr()?;
                self.expect_op(":")?;
                branches.push((cond, self.suite()?));
            } else if self.eat_keyword("else") {
                self.expect_op(":")?;
                orelse = self.suite()?;
                break;
            } else {
                break;
            }
        }
        Ok(StmtKind::If { branches, orelse })
    }

    /// An indented block, or a simple statement on the same line.
    fn suite(&mut self) -> PResult<Vec<Stmt>> {
        if !matches!(self.peek(), Tok::Newline) {
            return self.simple_line();
        }
        self.pos += 1;
        if !matches!(self.peek(), Tok::Indent) {
            return Err(ScriptError::new(
                super::error::ErrorKind::IndentationError,
                "expected an indented block",
            )
            .at_line(self.line()));
        }
        self.pos += 1;

        let mut body = Vec::new();
        loop {
            match self.peek() {
                Tok::Dedent => {
                    self.pos += 1;
                    break;
                }
                Tok::Eof => break,
                Tok::Newline => self.pos += 1,
                _ => body.extend(self.statement()?),
            }
        }
        Ok(body)
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Comma-separated expressions; more than one (or a trailing comma) forms a tuple.
    fn expr_list(&mut self) -> PResult<Expr> {
        let first = self.expr()?;
        if !self.is_op(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.at_expr_end() {
                break;
            }
            items.push(self.expr()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn at_expr_end(&self) -> bool {
        matches!(
            self.peek(),
            Tok::Newline | Tok::Eof | Tok::Op("=") | Tok::Op(")") | Tok::Op("]") | Tok::Op(":") | Tok::Op(";")
        )
    }

    fn expr(&mut self) -> PResult<Expr> {
        self.nested(Self::or_expr)
    }

    fn or_expr(&mut self) -> PResult<Expr> {
        let mut left = self.and_expr()?;
        while self.eat_keyword("or") {
            let right = self.and_expr()?;
            left = Expr::BoolOp {
                op: BoolOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> PResult<Expr> {
        let mut left = self.not_expr()?;
        while self.eat_keyword("and") {
            let right = self.not_expr()?;
            left = Expr::BoolOp {
                op: BoolOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> PResult<Expr> {
        if self.eat_keyword("not") {
            let operand = self.nested(Self::not_expr)?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> PResult<Expr> {
        let left = self.arith()?;
        let mut ops = Vec::new();
        loop {
            let op = match self.peek() {
                Tok::Op("==") => CmpOp::Eq,
                Tok::Op("!=") => CmpOp::NotEq,
                Tok::Op("<") => CmpOp::Lt,
                Tok::Op("<=") => CmpOp::LtE,
                Tok::Op(">") => CmpOp::Gt,
                Tok::Op(">=") => CmpOp::GtE,
                Tok::Name(n) if n == "in" => CmpOp::In,
                Tok::Name(n) if n == "is" => {
                    if matches!(self.peek_at(1), Tok::Name(m) if m == "not") {
                        self.pos += 1;
                        CmpOp::IsNot
                    } else {
                        CmpOp::Is
                    }
                }
                Tok::Name(n)
                    if n == "not" && matches!(self.peek_at(1), Tok::Name(m) if m == "in") =>
                {
                    self.pos += 1;
                    CmpOp::NotIn
                }
                _ => break,
            };
            self.pos += 1;
            ops.push((op, self.arith()?));
        }

        if ops.is_empty() {
            Ok(left)
        } else {
            Ok(Expr::Compare {
                left: Box::new(left),
                ops,
            })
        }
    }

    fn arith(&mut self) -> PResult<Expr> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Tok::Op("+") => BinOp::Add,
                Tok::Op("-") => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.term()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn term(&mut self) -> PResult<Expr> {
        let mut left = self.factor()?;
        loop {
            let op = match self.peek() {
                Tok::Op("*") => BinOp::Mul,
                Tok::Op("/") => BinOp::Div,
                Tok::Op("//") => BinOp::FloorDiv,
                Tok::Op("%") => BinOp::Mod,
                _ => break,
            };
            self.pos += 1;
            let right = self.factor()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn factor(&mut self) -> PResult<Expr> {
        let op = match self.peek() {
            Tok::Op("-") => Some(UnaryOp::Neg),
            Tok::Op("+") => Some(UnaryOp::Pos),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let operand = self.nested(Self::factor)?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }
        self.power()
    }

    fn power(&mut self) -> PResult<Expr> {
        let base = self.postfix()?;
        if self.eat_op("**") {
            // Right-associative, binds tighter than unary minus on the left
            let exponent = self.nested(Self::factor)?;
            return Ok(binary(BinOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.atom()?;
        loop {
            if self.eat_op(".") {
                let name = self.expect_name()?;
                expr = Expr::Attribute {
                    object: Box::new(expr),
                    name,
                };
            } else if self.eat_op("(") {
                let (args, kwargs) = self.call_args()?;
                expr = Expr::Call {
                    func: Box::new(expr),
                    args,
                    kwargs,
                };
            } else if self.eat_op("[") {
                let index = self.expr_list()?;
                self.expect_op("]")?;
                expr = Expr::Subscript {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn call_args(&mut self) -> PResult<(Vec<Expr>, Vec<(String, Expr)>)> {
        let mut args = Vec::new();
        let mut kwargs: Vec<(String, Expr)> = Vec::new();

        while !self.is_op(")") {
            let is_keyword_arg = matches!(self.peek(), Tok::Name(_))
                && matches!(self.peek_at(1), Tok::Op("="));
            if is_keyword_arg {
                let name = self.expect_name()?;
                self.expect_op("=")?;
                if kwargs.iter().any(|(k, _)| *k == name) {
                    return Err(ScriptError::syntax(
                        self.line(),
                        format!("keyword argument repeated: {name}"),
                    ));
                }
                kwargs.push((name, self.expr()?));
            } else {
                if !kwargs.is_empty() {
                    return Err(ScriptError::syntax(
                        self.line(),
                        "positional argument follows keyword argument",
                    ));
                }
                args.push(self.expr()?);
            }
            if !self.eat_op(",") {
                break;
            }
        }
        self.expect_op(")")?;
        Ok((args, kwargs))
    }

    fn atom(&mut self) -> PResult<Expr> {
        let line = self.line();
        match self.advance() {
            Tok::Int(i) => Ok(Expr::Const(Value::Int(i))),
            Tok::Float(f) => Ok(Expr::Const(Value::Float(f))),
            Tok::Str(s) => {
                // Adjacent literals concatenate
                let mut s = s;
                while let Tok::Str(next) = self.peek() {
                    s.push_str(next);
                    self.pos += 1;
                }
                Ok(Expr::Const(Value::Str(s)))
            }
            Tok::Name(n) => match n.as_str() {
                "True" => Ok(Expr::Const(Value::Bool(true))),
                "False" => Ok(Expr::Const(Value::Bool(false))),
                "None" => Ok(Expr::Const(Value::None)),
                kw if KEYWORDS.contains(&kw) => Err(ScriptError::syntax(
                    line,
                    format!("invalid syntax: unexpected keyword '{kw}'"),
                )),
                _ => Ok(Expr::Name(n)),
            },
            Tok::Op("(") => {
                if self.eat_op(")") {
                    return Ok(Expr::Tuple(Vec::new()));
                }
                let inner = self.expr_list()?;
                self.expect_op(")")?;
                Ok(inner)
            }
            Tok::Op("[") => {
                let items = self.sequence("]")?;
                Ok(Expr::List(items))
            }
            Tok::Op("{") => {
                let mut pairs = Vec::new();
                while !self.is_op("}") {
                    let key = self.expr()?;
                    self.expect_op(":")?;
                    let value = self.expr()?;
                    pairs.push((key, value));
                    if !self.eat_op(",") {
                        break;
                    }
                }
                self.expect_op("}")?;
                Ok(Expr::Dict(pairs))
            }
            _ => {
                self.pos = self.pos.saturating_sub(1);
                Err(self.unexpected("an expression"))
            }
        }
    }

    fn sequence(&mut self, close: &str) -> PResult<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.is_op(close) {
            items.push(self.expr()?);
            if !self.eat_op(",") {
                break;
            }
        }
        self.expect_op(close)?;
        Ok(items)
    }
}

fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Convert a parsed expression into an assignment target.
fn to_target(expr: Expr, line: usize) -> PResult<Target> {
    match expr {
        Expr::Name(name) => Ok(Target::Name(name)),
        Expr::Tuple(items) | Expr::List(items) => Ok(Target::Tuple(
            items
                .into_iter()
                .map(|item| to_target(item, line))
                .collect::<PResult<_>>()?,
        )),
        Expr::Attribute { object, name } => Ok(Target::Attribute {
            object: *object,
            name,
        }),
        Expr::Subscript { object, index } => Ok(Target::Subscript {
            object: *object,
            index: *index,
        }),
        Expr::Call { .. } => Err(ScriptError::syntax(line, "cannot assign to function call")),
        _ => Err(ScriptError::syntax(line, "cannot assign to expression")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Vec<Stmt> {
        parse_program(source).unwrap()
    }

    #[test]
    fn test_nesting_limit() {
        let nested = format!("x = {}1{}\n", "(".repeat(50), ")".repeat(50));
        assert_eq!(parse(&nested).len(), 1);

        for source in [
            format!("x = {}1\n", "-".repeat(100_000)),
            format!("x = {}True\n", "not ".repeat(100_000)),
            format!("x = 2{}\n", " ** 2".repeat(100_000)),
            format!("x = {}1{}\n", "(".repeat(100_000), ")".repeat(100_000)),
        ] {
            let err = parse_program(&source).unwrap_err();
            assert_eq!(err.kind, super::super::error::ErrorKind::SyntaxError);
            assert_eq!(err.message, "too many nested parentheses");
            assert_eq!(err.line, Some(1));
        }
    }

    #[test]
    fn test_one_line_for() {
        let stmts = parse("for i in range(9): print(i)");
        assert_eq!(stmts.len(), 1);
        match &stmts[0].kind {
            StmtKind::For { target, body, .. } => {
                assert_eq!(*target, Target::Name("i".to_string()));
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected for loop, got {other:?}"),
        }
    }

    #[test]
    fn test_block_for() {
        let stmts = parse("for i in range(9):\n  print(i)\nx = 1\n");
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[1].line, 3);
    }

    #[test]
    fn test_tuple_assignment() {
        let stmts = parse("f, ax = plt.subplots(figsize=(7, 6))");
        match &stmts[0].kind {
            StmtKind::Assign { targets, value } => {
                assert_eq!(
                    targets[0],
                    Target::Tuple(vec![
                        Target::Name("f".to_string()),
                        Target::Name("ax".to_string())
                    ])
                );
                let Expr::Call { kwargs, .. } = value else {
                    panic!("expected call");
                };
                assert_eq!(kwargs[0].0, "figsize");
            }
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn test_imports() {
        let stmts = parse("import seaborn as sns\nimport a.b, c\nfrom x.y import (p, q as r,)\n");
        assert_eq!(stmts.len(), 4);
        assert_eq!(
            stmts[0].kind,
            StmtKind::Import {
                module: "seaborn".to_string(),
                alias: Some("sns".to_string())
            }
        );
        match &stmts[3].kind {
            StmtKind::FromImport { module, names } => {
                assert_eq!(module, "x.y");
                assert_eq!(names[1], ("q".to_string(), Some("r".to_string())));
            }
            other => panic!("expected from-import, got {other:?}"),
        }
    }

    #[test]
    fn test_multiline_call() {
        let source = "sns.boxplot(\n    planets, x=\"distance\",\n    whis=[0, 100], width=.6\n)\n";
        let stmts = parse(source);
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn test_precedence() {
        let stmts = parse("x = 1 + 2 * 3 ** 2");
        let StmtKind::Assign { value, .. } = &stmts[0].kind else {
            panic!("expected assignment");
        };
        let Expr::Binary { op, right, .. } = value else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinOp::Add);
        assert!(matches!(**right, Expr::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn test_if_elif_else() {
        let stmts = parse("if a:\n  x = 1\nelif b:\n  x = 2\nelse:\n  x = 3\n");
        let StmtKind::If { branches, orelse } = &stmts[0].kind else {
            panic!("expected if");
        };
        assert_eq!(branches.len(), 2);
        assert_eq!(orelse.len(), 1);
    }

    #[test]
    fn test_not_in() {
        let stmts = parse("x = 1 not in [2]");
        let StmtKind::Assign { value, .. } = &stmts[0].kind else {
            panic!("expected assignment");
        };
        assert!(matches!(value, Expr::Compare { ops, .. } if ops[0].0 == CmpOp::NotIn));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse_program("x = = 1").is_err());
        assert!(parse_program("f(a=1, 2)").is_err());
        assert!(parse_program("f() = 1").is_err());
        assert!(parse_program("def f(): pass").is_err());
        let err = parse_program("for i in x:\nprint(i)").unwrap_err();
        assert_eq!(err.kind, super::super::error::ErrorKind::IndentationError);
    }

    #[test]
    fn test_unexpected_indent() {
        let err = parse_program("  x = 1").unwrap_err();
        assert_eq!(err.kind, super::super::error::ErrorKind::IndentationError);
    }
}
