//! Tree-walking evaluator for script cells.

use super::ScriptConfig;
use super::ast::{BinOp, BoolOp, Expr, Stmt, StmtKind, Target};
use super::builtins::Builtin;
use super::error::{ErrorKind, ScriptError};
use super::ops;
use super::value::Value;
use crate::execute::{ExecutionContext, OutputCapture};

const WARNINGS_MODULE: &str = "warnings";

/// Control flow after a statement.
enum Flow {
    Next,
    Break,
    Continue,
}

/// A subscript assignment target resolved to a root name and index chain.
struct Place {
    root: String,
    indices: Vec<Value>,
}

pub(super) struct Interpreter<'a> {
    ctx: &'a mut ExecutionContext,
    capture: &'a mut OutputCapture,
    config: &'a ScriptConfig,
    /// Loop iterations executed in the current cell
    iterations: u64,
}

impl<'a> Interpreter<'a> {
    pub(super) fn new(
        ctx: &'a mut ExecutionContext,
        capture: &'a mut OutputCapture,
        config: &'a ScriptConfig,
    ) -> Self {
        Self {
            ctx,
            capture,
            config,
            iterations: 0,
        }
    }

    pub(super) fn run(&mut self, program: &[Stmt]) -> Result<(), ScriptError> {
        self.exec_block(program, false).map(|_| ())
    }

    fn exec_block(&mut self, body: &[Stmt], in_loop: bool) -> Result<Flow, ScriptError> {
        for stmt in body {
            match self.exec_stmt(stmt, in_loop).map_err(|e| e.at_line(stmt.line))? {
                Flow::Next => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Next)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, in_loop: bool) -> Result<Flow, ScriptError> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.eval(expr)?;
            }
            StmtKind::Assign { targets, value } => {
                let value = self.eval(value)?;
                for target in targets {
                    self.assign(target, value.clone())?;
                }
            }
            StmtKind::AugAssign { target, op, value } => self.aug_assign(target, *op, value)?,
            StmtKind::For { target, iter, body } => {
                let iterable = self.eval(iter)?;
                for item in iterable.iter()? {
                    self.tick()?;
                    self.assign(target, item)?;
                    if let Flow::Break = self.exec_block(body, true)? {
                        break;
                    }
                }
            }
            StmtKind::While { cond, body } => loop {
                self.tick()?;
                if !self.eval(cond)?.truthy() {
                    break;
                }
                if let Flow::Break = self.exec_block(body, true)? {
                    break;
                }
            },
            StmtKind::If { branches, orelse } => {
                for (cond, body) in branches {
                    if self.eval(cond)?.truthy() {
                        return self.exec_block(body, in_loop);
                    }
                }
                return self.exec_block(orelse, in_loop);
            }
            StmtKind::Import { module, alias } => {
                let (name, path) = match alias {
                    Some(alias) => (alias.clone(), module.clone()),
                    None => {
                        let root = module.split('.').next().unwrap_or(module);
                        (root.to_string(), root.to_string())
                    }
                };
                tracing::trace!("import {module} as {name}");
                self.ctx.set(name, Value::Module(path));
            }
            StmtKind::FromImport { module, names } => {
                for (name, alias) in names {
                    let value = if module == WARNINGS_MODULE {
                        Builtin::warnings_attr(name).map(Value::Builtin).ok_or_else(|| {
                            ScriptError::new(
                                ErrorKind::ImportError,
                                format!("cannot import name '{name}' from '{module}'"),
                            )
                        })?
                    } else {
                        Value::Opaque(format!("{module}.{name}"))
                    };
                    self.ctx.set(alias.as_ref().unwrap_or(name).clone(), value);
                }
            }
            StmtKind::Pass => {}
            StmtKind::Break | StmtKind::Continue if !in_loop => {
                let keyword = if let StmtKind::Break = stmt.kind { "break" } else { "continue" };
                return Err(ScriptError::syntax(
                    stmt.line,
                    format!("'{keyword}' outside loop"),
                ));
            }
            StmtKind::Break => return Ok(Flow::Break),
            StmtKind::Continue => return Ok(Flow::Continue),
        }
        Ok(Flow::Next)
    }

    fn tick(&mut self) -> Result<(), ScriptError> {
        self.iterations += 1;
        if self.iterations > self.config.max_loop_iterations {
            return Err(ScriptError::new(
                ErrorKind::RuntimeError,
                format!(
                    "loop iteration limit of {} exceeded",
                    self.config.max_loop_iterations
                ),
            ));
        }
        Ok(())
    }

    // ---- assignment ----

    fn assign(&mut self, target: &Target, value: Value) -> Result<(), ScriptError> {
        match target {
            Target::Name(name) => {
                self.ctx.set(name.clone(), value);
                Ok(())
            }
            Target::Tuple(targets) => {
                if let Value::Opaque(path) = &value {
                    for (i, target) in targets.iter().enumerate() {
                        self.assign(target, Value::Opaque(format!("{path}[{i}]")))?;
                    }
                    return Ok(());
                }
                let items = value.to_vec().map_err(|_| {
                    ScriptError::type_error(format!(
                        "cannot unpack non-iterable {} object",
                        value.type_name()
                    ))
                })?;
                if items.len() > targets.len() {
                    return Err(ScriptError::value_error(format!(
                        "too many values to unpack (expected {})",
                        targets.len()
                    )));
                }
                if items.len() < targets.len() {
                    return Err(ScriptError::value_error(format!(
                        "not enough values to unpack (expected {}, got {})",
                        targets.len(),
                        items.len()
                    )));
                }
                for (target, item) in targets.iter().zip(items) {
                    self.assign(target, item)?;
                }
                Ok(())
            }
            Target::Attribute { object, name } => {
                let owner = self.eval(object)?;
                match owner {
                    Value::Opaque(_) | Value::Module(_) => {
                        let call = format!("{}.{name}", describe(object));
                        self.ctx.figures.record(&call);
                        Ok(())
                    }
                    other => Err(ScriptError::new(
                        ErrorKind::AttributeError,
                        format!("'{}' object has no attribute '{name}'", other.type_name()),
                    )),
                }
            }
            Target::Subscript { object, index } => {
                let Some(mut place) = self.place(object)? else {
                    // Item assignment on a library value
                    return Ok(());
                };
                place.indices.push(self.eval(index)?);
                self.store(&place, value)
            }
        }
    }

    fn aug_assign(&mut self, target: &Target, op: BinOp, value: &Expr) -> Result<(), ScriptError> {
        match target {
            Target::Name(name) => {
                let current = self.lookup(name)?;
                let rhs = self.eval(value)?;
                let updated = ops::binary(op, &current, &rhs)?;
                self.ctx.set(name.clone(), updated);
                Ok(())
            }
            Target::Subscript { object, index } => {
                let Some(mut place) = self.place(object)? else {
                    return Ok(());
                };
                place.indices.push(self.eval(index)?);
                let current = self.load(&place)?;
                let rhs = self.eval(value)?;
                let updated = ops::binary(op, &current, &rhs)?;
                self.store(&place, updated)
            }
            Target::Attribute { .. } => {
                self.eval(value)?;
                self.assign(target, Value::None)
            }
            Target::Tuple(_) => Err(ScriptError::new(
                ErrorKind::SyntaxError,
                "illegal expression for augmented assignment",
            )),
        }
    }

    /// Resolve the container an item assignment writes into.
    ///
    /// Returns `None` when the container is a library value.
    fn place(&mut self, expr: &Expr) -> Result<Option<Place>, ScriptError> {
        match expr {
            Expr::Name(name) => match self.lookup(name)? {
                Value::Opaque(_) | Value::Module(_) => Ok(None),
                _ => Ok(Some(Place {
                    root: name.clone(),
                    indices: Vec::new(),
                })),
            },
            Expr::Subscript { object, index } => {
                let Some(mut place) = self.place(object)? else {
                    return Ok(None);
                };
                place.indices.push(self.eval(index)?);
                Ok(Some(place))
            }
            other => match self.eval(other)? {
                Value::Opaque(_) | Value::Module(_) => Ok(None),
                value => Err(ScriptError::type_error(format!(
                    "cannot assign into a temporary '{}' value",
                    value.type_name()
                ))),
            },
        }
    }

    fn load(&self, place: &Place) -> Result<Value, ScriptError> {
        let mut value = self.lookup(&place.root)?;
        for index in &place.indices {
            value = value.index(index)?;
        }
        Ok(value)
    }

    fn store(&mut self, place: &Place, value: Value) -> Result<(), ScriptError> {
        let Some((last, parents)) = place.indices.split_last() else {
            self.ctx.set(place.root.clone(), value);
            return Ok(());
        };
        let mut slot = self
            .ctx
            .get_mut(&place.root)
            .ok_or_else(|| ScriptError::undefined(&place.root))?;
        for index in parents {
            slot = item_mut(slot, index)?;
        }
        match slot {
            Value::Dict(pairs) => {
                match pairs.iter().position(|(k, _)| k.py_eq(last)) {
                    Some(i) => pairs[i].1 = value,
                    None => pairs.push((last.clone(), value)),
                }
                Ok(())
            }
            Value::Opaque(_) => Ok(()),
            other => {
                *item_mut(other, last)? = value;
                Ok(())
            }
        }
    }

    // ---- expressions ----

    fn lookup(&self, name: &str) -> Result<Value, ScriptError> {
        if let Some(value) = self.ctx.get(name) {
            return Ok(value.clone());
        }
        Builtin::lookup(name)
            .map(Value::Builtin)
            .ok_or_else(|| ScriptError::undefined(name))
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, ScriptError> {
        match expr {
            Expr::Const(value) => Ok(value.clone()),
            Expr::Name(name) => self.lookup(name),
            Expr::List(items) => Ok(Value::List(self.eval_all(items)?)),
            Expr::Tuple(items) => Ok(Value::Tuple(self.eval_all(items)?)),
            Expr::Dict(entries) => {
                let mut pairs: Vec<(Value, Value)> = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = self.eval(key)?;
                    let value = self.eval(value)?;
                    match pairs.iter().position(|(k, _)| k.py_eq(&key)) {
                        Some(i) => pairs[i].1 = value,
                        None => pairs.push((key, value)),
                    }
                }
                Ok(Value::Dict(pairs))
            }
            Expr::Attribute { object, name } => {
                let owner = self.eval(object)?;
                attribute(owner, name)
            }
            Expr::Call { func, args, kwargs } => self.call(func, args, kwargs),
            Expr::Subscript { object, index } => {
                let owner = self.eval(object)?;
                let index = self.eval(index)?;
                match owner {
                    Value::Opaque(path) | Value::Module(path) => {
                        Ok(Value::Opaque(format!("{path}[{}]", index.repr())))
                    }
                    other => other.index(&index),
                }
            }
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                ops::unary(*op, &value)
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                ops::binary(*op, &left, &right)
            }
            Expr::Compare { left, ops: chain } => {
                let mut current = self.eval(left)?;
                for (op, right) in chain {
                    let right = self.eval(right)?;
                    if !ops::compare(*op, &current, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    current = right;
                }
                Ok(Value::Bool(true))
            }
            Expr::BoolOp { op, left, right } => {
                let left = self.eval(left)?;
                let short_circuit = match op {
                    BoolOp::And => !left.truthy(),
                    BoolOp::Or => left.truthy(),
                };
                if short_circuit { Ok(left) } else { self.eval(right) }
            }
        }
    }

    fn eval_all(&mut self, exprs: &[Expr]) -> Result<Vec<Value>, ScriptError> {
        exprs.iter().map(|expr| self.eval(expr)).collect()
    }

    fn call(
        &mut self,
        func: &Expr,
        args: &[Expr],
        kwargs: &[(String, Expr)],
    ) -> Result<Value, ScriptError> {
        let callee = match func {
            // Methods on built-in values need the receiver expression so that
            // mutating methods can write back.
            Expr::Attribute { object, name } => {
                let receiver = self.eval(object)?;
                if matches!(receiver, Value::List(_) | Value::Str(_) | Value::Dict(_)) {
                    let args = self.eval_all(args)?;
                    if let Some((key, _)) = kwargs.first() {
                        return Err(ScriptError::type_error(format!(
                            "{}.{name}() takes no keyword arguments ('{key}' given)",
                            receiver.type_name()
                        )));
                    }
                    return self.call_method(object, receiver, name, args);
                }
                attribute(receiver, name)?
            }
            other => self.eval(other)?,
        };
        let args = self.eval_all(args)?;
        let mut evaluated = Vec::with_capacity(kwargs.len());
        for (key, value) in kwargs {
            evaluated.push((key.clone(), self.eval(value)?));
        }

        match callee {
            Value::Builtin(builtin) => builtin.call(args, evaluated, self.ctx, self.capture),
            Value::Opaque(path) | Value::Module(path) => Ok(self.library_call(&path, func)),
            other => Err(ScriptError::type_error(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }

    /// A call into an external library. Only its figure side effects are modelled.
    fn library_call(&mut self, path: &str, func: &Expr) -> Value {
        let name = path.rsplit('.').next().unwrap_or(path);
        let call = describe(func);

        if self.config.show_calls.iter().any(|s| s == name) {
            let figure = if self.ctx.figures.is_open() {
                self.ctx.figures.record(&call);
                self.ctx.figures.close()
            } else {
                Some(self.ctx.figures.render_standalone(&call))
            };
            if let Some(figure) = figure {
                tracing::debug!("Captured figure {} ({})", figure.id, figure.label);
                self.capture.figure(figure);
            }
            return Value::None;
        }

        if self.config.figure_calls.iter().any(|s| s == name) {
            self.ctx.figures.open(&call);
        }
        self.ctx.figures.record(&call);
        Value::Opaque(format!("{path}()"))
    }

    fn call_method(
        &mut self,
        receiver_expr: &Expr,
        receiver: Value,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Value, ScriptError> {
        let type_name = receiver.type_name();
        let arity = |expected: usize| -> Result<(), ScriptError> {
            if args.len() == expected {
                Ok(())
            } else {
                Err(ScriptError::type_error(format!(
                    "{type_name}.{name}() takes exactly {expected} argument(s) ({} given)",
                    args.len()
                )))
            }
        };

        match (receiver, name) {
            (Value::List(mut items), "append") => {
                arity(1)?;
                items.extend(args);
                self.write_back(receiver_expr, Value::List(items))?;
                Ok(Value::None)
            }
            (Value::List(mut items), "extend") => {
                arity(1)?;
                items.extend(args[0].to_vec()?);
                self.write_back(receiver_expr, Value::List(items))?;
                Ok(Value::None)
            }
            (Value::List(mut items), "pop") => {
                let index = match args.first() {
                    Some(index) => index.as_int().ok_or_else(|| {
                        ScriptError::type_error("list indices must be integers")
                    })?,
                    None => -1,
                };
                let len = items.len() as i64;
                let resolved = if index < 0 { index + len } else { index };
                if items.is_empty() || resolved < 0 || resolved >= len {
                    return Err(ScriptError::new(
                        ErrorKind::IndexError,
                        "pop index out of range",
                    ));
                }
                let popped = items.remove(resolved as usize);
                self.write_back(receiver_expr, Value::List(items))?;
                Ok(popped)
            }
            (Value::Str(s), "upper") => {
                arity(0)?;
                Ok(Value::Str(s.to_uppercase()))
            }
            (Value::Str(s), "lower") => {
                arity(0)?;
                Ok(Value::Str(s.to_lowercase()))
            }
            (Value::Str(s), "strip") => {
                arity(0)?;
                Ok(Value::Str(s.trim().to_string()))
            }
            (Value::Str(s), "join") => {
                arity(1)?;
                let parts = args[0]
                    .to_vec()?
                    .into_iter()
                    .map(|item| match item {
                        Value::Str(part) => Ok(part),
                        other => Err(ScriptError::type_error(format!(
                            "sequence item: expected str instance, {} found",
                            other.type_name()
                        ))),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Str(parts.join(s.as_str())))
            }
            (Value::Str(s), "split") => {
                let parts: Vec<Value> = match args.first() {
                    None | Some(Value::None) => s
                        .split_whitespace()
                        .map(|p| Value::Str(p.to_string()))
                        .collect(),
                    Some(Value::Str(sep)) if !sep.is_empty() => s
                        .split(sep.as_str())
                        .map(|p| Value::Str(p.to_string()))
                        .collect(),
                    Some(_) => return Err(ScriptError::value_error("empty separator")),
                };
                Ok(Value::List(parts))
            }
            (Value::Dict(pairs), "get") => {
                if args.is_empty() || args.len() > 2 {
                    return Err(ScriptError::type_error(format!(
                        "get expected 1 or 2 arguments, got {}",
                        args.len()
                    )));
                }
                Ok(pairs
                    .into_iter()
                    .find(|(k, _)| k.py_eq(&args[0]))
                    .map(|(_, v)| v)
                    .unwrap_or_else(|| args.get(1).cloned().unwrap_or(Value::None)))
            }
            (Value::Dict(pairs), "keys") => {
                arity(0)?;
                Ok(Value::List(pairs.into_iter().map(|(k, _)| k).collect()))
            }
            (Value::Dict(pairs), "values") => {
                arity(0)?;
                Ok(Value::List(pairs.into_iter().map(|(_, v)| v).collect()))
            }
            (Value::Dict(pairs), "items") => {
                arity(0)?;
                Ok(Value::List(
                    pairs
                        .into_iter()
                        .map(|(k, v)| Value::Tuple(vec![k, v]))
                        .collect(),
                ))
            }
            (_, name) => Err(ScriptError::new(
                ErrorKind::AttributeError,
                format!("'{type_name}' object has no attribute '{name}'"),
            )),
        }
    }

    /// Store a mutated receiver back where it came from. Temporaries are dropped.
    fn write_back(&mut self, receiver_expr: &Expr, value: Value) -> Result<(), ScriptError> {
        match receiver_expr {
            Expr::Name(_) | Expr::Subscript { .. } => {
                if let Some(place) = self.place(receiver_expr)? {
                    self.store(&place, value)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn attribute(owner: Value, name: &str) -> Result<Value, ScriptError> {
    match owner {
        Value::Module(path) if path == WARNINGS_MODULE => Builtin::warnings_attr(name)
            .map(Value::Builtin)
            .ok_or_else(|| {
                ScriptError::new(
                    ErrorKind::AttributeError,
                    format!("module 'warnings' has no attribute '{name}'"),
                )
            }),
        Value::Module(path) | Value::Opaque(path) => Ok(Value::Opaque(format!("{path}.{name}"))),
        other => Err(ScriptError::new(
            ErrorKind::AttributeError,
            format!("'{}' object has no attribute '{name}'", other.type_name()),
        )),
    }
}

fn item_mut<'v>(container: &'v mut Value, index: &Value) -> Result<&'v mut Value, ScriptError> {
    match container {
        Value::List(items) => {
            let len = items.len() as i64;
            let i = index.as_int().ok_or_else(|| {
                ScriptError::type_error(format!(
                    "list indices must be integers, not {}",
                    index.type_name()
                ))
            })?;
            let resolved = if i < 0 { i + len } else { i };
            if resolved < 0 || resolved >= len {
                return Err(ScriptError::new(
                    ErrorKind::IndexError,
                    "list assignment index out of range",
                ));
            }
            Ok(&mut items[resolved as usize])
        }
        Value::Dict(pairs) => pairs
            .iter_mut()
            .find(|(k, _)| k.py_eq(index))
            .map(|(_, v)| v)
            .ok_or_else(|| ScriptError::new(ErrorKind::KeyError, index.repr())),
        other => Err(ScriptError::type_error(format!(
            "'{}' object does not support item assignment",
            other.type_name()
        ))),
    }
}

/// Source-like rendering of a callee, used to label library calls.
fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Name(name) => name.clone(),
        Expr::Attribute { object, name } => format!("{}.{name}", describe(object)),
        Expr::Call { func, .. } => format!("{}()", describe(func)),
        Expr::Subscript { object, index } => match index.as_ref() {
            Expr::Const(value) => format!("{}[{}]", describe(object), value.repr()),
            _ => format!("{}[...]", describe(object)),
        },
        _ => "<expr>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parser::parse_program;
    use crate::state::{OutputItem, StreamName};

    fn run_with(source: &str, ctx: &mut ExecutionContext) -> Result<Vec<OutputItem>, ScriptError> {
        let program = parse_program(source)?;
        let config = ScriptConfig::default();
        let mut capture = OutputCapture::new();
        Interpreter::new(ctx, &mut capture, &config).run(&program)?;
        Ok(capture.into_items())
    }

    fn stdout(source: &str) -> String {
        let mut ctx = ExecutionContext::new();
        let items = run_with(source, &mut ctx).unwrap();
        items
            .iter()
            .filter_map(|item| match item {
                OutputItem::Stream {
                    name: StreamName::Stdout,
                    text,
                } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn error(source: &str) -> ScriptError {
        let mut ctx = ExecutionContext::new();
        run_with(source, &mut ctx).unwrap_err()
    }

    #[test]
    fn test_for_loop_prints() {
        assert_eq!(
            stdout("for i in range(9):\n  print(i)\n"),
            "0\n1\n2\n3\n4\n5\n6\n7\n8\n"
        );
    }

    #[test]
    fn test_control_flow() {
        let source = "\
total = 0
for i in range(10):
    if i % 2 == 0:
        continue
    elif i > 7:
        break
    total += i
n = 0
while n < 3:
    n += 1
print(total, n)
";
        assert_eq!(stdout(source), "16 3\n");
    }

    #[test]
    fn test_tuple_unpacking() {
        assert_eq!(stdout("a, b = 1, 2\na, b = b, a\nprint(a, b)"), "2 1\n");

        let err = error("a, b = 1, 2, 3");
        assert_eq!(err.message, "too many values to unpack (expected 2)");
        let err = error("a, b, c = [1, 2]");
        assert_eq!(err.message, "not enough values to unpack (expected 3, got 2)");
    }

    #[test]
    fn test_subscript_assignment() {
        let source = "\
grid = [[0, 0], [0, 0]]
grid[1][0] = 5
d = {'a': 1}
d['b'] = 2
d['a'] += 10
print(grid, d)
";
        assert_eq!(stdout(source), "[[0, 0], [5, 0]] {'a': 11, 'b': 2}\n");
    }

    #[test]
    fn test_methods() {
        let source = "\
xs = []
xs.append(3)
xs.extend([1, 2])
last = xs.pop()
print(xs, last, '-'.join(['a', 'b']).upper(), 'A B'.split())
";
        assert_eq!(stdout(source), "[3, 1] 2 A-B ['A', 'B']\n");
    }

    #[test]
    fn test_name_error_has_line() {
        let err = error("x = 1\n\nprint(y)\n");
        assert_eq!(err.kind, ErrorKind::NameError);
        assert_eq!(err.message, "name 'y' is not defined");
        assert_eq!(err.line, Some(3));
    }

    #[test]
    fn test_break_outside_loop() {
        let err = error("break");
        assert_eq!(err.kind, ErrorKind::SyntaxError);
        assert_eq!(err.message, "'break' outside loop");
    }

    #[test]
    fn test_loop_limit() {
        let mut ctx = ExecutionContext::new();
        let program = parse_program("while True:\n    pass\n").unwrap();
        let config = ScriptConfig {
            max_loop_iterations: 100,
            ..ScriptConfig::default()
        };
        let mut capture = OutputCapture::new();
        let err = Interpreter::new(&mut ctx, &mut capture, &config)
            .run(&program)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::RuntimeError);
        assert_eq!(err.line, Some(1));
    }

    #[test]
    fn test_library_values_are_opaque() {
        let mut ctx = ExecutionContext::new();
        run_with(
            "import matplotlib.pyplot as plt\nfrom sklearn import datasets\nimport numpy\nf, ax = plt.subplots(figsize=(7, 6))\nax.xaxis.grid(True)\n",
            &mut ctx,
        )
        .unwrap();
        assert_eq!(
            ctx.get("plt"),
            Some(&Value::Module("matplotlib.pyplot".to_string()))
        );
        assert_eq!(ctx.get("numpy"), Some(&Value::Module("numpy".to_string())));
        assert_eq!(
            ctx.get("datasets"),
            Some(&Value::Opaque("sklearn.datasets".to_string()))
        );
        assert_eq!(
            ctx.get("ax"),
            Some(&Value::Opaque("matplotlib.pyplot.subplots()[1]".to_string()))
        );
        assert!(ctx.figures.is_open());
    }

    #[test]
    fn test_show_captures_figure() {
        let mut ctx = ExecutionContext::new();
        let items = run_with(
            "import matplotlib.pyplot as plt\nf, ax = plt.subplots()\nax.set_xscale('log')\nplt.show()\n",
            &mut ctx,
        )
        .unwrap();
        assert_eq!(items.len(), 1);
        let OutputItem::Figure(figure) = &items[0] else {
            panic!("expected a figure, got {items:?}");
        };
        assert_eq!(figure.label, "plt.subplots");
        assert_eq!(
            figure.calls,
            vec!["plt.subplots", "ax.set_xscale", "plt.show"]
        );
        assert!(!ctx.figures.is_open());
    }

    #[test]
    fn test_warnings_module() {
        let mut ctx = ExecutionContext::new();
        let items = run_with(
            "import warnings\nwarnings.warn('first')\nwarnings.filterwarnings('ignore')\nwarnings.warn('second')\n",
            &mut ctx,
        )
        .unwrap();
        assert_eq!(
            items,
            vec![OutputItem::Stream {
                name: StreamName::Stderr,
                text: "UserWarning: first\n".to_string()
            }]
        );

        let err = error("import warnings\nwarnings.nope()");
        assert_eq!(err.kind, ErrorKind::AttributeError);
        let err = error("from warnings import nope");
        assert_eq!(err.kind, ErrorKind::ImportError);
    }

    #[test]
    fn test_output_before_error_is_kept() {
        let program = parse_program("print('before')\n1 / 0\nprint('after')").unwrap();
        let mut ctx = ExecutionContext::new();
        let config = ScriptConfig::default();
        let mut capture = OutputCapture::new();
        let err = Interpreter::new(&mut ctx, &mut capture, &config)
            .run(&program)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ZeroDivisionError);
        assert_eq!(err.line, Some(2));
        assert_eq!(capture.items().len(), 1);
    }
}
