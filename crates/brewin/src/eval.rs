//! Expression reduction: literals, variables and field paths, operators,
//! `new`, and thunk forcing.

use std::rc::Rc;

use crate::{
    environment::Environment,
    exception::{Exception, RunError, RunResult},
    expressions::{BinaryOp, Expr, UnaryOp, VarPath},
    heap::{HeapId, ThunkState},
    io::{InputReader, PrintWriter},
    run::Interp,
    value::{Type, Value, default_value},
};

impl<P: PrintWriter, R: InputReader> Interp<'_, P, R> {
    /// Reduces an expression to a value.
    ///
    /// In v4 the result may be an unforced thunk (a variable reference or a
    /// call whose return was deferred); operators and conditions go through
    /// [`eval_forced`](Self::eval_forced) instead.
    pub(crate) fn eval_expr(&mut self, expr: &Expr, env: &mut Environment) -> RunResult<Value> {
        match expr {
            Expr::IntLiteral(value) => Ok(Value::Int(*value)),
            Expr::StringLiteral(text) => Ok(Value::Str(self.heap.alloc_str(&**text))),
            Expr::BoolLiteral(value) => {
                if !self.dialect.has_booleans() {
                    return Err(Exception::type_error("Booleans are not supported in this dialect").into());
                }
                Ok(Value::Bool(*value))
            }
            Expr::NilLiteral => Ok(Value::Nil),
            Expr::Var(path) => self.eval_var(path, env),
            Expr::Unary { op, operand } => self.eval_unary(*op, operand, env),
            Expr::Binary { op, lhs, rhs } => self.eval_binary(*op, lhs, rhs, env),
            Expr::Call(call) => self.call_function(call, env),
            Expr::New { struct_name } => self.eval_new(struct_name),
        }
    }

    /// Evaluates and forces, so the caller can inspect the value.
    pub(crate) fn eval_forced(&mut self, expr: &Expr, env: &mut Environment) -> RunResult<Value> {
        let value = self.eval_expr(expr, env)?;
        self.force(value)
    }

    /// Forces a thunk to a plain value; passes everything else through.
    ///
    /// Forcing is memoized: the first force evaluates the captured expression
    /// in its captured environment and stores the outcome — value or raised
    /// tag — and every later force replays that outcome without re-evaluating.
    pub(crate) fn force(&mut self, value: Value) -> RunResult<Value> {
        let Value::Thunk(id) = value else {
            return Ok(value);
        };
        match &self.heap.thunk(id).state {
            ThunkState::Resolved(resolved) => return Ok(*resolved),
            ThunkState::Raised(tag) => return Err(RunError::Raise(tag.clone())),
            ThunkState::Pending => {}
        }
        let cell = self.heap.thunk_mut(id);
        let expr = Rc::clone(&cell.expr);
        let mut captured = cell
            .captured
            .take()
            .expect("pending thunk forced from within its own forcing");
        // The result of the deferred expression may itself be a thunk (a
        // variable reference, a returned thunk); keep forcing to a plain value
        // before memoizing.
        let result = self.eval_expr(&expr, &mut captured).and_then(|v| self.force(v));
        match result {
            Ok(resolved) => {
                self.heap.thunk_mut(id).state = ThunkState::Resolved(resolved);
                Ok(resolved)
            }
            Err(RunError::Raise(tag)) => {
                self.heap.thunk_mut(id).state = ThunkState::Raised(tag.clone());
                Err(RunError::Raise(tag))
            }
            // Host errors abort the whole run; nothing to memoize.
            Err(host) => Err(host),
        }
    }

    fn eval_var(&mut self, path: &VarPath, env: &mut Environment) -> RunResult<Value> {
        let Some(base) = env.get(path.base()) else {
            return Err(Exception::name_error(format!("Variable {} has not been defined", path.display())).into());
        };
        if !path.is_dotted() {
            return Ok(base);
        }
        if !self.dialect.is_typed() {
            return Err(Exception::type_error("Field access is not supported in this dialect").into());
        }
        let mut current = base;
        for field in &path.segments[1..] {
            current = self.read_field(current, field)?;
        }
        Ok(current)
    }

    /// The payload of a struct value, or the fault/type error for nil and
    /// non-struct values to the left of a dot.
    pub(crate) fn struct_payload(&self, value: Value) -> RunResult<HeapId> {
        match value {
            Value::Struct(id) => Ok(id),
            Value::Nil | Value::StructNil(_) => {
                Err(Exception::fault_error("Variable to the left of a dot is nil").into())
            }
            _ => Err(Exception::type_error("Variable to the left of a dot is not a struct").into()),
        }
    }

    pub(crate) fn read_field(&self, value: Value, field: &str) -> RunResult<Value> {
        let id = self.struct_payload(value)?;
        self.heap
            .struct_value(id)
            .fields
            .get(field)
            .copied()
            .ok_or_else(|| Exception::name_error(format!("Field {field} does not exist")).into())
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr, env: &mut Environment) -> RunResult<Value> {
        if op == UnaryOp::Not && !self.dialect.has_booleans() {
            return Err(Exception::type_error("! is not supported in this dialect").into());
        }
        let value = self.eval_forced(operand, env)?;
        match op {
            UnaryOp::Neg => match value {
                Value::Int(i) => Ok(Value::Int(i.wrapping_neg())),
                _ => Err(Exception::type_error("Invalid negation type").into()),
            },
            UnaryOp::Not => {
                let value = if self.dialect.coerces_int_to_bool() {
                    value.coerce_int_to_bool()
                } else {
                    value
                };
                match value {
                    Value::Bool(b) => Ok(Value::Bool(!b)),
                    _ => Err(Exception::type_error("Illegal usage of not operation on non-boolean type").into()),
                }
            }
        }
    }

    /// v1 exposes only `+`/`-` and `==`/`!=`; every other binary operator
    /// arrived with v2. Checked before either operand evaluates.
    fn check_operator_support(&self, op: BinaryOp) -> RunResult<()> {
        let supported = match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Eq | BinaryOp::NotEq => true,
            BinaryOp::Mul | BinaryOp::Div => self.dialect.has_extended_arithmetic(),
            _ => self.dialect.has_booleans(),
        };
        if supported {
            Ok(())
        } else {
            Err(Exception::type_error(format!("{} is not supported in this dialect", op.symbol())).into())
        }
    }

    fn eval_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr, env: &mut Environment) -> RunResult<Value> {
        self.check_operator_support(op)?;
        if matches!(op, BinaryOp::And | BinaryOp::Or) {
            return if self.dialect.short_circuits() {
                self.eval_logical_short_circuit(op, lhs, rhs, env)
            } else {
                self.eval_logical_strict(op, lhs, rhs, env)
            };
        }
        let left = self.eval_forced(lhs, env)?;
        let right = self.eval_forced(rhs, env)?;
        self.apply_binary(op, left, right)
    }

    /// v4 `&&`/`||`: the right operand is never forced once the left decides.
    fn eval_logical_short_circuit(
        &mut self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        env: &mut Environment,
    ) -> RunResult<Value> {
        let left = self.eval_forced(lhs, env)?;
        let Value::Bool(left) = left else {
            return Err(logic_type_error(op));
        };
        match (op, left) {
            (BinaryOp::And, false) => Ok(Value::Bool(false)),
            (BinaryOp::Or, true) => Ok(Value::Bool(true)),
            _ => {
                let right = self.eval_forced(rhs, env)?;
                let Value::Bool(right) = right else {
                    return Err(logic_type_error(op));
                };
                Ok(Value::Bool(right))
            }
        }
    }

    /// v2/v3 `&&`/`||`: both operands evaluate, v3 coerces ints first.
    fn eval_logical_strict(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr, env: &mut Environment) -> RunResult<Value> {
        let mut left = self.eval_forced(lhs, env)?;
        let mut right = self.eval_forced(rhs, env)?;
        if self.dialect.coerces_int_to_bool() {
            left = left.coerce_int_to_bool();
            right = right.coerce_int_to_bool();
        }
        let (Value::Bool(left), Value::Bool(right)) = (left, right) else {
            return Err(logic_type_error(op));
        };
        Ok(Value::Bool(match op {
            BinaryOp::And => left && right,
            _ => left || right,
        }))
    }

    fn apply_binary(&mut self, op: BinaryOp, left: Value, right: Value) -> RunResult<Value> {
        match op {
            BinaryOp::Add => match (left, right) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(b))),
                (Value::Str(a), Value::Str(b)) => {
                    let joined = format!("{}{}", self.heap.str(a), self.heap.str(b));
                    Ok(Value::Str(self.heap.alloc_str(joined)))
                }
                _ => Err(arith_type_error()),
            },
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                let (Value::Int(a), Value::Int(b)) = (left, right) else {
                    return Err(arith_type_error());
                };
                match op {
                    BinaryOp::Sub => Ok(Value::Int(a.wrapping_sub(b))),
                    BinaryOp::Mul => Ok(Value::Int(a.wrapping_mul(b))),
                    _ => {
                        if b == 0 {
                            if self.dialect.has_exceptions() {
                                return Err(RunError::Raise("div0".to_owned()));
                            }
                            return Err(Exception::fault_error("Division by zero").into());
                        }
                        // i64 division truncates toward zero.
                        Ok(Value::Int(a.wrapping_div(b)))
                    }
                }
            }
            BinaryOp::Less | BinaryOp::LessEq | BinaryOp::Greater | BinaryOp::GreaterEq => {
                let (Value::Int(a), Value::Int(b)) = (left, right) else {
                    return Err(Exception::type_error(format!(
                        "Incompatible types for comparison {}",
                        op.symbol()
                    ))
                    .into());
                };
                Ok(Value::Bool(match op {
                    BinaryOp::Less => a < b,
                    BinaryOp::LessEq => a <= b,
                    BinaryOp::Greater => a > b,
                    _ => a >= b,
                }))
            }
            BinaryOp::Eq => self.eval_equality(left, right).map(Value::Bool),
            BinaryOp::NotEq => self.eval_equality(left, right).map(|eq| Value::Bool(!eq)),
            BinaryOp::And | BinaryOp::Or => unreachable!("logical operators evaluate their own operands"),
        }
    }

    fn eval_equality(&self, left: Value, right: Value) -> RunResult<bool> {
        if !self.dialect.is_typed() {
            return Ok(left.eq_untyped(right, &self.heap));
        }
        let left_ty = left.type_of(&self.heap);
        let right_ty = right.type_of(&self.heap);
        if left_ty == Type::Void || right_ty == Type::Void {
            return Err(Exception::type_error("Comparing with a void value").into());
        }
        let involves_struct = matches!(left_ty, Type::Struct(_)) || matches!(right_ty, Type::Struct(_));
        if involves_struct && !(left_ty == right_ty || left_ty == Type::Nil || right_ty == Type::Nil) {
            return Err(Exception::type_error("Comparing a struct type to a different type").into());
        }
        if left.is_nil() && right.is_nil() {
            return Ok(true);
        }
        let (mut left, mut right) = (left, right);
        if left_ty == Type::Bool || right_ty == Type::Bool {
            left = left.coerce_int_to_bool();
            right = right.coerce_int_to_bool();
        }
        let left_ty = left.type_of(&self.heap);
        let right_ty = right.type_of(&self.heap);
        if (left_ty.is_primitive() || right_ty.is_primitive()) && left_ty != right_ty {
            return Err(Exception::type_error("Comparing different primitive types").into());
        }
        Ok(left.eq_untyped(right, &self.heap))
    }

    fn eval_new(&mut self, struct_name: &str) -> RunResult<Value> {
        if !self.dialect.is_typed() {
            return Err(Exception::type_error("new is not supported in this dialect").into());
        }
        let Some(id) = self.structs.resolve(struct_name) else {
            return Err(Exception::type_error("Invalid struct type").into());
        };
        let field_types = self.structs.info(id).fields.clone();
        let fields: Vec<_> = field_types
            .into_iter()
            .map(|(name, ty)| {
                let value = default_value(ty, &mut self.heap);
                (name, value)
            })
            .collect();
        Ok(Value::Struct(self.heap.alloc_struct(id, fields)))
    }
}

fn arith_type_error() -> RunError {
    Exception::type_error("Illegal usage of arithmetic operation on non-integer types").into()
}

fn logic_type_error(op: BinaryOp) -> RunError {
    Exception::type_error(format!("Incompatible types for comparison {}", op.symbol())).into()
}
