//! Statement execution: declarations, assignment, control flow, returns,
//! try/catch/raise.

use std::rc::Rc;

use crate::{
    environment::{Environment, FrameKind},
    exception::{Exception, RunError, RunResult},
    expressions::{Expr, ExprRef, Stmt, TypeName, VarPath},
    io::{InputReader, PrintWriter},
    run::Interp,
    value::{Type, Value, default_value},
};

/// How a statement left the surrounding block.
///
/// Raises travel on the error channel ([`RunError::Raise`]), so `Flow` only
/// distinguishes falling through from returning.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Flow {
    Continue,
    /// Carries the returned value — in v4 usually an unforced thunk.
    Return(Value),
}

impl<P: PrintWriter, R: InputReader> Interp<'_, P, R> {
    pub(crate) fn exec_block(&mut self, stmts: &[Stmt], env: &mut Environment) -> RunResult<Flow> {
        for stmt in stmts {
            match self.exec_stmt(stmt, env)? {
                Flow::Continue => {}
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }
        Ok(Flow::Continue)
    }

    pub(crate) fn exec_stmt(&mut self, stmt: &Stmt, env: &mut Environment) -> RunResult<Flow> {
        match stmt {
            Stmt::VarDef { name, declared_type } => {
                self.exec_vardef(name, declared_type.as_ref(), env)?;
                Ok(Flow::Continue)
            }
            Stmt::Assign { target, expr } => {
                self.exec_assign(target, expr, env)?;
                Ok(Flow::Continue)
            }
            Stmt::Call(call) => {
                // Evaluated for side effects; a deferred return value is
                // simply dropped unforced.
                self.call_function(call, env)?;
                Ok(Flow::Continue)
            }
            Stmt::If {
                condition,
                then_body,
                else_body,
            } => {
                if !self.dialect.has_control_flow() {
                    return Err(Exception::type_error("if is not supported in this dialect").into());
                }
                let branch = if self.eval_condition(condition, env, "if")? {
                    then_body
                } else {
                    else_body
                };
                env.push(FrameKind::If);
                let result = self.exec_block(branch, env);
                env.pop();
                result
            }
            Stmt::For {
                init,
                condition,
                update,
                body,
            } => {
                if !self.dialect.has_control_flow() {
                    return Err(Exception::type_error("for is not supported in this dialect").into());
                }
                self.exec_for(init, condition, update, body, env)
            }
            Stmt::Return { expr } => self.exec_return(expr.as_ref(), env),
            Stmt::Try { body, catchers } => {
                if !self.dialect.has_exceptions() {
                    return Err(Exception::type_error("try is not supported in this dialect").into());
                }
                env.push(FrameKind::Try);
                let result = self.exec_block(body, env);
                env.pop();
                let Err(RunError::Raise(tag)) = result else {
                    return result;
                };
                // First catcher whose tag matches, in declaration order;
                // otherwise the raise keeps propagating.
                for catcher in catchers {
                    if *catcher.tag == *tag {
                        env.push(FrameKind::Catch);
                        let handled = self.exec_block(&catcher.body, env);
                        env.pop();
                        return handled;
                    }
                }
                Err(RunError::Raise(tag))
            }
            Stmt::Raise { expr } => {
                if !self.dialect.has_exceptions() {
                    return Err(Exception::type_error("raise is not supported in this dialect").into());
                }
                let value = self.eval_forced(expr, env)?;
                let Value::Str(id) = value else {
                    return Err(Exception::type_error("Raise type not a string").into());
                };
                Err(RunError::Raise(self.heap.str(id).to_owned()))
            }
        }
    }

    fn exec_vardef(&mut self, name: &Rc<str>, declared_type: Option<&TypeName>, env: &mut Environment) -> RunResult<()> {
        let initial = if self.dialect.is_typed() {
            let ty = declared_type.and_then(|annotation| self.structs.resolve_type_name(annotation));
            match ty {
                Some(Type::Void) | None => {
                    return Err(Exception::type_error("Not a valid type for a variable").into());
                }
                Some(ty) => default_value(ty, &mut self.heap),
            }
        } else {
            // Untyped dialects ignore annotations and start every variable at nil.
            Value::Nil
        };
        if !env.create(name, initial) {
            return Err(Exception::name_error(format!("Variable {name} defined more than once")).into());
        }
        Ok(())
    }

    fn exec_assign(&mut self, target: &VarPath, expr: &ExprRef, env: &mut Environment) -> RunResult<()> {
        if target.is_dotted() && !self.dialect.is_typed() {
            return Err(Exception::type_error("Field access is not supported in this dialect").into());
        }
        if self.dialect.is_lazy() {
            // Call-by-need: store the expression and a snapshot of this exact
            // moment; evaluation happens at first use.
            let thunk = self.heap.alloc_thunk(Rc::clone(expr), env.snapshot());
            if !env.set(target.base(), Value::Thunk(thunk)) {
                return Err(Exception::name_error(format!("Variable {} has not been defined", target.display())).into());
            }
            return Ok(());
        }
        let value = self.eval_expr(expr, env)?;
        if self.dialect.is_typed() {
            if target.is_dotted() {
                return self.assign_field(target, value, env);
            }
            let Some(slot) = env.get(target.base()) else {
                return Err(Exception::name_error(format!("Variable {} has not been defined", target.display())).into());
            };
            let declared = slot.type_of(&self.heap);
            let coerced = self.coerce_assignable(declared, value)?;
            env.set(target.base(), coerced);
            return Ok(());
        }
        if !env.set(target.base(), value) {
            return Err(Exception::name_error(format!("Variable {} has not been defined", target.display())).into());
        }
        Ok(())
    }

    /// `a.b.c = value`: walk to the owning struct, type-check against the
    /// field's declared type, then mutate the shared payload.
    fn assign_field(&mut self, target: &VarPath, value: Value, env: &mut Environment) -> RunResult<()> {
        let Some(base) = env.get(target.base()) else {
            return Err(Exception::name_error(format!("Variable {} has not been defined", target.display())).into());
        };
        let mut current = base;
        let (last, walk) = target.segments[1..].split_last().expect("dotted path has a field");
        for field in walk {
            current = self.read_field(current, field)?;
        }
        let id = self.struct_payload(current)?;
        let Some(slot) = self.heap.struct_value(id).fields.get(&**last).copied() else {
            return Err(Exception::name_error(format!("Field {last} does not exist")).into());
        };
        let declared = slot.type_of(&self.heap);
        let coerced = self.coerce_assignable(declared, value)?;
        *self
            .heap
            .struct_value_mut(id)
            .fields
            .get_mut(&**last)
            .expect("field existence checked above") = coerced;
        Ok(())
    }

    fn exec_for(
        &mut self,
        init: &Stmt,
        condition: &Expr,
        update: &Stmt,
        body: &[Stmt],
        env: &mut Environment,
    ) -> RunResult<Flow> {
        self.exec_stmt(init, env)?;
        while self.eval_condition(condition, env, "for")? {
            env.push(FrameKind::For);
            let result = self.exec_block(body, env);
            env.pop();
            match result? {
                Flow::Continue => {}
                flow @ Flow::Return(_) => return Ok(flow),
            }
            self.exec_stmt(update, env)?;
        }
        Ok(Flow::Continue)
    }

    fn exec_return(&mut self, expr: Option<&ExprRef>, env: &mut Environment) -> RunResult<Flow> {
        let value = match expr {
            None => {
                if self.dialect.is_typed() {
                    // The function boundary swaps void for the declared default.
                    Value::Void
                } else {
                    Value::Nil
                }
            }
            Some(expr) => {
                if self.dialect.is_lazy() {
                    // Deferred: the caller forces this at its use site.
                    Value::Thunk(self.heap.alloc_thunk(Rc::clone(expr), env.snapshot()))
                } else {
                    self.eval_expr(expr, env)?
                }
            }
        };
        Ok(Flow::Return(value))
    }

    /// Evaluates an `if`/`for` condition down to a bool, with v3 coercion.
    fn eval_condition(&mut self, condition: &Expr, env: &mut Environment, context: &str) -> RunResult<bool> {
        let mut value = self.eval_forced(condition, env)?;
        if self.dialect.coerces_int_to_bool() {
            value = value.coerce_int_to_bool();
        }
        match value {
            Value::Bool(b) => Ok(b),
            _ => Err(Exception::type_error(format!("Invalid {context} condition")).into()),
        }
    }
}
