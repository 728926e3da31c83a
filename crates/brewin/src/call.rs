//! Call dispatch: the `print`/`inputi`/`inputs` builtins, user-function
//! resolution by name and arity, parameter binding, and return shaping.

use std::rc::Rc;

use smallvec::SmallVec;

use crate::{
    environment::{Environment, FrameKind},
    exception::{Exception, RunResult},
    expressions::{CallExpr, ExprRef},
    exec::Flow,
    io::{InputReader, PrintWriter},
    prepare::PreparedFunc,
    run::Interp,
    value::{Type, Value, default_value},
};

#[derive(Debug, Clone, Copy)]
enum InputKind {
    Int,
    Str,
}

impl InputKind {
    fn name(self) -> &'static str {
        match self {
            Self::Int => "inputi",
            Self::Str => "inputs",
        }
    }
}

impl<P: PrintWriter, R: InputReader> Interp<'_, P, R> {
    pub(crate) fn call_function(&mut self, call: &CallExpr, env: &mut Environment) -> RunResult<Value> {
        match &*call.name {
            "print" => self.builtin_print(&call.args, env),
            "inputi" => self.builtin_input(&call.args, env, InputKind::Int),
            "inputs" => self.builtin_input(&call.args, env, InputKind::Str),
            _ => self.call_user_function(call, env),
        }
    }

    /// `print(args…)`: forces each argument left to right, concatenates the
    /// printable forms, and emits one output line.
    fn builtin_print(&mut self, args: &[ExprRef], env: &mut Environment) -> RunResult<Value> {
        let mut line = String::new();
        for arg in args {
            let value = self.eval_forced(arg, env)?;
            if self.dialect.is_typed() && matches!(value, Value::Void) {
                return Err(Exception::type_error("Using void in print").into());
            }
            let Some(text) = value.printable(&self.heap) else {
                return Err(Exception::type_error("Cannot print a struct value").into());
            };
            line.push_str(&text);
        }
        self.print.output_line(&line);
        Ok(if self.dialect.is_typed() { Value::Void } else { Value::Nil })
    }

    /// `inputi()`/`inputs()`: an optional prompt argument is forced and
    /// echoed, then one line of input becomes an int or string.
    fn builtin_input(&mut self, args: &[ExprRef], env: &mut Environment, kind: InputKind) -> RunResult<Value> {
        if args.len() > 1 {
            return Err(Exception::name_error(format!(
                "No {}() function found that takes > 1 parameter",
                kind.name()
            ))
            .into());
        }
        if let Some(prompt) = args.first() {
            let value = self.eval_forced(prompt, env)?;
            let Some(text) = value.printable(&self.heap) else {
                return Err(Exception::type_error("Cannot print a struct value").into());
            };
            self.print.output_line(&text);
        }
        self.print.flush();
        let Some(line) = self.input.read_line() else {
            return Err(Exception::fault_error("End of input").into());
        };
        match kind {
            InputKind::Int => match line.trim().parse::<i64>() {
                Ok(value) => Ok(Value::Int(value)),
                Err(_) => Err(Exception::type_error("inputi() received a non-integer input").into()),
            },
            InputKind::Str => Ok(Value::Str(self.heap.alloc_str(line))),
        }
    }

    fn call_user_function(&mut self, call: &CallExpr, env: &mut Environment) -> RunResult<Value> {
        let Some(func) = self.functions.resolve(&call.name, call.args.len()).cloned() else {
            return Err(Exception::name_error(format!("Function {} has not been defined", call.name)).into());
        };

        let mut bindings: SmallVec<[(Rc<str>, Value); 4]> = SmallVec::new();
        if self.dialect.is_lazy() {
            // One snapshot instant per call, shared by every argument thunk.
            let snapshot = env.snapshot();
            for (arg, param) in call.args.iter().zip(&func.def.params) {
                let thunk = self.heap.alloc_thunk(Rc::clone(arg), snapshot.clone());
                bindings.push((Rc::clone(&param.name), Value::Thunk(thunk)));
            }
        } else if self.dialect.is_typed() {
            for ((arg, param), declared) in call.args.iter().zip(&func.def.params).zip(&func.param_types) {
                let value = self.eval_expr(arg, env)?;
                let coerced = self.coerce_assignable(*declared, value)?;
                bindings.push((Rc::clone(&param.name), coerced));
            }
        } else {
            for (arg, param) in call.args.iter().zip(&func.def.params) {
                let value = self.eval_expr(arg, env)?;
                bindings.push((Rc::clone(&param.name), value));
            }
        }
        self.invoke(&func, bindings, env)
    }

    /// Runs a function body in a fresh function frame and shapes the result
    /// per dialect: v3 checks/coerces against the declared return type, the
    /// untyped dialects fall through to nil.
    pub(crate) fn invoke(
        &mut self,
        func: &PreparedFunc,
        bindings: SmallVec<[(Rc<str>, Value); 4]>,
        env: &mut Environment,
    ) -> RunResult<Value> {
        env.push(FrameKind::Function);
        let mut result = Ok(Flow::Continue);
        for (name, value) in bindings {
            if !env.create(&name, value) {
                result = Err(Exception::name_error(format!("Variable {name} defined more than once")).into());
                break;
            }
        }
        if result.is_ok() {
            result = self.exec_block(&func.def.body, env);
        }
        env.pop();
        let flow = result?;

        if !self.dialect.is_typed() {
            return Ok(match flow {
                Flow::Continue => Value::Nil,
                Flow::Return(value) => value,
            });
        }
        match flow {
            // Falling off the end, and bare `return`, both yield the
            // declared type's default.
            Flow::Continue | Flow::Return(Value::Void) => Ok(default_value(func.return_type, &mut self.heap)),
            Flow::Return(value) => {
                if func.return_type == Type::Void {
                    return Err(Exception::type_error("Returning a value from a void function").into());
                }
                Ok(self.coerce_assignable(func.return_type, value)?)
            }
        }
    }

    /// The v3 compatibility matrix shared by assignment, field writes,
    /// parameter binding and returns: exact type matches pass, Int coerces to
    /// a declared Bool, nil fills struct-typed slots, everything else is a
    /// type error.
    pub(crate) fn coerce_assignable(&self, declared: Type, value: Value) -> Result<Value, Exception> {
        let value_ty = value.type_of(&self.heap);
        match declared {
            Type::Struct(want) => {
                // Plain nil fills the slot; a nil-typed slot of another
                // struct type does NOT convert.
                if matches!(value, Value::Nil) {
                    return Ok(Value::StructNil(want));
                }
                if value_ty == declared {
                    return Ok(value);
                }
                if matches!(value_ty, Type::Struct(_)) {
                    return Err(Exception::type_error(format!(
                        "Struct type {} cannot be assigned to struct type {}",
                        self.structs.label(value_ty),
                        self.structs.label(declared)
                    )));
                }
                Err(self.assign_mismatch(declared, value_ty))
            }
            Type::Bool if value_ty == Type::Int => {
                let Value::Int(i) = value else {
                    unreachable!("int-typed value is an int");
                };
                Ok(Value::Bool(i != 0))
            }
            _ if value_ty == declared => Ok(value),
            _ if value_ty == Type::Nil => {
                Err(Exception::type_error(format!("nil cannot be assigned to a {}", self.structs.label(declared))))
            }
            _ => Err(self.assign_mismatch(declared, value_ty)),
        }
    }

    fn assign_mismatch(&self, declared: Type, value_ty: Type) -> Exception {
        Exception::type_error(format!(
            "{} cannot be assigned to a {}",
            self.structs.label(value_ty),
            self.structs.label(declared)
        ))
    }
}
