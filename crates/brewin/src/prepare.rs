//! Load-time preparation: struct and function tables, declared-type
//! validation, and `main` resolution. After this pass the tables are
//! read-only for the rest of the run.

use std::rc::Rc;

use ahash::AHashMap;

use crate::{
    dialect::Dialect,
    exception::Exception,
    expressions::{FuncDef, Program, TypeName},
    value::Type,
};

/// Index of a struct definition in the [`StructTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct StructId(u32);

impl StructId {
    pub fn new(index: usize) -> Self {
        Self(index.try_into().expect("struct table exceeded u32 entries"))
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A struct definition with its field types resolved.
#[derive(Debug, Clone)]
pub(crate) struct StructInfo {
    pub name: Rc<str>,
    /// Fields in declared order; instances are allocated in this order.
    pub fields: Vec<(Rc<str>, Type)>,
}

/// All struct definitions of the program, resolvable by name and id.
#[derive(Debug, Default)]
pub(crate) struct StructTable {
    infos: Vec<StructInfo>,
    by_name: AHashMap<Rc<str>, StructId>,
}

impl StructTable {
    pub fn resolve(&self, name: &str) -> Option<StructId> {
        self.by_name.get(name).copied()
    }

    pub fn info(&self, id: StructId) -> &StructInfo {
        &self.infos[id.index()]
    }

    /// Renders a runtime type for error messages.
    pub fn label(&self, ty: Type) -> String {
        match ty {
            Type::Int => "int".to_owned(),
            Type::Bool => "bool".to_owned(),
            Type::Str => "string".to_owned(),
            Type::Nil => "nil".to_owned(),
            Type::Void => "void".to_owned(),
            Type::Struct(id) => self.info(id).name.to_string(),
        }
    }

    /// Resolves an annotation against this table. `void` resolves too; the
    /// caller rejects it where only value types are legal.
    pub fn resolve_type_name(&self, name: &TypeName) -> Option<Type> {
        match name {
            TypeName::Int => Some(Type::Int),
            TypeName::Bool => Some(Type::Bool),
            TypeName::String => Some(Type::Str),
            TypeName::Void => Some(Type::Void),
            TypeName::Struct(struct_name) => self.resolve(struct_name).map(Type::Struct),
        }
    }
}

/// A function with its declared types resolved (v3) or defaulted.
#[derive(Debug, Clone)]
pub(crate) struct PreparedFunc {
    pub def: Rc<FuncDef>,
    /// Resolved parameter types, parallel to `def.params`. Empty outside v3.
    pub param_types: Vec<Type>,
    /// Resolved return type. `Type::Nil` outside v3 (fall-through yields nil).
    pub return_type: Type,
}

/// Call-dispatch table: functions in declaration order, resolved by name and
/// arity with the first match winning. `main` is deliberately absent.
#[derive(Debug, Default)]
pub(crate) struct FunctionTable {
    funcs: Vec<PreparedFunc>,
}

impl FunctionTable {
    pub fn resolve(&self, name: &str, arity: usize) -> Option<&PreparedFunc> {
        self.funcs
            .iter()
            .find(|func| &*func.def.name == name && func.def.params.len() == arity)
    }
}

/// Everything the interpreter needs after program load.
#[derive(Debug)]
pub(crate) struct Prepared {
    pub structs: StructTable,
    pub functions: FunctionTable,
    pub main: PreparedFunc,
}

pub(crate) fn prepare(program: &Program, dialect: Dialect) -> Result<Prepared, Exception> {
    let structs = if dialect.is_typed() {
        build_struct_table(program)?
    } else {
        StructTable::default()
    };

    let mut main = None;
    let mut funcs = Vec::new();
    if dialect.main_must_be_first() {
        // v1 runs exactly one function: the first, which must be main.
        match program.functions.first() {
            Some(func) if &*func.name == "main" => main = Some(prepare_func(func, dialect, &structs)?),
            _ => return Err(Exception::name_error("No main() function was found")),
        }
    } else {
        for func in &program.functions {
            let prepared = prepare_func(func, dialect, &structs)?;
            if &*func.name == "main" {
                main = Some(prepared);
            } else {
                funcs.push(prepared);
            }
        }
    }
    let Some(main) = main else {
        return Err(Exception::name_error("No main() function was found"));
    };
    if !main.def.params.is_empty() {
        return Err(Exception::name_error("main() may not take parameters"));
    }

    Ok(Prepared {
        structs,
        functions: FunctionTable { funcs },
        main,
    })
}

fn build_struct_table(program: &Program) -> Result<StructTable, Exception> {
    let mut table = StructTable::default();
    // Register names first so fields can reference any struct, including
    // the one being defined (linked lists) and ones defined later.
    for def in &program.structs {
        let id = StructId::new(table.infos.len());
        table.infos.push(StructInfo {
            name: Rc::clone(&def.name),
            fields: Vec::new(),
        });
        table.by_name.insert(Rc::clone(&def.name), id);
    }
    for (index, def) in program.structs.iter().enumerate() {
        let mut fields = Vec::with_capacity(def.fields.len());
        for field in &def.fields {
            let ty = match table.resolve_type_name(&field.declared_type) {
                Some(Type::Void) | None => {
                    return Err(Exception::type_error(format!(
                        "Unrecognized type for field {} of struct {}",
                        field.name, def.name
                    )));
                }
                Some(ty) => ty,
            };
            fields.push((Rc::clone(&field.name), ty));
        }
        table.infos[index].fields = fields;
    }
    Ok(table)
}

fn prepare_func(func: &Rc<FuncDef>, dialect: Dialect, structs: &StructTable) -> Result<PreparedFunc, Exception> {
    if !dialect.is_typed() {
        return Ok(PreparedFunc {
            def: Rc::clone(func),
            param_types: Vec::new(),
            return_type: Type::Nil,
        });
    }

    let mut param_types = Vec::with_capacity(func.params.len());
    for param in &func.params {
        let resolved = param
            .declared_type
            .as_ref()
            .and_then(|annotation| structs.resolve_type_name(annotation));
        match resolved {
            Some(Type::Void) | None => {
                return Err(Exception::type_error(format!("Invalid argument type for {}", func.name)));
            }
            Some(ty) => param_types.push(ty),
        }
    }

    // A missing return annotation means the function returns nothing.
    let return_type = match &func.return_type {
        None => Type::Void,
        Some(annotation) => structs
            .resolve_type_name(annotation)
            .ok_or_else(|| Exception::type_error(format!("Invalid return type for {}", func.name)))?,
    };

    Ok(PreparedFunc {
        def: Rc::clone(func),
        param_types,
        return_type,
    })
}
