//! Public interface for running Brewin code.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    dialect::Dialect,
    environment::Environment,
    exception::{Exception, RunError},
    expressions::Program,
    heap::Heap,
    io::{InputReader, PrintWriter, StdInput, StdPrint},
    parse::{ParseError, parse_program},
    prepare::{FunctionTable, Prepared, StructTable, prepare},
};

/// Primary interface for running Brewin code.
///
/// A `Runner` owns a parsed program and its dialect. Parsing happens once in
/// [`new`](Self::new); each [`run`](Self::run) executes from a fresh heap and
/// environment, so a runner can be reused and, for fixed input, reproduces
/// identical output.
///
/// # Example
/// ```
/// use brewin::{CollectStringPrint, Dialect, NoInput, Runner};
///
/// let runner = Runner::new("func main() { print(6 * 7); }", Dialect::V4).unwrap();
/// let mut print = CollectStringPrint::new();
/// runner.run(&mut NoInput, &mut print).unwrap();
/// assert_eq!(print.output(), "42\n");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Runner {
    program: Program,
    dialect: Dialect,
}

impl Runner {
    /// Parses the given source for the given dialect.
    ///
    /// # Errors
    /// Returns a [`ParseError`] if the source does not lex or parse. Semantic
    /// load errors (missing `main`, bad declared types) surface as
    /// [`Exception`]s from [`run`](Self::run).
    pub fn new(source: &str, dialect: Dialect) -> Result<Self, ParseError> {
        let program = parse_program(source)?;
        Ok(Self { program, dialect })
    }

    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Serializes the runner to a binary format.
    ///
    /// The serialized data can be stored and later restored with
    /// [`load`](Self::load), which skips re-parsing.
    pub fn dump(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    /// Deserializes a runner from the binary format produced by
    /// [`dump`](Self::dump).
    pub fn load(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }

    /// Executes the program to completion against the given host surfaces.
    ///
    /// # Errors
    /// Returns the first host [`Exception`] (NAME/TYPE/FAULT), including an
    /// uncaught v4 raise surfaced as `FAULT_ERROR`.
    pub fn run(&self, input: &mut impl InputReader, print: &mut impl PrintWriter) -> Result<(), Exception> {
        let Prepared { structs, functions, main } = prepare(&self.program, self.dialect)?;
        let mut interp = Interp {
            dialect: self.dialect,
            structs,
            functions,
            heap: Heap::new(),
            print,
            input,
        };
        let mut env = Environment::new();
        match interp.invoke(&main, SmallVec::new(), &mut env) {
            Ok(_) => Ok(()),
            Err(RunError::Raise(_)) => Err(Exception::fault_error("Uncaught raise")),
            Err(RunError::Host(exception)) => Err(exception),
        }
    }

    /// Executes with the process's stdin and a buffered stdout writer.
    pub fn run_stdio(&self) -> Result<(), Exception> {
        self.run(&mut StdInput, &mut StdPrint::new())
    }
}

/// One program execution: the read-only tables, the mutable heap, and the
/// host surfaces. The environment is passed through evaluation explicitly
/// because thunk forcing swaps in captured snapshots.
pub(crate) struct Interp<'io, P: PrintWriter, R: InputReader> {
    pub(crate) dialect: Dialect,
    pub(crate) structs: StructTable,
    pub(crate) functions: FunctionTable,
    pub(crate) heap: Heap,
    pub(crate) print: &'io mut P,
    pub(crate) input: &'io mut R,
}
