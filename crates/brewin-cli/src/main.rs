use std::{env, fs, process::ExitCode};

use brewin::{Dialect, Runner};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let Some(file_path) = args.get(1) else {
        eprintln!("usage: brewin <file> [v1|v2|v3|v4]");
        return ExitCode::FAILURE;
    };
    let dialect = match args.get(2) {
        None => Dialect::default(),
        Some(name) => match name.parse::<Dialect>() {
            Ok(dialect) => dialect,
            Err(_) => {
                eprintln!("error: unknown dialect `{name}` (expected v1, v2, v3 or v4)");
                return ExitCode::FAILURE;
            }
        },
    };

    let source = match read_file(file_path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let runner = match Runner::new(&source, dialect) {
        Ok(runner) => runner,
        Err(err) => {
            eprintln!("error:\n{err}");
            return ExitCode::FAILURE;
        }
    };

    match runner.run_stdio() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn read_file(file_path: &str) -> Result<String, String> {
    match fs::metadata(file_path) {
        Ok(metadata) => {
            if !metadata.is_file() {
                return Err(format!("{file_path} is not a file"));
            }
        }
        Err(err) => {
            return Err(format!("cannot read {file_path}: {err}"));
        }
    }
    fs::read_to_string(file_path).map_err(|err| format!("cannot read {file_path}: {err}"))
}
