use std::{
    io::{self, Write},
    process::ExitCode,
};

use nebula::{ReplSession, Runner, StdPrint, VERSION, needs_more};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        // File execution mode
        let path = &args[1];
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("error reading {path}: {err}");
                return ExitCode::FAILURE;
            }
        };
        let runner = Runner::new(source).with_script_path(path).with_argv(args.clone());
        let mut print = StdPrint::new();
        return match runner.run(&mut print) {
            Ok(_) => ExitCode::SUCCESS,
            Err(err) => {
                drop(print);
                eprintln!("{err}");
                ExitCode::FAILURE
            }
        };
    }

    repl(args)
}

/// Interactive mode: buffer lines until the submission balances, echo any
/// non-null result, reset the buffer on errors and keep going.
fn repl(args: Vec<String>) -> ExitCode {
    println!("nebula version {VERSION}");
    let mut session = ReplSession::new(args);
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() { ">>> " } else { "... " };
        let Some(line) = read_line(prompt) else {
            println!();
            break;
        };

        if buffer.is_empty() {
            match line.trim() {
                "quit" | "exit" | ":q" => break,
                ":reset" => {
                    session.reset();
                    println!("Interpreter reset.");
                    continue;
                }
                "" => continue,
                _ => {}
            }
        }

        if !buffer.is_empty() {
            buffer.push('\n');
        }
        buffer.push_str(&line);

        if needs_more(&buffer) {
            continue;
        }

        let mut print = StdPrint::new();
        match session.execute(&buffer, &mut print) {
            Ok(result) => {
                drop(print);
                if !result.is_null() {
                    println!("{result}");
                }
            }
            Err(err) => {
                drop(print);
                eprintln!("Error: {err}");
            }
        }
        buffer.clear();
    }

    ExitCode::SUCCESS
}

/// Reads one line from stdin after printing a prompt.
///
/// Returns `None` on EOF (Ctrl+D).
fn read_line(prompt: &str) -> Option<String> {
    print!("{prompt}");
    if io::stdout().flush().is_err() {
        return None;
    }
    let mut input = String::new();
    let read = io::stdin().read_line(&mut input).ok()?;
    if read == 0 {
        return None;
    }
    Some(input.trim_end_matches(['\r', '\n']).to_owned())
}
