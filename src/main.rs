//! VibeScript CLI and REPL
//!
//! Usage:
//!   vibe run <file.vibe> [--debug]   - Execute a VibeScript file
//!   vibe repl                        - Start interactive REPL
//!   vibe help                        - Show help message

use std::env;
use std::fs;
use std::process;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use vibescript::value::Value;
use vibescript::{lex, parse_all, Interpreter, VibeError, VERSION};

fn main() {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        return;
    }

    match args[1].as_str() {
        "run" => {
            let Some(path) = args.get(2) else {
                eprintln!("{}: missing file argument", "error".red());
                eprintln!("Usage: vibe run <file.vibe> [--debug]");
                process::exit(1);
            };
            let debug = args[3..].iter().any(|a| a == "--debug");
            run_file(path, debug);
        }
        "repl" => run_repl(),
        "help" | "--help" | "-h" => print_help(),
        "version" | "--version" | "-v" => println!("VibeScript {}", VERSION),
        _ => {
            // Assume it's a file
            if args[1].ends_with(".vibe") {
                let debug = args[2..].iter().any(|a| a == "--debug");
                run_file(&args[1], debug);
            } else {
                eprintln!("{}: unknown command '{}'", "error".red(), args[1]);
                print_help();
                process::exit(1);
            }
        }
    }
}

/// Log to stderr when RUST_LOG is set; stay silent otherwise
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn print_help() {
    println!("{}", "VibeScript".cyan().bold());
    println!("A tiny, friendly teaching language");
    println!("{} {}\n", "Version".cyan(), VERSION);
    println!("{}", "USAGE:".yellow());
    println!("  vibe run <file.vibe>           Execute a VibeScript file");
    println!("  vibe run <file.vibe> --debug   Also print tokens and syntax tree");
    println!("  vibe repl                      Start interactive REPL");
    println!("  vibe help                      Show this help message");
    println!("  vibe version                   Show version\n");
    println!("{}", "EXAMPLES:".yellow());
    println!("  vibe run demos/hello.vibe");
    println!("  vibe repl\n");
    println!("{}", "LANGUAGE FEATURES:".yellow());
    println!("  hold x = 10                    Mutable variable");
    println!("  lock pi = 3.14                 Constant");
    println!("  say x                          Print a value");
    println!("  keep (x > 0) {{ x = x - 1 }}     While loop");
    println!("  each (i from 1 to 3) {{ say i }} Range loop");
    println!("  skill add(a, b) {{ give a + b }} Function definition");
}

fn print_errors(errors: &[VibeError], source: &str) {
    for err in errors {
        eprintln!("{}", err.clone().with_source(source).to_string().red());
    }
}

fn run_file(path: &str, debug: bool) {
    let source = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("{}: cannot read file '{}': {}", "error".red(), path, e);
            process::exit(1);
        }
    };

    if debug {
        match lex(&source) {
            Ok(tokens) => {
                println!("{}", "TOKENS:".yellow());
                for token in &tokens {
                    println!("{}", token);
                }
                println!();
            }
            Err(e) => {
                print_errors(&[e], &source);
                process::exit(1);
            }
        }
    }

    let program = match parse_all(&source) {
        Ok(p) => p,
        Err(errors) => {
            print_errors(&errors, &source);
            process::exit(1);
        }
    };

    if debug {
        println!("{}", "SYNTAX TREE:".yellow());
        for stmt in &program.statements {
            println!("{:#?}", stmt);
        }
        println!("\n{}", "OUTPUT:".yellow());
    }

    let mut interpreter = Interpreter::new();
    if let Err(e) = interpreter.run(&program) {
        print_errors(&[e], &source);
        process::exit(1);
    }
}

fn run_repl() {
    println!("{} {} - {}",
        "VibeScript".cyan().bold(),
        VERSION.cyan(),
        "a tiny, friendly language".dimmed()
    );
    println!("Type {} to exit, {} for help\n",
        "exit".yellow(),
        "help".yellow()
    );

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("{}: cannot start REPL: {}", "error".red(), e);
            process::exit(1);
        }
    };

    // One interpreter for the whole session so definitions persist
    let mut interpreter = Interpreter::new();

    loop {
        match rl.readline(&format!("{} ", "vibe>".green().bold())) {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                match line {
                    "exit" | "quit" => {
                        println!("{}", "Goodbye!".cyan());
                        break;
                    }
                    "help" => {
                        print_repl_help();
                        continue;
                    }
                    "clear" => {
                        interpreter = Interpreter::new();
                        println!("{}", "State cleared.".dimmed());
                        continue;
                    }
                    "vars" => {
                        print_vars(&interpreter);
                        continue;
                    }
                    _ => {}
                }

                let program = match parse_all(line) {
                    Ok(p) => p,
                    Err(errors) => {
                        print_errors(&errors, line);
                        continue;
                    }
                };

                // `say` output already went to the console
                if let Err(e) = interpreter.run(&program) {
                    print_errors(&[e], line);
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".dimmed());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".cyan());
                break;
            }
            Err(err) => {
                eprintln!("{}: {:?}", "error".red(), err);
                break;
            }
        }
    }
}

fn print_vars(interpreter: &Interpreter) {
    let bindings: Vec<_> = interpreter
        .globals()
        .borrow()
        .local_bindings()
        .into_iter()
        .filter(|b| !matches!(b.value, Value::NativeFunction(_)))
        .collect();

    if bindings.is_empty() {
        println!("{}", "No variables defined.".dimmed());
        return;
    }

    for binding in bindings {
        let keyword = if binding.constant { "lock" } else { "hold" };
        println!("  {} {} = {}", keyword.dimmed(), binding.name, format!("{}", binding.value).cyan());
    }
}

fn print_repl_help() {
    println!("{}", "REPL Commands:".yellow());
    println!("  exit, quit   Exit the REPL");
    println!("  clear        Forget every definition");
    println!("  vars         List defined variables and skills");
    println!("  help         Show this help\n");
    println!("{}", "Language Examples:".yellow());
    println!("  hold name = ask \"who are you? \"");
    println!("  say \"hey \" + name");
    println!("  lock limit = 3");
    println!("  skill double(n) {{ give n * 2 }}");
    println!("  say double(limit)");
}
