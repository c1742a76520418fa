use colored::*;
use std::{
    fs,
    io::{self, Write},
    process,
};

use clap::Parser as ClapParser;

extern crate frontend;
extern crate runtime;

use frontend::lexer::tokenize;
use frontend::parser::Parser;
use runtime::{interpreter::Interpreter, state::ProgramState};

// --------
//   CLI
// --------

#[derive(ClapParser)]
#[command(version)]
#[command(about = "Interpreter for Cambridge style exam pseudocode")]
struct Cli {
    /// Path to the script to run
    #[arg(short, long)]
    file: Option<String>,

    /// Interactive mode after interpreting a file
    #[arg(short, long)]
    inter: bool,

    /// Prints the parse tree before running
    #[arg(short, long)]
    ast_print: bool,
}

fn open_file(file_path: &str) -> String {
    match fs::read_to_string(file_path) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error opening script file {}: {}", file_path, e);
            process::exit(1);
        }
    }
}

fn interpret_file(file_name: &str, state: &mut ProgramState, cli: &Cli) {
    println!("\nReading source file {}...", file_name.green());
    let source_code = open_file(file_name);

    interpretation_sequence(&source_code, state, cli);
}

fn interpretation_sequence(code: &str, state: &mut ProgramState, cli: &Cli) {
    let tokens = match tokenize(code) {
        Ok(tokens) => tokens,
        Err(e) => {
            println!("{e}");
            return;
        }
    };

    let program = match Parser::parse_program(tokens, code) {
        Ok(program) => program,
        Err(e) => {
            println!("{e}");
            return;
        }
    };

    if cli.ast_print {
        println!("\nParse tree:\n{:#?}", program);
    }

    let mut interpreter = Interpreter::new(state, code);
    if let Err(e) = interpreter.run(&program) {
        println!("{e}");
    }
}

// REPL. One ProgramState lives across all entered lines
fn repl(state: &mut ProgramState, cli: &Cli) {
    println!("\n{} mode started, 'quit' leaves", "Interactive".yellow().bold());

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut input = String::new();

    loop {
        input.clear();
        print!("\n> ");
        let _ = stdout.flush();

        match stdin.read_line(&mut input) {
            Ok(_) => {
                let trimmed_input = input.trim();

                if trimmed_input == "quit" {
                    process::exit(0);
                }

                interpretation_sequence(trimmed_input, state, cli);
            }
            Err(e) => {
                eprintln!("Error reading from terminal: {e}");
                process::exit(1);
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();

    println!("\n       --- {} v0.1 ---", "camscript".cyan().bold());
    let _ = io::stdout().flush();

    let mut state = ProgramState::new();

    if let Some(file_name) = cli.file.as_deref() {
        interpret_file(file_name, &mut state, &cli);

        // Interactive mode keeps the file's declarations around
        if cli.inter {
            repl(&mut state, &cli);
        }
    } else {
        repl(&mut state, &cli);
    }
}
