mod highlighter;
mod validator;

use clap::Parser;
use miette::{IntoDiagnostic, Result, WrapErr};
use quill::{
    CompilationOptions, Engine, EngineOptions, Environment, ExecutionOptions, parser,
    render_error,
};
use quill_core::lexer::tokenize;
use reedline::{
    DefaultCompleter, DefaultPrompt, DefaultPromptSegment, DescriptionMode, EditCommand, Emacs,
    FileBackedHistory, IdeMenu, KeyCode, KeyModifiers, Keybindings, MenuBuilder, Reedline,
    ReedlineEvent, ReedlineMenu, Signal, default_emacs_keybindings,
};
use std::path::PathBuf;
use tracing::debug;

const HISTORY_FILE: &str = ".quill_history";
const HISTORY_CAPACITY: usize = 1000;

const KEYWORDS: &[&str] = &[
    "let", "be", "set", "to", "if", "then", "else", "while", "for", "from", "step", "define",
    "function", "with", "as", "return", "end", "and", "or", "not", "true", "false",
];

/// Quill - a small imperative scripting language
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(about = "Run Quill programs", long_about = None)]
struct Args {
    /// Print the token stream (for debugging)
    #[arg(long)]
    debug_tokens: bool,

    /// Print the parsed program (for debugging)
    #[arg(long)]
    debug_parse: bool,

    /// Maximum call depth before execution stops
    #[arg(long)]
    max_depth: Option<usize>,

    /// Maximum number of loop iterations per run
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Maximum syntactic nesting depth
    #[arg(long)]
    max_nesting: Option<usize>,

    /// Program text to run
    #[arg(short, long, conflicts_with = "file")]
    eval: Option<String>,

    /// Program file to run (if not provided, reads from stdin or starts a REPL)
    file: Option<PathBuf>,
}

impl Args {
    fn engine_options(&self) -> EngineOptions {
        let mut compilation = CompilationOptions::default();
        if let Some(max_nesting) = self.max_nesting {
            compilation.max_nesting_depth = max_nesting;
        }
        EngineOptions {
            default_compilation_options: compilation,
            default_execution_options: ExecutionOptions {
                max_depth: self.max_depth,
                max_iterations: self.max_iterations,
            },
        }
    }
}

fn add_menu_keybindings(keybindings: &mut Keybindings) {
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu("completion_menu".to_string()),
            ReedlineEvent::MenuNext,
        ]),
    );
    keybindings.add_binding(
        KeyModifiers::ALT,
        KeyCode::Enter,
        ReedlineEvent::Edit(vec![EditCommand::InsertNewline]),
    );
}

fn setup_reedline() -> Result<(Reedline, DefaultPrompt)> {
    let completer = Box::new({
        let mut completions = DefaultCompleter::with_inclusions(&['_']);
        completions.insert(KEYWORDS.iter().map(|k| k.to_string()).collect());
        completions
    });

    // Use the interactive menu to select options from the completer
    let ide_menu = IdeMenu::default()
        .with_name("completion_menu")
        .with_min_completion_width(0)
        .with_max_completion_width(50)
        .with_max_completion_height(u16::MAX)
        .with_padding(0)
        .with_cursor_offset(0)
        .with_description_mode(DescriptionMode::PreferRight)
        .with_min_description_width(0)
        .with_max_description_width(50)
        .with_description_offset(1)
        .with_correct_cursor_pos(false);

    let completion_menu = Box::new(ide_menu);

    let mut keybindings = default_emacs_keybindings();
    add_menu_keybindings(&mut keybindings);

    let edit_mode = Box::new(Emacs::new(keybindings));

    let mut line_editor = Reedline::create()
        .with_highlighter(Box::new(highlighter::Highlighter))
        .with_validator(Box::new(validator::BlockValidator))
        .with_completer(completer)
        .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
        .with_edit_mode(edit_mode);

    if let Some(home) = dirs::home_dir() {
        let path = home.join(HISTORY_FILE);
        debug!(path = %path.display(), "loading REPL history");
        let history = FileBackedHistory::with_file(HISTORY_CAPACITY, path)
            .into_diagnostic()
            .wrap_err("failed to open REPL history")?;
        line_editor = line_editor.with_history(Box::new(history));
    }

    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic("quill".to_string()),
        DefaultPromptSegment::Empty,
    );

    Ok((line_editor, prompt))
}

/// Run `source` against `env`, printing its value or rendering its error.
/// Returns whether it succeeded.
fn interpret_input(engine: &Engine, env: &mut Environment, source: &str, args: &Args) -> bool {
    if args.debug_tokens {
        match tokenize(source) {
            Ok(tokens) => {
                println!("=== Tokens ===");
                for token in &tokens {
                    println!("{} {:?} {:?}", token.span, token.kind, token.text);
                }
                println!();
            }
            Err(e) => {
                render_error(source, &e.into());
                return false;
            }
        }
    }

    if args.debug_parse {
        match parser::parse_program(source) {
            Ok(program) => {
                println!("=== Parsed Program ===");
                println!("{:#?}", program.statements);
                println!();
            }
            Err(e) => {
                render_error(source, &e);
                return false;
            }
        }
    }

    match engine.run_in(source, env) {
        Ok(outcome) => {
            if !outcome.value.is_unit() {
                println!("{}", outcome.value);
            }
            true
        }
        Err(e) => {
            render_error(source, &e);
            false
        }
    }
}

fn repl(engine: &Engine, args: &Args) -> Result<()> {
    let (mut line_editor, prompt) = setup_reedline()?;
    let mut env = Environment::new();

    println!("Quill REPL - Enter statements to run (Ctrl+D or Ctrl+C to exit)");

    loop {
        let sig = match line_editor.read_line(&prompt) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Reedline error: {e}");
                return Ok(());
            }
        };

        match sig {
            Signal::Success(buffer) => {
                interpret_input(engine, &mut env, &buffer, args);
            }
            Signal::CtrlD | Signal::CtrlC => {
                println!("\nGoodbye!");
                return Ok(());
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging subscriber
    use tracing_subscriber::{EnvFilter, fmt};

    // Use RUST_LOG to control log level, default to WARN if not set
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))
        .into_diagnostic()?;

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let engine = Engine::new(args.engine_options());

    let source = if let Some(source) = &args.eval {
        source.clone()
    } else if let Some(path) = &args.file {
        std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to read {}", path.display()))?
    } else if atty::is(atty::Stream::Stdin) {
        return repl(&engine, &args);
    } else {
        std::io::read_to_string(std::io::stdin())
            .into_diagnostic()
            .wrap_err("failed to read program from stdin")?
    };

    let mut env = Environment::new();
    if !interpret_input(&engine, &mut env, &source, &args) {
        std::process::exit(1);
    }

    Ok(())
}
