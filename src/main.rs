use crossterm::style::Stylize;
use reedline::{
    FileBackedHistory, Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus,
    Reedline, Signal,
};
use std::{borrow::Cow, io};

use book_search::api_client::BooksClient;
use book_search::config::Config;
use book_search::search::{
    Category, FetchOutcome, FetchRequest, FetchResult, SearchController, SearchParams, SortMode,
};
use book_search::table_display::{display_results, export_to_csv};

struct BookPrompt;

impl Prompt for BookPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Borrowed("books> ")
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _edit_mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed("> ")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!(
            "({}reverse search: {})",
            prefix, history_search.term
        ))
    }
}

fn print_help() {
    println!("{}", "book-search - terminal Google Books client".blue().bold());
    println!();
    println!("{}", "Usage:".yellow());
    println!("  book-search [OPTIONS] [SEARCH TERM]");
    println!();
    println!("{}", "Options:".yellow());
    println!(
        "  {} - Generate config file with defaults",
        "--generate-config".green()
    );
    println!("  {}         - Use classic CLI mode", "--classic".green());
    println!("  {}            - Show this help", "--help".green());
    println!();
    println!("{}", "Classic mode commands:".yellow());
    println!("  {}            - Search for the typed term", "<term>".green());
    println!("  {}             - Load the next page of results", "\\more".green());
    println!(
        "  {}  - Set category filter (all, art, biography, …)",
        "\\category <name>".green()
    );
    println!(
        "  {}      - Set sort mode (relevance, newest)",
        "\\sort <mode>".green()
    );
    println!(
        "  {} - Export loaded results to CSV",
        "\\export <filename>".green()
    );
    println!("  {}             - Show this help", "\\help".green());
    println!("  {}            - Clear screen", "\\clear".green());
    println!("  {}     - Exit", "Ctrl+D / Ctrl+C".green());
    println!();
    println!(
        "Set {} for a higher request quota; requests work without one.",
        "GOOGLE_BOOKS_API_KEY".cyan()
    );
    println!();
}

/// Run one fetch synchronously and apply it to the controller.
fn run_fetch(controller: &mut SearchController, client: &BooksClient, request: FetchRequest) {
    let result = match client.fetch_page(&request.params, request.start_index) {
        Ok(list) => FetchResult::Page(list.items),
        Err(e) => {
            eprintln!("{}", format!("Error: {e:#}").red());
            FetchResult::Failed(e.to_string())
        }
    };
    controller.apply(FetchOutcome {
        generation: request.generation,
        page: request.page,
        result,
    });
}

fn run_classic(client: BooksClient, initial_term: Option<String>) -> io::Result<()> {
    print_help();

    let history_file = dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".book_search_cli_history");
    let history: Box<dyn reedline::History> = match FileBackedHistory::with_file(50, history_file)
    {
        Ok(h) => Box::new(h),
        Err(_) => Box::new(FileBackedHistory::default()),
    };

    let mut line_editor = Reedline::create().with_history(history);
    let prompt = BookPrompt;

    let mut controller = SearchController::new();
    let mut category = Category::All;
    let mut sort = SortMode::Relevance;

    println!("{}", format!("Using API: {}", client.base_url()).cyan());

    if let Some(term) = initial_term {
        if let Some(request) =
            controller.submit_query(SearchParams::new(term).with_category(category).with_sort(sort))
        {
            run_fetch(&mut controller, &client, request);
            display_results(controller.items());
        }
    }

    loop {
        let sig = line_editor.read_line(&prompt)?;
        match sig {
            Signal::Success(buffer) => {
                let trimmed = buffer.trim();
                if trimmed.is_empty() {
                    continue;
                }

                if trimmed == "\\help" {
                    print_help();
                    continue;
                }

                if trimmed == "\\clear" {
                    print!("{esc}[2J{esc}[1;1H", esc = 27 as char);
                    continue;
                }

                if trimmed == "\\more" {
                    match controller.load_more() {
                        Some(request) => {
                            run_fetch(&mut controller, &client, request);
                            display_results(controller.items());
                            if controller.is_exhausted() {
                                println!("{}", "No further pages for this query.".yellow());
                            }
                        }
                        None if controller.is_exhausted() => {
                            println!("{}", "No further pages for this query.".yellow());
                        }
                        None => {
                            eprintln!("{}", "Nothing to extend. Search first.".red());
                        }
                    }
                    continue;
                }

                if let Some(rest) = trimmed.strip_prefix("\\category") {
                    match Category::parse(rest) {
                        Some(parsed) => {
                            category = parsed;
                            println!("{}", format!("Category: {category}").cyan());
                            resubmit(&mut controller, &client, category, sort);
                        }
                        None => {
                            let names: Vec<&str> =
                                Category::ALL_VALUES.iter().map(|c| c.as_str()).collect();
                            eprintln!(
                                "{}",
                                format!("Unknown category. One of: {}", names.join(", ")).red()
                            );
                        }
                    }
                    continue;
                }

                if let Some(rest) = trimmed.strip_prefix("\\sort") {
                    match SortMode::parse(rest) {
                        Some(parsed) => {
                            sort = parsed;
                            println!("{}", format!("Sort: {sort}").cyan());
                            resubmit(&mut controller, &client, category, sort);
                        }
                        None => {
                            eprintln!("{}", "Sort mode is 'relevance' or 'newest'.".red());
                        }
                    }
                    continue;
                }

                if trimmed.starts_with("\\export") {
                    let parts: Vec<&str> = trimmed.split_whitespace().collect();
                    if parts.len() < 2 {
                        eprintln!("{}", "Usage: \\export <filename>".red());
                        continue;
                    }
                    if controller.items().is_empty() {
                        eprintln!("{}", "No results to export. Search first.".red());
                        continue;
                    }
                    match export_to_csv(controller.items(), parts[1]) {
                        Ok(()) => println!(
                            "{}",
                            format!("Exported {} books to {}", controller.items().len(), parts[1])
                                .green()
                        ),
                        Err(e) => eprintln!("{}", format!("Export error: {e:#}").red()),
                    }
                    continue;
                }

                if trimmed.starts_with('\\') {
                    eprintln!("{}", format!("Unknown command: {trimmed}").red());
                    continue;
                }

                let params = SearchParams::new(trimmed)
                    .with_category(category)
                    .with_sort(sort);
                if let Some(request) = controller.submit_query(params) {
                    run_fetch(&mut controller, &client, request);
                    display_results(controller.items());
                    if controller.can_load_more() {
                        println!("{}", "More results may exist: \\more".cyan());
                    }
                }
            }
            Signal::CtrlD | Signal::CtrlC => {
                println!("\nGoodbye!");
                break;
            }
        }
    }

    Ok(())
}

fn resubmit(
    controller: &mut SearchController,
    client: &BooksClient,
    category: Category,
    sort: SortMode,
) {
    let term = controller.params().term.clone();
    if term.trim().is_empty() {
        return;
    }
    let params = SearchParams::new(term).with_category(category).with_sort(sort);
    if let Some(request) = controller.submit_query(params) {
        run_fetch(controller, client, request);
        display_results(controller.items());
    }
}

fn main() -> io::Result<()> {
    let log_buffer = book_search::logging::init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.contains(&"--help".to_string()) {
        print_help();
        return Ok(());
    }

    if args.contains(&"--generate-config".to_string()) {
        match Config::get_config_path() {
            Ok(path) => {
                if let Some(parent) = path.parent() {
                    if let Err(e) = std::fs::create_dir_all(parent) {
                        eprintln!("Error creating config directory: {}", e);
                        std::process::exit(1);
                    }
                }
                if let Err(e) = std::fs::write(&path, Config::create_default_with_comments()) {
                    eprintln!("Error writing config file: {}", e);
                    std::process::exit(1);
                }
                println!("Configuration file created at: {:?}", path);
                return Ok(());
            }
            Err(e) => {
                eprintln!("Error determining config path: {}", e);
                std::process::exit(1);
            }
        }
    }

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Config error ({e:#}), using defaults");
        Config::default()
    });

    let api_key = config.resolve_api_key();
    let client = BooksClient::new(&config.api.base_url, api_key);

    let initial_term = {
        let words: Vec<String> = args
            .iter()
            .filter(|a| !a.starts_with("--"))
            .cloned()
            .collect();
        if words.is_empty() {
            None
        } else {
            Some(words.join(" "))
        }
    };

    if args.contains(&"--classic".to_string()) {
        return run_classic(client, initial_term);
    }

    book_search::ui::run_tui(client, config, log_buffer, initial_term)
}
