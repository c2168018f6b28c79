use chrono::NaiveDate;
use school_planner::{
    EXPORT_FILE_NAME, Mood, Outcome, PRIORITY_COUNT, PlannerConfig, PlannerResult,
    PlannerSession, PlannerState, SLOTS_PER_DAY, SchoolDay, derive_editable_fields, logging,
    today_key,
};
use std::io::{self, Write};

fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    // Widths in chars, not bytes.
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            if len > widths[ci] {
                widths[ci] = len;
            }
        }
    }

    let mut sep = String::new();
    sep.push('+');
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |cells: &[String]| {
        let mut line = String::from("|");
        for (ci, cell) in cells.iter().enumerate() {
            line.push(' ');
            line.push_str(cell);
            let pad = widths[ci].saturating_sub(cell.chars().count());
            if pad > 0 {
                line.push_str(&" ".repeat(pad));
            }
            line.push_str(" |");
        }
        line.push('\n');
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(headers));
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        out.push_str(&render_row(row.as_slice()));
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn render_timetable(state: &PlannerState) -> String {
    let mut headers = vec!["Zi / Ora".to_string()];
    headers.extend((1..=SLOTS_PER_DAY).map(|slot| format!("Ora {slot}")));
    let rows: Vec<Vec<String>> = state
        .timetable()
        .days()
        .map(|(day, lessons)| {
            let mut row = vec![day.label().to_string()];
            row.extend(lessons.iter().cloned());
            row
        })
        .collect();
    render_table(&headers, &rows)
}

fn render_plan(state: &PlannerState) -> String {
    let editable = state.editable();
    let saved = derive_editable_fields(state.planners(), state.selected_day());
    let mut out = format!("Day: {}", state.selected_day());
    if *editable != saved {
        out.push_str(" (unsaved changes)");
    }
    out.push_str("\nPriorities:\n");
    for (idx, priority) in editable.priorities.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", idx + 1, priority));
    }
    out.push_str(&format!("Notes: {}\n", editable.notes));
    let mood = editable.mood.map(Mood::label).unwrap_or("(none)");
    out.push_str(&format!("Mood : {}\n", mood));
    out.push_str("Todos:\n");
    if state.todos().is_empty() {
        out.push_str("  (none)\n");
    }
    for (idx, todo) in state.todos().iter().enumerate() {
        let mark = if todo.done { "x" } else { " " };
        out.push_str(&format!("  {}. [{}] {}\n", idx + 1, mark, todo.text));
    }
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show                               Show the weekly timetable\n  lesson <day> <slot 1-7> [text...]  Set (or clear) one lesson\n  example                            Fill the timetable with the sample week\n  reset                              Clear the timetable (asks for confirmation)\n  subjects                           List quick subjects\n  subject add <text...>              Add a quick subject\n  day [YYYY-MM-DD|today]             Show or change the selected day\n  plan                               Show the plan for the selected day\n  priority <1-3> [text...]           Edit a priority\n  notes [text...]                    Edit the notes\n  mood [label|none]                  Edit the mood\n  moods                              List available moods\n  clear                              Clear priorities, notes and mood (unsaved)\n  save                               Save priorities, notes and mood for the day\n  todo add <text...>                 Add a todo to the selected day\n  todo toggle <n>                    Toggle todo n\n  todo remove <n>                    Remove todo n\n  export [path]                      Export data as JSON (default school-planner.json)\n  import <path>                      Import data from a JSON export\n  quit|exit                          Exit"
    );
}

fn print_subjects(state: &PlannerState) {
    println!("Subjects:");
    for subject in state.subjects() {
        println!("  {}", subject);
    }
}

fn print_moods() {
    println!("Available moods:");
    for mood in Mood::ALL {
        println!("  {}", mood.label());
    }
}

fn day_names() -> String {
    SchoolDay::ALL
        .iter()
        .map(|day| day.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parses a 1-based position in `1..=max` into a 0-based index.
fn parse_position(input: Option<&str>, max: usize) -> Option<usize> {
    let position: usize = input?.parse().ok()?;
    (1..=max).contains(&position).then(|| position - 1)
}

fn report(result: PlannerResult<Outcome>) -> Option<Outcome> {
    match result {
        Ok(outcome) => {
            if let Some(notice) = &outcome.notice {
                println!("{}", notice);
            }
            Some(outcome)
        }
        Err(e) => {
            println!("Error: {}", e);
            None
        }
    }
}

fn read_answer(stdin: &io::Stdin) -> Option<String> {
    let mut answer = String::new();
    match stdin.read_line(&mut answer) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(answer.trim().to_string()),
    }
}

fn main() {
    let config = PlannerConfig::from_env();
    logging::init_tracing("school_planner=warn");

    let store = match config.store.open() {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error opening store: {}", e);
            std::process::exit(1);
        }
    };
    let mut session = match PlannerSession::open(store) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error loading planner: {}", e);
            std::process::exit(1);
        }
    };

    println!("School Planner (CLI) - type 'help' for commands\n");
    println!("{}", render_timetable(session.state()));

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => println!("{}", render_timetable(session.state())),
            "lesson" => {
                let day_s = parts.next();
                let slot_s = parts.next();
                let text = parts.collect::<Vec<_>>().join(" ");
                let Some(day_s) = day_s else {
                    println!("Usage: lesson <day> <slot 1-7> [text...]");
                    continue;
                };
                let Some(day) = SchoolDay::parse(day_s) else {
                    println!("Unknown day '{}'. Days: {}", day_s, day_names());
                    continue;
                };
                let Some(slot) = parse_position(slot_s, SLOTS_PER_DAY) else {
                    println!("Invalid slot (1-{})", SLOTS_PER_DAY);
                    continue;
                };
                if report(session.set_lesson(day.label(), slot, &text)).is_some() {
                    println!("Lesson set.\n{}", render_timetable(session.state()));
                }
            }
            "example" => {
                if report(session.autofill_example()).is_some() {
                    println!("Example timetable loaded.\n{}", render_timetable(session.state()));
                }
            }
            "reset" => {
                print!("Reset the timetable to its defaults? [y/N] ");
                let _ = io::stdout().flush();
                let confirmed = read_answer(&stdin)
                    .map(|answer| matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
                    .unwrap_or(false);
                if let Some(outcome) = report(session.reset_timetable(confirmed)) {
                    if outcome.changes.is_empty() {
                        println!("Reset cancelled.");
                    } else {
                        println!("Timetable reset.\n{}", render_timetable(session.state()));
                    }
                }
            }
            "subjects" => print_subjects(session.state()),
            "subject" => match parts.next() {
                Some("add") => {
                    let label = parts.collect::<Vec<_>>().join(" ");
                    if let Some(outcome) = report(session.add_subject(&label)) {
                        if outcome.changes.is_empty() {
                            println!("Usage: subject add <text...>");
                        } else {
                            println!("Subject added.");
                            print_subjects(session.state());
                        }
                    }
                }
                _ => println!("Usage: subject add <text...>"),
            },
            "day" => match parts.next() {
                None => println!("Selected day: {}", session.state().selected_day()),
                Some(day_s) => {
                    let day = if day_s.eq_ignore_ascii_case("today") {
                        today_key()
                    } else {
                        match NaiveDate::parse_from_str(day_s, "%Y-%m-%d") {
                            Ok(date) => date.format("%Y-%m-%d").to_string(),
                            Err(_) => {
                                println!("Invalid date (YYYY-MM-DD)");
                                continue;
                            }
                        }
                    };
                    if report(session.select_day(&day)).is_some() {
                        println!("Selected day {}.\n{}", day, render_plan(session.state()));
                    }
                }
            },
            "plan" => println!("{}", render_plan(session.state())),
            "priority" => {
                let Some(index) = parse_position(parts.next(), PRIORITY_COUNT) else {
                    println!("Usage: priority <1-{}> [text...]", PRIORITY_COUNT);
                    continue;
                };
                let text = parts.collect::<Vec<_>>().join(" ");
                if report(session.edit_priority(index, &text)).is_some() {
                    println!("Priority {} set.\n{}", index + 1, render_plan(session.state()));
                }
            }
            "notes" => {
                let text = parts.collect::<Vec<_>>().join(" ");
                if report(session.edit_notes(&text)).is_some() {
                    println!("Notes set.\n{}", render_plan(session.state()));
                }
            }
            "mood" => {
                let label = parts.collect::<Vec<_>>().join(" ");
                let mood = if label.is_empty() || label.eq_ignore_ascii_case("none") {
                    None
                } else {
                    match Mood::parse(&label) {
                        Some(mood) => Some(mood),
                        None => {
                            println!("Unknown mood '{}'. Type 'moods'.", label);
                            continue;
                        }
                    }
                };
                if report(session.set_mood(mood)).is_some() {
                    println!("Mood set.\n{}", render_plan(session.state()));
                }
            }
            "moods" => print_moods(),
            "clear" => {
                if report(session.clear_editable()).is_some() {
                    println!("Editable fields cleared.\n{}", render_plan(session.state()));
                }
            }
            "save" => {
                if report(session.save_planner()).is_some() {
                    println!("{}", render_plan(session.state()));
                }
            }
            "todo" => match parts.next() {
                Some("add") => {
                    let text = parts.collect::<Vec<_>>().join(" ");
                    if let Some(outcome) = report(session.add_todo(&text)) {
                        if outcome.changes.is_empty() {
                            println!("Usage: todo add <text...>");
                        } else {
                            println!("Todo added.\n{}", render_plan(session.state()));
                        }
                    }
                }
                Some(sub @ ("toggle" | "remove")) => {
                    let count = session.state().todos().len();
                    let Some(index) = parse_position(parts.next(), count) else {
                        println!("No such todo. The selected day has {} todo(s).", count);
                        continue;
                    };
                    let result = if sub == "toggle" {
                        session.toggle_todo(index)
                    } else {
                        session.remove_todo(index)
                    };
                    if report(result).is_some() {
                        let verb = if sub == "toggle" { "updated" } else { "removed" };
                        println!("Todo {}.\n{}", verb, render_plan(session.state()));
                    }
                }
                _ => println!("Usage: todo add <text...> | todo toggle <n> | todo remove <n>"),
            },
            "export" => {
                let path = parts.next().unwrap_or(EXPORT_FILE_NAME);
                match session.export_to_path(path) {
                    Ok(_) => println!("Exported to {}.", path),
                    Err(e) => println!("Error exporting: {}", e),
                }
            }
            "import" => match parts.next() {
                Some(path) => match session.import_from_path(path) {
                    Ok(outcome) => {
                        if let Some(notice) = outcome.notice {
                            println!("{}", notice);
                        }
                        println!("{}", render_timetable(session.state()));
                    }
                    Err(e) => println!("Error importing: {}", e),
                },
                None => println!("Usage: import <path>"),
            },
            _ => {
                println!("Unknown command. Type 'help'.");
            }
        }
    }
}
