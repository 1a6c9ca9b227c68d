mod ai;
mod app;
mod cli;
mod completions;
mod config;
mod csv;
mod dispatch;
mod domain;
mod form;
mod logging;
mod query;
mod record_id;
mod storage;
mod store;
mod transfer;
mod ui;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn print_json(value: &impl serde::Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("json serialization should work")
    );
}

fn run() -> Result<(), app::AppError> {
    use clap::Parser;
    use cli::{Commands, ItemsSubcommands, ThemeAction};
    use dispatch::with_record;
    use domain::{EntityKind, LineItem, Task};
    use transfer::ImportOptions;

    let cli = cli::Cli::parse();
    logging::init(cli.verbose);

    match &cli.command {
        Commands::Completions(args) => {
            return completions::run_completions_command(args.shell.as_deref(), args.install);
        }
        Commands::Fields(args) => {
            let palette = ui::Palette::auto(false);
            with_record!(args.entity, R => dispatch::fields::<R>(args.json, &palette));
            return Ok(());
        }
        Commands::Template(args) => {
            return with_record!(args.entity, R => dispatch::template::<R>(args.output.as_deref()));
        }
        _ => {}
    }

    if let Commands::Init = &cli.command {
        if config::Config::write_default(&cli.config)? {
            println!("wrote {}", cli.config.display());
        }
    }
    let config = config::Config::load(&cli.config)?;
    let app = app::App::open(&cli.db, config)?;
    let palette = ui::Palette::auto(app.dark_mode()?);

    match cli.command {
        Commands::Init => {
            for count in app.init_collections()? {
                let note = if count.seeded { " (seeded)" } else { "" };
                println!("{:<10} {} record(s){}", count.storage_key, count.count, note);
            }
            println!("recordbook init completed");
        }
        Commands::Ls(args) => {
            if args.entity == EntityKind::Tasks {
                let projects = app.projects()?;
                let relabel = |task: &Task, column: &str| -> Option<String> {
                    (column == "projectId").then(|| task.project_label(&projects).to_string())
                };
                dispatch::list::<Task>(&app, &args.query, args.json, &palette, &relabel)?;
            } else {
                with_record!(args.entity, R => dispatch::list::<R>(
                    &app,
                    &args.query,
                    args.json,
                    &palette,
                    &dispatch::no_relabel::<R>,
                ))?;
            }
        }
        Commands::Show(args) => {
            with_record!(args.entity, R => dispatch::show::<R>(&app, &args.id, args.json, &palette))?;
        }
        Commands::Add(args) => {
            with_record!(args.entity, R => dispatch::add::<R>(&app, &args.values, args.json, &palette))?;
        }
        Commands::Update(args) => {
            with_record!(args.entity, R => dispatch::update::<R>(
                &app,
                &args.id,
                &args.values,
                args.json,
                &palette,
            ))?;
        }
        Commands::Rm(args) => {
            if args.entity == EntityKind::Projects {
                let question = if args.cascade {
                    format!("delete project '{}' and its tasks", args.id)
                } else {
                    format!("delete project '{}'", args.id)
                };
                if !ui::confirm(&question, args.yes)? {
                    println!("aborted");
                    return Ok(());
                }
                let removal = app.remove_project(&args.id, args.cascade)?;
                println!(
                    "removed project {} ({} task(s) removed)",
                    removal.project.id,
                    removal.removed_tasks.len()
                );
            } else if args.cascade {
                return Err(app::AppError::InvalidArgument(
                    "--cascade only applies to projects".to_string(),
                ));
            } else {
                with_record!(args.entity, R => dispatch::remove::<R>(&app, &args.id, args.yes))?;
            }
        }
        Commands::Clear(args) => {
            with_record!(args.entity, R => dispatch::clear::<R>(&app, args.yes, args.reseed))?;
        }
        Commands::Items(args) => match args.command {
            ItemsSubcommands::Ls(items) => {
                dispatch::line_items(&app, &items.invoice, items.json, &palette)?;
            }
            ItemsSubcommands::Add(items) => {
                let invoice = app.add_line_item(
                    &items.invoice,
                    LineItem {
                        description: items.description,
                        quantity: items.quantity,
                        unit_price: items.unit_price,
                    },
                )?;
                println!(
                    "invoice {} now has {} item(s), total {:.2}",
                    palette.id(&invoice.id),
                    invoice.items.len(),
                    invoice.total()
                );
            }
            ItemsSubcommands::Rm(items) => {
                let invoice = app.remove_line_item(&items.invoice, items.index)?;
                println!(
                    "invoice {} now has {} item(s), total {:.2}",
                    palette.id(&invoice.id),
                    invoice.items.len(),
                    invoice.total()
                );
            }
        },
        Commands::Export(args) => {
            with_record!(args.entity, R => dispatch::export::<R>(
                &app,
                args.format.into(),
                &args.query,
                args.output.as_deref(),
            ))?;
        }
        Commands::Import(args) => {
            let options = ImportOptions {
                strict: args.strict,
                dry_run: args.dry_run,
            };
            let format = args.format.map(Into::into);
            with_record!(args.entity, R => dispatch::import::<R>(
                &app,
                &args.file,
                format,
                options,
                args.json,
            ))?;
        }
        Commands::Stats(args) => {
            with_record!(args.entity, R => dispatch::stats::<R>(&app, &args.query, args.json, &palette))?;
        }
        Commands::Check(args) => {
            let orphans = app.orphaned_tasks()?;
            if args.json && !args.fix {
                print_json(&orphans);
                return Ok(());
            }
            if orphans.is_empty() {
                println!("no orphaned tasks");
                return Ok(());
            }
            for task in &orphans {
                println!(
                    "orphaned task {} {} (project {})",
                    palette.id(&task.id),
                    task.title,
                    task.project_id
                );
            }
            if args.fix {
                if !ui::confirm(&format!("delete {} orphaned task(s)", orphans.len()), args.yes)? {
                    println!("aborted");
                    return Ok(());
                }
                let removed = app.remove_orphaned_tasks()?;
                if args.json {
                    print_json(&removed);
                } else {
                    println!("removed {} task(s)", removed.len());
                }
            }
        }
        Commands::Theme(args) => {
            let dark = match args.action {
                None => app.dark_mode()?,
                Some(ThemeAction::On) => app.set_dark_mode(true)?,
                Some(ThemeAction::Off) => app.set_dark_mode(false)?,
                Some(ThemeAction::Toggle) => app.toggle_dark_mode()?,
            };
            println!("dark mode {}", if dark { "on" } else { "off" });
        }
        Commands::Ai(args) => {
            let prompt = dispatch::read_prompt(args.prompt)?;
            let mut request = ai::AiRequest::new(prompt);
            if let Some(kind) = args.entity {
                let attachment =
                    with_record!(kind, R => dispatch::ai_attachment::<R>(&app, &args.query))?;
                request = request.with_attachment(attachment);
            } else if let Some(path) = args.attach.as_deref() {
                request = request.with_attachment(dispatch::file_attachment(path)?);
            }
            dispatch::ask(&app, request, args.json)?;
        }
        Commands::Fields(_) | Commands::Template(_) | Commands::Completions(_) => {
            unreachable!("handled before the store is opened")
        }
    }
    Ok(())
}
