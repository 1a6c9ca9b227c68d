use clap::Parser;

use super::{Cli, Commands, FormatArg, ItemsSubcommands, ThemeAction};
use crate::domain::EntityKind;

fn parse(args: &[&str]) -> Cli {
    Cli::parse_from(args)
}

#[test]
fn ls_collects_query_flags() {
    let cli = parse(&[
        "recordbook",
        "ls",
        "invoice",
        "-q",
        "acme",
        "-s",
        "paid",
        "--sort",
        "dueDate",
        "--sort",
        "dueDate",
        "-p",
        "2",
        "--page-size",
        "5",
    ]);
    match cli.command {
        Commands::Ls(args) => {
            assert_eq!(args.entity, EntityKind::Invoices);
            assert_eq!(args.query.search.as_deref(), Some("acme"));
            assert_eq!(args.query.filter.as_deref(), Some("paid"));
            assert_eq!(args.query.sort, vec!["dueDate", "dueDate"]);
            assert_eq!(args.query.page, Some(2));
            assert_eq!(args.query.page_size, Some(5));
            assert!(!args.json);
        }
        other => panic!("expected Ls, got {:?}", other),
    }
}

#[test]
fn no_page_conflicts_with_page_number() {
    let result = Cli::try_parse_from(["recordbook", "ls", "invoices", "--no-page", "-p", "2"]);
    assert!(result.is_err());
}

#[test]
fn entity_aliases_parse() {
    let cli = parse(&["recordbook", "show", "jewelry", "prd-1", "--json"]);
    match cli.command {
        Commands::Show(args) => {
            assert_eq!(args.entity, EntityKind::Products);
            assert_eq!(args.id, "prd-1");
            assert!(args.json);
        }
        other => panic!("expected Show, got {:?}", other),
    }
    assert!(Cli::try_parse_from(["recordbook", "ls", "widgets"]).is_err());
}

#[test]
fn rm_accepts_cascade_and_yes() {
    let cli = parse(&["recordbook", "rm", "projects", "prj-1", "--cascade", "-y"]);
    match cli.command {
        Commands::Rm(args) => {
            assert_eq!(args.entity, EntityKind::Projects);
            assert!(args.cascade);
            assert!(args.yes);
        }
        other => panic!("expected Rm, got {:?}", other),
    }
}

#[test]
fn clear_accepts_reseed() {
    match parse(&["recordbook", "clear", "invoices", "--reseed", "-y"]).command {
        Commands::Clear(args) => {
            assert_eq!(args.entity, EntityKind::Invoices);
            assert!(args.reseed);
            assert!(args.yes);
        }
        other => panic!("expected Clear, got {:?}", other),
    }
}

#[test]
fn update_requires_assignments() {
    assert!(Cli::try_parse_from(["recordbook", "update", "tasks", "tsk-1"]).is_err());
    let cli = parse(&["recordbook", "update", "tasks", "tsk-1", "status=done"]);
    match cli.command {
        Commands::Update(args) => assert_eq!(args.values, vec!["status=done"]),
        other => panic!("expected Update, got {:?}", other),
    }
}

#[test]
fn items_add_defaults_quantity() {
    let cli = parse(&[
        "recordbook",
        "items",
        "add",
        "inv-1",
        "Design review",
        "--unit-price",
        "250",
    ]);
    match cli.command {
        Commands::Items(args) => match args.command {
            ItemsSubcommands::Add(item) => {
                assert_eq!(item.invoice, "inv-1");
                assert_eq!(item.description, "Design review");
                assert_eq!(item.quantity, 1.0);
                assert_eq!(item.unit_price, 250.0);
            }
            other => panic!("expected Add, got {:?}", other),
        },
        other => panic!("expected Items, got {:?}", other),
    }
}

#[test]
fn items_add_rejects_non_finite_prices() {
    for raw in ["NaN", "inf", "-inf", "lots"] {
        let result = Cli::try_parse_from([
            "recordbook",
            "items",
            "add",
            "inv-1",
            "Broken",
            "--unit-price",
            raw,
        ]);
        assert!(result.is_err(), "{raw} should be rejected");
    }
    let result = Cli::try_parse_from([
        "recordbook",
        "items",
        "add",
        "inv-1",
        "Broken",
        "--unit-price",
        "5",
        "--quantity",
        "infinity",
    ]);
    assert!(result.is_err());
}

#[test]
fn import_flags_parse() {
    let cli = parse(&[
        "recordbook",
        "import",
        "shipments",
        "data.txt",
        "--format",
        "json",
        "--strict",
        "--dry-run",
    ]);
    match cli.command {
        Commands::Import(args) => {
            assert_eq!(args.format, Some(FormatArg::Json));
            assert!(args.strict);
            assert!(args.dry_run);
        }
        other => panic!("expected Import, got {:?}", other),
    }
}

#[test]
fn export_defaults_to_csv_on_stdout() {
    let cli = parse(&["recordbook", "export", "companies"]);
    match cli.command {
        Commands::Export(args) => {
            assert_eq!(args.format, FormatArg::Csv);
            assert!(args.output.is_none());
        }
        other => panic!("expected Export, got {:?}", other),
    }
}

#[test]
fn theme_action_is_optional() {
    match parse(&["recordbook", "theme"]).command {
        Commands::Theme(args) => assert!(args.action.is_none()),
        other => panic!("expected Theme, got {:?}", other),
    }
    match parse(&["recordbook", "theme", "toggle"]).command {
        Commands::Theme(args) => assert_eq!(args.action, Some(ThemeAction::Toggle)),
        other => panic!("expected Theme, got {:?}", other),
    }
}

#[test]
fn ai_entity_and_attachment_conflict() {
    let result = Cli::try_parse_from([
        "recordbook",
        "ai",
        "summarize",
        "-e",
        "invoices",
        "-a",
        "notes.txt",
    ]);
    assert!(result.is_err());

    let cli = parse(&["recordbook", "ai", "summarize", "-e", "invoices", "-s", "overdue"]);
    match cli.command {
        Commands::Ai(args) => {
            assert_eq!(args.entity, Some(EntityKind::Invoices));
            assert_eq!(args.query.filter.as_deref(), Some("overdue"));
        }
        other => panic!("expected Ai, got {:?}", other),
    }
}

#[test]
fn global_flags_work_after_subcommand() {
    let cli = parse(&["recordbook", "check", "--db", "/tmp/x.sqlite", "-vv"]);
    assert_eq!(cli.db, "/tmp/x.sqlite");
    assert_eq!(cli.verbose, 2);
    assert!(matches!(cli.command, Commands::Check(_)));
}

#[test]
fn command_definition_is_consistent() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}
