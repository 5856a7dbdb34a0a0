//! End-to-end lex → parse → render → position-map scenarios from the
//! component design's testable properties.

use std::path::PathBuf;

use detex_core::{parse_str, render, CleanConfig, Error, Position, RootPosMap};
use detex_catalog::{CommandCatalog, CommandPrototype};

fn scenario_catalog() -> CommandCatalog {
    let mut cat = CommandCatalog::new(CommandPrototype::Discard);
    cat.insert("title", CommandPrototype::PrintLast);
    cat.insert(
        "phi",
        CommandPrototype::Generic {
            expected_narg: 0,
            template: "phi".to_string(),
        },
    );
    cat.insert("label", CommandPrototype::Discard);
    cat.insert(
        "discard1000",
        CommandPrototype::Generic {
            expected_narg: 1000,
            template: String::new(),
        },
    );
    cat
}

fn clean(input: &str) -> String {
    let cat = scenario_catalog();
    let cfg = CleanConfig::default();
    let mut root = parse_str(input, &cat, &cfg, "<scenario>", PathBuf::new()).unwrap();
    render(&mut root, Position::from_source("")).unwrap()
}

fn clean_err(input: &str) -> Error {
    let cat = scenario_catalog();
    let cfg = CleanConfig::default();
    parse_str(input, &cat, &cfg, "<scenario>", PathBuf::new()).unwrap_err()
}

#[test]
fn s1_title_and_generic_command_with_paragraph_break() {
    let out = clean("Hop \\title{Un titre}\n\nDes histoires de \\phi.\nPouet.");
    assert_eq!(out, "Hop Un titre\n\nDes histoires de phi. Pouet.");
}

#[test]
fn s2_discard1000_swallows_its_two_groups() {
    let out = clean("\\title{Truc \\discard1000{say}{hello}}");
    assert_eq!(out, "Truc ");
}

#[test]
fn s3_unterminated_group_is_unexpected_eof() {
    let err = clean_err("\\title{Truc");
    assert!(matches!(err, Error::UnexpectedEndOfFile { name } if name == "title"));
}

#[test]
fn s4_extra_closing_brace_is_unpaired_bracket() {
    let err = clean_err("\\title{Truc}}");
    assert!(matches!(err, Error::UnpairedBracket(_)));
}

#[test]
fn s5_dest_to_src_interval_recovers_the_literal_hop() {
    let cat = scenario_catalog();
    let cfg = CleanConfig::default();
    let input = "Hop \\title{Un titre}\n\nDes histoires de \\phi.\nPouet.";
    let mut root = parse_str(input, &cat, &cfg, "<scenario>", PathBuf::new()).unwrap();
    render(&mut root, Position::from_source("")).unwrap();
    let map = RootPosMap::build(&root);

    let dest_start = Position::from_source("");
    let dest_end = Position::from_source("Hop");
    let (filename, src_start, src_end) = map.dest_to_src_interval(dest_start, dest_end).unwrap();
    assert_eq!(filename, "<scenario>");
    assert_eq!(&input[src_start.offset..src_end.offset], "Hop");
}

#[test]
fn paragraph_break_always_renders_to_exactly_two_newlines() {
    let out = clean("a\n\n\n\nb"); // four newlines, still collapses to one break
    assert_eq!(out, "a\n\nb");
}

#[test]
fn mapping_consistency_for_an_interior_interval() {
    let cat = scenario_catalog();
    let cfg = CleanConfig::default();
    let input = "Hop \\title{Un titre}\n\nDes histoires de \\phi.\nPouet.";
    let mut root = parse_str(input, &cat, &cfg, "<scenario>", PathBuf::new()).unwrap();
    let cleaned = render(&mut root, Position::from_source("")).unwrap();
    let map = RootPosMap::build(&root);

    // "Des histoires de " begins right after the paragraph break.
    let src_a = Position::from_source("Hop \\title{Un titre}\n\n");
    let src_b = Position::from_source("Hop \\title{Un titre}\n\nDes histoires de ");
    let (dest_a, dest_b) = map.src_to_dest_interval(src_a, src_b, None).unwrap();
    assert_eq!(&cleaned[dest_a.offset..dest_b.offset], "Des histoires de ");
}

#[test]
fn catalog_merge_order_lets_later_file_win() {
    let a = CommandCatalog::from_json_str(r#"{"print_last": ["x"]}"#, CommandPrototype::Discard).unwrap();
    let b = CommandCatalog::from_json_str(r#"{"print_name": ["x"]}"#, CommandPrototype::Discard).unwrap();
    let mut merged = a;
    merged.update(b);
    assert_eq!(merged.get("x"), &CommandPrototype::PrintName);
}
