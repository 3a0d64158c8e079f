// Parsing tests against the bundled Bagpipe Music Writer grammar

use bagpipe_transposer::models::{HeaderField, NoteToken, Tune, TuneElement};
use bagpipe_transposer::{GrammarRegistry, TuneParser};
use serde_json::json;

fn parse(source: &str) -> Tune {
    let registry = GrammarRegistry::builtin().expect("bundled grammar should load");
    let grammar = registry
        .by_name("BagpipeMusicWriter")
        .expect("bundled grammar is registered");
    TuneParser::new(grammar).parse(source)
}

fn notes(tune: &Tune) -> Vec<&NoteToken> {
    tune.note_tokens().collect()
}

#[test]
fn test_empty_source() {
    let tune = parse("");
    assert!(tune.notes.is_empty());
    assert_eq!(tune.time, (4, 4));
}

#[test]
fn test_single_notes() {
    let tune = parse("LG_1 LAl_2 Bl_4 Cr_8 D_16 E_32 F_64 HG_128 HA_256");
    let expected = [
        ("LG", "1"),
        ("LA", "2"),
        ("B", "4"),
        ("C", "8"),
        ("D", "16"),
        ("E", "32"),
        ("F", "64"),
        ("HG", "128"),
        ("HA", "256"),
    ];
    let tokens = notes(&tune);
    assert_eq!(tokens.len(), expected.len());
    for (token, (pitch, length)) in tokens.iter().zip(expected) {
        assert_eq!(token.note_type, "note");
        assert_eq!(token.string_args(), vec![pitch, length]);
        assert!(token.modifiers.is_empty());
    }
}

#[test]
fn test_dotted_notes() {
    let tune = parse(
        "LG_4 'lg LA_4 ''la B_4 '''b C_4 ''''c D_4 '''''d E_4 ''''''e \
         F_4 '''''''f HG_4 ''''''''hg HA_4 '''''''''ha",
    );
    let tokens = notes(&tune);
    let pitches: Vec<&str> = tokens.iter().map(|t| t.arg(0).unwrap()).collect();
    let dots: Vec<u32> = tokens.iter().map(|t| t.dot_count()).collect();
    assert_eq!(pitches, vec!["LG", "LA", "B", "C", "D", "E", "F", "HG", "HA"]);
    assert_eq!(dots, (1..=9).collect::<Vec<u32>>());
}

#[test]
fn test_long_dot_run() {
    let source = format!("LA_8 {} ! B_4 !", "'".repeat(40));
    let tune = parse(&source);
    assert_eq!(notes(&tune)[0].dot_count(), 40);
}

#[test]
fn test_separated_dots_fold_into_one_note() {
    let tune = parse("LG_4 ''' la");
    let tokens = notes(&tune);
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].string_args(), vec!["LG", "4"]);
    assert_eq!(tokens[0].modifier("dot"), Some(&json!(3)));
    assert!(tune.notes.iter().all(|e| e.note_type() != Some("dot")));
}

#[test]
fn test_doublings() {
    let tune = parse("dblg dbla dbb dbc dbd dbe dbf dbhg dbha");
    let pitches: Vec<&str> = notes(&tune)
        .iter()
        .map(|t| {
            assert_eq!(t.note_type, "double");
            assert!(t.modifiers.is_empty());
            t.arg(0).unwrap()
        })
        .collect();
    assert_eq!(pitches, vec!["LG", "LA", "B", "C", "D", "E", "F", "HG", "HA"]);
}

#[test]
fn test_half_and_thumb_doublings() {
    let tune = parse("hdblg tdbe");
    let tokens = notes(&tune);
    assert_eq!(tokens[0].note_type, "double");
    assert_eq!(tokens[0].string_args(), vec!["LG"]);
    assert!(tokens[0].has_flag("half"));
    assert_eq!(tokens[1].string_args(), vec!["E"]);
    assert!(tokens[1].has_flag("thumb"));
}

#[test]
fn test_crunluaths() {
    let tune = parse("crunl crunlb hcrunlla hcrunllgla");
    let tokens = notes(&tune);
    assert!(tokens.iter().all(|t| t.note_type == "crunluath"));
    assert!(tokens[0].ordered_arguments.is_empty());
    assert_eq!(tokens[1].string_args(), vec!["B"]);
    assert_eq!(tokens[2].string_args(), vec!["LA"]);
    assert!(tokens[2].has_flag("heavy"));
    assert_eq!(tokens[3].string_args(), vec!["LG", "LA"]);
}

#[test]
fn test_piobaireachd_crunluaths() {
    let tune = parse("pc pcb phcla");
    let tokens = notes(&tune);
    assert_eq!(tokens.len(), 3);
    assert!(tokens.iter().all(|t| t.note_type == "crunluath"));
    assert!(tokens.iter().all(|t| t.modifiers.len() == 1 && t.has_flag("pio")));
    assert!(tokens[0].ordered_arguments.is_empty());
    assert_eq!(tokens[1].string_args(), vec!["B"]);
    assert_eq!(tokens[2].string_args(), vec!["LA"]);
}

#[test]
fn test_rodin() {
    let tune = parse("E_4 rodin B_4");
    let types: Vec<&str> = notes(&tune).iter().map(|t| t.note_type.as_str()).collect();
    assert_eq!(types, vec!["note", "rodin", "note"]);
}

#[test]
fn test_birl_variants() {
    let tune = parse("brl abr gbr tbr");
    let tokens = notes(&tune);
    assert!(tokens.iter().all(|t| t.note_type == "birl"));
    assert!(tokens[0].modifiers.is_empty());
    assert!(tokens[1].has_flag("long"));
    assert!(tokens[2].has_flag("heavy"));
    assert!(tokens[3].has_flag("thumb"));
}

#[test]
fn test_graces_and_strikes() {
    let tune = parse("gg tg strla gstd hstf");
    let tokens = notes(&tune);
    assert_eq!((tokens[0].note_type.as_str(), tokens[0].arg(0)), ("grace", Some("HG")));
    assert_eq!((tokens[1].note_type.as_str(), tokens[1].arg(0)), ("grace", Some("HA")));
    assert_eq!((tokens[2].note_type.as_str(), tokens[2].arg(0)), ("strike", Some("LA")));
    assert_eq!(tokens[3].string_args(), vec!["HG", "D"]);
    assert_eq!(tokens[4].note_type, "gracestrike");
    assert_eq!(tokens[4].string_args(), vec!["F"]);
    assert!(tokens[4].has_flag("half"));
}

#[test]
fn test_structure_tokens() {
    let tune = parse("& sharpf sharpc C I!'' '1 ! !t _' ''!I !I REST_4 naturalc space");
    let types: Vec<&str> = notes(&tune).iter().map(|t| t.note_type.as_str()).collect();
    assert_eq!(
        types,
        vec![
            "clef",
            "key_signature",
            "key_signature",
            "time_notation",
            "repeat_start",
            "ending_start",
            "bar",
            "line_end",
            "ending_end",
            "repeat_end",
            "part_end",
            "rest",
            "key_signature",
        ]
    );
    assert_eq!(tune.time, (4, 4));
    assert!(tune.unparsed().is_empty());
}

#[test]
fn test_cut_time_sets_tune_time() {
    let tune = parse("& C_ LA_2 !");
    assert_eq!(tune.time, (2, 2));
}

#[test]
fn test_tuplets_are_folded() {
    let tune = parse("^3s LA_8 B_8 C_8 ^3e D_4");
    let tokens = notes(&tune);
    assert_eq!(tokens.len(), 4);
    for token in &tokens[..3] {
        assert_eq!(token.modifier("tuplet"), Some(&json!(1)));
        assert_eq!(token.modifier("tuplet_arity"), Some(&json!(3)));
    }
    assert_eq!(tokens[3].modifier("tuplet"), None);
}

#[test]
fn test_unrecognized_token_passes_through() {
    let tune = parse("LA_4 xyzzy B_4");
    assert_eq!(tune.unparsed(), vec!["xyzzy"]);
    assert_eq!(tune.notes[1], TuneElement::Unparsed("xyzzy".to_string()));
}

#[test]
fn test_full_header() {
    let source = [
        "Bagpipe Music Writer Gold:1.0",
        "Bagpipe Reader:1.0",
        "MIDINoteMappings,(55,57,59,60,62,64,65,67,69,57,59,61,62,64,66,67,69,71,56,58,60,61,63,65,66,68,70)",
        "FrequencyMappings,(392,440,494,523,587,659,699,784,880,440,494,554,587,659,740,784,880,988,415,466,523,554,622,699,740,831,932)",
        "InstrumentMappings,(71,71,46,34,1000,60,70)",
        "GracenoteDurations,(40,40,30,50,100,200,800,1200,250,250,250,500,200)",
        "FontSizes,(90,100,100,80,250)",
        "TuneFormat,(1,0,M,L,500,500,500,500,P,1,0)",
        "\"Yo Nepali\",(T,C,0,0,Times New Roman,18,600,0,1,18,0,0,0)",
        "\"Lilbahadur Gurung\",(M,R,0,0,Times New Roman,12,400,0,0,18,0,0,0)",
        "\"6 8 Quickstep\",(Y,L,0,0,Times New Roman,12,400,0,0,18,0,0,0)",
        "\"Brigade of Gurkhas March Past\",(F,L,0,0,Times New Roman,12,400,0,0,18,0,0,0)",
        "TuneTempo,120",
        "& sharpf sharpc  6_8",
    ]
    .join("\n");

    let tune = parse(&source);
    assert_eq!(tune.title, "Yo Nepali");
    assert_eq!(tune.composer, "Lilbahadur Gurung");
    assert_eq!(tune.tune_type, "6 8 Quickstep");
    assert_eq!(tune.footer, "Brigade of Gurkhas March Past");
    assert_eq!(tune.tempo, 120);
    assert_eq!(tune.time, (6, 8));
    assert_eq!(tune.notes.len(), 4);
    assert!(tune.unparsed().is_empty());
}

#[test]
fn test_mapping_header_broken_across_lines() {
    let source = "MIDINoteMappings,(54,56,58,59,61,63,64,66,68,56,58,60,61,63,65,66,68,70,55\n,57,59,60,62,64,65,67,69)\nLA_4";
    let tune = parse(source);
    assert_eq!(tune.notes.len(), 1);
    assert!(tune.unparsed().is_empty());
}

#[test]
fn test_repeated_footer_becomes_inline() {
    let source = [
        "\"P/M Terry Tully\",(M,R,0,0,Times New Roman,14,400,0,0,18,0,0,0)",
        "\"\",(F,R,0,0,Times New Roman,10,400,0,0,18,0,0,0)",
        "& sharpf sharpc 2_4",
        "I!''  gg Fr_16 El_16  ^ts B_32 \"Slide\",(I,L,0,0,Times New Roman,11,700,0,0,0,0,0,0)",
        "C_16 ^te 'c",
    ]
    .join("\n");

    let tune = parse(&source);
    assert_eq!(tune.composer, "P/M Terry Tully");
    assert_eq!(tune.footer, "");

    let inline: Vec<&TuneElement> = tune
        .notes
        .iter()
        .filter(|e| matches!(e, TuneElement::Inline(_)))
        .collect();
    assert_eq!(inline, vec![&TuneElement::Inline(HeaderField::new("footer", "Slide"))]);

    let position = tune.notes.iter().position(|e| e == inline[0]).unwrap();
    assert_eq!(tune.notes[position - 1].as_note().unwrap().string_args(), vec!["B", "32"]);

    let last = tune.note_tokens().filter(|t| t.is_note()).last().unwrap();
    assert_eq!(last.string_args(), vec!["C", "16"]);
    assert_eq!(last.dot_count(), 1);
}
