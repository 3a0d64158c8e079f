// End-to-end tests: BWW source in, LilyPond document out

use bagpipe_transposer::{transpose, GrammarRegistry, RenderError, RenderSettings, TransposeError};

fn render(source: &str) -> String {
    render_with(source, &RenderSettings::default())
}

fn render_with(source: &str, settings: &RenderSettings) -> String {
    let registry = GrammarRegistry::builtin().unwrap();
    transpose(&registry, "bww", source, settings).unwrap()
}

#[test]
fn test_document_header_and_version() {
    let source = [
        "\"Yo Nepali\",(T,C,0,0,Times New Roman,18,600,0,1,18,0,0,0)",
        "\"Lilbahadur Gurung\",(M,R,0,0,Times New Roman,12,400,0,0,18,0,0,0)",
        "\"6 8 Quickstep\",(Y,L,0,0,Times New Roman,12,400,0,0,18,0,0,0)",
        "TuneTempo,120",
        "& sharpf sharpc 6_8 LA_8 B_8 C_8 !",
    ]
    .join("\n");

    let ly = render(&source);
    assert!(ly.starts_with("\\version \"2.24.0\""));
    assert!(ly.contains("title = \"Yo Nepali\""));
    assert!(ly.contains("composer = \"Lilbahadur Gurung\""));
    assert!(ly.contains("meter = \"6 8 Quickstep\""));
    assert!(ly.contains("\\tempo 4 = 120"));
    assert!(ly.contains("\\clef treble"));
    assert!(ly.contains("\\time 6/8"));
    assert!(ly.contains("a'8 b'8 c''8"));
}

#[test]
fn test_header_can_be_suppressed() {
    let settings = RenderSettings {
        emit_header: false,
        lilypond_version: "2.22.1".to_string(),
        ..RenderSettings::default()
    };
    let ly = render_with("\"Tune\",(T,C,0,0,Times New Roman,18,600,0,1,18,0,0,0)\nLA_4", &settings);
    assert!(ly.starts_with("\\version \"2.22.1\""));
    assert!(!ly.contains("\\header"));
    assert!(!ly.contains("\\tempo"));
}

#[test]
fn test_dotted_note() {
    let ly = render("LG_4 'lg");
    assert!(ly.contains("g'4."));
    assert!(!ly.contains("g'4.."));
}

#[test]
fn test_separated_dots() {
    let ly = render("LG_4 ''' la");
    assert!(ly.contains("g'4..."));
}

#[test]
fn test_long_dot_run_renders() {
    let ly = render(&format!("LA_8 {} ! B_4 !", "'".repeat(40)));
    assert!(ly.contains(&format!("a'8{} ", ".".repeat(40))));
    assert!(ly.contains("b'4"));
}

#[test]
fn test_unrepresentable_dot_run_is_invalid_note() {
    let registry = GrammarRegistry::builtin().unwrap();
    let source = format!("LA_8 {} ! B_4 !", "'".repeat(70));
    let err = transpose(&registry, "bww", &source, &RenderSettings::default()).unwrap_err();
    assert!(matches!(
        err,
        TransposeError::Render(RenderError::InvalidNote { ref note_type, .. }) if note_type == "note"
    ));
}

#[test]
fn test_piobaireachd_ornaments() {
    let ly = render("E_4 rodin B_4 pcb B_4");
    assert!(ly.contains("\\grace { g'32 b' g' } b'4"));
    assert!(ly.contains("\\grace { g'32 d'' g' e'' a' f'' a' } b'4"));
}

#[test]
fn test_tie_emits_single_mark() {
    let ly = render("^ts LA_4 LA_4 ^te B_4");
    assert_eq!(ly.matches('~').count(), 1);
    assert!(ly.contains("a'4 ~ a'4 b'4"));
}

#[test]
fn test_compound_meter_full_group_has_no_offset() {
    let ly = render("6_8 LA_8 B_8 C_8 ! D_8 E_8 F_8 !");
    assert!(!ly.contains("measurePosition"));
}

#[test]
fn test_compound_meter_pickup_offset() {
    let ly = render("6_8 LA_8 B_8 ! C_8 D_8 E_8 !");
    assert_eq!(ly.matches("measurePosition").count(), 1);
    assert!(ly.contains("\\set Timing.measurePosition = #(ly:make-moment 1/8)"));

    let offset_at = ly.find("measurePosition").unwrap();
    let first_note_at = ly.find("a'8").unwrap();
    assert!(offset_at < first_note_at);
}

#[test]
fn test_repeats_balance_braces() {
    let ly = render("& I!'' LA_4 B_4 C_4 D_4 ! E_4 F_4 HG_4 HA_4 ''!I I!'' '1 LA_2 LA_2 _' '2 B_2 B_2 _' ''!I");
    assert_eq!(ly.matches("\\repeat volta 2 {").count(), 2);
    assert_eq!(ly.matches('{').count(), ly.matches('}').count());
    assert!(ly.contains("#'((volta \"1\"))"));
    assert!(ly.contains("#'((volta \"2\"))"));
    assert_eq!(ly.matches("#'((volta #f))").count(), 2);
}

#[test]
fn test_ornaments() {
    let ly = render("LA_4 dbla D_4 grp D_4 gg E_4 hdbe E_4");
    assert!(ly.contains("\\grace { g''32 a' d'' }"));
    assert!(ly.contains("\\grace { g'32 b' g' }"));
    assert!(ly.contains("\\grace { g''32 }"));
    assert!(ly.contains("\\grace { e''32 f'' }"));
}

#[test]
fn test_tuplet_bracketing() {
    let ly = render("^3s LA_8 B_8 C_8 ^3e D_4");
    assert!(ly.contains("\\tuplet 3/2 { a'8 b'8 c''8 } d''4"));
}

#[test]
fn test_inline_footer_becomes_markup() {
    let source = [
        "\"\",(F,R,0,0,Times New Roman,10,400,0,0,18,0,0,0)",
        "B_4 \"Slide\",(I,L,0,0,Times New Roman,11,700,0,0,0,0,0,0) C_4",
    ]
    .join("\n");
    let ly = render(&source);
    assert!(ly.contains("b'4 <>_\\markup { \"Slide\" } c''4"));
}

#[test]
fn test_unrecognized_token_is_commented() {
    let ly = render("LA_4 xyzzy B_4");
    assert!(ly.contains("%{ xyzzy %}"));
    assert!(ly.contains("b'4"));
}

#[test]
fn test_impossible_gracestrike_aborts_render() {
    let registry = GrammarRegistry::builtin().unwrap();
    let err = transpose(&registry, "bww", "LA_4 gstlg", &RenderSettings::default()).unwrap_err();
    match err {
        TransposeError::Render(RenderError::Ornament { ornament, arguments, .. }) => {
            assert_eq!(ornament, "gracestrike");
            assert_eq!(arguments, vec!["HG", "LG"]);
        }
        other => panic!("expected ornament error, got {other:?}"),
    }
}

#[test]
fn test_format_by_name_or_extension() {
    let registry = GrammarRegistry::builtin().unwrap();
    let settings = RenderSettings::default();
    let by_name = transpose(&registry, "BagpipeMusicWriter", "LA_4", &settings).unwrap();
    let by_ext = transpose(&registry, ".bmw", "LA_4", &settings).unwrap();
    assert_eq!(by_name, by_ext);
}
