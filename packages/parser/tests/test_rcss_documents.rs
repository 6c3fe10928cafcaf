use rcss_parser::{parse_rcss, RcssRule, SpritesheetIssue, UNNAMED};

#[test]
fn test_theme_with_several_spritesheets() {
    let source = r#"/* Window theme */
body
{
	font-family: LatoLatin;
	font-size: 16dp;
}

@spritesheet theme
{
	src: invader.tga;
	resolution: 1x;

	title-bar-l: 147px 0px 82px 85px;
	title-bar-c: 229px 0px 1px 85px;
	title-bar-r: 231px 0px 15px 85px;
}

div#title_bar span
{
	padding-left: 85dp;
	decorator: tiled-horizontal( title-bar-l, title-bar-c, title-bar-r );
}

@spritesheet
{
	src: "icons/small icons.png";
	close: 0px 0px 16px 16px;
}
"#;

    let parsed = parse_rcss(source);
    if !parsed.errors.is_empty() {
        eprintln!("Parse errors: {:?}", parsed.errors);
    }
    assert!(parsed.errors.is_empty());

    let sheets: Vec<_> = parsed.spritesheets().collect();
    assert_eq!(sheets.len(), 2);

    assert_eq!(sheets[0].name, "theme");
    assert_eq!(sheets[0].source(), Some("invader.tga"));
    assert_eq!(sheets[0].resolution(), Some(1.0));
    assert_eq!(sheets[0].sprites.len(), 3);
    assert_eq!((sheets[0].line, sheets[0].end_line), (8, 16));

    assert_eq!(sheets[1].name, UNNAMED);
    assert_eq!(sheets[1].source(), Some("icons/small icons.png"));
    assert_eq!((sheets[1].line, sheets[1].end_line), (24, 28));

    let others: Vec<_> = parsed
        .rules
        .iter()
        .filter(|rule| matches!(rule, RcssRule::Other { .. }))
        .collect();
    assert_eq!(others.len(), 2);
}

#[test]
fn test_sibling_sprites_survive_bad_declarations() {
    let source = r#"
@spritesheet buttons {
    src: buttons.png;
    normal: 0px 0px 32px 32px;
    hover: 32px 0px 32px;
    pressed: 64px 0px 32px 32px;
    disabled: 96px 0px 32px 32px 1px;
}
"#;

    let parsed = parse_rcss(source);
    assert!(parsed.errors.is_empty());

    let sheet = parsed.spritesheets().next().unwrap();
    let names: Vec<_> = sheet.sprites.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["normal", "pressed"]);
    assert_eq!(
        sheet.issues,
        vec![
            SpritesheetIssue::SpriteArity {
                name: "hover".to_string(),
                count: 3,
                line: 5,
            },
            SpritesheetIssue::SpriteArity {
                name: "disabled".to_string(),
                count: 5,
                line: 7,
            },
        ]
    );
}

#[test]
fn test_syntax_errors_are_collected_not_thrown() {
    let source = "a { b: c; }\n}\n@spritesheet s { src: s.png;\n";

    let parsed = parse_rcss(source);
    assert_eq!(parsed.errors.len(), 2);
    assert_eq!(parsed.errors[0].line(), 2);
    assert_eq!(parsed.spritesheets().count(), 0);
}

#[test]
fn test_errors_display_with_location() {
    let parsed = parse_rcss("@spritesheet s {\n  src: s.png;\n  oops 1px;\n}");

    assert_eq!(parsed.errors.len(), 1);
    assert!(parsed.errors[0].to_string().starts_with("3:8:"));
}

#[cfg(feature = "pretty-errors")]
#[test]
fn test_pretty_report_names_file() {
    let source = "@spritesheet s {\n  src: s.png;\n  oops 1px;\n}";
    let parsed = parse_rcss(source);

    let report = rcss_parser::format_errors(source, "broken.rcss", &parsed.errors);
    assert!(report.contains("broken.rcss"));
}
