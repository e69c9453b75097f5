use super::*;

#[test]
fn test_parse_gtk_control_q() {
    let accel = Accelerator::parse("<Control>q").unwrap();
    assert!(accel.modifiers.ctrl);
    assert!(!accel.modifiers.shift);
    assert_eq!(accel.keysym, 0x71);
    assert_eq!(accel.modifier_mask(), MOD_CTRL);
}

#[test]
fn test_parse_gtk_uppercase_letter_is_lowercased() {
    let upper = Accelerator::parse("<Control>Q").unwrap();
    let lower = Accelerator::parse("<Control>q").unwrap();
    assert_eq!(upper, lower);
}

#[test]
fn test_parse_gtk_multiple_modifiers() {
    let accel = Accelerator::parse("<Control><Shift><Alt>c").unwrap();
    assert_eq!(accel.modifier_mask(), MOD_CTRL | MOD_SHIFT | MOD_ALT);
    assert_eq!(accel.keysym, 0x63);
}

#[test]
fn test_parse_gtk_primary_and_super() {
    let accel = Accelerator::parse("<Primary><Super>Return").unwrap();
    assert_eq!(accel.modifier_mask(), MOD_CTRL | MOD_META);
    assert_eq!(accel.keysym, 0xff0d);
}

#[test]
fn test_parse_plus_joined() {
    let accel = Accelerator::parse("Ctrl+Shift+K").unwrap();
    assert_eq!(accel.modifier_mask(), MOD_CTRL | MOD_SHIFT);
    assert_eq!(accel.keysym, 0x6b);
    assert_eq!(accel.display(), "Ctrl+Shift+K");
}

#[test]
fn test_parse_function_keys() {
    assert_eq!(Accelerator::parse("F1").unwrap().keysym, 0xffbe);
    assert_eq!(Accelerator::parse("alt+f4").unwrap().keysym, 0xffc1);
    assert_eq!(Accelerator::parse("<Super>F24").unwrap().keysym, 0xffd5);
    assert!(matches!(
        Accelerator::parse("F25"),
        Err(AcceleratorParseError::UnknownKey(_))
    ));
}

#[test]
fn test_parse_named_keys() {
    assert_eq!(Accelerator::parse("<Alt>space").unwrap().keysym, 0x20);
    assert_eq!(Accelerator::parse("<Alt>Page_Up").unwrap().keysym, 0xff55);
    assert_eq!(Accelerator::parse("ctrl+esc").unwrap().keysym, 0xff1b);
    assert_eq!(Accelerator::parse("<Control>slash").unwrap().keysym, 0x2f);
}

#[test]
fn test_parse_punctuation_character() {
    let accel = Accelerator::parse("<Control>;").unwrap();
    assert_eq!(accel.keysym, 0x3b);
}

#[test]
fn test_parse_empty() {
    assert_eq!(Accelerator::parse(""), Err(AcceleratorParseError::Empty));
    assert_eq!(Accelerator::parse("   "), Err(AcceleratorParseError::Empty));
}

#[test]
fn test_parse_modifiers_only() {
    assert_eq!(
        Accelerator::parse("<Control>"),
        Err(AcceleratorParseError::MissingKey)
    );
    assert_eq!(
        Accelerator::parse("Ctrl+Shift"),
        Err(AcceleratorParseError::MissingKey)
    );
}

#[test]
fn test_parse_bogus_accelerator() {
    assert_eq!(
        Accelerator::parse("bogus-accel"),
        Err(AcceleratorParseError::UnknownKey("bogus-accel".to_string()))
    );
}

#[test]
fn test_parse_unknown_modifier() {
    assert_eq!(
        Accelerator::parse("<Hyper>x"),
        Err(AcceleratorParseError::UnknownModifier("Hyper".to_string()))
    );
    assert!(matches!(
        Accelerator::parse("<Control"),
        Err(AcceleratorParseError::UnknownModifier(_))
    ));
}

#[test]
fn test_display_orders_modifiers() {
    let accel = Accelerator::parse("<Super><Shift><Control>x").unwrap();
    assert_eq!(accel.to_string(), "Ctrl+Shift+Super+X");
}
