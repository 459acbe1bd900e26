#[test]
fn encodable_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/encodable_error_pass.rs");
}
