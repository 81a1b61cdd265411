use rstest::rstest;
use snapdiff::resolver::ScriptedResolver;
use snapdiff::snapshot::Category;

#[rstest]
#[case("column:users.name=users.full_name", Category::Columns, "users.name", "users.full_name")]
#[case("tables:users=accounts", Category::Tables, "users", "accounts")]
#[case("enum:public.status=public.state", Category::Enums, "public.status", "public.state")]
fn test_parse_rename(
    #[case] spec: &str,
    #[case] category: Category,
    #[case] from: &str,
    #[case] to: &str,
) {
    assert_eq!(
        ScriptedResolver::parse_rename(spec).unwrap(),
        (category, from.to_string(), to.to_string())
    );
}

#[rstest]
#[case("users=accounts")]
#[case("table:users")]
#[case("table:=accounts")]
#[case("widget:a=b")]
fn test_parse_rename_rejects(#[case] spec: &str) {
    assert!(ScriptedResolver::parse_rename(spec).is_err());
}
