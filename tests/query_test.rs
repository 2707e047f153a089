//! Integration tests for query parameter flattening.

use std::collections::BTreeMap;

use modelspec::{
    flatten, Describe, EnumRegistry, Field, FlattenError, FlattenedParameter, ModelOpt, Origin,
    PrimitiveKind, TypeDef, TypeRef,
};

fn required_flags(result: &BTreeMap<String, FlattenedParameter>) -> Vec<(&str, bool)> {
    result
        .values()
        .map(|p| (p.path.as_str(), p.required))
        .collect()
}

#[test]
fn scalar_sequence_and_optional_struct() {
    let profile = TypeDef::anonymous_struct(vec![Field::of::<String>("Bio")]);
    let def = TypeDef::anonymous_struct(vec![
        Field::of::<i64>("ID"),
        Field::of::<Vec<String>>("Emails"),
        Field::new(
            "Profile",
            TypeRef::from_def(TypeDef::optional(TypeRef::from_def(profile))),
        ),
    ]);

    let result = flatten(&def, &EnumRegistry::new()).unwrap();
    assert_eq!(result.len(), 6);
    assert_eq!(
        required_flags(&result),
        vec![
            ("Emails[0]", false),
            ("Emails[1]", false),
            ("Emails[2]", false),
            ("Emails[]", false),
            ("ID", true),
            ("Profile[Bio]", false),
        ]
    );
    assert_eq!(result["ID"].kind, PrimitiveKind::Integer);
    assert_eq!(result["Emails[]"].kind, PrimitiveKind::String);
}

struct Address;

impl Describe for Address {
    fn describe() -> TypeDef {
        TypeDef::structure(Origin::new("geo", "Address"), vec![Field::of::<String>("City")])
    }
}

struct Search;

impl Describe for Search {
    fn describe() -> TypeDef {
        TypeDef::structure(
            Origin::new("geo", "Search"),
            vec![
                Field::of::<String>("Name"),
                Field::of::<Vec<String>>("Tags"),
                Field::of::<Option<Address>>("Address"),
                Field::of::<Address>("Home"),
            ],
        )
    }
}

#[test]
fn named_structs_nest_with_brackets() {
    let result = flatten(&TypeDef::of::<Search>(), &EnumRegistry::new()).unwrap();
    assert_eq!(
        required_flags(&result),
        vec![
            ("Address[City]", false),
            ("Home[City]", true),
            ("Name", true),
            ("Tags[0]", false),
            ("Tags[1]", false),
            ("Tags[2]", false),
            ("Tags[]", false),
        ]
    );
}

#[test]
fn sequence_of_sequences_expands_each_level() {
    let def = TypeDef::anonymous_struct(vec![Field::of::<Vec<Vec<i32>>>("Grid")]);
    let result = flatten(&def, &EnumRegistry::new()).unwrap();

    assert_eq!(result.len(), 16);
    assert!(result.contains_key("Grid[0][0]"));
    assert!(result.contains_key("Grid[][]"));
    assert!(result.values().all(|p| !p.required));
}

#[test]
fn enum_fields_carry_their_constants() {
    let sort = TypeDef::enumeration(Origin::new("geo", "Sort"), PrimitiveKind::String);
    let def = TypeDef::anonymous_struct(vec![Field::new("Sort", TypeRef::from_def(sort))]);

    let mut enums = EnumRegistry::new();
    enums.register(Origin::new("geo", "Sort"), ["asc", "desc"]);

    let result = flatten(&def, &enums).unwrap();
    assert_eq!(
        result["Sort"].schema_opts,
        vec![ModelOpt::enum_values(["asc", "desc"])]
    );
}

#[test]
fn non_struct_input_is_rejected() {
    let err = flatten(&TypeDef::of::<Vec<Search>>(), &EnumRegistry::new()).unwrap_err();
    assert!(matches!(err, FlattenError::NotAStruct { .. }));
}

#[test]
fn opaque_value_is_rejected() {
    let def = TypeDef::anonymous_struct(vec![
        Field::of::<String>("Name"),
        Field::of::<serde_json::Value>("Extra"),
    ]);
    match flatten(&def, &EnumRegistry::new()) {
        Err(FlattenError::UnflattenableKind { path, .. }) => assert_eq!(path, "Extra"),
        other => panic!("unexpected result: {other:?}"),
    }
}
