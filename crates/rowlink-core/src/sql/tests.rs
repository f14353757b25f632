use super::*;

#[test]
fn renders_a_select_with_predicates_and_ordering() {
    let statement = StatementBuilder::new()
        .select(["id", "title"])
        .from("books")
        .where_eq("author_id", Value::Int(7))
        .where_eq("title", Value::from("Dune"))
        .order_by("id")
        .build()
        .unwrap();

    assert_eq!(
        statement.sql,
        "SELECT id, title FROM books WHERE author_id = ? AND title = ? ORDER BY id"
    );
    assert_eq!(statement.params, vec![Value::Int(7), Value::from("Dune")]);
}

#[test]
fn renders_an_insert_with_placeholders_in_column_order() {
    let statement = StatementBuilder::new()
        .insert_into("books", ["title", "author_id"])
        .values([Value::from("Dune"), Value::Int(7)])
        .build()
        .unwrap();

    assert_eq!(
        statement.sql,
        "INSERT INTO books (title, author_id) VALUES (?, ?)"
    );
    assert_eq!(statement.params, vec![Value::from("Dune"), Value::Int(7)]);
}

#[test]
fn a_column_free_insert_renders_the_default_values_form() {
    let statement = StatementBuilder::new()
        .insert_into("blanks", Vec::<String>::new())
        .values(Vec::new())
        .build()
        .unwrap();

    assert_eq!(statement.sql, "INSERT INTO blanks DEFAULT VALUES");
    assert!(statement.params.is_empty());
}

#[test]
fn renders_an_update_with_assignments_before_predicates() {
    let statement = StatementBuilder::new()
        .update("books")
        .set("title", Value::from("Dune"))
        .set("author_id", Value::Null)
        .where_eq("id", Value::Int(3))
        .build()
        .unwrap();

    assert_eq!(
        statement.sql,
        "UPDATE books SET title = ?, author_id = ? WHERE id = ?"
    );
    assert_eq!(
        statement.params,
        vec![Value::from("Dune"), Value::Null, Value::Int(3)]
    );
}

#[test]
fn renders_a_delete() {
    let statement = StatementBuilder::new()
        .delete_from("books")
        .where_eq("id", Value::Int(3))
        .build()
        .unwrap();

    assert_eq!(statement.sql, "DELETE FROM books WHERE id = ?");
    assert_eq!(statement.params, vec![Value::Int(3)]);

    let unfiltered = StatementBuilder::new().delete_from("books").build().unwrap();
    assert_eq!(unfiltered.sql, "DELETE FROM books");
    assert!(unfiltered.params.is_empty());
}

#[test]
fn clause_call_order_never_changes_the_rendered_sql() {
    let forward = StatementBuilder::new()
        .select(["id"])
        .from("books")
        .where_eq("title", Value::from("Dune"))
        .order_by("id")
        .build()
        .unwrap();

    let shuffled = StatementBuilder::new()
        .order_by("id")
        .where_eq("title", Value::from("Dune"))
        .from("books")
        .select(["id"])
        .build()
        .unwrap();

    assert_eq!(forward, shuffled);
}

#[test]
fn params_line_up_with_placeholders() {
    let statement = StatementBuilder::new()
        .update("r__books__tags")
        .set("count", Value::Uint(3))
        .set("note", Value::from("ok"))
        .where_eq("books_id", Value::Int(1))
        .where_eq("tags_id", Value::Int(2))
        .build()
        .unwrap();

    let placeholders = statement.sql.matches('?').count();
    assert_eq!(placeholders, statement.params.len());
}

#[test]
fn a_statement_needs_exactly_one_verb() {
    let err = StatementBuilder::new()
        .where_eq("id", Value::Int(1))
        .build()
        .unwrap_err();
    assert!(matches!(err, BuilderError::MissingVerb));

    let err = StatementBuilder::new()
        .select(["id"])
        .from("books")
        .delete_from("books")
        .build()
        .unwrap_err();
    assert!(matches!(err, BuilderError::ConflictingVerbs));
}

#[test]
fn select_requires_a_from_clause() {
    let err = StatementBuilder::new().select(["id"]).build().unwrap_err();
    assert!(matches!(err, BuilderError::MissingFrom));
}

#[test]
fn insert_requires_matching_values() {
    let err = StatementBuilder::new()
        .insert_into("books", ["title"])
        .build()
        .unwrap_err();
    assert!(matches!(err, BuilderError::MissingValues));

    let err = StatementBuilder::new()
        .insert_into("books", ["title", "author_id"])
        .values([Value::from("Dune")])
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        BuilderError::ValuesArityMismatch {
            columns: 2,
            values: 1
        }
    ));
}

#[test]
fn update_requires_a_set_clause() {
    let err = StatementBuilder::new()
        .update("books")
        .where_eq("id", Value::Int(1))
        .build()
        .unwrap_err();
    assert!(matches!(err, BuilderError::MissingSet));
}

#[test]
fn singleton_clauses_reject_repeats() {
    let err = StatementBuilder::new()
        .select(["id"])
        .select(["title"])
        .from("books")
        .build()
        .unwrap_err();
    assert!(matches!(err, BuilderError::DuplicateClause("select")));

    let err = StatementBuilder::new()
        .insert_into("books", ["title"])
        .insert_into("books", ["title"])
        .values([Value::from("Dune")])
        .build()
        .unwrap_err();
    assert!(matches!(err, BuilderError::DuplicateClause("insert-into")));
}
