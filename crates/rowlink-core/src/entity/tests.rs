use super::*;
use crate::test_support::{hierarchy_registry, library_registry};

#[test]
fn spawn_unknown_type_is_an_unknown_entity_error() {
    let registry = library_registry();
    let err = Entity::spawn(&registry, "Magazine").unwrap_err();

    assert_eq!(err.kind, crate::error::ErrorKind::UnknownEntity);
}

#[test]
fn spawn_starts_unpersisted_with_no_fields() {
    let registry = library_registry();
    let book = Entity::spawn(&registry, "Book").unwrap();
    let book = book.borrow();

    assert!(!book.is_persisted());
    assert_eq!(book.type_name(), "Book");
    assert_eq!(book.source(), EntityDef::DEFAULT_SOURCE);
    assert!(book.field("title").is_none());
    assert_eq!(book.created_at(), book.altered_at());
}

#[test]
fn spawn_builds_one_group_per_declared_relation() {
    let registry = library_registry();
    let book = Entity::spawn(&registry, "Book").unwrap();
    let book = book.borrow();

    assert_eq!(book.groups().len(), 3);
    assert!(book.group("author").is_ok());
    assert!(book.group("chapters").is_ok());
    assert!(book.group("tags").is_ok());
}

#[test]
fn group_indexes_share_the_same_instances() {
    let registry = library_registry();
    let book_ref = Entity::spawn(&registry, "Book").unwrap();
    let book = book_ref.borrow();

    let by_name = book.group("tags").unwrap();
    let by_kind = book.groups_declared("Book", RelationKind::ManyToMany);

    assert_eq!(by_kind.len(), 1);
    assert!(Rc::ptr_eq(&by_name, &by_kind[0]));
}

#[test]
fn unknown_relation_name_is_an_error() {
    let registry = library_registry();
    let book = Entity::spawn(&registry, "Book").unwrap();
    let err = book.borrow().group("publisher").unwrap_err();

    assert_eq!(err.kind, crate::error::ErrorKind::UnknownRelation);
}

#[test]
fn set_field_rejects_undeclared_names() {
    let registry = library_registry();
    let book = Entity::spawn(&registry, "Book").unwrap();
    let mut book = book.borrow_mut();

    book.set_field("title", "Dune").unwrap();
    assert_eq!(book.field("title"), Some(&Value::from("Dune")));

    let err = book.set_field("subtitle", "x").unwrap_err();
    assert_eq!(err.kind, crate::error::ErrorKind::InvalidArgument);
}

#[test]
fn child_entities_accept_fields_from_every_hierarchy_level() {
    let registry = hierarchy_registry();
    let derived = Entity::spawn(&registry, "Derived").unwrap();
    let mut derived = derived.borrow_mut();

    derived.set_field("width", 3_i64).unwrap();
    derived.set_field("label", "a").unwrap();

    assert_eq!(derived.defs().len(), 2);
    assert_eq!(derived.defs()[0].name(), "Base");
    assert_eq!(derived.type_name(), "Derived");
}

#[test]
fn bind_identity_is_idempotent_but_immutable() {
    let registry = library_registry();
    let book = Entity::spawn(&registry, "Book").unwrap();
    let mut book = book.borrow_mut();

    book.bind_identity(Identity::Int(7)).unwrap();
    assert!(book.is_persisted());
    assert_eq!(book.identity(), Some(&Identity::Int(7)));

    // Same identity again is fine.
    book.bind_identity(Identity::Int(7)).unwrap();

    let err = book.bind_identity(Identity::Int(8)).unwrap_err();
    assert_eq!(err.kind, crate::error::ErrorKind::InvalidArgument);
    assert_eq!(book.identity(), Some(&Identity::Int(7)));
}

#[test]
fn peer_key_tracks_persistence_state() {
    let registry = library_registry();
    let a = Entity::spawn(&registry, "Tag").unwrap();
    let b = Entity::spawn(&registry, "Tag").unwrap();

    // Unpersisted: keyed by instance, so distinct handles differ.
    assert_ne!(PeerKey::of(&a), PeerKey::of(&b));
    assert_eq!(PeerKey::of(&a), PeerKey::of(&a.clone()));

    a.borrow_mut().bind_identity(Identity::Int(1)).unwrap();
    b.borrow_mut().bind_identity(Identity::Int(1)).unwrap();

    // Persisted: keyed by identity, so equal ids coincide.
    assert_eq!(PeerKey::of(&a), PeerKey::of(&b));
    assert_eq!(PeerKey::of(&a), PeerKey::Persisted(Identity::Int(1)));
}

#[test]
fn add_and_remove_related_route_through_the_named_group() {
    let registry = library_registry();
    let book = Entity::spawn(&registry, "Book").unwrap();
    let tag = Entity::spawn(&registry, "Tag").unwrap();
    tag.borrow_mut().bind_identity(Identity::Int(3)).unwrap();

    let total = book
        .borrow_mut()
        .add_related("tags", &tag, 2, BTreeMap::new())
        .unwrap();
    assert_eq!(total, 2);

    let view = book.borrow().snapshot_related("tags").unwrap();
    assert_eq!(view.get(&PeerKey::of(&tag)), 2);

    let removed = book.borrow_mut().remove_related("tags", &tag, 1).unwrap();
    assert_eq!(removed, 1);

    let view = book.borrow().snapshot_related("tags").unwrap();
    assert_eq!(view.get(&PeerKey::of(&tag)), 1);
}

#[test]
fn entities_and_groups_are_debug_formattable() {
    let registry = library_registry();
    let book = Entity::spawn(&registry, "Book").unwrap();
    let tag = Entity::spawn(&registry, "Tag").unwrap();
    tag.borrow_mut().bind_identity(Identity::Int(3)).unwrap();
    book.borrow_mut()
        .add_related("tags", &tag, 1, BTreeMap::new())
        .unwrap();

    let rendered = format!("{:?}", book.borrow());
    assert!(rendered.contains("Book"));

    let group = book.borrow().group("tags").unwrap();
    let rendered = format!("{:?}", group.borrow());
    assert!(rendered.contains("ManyToMany"));
}

#[test]
fn snapshot_related_does_not_touch_the_store_state() {
    let registry = library_registry();
    let book = Entity::spawn(&registry, "Book").unwrap();
    let tag = Entity::spawn(&registry, "Tag").unwrap();

    book.borrow_mut()
        .add_related("tags", &tag, 1, BTreeMap::new())
        .unwrap();

    let _ = book.borrow().snapshot_related("tags").unwrap();
    let group = book.borrow().group("tags").unwrap();

    assert!(!group.borrow().is_loaded());
    assert_eq!(group.borrow().added().total(), 1);
}
