use shelfmark_core::{
    open_db_in_memory, AuditAction, CatalogError, CatalogService, CopyCondition, LoanStatus,
    NewAuthor, NewBook, NewCategory, NewPhysicalCopy, ValidationError,
};

fn setup() -> CatalogService {
    CatalogService::new(open_db_in_memory().unwrap())
}

#[test]
fn insert_book_round_trips_through_reads() {
    let mut service = setup();
    let sci_fi = service.create_category(&NewCategory::new("Sci-Fi")).unwrap();

    let dune = service
        .insert_book(&NewBook {
            title: "Dune".to_string(),
            description: "Desert planet".to_string(),
            publication_date: "1965-08-01".to_string(),
            category_id: Some(sci_fi),
        })
        .unwrap();

    let book = service.get_book(dune).unwrap().recv().unwrap().unwrap();
    assert_eq!(book.title, "Dune");
    assert_eq!(book.description, "Desert planet");
    assert_eq!(book.publication_date, "1965-08-01");
    assert_eq!(book.category_id, Some(sci_fi));
    assert!(!book.is_deleted);
}

#[test]
fn insert_book_with_unknown_category_leaves_no_row() {
    let mut service = setup();
    let audit = service.get_all_audit_log().unwrap();
    assert!(audit.recv().unwrap().is_empty());

    let err = service
        .insert_book(&NewBook::new("Dune").in_category(999))
        .unwrap_err();

    assert!(matches!(err, CatalogError::ReferentialIntegrity(_)));
    assert!(service.get_all_books().unwrap().recv().unwrap().is_empty());
    assert!(audit.try_recv().is_err());
}

#[test]
fn insert_book_rejects_blank_title() {
    let mut service = setup();

    let err = service.insert_book(&NewBook::new(" ")).unwrap_err();

    assert!(matches!(
        err,
        CatalogError::Validation(ValidationError::BlankBookTitle)
    ));
}

#[test]
fn uncategorized_books_are_allowed() {
    let mut service = setup();

    let id = service.insert_book(&NewBook::new("Loose Leaves")).unwrap();

    assert_eq!(service.find_book(id).unwrap().unwrap().category_id, None);
}

#[test]
fn update_book_changes_row_and_audits() {
    let mut service = setup();
    let dune = service.insert_book(&NewBook::new("Dune")).unwrap();
    let mut book = service.find_book(dune).unwrap().unwrap();

    book.title = "Dune Messiah".to_string();
    book.publication_date = "1969".to_string();
    service.update_book(&book).unwrap();

    assert_eq!(service.find_book(dune).unwrap().unwrap(), book);
    let newest = &service.get_all_audit_log().unwrap().recv().unwrap()[0];
    assert_eq!(newest.entity_name, "Buku");
    assert_eq!(newest.entity_id, dune);
    assert_eq!(newest.action, AuditAction::Update);
}

#[test]
fn update_book_with_unknown_category_rolls_back() {
    let mut service = setup();
    let dune = service.insert_book(&NewBook::new("Dune")).unwrap();
    let original = service.find_book(dune).unwrap().unwrap();

    let mut book = original.clone();
    book.category_id = Some(31337);
    let err = service.update_book(&book).unwrap_err();

    assert!(matches!(err, CatalogError::ReferentialIntegrity(_)));
    assert_eq!(service.find_book(dune).unwrap().unwrap(), original);
    assert_eq!(service.get_all_audit_log().unwrap().recv().unwrap().len(), 1);
}

#[test]
fn update_unknown_book_is_not_found() {
    let mut service = setup();
    let dune = service.insert_book(&NewBook::new("Dune")).unwrap();
    let mut book = service.find_book(dune).unwrap().unwrap();
    book.id = dune + 100;

    let err = service.update_book(&book).unwrap_err();

    assert!(matches!(err, CatalogError::NotFound { entity: "buku", .. }));
}

#[test]
fn delete_book_is_soft_and_keeps_copies() {
    let mut service = setup();
    let dune = service.insert_book(&NewBook::new("Dune")).unwrap();
    service
        .add_physical_copy(&NewPhysicalCopy::available(dune, "A-01"))
        .unwrap();

    service.delete_book(dune).unwrap();

    assert!(service.find_book(dune).unwrap().unwrap().is_deleted);
    assert!(service.get_all_books().unwrap().recv().unwrap().is_empty());
    assert_eq!(
        service.get_copies_for_book(dune).unwrap().recv().unwrap().len(),
        1
    );
    let newest = &service.get_all_audit_log().unwrap().recv().unwrap()[0];
    assert_eq!(newest.action, AuditAction::SoftDelete);
    assert_eq!(newest.entity_id, dune);

    assert!(matches!(
        service.delete_book(dune).unwrap_err(),
        CatalogError::NotFound { entity: "buku", .. }
    ));
}

#[test]
fn books_list_by_title_and_filter_by_category() {
    let mut service = setup();
    let sci_fi = service.create_category(&NewCategory::new("Sci-Fi")).unwrap();
    let poetry = service.create_category(&NewCategory::new("Poetry")).unwrap();
    service
        .insert_book(&NewBook::new("Solaris").in_category(sci_fi))
        .unwrap();
    service
        .insert_book(&NewBook::new("Dune").in_category(sci_fi))
        .unwrap();
    service
        .insert_book(&NewBook::new("Odes").in_category(poetry))
        .unwrap();

    let titles = |books: Vec<shelfmark_core::Book>| {
        books.into_iter().map(|book| book.title).collect::<Vec<_>>()
    };
    assert_eq!(
        titles(service.get_all_books().unwrap().recv().unwrap()),
        ["Dune", "Odes", "Solaris"]
    );
    assert_eq!(
        titles(service.get_books_by_category(sci_fi).unwrap().recv().unwrap()),
        ["Dune", "Solaris"]
    );
}

#[test]
fn books_with_category_resolve_their_category() {
    let mut service = setup();
    let sci_fi = service.create_category(&NewCategory::new("Sci-Fi")).unwrap();
    service
        .insert_book(&NewBook::new("Dune").in_category(sci_fi))
        .unwrap();
    service.insert_book(&NewBook::new("Almanac")).unwrap();

    let rows = service.get_all_books_with_category().unwrap().recv().unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].book.title, "Almanac");
    assert!(rows[0].category.is_none());
    assert_eq!(rows[1].book.title, "Dune");
    assert_eq!(
        rows[1].category.as_ref().map(|c| c.name.as_str()),
        Some("Sci-Fi")
    );
}

#[test]
fn insert_author_skips_validation_and_audit() {
    let mut service = setup();

    let id = service.insert_author(&NewAuthor::new("", "")).unwrap();

    let author = service.get_author(id).unwrap().recv().unwrap().unwrap();
    assert_eq!(author.name, "");
    assert!(service.get_all_audit_log().unwrap().recv().unwrap().is_empty());
}

#[test]
fn authors_list_by_name() {
    let mut service = setup();
    service
        .insert_author(&NewAuthor::new("Stanislaw Lem", "Polish writer"))
        .unwrap();
    service
        .insert_author(&NewAuthor::new("Frank Herbert", "American writer"))
        .unwrap();

    let names: Vec<_> = service
        .get_all_authors()
        .unwrap()
        .recv()
        .unwrap()
        .into_iter()
        .map(|author| author.name)
        .collect();

    assert_eq!(names, ["Frank Herbert", "Stanislaw Lem"]);
}

#[test]
fn linking_author_twice_is_ignored() {
    let mut service = setup();
    let dune = service.insert_book(&NewBook::new("Dune")).unwrap();
    let herbert = service
        .insert_author(&NewAuthor::new("Frank Herbert", ""))
        .unwrap();

    assert!(service.link_author_to_book(dune, herbert).unwrap());
    assert!(!service.link_author_to_book(dune, herbert).unwrap());

    let authors = service.get_authors_for_book(dune).unwrap().recv().unwrap();
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[0].id, herbert);
    let link_entries = service
        .get_all_audit_log()
        .unwrap()
        .recv()
        .unwrap()
        .into_iter()
        .filter(|entry| entry.entity_name == "BukuPenulis")
        .count();
    assert_eq!(link_entries, 1);
}

#[test]
fn linking_unknown_author_is_referential_error() {
    let mut service = setup();
    let dune = service.insert_book(&NewBook::new("Dune")).unwrap();

    let err = service.link_author_to_book(dune, 12).unwrap_err();

    assert!(matches!(err, CatalogError::ReferentialIntegrity(_)));
    assert!(service.get_authors_for_book(dune).unwrap().recv().unwrap().is_empty());
}

#[test]
fn physical_copies_are_tracked_per_book() {
    let mut service = setup();
    let dune = service.insert_book(&NewBook::new("Dune")).unwrap();
    let first = service
        .add_physical_copy(&NewPhysicalCopy::available(dune, "A-01"))
        .unwrap();
    service
        .add_physical_copy(&NewPhysicalCopy::available(dune, "A-02"))
        .unwrap();

    let copies = service.get_copies_for_book(dune).unwrap();
    let mut copy = copies.recv().unwrap().remove(0);
    assert_eq!(copy.id, first);
    assert_eq!(copy.condition, CopyCondition::Good);

    copy.condition = CopyCondition::Damaged;
    copy.loan_status = LoanStatus::Loaned;
    service.update_physical_copy(&copy).unwrap();

    let latest = copies.recv().unwrap();
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[0], copy);
    assert!(latest[0].is_on_loan());
}

#[test]
fn physical_copy_needs_existing_book_and_shelf() {
    let mut service = setup();
    let dune = service.insert_book(&NewBook::new("Dune")).unwrap();

    assert!(matches!(
        service
            .add_physical_copy(&NewPhysicalCopy::available(dune, "  "))
            .unwrap_err(),
        CatalogError::Validation(ValidationError::BlankShelfLocation)
    ));
    assert!(matches!(
        service
            .add_physical_copy(&NewPhysicalCopy::available(dune + 1, "A-01"))
            .unwrap_err(),
        CatalogError::ReferentialIntegrity(_)
    ));
}
