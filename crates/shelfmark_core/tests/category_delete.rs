use shelfmark_core::{
    open_db_in_memory, AuditAction, BookId, CatalogError, CatalogService, CategoryId, LoanStatus,
    NewBook, NewCategory, NewPhysicalCopy,
};

fn setup() -> CatalogService {
    CatalogService::new(open_db_in_memory().unwrap())
}

fn seed_category_with_books(service: &mut CatalogService) -> (CategoryId, BookId, BookId) {
    let sci_fi = service.create_category(&NewCategory::new("Sci-Fi")).unwrap();
    let dune = service
        .insert_book(&NewBook::new("Dune").in_category(sci_fi).published("1965"))
        .unwrap();
    let solaris = service
        .insert_book(&NewBook::new("Solaris").in_category(sci_fi).published("1961"))
        .unwrap();
    (sci_fi, dune, solaris)
}

fn audit_len(service: &mut CatalogService) -> usize {
    service.get_all_audit_log().unwrap().recv().unwrap().len()
}

#[test]
fn delete_without_books_detaches_them() {
    let mut service = setup();
    let (sci_fi, dune, solaris) = seed_category_with_books(&mut service);

    service.delete_category(sci_fi, false).unwrap();

    assert!(service.find_category(sci_fi).unwrap().unwrap().is_deleted);
    for id in [dune, solaris] {
        let book = service.find_book(id).unwrap().unwrap();
        assert_eq!(book.category_id, None);
        assert!(!book.is_deleted);
    }
    assert_eq!(service.get_all_books().unwrap().recv().unwrap().len(), 2);
    assert!(service.get_all_categories().unwrap().recv().unwrap().is_empty());
}

#[test]
fn delete_with_books_soft_deletes_them() {
    let mut service = setup();
    let (sci_fi, dune, solaris) = seed_category_with_books(&mut service);

    service.delete_category(sci_fi, true).unwrap();

    assert!(service.find_category(sci_fi).unwrap().unwrap().is_deleted);
    for id in [dune, solaris] {
        let book = service.find_book(id).unwrap().unwrap();
        assert!(book.is_deleted);
        assert_eq!(book.category_id, Some(sci_fi));
    }
    assert!(service.get_all_books().unwrap().recv().unwrap().is_empty());
}

#[test]
fn delete_writes_exactly_one_soft_delete_entry() {
    let mut service = setup();
    let (sci_fi, _, _) = seed_category_with_books(&mut service);
    let before = audit_len(&mut service);

    service.delete_category(sci_fi, true).unwrap();

    let entries = service.get_all_audit_log().unwrap().recv().unwrap();
    assert_eq!(entries.len(), before + 1);
    let newest = &entries[0];
    assert_eq!(newest.entity_name, "Kategori");
    assert_eq!(newest.entity_id, sci_fi);
    assert_eq!(newest.action, AuditAction::SoftDelete);
    assert!(newest.note.contains("Sci-Fi"));
}

#[test]
fn loaned_copy_blocks_delete_and_changes_nothing() {
    let mut service = setup();
    let (sci_fi, dune, solaris) = seed_category_with_books(&mut service);
    service
        .add_physical_copy(&NewPhysicalCopy::available(dune, "A-01"))
        .unwrap();
    service
        .add_physical_copy(&NewPhysicalCopy {
            loan_status: LoanStatus::Loaned,
            ..NewPhysicalCopy::available(dune, "A-02")
        })
        .unwrap();
    let category_before = service.find_category(sci_fi).unwrap();
    let books_before = [
        service.find_book(dune).unwrap(),
        service.find_book(solaris).unwrap(),
    ];
    let copies_before = service.get_copies_for_book(dune).unwrap().recv().unwrap();
    let audit_before = audit_len(&mut service);

    for delete_books in [false, true] {
        let err = service.delete_category(sci_fi, delete_books).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::CategoryInUse { category_id, loaned_copies: 1 } if category_id == sci_fi
        ));
    }

    assert_eq!(service.find_category(sci_fi).unwrap(), category_before);
    assert_eq!(
        [
            service.find_book(dune).unwrap(),
            service.find_book(solaris).unwrap(),
        ],
        books_before
    );
    assert_eq!(
        service.get_copies_for_book(dune).unwrap().recv().unwrap(),
        copies_before
    );
    assert_eq!(audit_len(&mut service), audit_before);
}

#[test]
fn returned_copy_unblocks_delete() {
    let mut service = setup();
    let (sci_fi, dune, _) = seed_category_with_books(&mut service);
    let copy_id = service
        .add_physical_copy(&NewPhysicalCopy {
            loan_status: LoanStatus::Loaned,
            ..NewPhysicalCopy::available(dune, "B-07")
        })
        .unwrap();
    assert!(service.delete_category(sci_fi, false).is_err());

    let mut copy = service
        .get_copies_for_book(dune)
        .unwrap()
        .recv()
        .unwrap()
        .into_iter()
        .find(|copy| copy.id == copy_id)
        .unwrap();
    copy.loan_status = LoanStatus::Available;
    service.update_physical_copy(&copy).unwrap();

    service.delete_category(sci_fi, false).unwrap();
    assert!(service.find_category(sci_fi).unwrap().unwrap().is_deleted);
}

#[test]
fn lost_copies_do_not_block_delete() {
    let mut service = setup();
    let (sci_fi, dune, _) = seed_category_with_books(&mut service);
    service
        .add_physical_copy(&NewPhysicalCopy {
            loan_status: LoanStatus::Lost,
            ..NewPhysicalCopy::available(dune, "C-03")
        })
        .unwrap();

    service.delete_category(sci_fi, true).unwrap();
}

#[test]
fn loaned_copy_of_already_deleted_book_still_blocks() {
    let mut service = setup();
    let (sci_fi, dune, _) = seed_category_with_books(&mut service);
    service
        .add_physical_copy(&NewPhysicalCopy {
            loan_status: LoanStatus::Loaned,
            ..NewPhysicalCopy::available(dune, "D-11")
        })
        .unwrap();
    service.delete_book(dune).unwrap();

    let err = service.delete_category(sci_fi, false).unwrap_err();

    assert!(matches!(err, CatalogError::CategoryInUse { .. }));
}

#[test]
fn deleting_unknown_or_deleted_category_is_not_found() {
    let mut service = setup();
    let (sci_fi, _, _) = seed_category_with_books(&mut service);

    assert!(matches!(
        service.delete_category(4242, false).unwrap_err(),
        CatalogError::NotFound { entity: "kategori", id: 4242 }
    ));

    service.delete_category(sci_fi, false).unwrap();
    assert!(matches!(
        service.delete_category(sci_fi, false).unwrap_err(),
        CatalogError::NotFound { .. }
    ));
}

#[test]
fn delete_leaves_subcategories_attached() {
    let mut service = setup();
    let fiction = service.create_category(&NewCategory::new("Fiction")).unwrap();
    let sci_fi = service
        .create_category(&NewCategory::new("Sci-Fi").with_parent(fiction))
        .unwrap();

    service.delete_category(fiction, false).unwrap();

    let child = service.find_category(sci_fi).unwrap().unwrap();
    assert!(!child.is_deleted);
    assert_eq!(child.parent_id, Some(fiction));
}

#[test]
fn delete_only_touches_books_of_that_category() {
    let mut service = setup();
    let (sci_fi, _, _) = seed_category_with_books(&mut service);
    let poetry = service.create_category(&NewCategory::new("Poetry")).unwrap();
    let odes = service
        .insert_book(&NewBook::new("Odes").in_category(poetry))
        .unwrap();

    service.delete_category(sci_fi, true).unwrap();

    let odes = service.find_book(odes).unwrap().unwrap();
    assert!(!odes.is_deleted);
    assert_eq!(odes.category_id, Some(poetry));
}
