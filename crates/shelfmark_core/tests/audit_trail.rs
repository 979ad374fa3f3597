use shelfmark_core::{
    open_db_in_memory, AuditAction, CatalogService, LoanStatus, NewAuthor, NewBook, NewCategory,
    NewPhysicalCopy,
};

fn setup() -> CatalogService {
    CatalogService::new(open_db_in_memory().unwrap())
}

#[test]
fn every_audited_mutation_appends_one_entry() {
    let mut service = setup();
    let audit = service.get_all_audit_log().unwrap();
    assert!(audit.recv().unwrap().is_empty());

    let fiction = service.create_category(&NewCategory::new("Fiction")).unwrap();
    assert_eq!(audit.recv().unwrap().len(), 1);

    let mut category = service.find_category(fiction).unwrap().unwrap();
    category.description = "prose".to_string();
    service.update_category(&category).unwrap();
    assert_eq!(audit.recv().unwrap().len(), 2);

    let dune = service
        .insert_book(&NewBook::new("Dune").in_category(fiction))
        .unwrap();
    assert_eq!(audit.recv().unwrap().len(), 3);

    let mut book = service.find_book(dune).unwrap().unwrap();
    book.description = "spice".to_string();
    service.update_book(&book).unwrap();
    assert_eq!(audit.recv().unwrap().len(), 4);

    let copy_id = service
        .add_physical_copy(&NewPhysicalCopy::available(dune, "A-01"))
        .unwrap();
    assert_eq!(audit.recv().unwrap().len(), 5);

    let mut copy = service.get_copies_for_book(dune).unwrap().recv().unwrap()[0].clone();
    assert_eq!(copy.id, copy_id);
    copy.loan_status = LoanStatus::Lost;
    service.update_physical_copy(&copy).unwrap();
    assert_eq!(audit.recv().unwrap().len(), 6);

    service.delete_book(dune).unwrap();
    assert_eq!(audit.recv().unwrap().len(), 7);

    service.delete_category(fiction, false).unwrap();
    let entries = audit.recv().unwrap();
    assert_eq!(entries.len(), 8);

    let trail: Vec<_> = entries
        .iter()
        .rev()
        .map(|entry| (entry.entity_name.as_str(), entry.action))
        .collect();
    assert_eq!(
        trail,
        [
            ("Kategori", AuditAction::Insert),
            ("Kategori", AuditAction::Update),
            ("Buku", AuditAction::Insert),
            ("Buku", AuditAction::Update),
            ("BukuFisik", AuditAction::Insert),
            ("BukuFisik", AuditAction::Update),
            ("Buku", AuditAction::SoftDelete),
            ("Kategori", AuditAction::SoftDelete),
        ]
    );
}

#[test]
fn entries_record_assigned_ids_and_notes() {
    let mut service = setup();

    let fiction = service.create_category(&NewCategory::new("Fiction")).unwrap();
    let dune = service.insert_book(&NewBook::new("Dune")).unwrap();

    let entries = service.get_all_audit_log().unwrap().recv().unwrap();
    assert_eq!(entries[0].entity_name, "Buku");
    assert_eq!(entries[0].entity_id, dune);
    assert!(entries[0].note.contains("Dune"));
    assert_eq!(entries[1].entity_name, "Kategori");
    assert_eq!(entries[1].entity_id, fiction);
    assert!(entries[1].note.contains("Fiction"));
}

#[test]
fn entries_are_newest_first_with_epoch_millis() {
    let mut service = setup();
    for name in ["A", "B", "C"] {
        service.create_category(&NewCategory::new(name)).unwrap();
    }

    let entries = service.get_all_audit_log().unwrap().recv().unwrap();

    assert_eq!(entries.len(), 3);
    for pair in entries.windows(2) {
        assert!(pair[0].timestamp >= pair[1].timestamp);
        assert!(pair[0].id > pair[1].id);
    }
    // 2001-09-09 in epoch milliseconds; rules out seconds or julian days.
    assert!(entries[0].timestamp > 1_000_000_000_000);
}

#[test]
fn author_insert_is_not_audited() {
    let mut service = setup();

    service
        .insert_author(&NewAuthor::new("Ursula K. Le Guin", ""))
        .unwrap();

    assert!(service.get_all_audit_log().unwrap().recv().unwrap().is_empty());
}

#[test]
fn failed_mutations_leave_trail_untouched() {
    let mut service = setup();
    service.create_category(&NewCategory::new("Fiction")).unwrap();

    service.create_category(&NewCategory::new("")).unwrap_err();
    service
        .insert_book(&NewBook::new("Dune").in_category(500))
        .unwrap_err();
    service.delete_book(500).unwrap_err();

    assert_eq!(service.get_all_audit_log().unwrap().recv().unwrap().len(), 1);
}

#[test]
fn store_rejects_audit_rewrites() {
    let mut service = setup();
    service.create_category(&NewCategory::new("Fiction")).unwrap();
    let conn = service.connection();

    let update = conn.execute("UPDATE audit_log SET catatan = 'edited';", []);
    let delete = conn.execute("DELETE FROM audit_log;", []);

    assert!(update.unwrap_err().to_string().contains("append-only"));
    assert!(delete.unwrap_err().to_string().contains("append-only"));
    let entries = service.get_all_audit_log().unwrap().recv().unwrap();
    assert_eq!(entries.len(), 1);
    assert_ne!(entries[0].note, "edited");
}
