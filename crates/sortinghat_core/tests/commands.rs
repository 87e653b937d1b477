use sortinghat_core::db::open_db_in_memory;
use sortinghat_core::{
    Add, AddIdentityRequest, CommandError, CommandStatus, Enroll, Orgs, OrgsAction, PeriodArgs,
    Remove, RemoveTarget, Show, Withdraw,
};
use rusqlite::Connection;

struct Captured {
    status: CommandStatus,
    out: String,
    err: String,
}

fn capture(run: impl FnOnce(&mut Vec<u8>, &mut Vec<u8>) -> CommandStatus) -> Captured {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let status = run(&mut out, &mut err);
    Captured {
        status,
        out: String::from_utf8(out).unwrap(),
        err: String::from_utf8(err).unwrap(),
    }
}

fn jroe() -> AddIdentityRequest {
    AddIdentityRequest {
        source: "scm".to_string(),
        email: Some("jroe@example.com".to_string()),
        name: Some("Jane Roe".to_string()),
        username: Some("jroe".to_string()),
        uuid: None,
    }
}

const JROE_UUID: &str = "52e0aa0a14826627e633fd15332988686b730ab3";

fn period<'a>(from: Option<&'a str>, to: Option<&'a str>) -> PeriodArgs<'a> {
    PeriodArgs {
        uuid: JROE_UUID,
        organization: "Bitergia",
        from,
        to,
    }
}

fn setup_with_jroe() -> Connection {
    let conn = open_db_in_memory().unwrap();
    Add::new(&conn).add(&jroe()).unwrap();
    Orgs::new(&conn).orgs(OrgsAction::Add("Bitergia")).unwrap();
    conn
}

#[test]
fn add_reports_identity_and_owner() {
    let conn = open_db_in_memory().unwrap();

    let captured = capture(|out, err| Add::new(&conn).run(&jroe(), out, err));
    assert_eq!(captured.status, CommandStatus::Success);
    assert_eq!(
        captured.out,
        format!("New identity {JROE_UUID} added to {JROE_UUID}\n")
    );
    assert_eq!(captured.err, "");

    let captured = capture(|out, err| Add::new(&conn).run(&jroe(), out, err));
    assert_eq!(captured.status, CommandStatus::Failure);
    assert_eq!(captured.out, "");
    assert_eq!(
        captured.err,
        format!("Error: {JROE_UUID} already exists in the registry\n")
    );
}

#[test]
fn add_to_existing_uuid_reports_new_identity_id() {
    let conn = setup_with_jroe();
    let request = AddIdentityRequest {
        source: "scm".to_string(),
        email: Some("jroe@example.com".to_string()),
        name: None,
        username: None,
        uuid: Some(JROE_UUID.to_string()),
    };

    let report = Add::new(&conn).add(&request).unwrap();
    assert_eq!(
        report,
        format!("New identity 119e24299a861b6d6ebe432e7bb7c943d6feb0d5 added to {JROE_UUID}")
    );
}

#[test]
fn readding_identity_to_its_owner_reports_no_change() {
    let conn = setup_with_jroe();
    let request = AddIdentityRequest {
        uuid: Some(JROE_UUID.to_string()),
        ..jroe()
    };

    let captured = capture(|out, err| Add::new(&conn).run(&request, out, err));
    assert_eq!(captured.status, CommandStatus::Success);
    assert_eq!(
        captured.out,
        format!("Identity {JROE_UUID} already belongs to {JROE_UUID}\n")
    );
    assert_eq!(captured.err, "");
}

#[test]
fn orgs_delete_accepts_the_name_as_added() {
    let conn = open_db_in_memory().unwrap();
    let orgs = Orgs::new(&conn);

    orgs.orgs(OrgsAction::Add(" Bitergia ")).unwrap();
    assert_eq!(orgs.orgs(OrgsAction::List(None)).unwrap(), "Bitergia");
    assert_eq!(orgs.orgs(OrgsAction::Delete(" Bitergia ")).unwrap(), "");
    assert_eq!(orgs.orgs(OrgsAction::List(None)).unwrap(), "");
}

#[test]
fn orgs_lists_adds_and_deletes() {
    let conn = open_db_in_memory().unwrap();
    let orgs = Orgs::new(&conn);

    let captured = capture(|out, err| orgs.run(OrgsAction::List(None), out, err));
    assert_eq!(captured.status, CommandStatus::Success);
    assert_eq!(captured.out, "");

    for name in ["Example", "Bitergia", "LibreSoft"] {
        let captured = capture(|out, err| orgs.run(OrgsAction::Add(name), out, err));
        assert_eq!(captured.status, CommandStatus::Success);
        assert_eq!(captured.out, "");
    }

    let captured = capture(|out, err| orgs.run(OrgsAction::List(None), out, err));
    assert_eq!(captured.out, "Bitergia\nExample\nLibreSoft\n");

    let captured = capture(|out, err| orgs.run(OrgsAction::List(Some("Soft")), out, err));
    assert_eq!(captured.out, "LibreSoft\n");

    let captured = capture(|out, err| orgs.run(OrgsAction::Delete("Example"), out, err));
    assert_eq!(captured.status, CommandStatus::Success);

    let captured = capture(|out, err| orgs.run(OrgsAction::Delete("Example"), out, err));
    assert_eq!(captured.status, CommandStatus::Failure);
    assert_eq!(captured.err, "Error: Example not found in the registry\n");
}

#[test]
fn enroll_and_withdraw_update_show_report() {
    let conn = setup_with_jroe();

    let captured = capture(|out, err| {
        Enroll::new(&conn).run(period(Some("1999-01-01"), Some("2000-01-01")), out, err)
    });
    assert_eq!(captured.status, CommandStatus::Success);
    assert_eq!(captured.out, "");

    let report = Show::new(&conn).show(Some(JROE_UUID)).unwrap();
    assert!(report.ends_with(
        "Enrollments:\n  Bitergia\t1999-01-01 00:00:00\t2000-01-01 00:00:00"
    ));

    let captured = capture(|out, err| Withdraw::new(&conn).run(period(None, None), out, err));
    assert_eq!(captured.status, CommandStatus::Success);

    let report = Show::new(&conn).show(Some(JROE_UUID)).unwrap();
    assert!(report.ends_with("No enrollments"));

    let captured = capture(|out, err| Withdraw::new(&conn).run(period(None, None), out, err));
    assert_eq!(captured.status, CommandStatus::Failure);
    assert_eq!(
        captured.err,
        format!("Error: enrollment of {JROE_UUID} in Bitergia not found in the registry\n")
    );
}

#[test]
fn enroll_rejects_invalid_dates() {
    let conn = setup_with_jroe();

    let err = Enroll::new(&conn)
        .enroll(period(Some("yesterday"), None))
        .unwrap_err();
    assert!(matches!(err, CommandError::InvalidValue(_)));
    assert_eq!(err.to_string(), "invalid date `yesterday`");

    let err = Enroll::new(&conn)
        .enroll(period(Some("2008-01-01"), Some("2006-01-01")))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "start date 2008-01-01 00:00:00 cannot be greater than end date 2006-01-01 00:00:00"
    );
}

#[test]
fn enroll_in_unknown_organization_fails() {
    let conn = setup_with_jroe();

    let captured = capture(|out, err| {
        Enroll::new(&conn).run(
            PeriodArgs {
                uuid: JROE_UUID,
                organization: "Nowhere",
                from: None,
                to: None,
            },
            out,
            err,
        )
    });
    assert_eq!(captured.status, CommandStatus::Failure);
    assert_eq!(captured.err, "Error: Nowhere not found in the registry\n");
}

#[test]
fn rm_deletes_identity_or_unique_identity() {
    let conn = setup_with_jroe();
    let remove = Remove::new(&conn);

    let captured = capture(|out, err| remove.run(JROE_UUID, RemoveTarget::Identity, out, err));
    assert_eq!(captured.status, CommandStatus::Success);
    assert_eq!(captured.out, format!("Identity {JROE_UUID} removed\n"));

    let report = Show::new(&conn).show(Some(JROE_UUID)).unwrap();
    assert!(report.contains("No identities"));

    let captured =
        capture(|out, err| remove.run(JROE_UUID, RemoveTarget::UniqueIdentity, out, err));
    assert_eq!(captured.out, format!("Unique identity {JROE_UUID} removed\n"));

    let captured =
        capture(|out, err| remove.run(JROE_UUID, RemoveTarget::UniqueIdentity, out, err));
    assert_eq!(captured.status, CommandStatus::Failure);
    assert_eq!(
        captured.err,
        format!("Error: {JROE_UUID} not found in the registry\n")
    );
    assert_eq!(Show::new(&conn).show(None).unwrap(), "");
}
