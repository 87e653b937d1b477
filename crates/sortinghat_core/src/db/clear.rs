use super::DbResult;
use log::info;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Removes every organization, unique identity, identity and enrollment.
///
/// Runs in one immediate transaction; the schema itself is kept.
pub fn clear_registry(conn: &Connection) -> DbResult<()> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    tx.execute_batch(
        "DELETE FROM enrollments;
         DELETE FROM identities;
         DELETE FROM unique_identities;
         DELETE FROM organizations;",
    )?;
    tx.commit()?;

    info!("event=registry_clear module=db status=ok");
    Ok(())
}
