//! `WorkQueue` implementations over the status columns

use crate::{
    insert_statements_in, now_secs, row_to_document, row_to_statement, SqliteStore, StoreError,
    DOCUMENT_COLUMNS, STATEMENT_COLUMNS, UNMITIGATED,
};
use riskmine_domain::{
    Document, DocumentOutcome, Lease, LeaseToken, Mitigation, Statement, WorkQueue,
};
use rusqlite::{params, TransactionBehavior};

impl SqliteStore {
    /// Unix time before which a lease counts as expired
    fn lease_cutoff(&self, now: i64) -> i64 {
        now - self.lease_ttl.as_secs() as i64
    }
}

impl WorkQueue<Document> for SqliteStore {
    type Error = StoreError;

    fn lease(&mut self, batch: usize) -> Result<Lease<Document>, Self::Error> {
        let token = LeaseToken::new();
        let now = now_secs();
        let cutoff = self.lease_cutoff(now);

        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let units = {
            let mut select = tx.prepare(&format!(
                "SELECT {} FROM filings
                 WHERE llm_status = 'pending' AND risk_factors IS NOT NULL
                   AND (leased_at IS NULL OR leased_at <= ?1)
                 ORDER BY id LIMIT ?2",
                DOCUMENT_COLUMNS
            ))?;
            let rows = select.query_map(params![cutoff, batch as i64], row_to_document)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };
        {
            let mut stamp =
                tx.prepare("UPDATE filings SET lease_token = ?1, leased_at = ?2 WHERE id = ?3")?;
            for unit in &units {
                stamp.execute(params![token.to_string(), now, unit.id.value()])?;
            }
        }
        tx.commit()?;

        if !units.is_empty() {
            tracing::debug!(%token, count = units.len(), "leased documents");
        }
        Ok(Lease::new(token, units))
    }

    fn complete(&mut self, unit: &Document, outcome: DocumentOutcome) -> Result<(), Self::Error> {
        let status = outcome.status();
        let tx = self.conn.transaction()?;

        match &outcome {
            DocumentOutcome::Done(statements) => {
                let inserted = insert_statements_in(&tx, unit.id, statements)?;
                tracing::debug!(document = %unit.id, inserted, "statements stored");
            }
            DocumentOutcome::Error(reason) => {
                tracing::warn!(document = %unit.id, %reason, "document failed");
            }
        }

        tx.execute(
            "UPDATE filings SET llm_status = ?1, lease_token = NULL, leased_at = NULL WHERE id = ?2",
            params![status.as_db(), unit.id.value()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn requeue(&mut self, unit: &Document) -> Result<(), Self::Error> {
        self.conn.execute(
            "UPDATE filings SET lease_token = NULL, leased_at = NULL WHERE id = ?1",
            params![unit.id.value()],
        )?;
        Ok(())
    }

    fn pending_count(&self) -> Result<u64, Self::Error> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM filings WHERE llm_status = 'pending'",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

impl WorkQueue<Statement> for SqliteStore {
    type Error = StoreError;

    fn lease(&mut self, batch: usize) -> Result<Lease<Statement>, Self::Error> {
        let token = LeaseToken::new();
        let now = now_secs();
        let cutoff = self.lease_cutoff(now);

        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let units = {
            let mut select = tx.prepare(&format!(
                "SELECT {} FROM risks
                 WHERE {} AND (leased_at IS NULL OR leased_at <= ?1)
                 ORDER BY id LIMIT ?2",
                STATEMENT_COLUMNS, UNMITIGATED
            ))?;
            let rows = select.query_map(params![cutoff, batch as i64], row_to_statement)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };
        {
            let mut stamp =
                tx.prepare("UPDATE risks SET lease_token = ?1, leased_at = ?2 WHERE id = ?3")?;
            for unit in &units {
                stamp.execute(params![token.to_string(), now, unit.id.value()])?;
            }
        }
        tx.commit()?;

        if !units.is_empty() {
            tracing::debug!(%token, count = units.len(), "leased statements");
        }
        Ok(Lease::new(token, units))
    }

    /// Fill whichever mitigation fields are still missing
    ///
    /// A field that already holds a usable value is never overwritten. Fields the
    /// outcome leaves empty stay empty, which keeps the statement in the queue.
    fn complete(&mut self, unit: &Statement, outcome: Mitigation) -> Result<(), Self::Error> {
        self.conn.execute(
            "UPDATE risks SET
                mitigation_idea = COALESCE(mitigation_idea, ?1),
                mitigation_rank = CASE WHEN mitigation_rank IN (1, 2, 3) THEN mitigation_rank ELSE ?2 END,
                mitigation_attempts = COALESCE(mitigation_attempts, 0) + 1,
                lease_token = NULL,
                leased_at = NULL
             WHERE id = ?3",
            params![
                outcome.idea.as_deref().map(str::trim).filter(|idea| !idea.is_empty()),
                outcome.rank.map(|rank| rank.value()),
                unit.id.value(),
            ],
        )?;
        Ok(())
    }

    /// Release the lease; the abandoned attempt still counts
    fn requeue(&mut self, unit: &Statement) -> Result<(), Self::Error> {
        self.conn.execute(
            "UPDATE risks SET
                mitigation_attempts = COALESCE(mitigation_attempts, 0) + 1,
                lease_token = NULL,
                leased_at = NULL
             WHERE id = ?1",
            params![unit.id.value()],
        )?;
        Ok(())
    }

    fn pending_count(&self) -> Result<u64, Self::Error> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM risks WHERE {}", UNMITIGATED),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
