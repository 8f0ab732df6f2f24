/// Summary emitted at the end of a backfill run. `errors` carries one
/// human-readable line per skipped triple, not one per failure mode, so a
/// run that skips a thousand malformed files doesn't require wading through
/// a thousand distinct error variants.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct BackfillReport {
    pub scanned: usize,
    pub ingested: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl BackfillReport {
    pub fn to_summary(&self) -> String {
        format!(
            "backfill complete: scanned={} ingested={} skipped={}",
            self.scanned, self.ingested, self.skipped
        )
    }
}
