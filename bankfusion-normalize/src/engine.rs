//! Per-row normalization and the bounded per-document pool

use crate::advisory::{AdvisoryClassifier, AdvisoryRequest};
use crate::ladder;
use crate::rules::RuleTables;
use crate::suggest::{needs_advisory, suggest};
use crate::validate;
use bankfusion_core::{
    AdvisoryError, BankIdentity, ClassificationSource, NormalizationMethod, NormalizedTransaction,
    RawTransaction, StatementEntry,
};
use futures_util::{StreamExt, TryStreamExt, stream};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Confidence of a suggestion kept after the advisory call failed
pub const FALLBACK_CONFIDENCE: f32 = 0.3;

const DEFAULT_CONCURRENCY: usize = 10;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Clone)]
pub struct Normalizer {
    tables: Arc<RuleTables>,
    advisory: Option<Arc<dyn AdvisoryClassifier>>,
    concurrency: usize,
    timeout: Duration,
}

impl Normalizer {
    pub fn new(tables: Arc<RuleTables>) -> Self {
        Self {
            tables,
            advisory: None,
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_advisory(mut self, advisory: Arc<dyn AdvisoryClassifier>) -> Self {
        self.advisory = Some(advisory);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn method(&self) -> NormalizationMethod {
        if self.advisory.is_some() {
            NormalizationMethod::Hybrid
        } else {
            NormalizationMethod::RulesOnly
        }
    }

    pub fn tables(&self) -> &RuleTables {
        &self.tables
    }

    /// Normalize one row. Only a credential failure is returned as an error;
    /// every other advisory problem degrades to the rules.
    pub async fn normalize(&self, txn: &RawTransaction) -> Result<NormalizedTransaction, AdvisoryError> {
        let suggestion = suggest(&self.tables, txn);
        let suggestion = match &self.advisory {
            Some(advisory) if needs_advisory(&suggestion, &txn.description) => {
                self.consult(advisory.as_ref(), txn, suggestion).await?
            }
            _ => suggestion,
        };
        Ok(ladder::finalize(&self.tables, txn, suggestion))
    }

    async fn consult(
        &self,
        advisory: &dyn AdvisoryClassifier,
        txn: &RawTransaction,
        suggestion: NormalizedTransaction,
    ) -> Result<NormalizedTransaction, AdvisoryError> {
        let request = AdvisoryRequest::from(txn);
        let answer = match tokio::time::timeout(self.timeout, advisory.classify(&request)).await {
            Ok(answer) => answer,
            Err(_) => Err(AdvisoryError::Timeout),
        };

        match answer {
            Ok(advice) => match validate::accept(&self.tables, txn, &suggestion, &advice) {
                Ok(accepted) => {
                    debug!(sr_no = txn.sr_no, category = %accepted.category, "advisory accepted");
                    Ok(accepted)
                }
                Err(reason) => {
                    debug!(sr_no = txn.sr_no, %reason, "advisory discarded");
                    Ok(suggestion)
                }
            },
            Err(e) if e.is_auth() => Err(e),
            Err(e) => {
                warn!(sr_no = txn.sr_no, error = %e, "advisory failed, falling back to rules");
                Ok(NormalizedTransaction {
                    confidence: FALLBACK_CONFIDENCE,
                    source: ClassificationSource::RulesFallback,
                    rationale: Some("Rule-based fallback".into()),
                    ..suggestion
                })
            }
        }
    }

    /// Normalize every row of one document over a bounded pool, keeping
    /// the original row order.
    pub async fn normalize_batch(
        &self,
        bank: BankIdentity,
        rows: &[RawTransaction],
    ) -> Result<Vec<StatementEntry>, AdvisoryError> {
        let mut done: Vec<(usize, StatementEntry)> = stream::iter(rows.iter().enumerate())
            .map(|(idx, txn)| async move {
                let normalized = self.normalize(txn).await?;
                Ok::<_, AdvisoryError>((
                    idx,
                    StatementEntry {
                        original: txn.clone(),
                        normalized,
                        bank,
                    },
                ))
            })
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await?;

        done.sort_by_key(|(idx, entry)| (entry.original.sr_no, *idx));
        info!(%bank, rows = done.len(), method = ?self.method(), "normalized statement rows");
        Ok(done.into_iter().map(|(_, entry)| entry).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankfusion_core::{Category, Channel};

    #[tokio::test]
    async fn test_rules_only_method() {
        let n = Normalizer::new(RuleTables::shared().unwrap());
        assert_eq!(n.method(), NormalizationMethod::RulesOnly);

        let txn = RawTransaction::from_amounts(1, "12/01/24", "ATM WDL CASH", 500.0, 0.0, Some(9_500.0)).unwrap();
        let out = n.normalize(&txn).await.unwrap();
        assert_eq!(out.category, Category::Cash);
        assert_eq!(out.channel, Channel::Atm);
        assert_eq!(out.source, ClassificationSource::Rules);
    }

    #[test]
    fn test_concurrency_floor() {
        let n = Normalizer::new(RuleTables::shared().unwrap()).with_concurrency(0);
        assert_eq!(n.concurrency, 1);
    }
}
