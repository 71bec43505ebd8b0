use tracing::{debug, info};

use crate::contract::TodoContract;
use crate::error::DappError;
use crate::provider::Eip1193;
use crate::task::TaskList;

pub struct TaskSynchronizer;

impl TaskSynchronizer {
    /// Reads the count, then every task one at a time in index order. Any
    /// failed read fails the whole reload so callers never see a partial
    /// list.
    #[tracing::instrument(skip_all, fields(contract = %contract.address()))]
    pub async fn reload<P: Eip1193>(
        contract: &TodoContract,
        provider: &P,
    ) -> Result<TaskList, DappError> {
        let count = contract.task_count(provider).await?;
        let mut reads = Vec::new();
        for index in 0..count {
            reads.push(contract.task(provider, index).await?);
        }
        debug!(count, "all task reads succeeded");
        let list = TaskList::from_reads(reads);
        info!(tasks = list.len(), open = list.open_count(), "task list synchronized");
        Ok(list)
    }
}
