use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

use crate::engine::error::EngineError;
use crate::ledger::locks::{KeyedLocks, ScopeGuard};
use crate::ledger::{Ledger, LedgerQuery, LedgerTx, LockScope};
use crate::model::leave_request::LeaveRequest;
use crate::model::request::{Decision, Request, RequestStatus};
use crate::model::wfh_request::{WfhRequest, WorkReport};

#[derive(Debug, Clone, Default)]
struct Store {
    leave: Vec<LeaveRequest>,
    wfh: Vec<WfhRequest>,
}

#[derive(Debug, Clone)]
enum Op {
    InsertLeave(LeaveRequest),
    InsertWfh(WfhRequest),
    Decide {
        id: Uuid,
        status: RequestStatus,
        decision: Decision,
    },
    AttachReport {
        id: Uuid,
        report: WorkReport,
    },
}

impl Store {
    fn find(&self, id: Uuid) -> Option<Request> {
        self.leave
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .map(Request::Leave)
            .or_else(|| self.wfh.iter().find(|r| r.id == id).cloned().map(Request::Wfh))
    }

    fn contains(&self, id: Uuid) -> bool {
        self.leave.iter().any(|r| r.id == id) || self.wfh.iter().any(|r| r.id == id)
    }

    /// Applies one write. Returns whether its precondition held.
    fn apply(&mut self, op: &Op) -> Result<bool, EngineError> {
        match op {
            Op::InsertLeave(request) => {
                if self.contains(request.id) {
                    return Err(EngineError::Storage(format!("duplicate request id {}", request.id)));
                }
                self.leave.push(request.clone());
                Ok(true)
            }
            Op::InsertWfh(request) => {
                if self.contains(request.id) {
                    return Err(EngineError::Storage(format!("duplicate request id {}", request.id)));
                }
                self.wfh.push(request.clone());
                Ok(true)
            }
            Op::Decide { id, status, decision } => {
                if let Some(leave) = self.leave.iter_mut().find(|r| r.id == *id) {
                    if leave.status != RequestStatus::Pending {
                        return Ok(false);
                    }
                    leave.status = *status;
                    leave.decision = Some(decision.clone());
                    return Ok(true);
                }
                if let Some(wfh) = self.wfh.iter_mut().find(|r| r.id == *id) {
                    if wfh.status != RequestStatus::Pending {
                        return Ok(false);
                    }
                    wfh.status = *status;
                    wfh.decision = Some(decision.clone());
                    return Ok(true);
                }
                Ok(false)
            }
            Op::AttachReport { id, report } => match self.wfh.iter_mut().find(|r| r.id == *id) {
                Some(wfh) if wfh.status == RequestStatus::Approved && wfh.work_report.is_none() => {
                    wfh.work_report = Some(report.clone());
                    Ok(true)
                }
                _ => Ok(false),
            },
        }
    }
}

/// Process-local ledger. Writes are staged per transaction and applied atomically on commit.
pub struct MemoryLedger {
    store: Arc<Mutex<Store>>,
    locks: KeyedLocks,
}

impl MemoryLedger {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            store: Arc::new(Mutex::new(Store::default())),
            locks: KeyedLocks::new(lock_timeout),
        }
    }
}

fn lock(store: &Mutex<Store>) -> Result<MutexGuard<'_, Store>, EngineError> {
    store
        .lock()
        .map_err(|_| EngineError::Storage("ledger store poisoned".to_string()))
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn begin(&self, scope: LockScope) -> Result<Box<dyn LedgerTx>, EngineError> {
        let guard = self.locks.acquire(&scope).await?;
        Ok(Box::new(MemoryTx {
            store: Arc::clone(&self.store),
            staged: Vec::new(),
            _guard: guard,
        }))
    }

    async fn leave_requests(&self, query: &LedgerQuery) -> Result<Vec<LeaveRequest>, EngineError> {
        let store = lock(&self.store)?;
        Ok(store.leave.iter().filter(|r| query.matches_leave(r)).cloned().collect())
    }

    async fn wfh_requests(&self, query: &LedgerQuery) -> Result<Vec<WfhRequest>, EngineError> {
        let store = lock(&self.store)?;
        Ok(store.wfh.iter().filter(|r| query.matches_wfh(r)).cloned().collect())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Request>, EngineError> {
        Ok(lock(&self.store)?.find(id))
    }
}

struct MemoryTx {
    store: Arc<Mutex<Store>>,
    staged: Vec<Op>,
    _guard: ScopeGuard,
}

impl MemoryTx {
    /// Committed state with this transaction's staged writes on top.
    fn view(&self) -> Result<Store, EngineError> {
        let mut view = lock(&self.store)?.clone();
        for op in &self.staged {
            view.apply(op)?;
        }
        Ok(view)
    }

    /// Stages `op` if its precondition holds against the current view.
    fn stage(&mut self, op: Op) -> Result<bool, EngineError> {
        let applied = self.view()?.apply(&op)?;
        if applied {
            self.staged.push(op);
        }
        Ok(applied)
    }
}

#[async_trait]
impl LedgerTx for MemoryTx {
    async fn leave_requests(&mut self, query: &LedgerQuery) -> Result<Vec<LeaveRequest>, EngineError> {
        Ok(self.view()?.leave.into_iter().filter(|r| query.matches_leave(r)).collect())
    }

    async fn wfh_requests(&mut self, query: &LedgerQuery) -> Result<Vec<WfhRequest>, EngineError> {
        Ok(self.view()?.wfh.into_iter().filter(|r| query.matches_wfh(r)).collect())
    }

    async fn find(&mut self, id: Uuid) -> Result<Option<Request>, EngineError> {
        Ok(self.view()?.find(id))
    }

    async fn insert_leave(&mut self, request: &LeaveRequest) -> Result<(), EngineError> {
        self.stage(Op::InsertLeave(request.clone())).map(|_| ())
    }

    async fn insert_wfh(&mut self, request: &WfhRequest) -> Result<(), EngineError> {
        self.stage(Op::InsertWfh(request.clone())).map(|_| ())
    }

    async fn decide(&mut self, id: Uuid, status: RequestStatus, decision: &Decision) -> Result<bool, EngineError> {
        self.stage(Op::Decide {
            id,
            status,
            decision: decision.clone(),
        })
    }

    async fn attach_work_report(&mut self, id: Uuid, report: &WorkReport) -> Result<bool, EngineError> {
        self.stage(Op::AttachReport {
            id,
            report: report.clone(),
        })
    }

    async fn commit(self: Box<Self>) -> Result<(), EngineError> {
        let mut store = lock(&self.store)?;
        // all-or-nothing: apply to a copy, swap in only if every precondition still holds
        let mut next = store.clone();
        for op in &self.staged {
            if !next.apply(op)? {
                return Err(EngineError::ConcurrentModification);
            }
        }
        *store = next;
        Ok(())
    }
}
