//! # Local-First Ledger Store
//!
//! [`ChitLedger`] owns the snapshot of one installation and is the only way
//! to change it. Every successful mutation ends in [`ChitLedger::mark_dirty`],
//! which writes the whole snapshot to local storage before returning and then
//! notifies dirty-state subscribers. Local storage is the source of truth; the
//! remote is a mirror that [`ChitLedger::sync`] pushes to on demand.
//!
//! Operations that are refused (validation, allotment conflicts) change
//! nothing and do not mark the ledger dirty. No-ops such as joining a group
//! twice or revoking an already revoked allotment do not either.
//!
//! Sync is single-flight and bounded by a timeout. It clears the dirty flag
//! only when no mutation happened while the push was in flight, so a change
//! made during a sync is never reported as synced.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, Utc};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::domain::allotment_service::AllotmentService;
use crate::domain::commands::allotment::{ConfirmAllotmentCommand, RevokeOutcome};
use crate::domain::commands::chit::CreateChitGroupCommand;
use crate::domain::commands::member::{
    AddMembershipCommand, BulkImportResult, BulkImportRow, CreateMemberCommand, CreateMemberResult,
    MembershipOutcome,
};
use crate::domain::commands::payment::{PaymentOutcome, RecordPaymentCommand};
use crate::domain::member_service::MemberService;
use crate::domain::models::{
    build_chit_group, generate_id, AllotmentError, ChitGroupValidationError, LedgerSnapshot,
    MemberValidationError, PaymentValidationError, SyncError,
};
use crate::domain::payment_service::PaymentService;
use crate::domain::report_service::ReportService;
use crate::domain::schedule_service::ScheduleService;
use crate::domain::status_resolver::StatusResolver;
use crate::storage::traits::{RemoteStore, SnapshotStorage};
use shared::{
    Allotment, AllotmentCandidates, ChitGroup, DashboardSummary, GroupMembership,
    InstallmentSchedule, InstallmentStatus, MasterSettings, Member, MemberLedgerResponse,
    OutstandingRow, Payment, User,
};

pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(30);

struct LedgerState {
    snapshot: LedgerSnapshot,
    dirty: bool,
    has_loaded: bool,
    /// Bumped by every mark_dirty
    generation: u64,
    last_synced_at: Option<DateTime<Utc>>,
}

/// Resets the single-flight flag when a sync ends, however it ends.
struct SyncFlight<'a>(&'a AtomicBool);

impl Drop for SyncFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct ChitLedger {
    state: Arc<Mutex<LedgerState>>,
    storage: Arc<dyn SnapshotStorage>,
    remote: Option<Arc<dyn RemoteStore>>,
    dirty_tx: Arc<watch::Sender<bool>>,
    sync_in_flight: Arc<AtomicBool>,
    sync_timeout: Duration,
    member_service: MemberService,
    payment_service: PaymentService,
    allotment_service: AllotmentService,
    resolver: StatusResolver,
    report_service: ReportService,
}

impl ChitLedger {
    /// Load the ledger from storage.
    ///
    /// Never fails: an empty or unreadable store is replaced by the seeded
    /// default, which is written back at once so the next start finds a
    /// valid document.
    pub fn open(
        storage: Arc<dyn SnapshotStorage>,
        remote: Option<Arc<dyn RemoteStore>>,
        sync_timeout: Duration,
    ) -> Self {
        let (snapshot, needs_write) = match storage.load_snapshot() {
            Ok(Some(mut snapshot)) => {
                if snapshot.users.is_empty() {
                    info!("Stored ledger has no users, seeding the default administrator");
                    snapshot.users = LedgerSnapshot::default_users();
                    (snapshot, true)
                } else {
                    (snapshot, false)
                }
            }
            Ok(None) => {
                info!("No stored ledger found, starting from the seeded default");
                (LedgerSnapshot::seeded(), true)
            }
            Err(e) => {
                error!("Stored ledger is unreadable, starting from the seeded default: {:#}", e);
                (LedgerSnapshot::seeded(), true)
            }
        };

        if needs_write {
            if let Err(e) = storage.save_snapshot(&snapshot) {
                error!("Failed to persist the seeded ledger: {:#}", e);
            }
        }

        let last_synced_at = storage.load_last_sync().unwrap_or_else(|e| {
            warn!("Ignoring unreadable last sync time: {:#}", e);
            None
        });

        // Changes saved after the last successful push are still unsynced.
        let dirty = match (snapshot.last_modified_at, last_synced_at) {
            (Some(modified), Some(synced)) => modified > synced,
            (Some(_), None) => true,
            (None, _) => false,
        };

        info!(
            "Ledger loaded: {} chits, {} members, {} installments{}",
            snapshot.chits.len(),
            snapshot.members.len(),
            snapshot.installments.len(),
            if dirty { ", with unsynced changes" } else { "" }
        );

        let (dirty_tx, _) = watch::channel(dirty);
        let schedule_service = ScheduleService::new();
        let resolver = StatusResolver::new();

        Self {
            state: Arc::new(Mutex::new(LedgerState {
                snapshot,
                dirty,
                has_loaded: true,
                generation: 0,
                last_synced_at,
            })),
            storage,
            remote,
            dirty_tx: Arc::new(dirty_tx),
            sync_in_flight: Arc::new(AtomicBool::new(false)),
            sync_timeout,
            member_service: MemberService::new(schedule_service),
            payment_service: PaymentService::new(),
            allotment_service: AllotmentService::new(),
            report_service: ReportService::new(resolver.clone()),
            resolver,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    // ---- dirty tracking -------------------------------------------------

    /// Flag unsynced changes, persist the snapshot and notify subscribers.
    pub fn mark_dirty(&self) {
        let mut state = self.lock();
        self.mark_dirty_locked(&mut state);
    }

    fn mark_dirty_locked(&self, state: &mut LedgerState) {
        state.dirty = true;
        state.generation += 1;
        state.snapshot.last_modified_at = Some(Utc::now());
        // The in-memory snapshot stays authoritative when the write fails.
        if let Err(e) = self.storage.save_snapshot(&state.snapshot) {
            error!("Failed to persist ledger snapshot: {:#}", e);
        }
        self.dirty_tx.send_replace(true);
    }

    pub fn is_dirty(&self) -> bool {
        self.lock().dirty
    }

    pub fn is_ready(&self) -> bool {
        self.lock().has_loaded
    }

    /// Receiver of the dirty flag. Any number of subscribers may exist.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.dirty_tx.subscribe()
    }

    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.lock().last_synced_at
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    // ---- mutations ------------------------------------------------------

    pub fn create_chit_group(
        &self,
        command: CreateChitGroupCommand,
    ) -> Result<ChitGroup, ChitGroupValidationError> {
        let group = build_chit_group(&command)?;
        let mut state = self.lock();
        state.snapshot.chits.push(group.clone());
        info!("Created chit group {} ({})", group.name, group.id);
        self.mark_dirty_locked(&mut state);
        Ok(group)
    }

    /// Create a member, joining the given group in the same operation.
    pub fn create_member(&self, command: CreateMemberCommand) -> Result<CreateMemberResult> {
        let member = self.member_service.build_member(&command)?;
        let mut state = self.lock();
        if let Some(group_id) = &command.chit_group_id {
            if state.snapshot.find_chit(group_id).is_none() {
                return Err(ChitGroupValidationError::NotFound(group_id.clone()).into());
            }
        }

        state.snapshot.members.push(member.clone());
        let membership = command.chit_group_id.as_deref().map(|group_id| {
            self.member_service
                .add_membership(&mut state.snapshot, group_id, &member.id, Self::today())
        });
        info!("Created member {} ({})", member.name, member.id);
        self.mark_dirty_locked(&mut state);
        Ok(CreateMemberResult { member, membership })
    }

    /// Join a member to a group. Both must exist; joining twice is a no-op.
    pub fn add_membership(&self, command: AddMembershipCommand) -> Result<MembershipOutcome> {
        let mut state = self.lock();
        if state.snapshot.find_chit(&command.chit_group_id).is_none() {
            return Err(ChitGroupValidationError::NotFound(command.chit_group_id).into());
        }
        if state.snapshot.find_member(&command.member_id).is_none() {
            return Err(MemberValidationError::NotFound(command.member_id).into());
        }

        let outcome = self.member_service.add_membership(
            &mut state.snapshot,
            &command.chit_group_id,
            &command.member_id,
            command.joined_on.unwrap_or_else(Self::today),
        );
        if outcome.is_created() {
            self.mark_dirty_locked(&mut state);
        }
        Ok(outcome)
    }

    /// Import members leniently, joining each to the group when one is given.
    /// Marks the ledger dirty once for the whole batch.
    pub fn bulk_add_members(
        &self,
        rows: &[BulkImportRow],
        chit_group_id: Option<&str>,
    ) -> Result<BulkImportResult, ChitGroupValidationError> {
        let mut state = self.lock();
        if let Some(group_id) = chit_group_id {
            if state.snapshot.find_chit(group_id).is_none() {
                return Err(ChitGroupValidationError::NotFound(group_id.to_string()));
            }
        }

        let today = Self::today();
        let mut members = Vec::with_capacity(rows.len());
        let mut memberships_created = 0;
        for row in rows {
            let member = self.member_service.member_from_row(row);
            state.snapshot.members.push(member.clone());
            if let Some(group_id) = chit_group_id {
                let outcome =
                    self.member_service
                        .add_membership(&mut state.snapshot, group_id, &member.id, today);
                if outcome.is_created() {
                    memberships_created += 1;
                }
            }
            members.push(member);
        }

        if !members.is_empty() {
            info!("Imported {} members", members.len());
            self.mark_dirty_locked(&mut state);
        }
        Ok(BulkImportResult {
            members,
            memberships_created,
        })
    }

    /// Parse CSV text and import the rows.
    pub fn import_members_csv(&self, text: &str, chit_group_id: Option<&str>) -> Result<BulkImportResult> {
        let rows = self.member_service.parse_bulk_csv(text)?;
        Ok(self.bulk_add_members(&rows, chit_group_id)?)
    }

    /// Log a payment and apply it to its installment.
    ///
    /// A payment with no matching installment is still logged and the
    /// outcome carries no schedule.
    pub fn record_payment(&self, command: RecordPaymentCommand) -> Result<PaymentOutcome, PaymentValidationError> {
        self.payment_service
            .validate(command.paid_amount, command.month_no)?;

        let mut state = self.lock();
        if let Some(group) = state.snapshot.find_chit(&command.chit_group_id) {
            if command.month_no > group.total_months {
                return Err(PaymentValidationError::InvalidMonth);
            }
        }

        let payment = Payment {
            id: generate_id("payment"),
            chit_group_id: command.chit_group_id,
            member_id: command.member_id,
            month_no: command.month_no,
            paid_amount: command.paid_amount,
            payment_date: command.payment_date.unwrap_or_else(Self::today),
        };
        let schedule = self
            .payment_service
            .record_payment(&mut state.snapshot, payment.clone());
        self.mark_dirty_locked(&mut state);
        Ok(PaymentOutcome { payment, schedule })
    }

    pub fn confirm_allotment(&self, command: ConfirmAllotmentCommand) -> Result<Allotment, AllotmentError> {
        let mut state = self.lock();
        let allotment = self
            .allotment_service
            .confirm(&mut state.snapshot, command, Utc::now())?;
        self.mark_dirty_locked(&mut state);
        Ok(allotment)
    }

    pub fn revoke_allotment(&self, allotment_id: &str) -> RevokeOutcome {
        let mut state = self.lock();
        let outcome = self.allotment_service.revoke(&mut state.snapshot, allotment_id);
        if matches!(outcome, RevokeOutcome::Revoked(_)) {
            self.mark_dirty_locked(&mut state);
        }
        outcome
    }

    // ---- reads ----------------------------------------------------------

    /// Copy of the whole snapshot
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.lock().snapshot.clone()
    }

    pub fn users(&self) -> Vec<User> {
        self.lock().snapshot.users.clone()
    }

    pub fn settings(&self) -> MasterSettings {
        self.lock().snapshot.settings.clone()
    }

    pub fn chit_groups(&self) -> Vec<ChitGroup> {
        self.lock().snapshot.chits.clone()
    }

    pub fn chit_group(&self, chit_group_id: &str) -> Option<ChitGroup> {
        self.lock().snapshot.find_chit(chit_group_id).cloned()
    }

    pub fn members(&self) -> Vec<Member> {
        self.lock().snapshot.members.clone()
    }

    pub fn member(&self, member_id: &str) -> Option<Member> {
        self.lock().snapshot.find_member(member_id).cloned()
    }

    /// Memberships, optionally of one group, in token order
    pub fn memberships(&self, chit_group_id: Option<&str>) -> Vec<GroupMembership> {
        let state = self.lock();
        let mut memberships: Vec<_> = state
            .snapshot
            .memberships
            .iter()
            .filter(|m| chit_group_id.map_or(true, |g| g == m.chit_group_id))
            .cloned()
            .collect();
        memberships.sort_by(|a, b| a.chit_group_id.cmp(&b.chit_group_id).then(a.token_no.cmp(&b.token_no)));
        memberships
    }

    pub fn installments(&self) -> Vec<InstallmentSchedule> {
        self.lock().snapshot.installments.clone()
    }

    /// A member's schedule in a group, by month
    pub fn schedule_for(&self, chit_group_id: &str, member_id: &str) -> Vec<InstallmentSchedule> {
        let state = self.lock();
        let mut schedule: Vec<_> = state
            .snapshot
            .installments
            .iter()
            .filter(|s| s.chit_group_id == chit_group_id && s.member_id == member_id)
            .cloned()
            .collect();
        schedule.sort_by_key(|s| s.month_no);
        schedule
    }

    pub fn payments(&self, chit_group_id: Option<&str>) -> Vec<Payment> {
        self.lock()
            .snapshot
            .payments
            .iter()
            .filter(|p| chit_group_id.map_or(true, |g| g == p.chit_group_id))
            .cloned()
            .collect()
    }

    pub fn allotments(&self) -> Vec<Allotment> {
        self.lock().snapshot.allotments.clone()
    }

    pub fn resolve_status(&self, chit_group_id: &str, member_id: &str, month_no: u32) -> InstallmentStatus {
        self.resolver
            .resolve(&self.lock().snapshot, chit_group_id, member_id, month_no)
    }

    pub fn outstanding_report(&self, chit_group_id: &str) -> Vec<OutstandingRow> {
        self.report_service
            .outstanding_report(&self.lock().snapshot, chit_group_id)
    }

    pub fn member_ledger(&self, chit_group_id: &str, member_id: &str) -> MemberLedgerResponse {
        self.report_service
            .member_ledger(&self.lock().snapshot, chit_group_id, member_id)
    }

    pub fn dashboard_summary(&self, chit_group_id: Option<&str>, month_no: Option<u32>) -> DashboardSummary {
        self.report_service
            .dashboard_summary(&self.lock().snapshot, chit_group_id, month_no)
    }

    pub fn allotment_candidates(&self, chit_group_id: &str) -> AllotmentCandidates {
        self.allotment_service
            .candidates(&self.lock().snapshot, chit_group_id)
    }

    pub fn allotment_register(&self, chit_group_id: &str) -> Vec<Allotment> {
        self.allotment_service
            .register(&self.lock().snapshot, chit_group_id)
    }

    // ---- sync -----------------------------------------------------------

    /// Push the snapshot to the remote.
    ///
    /// On success the last sync time is recorded and the dirty flag cleared,
    /// unless the ledger changed while the push was in flight. On any
    /// failure local state is left exactly as it was.
    pub async fn sync(&self) -> Result<DateTime<Utc>, SyncError> {
        let remote = self.remote.clone().ok_or(SyncError::NoRemote)?;
        if !remote.is_online() {
            info!("Remote is offline, changes stay local");
            return Err(SyncError::Offline);
        }
        if self
            .sync_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Sync requested while another is running");
            return Err(SyncError::InFlight);
        }
        let _flight = SyncFlight(&self.sync_in_flight);

        // The recorded sync time is when the pushed copy was taken, so any
        // change made after it reads as unsynced on the next start.
        let (snapshot, generation, taken_at) = {
            let state = self.lock();
            (state.snapshot.clone(), state.generation, Utc::now())
        };

        match tokio::time::timeout(self.sync_timeout, remote.push(&snapshot)).await {
            Err(_) => {
                warn!("Remote push timed out after {:?}", self.sync_timeout);
                Err(SyncError::TimedOut(self.sync_timeout))
            }
            Ok(Err(e)) => {
                warn!("Remote push failed: {:#}", e);
                Err(SyncError::Rejected(format!("{:#}", e)))
            }
            Ok(Ok(())) => {
                let synced_at = taken_at;
                let mut state = self.lock();
                state.last_synced_at = Some(synced_at);
                if let Err(e) = self.storage.save_last_sync(synced_at) {
                    error!("Failed to persist last sync time: {:#}", e);
                }
                if state.generation != generation {
                    info!("Ledger changed during sync, keeping it dirty");
                } else if state.dirty {
                    state.dirty = false;
                    self.dirty_tx.send_replace(false);
                }
                info!("Ledger synced at {}", synced_at);
                Ok(synced_at)
            }
        }
    }
}
