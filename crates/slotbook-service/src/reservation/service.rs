//! Reservation lifecycle service.
//!
//! ```text
//! pending ──► confirmed ──► completed
//!    │            │
//!    ├──► expired └──► cancelled
//!    └──► cancelled
//! ```
//!
//! Operations that can create or re-assert slot occupancy (`create`,
//! `extend`, successful settlement) run inside a slot transaction holding
//! the venue-date lock. Operations that only release occupancy or touch
//! one record (`confirm_code`, `cancel`, `expire`, failed settlement,
//! completion) use an optimistic version check instead.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use slotbook_core::config::BookingConfig;
use slotbook_core::error::AppError;
use slotbook_core::result::AppResult;
use slotbook_core::traits::{Clock, Notification, Notifier};
use slotbook_core::types::id::ReservationId;
use slotbook_core::types::pagination::{PageRequest, PageResponse};
use slotbook_database::store::ReservationStore;
use slotbook_entity::reservation::{
    ConfirmationPolicy, NewReservation, PaymentStatus, Reservation, ReservationStatus, TimeSlot,
    minutes_until, to_local,
};

use super::cancellation::{CancellationPolicy, RefundTier};
use super::code;
use super::request::{CreateReservationRequest, SettlementOutcome, SettlementResult};
use crate::availability::ConflictDetector;
use crate::context::RequestContext;
use crate::notification;
use crate::pricing::PriceSchedule;
use crate::venue::VenueDirectory;

/// Re-reads allowed when a concurrent writer bumps the version first.
const MAX_WRITE_ATTEMPTS: usize = 3;

/// Outcome of one auto-complete pass.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CompletionSummary {
    pub completed: u64,
    pub failed: u64,
}

/// Drives reservations through their lifecycle.
#[derive(Debug, Clone)]
pub struct ReservationService {
    store: Arc<dyn ReservationStore>,
    venues: Arc<dyn VenueDirectory>,
    pricing: Arc<PriceSchedule>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: BookingConfig,
    cancellation: CancellationPolicy,
    detector: ConflictDetector,
}

impl ReservationService {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        venues: Arc<dyn VenueDirectory>,
        pricing: Arc<PriceSchedule>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: BookingConfig,
    ) -> Self {
        let cancellation = CancellationPolicy::from_config(&config.cancellation);
        Self {
            store,
            venues,
            pricing,
            notifier,
            clock,
            config,
            cancellation,
            detector: ConflictDetector::new(),
        }
    }

    /// Place a pending hold on a slot.
    ///
    /// Fails with `SlotConflict` when any active reservation or blocked
    /// override overlaps the interval. With [`ConfirmationPolicy::CodeGated`]
    /// a one-time code is issued on its own, shorter timer.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        req: CreateReservationRequest,
    ) -> AppResult<Reservation> {
        let slot = TimeSlot::new(req.start_time, req.end_time)?;
        self.validate_request(&req, &slot)?;

        let local_now = to_local(self.clock.now(), self.config.utc_offset_minutes);
        if req.booking_date.and_time(req.start_time) <= local_now {
            return Err(AppError::validation(
                "The requested slot has already started, please choose another time",
            ));
        }

        let amount = match req.amount {
            Some(amount) => amount,
            None => self.quote(&req, &slot).await?,
        };
        let currency = req
            .currency
            .clone()
            .unwrap_or_else(|| self.config.default_currency.clone());

        let mut tx = self.store.begin_slot(req.venue_id, req.booking_date).await?;
        let now = self.clock.now();

        let report = self
            .detector
            .check_locked(&mut *tx, &slot, None, now)
            .await?;
        if !report.is_available() {
            info!(
                venue_id = %req.venue_id,
                date = %req.booking_date,
                start = %slot.start(),
                end = %slot.end(),
                conflicts = ?report.conflicting_ids(),
                blocked = report.blocked.len(),
                "Slot conflict"
            );
            return Err(AppError::slot_conflict(
                "The requested time is no longer available, please choose another time",
            ));
        }

        let (otp_code, otp_expires_at) = match req.confirmation_policy {
            ConfirmationPolicy::Direct => (None, None),
            ConfirmationPolicy::CodeGated => (
                Some(code::generate(self.config.code_length)),
                Some(now + Duration::minutes(self.config.code_window_minutes)),
            ),
        };

        let new = NewReservation {
            id: ReservationId::new(),
            venue_id: req.venue_id,
            user_id: ctx.user_id,
            booking_date: req.booking_date,
            slot,
            player_count: req.player_count,
            confirmation_policy: req.confirmation_policy,
            reservation_expires_at: now
                + Duration::minutes(self.config.reservation_window_minutes),
            otp_code,
            otp_expires_at,
            amount,
            currency,
        };

        let created = tx.insert(new, now).await?;
        tx.commit().await?;

        info!(
            reservation_id = %created.id,
            user_id = %created.user_id,
            venue_id = %created.venue_id,
            date = %created.booking_date,
            start = %created.start_time,
            end = %created.end_time,
            policy = %created.confirmation_policy,
            "Reservation created"
        );

        if let Some(expires_at) = created.reservation_expires_at {
            let message = match (&created.otp_code, created.otp_expires_at) {
                (Some(code), Some(code_expires_at)) => Notification::CodeIssued {
                    reservation_id: created.id,
                    user_id: created.user_id,
                    code: code.clone(),
                    expires_at: code_expires_at,
                },
                _ => Notification::HoldPlaced {
                    reservation_id: created.id,
                    user_id: created.user_id,
                    expires_at,
                },
            };
            notification::dispatch(&self.notifier, message);
        }

        Ok(created)
    }

    /// Submit the one-time code of a code-gated reservation.
    ///
    /// Success sets the verified flag and clears the code. The status stays
    /// `pending` and the hold deadline is untouched.
    pub async fn confirm_code(
        &self,
        ctx: &RequestContext,
        id: ReservationId,
        submitted: &str,
    ) -> AppResult<Reservation> {
        let (reservation, _) = self
            .update_with(id, |current, now| {
                ctx.ensure_can_access(current)?;
                if current.status != ReservationStatus::Pending {
                    return Err(AppError::invalid_transition(format!(
                        "Reservation is {}; only pending reservations accept a confirmation code",
                        current.status
                    )));
                }
                if current.confirmation_policy != ConfirmationPolicy::CodeGated {
                    return Err(AppError::invalid_transition(
                        "Reservation does not use a confirmation code",
                    ));
                }
                let (Some(expected), Some(expires_at)) =
                    (current.otp_code.as_deref(), current.otp_expires_at)
                else {
                    return Err(AppError::invalid_code("No confirmation code is outstanding"));
                };
                if expires_at <= now {
                    return Err(AppError::code_expired("Confirmation code has expired"));
                }
                if !code::matches(expected, submitted) {
                    return Err(AppError::invalid_code("Invalid confirmation code"));
                }

                let mut updated = current.clone();
                updated.otp_code = None;
                updated.otp_expires_at = None;
                updated.confirmation_verified = true;
                Ok(Some(updated))
            })
            .await?;

        info!(reservation_id = %id, user_id = %ctx.user_id, "Confirmation code verified");
        notification::dispatch(
            &self.notifier,
            Notification::CodeVerified {
                reservation_id: reservation.id,
                user_id: reservation.user_id,
            },
        );
        Ok(reservation)
    }

    /// Issue a fresh code for a code-gated reservation that is still held
    /// and not yet verified. The hold deadline is untouched.
    pub async fn resend_code(
        &self,
        ctx: &RequestContext,
        id: ReservationId,
    ) -> AppResult<Reservation> {
        let (reservation, _) = self
            .update_with(id, |current, now| {
                ctx.ensure_can_access(current)?;
                if current.confirmation_policy != ConfirmationPolicy::CodeGated
                    || current.confirmation_verified
                {
                    return Err(AppError::invalid_transition(
                        "Reservation has no confirmation code to resend",
                    ));
                }
                if !current.is_active(now) {
                    return Err(AppError::invalid_transition(
                        "Reservation is no longer held, please choose another time",
                    ));
                }

                let mut updated = current.clone();
                updated.otp_code = Some(code::generate(self.config.code_length));
                updated.otp_expires_at =
                    Some(now + Duration::minutes(self.config.code_window_minutes));
                Ok(Some(updated))
            })
            .await?;

        if let (Some(code), Some(expires_at)) = (&reservation.otp_code, reservation.otp_expires_at)
        {
            info!(reservation_id = %id, "Confirmation code reissued");
            notification::dispatch(
                &self.notifier,
                Notification::CodeIssued {
                    reservation_id: reservation.id,
                    user_id: reservation.user_id,
                    code: code.clone(),
                    expires_at,
                },
            );
        }
        Ok(reservation)
    }

    /// A reservation the actor may pay for right now.
    ///
    /// Must be pending with a live hold; a code-gated reservation must have
    /// been verified first.
    pub async fn payable(&self, ctx: &RequestContext, id: ReservationId) -> AppResult<Reservation> {
        let reservation = self.find(id).await?;
        ctx.ensure_can_access(&reservation)?;

        if reservation.status != ReservationStatus::Pending {
            return Err(AppError::invalid_transition(format!(
                "Reservation is {} and cannot be paid",
                reservation.status
            )));
        }
        if !reservation.is_active(self.clock.now()) {
            return Err(AppError::invalid_transition(
                "Reservation has expired, please choose another time",
            ));
        }
        if reservation.confirmation_policy == ConfirmationPolicy::CodeGated
            && !reservation.confirmation_verified
        {
            return Err(AppError::invalid_transition(
                "The confirmation code must be verified before payment",
            ));
        }
        Ok(reservation)
    }

    /// Apply the gateway's terminal outcome.
    ///
    /// Idempotent: a reservation that is no longer pending is returned
    /// unchanged with `applied = false` and nothing is written.
    pub async fn settle_payment(
        &self,
        id: ReservationId,
        outcome: SettlementOutcome,
        external_ref: Option<String>,
    ) -> AppResult<SettlementResult> {
        let result = match outcome {
            SettlementOutcome::Success => self.settle_success(id, external_ref).await?,
            _ => {
                let (reservation, applied) = self
                    .update_with(id, |current, now| {
                        if current.status != ReservationStatus::Pending {
                            return Ok(None);
                        }
                        let mut updated = current.clone();
                        updated.status = ReservationStatus::Cancelled;
                        updated.payment_status = outcome.payment_status();
                        updated.payment_reference = external_ref.clone();
                        updated.cancelled_at = Some(now);
                        updated.cancellation_reason = Some(format!("payment {}", outcome.as_str()));
                        if outcome == SettlementOutcome::Chargedback {
                            updated.refund_amount = Some(current.amount);
                        }
                        Ok(Some(updated))
                    })
                    .await?;
                SettlementResult {
                    reservation,
                    applied,
                }
            }
        };

        if result.applied {
            info!(
                reservation_id = %id,
                outcome = outcome.as_str(),
                status = %result.reservation.status,
                payment_status = %result.reservation.payment_status,
                "Payment settled"
            );
        } else {
            info!(
                reservation_id = %id,
                outcome = outcome.as_str(),
                status = %result.reservation.status,
                "Duplicate or late settlement ignored"
            );
        }
        Ok(result)
    }

    async fn settle_success(
        &self,
        id: ReservationId,
        external_ref: Option<String>,
    ) -> AppResult<SettlementResult> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let snapshot = self.find(id).await?;
            if snapshot.status != ReservationStatus::Pending {
                return Ok(SettlementResult {
                    reservation: snapshot,
                    applied: false,
                });
            }

            let mut tx = self
                .store
                .begin_slot(snapshot.venue_id, snapshot.booking_date)
                .await?;
            let now = self.clock.now();
            let current = tx.find(id).await?.ok_or_else(|| not_found(id))?;
            if current.status != ReservationStatus::Pending {
                return Ok(SettlementResult {
                    reservation: current,
                    applied: false,
                });
            }

            // A lapsed hold may have been taken over while payment was in flight.
            let still_held = current.is_active(now)
                || self
                    .detector
                    .check_locked(&mut *tx, &current.slot(), Some(id), now)
                    .await?
                    .is_available();

            let mut updated = current.clone();
            updated.payment_status = PaymentStatus::Paid;
            updated.payment_reference = external_ref.clone();
            if still_held {
                updated.status = ReservationStatus::Confirmed;
                updated.reservation_expires_at = None;
            } else {
                warn!(
                    reservation_id = %id,
                    "Payment arrived after the slot was rebooked; cancelling with full refund"
                );
                updated.status = ReservationStatus::Cancelled;
                updated.cancelled_at = Some(now);
                updated.cancellation_reason =
                    Some("slot released before payment settled".to_string());
                updated.refund_amount = Some(current.amount);
            }
            updated.touch(now);

            if tx.save(&updated, current.version).await? {
                tx.commit().await?;
                if updated.status == ReservationStatus::Confirmed {
                    notification::dispatch(
                        &self.notifier,
                        Notification::BookingConfirmed {
                            reservation_id: updated.id,
                            user_id: updated.user_id,
                        },
                    );
                }
                return Ok(SettlementResult {
                    reservation: updated,
                    applied: true,
                });
            }
            debug!(reservation_id = %id, attempt, "Concurrent write during settlement, re-reading");
        }
        Err(write_contention(id))
    }

    /// Cancel a pending or confirmed reservation.
    ///
    /// The refund is computed from the time left until the booking starts
    /// and only applies to paid reservations. Inside the no-refund window
    /// only elevated actors may cancel.
    pub async fn cancel(
        &self,
        ctx: &RequestContext,
        id: ReservationId,
        reason: Option<String>,
    ) -> AppResult<Reservation> {
        let (reservation, _) = self
            .update_with(id, |current, now| {
                ctx.ensure_can_access(current)?;
                if !current.status.can_transition_to(ReservationStatus::Cancelled) {
                    return Err(AppError::invalid_transition(format!(
                        "Reservation is {} and cannot be cancelled",
                        current.status
                    )));
                }

                let local_now = to_local(now, self.config.utc_offset_minutes);
                let tier = self
                    .cancellation
                    .tier(minutes_until(local_now, current.starts_at_local()));
                if tier == RefundTier::None && !ctx.is_elevated() {
                    return Err(AppError::unauthorized(
                        "This booking starts too soon to cancel online; please contact the venue",
                    ));
                }
                let refund = if current.payment_status == PaymentStatus::Paid {
                    self.cancellation.refund(tier, current.amount)
                } else {
                    Decimal::ZERO
                };

                let mut updated = current.clone();
                updated.status = ReservationStatus::Cancelled;
                updated.cancelled_at = Some(now);
                updated.cancelled_by = Some(ctx.user_id);
                updated.cancellation_reason = reason.clone();
                updated.refund_amount = Some(refund);
                Ok(Some(updated))
            })
            .await?;

        info!(
            reservation_id = %id,
            cancelled_by = %ctx.user_id,
            refund = %reservation.refund_amount.unwrap_or_default(),
            "Reservation cancelled"
        );
        Ok(reservation)
    }

    /// Push the hold deadline of an active pending reservation forward.
    ///
    /// Returns the record unchanged when it is not pending or its hold has
    /// already lapsed.
    pub async fn extend(
        &self,
        ctx: &RequestContext,
        id: ReservationId,
        minutes: i64,
    ) -> AppResult<Reservation> {
        if minutes <= 0 || minutes > self.config.max_extension_minutes {
            return Err(AppError::validation(format!(
                "Extension must be between 1 and {} minutes",
                self.config.max_extension_minutes
            )));
        }

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let snapshot = self.find(id).await?;
            ctx.ensure_can_access(&snapshot)?;
            if snapshot.status != ReservationStatus::Pending {
                return Ok(snapshot);
            }

            let mut tx = self
                .store
                .begin_slot(snapshot.venue_id, snapshot.booking_date)
                .await?;
            let now = self.clock.now();
            let current = tx.find(id).await?.ok_or_else(|| not_found(id))?;
            let expires_at = match current.reservation_expires_at {
                Some(at) if current.is_active(now) => at,
                _ => return Ok(current),
            };

            let mut updated = current.clone();
            updated.reservation_expires_at = Some(expires_at + Duration::minutes(minutes));
            updated.touch(now);

            if tx.save(&updated, current.version).await? {
                tx.commit().await?;
                info!(
                    reservation_id = %id,
                    expires_at = ?updated.reservation_expires_at,
                    "Reservation hold extended"
                );
                return Ok(updated);
            }
            debug!(reservation_id = %id, attempt, "Concurrent write during extension, re-reading");
        }
        Err(write_contention(id))
    }

    /// Expire a pending reservation whose hold deadline has passed.
    ///
    /// Returns `false` without writing for anything else, so redundant or
    /// racing calls are harmless.
    pub async fn expire(&self, id: ReservationId) -> AppResult<bool> {
        let (_, changed) = self
            .update_with(id, |current, now| {
                if !current.is_lapsed(now) {
                    return Ok(None);
                }
                let mut updated = current.clone();
                updated.status = ReservationStatus::Expired;
                Ok(Some(updated))
            })
            .await?;

        if changed {
            info!(reservation_id = %id, "Reservation expired");
        }
        Ok(changed)
    }

    /// Complete a confirmed reservation whose interval is over.
    pub async fn complete(&self, id: ReservationId) -> AppResult<bool> {
        let offset = self.config.utc_offset_minutes;
        let (_, changed) = self
            .update_with(id, |current, now| {
                if current.status != ReservationStatus::Confirmed
                    || !current.has_finished(to_local(now, offset))
                {
                    return Ok(None);
                }
                let mut updated = current.clone();
                updated.status = ReservationStatus::Completed;
                Ok(Some(updated))
            })
            .await?;

        if changed {
            info!(reservation_id = %id, "Reservation completed");
        }
        Ok(changed)
    }

    /// Complete every confirmed reservation whose interval is over, fetching
    /// `batch_size` records at a time. A failure on one record is logged and
    /// skipped; it is not fetched again within the same pass.
    pub async fn auto_complete(&self, batch_size: i64) -> AppResult<CompletionSummary> {
        let batch_size = batch_size.max(1);
        let local_now = to_local(self.clock.now(), self.config.utc_offset_minutes);

        let mut summary = CompletionSummary::default();
        let mut tried: HashSet<ReservationId> = HashSet::new();
        loop {
            // Rows that failed earlier in this pass come back first; widen
            // the window so they never crowd out unseen ones.
            let limit = batch_size + tried.len() as i64;
            let finished = self.store.find_finished_confirmed(local_now, limit).await?;
            let exhausted = (finished.len() as i64) < limit;

            let mut progressed = false;
            for reservation in finished {
                if !tried.insert(reservation.id) {
                    continue;
                }
                progressed = true;
                match self.complete(reservation.id).await {
                    Ok(true) => summary.completed += 1,
                    Ok(false) => {}
                    Err(e) => {
                        summary.failed += 1;
                        warn!(reservation_id = %reservation.id, error = %e, "Auto-complete failed");
                    }
                }
            }

            if exhausted || !progressed {
                break;
            }
        }
        Ok(summary)
    }

    /// Up to `limit` reservations whose hold deadline passed before `now`,
    /// oldest deadline first.
    pub async fn lapsed(&self, limit: i64) -> AppResult<Vec<Reservation>> {
        self.store
            .find_lapsed_pending(self.clock.now(), limit)
            .await
    }

    /// Fetch one reservation visible to the actor.
    pub async fn get(&self, ctx: &RequestContext, id: ReservationId) -> AppResult<Reservation> {
        let reservation = self.find(id).await?;
        ctx.ensure_can_access(&reservation)?;
        Ok(reservation)
    }

    /// The actor's own reservations, newest first.
    pub async fn list_mine(
        &self,
        ctx: &RequestContext,
        page: PageRequest,
    ) -> AppResult<PageResponse<Reservation>> {
        self.store.find_by_user(ctx.user_id, page.normalized()).await
    }

    /// Lookup without an access check, for system callers.
    pub async fn find(&self, id: ReservationId) -> AppResult<Reservation> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn quote(&self, req: &CreateReservationRequest, slot: &TimeSlot) -> AppResult<Decimal> {
        let venue = self
            .venues
            .find(req.venue_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Venue {} not found", req.venue_id)))?;
        Ok(self.pricing.quote(slot, venue.hourly_rate))
    }

    fn validate_request(&self, req: &CreateReservationRequest, slot: &TimeSlot) -> AppResult<()> {
        let duration = slot.duration_minutes();
        if duration < self.config.min_duration_minutes
            || duration > self.config.max_duration_minutes
        {
            return Err(AppError::validation(format!(
                "Duration must be between {} and {} minutes",
                self.config.min_duration_minutes, self.config.max_duration_minutes
            )));
        }
        if let Some(players) = req.player_count {
            if players < 1 || players > self.config.max_players {
                return Err(AppError::validation(format!(
                    "Player count must be between 1 and {}",
                    self.config.max_players
                )));
            }
        }
        if req.amount.is_some_and(|a| a < Decimal::ZERO) {
            return Err(AppError::validation("Amount cannot be negative"));
        }
        if let Some(currency) = &req.currency {
            if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
                return Err(AppError::validation(
                    "Currency must be a three-letter ISO code",
                ));
            }
        }
        Ok(())
    }

    /// Read, decide, compare-and-set; re-read on a lost race.
    ///
    /// `edit` returns `None` to leave the record untouched. Version and
    /// `updated_at` are stamped here.
    async fn update_with<F>(
        &self,
        id: ReservationId,
        mut edit: F,
    ) -> AppResult<(Reservation, bool)>
    where
        F: FnMut(&Reservation, DateTime<Utc>) -> AppResult<Option<Reservation>> + Send,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let current = self.find(id).await?;
            let now = self.clock.now();
            let Some(mut updated) = edit(&current, now)? else {
                return Ok((current, false));
            };
            updated.touch(now);
            if self.store.save(&updated, current.version).await? {
                return Ok((updated, true));
            }
            debug!(reservation_id = %id, attempt, "Concurrent write detected, re-reading");
        }
        Err(write_contention(id))
    }
}

fn not_found(id: ReservationId) -> AppError {
    AppError::not_found(format!("Reservation {id} not found"))
}

fn write_contention(id: ReservationId) -> AppError {
    AppError::conflict(format!(
        "Reservation {id} is being modified concurrently, please retry"
    ))
}
