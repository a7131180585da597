// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mail broker: the store plus its send-time side effects.
//!
//! On top of the raw [`MailStore`], the broker expands group addresses,
//! writes auto-nudge markers for priority and protocol-type sends, and
//! treats every send, check, or reply as an activity heartbeat from the
//! acting agent.

use ovs_adapters::{NudgeRequest, NudgeSender};
use ovs_core::{event_types, Clock, MailId, MailMessage, MessageType, Priority, StructuredEvent};
use ovs_storage::{
    EventStore, MailCheckState, MailFilter, MailStore, NewMail, PurgeSpec, SessionStore,
    StorageError,
};

use crate::groups::Address;
use crate::Result;

/// One send as issued by an agent or the watchdog. `to` may be a group
/// address.
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub priority: Priority,
    pub mail_type: MessageType,
    pub payload: Option<String>,
    pub thread_id: Option<MailId>,
    /// Force nudge delivery, bypassing the mail-check debounce window.
    pub force: bool,
}

impl SendRequest {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: String::new(),
            body: String::new(),
            priority: Priority::Normal,
            mail_type: MessageType::Status,
            payload: None,
            thread_id: None,
            force: false,
        }
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn mail_type(mut self, mail_type: MessageType) -> Self {
        self.mail_type = mail_type;
        self
    }

    pub fn payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn thread(mut self, thread_id: MailId) -> Self {
        self.thread_id = Some(thread_id);
        self
    }

    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }
}

/// Broker over the mail store, session store, and nudge side-band.
#[derive(Clone)]
pub struct MailBroker<C: Clock, N: NudgeSender> {
    mail: MailStore,
    sessions: SessionStore,
    events: EventStore,
    check_state: MailCheckState,
    nudge_sender: N,
    clock: C,
}

impl<C: Clock, N: NudgeSender> MailBroker<C, N> {
    pub fn new(
        mail: MailStore,
        sessions: SessionStore,
        events: EventStore,
        check_state: MailCheckState,
        nudge_sender: N,
        clock: C,
    ) -> Self {
        Self { mail, sessions, events, check_state, nudge_sender, clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Send to an agent or group, returning one id per produced message.
    ///
    /// Group addresses resolve against active sessions minus the sender; an
    /// empty resolution produces no messages and no error.
    pub async fn send(&self, request: SendRequest) -> Result<Vec<MailId>> {
        let now = self.clock.epoch_ms();
        self.heartbeat(&request.from, now);

        let recipients = match Address::parse(&request.to)? {
            Address::Agent(name) => vec![name],
            Address::Group(group) => {
                let active = self.sessions.get_active()?;
                group.resolve(&active, &request.from)
            }
        };

        let mut ids = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            let id = self.mail.send(
                NewMail {
                    from: request.from.clone(),
                    to: recipient.clone(),
                    subject: request.subject.clone(),
                    body: request.body.clone(),
                    priority: request.priority,
                    mail_type: request.mail_type,
                    thread_id: request.thread_id,
                    payload: request.payload.clone(),
                },
                now,
            )?;

            let nudge_worthy =
                request.priority.triggers_nudge() || request.mail_type.triggers_nudge();
            if nudge_worthy || request.force {
                let nudge = NudgeRequest {
                    recipient: recipient.clone(),
                    from: request.from.clone(),
                    reason: request.mail_type.as_str().to_string(),
                    subject: request.subject.clone(),
                    message_id: Some(id),
                    force: request.force,
                };
                match self.nudge_sender.deliver(&nudge).await {
                    Ok(outcome) if !outcome.delivered => {
                        tracing::debug!(
                            recipient = %recipient,
                            reason = outcome.reason.as_deref().unwrap_or(""),
                            "nudge skipped"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(recipient = %recipient, error = %e, "nudge delivery failed");
                    }
                }
            }

            let event = StructuredEvent::new(&request.from, event_types::MAIL_SENT)
                .with_data(serde_json::json!({
                    "to": recipient,
                    "id": id.as_str(),
                    "type": request.mail_type.as_str(),
                    "priority": request.priority.as_str(),
                }));
            if let Err(e) = self.events.append(&event, now) {
                tracing::warn!(error = %e, "mail_sent event dropped");
            }

            ids.push(id);
        }
        Ok(ids)
    }

    /// Unread messages for `agent`, marked read atomically. Records the
    /// check in the debounce state and heartbeats the agent.
    pub async fn check(&self, agent: &str) -> Result<Vec<MailMessage>> {
        let now = self.clock.epoch_ms();
        let messages = self.mail.check(agent)?;
        self.heartbeat(agent, now);
        if let Err(e) = self.check_state.record_check(agent, now) {
            tracing::warn!(agent, error = %e, "mail-check state not recorded");
        }
        Ok(messages)
    }

    /// Reply to a message: recipient, `Re:` subject, and thread id are
    /// derived from the original.
    pub async fn reply(&self, id: &MailId, body: &str, from: &str) -> Result<MailId> {
        let original = self.mail.get(id)?.ok_or(StorageError::NotFound {
            what: "message",
            id: id.as_str().to_string(),
        })?;

        let request = SendRequest::new(from, &original.from)
            .subject(original.reply_subject())
            .body(body)
            .mail_type(original.mail_type)
            .thread(original.reply_thread());

        let ids = self.send(request).await?;
        // A reply goes to exactly one agent, so exactly one id comes back.
        ids.into_iter().next().ok_or_else(|| {
            StorageError::Invalid {
                field: "reply",
                value: format!("original sender {} resolved to no recipients", original.from),
            }
            .into()
        })
    }

    pub fn get(&self, id: &MailId) -> Result<Option<MailMessage>> {
        Ok(self.mail.get(id)?)
    }

    pub fn mark_read(&self, id: &MailId) -> Result<bool> {
        Ok(self.mail.mark_read(id)?)
    }

    pub fn list(&self, filter: &MailFilter) -> Result<Vec<MailMessage>> {
        Ok(self.mail.list(filter)?)
    }

    pub fn get_unread(&self, agent: &str) -> Result<Vec<MailMessage>> {
        Ok(self.mail.get_unread(agent)?)
    }

    pub fn unread_count(&self, agent: &str) -> Result<usize> {
        Ok(self.mail.unread_count(agent)?)
    }

    /// Purge with an optional relative age; `older_than_ms` is converted to
    /// an absolute cutoff against the broker's clock.
    pub fn purge(
        &self,
        all: bool,
        older_than_ms: Option<u64>,
        agent: Option<String>,
    ) -> Result<usize> {
        let before_ms = older_than_ms.map(|ms| self.clock.epoch_ms().saturating_sub(ms));
        Ok(self.mail.purge(&PurgeSpec { all, before_ms, agent })?)
    }

    /// Mail activity is observable activity: touch `last_activity` and lift
    /// booting/stalled back to working. Unknown agents (the watchdog, the
    /// operator) are fine.
    fn heartbeat(&self, agent: &str, now: u64) {
        if let Err(e) = self.sessions.record_heartbeat(agent, now) {
            tracing::warn!(agent, error = %e, "session heartbeat failed");
        }
    }
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
